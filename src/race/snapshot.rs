use serde::{Deserialize, Serialize};

use super::{CompetitorTimeline, LapRecord};

/// Time after the start during which a competitor without any lap data is
/// still considered to be on the grid.
pub const GRID_GRACE_SECONDS: f64 = 1.0;

/// Position reported for a competitor that never completed a lap.
pub const UNCLASSIFIED_POSITION: u32 = 0;

/// State of one competitor at a given race time. Always recomputed.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    /// Current or last known rank
    pub position: u32,
    /// Rank held when the competitor retired
    pub position_before_retirement: u32,
    /// Cumulative progress index at the queried time
    pub interpolated_progress: f64,
    /// Lap the competitor is in
    pub current_lap_number: u32,
    /// No further laps will be produced after this time
    pub is_retired: bool,
    /// Race time the position actually reflects
    pub event_time: f64,
}

impl Snapshot {
    fn at_lap_end(lap: &LapRecord) -> Self {
        Self {
            position: lap.position,
            position_before_retirement: lap.position,
            interpolated_progress: lap.progress_at_lap_end,
            current_lap_number: lap.lap_number,
            is_retired: false,
            event_time: lap.cumulative_real_time_seconds,
        }
    }

    fn retired(last_real: &LapRecord, fill: Option<&LapRecord>) -> Self {
        Self {
            position: fill.map_or(last_real.position, |f| f.position),
            is_retired: true,
            ..Self::at_lap_end(last_real)
        }
    }
}

/// Reconstructs the state of `timeline` at `target_time`.
///
/// Returns `None` when the state cannot be determined: an empty timeline at the
/// start of the race, or a time before the first lap whose duration is unknown.
/// The result depends only on the arguments, so times can be queried in any order.
pub fn snapshot(timeline: &CompetitorTimeline, target_time: f64) -> Option<Snapshot> {
    let laps = &timeline.laps;
    let Some(first_lap) = laps.first() else {
        return no_laps(target_time);
    };

    // ties resolve to the later record
    let completed = laps.partition_point(|lap| lap.cumulative_real_time_seconds <= target_time);
    let Some(last_completed) = completed.checked_sub(1) else {
        return before_first_lap(laps, first_lap, target_time);
    };

    let prev = &laps[last_completed];
    if prev.is_retirement_fill {
        return Some(past_retirement_fill(laps, last_completed));
    }
    if target_time <= prev.cumulative_real_time_seconds {
        return Some(Snapshot::at_lap_end(prev));
    }

    match laps.get(last_completed + 1) {
        Some(next) if !next.is_retirement_fill => Some(Snapshot {
            interpolated_progress: prev.progress_at_lap_end
                + lap_fraction(next, target_time - prev.cumulative_real_time_seconds)
                    * next.progress_delta_for_lap,
            current_lap_number: next.lap_number,
            event_time: target_time,
            ..Snapshot::at_lap_end(prev)
        }),
        fill => Some(Snapshot::retired(prev, fill)),
    }
}

fn no_laps(target_time: f64) -> Option<Snapshot> {
    (target_time > GRID_GRACE_SECONDS).then_some(Snapshot {
        position: UNCLASSIFIED_POSITION,
        position_before_retirement: UNCLASSIFIED_POSITION,
        interpolated_progress: 0.,
        current_lap_number: 0,
        is_retired: true,
        event_time: target_time,
    })
}

fn before_first_lap(laps: &[LapRecord], first_lap: &LapRecord, target_time: f64) -> Option<Snapshot> {
    if target_time == 0. {
        return Some(Snapshot {
            position: first_lap.position,
            position_before_retirement: first_lap.position,
            interpolated_progress: 0.,
            current_lap_number: 1,
            is_retired: false,
            event_time: 0.,
        });
    }
    if target_time.is_nan() || target_time < 0. || first_lap.valid_lap_time().is_none() {
        return None;
    }
    if laps.len() == 1 && target_time > first_lap.cumulative_real_time_seconds {
        return Some(Snapshot::retired(first_lap, None));
    }
    Some(Snapshot {
        position: first_lap.position,
        position_before_retirement: first_lap.position,
        interpolated_progress: lap_fraction(first_lap, target_time)
            * first_lap.progress_delta_for_lap,
        current_lap_number: 1,
        is_retired: false,
        event_time: target_time,
    })
}

/// The query time has gone past a fill record, so the competitor stopped at
/// its last real lap, or at the start when it never completed one.
fn past_retirement_fill(laps: &[LapRecord], fill_idx: usize) -> Snapshot {
    match laps[..fill_idx].iter().rposition(|lap| !lap.is_retirement_fill) {
        Some(real_idx) => Snapshot::retired(&laps[real_idx], laps.get(real_idx + 1)),
        None => {
            let fill = &laps[0];
            Snapshot {
                position: fill.position,
                position_before_retirement: fill.position,
                interpolated_progress: fill.progress_at_lap_end,
                current_lap_number: 0,
                is_retired: true,
                event_time: 0.,
            }
        }
    }
}

/// Fraction of `lap` covered after `time_into_lap` seconds. Unknown lap times
/// hold the competitor at the start of the lap.
fn lap_fraction(lap: &LapRecord, time_into_lap: f64) -> f64 {
    match lap.valid_lap_time() {
        Some(lap_time) => (time_into_lap / lap_time).clamp(0., 1.),
        None => 0.,
    }
}
