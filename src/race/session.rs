use std::{collections::BTreeMap, panic, thread};

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use super::{
    CompetitorTimeline, RaceSession,
    snapshot::{Snapshot, UNCLASSIFIED_POSITION, snapshot},
};

/// Smallest number of rows the position axis is laid out for.
pub const MIN_FIELD_SIZE: u32 = 20;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CompetitorSnapshot {
    pub competitor_id: String,
    /// `None` while the competitor's state is undetermined
    pub snapshot: Option<Snapshot>,
}

/// Every competitor's state at one race time.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RaceFrame {
    pub target_time: f64,
    pub snapshots: Vec<CompetitorSnapshot>,
    pub frontrunner: Option<String>,
    pub frontrunner_progress: Option<f64>,
    pub frontrunner_lap: Option<u32>,
}

impl RaceFrame {
    fn from_snapshots(target_time: f64, snapshots: Vec<CompetitorSnapshot>) -> Self {
        let leader = frontrunner(&snapshots);
        let frontrunner = leader.map(|(id, _)| id.to_string());
        let frontrunner_progress = leader.map(|(_, s)| s.interpolated_progress);
        let frontrunner_lap = leader.map(|(_, s)| s.current_lap_number);
        Self {
            target_time,
            snapshots,
            frontrunner,
            frontrunner_progress,
            frontrunner_lap,
        }
    }

    pub fn get(&self, competitor_id: &str) -> Option<&Snapshot> {
        self.snapshots
            .iter()
            .find(|c| c.competitor_id == competitor_id)
            .and_then(|c| c.snapshot.as_ref())
    }

    /// Competitors with a known state that are still racing
    pub fn active_count(&self) -> usize {
        self.snapshots
            .iter()
            .filter_map(|c| c.snapshot)
            .filter(|s| !s.is_retired)
            .count()
    }
}

/// Competitor with the greatest progress among those still racing. When all
/// of them are retired the overall maximum is used so the focus keeps moving.
/// Ties go to the earliest competitor in session order.
fn frontrunner(snapshots: &[CompetitorSnapshot]) -> Option<(&str, Snapshot)> {
    let leading = |active_only: bool| {
        snapshots
            .iter()
            .filter_map(|c| c.snapshot.map(|s| (c.competitor_id.as_str(), s)))
            .filter(|(_, s)| !active_only || !s.is_retired)
            .fold(None::<(&str, Snapshot)>, |best, (id, s)| match best {
                Some((_, b)) if b.interpolated_progress >= s.interpolated_progress => best,
                _ => Some((id, s)),
            })
    };
    leading(true).or_else(|| leading(false))
}

fn competitor_snapshot(
    timeline: &CompetitorTimeline,
    target_time: f64,
    field_size: u32,
) -> CompetitorSnapshot {
    let snapshot = snapshot(timeline, target_time).map(|mut s| {
        // park competitors that never completed a lap one row below the field
        if s.position == UNCLASSIFIED_POSITION {
            s.position = field_size + 1;
            s.position_before_retirement = field_size + 1;
        }
        s
    });
    CompetitorSnapshot {
        competitor_id: timeline.competitor_id.clone(),
        snapshot,
    }
}

impl RaceSession {
    /// Number of position rows: the worst position seen on any lap, at least
    /// [`MIN_FIELD_SIZE`].
    pub fn field_size(&self) -> u32 {
        self.competitors
            .iter()
            .flat_map(|c| c.laps.iter().map(|lap| lap.position))
            .max()
            .unwrap_or(0)
            .max(MIN_FIELD_SIZE)
    }

    pub fn competitor(&self, competitor_id: &str) -> Option<&CompetitorTimeline> {
        self.competitors
            .iter()
            .find(|c| c.competitor_id == competitor_id)
    }

    /// Snapshots of all competitors at `target_time` plus the frontrunner.
    pub fn frame(&self, target_time: f64) -> RaceFrame {
        let field_size = self.field_size();
        let snapshots = self
            .competitors
            .iter()
            .map(|timeline| competitor_snapshot(timeline, target_time, field_size))
            .collect_vec();
        RaceFrame::from_snapshots(target_time, snapshots)
    }

    /// Same as [`RaceSession::frame`], evaluating each competitor on its own thread.
    pub fn frame_parallel(&self, target_time: f64) -> RaceFrame {
        let field_size = self.field_size();
        let snapshots = thread::scope(|scope| {
            let handles = self
                .competitors
                .iter()
                .map(|timeline| {
                    scope.spawn(move || competitor_snapshot(timeline, target_time, field_size))
                })
                .collect_vec();
            handles
                .into_iter()
                .map(|handle| handle.join().unwrap_or_else(|e| panic::resume_unwind(e)))
                .collect_vec()
        });
        RaceFrame::from_snapshots(target_time, snapshots)
    }

    /// Lap number to the progress index at which the lap ends
    pub fn lap_marks(&self) -> &BTreeMap<u32, f64> {
        &self.lap_marks
    }

    pub fn max_lap_mark(&self) -> Option<f64> {
        self.lap_marks.values().copied().reduce(f64::max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::race::LapRecord;

    fn lap(lap_number: u32, position: u32, cumulative: f64, progress: f64) -> LapRecord {
        LapRecord {
            lap_number,
            position,
            individual_lap_time_seconds: 90.,
            cumulative_real_time_seconds: cumulative,
            progress_at_lap_end: progress,
            progress_delta_for_lap: 50.,
            is_retirement_fill: false,
        }
    }

    fn session() -> RaceSession {
        RaceSession {
            total_race_time_seconds: 270.,
            lap_marks: BTreeMap::from([(1, 50.), (2, 100.), (3, 150.)]),
            competitors: vec![
                // fast but stops after lap 1
                CompetitorTimeline::new("FST", vec![lap(1, 1, 80., 60.)]),
                CompetitorTimeline::new(
                    "MID",
                    vec![lap(1, 2, 90., 50.), lap(2, 1, 180., 100.), lap(3, 1, 270., 150.)],
                ),
                CompetitorTimeline::new(
                    "SLO",
                    vec![lap(1, 3, 95., 45.), lap(2, 2, 190., 90.)],
                ),
                CompetitorTimeline::new("DNS", vec![]),
            ],
            ..Default::default()
        }
    }

    #[test]
    fn test_frame_has_one_entry_per_competitor_in_order() {
        let frame = session().frame(45.);
        let ids = frame
            .snapshots
            .iter()
            .map(|c| c.competitor_id.as_str())
            .collect_vec();
        assert_eq!(ids, vec!["FST", "MID", "SLO", "DNS"]);
        assert_eq!(frame.target_time, 45.);

        let dns = frame.get("DNS").unwrap();
        assert!(dns.is_retired);
        assert_eq!(dns.position, MIN_FIELD_SIZE + 1);
    }

    #[test]
    fn test_empty_timeline_undetermined_on_grid() {
        let frame = session().frame(0.5);
        assert_eq!(frame.snapshots.len(), 4);
        assert!(frame.get("DNS").is_none());
        assert_eq!(frame.active_count(), 3);
    }

    #[test]
    fn test_frontrunner_is_greatest_progress() {
        let frame = session().frame(45.);
        // 45 / 90 * 50 for everyone, ties keep session order
        assert_eq!(frame.frontrunner.as_deref(), Some("FST"));
        assert_eq!(frame.frontrunner_progress, Some(25.));
        assert_eq!(frame.frontrunner_lap, Some(1));
    }

    #[test]
    fn test_retired_competitor_never_leads() {
        let frame = session().frame(100.);
        let fst = frame.get("FST").unwrap();
        assert!(fst.is_retired);
        assert_eq!(fst.interpolated_progress, 60.);

        let mid = frame.get("MID").unwrap();
        assert!(mid.interpolated_progress < 60.);
        assert_eq!(frame.frontrunner.as_deref(), Some("MID"));
        assert_eq!(frame.frontrunner_progress, Some(mid.interpolated_progress));
    }

    #[test]
    fn test_all_retired_falls_back_to_max_progress() {
        let frame = session().frame(400.);
        assert_eq!(frame.active_count(), 0);
        assert_eq!(frame.frontrunner.as_deref(), Some("MID"));
        assert_eq!(frame.frontrunner_progress, Some(150.));
    }

    #[test]
    fn test_no_snapshots_means_no_frontrunner() {
        let session = RaceSession {
            competitors: vec![CompetitorTimeline::new("DNS", vec![])],
            ..Default::default()
        };
        let frame = session.frame(0.);
        assert!(frame.frontrunner.is_none());
        assert!(frame.frontrunner_progress.is_none());
    }

    #[test]
    fn test_unclassified_competitor_parked_below_field() {
        let frame = session().frame(60.);
        let dns = frame.get("DNS").unwrap();
        assert!(dns.is_retired);
        assert_eq!(dns.position, MIN_FIELD_SIZE + 1);
    }

    #[test]
    fn test_field_size() {
        assert_eq!(session().field_size(), MIN_FIELD_SIZE);
        let mut big = session();
        big.competitors[0].laps[0].position = 24;
        assert_eq!(big.field_size(), 24);
    }

    #[test]
    fn test_parallel_frame_matches_sequential() {
        let session = session();
        for t in [0., 10., 80., 95., 181., 269., 1000.] {
            assert_eq!(session.frame_parallel(t), session.frame(t));
        }
    }

    #[test]
    fn test_lap_marks_exposed_unmodified() {
        let session = session();
        assert_eq!(session.lap_marks(), &BTreeMap::from([(1, 50.), (2, 100.), (3, 150.)]));
        assert_eq!(session.max_lap_mark(), Some(150.));
        assert_eq!(RaceSession::default().max_lap_mark(), None);
    }
}
