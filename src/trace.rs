// Polyline of a competitor's position over the progress axis, up to the queried time.

use itertools::Itertools;
use serde::Serialize;

use crate::race::{CompetitorTimeline, Snapshot, snapshot};
use crate::viewport::FocusWindow;

/// How long after the start the trace is anchored at the origin when the
/// first lap time is unknown.
const START_HORIZON_SECONDS: f64 = 10.;
const LAP_POINT_MARGIN: f64 = 0.2;
const CURRENT_POINT_MARGIN: f64 = 0.1;
const SAME_PROGRESS_EPSILON: f64 = 1e-6;

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct TracePoint {
    pub progress: f64,
    pub position: u32,
}

impl TracePoint {
    fn same_as(&self, other: &TracePoint) -> bool {
        (self.progress - other.progress).abs() < SAME_PROGRESS_EPSILON
            && self.position == other.position
    }
}

impl From<&Snapshot> for TracePoint {
    fn from(snapshot: &Snapshot) -> Self {
        Self {
            progress: snapshot.interpolated_progress,
            position: snapshot.position,
        }
    }
}

/// Points to draw for `timeline` at `target_time`, ordered by progress.
///
/// `current` is the competitor's snapshot at `target_time`. The trace never
/// runs ahead of it, so it stays consistent when the time moves backwards, and
/// it ends at the retirement point once the competitor has retired. Returns an
/// empty trace when fewer than two points are in view.
pub fn competitor_trace(
    timeline: &CompetitorTimeline,
    current: Option<&Snapshot>,
    window: &FocusWindow,
    target_time: f64,
) -> Vec<TracePoint> {
    let mut points = Vec::new();

    let start_horizon = timeline
        .laps
        .first()
        .and_then(|lap| lap.valid_lap_time())
        .unwrap_or(START_HORIZON_SECONDS);
    if target_time <= start_horizon
        && window.contains(0., 0.)
        && let Some(start) = snapshot(timeline, 0.)
    {
        points.push(TracePoint {
            progress: 0.,
            position: start.position,
        });
    }

    points.extend(
        timeline
            .laps
            .iter()
            .filter(|lap| window.contains(lap.progress_at_lap_end, LAP_POINT_MARGIN))
            .map(|lap| TracePoint {
                progress: lap.progress_at_lap_end,
                position: lap.position,
            }),
    );
    points.sort_by(|a, b| a.progress.total_cmp(&b.progress));

    let Some(current) = current else {
        return finish(points);
    };

    if window.contains(current.interpolated_progress, CURRENT_POINT_MARGIN) {
        let here = TracePoint::from(current);
        if !current.is_retired {
            while points.last().is_some_and(|p| p.progress > here.progress) {
                points.pop();
            }
        }
        if !points.last().is_some_and(|p| p.same_as(&here)) {
            points.push(here);
        }
    }

    if current.is_retired {
        let retired_at = current.interpolated_progress;
        points.retain(|p| p.progress <= retired_at + SAME_PROGRESS_EPSILON);
        let ends_early = points
            .last()
            .is_none_or(|p| p.progress < retired_at - SAME_PROGRESS_EPSILON);
        if ends_early && window.contains(retired_at, CURRENT_POINT_MARGIN) {
            points.push(TracePoint::from(current));
        }
    }

    finish(points)
}

fn finish(points: Vec<TracePoint>) -> Vec<TracePoint> {
    let points = points.into_iter().dedup().collect_vec();
    if points.len() > 1 { points } else { Vec::new() }
}
