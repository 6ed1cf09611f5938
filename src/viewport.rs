// Which slice of the progress axis is in view, and what should be drawn inside it.

use std::collections::BTreeMap;

use itertools::Itertools;
use serde::Serialize;

use crate::config::ReplayConfig;
use crate::race::{RaceFrame, RaceSession, Snapshot};

/// Lap marks are only used as axis ticks when the window is wider than this.
const MIN_LAP_TICK_SPAN: f64 = 30.;
const AXIS_MARK_BUFFER: f64 = 1.;
/// Markers a little outside the window stay visible so they don't pop in and out
const MARKER_MARGIN: f64 = 0.2;
const RETIRED_MARKER_FAST_WINDOWS: f64 = 5.;
const RETIRED_MARKER_SLOW_WINDOWS: f64 = 15.;
const FAST_PLAYBACK_SPEED: f64 = 50.;
/// Nominal lap duration used to turn track length into progress per second
const NOMINAL_LAP_SECONDS: f64 = 90.;

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct FocusWindow {
    pub start: f64,
    pub end: f64,
}

impl FocusWindow {
    /// Window trailing the frontrunner by `offset`. Without a frontrunner the
    /// window sits at the origin at the start of the race and just past it
    /// afterwards.
    pub fn around(
        frontrunner_progress: Option<f64>,
        target_time: f64,
        size: f64,
        offset: f64,
    ) -> Self {
        let focus = frontrunner_progress.unwrap_or(if target_time == 0. { 0. } else { offset });
        let start = (focus - offset).max(0.);
        Self {
            start,
            end: start + size,
        }
    }

    pub fn for_frame(frame: &RaceFrame, config: &ReplayConfig) -> Self {
        Self::around(
            frame.frontrunner_progress,
            frame.target_time,
            config.window_size,
            config.focus_offset,
        )
    }

    pub fn span(&self) -> f64 {
        self.end - self.start
    }

    /// Whether `progress` lies in the window widened by `margin` of its span on each side
    pub fn contains(&self, progress: f64, margin: f64) -> bool {
        let slack = self.span() * margin;
        progress >= self.start - slack && progress <= self.end + slack
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LapMark {
    pub lap_number: u32,
    pub progress: f64,
}

/// Lap marks within the window widened by `buffer` progress units, by lap number
pub fn visible_lap_marks(
    marks: &BTreeMap<u32, f64>,
    window: &FocusWindow,
    buffer: f64,
) -> Vec<LapMark> {
    marks
        .iter()
        .filter(|(_, progress)| {
            **progress >= window.start - buffer && **progress <= window.end + buffer
        })
        .map(|(lap_number, progress)| LapMark {
            lap_number: *lap_number,
            progress: *progress,
        })
        .collect_vec()
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub enum AxisTicks {
    /// One tick per visible lap mark, labelled with the lap number
    Laps(Vec<LapMark>),
    /// Plain progress values
    Numeric,
}

pub fn axis_ticks(marks: &BTreeMap<u32, f64>, window: &FocusWindow) -> AxisTicks {
    let visible = visible_lap_marks(marks, window, AXIS_MARK_BUFFER);
    if !visible.is_empty() && window.span() > MIN_LAP_TICK_SPAN {
        AxisTicks::Laps(visible)
    } else {
        AxisTicks::Numeric
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompetitorMarker {
    pub competitor_id: String,
    pub label: String,
    pub color: String,
    pub progress: f64,
    pub position: u32,
    pub dimmed: bool,
}

/// Dot and label data for every competitor near the window. Retired
/// competitors are dimmed and eventually dropped.
pub fn competitor_markers(
    session: &RaceSession,
    frame: &RaceFrame,
    window: &FocusWindow,
    speed_factor: f64,
) -> Vec<CompetitorMarker> {
    session
        .competitors
        .iter()
        .zip(&frame.snapshots)
        .filter_map(|(timeline, competitor)| Some((timeline, competitor.snapshot?)))
        .filter(|(_, snapshot)| {
            !retired_marker_expired(
                snapshot,
                frame.target_time,
                speed_factor,
                session.track_length_meters,
                window.span(),
            )
        })
        .filter(|(_, snapshot)| window.contains(snapshot.interpolated_progress, MARKER_MARGIN))
        .map(|(timeline, snapshot)| CompetitorMarker {
            competitor_id: timeline.competitor_id.clone(),
            label: if snapshot.is_retired {
                format!("{} (R)", timeline.competitor_id)
            } else {
                timeline.competitor_id.clone()
            },
            color: timeline.color.clone(),
            progress: snapshot.interpolated_progress,
            position: snapshot.position,
            dimmed: snapshot.is_retired,
        })
        .collect_vec()
}

/// A retired marker lingers for a number of window-widths worth of race time,
/// fewer when playing fast.
fn retired_marker_expired(
    snapshot: &Snapshot,
    target_time: f64,
    speed_factor: f64,
    track_length_meters: f64,
    window_size: f64,
) -> bool {
    if !snapshot.is_retired || track_length_meters <= 0. || speed_factor <= 0. {
        return false;
    }
    let windows = if speed_factor > FAST_PLAYBACK_SPEED {
        RETIRED_MARKER_FAST_WINDOWS
    } else {
        RETIRED_MARKER_SLOW_WINDOWS
    };
    let progress_per_second = track_length_meters / NOMINAL_LAP_SECONDS;
    let linger = windows * (window_size / progress_per_second / speed_factor * 2.);
    target_time > snapshot.event_time + linger
}
