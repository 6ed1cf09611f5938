// Everything the rendering layer needs to draw the lap chart at one instant.

use itertools::Itertools;
use serde::Serialize;

use crate::config::ReplayConfig;
use crate::playback::format_race_clock;
use crate::race::{RaceFrame, RaceSession};
use crate::trace::{TracePoint, competitor_trace};
use crate::viewport::{
    AxisTicks, CompetitorMarker, FocusWindow, LapMark, axis_ticks, competitor_markers,
    visible_lap_marks,
};

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompetitorTrace {
    pub competitor_id: String,
    pub color: String,
    pub points: Vec<TracePoint>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartFrame {
    pub clock: String,
    pub field_size: u32,
    pub window: FocusWindow,
    pub axis: AxisTicks,
    /// Lap marks to draw as vertical gridlines
    pub lap_lines: Vec<LapMark>,
    pub traces: Vec<CompetitorTrace>,
    pub markers: Vec<CompetitorMarker>,
    pub frame: RaceFrame,
}

impl ChartFrame {
    pub fn build(
        session: &RaceSession,
        target_time: f64,
        config: &ReplayConfig,
        speed_factor: f64,
    ) -> Self {
        let frame = session.frame(target_time);
        let window = FocusWindow::for_frame(&frame, config);

        let traces = session
            .competitors
            .iter()
            .zip(&frame.snapshots)
            .map(|(timeline, competitor)| CompetitorTrace {
                competitor_id: timeline.competitor_id.clone(),
                color: timeline.color.clone(),
                points: competitor_trace(
                    timeline,
                    competitor.snapshot.as_ref(),
                    &window,
                    target_time,
                ),
            })
            .filter(|trace| !trace.points.is_empty())
            .collect_vec();

        Self {
            clock: format_race_clock(target_time),
            field_size: session.field_size(),
            axis: axis_ticks(session.lap_marks(), &window),
            lap_lines: visible_lap_marks(session.lap_marks(), &window, 0.),
            markers: competitor_markers(session, &frame, &window, speed_factor),
            traces,
            window,
            frame,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::race::{CompetitorTimeline, LapRecord};

    fn session() -> RaceSession {
        let laps = (1..=6)
            .map(|n| LapRecord {
                lap_number: n,
                position: 1,
                individual_lap_time_seconds: 90.,
                cumulative_real_time_seconds: n as f64 * 90.,
                progress_at_lap_end: n as f64 * 60.,
                progress_delta_for_lap: 60.,
                is_retirement_fill: false,
            })
            .collect_vec();
        RaceSession {
            track_length_meters: 5400.,
            total_race_time_seconds: 540.,
            lap_marks: (1..=6).map(|n| (n, n as f64 * 60.)).collect(),
            competitors: vec![
                CompetitorTimeline::new("LDR", laps),
                CompetitorTimeline::new("DNS", vec![]),
            ],
            ..Default::default()
        }
    }

    #[test]
    fn test_chart_frame_mid_race() {
        let chart = ChartFrame::build(&session(), 315., &ReplayConfig::default(), 30.);
        // lap 4 halfway: 180 + 30
        assert_eq!(chart.frame.frontrunner_progress, Some(210.));
        assert_eq!(chart.clock, "05:15");
        assert_eq!(chart.window, FocusWindow { start: 110., end: 410. });
        let lines = chart.lap_lines.iter().map(|m| m.lap_number).collect_vec();
        assert_eq!(lines, vec![2, 3, 4, 5, 6]);
        assert!(matches!(chart.axis, AxisTicks::Laps(_)));

        assert_eq!(chart.traces.len(), 1);
        let trace = &chart.traces[0];
        assert_eq!(trace.competitor_id, "LDR");
        assert_eq!(trace.points.last().map(|p| p.progress), Some(210.));
        assert!(trace.points.first().is_some_and(|p| p.progress >= 60.));

        // the car that never started is parked off the field and out of view
        assert_eq!(chart.field_size, 20);
        assert_eq!(chart.markers.len(), 1);
    }

    #[test]
    fn test_chart_frame_json_keys_are_camel_case() {
        let chart = ChartFrame::build(&session(), 315., &ReplayConfig::default(), 30.);
        let json = serde_json::to_value(&chart).unwrap();

        assert_eq!(json["lapLines"][0]["lapNumber"], 2);
        assert_eq!(json["markers"][0]["competitorId"], "LDR");
        assert_eq!(json["traces"][0]["competitorId"], "LDR");
        assert_eq!(json["fieldSize"], 20);

        let text = json.to_string();
        assert!(!text.contains("lap_number"));
        assert!(!text.contains("competitor_id"));
    }

    #[test]
    fn test_chart_frame_at_start() {
        let chart = ChartFrame::build(&session(), 0., &ReplayConfig::default(), 30.);
        assert_eq!(chart.window, FocusWindow { start: 0., end: 300. });
        assert_eq!(chart.clock, "00:00");
        assert!(chart.frame.get("DNS").is_none());
        assert_eq!(chart.markers.len(), 1);
        assert_eq!(chart.markers[0].progress, 0.);
    }
}
