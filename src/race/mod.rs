// Race data model: lap checkpoints, competitor timelines and the race-wide session.

pub mod loader;
pub mod session;
pub mod snapshot;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub use loader::load_race_session;
pub use session::{CompetitorSnapshot, RaceFrame};
pub use snapshot::{Snapshot, snapshot};

const DEFAULT_COLOR: &str = "#808080";

/// One completed-lap checkpoint for one competitor.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LapRecord {
    /// 1-based lap number, strictly increasing within a timeline
    pub lap_number: u32,
    /// Track rank when the lap was completed (1 = leader)
    pub position: u32,
    /// Duration of this lap. Zero or negative when unknown
    pub individual_lap_time_seconds: f64,
    /// Elapsed race time when this lap was completed
    pub cumulative_real_time_seconds: f64,
    /// Cumulative progress index at the end of this lap
    #[serde(alias = "indiceProgresoAcumulado")]
    pub progress_at_lap_end: f64,
    /// Progress index contributed by this lap alone
    #[serde(alias = "indiceProgresoVuelta")]
    pub progress_delta_for_lap: f64,
    /// Synthetic record marking where a non-finishing competitor stopped
    #[serde(default, alias = "isRetiredFill")]
    pub is_retirement_fill: bool,
}

impl LapRecord {
    /// Lap time usable as an interpolation denominator
    pub(crate) fn valid_lap_time(&self) -> Option<f64> {
        (self.individual_lap_time_seconds > 0.).then_some(self.individual_lap_time_seconds)
    }
}

fn default_color() -> String {
    DEFAULT_COLOR.to_string()
}

/// Ordered lap records of a single competitor.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CompetitorTimeline {
    #[serde(alias = "driverAbbreviation")]
    pub competitor_id: String,
    #[serde(default = "default_color", alias = "teamColor")]
    pub color: String,
    #[serde(default)]
    pub team_name: String,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub laps: Vec<LapRecord>,
}

impl CompetitorTimeline {
    pub fn new(competitor_id: impl Into<String>, laps: Vec<LapRecord>) -> Self {
        Self {
            competitor_id: competitor_id.into(),
            color: default_color(),
            team_name: String::new(),
            full_name: String::new(),
            laps,
        }
    }

    /// Snapshot of this competitor at `target_time`
    pub fn snapshot(&self, target_time: f64) -> Option<Snapshot> {
        snapshot(self, target_time)
    }

    /// Last genuinely completed lap, ignoring retirement fill records
    pub fn last_real_lap(&self) -> Option<&LapRecord> {
        self.laps.iter().rev().find(|lap| !lap.is_retirement_fill)
    }

    /// Whether the competitor completed every lap of a `total_laps` race
    pub fn finished(&self, total_laps: u32) -> bool {
        self.last_real_lap()
            .is_some_and(|lap| lap.lap_number >= total_laps)
    }
}

/// Every competitor of one race plus the race-wide metadata.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RaceSession {
    #[serde(default)]
    pub event_name: String,
    #[serde(default)]
    pub event_year: u32,
    #[serde(default)]
    pub total_laps: u32,
    #[serde(default, alias = "metrosPistaPromedio")]
    pub track_length_meters: f64,
    pub total_race_time_seconds: f64,
    /// Lap number to the progress index at which that lap ends
    #[serde(default, alias = "marcasDeVueltaIndiceProg")]
    pub lap_marks: BTreeMap<u32, f64>,
    #[serde(alias = "driversData")]
    pub competitors: Vec<CompetitorTimeline>,
}
