// Library interface for lapchart
// Race data model, snapshot engine and the data preparation behind the lap chart

pub mod chart;
pub mod config;
pub mod errors;
pub mod playback;
pub mod race;
pub mod trace;
pub mod viewport;
pub mod writer;

// Re-export commonly used types
pub use chart::ChartFrame;
pub use config::ReplayConfig;
pub use errors::LapchartError;
pub use playback::{PlaybackState, format_race_clock};
pub use race::{
    CompetitorSnapshot, CompetitorTimeline, LapRecord, RaceFrame, RaceSession, Snapshot,
    load_race_session, snapshot,
};
