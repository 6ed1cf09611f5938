use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use itertools::Itertools;
use log::{info, warn};

use super::RaceSession;
use crate::LapchartError;

/// Reads a race session description from a JSON file.
pub fn load_race_session(source_file: &Path) -> Result<RaceSession, LapchartError> {
    if !source_file.exists() {
        return Err(LapchartError::MissingRaceFile {
            path: format!("{:?}", source_file),
        });
    }

    let file = File::open(source_file).map_err(|e| LapchartError::RaceFileIOError { source: e })?;
    let session: RaceSession = serde_json::from_reader(BufReader::new(file))
        .map_err(|e| LapchartError::RaceFileParseError { source: e })?;

    report_out_of_order_laps(&session);
    info!(
        "Loaded {:?}: {} {} with {} competitors, {} laps, {:.0}s of racing",
        source_file,
        session.event_name,
        session.event_year,
        session.competitors.len(),
        session.total_laps,
        session.total_race_time_seconds
    );
    Ok(session)
}

/// Snapshots assume timestamps never run backwards within a timeline
fn report_out_of_order_laps(session: &RaceSession) {
    for (competitor_id, out_of_order) in out_of_order_laps(session) {
        warn!(
            "{} has {} laps completed before the previous one, snapshots may be wrong",
            competitor_id, out_of_order
        );
    }
}

/// Competitors whose lap timestamps go backwards, with how many times they do
fn out_of_order_laps(session: &RaceSession) -> Vec<(&str, usize)> {
    session
        .competitors
        .iter()
        .map(|competitor| {
            let out_of_order = competitor
                .laps
                .iter()
                .tuple_windows()
                .filter(|(prev, next)| {
                    next.cumulative_real_time_seconds < prev.cumulative_real_time_seconds
                })
                .count();
            (competitor.competitor_id.as_str(), out_of_order)
        })
        .filter(|(_, out_of_order)| *out_of_order > 0)
        .collect_vec()
}
