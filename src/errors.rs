// Error types for lapchart

use crate::race::RaceFrame;
use snafu::Snafu;
use std::{io, sync::mpsc::SendError};

#[derive(Debug, Snafu)]
pub enum LapchartError {
    // Errors while loading race data
    #[snafu(display("Race data file not found: {path}"))]
    MissingRaceFile { path: String },
    #[snafu(display("Error reading race data file"))]
    RaceFileIOError { source: io::Error },
    #[snafu(display("Error parsing race data file"))]
    RaceFileParseError { source: serde_json::Error },

    // Errors while streaming replay frames
    #[snafu(display("Error broadcasting replay frame"))]
    FrameBroadcastError { source: Box<SendError<RaceFrame>> },
    #[snafu(display("Error writing replay frames"))]
    WriterError { source: io::Error },
    #[snafu(display("Error serializing replay frame"))]
    FrameSerializeError { source: serde_json::Error },

    // Config management errors
    #[snafu(display("Could not find application data directory to save config file"))]
    NoConfigDir,
    #[snafu(display("Error writing config file"))]
    ConfigIOError { source: io::Error },
    #[snafu(display("Error serializing config file"))]
    ConfigSerializeError { source: serde_json::Error },

    // User input validation errors
    #[snafu(display("Invalid user input: {field} - {reason}"))]
    InvalidUserInput { field: String, reason: String },
}

impl From<SendError<RaceFrame>> for LapchartError {
    fn from(value: SendError<RaceFrame>) -> Self {
        LapchartError::FrameBroadcastError {
            source: Box::new(value),
        }
    }
}
