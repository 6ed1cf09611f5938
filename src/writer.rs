use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path,
    sync::mpsc::Receiver,
};

use log::{error, info};
use serde::Serialize;
use serde_jsonlines::JsonLinesWriter;

use crate::{LapchartError, race::RaceFrame};

/// Writes every frame received on `frame_receiver` to `file`, one JSON object
/// per line, until the sending side hangs up.
pub fn write_frames(file: &Path, frame_receiver: Receiver<RaceFrame>) -> Result<usize, LapchartError> {
    let frame_file = File::create(file).map_err(|e| LapchartError::WriterError { source: e })?;
    let mut frame_writer = JsonLinesWriter::new(BufWriter::new(frame_file));
    let mut written = 0;
    for frame in &frame_receiver {
        match frame_writer.write(&frame) {
            Ok(()) => written += 1,
            Err(e) => error!("Error while writing frame at {:.1}s: {}", frame.target_time, e),
        }
    }
    frame_writer
        .flush()
        .map_err(|e| LapchartError::WriterError { source: e })?;
    info!("Wrote {} frames to {:?}", written, file);
    Ok(written)
}

/// Writes a single frame as pretty-printed JSON
pub fn write_frame_pretty<T: Serialize>(out: impl Write, frame: &T) -> Result<(), LapchartError> {
    serde_json::to_writer_pretty(out, frame)
        .map_err(|e| LapchartError::FrameSerializeError { source: e })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::race::{CompetitorTimeline, LapRecord, RaceSession};
    use std::{sync::mpsc, thread};

    fn session() -> RaceSession {
        RaceSession {
            total_race_time_seconds: 90.,
            competitors: vec![CompetitorTimeline::new(
                "ALO",
                vec![LapRecord {
                    lap_number: 1,
                    position: 5,
                    individual_lap_time_seconds: 90.,
                    cumulative_real_time_seconds: 90.,
                    progress_at_lap_end: 50.,
                    progress_delta_for_lap: 50.,
                    is_retirement_fill: false,
                }],
            )],
            ..Default::default()
        }
    }

    #[test]
    fn test_frames_written_as_json_lines() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("frames.jsonl");
        let session = session();

        let (frame_tx, frame_rx) = mpsc::channel::<RaceFrame>();
        let writer_output = output.clone();
        let writer = thread::spawn(move || write_frames(&writer_output, frame_rx));
        for t in [0., 45., 90.] {
            frame_tx.send(session.frame(t)).unwrap();
        }
        drop(frame_tx);
        assert_eq!(writer.join().unwrap().unwrap(), 3);

        let frames = serde_jsonlines::json_lines::<RaceFrame, _>(&output)
            .unwrap()
            .collect::<Result<Vec<_>, _>>()
            .unwrap();
        assert_eq!(frames.len(), 3);
        assert_eq!(frames[1], session.frame(45.));
        assert_eq!(frames[1].frontrunner_progress, Some(25.));
    }

    #[test]
    fn test_pretty_frame() {
        let mut out = Vec::new();
        write_frame_pretty(&mut out, &session().frame(45.)).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("\"frontrunner\": \"ALO\""));
        assert!(text.contains("\"interpolatedProgress\": 25.0"));
    }
}
