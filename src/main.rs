use std::{
    io,
    panic,
    path::{Path, PathBuf},
    sync::mpsc,
    thread,
    time::{Duration, Instant},
};

use clap::{Parser, Subcommand};
use lapchart::{
    ChartFrame, LapchartError, PlaybackState, RaceFrame, ReplayConfig, format_race_clock,
    load_race_session, writer,
};
use log::{debug, info, warn};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the chart data at one instant of the race
    Snapshot {
        #[arg(short, long)]
        input: PathBuf,

        /// Race time in seconds
        #[arg(short, long)]
        time: f64,
    },
    /// Replay the race in real time
    Replay {
        #[arg(short, long)]
        input: PathBuf,

        /// Race seconds per wall-clock second
        #[arg(short, long)]
        speed: Option<f64>,

        /// Write every frame to this file as JSON lines
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn load_config() -> ReplayConfig {
    match ReplayConfig::from_local_file() {
        Ok(Some(config)) => config,
        Ok(None) => ReplayConfig::default(),
        Err(e) => {
            warn!("Ignoring config file: {}", e);
            ReplayConfig::default()
        }
    }
}

fn snapshot(input: &Path, time: f64) -> Result<(), LapchartError> {
    if !time.is_finite() || time < 0. {
        return Err(LapchartError::InvalidUserInput {
            field: "time".to_string(),
            reason: format!("{} is not a race time", time),
        });
    }
    let session = load_race_session(input)?;
    let config = load_config();
    let time = time.min(session.total_race_time_seconds);
    let chart = ChartFrame::build(&session, time, &config, config.speed_factor);
    writer::write_frame_pretty(io::stdout().lock(), &chart)?;
    println!();
    Ok(())
}

fn replay(input: &Path, speed: Option<f64>, output: Option<PathBuf>) -> Result<(), LapchartError> {
    if let Some(speed) = speed
        && (!speed.is_finite() || speed <= 0.)
    {
        return Err(LapchartError::InvalidUserInput {
            field: "speed".to_string(),
            reason: format!("{} is not a playback speed", speed),
        });
    }
    let session = load_race_session(input)?;
    let config = load_config();
    let mut playback = PlaybackState::new(session.total_race_time_seconds, &config);
    if let Some(speed) = speed {
        playback.set_speed(speed);
    }

    // if we need to write an output file the frames are also sent to a writer thread
    let (frame_tx, writer_handle) = match output {
        Some(output_file) => {
            let (frame_tx, frame_rx) = mpsc::channel::<RaceFrame>();
            let handle = thread::spawn(move || writer::write_frames(&output_file, frame_rx));
            (Some(frame_tx), Some(handle))
        }
        None => (None, None),
    };

    println!(
        "{} {}: {} competitors, {} laps, {} at {}x",
        session.event_name,
        session.event_year,
        session.competitors.len(),
        session.total_laps,
        format_race_clock(playback.total_race_time()),
        playback.speed_factor()
    );

    let frame_interval = Duration::from_millis(config.frame_interval_ms);
    let mut last_tick = Instant::now();
    let mut leader_lap = None;
    playback.play();
    loop {
        let now = Instant::now();
        let race_time = playback.tick(now.duration_since(last_tick).as_secs_f64());
        last_tick = now;

        let frame = session.frame(race_time);
        if frame.frontrunner_lap != leader_lap {
            leader_lap = frame.frontrunner_lap;
            debug!(
                "Frontrunner {:?} at progress {:?}",
                frame.frontrunner, frame.frontrunner_progress
            );
            println!(
                "[{}] lap {} - {} leads, {} still racing",
                format_race_clock(race_time),
                leader_lap.unwrap_or(0),
                frame.frontrunner.as_deref().unwrap_or("nobody"),
                frame.active_count()
            );
        }
        if let Some(ref frame_tx) = frame_tx {
            frame_tx.send(frame)?;
        }

        if !playback.is_playing() {
            break;
        }
        thread::sleep(frame_interval);
    }
    info!("Replay finished at {}", format_race_clock(playback.current_time()));

    drop(frame_tx);
    if let Some(handle) = writer_handle {
        handle.join().unwrap_or_else(|e| panic::resume_unwind(e))?;
    }
    Ok(())
}

fn main() {
    #[cfg(debug_assertions)]
    colog::init();

    let cli = Args::parse();
    ctrlc::set_handler(move || {
        println!("Exiting...");
        std::process::exit(0);
    })
    .expect("Could not set Ctrl-C handler");
    match &cli.command {
        Commands::Snapshot { input, time } => {
            snapshot(input, *time).expect("Error while computing race snapshot");
        }
        Commands::Replay {
            input,
            speed,
            output,
        } => replay(input, *speed, output.clone()).expect("Error while replaying race"),
    };
}
