use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::LapchartError;

const CONFIG_FILE_NAME: &str = "config.json";

pub const DEFAULT_SPEED_FACTOR: f64 = 30.;
pub const MIN_SPEED_FACTOR: f64 = 1.;
pub const MAX_SPEED_FACTOR: f64 = 150.;
/// Progress index units visible at once
pub const WINDOW_SIZE: f64 = 300.;
/// How far behind the frontrunner the visible window starts
pub const FOCUS_OFFSET: f64 = 100.;
pub const FRAME_INTERVAL_MS: u64 = 16;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ReplayConfig {
    pub speed_factor: f64,
    pub min_speed_factor: f64,
    pub max_speed_factor: f64,
    pub window_size: f64,
    pub focus_offset: f64,
    pub frame_interval_ms: u64,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            speed_factor: DEFAULT_SPEED_FACTOR,
            min_speed_factor: MIN_SPEED_FACTOR,
            max_speed_factor: MAX_SPEED_FACTOR,
            window_size: WINDOW_SIZE,
            focus_offset: FOCUS_OFFSET,
            frame_interval_ms: FRAME_INTERVAL_MS,
        }
    }
}

impl ReplayConfig {
    pub fn default_path() -> Result<PathBuf, LapchartError> {
        Ok(dirs::config_dir()
            .ok_or(LapchartError::NoConfigDir)?
            .join("lapchart")
            .join(CONFIG_FILE_NAME))
    }

    /// Config saved in the user's config directory, if there is one
    pub fn from_local_file() -> Result<Option<Self>, LapchartError> {
        Self::from_path(&Self::default_path()?)
    }

    pub fn from_path(config_path: &Path) -> Result<Option<Self>, LapchartError> {
        if !config_path.exists() {
            return Ok(None);
        }
        let file = std::fs::File::open(config_path)
            .map_err(|e| LapchartError::ConfigIOError { source: e })?;
        let config: Self = serde_json::from_reader(file)
            .map_err(|e| LapchartError::ConfigSerializeError { source: e })?;
        config.validate()?;
        Ok(Some(config))
    }

    /// Both bounds finite and positive, with min not above max
    pub fn speed_bounds_valid(&self) -> bool {
        self.min_speed_factor.is_finite()
            && self.max_speed_factor.is_finite()
            && self.min_speed_factor > 0.
            && self.min_speed_factor <= self.max_speed_factor
    }

    pub fn validate(&self) -> Result<(), LapchartError> {
        if !self.speed_bounds_valid() {
            return Err(LapchartError::InvalidUserInput {
                field: "min_speed_factor/max_speed_factor".to_string(),
                reason: format!(
                    "{} to {} is not a usable speed range",
                    self.min_speed_factor, self.max_speed_factor
                ),
            });
        }
        if !self.speed_factor.is_finite() {
            return Err(LapchartError::InvalidUserInput {
                field: "speed_factor".to_string(),
                reason: format!("{} is not a speed", self.speed_factor),
            });
        }
        if !self.window_size.is_finite() || self.window_size <= 0. || !self.focus_offset.is_finite()
        {
            return Err(LapchartError::InvalidUserInput {
                field: "window_size/focus_offset".to_string(),
                reason: format!(
                    "window of {} with offset {} cannot be shown",
                    self.window_size, self.focus_offset
                ),
            });
        }
        Ok(())
    }

    pub fn save(&self) -> Result<(), LapchartError> {
        self.save_to_path(&Self::default_path()?)
    }

    pub fn save_to_path(&self, config_path: &Path) -> Result<(), LapchartError> {
        if let Some(parent) = config_path.parent()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent)
                .map_err(|e| LapchartError::ConfigIOError { source: e })?;
        }

        let file = std::fs::File::create(config_path)
            .map_err(|e| LapchartError::ConfigIOError { source: e })?;
        serde_json::to_writer(file, self)
            .map_err(|e| LapchartError::ConfigSerializeError { source: e })
    }
}
