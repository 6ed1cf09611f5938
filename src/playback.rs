// Playback cursor over the race clock, advanced by wall-clock ticks or moved by seeking.

use crate::config::{DEFAULT_SPEED_FACTOR, MAX_SPEED_FACTOR, MIN_SPEED_FACTOR, ReplayConfig};

#[derive(Clone, Debug, PartialEq)]
pub struct PlaybackState {
    current_time: f64,
    speed_factor: f64,
    min_speed_factor: f64,
    max_speed_factor: f64,
    playing: bool,
    total_race_time: f64,
}

impl PlaybackState {
    /// Unusable speed bounds in `config` are replaced by the defaults.
    pub fn new(total_race_time: f64, config: &ReplayConfig) -> Self {
        let (min_speed_factor, max_speed_factor) = if config.speed_bounds_valid() {
            (config.min_speed_factor, config.max_speed_factor)
        } else {
            (MIN_SPEED_FACTOR, MAX_SPEED_FACTOR)
        };
        let mut state = Self {
            current_time: 0.,
            speed_factor: DEFAULT_SPEED_FACTOR.clamp(min_speed_factor, max_speed_factor),
            min_speed_factor,
            max_speed_factor,
            playing: false,
            total_race_time: if total_race_time.is_finite() {
                total_race_time.max(0.)
            } else {
                0.
            },
        };
        state.set_speed(config.speed_factor);
        state
    }

    pub fn current_time(&self) -> f64 {
        self.current_time
    }

    pub fn speed_factor(&self) -> f64 {
        self.speed_factor
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn total_race_time(&self) -> f64 {
        self.total_race_time
    }

    pub fn at_end(&self) -> bool {
        self.current_time >= self.total_race_time
    }

    /// Advances the cursor by `wall_delta_s` real seconds scaled by the speed
    /// factor. Reaching the end of the race clamps the cursor and pauses.
    pub fn tick(&mut self, wall_delta_s: f64) -> f64 {
        if !self.playing {
            return self.current_time;
        }
        self.current_time += wall_delta_s.max(0.) * self.speed_factor;
        if self.at_end() {
            self.current_time = self.total_race_time;
            self.pause();
        }
        self.current_time
    }

    pub fn play(&mut self) {
        self.playing = true;
    }

    pub fn pause(&mut self) {
        self.playing = false;
    }

    /// Starting playback from the end of the race rewinds to the start.
    pub fn toggle(&mut self) {
        if self.playing {
            self.pause();
        } else {
            if self.at_end() {
                self.current_time = 0.;
            }
            self.play();
        }
    }

    /// Moves the cursor to `target_time`, which stops playback.
    pub fn seek(&mut self, target_time: f64) -> f64 {
        self.pause();
        self.current_time = if target_time.is_nan() {
            0.
        } else {
            target_time.clamp(0., self.total_race_time)
        };
        self.current_time
    }

    /// Non-finite speeds are ignored.
    pub fn set_speed(&mut self, speed_factor: f64) {
        if !speed_factor.is_finite() {
            return;
        }
        self.speed_factor = speed_factor.clamp(self.min_speed_factor, self.max_speed_factor);
    }
}

/// Race clock as `MM:SS`
pub fn format_race_clock(total_seconds: f64) -> String {
    let total_seconds = total_seconds.max(0.);
    let minutes = (total_seconds / 60.).floor() as u64;
    let seconds = (total_seconds % 60.).floor() as u64;
    format!("{:02}:{:02}", minutes, seconds)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn playback() -> PlaybackState {
        PlaybackState::new(5400., &ReplayConfig::default())
    }

    #[test]
    fn test_tick_only_advances_while_playing() {
        let mut state = playback();
        assert_eq!(state.tick(1.), 0.);

        state.play();
        assert_eq!(state.tick(0.5), 15.);
        assert_eq!(state.tick(0.5), 30.);
        assert!(state.is_playing());
    }

    #[test]
    fn test_tick_clamps_and_pauses_at_end() {
        let mut state = playback();
        state.seek(5390.);
        state.play();
        assert_eq!(state.tick(1.), 5400.);
        assert!(!state.is_playing());
        assert!(state.at_end());
    }

    #[test]
    fn test_toggle_at_end_rewinds() {
        let mut state = playback();
        state.seek(5400.);
        state.toggle();
        assert!(state.is_playing());
        assert_eq!(state.current_time(), 0.);

        state.toggle();
        assert!(!state.is_playing());
    }

    #[test]
    fn test_seek_pauses_and_clamps() {
        let mut state = playback();
        state.play();
        assert_eq!(state.seek(1200.), 1200.);
        assert!(!state.is_playing());
        assert_eq!(state.seek(-10.), 0.);
        assert_eq!(state.seek(1e9), 5400.);
        assert_eq!(state.seek(f64::NAN), 0.);
    }

    #[test]
    fn test_seek_backwards_then_play() {
        let mut state = playback();
        state.seek(3000.);
        state.seek(100.);
        state.play();
        assert_eq!(state.tick(1.), 130.);
    }

    #[test]
    fn test_speed_is_clamped() {
        let mut state = playback();
        state.set_speed(500.);
        assert_eq!(state.speed_factor(), 150.);
        state.set_speed(0.);
        assert_eq!(state.speed_factor(), 1.);
        state.set_speed(42.);
        assert_eq!(state.speed_factor(), 42.);
    }

    #[test]
    fn test_non_finite_speed_is_ignored() {
        let mut state = PlaybackState::new(100., &ReplayConfig::default());
        state.set_speed(f64::NAN);
        assert_eq!(state.speed_factor(), 30.);
        state.set_speed(f64::INFINITY);
        assert_eq!(state.speed_factor(), 30.);

        state.play();
        for _ in 0..1000 {
            state.tick(1.);
        }
        assert_eq!(state.current_time(), 100.);
        assert!(!state.is_playing());
    }

    #[test]
    fn test_inverted_speed_bounds_fall_back_to_defaults() {
        let config = ReplayConfig {
            speed_factor: 500.,
            min_speed_factor: 200.,
            max_speed_factor: 100.,
            ..Default::default()
        };
        let mut state = PlaybackState::new(100., &config);
        assert_eq!(state.speed_factor(), 150.);
        state.set_speed(0.);
        assert_eq!(state.speed_factor(), 1.);
    }

    #[test]
    fn test_nan_config_speed_uses_default() {
        let config = ReplayConfig {
            speed_factor: f64::NAN,
            min_speed_factor: f64::NAN,
            ..Default::default()
        };
        let state = PlaybackState::new(100., &config);
        assert_eq!(state.speed_factor(), 30.);
    }

    #[test]
    fn test_format_race_clock() {
        assert_eq!(format_race_clock(0.), "00:00");
        assert_eq!(format_race_clock(59.9), "00:59");
        assert_eq!(format_race_clock(125.), "02:05");
        assert_eq!(format_race_clock(5712.3), "95:12");
        assert_eq!(format_race_clock(-3.), "00:00");
    }
}
