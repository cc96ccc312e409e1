//! Compiler configuration.
//!
//! Settings that describe the host engine and the emitted text, loaded from an
//! INI file. Every value has a safe default so the compiler can run without a
//! configuration file.
//!
//! # Configuration File Format
//!
//! ```ini
//! [host]
//! tick_rate = 60
//!
//! [emit]
//! indent_width = 4
//! offset = 0
//! ```
//!
//! The tick rate is fixed per compilation: durations are converted to frame
//! deltas once, when logic is generated, never while it runs.

use configparser::ini::Ini;
use log::info;
use std::path::PathBuf;

use crate::error::ConfigError;

/// Default safe values for startup
const DEFAULT_TICK_RATE: f64 = 60.0;
const DEFAULT_INDENT_WIDTH: usize = 4;
const DEFAULT_OFFSET: usize = 0;
const DEFAULT_CONFIG_PATH: &str = "./scenelogic.ini";

/// Compiler configuration passed explicitly into [`compile`](crate::driver::compile).
#[derive(Debug, Clone)]
pub struct CompilerConfig {
    /// Host ticks per second.
    pub tick_rate: f64,
    /// Spaces per indentation level in rendered fragments.
    pub indent_width: usize,
    /// Base indentation level of every rendered fragment.
    pub offset: usize,
    /// Path to the configuration file.
    pub config_path: PathBuf,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl CompilerConfig {
    /// Create a new configuration with safe default values.
    pub fn new() -> Self {
        Self {
            tick_rate: DEFAULT_TICK_RATE,
            indent_width: DEFAULT_INDENT_WIDTH,
            offset: DEFAULT_OFFSET,
            config_path: PathBuf::from(DEFAULT_CONFIG_PATH),
        }
    }

    /// Create a new configuration with a custom config file path.
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: path.into(),
            ..Self::new()
        }
    }

    /// Builder-style tick rate override.
    pub fn with_tick_rate(mut self, tick_rate: f64) -> Self {
        self.tick_rate = tick_rate;
        self
    }

    /// Load configuration from the INI file.
    ///
    /// Missing values retain their current (default) values.
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_from_file(&mut self) -> Result<(), String> {
        let mut config = Ini::new();
        config
            .load(&self.config_path)
            .map_err(|e| format!("Failed to load config file: {}", e))?;

        // [host] section
        if let Some(rate) = config.getfloat("host", "tick_rate").ok().flatten() {
            self.tick_rate = rate;
        }

        // [emit] section
        if let Some(width) = config.getuint("emit", "indent_width").ok().flatten() {
            self.indent_width = width as usize;
        }
        if let Some(offset) = config.getuint("emit", "offset").ok().flatten() {
            self.offset = offset as usize;
        }

        info!(
            "Loaded config: tick_rate={}, indent_width={}, offset={}",
            self.tick_rate, self.indent_width, self.offset
        );

        Ok(())
    }

    /// Save configuration to the INI file.
    ///
    /// Creates the file if it doesn't exist.
    pub fn save_to_file(&self) -> Result<(), String> {
        let mut config = Ini::new();

        // [host] section
        config.set("host", "tick_rate", Some(self.tick_rate.to_string()));

        // [emit] section
        config.set("emit", "indent_width", Some(self.indent_width.to_string()));
        config.set("emit", "offset", Some(self.offset.to_string()));

        config
            .write(&self.config_path)
            .map_err(|e| format!("Failed to save config file: {}", e))?;

        info!("Saved config to {:?}", self.config_path);

        Ok(())
    }

    /// Check that the settings describe a usable host.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.tick_rate.is_finite() || self.tick_rate <= 0.0 {
            return Err(ConfigError::InvalidTickRate(self.tick_rate));
        }
        Ok(())
    }

    /// Number of whole ticks an action of `duration` seconds runs for.
    pub fn ticks_for(&self, duration: f64) -> u64 {
        ticks(duration, self.tick_rate)
    }
}

/// Relative distance below which `duration * tick_rate` counts as a whole
/// number of ticks.
const TICK_TOLERANCE: f64 = 1e-9;

/// `duration * tick_rate`, snapped to the nearest integer when the product
/// only misses it by rounding (`1.1 * 50` is `55.00000000000001`).
pub fn tick_span(duration: f64, tick_rate: f64) -> f64 {
    let exact = duration * tick_rate;
    let nearest = exact.round();
    if (exact - nearest).abs() <= TICK_TOLERANCE * nearest.abs().max(1.0) {
        nearest
    } else {
        exact
    }
}

/// `ceil(duration * tick_rate)`: the frames a timed action stays active.
pub fn ticks(duration: f64, tick_rate: f64) -> u64 {
    tick_span(duration, tick_rate).ceil() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("scenelogic_{}_{}.ini", name, std::process::id()))
    }

    #[test]
    fn test_defaults() {
        let cfg = CompilerConfig::new();
        assert_eq!(cfg.tick_rate, 60.0);
        assert_eq!(cfg.indent_width, 4);
        assert_eq!(cfg.offset, 0);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_invalid_tick_rate() {
        assert!(CompilerConfig::new().with_tick_rate(0.0).validate().is_err());
        assert!(CompilerConfig::new().with_tick_rate(-30.0).validate().is_err());
        assert!(CompilerConfig::new().with_tick_rate(f64::NAN).validate().is_err());
    }

    #[test]
    fn test_ticks_for_rounds_up() {
        let cfg = CompilerConfig::new().with_tick_rate(50.0);
        assert_eq!(cfg.ticks_for(1.0), 50);
        assert_eq!(cfg.ticks_for(0.011), 1);
        assert_eq!(cfg.ticks_for(0.0), 0);
    }

    #[test]
    fn test_ticks_ignore_rounding_noise() {
        assert_eq!(ticks(1.1, 50.0), 55);
        assert_eq!(ticks(0.7, 90.0), 63);
        assert_eq!(ticks(0.3, 30.0), 9);
        assert_eq!(tick_span(1.1, 50.0), 55.0);
        // a real fraction still rounds up
        assert_eq!(ticks(1.01, 50.0), 51);
        assert_eq!(tick_span(0.25, 30.0), 7.5);
    }

    #[test]
    fn test_save_then_load() {
        let path = temp_path("roundtrip");
        let mut cfg = CompilerConfig::with_path(&path);
        cfg.tick_rate = 50.0;
        cfg.indent_width = 2;
        cfg.offset = 1;
        cfg.save_to_file().unwrap();

        let mut loaded = CompilerConfig::with_path(&path);
        loaded.load_from_file().unwrap();
        assert_eq!(loaded.tick_rate, 50.0);
        assert_eq!(loaded.indent_width, 2);
        assert_eq!(loaded.offset, 1);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_load_missing_file_keeps_defaults() {
        let mut cfg = CompilerConfig::with_path(temp_path("missing_does_not_exist"));
        assert!(cfg.load_from_file().is_err());
        assert_eq!(cfg.tick_rate, 60.0);
    }
}
