//! TOML Configuration File Support
//!
//! Centralized configuration loading for the watch session, backed by a
//! TOML file at `~/.config/termscope/config.toml`.
//!
//! # Configuration Priority
//!
//! Values are resolved with the following priority (highest first):
//! 1. CLI arguments (applied by the binary)
//! 2. Environment variables
//! 3. TOML configuration file
//! 4. Default values
//!
//! # Example Configuration
//!
//! ```toml
//! columns = 80
//! rows = 25
//! color_mode = true
//! filter_blank_lines = false
//! show_line_numbers = true
//! refresh_interval_secs = 5.0
//! capture_timeout_secs = 15.0
//!
//! [crop]
//! enabled = true
//! start_row = 0
//! end_row = 24
//! start_col = 0
//! end_col = 80
//!
//! [recognizer]
//! command = "vmocr"
//! args = ["--session", "vm1"]
//! training_data = "/usr/share/termscope/glyphs.bin"
//!
//! [diff]
//! probe_divisor = 4
//! match_ratio = 0.5
//! focus_divisor = 4
//! focus_min_rows = 3
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::diff::DiffConfig;
use crate::grid::CropRegion;
use crate::recognizer::CaptureRequest;

/// Errors that can occur when loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("failed to read config file at {path}: {source}")]
    Read {
        /// The path that was attempted
        path: PathBuf,
        /// The underlying IO error
        source: std::io::Error,
    },

    /// Failed to parse TOML
    #[error("failed to parse TOML config: {0}")]
    Parse(#[from] toml::de::Error),

    /// Invalid configuration value
    #[error("invalid configuration: {0}")]
    Validation(String),
}

/// Crop settings: restrict recognition to a console sub-rectangle.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CropConfig {
    /// Whether cropping is applied at all.
    pub enabled: bool,
    /// First row to keep.
    pub start_row: usize,
    /// One past the last row to keep.
    pub end_row: usize,
    /// First column to keep.
    pub start_col: usize,
    /// One past the last column to keep.
    pub end_col: usize,
}

impl CropConfig {
    /// The region to pass to the recognizer, if cropping is enabled.
    #[must_use]
    pub fn region(&self) -> Option<CropRegion> {
        self.enabled.then_some(CropRegion {
            start_row: self.start_row,
            end_row: self.end_row,
            start_col: self.start_col,
            end_col: self.end_col,
        })
    }
}

/// How to invoke the external recognizer pipeline.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct RecognizerConfig {
    /// Recognizer executable.
    pub command: String,
    /// Fixed arguments prepended before the per-capture flags.
    pub args: Vec<String>,
    /// Path to the character training data.
    pub training_data: Option<PathBuf>,
}

impl Default for RecognizerConfig {
    fn default() -> Self {
        Self {
            command: "termscope-recognizer".to_string(),
            args: Vec::new(),
            training_data: None,
        }
    }
}

/// Complete watch session configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    /// Expected console width in columns, passed to the recognizer.
    pub columns: Option<u32>,
    /// Expected console height in rows, passed to the recognizer.
    pub rows: Option<u32>,
    /// Crop settings.
    pub crop: CropConfig,
    /// Whether to render the recognizer's per-character colors.
    pub color_mode: bool,
    /// Whether to drop blank console rows from the rendered panel.
    pub filter_blank_lines: bool,
    /// Whether to prefix rendered rows with their console line number.
    pub show_line_numbers: bool,
    /// Seconds between scheduled captures.
    pub refresh_interval_secs: f64,
    /// Upper bound on a single capture, to keep backlog bounded when the
    /// recognizer wedges.
    pub capture_timeout_secs: f64,
    /// Recognizer invocation.
    pub recognizer: RecognizerConfig,
    /// Diff heuristics.
    pub diff: DiffConfig,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            columns: None,
            rows: None,
            crop: CropConfig::default(),
            color_mode: false,
            filter_blank_lines: false,
            show_line_numbers: false,
            refresh_interval_secs: 5.0,
            capture_timeout_secs: 15.0,
            recognizer: RecognizerConfig::default(),
            diff: DiffConfig::default(),
        }
    }
}

impl WatchConfig {
    /// The scheduled capture cadence.
    #[must_use]
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs_f64(self.refresh_interval_secs)
    }

    /// Per-capture timeout.
    #[must_use]
    pub fn capture_timeout(&self) -> Duration {
        Duration::from_secs_f64(self.capture_timeout_secs)
    }

    /// Build the request handed to the recognizer for each capture.
    #[must_use]
    pub fn capture_request(&self) -> CaptureRequest {
        CaptureRequest {
            columns: self.columns,
            rows: self.rows,
            crop: self.crop.region(),
            training_data: self.recognizer.training_data.clone(),
            color_sampling: self.color_mode,
        }
    }

    /// Apply environment variable overrides (`TERMSCOPE_*`).
    pub fn apply_env(&mut self) {
        if let Some(interval) = env_parse::<f64>("TERMSCOPE_INTERVAL") {
            self.refresh_interval_secs = interval;
        }
        if let Some(timeout) = env_parse::<f64>("TERMSCOPE_CAPTURE_TIMEOUT") {
            self.capture_timeout_secs = timeout;
        }
        if let Ok(command) = std::env::var("TERMSCOPE_RECOGNIZER") {
            if !command.is_empty() {
                self.recognizer.command = command;
            }
        }
        if let Ok(path) = std::env::var("TERMSCOPE_TRAINING_DATA") {
            if !path.is_empty() {
                self.recognizer.training_data = Some(PathBuf::from(path));
            }
        }
        if let Some(color) = env_flag("TERMSCOPE_COLOR") {
            self.color_mode = color;
        }
    }

    /// Reject configurations the session cannot run with.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] for non-positive intervals,
    /// inverted crop ranges, or out-of-range diff heuristics.
    pub fn validate(&self) -> Result<(), ConfigError> {
        // is_finite() is false for NaN, so these guards reject NaN too;
        // the values feed Duration::from_secs_f64, which panics on both.
        if !self.refresh_interval_secs.is_finite() || self.refresh_interval_secs <= 0.0 {
            return Err(ConfigError::Validation(
                "refresh_interval_secs must be a positive finite number".to_string(),
            ));
        }
        if !self.capture_timeout_secs.is_finite() || self.capture_timeout_secs <= 0.0 {
            return Err(ConfigError::Validation(
                "capture_timeout_secs must be a positive finite number".to_string(),
            ));
        }
        if self.crop.enabled
            && (self.crop.start_row >= self.crop.end_row
                || self.crop.start_col >= self.crop.end_col)
        {
            return Err(ConfigError::Validation(
                "crop region must have positive extent".to_string(),
            ));
        }
        if self.diff.probe_divisor == 0 || self.diff.focus_divisor == 0 {
            return Err(ConfigError::Validation(
                "diff divisors must be at least 1".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.diff.match_ratio) || self.diff.match_ratio == 0.0 {
            return Err(ConfigError::Validation(
                "diff match_ratio must be in (0, 1]".to_string(),
            ));
        }
        Ok(())
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.parse().ok())
}

fn env_flag(name: &str) -> Option<bool> {
    std::env::var(name)
        .ok()
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
}

/// Default config file path, XDG-compliant.
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("termscope").join("config.toml"))
}

/// Load configuration from an explicit path.
///
/// # Errors
///
/// Returns [`ConfigError`] if the file cannot be read, parsed, or fails
/// validation.
pub fn load_config_from_path(path: &Path) -> Result<WatchConfig, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let mut config: WatchConfig = toml::from_str(&contents)?;
    config.apply_env();
    config.validate()?;
    Ok(config)
}

/// Load configuration from the default location, or defaults if absent.
///
/// A missing file is not an error - the session runs on defaults plus
/// environment overrides. An unreadable or invalid file is.
///
/// # Errors
///
/// Returns [`ConfigError`] if an existing file cannot be read, parsed, or
/// fails validation.
pub fn load_config(path: Option<&Path>) -> Result<WatchConfig, ConfigError> {
    let resolved = path.map(Path::to_path_buf).or_else(default_config_path);

    match resolved {
        Some(ref file) if file.exists() => load_config_from_path(file),
        _ => {
            let mut config = WatchConfig::default();
            config.apply_env();
            config.validate()?;
            Ok(config)
        }
    }
}
