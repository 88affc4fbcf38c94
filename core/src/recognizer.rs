//! Recognizer Interface
//!
//! The capture and character-recognition pipeline is an external
//! collaborator: it photographs the remote console and decodes the frame
//! into a [`TextGrid`]. This module defines the seam the watcher talks
//! through, plus [`CommandRecognizer`], an adapter that runs the pipeline
//! as a child process per capture and decodes its stdout.
//!
//! On failure a capture returns an error with no partial result. The
//! watcher treats every failure as non-fatal: the attempt is counted and
//! the loop tries again on the next tick.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

use crate::grid::{Cell, CropRegion, Rgb, TextGrid, UNRECOGNIZED};

/// Why a capture attempt produced no grid.
#[derive(Debug, Error)]
pub enum CaptureError {
    /// The recognizer process could not be launched.
    #[error("failed to launch recognizer `{command}`: {source}")]
    Spawn {
        /// The command that was attempted
        command: String,
        /// The underlying IO error
        #[source]
        source: std::io::Error,
    },

    /// The recognizer ran but reported failure.
    #[error("recognizer exited with {status}: {stderr}")]
    Failed {
        /// Exit status of the recognizer process
        status: std::process::ExitStatus,
        /// Captured stderr, trimmed
        stderr: String,
    },

    /// The recognizer produced output the adapter could not decode.
    #[error("could not decode recognizer output: {0}")]
    Decode(String),

    /// The capture did not complete within the configured timeout.
    #[error("capture timed out after {0:.1?}")]
    TimedOut(Duration),
}

/// Everything a recognizer needs to know about one capture.
#[derive(Clone, Debug, Default)]
pub struct CaptureRequest {
    /// Expected console width in columns, if known.
    pub columns: Option<u32>,
    /// Expected console height in rows, if known.
    pub rows: Option<u32>,
    /// Region of the console to decode, when cropping is enabled.
    pub crop: Option<CropRegion>,
    /// Path to the character training data the pipeline should use.
    pub training_data: Option<PathBuf>,
    /// Whether per-character color sampling is requested.
    pub color_sampling: bool,
}

/// The external capture-and-decode pipeline, seen from the watcher.
#[async_trait]
pub trait Recognizer: Send + Sync {
    /// Human-readable name, used in logs.
    fn name(&self) -> &str;

    /// Capture the console once and decode it into a grid.
    ///
    /// Must not return partial results: either a complete grid or an
    /// error. Unrecognized characters are represented by
    /// [`UNRECOGNIZED`].
    async fn capture(&self, request: &CaptureRequest) -> Result<TextGrid, CaptureError>;
}

/// One decoded cell on the recognizer wire format.
#[derive(Debug, Deserialize)]
struct WireCell {
    /// Decoded character; empty means unrecognized.
    #[serde(default)]
    ch: String,
    /// Sampled foreground color, when color sampling ran.
    #[serde(default)]
    rgb: Option<[u8; 3]>,
}

/// Adapter that runs an external recognizer command per capture.
///
/// The command receives the capture parameters as CLI flags and writes the
/// decoded screen to stdout: plain text (one console row per line), or -
/// when color sampling is requested - newline-delimited JSON, one array of
/// cell objects per console row:
///
/// ```json
/// [{"ch":"l","rgb":[170,170,170]},{"ch":"s","rgb":[170,170,170]}]
/// ```
#[derive(Clone, Debug)]
pub struct CommandRecognizer {
    program: String,
    args: Vec<String>,
}

impl CommandRecognizer {
    /// Create an adapter for the given recognizer command.
    #[must_use]
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    fn build_args(&self, request: &CaptureRequest) -> Vec<String> {
        let mut args = self.args.clone();

        if let Some(columns) = request.columns {
            args.push("--columns".into());
            args.push(columns.to_string());
        }
        if let Some(rows) = request.rows {
            args.push("--rows".into());
            args.push(rows.to_string());
        }
        if let Some(crop) = &request.crop {
            args.push("--crop".into());
            args.push(format!(
                "{},{},{},{}",
                crop.start_row, crop.end_row, crop.start_col, crop.end_col
            ));
        }
        if let Some(path) = &request.training_data {
            args.push("--training-data".into());
            args.push(path.display().to_string());
        }
        if request.color_sampling {
            args.push("--colors".into());
        }

        args
    }

    fn decode_plain(stdout: &str) -> TextGrid {
        TextGrid::from_text(stdout)
    }

    fn decode_colored(stdout: &str) -> Result<TextGrid, CaptureError> {
        let mut rows = Vec::new();

        for line in stdout.lines().filter(|l| !l.trim().is_empty()) {
            let cells: Vec<WireCell> = serde_json::from_str(line)
                .map_err(|e| CaptureError::Decode(format!("bad row json: {e}")))?;

            rows.push(
                cells
                    .into_iter()
                    .map(|cell| Cell {
                        ch: cell.ch.chars().next().unwrap_or(UNRECOGNIZED),
                        color: cell.rgb.map(|[r, g, b]| Rgb::new(r, g, b)),
                    })
                    .collect(),
            );
        }

        Ok(TextGrid::new(rows))
    }
}

#[async_trait]
impl Recognizer for CommandRecognizer {
    fn name(&self) -> &str {
        &self.program
    }

    async fn capture(&self, request: &CaptureRequest) -> Result<TextGrid, CaptureError> {
        let args = self.build_args(request);

        tracing::debug!(program = %self.program, ?args, "spawning recognizer");

        let output = tokio::process::Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| CaptureError::Spawn {
                command: self.program.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(CaptureError::Failed {
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();

        if request.color_sampling {
            Self::decode_colored(&stdout)
        } else {
            Ok(Self::decode_plain(&stdout))
        }
    }
}
