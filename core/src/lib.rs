//! Termscope Core - Headless Console Watch Logic
//!
//! This crate provides the core logic for watching a remote virtual
//! machine's text console, completely independent of any UI framework.
//! It can drive a TUI, run headless for testing, or back any other
//! surface.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │                   UI Surface (TUI)                    │
//! │   keystrokes / timer ticks        rendered frames     │
//! └───────────────┬───────────────────────▲──────────────┘
//!                 │ WatchEvent            │ WatchState
//! ┌───────────────▼───────────────────────┴──────────────┐
//! │                     TERMSCOPE CORE                    │
//! │  ┌─────────────────────────────────────────────────┐  │
//! │  │                    Watcher                       │  │
//! │  │  ┌──────────┐  ┌──────────┐  ┌───────────────┐  │  │
//! │  │  │  Watch   │  │   Diff   │  │  Recognizer   │  │  │
//! │  │  │  State   │  │  Engine  │  │  (external)   │  │  │
//! │  │  └──────────┘  └──────────┘  └───────────────┘  │  │
//! │  └─────────────────────────────────────────────────┘  │
//! └──────────────────────────────────────────────────────┘
//! ```
//!
//! # Key Types
//!
//! - [`Watcher`]: owns the session state and routes events
//! - [`WatchState`]: the one immutable state snapshot per transition
//! - [`TextGrid`] / [`ChangeSet`]: a decoded screen and a sparse diff
//! - [`Recognizer`]: seam to the external capture pipeline
//! - [`WatchConfig`]: TOML/env-backed session configuration
//!
//! # Module Overview
//!
//! - [`grid`]: decoded console screens and crop regions
//! - [`diff`]: scroll detection, scroll-aware and standard diffs
//! - [`state`]: the watch state machine and its transitions
//! - [`events`]: events from the surface into the watcher
//! - [`watcher`]: the session core tying it all together
//! - [`recognizer`]: the external pipeline seam and command adapter
//! - [`color`]: RGB to terminal color category approximation
//! - [`config`]: configuration loading and validation
//!
//! # No TUI Dependencies
//!
//! This crate has **zero** dependencies on ratatui, crossterm, or any
//! other UI framework. It's pure watch logic that can be used anywhere.

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod color;
pub mod config;
pub mod diff;
pub mod events;
pub mod grid;
pub mod recognizer;
pub mod state;
pub mod watcher;

// Re-exports for convenience
pub use color::{approximate, StyleToken};
pub use config::{
    default_config_path, load_config, load_config_from_path, ConfigError, CropConfig,
    RecognizerConfig, WatchConfig,
};
pub use diff::{detect_scroll, diff, is_scrolled, ChangeSet, DiffConfig};
pub use events::{SampleResult, WatchEvent};
pub use grid::{Cell, CropRegion, Rgb, Row, TextGrid, UNRECOGNIZED};
pub use recognizer::{CaptureError, CaptureRequest, CommandRecognizer, Recognizer};
pub use state::WatchState;
pub use watcher::Watcher;
