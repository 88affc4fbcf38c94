//! Theme and Colors
//!
//! The termscope palette: a dim chrome that stays out of the way of the
//! watched console, with a single warm highlight for changed cells.

use ratatui::style::Color;

/// Background applied to cells flagged by the diff engine.
pub const CHANGE_HIGHLIGHT: Color = Color::Rgb(130, 80, 0);

/// Foreground for the unrecognized-character placeholder.
pub const ERROR_FG: Color = Color::Rgb(255, 80, 80);

/// Status line text.
pub const STATUS_FG: Color = Color::Rgb(150, 180, 255);

/// Footer / control legend text.
pub const DIM_GRAY: Color = Color::Rgb(100, 100, 100);

/// Line number gutter.
pub const GUTTER_FG: Color = Color::Rgb(85, 85, 85);

/// Waiting-for-first-capture placeholder text.
pub const WAITING_FG: Color = Color::Rgb(120, 120, 120);
