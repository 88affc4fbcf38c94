//! Color Approximation
//!
//! Maps the recognizer's sampled RGB side channel onto the closed set of
//! sixteen terminal color categories. Classification is deterministic
//! nearest-neighbor over a fixed reference palette (squared distance,
//! first minimum wins), so identical samples always render identically.

use serde::{Deserialize, Serialize};

use crate::grid::Rgb;

/// Discrete terminal color category a sampled RGB triplet maps to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum StyleToken {
    /// ANSI black
    Black,
    /// ANSI red
    Red,
    /// ANSI green
    Green,
    /// ANSI yellow
    Yellow,
    /// ANSI blue
    Blue,
    /// ANSI magenta
    Magenta,
    /// ANSI cyan
    Cyan,
    /// ANSI white (light gray)
    White,
    /// Bright black (dark gray)
    BrightBlack,
    /// Bright red
    BrightRed,
    /// Bright green
    BrightGreen,
    /// Bright yellow
    BrightYellow,
    /// Bright blue
    BrightBlue,
    /// Bright magenta
    BrightMagenta,
    /// Bright cyan
    BrightCyan,
    /// Bright white
    BrightWhite,
}

/// Reference palette: the classic VGA console colors.
const PALETTE: [(StyleToken, Rgb); 16] = [
    (StyleToken::Black, Rgb::new(0, 0, 0)),
    (StyleToken::Red, Rgb::new(170, 0, 0)),
    (StyleToken::Green, Rgb::new(0, 170, 0)),
    (StyleToken::Yellow, Rgb::new(170, 85, 0)),
    (StyleToken::Blue, Rgb::new(0, 0, 170)),
    (StyleToken::Magenta, Rgb::new(170, 0, 170)),
    (StyleToken::Cyan, Rgb::new(0, 170, 170)),
    (StyleToken::White, Rgb::new(170, 170, 170)),
    (StyleToken::BrightBlack, Rgb::new(85, 85, 85)),
    (StyleToken::BrightRed, Rgb::new(255, 85, 85)),
    (StyleToken::BrightGreen, Rgb::new(85, 255, 85)),
    (StyleToken::BrightYellow, Rgb::new(255, 255, 85)),
    (StyleToken::BrightBlue, Rgb::new(85, 85, 255)),
    (StyleToken::BrightMagenta, Rgb::new(255, 85, 255)),
    (StyleToken::BrightCyan, Rgb::new(85, 255, 255)),
    (StyleToken::BrightWhite, Rgb::new(255, 255, 255)),
];

/// Classify a sampled color as its nearest terminal category.
#[must_use]
pub fn approximate(color: Rgb) -> StyleToken {
    let mut best = StyleToken::White;
    let mut best_distance = u32::MAX;

    for (token, reference) in PALETTE {
        let d = distance(color, reference);
        if d < best_distance {
            best = token;
            best_distance = d;
        }
    }

    best
}

fn distance(a: Rgb, b: Rgb) -> u32 {
    let dr = i32::from(a.r) - i32::from(b.r);
    let dg = i32::from(a.g) - i32::from(b.g);
    let db = i32::from(a.b) - i32::from(b.b);
    (dr * dr + dg * dg + db * db) as u32
}
