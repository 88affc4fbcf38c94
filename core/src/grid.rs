//! Text Grid
//!
//! The decoded console screen as produced by a [`Recognizer`] capture:
//! an ordered sequence of rows, each an ordered sequence of cells. A grid
//! is built fresh on every sample and never mutated afterwards - the diff
//! engine and the renderer both treat it as an immutable snapshot.
//!
//! [`Recognizer`]: crate::recognizer::Recognizer

use serde::{Deserialize, Serialize};

/// Reserved placeholder for characters the recognizer could not decode.
///
/// The recognition pipeline emits this for any glyph that has no match in
/// its training data. The renderer always draws it with the error style,
/// regardless of color mode.
pub const UNRECOGNIZED: char = '\u{FFFD}';

/// A sampled foreground color for a single cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb {
    /// Red component
    pub r: u8,
    /// Green component
    pub g: u8,
    /// Blue component
    pub b: u8,
}

impl Rgb {
    /// Create a color from its components.
    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

/// One decoded console character plus its optional color side channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Cell {
    /// The decoded character (or [`UNRECOGNIZED`])
    pub ch: char,
    /// Sampled foreground color, present only when color sampling ran
    pub color: Option<Rgb>,
}

impl Cell {
    /// A plain cell with no color information.
    #[must_use]
    pub const fn plain(ch: char) -> Self {
        Self { ch, color: None }
    }

    /// Whether this cell holds the unrecognized-character placeholder.
    #[must_use]
    pub fn is_unrecognized(&self) -> bool {
        self.ch == UNRECOGNIZED
    }
}

/// A single console row.
pub type Row = Vec<Cell>;

/// Rectangular region of the console to keep when cropping is enabled.
///
/// Row and column ranges are half-open: `start` inclusive, `end` exclusive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CropRegion {
    /// First row to keep
    pub start_row: usize,
    /// One past the last row to keep
    pub end_row: usize,
    /// First column to keep
    pub start_col: usize,
    /// One past the last column to keep
    pub end_col: usize,
}

/// A decoded console screen: rows of cells, not necessarily fixed width.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TextGrid {
    rows: Vec<Row>,
}

impl TextGrid {
    /// Create a grid from pre-built rows.
    #[must_use]
    pub fn new(rows: Vec<Row>) -> Self {
        Self { rows }
    }

    /// Build a grid from plain text, one console row per line.
    ///
    /// Cells carry no color information; the recognizer's color side channel
    /// is only available through its structured output format.
    #[must_use]
    pub fn from_text(text: &str) -> Self {
        let rows = text
            .lines()
            .map(|line| line.chars().map(Cell::plain).collect())
            .collect();
        Self { rows }
    }

    /// All rows, top to bottom.
    #[must_use]
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the grid has no rows at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The text of one row, colors stripped. Empty for out-of-range rows.
    #[must_use]
    pub fn row_text(&self, row: usize) -> String {
        self.rows
            .get(row)
            .map(|r| r.iter().map(|c| c.ch).collect())
            .unwrap_or_default()
    }

    /// Whether a row contains only whitespace (or is out of range).
    #[must_use]
    pub fn is_blank_row(&self, row: usize) -> bool {
        self.rows
            .get(row)
            .map_or(true, |r| r.iter().all(|c| c.ch.is_whitespace()))
    }

    /// A copy of this grid restricted to the given region.
    ///
    /// Out-of-range bounds are clamped; an inverted range yields empty
    /// rows rather than panicking.
    #[must_use]
    pub fn crop(&self, region: &CropRegion) -> Self {
        let row_end = region.end_row.min(self.rows.len());
        let row_start = region.start_row.min(row_end);

        let rows = self.rows[row_start..row_end]
            .iter()
            .map(|row| {
                let col_end = region.end_col.min(row.len());
                let col_start = region.start_col.min(col_end);
                row[col_start..col_end].to_vec()
            })
            .collect();

        Self { rows }
    }

    /// Whether two rows hold the same text, colors ignored.
    ///
    /// Used by scroll detection, which cares about content identity only -
    /// color sampling jitters between captures of identical text.
    #[must_use]
    pub fn rows_text_equal(a: &[Cell], b: &[Cell]) -> bool {
        a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.ch == y.ch)
    }
}
