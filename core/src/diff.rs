//! Diff Engine
//!
//! Pure comparison of two [`TextGrid`] snapshots into a sparse [`ChangeSet`].
//!
//! Consoles append at the bottom and discard at the top, so a naive
//! full-grid diff against a stale reference flags nearly the whole screen
//! after any scroll. The engine therefore runs scroll detection first: when
//! a probe of the sample's head rows reappears lower down in the reference,
//! the sample is classified as a scrolled continuation. The diff then aligns
//! the reference by the detected offset and narrows comparison to the bottom
//! focus window where new content lands; rows above the window are never
//! flagged, which absorbs the "everything moved" noise of a scroll.
//!
//! All heuristic constants are tuned empirically, not derived, and live in
//! [`DiffConfig`] so deployments can adjust them.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::grid::TextGrid;

/// Tunable heuristics for scroll detection and the scroll-aware diff.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct DiffConfig {
    /// Scroll probe depth: `min(len(reference), len(sample)) / probe_divisor`
    /// head rows of the sample (at least one) are matched against the
    /// reference.
    pub probe_divisor: usize,
    /// Fraction of probed row pairs that must match textually for the
    /// sample to be classified as scrolled (ceiling applied).
    pub match_ratio: f64,
    /// Focus window size for the scroll-aware diff:
    /// `len(sample) / focus_divisor` rows at the bottom of the sample.
    pub focus_divisor: usize,
    /// Lower bound on the focus window, so short screens still get a
    /// useful comparison region.
    pub focus_min_rows: usize,
}

impl Default for DiffConfig {
    fn default() -> Self {
        Self {
            probe_divisor: 4,
            match_ratio: 0.5,
            focus_divisor: 4,
            focus_min_rows: 3,
        }
    }
}

/// Sparse map of cells that differ between two grids.
///
/// Row index to the set of changed column indices; a missing row key means
/// "no changes in that row". Built fresh by every [`diff`] call and never
/// mutated in place afterwards.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ChangeSet {
    cells: HashMap<usize, HashSet<usize>>,
}

impl ChangeSet {
    /// An empty change set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Flag one cell as changed.
    pub fn insert(&mut self, row: usize, col: usize) {
        self.cells.entry(row).or_default().insert(col);
    }

    /// Whether a specific cell is flagged.
    #[must_use]
    pub fn contains(&self, row: usize, col: usize) -> bool {
        self.cells.get(&row).is_some_and(|cols| cols.contains(&col))
    }

    /// The changed columns of one row, if any.
    #[must_use]
    pub fn row(&self, row: usize) -> Option<&HashSet<usize>> {
        self.cells.get(&row)
    }

    /// Indices of all rows with at least one flagged cell.
    pub fn rows(&self) -> impl Iterator<Item = usize> + '_ {
        self.cells.keys().copied()
    }

    /// Total number of flagged cells across all rows.
    #[must_use]
    pub fn cell_count(&self) -> usize {
        self.cells.values().map(HashSet::len).sum()
    }

    /// Whether no cell is flagged.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// Compare a sample against its reference.
///
/// Pure and deterministic: identical grids always yield an empty set, and
/// `diff(g, g)` is empty for any `g`.
#[must_use]
pub fn diff(reference: &TextGrid, sample: &TextGrid, config: &DiffConfig) -> ChangeSet {
    match detect_scroll(reference, sample, config) {
        Some(offset) => scroll_aware_diff(reference, sample, offset, config),
        None => standard_diff(reference, sample),
    }
}

/// Classify the sample as a scrolled continuation of the reference.
#[must_use]
pub fn is_scrolled(reference: &TextGrid, sample: &TextGrid, config: &DiffConfig) -> bool {
    detect_scroll(reference, sample, config).is_some()
}

/// Find the scroll offset, if the sample looks like a scrolled reference.
///
/// A scroll of `s` rows leaves reference row `s + i` at sample row `i`, so
/// the probe (the first `k = max(1, n / probe_divisor)` sample rows) is slid
/// across every candidate offset; the smallest offset where at least
/// `ceil(k * match_ratio)` pairs are textually identical wins. Grids shorter
/// than two rows are never classified as scrolled.
#[must_use]
pub fn detect_scroll(
    reference: &TextGrid,
    sample: &TextGrid,
    config: &DiffConfig,
) -> Option<usize> {
    let n = reference.len().min(sample.len());
    if n < 2 {
        return None;
    }

    let probe = (n / config.probe_divisor.max(1)).max(1);

    // Ceiling of probe * ratio: with the default 0.5 this is ceil(k/2).
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_sign_loss,
        clippy::cast_possible_truncation
    )]
    let needed = (((probe as f64) * config.match_ratio).ceil() as usize).max(1);

    (1..=reference.len().saturating_sub(probe)).find(|&offset| {
        let matching = (0..probe)
            .filter(|&i| {
                TextGrid::rows_text_equal(&reference.rows()[offset + i], &sample.rows()[i])
            })
            .count();
        matching >= needed
    })
}

/// Diff restricted to the bottom focus window of the sample.
///
/// Sample row `i` is compared against reference row `i + offset`; columns
/// past the end of the aligned reference row count as new trailing content,
/// and a sample row past the end of the reference is entirely new. Rows
/// above the window are deliberately ignored, even if they differ.
fn scroll_aware_diff(
    reference: &TextGrid,
    sample: &TextGrid,
    offset: usize,
    config: &DiffConfig,
) -> ChangeSet {
    let mut changes = ChangeSet::new();

    let focus = (sample.len() / config.focus_divisor.max(1))
        .max(config.focus_min_rows)
        .min(sample.len())
        .max(1);

    for row in sample.len().saturating_sub(focus)..sample.len() {
        let sample_row = &sample.rows()[row];
        let reference_row = reference.rows().get(row + offset);

        for (col, cell) in sample_row.iter().enumerate() {
            let reference_ch = reference_row.and_then(|r| r.get(col)).map(|c| c.ch);
            if reference_ch != Some(cell.ch) {
                changes.insert(row, col);
            }
        }
    }

    changes
}

/// Full-grid diff: every row, character by character.
///
/// Rows or characters past the end of either grid are treated as absent,
/// which is unequal to any real character.
fn standard_diff(reference: &TextGrid, sample: &TextGrid) -> ChangeSet {
    let mut changes = ChangeSet::new();

    for row in 0..reference.len().max(sample.len()) {
        let reference_row = reference.rows().get(row);
        let sample_row = sample.rows().get(row);

        let reference_len = reference_row.map_or(0, Vec::len);
        let sample_len = sample_row.map_or(0, Vec::len);

        for col in 0..reference_len.max(sample_len) {
            let a = reference_row.and_then(|r| r.get(col)).map(|c| c.ch);
            let b = sample_row.and_then(|r| r.get(col)).map(|c| c.ch);
            if a != b {
                changes.insert(row, col);
            }
        }
    }

    changes
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn grid(lines: &[&str]) -> TextGrid {
        TextGrid::from_text(&lines.join("\n"))
    }

    #[test]
    fn identical_grids_diff_to_empty() {
        let g = grid(&["abc", "def", "ghi"]);
        assert!(diff(&g, &g, &DiffConfig::default()).is_empty());
    }

    #[test]
    fn single_edit_flags_exactly_one_cell() {
        let a = grid(&["abc", "def"]);
        let b = grid(&["abc", "dez"]);
        let config = DiffConfig::default();

        assert!(!is_scrolled(&a, &b, &config));

        let changes = diff(&a, &b, &config);
        assert_eq!(changes.cell_count(), 1);
        assert!(changes.contains(1, 2));
    }

    #[test]
    fn short_grids_never_classify_as_scrolled() {
        let a = grid(&["abc"]);
        let b = grid(&["xyz"]);
        assert!(!is_scrolled(&a, &b, &DiffConfig::default()));
    }

    #[test]
    fn empty_reference_degenerates_to_all_new() {
        let empty = TextGrid::default();
        let b = grid(&["ab", "cd"]);
        let config = DiffConfig::default();

        assert!(!is_scrolled(&empty, &b, &config));

        let changes = diff(&empty, &b, &config);
        assert_eq!(changes.cell_count(), 4);
        assert!(changes.contains(0, 0));
        assert!(changes.contains(1, 1));
    }

    #[test]
    fn empty_sample_flags_every_reference_cell() {
        let a = grid(&["ab"]);
        let empty = TextGrid::default();
        let changes = diff(&a, &empty, &DiffConfig::default());
        assert_eq!(changes.cell_count(), 2);
    }

    #[test]
    fn one_line_scroll_is_detected() {
        let a = grid(&["line1", "line2", "line3", "line4"]);
        let b = grid(&["line2", "line3", "line4", "line5"]);
        assert_eq!(detect_scroll(&a, &b, &DiffConfig::default()), Some(1));
    }

    #[test]
    fn one_line_scroll_flags_only_the_new_bottom_row() {
        let a = grid(&["line1", "line2", "line3", "line4"]);
        let b = grid(&["line2", "line3", "line4", "line5"]);
        let changes = diff(&a, &b, &DiffConfig::default());

        // Rows 0-2 slid up but align with the reference; only the new
        // bottom row, compared against an out-of-range reference row, is
        // flagged - all five of its cells.
        assert!(changes.row(0).is_none());
        assert!(changes.row(1).is_none());
        assert!(changes.row(2).is_none());
        assert_eq!(changes.cell_count(), 5);
        assert!(changes.contains(3, 0));
        assert!(changes.contains(3, 4));
    }

    #[test]
    fn rows_above_focus_window_are_tolerated() {
        let a = grid(&[
            "aaaa", "bbbb", "cccc", "dddd", "eeee", "ffff", "gggg", "hhhh",
        ]);
        // Scroll by two: the sample head matches the reference two rows down.
        let b = grid(&[
            "cccc", "dddd", "eeee", "ffff", "gggg", "hhhh", "iiii", "jjjj",
        ]);
        let config = DiffConfig::default();
        assert_eq!(detect_scroll(&a, &b, &config), Some(2));

        let changes = diff(&a, &b, &config);
        // Focus window is max(8/4, 3) = 3 rows: indices 5..8 only.
        for row in changes.rows() {
            assert!(row >= 5, "row {row} flagged outside focus window");
        }
        assert!(!changes.is_empty());
    }

    #[test]
    fn scroll_diff_flags_trailing_new_content() {
        let a = grid(&["aaaa", "bbbb", "cccc", "dddd", "ee"]);
        let b = grid(&["bbbb", "cccc", "dddd", "ee more", "xxxx"]);
        let config = DiffConfig::default();
        assert_eq!(detect_scroll(&a, &b, &config), Some(1));

        let changes = diff(&a, &b, &config);
        // Sample row 3 aligns with reference row 4 ("ee"): only the
        // trailing " more" columns are new. The appended bottom row is
        // entirely new content.
        assert!(changes.row(2).is_none());
        assert!(!changes.contains(3, 0));
        assert!(!changes.contains(3, 1));
        assert!(changes.contains(3, 2));
        assert!(changes.contains(3, 6));
        assert!(changes.contains(4, 0));
        assert!(changes.contains(4, 3));
    }

    #[test]
    fn probe_match_threshold_is_fuzzy() {
        // 8 rows probe 2 deep: ceil(2 * 0.5) = 1 matching pair suffices,
        // so a scroll with one noisy probe row still classifies.
        let a = grid(&[
            "aaaa", "bbbb", "cccc", "dddd", "eeee", "ffff", "gggg", "hhhh",
        ]);
        let b = grid(&[
            "gggg", "zzzz", "cccc", "dddd", "eeee", "ffff", "qqqq", "rrrr",
        ]);
        assert!(is_scrolled(&a, &b, &DiffConfig::default()));
    }

    #[test]
    fn custom_heuristics_are_honored() {
        let config = DiffConfig {
            match_ratio: 1.0,
            ..DiffConfig::default()
        };
        // Only one of the two probed pairs can ever match; ratio 1.0
        // demands both.
        let a = grid(&[
            "aaaa", "bbbb", "cccc", "dddd", "eeee", "ffff", "gggg", "hhhh",
        ]);
        let b = grid(&[
            "gggg", "zzzz", "cccc", "dddd", "eeee", "ffff", "qqqq", "rrrr",
        ]);
        assert!(!is_scrolled(&a, &b, &config));
    }

    #[test]
    fn ragged_rows_flag_the_missing_tail() {
        let a = grid(&["abcdef", "x"]);
        let b = grid(&["abc", "x"]);
        let changes = diff(&a, &b, &DiffConfig::default());
        assert_eq!(changes.cell_count(), 3);
        assert!(changes.contains(0, 3));
        assert!(changes.contains(0, 5));
    }
}
