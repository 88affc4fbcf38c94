//! Watch State
//!
//! The single mutable aggregate of a watch session and its transition
//! functions. Every transition consumes the current state and returns the
//! next snapshot - the event loop holds exactly one snapshot at a time, so
//! no partial mutation is ever observable.
//!
//! # Generations
//!
//! The `generation` counter tracks how many times the operator has accepted
//! the current screen as the new reference. It has three observable
//! regimes:
//!
//! - `1` - no interaction yet: every new sample is compared against the
//!   running `current`.
//! - `2` - one interaction occurred: if the operator has gone idle past one
//!   refresh interval, samples fall back to comparison against the original
//!   `baseline`; otherwise against `current`.
//! - `>= 3` - the baseline is whatever screen the operator last committed.
//!
//! There is no terminal state; the machine runs until the session is
//! cancelled.

use std::time::{Duration, Instant};

use crate::diff::{diff, ChangeSet, DiffConfig};
use crate::grid::TextGrid;
use crate::recognizer::CaptureError;

/// Snapshot of everything the watch session knows.
#[derive(Clone, Debug)]
pub struct WatchState {
    /// Epoch counter, starts at 1 and never decreases.
    pub generation: u64,
    /// Reference grid committed at first sample or by a user action.
    pub baseline: Option<TextGrid>,
    /// Most recently captured grid.
    pub current: Option<TextGrid>,
    /// Changes found by the most recent diff.
    pub changes: ChangeSet,
    /// When the operator last pressed a (non-refresh) key.
    pub last_user_action: Option<Instant>,
    /// When the last sample arrived, successful or not.
    pub last_sample: Option<Instant>,
    /// Samples attempted so far, failures included.
    pub total_samples: u64,
    /// Running total of flagged cells across all applied diffs.
    pub total_changed_cells: u64,
}

impl WatchState {
    /// Fresh session state: generation 1, no grids, no history.
    #[must_use]
    pub fn new() -> Self {
        Self {
            generation: 1,
            baseline: None,
            current: None,
            changes: ChangeSet::new(),
            last_user_action: None,
            last_sample: None,
            total_samples: 0,
            total_changed_cells: 0,
        }
    }

    /// Apply an arrived sample result.
    ///
    /// Every arrival counts as an attempted refresh cycle, so the sample
    /// counter and timestamp advance even on error; a failed capture
    /// changes nothing else (silent skip). The first successful sample
    /// establishes both `baseline` and `current`. Subsequent successes
    /// diff against a comparison reference chosen by generation regime:
    /// generation 2 falls back to the original baseline once the operator
    /// has been idle for more than one refresh interval, otherwise the
    /// immediately preceding sample wins.
    #[must_use]
    pub fn on_sample_arrived(
        mut self,
        outcome: Result<TextGrid, CaptureError>,
        now: Instant,
        refresh_interval: Duration,
        diff_config: &DiffConfig,
    ) -> Self {
        self.total_samples += 1;
        self.last_sample = Some(now);

        let grid = match outcome {
            Ok(grid) => grid,
            Err(error) => {
                tracing::warn!(%error, "capture failed, skipping sample");
                return self;
            }
        };

        if self.current.is_none() {
            self.baseline = Some(grid.clone());
            self.current = Some(grid);
            self.changes = ChangeSet::new();
            return self;
        }

        let idle_past_interval = self
            .last_user_action
            .is_some_and(|t| now.duration_since(t) > refresh_interval);

        let reference = if self.generation == 2 && idle_past_interval {
            self.baseline.as_ref()
        } else {
            self.current.as_ref().or(self.baseline.as_ref())
        };

        let changes = match reference {
            Some(reference) => diff(reference, &grid, diff_config),
            None => ChangeSet::new(),
        };

        // A quiet sample yields an empty set and clears stale highlights.
        self.total_changed_cells += changes.cell_count() as u64;
        self.changes = changes;
        self.current = Some(grid);
        self
    }

    /// Apply a user action (any keypress that is not refresh or quit).
    ///
    /// The first action arms the baseline-fallback window without touching
    /// the baseline itself; every later action commits the current screen
    /// as the new reference. The generation counter advances either way.
    #[must_use]
    pub fn on_user_action(mut self, now: Instant) -> Self {
        self.last_user_action = Some(now);
        if self.generation == 1 {
            self.generation = 2;
        } else {
            if self.current.is_some() {
                self.baseline = self.current.clone();
            }
            self.generation += 1;
        }
        self
    }

    /// Seconds since the last sample arrived, if any has.
    #[must_use]
    pub fn seconds_since_sample(&self, now: Instant) -> Option<u64> {
        self.last_sample.map(|t| now.duration_since(t).as_secs())
    }
}

impl Default for WatchState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const INTERVAL: Duration = Duration::from_secs(5);

    fn grid(lines: &[&str]) -> TextGrid {
        TextGrid::from_text(&lines.join("\n"))
    }

    fn arrived(state: WatchState, grid: TextGrid, now: Instant) -> WatchState {
        state.on_sample_arrived(Ok(grid), now, INTERVAL, &DiffConfig::default())
    }

    #[test]
    fn first_sample_establishes_baseline_and_current() {
        let now = Instant::now();
        let g = grid(&["abc", "def"]);
        let state = arrived(WatchState::new(), g.clone(), now);

        assert_eq!(state.total_samples, 1);
        assert_eq!(state.baseline, Some(g.clone()));
        assert_eq!(state.current, Some(g));
        assert!(state.changes.is_empty());
        assert_eq!(state.last_sample, Some(now));
    }

    #[test]
    fn failed_sample_counts_but_changes_nothing_else() {
        let now = Instant::now();
        let state = arrived(WatchState::new(), grid(&["abc"]), now);

        let failed = state.clone().on_sample_arrived(
            Err(CaptureError::Decode("garbage".into())),
            now + Duration::from_secs(1),
            INTERVAL,
            &DiffConfig::default(),
        );

        assert_eq!(failed.total_samples, state.total_samples + 1);
        assert_eq!(failed.baseline, state.baseline);
        assert_eq!(failed.current, state.current);
        assert_eq!(failed.changes, state.changes);
        assert_eq!(failed.generation, state.generation);
    }

    #[test]
    fn consecutive_samples_diff_against_current() {
        let now = Instant::now();
        let mut state = WatchState::new();
        state = arrived(state, grid(&["abc", "def"]), now);
        state = arrived(state, grid(&["abc", "dez"]), now + Duration::from_secs(5));

        assert_eq!(state.changes.cell_count(), 1);
        assert!(state.changes.contains(1, 2));
        assert_eq!(state.total_changed_cells, 1);

        // An identical follow-up sample produces an empty diff, which
        // replaces the previous highlight set.
        state = arrived(state, grid(&["abc", "dez"]), now + Duration::from_secs(10));
        assert!(state.changes.is_empty());
        assert_eq!(state.total_changed_cells, 1);
    }

    #[test]
    fn quiet_samples_leave_the_counter_alone() {
        let now = Instant::now();
        let mut state = WatchState::new();
        state = arrived(state, grid(&["ab"]), now);
        state = arrived(state, grid(&["ab"]), now + Duration::from_secs(5));
        assert_eq!(state.total_changed_cells, 0);
        assert!(state.changes.is_empty());
    }

    #[test]
    fn generation_advances_and_commits_baseline() {
        let now = Instant::now();
        let first = grid(&["one"]);
        let second = grid(&["two"]);

        let mut state = WatchState::new();
        state = arrived(state, first.clone(), now);
        state = arrived(state, second.clone(), now + Duration::from_secs(5));

        // First action: arms the window, baseline untouched.
        state = state.on_user_action(now + Duration::from_secs(6));
        assert_eq!(state.generation, 2);
        assert_eq!(state.baseline, Some(first));

        // Second action: commits current as the new baseline.
        state = state.on_user_action(now + Duration::from_secs(7));
        assert_eq!(state.generation, 3);
        assert_eq!(state.baseline, Some(second));
    }

    #[test]
    fn generation_two_idle_falls_back_to_original_baseline() {
        let now = Instant::now();
        let original = grid(&["aaa"]);
        let drifted = grid(&["bbb"]);

        let mut state = WatchState::new();
        state = arrived(state, original.clone(), now);
        state = arrived(state, drifted, now + Duration::from_secs(5));
        state = state.on_user_action(now + Duration::from_secs(6));
        assert_eq!(state.generation, 2);

        // Idle for longer than one refresh interval: the next sample is
        // compared against the original baseline, not the drifted current.
        let back_to_original = arrived(state.clone(), original, now + Duration::from_secs(20));
        assert!(back_to_original.changes.is_empty());

        // Active operator (within the interval): comparison uses current.
        let recent = state.on_user_action(now + Duration::from_secs(7));
        assert_eq!(recent.generation, 3);
    }

    #[test]
    fn generation_two_active_compares_against_current() {
        let now = Instant::now();
        let original = grid(&["aaa"]);
        let drifted = grid(&["bbb"]);

        let mut state = WatchState::new();
        state = arrived(state, original.clone(), now);
        state = arrived(state, drifted, now + Duration::from_secs(5));
        state = state.on_user_action(now + Duration::from_secs(6));

        // Sample arrives 2s after the action, inside the 5s interval:
        // reference is `current` ("bbb"), so "aaa" shows as changed.
        let state = arrived(state, original, now + Duration::from_secs(8));
        assert!(!state.changes.is_empty());
    }

    #[test]
    fn state_starts_at_generation_one_with_nothing_sampled() {
        let state = WatchState::new();
        assert_eq!(state.generation, 1);
        assert!(state.baseline.is_none());
        assert!(state.current.is_none());
        assert!(state.changes.is_empty());
        assert_eq!(state.total_samples, 0);
        assert_eq!(state.total_changed_cells, 0);
    }
}
