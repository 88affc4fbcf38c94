//! Watcher - The Watch Session Core
//!
//! The Watcher owns the single [`WatchState`] snapshot and turns surface
//! events into state transitions. It is UI-agnostic: a TUI, a test harness,
//! or a headless runner all drive it the same way:
//!
//! 1. Route [`WatchEvent`]s in via [`Watcher::handle_event`]
//! 2. Call [`Watcher::poll_samples`] regularly to apply arrived captures
//! 3. Render from [`Watcher::state`]
//!
//! # Concurrency
//!
//! All state transitions happen on the caller's loop; capture work is the
//! only thing that leaves it. Each tick or manual refresh spawns a capture
//! task that talks to the recognizer off-loop and sends its result back
//! over a channel, so keystrokes and the next tick are never delayed by a
//! slow capture. Overlapping captures are not deduplicated; instead every
//! issued capture carries a sequence stamp and [`Watcher::poll_samples`]
//! discards results whose stamp is at or below the last applied one, so a
//! slow stale capture can never overwrite a faster recent one.
//!
//! Dropping the Watcher abandons in-flight captures: their late sends go
//! to a closed channel and are never applied.

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::mpsc;

use crate::config::WatchConfig;
use crate::events::{SampleResult, WatchEvent};
use crate::recognizer::{CaptureError, Recognizer};
use crate::state::WatchState;

/// Buffered capture results awaiting application.
const RESULT_CHANNEL_CAPACITY: usize = 32;

/// Headless watch session core.
pub struct Watcher<R: Recognizer + 'static> {
    /// Configuration
    config: WatchConfig,
    /// The external capture pipeline
    recognizer: Arc<R>,
    /// The one current state snapshot
    state: WatchState,
    /// Stamp handed to the most recently issued capture
    issued_seq: u64,
    /// Stamp of the most recently applied capture
    applied_seq: u64,
    /// Capture results flowing back from spawned tasks
    results_tx: mpsc::Sender<SampleResult>,
    results_rx: mpsc::Receiver<SampleResult>,
}

impl<R: Recognizer + 'static> Watcher<R> {
    /// Create a watcher for one console stream.
    #[must_use]
    pub fn new(recognizer: R, config: WatchConfig) -> Self {
        let (results_tx, results_rx) = mpsc::channel(RESULT_CHANNEL_CAPACITY);
        Self {
            config,
            recognizer: Arc::new(recognizer),
            state: WatchState::new(),
            issued_seq: 0,
            applied_seq: 0,
            results_tx,
            results_rx,
        }
    }

    /// The current state snapshot.
    #[must_use]
    pub fn state(&self) -> &WatchState {
        &self.state
    }

    /// The session configuration.
    #[must_use]
    pub fn config(&self) -> &WatchConfig {
        &self.config
    }

    /// Route one surface event into the session.
    pub fn handle_event(&mut self, event: WatchEvent) {
        match event {
            WatchEvent::Tick | WatchEvent::ManualRefresh => self.request_capture(),
            WatchEvent::UserAction => {
                let next = std::mem::take(&mut self.state).on_user_action(Instant::now());
                tracing::debug!(generation = next.generation, "user action applied");
                self.state = next;
            }
        }
    }

    /// Issue a capture without blocking the caller.
    fn request_capture(&mut self) {
        self.issued_seq += 1;
        let seq = self.issued_seq;

        let recognizer = Arc::clone(&self.recognizer);
        let request = self.config.capture_request();
        let timeout = self.config.capture_timeout();
        let tx = self.results_tx.clone();

        tracing::debug!(seq, recognizer = recognizer.name(), "capture issued");

        tokio::spawn(async move {
            let result = match tokio::time::timeout(timeout, recognizer.capture(&request)).await {
                Ok(result) => result,
                Err(_) => Err(CaptureError::TimedOut(timeout)),
            };

            // The watcher may be gone by the time a slow capture finishes;
            // an abandoned result is simply dropped.
            let _ = tx.send(SampleResult { seq, result }).await;
        });
    }

    /// Apply every capture result that has arrived so far.
    ///
    /// Results are applied in the order they were received, which - with
    /// overlapping captures - is not necessarily the order they were
    /// issued. Stale results (stamped at or below the last applied one)
    /// are discarded rather than allowed to overwrite newer state.
    ///
    /// Returns the number of results applied.
    pub fn poll_samples(&mut self) -> usize {
        let mut applied = 0;

        while let Ok(sample) = self.results_rx.try_recv() {
            if sample.seq <= self.applied_seq {
                tracing::debug!(
                    seq = sample.seq,
                    applied_seq = self.applied_seq,
                    "discarding stale capture result"
                );
                continue;
            }
            self.applied_seq = sample.seq;

            let next = std::mem::take(&mut self.state).on_sample_arrived(
                sample.result,
                Instant::now(),
                self.config.refresh_interval(),
                &self.config.diff,
            );
            self.state = next;
            applied += 1;
        }

        applied
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::TextGrid;
    use crate::recognizer::CaptureRequest;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Recognizer that replays a scripted sequence of outcomes.
    struct ScriptedRecognizer {
        outcomes: Mutex<VecDeque<Result<TextGrid, CaptureError>>>,
    }

    impl ScriptedRecognizer {
        fn new(outcomes: Vec<Result<TextGrid, CaptureError>>) -> Self {
            Self {
                outcomes: Mutex::new(outcomes.into_iter().collect()),
            }
        }
    }

    #[async_trait]
    impl Recognizer for ScriptedRecognizer {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn capture(&self, _request: &CaptureRequest) -> Result<TextGrid, CaptureError> {
            self.outcomes
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(CaptureError::Decode("script exhausted".into())))
        }
    }

    /// Recognizer that never completes, for timeout tests.
    struct StuckRecognizer;

    #[async_trait]
    impl Recognizer for StuckRecognizer {
        fn name(&self) -> &str {
            "stuck"
        }

        async fn capture(&self, _request: &CaptureRequest) -> Result<TextGrid, CaptureError> {
            std::future::pending().await
        }
    }

    async fn wait_for_samples<R: Recognizer>(watcher: &mut Watcher<R>, count: u64) {
        for _ in 0..200 {
            watcher.poll_samples();
            if watcher.state().total_samples >= count {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("expected {count} samples, saw {}", watcher.state().total_samples);
    }

    #[tokio::test(start_paused = true)]
    async fn tick_captures_and_applies_a_sample() {
        let recognizer = ScriptedRecognizer::new(vec![Ok(TextGrid::from_text("hello"))]);
        let mut watcher = Watcher::new(recognizer, WatchConfig::default());

        watcher.handle_event(WatchEvent::Tick);
        wait_for_samples(&mut watcher, 1).await;

        assert_eq!(watcher.state().total_samples, 1);
        assert_eq!(watcher.state().current.as_ref().unwrap().row_text(0), "hello");
    }

    #[tokio::test(start_paused = true)]
    async fn manual_refresh_counts_like_a_tick() {
        let recognizer = ScriptedRecognizer::new(vec![
            Ok(TextGrid::from_text("one")),
            Ok(TextGrid::from_text("two")),
        ]);
        let mut watcher = Watcher::new(recognizer, WatchConfig::default());

        watcher.handle_event(WatchEvent::Tick);
        wait_for_samples(&mut watcher, 1).await;
        watcher.handle_event(WatchEvent::ManualRefresh);
        wait_for_samples(&mut watcher, 2).await;

        assert_eq!(watcher.state().total_samples, 2);
        // Manual refresh is not a user action: generation untouched.
        assert_eq!(watcher.state().generation, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_capture_is_counted_and_skipped() {
        let recognizer = ScriptedRecognizer::new(vec![
            Ok(TextGrid::from_text("screen")),
            Err(CaptureError::Decode("flaky".into())),
        ]);
        let mut watcher = Watcher::new(recognizer, WatchConfig::default());

        watcher.handle_event(WatchEvent::Tick);
        wait_for_samples(&mut watcher, 1).await;
        watcher.handle_event(WatchEvent::Tick);
        wait_for_samples(&mut watcher, 2).await;

        assert_eq!(watcher.state().total_samples, 2);
        assert_eq!(
            watcher.state().current.as_ref().unwrap().row_text(0),
            "screen"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn capture_timeout_becomes_a_counted_failure() {
        let config = WatchConfig {
            capture_timeout_secs: 0.05,
            ..WatchConfig::default()
        };
        let mut watcher = Watcher::new(StuckRecognizer, config);

        watcher.handle_event(WatchEvent::Tick);
        wait_for_samples(&mut watcher, 1).await;

        assert_eq!(watcher.state().total_samples, 1);
        assert!(watcher.state().current.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn user_action_advances_generation_without_capturing() {
        let recognizer = ScriptedRecognizer::new(vec![Ok(TextGrid::from_text("screen"))]);
        let mut watcher = Watcher::new(recognizer, WatchConfig::default());

        watcher.handle_event(WatchEvent::UserAction);
        assert_eq!(watcher.state().generation, 2);
        assert_eq!(watcher.state().total_samples, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn stale_results_are_fenced_out() {
        let recognizer = ScriptedRecognizer::new(vec![Ok(TextGrid::from_text("late"))]);
        let mut watcher = Watcher::new(recognizer, WatchConfig::default());

        // Simulate an out-of-order arrival: a result stamped below the
        // fence must be discarded without touching the state.
        watcher.applied_seq = 5;
        watcher
            .results_tx
            .try_send(SampleResult {
                seq: 3,
                result: Ok(TextGrid::from_text("stale")),
            })
            .unwrap();

        assert_eq!(watcher.poll_samples(), 0);
        assert_eq!(watcher.state().total_samples, 0);
        assert!(watcher.state().current.is_none());
    }
}
