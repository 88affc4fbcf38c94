//! Watcher Client
//!
//! Thin wrapper around the embedded [`Watcher`] for TUI integration. The
//! TUI contains no watch logic: it converts terminal events into
//! [`WatchEvent`]s, forwards them here, and renders whatever state the
//! watcher reports back.

use termscope_core::{CommandRecognizer, WatchConfig, WatchEvent, WatchState, Watcher};

/// Client for driving the embedded watch session.
pub struct WatcherClient {
    /// The embedded watcher instance
    watcher: Watcher<CommandRecognizer>,
}

impl WatcherClient {
    /// Create a client with a recognizer built from the configuration.
    #[must_use]
    pub fn new(config: WatchConfig) -> Self {
        let recognizer = CommandRecognizer::new(
            config.recognizer.command.clone(),
            config.recognizer.args.clone(),
        );
        Self {
            watcher: Watcher::new(recognizer, config),
        }
    }

    /// The refresh interval elapsed.
    pub fn tick(&mut self) {
        self.watcher.handle_event(WatchEvent::Tick);
    }

    /// The operator pressed the refresh key.
    pub fn manual_refresh(&mut self) {
        self.watcher.handle_event(WatchEvent::ManualRefresh);
    }

    /// The operator pressed any other key.
    pub fn user_action(&mut self) {
        self.watcher.handle_event(WatchEvent::UserAction);
    }

    /// Apply capture results that have arrived; returns how many.
    pub fn poll_samples(&mut self) -> usize {
        self.watcher.poll_samples()
    }

    /// The current state snapshot.
    #[must_use]
    pub fn state(&self) -> &WatchState {
        self.watcher.state()
    }

    /// The session configuration.
    #[must_use]
    pub fn config(&self) -> &WatchConfig {
        self.watcher.config()
    }
}
