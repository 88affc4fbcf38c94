//! Application Event Loop
//!
//! The cooperative loop at the heart of the TUI. A single `select!`
//! multiplexes three sources without blocking any of them:
//!
//! - terminal input (crossterm's async [`EventStream`])
//! - the sampling ticker at the configured refresh cadence
//! - a frame timer that keeps the status line's age counter live
//!
//! Capture results arrive on the watcher's internal channel and are
//! drained once per loop iteration, so a slow recognizer can never
//! stall keystroke handling.

use std::time::{Duration, Instant};

use anyhow::Result;
use crossterm::event::{Event, EventStream, KeyCode, KeyEventKind, KeyModifiers};
use futures::StreamExt;
use ratatui::backend::Backend;
use ratatui::Terminal;
use tokio::time::{interval, MissedTickBehavior};

use termscope_core::WatchConfig;

use crate::render;
use crate::watcher_client::WatcherClient;

/// Redraw cadence between samples, keeps the age counter ticking.
const FRAME_INTERVAL: Duration = Duration::from_millis(100);

/// Main application state.
pub struct App {
    /// Whether the loop should keep running
    running: bool,
    /// The embedded watch session
    client: WatcherClient,
}

impl App {
    /// Create the application from a validated configuration.
    #[must_use]
    pub fn new(config: WatchConfig) -> Self {
        Self {
            running: true,
            client: WatcherClient::new(config),
        }
    }

    /// Run the event loop until the operator quits.
    ///
    /// # Errors
    ///
    /// Returns an error if the terminal backend fails to draw.
    pub async fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<()> {
        let mut events = EventStream::new();

        let mut sample_ticker = interval(self.client.config().refresh_interval());
        sample_ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut frame_ticker = interval(FRAME_INTERVAL);
        frame_ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        while self.running {
            tokio::select! {
                biased;

                maybe_event = events.next() => {
                    if let Some(Ok(event)) = maybe_event {
                        self.handle_terminal_event(&event);
                    }
                }

                _ = sample_ticker.tick() => {
                    self.client.tick();
                }

                _ = frame_ticker.tick() => {}
            }

            let applied = self.client.poll_samples();
            if applied > 0 {
                tracing::debug!(applied, "applied capture results");
            }

            let now = Instant::now();
            terminal.draw(|frame| {
                render::draw(frame, self.client.state(), self.client.config(), now);
            })?;
        }

        Ok(())
    }

    /// Translate one terminal event into a watch event, if any.
    fn handle_terminal_event(&mut self, event: &Event) {
        match event {
            Event::Key(key) if key.kind == KeyEventKind::Press => match key.code {
                KeyCode::Char('q') | KeyCode::Esc => self.running = false,
                KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                    self.running = false;
                }
                KeyCode::Char('r') => self.client.manual_refresh(),
                // Any other keystroke accepts the screen as the new baseline.
                _ => self.client.user_action(),
            },
            // Layout is recomputed every frame, nothing to do here.
            Event::Resize(..) => {}
            _ => {}
        }
    }

    /// Whether the loop is still running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyEvent, KeyEventState};
    use pretty_assertions::assert_eq;

    fn press(code: KeyCode) -> Event {
        Event::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn app() -> App {
        App::new(WatchConfig::default())
    }

    #[test]
    fn q_and_esc_stop_the_loop() {
        let mut app = app();
        app.handle_terminal_event(&press(KeyCode::Char('q')));
        assert!(!app.is_running());

        let mut app = self::app();
        app.handle_terminal_event(&press(KeyCode::Esc));
        assert!(!app.is_running());
    }

    #[test]
    fn ctrl_c_stops_the_loop() {
        let mut app = app();
        app.handle_terminal_event(&Event::Key(KeyEvent::new(
            KeyCode::Char('c'),
            KeyModifiers::CONTROL,
        )));
        assert!(!app.is_running());
    }

    #[test]
    fn other_keys_advance_the_generation() {
        let mut app = app();
        assert_eq!(app.client.state().generation, 1);

        app.handle_terminal_event(&press(KeyCode::Enter));
        assert_eq!(app.client.state().generation, 2);
        assert!(app.is_running());
    }

    #[test]
    fn key_releases_are_ignored() {
        let mut app = app();
        let release = Event::Key(KeyEvent {
            code: KeyCode::Char('q'),
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Release,
            state: KeyEventState::NONE,
        });
        app.handle_terminal_event(&release);
        assert!(app.is_running());
    }

    #[test]
    fn resize_is_tolerated() {
        let mut app = app();
        app.handle_terminal_event(&Event::Resize(80, 24));
        assert!(app.is_running());
        assert_eq!(app.client.state().generation, 1);
    }
}
