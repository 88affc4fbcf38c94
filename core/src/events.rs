//! Watch Events
//!
//! Events routed from the surface event loop into the [`Watcher`]. The
//! surface is a dumb renderer: it reports what the operator did and which
//! timer fired, and the watcher decides what that means for the state.
//!
//! A quit keypress is handled by the surface loop itself (it terminates the
//! loop and abandons in-flight captures); it never reaches the watcher.
//!
//! [`Watcher`]: crate::watcher::Watcher

use crate::grid::TextGrid;
use crate::recognizer::CaptureError;

/// External events driving the watch session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WatchEvent {
    /// The refresh interval elapsed; capture a new sample.
    Tick,
    /// Operator pressed the refresh key. Captures a sample like a tick but
    /// does not count as a user action and does not reset the schedule.
    ManualRefresh,
    /// Any other keypress: advances the generation state machine.
    UserAction,
}

/// A completed (or failed) capture, delivered back to the watcher.
#[derive(Debug)]
pub struct SampleResult {
    /// Sequence stamp assigned when the capture was issued. Results that
    /// arrive with a stamp at or below the last applied one are stale and
    /// discarded.
    pub seq: u64,
    /// The decoded grid, or why the capture failed.
    pub result: Result<TextGrid, CaptureError>,
}
