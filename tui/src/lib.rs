//! Termscope TUI - Terminal surface for the console watcher
//!
//! This crate provides a full-screen terminal UI over [`termscope_core`]:
//! a live, annotated view of a remote virtual machine's console with
//! changed cells highlighted as they appear.
//!
//! # Architecture
//!
//! - **App**: the cooperative event loop (keystrokes, ticks, frames)
//! - **WatcherClient**: thin wrapper embedding the headless [`Watcher`]
//! - **Render**: pure projection of `WatchState` into a terminal frame
//! - **Theme**: the color palette
//!
//! [`Watcher`]: termscope_core::Watcher

pub mod app;
pub mod render;
pub mod theme;
pub mod watcher_client;

pub use app::App;
