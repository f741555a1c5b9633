//! Selection & playback control.
//!
//! The controller owns the currently selected version and at most one live
//! audio handle. Media failures (missing device, undecodable stream, a play
//! request the platform refuses) are local: they are logged, reduce to
//! "not playing", and never escape the controller's public operations.

mod controller;
mod output;

pub use controller::PlaybackController;
pub use output::RodioOutput;

use crate::error::PlaybackError;

/// Per-session playback state machine.
///
/// `Idle → Loading → Playing ⇄ Paused`; playback end and every error path
/// return to `Idle`. The handle is retained on errors so restart still works.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Idle,
    Loading,
    Playing,
    Paused,
}

/// One playable audio stream bound to a version's audio URL.
pub trait AudioHandle {
    /// Issue a play (or resume) request
    fn play(&mut self) -> Result<(), PlaybackError>;

    fn pause(&mut self);

    /// Stop playback, discarding the position
    fn stop(&mut self);

    /// Seek back to the beginning, preserving the playing/paused state
    fn seek_start(&mut self);

    /// Whether the stream has played to the end
    fn is_finished(&self) -> bool;

    fn set_volume(&mut self, volume: f32);
}

/// Factory for audio handles; the production implementation is rodio-backed.
pub trait AudioOutput {
    fn open(&self, url: &str) -> Result<Box<dyn AudioHandle>, PlaybackError>;
}
