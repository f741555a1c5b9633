//! Repertoire engine for the Jam de Vientos live sessions.
//!
//! Talks to the remote SheetMusic service for events and repertoires, keeps a
//! local working copy with optimistic visibility edits, drives audio preview
//! playback, and computes the public carousel's card layout.

pub mod api;
pub mod app;
pub mod carousel;
pub mod commands;
pub mod config;
pub mod error;
pub mod models;
pub mod playback;
pub mod store;
pub mod sync;

pub use error::AppResult;
