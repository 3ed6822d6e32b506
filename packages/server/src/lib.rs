//! Playback coordination server.
//!
//! Keeps a single shared room, answers clock-sync probes and broadcasts
//! countdown / playback-start events so every participant starts the same
//! media at the same wall-clock instant.

// layers
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;
