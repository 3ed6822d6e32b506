//! Playback client.
//!
//! Estimates the coordinator clock, follows room lifecycle events and drives
//! a local media player so playback starts in step with every other
//! participant.

pub mod clock_sync;
pub mod command;
pub mod config;
pub mod display;
pub mod domain;
pub mod error;
pub mod formatter;
pub mod playback;
pub mod player;
mod runner;
pub mod session;
mod ui;

pub use runner::run_client;
