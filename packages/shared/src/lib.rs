//! Utilities shared by the Cuepoint server and client.

pub mod logger;
pub mod time;
