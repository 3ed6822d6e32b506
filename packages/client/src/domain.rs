//! Reconnect policy.
//!
//! The runner counts failed sessions and asks [`ReconnectPolicy::decide`]
//! what to do after each one. A malformed `--server` is reported at once;
//! lost connections and failed snapshot fetches are retried at a fixed
//! interval until the failure budget runs out.

use std::time::Duration;

use crate::error::ClientError;

/// Reaction to a failed session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconnect {
    /// Wait `delay`, then open session number `attempt` (1-based, counting
    /// the first connection)
    After { delay: Duration, attempt: u32 },
    /// The failure budget is spent
    GiveUp,
    /// Retrying cannot help
    Fatal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    /// Failed sessions tolerated before giving up
    pub max_attempts: u32,
    pub interval: Duration,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            interval: Duration::from_secs(5),
        }
    }
}

impl ReconnectPolicy {
    /// `failures` counts every failed session so far, including `error`.
    pub fn decide(&self, error: &ClientError, failures: u32) -> Reconnect {
        match error {
            ClientError::InvalidServerAddress(_) => Reconnect::Fatal,
            ClientError::Connection(_) | ClientError::SnapshotFetch(_) => {
                if failures >= self.max_attempts {
                    Reconnect::GiveUp
                } else {
                    Reconnect::After {
                        delay: self.interval,
                        attempt: failures + 1,
                    }
                }
            }
        }
    }
}
