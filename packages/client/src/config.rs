//! Client configuration.

use std::time::Duration;

use crate::error::ClientError;

/// Probes closer together than this only add load
const MIN_SYNC_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug, Clone)]
pub struct ClientConfig {
    server: String,
    sync_interval: Duration,
}

impl ClientConfig {
    /// Validate `server` (`host:port`) and build the configuration
    pub fn new(server: impl Into<String>, sync_interval: Duration) -> Result<Self, ClientError> {
        let server = server.into();
        let parsed = reqwest::Url::parse(&format!("http://{}/", server))
            .map_err(|_| ClientError::InvalidServerAddress(server.clone()))?;
        if parsed.host_str().is_none_or(str::is_empty) || parsed.path() != "/" {
            return Err(ClientError::InvalidServerAddress(server));
        }

        Ok(Self {
            server,
            sync_interval: sync_interval.max(MIN_SYNC_INTERVAL),
        })
    }

    pub fn server(&self) -> &str {
        &self.server
    }

    pub fn ws_url(&self) -> String {
        format!("ws://{}/ws", self.server)
    }

    pub fn room_url(&self) -> String {
        format!("http://{}/api/room", self.server)
    }

    pub fn sync_interval(&self) -> Duration {
        self.sync_interval
    }
}
