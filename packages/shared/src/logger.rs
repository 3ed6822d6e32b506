//! Logging setup utilities for the Cuepoint binaries.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Crates whose log output is governed by the default level.
const WORKSPACE_CRATES: [&str; 3] = ["cuepoint_shared", "cuepoint_server", "cuepoint_client"];

/// Build the default `EnvFilter` directive string used when `RUST_LOG` is unset.
fn default_directives(binary_name: &str, default_log_level: &str) -> String {
    WORKSPACE_CRATES
        .iter()
        .copied()
        .chain(std::iter::once(binary_name))
        .map(|target| format!("{}={}", target.replace('-', "_"), default_log_level))
        .collect::<Vec<_>>()
        .join(",")
}

/// Initialize the tracing subscriber with the specified default log level.
///
/// The log level can be overridden using the `RUST_LOG` environment variable.
///
/// # Arguments
///
/// * `binary_name` - The name of the binary (e.g., "cuepoint-server")
/// * `default_log_level` - The default log level (e.g., "debug", "info")
///
/// # Examples
///
/// ```no_run
/// use cuepoint_shared::logger::setup_logger;
///
/// setup_logger("cuepoint-server", "debug");
/// ```
pub fn setup_logger(binary_name: &str, default_log_level: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_directives(binary_name, default_log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directives_cover_workspace_and_binary() {
        // テスト項目: デフォルトのフィルタがワークスペースの crate とバイナリを含む
        // given (前提条件):
        let binary_name = "cuepoint-server";

        // when (操作):
        let directives = default_directives(binary_name, "info");

        // then (期待する結果):
        assert!(directives.contains("cuepoint_server=info"));
        assert!(directives.contains("cuepoint_client=info"));
        assert!(directives.ends_with("cuepoint_server=info"));
        assert_eq!(directives.split(',').count(), 4);
    }
}
