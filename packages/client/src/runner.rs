//! Client execution logic with reconnection support.

use tokio::sync::mpsc;

use crate::{
    config::ClientConfig,
    domain::{Reconnect, ReconnectPolicy},
    session::{ClientContext, run_client_session},
    ui,
};

/// Run the playback client with reconnection logic
///
/// `media` is joined automatically once the room is known, and rejoined
/// after every reconnect.
pub async fn run_client(
    config: ClientConfig,
    media: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let (input_tx, mut input_rx) = mpsc::unbounded_channel::<String>();
    ui::spawn_input_thread(input_tx);

    let http = reqwest::Client::new();
    let policy = ReconnectPolicy::default();
    let mut context = ClientContext::new(media);
    let mut failures = 0;
    let mut attempt = 1;

    loop {
        tracing::info!(
            "Attempting to connect to {} (attempt {}/{})",
            config.server(),
            attempt,
            policy.max_attempts
        );

        match run_client_session(&config, &http, &mut input_rx, &mut context).await {
            Ok(()) => {
                tracing::info!("Client session ended normally");
                break;
            }
            Err(e) => {
                failures += 1;
                match policy.decide(&e, failures) {
                    Reconnect::Fatal => return Err(Box::new(e)),
                    Reconnect::GiveUp => {
                        tracing::warn!("Connection lost: {}", e);
                        tracing::error!(
                            "Failed to reconnect after {} attempts. Exiting.",
                            policy.max_attempts
                        );
                        return Err(Box::new(e));
                    }
                    Reconnect::After { delay, attempt: next } => {
                        tracing::warn!("Connection lost: {}", e);
                        tracing::info!(
                            "Reconnecting in {} seconds... (attempt {}/{})",
                            delay.as_secs(),
                            next,
                            policy.max_attempts
                        );
                        attempt = next;
                        tokio::time::sleep(delay).await;
                    }
                }
            }
        }
    }

    Ok(())
}
