//! Library root for `welcome-bot`.
//!
//! Welcome-bot is a small Slack assistant that:
//! - Greets users joining a channel with configured public and direct messages
//! - Answers `@bot help` with the replies configured for the channel
//!
//! The bot listens on Slack's Socket Mode stream and dispatches events serially.
//! The chat integration sits behind a trait so the dispatch logic can be
//! exercised without a live workspace.

pub mod base;
pub mod interaction;
pub mod runtime;
pub mod service;

use base::{config::Config, types::Void};
use rustls::crypto;
use tracing::info;

/// Public async entry for the binary crate.
///
/// Sets up necessary services and starts the welcome-bot runtime:
/// - Initializes the crypto provider
/// - Loads the response table and creates the chat client
/// - Starts the main event loop for processing messages
pub async fn start(config: Config) -> Void {
    info!("Starting welcome-bot ...");

    // Start the crypto provider.
    crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow::anyhow!("Failed to install the rustls crypto provider"))?;

    // Initialize the runtime.
    let runtime = runtime::Runtime::new(config).await?;

    // Start the runtime.
    runtime.start().await?;

    Ok(())
}
