//! Runtime services and shared state for the welcome-bot.

use tokio::sync::mpsc;
use tracing::{error, instrument};

use crate::{
    base::{config::Config, responses::Responses, types::{Res, Void}},
    interaction::dispatcher::Dispatcher,
    service::chat::ChatClient,
};

/// Runtime service context that can be shared across the application.
///
/// This struct holds the chat client, the response table, and configuration.
/// It is designed to be trivially cloneable, allowing it to be passed around
/// without the need for `Arc` or `Mutex`.
#[derive(Clone)]
pub struct Runtime {
    /// The configuration for the application.
    pub config: Config,
    /// The static response table.
    pub responses: Responses,
    /// The chat client instance.
    pub chat: ChatClient,
}

impl Runtime {
    /// Create a new runtime instance.
    ///
    /// Fails if the response table cannot be read.
    #[instrument(skip_all)]
    pub async fn new(config: Config) -> Res<Self> {
        // Load the response table.
        let responses = Responses::load(&config.responses_path)?;

        // Initialize the slack client.
        let chat = ChatClient::slack(&config)?;

        Ok(Self { config, responses, chat })
    }

    /// Runs the connection in the background and dispatches its events until
    /// the stream closes or authentication fails.
    ///
    /// If the connection task fails, its error is returned once the queued
    /// events have been handled.
    pub async fn start(&self) -> Void {
        let (tx, rx) = mpsc::unbounded_channel();

        let chat = self.chat.clone();
        let connection = tokio::spawn(async move { chat.start(tx).await });

        let result = Dispatcher::new(self.chat.clone(), self.responses.clone()).run(rx).await;

        if result.is_err() {
            connection.abort();
            return result;
        }

        connection.await.map_err(|e| anyhow::anyhow!("Connection task panicked: {}", e))?.inspect_err(|e| error!("Connection failed: {}", e))
    }
}
