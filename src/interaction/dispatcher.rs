//! The event loop that drives the bot.
//!
//! Events are taken off the stream one at a time and each is handled to
//! completion before the next is read.

use tracing::{debug, error, info, instrument};

use crate::{
    base::{
        responses::Responses,
        types::{ChatEvent, EventReceiver, MessageEvent, Void},
    },
    interaction::{join::respond_to_join, mention::respond_to_mention},
    service::chat::ChatClient,
};

/// Serial dispatcher over the chat event stream.
pub struct Dispatcher {
    chat: ChatClient,
    responses: Responses,
    bot_user_id: Option<String>,
}

impl Dispatcher {
    pub fn new(chat: ChatClient, responses: Responses) -> Self {
        Self { chat, responses, bot_user_id: None }
    }

    /// The bot's own user ID, once the connection has been established.
    pub fn bot_user_id(&self) -> Option<&str> {
        self.bot_user_id.as_deref()
    }

    /// Drains `events` until the stream closes.
    ///
    /// Returns an error if the service rejects the bot's credentials.
    #[instrument(name = "Dispatcher::run", skip_all)]
    pub async fn run(&mut self, mut events: EventReceiver) -> Void {
        while let Some(event) = events.recv().await {
            self.handle(event).await?;
        }

        info!("Event stream closed.");

        Ok(())
    }

    /// Handles a single event.
    pub async fn handle(&mut self, event: ChatEvent) -> Void {
        match event {
            ChatEvent::Connected { bot_user_id, connection_count } => {
                info!("Connection counter: {}", connection_count);
                self.bot_user_id = Some(bot_user_id);
            }
            ChatEvent::Message(message) => self.handle_message(message).await,
            ChatEvent::ConnectionError(e) => {
                error!("Error: {}", e);
            }
            ChatEvent::InvalidAuth => {
                error!("Invalid credentials");
                return Err(anyhow::anyhow!("Invalid credentials"));
            }
            ChatEvent::Other => {}
        }

        Ok(())
    }

    #[instrument(skip_all, fields(channel = %message.channel_id))]
    async fn handle_message(&self, message: MessageEvent) {
        if message.is_channel_join() {
            info!("channel_join seen on channel: {}", message.channel_id);

            if let Some(name) = self.channel_name(&message).await {
                respond_to_join(&self.chat, &message, &name, &self.responses).await;
            }

            return;
        }

        let Some(bot_user_id) = self.bot_user_id.as_deref() else {
            return;
        };

        if !message.mentions(bot_user_id) {
            return;
        }

        info!("message seen on public channel: {}", message.channel_id);

        if let Some(name) = self.channel_name(&message).await {
            respond_to_mention(&self.chat, &message, &name, bot_user_id, &self.responses).await;
        }
    }

    /// Resolves the message's channel name; lookup failures drop the event.
    async fn channel_name(&self, message: &MessageEvent) -> Option<String> {
        match self.chat.get_channel_name(&message.channel_id).await {
            Ok(name) => Some(name),
            Err(e) => {
                debug!("Dropping event, channel lookup failed: {}", e);
                None
            }
        }
    }
}
