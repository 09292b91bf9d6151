pub mod slack;

use std::{ops::Deref, sync::Arc};

use async_trait::async_trait;

use crate::base::types::{EventSender, Res, Void};

// Traits.

/// Generic "chat" trait that clients must implement.
///
/// This trait defines the core functionality for interacting with chat platforms
/// like Slack. Implementing this trait allows different chat services to be used
/// with the welcome-bot.
#[async_trait]
pub trait GenericChatClient: Send + Sync + 'static {
    /// Start the chat client listener.
    ///
    /// Authenticates, then pushes every event from the real-time stream into
    /// `events` until the stream ends. A rejected token is reported as
    /// [`ChatEvent::InvalidAuth`](crate::base::types::ChatEvent::InvalidAuth)
    /// rather than as an error.
    async fn start(&self, events: EventSender) -> Void;

    /// Resolve a channel ID to its name.
    async fn get_channel_name(&self, channel_id: &str) -> Res<String>;

    /// Open (or reuse) a direct message channel with a user, returning its channel ID.
    async fn open_direct_message(&self, user_id: &str) -> Res<String>;

    /// Send a message to a channel.
    async fn send_message(&self, channel_id: &str, text: &str) -> Void;
}

// Structs.

/// Chat client for the application.
///
/// It is designed to be trivially cloneable, allowing it to be passed around
/// without the need for `Arc` or `Mutex`.
#[derive(Clone)]
pub struct ChatClient {
    inner: Arc<dyn GenericChatClient>,
}

impl Deref for ChatClient {
    type Target = dyn GenericChatClient;

    fn deref(&self) -> &Self::Target {
        &*self.inner
    }
}

impl ChatClient {
    pub fn new(inner: Arc<dyn GenericChatClient>) -> Self {
        Self { inner }
    }
}
