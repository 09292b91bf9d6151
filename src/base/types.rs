use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

pub type Err = anyhow::Error;
pub type Res<T> = Result<T, Err>;
pub type Void = Res<()>;

/// Sending half of the event stream produced by a chat client.
pub type EventSender = UnboundedSender<ChatEvent>;
/// Receiving half of the event stream consumed by the dispatcher.
pub type EventReceiver = UnboundedReceiver<ChatEvent>;

/// Message subtype emitted when a user joins a channel.
pub const CHANNEL_JOIN_SUBTYPE: &str = "channel_join";

/// An event delivered by the chat service's real-time stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatEvent {
    /// The connection is up and the bot knows who it is.
    ///
    /// `connection_count` counts how many times the client has been started;
    /// reconnects handled inside the chat library do not emit this event.
    Connected { bot_user_id: String, connection_count: u32 },
    /// A message (or message subtype, like a channel join) was posted.
    Message(MessageEvent),
    /// The transport reported a recoverable error.
    ConnectionError(String),
    /// The service rejected our credentials.
    InvalidAuth,
    /// Anything else the bot does not act on.
    Other,
}

/// A message posted to a channel.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MessageEvent {
    pub channel_id: String,
    pub user_id: String,
    pub text: String,
    pub subtype: Option<String>,
}

impl MessageEvent {
    /// Whether this message announces a user joining the channel.
    pub fn is_channel_join(&self) -> bool {
        self.subtype.as_deref() == Some(CHANNEL_JOIN_SUBTYPE)
    }

    /// Whether this message starts with an @-mention of `bot_user_id` and was not sent by the bot.
    pub fn mentions(&self, bot_user_id: &str) -> bool {
        self.user_id != bot_user_id && self.text.starts_with(&mention_prefix(bot_user_id))
    }
}

/// The literal text Slack uses to @-mention a user.
pub fn mention_prefix(user_id: &str) -> String {
    format!("<@{user_id}>")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(user_id: &str, text: &str, subtype: Option<&str>) -> MessageEvent {
        MessageEvent {
            channel_id: "C1".to_string(),
            user_id: user_id.to_string(),
            text: text.to_string(),
            subtype: subtype.map(str::to_string),
        }
    }

    #[test]
    fn detects_channel_join() {
        assert!(message("U1", "", Some("channel_join")).is_channel_join());
        assert!(!message("U1", "", Some("bot_message")).is_channel_join());
        assert!(!message("U1", "", None).is_channel_join());
    }

    #[test]
    fn detects_mentions() {
        assert!(message("U1", "<@BOT> help", None).mentions("BOT"));
        assert!(!message("U1", "hey <@BOT> help", None).mentions("BOT"));
        assert!(!message("U1", "<@OTHER> help", None).mentions("BOT"));
    }

    #[test]
    fn ignores_own_messages() {
        assert!(!message("BOT", "<@BOT> help", None).mentions("BOT"));
    }
}
