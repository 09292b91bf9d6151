//! Replies to `@bot help` mentions.

use tracing::{debug, info, instrument};

use crate::{
    base::{
        responses::Responses,
        types::{MessageEvent, mention_prefix},
    },
    service::chat::ChatClient,
};

/// The only command the bot understands.
pub const HELP_KEYWORD: &str = "help";

/// Strips the leading bot mention and the space after it, then trims and lower-cases the rest.
///
/// A mention glued to the command (`<@BOT>help`) keeps its prefix and so never matches.
pub fn normalize_command(text: &str, bot_user_id: &str) -> String {
    let prefix = format!("{} ", mention_prefix(bot_user_id));
    let text = text.strip_prefix(prefix.as_str()).unwrap_or(text);

    text.trim().to_lowercase()
}

/// Responds to a mention in `channel_name` by listing every configured reply for that channel.
///
/// Both public and DM entries are posted back to the originating channel, each
/// under its own label. Send failures are ignored.
#[instrument(skip_all, fields(channel = %channel_name))]
pub async fn respond_to_mention(chat: &ChatClient, event: &MessageEvent, channel_name: &str, bot_user_id: &str, responses: &Responses) {
    let command = normalize_command(&event.text, bot_user_id);

    if command != HELP_KEYWORD {
        debug!("Ignoring unrecognized command: {}", command);
        return;
    }

    info!("Sending help for channel {}", channel_name);

    for entry in responses.public_for(channel_name) {
        let text = format!("*Public response for this channel*:\n\n{}", entry.response);
        let _ = chat.send_message(&event.channel_id, &text).await;
    }

    for entry in responses.direct_for(channel_name) {
        let text = format!("*DM response for this channel*:\n\n{}", entry.response);
        let _ = chat.send_message(&event.channel_id, &text).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_mixed_case_help() {
        assert_eq!(normalize_command("<@UBOT> Help", "UBOT"), "help");
        assert_eq!(normalize_command("<@UBOT>   HELP  ", "UBOT"), "help");
    }

    #[test]
    fn requires_a_space_after_the_mention() {
        assert_eq!(normalize_command("<@UBOT>help", "UBOT"), "<@ubot>help");
    }

    #[test]
    fn keeps_trailing_words() {
        assert_eq!(normalize_command("<@UBOT> help me", "UBOT"), "help me");
    }

    #[test]
    fn leaves_other_mentions_alone() {
        assert_eq!(normalize_command("<@UOTHER> help", "UBOT"), "<@uother> help");
    }
}
