//! Greets users joining a channel.

use tracing::{info, instrument, warn};

use crate::{
    base::{responses::Responses, types::MessageEvent},
    service::chat::ChatClient,
};

/// Sends every public reply configured for `channel_name` to the channel, and
/// every DM reply privately to the joining user.
///
/// If a DM channel cannot be opened, that reply is skipped and the rest are still sent.
#[instrument(skip_all, fields(channel = %channel_name, user = %event.user_id))]
pub async fn respond_to_join(chat: &ChatClient, event: &MessageEvent, channel_name: &str, responses: &Responses) {
    for entry in responses.public_for(channel_name) {
        info!("Sending public reply to channel {}", channel_name);
        let _ = chat.send_message(&event.channel_id, &entry.response).await;
    }

    for entry in responses.direct_for(channel_name) {
        let dm_channel_id = match chat.open_direct_message(&event.user_id).await {
            Ok(id) => id,
            Err(e) => {
                warn!("Failed to open IM channel to user: {}", e);
                continue;
            }
        };

        info!("Sending DM to user {}", event.user_id);
        let _ = chat.send_message(&dm_channel_id, &entry.response).await;
    }
}
