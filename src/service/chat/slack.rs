//! Slack integration for welcome-bot.
//!
//! This module provides the Slack implementation of `GenericChatClient`:
//! - Opening a Socket Mode stream and translating push events into `ChatEvent`s
//! - Looking up channel names
//! - Opening direct message channels and posting messages

use crate::base::{
    config::Config,
    types::{ChatEvent, EventSender, MessageEvent, Res, Void},
};
use async_trait::async_trait;
use hyper_rustls::HttpsConnector;
use hyper_util::client::legacy::connect::HttpConnector;
use slack_morphism::{errors::SlackClientError, prelude::*};
use tracing::{debug, error, info, instrument, warn};

use std::{
    sync::{
        Arc,
        atomic::{AtomicU32, Ordering},
    },
    time::Duration,
};

use super::{ChatClient, GenericChatClient};

// Type aliases.

type FullClient = slack_morphism::SlackClient<SlackClientHyperConnector<HttpsConnector<HttpConnector>>>;

/// API error codes that mean the token itself was rejected.
const AUTH_ERROR_CODES: &[&str] = &["invalid_auth", "not_authed", "account_inactive", "token_revoked"];

// Extra methods on `ChatClient` applied by the slack implementation.

impl ChatClient {
    /// Creates a new Slack chat client.
    pub fn slack(config: &Config) -> Res<Self> {
        Ok(SlackChatClient::new(config)?.into())
    }
}

impl From<SlackChatClient> for ChatClient {
    fn from(client: SlackChatClient) -> Self {
        Self { inner: Arc::new(client) }
    }
}

// Structs.

/// User state for the slack socket client.
struct SlackUserState {
    events: EventSender,
}

/// Slack client implementation.
#[derive(Clone)]
struct SlackChatClient {
    pub app_token: SlackApiToken,
    pub bot_token: SlackApiToken,
    pub client: Arc<FullClient>,
    /// Number of times `start` has connected; Socket Mode reconnects inside the listener are not counted.
    pub connection_count: Arc<AtomicU32>,
    pub reconnect_delay: Duration,
}

impl SlackChatClient {
    /// Create a new Slack chat client.
    #[instrument(name = "SlackChatClient::new", skip_all)]
    pub fn new(config: &Config) -> Res<Self> {
        // Initialize tokens.

        let app_token = SlackApiToken::new(SlackApiTokenValue(config.slack_app_token.clone()));
        let bot_token = SlackApiToken::new(SlackApiTokenValue(config.slack_token.clone()));

        // Initialize the Slack client.

        let https_connector = HttpsConnector::<HttpConnector>::builder().with_native_roots()?.https_only().enable_all_versions().build();
        let connector = SlackClientHyperConnector::with_connector(https_connector);
        let client = Arc::new(slack_morphism::SlackClient::new(connector));

        Ok(Self {
            app_token,
            bot_token,
            client,
            connection_count: Arc::new(AtomicU32::new(0)),
            reconnect_delay: Duration::from_secs(config.reconnect_delay_secs),
        })
    }
}

#[async_trait]
impl GenericChatClient for SlackChatClient {
    #[instrument(name = "SlackChatClient::start", skip_all)]
    async fn start(&self, events: EventSender) -> Void {
        // Authenticate, and get the bot's user ID.

        let session = self.client.open_session(&self.bot_token);

        let Some(bot_user) = retry_until_accepted(&events, self.reconnect_delay, is_auth_error, || session.auth_test()).await? else {
            return Ok(());
        };

        let bot_user_id = bot_user.user_id.0;
        let connection_count = self.connection_count.fetch_add(1, Ordering::SeqCst) + 1;

        info!("Slack bot user ID: {}", bot_user_id);

        let _ = events.send(ChatEvent::Connected { bot_user_id, connection_count });

        // Initialize the socket mode listener.

        let socket_mode_callbacks = SlackSocketModeListenerCallbacks::new().with_push_events(handle_push_event);

        let listener_environment = Arc::new(
            SlackClientEventsListenerEnvironment::new(self.client.clone())
                .with_error_handler(handle_listener_error)
                .with_user_state(SlackUserState { events: events.clone() }),
        );

        let socket_mode_listener = Arc::new(SlackClientSocketModeListener::new(
            &SlackClientSocketModeConfig::new(),
            listener_environment.clone(),
            socket_mode_callbacks,
        ));

        // Register the app token to listen for events.
        let registered = retry_until_accepted(&events, self.reconnect_delay, is_auth_error, || socket_mode_listener.listen_for(&self.app_token)).await?;

        if registered.is_none() {
            return Ok(());
        }

        // Serve until Ctrl-C; reconnects are handled by the listener.
        socket_mode_listener.serve().await;

        info!("Socket mode listener stopped.");

        Ok(())
    }

    #[instrument(skip(self))]
    async fn get_channel_name(&self, channel_id: &str) -> Res<String> {
        let request = SlackApiConversationsInfoRequest::new(SlackChannelId(channel_id.to_string()));
        let session = self.client.open_session(&self.bot_token);

        let response = session.conversations_info(&request).await.map_err(|e| anyhow::anyhow!("Failed to get channel info: {}", e))?;

        response.channel.name.ok_or_else(|| anyhow::anyhow!("Channel {} has no name", channel_id))
    }

    #[instrument(skip(self))]
    async fn open_direct_message(&self, user_id: &str) -> Res<String> {
        let request = SlackApiConversationsOpenRequest::new().with_users(vec![SlackUserId(user_id.to_string())]);
        let session = self.client.open_session(&self.bot_token);

        let response = session.conversations_open(&request).await.map_err(|e| anyhow::anyhow!("Failed to open IM channel: {}", e))?;

        Ok(response.channel.id.0)
    }

    #[instrument(skip(self, text))]
    async fn send_message(&self, channel_id: &str, text: &str) -> Void {
        let message = SlackMessageContent::new().with_text(text.to_string());

        let request = SlackApiChatPostMessageRequest::new(SlackChannelId(channel_id.to_string()), message);

        let session = self.client.open_session(&self.bot_token);

        session.chat_post_message(&request).await.map_err(|e| anyhow::anyhow!("Failed to send message: {}", e))?;

        Ok(())
    }
}

// Helpers.

/// Runs `op` until it succeeds, reporting each transient failure on `events` and waiting `delay` between attempts.
///
/// Returns `None` once the token is rejected, after emitting [`ChatEvent::InvalidAuth`].
/// Fails only if nobody is listening on `events` any more.
async fn retry_until_accepted<T, E, F, Fut>(events: &EventSender, delay: Duration, is_auth_error: fn(&E) -> bool, mut op: F) -> Res<Option<T>>
where
    E: std::fmt::Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    loop {
        match op().await {
            Ok(value) => return Ok(Some(value)),
            Err(e) if is_auth_error(&e) => {
                let _ = events.send(ChatEvent::InvalidAuth);
                return Ok(None);
            }
            Err(e) => {
                warn!("Connection attempt failed, retrying in {:?}: {}", delay, e);

                events.send(ChatEvent::ConnectionError(e.to_string())).map_err(|_| anyhow::anyhow!("Event stream is closed"))?;

                tokio::time::sleep(delay).await;
            }
        }
    }
}

/// Whether a Slack error means the token was rejected.
fn is_auth_error(error: &SlackClientError) -> bool {
    matches!(error, SlackClientError::ApiError(ae) if AUTH_ERROR_CODES.contains(&ae.code.as_str()))
}

/// Converts a Slack message event into the bot's own event type.
fn to_message_event(event: SlackMessageEvent) -> Option<MessageEvent> {
    let channel_id = event.origin.channel?.0;
    let user_id = event.sender.user.map(|u| u.0).unwrap_or_default();
    let text = event.content.and_then(|c| c.text).unwrap_or_default();

    // Subtypes serialize to their wire names (e.g. `channel_join`).
    let subtype = event
        .subtype
        .and_then(|s| serde_json::to_value(s).ok())
        .and_then(|v| v.as_str().map(str::to_owned));

    Some(MessageEvent { channel_id, user_id, text, subtype })
}

// Socket mode listener callbacks for Slack.

/// Handles push events from Slack by forwarding them to the event stream.
#[instrument(skip_all)]
async fn handle_push_event(event_callback: SlackPushEventCallback, _client: Arc<SlackHyperClient>, states: SlackClientEventsUserState) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let states = states.read().await;
    let user_state = states.get_user_state::<SlackUserState>().ok_or(anyhow::anyhow!("Failed to get user state"))?;

    let event = match event_callback.event {
        SlackEventCallbackBody::Message(slack_message_event) => match to_message_event(slack_message_event) {
            Some(message) => ChatEvent::Message(message),
            None => {
                debug!("Skipping message event without a channel.");
                ChatEvent::Other
            }
        },
        _ => ChatEvent::Other,
    };

    user_state.events.send(event).map_err(|_| anyhow::anyhow!("Event stream is closed"))?;

    Ok(())
}

/// Handles socket mode listener errors by reporting them on the event stream.
fn handle_listener_error(err: Box<dyn std::error::Error + Send + Sync>, _client: Arc<SlackHyperClient>, states: SlackClientEventsUserState) -> HttpStatusCode {
    error!("Socket mode listener error: {}", err);

    if let Ok(states) = states.try_read()
        && let Some(user_state) = states.get_user_state::<SlackUserState>()
    {
        let _ = user_state.events.send(ChatEvent::ConnectionError(err.to_string()));
    }

    HttpStatusCode::OK
}

// Tests.

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_channel_join_events() {
        let event: SlackMessageEvent = serde_json::from_value(serde_json::json!({
            "type": "message",
            "subtype": "channel_join",
            "ts": "1700000000.000100",
            "channel": "C123",
            "user": "U456",
            "text": "<@U456> has joined the channel"
        }))
        .unwrap();

        let message = to_message_event(event).unwrap();

        assert_eq!(message.channel_id, "C123");
        assert_eq!(message.user_id, "U456");
        assert!(message.is_channel_join());
    }

    #[test]
    fn converts_plain_messages() {
        let event: SlackMessageEvent = serde_json::from_value(serde_json::json!({
            "type": "message",
            "ts": "1700000000.000200",
            "channel": "C123",
            "user": "U456",
            "text": "<@UBOT> help"
        }))
        .unwrap();

        let message = to_message_event(event).unwrap();

        assert_eq!(message.text, "<@UBOT> help");
        assert_eq!(message.subtype, None);
        assert!(message.mentions("UBOT"));
    }

    fn is_rejected(e: &String) -> bool {
        e == "invalid_auth"
    }

    #[tokio::test]
    async fn retries_transient_failures_until_success() {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let mut attempts = 0;

        let result = retry_until_accepted(&tx, Duration::ZERO, is_rejected, || {
            attempts += 1;
            let outcome = if attempts < 3 { Err("dns error".to_string()) } else { Ok(attempts) };
            async move { outcome }
        })
        .await
        .unwrap();

        assert_eq!(result, Some(3));
        assert_eq!(rx.recv().await, Some(ChatEvent::ConnectionError("dns error".to_string())));
        assert_eq!(rx.recv().await, Some(ChatEvent::ConnectionError("dns error".to_string())));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn stops_retrying_on_rejected_token() {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();

        let result = retry_until_accepted(&tx, Duration::ZERO, is_rejected, || async { Err::<(), _>("invalid_auth".to_string()) })
            .await
            .unwrap();

        assert_eq!(result, None);
        assert_eq!(rx.recv().await, Some(ChatEvent::InvalidAuth));
    }

    #[tokio::test]
    async fn gives_up_when_nobody_listens() {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        drop(rx);

        let result = retry_until_accepted(&tx, Duration::ZERO, is_rejected, || async { Err::<(), _>("timeout".to_string()) }).await;

        assert!(result.is_err());
    }

    #[test]
    fn drops_messages_without_a_channel() {
        let event: SlackMessageEvent = serde_json::from_value(serde_json::json!({
            "type": "message",
            "ts": "1700000000.000300",
            "user": "U456",
            "text": "hello"
        }))
        .unwrap();

        assert!(to_message_event(event).is_none());
    }
}
