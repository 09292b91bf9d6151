//! Load configuration via `config` crate with env-override support.

use std::{ops::Deref, path::Path, sync::Arc};

use serde::Deserialize;

use super::types::Res;

/// Default location of the response table.
fn default_responses_path() -> String {
    "config.json".to_string()
}

/// Default delay between connection attempts, in seconds.
fn default_reconnect_delay_secs() -> u64 {
    5
}

/// Configuration for the welcome-bot application.
#[derive(Debug, Clone)]
pub struct Config {
    pub inner: Arc<ConfigInner>,
}

impl Deref for Config {
    type Target = ConfigInner;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct ConfigInner {
    /// Slack bot token (`SLACK_TOKEN`).
    pub slack_token: String,
    /// Slack app-level token used to open the Socket Mode stream (`SLACK_APP_TOKEN`).
    pub slack_app_token: String,
    /// Path to the JSON response table (`RESPONSES_PATH`).
    #[serde(default = "default_responses_path")]
    pub responses_path: String,
    /// Seconds to wait before retrying a failed connection attempt (`RECONNECT_DELAY_SECS`).
    #[serde(default = "default_reconnect_delay_secs")]
    pub reconnect_delay_secs: u64,
}

impl Config {
    pub fn load(explicit_path: Option<&Path>) -> Res<Self> {
        let mut cfg = config::Config::builder().add_source(config::Environment::default());

        if let Some(p) = explicit_path {
            cfg = cfg.add_source(config::File::from(p.to_path_buf()));
        } else if Path::new(".hidden/config.toml").exists() {
            cfg = cfg.add_source(config::File::with_name(".hidden/config.toml"));
        }

        let result = Config {
            inner: Arc::new(cfg.build()?.try_deserialize()?),
        };

        if result.slack_token.is_empty() {
            return Err(anyhow::anyhow!("SLACK_TOKEN must not be empty."));
        }

        if result.slack_app_token.is_empty() {
            return Err(anyhow::anyhow!("SLACK_APP_TOKEN must not be empty."));
        }

        Ok(result)
    }

    /// Returns a copy of this configuration with a different response table path.
    pub fn with_responses_path(&self, path: impl Into<String>) -> Self {
        let mut inner = (*self.inner).clone();
        inner.responses_path = path.into();

        Config { inner: Arc::new(inner) }
    }
}
