//! The static response table read from `config.json`.
//!
//! The table maps channel names to canned replies. Public entries are posted
//! to the channel itself, DM entries are sent privately to users joining it.

use std::{fs, ops::Deref, path::Path, sync::Arc};

use anyhow::Context as _;
use serde::Deserialize;
use tracing::{info, warn};

use super::types::Res;

/// A single canned reply bound to a channel name.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct ResponseEntry {
    pub channel: String,
    pub response: String,
}

/// Response table shared across the application.
///
/// It is trivially cloneable, and immutable once loaded.
#[derive(Debug, Clone, Default)]
pub struct Responses {
    pub inner: Arc<ResponsesInner>,
}

impl Deref for Responses {
    type Target = ResponsesInner;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

#[derive(Debug, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct ResponsesInner {
    /// Replies posted publicly in the channel.
    #[serde(default, rename = "responses")]
    pub public: Vec<ResponseEntry>,
    /// Replies sent as direct messages.
    #[serde(default, rename = "dmresponses")]
    pub direct: Vec<ResponseEntry>,
}

impl Responses {
    /// Reads the table from `path`.
    ///
    /// A file that cannot be read is an error. A file that is not valid JSON
    /// is logged and yields an empty table.
    pub fn load(path: impl AsRef<Path>) -> Res<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).with_context(|| format!("Error opening config file {}", path.display()))?;

        let responses = Self::parse(&text);

        info!(
            public = responses.public.len(),
            direct = responses.direct.len(),
            "Loaded response table from {}",
            path.display()
        );

        Ok(responses)
    }

    /// Decodes the table from JSON text, falling back to an empty table.
    pub fn parse(text: &str) -> Self {
        let inner = serde_json::from_str::<ResponsesInner>(text).unwrap_or_else(|e| {
            warn!("Ignoring malformed response table: {}", e);
            ResponsesInner::default()
        });

        Self { inner: Arc::new(inner) }
    }

    /// Public entries for `channel`, in file order.
    pub fn public_for<'a>(&'a self, channel: &'a str) -> impl Iterator<Item = &'a ResponseEntry> + 'a {
        self.public.iter().filter(move |e| e.channel == channel)
    }

    /// DM entries for `channel`, in file order.
    pub fn direct_for<'a>(&'a self, channel: &'a str) -> impl Iterator<Item = &'a ResponseEntry> + 'a {
        self.direct.iter().filter(move |e| e.channel == channel)
    }
}

impl From<ResponsesInner> for Responses {
    fn from(inner: ResponsesInner) -> Self {
        Self { inner: Arc::new(inner) }
    }
}
