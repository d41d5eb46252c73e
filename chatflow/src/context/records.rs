//! Records that stages derive and attach to the pipeline context.

use serde::{Deserialize, Serialize};

/// Provider label used for emotes defined by the chat platform itself.
pub const PLATFORM_PROVIDER: &str = "platform";

/// One emote recognised in a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmoteName {
    /// The emote text as it appeared in the message.
    pub name: String,
    /// Who defines the emote (`"platform"`, `"7tv"`, `"bttv"`, ...).
    pub provider: String,
    /// Image URL.
    pub url: String,
}

impl EmoteName {
    /// Creates a new emote record.
    #[must_use]
    pub fn new(name: impl Into<String>, provider: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            provider: provider.into(),
            url: url.into(),
        }
    }

    /// Creates a first-party emote record.
    #[must_use]
    pub fn platform(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self::new(name, PLATFORM_PROVIDER, url)
    }

    /// Returns true if the platform defines this emote.
    #[must_use]
    pub fn is_platform(&self) -> bool {
        self.provider == PLATFORM_PROVIDER
    }
}

/// Signals handed to the XP service when scoring a message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct XpContext {
    /// Whether any emote was found.
    pub has_emotes: bool,
    /// Total emote occurrences.
    pub emote_count: usize,
    /// Recognised emotes in message order.
    pub emote_names: Vec<EmoteName>,
    /// Whether the stream is currently live.
    pub is_stream_live: bool,
    /// Whether this message coincides with stream start.
    pub is_stream_start: bool,
    /// Whether the message contains an `@` mention.
    pub has_mention: bool,
    /// The raw message text.
    pub message: String,
}
