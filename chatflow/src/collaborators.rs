//! Interfaces of the external components the pipeline talks to.
//!
//! None of these are implemented here; the host application wires concrete
//! implementations in through [`crate::stages::Collaborators`].

use crate::context::{BadgeMap, EmoteTag, XpContext};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A third-party emote match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThirdPartyEmote {
    /// Provider name, e.g. `"7tv"`.
    pub provider: String,
    /// Image URL.
    pub url: String,
}

impl ThirdPartyEmote {
    /// Creates a new match.
    #[must_use]
    pub fn new(provider: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            url: url.into(),
        }
    }
}

/// Outcome of scoring one message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct XpResult {
    /// XP awarded for this message.
    pub xp_gained: u64,
    /// The sender's running total.
    pub total_xp: u64,
    /// The sender's level after this message.
    pub level: u32,
    /// Whether this message crossed a level boundary.
    pub leveled_up: bool,
}

/// Subscriber presentation data handed to the display.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubInfo {
    /// Whether the sender is subscribed.
    pub is_subscriber: bool,
    /// Badges, empty when the tag was absent.
    pub badges: BadgeMap,
    /// Badge metadata, empty when the tag was absent.
    pub badge_info: BadgeMap,
}

/// Everything the display needs to render one message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayMessage {
    /// Display name of the sender.
    pub username: String,
    /// Raw chat text.
    pub message: String,
    /// First-party emote positions, as received.
    pub emotes: Option<EmoteTag>,
    /// Subscriber presentation data.
    pub sub_info: SubInfo,
    /// Scoring outcome, if the message was scored.
    pub xp_result: Option<XpResult>,
}

/// Looks up emotes from third-party providers.
#[cfg_attr(test, mockall::automock)]
pub trait EmoteLookup: Send + Sync {
    /// Returns the emote named exactly `token`, if any provider defines it.
    fn get_emote(&self, token: &str) -> Option<ThirdPartyEmote>;
}

/// Scores messages and tracks per-user progression.
///
/// Implementations own their per-user state and must serialize concurrent
/// updates for the same user themselves.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait XpService: Send + Sync {
    /// Scores one message.
    async fn track_message(
        &self,
        user_id: &str,
        username: &str,
        xp_context: &XpContext,
    ) -> anyhow::Result<XpResult>;

    /// Records the sender's subscription length.
    async fn update_subscription(&self, username: &str, months: u32) -> anyhow::Result<()>;
}

/// The UI surface messages are rendered on.
#[cfg_attr(test, mockall::automock)]
pub trait DisplayManager: Send + Sync {
    /// Shows or hides the surface.
    fn set_visible(&self, visible: bool);

    /// Renders one message.
    fn display_message(&self, message: DisplayMessage);
}

/// Zero-argument status query, such as "is the stream live".
pub type StatusProbe = Arc<dyn Fn() -> bool + Send + Sync>;
