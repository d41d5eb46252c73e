//! The per-event context threaded through every stage.

use super::{EmoteName, MessageTags, XpContext};
use crate::collaborators::XpResult;
use crate::errors::{ChatflowError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A chat message as delivered by the chat-network client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatEvent {
    /// Display name of the sender.
    pub username: String,
    /// Stable identifier of the sender.
    #[serde(alias = "userId", alias = "user-id")]
    pub user_id: String,
    /// Raw chat text.
    pub message: String,
    /// Protocol metadata.
    #[serde(default)]
    pub tags: MessageTags,
}

impl ChatEvent {
    /// Creates a new chat event.
    #[must_use]
    pub fn new(
        username: impl Into<String>,
        user_id: impl Into<String>,
        message: impl Into<String>,
        tags: MessageTags,
    ) -> Self {
        Self {
            username: username.into(),
            user_id: user_id.into(),
            message: message.into(),
            tags,
        }
    }

    /// Parses an event from JSON.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Mutable record for one pipeline invocation.
///
/// Sender identity, message and tags are fixed at creation. Emote fields
/// accumulate as stages run; the XP fields are written at most once.
#[derive(Debug, Clone)]
pub struct PipelineContext {
    event_id: Uuid,
    received_at: DateTime<Utc>,
    username: String,
    user_id: String,
    message: String,
    tags: MessageTags,
    emote_count: usize,
    emote_names: Vec<EmoteName>,
    xp_context: Option<XpContext>,
    xp_result: Option<XpResult>,
}

impl PipelineContext {
    /// Creates a fresh context for one chat message.
    #[must_use]
    pub fn new(
        username: impl Into<String>,
        user_id: impl Into<String>,
        message: impl Into<String>,
        tags: MessageTags,
    ) -> Self {
        Self {
            event_id: Uuid::now_v7(),
            received_at: Utc::now(),
            username: username.into(),
            user_id: user_id.into(),
            message: message.into(),
            tags,
            emote_count: 0,
            emote_names: Vec::new(),
            xp_context: None,
            xp_result: None,
        }
    }

    /// Unique id of this invocation, for log correlation.
    #[must_use]
    pub const fn event_id(&self) -> Uuid {
        self.event_id
    }

    /// When the context was created.
    #[must_use]
    pub const fn received_at(&self) -> DateTime<Utc> {
        self.received_at
    }

    /// Display name of the sender.
    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Stable identifier of the sender.
    #[must_use]
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// Raw chat text.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Protocol metadata.
    #[must_use]
    pub const fn tags(&self) -> &MessageTags {
        &self.tags
    }

    /// Total emote occurrences found so far.
    #[must_use]
    pub const fn emote_count(&self) -> usize {
        self.emote_count
    }

    /// Emotes found so far, in discovery order.
    #[must_use]
    pub fn emote_names(&self) -> &[EmoteName] {
        &self.emote_names
    }

    /// Scoring signals, once the XP stage has run.
    #[must_use]
    pub const fn xp_context(&self) -> Option<&XpContext> {
        self.xp_context.as_ref()
    }

    /// Scoring outcome, once the XP stage has run.
    #[must_use]
    pub const fn xp_result(&self) -> Option<&XpResult> {
        self.xp_result.as_ref()
    }

    /// Drops all emote annotations.
    pub fn clear_emotes(&mut self) {
        self.emote_count = 0;
        self.emote_names.clear();
    }

    /// Records an emote that occurs `occurrences` times in the message.
    ///
    /// Only one record is kept however often the emote occurs.
    pub fn add_emote(&mut self, emote: EmoteName, occurrences: usize) {
        self.emote_count += occurrences;
        self.emote_names.push(emote);
    }

    /// Stores the scoring signals and outcome.
    ///
    /// Fails if they were already recorded for this invocation.
    pub fn record_xp(&mut self, xp_context: XpContext, xp_result: XpResult) -> Result<()> {
        if self.xp_result.is_some() {
            return Err(ChatflowError::stage(
                "xp",
                format!("XP already recorded for event {}", self.event_id),
            ));
        }
        self.xp_context = Some(xp_context);
        self.xp_result = Some(xp_result);
        Ok(())
    }
}

impl From<ChatEvent> for PipelineContext {
    fn from(event: ChatEvent) -> Self {
        Self::new(event.username, event.user_id, event.message, event.tags)
    }
}
