//! Test fixtures for pipeline testing.

use crate::context::{ChatEvent, MessageTags, PipelineContext, SubscriberTag};

/// Builder for chat events used in tests.
#[derive(Debug, Clone)]
pub struct TestEvent {
    username: String,
    user_id: String,
    message: String,
    tags: MessageTags,
}

impl TestEvent {
    /// Starts an event from `viewer` (id `1000`) with no tags.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            username: "viewer".to_string(),
            user_id: "1000".to_string(),
            message: message.into(),
            tags: MessageTags::new(),
        }
    }

    /// Sets the sender.
    #[must_use]
    pub fn with_user(mut self, username: impl Into<String>, user_id: impl Into<String>) -> Self {
        self.username = username.into();
        self.user_id = user_id.into();
        self
    }

    /// Adds a first-party emote.
    #[must_use]
    pub fn with_emote<I, S>(mut self, id: impl Into<String>, positions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = self.tags.with_emote(id, positions);
        self
    }

    /// Sets the raw `subscriber` tag.
    #[must_use]
    pub fn subscriber(mut self, value: impl Into<String>) -> Self {
        self.tags = self.tags.with_subscriber(SubscriberTag::Text(value.into()));
        self
    }

    /// Sets the `subscriber` tag as a boolean.
    #[must_use]
    pub fn subscriber_flag(mut self, value: bool) -> Self {
        self.tags = self.tags.with_subscriber(SubscriberTag::Flag(value));
        self
    }

    /// Adds a badge.
    #[must_use]
    pub fn with_badge(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags = self.tags.with_badge(name, value);
        self
    }

    /// Sets `badge-info.subscriber`.
    #[must_use]
    pub fn with_months(mut self, months: impl Into<String>) -> Self {
        self.tags = self.tags.with_badge_info("subscriber", months);
        self
    }

    /// Builds the chat event.
    #[must_use]
    pub fn event(self) -> ChatEvent {
        ChatEvent::new(self.username, self.user_id, self.message, self.tags)
    }

    /// Builds a fresh pipeline context.
    #[must_use]
    pub fn context(self) -> PipelineContext {
        PipelineContext::from(self.event())
    }
}
