//! Pipeline configuration.

use crate::errors::{ChatflowError, Result};
use serde::{Deserialize, Serialize};

/// Placeholder replaced by the emote id in URL templates.
pub const EMOTE_ID_PLACEHOLDER: &str = "{id}";

/// How the render stage issues subscription updates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionUpdateMode {
    /// Spawn the update and display without waiting for it.
    #[default]
    Detached,
    /// Wait for the update to settle before displaying.
    Awaited,
}

/// Configuration shared by the built-in stages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// URL template for first-party emotes; `{id}` is replaced by the emote id.
    #[serde(default = "default_emote_url_template")]
    pub platform_emote_url_template: String,
    /// Months reported when the badge-info month count is missing or invalid.
    #[serde(default = "default_subscriber_months")]
    pub default_subscriber_months: u32,
    /// Subscription update ordering.
    #[serde(default)]
    pub subscription_updates: SubscriptionUpdateMode,
}

fn default_emote_url_template() -> String {
    "https://static-cdn.jtvnw.net/emoticons/v2/{id}/default/dark/1.0".to_string()
}

const fn default_subscriber_months() -> u32 {
    1
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            platform_emote_url_template: default_emote_url_template(),
            default_subscriber_months: default_subscriber_months(),
            subscription_updates: SubscriptionUpdateMode::default(),
        }
    }
}

impl PipelineConfig {
    /// Creates a configuration with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses and validates a JSON configuration.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Sets the emote URL template.
    #[must_use]
    pub fn with_emote_url_template(mut self, template: impl Into<String>) -> Self {
        self.platform_emote_url_template = template.into();
        self
    }

    /// Sets the fallback month count.
    #[must_use]
    pub fn with_default_subscriber_months(mut self, months: u32) -> Self {
        self.default_subscriber_months = months;
        self
    }

    /// Sets the subscription update mode.
    #[must_use]
    pub fn with_subscription_updates(mut self, mode: SubscriptionUpdateMode) -> Self {
        self.subscription_updates = mode;
        self
    }

    /// Checks the configuration for values the stages cannot work with.
    pub fn validate(&self) -> Result<()> {
        if !self.platform_emote_url_template.contains(EMOTE_ID_PLACEHOLDER) {
            return Err(ChatflowError::Config(format!(
                "platform_emote_url_template must contain '{EMOTE_ID_PLACEHOLDER}'"
            )));
        }
        if self.default_subscriber_months == 0 {
            return Err(ChatflowError::Config(
                "default_subscriber_months must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Builds the image URL for a first-party emote.
    #[must_use]
    pub fn platform_emote_url(&self, emote_id: &str) -> String {
        self.platform_emote_url_template
            .replace(EMOTE_ID_PLACEHOLDER, emote_id)
    }
}
