//! Final UI dispatch stage.

use super::{Collaborators, Flow, Middleware};
use crate::collaborators::{DisplayManager, DisplayMessage, SubInfo, XpService};
use crate::config::{PipelineConfig, SubscriptionUpdateMode};
use crate::context::{MessageTags, PipelineContext};
use crate::errors::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};

/// Builds subscriber presentation data and hands the message to the display.
///
/// For subscribers it also reports the subscription length to the XP
/// service. That update never blocks or prevents the display; depending on
/// [`SubscriptionUpdateMode`] it is either spawned or awaited first, and its
/// failures are only logged.
#[derive(Clone)]
pub struct RenderStage {
    display: Option<Arc<dyn DisplayManager>>,
    xp_service: Option<Arc<dyn XpService>>,
    config: PipelineConfig,
}

impl RenderStage {
    /// Creates the stage from a collaborator bundle.
    #[must_use]
    pub fn new(collaborators: &Collaborators, config: PipelineConfig) -> Self {
        Self {
            display: collaborators.display.clone(),
            xp_service: collaborators.xp_service.clone(),
            config,
        }
    }

    /// Month count for a subscriber, falling back to the configured default.
    fn subscriber_months(&self, tags: &MessageTags) -> u32 {
        match tags.subscriber_months() {
            Ok(Some(months)) => months,
            Ok(None) => self.config.default_subscriber_months,
            Err(err) => {
                warn!(
                    error = %err,
                    fallback = self.config.default_subscriber_months,
                    "Unusable subscriber month count"
                );
                self.config.default_subscriber_months
            }
        }
    }

    async fn update_subscription(&self, xp_service: &Arc<dyn XpService>, username: &str, months: u32) {
        let detached = self.config.subscription_updates == SubscriptionUpdateMode::Detached;

        match tokio::runtime::Handle::try_current() {
            Ok(handle) if detached => {
                let xp_service = Arc::clone(xp_service);
                let username = username.to_string();
                handle.spawn(async move {
                    if let Err(err) = xp_service.update_subscription(&username, months).await {
                        warn!(username = %username, months, error = %err, "Subscription update failed");
                    }
                });
            }
            _ => {
                if let Err(err) = xp_service.update_subscription(username, months).await {
                    warn!(username = %username, months, error = %err, "Subscription update failed");
                }
            }
        }
    }
}

impl std::fmt::Debug for RenderStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderStage")
            .field("has_display", &self.display.is_some())
            .field("has_xp_service", &self.xp_service.is_some())
            .field("subscription_updates", &self.config.subscription_updates)
            .finish()
    }
}

#[async_trait]
impl Middleware for RenderStage {
    fn name(&self) -> &str {
        "render"
    }

    async fn execute(&self, ctx: &mut PipelineContext) -> Result<Flow> {
        let Some(display) = &self.display else {
            debug!("No display configured, nothing to render");
            return Ok(Flow::Continue);
        };

        let tags = ctx.tags();
        let sub_info = SubInfo {
            is_subscriber: tags.is_subscriber(),
            badges: tags.badges.clone().unwrap_or_default(),
            badge_info: tags.badge_info.clone().unwrap_or_default(),
        };

        if sub_info.is_subscriber {
            if let Some(xp_service) = &self.xp_service {
                let months = self.subscriber_months(tags);
                self.update_subscription(xp_service, ctx.username(), months)
                    .await;
            }
        }

        display.display_message(DisplayMessage {
            username: ctx.username().to_string(),
            message: ctx.message().to_string(),
            emotes: ctx.tags().emotes.clone(),
            sub_info,
            xp_result: ctx.xp_result().cloned(),
        });
        debug!("Message dispatched to display");

        Ok(Flow::Continue)
    }
}
