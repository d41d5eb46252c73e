//! XP scoring stage.

use super::{Collaborators, Flow, Middleware};
use crate::collaborators::{DisplayManager, StatusProbe, XpService};
use crate::context::{PipelineContext, XpContext};
use crate::errors::{ChatflowError, Result};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

/// Derives scoring signals from the message and asks the XP service to
/// score them.
///
/// The pipeline only continues once scoring settles. A scoring failure is
/// propagated and aborts the pipeline. A context that already carries a
/// result is never scored again.
#[derive(Clone, Default)]
pub struct XpStage {
    xp_service: Option<Arc<dyn XpService>>,
    display: Option<Arc<dyn DisplayManager>>,
    stream_live: Option<StatusProbe>,
    stream_start: Option<StatusProbe>,
}

impl XpStage {
    /// Creates the stage from a collaborator bundle.
    #[must_use]
    pub fn new(collaborators: &Collaborators) -> Self {
        Self {
            xp_service: collaborators.xp_service.clone(),
            display: collaborators.display.clone(),
            stream_live: collaborators.stream_live.clone(),
            stream_start: collaborators.stream_start.clone(),
        }
    }

    fn xp_context(&self, ctx: &PipelineContext) -> XpContext {
        XpContext {
            has_emotes: ctx.emote_count() > 0,
            emote_count: ctx.emote_count(),
            emote_names: ctx.emote_names().to_vec(),
            is_stream_live: self.stream_live.as_ref().is_some_and(|probe| probe()),
            is_stream_start: self.stream_start.as_ref().is_some_and(|probe| probe()),
            has_mention: ctx.message().contains('@'),
            message: ctx.message().to_string(),
        }
    }
}

impl std::fmt::Debug for XpStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("XpStage")
            .field("has_xp_service", &self.xp_service.is_some())
            .field("has_display", &self.display.is_some())
            .finish()
    }
}

#[async_trait]
impl Middleware for XpStage {
    fn name(&self) -> &str {
        "xp"
    }

    async fn execute(&self, ctx: &mut PipelineContext) -> Result<Flow> {
        let Some(xp_service) = &self.xp_service else {
            debug!("No XP service configured, skipping scoring");
            return Ok(Flow::Continue);
        };
        if ctx.xp_result().is_some() {
            debug!(event_id = %ctx.event_id(), "Message already scored, skipping");
            return Ok(Flow::Continue);
        }

        let xp_context = self.xp_context(ctx);
        let result = xp_service
            .track_message(ctx.user_id(), ctx.username(), &xp_context)
            .await
            .map_err(|err| ChatflowError::collaborator("xp_service", err))?;

        debug!(
            xp_gained = result.xp_gained,
            level = result.level,
            leveled_up = result.leveled_up,
            "Message scored"
        );
        ctx.record_xp(xp_context, result)?;

        if let Some(display) = &self.display {
            display.set_visible(true);
        }
        Ok(Flow::Continue)
    }
}
