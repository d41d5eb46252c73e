//! Emote extraction and normalization.

use super::{Collaborators, Flow, Middleware};
use crate::collaborators::EmoteLookup;
use crate::config::PipelineConfig;
use crate::context::{parse_position, EmoteName, EmoteTag, PipelineContext};
use crate::errors::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};

/// Finds first-party and third-party emotes and records them on the context.
///
/// First-party emotes come from the `emotes` tag: every listed position is
/// counted, but only the text at the first position is recorded. Third-party
/// emotes are matched token by token against the lookup, when one is
/// configured.
#[derive(Clone)]
pub struct EmoteStage {
    lookup: Option<Arc<dyn EmoteLookup>>,
    config: PipelineConfig,
}

impl EmoteStage {
    /// Creates a new emote stage.
    #[must_use]
    pub fn new(lookup: Option<Arc<dyn EmoteLookup>>, config: PipelineConfig) -> Self {
        Self { lookup, config }
    }

    /// Creates the stage from a collaborator bundle.
    #[must_use]
    pub fn from_collaborators(collaborators: &Collaborators, config: PipelineConfig) -> Self {
        Self::new(collaborators.emote_lookup.clone(), config)
    }

    fn third_party_emotes(lookup: &dyn EmoteLookup, message: &str) -> Vec<EmoteName> {
        message
            .split_whitespace()
            .filter_map(|token| {
                lookup
                    .get_emote(token)
                    .map(|emote| EmoteName::new(token, emote.provider, emote.url))
            })
            .collect()
    }
}

impl std::fmt::Debug for EmoteStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmoteStage")
            .field("has_lookup", &self.lookup.is_some())
            .finish()
    }
}

/// Resolves the `emotes` tag against the message.
///
/// Returns one record per emote id together with its occurrence count, in
/// tag order. Ids without positions are dropped. A malformed first position
/// yields an empty name; offsets past the end of the message are cut off at
/// the end.
#[must_use]
pub fn platform_emotes(
    message: &str,
    emotes: &EmoteTag,
    config: &PipelineConfig,
) -> Vec<(EmoteName, usize)> {
    emotes
        .iter()
        .filter_map(|(id, positions)| {
            let first = positions.first()?;
            let name = match parse_position(first) {
                Ok((start, end)) => message
                    .chars()
                    .skip(start)
                    .take((end - start).saturating_add(1))
                    .collect(),
                Err(err) => {
                    warn!(emote_id = %id, error = %err, "Unusable emote position, recording empty name");
                    String::new()
                }
            };
            Some((
                EmoteName::platform(name, config.platform_emote_url(id)),
                positions.len(),
            ))
        })
        .collect()
}

#[async_trait]
impl Middleware for EmoteStage {
    fn name(&self) -> &str {
        "emote"
    }

    async fn execute(&self, ctx: &mut PipelineContext) -> Result<Flow> {
        ctx.clear_emotes();

        if let Some(emotes) = ctx.tags().emotes.as_ref() {
            for (emote, occurrences) in platform_emotes(ctx.message(), emotes, &self.config) {
                ctx.add_emote(emote, occurrences);
            }
        }

        if let Some(lookup) = &self.lookup {
            for emote in Self::third_party_emotes(lookup.as_ref(), ctx.message()) {
                ctx.add_emote(emote, 1);
            }
        }

        debug!(
            emote_count = ctx.emote_count(),
            distinct = ctx.emote_names().len(),
            "Emotes extracted"
        );
        Ok(Flow::Continue)
    }
}
