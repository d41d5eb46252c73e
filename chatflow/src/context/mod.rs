//! Context management for pipeline execution.
//!
//! This module provides:
//! - The incoming [`ChatEvent`] and its IRC-style [`MessageTags`]
//! - The mutable [`PipelineContext`] threaded through every stage
//! - The records stages attach to it

mod pipeline;
mod records;
mod tags;

pub use pipeline::{ChatEvent, PipelineContext};
pub use records::{EmoteName, XpContext, PLATFORM_PROVIDER};
pub use tags::{parse_position, BadgeMap, EmoteTag, MessageTags, SubscriberTag};
