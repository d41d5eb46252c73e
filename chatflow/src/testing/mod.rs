//! Testing utilities for chatflow pipelines.
//!
//! This module provides:
//! - Recording collaborators (XP service, display, emote lookup)
//! - Configurable mock stages and a shared stage journal
//! - A chat event builder

mod fixtures;
mod mocks;

pub use fixtures::TestEvent;
pub use mocks::{
    MockStage, RecordingDisplay, RecordingXpService, StageJournal, StaticEmoteLookup,
    TrackedMessage,
};
