//! Pipeline composition and execution.
//!
//! A [`PipelineRunner`] owns an ordered list of stages and drives each chat
//! event through them. [`PipelineRunner::standard`] wires the built-in
//! emote, XP and render stages in that order.

mod integration_tests;
mod runner;

pub use runner::{PipelineOutcome, PipelineRun, PipelineRunner};
