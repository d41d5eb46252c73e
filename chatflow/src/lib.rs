//! # Chatflow
//!
//! A middleware pipeline that enriches live-stream chat messages before
//! they reach an overlay.
//!
//! Each incoming message runs through an ordered chain of stages:
//!
//! - **Emote**: extracts first-party emotes from the message tags and
//!   matches third-party emotes against a lookup
//! - **XP**: derives engagement signals and has them scored
//! - **Render**: assembles subscriber data and hands the message to the
//!   display
//!
//! A stage may halt the chain, and a stage error aborts it. Every
//! external component (emote lookup, XP service, display, stream status)
//! is optional and injected through [`stages::Collaborators`].
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use chatflow::prelude::*;
//! use std::sync::Arc;
//!
//! let collaborators = Collaborators::new()
//!     .with_xp_service(Arc::new(my_xp_service))
//!     .with_display(Arc::new(my_overlay));
//!
//! let runner = PipelineRunner::standard(&collaborators, PipelineConfig::new())?;
//! let run = runner.run_event(ChatEvent::from_json_str(payload)?).await?;
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod collaborators;
pub mod config;
pub mod context;
pub mod errors;
pub mod events;
pub mod observability;
pub mod pipeline;
pub mod stages;
pub mod testing;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::collaborators::{
        DisplayManager, DisplayMessage, EmoteLookup, StatusProbe, SubInfo, ThirdPartyEmote,
        XpResult, XpService,
    };
    pub use crate::config::{PipelineConfig, SubscriptionUpdateMode};
    pub use crate::context::{
        ChatEvent, EmoteName, EmoteTag, MessageTags, PipelineContext, SubscriberTag, XpContext,
    };
    pub use crate::errors::{ChatflowError, Result, TagParseError};
    pub use crate::events::{EventSink, LoggingEventSink, NoOpEventSink};
    pub use crate::observability::{init_tracing, LogFormat};
    pub use crate::pipeline::{PipelineOutcome, PipelineRun, PipelineRunner};
    pub use crate::stages::{
        Collaborators, EmoteStage, Flow, FnMiddleware, Middleware, RenderStage, XpStage,
    };
}
