//! Pipeline lifecycle events.
//!
//! The pipeline runner reports `pipeline.started`, `stage.started`,
//! `stage.completed`, `stage.failed`, `pipeline.halted` and
//! `pipeline.completed` to an [`EventSink`]. The standard runner logs them
//! through [`LoggingEventSink`].

mod sink;

pub use sink::{CollectingEventSink, EventSink, LoggingEventSink, NoOpEventSink, RecordedEvent};
