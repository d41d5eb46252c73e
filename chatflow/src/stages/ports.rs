//! Collaborators - injected capabilities for the built-in stages.
//!
//! Every collaborator is optional. A stage whose collaborator is missing
//! skips its own work and lets the pipeline continue.

use crate::collaborators::{DisplayManager, EmoteLookup, StatusProbe, XpService};
use std::sync::Arc;

/// Optional external components the built-in stages depend on.
#[derive(Clone, Default)]
pub struct Collaborators {
    /// Third-party emote lookup.
    pub emote_lookup: Option<Arc<dyn EmoteLookup>>,
    /// XP scoring service.
    pub xp_service: Option<Arc<dyn XpService>>,
    /// UI display manager.
    pub display: Option<Arc<dyn DisplayManager>>,
    /// Reports whether the stream is live.
    pub stream_live: Option<StatusProbe>,
    /// Reports whether a message coincides with stream start.
    pub stream_start: Option<StatusProbe>,
}

impl std::fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collaborators")
            .field("has_emote_lookup", &self.emote_lookup.is_some())
            .field("has_xp_service", &self.xp_service.is_some())
            .field("has_display", &self.display.is_some())
            .field("has_stream_live", &self.stream_live.is_some())
            .field("has_stream_start", &self.stream_start.is_some())
            .finish()
    }
}

impl Collaborators {
    /// Creates an empty bundle.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the third-party emote lookup.
    #[must_use]
    pub fn with_emote_lookup(mut self, lookup: Arc<dyn EmoteLookup>) -> Self {
        self.emote_lookup = Some(lookup);
        self
    }

    /// Sets the XP service.
    #[must_use]
    pub fn with_xp_service(mut self, service: Arc<dyn XpService>) -> Self {
        self.xp_service = Some(service);
        self
    }

    /// Sets the display manager.
    #[must_use]
    pub fn with_display(mut self, display: Arc<dyn DisplayManager>) -> Self {
        self.display = Some(display);
        self
    }

    /// Sets the stream-live probe.
    #[must_use]
    pub fn with_stream_live(mut self, probe: impl Fn() -> bool + Send + Sync + 'static) -> Self {
        self.stream_live = Some(Arc::new(probe));
        self
    }

    /// Sets the stream-start probe.
    #[must_use]
    pub fn with_stream_start(mut self, probe: impl Fn() -> bool + Send + Sync + 'static) -> Self {
        self.stream_start = Some(Arc::new(probe));
        self
    }

    /// Returns true if an XP service is configured.
    #[must_use]
    pub fn has_xp_service(&self) -> bool {
        self.xp_service.is_some()
    }

    /// Returns true if a display manager is configured.
    #[must_use]
    pub fn has_display(&self) -> bool {
        self.display.is_some()
    }
}
