//! Recording collaborators and stages for testing.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;

use crate::collaborators::{
    DisplayManager, DisplayMessage, EmoteLookup, ThirdPartyEmote, XpResult, XpService,
};
use crate::context::{PipelineContext, XpContext};
use crate::errors::{ChatflowError, Result};
use crate::stages::{Flow, Middleware};

/// An emote lookup backed by a fixed table.
#[derive(Debug, Default, Clone)]
pub struct StaticEmoteLookup {
    emotes: HashMap<String, ThirdPartyEmote>,
}

impl StaticEmoteLookup {
    /// Creates an empty lookup.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an emote.
    #[must_use]
    pub fn with_emote(
        mut self,
        name: impl Into<String>,
        provider: impl Into<String>,
        url: impl Into<String>,
    ) -> Self {
        self.emotes
            .insert(name.into(), ThirdPartyEmote::new(provider, url));
        self
    }
}

impl EmoteLookup for StaticEmoteLookup {
    fn get_emote(&self, token: &str) -> Option<ThirdPartyEmote> {
        self.emotes.get(token).cloned()
    }
}

/// One recorded `track_message` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackedMessage {
    /// Sender id.
    pub user_id: String,
    /// Sender display name.
    pub username: String,
    /// Signals passed in.
    pub xp_context: XpContext,
}

/// An XP service that records every call and returns a fixed result.
#[derive(Debug, Default)]
pub struct RecordingXpService {
    result: XpResult,
    failure: Option<String>,
    scoring_delay: Duration,
    subscription_delay: Duration,
    tracked: Mutex<Vec<TrackedMessage>>,
    subscriptions: Mutex<Vec<(String, u32)>>,
    subscription_notify: Notify,
}

impl RecordingXpService {
    /// Creates a service that scores every message with the default result.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a service whose scoring always fails.
    #[must_use]
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            failure: Some(message.into()),
            ..Self::default()
        }
    }

    /// Sets the result returned by scoring.
    #[must_use]
    pub fn with_result(mut self, result: XpResult) -> Self {
        self.result = result;
        self
    }

    /// Delays every scoring call.
    #[must_use]
    pub fn with_scoring_delay(mut self, delay: Duration) -> Self {
        self.scoring_delay = delay;
        self
    }

    /// Delays every subscription update before it is recorded.
    #[must_use]
    pub fn with_subscription_delay(mut self, delay: Duration) -> Self {
        self.subscription_delay = delay;
        self
    }

    /// Returns the recorded scoring calls.
    #[must_use]
    pub fn tracked(&self) -> Vec<TrackedMessage> {
        self.tracked.lock().clone()
    }

    /// Returns the recorded `(username, months)` subscription updates.
    #[must_use]
    pub fn subscription_updates(&self) -> Vec<(String, u32)> {
        self.subscriptions.lock().clone()
    }

    /// Waits until a subscription update has been recorded.
    ///
    /// Returns false if none arrived within `timeout`.
    pub async fn wait_for_subscription_update(&self, timeout: Duration) -> bool {
        tokio::time::timeout(timeout, self.subscription_notify.notified())
            .await
            .is_ok()
    }
}

#[async_trait]
impl XpService for RecordingXpService {
    async fn track_message(
        &self,
        user_id: &str,
        username: &str,
        xp_context: &XpContext,
    ) -> anyhow::Result<XpResult> {
        if !self.scoring_delay.is_zero() {
            tokio::time::sleep(self.scoring_delay).await;
        }
        self.tracked.lock().push(TrackedMessage {
            user_id: user_id.to_string(),
            username: username.to_string(),
            xp_context: xp_context.clone(),
        });

        match &self.failure {
            Some(message) => Err(anyhow::anyhow!(message.clone())),
            None => Ok(self.result.clone()),
        }
    }

    async fn update_subscription(&self, username: &str, months: u32) -> anyhow::Result<()> {
        if !self.subscription_delay.is_zero() {
            tokio::time::sleep(self.subscription_delay).await;
        }
        self.subscriptions.lock().push((username.to_string(), months));
        self.subscription_notify.notify_one();
        Ok(())
    }
}

/// A display manager that records what it was asked to do.
#[derive(Debug, Default)]
pub struct RecordingDisplay {
    visibility: Mutex<Vec<bool>>,
    messages: Mutex<Vec<DisplayMessage>>,
}

impl RecordingDisplay {
    /// Creates a new recording display.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns every `set_visible` argument, in call order.
    #[must_use]
    pub fn visibility_calls(&self) -> Vec<bool> {
        self.visibility.lock().clone()
    }

    /// Returns every displayed message, in call order.
    #[must_use]
    pub fn messages(&self) -> Vec<DisplayMessage> {
        self.messages.lock().clone()
    }
}

impl DisplayManager for RecordingDisplay {
    fn set_visible(&self, visible: bool) {
        self.visibility.lock().push(visible);
    }

    fn display_message(&self, message: DisplayMessage) {
        self.messages.lock().push(message);
    }
}

/// Shared log of stage names in the order they ran.
#[derive(Debug, Default, Clone)]
pub struct StageJournal {
    entries: Arc<Mutex<Vec<String>>>,
}

impl StageJournal {
    /// Creates an empty journal.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an entry.
    pub fn record(&self, entry: impl Into<String>) {
        self.entries.lock().push(entry.into());
    }

    /// Returns all entries.
    #[must_use]
    pub fn entries(&self) -> Vec<String> {
        self.entries.lock().clone()
    }
}

/// A stage that counts its calls and returns a fixed flow or error.
#[derive(Debug)]
pub struct MockStage {
    name: String,
    flow: Flow,
    error: Option<String>,
    delay: Duration,
    journal: Option<StageJournal>,
    call_count: AtomicUsize,
}

impl MockStage {
    /// Creates a stage that continues.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            flow: Flow::Continue,
            error: None,
            delay: Duration::ZERO,
            journal: None,
            call_count: AtomicUsize::new(0),
        }
    }

    /// Creates a stage that halts the pipeline.
    #[must_use]
    pub fn halting(name: impl Into<String>) -> Self {
        Self {
            flow: Flow::Halt,
            ..Self::new(name)
        }
    }

    /// Creates a stage that fails.
    #[must_use]
    pub fn failing(name: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::new(name)
        }
    }

    /// Suspends for `delay` before returning.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Records each call into `journal`.
    #[must_use]
    pub fn with_journal(mut self, journal: StageJournal) -> Self {
        self.journal = Some(journal);
        self
    }

    /// Returns the number of times the stage ran.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Middleware for MockStage {
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(&self, ctx: &mut PipelineContext) -> Result<Flow> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        if let Some(journal) = &self.journal {
            journal.record(format!("{}:{}", self.name, ctx.user_id()));
        }
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        match &self.error {
            Some(error) => Err(ChatflowError::stage(&self.name, error)),
            None => Ok(self.flow),
        }
    }
}
