//! Ordered middleware execution.

use crate::config::PipelineConfig;
use crate::context::{ChatEvent, PipelineContext};
use crate::errors::Result;
use crate::events::{EventSink, LoggingEventSink, NoOpEventSink};
use crate::stages::{Collaborators, EmoteStage, Flow, Middleware, RenderStage, XpStage};
use futures::future::join_all;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info_span, Instrument};

/// How a pipeline run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineOutcome {
    /// Every stage ran and continued.
    Completed,
    /// A stage chose to stop the pipeline.
    Halted {
        /// The stage that halted.
        stage: String,
    },
}

/// Result of one pipeline run.
#[derive(Debug)]
pub struct PipelineRun {
    /// The context after the last stage that ran.
    pub context: PipelineContext,
    /// How the run ended.
    pub outcome: PipelineOutcome,
    /// Number of stages that executed.
    pub stages_run: usize,
    /// Total execution time in milliseconds.
    pub duration_ms: f64,
}

impl PipelineRun {
    /// Returns true if every stage ran.
    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.outcome == PipelineOutcome::Completed
    }

    /// Returns the stage that halted the run, if any.
    #[must_use]
    pub fn halted_by(&self) -> Option<&str> {
        match &self.outcome {
            PipelineOutcome::Halted { stage } => Some(stage),
            PipelineOutcome::Completed => None,
        }
    }
}

/// Drives an ordered list of stages against one context at a time.
///
/// Stages run strictly one after another. A stage returning
/// [`Flow::Halt`] ends the run early; a stage error is returned to the
/// caller and no later stage runs. The runner holds no per-run state, so
/// one instance can process many events concurrently.
pub struct PipelineRunner {
    name: String,
    stages: Vec<Arc<dyn Middleware>>,
    event_sink: Arc<dyn EventSink>,
}

impl std::fmt::Debug for PipelineRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineRunner")
            .field("name", &self.name)
            .field("stages", &self.stage_names())
            .finish()
    }
}

impl PipelineRunner {
    /// Creates a runner with no stages.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            stages: Vec::new(),
            event_sink: Arc::new(NoOpEventSink),
        }
    }

    /// Creates the emote, XP and render pipeline.
    ///
    /// Lifecycle events are logged at `debug` until another sink is set.
    pub fn standard(collaborators: &Collaborators, config: PipelineConfig) -> Result<Self> {
        config.validate()?;

        Ok(Self::new("chat")
            .with_event_sink(Arc::new(LoggingEventSink::debug()))
            .with_stage(Arc::new(EmoteStage::from_collaborators(
                collaborators,
                config.clone(),
            )))
            .with_stage(Arc::new(XpStage::new(collaborators)))
            .with_stage(Arc::new(RenderStage::new(collaborators, config))))
    }

    /// Appends a stage.
    #[must_use]
    pub fn with_stage(mut self, stage: Arc<dyn Middleware>) -> Self {
        self.stages.push(stage);
        self
    }

    /// Appends a stage in place.
    pub fn add_stage(&mut self, stage: Arc<dyn Middleware>) {
        self.stages.push(stage);
    }

    /// Sets the event sink.
    #[must_use]
    pub fn with_event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.event_sink = sink;
        self
    }

    /// Returns the pipeline name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the stage names in execution order.
    #[must_use]
    pub fn stage_names(&self) -> Vec<&str> {
        self.stages.iter().map(|stage| stage.name()).collect()
    }

    /// Returns the number of stages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// Returns true if the runner has no stages.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Builds a context for `event` and runs it.
    pub async fn run_event(&self, event: ChatEvent) -> Result<PipelineRun> {
        self.run(PipelineContext::from(event)).await
    }

    /// Runs several events concurrently, one independent invocation each.
    ///
    /// Results are returned in input order.
    pub async fn run_all<I>(&self, events: I) -> Vec<Result<PipelineRun>>
    where
        I: IntoIterator<Item = ChatEvent>,
    {
        join_all(events.into_iter().map(|event| self.run_event(event))).await
    }

    /// Runs every stage in order against `ctx`.
    pub async fn run(&self, ctx: PipelineContext) -> Result<PipelineRun> {
        let span = info_span!(
            "pipeline",
            pipeline = %self.name,
            event_id = %ctx.event_id(),
            user_id = %ctx.user_id(),
        );
        self.run_stages(ctx).instrument(span).await
    }

    async fn run_stages(&self, mut ctx: PipelineContext) -> Result<PipelineRun> {
        let start = Instant::now();
        let event_id = ctx.event_id().to_string();

        self.event_sink
            .emit(
                "pipeline.started",
                Some(serde_json::json!({
                    "pipeline": &self.name,
                    "event_id": &event_id,
                    "stages": self.stage_names(),
                })),
            )
            .await;

        for (index, stage) in self.stages.iter().enumerate() {
            let stage_name = stage.name();
            self.event_sink
                .emit(
                    "stage.started",
                    Some(serde_json::json!({
                        "stage": stage_name,
                        "event_id": &event_id,
                    })),
                )
                .await;

            let stage_start = Instant::now();
            let flow = match stage.execute(&mut ctx).await {
                Ok(flow) => flow,
                Err(err) => {
                    error!(stage = stage_name, error = %err, "Stage failed, aborting pipeline");
                    self.event_sink
                        .emit(
                            "stage.failed",
                            Some(serde_json::json!({
                                "stage": stage_name,
                                "event_id": &event_id,
                                "error": err.to_string(),
                            })),
                        )
                        .await;
                    return Err(err);
                }
            };
            let stage_duration_ms = stage_start.elapsed().as_secs_f64() * 1000.0;

            self.event_sink
                .emit(
                    "stage.completed",
                    Some(serde_json::json!({
                        "stage": stage_name,
                        "event_id": &event_id,
                        "duration_ms": stage_duration_ms,
                    })),
                )
                .await;

            if flow == Flow::Halt {
                debug!(stage = stage_name, "Stage halted pipeline");
                self.event_sink
                    .emit(
                        "pipeline.halted",
                        Some(serde_json::json!({
                            "stage": stage_name,
                            "event_id": &event_id,
                        })),
                    )
                    .await;

                return Ok(PipelineRun {
                    context: ctx,
                    outcome: PipelineOutcome::Halted {
                        stage: stage_name.to_string(),
                    },
                    stages_run: index + 1,
                    duration_ms: start.elapsed().as_secs_f64() * 1000.0,
                });
            }
        }

        let duration_ms = start.elapsed().as_secs_f64() * 1000.0;
        debug!(duration_ms, emote_count = ctx.emote_count(), "Pipeline completed");
        self.event_sink
            .emit(
                "pipeline.completed",
                Some(serde_json::json!({
                    "event_id": &event_id,
                    "duration_ms": duration_ms,
                })),
            )
            .await;

        Ok(PipelineRun {
            context: ctx,
            outcome: PipelineOutcome::Completed,
            stages_run: self.stages.len(),
            duration_ms,
        })
    }
}
