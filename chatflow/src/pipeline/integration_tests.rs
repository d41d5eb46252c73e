//! End-to-end tests for the standard chat pipeline.

#[cfg(test)]
mod tests {
    use crate::collaborators::XpResult;
    use crate::config::{PipelineConfig, SubscriptionUpdateMode};
    use crate::context::{ChatEvent, EmoteName, MessageTags, PipelineContext};
    use crate::errors::ChatflowError;
    use crate::events::CollectingEventSink;
    use crate::pipeline::{PipelineOutcome, PipelineRunner};
    use crate::stages::{Collaborators, FnMiddleware, Flow};
    use crate::testing::{
        MockStage, RecordingDisplay, RecordingXpService, StageJournal, StaticEmoteLookup,
        TestEvent,
    };
    use pretty_assertions::assert_eq;
    use std::sync::Arc;
    use std::time::Duration;

    struct Harness {
        xp: Arc<RecordingXpService>,
        display: Arc<RecordingDisplay>,
        runner: PipelineRunner,
    }

    fn harness_with(xp: RecordingXpService, config: PipelineConfig) -> Harness {
        let xp = Arc::new(xp);
        let display = Arc::new(RecordingDisplay::new());
        let lookup = StaticEmoteLookup::new().with_emote("PogU", "7tv", "https://7tv.app/pogu");
        let collaborators = Collaborators::new()
            .with_emote_lookup(Arc::new(lookup))
            .with_xp_service(xp.clone())
            .with_display(display.clone())
            .with_stream_live(|| true);

        Harness {
            xp,
            display,
            runner: PipelineRunner::standard(&collaborators, config).unwrap(),
        }
    }

    fn harness() -> Harness {
        harness_with(
            RecordingXpService::new().with_result(XpResult {
                xp_gained: 10,
                total_xp: 110,
                level: 2,
                leveled_up: true,
            }),
            PipelineConfig::new().with_subscription_updates(SubscriptionUpdateMode::Awaited),
        )
    }

    #[tokio::test]
    async fn test_platform_emote_flows_through_to_display() {
        let h = harness();
        let event = TestEvent::new("Hello Kappa world")
            .with_user("Viewer", "42")
            .with_emote("25", ["6-10"])
            .event();

        let run = h.runner.run_event(event).await.unwrap();

        assert!(run.is_completed());
        assert_eq!(run.stages_run, 3);
        assert_eq!(run.context.emote_count(), 1);
        assert_eq!(run.context.emote_names()[0].name, "Kappa");
        assert!(run.context.emote_names()[0].is_platform());

        let tracked = h.xp.tracked();
        assert_eq!(tracked.len(), 1);
        assert_eq!(tracked[0].user_id, "42");
        assert!(tracked[0].xp_context.has_emotes);
        assert!(tracked[0].xp_context.is_stream_live);
        assert!(!tracked[0].xp_context.is_stream_start);

        assert_eq!(h.display.visibility_calls(), vec![true]);
        let shown = h.display.messages();
        assert_eq!(shown.len(), 1);
        assert_eq!(shown[0].username, "Viewer");
        assert_eq!(shown[0].xp_result.as_ref().map(|r| r.level), Some(2));
    }

    #[tokio::test]
    async fn test_third_party_emote_and_mention() {
        let h = harness();
        let event = TestEvent::new("PogU that was great @streamer").event();

        let run = h.runner.run_event(event).await.unwrap();

        assert_eq!(
            run.context.emote_names(),
            &[EmoteName::new("PogU", "7tv", "https://7tv.app/pogu")]
        );
        assert_eq!(run.context.emote_count(), 1);

        let xp_context = run.context.xp_context().unwrap();
        assert!(xp_context.has_mention);
        assert_eq!(xp_context.emote_count, 1);
    }

    #[tokio::test]
    async fn test_subscriber_months_reach_xp_service() {
        let h = harness();
        let event = TestEvent::new("hi")
            .with_user("Sub", "7")
            .subscriber("1")
            .with_badge("subscriber", "6")
            .with_months("7")
            .event();

        h.runner.run_event(event).await.unwrap();

        assert_eq!(h.xp.subscription_updates(), vec![("Sub".to_string(), 7)]);
        let shown = h.display.messages();
        assert!(shown[0].sub_info.is_subscriber);
        assert_eq!(shown[0].sub_info.badges["subscriber"], "6");
    }

    #[tokio::test]
    async fn test_detached_subscription_update_does_not_delay_display() {
        let h = harness_with(
            RecordingXpService::new().with_subscription_delay(Duration::from_millis(50)),
            PipelineConfig::new(),
        );
        let event = TestEvent::new("hi").subscriber_flag(true).event();

        h.runner.run_event(event).await.unwrap();

        assert_eq!(h.display.messages().len(), 1);
        assert!(h.xp.subscription_updates().is_empty());
        assert!(h.xp.wait_for_subscription_update(Duration::from_secs(2)).await);
        assert_eq!(h.xp.subscription_updates(), vec![("viewer".to_string(), 1)]);
    }

    #[tokio::test]
    async fn test_scoring_failure_aborts_before_render() {
        let h = harness_with(
            RecordingXpService::failing("xp backend unavailable"),
            PipelineConfig::new(),
        );

        let err = h
            .runner
            .run_event(TestEvent::new("hello").event())
            .await
            .unwrap_err();

        assert!(err.is_collaborator_failure());
        assert!(err.to_string().contains("xp backend unavailable"));
        assert!(h.display.visibility_calls().is_empty());
        assert!(h.display.messages().is_empty());
    }

    #[tokio::test]
    async fn test_bare_collaborators_still_complete() {
        let runner = PipelineRunner::standard(&Collaborators::new(), PipelineConfig::new()).unwrap();
        let run = runner
            .run_event(TestEvent::new("Kappa").with_emote("25", ["0-4"]).event())
            .await
            .unwrap();

        assert!(run.is_completed());
        assert_eq!(run.context.emote_count(), 1);
        assert!(run.context.xp_result().is_none());
    }

    #[tokio::test]
    async fn test_json_event_through_pipeline() {
        let h = harness();
        let event = ChatEvent::from_json_str(
            r#"{
                "username": "Viewer",
                "userId": "99",
                "message": "Kappa Kappa",
                "tags": {"emotes": {"25": ["0-4", "6-10"]}, "subscriber": false}
            }"#,
        )
        .unwrap();

        let run = h.runner.run_event(event).await.unwrap();

        assert_eq!(run.context.emote_count(), 2);
        assert_eq!(run.context.emote_names().len(), 1);
        assert!(h.xp.subscription_updates().is_empty());
    }

    #[tokio::test]
    async fn test_json_value_event_keeps_emote_tag_order() {
        let h = harness();
        let event: ChatEvent = serde_json::from_value(serde_json::json!({
            "username": "Viewer",
            "userId": "99",
            "message": "Kappa Keepo",
            "tags": {"emotes": {"25": ["0-4"], "1902": ["6-10"]}},
        }))
        .unwrap();

        let run = h.runner.run_event(event).await.unwrap();

        let names: Vec<_> = run
            .context
            .emote_names()
            .iter()
            .map(|emote| emote.name.as_str())
            .collect();
        assert_eq!(names, vec!["Kappa", "Keepo"]);
        assert_eq!(
            h.display.messages()[0]
                .emotes
                .as_ref()
                .map(|emotes| emotes.keys().cloned().collect::<Vec<_>>()),
            Some(vec!["25".to_string(), "1902".to_string()])
        );
    }

    #[tokio::test]
    async fn test_rerun_context_is_scored_once() {
        let h = harness();
        let first = h
            .runner
            .run_event(TestEvent::new("hello").event())
            .await
            .unwrap();

        let second = h.runner.run(first.context).await.unwrap();

        assert!(second.is_completed());
        assert_eq!(h.xp.tracked().len(), 1);
        assert_eq!(second.context.xp_result().map(|r| r.level), Some(2));
    }

    #[tokio::test]
    async fn test_irc_tags_through_pipeline() {
        let h = harness();
        let tags = MessageTags::parse_irc(
            "badge-info=subscriber/12;badges=subscriber/12;emotes=25:0-4;subscriber=1",
        )
        .unwrap();
        let event = ChatEvent::new("Viewer", "5", "Kappa", tags);

        let run = h.runner.run_event(event).await.unwrap();

        assert_eq!(run.context.emote_names()[0].name, "Kappa");
        assert_eq!(h.xp.subscription_updates(), vec![("Viewer".to_string(), 12)]);
    }

    #[tokio::test]
    async fn test_custom_gate_halts_later_stages() {
        let journal = StageJournal::new();
        let tail = Arc::new(MockStage::new("tail").with_journal(journal.clone()));
        let runner = PipelineRunner::new("gated")
            .with_stage(Arc::new(FnMiddleware::new("gate", |ctx: &mut PipelineContext| {
                if ctx.message().starts_with('!') {
                    Ok(Flow::Halt)
                } else {
                    Ok(Flow::Continue)
                }
            })))
            .with_stage(tail.clone());

        let run = runner
            .run_event(TestEvent::new("!command").event())
            .await
            .unwrap();
        assert_eq!(
            run.outcome,
            PipelineOutcome::Halted {
                stage: "gate".to_string()
            }
        );
        assert_eq!(tail.call_count(), 0);

        runner
            .run_event(TestEvent::new("normal chat").event())
            .await
            .unwrap();
        assert_eq!(journal.entries(), vec!["tail:1000"]);
    }

    #[tokio::test]
    async fn test_concurrent_runs_stay_isolated() {
        let h = harness_with(
            RecordingXpService::new().with_scoring_delay(Duration::from_millis(20)),
            PipelineConfig::new(),
        );
        let events = (0..8).map(|i| {
            TestEvent::new(format!("message {i} Kappa"))
                .with_user(format!("user{i}"), i.to_string())
                .with_emote("25", ["10-14"])
                .event()
        });

        let runs = h.runner.run_all(events).await;

        assert_eq!(runs.len(), 8);
        for (i, run) in runs.into_iter().enumerate() {
            let run = run.unwrap();
            assert_eq!(run.context.user_id(), i.to_string());
            assert_eq!(run.context.emote_names()[0].name, "Kappa");
            assert_eq!(run.context.emote_count(), 1);
        }
        assert_eq!(h.xp.tracked().len(), 8);
        assert_eq!(h.display.messages().len(), 8);
    }

    #[tokio::test]
    async fn test_slow_run_does_not_block_other_runs() {
        let slow_runner = PipelineRunner::new("slow")
            .with_stage(Arc::new(MockStage::new("slow").with_delay(Duration::from_millis(30))));
        let quick = PipelineRunner::new("quick").with_stage(Arc::new(MockStage::new("fast")));

        let (slow, fast) = tokio::join!(
            slow_runner.run_event(TestEvent::new("a").event()),
            quick.run_event(TestEvent::new("b").event()),
        );

        let (slow, fast) = (slow.unwrap(), fast.unwrap());
        assert!(fast.duration_ms < slow.duration_ms);
    }

    #[tokio::test]
    async fn test_event_sink_sees_failure() {
        let sink = Arc::new(CollectingEventSink::new());
        let xp = Arc::new(RecordingXpService::failing("down"));
        let collaborators = Collaborators::new().with_xp_service(xp);
        let runner = PipelineRunner::standard(&collaborators, PipelineConfig::new())
            .unwrap()
            .with_event_sink(sink.clone());

        let result = runner.run_event(TestEvent::new("hi").event()).await;

        assert!(matches!(result, Err(ChatflowError::Collaborator { .. })));
        assert_eq!(
            sink.event_types(),
            vec![
                "pipeline.started",
                "stage.started",
                "stage.completed",
                "stage.started",
                "stage.failed",
            ]
        );
    }
}
