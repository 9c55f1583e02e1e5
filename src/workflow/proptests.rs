//! Property-based tests for the turn workflow
//!
//! These check the routing and transcript-merge invariants across
//! generated transcripts, topics and user texts.

use super::testing::TestWorkflow;
use super::topic::{is_confirmation, CONFIRMATION_KEYWORDS, DETAILED_ANSWER_HINT};
use super::{Topic, WorkflowInput};
use crate::transcript::{Transcript, TurnItem};
use proptest::prelude::*;

// ============================================================================
// Arbitrary Generators
// ============================================================================

fn arb_topic() -> impl Strategy<Value = Topic> {
    prop_oneof![
        Just(Topic::Food),
        Just(Topic::Water),
        Just(Topic::Transport),
        Just(Topic::Energy),
    ]
}

fn arb_item() -> impl Strategy<Value = TurnItem> {
    prop_oneof![
        "[a-zA-Z ?]{1,30}".prop_map(TurnItem::user),
        ("[a-z0-9]{6}", "[a-zA-Z .]{1,40}").prop_map(|(id, text)| TurnItem::assistant(id, text)),
        Just(TurnItem::system_hint(DETAILED_ANSWER_HINT)),
        ("[a-z0-9]{6}", "call_[a-z0-9]{4}")
            .prop_map(|(id, call)| TurnItem::tool_call(id, call, "get_epa_water_data", "{}")),
        ("[a-z0-9]{6}", "call_[a-z0-9]{4}", "[a-z ]{0,20}")
            .prop_map(|(id, call, out)| TurnItem::tool_result(id, call, out)),
    ]
}

fn arb_transcript() -> impl Strategy<Value = Transcript> {
    prop::collection::vec(arb_item(), 0..8).prop_map(Transcript::from)
}

fn arb_keyword() -> impl Strategy<Value = &'static str> {
    prop::sample::select(CONFIRMATION_KEYWORDS.to_vec())
}

/// Text guaranteed to contain no confirmation keyword
fn arb_plain_question() -> impl Strategy<Value = String> {
    "[bcfghmnqrtvwx ]{1,30}"
        .prop_filter("contains a keyword", |s| {
            !s.trim().is_empty() && !is_confirmation(s)
        })
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    /// A confirmation with a previous topic reuses it and never classifies
    #[test]
    fn prop_confirmation_short_circuits(
        prior in arb_transcript(),
        topic in arb_topic(),
        keyword in arb_keyword(),
        prefix in "[a-z ]{0,10}",
    ) {
        let wf = TestWorkflow::new().locate(Some("Austin")).answer_all();
        let text = format!("{prefix}{keyword} give me more");

        let envelope = runtime().block_on(
            wf.orchestrator().run(
                WorkflowInput::new(text)
                    .with_transcript(prior)
                    .with_previous_topic(Some(topic.as_str().to_string())),
            ),
        ).unwrap();

        prop_assert_eq!(envelope.topic.as_deref(), Some(topic.as_str()));
        prop_assert_eq!(wf.classifier.call_count(), 0);
        prop_assert_eq!(wf.specialist(topic).call_count(), 1);
    }

    /// Without a confirmation (or without a previous topic), classify exactly once
    #[test]
    fn prop_classifies_exactly_once(
        prior in arb_transcript(),
        previous in prop::option::of(arb_topic()),
        text in arb_plain_question(),
        classified in arb_topic(),
    ) {
        let wf = TestWorkflow::new()
            .classify(classified.as_str())
            .locate(None)
            .answer_all();

        runtime().block_on(
            wf.orchestrator().run(
                WorkflowInput::new(text)
                    .with_transcript(prior)
                    .with_previous_topic(previous.map(|t| t.as_str().to_string())),
            ),
        ).unwrap();

        prop_assert_eq!(wf.classifier.call_count(), 1);
    }

    /// Location extraction runs once per turn on either path
    #[test]
    fn prop_location_extracted_once(
        prior in arb_transcript(),
        previous in prop::option::of(arb_topic()),
        text in "[a-z ]{1,30}",
    ) {
        let wf = TestWorkflow::new()
            .classify("water")
            .locate(Some("Lima"))
            .answer_all();

        let result = runtime().block_on(
            wf.orchestrator().run(
                WorkflowInput::new(text)
                    .with_transcript(prior)
                    .with_previous_topic(previous.map(|t| t.as_str().to_string())),
            ),
        );

        if result.is_ok() {
            prop_assert_eq!(wf.locator.call_count(), 1);
        } else {
            // Only blank text is rejected, and then nothing is called
            prop_assert_eq!(wf.locator.call_count(), 0);
        }
    }

    /// Replaying an input yields the prior transcript plus exactly one user
    /// item before any collaborator output
    #[test]
    fn prop_user_item_appended_once(
        prior in arb_transcript(),
        text in "[a-zA-Z ?]{1,30}",
    ) {
        prop_assume!(!text.trim().is_empty());

        for _ in 0..2 {
            let wf = TestWorkflow::new().classify("food").locate(None).answer_all();
            let envelope = runtime().block_on(
                wf.orchestrator().run(
                    WorkflowInput::new(text.clone()).with_transcript(prior.clone()),
                ),
            ).unwrap();

            prop_assert!(envelope.transcript.starts_with(&prior));
            let appended = envelope.transcript.tail_after(prior.len());
            prop_assert_eq!(&appended[0], &TurnItem::user(text.clone()));
            let user_items = appended
                .iter()
                .filter(|item| matches!(item, TurnItem::UserText { .. }))
                .count();
            prop_assert_eq!(user_items, 1);
        }
    }

    /// Feeding the returned transcript back preserves it as an exact prefix
    #[test]
    fn prop_transcript_round_trip(
        prior in arb_transcript(),
        first in arb_plain_question(),
        second in arb_plain_question(),
    ) {
        let wf = TestWorkflow::new().classify("energy").locate(None).answer_all();
        let rt = runtime();

        let turn1 = rt.block_on(
            wf.orchestrator().run(WorkflowInput::new(first).with_transcript(prior.clone())),
        ).unwrap();
        let turn2 = rt.block_on(
            wf.orchestrator().run(
                WorkflowInput::new(second)
                    .with_transcript(turn1.transcript.clone())
                    .with_previous_topic(turn1.topic.clone()),
            ),
        ).unwrap();

        prop_assert!(turn1.transcript.starts_with(&prior));
        prop_assert!(turn2.transcript.starts_with(&turn1.transcript));
        prop_assert!(turn2.transcript.len() > turn1.transcript.len());
    }

    /// Labels outside the known set never reach a specialist
    #[test]
    fn prop_unknown_label_is_unroutable(label in "[a-z]{1,12}") {
        prop_assume!(Topic::parse(&label).is_none());

        let wf = TestWorkflow::new().classify(&label).locate(None).answer_all();
        let envelope = runtime().block_on(
            wf.orchestrator().run(WorkflowInput::new("what about this thing")),
        ).unwrap();

        prop_assert_eq!(envelope.topic.as_deref(), Some(label.as_str()));
        prop_assert!(envelope.answer_text.contains(&label));
        for topic in Topic::ALL {
            prop_assert_eq!(wf.specialist(topic).call_count(), 0);
        }
    }
}
