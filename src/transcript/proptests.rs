//! Property-based tests for transcript reconciliation
//!
//! These tests verify the reconciliation invariants hold for arbitrary
//! event sequences:
//! - Replay is deterministic and duplicate deltas are absorbed
//! - Entries keep first-observation order
//! - Content never shrinks or gets rewritten
//! - Signals never touch existing entries

use super::*;
use proptest::prelude::*;
use std::collections::HashSet;

// ============================================================================
// Strategies
// ============================================================================

/// Small id alphabet so sequences revisit the same entries often
fn arb_id() -> impl Strategy<Value = String> {
    "m[0-4]"
}

fn arb_role() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("ai".to_string()),
        Just("tool".to_string()),
        Just("AIMessageChunk".to_string()),
    ]
}

fn arb_delta() -> impl Strategy<Value = StreamEvent> {
    (arb_id(), arb_role(), "[a-c ]{0,4}")
        .prop_map(|(id, role, content)| StreamEvent::delta(id, role, content))
}

fn arb_signal() -> impl Strategy<Value = StreamEvent> {
    ("[a-z0-9]{16}", "[a-z_]{1,12}").prop_map(|(id, content)| StreamEvent::Signal { id, content })
}

fn arb_event() -> impl Strategy<Value = StreamEvent> {
    prop_oneof![4 => arb_delta(), 1 => arb_signal()]
}

fn arb_events() -> impl Strategy<Value = Vec<StreamEvent>> {
    proptest::collection::vec(arb_event(), 0..40)
}

fn replay(start: &Transcript, events: &[StreamEvent]) -> Transcript {
    events
        .iter()
        .cloned()
        .fold(start.clone(), |t, e| reconcile(&t, e))
}

fn event_id(event: &StreamEvent) -> &str {
    match event {
        StreamEvent::Delta { id, .. } | StreamEvent::Signal { id, .. } => id,
    }
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #[test]
    fn prop_replay_is_deterministic(events in arb_events()) {
        let a = replay(&Transcript::new(), &events);
        let b = replay(&Transcript::new(), &events);
        prop_assert_eq!(a, b);
    }

    #[test]
    fn prop_duplicated_deltas_are_absorbed(events in proptest::collection::vec(arb_delta(), 0..40)) {
        let once = replay(&Transcript::new(), &events);
        let doubled: Vec<_> = events.iter().flat_map(|e| [e.clone(), e.clone()]).collect();
        let twice = replay(&Transcript::new(), &doubled);
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn prop_full_replay_of_single_fragment_entries_is_noop(
        contents in proptest::collection::vec("[a-z]{1,8}", 1..10)
    ) {
        // One delta per id: a full replay repeats every fragment verbatim at the tail
        let events: Vec<_> = contents
            .iter()
            .enumerate()
            .map(|(i, c)| StreamEvent::delta(format!("m{i}"), "ai", c.clone()))
            .collect();
        let once = replay(&Transcript::new(), &events);
        let again = replay(&once, &events);
        prop_assert_eq!(once, again);
    }

    #[test]
    fn prop_entries_in_first_observation_order(events in arb_events()) {
        let t = replay(&Transcript::new(), &events);

        let mut seen = HashSet::new();
        let first_seen: Vec<&str> = events
            .iter()
            .map(event_id)
            .filter(|id| seen.insert(*id))
            .collect();

        // Signal ids are unique per event in this generator unless they
        // collide with a delta id, which the alphabets rule out.
        let ids: Vec<&str> = t.iter().map(|e| e.id.as_str()).collect();
        prop_assert_eq!(ids, first_seen);
    }

    #[test]
    fn prop_content_is_append_only(events in arb_events()) {
        let mut t = Transcript::new();
        for event in events {
            let before = t.clone();
            t.apply(event);
            prop_assert!(t.len() >= before.len());
            for old in before.iter() {
                let new = t.get(&old.id).expect("entries are never removed");
                prop_assert!(new.content.starts_with(&old.content));
            }
            // Prefix of the previous transcript is untouched in order
            for (old, new) in before.iter().zip(t.iter()) {
                prop_assert_eq!(&old.id, &new.id);
            }
        }
    }

    #[test]
    fn prop_signal_adds_exactly_one_isolated_entry(
        events in arb_events(),
        signal in arb_signal(),
    ) {
        let before = replay(&Transcript::new(), &events);
        let after = reconcile(&before, signal.clone());

        prop_assert_eq!(after.len(), before.len() + 1);
        prop_assert_eq!(&after.entries()[..before.len()], before.entries());

        let added = &after.entries()[before.len()];
        prop_assert_eq!(added.kind, EntryKind::Signal);
        prop_assert!(!before.contains(&added.id));
        if let StreamEvent::Signal { content, .. } = signal {
            prop_assert_eq!(&added.content, &content);
        }
    }

    #[test]
    fn prop_ids_stay_unique(events in arb_events()) {
        let t = replay(&Transcript::new(), &events);
        let ids: HashSet<_> = t.iter().map(|e| e.id.as_str()).collect();
        prop_assert_eq!(ids.len(), t.len());
    }
}
