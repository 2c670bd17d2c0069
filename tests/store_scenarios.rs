//! Shared-store behaviour as seen by several editors at once
//!
//! Covers notification fan-out, snapshot isolation, selection sync and the
//! routing graph through the public API only.

use cardplay_store::event::{ChangeKind, Event, EventPatch, StreamOptions};
use cardplay_store::routing::{ConnectionType, RoutingNode};
use cardplay_store::{EditorContext, EventId, EventOrdering, StoreConfig};
use std::cell::RefCell;
use std::rc::Rc;

fn sorted_ids(events: &[Event]) -> Vec<String> {
    let mut ids: Vec<String> = events.iter().map(|e| e.id.to_string()).collect();
    ids.sort();
    ids
}

/// Two subscribers each see exactly one notification per mutating call
#[test]
fn test_two_subscribers_add_then_remove() {
    let mut ctx = EditorContext::default();
    ctx.events_mut()
        .create_stream(StreamOptions::new("Lead").with_id("s"))
        .unwrap();

    let piano_roll: Rc<RefCell<Vec<(ChangeKind, usize)>>> = Rc::default();
    let arranger: Rc<RefCell<Vec<(ChangeKind, usize)>>> = Rc::default();
    for log in [&piano_roll, &arranger] {
        let log = log.clone();
        ctx.events_mut().subscribe("s", move |change| {
            let len = change.stream.as_ref().map_or(0, |s| s.len());
            log.borrow_mut().push((change.kind, len));
        });
    }

    ctx.events_mut()
        .add_events("s", vec![Event::note("n1", 0, 96, 60, 100)]);
    assert_eq!(ctx.events().get_stream("s").unwrap().events().len(), 1);

    ctx.events_mut().remove_events("s", &[EventId::from("n1")]);
    assert_eq!(ctx.events().get_stream("s").unwrap().events().len(), 0);

    let expected = vec![(ChangeKind::EventsAdded, 1), (ChangeKind::EventsRemoved, 0)];
    assert_eq!(*piano_roll.borrow(), expected);
    assert_eq!(*arranger.borrow(), expected);
}

#[test]
fn test_add_remove_round_trip_restores_events() {
    let mut ctx = EditorContext::default();
    ctx.events_mut()
        .create_stream(StreamOptions::new("Bass").with_id("s").with_events(vec![
            Event::note("a", 0, 48, 36, 100),
            Event::note("b", 48, 48, 38, 100),
        ]))
        .unwrap();
    let before = ctx.events().get_stream("s").unwrap();

    ctx.events_mut()
        .add_events("s", vec![Event::note("c", 24, 24, 40, 80)]);
    ctx.events_mut().remove_events("s", &[EventId::from("c")]);

    let after = ctx.events().get_stream("s").unwrap();
    assert_eq!(sorted_ids(before.events()), sorted_ids(after.events()));
}

/// Readers holding an old snapshot never see later writes
#[test]
fn test_snapshots_are_isolated_from_later_writes() {
    let mut ctx = EditorContext::default();
    ctx.events_mut()
        .create_stream(
            StreamOptions::new("Lead")
                .with_id("s")
                .with_events(vec![Event::note("n1", 0, 96, 60, 100)]),
        )
        .unwrap();

    let snapshot = ctx.events().get_stream("s").unwrap();
    ctx.events_mut()
        .update_event("s", "n1", &EventPatch::new().with_pitch(72));

    assert_eq!(snapshot.event("n1").unwrap().pitch(), Some(60));
    assert_eq!(
        ctx.events().get_stream("s").unwrap().event("n1").unwrap().pitch(),
        Some(72)
    );
}

#[test]
fn test_update_stream_notifies_once() {
    let mut ctx = EditorContext::default();
    ctx.events_mut()
        .create_stream(StreamOptions::new("Drums").with_id("s").with_events(
            (0..16)
                .map(|i| Event::note(format!("hit{}", i), i * 24, 12, 36, 100))
                .collect(),
        ))
        .unwrap();

    let calls = Rc::new(RefCell::new(0));
    let counter = calls.clone();
    ctx.events_mut()
        .subscribe("s", move |_| *counter.borrow_mut() += 1);

    ctx.events_mut().update_stream("s", |events| {
        events
            .iter()
            .cloned()
            .map(|mut e| {
                EventPatch::new().with_velocity(64).apply(&mut e);
                e
            })
            .collect()
    });

    assert_eq!(*calls.borrow(), 1);
    let stream = ctx.events().get_stream("s").unwrap();
    assert!(stream.events().iter().all(|e| e.velocity() == Some(64)));
}

#[test]
fn test_missing_targets_are_silent() {
    let mut ctx = EditorContext::default();
    let calls = Rc::new(RefCell::new(0));
    let counter = calls.clone();
    ctx.events_mut()
        .subscribe("ghost", move |_| *counter.borrow_mut() += 1);

    assert!(ctx.events().get_stream("ghost").is_none());
    assert!(!ctx.events_mut().add_events("ghost", vec![Event::note("n", 0, 1, 60, 1)]));
    assert!(ctx
        .events_mut()
        .remove_events("ghost", &[EventId::from("n")])
        .is_empty());
    assert!(ctx
        .events_mut()
        .update_event("ghost", "n", &EventPatch::new().with_start(4))
        .is_none());
    assert!(ctx.routing_mut().disconnect("no-such-edge").is_none());

    assert_eq!(*calls.borrow(), 0);
}

#[test]
fn test_subscribe_before_stream_exists() {
    let mut ctx = EditorContext::default();
    let kinds: Rc<RefCell<Vec<ChangeKind>>> = Rc::default();
    let log = kinds.clone();
    ctx.events_mut()
        .subscribe("later", move |change| log.borrow_mut().push(change.kind));

    ctx.events_mut()
        .create_stream(StreamOptions::new("Later").with_id("later"))
        .unwrap();
    ctx.events_mut()
        .add_events("later", vec![Event::automation("a1", 0, "cutoff", 0.5)]);

    assert_eq!(*kinds.borrow(), vec![ChangeKind::Created, ChangeKind::EventsAdded]);
}

#[test]
fn test_insertion_ordering_keeps_append_order() {
    let mut ctx = EditorContext::new(StoreConfig {
        event_ordering: EventOrdering::Insertion,
        ..StoreConfig::default()
    });
    ctx.events_mut()
        .create_stream(StreamOptions::new("Raw").with_id("s"))
        .unwrap();
    ctx.events_mut().add_events(
        "s",
        vec![
            Event::note("late", 96, 12, 60, 100),
            Event::note("early", 0, 12, 60, 100),
        ],
    );

    let stream = ctx.events().get_stream("s").unwrap();
    let ids: Vec<&str> = stream.events().iter().map(|e| e.id.as_str()).collect();
    assert_eq!(ids, vec!["late", "early"]);
}

/// Deleting events through the raw store leaves the selection alone
#[test]
fn test_selection_independent_of_raw_deletes() {
    let mut ctx = EditorContext::default();
    ctx.events_mut()
        .create_stream(
            StreamOptions::new("Lead")
                .with_id("s")
                .with_events(vec![Event::note("n1", 0, 96, 60, 100)]),
        )
        .unwrap();
    ctx.selection_mut().select("s", [EventId::from("n1")]);

    ctx.events_mut().remove_events("s", &[EventId::from("n1")]);

    assert!(ctx.selection().is_selected("s", "n1"));

    // Explicit cleanup is available to adapters that want it
    let stream = ctx.events().get_stream("s").unwrap();
    let pruned = ctx.selection_mut().prune(&stream);
    assert_eq!(pruned, vec![EventId::from("n1")]);
    assert!(ctx.selection().get_selection("s").is_empty());
}

#[test]
fn test_selection_subscribers_are_per_stream() {
    let mut ctx = EditorContext::default();
    let seen: Rc<RefCell<Vec<usize>>> = Rc::default();
    let log = seen.clone();
    ctx.selection_mut()
        .subscribe("a", move |change| log.borrow_mut().push(change.selection.len()));

    ctx.selection_mut()
        .select("a", [EventId::from("x"), EventId::from("y")]);
    ctx.selection_mut().select("b", [EventId::from("z")]);
    ctx.selection_mut().set_selection("a", Vec::<EventId>::new());

    assert_eq!(*seen.borrow(), vec![2, 0]);
    assert_eq!(ctx.selection().get_selection("b").len(), 1);
}

#[test]
fn test_connect_then_disconnect_scenario() {
    let mut ctx = EditorContext::default();
    let before = ctx.routing().get_state().edges.len();

    let e1 = ctx
        .routing_mut()
        .connect("nodeA", "output", "nodeB", "input", ConnectionType::Audio)
        .unwrap();
    let state = ctx.routing().get_state();
    assert_eq!(state.edges.len(), 1);
    assert_eq!(
        state
            .edges
            .iter()
            .filter(|e| e.connection_type == ConnectionType::Audio)
            .count(),
        1
    );

    ctx.routing_mut().disconnect(&e1.id);
    assert!(ctx.routing().get_state().edges.is_empty());
    assert_eq!(ctx.routing().get_state().edges.len(), before);
}

#[test]
fn test_routing_subscribers_get_snapshots() {
    let mut ctx = EditorContext::default();
    let counts: Rc<RefCell<Vec<(usize, usize)>>> = Rc::default();
    let log = counts.clone();
    ctx.routing_mut().subscribe(move |change| {
        log.borrow_mut()
            .push((change.state.nodes.len(), change.state.edges.len()));
    });

    ctx.routing_mut().add_node(RoutingNode::new("a", "Drums"));
    ctx.routing_mut().add_node(RoutingNode::new("b", "Bus"));
    ctx.routing_mut()
        .connect("a", "out", "b", "in", ConnectionType::Audio)
        .unwrap();
    ctx.routing_mut().remove_node("b");

    assert_eq!(*counts.borrow(), vec![(1, 0), (2, 0), (2, 1), (1, 0)]);
}

#[test]
fn test_edges_serialize_with_type_field() {
    let mut ctx = EditorContext::default();
    let edge = ctx
        .routing_mut()
        .connect("a", "out", "b", "in", ConnectionType::Sidechain)
        .unwrap();

    let json = serde_json::to_value(&edge).unwrap();
    assert_eq!(json["type"], "sidechain");
    assert_eq!(json["from"], "a");
}
