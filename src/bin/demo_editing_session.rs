// Walkthrough of two editors sharing one document
// Run with: cargo run --bin demo_editing_session
//
// Set RUST_LOG=debug to see the store logs.

use cardplay_store::command::{AddEventsCommand, CommandDescriptor, DocumentState, MoveEventsCommand};
use cardplay_store::event::{Event, StreamOptions};
use cardplay_store::routing::{ConnectionType, RoutingNode};
use cardplay_store::{EditorContext, EventId, StoreConfig};
use std::cell::Cell;
use std::rc::Rc;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    println!("🎵 CardPlay - Shared Editing Session Demo");
    println!("=========================================");

    let config = match StoreConfig::default_path() {
        Some(path) => StoreConfig::load_or_default(&path)?,
        None => StoreConfig::default(),
    };
    println!("⚙️  Undo capacity: {}", config.undo_capacity);

    let mut ctx = EditorContext::new(config);
    let lead = ctx
        .events_mut()
        .create_stream(StreamOptions::new("Lead").with_id("lead"))?;
    println!("\n📝 Created stream '{}' ({})", lead.name, lead.id);

    // Two views observing the same stream
    let piano_roll_updates = Rc::new(Cell::new(0));
    let arranger_updates = Rc::new(Cell::new(0));
    {
        let counter = piano_roll_updates.clone();
        ctx.events_mut().subscribe("lead", move |change| {
            counter.set(counter.get() + 1);
            let count = change.stream.as_ref().map_or(0, |s| s.len());
            println!("   🎹 piano roll sees {:?}: {} event(s)", change.kind, count);
        });
    }
    {
        let counter = arranger_updates.clone();
        ctx.events_mut().subscribe("lead", move |change| {
            counter.set(counter.get() + 1);
            let end = change.stream.as_ref().map_or(0, |s| s.end_tick());
            println!("   🗂️  arranger sees {:?}: ends at tick {}", change.kind, end);
        });
    }
    ctx.selection_mut().subscribe("lead", |change| {
        println!("   ✨ selection now {} event(s)", change.selection.len());
    });

    println!("\n➕ Adding notes");
    ctx.execute(Box::new(AddEventsCommand::new(
        "lead",
        vec![
            Event::note("n1", 0, 96, 60, 100),
            Event::note("n2", 96, 96, 64, 90),
            Event::note("n3", 192, 192, 67, 110),
        ],
    )))?;

    ctx.selection_mut()
        .select("lead", [EventId::from("n1"), EventId::from("n2")]);

    println!("\n↔️  Moving selection one beat later and up a fifth");
    let selected = ctx.selection().get_selection("lead").ids();
    ctx.execute(Box::new(MoveEventsCommand::new("lead", selected, 96, 7)))?;

    println!("\n🔌 Routing");
    ctx.routing_mut().add_node(RoutingNode::new("lead-deck", "Lead").with_position(0.0, 0.0));
    ctx.routing_mut().add_node(RoutingNode::new("reverb", "Reverb").with_position(200.0, 0.0));
    let edge = ctx.connect_with_undo("lead-deck", "out", "reverb", "in", ConnectionType::Audio)?;
    println!("   {} -> {} as {}", edge.from, edge.to, edge.id);

    // A one-off edit described with closures
    let marker_id = ctx.execute_with_undo(CommandDescriptor {
        command_type: "add-marker".to_string(),
        description: "Add verse marker".to_string(),
        execute: |state: &mut DocumentState| {
            let marker = Event::marker(EventId::generate(), 0, "Verse");
            let id = marker.id.clone();
            state.events.add_events("lead", vec![marker]);
            id
        },
        undo: |state: &mut DocumentState, id: &EventId| {
            state.events.remove_events("lead", std::slice::from_ref(id));
        },
        redo: |state: &mut DocumentState, id: &EventId| {
            state
                .events
                .add_events("lead", vec![Event::marker(id.clone(), 0, "Verse")]);
        },
    });
    println!("\n🏷️  Added marker {}", marker_id);

    println!("\n📜 History:");
    for info in ctx.undo_stack() {
        println!("   - [{}] {}", info.command_type, info.description);
    }

    println!("\n↩️  Undo x3");
    for _ in 0..3 {
        if let Some(info) = ctx.undo_last_command()? {
            println!("   undid: {}", info.description);
        }
    }
    println!("   edges left: {}", ctx.routing().get_state().edges.len());

    println!("\n↪️  Redo x1");
    if let Some(info) = ctx.redo_last_command()? {
        println!("   redid: {}", info.description);
    }

    if let Some(stream) = ctx.events().get_stream("lead") {
        println!("\n🎼 Final '{}' contents:", stream.name);
        for event in stream.events() {
            println!(
                "   {:>4} +{:<4} {:?}",
                event.start, event.duration, event.payload
            );
        }
    }

    println!(
        "\n🔔 Piano roll got {} updates, arranger got {}",
        piano_roll_updates.get(),
        arranger_updates.get()
    );
    println!("🕘 Recent commands: {:?}", ctx.recent_commands());
    println!("\n🎉 Demo completed successfully!");

    Ok(())
}
