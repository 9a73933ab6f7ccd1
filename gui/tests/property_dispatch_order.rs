//! Property 5: Dispatch order and pointer pruning.
//!
//! Within a surviving branch descendants hear an event before ancestors
//! and the topmost sibling first. Pointer events are pruned by bounds
//! containment; other events reach every visible and enabled node.

use std::sync::{Arc, Mutex};

use kons_gui::{
    Compositor, CompositorConfig, Event, EventContext, KernelHeap, MemoryDisplay, NodeBehavior,
    NodeId, NodeInfo, Rect,
};

type Journal = Arc<Mutex<Vec<NodeId>>>;

struct Record(Journal);

impl NodeBehavior for Record {
    fn handle_event(&mut self, node: &NodeInfo, _event: &Event, _ctx: &mut EventContext<'_>) {
        self.0.lock().unwrap().push(node.id);
    }
}

fn desktop() -> (Compositor, Journal) {
    let config = CompositorConfig {
        pacing_spins: 0,
        ..CompositorConfig::default()
    };
    let mut gui = Compositor::init(&mut MemoryDisplay::new(), &mut KernelHeap, config).unwrap();
    let journal: Journal = Arc::new(Mutex::new(Vec::new()));
    let root = gui.root().unwrap();
    watch(&mut gui, root, &journal);
    (gui, journal)
}

fn watch(gui: &mut Compositor, id: NodeId, journal: &Journal) {
    gui.scene_mut()
        .set_behavior(id, Box::new(Record(journal.clone())))
        .unwrap();
}

fn deliver(gui: &mut Compositor, journal: &Journal, event: Event) -> Vec<NodeId> {
    journal.lock().unwrap().clear();
    gui.post(event);
    gui.step();
    journal.lock().unwrap().clone()
}

#[test]
fn button_hears_mouse_down_before_desktop() {
    let (mut gui, journal) = desktop();
    let root = gui.root().unwrap();
    assert_eq!(
        gui.scene().node(root).unwrap().bounds(),
        Rect::new(0, 0, 1024, 768)
    );

    let button = gui.create_node(Rect::new(100, 100, 80, 30), "button");
    gui.add_to_root(button).unwrap();
    watch(&mut gui, button, &journal);

    assert_eq!(
        deliver(&mut gui, &journal, Event::mouse_down(110, 110)),
        [button, root]
    );
}

#[test]
fn pointer_outside_child_reaches_only_desktop() {
    let (mut gui, journal) = desktop();
    let root = gui.root().unwrap();
    let button = gui.create_node(Rect::new(100, 100, 80, 30), "button");
    let label = gui.create_node(Rect::new(0, 0, 50, 50), "label");
    gui.add_to_root(button).unwrap();
    // Would contain (5, 5) but sits under a pruned parent
    gui.add_child(button, label).unwrap();
    watch(&mut gui, button, &journal);
    watch(&mut gui, label, &journal);

    assert_eq!(deliver(&mut gui, &journal, Event::mouse_move(5, 5)), [root]);
}

#[test]
fn key_down_reaches_every_visible_enabled_node() {
    let (mut gui, journal) = desktop();
    let root = gui.root().unwrap();
    let a = gui.create_node(Rect::new(100, 100, 80, 30), "a");
    let b = gui.create_node(Rect::new(300, 300, 80, 30), "b");
    let a1 = gui.create_node(Rect::new(110, 105, 10, 10), "a1");
    let hidden = gui.create_node(Rect::new(500, 500, 10, 10), "hidden");
    gui.add_to_root(a).unwrap();
    gui.add_to_root(b).unwrap();
    gui.add_to_root(hidden).unwrap();
    gui.add_child(a, a1).unwrap();
    for id in [a, b, a1, hidden] {
        watch(&mut gui, id, &journal);
    }
    gui.scene_mut().set_visible(hidden, false).unwrap();

    // Pointer parked outside every child
    deliver(&mut gui, &journal, Event::mouse_move(1000, 700));

    assert_eq!(
        deliver(&mut gui, &journal, Event::key_down(0x1C)),
        [b, a1, a, root]
    );
}

#[test]
fn topmost_overlapping_sibling_first() {
    let (mut gui, journal) = desktop();
    let root = gui.root().unwrap();
    let back = gui.create_node(Rect::new(0, 0, 200, 200), "back");
    let front = gui.create_node(Rect::new(50, 50, 200, 200), "front");
    gui.add_to_root(back).unwrap();
    gui.add_to_root(front).unwrap();
    watch(&mut gui, back, &journal);
    watch(&mut gui, front, &journal);

    // No consumption: both overlapping siblings hear it
    assert_eq!(
        deliver(&mut gui, &journal, Event::mouse_up(100, 100)),
        [front, back, root]
    );
    assert_eq!(gui.mouse_pos().x, 100);
}
