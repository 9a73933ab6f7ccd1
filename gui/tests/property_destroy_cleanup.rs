//! Property 4: Destroy cleanup completeness.
//!
//! Destroying a node with N descendants frees exactly N + 1 nodes, and any
//! focus or hover reference into the freed subtree is cleared.

use kons_gui::{
    Compositor, CompositorConfig, Event, KernelHeap, MemoryDisplay, NodeId, Rect, SceneGraph,
};
use proptest::prelude::*;

fn compositor() -> Compositor {
    let config = CompositorConfig {
        width: 320,
        height: 240,
        pacing_spins: 0,
        ..CompositorConfig::default()
    };
    Compositor::init(&mut MemoryDisplay::new(), &mut KernelHeap, config).unwrap()
}

/// Build a tree from a parent-choice list: node i + 1 attaches under
/// `nodes[choice % (i + 1)]`.
fn build_tree(graph: &mut SceneGraph, root: NodeId, shape: &[usize]) -> Vec<NodeId> {
    let mut nodes = vec![root];
    for (i, &choice) in shape.iter().enumerate() {
        let id = graph.create_node(Rect::new(0, 0, 10, 10), "node");
        graph.add_child(nodes[choice % (i + 1)], id).unwrap();
        nodes.push(id);
    }
    nodes
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn destroy_frees_subtree_count(shape in proptest::collection::vec(any::<usize>(), 0..60)) {
        let mut gui = compositor();
        let desktop = gui.root().unwrap();
        let top = gui.create_node(Rect::new(0, 0, 100, 100), "top");
        gui.add_to_root(top).unwrap();
        build_tree(gui.scene_mut(), top, &shape);

        prop_assert_eq!(gui.destroy_node(top).unwrap(), shape.len() + 1);
        prop_assert_eq!(gui.scene().len(), 1);
        prop_assert_eq!(gui.scene().children(desktop), Some(&[][..]));
    }
}

#[test]
fn destroying_root_clears_focus_and_hover() {
    let mut gui = compositor();
    let root = gui.root().unwrap();
    let nodes = build_tree(gui.scene_mut(), root, &[0, 0, 1, 2, 2, 3]);

    gui.post(Event::mouse_down(5, 5));
    gui.post(Event::mouse_move(6, 6));
    gui.step();
    assert!(gui.focused().is_some());
    assert!(gui.hover().is_some());

    assert_eq!(gui.destroy_node(root).unwrap(), nodes.len());
    assert_eq!(gui.focused(), None);
    assert_eq!(gui.hover(), None);
    assert_eq!(gui.root(), None);
    assert!(gui.scene().is_empty());
}

#[test]
fn destroying_unrelated_subtree_keeps_focus() {
    let mut gui = compositor();
    let left = gui.create_node(Rect::new(0, 0, 100, 100), "left");
    let right = gui.create_node(Rect::new(200, 0, 100, 100), "right");
    let child = gui.create_node(Rect::new(210, 10, 10, 10), "child");
    gui.add_to_root(left).unwrap();
    gui.add_to_root(right).unwrap();
    gui.add_child(right, child).unwrap();

    gui.post(Event::mouse_down(50, 50));
    gui.step();
    assert_eq!(gui.focused(), Some(left));

    assert_eq!(gui.destroy_node(right).unwrap(), 2);
    assert_eq!(gui.focused(), Some(left));
    assert_eq!(gui.scene().children(gui.root().unwrap()), Some(&[left][..]));
}
