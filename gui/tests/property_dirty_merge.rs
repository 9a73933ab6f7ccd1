//! Property 2: Containment merge in the dirty list.
//!
//! Invalidating R1 and then an R2 that fully contains R1 leaves exactly one
//! entry, equal to R2. Once the list is full further invalidations are
//! dropped and the region they cover stays stale on screen.

use kons_gui::{
    Color, Compositor, CompositorConfig, DirtyList, Invalidation, KernelHeap, MemoryDisplay,
    Rect, Style, MAX_DIRTY_RECTS,
};
use proptest::prelude::*;

// ── Strategies ───────────────────────────────────────────────────────

fn arb_rect() -> impl Strategy<Value = Rect> {
    (-500i32..500, -500i32..500, 0i32..400, 0i32..400)
        .prop_map(|(x, y, w, h)| Rect::new(x, y, w, h))
}

/// R1 plus a rectangle grown around it by arbitrary margins.
fn arb_nested() -> impl Strategy<Value = (Rect, Rect)> {
    (arb_rect(), 0i32..50, 0i32..50, 0i32..50, 0i32..50).prop_map(|(r1, l, t, r, b)| {
        let r2 = Rect::new(r1.x - l, r1.y - t, r1.width + l + r, r1.height + t + b);
        (r1, r2)
    })
}

// ── Property tests ───────────────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(300))]

    #[test]
    fn containing_rect_replaces_contained((r1, r2) in arb_nested()) {
        let mut dirty = DirtyList::new();
        dirty.invalidate(r1);
        dirty.invalidate(r2);
        prop_assert_eq!(dirty.rects(), &[r2][..]);
    }

    #[test]
    fn list_never_exceeds_capacity(rects in proptest::collection::vec(arb_rect(), 0..200)) {
        let mut dirty = DirtyList::new();
        for r in rects {
            dirty.invalidate(r);
        }
        prop_assert!(dirty.len() <= MAX_DIRTY_RECTS);
    }
}

// ── Overflow scenario ────────────────────────────────────────────────

/// A full dirty list drops the next invalidation, so the node painted
/// inside that region never reaches the screen.
#[test]
fn overflow_leaves_region_stale() {
    let config = CompositorConfig {
        width: 200,
        height: 100,
        pacing_spins: 0,
        ..CompositorConfig::default()
    };
    let mut gui = Compositor::init(&mut MemoryDisplay::new(), &mut KernelHeap, config).unwrap();

    // Fill the list with one-pixel rects along the top row
    for i in 0..MAX_DIRTY_RECTS as i32 {
        assert_ne!(gui.invalidate(Rect::new(i, 0, 1, 1)), Invalidation::Dropped);
    }

    let button = gui.create_node(Rect::new(100, 50, 20, 20), "button");
    gui.add_to_root(button).unwrap();
    gui.scene_mut()
        .set_style(
            button,
            Style {
                background: Color::RED,
                ..Style::default()
            },
        )
        .unwrap();

    assert_eq!(gui.invalidate(Rect::new(100, 50, 20, 20)), Invalidation::Dropped);
    gui.step();

    let fb = gui.framebuffer();
    assert_eq!(fb.pixel(110, 60), Some(Color::BLACK), "region should be stale");
    assert_eq!(fb.pixel(5, 0), Some(Color::BLACK), "desktop border repainted");

    // A later invalidation covering the region repairs it
    gui.invalidate(Rect::new(90, 40, 40, 40));
    gui.step();
    assert_eq!(gui.framebuffer().pixel(110, 60), Some(Color::RED));
}
