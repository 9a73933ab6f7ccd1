//! GUI Compositor and Main Loop
//!
//! Owns the framebuffer, the scene graph, the event queue and the dirty
//! list. Each iteration of the main loop:
//!
//! 1. Drains the event queues, dispatching every event from the root
//! 2. Repaints each pending dirty rectangle by walking the whole tree from
//!    the root, clipped to that rectangle
//! 3. Draws the software cursor (if enabled) and swaps buffers
//! 4. Spins for a fixed number of iterations to pace the frame
//!
//! The loop runs until `running` is cleared, either by [`Compositor::stop`]
//! or by a handler calling [`EventContext::quit`].
//!
//! Interrupt handlers post into the shared ring through an [`EventSender`].
//! Events the loop produces itself ([`Compositor::post`] and handler
//! follow-ups) go into a local queue and never contend with IRQ producers.

use alloc::sync::Arc;

use crate::color::Color;
use crate::cursor::cursor_rect;
use crate::damage::{DirtyList, Invalidation};
use crate::event::{Event, EventKind};
use crate::framebuffer::{DisplayDriver, Framebuffer, SurfaceAllocator};
use crate::geometry::{Point, Rect};
use crate::queue::{EventQueue, EventSender, LocalQueue};
use crate::scene::{NodeId, SceneGraph, Style};
use crate::{GuiError, Result};

/// Compositor configuration
#[derive(Debug, Clone)]
pub struct CompositorConfig {
    /// Screen width
    pub width: u32,
    /// Screen height
    pub height: u32,
    /// Bits per pixel (only 32 is supported)
    pub bpp: u32,
    /// Try to allocate a back surface
    pub double_buffer: bool,
    /// Background of the root node
    pub desktop_color: Color,
    /// Busy-wait iterations between frames
    pub pacing_spins: u32,
    /// Draw the software cursor at the pointer position
    pub cursor_enabled: bool,
}

impl Default for CompositorConfig {
    fn default() -> Self {
        Self {
            width: 1024,
            height: 768,
            bpp: 32,
            double_buffer: true,
            desktop_color: Color::with_alpha(40, 40, 40, 255),
            pacing_spins: 1_000_000,
            cursor_enabled: false,
        }
    }
}

/// What one loop iteration did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameReport {
    /// Events dispatched
    pub events: usize,
    /// Dirty rectangles repainted
    pub rects: usize,
    /// Whether the back surface was copied to the screen
    pub swapped: bool,
}

/// Running totals
#[derive(Debug, Clone, Default)]
pub struct FrameStats {
    pub frames: u64,
    pub swaps: u64,
    pub events_dispatched: u64,
    pub rects_repainted: u64,
}

/// Services available to event handlers
pub struct EventContext<'a> {
    dirty: &'a mut DirtyList,
    pending: &'a mut LocalQueue,
    running: &'a mut bool,
    focus_request: Option<NodeId>,
}

impl<'a> EventContext<'a> {
    pub fn new(
        dirty: &'a mut DirtyList,
        pending: &'a mut LocalQueue,
        running: &'a mut bool,
    ) -> Self {
        Self {
            dirty,
            pending,
            running,
            focus_request: None,
        }
    }

    /// Schedule a region for repaint
    pub fn invalidate(&mut self, rect: Rect) -> Invalidation {
        self.dirty.invalidate(rect)
    }

    /// Queue a follow-up event; it is dispatched in the same drain pass
    pub fn post(&mut self, event: Event) -> bool {
        self.pending.post(event)
    }

    /// Ask for keyboard focus to move to `id` once dispatch finishes
    pub fn request_focus(&mut self, id: NodeId) {
        self.focus_request = Some(id);
    }

    /// Stop the main loop after the current iteration
    pub fn quit(&mut self) {
        *self.running = false;
    }

    pub fn focus_request(&self) -> Option<NodeId> {
        self.focus_request
    }
}

/// The GUI context: framebuffer, scene graph and loop state
pub struct Compositor {
    config: CompositorConfig,
    fb: Framebuffer,
    scene: SceneGraph,
    root: Option<NodeId>,
    focused: Option<NodeId>,
    hover: Option<NodeId>,
    mouse_pos: Point,
    running: bool,
    queue: Arc<EventQueue>,
    pending: LocalQueue,
    dirty: DirtyList,
    cursor_enabled: bool,
    stats: FrameStats,
}

impl Compositor {
    /// Bring up the display and build the desktop root.
    ///
    /// A failed back-surface allocation is logged and the compositor
    /// continues single-buffered. The loop starts idle; call [`run`] or
    /// [`step`] to drive it.
    ///
    /// [`run`]: Compositor::run
    /// [`step`]: Compositor::step
    pub fn init(
        driver: &mut dyn DisplayDriver,
        allocator: &mut dyn SurfaceAllocator,
        config: CompositorConfig,
    ) -> Result<Self> {
        let mut fb = Framebuffer::init(driver, config.width, config.height, config.bpp)?;

        if config.double_buffer {
            if let Err(e) = fb.enable_double_buffer(allocator) {
                log::warn!("[GUI] Continuing without double buffering: {}", e);
            }
        }

        let mut scene = SceneGraph::new();
        let root = scene.create_node(fb.bounds(), "Desktop");
        scene.set_style(
            root,
            Style {
                background: config.desktop_color,
                ..Style::default()
            },
        )?;

        let mouse_pos = Point::new(fb.width() as i32 / 2, fb.height() as i32 / 2);

        log::info!(
            "[GUI] Initialized {}x{} ({})",
            fb.width(),
            fb.height(),
            if fb.is_double_buffered() {
                "double-buffered"
            } else {
                "single-buffered"
            }
        );

        Ok(Self {
            cursor_enabled: config.cursor_enabled,
            config,
            fb,
            scene,
            root: Some(root),
            focused: None,
            hover: None,
            mouse_pos,
            running: false,
            queue: Arc::new(EventQueue::new()),
            pending: LocalQueue::new(),
            dirty: DirtyList::new(),
            stats: FrameStats::default(),
        })
    }

    // =========================================================================
    // Events
    // =========================================================================

    /// Producer handle for interrupt handlers
    pub fn event_sender(&self) -> EventSender {
        EventSender::new(self.queue.clone())
    }

    /// Queue an event from the loop's own context; `false` means it was
    /// dropped. Interrupt handlers use [`event_sender`](Self::event_sender).
    pub fn post(&mut self, event: Event) -> bool {
        self.pending.post(event)
    }

    /// Pop and dispatch events until both queues are empty, including
    /// events posted by handlers during this pass. Local events go first so
    /// a follow-up is handled right after its cause. Returns the number
    /// dispatched.
    pub fn drain_and_dispatch(&mut self) -> usize {
        let mut count = 0;
        while let Some(event) = self.pending.pop().or_else(|| self.queue.pop()) {
            self.dispatch_event(&event);
            count += 1;
        }
        count
    }

    fn dispatch_event(&mut self, event: &Event) {
        if let Some(pos) = event.pointer_position() {
            self.track_pointer(&event.kind, pos);
        }

        let Some(root) = self.root else {
            return;
        };

        let mut ctx = EventContext::new(&mut self.dirty, &mut self.pending, &mut self.running);
        self.scene.dispatch(root, event, &mut ctx);

        if let Some(id) = ctx.focus_request() {
            if self.scene.contains(id) {
                self.focused = Some(id);
            }
        }
    }

    fn track_pointer(&mut self, kind: &EventKind, pos: Point) {
        let previous = self.mouse_pos;
        self.mouse_pos = pos;

        let hit = self.root.and_then(|root| self.scene.hit_test(root, pos));
        match kind {
            EventKind::MouseMove { .. } => self.hover = hit,
            EventKind::MouseDown { .. } => self.focused = hit,
            _ => {}
        }

        if self.cursor_enabled && previous != pos {
            self.dirty.invalidate(cursor_rect(previous.x, previous.y));
            self.dirty.invalidate(cursor_rect(pos.x, pos.y));
        }
    }

    // =========================================================================
    // Main loop
    // =========================================================================

    /// Run one loop iteration without pacing
    pub fn step(&mut self) -> FrameReport {
        let mut report = FrameReport {
            events: self.drain_and_dispatch(),
            ..FrameReport::default()
        };

        if !self.dirty.is_empty() {
            if let Some(root) = self.root {
                for &rect in self.dirty.rects() {
                    self.scene.render(root, rect, &mut self.fb);
                }
            }
            report.rects = self.dirty.len();
            self.dirty.clear();

            if self.cursor_enabled {
                self.fb.draw_cursor(self.mouse_pos.x, self.mouse_pos.y);
            }

            report.swapped = self.fb.is_double_buffered();
            self.fb.swap_buffers();
        }

        self.stats.frames += 1;
        self.stats.events_dispatched += report.events as u64;
        self.stats.rects_repainted += report.rects as u64;
        if report.swapped {
            self.stats.swaps += 1;
        }
        report
    }

    /// Fixed busy-wait between frames
    pub fn pace(&self) {
        for _ in 0..self.config.pacing_spins {
            core::hint::spin_loop();
        }
    }

    /// Loop until stopped
    pub fn run(&mut self) {
        self.running = true;
        log::info!("[GUI] Main loop started");

        while self.running {
            self.step();
            self.pace();
        }

        log::info!("[GUI] Main loop stopped after {} frames", self.stats.frames);
    }

    pub fn stop(&mut self) {
        self.running = false;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Destroy the whole tree and reset loop state.
    ///
    /// The back surface stays allocated until the compositor is dropped.
    pub fn shutdown(&mut self) {
        if let Some(root) = self.root.take() {
            match self.scene.destroy(root) {
                Ok(freed) => log::info!("[GUI] Shutdown: {} nodes destroyed", freed.len()),
                Err(e) => log::warn!("[GUI] Shutdown: {}", e),
            }
        }
        self.focused = None;
        self.hover = None;
        self.running = false;
        self.dirty.clear();
        self.pending.clear();
        while self.queue.pop().is_some() {}
    }

    // =========================================================================
    // Damage
    // =========================================================================

    /// Schedule a region for repaint
    pub fn invalidate(&mut self, rect: Rect) -> Invalidation {
        self.dirty.invalidate(rect)
    }

    /// Schedule a full-screen repaint
    pub fn render_all(&mut self) -> Invalidation {
        self.dirty.invalidate(self.fb.bounds())
    }

    pub fn dirty(&self) -> &DirtyList {
        &self.dirty
    }

    // =========================================================================
    // Tree
    // =========================================================================

    pub fn create_node(&mut self, bounds: Rect, name: &str) -> NodeId {
        self.scene.create_node(bounds, name)
    }

    pub fn add_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        self.scene.add_child(parent, child)
    }

    /// Attach a node directly under the desktop
    pub fn add_to_root(&mut self, child: NodeId) -> Result<()> {
        let root = self.root.ok_or(GuiError::NoRoot)?;
        self.scene.add_child(root, child)
    }

    /// Destroy a subtree, clearing focus/hover if they pointed into it.
    /// Returns the number of nodes freed.
    pub fn destroy_node(&mut self, id: NodeId) -> Result<usize> {
        let freed = self.scene.destroy(id)?;

        if self.focused.is_some_and(|f| freed.contains(&f)) {
            self.focused = None;
        }
        if self.hover.is_some_and(|h| freed.contains(&h)) {
            self.hover = None;
        }
        if self.root.is_some_and(|r| freed.contains(&r)) {
            self.root = None;
        }
        Ok(freed.len())
    }

    pub fn set_focus(&mut self, id: Option<NodeId>) {
        self.focused = id.filter(|&id| self.scene.contains(id));
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    pub fn focused(&self) -> Option<NodeId> {
        self.focused.filter(|&id| self.scene.contains(id))
    }

    pub fn hover(&self) -> Option<NodeId> {
        self.hover.filter(|&id| self.scene.contains(id))
    }

    /// Last known pointer position
    pub fn mouse_pos(&self) -> Point {
        self.mouse_pos
    }

    pub fn scene(&self) -> &SceneGraph {
        &self.scene
    }

    /// Mutable access for building and styling the tree. Nodes are
    /// destroyed through [`destroy_node`](Self::destroy_node), which keeps
    /// focus and hover valid:
    ///
    /// ```compile_fail
    /// # use kons_gui::{Compositor, CompositorConfig, KernelHeap, MemoryDisplay, Rect};
    /// let mut gui =
    ///     Compositor::init(&mut MemoryDisplay::new(), &mut KernelHeap, CompositorConfig::default())
    ///         .unwrap();
    /// let id = gui.create_node(Rect::new(0, 0, 10, 10), "a");
    /// gui.scene_mut().destroy(id);
    /// ```
    pub fn scene_mut(&mut self) -> &mut SceneGraph {
        &mut self.scene
    }

    // =========================================================================
    // Output
    // =========================================================================

    pub fn framebuffer(&self) -> &Framebuffer {
        &self.fb
    }

    pub fn framebuffer_mut(&mut self) -> &mut Framebuffer {
        &mut self.fb
    }

    pub fn set_cursor_enabled(&mut self, enabled: bool) {
        if self.cursor_enabled != enabled {
            self.cursor_enabled = enabled;
            self.dirty
                .invalidate(cursor_rect(self.mouse_pos.x, self.mouse_pos.y));
        }
    }

    pub fn cursor_enabled(&self) -> bool {
        self.cursor_enabled
    }

    pub fn stats(&self) -> &FrameStats {
        &self.stats
    }

    pub fn config(&self) -> &CompositorConfig {
        &self.config
    }
}
