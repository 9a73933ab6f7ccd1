//! Scene Graph
//!
//! Retained-mode tree of rectangular nodes stored in an arena keyed by
//! [`NodeId`]. Each node owns an ordered child list; later children paint
//! on top of earlier ones and receive events first.
//!
//! ## Traversals
//!
//! - **Render** (pre-order): skip invisible nodes, skip a whole subtree when
//!   its bounds do not intersect the clip rect, paint the node, then its
//!   children in order.
//! - **Dispatch** (children-first): skip invisible or disabled nodes, prune
//!   a subtree when a pointer event lies outside its bounds, visit children
//!   last-to-first, then the node itself. Non-pointer events are never
//!   pruned by position. Nothing consumes an event.

use alloc::boxed::Box;
use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::any::Any;
use core::fmt;

use bitflags::bitflags;
use hashbrown::HashMap;

use crate::color::Color;
use crate::compositor::EventContext;
use crate::event::Event;
use crate::framebuffer::Framebuffer;
use crate::geometry::{Point, Rect};
use crate::{GuiError, Result};

/// Longest node name kept, in bytes
pub const MAX_NAME_LEN: usize = 31;

/// Opaque data attached to a node by its installer
pub type UserData = Arc<dyn Any + Send + Sync>;

/// Unique node identifier, assigned in creation order starting at 1
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u64);

impl NodeId {
    /// Raw identifier value
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

bitflags! {
    /// Traversal gates of a node
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct NodeFlags: u8 {
        /// Painted and eligible for dispatch
        const VISIBLE = 1 << 0;
        /// Eligible for dispatch
        const ENABLED = 1 << 1;
    }
}

impl Default for NodeFlags {
    fn default() -> Self {
        NodeFlags::VISIBLE | NodeFlags::ENABLED
    }
}

/// Node paint style
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Style {
    pub background: Color,
    pub foreground: Color,
    pub border: Color,
    /// Border thickness in pixels (0 = no border)
    pub border_width: i32,
}

impl Default for Style {
    fn default() -> Self {
        Self {
            background: Color::WHITE,
            foreground: Color::BLACK,
            border: Color::BLACK,
            border_width: 1,
        }
    }
}

/// Snapshot of a node handed to its behavior
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeInfo {
    pub id: NodeId,
    pub bounds: Rect,
    pub style: Style,
}

/// Optional per-node overrides.
///
/// Every method has a default, so an implementation only provides the
/// capabilities it cares about.
pub trait NodeBehavior: Send {
    /// Custom paint. Return `false` to fall back to the default paint
    /// (background fill plus border).
    fn draw(&mut self, _node: &NodeInfo, _clip: Rect, _fb: &mut Framebuffer) -> bool {
        false
    }

    /// Called for every event that reaches this node
    fn handle_event(&mut self, _node: &NodeInfo, _event: &Event, _ctx: &mut EventContext<'_>) {}

    /// Called once, after all children are destroyed
    fn destroy(&mut self, _node: &NodeInfo) {}

    /// Data exposed for this node. `None` falls back to the data installed
    /// with [`SceneGraph::set_user_data`].
    fn user_data(&self) -> Option<UserData> {
        None
    }
}

/// A node in the scene graph
pub struct SceneNode {
    id: NodeId,
    name: String,
    bounds: Rect,
    flags: NodeFlags,
    style: Style,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    behavior: Option<Box<dyn NodeBehavior>>,
    user_data: Option<UserData>,
}

impl SceneNode {
    fn new(id: NodeId, bounds: Rect, name: &str) -> Self {
        Self {
            id,
            name: truncate_name(name),
            bounds,
            flags: NodeFlags::default(),
            style: Style::default(),
            parent: None,
            children: Vec::new(),
            behavior: None,
            user_data: None,
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Bounds in absolute screen coordinates
    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    pub fn style(&self) -> Style {
        self.style
    }

    pub fn flags(&self) -> NodeFlags {
        self.flags
    }

    pub fn is_visible(&self) -> bool {
        self.flags.contains(NodeFlags::VISIBLE)
    }

    pub fn is_enabled(&self) -> bool {
        self.flags.contains(NodeFlags::ENABLED)
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Children in paint order
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn has_behavior(&self) -> bool {
        self.behavior.is_some()
    }

    pub fn info(&self) -> NodeInfo {
        NodeInfo {
            id: self.id,
            bounds: self.bounds,
            style: self.style,
        }
    }

    fn accepts_dispatch(&self) -> bool {
        self.flags.contains(NodeFlags::VISIBLE | NodeFlags::ENABLED)
    }
}

fn truncate_name(name: &str) -> String {
    let mut end = name.len().min(MAX_NAME_LEN);
    while !name.is_char_boundary(end) {
        end -= 1;
    }
    String::from(&name[..end])
}

/// Default paint: background fill, then `border_width` one-pixel rings
/// each stroked as four rectangles.
fn paint_default(info: &NodeInfo, clip: Rect, fb: &mut Framebuffer) {
    let style = &info.style;
    fb.fill_rect_clipped(info.bounds, clip, style.background);

    for ring in 0..style.border_width.max(0) {
        let r = info.bounds.inset(ring);
        if r.is_empty() {
            break;
        }
        fb.fill_rect_clipped(Rect::new(r.x, r.y, r.width, 1), clip, style.border);
        fb.fill_rect_clipped(Rect::new(r.x, r.bottom() - 1, r.width, 1), clip, style.border);
        fb.fill_rect_clipped(Rect::new(r.x, r.y, 1, r.height), clip, style.border);
        fb.fill_rect_clipped(Rect::new(r.right() - 1, r.y, 1, r.height), clip, style.border);
    }
}

/// Arena of scene nodes
pub struct SceneGraph {
    nodes: HashMap<NodeId, SceneNode>,
    next_id: u64,
}

impl SceneGraph {
    pub fn new() -> Self {
        Self {
            nodes: HashMap::new(),
            next_id: 1,
        }
    }

    /// Create a detached node with default style and no behavior.
    ///
    /// Names longer than `MAX_NAME_LEN` bytes are truncated.
    pub fn create_node(&mut self, bounds: Rect, name: &str) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        self.nodes.insert(id, SceneNode::new(id, bounds, name));
        log::trace!("[GUI] Created node {} '{}' at {:?}", id, name, bounds);
        id
    }

    /// Append `child` to `parent`'s child list.
    ///
    /// No cycle or double-parent check is made.
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        if !self.nodes.contains_key(&child) {
            return Err(GuiError::UnknownNode(child));
        }
        let parent_node = self
            .nodes
            .get_mut(&parent)
            .ok_or(GuiError::UnknownNode(parent))?;
        parent_node.children.push(child);

        if let Some(child_node) = self.nodes.get_mut(&child) {
            child_node.parent = Some(parent);
        }
        Ok(())
    }

    /// Destroy a node and its whole subtree.
    ///
    /// The node is first detached from its parent. Children are destroyed
    /// depth-first before their parent's `destroy` hook runs. Returns the
    /// freed ids in destruction order.
    pub(crate) fn destroy(&mut self, id: NodeId) -> Result<Vec<NodeId>> {
        let parent = self
            .nodes
            .get(&id)
            .ok_or(GuiError::UnknownNode(id))?
            .parent;

        if let Some(parent) = parent.and_then(|p| self.nodes.get_mut(&p)) {
            parent.children.retain(|&c| c != id);
        }

        let mut freed = Vec::new();
        self.destroy_subtree(id, &mut freed);
        log::debug!("[GUI] Destroyed node {} ({} nodes freed)", id, freed.len());
        Ok(freed)
    }

    fn destroy_subtree(&mut self, id: NodeId, freed: &mut Vec<NodeId>) {
        // Removed up front so a malformed tree cannot recurse forever
        let Some(mut node) = self.nodes.remove(&id) else {
            return;
        };

        for &child in &node.children {
            self.destroy_subtree(child, freed);
        }

        let info = node.info();
        if let Some(behavior) = node.behavior.as_mut() {
            behavior.destroy(&info);
        }
        freed.push(id);
    }

    /// Paint the subtree rooted at `id`, restricted to `clip`
    pub fn render(&mut self, id: NodeId, clip: Rect, fb: &mut Framebuffer) {
        let Some(node) = self.nodes.get_mut(&id) else {
            return;
        };
        if !node.is_visible() || !node.bounds.intersects(&clip) {
            return;
        }

        let info = node.info();
        let drawn = match node.behavior.as_mut() {
            Some(behavior) => behavior.draw(&info, clip, fb),
            None => false,
        };
        if !drawn {
            paint_default(&info, clip, fb);
        }

        let mut index = 0;
        while let Some(child) = self.child_at(id, index) {
            self.render(child, clip, fb);
            index += 1;
        }
    }

    /// Deliver `event` to the subtree rooted at `id`
    pub fn dispatch(&mut self, id: NodeId, event: &Event, ctx: &mut EventContext<'_>) {
        let Some(node) = self.nodes.get(&id) else {
            return;
        };
        if !node.accepts_dispatch() {
            return;
        }
        if let Some(pos) = event.pointer_position() {
            if !node.bounds.contains(pos) {
                return;
            }
        }

        // Topmost child first
        for index in (0..node.children.len()).rev() {
            if let Some(child) = self.child_at(id, index) {
                self.dispatch(child, event, ctx);
            }
        }

        if let Some(node) = self.nodes.get_mut(&id) {
            let info = node.info();
            if let Some(behavior) = node.behavior.as_mut() {
                behavior.handle_event(&info, event, ctx);
            }
        }
    }

    /// Deepest, topmost visible and enabled node containing `point`
    pub fn hit_test(&self, id: NodeId, point: Point) -> Option<NodeId> {
        let node = self.nodes.get(&id)?;
        if !node.accepts_dispatch() || !node.bounds.contains(point) {
            return None;
        }
        node.children
            .iter()
            .rev()
            .find_map(|&child| self.hit_test(child, point))
            .or(Some(id))
    }

    fn child_at(&self, id: NodeId, index: usize) -> Option<NodeId> {
        self.nodes.get(&id)?.children.get(index).copied()
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut SceneNode> {
        self.nodes.get_mut(&id).ok_or(GuiError::UnknownNode(id))
    }

    pub fn node(&self, id: NodeId) -> Option<&SceneNode> {
        self.nodes.get(&id)
    }

    pub fn set_bounds(&mut self, id: NodeId, bounds: Rect) -> Result<()> {
        self.node_mut(id)?.bounds = bounds;
        Ok(())
    }

    pub fn set_style(&mut self, id: NodeId, style: Style) -> Result<()> {
        self.node_mut(id)?.style = style;
        Ok(())
    }

    pub fn set_visible(&mut self, id: NodeId, visible: bool) -> Result<()> {
        self.node_mut(id)?.flags.set(NodeFlags::VISIBLE, visible);
        Ok(())
    }

    pub fn set_enabled(&mut self, id: NodeId, enabled: bool) -> Result<()> {
        self.node_mut(id)?.flags.set(NodeFlags::ENABLED, enabled);
        Ok(())
    }

    /// Install behavior overrides, replacing any previous ones
    pub fn set_behavior(&mut self, id: NodeId, behavior: Box<dyn NodeBehavior>) -> Result<()> {
        self.node_mut(id)?.behavior = Some(behavior);
        Ok(())
    }

    /// Attach opaque data. The node only holds a reference; the installer
    /// keeps its own.
    pub fn set_user_data(&mut self, id: NodeId, data: Option<UserData>) -> Result<()> {
        self.node_mut(id)?.user_data = data;
        Ok(())
    }

    /// Behavior-provided data, else the installed data
    pub fn user_data(&self, id: NodeId) -> Option<UserData> {
        let node = self.nodes.get(&id)?;
        node.behavior
            .as_ref()
            .and_then(|b| b.user_data())
            .or_else(|| node.user_data.clone())
    }

    pub fn children(&self, id: NodeId) -> Option<&[NodeId]> {
        self.nodes.get(&id).map(|n| n.children())
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(&id)?.parent
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Number of live nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

impl Default for SceneGraph {
    fn default() -> Self {
        Self::new()
    }
}
