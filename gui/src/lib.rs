//! KonsKernel GUI Core
//!
//! Windowing and compositor core for the KonsKernel: a retained-mode scene
//! graph rendered onto a linear 32-bit framebuffer with double buffering,
//! dirty-rectangle repaint scheduling and a bounded event bridge from input
//! interrupt handlers to the cooperative main loop.
//!
//! # Architecture
//!
//! - `framebuffer`: front/back surfaces, drawing primitives, swap
//! - `scene`: node arena, render and dispatch traversals
//! - `queue`: event ring shared with IRQ handlers, local loop queue
//! - `damage`: bounded dirty-rectangle list
//! - `compositor`: main loop tying the above together
//! - `input`: PS/2 mouse and keyboard shaping
//! - `vbe`: Bochs/QEMU DISPI mode-set driver (feature `vbe`)

#![cfg_attr(not(test), no_std)]

extern crate alloc;

pub mod color;
pub mod compositor;
pub mod cursor;
pub mod damage;
pub mod event;
pub mod framebuffer;
pub mod geometry;
pub mod input;
pub mod queue;
pub mod scene;
#[cfg(all(feature = "vbe", target_arch = "x86_64"))]
pub mod vbe;

use core::fmt;

pub use color::Color;
pub use compositor::{Compositor, CompositorConfig, EventContext, FrameReport, FrameStats};
pub use damage::{DirtyList, Invalidation, MAX_DIRTY_RECTS};
pub use event::{Event, EventKind, EVENT_USER_BASE};
pub use framebuffer::{
    DisplayDriver, Framebuffer, FramebufferError, KernelHeap, LinearSurface, MemoryDisplay,
    SurfaceAllocator,
};
pub use geometry::{Point, Rect, Size};
pub use queue::{EventQueue, EventSender, LocalQueue, EVENT_QUEUE_SLOTS};
pub use scene::{NodeBehavior, NodeFlags, NodeId, NodeInfo, SceneGraph, Style};

/// GUI error type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuiError {
    /// Display or back-surface setup failed
    Framebuffer(FramebufferError),
    /// The desktop root has been destroyed
    NoRoot,
    /// No live node with this id
    UnknownNode(NodeId),
}

impl fmt::Display for GuiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GuiError::Framebuffer(e) => write!(f, "framebuffer error: {}", e),
            GuiError::NoRoot => write!(f, "no desktop root"),
            GuiError::UnknownNode(id) => write!(f, "unknown node {}", id),
        }
    }
}

impl From<FramebufferError> for GuiError {
    fn from(e: FramebufferError) -> Self {
        GuiError::Framebuffer(e)
    }
}

/// Result type for GUI operations
pub type Result<T> = core::result::Result<T, GuiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;

    #[test]
    fn test_error_display() {
        let e: GuiError = FramebufferError::UnsupportedDepth(16).into();
        assert_eq!(e.to_string(), "framebuffer error: unsupported pixel depth: 16 bpp");
        assert_eq!(GuiError::NoRoot.to_string(), "no desktop root");
    }
}
