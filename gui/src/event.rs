//! GUI Event Types
//!
//! Fully shaped events as produced by the input drivers. The core never
//! sees raw scancodes or pointer deltas; pointer events carry absolute
//! screen positions.

use crate::geometry::Point;

/// First numeric code reserved for user-defined events
pub const EVENT_USER_BASE: u32 = 1000;

/// Event kind with its payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EventKind {
    #[default]
    None,
    /// Pointer moved to an absolute position
    MouseMove { x: i32, y: i32 },
    /// Button pressed at an absolute position
    MouseDown { x: i32, y: i32 },
    /// Button released at an absolute position
    MouseUp { x: i32, y: i32 },
    KeyDown { keycode: u8 },
    KeyUp { keycode: u8 },
    WindowClose,
    WindowResize { width: i32, height: i32 },
    WindowFocus,
    Timer,
    /// Repaint request
    Paint,
    /// Application-defined event; `code >= EVENT_USER_BASE`
    User { code: u32, data: u32 },
}

impl EventKind {
    /// Numeric kind, stable across builds
    pub fn code(&self) -> u32 {
        match self {
            EventKind::None => 0,
            EventKind::MouseMove { .. } => 1,
            EventKind::MouseDown { .. } => 2,
            EventKind::MouseUp { .. } => 3,
            EventKind::KeyDown { .. } => 4,
            EventKind::KeyUp { .. } => 5,
            EventKind::WindowClose => 6,
            EventKind::WindowResize { .. } => 7,
            EventKind::WindowFocus => 8,
            EventKind::Timer => 9,
            EventKind::Paint => 10,
            EventKind::User { code, .. } => *code,
        }
    }

    /// Mouse move/down/up
    #[inline]
    pub fn is_pointer(&self) -> bool {
        self.pointer_position().is_some()
    }

    /// Absolute pointer position carried by pointer events
    pub fn pointer_position(&self) -> Option<Point> {
        match *self {
            EventKind::MouseMove { x, y }
            | EventKind::MouseDown { x, y }
            | EventKind::MouseUp { x, y } => Some(Point::new(x, y)),
            _ => None,
        }
    }
}

/// An event with its timestamp
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Event {
    pub kind: EventKind,
    /// Producer-defined tick count
    pub timestamp: u32,
}

impl Event {
    pub const fn new(kind: EventKind) -> Self {
        Self { kind, timestamp: 0 }
    }

    /// Attach a timestamp
    pub const fn at(mut self, timestamp: u32) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub const fn mouse_move(x: i32, y: i32) -> Self {
        Self::new(EventKind::MouseMove { x, y })
    }

    pub const fn mouse_down(x: i32, y: i32) -> Self {
        Self::new(EventKind::MouseDown { x, y })
    }

    pub const fn mouse_up(x: i32, y: i32) -> Self {
        Self::new(EventKind::MouseUp { x, y })
    }

    pub const fn key_down(keycode: u8) -> Self {
        Self::new(EventKind::KeyDown { keycode })
    }

    pub const fn key_up(keycode: u8) -> Self {
        Self::new(EventKind::KeyUp { keycode })
    }

    /// User-defined event numbered `EVENT_USER_BASE + offset`
    pub const fn user(offset: u32, data: u32) -> Self {
        Self::new(EventKind::User {
            code: EVENT_USER_BASE + offset,
            data,
        })
    }

    #[inline]
    pub fn is_pointer(&self) -> bool {
        self.kind.is_pointer()
    }

    #[inline]
    pub fn pointer_position(&self) -> Option<Point> {
        self.kind.pointer_position()
    }
}
