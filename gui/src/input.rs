//! Input Shaping
//!
//! Turns raw PS/2 bytes into the absolute, fully formed [`Event`]s the
//! compositor consumes. Both helpers are meant to be called from IRQ
//! handlers and post through an [`EventSender`].

use spin::Mutex;

use crate::event::Event;
use crate::geometry::Point;
use crate::queue::EventSender;

/// Scancode set 1 extended-key prefix
pub const SCANCODE_EXTENDED: u8 = 0xE0;

/// Break (release) bit of a set 1 scancode
const SCANCODE_BREAK: u8 = 0x80;

/// Packet byte 0 flags
const PACKET_LEFT_BUTTON: u8 = 0x01;
const PACKET_ALWAYS_ONE: u8 = 0x08;
const PACKET_X_SIGN: u8 = 0x10;
const PACKET_Y_SIGN: u8 = 0x20;

/// Translate a set 1 scancode into a key event.
///
/// Make codes yield `KeyDown`, break codes `KeyUp`, both carrying the
/// 7-bit key code. The extended prefix yields nothing.
pub fn scancode_event(scancode: u8) -> Option<Event> {
    if scancode == SCANCODE_EXTENDED {
        return None;
    }
    let keycode = scancode & !SCANCODE_BREAK;
    if scancode & SCANCODE_BREAK != 0 {
        Some(Event::key_up(keycode))
    } else {
        Some(Event::key_down(keycode))
    }
}

/// Events produced by one complete mouse packet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MousePacket {
    /// Set when the clamped position changed
    pub moved: Option<Event>,
    /// Set on a left-button press or release
    pub button: Option<Event>,
}

impl MousePacket {
    /// Movement first, then the button transition
    pub fn events(&self) -> impl Iterator<Item = Event> {
        [self.moved, self.button].into_iter().flatten()
    }
}

/// Mouse packet state
struct MouseState {
    packet: [u8; 3],
    index: usize,
    x: i32,
    y: i32,
    left: bool,
}

/// PS/2 mouse packet decoder with absolute position tracking
pub struct Ps2Mouse {
    state: Mutex<MouseState>,
    width: i32,
    height: i32,
}

impl Ps2Mouse {
    /// Decoder for a `width x height` screen, pointer at the centre
    pub const fn new(width: i32, height: i32) -> Self {
        Self {
            state: Mutex::new(MouseState {
                packet: [0; 3],
                index: 0,
                x: width / 2,
                y: height / 2,
                left: false,
            }),
            width,
            height,
        }
    }

    /// Feed one byte from the controller.
    ///
    /// Returns the shaped events once a full packet has arrived. A first
    /// byte without the always-one bit is discarded to resynchronize.
    pub fn feed(&self, byte: u8) -> Option<MousePacket> {
        let mut state = self.state.lock();

        if state.index == 0 && byte & PACKET_ALWAYS_ONE == 0 {
            log::trace!("[INPUT] Mouse resync, dropped byte {:#04x}", byte);
            return None;
        }

        let index = state.index;
        state.packet[index] = byte;
        state.index += 1;
        if state.index < 3 {
            return None;
        }
        state.index = 0;

        let flags = state.packet[0];
        let mut dx = state.packet[1] as i32;
        let mut dy = state.packet[2] as i32;

        // Apply sign extension
        if flags & PACKET_X_SIGN != 0 {
            dx -= 256;
        }
        if flags & PACKET_Y_SIGN != 0 {
            dy -= 256;
        }

        // Screen Y grows downwards
        let x = (state.x + dx).clamp(0, self.width - 1);
        let y = (state.y - dy).clamp(0, self.height - 1);

        let mut out = MousePacket::default();
        if (x, y) != (state.x, state.y) {
            state.x = x;
            state.y = y;
            out.moved = Some(Event::mouse_move(x, y));
        }

        let left = flags & PACKET_LEFT_BUTTON != 0;
        if left != state.left {
            state.left = left;
            out.button = Some(if left {
                Event::mouse_down(x, y)
            } else {
                Event::mouse_up(x, y)
            });
        }

        Some(out)
    }

    /// Feed a byte and post whatever it produces
    pub fn feed_into(&self, byte: u8, sender: &EventSender) {
        if let Some(packet) = self.feed(byte) {
            for event in packet.events() {
                sender.post(event);
            }
        }
    }

    /// Current absolute position
    pub fn position(&self) -> Point {
        let state = self.state.lock();
        Point::new(state.x, state.y)
    }

    /// Move the pointer without generating events
    pub fn set_position(&self, x: i32, y: i32) {
        let mut state = self.state.lock();
        state.x = x.clamp(0, self.width - 1);
        state.y = y.clamp(0, self.height - 1);
        state.index = 0;
    }
}
