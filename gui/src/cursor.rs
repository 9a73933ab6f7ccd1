//! Mouse Cursor
//!
//! Fixed 12x12 one-bit arrow mask blitted straight onto the active
//! surface. Erasing paints the mask pixels black; it does not restore
//! what was underneath. The compositor avoids relying on erase by
//! repainting the scene under the old cursor position instead.

use crate::color::Color;
use crate::framebuffer::Framebuffer;
use crate::geometry::Rect;

/// Cursor edge length in pixels
pub const CURSOR_SIZE: i32 = 12;

/// Color written where the mask bit is set
pub const CURSOR_COLOR: Color = Color::WHITE;

/// Color written by `erase_cursor`
pub const CURSOR_ERASE_COLOR: Color = Color::BLACK;

/// Arrow mask, one row per entry, bit 11 is the leftmost column
#[rustfmt::skip]
const CURSOR_MASK: [u16; CURSOR_SIZE as usize] = [
    0b1000_0000_0000,
    0b1100_0000_0000,
    0b1110_0000_0000,
    0b1111_0000_0000,
    0b1111_1000_0000,
    0b1111_1100_0000,
    0b1111_1110_0000,
    0b1111_1111_0000,
    0b1111_1111_1000,
    0b1111_1100_0000,
    0b1101_1000_0000,
    0b1000_1100_0000,
];

/// Whether the mask covers `(col, row)` of the cursor cell
#[inline]
pub fn mask_bit(col: i32, row: i32) -> bool {
    if !(0..CURSOR_SIZE).contains(&col) || !(0..CURSOR_SIZE).contains(&row) {
        return false;
    }
    (CURSOR_MASK[row as usize] >> (CURSOR_SIZE - 1 - col)) & 1 == 1
}

/// Screen area touched by a cursor drawn at `(x, y)`
pub fn cursor_rect(x: i32, y: i32) -> Rect {
    Rect::new(x, y, CURSOR_SIZE, CURSOR_SIZE)
}

impl Framebuffer {
    /// Blit the cursor mask in white with its hotspot at `(x, y)`
    pub fn draw_cursor(&mut self, x: i32, y: i32) {
        self.blit_cursor_mask(x, y, CURSOR_COLOR);
    }

    /// Overwrite the cursor mask pixels with black
    pub fn erase_cursor(&mut self, x: i32, y: i32) {
        self.blit_cursor_mask(x, y, CURSOR_ERASE_COLOR);
    }

    fn blit_cursor_mask(&mut self, x: i32, y: i32, color: Color) {
        for row in 0..CURSOR_SIZE {
            for col in 0..CURSOR_SIZE {
                if mask_bit(col, row) {
                    // put_pixel clips against the screen
                    self.put_pixel(x.saturating_add(col), y.saturating_add(row), color);
                }
            }
        }
    }
}
