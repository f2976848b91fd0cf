use std::fmt;

/// The emulators display width in pixels
pub const DISPLAY_WIDTH: usize = 64;

/// The emulators display height in pixels
pub const DISPLAY_HEIGHT: usize = 32;

/// Monochrome 64x32 framebuffer, one `u64` per row.
///
/// Column 0 is the most significant bit of a row so that sprite bytes, which are drawn
/// MSB first, line up left to right. All coordinates wrap around the screen edges.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameBuffer {
    rows: [u64; DISPLAY_HEIGHT],
}

impl Default for FrameBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameBuffer {
    /// Creates a blank framebuffer
    pub fn new() -> Self {
        Self {
            rows: [0; DISPLAY_HEIGHT],
        }
    }

    /// Mask selecting column x (after wrapping) within a row
    fn column_mask(x: usize) -> u64 {
        1u64 << (DISPLAY_WIDTH - 1 - x % DISPLAY_WIDTH)
    }

    /// Turns every pixel off
    pub fn clear(&mut self) {
        self.rows = [0; DISPLAY_HEIGHT];
    }

    /// Whether the pixel at (x, y) is lit
    pub fn get_pixel(&self, x: usize, y: usize) -> bool {
        self.rows[y % DISPLAY_HEIGHT] & Self::column_mask(x) != 0
    }

    pub fn set_pixel(&mut self, x: usize, y: usize, on: bool) {
        let row = &mut self.rows[y % DISPLAY_HEIGHT];
        if on {
            *row |= Self::column_mask(x);
        } else {
            *row &= !Self::column_mask(x);
        }
    }

    /// Flips the pixel at (x, y), returning true if it was lit beforehand
    pub fn toggle_pixel(&mut self, x: usize, y: usize) -> bool {
        let was_on = self.get_pixel(x, y);
        self.rows[y % DISPLAY_HEIGHT] ^= Self::column_mask(x);
        was_on
    }

    /// XORs an 8 pixel wide sprite onto the screen with its top left corner at (x, y).
    ///
    /// Each byte of `sprite` is one row. Returns true if any lit pixel was turned off.
    pub fn draw_sprite(&mut self, x: usize, y: usize, sprite: &[u8]) -> bool {
        let mut collision = false;

        for (row_offset, &byte) in sprite.iter().enumerate() {
            for bit in 0..8 {
                if byte & (0x80u8 >> bit) != 0 {
                    collision |= self.toggle_pixel(x + bit, y + row_offset);
                }
            }
        }

        collision
    }

    /// The raw rows, column 0 in the most significant bit
    pub fn rows(&self) -> &[u64; DISPLAY_HEIGHT] {
        &self.rows
    }

    /// Renders the screen as text, one line per row
    pub fn to_ascii(&self, lit: char, unlit: char) -> String {
        let mut out = String::with_capacity((DISPLAY_WIDTH + 1) * DISPLAY_HEIGHT);
        for y in 0..DISPLAY_HEIGHT {
            for x in 0..DISPLAY_WIDTH {
                out.push(if self.get_pixel(x, y) { lit } else { unlit });
            }
            out.push('\n');
        }
        out
    }
}

impl fmt::Display for FrameBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_ascii('#', '.'))
    }
}
