// Window + software drawing utilities.
// Visual effects provided here:
// 1) A window showing the mirrored webcam with the painting composited on top.
// 2) A crosshair that follows your fingertip (brush-colored while drawing).
// 3) A tiny 5x7 bitmap font for the status / brush HUD.

use crate::driver::{Command, FrameView, Frontend};
use crate::error::Error;
use crate::gamma::GammaLut;
use crate::types::{FrameBuffer, Rgba};
use minifb::{Key, KeyRepeat, Window, WindowOptions};

/// Backdrop while the webcam is off.
const IDLE_BACKDROP: u32 = 0x00_20_22_28;
const CROSSHAIR_IDLE: u32 = 0x00_FF_CC_33;
const HUD_TEXT: u32 = 0x00_FF_FF_FF;
const WIDTH_STEP: f32 = 2.0;

/// Colors on keys 1..7.
pub const PALETTE: [Rgba; 7] = [
    Rgba::opaque(0xFF, 0x2D, 0x55), // red
    Rgba::opaque(0xFF, 0x95, 0x00), // orange
    Rgba::opaque(0xFF, 0xCC, 0x00), // yellow
    Rgba::opaque(0x34, 0xC7, 0x59), // green
    Rgba::opaque(0x00, 0x7A, 0xFF), // blue
    Rgba::opaque(0xAF, 0x52, 0xDE), // purple
    Rgba::opaque(0xFF, 0xFF, 0xFF), // white
];

const PALETTE_KEYS: [Key; 7] = [Key::Key1, Key::Key2, Key::Key3, Key::Key4, Key::Key5, Key::Key6, Key::Key7];

pub struct Drawer {
    window: Window,      // the on-screen window you see
    screen: FrameBuffer, // reused every frame
    lut: GammaLut,
    hud_visible: bool,
}

impl Drawer {
    /// Create a window the size of the canvas.
    /// Visual: a new empty window appears with your chosen title.
    pub fn new(title: &str, width: usize, height: usize) -> Result<Self, Error> {
        let window = Window::new(title, width, height, WindowOptions::default())
            .map_err(|e| Error::WindowInit(e.to_string()))?;
        Ok(Self {
            window,
            screen: FrameBuffer::filled(width, height, IDLE_BACKDROP),
            lut: GammaLut::new(),
            hud_visible: true,
        })
    }

    fn pressed(&self, key: Key) -> bool {
        self.window.is_key_pressed(key, KeyRepeat::No)
    }
}

impl Frontend for Drawer {
    /// False once the window is closed or ESC is held.
    fn is_open(&self) -> bool {
        self.window.is_open() && !self.window.is_key_down(Key::Escape)
    }

    fn poll_commands(&mut self) -> Vec<Command> {
        let mut out = Vec::new();
        if self.pressed(Key::W) { out.push(Command::ToggleInput); }
        if self.pressed(Key::C) { out.push(Command::Clear); }
        if self.pressed(Key::Z) { out.push(Command::Undo); }
        if self.pressed(Key::Y) { out.push(Command::Redo); }
        for (key, color) in PALETTE_KEYS.iter().zip(PALETTE) {
            if self.pressed(*key) { out.push(Command::SetColor(color)); }
        }
        // Brackets repeat while held so the size can be dialed quickly.
        if self.window.is_key_pressed(Key::LeftBracket, KeyRepeat::Yes) { out.push(Command::AdjustWidth(-WIDTH_STEP)); }
        if self.window.is_key_pressed(Key::RightBracket, KeyRepeat::Yes) { out.push(Command::AdjustWidth(WIDTH_STEP)); }
        // HUD visibility is purely local to the window.
        if self.pressed(Key::H) { self.hud_visible = !self.hud_visible; }
        out
    }

    /// Compose and push one frame.
    /// Visual: mirrored webcam (or dark backdrop), painting, fingertip crosshair, HUD.
    fn present(&mut self, view: &FrameView<'_>) -> Result<(), Error> {
        let screen = &mut self.screen;
        match view.backdrop {
            Some(frame) => frame.blit_mirrored_into(screen),
            None => screen.pixels.fill(IDLE_BACKDROP),
        }
        view.canvas.composite_onto(screen, &self.lut)?;

        if let Some(c) = view.cursor {
            let color = if view.drawing { view.brush.color.to_rgb() } else { CROSSHAIR_IDLE };
            let size = (view.brush.width as i32 / 2 + 8).max(10);
            draw_crosshair(screen, c.x as i32, c.y as i32, size, color);
        }

        if self.hud_visible {
            draw_text_5x7(screen, 8, 8, &view.status.to_uppercase(), HUD_TEXT);
            fill_rect(screen, 8, 20, 7, 7, view.brush.color.to_rgb());
            let brush = format!("{} | WIDTH {:.0}", view.brush.color.to_string().to_uppercase(), view.brush.width);
            draw_text_5x7(screen, 20, 20, &brush, HUD_TEXT);
            let bottom = screen.height as i32 - 14;
            draw_text_5x7(screen, 8, bottom, "W CAM  C CLEAR  Z UNDO  Y REDO  1-7 COLOR  [ ] SIZE  H HUD", HUD_TEXT);
        }

        self.window
            .update_with_buffer(&screen.pixels, screen.width, screen.height)
            .map_err(|e| Error::WindowUpdate(e.to_string()))?;
        Ok(())
    }
}

/* ---------- Software drawing: pixels, crosshair, tiny bitmap font ---------- */

/// Put a pixel on the framebuffer if (x,y) is inside bounds.
#[inline]
fn put_pixel(fb: &mut FrameBuffer, x: i32, y: i32, color: u32) {
    if x < 0 || y < 0 {
        return;
    }
    let (x, y) = (x as usize, y as usize);
    if x >= fb.width || y >= fb.height {
        return;
    }
    let idx = y * fb.width + x;
    fb.pixels[idx] = color;
}

/// Solid rectangle, clipped to the framebuffer.
fn fill_rect(fb: &mut FrameBuffer, x: i32, y: i32, w: i32, h: i32, color: u32) {
    for yy in y..y + h {
        for xx in x..x + w {
            put_pixel(fb, xx, yy, color);
        }
    }
}

/// Draw a thin line between (x0,y0) and (x1,y1) using Bresenham.
fn draw_line(fb: &mut FrameBuffer, x0: i32, y0: i32, x1: i32, y1: i32, color: u32) {
    let (mut x0, mut y0) = (x0, y0);
    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;
    loop {
        put_pixel(fb, x0, y0, color);
        if x0 == x1 && y0 == y1 { break; }
        let e2 = 2 * err;
        if e2 >= dy { err += dy; x0 += sx; }
        if e2 <= dx { err += dx; y0 += sy; }
    }
}

/// Draw a crosshair centered at (cx,cy) with a small gap in the middle.
/// Visual: the finger indicator.
pub fn draw_crosshair(fb: &mut FrameBuffer, cx: i32, cy: i32, size: i32, color: u32) {
    draw_line(fb, cx - size, cy, cx - 3, cy, color);
    draw_line(fb, cx + 3, cy, cx + size, cy, color);
    draw_line(fb, cx, cy - size, cx, cy - 3, color);
    draw_line(fb, cx, cy + 3, cx, cy + size, color);
    put_pixel(fb, cx, cy, color);
}

/* ---------- 5x7 bitmap font (digits, A-Z, a little punctuation) ---------- */

/// Return a 5x7 glyph bitmap. Lowercase maps to uppercase.
/// Each u8 is a row; the low 5 bits are the pixels (bit 4 = leftmost).
fn glyph5x7(ch: char) -> Option<[u8; 7]> {
    macro_rules! g { ($a:expr,$b:expr,$c:expr,$d:expr,$e:expr,$f:expr,$g:expr) => {
        Some([$a,$b,$c,$d,$e,$f,$g])
    }; }

    match ch.to_ascii_uppercase() {
        '0' => g!(0b01110,0b10001,0b10011,0b10101,0b11001,0b10001,0b01110),
        '1' => g!(0b00100,0b01100,0b00100,0b00100,0b00100,0b00100,0b01110),
        '2' => g!(0b01110,0b10001,0b00001,0b00010,0b00100,0b01000,0b11111),
        '3' => g!(0b11110,0b00001,0b00001,0b01110,0b00001,0b00001,0b11110),
        '4' => g!(0b00010,0b00110,0b01010,0b10010,0b11111,0b00010,0b00010),
        '5' => g!(0b11111,0b10000,0b11110,0b00001,0b00001,0b10001,0b01110),
        '6' => g!(0b00110,0b01000,0b10000,0b11110,0b10001,0b10001,0b01110),
        '7' => g!(0b11111,0b00001,0b00010,0b00100,0b01000,0b01000,0b01000),
        '8' => g!(0b01110,0b10001,0b10001,0b01110,0b10001,0b10001,0b01110),
        '9' => g!(0b01110,0b10001,0b10001,0b01111,0b00001,0b00010,0b01100),

        'A' => g!(0b01110,0b10001,0b10001,0b11111,0b10001,0b10001,0b10001),
        'B' => g!(0b11110,0b10001,0b10001,0b11110,0b10001,0b10001,0b11110),
        'C' => g!(0b01110,0b10001,0b10000,0b10000,0b10000,0b10001,0b01110),
        'D' => g!(0b11100,0b10010,0b10001,0b10001,0b10001,0b10010,0b11100),
        'E' => g!(0b11111,0b10000,0b10000,0b11110,0b10000,0b10000,0b11111),
        'F' => g!(0b11111,0b10000,0b10000,0b11110,0b10000,0b10000,0b10000),
        'G' => g!(0b01110,0b10001,0b10000,0b10111,0b10001,0b10001,0b01111),
        'H' => g!(0b10001,0b10001,0b10001,0b11111,0b10001,0b10001,0b10001),
        'I' => g!(0b01110,0b00100,0b00100,0b00100,0b00100,0b00100,0b01110),
        'J' => g!(0b00111,0b00010,0b00010,0b00010,0b00010,0b10010,0b01100),
        'K' => g!(0b10001,0b10010,0b10100,0b11000,0b10100,0b10010,0b10001),
        'L' => g!(0b10000,0b10000,0b10000,0b10000,0b10000,0b10000,0b11111),
        'M' => g!(0b10001,0b11011,0b10101,0b10101,0b10001,0b10001,0b10001),
        'N' => g!(0b10001,0b10001,0b11001,0b10101,0b10011,0b10001,0b10001),
        'O' => g!(0b01110,0b10001,0b10001,0b10001,0b10001,0b10001,0b01110),
        'P' => g!(0b11110,0b10001,0b10001,0b11110,0b10000,0b10000,0b10000),
        'Q' => g!(0b01110,0b10001,0b10001,0b10001,0b10101,0b10010,0b01101),
        'R' => g!(0b11110,0b10001,0b10001,0b11110,0b10100,0b10010,0b10001),
        'S' => g!(0b01111,0b10000,0b10000,0b01110,0b00001,0b00001,0b11110),
        'T' => g!(0b11111,0b00100,0b00100,0b00100,0b00100,0b00100,0b00100),
        'U' => g!(0b10001,0b10001,0b10001,0b10001,0b10001,0b10001,0b01110),
        'V' => g!(0b10001,0b10001,0b10001,0b10001,0b10001,0b01010,0b00100),
        'W' => g!(0b10001,0b10001,0b10001,0b10101,0b10101,0b10101,0b01010),
        'X' => g!(0b10001,0b10001,0b01010,0b00100,0b01010,0b10001,0b10001),
        'Y' => g!(0b10001,0b10001,0b01010,0b00100,0b00100,0b00100,0b00100),
        'Z' => g!(0b11111,0b00001,0b00010,0b00100,0b01000,0b10000,0b11111),

        ' ' => g!(0b00000,0b00000,0b00000,0b00000,0b00000,0b00000,0b00000),
        '|' => g!(0b00100,0b00100,0b00100,0b00100,0b00100,0b00100,0b00100),
        ':' => g!(0b00000,0b00100,0b00000,0b00000,0b00100,0b00000,0b00000),
        '.' => g!(0b00000,0b00000,0b00000,0b00000,0b00000,0b00100,0b00000),
        ',' => g!(0b00000,0b00000,0b00000,0b00000,0b00110,0b00100,0b01000),
        '!' => g!(0b00100,0b00100,0b00100,0b00100,0b00100,0b00000,0b00100),
        '-' => g!(0b00000,0b00000,0b00000,0b11111,0b00000,0b00000,0b00000),
        '#' => g!(0b01010,0b01010,0b11111,0b01010,0b11111,0b01010,0b01010),
        '[' => g!(0b01110,0b01000,0b01000,0b01000,0b01000,0b01000,0b01110),
        ']' => g!(0b01110,0b00010,0b00010,0b00010,0b00010,0b00010,0b01110),
        '/' => g!(0b00001,0b00010,0b00010,0b00100,0b01000,0b01000,0b10000),

        _ => None,
    }
}

/// Draw a single 5x7 character at (x,y) with a 1-pixel black shadow for contrast.
fn draw_char_5x7(fb: &mut FrameBuffer, x: i32, y: i32, ch: char, color: u32) {
    if let Some(rows) = glyph5x7(ch) {
        for (pass_color, off) in [(0x00000000, 1), (color, 0)] {
            for (ry, rowbits) in rows.iter().enumerate() {
                for rx in 0..5 {
                    if (rowbits & (1 << (4 - rx))) != 0 {
                        put_pixel(fb, x + rx + off, y + ry as i32 + off, pass_color);
                    }
                }
            }
        }
    }
}

/// Draw a text string using 5x7 glyphs; unknown characters leave a blank cell.
pub fn draw_text_5x7(fb: &mut FrameBuffer, mut x: i32, y: i32, text: &str, color: u32) {
    for ch in text.chars() {
        draw_char_5x7(fb, x, y, ch, color);
        x += 6; // 5 pixels glyph width + 1 pixel spacing
    }
}
