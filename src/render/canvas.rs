use crate::render::{
    config::{
        Color,
        FontStyle,
    },
    typeface::{
        CELL,
        GlyphShape,
        ITALIC_SLANT,
        Typeface,
        scale,
    },
};
use image::{
    DynamicImage,
    ImageFormat,
    RgbaImage,
};
use std::io::Cursor;

/// Largest surface we are willing to allocate, in bytes of RGBA.
const MAX_SURFACE_BYTES: u64 = 64 * 1024 * 1024;

pub struct Canvas {
    image: RgbaImage,
}

impl Canvas {
    /// Returns `None` when no surface of that size can be provided.
    pub fn new(width: u32, height: u32, background: Color) -> Option<Self> {
        if width == 0 || height == 0 {
            return None;
        }
        if u64::from(width) * u64::from(height) * 4 > MAX_SURFACE_BYTES {
            return None;
        }
        let image = RgbaImage::from_pixel(width, height, background.to_rgba());
        Some(Self { image })
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    fn plot(&mut self, x: i64, y: i64, color: Color) {
        if x < 0 || y < 0 || x >= i64::from(self.width()) || y >= i64::from(self.height()) {
            return;
        }
        self.image.put_pixel(x as u32, y as u32, color.to_rgba());
    }

    fn fill_rect(&mut self, x: i64, y: i64, w: i64, h: i64, color: Color) {
        for yy in y..y + h {
            for xx in x..x + w {
                self.plot(xx, yy, color);
            }
        }
    }

    /// Strokes a frame of `stroke` pixels that lies entirely inside the bounds.
    pub fn stroke_border(&mut self, stroke: u32, color: Color) {
        let w = i64::from(self.width());
        let h = i64::from(self.height());
        let s = i64::from(stroke).min(w / 2).min(h / 2);
        self.fill_rect(0, 0, w, s, color);
        self.fill_rect(0, h - s, w, s, color);
        self.fill_rect(0, s, s, h - 2 * s, color);
        self.fill_rect(w - s, s, s, h - 2 * s, color);
    }

    pub fn fill_circle(&mut self, cx: f32, cy: f32, radius: f32, color: Color) {
        let r2 = radius * radius;
        let y0 = (cy - radius).floor() as i64;
        let y1 = (cy + radius).ceil() as i64;
        let x0 = (cx - radius).floor() as i64;
        let x1 = (cx + radius).ceil() as i64;
        for y in y0..=y1 {
            for x in x0..=x1 {
                // sample at the pixel center
                let dx = x as f32 + 0.5 - cx;
                let dy = y as f32 + 0.5 - cy;
                if dx * dx + dy * dy <= r2 {
                    self.plot(x, y, color);
                }
            }
        }
    }

    /// Draws one shaped glyph with its cell's top-left corner at `(x, y)`.
    fn draw_shape(
        &mut self,
        face: &Typeface,
        shape: &GlyphShape,
        px: u32,
        x: f32,
        y: f32,
        color: Color,
    ) {
        let s = scale(px);
        let cell_h = (CELL as f32 * s).ceil() as i64;
        let bold = face.style() == FontStyle::Bold;
        let italic = face.style() == FontStyle::Italic;
        match shape {
            GlyphShape::Ink(glyph) => {
                let cols = glyph.ink_cols() + u32::from(bold);
                let w = (cols as f32 * s).ceil() as i64;
                for dy in 0..cell_h {
                    let row = ((dy as f32 / s) as u32).min(CELL - 1);
                    let shear = if italic {
                        ((cell_h as f32 / 2.0) - dy as f32) * ITALIC_SLANT
                    } else {
                        0.0
                    };
                    for dx in 0..w {
                        let c = (dx as f32 / s) as u32;
                        let lit = (c < glyph.ink_cols() && glyph.is_set(glyph.left() + c, row))
                            || (bold && c >= 1 && glyph.is_set(glyph.left() + c - 1, row));
                        if lit {
                            let px_x = (x + dx as f32 + shear).round() as i64;
                            self.plot(px_x, y.round() as i64 + dy, color);
                        }
                    }
                }
            }
            GlyphShape::Tofu { cols } => {
                let w = (*cols as f32 * s).round() as i64;
                let h = ((CELL - 1) as f32 * s).round() as i64;
                let t = (s.round() as i64).max(1);
                let (x, y) = (x.round() as i64, y.round() as i64);
                self.fill_rect(x, y, w, t, color);
                self.fill_rect(x, y + h - t, w, t, color);
                self.fill_rect(x, y, t, h, color);
                self.fill_rect(x + w - t, y, t, h, color);
            }
            GlyphShape::Blank { .. } | GlyphShape::Empty => {}
        }
    }

    /// Draws `text` on one line whose horizontal center is `center_x` and whose glyph
    /// cells are vertically centered on `center_y`.
    pub fn draw_text_centered(
        &mut self,
        face: &Typeface,
        text: &str,
        px: u32,
        center_x: f32,
        center_y: f32,
        color: Color,
    ) {
        let s = scale(px);
        let width = face.measure(text, px);
        let mut pen_x = center_x - width / 2.0;
        let top = center_y - CELL as f32 * s / 2.0;
        for ch in text.chars() {
            let shape = face.shape(ch);
            self.draw_shape(face, &shape, px, pen_x, top, color);
            pen_x += face.advance_cols(&shape) as f32 * s;
        }
    }

    /// Draws a single glyph with its ink box centered on `(cx, cy)`.
    pub fn draw_glyph_centered(
        &mut self,
        face: &Typeface,
        ch: char,
        px: u32,
        cx: f32,
        cy: f32,
        color: Color,
    ) {
        let s = scale(px);
        let shape = face.shape(ch);
        let (ink_w, ink_mid) = match &shape {
            GlyphShape::Ink(glyph) => {
                let (top, bottom) = glyph.ink_rows();
                let bold = u32::from(face.style() == FontStyle::Bold);
                (
                    (glyph.ink_cols() + bold) as f32 * s,
                    (top + bottom) as f32 / 2.0 * s,
                )
            }
            other => (
                face.advance_cols(other) as f32 * s,
                CELL as f32 * s / 2.0,
            ),
        };
        self.draw_shape(face, &shape, px, cx - ink_w / 2.0, cy - ink_mid, color);
    }

    pub fn encode_png(self) -> Result<Vec<u8>, image::ImageError> {
        let mut bytes = Vec::new();
        DynamicImage::ImageRgba8(self.image).write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
        Ok(bytes)
    }
}
