//! Built-in bitmap typeface.
//!
//! Glyphs come from the 8x8 `font8x8` tables and are scaled to the requested pixel
//! size. Advances are proportional: each glyph takes its inked columns plus one column
//! of tracking, so measurement is a pure function of the text and the size and the
//! same text always wraps the same way.

use crate::render::config::{
    FontSpec,
    FontStyle,
};
use font8x8::{
    BASIC_FONTS,
    GREEK_FONTS,
    LATIN_FONTS,
    UnicodeFonts,
};
use unicode_width::UnicodeWidthChar;

pub const BUILTIN_FAMILY: &str = "bitmap8";

/// Source cell edge, in font units.
pub const CELL: u32 = 8;
const SPACE_COLS: u32 = 4;
const TOFU_COLS: u32 = 6;
const TRACKING_COLS: u32 = 1;
/// Horizontal shift per pixel of glyph height for the italic style.
pub const ITALIC_SLANT: f32 = 0.2;

/// Typographic quote marks, which the `font8x8` tables lack.
const QUOTE_MARKS: [(char, [u8; 8]); 4] = [
    ('\u{2018}', [0x04, 0x02, 0x06, 0x06, 0x00, 0x00, 0x00, 0x00]),
    ('\u{2019}', [0x06, 0x06, 0x04, 0x02, 0x00, 0x00, 0x00, 0x00]),
    ('\u{201C}', [0x44, 0x22, 0x66, 0x66, 0x00, 0x00, 0x00, 0x00]),
    ('\u{201D}', [0x66, 0x66, 0x44, 0x22, 0x00, 0x00, 0x00, 0x00]),
];

fn quote_mark(ch: char) -> Option<[u8; 8]> {
    QUOTE_MARKS
        .iter()
        .find(|(mark, _)| *mark == ch)
        .map(|(_, rows)| *rows)
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Glyph {
    rows: [u8; 8],
    left: u32,
    right: u32,
    top: u32,
    bottom: u32,
}

impl Glyph {
    fn from_rows(rows: [u8; 8]) -> Option<Self> {
        let columns = rows.iter().fold(0u8, |acc, row| acc | row);
        if columns == 0 {
            return None;
        }
        let left = columns.trailing_zeros();
        let right = CELL - columns.leading_zeros();
        let top = rows.iter().position(|row| *row != 0).unwrap_or(0) as u32;
        let bottom = rows.iter().rposition(|row| *row != 0).unwrap_or(7) as u32 + 1;
        Some(Self {
            rows,
            left,
            right,
            top,
            bottom,
        })
    }

    /// Bit 0 of each row is the leftmost pixel.
    pub fn is_set(&self, col: u32, row: u32) -> bool {
        col < CELL && row < CELL && self.rows[row as usize] & (1 << col) != 0
    }

    pub fn left(&self) -> u32 {
        self.left
    }

    pub fn ink_cols(&self) -> u32 {
        self.right - self.left
    }

    /// Vertical ink span `(top, bottom)` in font units, bottom exclusive.
    pub fn ink_rows(&self) -> (u32, u32) {
        (self.top, self.bottom)
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum GlyphShape {
    Ink(Glyph),
    /// Whitespace or a blank cell; advances without drawing.
    Blank { cols: u32 },
    /// Character the tables do not cover; drawn as an outlined box.
    Tofu { cols: u32 },
    /// Zero-width character (combining marks, controls).
    Empty,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Typeface {
    style: FontStyle,
}

impl Typeface {
    pub fn new(style: FontStyle) -> Self {
        Self { style }
    }

    pub fn for_spec(spec: &FontSpec) -> Self {
        if spec.family != BUILTIN_FAMILY {
            tracing::debug!(
                family = %spec.family,
                "font family not bundled, using {BUILTIN_FAMILY}"
            );
        }
        Self::new(spec.style)
    }

    pub fn style(&self) -> FontStyle {
        self.style
    }

    pub fn shape(&self, ch: char) -> GlyphShape {
        if ch.is_whitespace() {
            return GlyphShape::Blank { cols: SPACE_COLS };
        }
        let cells = match ch.width() {
            None | Some(0) => return GlyphShape::Empty,
            Some(cells) => cells as u32,
        };
        let rows = BASIC_FONTS
            .get(ch)
            .or_else(|| LATIN_FONTS.get(ch))
            .or_else(|| quote_mark(ch))
            .or_else(|| GREEK_FONTS.get(ch));
        match rows {
            Some(rows) => match Glyph::from_rows(rows) {
                Some(glyph) => GlyphShape::Ink(glyph),
                None => GlyphShape::Blank { cols: SPACE_COLS },
            },
            None => GlyphShape::Tofu {
                cols: TOFU_COLS * cells,
            },
        }
    }

    /// Columns (in font units) a shape occupies, tracking included.
    pub fn advance_cols(&self, shape: &GlyphShape) -> u32 {
        let bold = u32::from(self.style == FontStyle::Bold);
        match shape {
            GlyphShape::Ink(glyph) => glyph.ink_cols() + bold + TRACKING_COLS,
            GlyphShape::Blank { cols } => *cols,
            GlyphShape::Tofu { cols } => cols + bold + TRACKING_COLS,
            GlyphShape::Empty => 0,
        }
    }

    pub fn advance(&self, ch: char, px: u32) -> f32 {
        self.advance_cols(&self.shape(ch)) as f32 * scale(px)
    }

    pub fn measure(&self, text: &str, px: u32) -> f32 {
        let cols: u32 = text
            .chars()
            .map(|ch| self.advance_cols(&self.shape(ch)))
            .sum();
        cols as f32 * scale(px)
    }
}

/// Device pixels per font unit at `px`.
pub fn scale(px: u32) -> f32 {
    px as f32 / CELL as f32
}
