use crate::render::typeface::BUILTIN_FAMILY;
use image::Rgba;
use serde::{
    Deserialize,
    Serialize,
};
use std::{
    fmt,
    str::FromStr,
};

/// Layout and styling of the quote card. Constant per deployment.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub canvas_w: u32,
    pub canvas_h: u32,
    pub padding_x_frac: f32,
    pub padding_y_frac: f32,
    pub initial_font_px: u32,
    pub min_font_px: u32,
    pub font_step_px: u32,
    pub line_height_ratio: f32,
    pub author_ratio: f32,
    pub author_min_px: u32,
    pub author_gap_px: u32,
    /// Shift applied to the vertically centered text block, positive is down.
    pub block_offset_y: i32,
    pub border_px: u32,
    pub badge: BadgeConfig,
    pub colors: Palette,
    pub fonts: Fonts,
}

impl Default for RenderConfig {
    fn default() -> Self {
        // 1.91:1 social card
        Self {
            canvas_w: 1200,
            canvas_h: 630,
            padding_x_frac: 0.1,
            padding_y_frac: 0.24,
            initial_font_px: 60,
            min_font_px: 24,
            font_step_px: 2,
            line_height_ratio: 4.0 / 3.0,
            author_ratio: 0.65,
            author_min_px: 18,
            author_gap_px: 40,
            block_offset_y: 20,
            border_px: 3,
            badge: BadgeConfig::default(),
            colors: Palette::default(),
            fonts: Fonts::default(),
        }
    }
}

impl RenderConfig {
    pub fn max_text_width(&self) -> f32 {
        self.canvas_w as f32 * (1.0 - 2.0 * self.padding_x_frac)
    }

    pub fn safe_height(&self) -> f32 {
        self.canvas_h as f32 * (1.0 - 2.0 * self.padding_y_frac)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.canvas_w == 0 || self.canvas_h == 0 {
            return Err(format!(
                "canvas must be non-empty, got {}x{}",
                self.canvas_w, self.canvas_h
            ));
        }
        for (name, frac) in [
            ("padding_x_frac", self.padding_x_frac),
            ("padding_y_frac", self.padding_y_frac),
        ] {
            if !(0.0..0.5).contains(&frac) {
                return Err(format!("{name} must be in [0, 0.5), got {frac}"));
            }
        }
        if self.min_font_px == 0 || self.min_font_px > self.initial_font_px {
            return Err(format!(
                "font range invalid: min {} initial {}",
                self.min_font_px, self.initial_font_px
            ));
        }
        if self.font_step_px == 0 {
            return Err("font_step_px must be positive".to_string());
        }
        if !(self.line_height_ratio.is_finite() && self.line_height_ratio > 0.0) {
            return Err(format!(
                "line_height_ratio must be positive, got {}",
                self.line_height_ratio
            ));
        }
        if !(self.author_ratio.is_finite() && self.author_ratio > 0.0) {
            return Err(format!(
                "author_ratio must be positive, got {}",
                self.author_ratio
            ));
        }
        if self.author_min_px == 0 {
            return Err("author_min_px must be positive".to_string());
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BadgeConfig {
    pub center_y: u32,
    pub radius: u32,
    pub glyph_px: u32,
}

impl Default for BadgeConfig {
    fn default() -> Self {
        Self {
            center_y: 100,
            radius: 40,
            glyph_px: 48,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Palette {
    pub background: Color,
    pub border: Color,
    pub badge: Color,
    pub badge_glyph: Color,
    pub text: Color,
    pub author: Color,
}

impl Default for Palette {
    fn default() -> Self {
        let purple = Color::rgb(0x6A, 0x3C, 0xFF);
        let white = Color::rgb(0xFF, 0xFF, 0xFF);
        Self {
            background: purple,
            border: white,
            badge: white,
            badge_glyph: purple,
            text: white,
            author: Color::rgb(0xFC, 0xD3, 0x4D),
        }
    }
}

/// Which piece of the card a font is used for.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FontRole {
    Body,
    Author,
    Badge,
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontStyle {
    #[default]
    Regular,
    Italic,
    Bold,
}

/// Font for one role on the card.
///
/// Only the built-in bitmap family ([`BUILTIN_FAMILY`]) is bundled. Other family names
/// are accepted and rendered with it, so per-role fonts differ by `style` alone.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FontSpec {
    pub family: String,
    #[serde(default)]
    pub style: FontStyle,
}

impl FontSpec {
    pub fn new(family: impl Into<String>, style: FontStyle) -> Self {
        Self {
            family: family.into(),
            style,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Fonts {
    pub body: FontSpec,
    pub author: FontSpec,
    pub badge: FontSpec,
}

impl Default for Fonts {
    fn default() -> Self {
        Self {
            body: FontSpec::new(BUILTIN_FAMILY, FontStyle::Italic),
            author: FontSpec::new(BUILTIN_FAMILY, FontStyle::Bold),
            badge: FontSpec::new(BUILTIN_FAMILY, FontStyle::Bold),
        }
    }
}

impl Fonts {
    pub fn for_role(&self, role: FontRole) -> &FontSpec {
        match role {
            FontRole::Body => &self.body,
            FontRole::Author => &self.author,
            FontRole::Badge => &self.badge,
        }
    }
}

/// Opaque RGB color, written as `#RRGGBB` in configuration files.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn to_rgba(self) -> Rgba<u8> {
        Rgba([self.r, self.g, self.b, 0xFF])
    }
}

impl FromStr for Color {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.trim().trim_start_matches('#');
        let bytes = hex::decode(digits).map_err(|e| format!("invalid color {s:?}: {e}"))?;
        match bytes.as_slice() {
            [r, g, b] => Ok(Self::rgb(*r, *g, *b)),
            _ => Err(format!("invalid color {s:?}: expected #RRGGBB")),
        }
    }
}

impl TryFrom<String> for Color {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_string()
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}
