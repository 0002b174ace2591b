//! Quote card compositor.
//!
//! `render` is a pure function of the quote text, the author and a [`RenderConfig`]:
//! the same inputs always produce byte-identical PNG output. It never fails to its
//! caller. When a surface cannot be provided or encoding fails the result is
//! [`CardImage::Unavailable`] and the caller falls back to a text-only card.

use crate::quotes::Quote;
use sha2::{
    Digest,
    Sha256,
};
use tracing::warn;

pub mod canvas;
pub mod config;
pub mod layout;
pub mod typeface;

pub use config::{
    Color,
    FontRole,
    FontSpec,
    FontStyle,
    RenderConfig,
};
pub use layout::TextLayout;

use canvas::Canvas;
use typeface::Typeface;

const BADGE_GLYPH: char = '\u{201C}';

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RenderedImage {
    pub bytes: Vec<u8>,
    pub width_px: u32,
    pub height_px: u32,
}

impl RenderedImage {
    pub const MIME_TYPE: &'static str = "image/png";

    /// Hex SHA-256 of the encoded bytes.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(&self.bytes);
        format!("{:x}", hasher.finalize())
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum CardImage {
    Rendered(RenderedImage),
    Unavailable,
}

impl CardImage {
    pub fn rendered(&self) -> Option<&RenderedImage> {
        match self {
            CardImage::Rendered(image) => Some(image),
            CardImage::Unavailable => None,
        }
    }

    pub fn is_available(&self) -> bool {
        self.rendered().is_some()
    }
}

pub fn render_quote(quote: &Quote, config: &RenderConfig) -> CardImage {
    render(&quote.text, &quote.author, config)
}

pub fn render(text: &str, author: &str, config: &RenderConfig) -> CardImage {
    if let Err(reason) = config.validate() {
        warn!(%reason, "render config rejected, card unavailable");
        return CardImage::Unavailable;
    }
    let Some(mut canvas) = Canvas::new(config.canvas_w, config.canvas_h, config.colors.background)
    else {
        warn!(
            width = config.canvas_w,
            height = config.canvas_h,
            "no drawing surface available, card unavailable"
        );
        return CardImage::Unavailable;
    };

    canvas.stroke_border(config.border_px, config.colors.border);
    draw_badge(&mut canvas, config);

    let body = Typeface::for_spec(config.fonts.for_role(FontRole::Body));
    let author_face = Typeface::for_spec(config.fonts.for_role(FontRole::Author));
    let layout = layout::fit(text, config, &body);
    draw_block(&mut canvas, &layout, author, config, &body, &author_face);

    let (width_px, height_px) = (canvas.width(), canvas.height());
    match canvas.encode_png() {
        Ok(bytes) => CardImage::Rendered(RenderedImage {
            bytes,
            width_px,
            height_px,
        }),
        Err(err) => {
            warn!(?err, "png encoding failed, card unavailable");
            CardImage::Unavailable
        }
    }
}

fn draw_badge(canvas: &mut Canvas, config: &RenderConfig) {
    let cx = config.canvas_w as f32 / 2.0;
    let cy = config.badge.center_y as f32;
    canvas.fill_circle(cx, cy, config.badge.radius as f32, config.colors.badge);

    let face = Typeface::for_spec(config.fonts.for_role(FontRole::Badge));
    canvas.draw_glyph_centered(
        &face,
        BADGE_GLYPH,
        config.badge.glyph_px,
        cx,
        cy,
        config.colors.badge_glyph,
    );
}

fn draw_block(
    canvas: &mut Canvas,
    layout: &TextLayout,
    author: &str,
    config: &RenderConfig,
    body: &Typeface,
    author_face: &Typeface,
) {
    let cx = config.canvas_w as f32 / 2.0;
    let top = (config.canvas_h as f32 - layout.block_height) / 2.0 + config.block_offset_y as f32;

    for (i, line) in layout.lines.iter().enumerate() {
        let center_y = top + (i as f32 + 0.5) * layout.line_height;
        canvas.draw_text_centered(body, line, layout.font_px, cx, center_y, config.colors.text);
    }

    let author_line = format!("- {author}");
    let author_px = shrink_author(&author_line, layout.author_px, config, author_face);
    let author_center = top
        + layout.lines.len() as f32 * layout.line_height
        + config.author_gap_px as f32
        + layout.author_px as f32 / 2.0;
    canvas.draw_text_centered(
        author_face,
        &author_line,
        author_px,
        cx,
        author_center,
        config.colors.author,
    );
}

/// Narrows the author line until it fits the text width; the author is never wrapped.
fn shrink_author(line: &str, px: u32, config: &RenderConfig, face: &Typeface) -> u32 {
    let max_width = config.max_text_width();
    let mut px = px;
    while px > config.author_min_px && face.measure(line, px) > max_width {
        px -= 1;
    }
    px
}
