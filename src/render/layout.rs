use crate::render::{
    config::RenderConfig,
    typeface::Typeface,
};
use tracing::debug;

/// Result of the shrink-to-fit pass for one quote.
#[derive(Clone, Debug, PartialEq)]
pub struct TextLayout {
    pub font_px: u32,
    pub lines: Vec<String>,
    pub line_height: f32,
    pub author_px: u32,
    pub block_height: f32,
    /// False when even `min_font_px` overflows the safe area and the layout is
    /// best-effort.
    pub fits: bool,
}

/// Greedy word wrap. A line grows while its measured width stays within
/// `max_width`; the word that overflows starts the next line. Words are never split,
/// so a single word wider than `max_width` sits alone on its own line.
pub fn wrap<F>(text: &str, max_width: f32, measure: F) -> Vec<String>
where
    F: Fn(&str) -> f32,
{
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        if current.is_empty() {
            current.push_str(word);
            continue;
        }
        let candidate = format!("{current} {word}");
        if measure(&candidate) <= max_width {
            current = candidate;
        } else {
            lines.push(std::mem::replace(&mut current, word.to_string()));
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

pub fn author_px(font_px: u32, config: &RenderConfig) -> u32 {
    let scaled = (font_px as f32 * config.author_ratio).round() as u32;
    scaled.max(config.author_min_px)
}

/// Lays `text` out at one font size without checking the fit.
pub fn layout_at(text: &str, font_px: u32, config: &RenderConfig, body: &Typeface) -> TextLayout {
    let lines = wrap(text, config.max_text_width(), |line| {
        body.measure(line, font_px)
    });
    let line_height = font_px as f32 * config.line_height_ratio;
    let author_px = author_px(font_px, config);
    let block_height = lines.len() as f32 * line_height
        + config.author_gap_px as f32
        + author_px as f32;
    TextLayout {
        font_px,
        lines,
        line_height,
        author_px,
        block_height,
        fits: block_height <= config.safe_height(),
    }
}

/// Shrink-to-fit: walks down from `initial_font_px` in `font_step_px` steps and takes
/// the first size whose block fits the safe height. `min_font_px` is always tried
/// last and is used even when it does not fit.
pub fn fit(text: &str, config: &RenderConfig, body: &Typeface) -> TextLayout {
    let mut font_px = config.initial_font_px;
    loop {
        let layout = layout_at(text, font_px, config, body);
        if layout.fits {
            debug!(
                font_px,
                lines = layout.lines.len(),
                block_height = layout.block_height,
                "quote fits"
            );
            return layout;
        }
        if font_px <= config.min_font_px {
            debug!(
                font_px,
                lines = layout.lines.len(),
                block_height = layout.block_height,
                "quote overflows at minimum size, rendering best effort"
            );
            return layout;
        }
        font_px = font_px
            .saturating_sub(config.font_step_px)
            .max(config.min_font_px);
    }
}
