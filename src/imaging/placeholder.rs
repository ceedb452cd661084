//! Synthesized thumbnails for files that have no pixels of their own.
//!
//! Audio files and non-media files get a solid background with a simple
//! pictogram. When a TrueType font is configured a text label (usually the
//! upper-cased file extension) is drawn centered below it.

use super::backend::BackendError;
use ab_glyph::{FontVec, PxScale};
use image::{Rgb, RgbImage};
use imageproc::drawing::{
    draw_filled_circle_mut, draw_filled_rect_mut, draw_hollow_rect_mut, draw_line_segment_mut,
    draw_text_mut, text_size,
};
use imageproc::rect::Rect;
use std::path::Path;

/// Pictogram drawn in the middle of a placeholder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Glyph {
    Document,
    Audio,
}

pub struct PlaceholderStyle {
    pub background: Rgb<u8>,
    pub foreground: Rgb<u8>,
    pub font: Option<FontVec>,
    pub font_size: f32,
}

impl Default for PlaceholderStyle {
    fn default() -> Self {
        Self {
            background: Rgb([0x2b, 0x2b, 0x2b]),
            foreground: Rgb([0xf0, 0xf0, 0xf0]),
            font: None,
            font_size: 24.0,
        }
    }
}

/// Parse `#rrggbb`, `rrggbb` or `#rgb`.
pub fn parse_color(value: &str) -> Option<Rgb<u8>> {
    let hex = value.trim().trim_start_matches('#');
    if !hex.is_ascii() {
        return None;
    }
    let channel = |s: &str| u8::from_str_radix(s, 16).ok();
    match hex.len() {
        6 => Some(Rgb([
            channel(&hex[0..2])?,
            channel(&hex[2..4])?,
            channel(&hex[4..6])?,
        ])),
        3 => {
            let mut out = [0u8; 3];
            for (i, c) in hex.chars().enumerate() {
                let v = c.to_digit(16)? as u8;
                out[i] = v * 17;
            }
            Some(Rgb(out))
        }
        _ => None,
    }
}

pub fn load_font(path: &Path) -> Result<FontVec, BackendError> {
    let data = std::fs::read(path)?;
    FontVec::try_from_vec(data).map_err(|e| {
        BackendError::ProcessingFailed(format!("Invalid font {}: {}", path.display(), e))
    })
}

/// Render a `width` × `height` placeholder.
pub fn render_placeholder(
    width: u32,
    height: u32,
    glyph: Glyph,
    label: Option<&str>,
    style: &PlaceholderStyle,
) -> RgbImage {
    let mut img = RgbImage::from_pixel(width.max(1), height.max(1), style.background);
    let unit = (width.min(height) / 4).max(2);
    let cx = (width / 2) as i32;
    let cy = (height / 2) as i32 - if label.is_some() { (unit / 2) as i32 } else { 0 };

    match glyph {
        Glyph::Document => draw_document(&mut img, cx, cy, unit, style.foreground),
        Glyph::Audio => draw_note(&mut img, cx, cy, unit, style.foreground),
    }

    if let (Some(text), Some(font)) = (label, style.font.as_ref()) {
        let scale = PxScale::from(style.font_size);
        let (tw, th) = text_size(scale, font, text);
        let x = (width as i32 - tw as i32) / 2;
        let y = (cy + unit as i32 + 4).min(height as i32 - th as i32);
        draw_text_mut(&mut img, style.foreground, x, y, scale, font, text);
    }
    img
}

fn draw_document(img: &mut RgbImage, cx: i32, cy: i32, unit: u32, color: Rgb<u8>) {
    let w = unit * 3 / 2;
    let h = unit * 2;
    let left = cx - (w / 2) as i32;
    let top = cy - (h / 2) as i32;
    draw_hollow_rect_mut(img, Rect::at(left, top).of_size(w, h), color);

    let fold = (unit / 2) as f32;
    let right = (left + w as i32 - 1) as f32;
    draw_line_segment_mut(img, (right - fold, top as f32), (right, top as f32 + fold), color);

    let margin = (unit / 4) as i32;
    let mut y = top + (unit / 2) as i32 + margin;
    while y < top + h as i32 - margin {
        draw_line_segment_mut(
            img,
            ((left + margin) as f32, y as f32),
            ((left + w as i32 - margin) as f32, y as f32),
            color,
        );
        y += margin.max(2);
    }
}

fn draw_note(img: &mut RgbImage, cx: i32, cy: i32, unit: u32, color: Rgb<u8>) {
    let radius = (unit / 3).max(1) as i32;
    let head = (cx - radius, cy + unit as i32 / 2);
    draw_filled_circle_mut(img, head, radius, color);

    let stem_w = (unit / 8).max(1);
    let stem_x = head.0 + radius - stem_w as i32;
    let stem_top = cy - unit as i32;
    let stem_h = (head.1 - stem_top).max(1) as u32;
    draw_filled_rect_mut(img, Rect::at(stem_x, stem_top).of_size(stem_w, stem_h), color);
    draw_filled_rect_mut(
        img,
        Rect::at(stem_x, stem_top).of_size(radius as u32 * 2, stem_w * 2),
        color,
    );
}
