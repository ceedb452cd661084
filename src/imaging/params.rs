//! Parameter types for image operations.
//!
//! These structs describe *what* to do, not *how* to do it. They are the
//! interface between the [`operations`](super::operations) planners and the
//! [`backend`](super::backend) that does the pixel work, so a mock backend
//! can stand in without changing any planning logic.
//!
//! ## Types
//!
//! - [`Quality`]: lossy encoding quality (1–100, default 85). Clamped on construction.
//! - [`Sharpening`]: unsharp-mask parameters for thumbnail crispness.
//! - [`ResizeParams`]: decode, orient and fit a source inside a box.
//! - [`SaveParams`]: encode an in-memory image to disk.
//! - [`ThumbnailParams`]: source, output, box, fit-or-crop, quality, sharpening.

use std::path::PathBuf;

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(pub u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(85)
    }
}

/// Sharpening parameters for unsharp mask.
///
/// - `sigma`: Standard deviation of the Gaussian blur (higher = more sharpening)
/// - `threshold`: Minimum brightness difference to sharpen (0 = sharpen all pixels)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sharpening {
    pub sigma: f32,
    pub threshold: i32,
}

impl Sharpening {
    /// Light sharpening suitable for thumbnails.
    pub fn light() -> Self {
        Self {
            sigma: 0.5,
            threshold: 0,
        }
    }
}

/// Decode `source`, apply the EXIF `orientation` (when set) and fit the
/// result inside `max_width` × `max_height` without upscaling.
#[derive(Debug, Clone, PartialEq)]
pub struct ResizeParams {
    pub source: PathBuf,
    pub max_width: u32,
    pub max_height: u32,
    pub orientation: Option<u16>,
}

/// Encode an image to `output`; the format follows the output extension.
#[derive(Debug, Clone, PartialEq)]
pub struct SaveParams {
    pub output: PathBuf,
    pub quality: Quality,
}

/// Parameters for a thumbnail.
///
/// With `fit` the source is scaled to fill `width` × `height` and
/// center-cropped to exactly that size; otherwise it is scaled to fit inside.
#[derive(Debug, Clone, PartialEq)]
pub struct ThumbnailParams {
    pub source: PathBuf,
    pub output: PathBuf,
    pub width: u32,
    pub height: u32,
    pub fit: bool,
    pub quality: Quality,
    pub sharpening: Option<Sharpening>,
    pub orientation: Option<u16>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quality_clamps_to_valid_range() {
        assert_eq!(Quality::new(0).value(), 1);
        assert_eq!(Quality::new(50).value(), 50);
        assert_eq!(Quality::new(150).value(), 100);
    }

    #[test]
    fn quality_default_matches_stock_jpeg_quality() {
        assert_eq!(Quality::default().value(), 85);
    }

    #[test]
    fn sharpening_light_values() {
        let s = Sharpening::light();
        assert_eq!(s.sigma, 0.5);
        assert_eq!(s.threshold, 0);
    }
}
