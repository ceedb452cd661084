//! Pure Rust image processing backend.
//!
//! Everything is statically linked into the binary.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, TIFF, WebP, GIF) | `image` crate (pure Rust decoders) |
//! | Orientation | `rotate90`/`rotate180`/`rotate270` + `fliph`/`flipv` |
//! | Resize | `DynamicImage::resize_exact` with `Lanczos3` filter |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder` with quality |
//! | Encode → other | `DynamicImage::save_with_format` |
//! | Thumbnail crop | `resize_exact` + `crop_imm` |
//! | Sharpening | `image::imageops::unsharpen` |

use super::backend::{BackendError, Dimensions, ImageBackend};
use super::calculations::{calculate_fill_dimensions, calculate_fit_dimensions, center_crop_origin};
use super::params::{ResizeParams, SaveParams, ThumbnailParams};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, ImageReader};
use std::fs;
use std::io::BufWriter;
use std::path::Path;

/// Pure Rust backend using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Load and decode an image from disk.
fn load_image(path: &Path) -> Result<DynamicImage, BackendError> {
    ImageReader::open(path)
        .map_err(BackendError::Io)?
        .with_guessed_format()
        .map_err(BackendError::Io)?
        .decode()
        .map_err(|e| {
            BackendError::ProcessingFailed(format!("Failed to decode {}: {}", path.display(), e))
        })
}

/// Apply an EXIF orientation value so the image displays upright.
pub fn apply_orientation(img: DynamicImage, orientation: Option<u16>) -> DynamicImage {
    match orientation {
        Some(2) => img.fliph(),
        Some(3) => img.rotate180(),
        Some(4) => img.flipv(),
        Some(5) => img.rotate90().fliph(),
        Some(6) => img.rotate90(),
        Some(7) => img.rotate270().fliph(),
        Some(8) => img.rotate270(),
        _ => img,
    }
}

/// Encode by output extension. JPEG gets the configured quality; alpha is
/// dropped since JPEG cannot carry it.
fn save_image(img: &DynamicImage, path: &Path, quality: u32) -> Result<(), BackendError> {
    let format = ImageFormat::from_path(path).map_err(|e| {
        BackendError::ProcessingFailed(format!("Unsupported output {}: {}", path.display(), e))
    })?;

    if format == ImageFormat::Jpeg {
        let writer = BufWriter::new(fs::File::create(path)?);
        let quality = quality.clamp(1, 100) as u8;
        JpegEncoder::new_with_quality(writer, quality)
            .encode_image(&img.to_rgb8())
            .map_err(|e| {
                BackendError::ProcessingFailed(format!("JPEG encode {}: {}", path.display(), e))
            })
    } else {
        img.save_with_format(path, format).map_err(|e| {
            BackendError::ProcessingFailed(format!("Encode {}: {}", path.display(), e))
        })
    }
}

impl ImageBackend for RustBackend {
    fn identify(&self, path: &Path) -> Result<Dimensions, BackendError> {
        let (width, height) = image::image_dimensions(path).map_err(|e| {
            BackendError::ProcessingFailed(format!("Failed to identify {}: {}", path.display(), e))
        })?;
        Ok(Dimensions { width, height })
    }

    fn resize(&self, params: &ResizeParams) -> Result<DynamicImage, BackendError> {
        let img = apply_orientation(load_image(&params.source)?, params.orientation);
        let (w, h) = calculate_fit_dimensions(
            (img.width(), img.height()),
            (params.max_width, params.max_height),
        );
        if (w, h) == (img.width(), img.height()) {
            return Ok(img);
        }
        Ok(img.resize_exact(w, h, FilterType::Lanczos3))
    }

    fn save(&self, image: &DynamicImage, params: &SaveParams) -> Result<(), BackendError> {
        save_image(image, &params.output, params.quality.value())
    }

    fn thumbnail(&self, params: &ThumbnailParams) -> Result<(), BackendError> {
        let img = apply_orientation(load_image(&params.source)?, params.orientation);
        let source = (img.width(), img.height());
        let target = (params.width, params.height);

        let sized = if params.fit {
            let (fill_w, fill_h) = calculate_fill_dimensions(source, target);
            let filled = img.resize_exact(fill_w, fill_h, FilterType::Lanczos3);
            let (x, y) = center_crop_origin((fill_w, fill_h), target);
            filled.crop_imm(x, y, params.width, params.height)
        } else {
            let (w, h) = calculate_fit_dimensions(source, target);
            img.resize_exact(w, h, FilterType::Lanczos3)
        };

        let final_img = match params.sharpening {
            Some(sharpening) => DynamicImage::from(image::imageops::unsharpen(
                &sized,
                sharpening.sigma,
                sharpening.threshold,
            )),
            None => sized,
        };

        save_image(&final_img, &params.output, params.quality.value())
    }
}
