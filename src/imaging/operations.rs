//! High-level image operations.
//!
//! These functions turn settings into backend parameters and run them.
//! Planning is pure so it can be tested without touching pixels.

use super::backend::{BackendError, ImageBackend};
use super::params::{Quality, ResizeParams, SaveParams, Sharpening, ThumbnailParams};
use crate::config::Settings;
use std::path::Path;

/// Result type for image operations.
pub type Result<T> = std::result::Result<T, BackendError>;

/// Get image dimensions using the backend.
pub fn get_dimensions(backend: &dyn ImageBackend, path: &Path) -> Result<(u32, u32)> {
    let dims = backend.identify(path)?;
    Ok((dims.width, dims.height))
}

/// Configuration for resized images.
#[derive(Debug, Clone)]
pub struct ResizeConfig {
    pub max_size: (u32, u32),
    pub quality: Quality,
    pub autorotate: bool,
}

impl ResizeConfig {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            max_size: settings.img_size.as_tuple(),
            quality: Quality::new(settings.jpg_options.quality),
            autorotate: settings.autorotate_images,
        }
    }
}

/// Configuration for thumbnail generation.
#[derive(Debug, Clone)]
pub struct ThumbnailConfig {
    pub size: (u32, u32),
    pub fit: bool,
    pub quality: Quality,
    pub sharpening: Option<Sharpening>,
    pub autorotate: bool,
}

impl ThumbnailConfig {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            size: settings.thumb_size.as_tuple(),
            fit: settings.thumb_fit,
            quality: Quality::new(settings.jpg_options.quality),
            sharpening: Some(Sharpening::light()),
            autorotate: settings.autorotate_images,
        }
    }
}

/// Plan a resize without executing it.
pub fn plan_resize(source: &Path, orientation: Option<u16>, config: &ResizeConfig) -> ResizeParams {
    ResizeParams {
        source: source.to_path_buf(),
        max_width: config.max_size.0,
        max_height: config.max_size.1,
        orientation: orientation.filter(|_| config.autorotate),
    }
}

pub fn plan_save(output: &Path, config: &ResizeConfig) -> SaveParams {
    SaveParams {
        output: output.to_path_buf(),
        quality: config.quality,
    }
}

/// Plan a thumbnail operation without executing it.
pub fn plan_thumbnail(
    source: &Path,
    output: &Path,
    orientation: Option<u16>,
    config: &ThumbnailConfig,
) -> ThumbnailParams {
    ThumbnailParams {
        source: source.to_path_buf(),
        output: output.to_path_buf(),
        width: config.size.0,
        height: config.size.1,
        fit: config.fit,
        quality: config.quality,
        sharpening: config.sharpening,
        orientation: orientation.filter(|_| config.autorotate),
    }
}

/// Create a thumbnail image.
pub fn create_thumbnail(
    backend: &dyn ImageBackend,
    source: &Path,
    output: &Path,
    orientation: Option<u16>,
    config: &ThumbnailConfig,
) -> Result<()> {
    let params = plan_thumbnail(source, output, orientation, config);
    backend.thumbnail(&params)
}
