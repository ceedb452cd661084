//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait defines the four operations every backend must
//! support: identify, resize, save, and thumbnail. Resizing returns the
//! decoded pixels instead of writing them so the pipeline can hand the image
//! to plugins before it is encoded.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend).

use super::params::{ResizeParams, SaveParams, ThumbnailParams};
use image::DynamicImage;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),
}

/// Result of an identify operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn is_landscape(self) -> bool {
        self.width > self.height
    }
}

/// Trait for image processing backends.
///
/// `Send + Sync` so one backend instance serves every rayon worker.
pub trait ImageBackend: Send + Sync {
    /// Get image dimensions without decoding pixels.
    fn identify(&self, path: &Path) -> Result<Dimensions, BackendError>;

    /// Decode, orient and fit an image inside a box.
    fn resize(&self, params: &ResizeParams) -> Result<DynamicImage, BackendError>;

    /// Encode an image to disk.
    fn save(&self, image: &DynamicImage, params: &SaveParams) -> Result<(), BackendError>;

    /// Execute a thumbnail operation (fill + center crop, or fit).
    fn thumbnail(&self, params: &ThumbnailParams) -> Result<(), BackendError>;
}
