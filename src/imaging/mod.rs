//! Image processing, pure Rust.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Identify** | `image::image_dimensions` |
//! | **IPTC metadata** | custom parser (JPEG APP13 + TIFF IFD) |
//! | **Resize** | orient + Lanczos3 fit, encoded in the source format |
//! | **Thumbnail** | fill + center crop (or fit) + `unsharpen` |
//! | **EXIF copy** | APP1 segment splice |
//! | **Placeholder** | `imageproc` drawing + optional `ab_glyph` label |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension math (unit testable)
//! - **Parameters**: Data structures describing image operations
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Operations**: Planners combining settings + backend

pub mod backend;
mod calculations;
pub mod exif_splice;
pub(crate) mod iptc_parser;
pub mod operations;
mod params;
pub mod placeholder;
pub mod rust_backend;

pub use backend::{BackendError, Dimensions, ImageBackend};
pub use calculations::oriented_dimensions;
pub use operations::{ResizeConfig, ThumbnailConfig, create_thumbnail, get_dimensions};
pub use params::{Quality, ResizeParams, SaveParams, Sharpening, ThumbnailParams};
pub use rust_backend::RustBackend;
