//! Shared test utilities for the gallerist test suite.
//!
//! Fixture builders for source trees: settings rooted in a temp directory,
//! tiny JPEGs written on the fly, and JPEGs carrying a hand-built Exif block
//! so metadata tests do not depend on binary fixtures.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = TempDir::new().unwrap();
//! let settings = settings_for(tmp.path());
//! write_jpeg(&settings.source.join("trip/a.jpg"), 40, 30);
//! write_jpeg_with_exif(
//!     &settings.source.join("trip/b.jpg"),
//!     40,
//!     30,
//!     &ExifFixture { orientation: Some(6), ..Default::default() },
//! );
//! ```

use crate::config::Settings;
use image::{ImageEncoder, RgbImage, codecs::jpeg::JpegEncoder};
use std::fs;
use std::path::Path;

// =========================================================================
// Settings
// =========================================================================

/// Settings with `root/src` (created) as source and `root/_build` as destination.
pub fn settings_for(root: &Path) -> Settings {
    let source = root.join("src");
    fs::create_dir_all(&source).unwrap();
    Settings {
        source,
        destination: root.join("_build"),
        ..Settings::default()
    }
}

// =========================================================================
// JPEG fixtures
// =========================================================================

/// Encode a `width` x `height` gradient as JPEG.
pub fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x * 255 / width.max(1)) as u8, (y * 255 / height.max(1)) as u8, 128])
    });
    let mut out = Vec::new();
    JpegEncoder::new_with_quality(&mut out, 90)
        .write_image(img.as_raw(), width, height, image::ExtendedColorType::Rgb8)
        .unwrap();
    out
}

/// Write a JPEG, creating parent directories.
pub fn write_jpeg(path: &Path, width: u32, height: u32) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, jpeg_bytes(width, height)).unwrap();
}

// =========================================================================
// Exif fixtures
// =========================================================================

/// IFD0 fields to embed. `None` leaves the tag out.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExifFixture<'a> {
    pub orientation: Option<u16>,
    /// `ImageDescription`
    pub description: Option<&'a str>,
    /// `DateTime`, in Exif's `YYYY:MM:DD HH:MM:SS` form.
    pub datetime: Option<&'a str>,
    /// Windows `XPTitle`, stored as UTF-16LE bytes.
    pub xp_title: Option<&'a str>,
}

const TYPE_BYTE: u16 = 1;
const TYPE_ASCII: u16 = 2;
const TYPE_SHORT: u16 = 3;

/// Build a complete APP1 segment (marker included) holding a little-endian
/// TIFF block with one IFD.
pub fn exif_app1(fixture: &ExifFixture) -> Vec<u8> {
    // (tag, type, count, raw value bytes), sorted by tag
    let mut entries: Vec<(u16, u16, u32, Vec<u8>)> = Vec::new();
    if let Some(description) = fixture.description {
        entries.push((0x010E, TYPE_ASCII, 0, ascii_bytes(description)));
    }
    if let Some(orientation) = fixture.orientation {
        entries.push((0x0112, TYPE_SHORT, 1, orientation.to_le_bytes().to_vec()));
    }
    if let Some(datetime) = fixture.datetime {
        entries.push((0x0132, TYPE_ASCII, 0, ascii_bytes(datetime)));
    }
    if let Some(title) = fixture.xp_title {
        let bytes: Vec<u8> = title
            .encode_utf16()
            .chain([0])
            .flat_map(u16::to_le_bytes)
            .collect();
        entries.push((0x9C9B, TYPE_BYTE, 0, bytes));
    }
    for entry in entries.iter_mut().filter(|e| e.1 != TYPE_SHORT) {
        entry.2 = entry.3.len() as u32;
    }

    let ifd_offset = 8u32;
    let ifd_len = 2 + entries.len() as u32 * 12 + 4;
    let mut data_offset = ifd_offset + ifd_len;

    let mut tiff = Vec::new();
    tiff.extend_from_slice(b"II");
    tiff.extend_from_slice(&42u16.to_le_bytes());
    tiff.extend_from_slice(&ifd_offset.to_le_bytes());
    tiff.extend_from_slice(&(entries.len() as u16).to_le_bytes());

    let mut data = Vec::new();
    for (tag, kind, count, value) in &entries {
        tiff.extend_from_slice(&tag.to_le_bytes());
        tiff.extend_from_slice(&kind.to_le_bytes());
        tiff.extend_from_slice(&count.to_le_bytes());
        if value.len() <= 4 {
            let mut inline = value.clone();
            inline.resize(4, 0);
            tiff.extend_from_slice(&inline);
        } else {
            tiff.extend_from_slice(&data_offset.to_le_bytes());
            data.extend_from_slice(value);
            if value.len() % 2 == 1 {
                data.push(0);
            }
            data_offset = ifd_offset + ifd_len + data.len() as u32;
        }
    }
    tiff.extend_from_slice(&0u32.to_le_bytes());
    tiff.extend_from_slice(&data);

    let mut segment = vec![0xFF, 0xE1];
    let length = (2 + 6 + tiff.len()) as u16;
    segment.extend_from_slice(&length.to_be_bytes());
    segment.extend_from_slice(b"Exif\0\0");
    segment.extend_from_slice(&tiff);
    segment
}

fn ascii_bytes(s: &str) -> Vec<u8> {
    let mut bytes = s.as_bytes().to_vec();
    bytes.push(0);
    bytes
}

/// Write a JPEG whose APP1 Exif block follows SOI, creating parent directories.
pub fn write_jpeg_with_exif(path: &Path, width: u32, height: u32, fixture: &ExifFixture) {
    let mut jpeg = jpeg_bytes(width, height);
    jpeg.splice(2..2, exif_app1(fixture));
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, jpeg).unwrap();
}
