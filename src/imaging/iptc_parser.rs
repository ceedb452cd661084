//! Minimal IPTC-IIM reader for JPEG and TIFF files.
//!
//! Record 2 datasets read:
//!
//! | Dataset | Name | Field |
//! |---|---|---|
//! | 2:05 | Object Name | `title` |
//! | 2:25 | Keywords (repeatable) | `keywords` |
//! | 2:105 | Headline | `headline` |
//! | 2:120 | Caption-Abstract | `description` |
//!
//! JPEG files carry IIM data in an APP13 segment (Photoshop `8BIM` resource
//! `0x0404`); TIFF files in IFD tag 33723, or tag 34377 holding `8BIM` blocks.
//!
//! A dataset whose declared length runs past the end of the block is a
//! syntax error: [`read_iptc`] logs it and returns what was parsed before it.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// IPTC fields of one file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IptcInfo {
    pub title: Option<String>,
    pub headline: Option<String>,
    pub description: Option<String>,
    pub keywords: Vec<String>,
}

impl IptcInfo {
    fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.headline.is_none()
            && self.description.is_none()
            && self.keywords.is_empty()
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum IptcError {
    #[error("dataset 2:{dataset} at offset {offset} declares {length} bytes past the end of the block")]
    Truncated {
        dataset: u8,
        offset: usize,
        length: usize,
    },
}

/// Read IPTC fields from a JPEG or TIFF file.
///
/// Missing files, other formats and files without IPTC data yield an empty
/// record. Malformed IIM blocks are logged and the fields decoded before the
/// error are kept.
pub fn read_iptc(path: &Path) -> IptcInfo {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();
    if !matches!(ext.as_str(), "jpg" | "jpeg" | "tif" | "tiff") {
        return IptcInfo::default();
    }
    let Ok(bytes) = std::fs::read(path) else {
        return IptcInfo::default();
    };

    let block = match ext.as_str() {
        "jpg" | "jpeg" => find_jpeg_iim(&bytes),
        _ => find_tiff_iim(&bytes),
    };
    let Some(block) = block else {
        return IptcInfo::default();
    };

    let (info, error) = parse_iim(block);
    if let Some(err) = error {
        log::warn!("Malformed IPTC data in {}: {err}", path.display());
    } else if info.is_empty() {
        log::debug!("IPTC block without known fields in {}", path.display());
    }
    info
}

// ---------------------------------------------------------------------------
// IIM datasets
// ---------------------------------------------------------------------------

/// Decode IIM datasets (`0x1C record dataset len_hi len_lo data...`).
///
/// Returns the fields decoded so far plus the error that stopped decoding,
/// if any. Bytes between datasets that are not a tag marker are skipped.
fn parse_iim(data: &[u8]) -> (IptcInfo, Option<IptcError>) {
    let mut info = IptcInfo::default();
    let mut pos = 0;

    while pos + 5 <= data.len() {
        if data[pos] != 0x1C {
            pos += 1;
            continue;
        }
        let record = data[pos + 1];
        let dataset = data[pos + 2];
        let length = u16::from_be_bytes([data[pos + 3], data[pos + 4]]) as usize;
        let start = pos + 5;

        if start + length > data.len() {
            return (
                info,
                Some(IptcError::Truncated {
                    dataset,
                    offset: pos,
                    length,
                }),
            );
        }

        if record == 2 {
            let value = String::from_utf8_lossy(&data[start..start + length])
                .trim()
                .to_string();
            if !value.is_empty() {
                match dataset {
                    5 => info.title = Some(value),
                    25 => info.keywords.push(value),
                    105 => info.headline = Some(value),
                    120 => info.description = Some(value),
                    _ => {}
                }
            }
        }
        pos = start + length;
    }

    (info, None)
}

// ---------------------------------------------------------------------------
// JPEG
// ---------------------------------------------------------------------------

const PHOTOSHOP_HEADER: &[u8] = b"Photoshop 3.0\0";
const BIM_MARKER: &[u8] = b"8BIM";
const IPTC_RESOURCE_ID: u16 = 0x0404;

/// Find the IIM block inside a JPEG's APP13 segments.
fn find_jpeg_iim(data: &[u8]) -> Option<&[u8]> {
    if !data.starts_with(&[0xFF, 0xD8]) {
        return None;
    }
    let mut pos = 2;
    while pos + 4 <= data.len() {
        if data[pos] != 0xFF {
            return None;
        }
        let marker = data[pos + 1];
        match marker {
            // Fill bytes before a marker.
            0xFF => {
                pos += 1;
                continue;
            }
            // Start of scan: no more metadata segments.
            0xDA | 0xD9 => return None,
            0x01 | 0xD0..=0xD7 => {
                pos += 2;
                continue;
            }
            _ => {}
        }
        let seg_len = u16::from_be_bytes([data[pos + 2], data[pos + 3]]) as usize;
        let seg_end = (pos + 2 + seg_len).min(data.len());
        if marker == 0xED && seg_len >= 2 {
            if let Some(iim) = find_8bim_iim(&data[pos + 4..seg_end]) {
                return Some(iim);
            }
        }
        pos = pos + 2 + seg_len.max(2);
    }
    None
}

/// Find resource `0x0404` in a sequence of Photoshop `8BIM` resource blocks.
///
/// Each block: `8BIM` + id (u16) + padded Pascal name + length (u32) + data,
/// with the data padded to an even length.
fn find_8bim_iim(segment: &[u8]) -> Option<&[u8]> {
    let data = segment.strip_prefix(PHOTOSHOP_HEADER).unwrap_or(segment);
    let mut pos = 0;

    while pos + 12 <= data.len() {
        if &data[pos..pos + 4] != BIM_MARKER {
            pos += 1;
            continue;
        }
        let resource_id = u16::from_be_bytes([data[pos + 4], data[pos + 5]]);
        let name_len = data[pos + 6] as usize;
        let name_total = 1 + name_len + ((1 + name_len) % 2);
        let len_at = pos + 6 + name_total;
        let len_bytes: [u8; 4] = data.get(len_at..len_at + 4)?.try_into().ok()?;
        let res_len = u32::from_be_bytes(len_bytes) as usize;
        let body = len_at + 4;
        let body_end = body.checked_add(res_len)?;
        if body_end > data.len() {
            return None;
        }
        if resource_id == IPTC_RESOURCE_ID {
            return Some(&data[body..body_end]);
        }
        pos = body_end + (res_len % 2);
    }
    None
}

// ---------------------------------------------------------------------------
// TIFF
// ---------------------------------------------------------------------------

const TAG_IPTC_NAA: u16 = 33723;
const TAG_PHOTOSHOP: u16 = 34377;

/// Byte-order aware reader over a TIFF file.
/// Minimal endian-aware reader over a TIFF header and its IFDs.
pub(crate) struct Tiff<'a> {
    data: &'a [u8],
    pub(crate) big_endian: bool,
}

impl<'a> Tiff<'a> {
    pub(crate) fn new(data: &'a [u8]) -> Option<Self> {
        let big_endian = match data.get(0..2)? {
            b"MM" => true,
            b"II" => false,
            _ => return None,
        };
        let tiff = Self { data, big_endian };
        (tiff.u16_at(2)? == 42).then_some(tiff)
    }

    pub(crate) fn u16_at(&self, offset: usize) -> Option<u16> {
        let b: [u8; 2] = self.data.get(offset..offset + 2)?.try_into().ok()?;
        Some(if self.big_endian {
            u16::from_be_bytes(b)
        } else {
            u16::from_le_bytes(b)
        })
    }

    pub(crate) fn u32_at(&self, offset: usize) -> Option<u32> {
        let b: [u8; 4] = self.data.get(offset..offset + 4)?.try_into().ok()?;
        Some(if self.big_endian {
            u32::from_be_bytes(b)
        } else {
            u32::from_le_bytes(b)
        })
    }
}

fn tiff_type_size(typ: u16) -> usize {
    match typ {
        3 | 8 => 2,
        4 | 9 | 11 => 4,
        5 | 10 | 12 => 8,
        _ => 1,
    }
}

/// Find the IIM block in a TIFF file, preferring tag 33723 over 34377.
fn find_tiff_iim(data: &[u8]) -> Option<&[u8]> {
    let tiff = Tiff::new(data)?;
    let mut ifd = tiff.u32_at(4)? as usize;
    let mut photoshop = None;
    // Guard against IFD chains that loop back on themselves.
    let mut visited = 0;

    while ifd != 0 && visited < 64 {
        visited += 1;
        let count = tiff.u16_at(ifd)? as usize;
        for i in 0..count {
            let entry = ifd + 2 + i * 12;
            let tag = tiff.u16_at(entry)?;
            if tag != TAG_IPTC_NAA && tag != TAG_PHOTOSHOP {
                continue;
            }
            let len = tiff.u32_at(entry + 4)? as usize * tiff_type_size(tiff.u16_at(entry + 2)?);
            let offset = tiff.u32_at(entry + 8)? as usize;
            let Some(value) = data.get(offset..offset.saturating_add(len)) else {
                continue;
            };
            if tag == TAG_IPTC_NAA {
                return Some(value);
            }
            photoshop = photoshop.or_else(|| find_8bim_iim(value));
        }
        ifd = tiff.u32_at(ifd + 2 + count * 12)? as usize;
    }
    photoshop
}
