//! Copy the EXIF block of a source JPEG into a processed one.
//!
//! The encoder writes no metadata, so after resizing the raw APP1 `Exif`
//! segment of the source is spliced into the output right after SOI (and
//! JFIF APP0, when present). When the pixels were already rotated upright the
//! IFD0 `Orientation` tag is rewritten to `1`, otherwise viewers would rotate
//! the image a second time.

use super::backend::BackendError;
use super::iptc_parser::Tiff;
use std::fs;
use std::path::Path;

const SOI: [u8; 2] = [0xFF, 0xD8];
const APP0: u8 = 0xE0;
const APP1: u8 = 0xE1;
const EXIF_HEADER: &[u8] = b"Exif\0\0";
const TAG_ORIENTATION: u16 = 0x0112;

/// A marker segment: `(marker, start, end)` with `end` exclusive.
type Segment = (u8, usize, usize);

/// Header segments up to (not including) the start of scan.
fn segments(jpeg: &[u8]) -> Vec<Segment> {
    let mut out = Vec::new();
    if jpeg.get(0..2) != Some(&SOI[..]) {
        return out;
    }
    let mut pos = 2;
    while pos + 1 < jpeg.len() {
        if jpeg[pos] != 0xFF {
            break;
        }
        let marker = jpeg[pos + 1];
        match marker {
            // Fill byte
            0xFF => {
                pos += 1;
                continue;
            }
            // Standalone markers carry no length
            0x01 | 0xD0..=0xD7 => {
                pos += 2;
                continue;
            }
            0xDA | 0xD9 => break,
            _ => {}
        }
        let Some(len) = jpeg
            .get(pos + 2..pos + 4)
            .map(|b| u16::from_be_bytes([b[0], b[1]]) as usize)
        else {
            break;
        };
        let end = pos + 2 + len;
        if len < 2 || end > jpeg.len() {
            break;
        }
        out.push((marker, pos, end));
        pos = end;
    }
    out
}

fn is_exif(jpeg: &[u8], (marker, start, end): Segment) -> bool {
    marker == APP1 && jpeg.get(start + 4..end).is_some_and(|d| d.starts_with(EXIF_HEADER))
}

/// The complete APP1 Exif segment (marker included) of a JPEG, if any.
pub fn extract_exif_segment(jpeg: &[u8]) -> Option<&[u8]> {
    segments(jpeg)
        .into_iter()
        .find(|&seg| is_exif(jpeg, seg))
        .map(|(_, start, end)| &jpeg[start..end])
}

/// Rebuild `jpeg` with `segment` as its only Exif block.
///
/// Returns `None` when `jpeg` is not a JPEG stream.
pub fn splice_exif_segment(jpeg: &[u8], segment: &[u8]) -> Option<Vec<u8>> {
    let segs = segments(jpeg);
    if jpeg.get(0..2) != Some(&SOI[..]) {
        return None;
    }

    let insert_at = segs
        .iter()
        .take_while(|(marker, _, _)| *marker == APP0)
        .last()
        .map_or(2, |&(_, _, end)| end);

    let mut out = Vec::with_capacity(jpeg.len() + segment.len());
    out.extend_from_slice(&jpeg[..insert_at]);
    out.extend_from_slice(segment);

    let mut pos = insert_at;
    for seg in segs.into_iter().filter(|&(_, start, _)| start >= insert_at) {
        if is_exif(jpeg, seg) {
            out.extend_from_slice(&jpeg[pos..seg.1]);
            pos = seg.2;
        }
    }
    out.extend_from_slice(&jpeg[pos..]);
    Some(out)
}

/// Rewrite IFD0 `Orientation` to 1 inside an APP1 Exif segment.
///
/// Returns whether the tag was found.
pub fn reset_orientation(segment: &mut [u8]) -> bool {
    let tiff_start = 4 + EXIF_HEADER.len();
    let Some(value_offset) = segment
        .get(tiff_start..)
        .and_then(find_orientation_value)
        .map(|(offset, big_endian)| (tiff_start + offset, big_endian))
    else {
        return false;
    };

    let (offset, big_endian) = value_offset;
    let bytes = if big_endian {
        1u16.to_be_bytes()
    } else {
        1u16.to_le_bytes()
    };
    match segment.get_mut(offset..offset + 2) {
        Some(slot) => {
            slot.copy_from_slice(&bytes);
            true
        }
        None => false,
    }
}

/// Offset of the Orientation value within the TIFF block, and its byte order.
fn find_orientation_value(tiff_data: &[u8]) -> Option<(usize, bool)> {
    let tiff = Tiff::new(tiff_data)?;
    let ifd = tiff.u32_at(4)? as usize;
    let count = tiff.u16_at(ifd)? as usize;
    (0..count)
        .map(|i| ifd + 2 + i * 12)
        .find(|&entry| tiff.u16_at(entry) == Some(TAG_ORIENTATION))
        .map(|entry| (entry + 8, tiff.big_endian))
}

/// Copy the Exif block of `source` into the JPEG at `output`.
///
/// Returns `Ok(false)` when either file is not a JPEG or the source has no
/// Exif block; the output is left untouched in that case.
pub fn copy_exif(source: &Path, output: &Path, orientation_applied: bool) -> Result<bool, BackendError> {
    let src = fs::read(source)?;
    let Some(segment) = extract_exif_segment(&src) else {
        return Ok(false);
    };
    let mut segment = segment.to_vec();
    if orientation_applied {
        reset_orientation(&mut segment);
    }

    let dst = fs::read(output)?;
    match splice_exif_segment(&dst, &segment) {
        Some(spliced) => {
            fs::write(output, spliced)?;
            Ok(true)
        }
        None => Ok(false),
    }
}
