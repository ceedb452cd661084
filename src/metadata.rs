//! Metadata loading and resolution.
//!
//! A media file (or an album directory) can be described by up to three
//! independent sources, each read by a pure loader that never fails:
//!
//! | Loader | Source | Missing / corrupt |
//! |---|---|---|
//! | [`load_markdown`] | sidecar `photo.md`, or `index.md` for albums | empty record |
//! | [`load_iptc`] | IPTC-IIM block embedded in JPEG/TIFF | empty record, syntax errors logged |
//! | [`load_exif`] | EXIF block | empty record |
//!
//! ## Sidecar Markdown
//!
//! ```text
//! Title: Markdown title beats iptc
//! Thumbnail: dawn.jpg
//! Keywords: sea
//!     sunrise
//!
//! Body text, rendered to HTML as the description.
//! ```
//!
//! Front matter is a run of `Key: value` lines at the top of the file
//! (optionally fenced by `---`), keys are lower-cased, indented lines continue
//! the previous key, and the first blank line ends it.
//!
//! ## Precedence
//!
//! Each field is resolved independently, first non-empty value wins:
//!
//! - **Title**: Markdown `title` → IPTC Object Name → EXIF `XPTitle` → fallback
//! - **Description**: Markdown body → IPTC Caption → EXIF `ImageDescription`

use crate::imaging::iptc_parser;
use chrono::NaiveDateTime;
use exif::{Context, In, Reader, Tag, Value};
use maud::html;
use pulldown_cmark::{Parser, html as md_html};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub use iptc_parser::IptcInfo;

#[derive(Error, Debug)]
pub enum MetadataError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Target not found: {}", .0.display())]
    TargetNotFound(PathBuf),
    #[error("{} already exists, pass --overwrite to replace it", .0.display())]
    SidecarExists(PathBuf),
}

/// Resolve a field from sources in priority order: the first non-empty value.
pub fn resolve(sources: &[Option<&str>]) -> Option<String> {
    sources
        .iter()
        .filter_map(|opt| {
            opt.map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
        })
        .next()
}

// =============================================================================
// Markdown
// =============================================================================

/// Front matter and rendered body of a Markdown sidecar.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkdownMeta {
    pub title: Option<String>,
    /// Body rendered to HTML.
    pub description: String,
    /// Lower-cased keys; repeated keys and continuation lines add values.
    pub meta: BTreeMap<String, Vec<String>>,
}

impl MarkdownMeta {
    /// First value of a front-matter key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.meta
            .get(key)
            .and_then(|values| values.first())
            .map(String::as_str)
    }
}

/// Load a Markdown sidecar. A missing or unreadable file yields an empty record.
pub fn load_markdown(path: &Path) -> MarkdownMeta {
    match fs::read_to_string(path) {
        Ok(text) => parse_markdown(&text),
        Err(_) => MarkdownMeta::default(),
    }
}

/// Parse front matter and render the remaining body.
pub fn parse_markdown(text: &str) -> MarkdownMeta {
    let lines: Vec<&str> = text.lines().collect();
    let mut meta: BTreeMap<String, Vec<String>> = BTreeMap::new();
    let mut current: Option<String> = None;
    let mut idx = 0;

    let fenced = lines.first().is_some_and(|l| l.trim_end() == "---");
    if fenced {
        idx = 1;
    }

    while idx < lines.len() {
        let line = lines[idx];
        if fenced && matches!(line.trim_end(), "---" | "...") {
            idx += 1;
            break;
        }
        if line.trim().is_empty() {
            idx += 1;
            break;
        }
        if let Some((key, value)) = split_meta_line(line) {
            meta.entry(key.clone()).or_default().push(value);
            current = Some(key);
        } else if let (true, Some(key)) = (is_continuation(line), &current) {
            if let Some(values) = meta.get_mut(key) {
                values.push(line.trim().to_string());
            }
        } else {
            break;
        }
        idx += 1;
    }

    let body = lines[idx.min(lines.len())..].join("\n");
    let mut description = String::new();
    md_html::push_html(&mut description, Parser::new(&body));

    let title = meta
        .get("title")
        .and_then(|v| v.first())
        .filter(|t| !t.is_empty())
        .cloned();

    MarkdownMeta {
        title,
        description: description.trim().to_string(),
        meta,
    }
}

/// `Key: value` with up to three leading spaces; key is `[A-Za-z0-9_-]+`.
fn split_meta_line(line: &str) -> Option<(String, String)> {
    let trimmed = line.trim_start_matches(' ');
    if line.len() - trimmed.len() > 3 {
        return None;
    }
    let (key, value) = trimmed.split_once(':')?;
    let valid = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    valid.then(|| (key.to_lowercase(), value.trim().to_string()))
}

fn is_continuation(line: &str) -> bool {
    line.starts_with("    ") || line.starts_with('\t')
}

/// Sidecar Markdown path of a media file (`photo.jpg` → `photo.md`).
pub fn media_sidecar(src_path: &Path) -> PathBuf {
    src_path.with_extension("md")
}

/// Sidecar Markdown path of an album directory.
pub fn album_sidecar(album_dir: &Path) -> PathBuf {
    album_dir.join("index.md")
}

/// Write `Key: value` front matter for a directory (`index.md`) or a file
/// (`<stem>.md`). Returns the path written.
pub fn write_meta(
    target: &Path,
    pairs: &[(String, String)],
    overwrite: bool,
) -> Result<PathBuf, MetadataError> {
    let sidecar = if target.is_dir() {
        album_sidecar(target)
    } else if target.is_file() {
        media_sidecar(target)
    } else {
        return Err(MetadataError::TargetNotFound(target.to_path_buf()));
    };
    if sidecar.exists() && !overwrite {
        return Err(MetadataError::SidecarExists(sidecar));
    }

    let content: String = pairs
        .iter()
        .map(|(key, value)| format!("{}: {}\n", capitalize(key), value))
        .collect();
    fs::write(&sidecar, content)?;
    Ok(sidecar)
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

// =============================================================================
// EXIF
// =============================================================================

/// EXIF fields of one file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExifData {
    /// Every primary-image field, by tag name, as display strings.
    pub tags: BTreeMap<String, String>,
    /// `DateTimeOriginal`, falling back to `DateTime`.
    pub datetime: Option<NaiveDateTime>,
    pub orientation: Option<u16>,
    /// Windows `XPTitle`.
    pub title: Option<String>,
    /// `ImageDescription`.
    pub description: Option<String>,
}

const EXIF_DATETIME_FORMAT: &str = "%Y:%m:%d %H:%M:%S";
const TAG_XP_TITLE: Tag = Tag(Context::Tiff, 0x9C9B);

/// Load EXIF data. Files without EXIF, or with a corrupt block, yield an empty record.
pub fn load_exif(path: &Path) -> ExifData {
    let Ok(file) = fs::File::open(path) else {
        return ExifData::default();
    };
    match Reader::new().read_from_container(&mut BufReader::new(file)) {
        Ok(exif) => exif_data(&exif),
        Err(e) => {
            log::debug!("No EXIF data in {}: {e}", path.display());
            ExifData::default()
        }
    }
}

fn exif_data(exif: &exif::Exif) -> ExifData {
    let mut data = ExifData::default();

    for field in exif.fields().filter(|f| f.ifd_num == In::PRIMARY) {
        let value = ascii(&field.value)
            .unwrap_or_else(|| field.display_value().with_unit(exif).to_string());
        data.tags.insert(field.tag.to_string(), value);
    }

    data.datetime = [Tag::DateTimeOriginal, Tag::DateTime]
        .into_iter()
        .filter_map(|tag| exif.get_field(tag, In::PRIMARY))
        .filter_map(|field| ascii(&field.value))
        .find_map(|s| NaiveDateTime::parse_from_str(&s, EXIF_DATETIME_FORMAT).ok());

    data.orientation = exif
        .get_field(Tag::Orientation, In::PRIMARY)
        .and_then(|f| f.value.get_uint(0))
        .and_then(|v| u16::try_from(v).ok());

    data.description = exif
        .get_field(Tag::ImageDescription, In::PRIMARY)
        .and_then(|f| ascii(&f.value));

    data.title = exif
        .get_field(TAG_XP_TITLE, In::PRIMARY)
        .and_then(|f| match &f.value {
            Value::Byte(bytes) => utf16le(bytes),
            _ => None,
        });

    data
}

fn ascii(value: &Value) -> Option<String> {
    match value {
        Value::Ascii(parts) => parts
            .first()
            .map(|b| {
                String::from_utf8_lossy(b)
                    .trim_end_matches('\0')
                    .trim()
                    .to_string()
            })
            .filter(|s| !s.is_empty()),
        _ => None,
    }
}

fn utf16le(bytes: &[u8]) -> Option<String> {
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|c| u16::from_le_bytes([c[0], c[1]]))
        .take_while(|&u| u != 0)
        .collect();
    let s = String::from_utf16_lossy(&units).trim().to_string();
    (!s.is_empty()).then_some(s)
}

// =============================================================================
// IPTC and precedence
// =============================================================================

/// Load IPTC data. Malformed blocks are logged and suppressed.
pub fn load_iptc(path: &Path) -> IptcInfo {
    iptc_parser::read_iptc(path)
}

/// Title by precedence: Markdown → IPTC → EXIF → `fallback`.
pub fn resolve_title(
    markdown: &MarkdownMeta,
    iptc: &IptcInfo,
    exif: &ExifData,
    fallback: &str,
) -> String {
    resolve(&[
        markdown.title.as_deref(),
        iptc.title.as_deref(),
        exif.title.as_deref(),
    ])
    .unwrap_or_else(|| fallback.to_string())
}

/// Description HTML by precedence: Markdown → IPTC → EXIF.
///
/// Plain-text sources are HTML-escaped.
pub fn resolve_description(markdown: &MarkdownMeta, iptc: &IptcInfo, exif: &ExifData) -> String {
    if !markdown.description.trim().is_empty() {
        return markdown.description.clone();
    }
    resolve(&[iptc.description.as_deref(), exif.description.as_deref()])
        .map(|text| html! { (text) }.into_string())
        .unwrap_or_default()
}
