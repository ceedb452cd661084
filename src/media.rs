//! One source file and its derived build artifacts.
//!
//! ```text
//! source/album/clip.ogv          → _build/album/clip.webm
//!                                  _build/album/thumbnails/clip.jpg
//! source/album/dawn.jpg          → _build/album/dawn.jpg
//!                                  _build/album/thumbnails/dawn.jpg
//!                                  _build/album/original/dawn.jpg  (keep_orig)
//! ```
//!
//! Constructing a [`Media`] only computes paths. Everything that reads the
//! file (sidecar Markdown, EXIF/IPTC, pixel dimensions) is loaded on first
//! access and memoized in a [`OnceCell`]: asking twice never reads twice.
//! Caching plugins can pre-fill those cells with the `restore_*` setters.

use crate::config::Settings;
use crate::imaging::{Dimensions, ImageBackend, RustBackend, oriented_dimensions};
use crate::metadata::{
    self, ExifData, IptcInfo, MarkdownMeta, load_exif, load_iptc, load_markdown, media_sidecar,
};
use crate::naming::split_ext;
use crate::process::Status;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::cell::OnceCell;
use std::fmt;
use std::path::PathBuf;
use std::time::SystemTime;

/// Video containers browsers play natively.
const HTML5_VIDEO_EXTENSIONS: &[&str] = &[".mp4", ".webm", ".ogv"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
    Audio,
    NonMedia,
}

impl MediaKind {
    pub const ALL: [MediaKind; 4] = [
        MediaKind::Image,
        MediaKind::Video,
        MediaKind::Audio,
        MediaKind::NonMedia,
    ];
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MediaKind::Image => "image",
            MediaKind::Video => "video",
            MediaKind::Audio => "audio",
            MediaKind::NonMedia => "nonmedia",
        })
    }
}

/// Metadata embedded in the file itself. Only images carry any.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FileMetadata {
    pub exif: ExifData,
    pub iptc: IptcInfo,
}

#[derive(Debug)]
pub struct Media {
    pub kind: MediaKind,
    pub src_filename: String,
    pub dst_filename: String,
    /// Owning album (`"."` for the root).
    pub album_path: String,
    pub src_path: PathBuf,
    pub dst_path: PathBuf,
    /// Thumbnail path relative to the album's destination directory.
    pub thumb_name: String,
    pub thumb_path: PathBuf,
    /// Original copy relative to the album's destination directory (`keep_orig`).
    pub big: Option<String>,
    /// Position in the case-insensitive directory listing.
    pub listing_index: usize,
    /// Output dimensions, known once processed.
    pub dimensions: Option<Dimensions>,
    pub status: Option<Status>,
    markdown: OnceCell<MarkdownMeta>,
    file_metadata: OnceCell<FileMetadata>,
    input_size: OnceCell<Option<Dimensions>>,
}

impl Media {
    pub fn new(kind: MediaKind, filename: &str, album_path: &str, settings: &Settings) -> Self {
        let dst_filename = destination_filename(kind, filename, settings);
        let thumb_name = settings.thumb_name(&dst_filename, kind);
        let src_dir = settings.source_dir(album_path);
        let dst_dir = settings.destination_dir(album_path);
        let big = (kind == MediaKind::Image && settings.keep_orig)
            .then(|| format!("{}/{}", settings.orig_dir, filename));

        Self {
            kind,
            src_filename: filename.to_string(),
            src_path: src_dir.join(filename),
            dst_path: dst_dir.join(&dst_filename),
            thumb_path: dst_dir.join(&thumb_name),
            dst_filename,
            album_path: album_path.to_string(),
            thumb_name,
            big,
            listing_index: 0,
            dimensions: None,
            status: None,
            markdown: OnceCell::new(),
            file_metadata: OnceCell::new(),
            input_size: OnceCell::new(),
        }
    }

    /// Filename without extension.
    pub fn stem(&self) -> &str {
        split_ext(&self.src_filename).0
    }

    /// Sidecar Markdown (`photo.md` next to `photo.jpg`).
    pub fn markdown(&self) -> &MarkdownMeta {
        self.markdown
            .get_or_init(|| load_markdown(&media_sidecar(&self.src_path)))
    }

    pub fn file_metadata(&self) -> &FileMetadata {
        self.file_metadata.get_or_init(|| match self.kind {
            MediaKind::Image => FileMetadata {
                exif: load_exif(&self.src_path),
                iptc: load_iptc(&self.src_path),
            },
            _ => FileMetadata::default(),
        })
    }

    pub fn exif(&self) -> &ExifData {
        &self.file_metadata().exif
    }

    pub fn iptc(&self) -> &IptcInfo {
        &self.file_metadata().iptc
    }

    /// Source pixel size as displayed (EXIF orientation applied). Images only.
    pub fn input_size(&self) -> Option<Dimensions> {
        *self.input_size.get_or_init(|| {
            if self.kind != MediaKind::Image {
                return None;
            }
            match RustBackend::new().identify(&self.src_path) {
                Ok(dims) => {
                    let (width, height) = oriented_dimensions(
                        (dims.width, dims.height),
                        self.exif().orientation,
                    );
                    Some(Dimensions { width, height })
                }
                Err(e) => {
                    log::debug!("{e}");
                    None
                }
            }
        })
    }

    pub fn title(&self) -> String {
        metadata::resolve_title(self.markdown(), self.iptc(), self.exif(), self.stem())
    }

    /// Description as HTML.
    pub fn description(&self) -> String {
        metadata::resolve_description(self.markdown(), self.iptc(), self.exif())
    }

    /// Capture date from EXIF.
    pub fn date(&self) -> Option<NaiveDateTime> {
        self.exif().datetime
    }

    /// Source modification time.
    pub fn mtime(&self) -> Option<SystemTime> {
        std::fs::metadata(&self.src_path)
            .and_then(|m| m.modified())
            .ok()
    }

    /// Modification time of the sidecar Markdown; `None` when there is none.
    pub fn sidecar_mtime(&self) -> Option<SystemTime> {
        std::fs::metadata(media_sidecar(&self.src_path))
            .and_then(|m| m.modified())
            .ok()
    }

    /// Link target relative to the album page: the kept original when
    /// there is one, the processed file otherwise.
    pub fn url(&self) -> &str {
        self.big.as_deref().unwrap_or(&self.dst_filename)
    }

    // ---- memoized values, for caching plugins ----

    pub fn cached_markdown(&self) -> Option<&MarkdownMeta> {
        self.markdown.get()
    }

    pub fn cached_file_metadata(&self) -> Option<&FileMetadata> {
        self.file_metadata.get()
    }

    pub fn cached_input_size(&self) -> Option<Option<Dimensions>> {
        self.input_size.get().copied()
    }

    /// Pre-fill the Markdown cell. Returns `false` if it was already loaded.
    pub fn restore_markdown(&self, markdown: MarkdownMeta) -> bool {
        self.markdown.set(markdown).is_ok()
    }

    pub fn restore_file_metadata(&self, file_metadata: FileMetadata) -> bool {
        self.file_metadata.set(file_metadata).is_ok()
    }

    pub fn restore_input_size(&self, size: Option<Dimensions>) -> bool {
        self.input_size.set(size).is_ok()
    }
}

/// Destination filename: videos are renamed to the output container unless
/// the original is kept and already plays in browsers.
fn destination_filename(kind: MediaKind, filename: &str, settings: &Settings) -> String {
    if kind != MediaKind::Video {
        return filename.to_string();
    }
    let (stem, ext) = split_ext(filename);
    if keeps_original_video(ext, settings) {
        filename.to_string()
    } else {
        format!("{}.{}", stem, settings.video_format)
    }
}

/// Whether a video with extension `ext` is copied instead of transcoded.
pub fn keeps_original_video(ext: &str, settings: &Settings) -> bool {
    settings.use_orig
        && !settings.video_always_convert
        && HTML5_VIDEO_EXTENSIONS.contains(&ext.to_lowercase().as_str())
}
