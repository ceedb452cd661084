//! One source directory: its media, its sub-album names, title and sorting.
//!
//! Albums are identified by their path relative to the source root, with
//! `/` separators and `"."` for the root itself. Sub-albums are stored by
//! name; the [`Gallery`](crate::gallery::Gallery) resolves them to albums.
//!
//! ## Sorting
//!
//! Sort attributes are resolved per item, the first attribute of the list
//! that yields a value wins:
//!
//! | Media | Album |
//! |---|---|
//! | `filename`, `title`, `date`, `mod_date` | `name`, `title`, `path`, `mod_date` |
//! | `meta.<key>`, `exif.<tag>` | `meta.<key>` |
//!
//! Items without a value sort first. Ties fall back to listing order (media)
//! or name (albums) so the order never depends on a previous sort, and a
//! reversed sort is exactly the reverse of the ascending one.

use crate::config::Settings;
use crate::media::{Media, MediaKind};
use crate::metadata::{MarkdownMeta, album_sidecar, load_markdown};
use crate::naming::{NaturalKey, natural_key, title_from_dirname};
use crate::plugins::PluginError;
use crate::signals::{Signal, SignalBus};
use chrono::{DateTime, Local, NaiveDateTime};
use std::cell::OnceCell;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

#[derive(Debug)]
pub struct Album {
    /// Relative path, `"."` for the root.
    pub path: String,
    pub name: String,
    pub src_path: PathBuf,
    pub dst_path: PathBuf,
    /// Sub-album names, in display order.
    pub subdirs: Vec<String>,
    pub medias: Vec<Media>,
    pub title: String,
    /// Description HTML from `index.md`.
    pub description: String,
    pub meta: BTreeMap<String, Vec<String>>,
    thumbnail: OnceCell<Option<String>>,
}

impl Album {
    /// Build an album from its (already filtered, listing-ordered) entries.
    ///
    /// Fires `AlbumFile` per file and `MediaInitialized` per media.
    /// `AlbumInitialized` is left to [`initialize`](Self::initialize), so an
    /// album that turns out empty is never announced.
    pub fn new(
        path: &str,
        settings: &Settings,
        subdirs: Vec<String>,
        filenames: &[String],
        bus: &SignalBus,
    ) -> Result<Self, PluginError> {
        let src_path = settings.source_dir(path);
        let dst_path = settings.destination_dir(path);
        let name = album_name(path, &src_path);
        let markdown = load_markdown(&album_sidecar(&src_path));

        let mut album = Self {
            title: album_title(path, &name, &markdown, settings),
            description: markdown.description,
            meta: markdown.meta,
            path: path.to_string(),
            name,
            src_path,
            dst_path,
            subdirs,
            medias: Vec::new(),
            thumbnail: OnceCell::new(),
        };

        for (listing_index, filename) in filenames.iter().enumerate() {
            let mut media = settings
                .media_kind(filename)
                .map(|kind| Media::new(kind, filename, path, settings));
            bus.fire(
                &mut Signal::AlbumFile {
                    album_path: path,
                    src_dir: &album.src_path,
                    filename,
                    media: &mut media,
                },
                settings,
            )?;
            let Some(mut media) = media else {
                continue;
            };
            media.listing_index = listing_index;
            bus.fire(&mut Signal::MediaInitialized { media: &mut media }, settings)?;
            album.medias.push(media);
        }

        Ok(album)
    }

    /// Fire `AlbumInitialized`; handlers may still edit or empty the album.
    pub fn initialize(&mut self, settings: &Settings, bus: &SignalBus) -> Result<(), PluginError> {
        bus.fire(&mut Signal::AlbumInitialized { album: self }, settings)
    }

    /// No media and no sub-albums.
    pub fn is_empty(&self) -> bool {
        self.medias.is_empty() && self.subdirs.is_empty()
    }

    pub fn is_root(&self) -> bool {
        self.path == "."
    }

    /// Path of a sub-album of this album.
    pub fn child_path(&self, name: &str) -> String {
        if self.is_root() {
            name.to_string()
        } else {
            format!("{}/{}", self.path, name)
        }
    }

    /// Parent album path, `None` for the root.
    pub fn parent_path(&self) -> Option<&str> {
        if self.is_root() {
            None
        } else {
            Some(self.path.rsplit_once('/').map_or(".", |(parent, _)| parent))
        }
    }

    /// Nesting depth (root is 0).
    pub fn depth(&self) -> usize {
        if self.is_root() {
            0
        } else {
            self.path.split('/').count()
        }
    }

    pub fn first_meta(&self, key: &str) -> Option<&str> {
        self.meta
            .get(key)
            .and_then(|v| v.first())
            .map(String::as_str)
    }

    pub fn count(&self, kind: MediaKind) -> usize {
        self.medias.iter().filter(|m| m.kind == kind).count()
    }

    pub fn mtime(&self) -> Option<SystemTime> {
        std::fs::metadata(&self.src_path)
            .and_then(|m| m.modified())
            .ok()
    }

    /// Thumbnail chosen among this album's own media, relative to its
    /// destination directory. Memoized.
    ///
    /// Order: `Thumbnail:` in `index.md` naming a media, then the first
    /// landscape image in listing order, the first image, the first media.
    pub fn own_thumbnail(&self) -> Option<&str> {
        self.thumbnail
            .get_or_init(|| self.pick_thumbnail())
            .as_deref()
    }

    fn pick_thumbnail(&self) -> Option<String> {
        if let Some(wanted) = self.first_meta("thumbnail") {
            match self.medias.iter().find(|m| m.src_filename == wanted) {
                Some(media) => return Some(media.thumb_name.clone()),
                None => log::warn!(
                    "Thumbnail {wanted} of album {} is not one of its media",
                    self.path
                ),
            }
        }

        let mut listed: Vec<&Media> = self.medias.iter().collect();
        listed.sort_by_key(|m| m.listing_index);
        let images = || listed.iter().filter(|m| m.kind == MediaKind::Image);

        images()
            .find(|m| m.input_size().is_some_and(|d| d.is_landscape()))
            .or_else(|| images().next())
            .or_else(|| listed.first())
            .map(|m| m.thumb_name.clone())
    }

    /// Media sort override from `index.md` (`Sort: -date`).
    fn meta_sort(&self) -> Option<(String, bool)> {
        let value = self.first_meta("sort")?.trim();
        match value.strip_prefix('-') {
            Some(attr) => Some((attr.to_string(), true)),
            None => Some((value.to_string(), false)),
        }
    }

    /// Sort media by the first attribute of `attrs` that resolves.
    ///
    /// A `Sort:` key in `index.md` replaces `attrs` and `reverse`.
    pub fn sort_medias(&mut self, attrs: &[String], reverse: bool) {
        let (attrs, reverse) = match self.meta_sort() {
            Some((attr, rev)) => (vec![attr], rev),
            None => (attrs.to_vec(), reverse),
        };
        let medias = std::mem::take(&mut self.medias);
        let keys: Vec<_> = medias
            .iter()
            .map(|m| (media_sort_value(m, &attrs), m.listing_index))
            .collect();
        self.medias = apply_order(medias, &sorted_order(&keys, reverse));
    }

    /// Reorder sub-albums with precomputed keys (one per entry of `subdirs`).
    pub fn sort_subdirs(&mut self, keys: &[Option<SortValue>], reverse: bool) {
        let subdirs = std::mem::take(&mut self.subdirs);
        let keys: Vec<_> = subdirs
            .iter()
            .enumerate()
            .map(|(i, name)| (keys.get(i).cloned().flatten(), natural_key(name), name.clone()))
            .collect();
        self.subdirs = apply_order(subdirs, &sorted_order(&keys, reverse));
    }
}

fn album_name(path: &str, src_path: &Path) -> String {
    if path == "." {
        src_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    } else {
        path.rsplit('/').next().unwrap_or(path).to_string()
    }
}

/// `index.md` title, then the configured gallery title (root only), then
/// the directory name.
fn album_title(path: &str, name: &str, markdown: &MarkdownMeta, settings: &Settings) -> String {
    if let Some(title) = &markdown.title {
        return title.clone();
    }
    if path == "." && !settings.title.is_empty() {
        return settings.title.clone();
    }
    title_from_dirname(name)
}

/// A comparable attribute value.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum SortValue {
    Date(NaiveDateTime),
    Text(NaturalKey),
}

impl SortValue {
    fn text(s: &str) -> Self {
        SortValue::Text(natural_key(s))
    }
}

fn system_time_value(time: SystemTime) -> SortValue {
    SortValue::Date(DateTime::<Local>::from(time).naive_local())
}

/// Value of one media attribute, first match of `attrs`.
pub fn media_sort_value(media: &Media, attrs: &[String]) -> Option<SortValue> {
    attrs.iter().find_map(|attr| match attr.as_str() {
        "filename" => Some(SortValue::text(&media.src_filename)),
        "title" => Some(SortValue::text(&media.title())),
        "date" => media
            .date()
            .map(SortValue::Date)
            .or_else(|| media.mtime().map(system_time_value)),
        "mod_date" => media.mtime().map(system_time_value),
        other => {
            if let Some(key) = other.strip_prefix("meta.") {
                media.markdown().get(key).map(SortValue::text)
            } else if let Some(tag) = other.strip_prefix("exif.") {
                media.exif().tags.get(tag).map(|v| SortValue::text(v))
            } else {
                log::warn!("Unknown media sort attribute: {other}");
                None
            }
        }
    })
}

/// Value of one album attribute, first match of `attrs`.
pub fn album_sort_value(album: &Album, attrs: &[String]) -> Option<SortValue> {
    attrs.iter().find_map(|attr| match attr.as_str() {
        "name" => Some(SortValue::text(&album.name)),
        "title" => Some(SortValue::text(&album.title)),
        "path" => Some(SortValue::text(&album.path)),
        "mod_date" => album.mtime().map(system_time_value),
        other => match other.strip_prefix("meta.") {
            Some(key) => album.first_meta(key).map(SortValue::text),
            None => {
                log::warn!("Unknown album sort attribute: {other}");
                None
            }
        },
    })
}

/// Indices of `keys` in ascending order, reversed as a whole when asked.
fn sorted_order<K: Ord>(keys: &[K], reverse: bool) -> Vec<usize> {
    let mut order: Vec<usize> = (0..keys.len()).collect();
    order.sort_by(|&a, &b| keys[a].cmp(&keys[b]));
    if reverse {
        order.reverse();
    }
    order
}

fn apply_order<T>(items: Vec<T>, order: &[usize]) -> Vec<T> {
    let mut slots: Vec<Option<T>> = items.into_iter().map(Some).collect();
    order.iter().filter_map(|&i| slots[i].take()).collect()
}
