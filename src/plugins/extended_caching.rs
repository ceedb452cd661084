//! Metadata cache between builds.
//!
//! Reading EXIF, IPTC, sidecar Markdown and image headers for every file is
//! the slow part of walking a large, unchanged gallery. This plugin stores
//! those values in `<destination>/.metadata_cache.json` at the end of a build
//! and pre-fills the media's memoized values on the next one, for every
//! file whose modification time did not change. The sidecar Markdown has its
//! own modification time, so editing `a.md` alone reloads just the Markdown.
//!
//! ```json
//! {
//!   "version": 2,
//!   "entries": {
//!     "2019/paris/a.jpg": {
//!       "mtime": { "secs_since_epoch": 1700000000, "nanos_since_epoch": 0 },
//!       "sidecar_mtime": null,
//!       "markdown": { "title": null, "description": "", "meta": {} },
//!       "file_metadata": { "exif": { ... }, "iptc": { ... } },
//!       "input_size": { "width": 4000, "height": 3000 }
//!     }
//!   }
//! }
//! ```
//!
//! The file is private to this plugin: a different version or an unreadable
//! file is logged and replaced at the end of the build.

use super::{Plugin, PluginError};
use crate::config::Settings;
use crate::gallery::Gallery;
use crate::imaging::Dimensions;
use crate::media::{FileMetadata, Media, MediaKind};
use crate::metadata::MarkdownMeta;
use crate::process::media_key;
use crate::signals::{Signal, SignalBus, SignalKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

pub const NAME: &str = "extended_caching";
pub const CACHE_FILENAME: &str = ".metadata_cache.json";
const CACHE_VERSION: u32 = 2;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub mtime: SystemTime,
    /// Sidecar Markdown modification time, `None` when there was no sidecar.
    #[serde(default)]
    pub sidecar_mtime: Option<SystemTime>,
    pub markdown: MarkdownMeta,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_metadata: Option<FileMetadata>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_size: Option<Dimensions>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataCache {
    pub version: u32,
    pub entries: BTreeMap<String, CacheEntry>,
}

impl Default for MetadataCache {
    fn default() -> Self {
        Self {
            version: CACHE_VERSION,
            entries: BTreeMap::new(),
        }
    }
}

pub fn cache_path(settings: &Settings) -> PathBuf {
    settings.destination.join(CACHE_FILENAME)
}

impl MetadataCache {
    /// Load the cache; a missing file is an empty cache, an unreadable one
    /// is logged and treated as empty.
    pub fn load(path: &Path) -> Self {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Self::default(),
            Err(e) => {
                log::warn!("Could not read metadata cache {}: {e}", path.display());
                return Self::default();
            }
        };
        match serde_json::from_str::<Self>(&content) {
            Ok(cache) if cache.version == CACHE_VERSION => {
                log::debug!("Loaded {} cached entries", cache.entries.len());
                cache
            }
            Ok(cache) => {
                log::warn!(
                    "Metadata cache version {} is not {CACHE_VERSION}, starting empty",
                    cache.version
                );
                Self::default()
            }
            Err(e) => {
                log::warn!("Corrupt metadata cache {}, starting empty: {e}", path.display());
                Self::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), PluginError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string(self)?)?;
        Ok(())
    }

    /// Snapshot every media of the gallery, loading values not read yet.
    pub fn from_gallery(gallery: &Gallery) -> Self {
        let entries = gallery
            .albums
            .iter()
            .flat_map(|album| &album.medias)
            .filter_map(|media| {
                let entry = CacheEntry {
                    mtime: media.mtime()?,
                    sidecar_mtime: media.sidecar_mtime(),
                    markdown: media.markdown().clone(),
                    file_metadata: (media.kind == MediaKind::Image)
                        .then(|| media.file_metadata().clone()),
                    input_size: media.input_size(),
                };
                Some((media_key(&media.album_path, &media.src_filename), entry))
            })
            .collect();
        Self {
            version: CACHE_VERSION,
            entries,
        }
    }

    /// Pre-fill `media` when its source did not change. Returns whether the
    /// entry was used.
    pub fn restore(&self, media: &Media) -> bool {
        let key = media_key(&media.album_path, &media.src_filename);
        let Some(entry) = self.entries.get(&key) else {
            return false;
        };
        if media.mtime() != Some(entry.mtime) {
            log::debug!("{key} changed since last build");
            return false;
        }
        if media.sidecar_mtime() == entry.sidecar_mtime {
            media.restore_markdown(entry.markdown.clone());
        } else {
            log::debug!("{key}: sidecar changed since last build");
        }
        if let Some(file_metadata) = &entry.file_metadata {
            media.restore_file_metadata(file_metadata.clone());
        }
        if media.kind == MediaKind::Image {
            media.restore_input_size(entry.input_size);
        }
        true
    }
}

pub struct ExtendedCaching;

impl Plugin for ExtendedCaching {
    fn name(&self) -> &'static str {
        NAME
    }

    fn register(&self, settings: &Settings, bus: &mut SignalBus) -> Result<(), PluginError> {
        let cache = MetadataCache::load(&cache_path(settings));

        bus.connect(SignalKind::AlbumInitialized, NAME, move |signal, _| {
            if let Signal::AlbumInitialized { album } = signal {
                let restored = album.medias.iter().filter(|m| cache.restore(m)).count();
                if restored > 0 {
                    log::debug!("Restored {restored} cached entries in {}", album.path);
                }
            }
            Ok(())
        });

        bus.connect(SignalKind::GalleryBuild, NAME, |signal, settings| {
            if let Signal::GalleryBuild { gallery } = signal {
                let cache = MetadataCache::from_gallery(gallery);
                cache.save(&cache_path(settings))?;
                log::info!("Saved metadata of {} media", cache.entries.len());
            }
            Ok(())
        });
        Ok(())
    }
}
