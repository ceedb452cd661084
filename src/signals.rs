//! Typed extension points fired at fixed moments of a build.
//!
//! A [`SignalBus`] is owned by the build session. Plugins connect handlers
//! per [`SignalKind`]; [`SignalBus::fire`] calls them synchronously, in
//! registration order, with a mutable payload. Handlers are free to change
//! what they receive (drop media from an album, swap a processor, edit pixels)
//! and the first handler error stops the dispatch and reaches the caller.
//!
//! | Signal | Fired | Payload |
//! |---|---|---|
//! | `AlbumFile` | per directory entry while an album lists its files | entry + `&mut Option<Media>` |
//! | `MediaInitialized` | per media, after construction | `&mut Media` |
//! | `AlbumInitialized` | per album, once its media list is built | `&mut Album` |
//! | `MediasSorted` / `AlbumsSorted` | after sorting an album | `&mut Album` |
//! | `GalleryInitialized` | once the album tree is complete | `&mut Gallery` |
//! | `ProcessFile` | per job, before dispatch | media + `&mut Option<processor>` |
//! | `ImageResized` | on the worker, before encoding | `&mut DynamicImage` + job |
//! | `BeforeRender` | per album page | album + `&mut PageContext` |
//! | `GalleryBuild` | after pages are written | `&mut Gallery` |

use crate::album::Album;
use crate::config::Settings;
use crate::gallery::Gallery;
use crate::media::Media;
use crate::plugins::PluginError;
use crate::process::{MediaJob, MediaProcessor};
use crate::writer::PageContext;
use image::DynamicImage;
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SignalKind {
    AlbumFile,
    MediaInitialized,
    AlbumInitialized,
    MediasSorted,
    AlbumsSorted,
    GalleryInitialized,
    ProcessFile,
    ImageResized,
    BeforeRender,
    GalleryBuild,
}

impl fmt::Display for SignalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SignalKind::AlbumFile => "album_file",
            SignalKind::MediaInitialized => "media_initialized",
            SignalKind::AlbumInitialized => "album_initialized",
            SignalKind::MediasSorted => "medias_sorted",
            SignalKind::AlbumsSorted => "albums_sorted",
            SignalKind::GalleryInitialized => "gallery_initialized",
            SignalKind::ProcessFile => "process_file",
            SignalKind::ImageResized => "image_resized",
            SignalKind::BeforeRender => "before_render",
            SignalKind::GalleryBuild => "gallery_build",
        })
    }
}

pub enum Signal<'a> {
    AlbumFile {
        album_path: &'a str,
        src_dir: &'a Path,
        filename: &'a str,
        /// `None` unless the settings recognized the extension. Handlers may
        /// create, replace or clear it.
        media: &'a mut Option<Media>,
    },
    MediaInitialized {
        media: &'a mut Media,
    },
    AlbumInitialized {
        album: &'a mut Album,
    },
    MediasSorted {
        album: &'a mut Album,
    },
    AlbumsSorted {
        album: &'a mut Album,
    },
    GalleryInitialized {
        gallery: &'a mut Gallery,
    },
    ProcessFile {
        media: &'a Media,
        processor: &'a mut Option<Arc<dyn MediaProcessor>>,
    },
    ImageResized {
        image: &'a mut DynamicImage,
        job: &'a MediaJob,
    },
    BeforeRender {
        album: &'a Album,
        context: &'a mut PageContext,
    },
    GalleryBuild {
        gallery: &'a mut Gallery,
    },
}

impl Signal<'_> {
    pub fn kind(&self) -> SignalKind {
        match self {
            Signal::AlbumFile { .. } => SignalKind::AlbumFile,
            Signal::MediaInitialized { .. } => SignalKind::MediaInitialized,
            Signal::AlbumInitialized { .. } => SignalKind::AlbumInitialized,
            Signal::MediasSorted { .. } => SignalKind::MediasSorted,
            Signal::AlbumsSorted { .. } => SignalKind::AlbumsSorted,
            Signal::GalleryInitialized { .. } => SignalKind::GalleryInitialized,
            Signal::ProcessFile { .. } => SignalKind::ProcessFile,
            Signal::ImageResized { .. } => SignalKind::ImageResized,
            Signal::BeforeRender { .. } => SignalKind::BeforeRender,
            Signal::GalleryBuild { .. } => SignalKind::GalleryBuild,
        }
    }
}

type Handler = Box<dyn Fn(&mut Signal<'_>, &Settings) -> Result<(), PluginError> + Send + Sync>;

/// Registry of handlers per signal.
///
/// `Sync`, so `ImageResized` can be fired from worker threads.
#[derive(Default)]
pub struct SignalBus {
    handlers: HashMap<SignalKind, Vec<(String, Handler)>>,
}

impl SignalBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for `kind` under `id`.
    ///
    /// Returns `false` (and keeps the first handler) when `id` is already
    /// connected to `kind`, so registering a plugin twice never double-fires.
    pub fn connect<F>(&mut self, kind: SignalKind, id: &str, handler: F) -> bool
    where
        F: Fn(&mut Signal<'_>, &Settings) -> Result<(), PluginError> + Send + Sync + 'static,
    {
        let handlers = self.handlers.entry(kind).or_default();
        if handlers.iter().any(|(existing, _)| existing == id) {
            log::debug!("{id} already connected to {kind}");
            return false;
        }
        handlers.push((id.to_string(), Box::new(handler)));
        true
    }

    /// Call every handler of the signal's kind, in registration order.
    pub fn fire(&self, signal: &mut Signal<'_>, settings: &Settings) -> Result<(), PluginError> {
        let kind = signal.kind();
        let Some(handlers) = self.handlers.get(&kind) else {
            return Ok(());
        };
        for (id, handler) in handlers {
            handler(&mut *signal, settings).inspect_err(|e| {
                log::error!("{kind} handler {id} failed: {e}");
            })?;
        }
        Ok(())
    }

    pub fn handler_count(&self, kind: SignalKind) -> usize {
        self.handlers.get(&kind).map_or(0, Vec::len)
    }

    pub fn is_connected(&self, kind: SignalKind) -> bool {
        self.handler_count(kind) > 0
    }
}
