//! `.nomedia` marker files.
//!
//! An empty `.nomedia` in a directory hides the whole album (and, since the
//! album is then dropped, everything below it). A non-empty one lists, one
//! per line, the media files and sub-directories to hide.

use super::{Plugin, PluginError};
use crate::album::Album;
use crate::config::Settings;
use crate::signals::{Signal, SignalBus, SignalKind};
use std::collections::HashSet;
use std::fs;
use std::io;

pub const NAME: &str = "nomedia";
const MARKER: &str = ".nomedia";

pub struct NoMedia;

impl Plugin for NoMedia {
    fn name(&self) -> &'static str {
        NAME
    }

    fn register(&self, _settings: &Settings, bus: &mut SignalBus) -> Result<(), PluginError> {
        bus.connect(SignalKind::AlbumInitialized, NAME, |signal, _| {
            if let Signal::AlbumInitialized { album } = signal {
                apply_marker(album)?;
            }
            Ok(())
        });
        Ok(())
    }
}

fn apply_marker(album: &mut Album) -> Result<(), PluginError> {
    let marker = album.src_path.join(MARKER);
    let content = match fs::read_to_string(&marker) {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(e.into()),
    };

    let hidden: HashSet<&str> = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();

    if hidden.is_empty() {
        log::info!("Ignoring album {} ({MARKER})", album.path);
        album.medias.clear();
        album.subdirs.clear();
        return Ok(());
    }

    album.medias.retain(|media| {
        let keep = !hidden.contains(media.src_filename.as_str());
        if !keep {
            log::info!("Ignoring {} in {} ({MARKER})", media.src_filename, album.path);
        }
        keep
    });
    album
        .subdirs
        .retain(|name| !hidden.contains(name.as_str()));
    Ok(())
}
