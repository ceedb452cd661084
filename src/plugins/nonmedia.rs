//! Files that are neither images, videos nor audio.
//!
//! With this plugin, unrecognized files (PDFs, archives, text...) become
//! [`MediaKind::NonMedia`] entries: copied to the destination and given a
//! synthetic thumbnail, a document pictogram with the upper-cased extension
//! when a font is configured.
//!
//! ```toml
//! [nonmedia_files_options]
//! ext_as_thumb = true
//! ignore_ext = [".md"]
//! thumb_bg_color = "#2b2b2b"
//! thumb_font = "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf"
//! thumb_font_color = "#f0f0f0"
//! thumb_font_size = 24
//! ```

use super::{Plugin, PluginError};
use crate::config::Settings;
use crate::imaging::placeholder::{Glyph, PlaceholderStyle, load_font, parse_color};
use crate::media::{Media, MediaKind};
use crate::naming::split_ext;
use crate::process::{MediaProcessor, PlaceholderProcessor};
use crate::signals::{Signal, SignalBus, SignalKind};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

pub const NAME: &str = "nonmedia_files";
const OPTIONS_KEY: &str = "nonmedia_files_options";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NonMediaOptions {
    /// Print the extension on the thumbnail.
    pub ext_as_thumb: bool,
    /// Extensions never turned into entries (sidecars, mostly).
    pub ignore_ext: Vec<String>,
    pub thumb_bg_color: String,
    /// TrueType font for the label; without one only the pictogram is drawn.
    pub thumb_font: Option<PathBuf>,
    pub thumb_font_color: String,
    pub thumb_font_size: f32,
}

impl Default for NonMediaOptions {
    fn default() -> Self {
        Self {
            ext_as_thumb: true,
            ignore_ext: vec![".md".to_string()],
            thumb_bg_color: "#2b2b2b".to_string(),
            thumb_font: None,
            thumb_font_color: "#f0f0f0".to_string(),
            thumb_font_size: 24.0,
        }
    }
}

impl NonMediaOptions {
    fn is_ignored(&self, filename: &str) -> bool {
        if filename.starts_with('.') {
            return true;
        }
        let (_, ext) = split_ext(filename);
        self.ignore_ext
            .iter()
            .any(|ignored| normalize_ext(ignored) == ext.to_lowercase())
    }

    fn style(&self) -> Result<PlaceholderStyle, PluginError> {
        let color = |value: &str| {
            parse_color(value).ok_or_else(|| PluginError::Failed {
                plugin: NAME.to_string(),
                message: format!("invalid color {value:?}"),
            })
        };
        let font = match &self.thumb_font {
            Some(path) => Some(load_font(path).map_err(|e| PluginError::Failed {
                plugin: NAME.to_string(),
                message: e.to_string(),
            })?),
            None => None,
        };
        Ok(PlaceholderStyle {
            background: color(&self.thumb_bg_color)?,
            foreground: color(&self.thumb_font_color)?,
            font,
            font_size: self.thumb_font_size,
        })
    }
}

fn normalize_ext(ext: &str) -> String {
    let ext = ext.trim().to_lowercase();
    if ext.starts_with('.') {
        ext
    } else {
        format!(".{ext}")
    }
}

pub struct NonMediaFiles;

impl Plugin for NonMediaFiles {
    fn name(&self) -> &'static str {
        NAME
    }

    fn register(&self, settings: &Settings, bus: &mut SignalBus) -> Result<(), PluginError> {
        let options: NonMediaOptions = settings.plugin_options(OPTIONS_KEY)?;
        let processor: Arc<dyn MediaProcessor> = Arc::new(PlaceholderProcessor {
            glyph: Glyph::Document,
            style: options.style()?,
            extension_label: options.ext_as_thumb,
        });

        bus.connect(SignalKind::AlbumFile, NAME, move |signal, settings| {
            if let Signal::AlbumFile {
                album_path,
                filename,
                media,
                ..
            } = signal
                && media.is_none()
                && !options.is_ignored(filename)
            {
                log::debug!("{filename} in {album_path} registered as non-media");
                **media = Some(Media::new(MediaKind::NonMedia, filename, album_path, settings));
            }
            Ok(())
        });

        bus.connect(SignalKind::ProcessFile, NAME, move |signal, _| {
            if let Signal::ProcessFile { media, processor: slot } = signal
                && media.kind == MediaKind::NonMedia
            {
                **slot = Some(Arc::clone(&processor));
            }
            Ok(())
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StringList;
    use crate::gallery::Gallery;
    use crate::pipeline::{Builder, Force};
    use crate::plugins::register_all;
    use crate::test_helpers::{settings_for, write_jpeg};
    use std::fs;
    use tempfile::TempDir;

    fn with_plugin(mut settings: Settings) -> Settings {
        settings.plugins = StringList::from_strs(&[NAME]);
        settings
    }

    #[test]
    fn options_default_and_override() {
        let defaults = NonMediaOptions::default();
        assert!(defaults.ext_as_thumb);
        assert_eq!(defaults.ignore_ext, vec![".md"]);

        let mut settings = Settings::default();
        let table: toml::Table = toml::from_str(
            "[nonmedia_files_options]\next_as_thumb = false\nignore_ext = [\"txt\", \".md\"]\n",
        )
        .unwrap();
        settings.extra = table;
        let options: NonMediaOptions = settings.plugin_options(OPTIONS_KEY).unwrap();
        assert!(!options.ext_as_thumb);
        assert!(options.is_ignored("notes.TXT"));
        assert!(options.is_ignored("a.md"));
        assert!(!options.is_ignored("a.pdf"));
    }

    #[test]
    fn dotfiles_are_ignored() {
        let options = NonMediaOptions::default();
        assert!(options.is_ignored(".DS_Store"));
        assert!(options.is_ignored(".nomedia"));
    }

    #[test]
    fn unrecognized_files_become_nonmedia() {
        let tmp = TempDir::new().unwrap();
        let settings = with_plugin(settings_for(tmp.path()));
        write_jpeg(&settings.source.join("a.jpg"), 10, 10);
        fs::write(settings.source.join("manual.pdf"), b"%PDF").unwrap();
        fs::write(settings.source.join("a.md"), "Title: A").unwrap();
        fs::create_dir_all(settings.source.join("docs")).unwrap();
        fs::write(settings.source.join("docs/readme.txt"), "hi").unwrap();

        let mut bus = SignalBus::new();
        register_all(&settings, &mut bus).unwrap();
        let gallery = Gallery::new(Arc::new(settings), &bus).unwrap();

        let root = gallery.root().unwrap();
        let kinds: Vec<(&str, MediaKind)> = root
            .medias
            .iter()
            .map(|m| (m.src_filename.as_str(), m.kind))
            .collect();
        assert_eq!(
            kinds,
            vec![("a.jpg", MediaKind::Image), ("manual.pdf", MediaKind::NonMedia)]
        );
        // A directory holding only other files still becomes an album.
        assert_eq!(gallery.get("docs").unwrap().medias.len(), 1);
    }

    #[test]
    fn nonmedia_files_are_copied_with_thumbnail() {
        let tmp = TempDir::new().unwrap();
        let settings = with_plugin(settings_for(tmp.path()));
        fs::write(settings.source.join("manual.pdf"), b"%PDF").unwrap();
        let dst = settings.destination.clone();

        let mut builder = Builder::new(settings).unwrap();
        let report = builder.run(&Force::none()).unwrap();

        assert_eq!(report.stats.get(MediaKind::NonMedia).processed, 1);
        assert_eq!(fs::read(dst.join("manual.pdf")).unwrap(), b"%PDF");
        let (w, h) = image::image_dimensions(dst.join("thumbnails/manual.jpg")).unwrap();
        assert_eq!((w, h), (200, 150));
    }

    #[test]
    fn invalid_color_fails_registration() {
        let mut settings = with_plugin(Settings::default());
        settings.extra = toml::from_str("[nonmedia_files_options]\nthumb_bg_color = \"teal\"\n").unwrap();
        let mut bus = SignalBus::new();
        assert!(matches!(
            register_all(&settings, &mut bus),
            Err(PluginError::Failed { .. })
        ));
    }
}
