//! Build settings.
//!
//! A build is driven by one [`Settings`] record, resolved once per invocation
//! and read-only afterwards. Three layers are merged, lowest priority first:
//!
//! ```text
//! stock defaults  <  gallerist.toml  <  command-line overrides
//! ```
//!
//! Defaults and the config file are merged as raw TOML tables (see
//! [`merge_toml`]) and then deserialized; overrides are applied on the typed
//! record. Relative `source`, `destination` and `theme` paths found in a
//! config file are taken relative to that file's directory.
//!
//! ## Lenient values
//!
//! Config files written by hand tend to mix forms, so the loader accepts:
//!
//! ```toml
//! img_size = "640x480"             # or [640, 480]
//! thumb_size = [150, 200]          # swapped to 200x150 with a warning
//! jpg_options = { quality = "85" } # numeric strings become integers
//! img_extensions = ".jpg, .png"    # or [".jpg", ".png"]
//! ```
//!
//! ## Unknown keys
//!
//! Keys the core does not recognise are kept verbatim in [`Settings::extra`]
//! so plugins can read their own tables with [`Settings::plugin_options`].

use crate::media::MediaKind;
use crate::naming::split_ext;
use serde::de::{self, DeserializeOwned, Deserializer, SeqAccess, Visitor};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::fs;
use std::ops::Deref;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

/// Config file looked up in the working directory when none is given.
pub const DEFAULT_CONFIG_FILE: &str = "gallerist.toml";

/// Theme name that selects the stylesheet compiled into the binary.
pub const BUILTIN_THEME: &str = "default";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    TomlSer(#[from] toml::ser::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
    #[error("Config file not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("Config file already exists: {}", .0.display())]
    AlreadyExists(PathBuf),
    #[error("Theme not found: {}", .0.display())]
    ThemeNotFound(PathBuf),
    #[error(
        "Destination {} is inside the source directory {}",
        dst.display(),
        src.display()
    )]
    DestinationInsideSource { src: PathBuf, dst: PathBuf },
}

// =============================================================================
// Value types
// =============================================================================

/// A bounding box, always stored with the larger side first once normalized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn as_tuple(self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Returns the size with the larger value first, and whether a swap happened.
    fn normalized(self) -> (Self, bool) {
        if self.height > self.width {
            (Self::new(self.height, self.width), true)
        } else {
            (self, false)
        }
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

impl Serialize for Size {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        [self.width, self.height].serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Size {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct SizeVisitor;

        impl<'de> Visitor<'de> for SizeVisitor {
            type Value = Size;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a size like \"640x480\" or [640, 480]")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Size, E> {
                let (w, h) = v
                    .split_once(['x', 'X'])
                    .ok_or_else(|| E::custom(format!("invalid size {v:?}")))?;
                let parse = |s: &str| {
                    s.trim()
                        .parse::<u32>()
                        .map_err(|_| E::custom(format!("invalid size {v:?}")))
                };
                Ok(Size::new(parse(w)?, parse(h)?))
            }

            fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Size, A::Error> {
                let w: LenientU32 = seq
                    .next_element()?
                    .ok_or_else(|| de::Error::invalid_length(0, &self))?;
                let h: LenientU32 = seq
                    .next_element()?
                    .ok_or_else(|| de::Error::invalid_length(1, &self))?;
                if seq.next_element::<LenientU32>()?.is_some() {
                    return Err(de::Error::invalid_length(3, &self));
                }
                Ok(Size::new(w.0, h.0))
            }
        }

        deserializer.deserialize_any(SizeVisitor)
    }
}

/// A list of strings that may be written as an array or a comma-joined string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StringList(pub Vec<String>);

impl StringList {
    pub fn from_strs(items: &[&str]) -> Self {
        Self(items.iter().map(|s| s.to_string()).collect())
    }
}

impl Deref for StringList {
    type Target = [String];

    fn deref(&self) -> &[String] {
        &self.0
    }
}

impl Serialize for StringList {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for StringList {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ListVisitor;

        impl<'de> Visitor<'de> for ListVisitor {
            type Value = StringList;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a list of strings or a comma-separated string")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<StringList, E> {
                Ok(StringList(
                    v.split(',')
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .map(String::from)
                        .collect(),
                ))
            }

            fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<StringList, A::Error> {
                let mut items = Vec::new();
                while let Some(item) = seq.next_element::<String>()? {
                    items.push(item);
                }
                Ok(StringList(items))
            }
        }

        deserializer.deserialize_any(ListVisitor)
    }
}

/// Integer that also accepts its decimal string form.
struct LenientU32(u32);

impl<'de> Deserialize<'de> for LenientU32 {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct IntVisitor;

        impl Visitor<'_> for IntVisitor {
            type Value = LenientU32;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a non-negative integer")
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<LenientU32, E> {
                u32::try_from(v)
                    .map(LenientU32)
                    .map_err(|_| E::custom(format!("{v} is out of range")))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<LenientU32, E> {
                u32::try_from(v)
                    .map(LenientU32)
                    .map_err(|_| E::custom(format!("{v} is out of range")))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<LenientU32, E> {
                v.trim()
                    .parse()
                    .map(LenientU32)
                    .map_err(|_| E::custom(format!("{v:?} is not an integer")))
            }
        }

        deserializer.deserialize_any(IntVisitor)
    }
}

fn lenient_u32<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    LenientU32::deserialize(deserializer).map(|v| v.0)
}

fn lenient_opt_usize<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<usize>, D::Error> {
    LenientU32::deserialize(deserializer).map(|v| Some(v.0 as usize))
}

fn lenient_seconds<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    struct SecondsVisitor;

    impl Visitor<'_> for SecondsVisitor {
        type Value = f64;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a number of seconds")
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<f64, E> {
            Ok(v as f64)
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<f64, E> {
            Ok(v as f64)
        }

        fn visit_f64<E: de::Error>(self, v: f64) -> Result<f64, E> {
            Ok(v)
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<f64, E> {
            v.trim()
                .parse()
                .map_err(|_| E::custom(format!("{v:?} is not a number")))
        }
    }

    deserializer.deserialize_any(SecondsVisitor)
}

/// JPEG encoder options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct JpgOptions {
    /// Encoding quality (1-100).
    #[serde(deserialize_with = "lenient_u32")]
    pub quality: u32,
    pub progressive: bool,
}

impl Default for JpgOptions {
    fn default() -> Self {
        Self {
            quality: 85,
            progressive: true,
        }
    }
}

// =============================================================================
// Settings
// =============================================================================

/// The resolved configuration of one build.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Source directory holding the albums.
    pub source: PathBuf,
    /// Output directory; must not be inside `source`.
    pub destination: PathBuf,
    /// `"default"` for the built-in look, or a theme directory.
    pub theme: String,
    /// Gallery title, used for the root album when set.
    pub title: String,

    /// Box that processed images are fitted into.
    pub img_size: Size,
    pub thumb_size: Size,
    pub video_size: Size,
    pub thumb_dir: String,
    pub thumb_prefix: String,
    pub thumb_suffix: String,
    /// Crop thumbnails to exactly `thumb_size` instead of fitting inside it.
    pub thumb_fit: bool,
    /// Offset into a video, in seconds, of the frame used as its thumbnail.
    #[serde(deserialize_with = "lenient_seconds")]
    pub thumb_video_delay: f64,
    pub make_thumbs: bool,

    pub orig_dir: String,
    pub keep_orig: bool,
    pub use_orig: bool,
    /// Symlink instead of copying when a file is passed through unchanged.
    pub orig_link: bool,
    pub autorotate_images: bool,
    pub copy_exif_data: bool,
    pub jpg_options: JpgOptions,

    pub img_extensions: StringList,
    pub video_extensions: StringList,
    pub audio_extensions: StringList,
    /// Output container for videos: `webm` or `mp4`.
    pub video_format: String,
    pub video_always_convert: bool,
    pub video_converter: String,
    pub webm_options: StringList,
    pub mp4_options: StringList,

    /// Glob patterns matched against album paths and directory names.
    pub ignore_directories: StringList,
    /// Glob patterns matched against file paths (relative to source) and names.
    pub ignore_files: StringList,
    pub albums_sort_attr: StringList,
    pub albums_sort_reverse: bool,
    pub medias_sort_attr: StringList,
    pub medias_sort_reverse: bool,

    /// Built-in plugins to enable, by name.
    pub plugins: StringList,
    pub output_filename: String,
    pub index_in_url: bool,
    /// `strftime`-style format used to display media dates.
    pub datetime_format: String,
    pub write_html: bool,
    /// Maximum parallel workers. Absent means one per CPU core.
    #[serde(
        deserialize_with = "lenient_opt_usize",
        skip_serializing_if = "Option::is_none"
    )]
    pub max_processes: Option<usize>,
    /// Strict mode: the first processing failure aborts the build.
    pub debug: bool,

    /// Keys the core does not recognise, kept for plugins.
    #[serde(flatten)]
    pub extra: toml::Table,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            source: PathBuf::new(),
            destination: PathBuf::from("_build"),
            theme: BUILTIN_THEME.to_string(),
            title: String::new(),
            img_size: Size::new(640, 480),
            thumb_size: Size::new(200, 150),
            video_size: Size::new(480, 360),
            thumb_dir: "thumbnails".to_string(),
            thumb_prefix: String::new(),
            thumb_suffix: String::new(),
            thumb_fit: true,
            thumb_video_delay: 0.0,
            make_thumbs: true,
            orig_dir: "original".to_string(),
            keep_orig: false,
            use_orig: false,
            orig_link: false,
            autorotate_images: true,
            copy_exif_data: false,
            jpg_options: JpgOptions::default(),
            img_extensions: StringList::from_strs(&[
                ".jpg", ".jpeg", ".png", ".gif", ".tif", ".tiff", ".webp",
            ]),
            video_extensions: StringList::from_strs(&[
                ".3gp", ".avi", ".mkv", ".mov", ".mp4", ".ogv", ".webm",
            ]),
            audio_extensions: StringList::from_strs(&[".m4a", ".mp3", ".oga", ".ogg", ".wav"]),
            video_format: "webm".to_string(),
            video_always_convert: false,
            video_converter: "ffmpeg".to_string(),
            webm_options: StringList::from_strs(&[
                "-crf", "10", "-b:v", "1.6M", "-qmin", "4", "-qmax", "63",
            ]),
            mp4_options: StringList::from_strs(&["-crf", "23", "-strict", "-2"]),
            ignore_directories: StringList::default(),
            ignore_files: StringList::default(),
            albums_sort_attr: StringList::from_strs(&["name"]),
            albums_sort_reverse: false,
            medias_sort_attr: StringList::from_strs(&["filename"]),
            medias_sort_reverse: false,
            plugins: StringList::default(),
            output_filename: "index.html".to_string(),
            index_in_url: false,
            datetime_format: "%c".to_string(),
            write_html: true,
            max_processes: None,
            debug: false,
            extra: toml::Table::new(),
        }
    }
}

impl Settings {
    /// Validate structural invariants: value ranges, the source/destination
    /// relationship and the theme.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=100).contains(&self.jpg_options.quality) {
            return Err(ConfigError::Validation(
                "jpg_options.quality must be 1-100".into(),
            ));
        }
        for (key, size) in [
            ("img_size", self.img_size),
            ("thumb_size", self.thumb_size),
            ("video_size", self.video_size),
        ] {
            if size.width == 0 || size.height == 0 {
                return Err(ConfigError::Validation(format!(
                    "{key} values must be non-zero"
                )));
            }
        }
        if !matches!(self.video_format.as_str(), "webm" | "mp4") {
            return Err(ConfigError::Validation(format!(
                "video_format must be \"webm\" or \"mp4\", got {:?}",
                self.video_format
            )));
        }
        if self.thumb_dir.is_empty() || self.output_filename.is_empty() {
            return Err(ConfigError::Validation(
                "thumb_dir and output_filename must not be empty".into(),
            ));
        }

        if self.source.as_os_str().is_empty() {
            return Err(ConfigError::Validation("no source directory given".into()));
        }
        if !self.source.is_dir() {
            return Err(ConfigError::Validation(format!(
                "source directory not found: {}",
                self.source.display()
            )));
        }
        let src = lexical_absolute(&self.source)?;
        let dst = lexical_absolute(&self.destination)?;
        if dst.starts_with(&src) {
            return Err(ConfigError::DestinationInsideSource { src, dst });
        }

        if self.theme != BUILTIN_THEME && !Path::new(&self.theme).is_dir() {
            return Err(ConfigError::ThemeNotFound(PathBuf::from(&self.theme)));
        }
        Ok(())
    }

    /// Swap sizes into larger-first order and canonicalise extension lists.
    fn normalize(&mut self) {
        for (key, size) in [
            ("img_size", &mut self.img_size),
            ("thumb_size", &mut self.thumb_size),
            ("video_size", &mut self.video_size),
        ] {
            let (normalized, swapped) = size.normalized();
            if swapped {
                log::warn!("The {key} setting should be specified with the largest value first.");
                *size = normalized;
            }
        }
        for list in [
            &mut self.img_extensions,
            &mut self.video_extensions,
            &mut self.audio_extensions,
        ] {
            for ext in list.0.iter_mut() {
                let lower = ext.to_lowercase();
                *ext = if lower.starts_with('.') {
                    lower
                } else {
                    format!(".{lower}")
                };
            }
        }
    }

    /// Rebase relative paths onto the directory of the config file they came from.
    fn rebase_paths(&mut self, config_dir: &Path) {
        for path in [&mut self.source, &mut self.destination] {
            if !path.as_os_str().is_empty() && path.is_relative() {
                *path = config_dir.join(&*path);
            }
        }
        if self.theme != BUILTIN_THEME && Path::new(&self.theme).is_relative() {
            let candidate = config_dir.join(&self.theme);
            if candidate.is_dir() {
                self.theme = candidate.to_string_lossy().into_owned();
            }
        }
    }

    /// Classify a filename by extension.
    pub fn media_kind(&self, filename: &str) -> Option<MediaKind> {
        let (_, ext) = split_ext(filename);
        let ext = ext.to_lowercase();
        if ext.is_empty() {
            None
        } else if self.img_extensions.contains(&ext) {
            Some(MediaKind::Image)
        } else if self.video_extensions.contains(&ext) {
            Some(MediaKind::Video)
        } else if self.audio_extensions.contains(&ext) {
            Some(MediaKind::Audio)
        } else {
            None
        }
    }

    /// Thumbnail path of a destination file, relative to its album directory.
    ///
    /// ```text
    /// image  foo.png  -> thumbnails/{prefix}foo{suffix}.png
    /// other  foo.webm -> thumbnails/{prefix}foo{suffix}.jpg
    /// ```
    pub fn thumb_name(&self, dst_filename: &str, kind: MediaKind) -> String {
        let (stem, ext) = split_ext(dst_filename);
        let ext = if kind == MediaKind::Image { ext } else { ".jpg" };
        format!(
            "{}/{}{}{}{}",
            self.thumb_dir, self.thumb_prefix, stem, self.thumb_suffix, ext
        )
    }

    /// Source directory of an album (`"."` is the root).
    pub fn source_dir(&self, album_path: &str) -> PathBuf {
        join_album_path(&self.source, album_path)
    }

    /// Destination directory of an album (`"."` is the root).
    pub fn destination_dir(&self, album_path: &str) -> PathBuf {
        join_album_path(&self.destination, album_path)
    }

    /// Deserialize a plugin's option table from the pass-through keys.
    ///
    /// Returns `T::default()` when the table is absent.
    pub fn plugin_options<T: DeserializeOwned + Default>(&self, key: &str) -> Result<T, ConfigError> {
        match self.extra.get(key) {
            Some(value) => Ok(value.clone().try_into()?),
            None => Ok(T::default()),
        }
    }
}

fn join_album_path(root: &Path, album_path: &str) -> PathBuf {
    if album_path == "." || album_path.is_empty() {
        root.to_path_buf()
    } else {
        root.join(album_path)
    }
}

/// Absolute path with `.` and `..` resolved lexically (the path need not exist).
fn lexical_absolute(path: &Path) -> Result<PathBuf, ConfigError> {
    let absolute = std::path::absolute(path)?;
    let mut out = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other),
        }
    }
    Ok(out)
}

/// Resolve the effective worker count.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)`, at least one
pub fn effective_threads(max_processes: Option<usize>) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    max_processes
        .map(|n| n.clamp(1, cores))
        .unwrap_or(cores)
}

// =============================================================================
// Loading and merging
// =============================================================================

/// Values given on the command line; `None` leaves the lower layers alone.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub source: Option<PathBuf>,
    pub destination: Option<PathBuf>,
    pub theme: Option<String>,
    pub title: Option<String>,
    pub max_processes: Option<usize>,
    pub debug: bool,
}

impl Overrides {
    fn apply(&self, settings: &mut Settings) {
        if let Some(source) = &self.source {
            settings.source = source.clone();
        }
        if let Some(destination) = &self.destination {
            settings.destination = destination.clone();
        }
        if let Some(theme) = &self.theme {
            settings.theme = theme.clone();
        }
        if let Some(title) = &self.title {
            settings.title = title.clone();
        }
        if self.max_processes.is_some() {
            settings.max_processes = self.max_processes;
        }
        settings.debug |= self.debug;
    }
}

/// Returns the stock defaults as a `toml::Value::Table`, the base merge layer.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    Ok(toml::Value::try_from(Settings::default())?)
}

/// Recursively merge `overlay` on top of `base`.
///
/// Tables merge key by key; any other overlay value replaces the base value.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Resolve the settings for one build.
///
/// Merges stock defaults, the config file at `config_path` (if any) and
/// `overrides`, then normalizes and validates the result. Reads the
/// filesystem but never writes to it.
pub fn resolve(config_path: Option<&Path>, overrides: &Overrides) -> Result<Settings, ConfigError> {
    let mut merged = stock_defaults_value()?;
    let mut config_dir = None;

    if let Some(path) = config_path {
        if !path.is_file() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }
        log::debug!("Settings file: {}", path.display());
        let content = fs::read_to_string(path)?;
        let overlay: toml::Value = toml::from_str(&content)?;
        merged = merge_toml(merged, overlay);
        config_dir = Some(
            path.parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or(Path::new("."))
                .to_path_buf(),
        );
    }

    let mut settings: Settings = merged.try_into()?;
    if let Some(dir) = config_dir {
        settings.rebase_paths(&dir);
    }
    overrides.apply(&mut settings);
    settings.normalize();
    settings.validate()?;
    log::debug!("Settings: {settings:?}");
    Ok(settings)
}

/// Write the commented stock config to `path`, refusing to overwrite.
pub fn write_stock_config(path: &Path) -> Result<(), ConfigError> {
    if path.exists() {
        return Err(ConfigError::AlreadyExists(path.to_path_buf()));
    }
    fs::write(path, stock_config_toml())?;
    Ok(())
}

/// Returns a fully-commented stock config with all core keys.
///
/// Used by the `init` command.
pub fn stock_config_toml() -> &'static str {
    r##"# Gallerist configuration
# =======================
# All settings are optional; the values below are the defaults.
# Relative paths are resolved against the directory of this file.

# Source directory holding your albums (required, here or on the command line).
# source = "pictures"

# Output directory. Must not be inside the source directory.
destination = "_build"

# "default" for the built-in look, or a theme directory whose static/ tree is
# copied to the output (static/style.css replaces the built-in stylesheet).
theme = "default"

# Gallery title (used for the root album).
title = ""

# ---------------------------------------------------------------------------
# Images
# ---------------------------------------------------------------------------
# Box processed images are fitted into, largest value first.
img_size = [640, 480]
autorotate_images = true
copy_exif_data = false

# Keep an unmodified copy of each image in orig_dir.
keep_orig = false
orig_dir = "original"
# Symlink instead of copying when a file is passed through unchanged.
orig_link = false

# ---------------------------------------------------------------------------
# Thumbnails
# ---------------------------------------------------------------------------
thumb_size = [200, 150]
thumb_dir = "thumbnails"
thumb_prefix = ""
thumb_suffix = ""
# Crop to exactly thumb_size (true) or fit inside it (false).
thumb_fit = true
make_thumbs = true
# Seconds into a video of the frame used as its thumbnail.
thumb_video_delay = 0

# ---------------------------------------------------------------------------
# Videos
# ---------------------------------------------------------------------------
video_size = [480, 360]
# Output container: "webm" or "mp4".
video_format = "webm"
video_converter = "ffmpeg"
# With use_orig, HTML5 videos (.mp4, .webm, .ogv) are copied as they are
# unless video_always_convert is set.
use_orig = false
video_always_convert = false
webm_options = ["-crf", "10", "-b:v", "1.6M", "-qmin", "4", "-qmax", "63"]
mp4_options = ["-crf", "23", "-strict", "-2"]

# ---------------------------------------------------------------------------
# Files and directories
# ---------------------------------------------------------------------------
img_extensions = [".jpg", ".jpeg", ".png", ".gif", ".tif", ".tiff", ".webp"]
video_extensions = [".3gp", ".avi", ".mkv", ".mov", ".mp4", ".ogv", ".webm"]
audio_extensions = [".m4a", ".mp3", ".oga", ".ogg", ".wav"]
# Glob patterns; "*" also matches "/".
ignore_directories = []
ignore_files = []

# ---------------------------------------------------------------------------
# Sorting
# ---------------------------------------------------------------------------
# Album attributes: name, title, path, mod_date, meta.<key>.
# Media attributes: filename, title, date, mod_date, meta.<key>, exif.<tag>.
# A list means "first attribute that resolves".
albums_sort_attr = ["name"]
albums_sort_reverse = false
medias_sort_attr = ["filename"]
medias_sort_reverse = false

# ---------------------------------------------------------------------------
# Output
# ---------------------------------------------------------------------------
write_html = true
output_filename = "index.html"
index_in_url = false
datetime_format = "%c"

# Built-in plugins: nomedia, nonmedia_files, extended_caching.
plugins = []

# Maximum parallel workers. Omit to use one per CPU core.
# max_processes = 4

[jpg_options]
quality = 85
progressive = true

# Plugins read their own tables, for example:
# [nonmedia_files_options]
# ignore_ext = [".md"]
# thumb_bg_color = [255, 255, 255]
"##
}
