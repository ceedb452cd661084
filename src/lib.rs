//! # Gallerist
//!
//! A static gallery generator for photos and videos. The source directory is
//! the data model: every directory becomes an album, every recognised image or
//! video becomes a media item, and Markdown sidecars carry titles and
//! descriptions.
//!
//! # Architecture: One Build, Six Stages
//!
//! ```text
//! 1. Walk      source/      →  album paths           (glob filters, nomedia, ...)
//! 2. Albums    album paths  →  Gallery               (metadata, sort, album_initialized)
//! 3. Plan      Gallery      →  MediaJobs             (skip up-to-date, process_file)
//! 4. Dispatch  MediaJobs    →  Outcomes              (rayon pool, cancellable)
//! 5. Merge     Outcomes     →  Gallery               (failed media dropped)
//! 6. Write     Gallery      →  destination/*.html    (before_render, gallery_build)
//! ```
//!
//! Workers receive self-contained [`process::MediaJob`] snapshots, never the
//! gallery itself, so the only shared state during dispatch is read-only
//! settings, the backends, and the [`process::CancelToken`].
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`config`] | `gallerist.toml` loading, TOML layer merging, validation, stock config |
//! | [`gallery`] | Owns every [`album::Album`], walks the source tree, album lookups |
//! | [`album`] | One directory: media list, sub-album names, title, sorting |
//! | [`media`] | One source file: kind, derived paths, lazily loaded metadata |
//! | [`metadata`] | Markdown sidecars, EXIF, IPTC, precedence, `set-meta` |
//! | [`naming`] | Natural sort keys, titles from file and directory names |
//! | [`signals`] | Typed plugin hooks fired at fixed points of a build |
//! | [`plugins`] | Built-in plugins: `nomedia`, `nonmedia_files`, `extended_caching` |
//! | [`pipeline`] | The [`pipeline::Builder`] state machine and its report |
//! | [`process`] | Per-media processors (image, video, placeholder) |
//! | [`imaging`] | Pure-Rust image operations behind the [`imaging::ImageBackend`] trait |
//! | [`video`] | External encoder runs behind the [`video::VideoBackend`] trait |
//! | [`writer`] | Album pages rendered with Maud, theme assets |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Skip By Existence
//!
//! A media item is reprocessed only when its destination file is missing, or
//! when `--force` / `--force-album` says so. Running a build twice over an
//! unchanged tree touches no media output. An interrupted encoder never leaves
//! a truncated destination behind ([`video::PartialOutput`]), so existence is a
//! safe signal.
//!
//! ## Static Plugins
//!
//! Plugins are compiled in and enabled by name through `plugins = [...]`.
//! Each one subscribes handlers on the [`signals::SignalBus`]; handlers run in
//! registration order and the first error aborts the build.
//!
//! ## Maud Over Template Engines
//!
//! Pages are generated with [Maud](https://maud.lambda.xyz/): malformed HTML
//! is a compile error and all interpolation is escaped. A theme directory only
//! contributes static assets, so there is no template directory to ship.

pub mod album;
pub mod config;
pub mod gallery;
pub mod imaging;
pub mod media;
pub mod metadata;
pub mod naming;
pub mod output;
pub mod pipeline;
pub mod plugins;
pub mod process;
pub mod signals;
pub mod video;
pub mod writer;

#[cfg(test)]
pub(crate) mod test_helpers;
