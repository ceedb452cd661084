//! HTML pages, one per album, rendered with [Maud](https://maud.lambda.xyz/).
//!
//! ```text
//! _build/
//! ├── index.html            root album
//! ├── static/style.css      embedded stylesheet, or the theme's static/ tree
//! └── 2019/
//!     ├── index.html
//!     └── paris/index.html
//! ```
//!
//! Every link is relative so the output can be served from any prefix or
//! opened straight from disk. `BeforeRender` handlers get a [`PageContext`]
//! per album and may change its title or inject extra head/footer HTML.

use crate::album::Album;
use crate::config::{BUILTIN_THEME, Settings};
use crate::gallery::Gallery;
use crate::media::Media;
use crate::plugins::PluginError;
use crate::signals::{Signal, SignalBus};
use chrono::NaiveDateTime;
use maud::{DOCTYPE, Markup, PreEscaped, html};
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

const CSS_STATIC: &str = include_str!("../static/style.css");

#[derive(Error, Debug)]
pub enum WriteError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Plugin(#[from] PluginError),
}

/// Per-page values `BeforeRender` handlers may change.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageContext {
    pub title: String,
    /// Raw HTML appended to `<head>`.
    pub extra_head: Vec<String>,
    /// Raw HTML appended after the content.
    pub extra_footer: Vec<String>,
}

/// Render and write every album page.
pub fn write_gallery(gallery: &Gallery, bus: &SignalBus) -> Result<(), WriteError> {
    let settings = gallery.settings.as_ref();
    fs::create_dir_all(&settings.destination)?;
    install_static(settings)?;

    for album in &gallery.albums {
        let mut context = PageContext {
            title: album.title.clone(),
            ..PageContext::default()
        };
        bus.fire(
            &mut Signal::BeforeRender {
                album,
                context: &mut context,
            },
            settings,
        )?;

        let page = render_album_page(gallery, album, &context);
        fs::create_dir_all(&album.dst_path)?;
        let path = album.dst_path.join(&settings.output_filename);
        fs::write(&path, page.into_string())?;
        log::info!("Wrote {}", path.display());
    }
    Ok(())
}

/// Theme directory, unless the built-in look is used.
fn theme_dir(settings: &Settings) -> Option<PathBuf> {
    (settings.theme != BUILTIN_THEME).then(|| PathBuf::from(&settings.theme))
}

/// Write the stylesheet and copy the theme's `static/` tree.
fn install_static(settings: &Settings) -> std::io::Result<()> {
    let static_dst = settings.destination.join("static");
    fs::create_dir_all(&static_dst)?;

    let theme_static = theme_dir(settings).map(|dir| dir.join("static"));
    if let Some(src) = theme_static.as_deref().filter(|p| p.is_dir()) {
        copy_dir_recursive(src, &static_dst)?;
    }
    let stylesheet = static_dst.join("style.css");
    if !theme_static.is_some_and(|p| p.join("style.css").is_file()) {
        fs::write(stylesheet, CSS_STATIC)?;
    }
    Ok(())
}

fn copy_dir_recursive(src: &Path, dst: &Path) -> std::io::Result<()> {
    for entry in fs::read_dir(src)? {
        let entry = entry?;
        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());

        if src_path.is_dir() {
            fs::create_dir_all(&dst_path)?;
            copy_dir_recursive(&src_path, &dst_path)?;
        } else {
            fs::copy(&src_path, &dst_path)?;
        }
    }
    Ok(())
}

// ============================================================================
// Links
// ============================================================================

/// `../` repeated once per level between the root and `album`.
fn to_root(album: &Album) -> String {
    "../".repeat(album.depth())
}

/// Link to a directory page, honoring `index_in_url`.
fn dir_link(prefix: &str, settings: &Settings) -> String {
    let prefix = if prefix.is_empty() { "./" } else { prefix };
    if settings.index_in_url {
        format!("{prefix}{}", settings.output_filename)
    } else {
        prefix.to_string()
    }
}

/// Format a date with `datetime_format`, falling back to ISO 8601 when the
/// format string is invalid.
pub fn format_date(date: NaiveDateTime, format: &str) -> String {
    let mut out = String::new();
    if write!(out, "{}", date.format(format)).is_err() {
        log::debug!("Invalid datetime_format {format:?}");
        out = date.format("%Y-%m-%d %H:%M:%S").to_string();
    }
    out
}

// ============================================================================
// HTML Components
// ============================================================================

fn base_document(context: &PageContext, stylesheet: &str, content: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { (context.title) }
                link rel="stylesheet" href=(stylesheet);
                @for extra in &context.extra_head {
                    (PreEscaped(extra))
                }
            }
            body {
                (content)
                @for extra in &context.extra_footer {
                    (PreEscaped(extra))
                }
            }
        }
    }
}

fn breadcrumbs(gallery: &Gallery, album: &Album) -> Markup {
    let settings = gallery.settings.as_ref();
    let depth = album.depth();
    html! {
        nav.breadcrumb {
            @for ancestor in gallery.ancestors(album) {
                a href=(dir_link(&"../".repeat(depth - ancestor.depth()), settings)) {
                    (ancestor.title)
                }
                " › "
            }
            span.current { (album.title) }
        }
    }
}

fn album_card(gallery: &Gallery, child: &Album) -> Markup {
    let settings = gallery.settings.as_ref();
    let name = child.name.as_str();
    let thumbnail = gallery.album_thumbnail(&child.path);
    html! {
        a.album-card href=(dir_link(&format!("{name}/"), settings)) {
            @if let Some(thumb) = thumbnail {
                img src={ (name) "/" (thumb) } alt=(child.title) loading="lazy";
            } @else {
                span.album-placeholder {}
            }
            span.album-title { (child.title) }
        }
    }
}

fn media_card(media: &Media, settings: &Settings) -> Markup {
    let title = media.title();
    let description = media.description();
    let kind = media.kind.to_string();
    html! {
        figure class={ "media " (kind) } {
            a href=(media.url()) {
                @if settings.make_thumbs {
                    img src=(media.thumb_name) alt=(title) loading="lazy";
                } @else {
                    (title)
                }
            }
            figcaption {
                span.media-title { (title) }
                @if let Some(date) = media.date() {
                    time datetime=(date.format("%Y-%m-%dT%H:%M:%S").to_string()) {
                        (format_date(date, &settings.datetime_format))
                    }
                }
                @if !description.is_empty() {
                    div.media-description { (PreEscaped(description)) }
                }
            }
        }
    }
}

/// Renders an album page: breadcrumbs, description, sub-albums, media.
pub fn render_album_page(gallery: &Gallery, album: &Album, context: &PageContext) -> Markup {
    let settings = gallery.settings.as_ref();
    let stylesheet = format!("{}static/style.css", to_root(album));

    let content = html! {
        header.site-header {
            (breadcrumbs(gallery, album))
        }
        main.album-page {
            header.album-header {
                h1 { (context.title) }
                @if !album.description.is_empty() {
                    div.album-description { (PreEscaped(&album.description)) }
                }
            }
            @let children: Vec<&Album> = gallery.children(album).collect();
            @if !children.is_empty() {
                div.album-grid {
                    @for child in &children {
                        (album_card(gallery, child))
                    }
                }
            }
            @if !album.medias.is_empty() {
                div.media-grid {
                    @for media in &album.medias {
                        (media_card(media, settings))
                    }
                }
            }
        }
    };

    base_document(context, &stylesheet, content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signals::SignalKind;
    use crate::test_helpers::{settings_for, write_jpeg};
    use chrono::NaiveDate;
    use std::sync::Arc;
    use tempfile::TempDir;

    /// `root/{cover.jpg, 2019/{paris/{a.jpg, a.md}, notes.md?}}`.
    fn gallery(settings: Settings) -> Gallery {
        let src = &settings.source;
        write_jpeg(&src.join("cover.jpg"), 60, 40);
        write_jpeg(&src.join("2019/paris/a.jpg"), 60, 40);
        fs::write(
            src.join("2019/paris/a.md"),
            "Title: Pont <Neuf>\n\nCrossing the **river**.\n",
        )
        .unwrap();
        fs::write(src.join("2019/index.md"), "Title: Year 2019\n\nA *good* year.\n").unwrap();
        Gallery::new(Arc::new(settings), &SignalBus::new()).unwrap()
    }

    fn page(gallery: &Gallery, path: &str) -> String {
        let album = gallery.get(path).unwrap();
        let context = PageContext {
            title: album.title.clone(),
            ..PageContext::default()
        };
        render_album_page(gallery, album, &context).into_string()
    }

    // =========================================================================
    // Components
    // =========================================================================

    #[test]
    fn base_document_includes_doctype_and_extras() {
        let context = PageContext {
            title: "T".into(),
            extra_head: vec!["<meta name=\"x\">".into()],
            extra_footer: vec!["<script>1</script>".into()],
        };
        let doc = base_document(&context, "static/style.css", html! { p { "body" } }).into_string();
        assert!(doc.starts_with("<!DOCTYPE html>"));
        assert!(doc.contains("<title>T</title>"));
        assert!(doc.contains("<meta name=\"x\">"));
        assert!(doc.contains("<script>1</script>"));
        assert!(doc.contains("href=\"static/style.css\""));
    }

    #[test]
    fn dir_links_with_and_without_index() {
        let mut settings = Settings::default();
        assert_eq!(dir_link("paris/", &settings), "paris/");
        assert_eq!(dir_link("", &settings), "./");
        settings.index_in_url = true;
        assert_eq!(dir_link("../", &settings), "../index.html");
    }

    #[test]
    fn invalid_date_format_falls_back() {
        let date = NaiveDate::from_ymd_opt(2020, 1, 2)
            .unwrap()
            .and_hms_opt(3, 4, 5)
            .unwrap();
        assert_eq!(format_date(date, "%d/%m/%Y"), "02/01/2020");
        assert_eq!(format_date(date, "%Q"), "2020-01-02 03:04:05");
    }

    // =========================================================================
    // Pages
    // =========================================================================

    #[test]
    fn root_page_lists_sub_albums_and_media() {
        let tmp = TempDir::new().unwrap();
        let gallery = gallery(settings_for(tmp.path()));
        let html = page(&gallery, ".");

        assert!(html.contains("href=\"static/style.css\""));
        assert!(html.contains("href=\"2019/\""));
        assert!(html.contains("Year 2019"));
        // Sub-album thumbnail falls back to its first sub-album's.
        assert!(html.contains("src=\"2019/paris/thumbnails/a.jpg\""));
        assert!(html.contains("href=\"cover.jpg\""));
        assert!(html.contains("src=\"thumbnails/cover.jpg\""));
    }

    #[test]
    fn nested_page_links_back_to_root() {
        let tmp = TempDir::new().unwrap();
        let gallery = gallery(settings_for(tmp.path()));
        let html = page(&gallery, "2019/paris");

        assert!(html.contains("href=\"../../static/style.css\""));
        assert!(html.contains("href=\"../../\""));
        assert!(html.contains("href=\"../\">Year 2019</a>"));
    }

    #[test]
    fn titles_are_escaped_and_descriptions_rendered() {
        let tmp = TempDir::new().unwrap();
        let gallery = gallery(settings_for(tmp.path()));
        let html = page(&gallery, "2019/paris");
        assert!(html.contains("Pont &lt;Neuf&gt;"));
        assert!(html.contains("<strong>river</strong>"));

        let year = page(&gallery, "2019");
        assert!(year.contains("<em>good</em>"));
    }

    #[test]
    fn write_gallery_writes_every_page_and_stylesheet() {
        let tmp = TempDir::new().unwrap();
        let settings = settings_for(tmp.path());
        let dst = settings.destination.clone();
        let gallery = gallery(settings);

        write_gallery(&gallery, &SignalBus::new()).unwrap();

        for page in ["index.html", "2019/index.html", "2019/paris/index.html"] {
            assert!(dst.join(page).exists(), "{page} missing");
        }
        assert_eq!(fs::read_to_string(dst.join("static/style.css")).unwrap(), CSS_STATIC);
    }

    #[test]
    fn before_render_can_change_the_page() {
        let tmp = TempDir::new().unwrap();
        let settings = settings_for(tmp.path());
        let dst = settings.destination.clone();
        let gallery = gallery(settings);

        let mut bus = SignalBus::new();
        bus.connect(SignalKind::BeforeRender, "decorate", |signal, _| {
            if let Signal::BeforeRender { album, context } = signal {
                context.title = format!("{} | Photos", album.title);
                context.extra_head.push("<meta name=\"robots\" content=\"noindex\">".into());
            }
            Ok(())
        });
        write_gallery(&gallery, &bus).unwrap();

        let html = fs::read_to_string(dst.join("2019/index.html")).unwrap();
        assert!(html.contains("<title>Year 2019 | Photos</title>"));
        assert!(html.contains("noindex"));
    }

    #[test]
    fn theme_static_tree_is_copied() {
        let tmp = TempDir::new().unwrap();
        let mut settings = settings_for(tmp.path());
        let theme = tmp.path().join("theme");
        fs::create_dir_all(theme.join("static/img")).unwrap();
        fs::write(theme.join("static/style.css"), "body{}").unwrap();
        fs::write(theme.join("static/img/logo.svg"), "<svg/>").unwrap();
        settings.theme = theme.to_string_lossy().into_owned();
        let dst = settings.destination.clone();

        write_gallery(&gallery(settings), &SignalBus::new()).unwrap();

        assert_eq!(fs::read_to_string(dst.join("static/style.css")).unwrap(), "body{}");
        assert!(dst.join("static/img/logo.svg").exists());
    }

    #[test]
    fn custom_output_filename() {
        let tmp = TempDir::new().unwrap();
        let mut settings = settings_for(tmp.path());
        settings.output_filename = "album.html".into();
        let dst = settings.destination.clone();

        write_gallery(&gallery(settings), &SignalBus::new()).unwrap();
        assert!(dst.join("2019/paris/album.html").exists());
        assert!(!dst.join("2019/paris/index.html").exists());
    }
}
