//! CLI output formatting.
//!
//! Each display has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.
//!
//! # Album tree (`build --verbose`)
//!
//! ```text
//! 001 My Gallery (1 media)
//!     Source: ./
//!     001 2019 (0 media)
//!         Source: 2019/
//!         001 Paris (12 media)
//!             Source: 2019/paris/
//! ```
//!
//! # Summary
//!
//! ```text
//! Failed: 2019/paris/broken.jpg
//!     Image processing failed: ...
//!
//! Images: 11 processed, 0 skipped, 1 failed
//! Videos: 1 processed, 0 skipped, 0 failed
//! Done in 2.4s
//! ```

use crate::album::Album;
use crate::gallery::Gallery;
use crate::media::MediaKind;
use crate::pipeline::{BuildReport, Failure, Stats};
use std::time::Duration;

// ============================================================================
// Shared helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Album header: positional index + title + media count.
fn album_header(index: usize, album: &Album) -> String {
    format!(
        "{} {} ({} media)",
        format_index(index),
        album.title,
        album.medias.len()
    )
}

fn kind_label(kind: MediaKind) -> &'static str {
    match kind {
        MediaKind::Image => "Images",
        MediaKind::Video => "Videos",
        MediaKind::Audio => "Audio",
        MediaKind::NonMedia => "Other files",
    }
}

// ============================================================================
// Album tree
// ============================================================================

/// Format the album tree, depth-first in display order.
pub fn format_album_tree(gallery: &Gallery) -> Vec<String> {
    let mut lines = Vec::new();
    if let Some(root) = gallery.root() {
        walk_album(gallery, root, 1, 0, &mut lines);
    }
    lines
}

fn walk_album(gallery: &Gallery, album: &Album, position: usize, depth: usize, lines: &mut Vec<String>) {
    lines.push(format!("{}{}", indent(depth), album_header(position, album)));
    let source = if album.is_root() {
        "./".to_string()
    } else {
        format!("{}/", album.path)
    };
    lines.push(format!("{}Source: {}", indent(depth + 1), source));
    for (i, child) in gallery.children(album).enumerate() {
        walk_album(gallery, child, i + 1, depth + 1, lines);
    }
}

pub fn print_album_tree(gallery: &Gallery) {
    for line in format_album_tree(gallery) {
        println!("{}", line);
    }
}

// ============================================================================
// Summary
// ============================================================================

pub fn format_failures(failures: &[Failure]) -> Vec<String> {
    let mut lines = Vec::new();
    for failure in failures {
        lines.push(format!("Failed: {}", failure.media));
        lines.push(format!("{}{}", indent(1), failure.reason));
    }
    lines
}

/// Per-kind counts (kinds with no media are left out) and elapsed time.
pub fn format_summary(stats: &Stats, elapsed: Duration) -> Vec<String> {
    let mut lines: Vec<String> = stats
        .per_kind
        .iter()
        .map(|(kind, counts)| {
            format!(
                "{}: {} processed, {} skipped, {} failed",
                kind_label(*kind),
                counts.processed,
                counts.skipped,
                counts.failed
            )
        })
        .collect();
    if lines.is_empty() {
        lines.push("No media found".to_string());
    }
    lines.push(format!("Done in {:.1}s", elapsed.as_secs_f64()));
    lines
}

pub fn format_build_report(report: &BuildReport) -> Vec<String> {
    let mut lines = format_failures(&report.failures);
    if !lines.is_empty() {
        lines.push(String::new());
    }
    lines.extend(format_summary(&report.stats, report.elapsed));
    lines
}

pub fn print_build_report(report: &BuildReport) {
    for line in format_build_report(report) {
        println!("{}", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::Status;
    use crate::signals::SignalBus;
    use crate::test_helpers::{settings_for, write_jpeg};
    use std::sync::Arc;
    use tempfile::TempDir;

    #[test]
    fn format_index_pads() {
        assert_eq!(format_index(1), "001");
        assert_eq!(format_index(42), "042");
        assert_eq!(format_index(1234), "1234");
    }

    #[test]
    fn summary_lists_kinds_in_order() {
        let mut stats = Stats::default();
        stats.record(MediaKind::Video, Status::Success);
        stats.record(MediaKind::Image, Status::Success);
        stats.record(MediaKind::Image, Status::Skipped);
        stats.record(MediaKind::Image, Status::Failure);

        let lines = format_summary(&stats, Duration::from_millis(2400));
        assert_eq!(
            lines,
            vec![
                "Images: 1 processed, 1 skipped, 1 failed",
                "Videos: 1 processed, 0 skipped, 0 failed",
                "Done in 2.4s",
            ]
        );
    }

    #[test]
    fn summary_of_empty_build() {
        let lines = format_summary(&Stats::default(), Duration::ZERO);
        assert_eq!(lines, vec!["No media found", "Done in 0.0s"]);
    }

    #[test]
    fn failures_show_reason_indented() {
        let lines = format_failures(&[Failure {
            media: "a/b.jpg".into(),
            kind: MediaKind::Image,
            reason: "corrupt".into(),
        }]);
        assert_eq!(lines, vec!["Failed: a/b.jpg", "    corrupt"]);
    }

    #[test]
    fn album_tree_is_nested() {
        let tmp = TempDir::new().unwrap();
        let mut settings = settings_for(tmp.path());
        settings.title = "My Gallery".into();
        write_jpeg(&settings.source.join("cover.jpg"), 10, 10);
        write_jpeg(&settings.source.join("2019/paris/a.jpg"), 10, 10);
        write_jpeg(&settings.source.join("2019/paris/b.jpg"), 10, 10);
        write_jpeg(&settings.source.join("2020/c.jpg"), 10, 10);
        let gallery = Gallery::new(Arc::new(settings), &SignalBus::new()).unwrap();

        assert_eq!(
            format_album_tree(&gallery),
            vec![
                "001 My Gallery (1 media)",
                "    Source: ./",
                "    001 2019 (0 media)",
                "        Source: 2019/",
                "        001 Paris (2 media)",
                "            Source: 2019/paris/",
                "    002 2020 (1 media)",
                "        Source: 2020/",
            ]
        );
    }
}
