//! The album tree of one build.
//!
//! ## Walk
//!
//! ```text
//! source/                   album "."
//! ├── 2019/                 album "2019"
//! │   ├── paris/            album "2019/paris"
//! │   └── empty/            (no media: never becomes an album)
//! └── drafts/               (ignored: never listed)
//! ```
//!
//! The source tree is listed once, in case-insensitive name order, with
//! `ignore_directories` / `ignore_files` applied before anything is built.
//! Albums are then constructed children first, so a parent only lists
//! sub-albums that survived. A directory with neither candidate files nor
//! surviving sub-directories is never constructed. An album whose files are
//! all rejected by `AlbumFile` is dropped before `AlbumInitialized` fires,
//! and one left with no media and no sub-albums afterwards is dropped too. Albums that
//! plugins detach from their parent are pruned with their descendants.
//!
//! Albums are stored in walk order (parents before children) and looked up
//! by path through an index, so albums refer to each other by path and never
//! hold references.

use crate::album::{Album, album_sort_value};
use crate::config::Settings;
use crate::media::MediaKind;
use crate::naming::listing_order;
use crate::plugins::PluginError;
use crate::signals::{Signal, SignalBus, SignalKind};
use glob::Pattern;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum GalleryError {
    #[error("Failed to read {}: {source}", path.display())]
    Walk {
        path: PathBuf,
        source: walkdir::Error,
    },
    #[error("Invalid ignore pattern {pattern:?}: {source}")]
    Pattern {
        pattern: String,
        source: glob::PatternError,
    },
    #[error(transparent)]
    Plugin(#[from] PluginError),
}

/// Directory entries of one source directory, in listing order.
#[derive(Debug, Default)]
struct Listing {
    walk_index: usize,
    subdirs: Vec<String>,
    files: Vec<String>,
}

pub struct Gallery {
    pub settings: Arc<Settings>,
    pub albums: Vec<Album>,
    index: HashMap<String, usize>,
}

impl Gallery {
    /// Walk the source tree and build every album.
    ///
    /// Fires the album-level signals, the sort signals and finally
    /// `GalleryInitialized`.
    pub fn new(settings: Arc<Settings>, bus: &SignalBus) -> Result<Self, GalleryError> {
        let listings = list_source(&settings)?;
        let albums = build_albums(&settings, listings, bus)?;

        let mut gallery = Self {
            settings,
            albums,
            index: HashMap::new(),
        };
        gallery.prune_detached();
        gallery.sort(bus)?;

        log::info!(
            "Found {} albums, {} media",
            gallery.albums.len(),
            gallery.albums.iter().map(|a| a.medias.len()).sum::<usize>()
        );
        let settings = Arc::clone(&gallery.settings);
        bus.fire(
            &mut Signal::GalleryInitialized {
                gallery: &mut gallery,
            },
            &settings,
        )?;
        gallery.reindex();
        Ok(gallery)
    }

    pub fn get(&self, path: &str) -> Option<&Album> {
        self.index.get(path).and_then(|&i| self.albums.get(i))
    }

    pub fn get_mut(&mut self, path: &str) -> Option<&mut Album> {
        let i = *self.index.get(path)?;
        self.albums.get_mut(i)
    }

    pub fn root(&self) -> Option<&Album> {
        self.get(".")
    }

    /// Rebuild the path index after albums were added or removed.
    pub fn reindex(&mut self) {
        self.index = self
            .albums
            .iter()
            .enumerate()
            .map(|(i, album)| (album.path.clone(), i))
            .collect();
    }

    /// Sub-albums of `album`, in display order.
    pub fn children<'a>(&'a self, album: &'a Album) -> impl Iterator<Item = &'a Album> + 'a {
        album
            .subdirs
            .iter()
            .filter_map(move |name| self.get(&album.child_path(name)))
    }

    /// Ancestors of `album`, root first, excluding the album itself.
    pub fn ancestors(&self, album: &Album) -> Vec<&Album> {
        let mut chain = Vec::new();
        let mut parent = album.parent_path();
        while let Some(path) = parent {
            let Some(ancestor) = self.get(path) else {
                break;
            };
            chain.push(ancestor);
            parent = ancestor.parent_path();
        }
        chain.reverse();
        chain
    }

    /// Representative thumbnail of an album, relative to its destination
    /// directory: its own, or else the first sub-album's that has one.
    pub fn album_thumbnail(&self, path: &str) -> Option<String> {
        let album = self.get(path)?;
        if let Some(own) = album.own_thumbnail() {
            return Some(own.to_string());
        }
        album.subdirs.iter().find_map(|name| {
            self.album_thumbnail(&album.child_path(name))
                .map(|thumb| format!("{name}/{thumb}"))
        })
    }

    pub fn media_count(&self, kind: MediaKind) -> usize {
        self.albums.iter().map(|a| a.count(kind)).sum()
    }

    /// Remove albums no longer reachable from the root through `subdirs`.
    fn prune_detached(&mut self) {
        let known: HashSet<String> = self.albums.iter().map(|a| a.path.clone()).collect();
        let mut reachable = HashSet::new();
        let mut stack = vec![".".to_string()];
        let by_path: HashMap<&str, &Album> =
            self.albums.iter().map(|a| (a.path.as_str(), a)).collect();

        while let Some(path) = stack.pop() {
            let Some(album) = by_path.get(path.as_str()) else {
                continue;
            };
            for name in &album.subdirs {
                let child = album.child_path(name);
                if known.contains(&child) {
                    stack.push(child);
                }
            }
            reachable.insert(path);
        }

        let before = self.albums.len();
        self.albums.retain(|a| {
            let keep = reachable.contains(&a.path);
            if !keep {
                log::debug!("Pruning detached album {}", a.path);
            }
            keep
        });
        if self.albums.len() != before {
            log::info!("Pruned {} detached albums", before - self.albums.len());
        }

        // Drop names of sub-albums that were never built.
        for album in &mut self.albums {
            let parent = album.path.clone();
            album.subdirs.retain(|name| {
                let child = if parent == "." {
                    name.clone()
                } else {
                    format!("{parent}/{name}")
                };
                reachable.contains(&child)
            });
        }
        self.reindex();
    }

    /// Sort every album's media and sub-albums.
    fn sort(&mut self, bus: &SignalBus) -> Result<(), PluginError> {
        let settings = Arc::clone(&self.settings);

        for album in &mut self.albums {
            album.sort_medias(&settings.medias_sort_attr, settings.medias_sort_reverse);
            bus.fire(&mut Signal::MediasSorted { album }, &settings)?;
        }

        for i in 0..self.albums.len() {
            let keys: Vec<_> = {
                let album = &self.albums[i];
                album
                    .subdirs
                    .iter()
                    .map(|name| {
                        self.get(&album.child_path(name))
                            .and_then(|child| album_sort_value(child, &settings.albums_sort_attr))
                    })
                    .collect()
            };
            let album = &mut self.albums[i];
            album.sort_subdirs(&keys, settings.albums_sort_reverse);
            bus.fire(&mut Signal::AlbumsSorted { album }, &settings)?;
        }
        Ok(())
    }
}

fn compile_patterns(patterns: &[String]) -> Result<Vec<Pattern>, GalleryError> {
    patterns
        .iter()
        .map(|p| {
            Pattern::new(p).map_err(|source| GalleryError::Pattern {
                pattern: p.clone(),
                source,
            })
        })
        .collect()
}

fn matches_any(patterns: &[Pattern], rel_path: &str, name: &str) -> bool {
    patterns
        .iter()
        .any(|p| p.matches(rel_path) || p.matches(name))
}

/// Album path of a source path (`"."` for the root itself).
fn rel_path(root: &Path, path: &Path) -> String {
    let rel: Vec<String> = path
        .strip_prefix(root)
        .unwrap_or(path)
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    if rel.is_empty() {
        ".".to_string()
    } else {
        rel.join("/")
    }
}

fn parent_of(rel: &str) -> &str {
    rel.rsplit_once('/').map_or(".", |(parent, _)| parent)
}

/// List the source tree, ignore patterns applied.
fn list_source(settings: &Settings) -> Result<HashMap<String, Listing>, GalleryError> {
    let root = settings.source.clone();
    let ignore_dirs = compile_patterns(&settings.ignore_directories)?;
    let ignore_files = compile_patterns(&settings.ignore_files)?;

    let walker = WalkDir::new(&root)
        .follow_links(true)
        .sort_by(|a, b| {
            listing_order(&a.file_name().to_string_lossy(), &b.file_name().to_string_lossy())
        })
        .into_iter()
        .filter_entry({
            let root = root.clone();
            move |entry| {
                if entry.depth() == 0 || !entry.file_type().is_dir() {
                    return true;
                }
                let rel = rel_path(&root, entry.path());
                let ignored = matches_any(&ignore_dirs, &rel, &entry.file_name().to_string_lossy());
                if ignored {
                    log::info!("Ignoring directory {rel}");
                }
                !ignored
            }
        });

    let mut listings: HashMap<String, Listing> = HashMap::new();
    let mut walk_index = 0;

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(source) if source.depth() == 0 => {
                return Err(GalleryError::Walk {
                    path: root.clone(),
                    source,
                });
            }
            Err(e) => {
                log::warn!("Skipping unreadable entry: {e}");
                continue;
            }
        };

        let rel = rel_path(&root, entry.path());
        let name = entry.file_name().to_string_lossy().into_owned();

        if entry.file_type().is_dir() {
            listings.entry(rel.clone()).or_default().walk_index = walk_index;
            walk_index += 1;
            if entry.depth() > 0 {
                listings
                    .entry(parent_of(&rel).to_string())
                    .or_default()
                    .subdirs
                    .push(name);
            }
        } else if entry.depth() > 0 {
            if matches_any(&ignore_files, &rel, &name) {
                log::info!("Ignoring file {rel}");
                continue;
            }
            listings
                .entry(parent_of(&rel).to_string())
                .or_default()
                .files
                .push(name);
        }
    }
    Ok(listings)
}

/// Construct albums children first; returns them in walk order.
fn build_albums(
    settings: &Settings,
    listings: HashMap<String, Listing>,
    bus: &SignalBus,
) -> Result<Vec<Album>, GalleryError> {
    let mut order: Vec<(String, Listing)> = listings.into_iter().collect();
    order.sort_by(|(a, la), (b, lb)| {
        depth(b)
            .cmp(&depth(a))
            .then(la.walk_index.cmp(&lb.walk_index))
    });

    let plugins_classify = bus.is_connected(SignalKind::AlbumFile);
    let mut built: HashSet<String> = HashSet::new();
    let mut albums: Vec<(usize, Album)> = Vec::new();

    for (path, listing) in order {
        let subdirs: Vec<String> = listing
            .subdirs
            .into_iter()
            .filter(|name| built.contains(&child_path(&path, name)))
            .collect();
        let has_candidates = listing
            .files
            .iter()
            .any(|f| settings.media_kind(f).is_some())
            || (plugins_classify && !listing.files.is_empty());

        if subdirs.is_empty() && !has_candidates {
            log::debug!("Skipping empty directory {path}");
            continue;
        }

        let mut album = Album::new(&path, settings, subdirs, &listing.files, bus)?;
        if album.is_empty() {
            log::debug!("Skipping {path}: no file was recognised as media");
            continue;
        }
        album.initialize(settings, bus)?;
        if album.is_empty() {
            log::debug!("Dropping album {path}: nothing left after initialization");
            continue;
        }
        built.insert(path);
        albums.push((listing.walk_index, album));
    }

    albums.sort_by_key(|(walk_index, _)| *walk_index);
    Ok(albums.into_iter().map(|(_, album)| album).collect())
}

fn depth(path: &str) -> usize {
    if path == "." {
        0
    } else {
        path.split('/').count()
    }
}

fn child_path(parent: &str, name: &str) -> String {
    if parent == "." {
        name.to_string()
    } else {
        format!("{parent}/{name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StringList;
    use crate::test_helpers::{settings_for, write_jpeg};
    use std::fs;
    use std::sync::Mutex;
    use tempfile::TempDir;

    fn paths(gallery: &Gallery) -> Vec<&str> {
        gallery.albums.iter().map(|a| a.path.as_str()).collect()
    }

    fn tree(settings: &Settings, files: &[&str]) {
        for file in files {
            let path = settings.source.join(file);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            if file.ends_with(".jpg") {
                write_jpeg(&path, 40, 30);
            } else if file.ends_with('/') {
                fs::create_dir_all(&path).unwrap();
            } else {
                fs::write(&path, "data").unwrap();
            }
        }
    }

    fn gallery(settings: Settings) -> Gallery {
        Gallery::new(Arc::new(settings), &SignalBus::new()).unwrap()
    }

    #[test]
    fn walk_builds_albums_in_walk_order() {
        let tmp = TempDir::new().unwrap();
        let settings = settings_for(tmp.path());
        tree(
            &settings,
            &["root.jpg", "b/two.jpg", "A/one.jpg", "A/sub/deep.jpg"],
        );

        let g = gallery(settings);
        assert_eq!(paths(&g), vec![".", "A", "A/sub", "b"]);
        assert_eq!(g.root().unwrap().subdirs, vec!["A", "b"]);
        assert_eq!(g.get("A").unwrap().subdirs, vec!["sub"]);
        assert_eq!(g.media_count(MediaKind::Image), 4);
    }

    #[test]
    fn empty_directories_never_become_albums() {
        let tmp = TempDir::new().unwrap();
        let settings = settings_for(tmp.path());
        tree(
            &settings,
            &[
                "keep/photo.jpg",
                "empty/",
                "text_only/notes.txt",
                "nested/empty_child/",
                "nested/also_empty/readme.md",
            ],
        );

        let g = gallery(settings);
        assert_eq!(paths(&g), vec![".", "keep"]);
        assert_eq!(g.root().unwrap().subdirs, vec!["keep"]);
    }

    #[test]
    fn root_with_only_subalbums_is_kept() {
        let tmp = TempDir::new().unwrap();
        let settings = settings_for(tmp.path());
        tree(&settings, &["album/photo.jpg"]);

        let g = gallery(settings);
        assert_eq!(paths(&g), vec![".", "album"]);
        assert!(g.root().unwrap().medias.is_empty());
    }

    #[test]
    fn ignore_patterns_skip_directories_and_files() {
        let tmp = TempDir::new().unwrap();
        let settings = Settings {
            ignore_directories: StringList::from_strs(&["drafts", "2019/private*"]),
            ignore_files: StringList::from_strs(&["*_raw.jpg"]),
            ..settings_for(tmp.path())
        };
        tree(
            &settings,
            &[
                "a.jpg",
                "a_raw.jpg",
                "drafts/x.jpg",
                "2019/public.jpg",
                "2019/private_stuff/y.jpg",
                "2019/sub/drafts/z.jpg",
            ],
        );

        let g = gallery(settings);
        assert_eq!(paths(&g), vec![".", "2019"]);
        let root_files: Vec<&str> = g.root().unwrap().medias.iter().map(|m| m.src_filename.as_str()).collect();
        assert_eq!(root_files, vec!["a.jpg"]);
    }

    #[test]
    fn album_initialized_fires_once_per_album() {
        let tmp = TempDir::new().unwrap();
        let settings = settings_for(tmp.path());
        tree(
            &settings,
            &["r.jpg", "a/1.jpg", "a/b/2.jpg", "c/3.jpg", "empty/", "d/notes.txt"],
        );

        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut bus = SignalBus::new();
        let log = Arc::clone(&seen);
        bus.connect(SignalKind::AlbumInitialized, "count", move |signal, _| {
            if let Signal::AlbumInitialized { album } = signal {
                log.lock().unwrap().push(album.path.clone());
            }
            Ok(())
        });

        let g = Gallery::new(Arc::new(settings), &bus).unwrap();
        let mut seen = seen.lock().unwrap().clone();
        seen.sort();
        let mut built: Vec<String> = paths(&g).iter().map(|s| s.to_string()).collect();
        built.sort();
        assert_eq!(seen, built);
        assert_eq!(seen.len(), 4);
    }

    #[test]
    fn directory_of_rejected_files_is_never_initialized() {
        let tmp = TempDir::new().unwrap();
        let mut settings = settings_for(tmp.path());
        settings.plugins = StringList::from_strs(&[crate::plugins::nonmedia::NAME]);
        tree(&settings, &["a/p.jpg", "docs/readme.md", "papers/report.pdf"]);

        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut bus = SignalBus::new();
        crate::plugins::register_all(&settings, &mut bus).unwrap();
        let log = Arc::clone(&seen);
        bus.connect(SignalKind::AlbumInitialized, "count", move |signal, _| {
            if let Signal::AlbumInitialized { album } = signal {
                log.lock().unwrap().push(album.path.clone());
            }
            Ok(())
        });

        let g = Gallery::new(Arc::new(settings), &bus).unwrap();
        let mut seen = seen.lock().unwrap().clone();
        seen.sort();
        assert_eq!(paths(&g), vec![".", "a", "papers"]);
        assert_eq!(seen, vec![".", "a", "papers"]);
    }

    #[test]
    fn plugin_detaching_subalbum_prunes_descendants() {
        let tmp = TempDir::new().unwrap();
        let settings = settings_for(tmp.path());
        tree(&settings, &["r.jpg", "hide/1.jpg", "hide/deep/2.jpg", "show/3.jpg"]);

        let mut bus = SignalBus::new();
        bus.connect(SignalKind::AlbumInitialized, "detach", |signal, _| {
            if let Signal::AlbumInitialized { album } = signal {
                album.subdirs.retain(|s| s != "hide");
            }
            Ok(())
        });

        let g = Gallery::new(Arc::new(settings), &bus).unwrap();
        assert_eq!(paths(&g), vec![".", "show"]);
        assert!(g.get("hide/deep").is_none());
    }

    #[test]
    fn subalbums_sorted_by_title_reverse() {
        let tmp = TempDir::new().unwrap();
        let settings = Settings {
            albums_sort_attr: StringList::from_strs(&["title"]),
            albums_sort_reverse: true,
            ..settings_for(tmp.path())
        };
        tree(&settings, &["x/1.jpg", "y/2.jpg", "z/3.jpg"]);
        fs::write(settings.source.join("x/index.md"), "Title: Beta\n").unwrap();
        fs::write(settings.source.join("y/index.md"), "Title: Alpha\n").unwrap();
        fs::write(settings.source.join("z/index.md"), "Title: Gamma\n").unwrap();

        let g = gallery(settings);
        assert_eq!(g.root().unwrap().subdirs, vec!["z", "x", "y"]);
    }

    #[test]
    fn album_thumbnail_falls_back_to_subalbum() {
        let tmp = TempDir::new().unwrap();
        let settings = settings_for(tmp.path());
        tree(&settings, &["trips/paris/eiffel.jpg", "trips/rome/colosseum.jpg"]);

        let g = gallery(settings);
        assert_eq!(
            g.album_thumbnail("."),
            Some("trips/paris/thumbnails/eiffel.jpg".to_string())
        );
        assert_eq!(
            g.album_thumbnail("trips/rome"),
            Some("thumbnails/colosseum.jpg".to_string())
        );
    }

    #[test]
    fn ancestors_root_first() {
        let tmp = TempDir::new().unwrap();
        let settings = settings_for(tmp.path());
        tree(&settings, &["a/b/c/photo.jpg"]);

        let g = gallery(settings);
        let deepest = g.get("a/b/c").unwrap();
        let chain: Vec<&str> = g.ancestors(deepest).iter().map(|a| a.path.as_str()).collect();
        assert_eq!(chain, vec![".", "a", "a/b"]);
        let children: Vec<&str> = g.children(g.get("a").unwrap()).map(|a| a.path.as_str()).collect();
        assert_eq!(children, vec!["a/b"]);
    }

    #[test]
    fn missing_source_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let settings = Settings {
            source: tmp.path().join("missing"),
            ..Settings::default()
        };
        let result = Gallery::new(Arc::new(settings), &SignalBus::new());
        assert!(matches!(result, Err(GalleryError::Walk { .. })));
    }

    #[test]
    fn invalid_ignore_pattern_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let settings = Settings {
            ignore_files: StringList::from_strs(&["[unclosed"]),
            ..settings_for(tmp.path())
        };
        let result = Gallery::new(Arc::new(settings), &SignalBus::new());
        assert!(matches!(result, Err(GalleryError::Pattern { .. })));
    }
}
