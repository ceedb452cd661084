//! Build orchestration.
//!
//! ```text
//! Init → Walk → AlbumsBuilt → MediaDispatched → MediaComplete → Written → Done
//!          └──────────────┴───────────┴──────────────┴──────────┴──→ Failed
//! ```
//!
//! - **Walk / AlbumsBuilt**: [`Gallery::new`] lists the source tree and builds
//!   every album on the calling thread.
//! - **MediaDispatched**: each media either gets a [`Status::Skipped`] (its
//!   destination exists and nothing forces it) or becomes a [`MediaJob`]
//!   paired with the processor `ProcessFile` handlers chose. Jobs run on a
//!   rayon pool of `max_processes` threads.
//! - **MediaComplete**: outcomes are merged back into the album tree. A failed
//!   media is counted and removed from its album so no page links to a
//!   missing file. In strict mode (`debug`) the first failure aborts the build.
//! - **Written**: one page per album, then `GalleryBuild`.
//!
//! ## Forcing
//!
//! `--force` reprocesses everything. `--force-album PATTERN` reprocesses the
//! albums whose path or directory name matches the glob; `*` stops at `/`, so
//! `2019/*` covers the direct children of `2019` and `2019/**` everything
//! below it.

use crate::config::{ConfigError, Settings, effective_threads};
use crate::gallery::{Gallery, GalleryError};
use crate::imaging::{ImageBackend, RustBackend};
use crate::media::MediaKind;
use crate::plugins::{self, PluginError};
use crate::process::{
    CancelToken, JobContext, MediaJob, MediaProcessor, Outcome, ProcessError, Status,
    default_processor, media_key,
};
use crate::signals::{Signal, SignalBus};
use crate::video::{FfmpegBackend, VideoBackend};
use crate::writer::{self, WriteError};
use glob::{MatchOptions, Pattern};
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::fs;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BuildError {
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Gallery(#[from] GalleryError),
    #[error("Processing {media} failed: {source}")]
    Process { media: String, source: ProcessError },
    #[error("Plugin error: {0}")]
    Plugin(#[from] PluginError),
    #[error("Writing pages failed: {0}")]
    Write(#[from] WriteError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid force-album pattern {pattern:?}: {source}")]
    Pattern {
        pattern: String,
        source: glob::PatternError,
    },
    #[error("Could not start worker pool: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),
    #[error("Interrupted")]
    Interrupted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildState {
    Init,
    Walk,
    AlbumsBuilt,
    MediaDispatched,
    MediaComplete,
    Written,
    Done,
    Failed,
}

/// Which albums are reprocessed even when their output exists.
#[derive(Debug, Clone, Default)]
pub struct Force {
    all: bool,
    albums: Vec<Pattern>,
}

const PATH_MATCH: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

impl Force {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn all() -> Self {
        Self {
            all: true,
            albums: Vec::new(),
        }
    }

    pub fn albums<S: AsRef<str>>(patterns: &[S]) -> Result<Self, BuildError> {
        let albums = patterns
            .iter()
            .map(|p| {
                let p = p.as_ref().trim_matches('/');
                Pattern::new(p).map_err(|source| BuildError::Pattern {
                    pattern: p.to_string(),
                    source,
                })
            })
            .collect::<Result<_, _>>()?;
        Ok(Self { all: false, albums })
    }

    pub fn is_forced(&self, album_path: &str) -> bool {
        if self.all {
            return true;
        }
        let name = album_path.rsplit('/').next().unwrap_or(album_path);
        self.albums
            .iter()
            .any(|p| p.matches_with(album_path, PATH_MATCH) || p.matches_with(name, PATH_MATCH))
    }
}

/// Processed / skipped / failed counts for one media kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Counts {
    pub processed: usize,
    pub skipped: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Stats {
    pub per_kind: BTreeMap<MediaKind, Counts>,
}

impl Stats {
    pub fn record(&mut self, kind: MediaKind, status: Status) {
        let counts = self.per_kind.entry(kind).or_default();
        match status {
            Status::Success => counts.processed += 1,
            Status::Skipped => counts.skipped += 1,
            Status::Failure => counts.failed += 1,
        }
    }

    pub fn get(&self, kind: MediaKind) -> Counts {
        self.per_kind.get(&kind).copied().unwrap_or_default()
    }

    pub fn total(&self) -> Counts {
        self.per_kind.values().fold(Counts::default(), |acc, c| Counts {
            processed: acc.processed + c.processed,
            skipped: acc.skipped + c.skipped,
            failed: acc.failed + c.failed,
        })
    }
}

/// A media that failed, with the reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    pub media: String,
    pub kind: MediaKind,
    pub reason: String,
}

pub struct BuildReport {
    pub gallery: Gallery,
    pub stats: Stats,
    pub failures: Vec<Failure>,
    pub elapsed: Duration,
}

/// A job and the processor that runs it.
struct Dispatch {
    job: MediaJob,
    processor: Arc<dyn MediaProcessor>,
}

/// One build session: settings, plugins and backends.
pub struct Builder {
    settings: Arc<Settings>,
    bus: SignalBus,
    images: Box<dyn ImageBackend>,
    videos: Box<dyn VideoBackend>,
    cancel: CancelToken,
    state: BuildState,
}

impl Builder {
    /// Session with the default backends and the plugins named in `plugins`.
    pub fn new(settings: Settings) -> Result<Self, BuildError> {
        let mut bus = SignalBus::new();
        plugins::register_all(&settings, &mut bus)?;
        let videos = FfmpegBackend::from_settings(&settings);
        Ok(Self::with_backends(
            settings,
            bus,
            Box::new(RustBackend::new()),
            Box::new(videos),
        ))
    }

    pub fn with_backends(
        settings: Settings,
        bus: SignalBus,
        images: Box<dyn ImageBackend>,
        videos: Box<dyn VideoBackend>,
    ) -> Self {
        Self {
            settings: Arc::new(settings),
            bus,
            images,
            videos,
            cancel: CancelToken::new(),
            state: BuildState::Init,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn bus_mut(&mut self) -> &mut SignalBus {
        &mut self.bus
    }

    /// Token the interrupt handler trips to stop the build.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn state(&self) -> BuildState {
        self.state
    }

    pub fn run(&mut self, force: &Force) -> Result<BuildReport, BuildError> {
        let result = self.run_stages(force);
        if let Err(e) = &result {
            log::error!("Build failed in state {:?}: {e}", self.state);
            self.state = BuildState::Failed;
        }
        result
    }

    fn run_stages(&mut self, force: &Force) -> Result<BuildReport, BuildError> {
        let started = Instant::now();
        let settings = Arc::clone(&self.settings);

        self.state = BuildState::Walk;
        let mut gallery = Gallery::new(Arc::clone(&settings), &self.bus)?;
        self.state = BuildState::AlbumsBuilt;

        let mut stats = Stats::default();
        let jobs = self.plan(&mut gallery, force, &mut stats)?;
        log::info!(
            "{} media to process, {} up to date",
            jobs.len(),
            stats.total().skipped
        );

        self.state = BuildState::MediaDispatched;
        let results = self.dispatch(&jobs)?;
        if self.cancel.is_cancelled() {
            return Err(BuildError::Interrupted);
        }

        self.state = BuildState::MediaComplete;
        let failures = merge_outcomes(&mut gallery, &jobs, results, &mut stats);

        if settings.write_html {
            writer::write_gallery(&gallery, &self.bus)?;
        }
        self.state = BuildState::Written;

        self.bus.fire(
            &mut Signal::GalleryBuild {
                gallery: &mut gallery,
            },
            &settings,
        )?;
        self.state = BuildState::Done;

        Ok(BuildReport {
            gallery,
            stats,
            failures,
            elapsed: started.elapsed(),
        })
    }

    /// Decide what to process and pick each job's processor.
    fn plan(
        &self,
        gallery: &mut Gallery,
        force: &Force,
        stats: &mut Stats,
    ) -> Result<Vec<Dispatch>, BuildError> {
        let settings = &self.settings;
        let mut jobs = Vec::new();

        for album in &mut gallery.albums {
            let forced = force.is_forced(&album.path);
            let mut album_jobs = Vec::new();

            for media in &mut album.medias {
                if !forced && media.dst_path.exists() {
                    log::debug!("{} is up to date", media_key(&media.album_path, &media.src_filename));
                    media.status = Some(Status::Skipped);
                    stats.record(media.kind, Status::Skipped);
                    continue;
                }

                let mut processor = None;
                self.bus.fire(
                    &mut Signal::ProcessFile {
                        media: &*media,
                        processor: &mut processor,
                    },
                    settings,
                )?;
                album_jobs.push(Dispatch {
                    job: MediaJob::from_media(media, settings),
                    processor: processor.unwrap_or_else(|| default_processor(media.kind)),
                });
            }

            if !album_jobs.is_empty() {
                fs::create_dir_all(&album.dst_path)?;
                if settings.make_thumbs {
                    fs::create_dir_all(album.dst_path.join(&settings.thumb_dir))?;
                }
                if album_jobs.iter().any(|d| d.job.orig_path.is_some()) {
                    fs::create_dir_all(album.dst_path.join(&settings.orig_dir))?;
                }
            }
            jobs.extend(album_jobs);
        }
        Ok(jobs)
    }

    /// Run every job on the worker pool.
    ///
    /// In strict mode the first error stops the pool and is returned.
    fn dispatch(&self, jobs: &[Dispatch]) -> Result<Vec<Result<Outcome, ProcessError>>, BuildError> {
        if jobs.is_empty() {
            return Ok(Vec::new());
        }
        let threads = effective_threads(self.settings.max_processes);
        let pool = rayon::ThreadPoolBuilder::new().num_threads(threads).build()?;
        log::debug!("Processing {} media on {threads} threads", jobs.len());

        let ctx = JobContext {
            settings: &self.settings,
            images: self.images.as_ref(),
            videos: self.videos.as_ref(),
            bus: &self.bus,
            cancel: &self.cancel,
        };
        let run = |dispatch: &Dispatch| {
            dispatch.processor.process(&dispatch.job, &ctx).inspect_err(|e| {
                if !e.is_interrupted() {
                    log::warn!("Failed to process {}: {e}", dispatch.job.key());
                }
            })
        };

        if self.settings.debug {
            pool.install(|| {
                jobs.par_iter()
                    .map(|dispatch| {
                        run(dispatch).map_err(|source| (dispatch.job.key(), source))
                    })
                    .collect::<Result<Vec<_>, _>>()
            })
            .map(|outcomes| outcomes.into_iter().map(Ok).collect())
            .map_err(|(media, source)| {
                if source.is_interrupted() {
                    BuildError::Interrupted
                } else {
                    BuildError::Process { media, source }
                }
            })
        } else {
            Ok(pool.install(|| jobs.par_iter().map(run).collect()))
        }
    }
}

/// Fold worker results back into the album tree and the counters.
fn merge_outcomes(
    gallery: &mut Gallery,
    jobs: &[Dispatch],
    results: Vec<Result<Outcome, ProcessError>>,
    stats: &mut Stats,
) -> Vec<Failure> {
    let mut failures = Vec::new();
    for (dispatch, result) in jobs.iter().zip(results) {
        let job = &dispatch.job;
        let Some(album) = gallery.get_mut(&job.album_path) else {
            continue;
        };
        match result {
            Ok(outcome) => {
                if let Some(media) = album
                    .medias
                    .iter_mut()
                    .find(|m| m.src_filename == job.src_filename)
                {
                    media.status = Some(outcome.status);
                    media.dimensions = outcome.dimensions.or(media.dimensions);
                }
                stats.record(job.kind, outcome.status);
            }
            Err(e) => {
                album.medias.retain(|m| m.src_filename != job.src_filename);
                stats.record(job.kind, Status::Failure);
                failures.push(Failure {
                    media: job.key(),
                    kind: job.kind,
                    reason: e.to_string(),
                });
            }
        }
    }
    failures
}
