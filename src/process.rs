//! Per-media processing, run on the worker pool.
//!
//! The orchestrator snapshots every [`Media`] to process into an owned
//! [`MediaJob`] and hands it to a [`MediaProcessor`]. Workers only read the
//! [`Settings`] and the job; what the parent needs back (status, output
//! dimensions) travels in the returned [`Outcome`] and is merged into the
//! album tree after the pool joins.
//!
//! | Kind | Default processor | Output | Thumbnail |
//! |---|---|---|---|
//! | image | [`ImageProcessor`] | resized (or copied with `use_orig`) | fill + crop or fit |
//! | video | [`VideoProcessor`] | transcoded or copied | frame at `thumb_video_delay` |
//! | audio | [`PlaceholderProcessor`] | copied | note glyph |
//! | non-media | [`PlaceholderProcessor`] | copied | document glyph |

use crate::config::Settings;
use crate::imaging::exif_splice::copy_exif;
use crate::imaging::operations::{plan_resize, plan_save};
use crate::imaging::placeholder::{Glyph, PlaceholderStyle, render_placeholder};
use crate::imaging::{
    BackendError, Dimensions, ImageBackend, ResizeConfig, SaveParams, ThumbnailConfig,
    create_thumbnail, oriented_dimensions,
};
use crate::media::{Media, MediaKind, keeps_original_video};
use crate::metadata::load_exif;
use crate::naming::split_ext;
use crate::plugins::PluginError;
use crate::signals::{Signal, SignalBus, SignalKind};
use crate::video::{PartialOutput, TranscodeParams, VideoBackend, VideoError};
use image::DynamicImage;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Image processing failed: {0}")]
    Imaging(#[from] BackendError),
    #[error("Video processing failed: {0}")]
    Video(#[from] VideoError),
    #[error(transparent)]
    Plugin(#[from] PluginError),
    #[error("Interrupted")]
    Interrupted,
}

impl ProcessError {
    /// An interruption is not a failure of the media itself.
    pub fn is_interrupted(&self) -> bool {
        matches!(self, ProcessError::Interrupted | ProcessError::Video(VideoError::Interrupted))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Success,
    Failure,
    Skipped,
}

/// Shared cancellation flag, tripped by the interrupt handler.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Owned snapshot of one media, safe to move to a worker.
#[derive(Debug, Clone)]
pub struct MediaJob {
    pub album_path: String,
    pub src_filename: String,
    pub kind: MediaKind,
    pub src_path: PathBuf,
    pub dst_path: PathBuf,
    pub thumb_path: PathBuf,
    /// Where the untouched original goes (`keep_orig`).
    pub orig_path: Option<PathBuf>,
    /// EXIF orientation when the parent already read it; `None` defers the
    /// read to the worker.
    pub orientation: Option<Option<u16>>,
}

impl MediaJob {
    pub fn from_media(media: &Media, settings: &Settings) -> Self {
        let dst_dir = settings.destination_dir(&media.album_path);
        Self {
            album_path: media.album_path.clone(),
            src_filename: media.src_filename.clone(),
            kind: media.kind,
            src_path: media.src_path.clone(),
            dst_path: media.dst_path.clone(),
            thumb_path: media.thumb_path.clone(),
            orig_path: media.big.as_ref().map(|big| dst_dir.join(big)),
            orientation: media.cached_file_metadata().map(|m| m.exif.orientation),
        }
    }

    /// `album/filename`, the key used in logs and caches.
    pub fn key(&self) -> String {
        media_key(&self.album_path, &self.src_filename)
    }

    fn orientation(&self) -> Option<u16> {
        self.orientation
            .unwrap_or_else(|| load_exif(&self.src_path).orientation)
    }
}

pub fn media_key(album_path: &str, filename: &str) -> String {
    if album_path == "." {
        filename.to_string()
    } else {
        format!("{album_path}/{filename}")
    }
}

/// What a worker reports back for one job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Outcome {
    pub status: Status,
    pub dimensions: Option<Dimensions>,
}

impl Outcome {
    pub fn success(dimensions: Option<Dimensions>) -> Self {
        Self {
            status: Status::Success,
            dimensions,
        }
    }
}

/// Read-only services a worker may use.
pub struct JobContext<'a> {
    pub settings: &'a Settings,
    pub images: &'a dyn ImageBackend,
    pub videos: &'a dyn VideoBackend,
    pub bus: &'a SignalBus,
    pub cancel: &'a CancelToken,
}

pub trait MediaProcessor: Send + Sync {
    fn process(&self, job: &MediaJob, ctx: &JobContext<'_>) -> Result<Outcome, ProcessError>;
}

/// The processor used when no `ProcessFile` handler picked one.
pub fn default_processor(kind: MediaKind) -> Arc<dyn MediaProcessor> {
    match kind {
        MediaKind::Image => Arc::new(ImageProcessor),
        MediaKind::Video => Arc::new(VideoProcessor),
        MediaKind::Audio => Arc::new(PlaceholderProcessor::new(Glyph::Audio)),
        MediaKind::NonMedia => Arc::new(PlaceholderProcessor::new(Glyph::Document)),
    }
}

/// Copy `src` to `dst`, or symlink it when `link` is set.
pub fn copy_or_link(src: &Path, dst: &Path, link: bool) -> io::Result<()> {
    if dst.symlink_metadata().is_ok() {
        fs::remove_file(dst)?;
    }
    #[cfg(unix)]
    if link {
        let target = std::path::absolute(src)?;
        return std::os::unix::fs::symlink(target, dst);
    }
    #[cfg(not(unix))]
    let _ = link;
    fs::copy(src, dst).map(|_| ())
}

/// Guards the destination (and kept original) of a job until every artifact
/// is written. A job that fails halfway leaves no destination behind, so the
/// next build does not take it for up to date.
struct JobOutputs {
    output: PartialOutput,
    original: Option<PartialOutput>,
}

impl JobOutputs {
    fn new(job: &MediaJob) -> Self {
        Self {
            output: PartialOutput::new(&job.dst_path),
            original: job.orig_path.as_deref().map(PartialOutput::new),
        }
    }

    fn commit(self) {
        self.output.commit();
        if let Some(original) = self.original {
            original.commit();
        }
    }
}

fn check_cancelled(ctx: &JobContext<'_>) -> Result<(), ProcessError> {
    if ctx.cancel.is_cancelled() {
        Err(ProcessError::Interrupted)
    } else {
        Ok(())
    }
}

// =============================================================================
// Images
// =============================================================================

pub struct ImageProcessor;

impl ImageProcessor {
    fn write_output(
        &self,
        job: &MediaJob,
        orientation: Option<u16>,
        ctx: &JobContext<'_>,
    ) -> Result<Dimensions, ProcessError> {
        let settings = ctx.settings;
        if settings.use_orig {
            copy_or_link(&job.src_path, &job.dst_path, settings.orig_link)?;
            let dims = ctx.images.identify(&job.src_path)?;
            let (width, height) =
                oriented_dimensions((dims.width, dims.height), orientation.filter(|_| settings.autorotate_images));
            return Ok(Dimensions { width, height });
        }

        let config = ResizeConfig::from_settings(settings);
        let mut image = ctx.images.resize(&plan_resize(&job.src_path, orientation, &config))?;
        if ctx.bus.is_connected(SignalKind::ImageResized) {
            ctx.bus.fire(
                &mut Signal::ImageResized {
                    image: &mut image,
                    job,
                },
                settings,
            )?;
        }

        ctx.images.save(&image, &plan_save(&job.dst_path, &config))?;
        if settings.copy_exif_data && is_jpeg(&job.dst_path) {
            let rotated = settings.autorotate_images && orientation.is_some_and(|o| o != 1);
            if !copy_exif(&job.src_path, &job.dst_path, rotated)? {
                log::debug!("{}: no EXIF block to copy", job.key());
            }
        }

        Ok(Dimensions {
            width: image.width(),
            height: image.height(),
        })
    }
}

impl MediaProcessor for ImageProcessor {
    fn process(&self, job: &MediaJob, ctx: &JobContext<'_>) -> Result<Outcome, ProcessError> {
        check_cancelled(ctx)?;
        let settings = ctx.settings;
        let orientation = job.orientation();
        let outputs = JobOutputs::new(job);

        let dimensions = self.write_output(job, orientation, ctx)?;

        if let Some(orig) = &job.orig_path {
            copy_or_link(&job.src_path, orig, settings.orig_link)?;
        }

        if settings.make_thumbs {
            let guard = PartialOutput::new(&job.thumb_path);
            create_thumbnail(
                ctx.images,
                &job.src_path,
                &job.thumb_path,
                orientation,
                &ThumbnailConfig::from_settings(settings),
            )?;
            guard.commit();
        }

        outputs.commit();
        log::debug!("Processed image {}", job.key());
        Ok(Outcome::success(Some(dimensions)))
    }
}

fn is_jpeg(path: &Path) -> bool {
    let (_, ext) = split_ext(path.file_name().and_then(|n| n.to_str()).unwrap_or_default());
    matches!(ext.to_lowercase().as_str(), ".jpg" | ".jpeg")
}

// =============================================================================
// Videos
// =============================================================================

pub struct VideoProcessor;

impl MediaProcessor for VideoProcessor {
    fn process(&self, job: &MediaJob, ctx: &JobContext<'_>) -> Result<Outcome, ProcessError> {
        check_cancelled(ctx)?;
        let settings = ctx.settings;
        let (_, ext) = split_ext(&job.src_filename);
        let outputs = JobOutputs::new(job);

        if keeps_original_video(ext, settings) {
            copy_or_link(&job.src_path, &job.dst_path, settings.orig_link)?;
        } else {
            let params = TranscodeParams::from_settings(&job.src_path, &job.dst_path, settings);
            ctx.videos.transcode(&params, ctx.cancel)?;
        }

        if settings.make_thumbs {
            check_cancelled(ctx)?;
            let frame = frame_path(&job.thumb_path);
            let result = ctx
                .videos
                .extract_frame(&job.src_path, &frame, settings.thumb_video_delay, ctx.cancel)
                .map_err(ProcessError::from)
                .and_then(|()| {
                    let guard = PartialOutput::new(&job.thumb_path);
                    create_thumbnail(
                        ctx.images,
                        &frame,
                        &job.thumb_path,
                        None,
                        &ThumbnailConfig::from_settings(settings),
                    )?;
                    guard.commit();
                    Ok(())
                });
            if frame.exists() {
                fs::remove_file(&frame)?;
            }
            result?;
        }

        outputs.commit();
        log::debug!("Processed video {}", job.key());
        Ok(Outcome::success(None))
    }
}

/// Scratch file for the extracted frame, next to the thumbnail.
fn frame_path(thumb_path: &Path) -> PathBuf {
    let name = thumb_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    thumb_path.with_file_name(format!(".{name}.frame.jpg"))
}

// =============================================================================
// Audio and other files
// =============================================================================

/// Copies the file and draws a synthetic thumbnail.
pub struct PlaceholderProcessor {
    pub glyph: Glyph,
    pub style: PlaceholderStyle,
    /// Print the upper-cased extension under the glyph.
    pub extension_label: bool,
}

impl PlaceholderProcessor {
    pub fn new(glyph: Glyph) -> Self {
        Self {
            glyph,
            style: PlaceholderStyle::default(),
            extension_label: false,
        }
    }

    fn label(&self, job: &MediaJob) -> Option<String> {
        let (_, ext) = split_ext(&job.src_filename);
        (self.extension_label && !ext.is_empty()).then(|| ext.trim_start_matches('.').to_uppercase())
    }
}

impl MediaProcessor for PlaceholderProcessor {
    fn process(&self, job: &MediaJob, ctx: &JobContext<'_>) -> Result<Outcome, ProcessError> {
        check_cancelled(ctx)?;
        let settings = ctx.settings;
        let outputs = JobOutputs::new(job);
        copy_or_link(&job.src_path, &job.dst_path, settings.orig_link)?;

        if settings.make_thumbs {
            let (width, height) = settings.thumb_size.as_tuple();
            let label = self.label(job);
            let thumb = render_placeholder(width, height, self.glyph, label.as_deref(), &self.style);
            let guard = PartialOutput::new(&job.thumb_path);
            ctx.images.save(
                &DynamicImage::ImageRgb8(thumb),
                &SaveParams {
                    output: job.thumb_path.clone(),
                    quality: ThumbnailConfig::from_settings(settings).quality,
                },
            )?;
            guard.commit();
        }

        outputs.commit();
        log::debug!("Copied {} {}", job.kind, job.key());
        Ok(Outcome::success(None))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::RustBackend;
    use crate::imaging::backend::tests::{MockBackend, RecordedOp};
    use crate::test_helpers::{ExifFixture, settings_for, write_jpeg, write_jpeg_with_exif};
    use crate::video::tests::MockVideoBackend;
    use std::sync::Mutex;
    use tempfile::TempDir;

    struct Fixture {
        _tmp: TempDir,
        settings: Settings,
        bus: SignalBus,
        videos: MockVideoBackend,
        cancel: CancelToken,
    }

    impl Fixture {
        fn new() -> Self {
            let tmp = TempDir::new().unwrap();
            let settings = settings_for(tmp.path());
            Self {
                _tmp: tmp,
                settings,
                bus: SignalBus::new(),
                videos: MockVideoBackend::default(),
                cancel: CancelToken::new(),
            }
        }

        fn ctx<'a>(&'a self, images: &'a dyn ImageBackend) -> JobContext<'a> {
            JobContext {
                settings: &self.settings,
                images,
                videos: &self.videos,
                bus: &self.bus,
                cancel: &self.cancel,
            }
        }

        /// Source file in `album`, with its destination directories created.
        fn job(&self, kind: MediaKind, album: &str, filename: &str) -> MediaJob {
            let media = Media::new(kind, filename, album, &self.settings);
            let job = MediaJob::from_media(&media, &self.settings);
            fs::create_dir_all(job.thumb_path.parent().unwrap()).unwrap();
            if let Some(orig) = &job.orig_path {
                fs::create_dir_all(orig.parent().unwrap()).unwrap();
            }
            job
        }
    }

    // =========================================================================
    // Jobs
    // =========================================================================

    #[test]
    fn job_snapshot_paths() {
        let mut fx = Fixture::new();
        fx.settings.keep_orig = true;
        let media = Media::new(MediaKind::Image, "dawn.jpg", "trips/alps", &fx.settings);
        let job = MediaJob::from_media(&media, &fx.settings);

        let dst = fx.settings.destination.join("trips/alps");
        assert_eq!(job.dst_path, dst.join("dawn.jpg"));
        assert_eq!(job.thumb_path, dst.join("thumbnails/dawn.jpg"));
        assert_eq!(job.orig_path, Some(dst.join("original/dawn.jpg")));
        assert_eq!(job.orientation, None);
        assert_eq!(job.key(), "trips/alps/dawn.jpg");
    }

    #[test]
    fn root_media_key_has_no_prefix() {
        assert_eq!(media_key(".", "a.jpg"), "a.jpg");
        assert_eq!(media_key("x", "a.jpg"), "x/a.jpg");
    }

    #[test]
    fn default_processor_per_kind_runs() {
        // Every kind has a processor; smoke test through an audio copy.
        let fx = Fixture::new();
        let job = fx.job(MediaKind::Audio, ".", "song.mp3");
        fs::write(&job.src_path, b"ID3").unwrap();

        let backend = RustBackend::new();
        let outcome = default_processor(MediaKind::Audio)
            .process(&job, &fx.ctx(&backend))
            .unwrap();

        assert_eq!(outcome.status, Status::Success);
        assert_eq!(fs::read(&job.dst_path).unwrap(), b"ID3");
        assert!(job.thumb_path.ends_with("thumbnails/song.jpg"));
        assert!(job.thumb_path.exists());
    }

    // =========================================================================
    // Images
    // =========================================================================

    #[test]
    fn image_resize_save_and_thumbnail_with_mock() {
        let fx = Fixture::new();
        let job = fx.job(MediaKind::Image, ".", "dawn.jpg");
        let backend = MockBackend::new();

        let outcome = ImageProcessor.process(&job, &fx.ctx(&backend)).unwrap();

        assert_eq!(
            outcome.dimensions,
            Some(Dimensions {
                width: 640,
                height: 480
            })
        );
        let ops = backend.get_operations();
        assert!(matches!(&ops[0], RecordedOp::Resize { max_width: 640, max_height: 480, .. }));
        assert!(matches!(&ops[1], RecordedOp::Save { width: 640, height: 480, quality: 85, .. }));
        assert!(matches!(&ops[2], RecordedOp::Thumbnail { width: 200, height: 150, fit: true, .. }));
    }

    #[test]
    fn image_without_thumbnails() {
        let mut fx = Fixture::new();
        fx.settings.make_thumbs = false;
        let job = fx.job(MediaKind::Image, ".", "dawn.jpg");
        let backend = MockBackend::new();

        ImageProcessor.process(&job, &fx.ctx(&backend)).unwrap();
        assert!(
            !backend
                .get_operations()
                .iter()
                .any(|op| matches!(op, RecordedOp::Thumbnail { .. }))
        );
    }

    #[test]
    fn image_failure_is_an_error() {
        let fx = Fixture::new();
        let job = fx.job(MediaKind::Image, ".", "broken.jpg");
        let backend = MockBackend::failing_on("broken");

        let result = ImageProcessor.process(&job, &fx.ctx(&backend));
        assert!(matches!(result, Err(ProcessError::Imaging(_))));
    }

    #[test]
    fn image_resized_handlers_edit_pixels_before_save() {
        let mut fx = Fixture::new();
        fx.bus.connect(SignalKind::ImageResized, "shrink", |signal, _| {
            if let Signal::ImageResized { image, .. } = signal {
                **image = image.thumbnail(10, 10);
            }
            Ok(())
        });
        let job = fx.job(MediaKind::Image, ".", "dawn.jpg");
        let backend = MockBackend::new();

        let outcome = ImageProcessor.process(&job, &fx.ctx(&backend)).unwrap();

        assert_eq!(outcome.dimensions.map(|d| d.width), Some(10));
        assert!(
            backend
                .get_operations()
                .iter()
                .any(|op| matches!(op, RecordedOp::Save { width: 10, .. }))
        );
    }

    #[test]
    fn real_image_end_to_end_with_original_and_exif() {
        let mut fx = Fixture::new();
        fx.settings.keep_orig = true;
        fx.settings.copy_exif_data = true;
        let job = fx.job(MediaKind::Image, "album", "tall.jpg");
        write_jpeg_with_exif(
            &job.src_path,
            800,
            400,
            &ExifFixture {
                orientation: Some(6),
                description: Some("Harbour"),
                datetime: None,
                xp_title: None,
            },
        );

        let backend = RustBackend::new();
        let outcome = ImageProcessor.process(&job, &fx.ctx(&backend)).unwrap();

        // Orientation 6 swaps axes: 400x800 fitted into 640x480.
        assert_eq!(
            outcome.dimensions,
            Some(Dimensions {
                width: 240,
                height: 480
            })
        );
        assert!(job.orig_path.as_ref().unwrap().exists());
        assert!(job.thumb_path.exists());

        let exif = load_exif(&job.dst_path);
        assert_eq!(exif.description.as_deref(), Some("Harbour"));
        assert_eq!(exif.orientation, Some(1));
    }

    #[test]
    fn use_orig_copies_and_reports_source_size() {
        let mut fx = Fixture::new();
        fx.settings.use_orig = true;
        fx.settings.make_thumbs = false;
        let job = fx.job(MediaKind::Image, ".", "big.jpg");
        write_jpeg(&job.src_path, 1000, 700);

        let backend = RustBackend::new();
        let outcome = ImageProcessor.process(&job, &fx.ctx(&backend)).unwrap();

        assert_eq!(fs::read(&job.src_path).unwrap(), fs::read(&job.dst_path).unwrap());
        assert_eq!(
            outcome.dimensions,
            Some(Dimensions {
                width: 1000,
                height: 700
            })
        );
    }

    #[test]
    fn cancelled_job_does_not_start() {
        let fx = Fixture::new();
        fx.cancel.cancel();
        let job = fx.job(MediaKind::Image, ".", "a.jpg");
        let backend = MockBackend::new();

        let err = ImageProcessor.process(&job, &fx.ctx(&backend)).unwrap_err();
        assert!(err.is_interrupted());
        assert!(backend.get_operations().is_empty());
    }

    // =========================================================================
    // Videos
    // =========================================================================

    #[test]
    fn video_transcodes_and_thumbnails_from_frame() {
        let fx = Fixture::new();
        let job = fx.job(MediaKind::Video, ".", "clip.ogv");
        fs::write(&job.src_path, b"ogv").unwrap();

        let backend = MockBackend::new();
        VideoProcessor.process(&job, &fx.ctx(&backend)).unwrap();

        let transcoded = fx.videos.transcoded.lock().unwrap();
        assert_eq!(transcoded.len(), 1);
        assert!(transcoded[0].output.ends_with("clip.webm"));
        assert!(job.dst_path.exists());

        let ops = backend.get_operations();
        assert!(matches!(&ops[0], RecordedOp::Thumbnail { source, .. } if source.ends_with(".clip.jpg.frame.jpg")));
        assert!(!frame_path(&job.thumb_path).exists());
    }

    #[test]
    fn html5_video_is_copied_with_use_orig() {
        let mut fx = Fixture::new();
        fx.settings.use_orig = true;
        fx.settings.make_thumbs = false;
        let job = fx.job(MediaKind::Video, ".", "clip.mp4");
        fs::write(&job.src_path, b"mp4").unwrap();

        let backend = MockBackend::new();
        VideoProcessor.process(&job, &fx.ctx(&backend)).unwrap();

        assert!(fx.videos.transcoded.lock().unwrap().is_empty());
        assert_eq!(fs::read(&job.dst_path).unwrap(), b"mp4");
    }

    #[test]
    fn failed_thumbnail_leaves_no_destination() {
        let mut fx = Fixture::new();
        fx.videos.fail_frame = true;
        let job = fx.job(MediaKind::Video, ".", "clip.ogv");
        fs::write(&job.src_path, b"ogv").unwrap();

        let backend = MockBackend::new();
        let result = VideoProcessor.process(&job, &fx.ctx(&backend));

        assert!(matches!(result, Err(ProcessError::Video(_))));
        assert_eq!(fx.videos.transcoded.lock().unwrap().len(), 1);
        assert!(!job.dst_path.exists());
        assert!(!job.thumb_path.exists());
    }

    #[test]
    fn failed_image_thumbnail_removes_output_and_original() {
        let mut fx = Fixture::new();
        fx.settings.keep_orig = true;
        fx.settings.use_orig = true;
        let job = fx.job(MediaKind::Image, ".", "dawn.jpg");
        write_jpeg(&job.src_path, 20, 10);

        let backend = MockBackend {
            identify_results: Mutex::new(vec![Dimensions {
                width: 20,
                height: 10,
            }]),
            fail_on: Some("dawn".into()),
            ..MockBackend::default()
        };
        let result = ImageProcessor.process(&job, &fx.ctx(&backend));

        assert!(matches!(result, Err(ProcessError::Imaging(_))));
        assert!(
            backend
                .get_operations()
                .iter()
                .any(|op| matches!(op, RecordedOp::Thumbnail { .. }))
        );
        assert!(!job.dst_path.exists());
        assert!(!job.orig_path.as_ref().unwrap().exists());
    }

    #[test]
    fn transcode_failure_is_an_error() {
        let mut fx = Fixture::new();
        fx.videos.fail = true;
        let job = fx.job(MediaKind::Video, ".", "clip.avi");

        let backend = MockBackend::new();
        let result = VideoProcessor.process(&job, &fx.ctx(&backend));
        assert!(matches!(result, Err(ProcessError::Video(_))));
    }

    // =========================================================================
    // Placeholders
    // =========================================================================

    #[test]
    fn placeholder_thumbnail_has_thumb_size() {
        let fx = Fixture::new();
        let job = fx.job(MediaKind::NonMedia, ".", "notes.pdf");
        fs::write(&job.src_path, b"%PDF").unwrap();

        let backend = MockBackend::new();
        PlaceholderProcessor {
            extension_label: true,
            ..PlaceholderProcessor::new(Glyph::Document)
        }
        .process(&job, &fx.ctx(&backend))
        .unwrap();
        let saved = backend.get_operations().into_iter().find_map(|op| match op {
            RecordedOp::Save { output, width, height, .. } => Some((output, width, height)),
            _ => None,
        });

        let (output, width, height) = saved.unwrap();
        assert!(output.ends_with("thumbnails/notes.jpg"));
        assert_eq!((width, height), (200, 150));
        assert_eq!(fs::read(&job.dst_path).unwrap(), b"%PDF");
    }

    #[test]
    fn extension_label_is_upper_cased() {
        let fx = Fixture::new();
        let job = fx.job(MediaKind::NonMedia, ".", "notes.pdf");
        let labelled = PlaceholderProcessor {
            extension_label: true,
            ..PlaceholderProcessor::new(Glyph::Document)
        };
        assert_eq!(labelled.label(&job).as_deref(), Some("PDF"));
        assert_eq!(PlaceholderProcessor::new(Glyph::Document).label(&job), None);
    }

    #[cfg(unix)]
    #[test]
    fn copy_or_link_symlinks() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("a.txt");
        let dst = tmp.path().join("b.txt");
        fs::write(&src, b"x").unwrap();

        copy_or_link(&src, &dst, true).unwrap();
        assert!(dst.symlink_metadata().unwrap().file_type().is_symlink());

        // Replacing a link with a copy works too.
        copy_or_link(&src, &dst, false).unwrap();
        assert!(!dst.symlink_metadata().unwrap().file_type().is_symlink());
    }
}
