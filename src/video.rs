//! Video transcoding and frame extraction through an external encoder.
//!
//! The encoder (`ffmpeg` by default, `video_converter` in the config) runs as
//! a child process. While it runs the worker polls the build's
//! [`CancelToken`]; on cancellation the child is killed and the partial
//! output is removed, so a later "destination exists" check never mistakes a
//! truncated file for a finished one.

use crate::config::Settings;
use crate::process::CancelToken;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::Duration;
use thiserror::Error;

const POLL_INTERVAL: Duration = Duration::from_millis(50);

#[derive(Error, Debug)]
pub enum VideoError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Video converter {0:?} not found")]
    ConverterNotFound(String),
    #[error("{converter} failed on {} ({status}): {stderr}", path.display())]
    Failed {
        converter: String,
        path: PathBuf,
        status: ExitStatus,
        stderr: String,
    },
    #[error("Interrupted")]
    Interrupted,
}

/// Transcode `source` into `output`, fitting inside `max_width` × `max_height`.
#[derive(Debug, Clone, PartialEq)]
pub struct TranscodeParams {
    pub source: PathBuf,
    pub output: PathBuf,
    pub max_width: u32,
    pub max_height: u32,
    /// Extra encoder arguments (`webm_options` / `mp4_options`).
    pub options: Vec<String>,
}

impl TranscodeParams {
    pub fn from_settings(source: &Path, output: &Path, settings: &Settings) -> Self {
        let options = if settings.video_format == "mp4" {
            &settings.mp4_options
        } else {
            &settings.webm_options
        };
        let (max_width, max_height) = settings.video_size.as_tuple();
        Self {
            source: source.to_path_buf(),
            output: output.to_path_buf(),
            max_width,
            max_height,
            options: options.to_vec(),
        }
    }
}

pub trait VideoBackend: Send + Sync {
    fn transcode(&self, params: &TranscodeParams, cancel: &CancelToken) -> Result<(), VideoError>;

    /// Write one frame at `at_seconds` as an image.
    fn extract_frame(
        &self,
        source: &Path,
        output: &Path,
        at_seconds: f64,
        cancel: &CancelToken,
    ) -> Result<(), VideoError>;
}

/// Removes the file on drop unless [`commit`](Self::commit)ted.
pub struct PartialOutput {
    path: PathBuf,
    committed: bool,
}

impl PartialOutput {
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            committed: false,
        }
    }

    pub fn commit(mut self) {
        self.committed = true;
    }
}

impl Drop for PartialOutput {
    fn drop(&mut self) {
        if !self.committed && self.path.exists() {
            match fs::remove_file(&self.path) {
                Ok(()) => log::debug!("Removed partial output {}", self.path.display()),
                Err(e) => log::warn!("Could not remove {}: {e}", self.path.display()),
            }
        }
    }
}

pub struct FfmpegBackend {
    converter: String,
}

impl FfmpegBackend {
    pub fn new(converter: &str) -> Self {
        Self {
            converter: converter.to_string(),
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(&settings.video_converter)
    }

    /// Arguments of a transcode run.
    pub fn transcode_args(params: &TranscodeParams) -> Vec<String> {
        let scale = format!(
            "scale='min({w},iw)':'min({h},ih)':force_original_aspect_ratio=decrease:force_divisible_by=2",
            w = params.max_width,
            h = params.max_height
        );
        let mut args = vec![
            "-i".to_string(),
            params.source.to_string_lossy().into_owned(),
            "-y".to_string(),
            "-vf".to_string(),
            scale,
        ];
        args.extend(params.options.iter().cloned());
        args.push(params.output.to_string_lossy().into_owned());
        args
    }

    pub fn frame_args(source: &Path, output: &Path, at_seconds: f64) -> Vec<String> {
        vec![
            "-ss".to_string(),
            format!("{:.3}", at_seconds.max(0.0)),
            "-i".to_string(),
            source.to_string_lossy().into_owned(),
            "-an".to_string(),
            "-frames:v".to_string(),
            "1".to_string(),
            "-y".to_string(),
            output.to_string_lossy().into_owned(),
        ]
    }

    fn run(&self, args: &[String], source: &Path, cancel: &CancelToken) -> Result<(), VideoError> {
        log::debug!("{} {}", self.converter, args.join(" "));
        let mut child = Command::new(&self.converter)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| match e.kind() {
                io::ErrorKind::NotFound => VideoError::ConverterNotFound(self.converter.clone()),
                _ => VideoError::Io(e),
            })?;

        // Drain stderr on a thread so a chatty encoder never blocks on a full pipe.
        let stderr = child.stderr.take().map(|mut pipe| {
            thread::spawn(move || {
                let mut out = String::new();
                let _ = pipe.read_to_string(&mut out);
                out
            })
        });

        let status = wait_or_cancel(&mut child, cancel)?;
        let stderr = stderr
            .and_then(|handle| handle.join().ok())
            .unwrap_or_default();

        if status.success() {
            Ok(())
        } else {
            Err(VideoError::Failed {
                converter: self.converter.clone(),
                path: source.to_path_buf(),
                status,
                stderr: last_lines(&stderr, 5),
            })
        }
    }
}

fn wait_or_cancel(child: &mut Child, cancel: &CancelToken) -> Result<ExitStatus, VideoError> {
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(status);
        }
        if cancel.is_cancelled() {
            let _ = child.kill();
            let _ = child.wait();
            return Err(VideoError::Interrupted);
        }
        thread::sleep(POLL_INTERVAL);
    }
}

fn last_lines(text: &str, n: usize) -> String {
    let lines: Vec<&str> = text.trim_end().lines().collect();
    lines[lines.len().saturating_sub(n)..].join("\n")
}

impl VideoBackend for FfmpegBackend {
    fn transcode(&self, params: &TranscodeParams, cancel: &CancelToken) -> Result<(), VideoError> {
        let guard = PartialOutput::new(&params.output);
        self.run(&Self::transcode_args(params), &params.source, cancel)?;
        guard.commit();
        Ok(())
    }

    fn extract_frame(
        &self,
        source: &Path,
        output: &Path,
        at_seconds: f64,
        cancel: &CancelToken,
    ) -> Result<(), VideoError> {
        let guard = PartialOutput::new(output);
        self.run(&Self::frame_args(source, output, at_seconds), source, cancel)?;
        guard.commit();
        Ok(())
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use crate::test_helpers::write_jpeg;
    use std::sync::Mutex;

    /// Stand-in encoder: writes a placeholder file instead of running ffmpeg.
    #[derive(Default)]
    pub struct MockVideoBackend {
        pub transcoded: Mutex<Vec<TranscodeParams>>,
        pub fail: bool,
        /// Transcoding succeeds but no frame can be extracted.
        pub fail_frame: bool,
    }

    impl VideoBackend for MockVideoBackend {
        fn transcode(&self, params: &TranscodeParams, _cancel: &CancelToken) -> Result<(), VideoError> {
            self.transcoded.lock().unwrap().push(params.clone());
            if self.fail {
                return Err(VideoError::ConverterNotFound("mock".into()));
            }
            fs::write(&params.output, b"video")?;
            Ok(())
        }

        fn extract_frame(
            &self,
            _source: &Path,
            output: &Path,
            _at_seconds: f64,
            _cancel: &CancelToken,
        ) -> Result<(), VideoError> {
            if self.fail_frame {
                return Err(VideoError::Io(io::Error::other("no decodable frame")));
            }
            write_jpeg(output, 64, 48);
            Ok(())
        }
    }

    #[test]
    fn transcode_args_include_scale_and_options() {
        let settings = Settings::default();
        let params =
            TranscodeParams::from_settings(Path::new("/in/clip.ogv"), Path::new("/out/clip.webm"), &settings);
        let args = FfmpegBackend::transcode_args(&params);

        assert_eq!(&args[..3], &["-i", "/in/clip.ogv", "-y"]);
        assert!(args[4].starts_with("scale='min(480,iw)':'min(360,ih)'"));
        assert_eq!(args.last().map(String::as_str), Some("/out/clip.webm"));
        for option in settings.webm_options.iter() {
            assert!(args.contains(option));
        }
    }

    #[test]
    fn mp4_uses_mp4_options() {
        let settings = Settings {
            video_format: "mp4".into(),
            ..Settings::default()
        };
        let params = TranscodeParams::from_settings(Path::new("a.avi"), Path::new("a.mp4"), &settings);
        assert_eq!(params.options, settings.mp4_options.to_vec());
    }

    #[test]
    fn frame_args_seek_before_input() {
        let args = FfmpegBackend::frame_args(Path::new("v.mp4"), Path::new("f.jpg"), 2.5);
        assert_eq!(&args[..4], &["-ss", "2.500", "-i", "v.mp4"]);
    }

    #[test]
    fn partial_output_removed_unless_committed() {
        let tmp = tempfile::TempDir::new().unwrap();
        let dropped = tmp.path().join("dropped.webm");
        let kept = tmp.path().join("kept.webm");
        fs::write(&dropped, b"partial").unwrap();
        fs::write(&kept, b"done").unwrap();

        drop(PartialOutput::new(&dropped));
        PartialOutput::new(&kept).commit();

        assert!(!dropped.exists());
        assert!(kept.exists());
    }

    #[test]
    fn missing_converter_is_reported() {
        let backend = FfmpegBackend::new("gallerist-no-such-encoder");
        let tmp = tempfile::TempDir::new().unwrap();
        let params = TranscodeParams {
            source: tmp.path().join("in.avi"),
            output: tmp.path().join("out.webm"),
            max_width: 10,
            max_height: 10,
            options: Vec::new(),
        };
        let result = backend.transcode(&params, &CancelToken::new());
        assert!(matches!(result, Err(VideoError::ConverterNotFound(_))));
    }

    #[cfg(unix)]
    #[test]
    fn cancellation_kills_child_and_removes_output() {
        let tmp = tempfile::TempDir::new().unwrap();
        let output = tmp.path().join("out.webm");
        fs::write(&output, b"partial").unwrap();

        let backend = FfmpegBackend::new("sleep");
        let cancel = CancelToken::new();
        cancel.cancel();
        let result = {
            let guard = PartialOutput::new(&output);
            let result = backend.run(&["5".to_string()], Path::new("in"), &cancel);
            if result.is_ok() {
                guard.commit();
            }
            result
        };
        assert!(matches!(result, Err(VideoError::Interrupted)));
        assert!(!output.exists());
    }

    #[test]
    fn last_lines_keeps_tail() {
        assert_eq!(last_lines("a\nb\nc\n", 2), "b\nc");
        assert_eq!(last_lines("", 3), "");
    }
}
