use crate::encode::sink::{FrameSink, SinkConfig};
use crate::foundation::core::FrameIndex;
use crate::foundation::error::{ScrawlError, ScrawlResult};
use crate::surface::FrameRGBA;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::atomic::{AtomicU64, Ordering};

static TEMP_DIR_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Options for [`FfmpegSequenceSink`] MP4 output.
#[derive(Clone, Debug)]
pub struct FfmpegSequenceOpts {
    /// Output MP4 file path.
    pub out_path: PathBuf,
    /// Encoder binary to invoke. Defaults to `ffmpeg` resolved on PATH.
    pub encoder: PathBuf,
    /// Overwrite the output file if it already exists.
    pub overwrite: bool,
}

impl FfmpegSequenceOpts {
    /// Create options for outputting an MP4 to `out_path`.
    pub fn new(out_path: impl Into<PathBuf>) -> Self {
        Self {
            out_path: out_path.into(),
            encoder: PathBuf::from("ffmpeg"),
            overwrite: true,
        }
    }
}

/// Sink that buffers every captured frame in memory, then on `end` writes a numbered
/// PNG sequence to a fresh temporary directory and invokes the external encoder on it.
///
/// The output file is not touched until encoding actually runs: a missing encoder or a
/// failed capture leaves the destination exactly as it was.
pub struct FfmpegSequenceSink {
    opts: FfmpegSequenceOpts,
    cfg: Option<SinkConfig>,
    frames: Vec<FrameRGBA>,
    last_idx: Option<FrameIndex>,
}

impl FfmpegSequenceSink {
    /// Create a new sink encoding into `opts.out_path`.
    pub fn new(opts: FfmpegSequenceOpts) -> Self {
        Self {
            opts,
            cfg: None,
            frames: Vec::new(),
            last_idx: None,
        }
    }

    /// Number of frames buffered so far.
    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    fn write_sequence(&self, dir: &Path) -> ScrawlResult<()> {
        for (i, frame) in self.frames.iter().enumerate() {
            let path = dir.join(format!("frame_{i:04}.png"));
            let img: image::RgbaImage =
                image::RgbaImage::from_raw(frame.width, frame.height, frame.data.clone())
                    .ok_or_else(|| {
                        ScrawlError::encode("frame buffer does not match its dimensions")
                    })?;
            img.save(&path).map_err(|e| {
                ScrawlError::encode(format!("failed to write '{}': {e}", path.display()))
            })?;
        }
        Ok(())
    }
}

impl FrameSink for FfmpegSequenceSink {
    fn begin(&mut self, cfg: SinkConfig) -> ScrawlResult<()> {
        if cfg.fps.num == 0 || cfg.fps.den == 0 {
            return Err(ScrawlError::validation("fps must be non-zero"));
        }
        if cfg.width == 0 || cfg.height == 0 {
            return Err(ScrawlError::validation(
                "encoder sink width/height must be non-zero",
            ));
        }
        if cfg.width % 2 != 0 || cfg.height % 2 != 0 {
            return Err(ScrawlError::validation(
                "encoder sink width/height must be even (required for yuv420p mp4 output)",
            ));
        }

        ensure_parent_dir(&self.opts.out_path)?;
        if !self.opts.overwrite && self.opts.out_path.exists() {
            return Err(ScrawlError::validation(format!(
                "output file '{}' already exists",
                self.opts.out_path.display()
            )));
        }

        // Fail before any frame work when the encoder is unusable.
        if !encoder_available(&self.opts.encoder) {
            return Err(ScrawlError::encode(format!(
                "encoder '{}' is required for MP4 output, but could not be invoked",
                self.opts.encoder.display()
            )));
        }

        self.frames.clear();
        self.last_idx = None;
        self.cfg = Some(cfg);
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRGBA) -> ScrawlResult<()> {
        let cfg = self
            .cfg
            .as_ref()
            .ok_or_else(|| ScrawlError::encode("encoder sink not started"))?;
        if let Some(last) = self.last_idx {
            if idx.0 <= last.0 {
                return Err(ScrawlError::encode(
                    "encoder sink received out-of-order frame index",
                ));
            }
        }
        self.last_idx = Some(idx);

        if frame.width != cfg.width || frame.height != cfg.height {
            return Err(ScrawlError::validation(format!(
                "frame size mismatch: got {}x{}, expected {}x{}",
                frame.width, frame.height, cfg.width, cfg.height
            )));
        }
        if frame.data.len() != (cfg.width * cfg.height * 4) as usize {
            return Err(ScrawlError::validation(
                "frame.data size mismatch with width*height*4",
            ));
        }

        self.frames.push(frame.clone());
        Ok(())
    }

    fn end(&mut self) -> ScrawlResult<()> {
        let cfg = self
            .cfg
            .take()
            .ok_or_else(|| ScrawlError::encode("encoder sink not started"))?;
        if self.frames.is_empty() {
            return Err(ScrawlError::encode("no frames were captured"));
        }

        let frame_count = self.frames.len();
        let dir = fresh_temp_dir()?;
        let result = self
            .write_sequence(&dir)
            .and_then(|()| run_encoder(&self.opts, &cfg, &dir, frame_count));
        // Best-effort cleanup either way; the sequence is transient.
        let _ = std::fs::remove_dir_all(&dir);
        self.frames.clear();
        result?;

        tracing::info!(
            frames = frame_count,
            out = %self.opts.out_path.display(),
            "encoded frame sequence"
        );
        Ok(())
    }
}

fn run_encoder(
    opts: &FfmpegSequenceOpts,
    cfg: &SinkConfig,
    dir: &Path,
    frame_count: usize,
) -> ScrawlResult<()> {
    let mut cmd = Command::new(&opts.encoder);
    cmd.stdin(Stdio::null()).stdout(Stdio::null()).stderr(Stdio::piped());
    if opts.overwrite {
        cmd.arg("-y");
    } else {
        cmd.arg("-n");
    }
    cmd.args([
        "-loglevel",
        "error",
        "-framerate",
        &format!("{}/{}", cfg.fps.num, cfg.fps.den),
        "-i",
    ])
    .arg(dir.join("frame_%04d.png"))
    .args([
        "-frames:v",
        &frame_count.to_string(),
        "-c:v",
        "libx264",
        "-pix_fmt",
        "yuv420p",
        "-movflags",
        "+faststart",
    ])
    .arg(&opts.out_path);

    let output = cmd.output().map_err(|e| {
        ScrawlError::encode(format!(
            "failed to spawn encoder '{}': {e}",
            opts.encoder.display()
        ))
    })?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(ScrawlError::encode(format!(
            "encoder exited with status {}: {}",
            output.status,
            stderr.trim()
        )));
    }
    Ok(())
}

fn fresh_temp_dir() -> ScrawlResult<PathBuf> {
    let n = TEMP_DIR_COUNTER.fetch_add(1, Ordering::Relaxed);
    let dir = std::env::temp_dir().join(format!("scrawl_frames_{}_{n}", std::process::id()));
    if dir.exists() {
        std::fs::remove_dir_all(&dir).map_err(|e| {
            ScrawlError::encode(format!(
                "failed to clear stale frame directory '{}': {e}",
                dir.display()
            ))
        })?;
    }
    std::fs::create_dir_all(&dir).map_err(|e| {
        ScrawlError::encode(format!(
            "failed to create frame directory '{}': {e}",
            dir.display()
        ))
    })?;
    Ok(dir)
}

/// Ensure the parent directory of `path` exists.
pub fn ensure_parent_dir(path: &Path) -> ScrawlResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            use anyhow::Context as _;
            std::fs::create_dir_all(parent).with_context(|| {
                format!("failed to create output directory '{}'", parent.display())
            })?;
        }
    }
    Ok(())
}

/// Return `true` when `encoder -version` runs successfully.
pub fn encoder_available(encoder: &Path) -> bool {
    Command::new(encoder)
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

/// Default output location: `output.mp4` next to the running executable, falling back to
/// the current directory.
pub fn default_output_path() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."))
        .join("output.mp4")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::core::Fps;

    fn cfg(width: u32, height: u32) -> SinkConfig {
        SinkConfig {
            width,
            height,
            fps: Fps::new(30, 1).unwrap(),
        }
    }

    fn bogus_sink(out: &Path) -> FfmpegSequenceSink {
        let mut opts = FfmpegSequenceOpts::new(out);
        opts.encoder = PathBuf::from("/nonexistent/scrawl-test-encoder");
        FfmpegSequenceSink::new(opts)
    }

    #[test]
    fn missing_encoder_fails_begin_and_leaves_destination_untouched() {
        let out = std::env::temp_dir().join("scrawl_test_missing_encoder.mp4");
        let _ = std::fs::remove_file(&out);
        let mut sink = bogus_sink(&out);
        let err = sink.begin(cfg(8, 8)).unwrap_err();
        assert!(err.to_string().contains("could not be invoked"));
        assert!(!out.exists());
    }

    #[test]
    fn odd_dimensions_are_rejected() {
        let out = std::env::temp_dir().join("scrawl_test_odd_dims.mp4");
        let mut sink = bogus_sink(&out);
        assert!(sink.begin(cfg(9, 8)).is_err());
        assert!(sink.begin(cfg(8, 9)).is_err());
    }

    #[test]
    fn push_before_begin_is_an_error() {
        let out = std::env::temp_dir().join("scrawl_test_push_before_begin.mp4");
        let mut sink = bogus_sink(&out);
        let frame = FrameRGBA {
            width: 8,
            height: 8,
            data: vec![0; 8 * 8 * 4],
        };
        assert!(sink.push_frame(FrameIndex(0), &frame).is_err());
    }

    #[test]
    fn encoder_available_is_false_for_bogus_binary() {
        assert!(!encoder_available(Path::new("/nonexistent/scrawl-test-encoder")));
    }

    #[test]
    fn fresh_temp_dirs_do_not_collide() {
        let a = fresh_temp_dir().unwrap();
        let b = fresh_temp_dir().unwrap();
        assert_ne!(a, b);
        let _ = std::fs::remove_dir_all(&a);
        let _ = std::fs::remove_dir_all(&b);
    }
}
