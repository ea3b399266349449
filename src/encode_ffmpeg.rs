use std::{
    ffi::OsString,
    path::{Path, PathBuf},
    process::{Child, ChildStdin, Command, Stdio},
};

use crate::{
    foundation::{
        core::Resolution,
        error::{CountdownError, CountdownResult},
    },
    format::OutputFormat,
    render::{FrameRgb8, pipeline::FrameSink},
};

/// MPEG-4 Part 2 quantizer; 1 is best, 31 is worst.
const MPEG4_QSCALE: u32 = 3;

#[derive(Clone, Debug)]
pub struct EncodeConfig {
    pub resolution: Resolution,
    pub fps: u32,
    pub format: OutputFormat,
    pub out_path: PathBuf,
}

impl EncodeConfig {
    pub fn new(resolution: Resolution, fps: u32, format: OutputFormat, out_path: PathBuf) -> Self {
        Self {
            resolution,
            fps,
            format,
            out_path,
        }
    }

    pub fn validate(&self) -> CountdownResult<()> {
        if self.resolution.width == 0 || self.resolution.height == 0 {
            return Err(CountdownError::validation(
                "encode width/height must be non-zero",
            ));
        }
        if self.fps == 0 {
            return Err(CountdownError::validation("encode fps must be non-zero"));
        }
        Ok(())
    }

    fn frame_len(&self) -> usize {
        self.resolution.pixel_count().saturating_mul(3)
    }
}

/// Arguments passed to `ffmpeg` for `cfg`: raw rgb24 frames on stdin, MPEG-4 video out.
pub fn ffmpeg_args(cfg: &EncodeConfig) -> Vec<OsString> {
    let mut args: Vec<OsString> = Vec::new();
    for a in [
        "-y",
        "-loglevel",
        "error",
        "-f",
        "rawvideo",
        "-pix_fmt",
        "rgb24",
        "-s",
    ] {
        args.push(a.into());
    }
    args.push(cfg.resolution.to_string().into());
    args.push("-r".into());
    args.push(cfg.fps.to_string().into());
    for a in ["-i", "pipe:0", "-an", "-c:v", "mpeg4", "-q:v"] {
        args.push(a.into());
    }
    args.push(MPEG4_QSCALE.to_string().into());
    if cfg.format.stores_fourcc() {
        args.push("-tag:v".into());
        args.push(cfg.format.codec_tag().fourcc().into());
    }
    for a in ["-pix_fmt", "yuv420p", "-f", cfg.format.muxer()] {
        args.push(a.into());
    }
    args.push(cfg.out_path.clone().into_os_string());
    args
}

pub fn is_ffmpeg_on_path() -> bool {
    is_tool_on_path("ffmpeg")
}

pub fn is_tool_on_path(tool: &str) -> bool {
    Command::new(tool)
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

pub fn ensure_parent_dir(path: &Path) -> CountdownResult<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        use anyhow::Context as _;
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory '{}'", parent.display()))?;
    }
    Ok(())
}

/// Streams frames into a system `ffmpeg` process.
pub struct FfmpegEncoder {
    cfg: EncodeConfig,
    child: Child,
    stdin: Option<ChildStdin>,
}

impl FfmpegEncoder {
    pub fn new(cfg: EncodeConfig) -> CountdownResult<Self> {
        cfg.validate()?;
        ensure_parent_dir(&cfg.out_path)?;

        if !is_ffmpeg_on_path() {
            return Err(CountdownError::encode(
                "ffmpeg is required for video encoding, but was not found on PATH",
            ));
        }

        let args = ffmpeg_args(&cfg);
        tracing::debug!(?args, "spawning ffmpeg");

        let mut child = Command::new("ffmpeg")
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                CountdownError::encode(format!(
                    "failed to spawn ffmpeg (is it installed and on PATH?): {e}"
                ))
            })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| CountdownError::encode("failed to open ffmpeg stdin (unexpected)"))?;

        Ok(Self {
            cfg,
            child,
            stdin: Some(stdin),
        })
    }

    pub fn out_path(&self) -> &Path {
        &self.cfg.out_path
    }
}

impl FrameSink for FfmpegEncoder {
    fn write_frame(&mut self, frame: &FrameRgb8) -> CountdownResult<()> {
        if frame.width != self.cfg.resolution.width || frame.height != self.cfg.resolution.height
        {
            return Err(CountdownError::validation(format!(
                "frame size mismatch: got {}x{}, expected {}",
                frame.width, frame.height, self.cfg.resolution
            )));
        }
        if frame.data.len() != self.cfg.frame_len() {
            return Err(CountdownError::validation(
                "frame.data size mismatch with width*height*3",
            ));
        }

        let Some(stdin) = self.stdin.as_mut() else {
            return Err(CountdownError::encode("ffmpeg encoder is already finalized"));
        };

        use std::io::Write as _;
        stdin.write_all(&frame.data).map_err(|e| {
            CountdownError::encode(format!("failed to write frame to ffmpeg stdin: {e}"))
        })?;

        Ok(())
    }

    fn finish(&mut self) -> CountdownResult<()> {
        let Some(stdin) = self.stdin.take() else {
            return Err(CountdownError::encode("ffmpeg encoder is already finalized"));
        };
        drop(stdin);

        let mut stderr = String::new();
        if let Some(mut pipe) = self.child.stderr.take() {
            use std::io::Read as _;
            let _ = pipe.read_to_string(&mut stderr);
        }

        let status = self.child.wait().map_err(|e| {
            CountdownError::encode(format!("failed to wait for ffmpeg to finish: {e}"))
        })?;

        if !status.success() {
            return Err(CountdownError::encode(format!(
                "ffmpeg exited with status {}: {}",
                status,
                stderr.trim()
            )));
        }

        Ok(())
    }
}

impl Drop for FfmpegEncoder {
    fn drop(&mut self) {
        // Dropped before `finish`: kill ffmpeg instead of letting it finalize a truncated file.
        if self.stdin.take().is_some() {
            let _ = self.child.kill();
            let _ = self.child.wait();
        }
    }
}
