use std::path::{Path, PathBuf};

use crate::{
    encode_ffmpeg::{EncodeConfig, FfmpegEncoder},
    foundation::{
        core::{FPS, FrameIndex},
        error::CountdownResult,
    },
    model::GenerationRequest,
    render::{FrameRgb8, render_frame_at},
    text::TextRenderer,
};

/// Destination for rendered frames, written strictly in frame order.
pub trait FrameSink {
    fn write_frame(&mut self, frame: &FrameRgb8) -> CountdownResult<()>;

    /// Flush and close the output. Nothing may be written afterwards.
    fn finish(&mut self) -> CountdownResult<()>;
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AssembleStats {
    pub frames_written: u64,
}

/// Render every frame of `request` in index order into `sink`, then finish it.
pub fn assemble_into(
    request: &GenerationRequest,
    text: &mut dyn TextRenderer,
    sink: &mut dyn FrameSink,
) -> CountdownResult<AssembleStats> {
    let mut stats = AssembleStats::default();
    for i in 0..request.frame_count() {
        let frame = render_frame_at(
            FrameIndex(i),
            request.duration_secs,
            request.resolution,
            text,
        )?;
        sink.write_frame(&frame)?;
        stats.frames_written += 1;
    }
    sink.finish()?;
    Ok(stats)
}

/// Output path `{output_name_base}.{ext}` for `request`.
pub fn output_path(request: &GenerationRequest, output_name_base: &Path) -> PathBuf {
    let mut name = output_name_base.as_os_str().to_os_string();
    name.push(".");
    name.push(request.format.extension());
    PathBuf::from(name)
}

/// Encode the countdown described by `request` to `{output_name_base}.{ext}` and return the path.
///
/// The file is complete when this returns: the encoder process has exited successfully. On error
/// any partially written file is removed.
#[tracing::instrument(skip(text), fields(format = %request.format, resolution = %request.resolution))]
pub fn assemble(
    request: &GenerationRequest,
    output_name_base: &Path,
    text: &mut dyn TextRenderer,
) -> CountdownResult<PathBuf> {
    let out_path = output_path(request, output_name_base);
    let cfg = EncodeConfig::new(request.resolution, FPS, request.format, out_path.clone());
    let mut encoder = FfmpegEncoder::new(cfg)?;

    tracing::info!(
        frames = request.frame_count(),
        duration_secs = request.duration_secs,
        path = %out_path.display(),
        "rendering countdown"
    );
    let stats = match assemble_into(request, text, &mut encoder) {
        Ok(stats) => stats,
        Err(err) => {
            drop(encoder);
            remove_partial_output(&out_path);
            return Err(err);
        }
    };
    tracing::info!(
        frames = stats.frames_written,
        path = %out_path.display(),
        "countdown written"
    );
    Ok(out_path)
}

fn remove_partial_output(path: &Path) {
    match std::fs::remove_file(path) {
        Ok(()) => tracing::debug!(path = %path.display(), "removed partial output"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "failed to remove partial output")
        }
    }
}

/// Validate raw parameters and [`assemble`]. An unsupported `format` fails before any file is
/// created.
pub fn generate_video(
    duration_secs: f64,
    width: u32,
    height: u32,
    output_name_base: &Path,
    format: &str,
    text: &mut dyn TextRenderer,
) -> CountdownResult<PathBuf> {
    let request = GenerationRequest::new(duration_secs, width, height, format)?;
    assemble(&request, output_name_base, text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        foundation::error::CountdownError,
        render::{BACKGROUND_RGB, test_support::BlockTextRenderer},
    };

    #[derive(Default)]
    struct CollectingSink {
        frames: Vec<FrameRgb8>,
        finished: bool,
    }

    impl FrameSink for CollectingSink {
        fn write_frame(&mut self, frame: &FrameRgb8) -> CountdownResult<()> {
            assert!(!self.finished, "write after finish");
            self.frames.push(frame.clone());
            Ok(())
        }

        fn finish(&mut self) -> CountdownResult<()> {
            self.finished = true;
            Ok(())
        }
    }

    struct FailingSink {
        accept: usize,
        written: usize,
    }

    impl FrameSink for FailingSink {
        fn write_frame(&mut self, _frame: &FrameRgb8) -> CountdownResult<()> {
            if self.written == self.accept {
                return Err(CountdownError::encode("disk full"));
            }
            self.written += 1;
            Ok(())
        }

        fn finish(&mut self) -> CountdownResult<()> {
            panic!("finish must not run after a failed write");
        }
    }

    #[test]
    fn two_seconds_yield_48_frames_in_order() {
        let request = GenerationRequest::new(2.0, 320, 240, "mp4").unwrap();
        let mut text = BlockTextRenderer::new(4, 8);
        let mut sink = CollectingSink::default();

        let stats = assemble_into(&request, &mut text, &mut sink).unwrap();

        assert_eq!(stats.frames_written, 48);
        assert_eq!(sink.frames.len(), 48);
        assert!(sink.finished);
        assert!(
            sink.frames
                .iter()
                .all(|f| (f.width, f.height) == (320, 240))
        );
        assert_eq!(text.labels.first().map(String::as_str), Some("00:00:02"));
        assert_eq!(text.labels.get(1).map(String::as_str), Some("00:00:01"));
        assert_eq!(text.labels.get(24).map(String::as_str), Some("00:00:01"));
        assert_eq!(text.labels.get(25).map(String::as_str), Some("00:00:00"));
        assert_eq!(text.labels.last().map(String::as_str), Some("00:00:00"));
        assert_ne!(sink.frames[0].ink_bounds(BACKGROUND_RGB), None);
    }

    #[test]
    fn frame_count_floors_fractional_durations() {
        let request = GenerationRequest::new(0.99, 16, 16, "avi").unwrap();
        let mut sink = CollectingSink::default();
        let stats =
            assemble_into(&request, &mut BlockTextRenderer::new(1, 1), &mut sink).unwrap();
        assert_eq!(stats.frames_written, 23);
    }

    #[test]
    fn sub_frame_duration_still_finishes_the_sink() {
        let request = GenerationRequest::new(0.01, 16, 16, "mkv").unwrap();
        let mut sink = CollectingSink::default();
        let stats =
            assemble_into(&request, &mut BlockTextRenderer::new(1, 1), &mut sink).unwrap();
        assert_eq!(stats.frames_written, 0);
        assert!(sink.finished);
    }

    #[test]
    fn write_failure_stops_the_loop() {
        let request = GenerationRequest::new(1.0, 8, 8, "wmv").unwrap();
        let mut sink = FailingSink {
            accept: 5,
            written: 0,
        };
        let err = assemble_into(&request, &mut BlockTextRenderer::new(1, 1), &mut sink)
            .unwrap_err();
        assert!(matches!(err, CountdownError::Encode(_)));
        assert_eq!(sink.written, 5);
    }

    #[test]
    fn repeated_runs_produce_identical_frames() {
        let request = GenerationRequest::new(1.0, 40, 30, "mp4").unwrap();
        let mut a = CollectingSink::default();
        let mut b = CollectingSink::default();
        assemble_into(&request, &mut BlockTextRenderer::new(2, 3), &mut a).unwrap();
        assemble_into(&request, &mut BlockTextRenderer::new(2, 3), &mut b).unwrap();
        assert_eq!(a.frames, b.frames);
    }

    #[test]
    fn unsupported_format_creates_no_file() {
        let dir = std::env::temp_dir().join(format!("countdown-xyz-{}", std::process::id()));
        let base = dir.join("time_2");
        let err = generate_video(2.0, 32, 32, &base, "xyz", &mut BlockTextRenderer::new(1, 1))
            .unwrap_err();
        match err {
            CountdownError::UnsupportedFormat { format, supported } => {
                assert_eq!(format, "xyz");
                assert_eq!(supported, vec!["mp4", "avi", "mkv", "wmv"]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(!dir.exists());
    }

    #[test]
    fn output_path_appends_extension() {
        let request = GenerationRequest::new(2.0, 8, 8, "mkv").unwrap();
        assert_eq!(
            output_path(&request, Path::new("out/time_2")),
            PathBuf::from("out/time_2.mkv")
        );
        assert_eq!(
            output_path(&request, Path::new("time_2.5")),
            PathBuf::from("time_2.5.mkv")
        );
    }
}
