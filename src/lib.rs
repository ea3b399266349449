//! Countdown timer video generator.
//!
//! Each frame of a `duration` second video shows the time remaining as `HH:MM:SS`, drawn in
//! black on a white background and centered in the frame. Frames are rendered on the CPU
//! (Parley shaping, `vello_cpu` rasterization) at a fixed 24 fps and piped into a system `ffmpeg`
//! process that writes mp4, avi, mkv or wmv containers.
//!
//! Two front ends share the same pipeline: the `countdown` binary writes `time_<n>.<ext>` to disk,
//! and [`http::ApiServer`] serves `POST /generate`, returning the encoded video as an attachment.
#![forbid(unsafe_code)]

pub mod clock;
pub mod config;
pub mod encode_ffmpeg;
pub mod format;
pub mod foundation;
pub mod http;
pub mod model;
pub mod render;
pub mod telemetry;
pub mod text;

pub use clock::{Hms, countdown_label, remaining_secs};
pub use config::{GeneratorConfig, ServeConfig, ServeProfile};
pub use encode_ffmpeg::{EncodeConfig, FfmpegEncoder, is_ffmpeg_on_path};
pub use format::{CodecTag, OutputFormat};
pub use foundation::core::{FPS, FrameIndex, Resolution, frame_count};
pub use foundation::error::{CountdownError, CountdownResult};
pub use model::GenerationRequest;
pub use render::pipeline::{FrameSink, assemble, assemble_into, generate_video};
pub use render::{FrameRgb8, render_frame, render_frame_at};
pub use text::{FontResource, ParleyTextRenderer, TextMask, TextRenderer, TextRendererFactory};
