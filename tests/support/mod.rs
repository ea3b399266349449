#![allow(dead_code)]

use std::{path::PathBuf, process::Command};

use countdown::{FontResource, encode_ffmpeg::is_tool_on_path};

const FONT_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/TTF/DejaVuSans-Bold.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Bold.ttf",
    "/usr/share/fonts/liberation/LiberationSans-Bold.ttf",
];

pub fn system_font_path() -> Option<PathBuf> {
    FONT_CANDIDATES
        .iter()
        .map(PathBuf::from)
        .find(|p| p.is_file())
}

pub fn system_font() -> Option<FontResource> {
    let path = system_font_path()?;
    FontResource::load(&path, 70.0).ok()
}

pub fn ffmpeg_tools_available() -> bool {
    is_tool_on_path("ffmpeg") && is_tool_on_path("ffprobe")
}

/// Fresh scratch directory under `target/`.
pub fn scratch_dir(name: &str) -> PathBuf {
    let dir = PathBuf::from("target").join("countdown-tests").join(name);
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

#[derive(Debug)]
pub struct ProbedVideo {
    pub width: u32,
    pub height: u32,
    pub frames: u64,
    pub codec: String,
}

/// Probe the first video stream of `path` with `ffprobe -count_frames`.
pub fn probe_video(path: &std::path::Path) -> ProbedVideo {
    let out = Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-select_streams",
            "v:0",
            "-count_frames",
            "-show_entries",
            "stream=width,height,nb_read_frames,codec_name",
            "-of",
            "json",
        ])
        .arg(path)
        .output()
        .unwrap();
    assert!(out.status.success(), "ffprobe failed: {:?}", out);

    let v: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    let stream = &v["streams"][0];
    ProbedVideo {
        width: stream["width"].as_u64().unwrap() as u32,
        height: stream["height"].as_u64().unwrap() as u32,
        frames: stream["nb_read_frames"]
            .as_str()
            .and_then(|s| s.parse().ok())
            .unwrap(),
        codec: stream["codec_name"].as_str().unwrap_or_default().to_string(),
    }
}
