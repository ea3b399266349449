use crate::foundation::error::{CountdownError, CountdownResult};

/// Fixed sampling and encoding rate of every countdown video.
pub const FPS: u32 = 24;

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct FrameIndex(pub u64);

impl FrameIndex {
    /// Seconds elapsed since the start of the video when this frame is shown.
    pub fn elapsed_secs(self) -> f64 {
        self.0 as f64 / f64::from(FPS)
    }
}

/// Number of frames in a video of `duration_secs`, i.e. `floor(duration * FPS)`.
pub fn frame_count(duration_secs: f64) -> u64 {
    if !duration_secs.is_finite() {
        return 0;
    }
    (duration_secs * f64::from(FPS)).floor().max(0.0) as u64
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub fn new(width: u32, height: u32) -> CountdownResult<Self> {
        if width == 0 || height == 0 {
            return Err(CountdownError::validation(format!(
                "resolution must be non-zero, got {width}x{height}"
            )));
        }
        Ok(Self { width, height })
    }

    /// Saturates on targets where the product does not fit in `usize`.
    pub fn pixel_count(self) -> usize {
        (self.width as usize).saturating_mul(self.height as usize)
    }
}

impl std::fmt::Display for Resolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}
