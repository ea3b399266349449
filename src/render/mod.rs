pub mod pipeline;

use std::path::Path;

use anyhow::Context as _;

use crate::{
    clock::countdown_label,
    foundation::{
        core::{FrameIndex, Resolution},
        error::{CountdownError, CountdownResult},
    },
    text::{TextMask, TextRenderer},
};

pub const BACKGROUND_RGB: [u8; 3] = [255, 255, 255];
pub const TEXT_RGB: [u8; 3] = [0, 0, 0];

/// One opaque RGB8 frame, row-major.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameRgb8 {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl FrameRgb8 {
    /// Fails instead of aborting when the buffer for `resolution` cannot be allocated.
    pub fn filled(resolution: Resolution, rgb: [u8; 3]) -> CountdownResult<Self> {
        let len = resolution
            .pixel_count()
            .checked_mul(3)
            .ok_or_else(|| frame_alloc_error(resolution))?;
        let mut data = Vec::new();
        data.try_reserve_exact(len)
            .map_err(|_| frame_alloc_error(resolution))?;
        for _ in 0..resolution.pixel_count() {
            data.extend_from_slice(&rgb);
        }
        Ok(Self {
            width: resolution.width,
            height: resolution.height,
            data,
        })
    }

    pub fn pixel(&self, x: u32, y: u32) -> [u8; 3] {
        let i = (y as usize * self.width as usize + x as usize) * 3;
        [self.data[i], self.data[i + 1], self.data[i + 2]]
    }

    /// Bounding box `(x0, y0, x1, y1)` (inclusive) of pixels that differ from `background`.
    pub fn ink_bounds(&self, background: [u8; 3]) -> Option<(u32, u32, u32, u32)> {
        let mut bounds: Option<(u32, u32, u32, u32)> = None;
        for y in 0..self.height {
            for x in 0..self.width {
                if self.pixel(x, y) == background {
                    continue;
                }
                bounds = Some(match bounds {
                    None => (x, y, x, y),
                    Some((x0, y0, x1, y1)) => (x0.min(x), y0.min(y), x1.max(x), y1.max(y)),
                });
            }
        }
        bounds
    }

    pub fn to_rgb_image(&self) -> CountdownResult<image::RgbImage> {
        image::RgbImage::from_raw(self.width, self.height, self.data.clone())
            .ok_or_else(|| CountdownError::validation("frame data size mismatch with width*height*3"))
    }

    pub fn save_png(&self, path: &Path) -> CountdownResult<()> {
        self.to_rgb_image()?
            .save_with_format(path, image::ImageFormat::Png)
            .with_context(|| format!("write png '{}'", path.display()))?;
        Ok(())
    }

    fn blend_mask(&mut self, mask: &TextMask, origin_x: i64, origin_y: i64, rgb: [u8; 3]) {
        for my in 0..mask.height {
            let y = origin_y + i64::from(my);
            if y < 0 || y >= i64::from(self.height) {
                continue;
            }
            for mx in 0..mask.width {
                let x = origin_x + i64::from(mx);
                if x < 0 || x >= i64::from(self.width) {
                    continue;
                }
                let a = u16::from(mask.coverage_at(mx, my));
                if a == 0 {
                    continue;
                }
                let i = (y as usize * self.width as usize + x as usize) * 3;
                for (c, &src) in rgb.iter().enumerate() {
                    let dst = u16::from(self.data[i + c]);
                    self.data[i + c] =
                        (mul_div255(u16::from(src), a) + mul_div255(dst, 255 - a)).min(255) as u8;
                }
            }
        }
    }
}

/// Top-left position that centers an extent of `inner` inside `outer`, with floor division.
pub fn center_offset(outer: u32, inner: u32) -> i64 {
    (i64::from(outer) - i64::from(inner)).div_euclid(2)
}

/// Render the countdown frame shown `elapsed` seconds into a `total_duration` second video.
pub fn render_frame(
    elapsed: f64,
    total_duration: f64,
    resolution: Resolution,
    text: &mut dyn TextRenderer,
) -> CountdownResult<FrameRgb8> {
    let label = countdown_label(elapsed, total_duration);
    let mask = text.rasterize(&label)?;

    let mut frame = FrameRgb8::filled(resolution, BACKGROUND_RGB)?;
    if !mask.is_empty() {
        let x = center_offset(resolution.width, mask.width);
        let y = center_offset(resolution.height, mask.height);
        frame.blend_mask(&mask, x, y, TEXT_RGB);
    }
    Ok(frame)
}

pub fn render_frame_at(
    frame: FrameIndex,
    total_duration: f64,
    resolution: Resolution,
    text: &mut dyn TextRenderer,
) -> CountdownResult<FrameRgb8> {
    render_frame(frame.elapsed_secs(), total_duration, resolution, text)
}

fn frame_alloc_error(resolution: Resolution) -> CountdownError {
    CountdownError::Other(anyhow::anyhow!(
        "cannot allocate a {resolution} RGB frame buffer"
    ))
}

fn mul_div255(x: u16, y: u16) -> u16 {
    (((u32::from(x) * u32::from(y)) + 127) / 255) as u16
}
