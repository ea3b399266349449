//! Text shaping and rasterization for the countdown label.
//!
//! The frame renderer only needs a coverage mask of the label cropped to its ink bounds; how that
//! mask is produced is hidden behind [`TextRenderer`]. [`ParleyTextRenderer`] is the real
//! implementation: Parley shapes the string against the loaded font and `vello_cpu` rasterizes the
//! glyph run.

use std::{collections::HashMap, path::Path, sync::Arc};

use anyhow::Context as _;

use crate::foundation::error::{CountdownError, CountdownResult};

/// Font file used when none is configured.
pub const DEFAULT_FONT_PATH: &str = "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf";
/// Font size in pixels used when none is configured.
pub const DEFAULT_FONT_SIZE_PX: f32 = 70.0;

/// 8-bit coverage of rendered text, cropped to the text's ink bounding box.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TextMask {
    pub width: u32,
    pub height: u32,
    /// Row-major coverage, `width * height` bytes. 255 is fully inked.
    pub coverage: Vec<u8>,
}

impl TextMask {
    pub fn new(width: u32, height: u32, coverage: Vec<u8>) -> CountdownResult<Self> {
        if coverage.len() != width as usize * height as usize {
            return Err(CountdownError::validation(format!(
                "text mask coverage has {} bytes, expected {}x{}",
                coverage.len(),
                width,
                height
            )));
        }
        Ok(Self {
            width,
            height,
            coverage,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn coverage_at(&self, x: u32, y: u32) -> u8 {
        self.coverage[y as usize * self.width as usize + x as usize]
    }
}

/// Capability that turns a label into a coverage mask.
pub trait TextRenderer {
    fn rasterize(&mut self, text: &str) -> CountdownResult<Arc<TextMask>>;
}

/// Builds a fresh [`TextRenderer`] per generation, so callers on different threads never share
/// mutable shaping state.
pub trait TextRendererFactory: Send + Sync {
    fn create(&self) -> CountdownResult<Box<dyn TextRenderer + Send>>;
}

/// Font bytes plus the size to render them at. Loaded once, then shared read-only.
#[derive(Clone)]
pub struct FontResource {
    bytes: Arc<Vec<u8>>,
    size_px: f32,
    source: String,
}

impl std::fmt::Debug for FontResource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontResource")
            .field("source", &self.source)
            .field("size_px", &self.size_px)
            .field("bytes_len", &self.bytes.len())
            .finish()
    }
}

impl FontResource {
    pub fn load(path: impl AsRef<Path>, size_px: f32) -> CountdownResult<Self> {
        let path = path.as_ref();
        let bytes =
            std::fs::read(path).with_context(|| format!("read font '{}'", path.display()))?;
        Self::from_bytes(bytes, size_px, path.display().to_string())
    }

    pub fn from_bytes(
        bytes: Vec<u8>,
        size_px: f32,
        source: impl Into<String>,
    ) -> CountdownResult<Self> {
        if !size_px.is_finite() || size_px <= 0.0 {
            return Err(CountdownError::font("font size must be finite and > 0"));
        }
        if bytes.is_empty() {
            return Err(CountdownError::font("font data is empty"));
        }
        Ok(Self {
            bytes: Arc::new(bytes),
            size_px,
            source: source.into(),
        })
    }

    pub fn bytes(&self) -> &[u8] {
        self.bytes.as_slice()
    }

    pub fn size_px(&self) -> f32 {
        self.size_px
    }

    pub fn source(&self) -> &str {
        &self.source
    }
}

impl TextRendererFactory for FontResource {
    fn create(&self) -> CountdownResult<Box<dyn TextRenderer + Send>> {
        Ok(Box::new(ParleyTextRenderer::new(self)?))
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
/// RGBA8 brush color used by Parley text layout.
pub struct TextBrushRgba8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

/// Parley contexts with one font registered up front.
pub struct TextLayoutEngine {
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<TextBrushRgba8>,
    family_name: String,
}

impl TextLayoutEngine {
    pub fn new(font_bytes: &[u8]) -> CountdownResult<Self> {
        let mut font_ctx = parley::FontContext::default();
        let families = font_ctx
            .collection
            .register_fonts(parley::fontique::Blob::from(font_bytes.to_vec()), None);
        let family_id = families
            .first()
            .map(|(id, _)| *id)
            .ok_or_else(|| CountdownError::font("no font families registered from font bytes"))?;

        let family_name = font_ctx
            .collection
            .family_name(family_id)
            .ok_or_else(|| CountdownError::font("registered font family has no name"))?
            .to_string();

        Ok(Self {
            font_ctx,
            layout_ctx: parley::LayoutContext::new(),
            family_name,
        })
    }

    pub fn family_name(&self) -> &str {
        &self.family_name
    }

    /// Shape a single unwrapped line of text.
    pub fn layout_line(
        &mut self,
        text: &str,
        size_px: f32,
        brush: TextBrushRgba8,
    ) -> parley::Layout<TextBrushRgba8> {
        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut self.font_ctx, text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(std::borrow::Cow::Owned(self.family_name.clone())),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(size_px));
        builder.push_default(parley::style::StyleProperty::Brush(brush));

        let mut layout: parley::Layout<TextBrushRgba8> = builder.build(text);
        layout.break_all_lines(None);
        layout
    }
}

/// [`TextRenderer`] backed by Parley shaping and the `vello_cpu` rasterizer.
///
/// Masks are cached per string; a countdown only changes its label once per second.
pub struct ParleyTextRenderer {
    engine: TextLayoutEngine,
    font: vello_cpu::peniko::FontData,
    size_px: f32,
    cache: HashMap<String, Arc<TextMask>>,
}

impl ParleyTextRenderer {
    pub fn new(font: &FontResource) -> CountdownResult<Self> {
        let engine = TextLayoutEngine::new(font.bytes())?;
        tracing::debug!(
            family = engine.family_name(),
            source = font.source(),
            size_px = font.size_px(),
            "registered countdown font"
        );
        let data = vello_cpu::peniko::FontData::new(
            vello_cpu::peniko::Blob::from(font.bytes().to_vec()),
            0,
        );
        Ok(Self {
            engine,
            font: data,
            size_px: font.size_px(),
            cache: HashMap::new(),
        })
    }

    pub fn family_name(&self) -> &str {
        self.engine.family_name()
    }

    fn rasterize_uncached(&mut self, text: &str) -> CountdownResult<TextMask> {
        let layout = self
            .engine
            .layout_line(text, self.size_px, TextBrushRgba8 { a: 255, ..Default::default() });

        // Glyphs may overhang the advance box, so rasterize with a margin and crop afterwards.
        let pad = (self.size_px / 2.0).ceil() as u32 + 2;
        let width = layout.width().max(0.0).ceil() as u32 + 2 * pad;
        let height = layout.height().max(0.0).ceil() as u32 + 2 * pad;
        let width_u16: u16 = width
            .try_into()
            .map_err(|_| CountdownError::font("text raster width exceeds u16"))?;
        let height_u16: u16 = height
            .try_into()
            .map_err(|_| CountdownError::font("text raster height exceeds u16"))?;

        let mut ctx = vello_cpu::RenderContext::new(width_u16, height_u16);
        ctx.set_transform(vello_cpu::kurbo::Affine::translate((
            f64::from(pad),
            f64::from(pad),
        )));
        ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(0, 0, 0, 255));

        for line in layout.lines() {
            for item in line.items() {
                let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                    continue;
                };
                let glyphs = run.positioned_glyphs().map(|g| vello_cpu::Glyph {
                    id: g.id,
                    x: g.x,
                    y: g.y,
                });
                ctx.glyph_run(&self.font)
                    .font_size(run.run().font_size())
                    .fill_glyphs(glyphs);
            }
        }

        ctx.flush();
        let mut pixmap = vello_cpu::Pixmap::new(width_u16, height_u16);
        ctx.render_to_pixmap(&mut pixmap);

        crop_to_ink(pixmap.data_as_u8_slice(), width, height)
    }
}

impl TextRenderer for ParleyTextRenderer {
    fn rasterize(&mut self, text: &str) -> CountdownResult<Arc<TextMask>> {
        if let Some(mask) = self.cache.get(text) {
            return Ok(Arc::clone(mask));
        }
        let mask = Arc::new(self.rasterize_uncached(text)?);
        self.cache.insert(text.to_string(), Arc::clone(&mask));
        Ok(mask)
    }
}

/// Crop an RGBA8 buffer to the bounding box of its non-transparent pixels, keeping alpha.
fn crop_to_ink(rgba: &[u8], width: u32, height: u32) -> CountdownResult<TextMask> {
    if rgba.len() != width as usize * height as usize * 4 {
        return Err(CountdownError::font(
            "text raster size mismatch with width*height*4",
        ));
    }

    let alpha = |x: u32, y: u32| rgba[(y as usize * width as usize + x as usize) * 4 + 3];

    let mut bounds: Option<(u32, u32, u32, u32)> = None;
    for y in 0..height {
        for x in 0..width {
            if alpha(x, y) == 0 {
                continue;
            }
            bounds = Some(match bounds {
                None => (x, y, x, y),
                Some((x0, y0, x1, y1)) => (x0.min(x), y0.min(y), x1.max(x), y1.max(y)),
            });
        }
    }

    let Some((x0, y0, x1, y1)) = bounds else {
        return Ok(TextMask::default());
    };

    let (w, h) = (x1 - x0 + 1, y1 - y0 + 1);
    let mut coverage = Vec::with_capacity(w as usize * h as usize);
    for y in y0..=y1 {
        for x in x0..=x1 {
            coverage.push(alpha(x, y));
        }
    }
    TextMask::new(w, h, coverage)
}
