//! Software raster backend.
//!
//! Draws into an [`ImageBuffer`] with aliased primitives: polygons are
//! filled scanline by scanline with the even-odd rule (a pixel is inside
//! when its center is), lines are stroked as filled quads with square caps,
//! and text uses the built-in bitmap font.

use std::io::Write;

use tracing::trace;

use crate::basics::{iround, PointD, RectD};
use crate::bmp::write_bmp;
use crate::color::{Rgba8, COVER_FULL};
use crate::error::{Result, ScaleError};
use crate::image::ImageBuffer;
use crate::raster_font::BuiltinFont;
use crate::renderer::{Canvas, Renderer, RendererCaps, Shape, StrokeStyle};
use crate::symbol::{Symbol, SymbolKind};
use crate::text::LabelStyle;

// ============================================================================
// Renderer
// ============================================================================

#[derive(Debug, Clone, Copy, Default)]
pub struct RasterRenderer;

impl Renderer for RasterRenderer {
    fn name(&self) -> &'static str {
        "raster"
    }

    fn caps(&self) -> RendererCaps {
        RendererCaps {
            supports_pixel_buffer: true,
            supports_vector: false,
        }
    }

    fn measure_label(&self, text: &str, style: &LabelStyle) -> RectD {
        BuiltinFont::for_style(style, 1.0).measure(text)
    }

    fn create_image(
        &self,
        width: i32,
        height: i32,
        background: Option<Rgba8>,
        resolution_factor: f64,
    ) -> Result<Box<dyn Canvas>> {
        Ok(Box::new(RasterCanvas::new(
            width,
            height,
            background,
            resolution_factor,
        )?))
    }
}

// ============================================================================
// Canvas
// ============================================================================

pub struct RasterCanvas {
    img: ImageBuffer,
    resolution_factor: f64,
}

impl RasterCanvas {
    pub fn new(
        width: i32,
        height: i32,
        background: Option<Rgba8>,
        resolution_factor: f64,
    ) -> Result<Self> {
        if width <= 0 || height <= 0 {
            return Err(ScaleError::InvalidImageSize { width, height });
        }
        let mut img = ImageBuffer::new(width as u32, height as u32)?;
        if let Some(bg) = background {
            img.clear(bg);
        }
        Ok(Self {
            img,
            resolution_factor,
        })
    }

    pub fn image(&self) -> &ImageBuffer {
        &self.img
    }

    pub fn resolution_factor(&self) -> f64 {
        self.resolution_factor
    }

    /// Even-odd scanline fill of every ring in `shape`.
    fn fill_rings(&mut self, rings: &[Vec<PointD>], color: Rgba8) {
        let mut top = f64::INFINITY;
        let mut bottom = f64::NEG_INFINITY;
        for p in rings.iter().flatten() {
            top = top.min(p.y);
            bottom = bottom.max(p.y);
        }
        if !(top.is_finite() && bottom.is_finite()) {
            return;
        }
        let y1 = (top.floor() as i32).max(0);
        let y2 = (bottom.ceil() as i32).min(self.img.height() as i32 - 1);

        let mut xs: Vec<f64> = Vec::new();
        for y in y1..=y2 {
            let cy = y as f64 + 0.5;
            xs.clear();
            for ring in rings {
                let n = ring.len();
                if n < 2 {
                    continue;
                }
                for i in 0..n {
                    let a = ring[i];
                    let b = ring[(i + 1) % n];
                    if (a.y <= cy) != (b.y <= cy) {
                        xs.push(a.x + (cy - a.y) * (b.x - a.x) / (b.y - a.y));
                    }
                }
            }
            xs.sort_by(f64::total_cmp);
            for pair in xs.chunks_exact(2) {
                let x1 = (pair[0] - 0.5).ceil() as i32;
                let x2 = (pair[1] - 0.5).ceil() as i32 - 1;
                if x2 >= x1 {
                    self.img.blend_hline(x1, y, x2, color, COVER_FULL);
                }
            }
        }
    }

    /// Stroke one segment as a quad extended by half the width at both ends.
    fn stroke_segment(&mut self, a: PointD, b: PointD, width: f64, color: Rgba8) {
        let dx = b.x - a.x;
        let dy = b.y - a.y;
        let len = (dx * dx + dy * dy).sqrt();
        if len == 0.0 {
            return;
        }
        let hw = width / 2.0;
        let (ux, uy) = (dx / len * hw, dy / len * hw);
        let (nx, ny) = (-uy, ux);
        let a = PointD::new(a.x - ux, a.y - uy);
        let b = PointD::new(b.x + ux, b.y + uy);
        let quad = vec![
            PointD::new(a.x + nx, a.y + ny),
            PointD::new(b.x + nx, b.y + ny),
            PointD::new(b.x - nx, b.y - ny),
            PointD::new(a.x - nx, a.y - ny),
        ];
        self.fill_rings(&[quad], color);
    }

    fn draw_text(&mut self, x: i32, y: i32, text: &str, font: &BuiltinFont, color: Rgba8) {
        let advance = font.advance() as i32;
        for row in 0..font.height() {
            let mut cx = x;
            for ch in text.chars() {
                let span = font.span(ch, row);
                self.img.blend_solid_hspan(cx, y + row as i32, color, &span);
                cx += advance;
            }
        }
    }
}

/// Nearest-neighbour resample of `src` by `scale`.
fn resample(src: &ImageBuffer, scale: f64) -> Result<ImageBuffer> {
    let w = iround(src.width() as f64 * scale).max(1) as u32;
    let h = iround(src.height() as f64 * scale).max(1) as u32;
    let mut out = ImageBuffer::new(w, h)?;
    for y in 0..h {
        let sy = ((y as f64 + 0.5) / scale) as i32;
        for x in 0..w {
            let sx = ((x as f64 + 0.5) / scale) as i32;
            out.copy_pixel(x as i32, y as i32, src.pixel(sx, sy));
        }
    }
    Ok(out)
}

impl Canvas for RasterCanvas {
    fn width(&self) -> u32 {
        self.img.width()
    }

    fn height(&self) -> u32 {
        self.img.height()
    }

    fn kind(&self) -> &'static str {
        "raster"
    }

    fn render_polygon(&mut self, shape: &Shape, color: Rgba8) -> Result<()> {
        self.fill_rings(&shape.lines, color);
        Ok(())
    }

    fn render_line(&mut self, shape: &Shape, stroke: &StrokeStyle) -> Result<()> {
        let width = stroke.width.max(1.0);
        for line in &shape.lines {
            for seg in line.windows(2) {
                self.stroke_segment(seg[0], seg[1], width, stroke.color);
            }
        }
        Ok(())
    }

    fn draw_label(
        &mut self,
        point: PointD,
        text: &str,
        style: &LabelStyle,
        scale_factor: f64,
    ) -> Result<()> {
        let font = BuiltinFont::for_style(style, scale_factor);
        let origin = style.position.origin(
            point,
            font.width(text) as f64,
            font.height() as f64,
        );
        let (x, y) = (iround(origin.x), iround(origin.y));
        trace!(text, x, y, "raster label");

        if let Some(outline) = style.outline_color {
            for (dx, dy) in [(-1, -1), (0, -1), (1, -1), (-1, 0), (1, 0), (-1, 1), (0, 1), (1, 1)] {
                self.draw_text(x + dx, y + dy, text, &font, outline);
            }
        }
        self.draw_text(x, y, text, &font, style.color);
        Ok(())
    }

    fn draw_symbol(&mut self, symbol: &Symbol, center: PointD, scale: f64) -> Result<()> {
        let image = match &symbol.kind {
            SymbolKind::Pixmap(image) => image,
            other => {
                return Err(ScaleError::UnsupportedSymbol {
                    symbol: other.name(),
                    canvas: self.kind(),
                })
            }
        };
        let resampled;
        let image = if (scale - 1.0).abs() > f64::EPSILON && scale > 0.0 {
            resampled = resample(image, scale)?;
            &resampled
        } else {
            image
        };
        let x = iround(center.x - image.width() as f64 / 2.0);
        let y = iround(center.y - image.height() as f64 / 2.0);
        if symbol.transparent {
            self.img.blend_from(image, x, y);
        } else {
            self.img.copy_from(image, x, y);
        }
        Ok(())
    }

    fn raster_buffer_copy(&self) -> Result<ImageBuffer> {
        Ok(self.img.clone())
    }

    fn vector_document(&self) -> Option<String> {
        None
    }

    fn encode(&self, out: &mut dyn Write) -> Result<()> {
        write_bmp(out, &self.img)?;
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
