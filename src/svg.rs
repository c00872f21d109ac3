//! SVG vector backend.
//!
//! Builds the document as a string. Images have no pixel buffer, so a
//! scalebar drawn here can only be embedded as a vector symbol.

use std::io::Write;

use crate::basics::{PointD, RectD};
use crate::color::Rgba8;
use crate::error::{Result, ScaleError};
use crate::image::ImageBuffer;
use crate::raster_font::BuiltinFont;
use crate::renderer::{Canvas, Renderer, RendererCaps, Shape, StrokeStyle};
use crate::symbol::{Symbol, SymbolKind};
use crate::text::LabelStyle;

#[derive(Debug, Clone, Copy, Default)]
pub struct SvgRenderer;

impl Renderer for SvgRenderer {
    fn name(&self) -> &'static str {
        "svg"
    }

    fn caps(&self) -> RendererCaps {
        RendererCaps {
            supports_pixel_buffer: false,
            supports_vector: true,
        }
    }

    fn measure_label(&self, text: &str, style: &LabelStyle) -> RectD {
        // Same metrics as the raster backend so layouts agree.
        BuiltinFont::for_style(style, 1.0).measure(text)
    }

    fn create_image(
        &self,
        width: i32,
        height: i32,
        background: Option<Rgba8>,
        resolution_factor: f64,
    ) -> Result<Box<dyn Canvas>> {
        Ok(Box::new(SvgCanvas::new(
            width,
            height,
            background,
            resolution_factor,
        )?))
    }
}

pub struct SvgCanvas {
    width: u32,
    height: u32,
    body: String,
    resolution_factor: f64,
}

fn fill_attrs(c: Rgba8) -> String {
    if c.is_opaque() {
        format!(r#"fill="{}""#, c.opaque().to_hex())
    } else {
        format!(
            r#"fill="{}" fill-opacity="{:.3}""#,
            c.opaque().to_hex(),
            c.opacity()
        )
    }
}

fn stroke_attrs(c: Rgba8, width: f64) -> String {
    let mut s = format!(r#"stroke="{}" stroke-width="{}""#, c.opaque().to_hex(), width);
    if !c.is_opaque() {
        s.push_str(&format!(r#" stroke-opacity="{:.3}""#, c.opacity()));
    }
    s
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}

fn path_data(lines: &[Vec<PointD>], close: bool) -> String {
    let mut d = String::new();
    for line in lines.iter().filter(|l| !l.is_empty()) {
        for (i, p) in line.iter().enumerate() {
            let cmd = if i == 0 { 'M' } else { 'L' };
            d.push_str(&format!("{} {},{} ", cmd, p.x, p.y));
        }
        if close {
            d.push_str("Z ");
        }
    }
    d.trim_end().to_string()
}

impl SvgCanvas {
    pub fn new(
        width: i32,
        height: i32,
        background: Option<Rgba8>,
        resolution_factor: f64,
    ) -> Result<Self> {
        if width <= 0 || height <= 0 {
            return Err(ScaleError::InvalidImageSize { width, height });
        }
        let mut canvas = Self {
            width: width as u32,
            height: height as u32,
            body: String::new(),
            resolution_factor,
        };
        if let Some(bg) = background {
            canvas.body.push_str(&format!(
                "  <rect x=\"0\" y=\"0\" width=\"{}\" height=\"{}\" {}/>\n",
                width,
                height,
                fill_attrs(bg)
            ));
        }
        Ok(canvas)
    }

    pub fn resolution_factor(&self) -> f64 {
        self.resolution_factor
    }

    /// The complete document.
    pub fn document(&self) -> String {
        format!(
            "<svg xmlns=\"http://www.w3.org/2000/svg\" version=\"1.1\" width=\"{w}\" height=\"{h}\" viewBox=\"0 0 {w} {h}\">\n{body}</svg>\n",
            w = self.width,
            h = self.height,
            body = self.body
        )
    }
}

impl Canvas for SvgCanvas {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn kind(&self) -> &'static str {
        "svg"
    }

    fn render_polygon(&mut self, shape: &Shape, color: Rgba8) -> Result<()> {
        if shape.is_empty() {
            return Ok(());
        }
        self.body.push_str(&format!(
            "  <path d=\"{}\" {} fill-rule=\"evenodd\"/>\n",
            path_data(&shape.lines, true),
            fill_attrs(color)
        ));
        Ok(())
    }

    fn render_line(&mut self, shape: &Shape, stroke: &StrokeStyle) -> Result<()> {
        if shape.is_empty() {
            return Ok(());
        }
        self.body.push_str(&format!(
            "  <path d=\"{}\" fill=\"none\" {} stroke-linecap=\"square\"/>\n",
            path_data(&shape.lines, false),
            stroke_attrs(stroke.color, stroke.width.max(1.0))
        ));
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
        let halo = match style.outline_color {
            Some(c) => format!(" {} paint-order=\"stroke\"", stroke_attrs(c, 2.0)),
            None => String::new(),
        };
        self.body.push_str(&format!(
            "  <text x=\"{}\" y=\"{}\" font-family=\"monospace\" font-size=\"{}\" dominant-baseline=\"hanging\" {}{}>{}</text>\n",
            origin.x,
            origin.y,
            font.height(),
            fill_attrs(style.color),
            halo,
            escape(text)
        ));
        Ok(())
    }

    fn draw_symbol(&mut self, symbol: &Symbol, center: PointD, scale: f64) -> Result<()> {
        let document = match &symbol.kind {
            SymbolKind::Svg(document) => document,
            other => {
                return Err(ScaleError::UnsupportedSymbol {
                    symbol: other.name(),
                    canvas: self.kind(),
                })
            }
        };
        let x = center.x - symbol.size_x * scale / 2.0;
        let y = center.y - symbol.size_y * scale / 2.0;
        self.body.push_str(&format!(
            "  <g transform=\"translate({} {}) scale({})\">\n{}  </g>\n",
            x, y, scale, document
        ));
        Ok(())
    }

    fn raster_buffer_copy(&self) -> Result<ImageBuffer> {
        Err(ScaleError::NoPixelBuffer)
    }

    fn vector_document(&self) -> Option<String> {
        Some(self.document())
    }

    fn encode(&self, out: &mut dyn Write) -> Result<()> {
        out.write_all(self.document().as_bytes())?;
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
