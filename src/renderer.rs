//! Rendering seams.
//!
//! A [`Renderer`] is a backend factory attached to an output format: it
//! measures labels and creates blank images. A [`Canvas`] is one image
//! being drawn into. The scalebar code only talks to these traits; the
//! crate ships a raster backend ([`crate::raster`]) and a vector backend
//! ([`crate::svg`]).

use std::io::Write;

use crate::basics::{PointD, RectD};
use crate::color::Rgba8;
use crate::error::Result;
use crate::image::ImageBuffer;
use crate::symbol::Symbol;
use crate::text::LabelStyle;

// ============================================================================
// Geometry
// ============================================================================

/// One or more polylines. For polygons each line is a ring and rings are
/// filled with the even-odd rule.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Shape {
    pub lines: Vec<Vec<PointD>>,
}

impl Shape {
    pub fn new() -> Self {
        Self::default()
    }

    /// A shape made of a single line.
    pub fn from_points(points: Vec<PointD>) -> Self {
        Self {
            lines: vec![points],
        }
    }

    pub fn push_line(&mut self, points: Vec<PointD>) {
        self.lines.push(points);
    }

    pub fn is_empty(&self) -> bool {
        self.lines.iter().all(|l| l.is_empty())
    }

    /// Bounding box of all vertices, `None` for an empty shape.
    pub fn bounds(&self) -> Option<RectD> {
        let mut pts = self.lines.iter().flatten();
        let first = pts.next()?;
        let mut r = RectD::new(first.x, first.y, first.x, first.y);
        for p in pts {
            r.x1 = r.x1.min(p.x);
            r.y1 = r.y1.min(p.y);
            r.x2 = r.x2.max(p.x);
            r.y2 = r.y2.max(p.y);
        }
        Some(r)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrokeStyle {
    pub color: Rgba8,
    pub width: f64,
}

impl StrokeStyle {
    pub fn new(color: Rgba8, width: f64) -> Self {
        Self { color, width }
    }
}

// ============================================================================
// Renderer / Canvas
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RendererCaps {
    /// Images expose their pixels through [`Canvas::raster_buffer_copy`].
    pub supports_pixel_buffer: bool,
    /// Images are vector documents ([`Canvas::vector_document`]).
    pub supports_vector: bool,
}

pub trait Renderer {
    fn name(&self) -> &'static str;

    fn caps(&self) -> RendererCaps;

    /// Bounding box of `text` drawn with `style` at scale 1, top-left at the
    /// origin.
    fn measure_label(&self, text: &str, style: &LabelStyle) -> RectD;

    /// Create a blank `width` x `height` image. `None` background leaves the
    /// image transparent.
    fn create_image(
        &self,
        width: i32,
        height: i32,
        background: Option<Rgba8>,
        resolution_factor: f64,
    ) -> Result<Box<dyn Canvas>>;
}

pub trait Canvas {
    fn width(&self) -> u32;

    fn height(&self) -> u32;

    /// Short backend name, used in error messages.
    fn kind(&self) -> &'static str;

    fn render_polygon(&mut self, shape: &Shape, color: Rgba8) -> Result<()>;

    fn render_line(&mut self, shape: &Shape, stroke: &StrokeStyle) -> Result<()>;

    /// Draw `text` anchored at `point` according to `style.position`.
    fn draw_label(
        &mut self,
        point: PointD,
        text: &str,
        style: &LabelStyle,
        scale_factor: f64,
    ) -> Result<()>;

    /// Draw `symbol` centered on `center`.
    fn draw_symbol(&mut self, symbol: &Symbol, center: PointD, scale: f64) -> Result<()>;

    /// Copy of the image pixels. Fails with `NoPixelBuffer` on backends
    /// without one.
    fn raster_buffer_copy(&self) -> Result<ImageBuffer>;

    /// The image as a vector document, for vector backends.
    fn vector_document(&self) -> Option<String>;

    /// Write the image in the backend's file format.
    fn encode(&self, out: &mut dyn Write) -> Result<()>;
}

// ============================================================================
// Tests
// ============================================================================
