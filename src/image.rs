//! RGBA pixel buffer with clipped blending operations.
//!
//! [`ImageBuffer`] owns its pixels: 4 bytes per pixel, non-premultiplied,
//! rows stored top-down with no padding. All drawing operations clip to the
//! buffer, so callers can pass coordinates that fall partly or entirely
//! outside of it.

use crate::basics::RectI;
use crate::color::{CoverType, Rgba8};
use crate::error::{Result, ScaleError};

const BPP: usize = 4;

/// Largest image the crate will allocate, in pixels.
pub const MAX_PIXELS: u64 = 1 << 26;

// ============================================================================
// ImageBuffer
// ============================================================================

#[derive(Clone, PartialEq, Eq)]
pub struct ImageBuffer {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl std::fmt::Debug for ImageBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageBuffer")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish()
    }
}

impl ImageBuffer {
    /// Allocate a fully transparent `width` x `height` buffer.
    ///
    /// Fails with [`ScaleError::ImageAllocation`] for empty or oversized
    /// dimensions, or when the allocation itself fails.
    pub fn new(width: u32, height: u32) -> Result<Self> {
        let pixels = width as u64 * height as u64;
        if pixels == 0 || pixels > MAX_PIXELS {
            return Err(ScaleError::ImageAllocation { width, height });
        }
        let len = pixels as usize * BPP;
        let mut data = Vec::new();
        data.try_reserve_exact(len)
            .map_err(|_| ScaleError::ImageAllocation { width, height })?;
        data.resize(len, 0);
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Wrap existing RGBA data. `data` must hold exactly `width * height * 4`
    /// bytes.
    pub fn from_rgba(width: u32, height: u32, data: Vec<u8>) -> Result<Self> {
        if data.len() as u64 != width as u64 * height as u64 * BPP as u64 {
            return Err(ScaleError::RasterCopy(format!(
                "expected {} bytes for {}x{}, got {}",
                width as u64 * height as u64 * BPP as u64,
                width,
                height,
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Raw RGBA bytes, row-major, top-to-bottom.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    /// Bytes of row `y`.
    pub fn row(&self, y: u32) -> &[u8] {
        let stride = self.width as usize * BPP;
        let start = y as usize * stride;
        &self.data[start..start + stride]
    }

    fn clip_box(&self) -> RectI {
        RectI::new(0, 0, self.width as i32 - 1, self.height as i32 - 1)
    }

    #[inline]
    fn inbox(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && x < self.width as i32 && y < self.height as i32
    }

    #[inline]
    fn offset(&self, x: i32, y: i32) -> usize {
        (y as usize * self.width as usize + x as usize) * BPP
    }

    /// Pixel at (x, y); transparent black outside the buffer.
    pub fn pixel(&self, x: i32, y: i32) -> Rgba8 {
        if !self.inbox(x, y) {
            return Rgba8::TRANSPARENT;
        }
        let off = self.offset(x, y);
        Rgba8::new(
            self.data[off],
            self.data[off + 1],
            self.data[off + 2],
            self.data[off + 3],
        )
    }

    /// Overwrite every pixel with `c`.
    pub fn clear(&mut self, c: Rgba8) {
        for px in self.data.chunks_exact_mut(BPP) {
            px.copy_from_slice(&[c.r, c.g, c.b, c.a]);
        }
    }

    /// Overwrite a single pixel (clipped).
    pub fn copy_pixel(&mut self, x: i32, y: i32, c: Rgba8) {
        if self.inbox(x, y) {
            let off = self.offset(x, y);
            self.data[off..off + BPP].copy_from_slice(&[c.r, c.g, c.b, c.a]);
        }
    }

    #[inline]
    fn blend_at(&mut self, off: usize, c: Rgba8, cover: CoverType) {
        let alpha = Rgba8::mult_cover(c.a, cover);
        let p = &mut self.data[off..off + BPP];
        if alpha == 255 {
            p.copy_from_slice(&[c.r, c.g, c.b, 255]);
        } else if alpha > 0 {
            p[0] = Rgba8::lerp(p[0], c.r, alpha);
            p[1] = Rgba8::lerp(p[1], c.g, alpha);
            p[2] = Rgba8::lerp(p[2], c.b, alpha);
            p[3] = Rgba8::lerp(p[3], 255, alpha);
        }
    }

    /// Blend a single pixel (clipped).
    pub fn blend_pixel(&mut self, x: i32, y: i32, c: Rgba8, cover: CoverType) {
        if self.inbox(x, y) {
            let off = self.offset(x, y);
            self.blend_at(off, c, cover);
        }
    }

    /// Blend a horizontal line (clipped). x1, x2 are inclusive endpoints.
    pub fn blend_hline(&mut self, mut x1: i32, y: i32, mut x2: i32, c: Rgba8, cover: CoverType) {
        if x1 > x2 {
            std::mem::swap(&mut x1, &mut x2);
        }
        let cb = self.clip_box();
        if y > cb.y2 || y < cb.y1 || x1 > cb.x2 || x2 < cb.x1 {
            return;
        }
        x1 = x1.max(cb.x1);
        x2 = x2.min(cb.x2);
        for x in x1..=x2 {
            let off = self.offset(x, y);
            self.blend_at(off, c, cover);
        }
    }

    /// Blend a solid rectangle (clipped). Corners are inclusive.
    pub fn blend_bar(&mut self, x1: i32, y1: i32, x2: i32, y2: i32, c: Rgba8, cover: CoverType) {
        let mut rc = RectI::new(x1, y1, x2, y2);
        rc.normalize();
        if !rc.clip(&self.clip_box()) {
            return;
        }
        for y in rc.y1..=rc.y2 {
            self.blend_hline(rc.x1, y, rc.x2, c, cover);
        }
    }

    /// Blend a horizontal span with per-pixel coverage (clipped).
    pub fn blend_solid_hspan(&mut self, x: i32, y: i32, c: Rgba8, covers: &[CoverType]) {
        if y < 0 || y >= self.height as i32 {
            return;
        }
        for (i, &cover) in covers.iter().enumerate() {
            let px = x + i as i32;
            if px >= 0 && px < self.width as i32 && cover != 0 {
                let off = self.offset(px, y);
                self.blend_at(off, c, cover);
            }
        }
    }

    /// Overwrite the pixels under `src` placed at (dx, dy), alpha included.
    pub fn copy_from(&mut self, src: &ImageBuffer, dx: i32, dy: i32) {
        for sy in 0..src.height as i32 {
            for sx in 0..src.width as i32 {
                self.copy_pixel(dx + sx, dy + sy, src.pixel(sx, sy));
            }
        }
    }

    /// Composite `src` with its top-left corner at (dx, dy), using the
    /// source alpha as coverage.
    pub fn blend_from(&mut self, src: &ImageBuffer, dx: i32, dy: i32) {
        for sy in 0..src.height as i32 {
            let y = dy + sy;
            if y < 0 || y >= self.height as i32 {
                continue;
            }
            for sx in 0..src.width as i32 {
                let c = src.pixel(sx, sy);
                if c.a == 0 {
                    continue;
                }
                self.blend_pixel(dx + sx, y, Rgba8::new_opaque(c.r, c.g, c.b), c.a);
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
