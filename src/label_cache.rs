//! Deferred label placement.
//!
//! Labels and marker symbols queued during map drawing are placed in one
//! pass at the end, highest priority first. A candidate whose box collides
//! with something already placed is dropped unless it is forced.

use tracing::debug;

use crate::basics::{PointD, RectD};
use crate::error::Result;
use crate::raster_font::BuiltinFont;
use crate::renderer::Canvas;
use crate::symbol::SymbolRegistry;
use crate::text::LabelStyle;

#[derive(Debug, Clone, PartialEq)]
pub struct LabelCacheEntry {
    pub layer: usize,
    pub class: usize,
    pub point: PointD,
    /// Marker drawn centered on `point`.
    pub symbol: Option<usize>,
    pub text: Option<String>,
    pub style: LabelStyle,
    pub priority: u8,
    pub force: bool,
}

impl LabelCacheEntry {
    fn bounds(&self, symbols: &dyn SymbolRegistry) -> RectD {
        let (mut w, mut h) = (0.0f64, 0.0f64);
        if let Some(sym) = self.symbol.and_then(|i| symbols.get(i)) {
            w = sym.size_x;
            h = sym.size_y;
        }
        if let Some(text) = &self.text {
            let font = BuiltinFont::for_style(&self.style, 1.0);
            w = w.max(font.width(text) as f64);
            h = h.max(font.height() as f64);
        }
        RectD::new(
            self.point.x - w / 2.0,
            self.point.y - h / 2.0,
            self.point.x + w / 2.0,
            self.point.y + h / 2.0,
        )
    }
}

#[derive(Debug, Clone, Default)]
pub struct LabelCache {
    entries: Vec<LabelCacheEntry>,
}

impl LabelCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, entry: LabelCacheEntry) {
        debug!(layer = entry.layer, priority = entry.priority, "label queued");
        self.entries.push(entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[LabelCacheEntry] {
        &self.entries
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Draw every queued entry onto `canvas` and empty the cache.
    ///
    /// Returns the number of entries drawn.
    pub fn render(&mut self, canvas: &mut dyn Canvas, symbols: &dyn SymbolRegistry) -> Result<usize> {
        let mut order: Vec<usize> = (0..self.entries.len()).collect();
        // Stable: equal priorities keep insertion order.
        order.sort_by(|&a, &b| self.entries[b].priority.cmp(&self.entries[a].priority));

        let mut placed: Vec<RectD> = Vec::new();
        let mut drawn = 0;
        for i in order {
            let entry = &self.entries[i];
            let bounds = entry.bounds(symbols);
            if !entry.force && placed.iter().any(|r| r.overlaps(&bounds)) {
                debug!(layer = entry.layer, "label skipped, collision");
                continue;
            }
            if let Some(sym) = entry.symbol.and_then(|s| symbols.get(s)) {
                canvas.draw_symbol(sym, entry.point, 1.0)?;
            }
            if let Some(text) = &entry.text {
                canvas.draw_label(entry.point, text, &entry.style, 1.0)?;
            }
            placed.push(bounds);
            drawn += 1;
        }
        self.entries.clear();
        Ok(drawn)
    }
}

// ============================================================================
// Tests
// ============================================================================
