//! Scalebar layout: picking a round interval that fits the requested width.
//!
//! The fit loop converts a pixel budget to ground distance, rounds the
//! per-interval distance to a human-friendly value, converts back to pixels
//! and checks that bar plus trailing label fit. When they don't, the budget
//! shrinks by [`X_STEP_SIZE`] pixels and the loop tries again. The loop is
//! bounded by the budget reaching zero.

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::basics::{iround, PointI};
use crate::error::{Result, ScaleError};
use crate::interval::IntervalRounding;
use crate::text::format_number;
use crate::units::{LatitudeAdjustment, Units};

/// Horizontal margin around the bar, unscaled pixels.
pub const HMARGIN: f64 = 3.0;
/// Vertical margin around the bar, unscaled pixels.
pub const VMARGIN: f64 = 3.0;
/// Gap between bar and labels, as a fraction of the font height.
pub const VSPACING: f64 = 0.8;
/// Height trimmed from the image so things fit a bit tighter vertically.
pub const VSLOP: f64 = 5.0;
/// Pixels removed from the budget after each failed fit.
pub const X_STEP_SIZE: i32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Alignment {
    Left,
    #[default]
    Center,
    Right,
}

/// Label metrics already multiplied by the resolution factor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FontMetrics {
    /// Average width of one decimal digit.
    pub width: f64,
    pub height: f64,
}

// ============================================================================
// Fit
// ============================================================================

/// Inputs of the interval fit loop.
#[derive(Debug, Clone, Copy)]
pub struct FitParams {
    pub cellsize: f64,
    pub map_units: Units,
    /// Units the bar is labeled in before any promotion.
    pub units: Units,
    pub intervals: i32,
    /// Maximum content width in pixels (bar width minus both margins).
    pub max_width: i32,
    pub font_width: f64,
    pub rounding: IntervalRounding,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Fit {
    /// Ground length of one interval, in `units`.
    pub interval: f64,
    /// Pixel length of one interval.
    pub interval_px: i32,
    /// Bar plus trailing label, in pixels.
    pub content_width: i32,
    /// Display units after promotion.
    pub units: Units,
    /// Cumulative value of the last interval, formatted.
    pub last_label: String,
    pub attempts: u32,
}

/// Switch meters to kilometers for intervals of 1000 m or more, and
/// kilometers to meters for intervals of 1 m or less. Other units are left
/// alone.
pub fn promote_units(units: Units, interval: f64) -> (Units, f64) {
    if !(interval > 0.0) {
        return (units, interval);
    }
    match units {
        Units::Meters if interval >= 1000.0 => (Units::Kilometers, interval / 1000.0),
        Units::Kilometers if interval <= 0.001 => (Units::Meters, interval * 1000.0),
        _ => (units, interval),
    }
}

fn ipu(units: Units) -> f64 {
    units.inches_per_unit(0.0, LatitudeAdjustment::None)
}

/// Find the largest round interval whose bar and label fit `max_width`.
///
/// Display units may be promoted between meters and kilometers; a promotion
/// carries over to later attempts. Fails with
/// [`ScaleError::ScalebarTooNarrow`] once the budget is used up.
pub fn fit_scalebar(p: &FitParams) -> Result<Fit> {
    let mut units = p.units;
    let mut dsx = p.max_width;
    let mut attempts = 0u32;
    let intervals = p.intervals as f64;

    while dsx > 0 {
        attempts += 1;
        let msx = p.cellsize * dsx as f64 / (ipu(units) / ipu(p.map_units));
        let raw = msx / intervals;
        let rounded = if raw > 0.0 && raw.is_finite() {
            p.rounding.round(raw)
        } else {
            -1.0
        };
        let (promoted, i) = promote_units(units, rounded);
        units = promoted;
        let last_label = format_number(intervals * i);

        if i > 0.0 && i.is_finite() {
            let isx = iround((i / (ipu(p.map_units) / ipu(units))) / p.cellsize);
            let label_px = (1.5 + last_label.len() as f64 / 2.0 + units.label().len() as f64)
                * p.font_width;
            let sx = p.intervals * isx + iround(label_px);
            trace!(dsx, interval = i, isx, sx, "fit attempt");

            if isx < 1 {
                trace!(dsx, interval = i, "interval narrower than a pixel");
            } else if sx <= p.max_width {
                debug!(
                    interval = i,
                    units = %units,
                    isx,
                    sx,
                    attempts,
                    "scalebar interval chosen"
                );
                return Ok(Fit {
                    interval: i,
                    interval_px: isx,
                    content_width: sx,
                    units,
                    last_label,
                    attempts,
                });
            }
        } else {
            trace!(dsx, raw, "no usable interval");
        }
        dsx -= X_STEP_SIZE;
    }

    Err(ScaleError::ScalebarTooNarrow {
        width: p.max_width,
    })
}

// ============================================================================
// Geometry
// ============================================================================

/// Inputs of the full layout, in unscaled configuration units.
#[derive(Debug, Clone, Copy)]
pub struct LayoutParams {
    pub width: i32,
    pub bar_height: i32,
    pub intervals: i32,
    pub units: Units,
    pub map_units: Units,
    pub cellsize: f64,
    pub resolution_factor: f64,
    pub font: FontMetrics,
    pub align: Alignment,
    /// Shrink the image to the content instead of the configured width.
    pub fit_to_content: bool,
    pub rounding: IntervalRounding,
}

/// Final scalebar geometry in image pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct ScalebarLayout {
    pub fit: Fit,
    pub intervals: i32,
    pub width: i32,
    pub height: i32,
    pub bar_height: i32,
    pub origin: PointI,
    pub font: FontMetrics,
}

impl ScalebarLayout {
    pub fn compute(p: &LayoutParams) -> Result<Self> {
        let rf = p.resolution_factor;
        let mut width = iround(rf * p.width as f64);
        let bar_height = iround(rf * p.bar_height as f64);
        let h_margin = iround(rf * HMARGIN);
        let v_margin = iround(rf * VMARGIN);
        let v_slop = rf * VSLOP;
        let max_width = width - 2 * h_margin;

        let fit = fit_scalebar(&FitParams {
            cellsize: p.cellsize,
            map_units: p.map_units,
            units: p.units,
            intervals: p.intervals,
            max_width,
            font_width: p.font.width,
            rounding: p.rounding,
        })?;

        let fh = p.font.height;
        let height = iround(
            (2 * v_margin) as f64 + iround(VSPACING * fh) as f64 + fh + bar_height as f64 - v_slop,
        );
        if p.fit_to_content {
            width = fit.content_width + 2 * h_margin;
        }

        let sx = fit.content_width as f64;
        let fw = p.font.width;
        let ox = match p.align {
            Alignment::Left => h_margin,
            Alignment::Right => iround((width as f64 - sx) + fw),
            Alignment::Center => iround((width as f64 - sx) / 2.0 + fw / 2.0),
        };

        debug!(width, height, ox, oy = v_margin, "scalebar layout");
        Ok(Self {
            fit,
            intervals: p.intervals,
            width,
            height,
            bar_height,
            origin: PointI::new(ox, v_margin),
            font: p.font,
        })
    }

    /// X of the boundary before interval `j` (0 ..= intervals).
    pub fn segment_x(&self, j: i32) -> i32 {
        self.origin.x + j * self.fit.interval_px
    }

    /// Y of the label anchors.
    pub fn label_y(&self) -> i32 {
        self.origin.y + self.bar_height + iround(VSPACING * self.font.height)
    }

    /// Cumulative value at boundary `j`, formatted.
    pub fn value_label(&self, j: i32) -> String {
        format_number(j as f64 * self.fit.interval)
    }

    /// Cumulative value at boundary `j` followed by the unit text.
    pub fn unit_label(&self, j: i32) -> String {
        format!("{} {}", self.value_label(j), self.fit.units.label())
    }

    /// Shift that centers a text of `chars` digits under its boundary when
    /// the label is anchored by its left edge.
    pub fn half_text_width(&self, chars: usize) -> i32 {
        iround(chars as f64 * self.font.width / 2.0)
    }
}

// ============================================================================
// Tests
// ============================================================================
