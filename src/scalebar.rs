//! Scalebar configuration and rendering.
//!
//! [`draw_scalebar`] recomputes the map's scale, lays the bar out and draws
//! it into a fresh image from the active output format's renderer. Two
//! styles are supported: alternating filled boxes, and a baseline with
//! ticks.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::basics::PointD;
use crate::color::Rgba8;
use crate::error::{Result, ScaleError};
use crate::interval::IntervalRounding;
use crate::layout::{Alignment, FontMetrics, LayoutParams, ScalebarLayout};
use crate::map::MapContext;
use crate::renderer::{Canvas, Shape, StrokeStyle};
use crate::text::{LabelPosition, LabelStyle};
use crate::units::Units;

/// Digits measured to find the average label cell width.
const DIGITS: &str = "0123456789";

// ============================================================================
// Configuration
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "StyleRepr", into = "i64")]
pub enum ScalebarStyle {
    /// Alternating filled boxes.
    #[default]
    Filled = 0,
    /// A baseline with a tick at each interval boundary.
    Ticks = 1,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StyleRepr {
    Index(i64),
    Name(String),
}

impl TryFrom<i64> for ScalebarStyle {
    type Error = ScaleError;

    fn try_from(v: i64) -> Result<Self> {
        match v {
            0 => Ok(ScalebarStyle::Filled),
            1 => Ok(ScalebarStyle::Ticks),
            other => Err(ScaleError::UnsupportedStyle(other)),
        }
    }
}

impl TryFrom<StyleRepr> for ScalebarStyle {
    type Error = ScaleError;

    fn try_from(repr: StyleRepr) -> Result<Self> {
        match repr {
            StyleRepr::Index(i) => i.try_into(),
            StyleRepr::Name(name) => match name.to_ascii_lowercase().as_str() {
                "filled" => Ok(ScalebarStyle::Filled),
                "ticks" => Ok(ScalebarStyle::Ticks),
                _ => Err(ScaleError::InvalidConfig(format!(
                    "unknown scalebar style '{}'",
                    name
                ))),
            },
        }
    }
}

impl From<ScalebarStyle> for i64 {
    fn from(s: ScalebarStyle) -> i64 {
        s as i64
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalebarStatus {
    #[default]
    Off,
    On,
    /// Embedded into the map; the image shrinks to fit its content.
    Embed,
}

/// Where an embedded scalebar sits on the map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalebarPosition {
    #[default]
    #[serde(alias = "ll")]
    LowerLeft,
    #[serde(alias = "lc")]
    LowerCenter,
    #[serde(alias = "lr")]
    LowerRight,
    #[serde(alias = "ul")]
    UpperLeft,
    #[serde(alias = "uc")]
    UpperCenter,
    #[serde(alias = "ur")]
    UpperRight,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScalebarConfig {
    pub status: ScalebarStatus,
    pub style: ScalebarStyle,
    /// Image width in pixels at the default resolution.
    pub width: i32,
    /// Bar height in pixels at the default resolution.
    pub height: i32,
    pub intervals: i32,
    pub units: Units,
    pub align: Alignment,
    pub position: ScalebarPosition,
    pub label: LabelStyle,
    /// Bar fill and tick color.
    pub color: Option<Rgba8>,
    /// Fill of the alternate boxes.
    pub background_color: Option<Rgba8>,
    pub outline_color: Option<Rgba8>,
    /// Image background; white when unset and not transparent.
    pub image_color: Option<Rgba8>,
    pub transparent: bool,
    /// Draw the embedded scalebar right away instead of queueing it as a
    /// label.
    pub postlabelcache: bool,
    pub rounding: IntervalRounding,
}

impl Default for ScalebarConfig {
    fn default() -> Self {
        Self {
            status: ScalebarStatus::Off,
            style: ScalebarStyle::Filled,
            width: 200,
            height: 3,
            intervals: 4,
            units: Units::Miles,
            align: Alignment::Center,
            position: ScalebarPosition::LowerLeft,
            label: LabelStyle::default(),
            color: Some(Rgba8::BLACK),
            background_color: Some(Rgba8::WHITE),
            outline_color: None,
            image_color: None,
            transparent: false,
            postlabelcache: false,
            rounding: IntervalRounding::default(),
        }
    }
}

impl ScalebarConfig {
    pub fn validate(&self) -> Result<()> {
        if self.intervals < 1 {
            return Err(ScaleError::InvalidConfig(format!(
                "scalebar intervals must be at least 1, got {}",
                self.intervals
            )));
        }
        if self.width <= 0 || self.height < 0 {
            return Err(ScaleError::InvalidConfig(format!(
                "invalid scalebar size {}x{}",
                self.width, self.height
            )));
        }
        Ok(())
    }

    /// Background of the scalebar image, `None` for a transparent one.
    pub fn image_background(&self) -> Option<Rgba8> {
        if self.transparent {
            None
        } else {
            Some(self.image_color.unwrap_or(Rgba8::WHITE))
        }
    }
}

// ============================================================================
// Drawing
// ============================================================================

/// Render the map's scalebar into a new image.
///
/// Recomputes and stores the map's cellsize and scale denominator (the
/// extent may grow to match the image aspect ratio). The image comes from
/// the active output format's renderer.
pub fn draw_scalebar(map: &mut MapContext) -> Result<Box<dyn Canvas>> {
    let result = render(map);
    if let Err(e) = &result {
        warn!("draw_scalebar: {}", e);
    }
    result
}

fn render(map: &mut MapContext) -> Result<Box<dyn Canvas>> {
    let map_units = map.units.ok_or(ScaleError::MapUnitsNotSet)?;
    let renderer = map
        .output_format
        .renderer()
        .filter(|r| {
            let caps = r.caps();
            caps.supports_pixel_buffer || caps.supports_vector
        })
        .ok_or_else(|| ScaleError::UnsupportedOutputFormat(map.output_format.name.clone()))?;
    map.scalebar.validate()?;

    let rf = map.resolution_factor();
    let r = renderer.measure_label(DIGITS, &map.scalebar.label);
    let font = FontMetrics {
        width: r.width() / DIGITS.len() as f64 * rf,
        height: r.height() * rf,
    };

    map.compute_scale()?;
    if !(map.cellsize > 0.0 && map.cellsize.is_finite()) {
        return Err(ScaleError::InvalidImageSize {
            width: map.width,
            height: map.height,
        });
    }

    let config = &map.scalebar;
    let layout = ScalebarLayout::compute(&LayoutParams {
        width: config.width,
        bar_height: config.height,
        intervals: config.intervals,
        units: config.units,
        map_units,
        cellsize: map.cellsize,
        resolution_factor: rf,
        font,
        align: config.align,
        fit_to_content: config.status == ScalebarStatus::Embed,
        rounding: config.rounding,
    })?;

    let format = map.output_format.apply_override(config.transparent);
    let background = if format.transparent {
        None
    } else {
        config.image_background()
    };
    let mut image = renderer.create_image(layout.width, layout.height, background, rf)?;
    debug!(
        format = %format.name,
        width = layout.width,
        height = layout.height,
        style = ?config.style,
        "drawing scalebar"
    );

    match config.style {
        ScalebarStyle::Filled => draw_filled(image.as_mut(), &layout, config, rf)?,
        ScalebarStyle::Ticks => draw_ticks(image.as_mut(), &layout, config, rf)?,
    }
    Ok(image)
}

fn label_at(
    image: &mut dyn Canvas,
    config: &ScalebarConfig,
    x: i32,
    y: i32,
    text: &str,
    position: LabelPosition,
    rf: f64,
) -> Result<()> {
    let style = config.label.at(position);
    image.draw_label(PointD::new(x as f64, y as f64), text, &style, rf)
}

fn draw_filled(
    image: &mut dyn Canvas,
    layout: &ScalebarLayout,
    config: &ScalebarConfig,
    rf: f64,
) -> Result<()> {
    let bar = config.color.map(Rgba8::opaque);
    let background = config.background_color.map(Rgba8::opaque);
    let outline = match (bar, config.outline_color) {
        (Some(_), Some(c)) => Some(StrokeStyle::new(c.opaque(), rf)),
        _ => None,
    };

    let oy = layout.origin.y as f64;
    let y0 = oy + 0.5;
    let y1 = oy + layout.bar_height as f64 + 0.5;
    let label_y = layout.label_y();

    let mut filled = true;
    for j in 0..layout.intervals {
        let x0 = layout.segment_x(j) as f64 + 0.5;
        let x1 = layout.segment_x(j + 1) as f64 + 0.5;
        let rect = Shape::from_points(vec![
            PointD::new(x0, y0),
            PointD::new(x1, y0),
            PointD::new(x1, y1),
            PointD::new(x0, y1),
            PointD::new(x0, y0),
        ]);
        let fill = if filled { bar.or(background) } else { background };
        if let Some(c) = fill {
            image.render_polygon(&rect, c)?;
        }
        if let Some(stroke) = &outline {
            image.render_line(&rect, stroke)?;
        }
        label_at(
            image,
            config,
            layout.segment_x(j),
            label_y,
            &layout.value_label(j),
            LabelPosition::Center,
            rf,
        )?;
        filled = !filled;
    }

    let j = layout.intervals;
    let x = layout.segment_x(j) - layout.half_text_width(layout.value_label(j).len());
    label_at(
        image,
        config,
        x,
        label_y,
        &layout.unit_label(j),
        LabelPosition::CenterRight,
        rf,
    )
}

fn draw_ticks(
    image: &mut dyn Canvas,
    layout: &ScalebarLayout,
    config: &ScalebarConfig,
    rf: f64,
) -> Result<()> {
    let stroke = config.color.map(|c| StrokeStyle::new(c, rf));
    let oy = layout.origin.y as f64;
    let label_y = layout.label_y();

    if let Some(stroke) = &stroke {
        let baseline = Shape::from_points(vec![
            PointD::new(layout.origin.x as f64, oy),
            PointD::new(layout.segment_x(layout.intervals) as f64, oy),
        ]);
        image.render_line(&baseline, stroke)?;
    }

    for j in 0..=layout.intervals {
        let x = layout.segment_x(j);
        if let Some(stroke) = &stroke {
            let tick = Shape::from_points(vec![
                PointD::new(x as f64, oy),
                PointD::new(x as f64, oy + layout.bar_height as f64),
            ]);
            image.render_line(&tick, stroke)?;
        }
        if j != layout.intervals {
            let text = layout.value_label(j);
            label_at(image, config, x, label_y, &text, LabelPosition::Center, rf)?;
        } else {
            let text = layout.unit_label(j);
            let x = x - layout.half_text_width(text.len());
            label_at(image, config, x, label_y, &text, LabelPosition::CenterRight, rf)?;
        }
    }
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
