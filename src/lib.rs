//! # mapscale
//!
//! Map scale computation and cartographic scalebar rendering.
//!
//! Given a map extent, its units, the output image size and resolution, the
//! crate computes the scale denominator ("1 : N") and draws a labeled
//! scalebar, either as a standalone image or folded into the map image as a
//! symbol.
//!
//! - Unit conversion between inches, feet, miles, meters, kilometers,
//!   nautical miles and decimal degrees
//! - Scale denominator and cellsize arithmetic, with extent squaring
//! - "Nice" interval selection for scalebar segments
//! - Filled and tick scalebar styles on raster (BMP) or SVG canvases
//! - Embedding through a hidden layer and deferred label placement
//!
//! ## Architecture
//!
//! Drawing a scalebar runs in four stages:
//!
//! 1. **Scale**: [`MapContext::compute_scale`] squares the extent with the
//!    image and stores the cellsize and scale denominator
//! 2. **Layout**: [`layout::ScalebarLayout`] picks an interval that fits the
//!    configured width and places the bar and its labels
//! 3. **Drawing**: [`draw_scalebar`] paints the bar on a [`Canvas`] created
//!    by the output format's [`Renderer`]
//! 4. **Embedding**: [`embed_scalebar`] turns the canvas into a symbol and
//!    attaches it to the map image
//!
//! Every operation works on an explicit [`MapContext`]; there is no global
//! state. "No defined value" results are reported as [`UNDEFINED`], real
//! failures as [`ScaleError`].

// Foundation types
pub mod basics;
pub mod color;
pub mod error;
pub mod units;

// Scale arithmetic
pub mod interval;
pub mod scale;

// Text and images
pub mod bmp;
pub mod image;
pub mod raster_font;
pub mod text;

// Rendering backends
pub mod outputformat;
pub mod raster;
pub mod renderer;
pub mod svg;

// Map model
pub mod label_cache;
pub mod layer;
pub mod map;
pub mod symbol;

// Scalebar
pub mod embed;
pub mod layout;
pub mod scalebar;

pub use basics::{Extent, PointD};
pub use color::Rgba8;
pub use embed::embed_scalebar;
pub use error::{Result, ScaleError};
pub use interval::IntervalRounding;
pub use map::{MapConfig, MapContext};
pub use outputformat::{OutputFormat, OutputFormatOverride, OutputFormatRegistry};
pub use renderer::{Canvas, Renderer};
pub use scale::{adjust_extent, calculate_scale, UNDEFINED};
pub use scalebar::{draw_scalebar, ScalebarConfig, ScalebarStatus, ScalebarStyle};
pub use units::{LatitudeAdjustment, Units};
