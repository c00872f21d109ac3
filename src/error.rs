//! Error type shared by every fallible operation in the crate.
//!
//! Variants fall into three groups: invalid input, missing capability, and
//! resource failure. "No defined value" results (a scale for pixel units, an
//! interval above the rounding table) are not errors; they are reported
//! through the [`UNDEFINED`](crate::UNDEFINED) sentinel instead.

#[derive(Debug, thiserror::Error)]
pub enum ScaleError {
    // Invalid input
    #[error("invalid image extent, minx={minx}, miny={miny}, maxx={maxx}, maxy={maxy}")]
    InvalidExtent {
        minx: f64,
        miny: f64,
        maxx: f64,
        maxy: f64,
    },
    #[error("invalid image width or height ({width}x{height})")]
    InvalidImageSize { width: i32, height: i32 },
    #[error("map units not set")]
    MapUnitsNotSet,
    #[error("scalebar does not fit in {width} pixels")]
    ScalebarTooNarrow { width: i32 },
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    // Missing capability
    #[error("output format '{0}' not supported for scalebar")]
    UnsupportedOutputFormat(String),
    #[error("unsupported scalebar style {0}")]
    UnsupportedStyle(i64),
    #[error("unknown output format '{0}'")]
    UnknownOutputFormat(String),
    #[error("{symbol} symbol cannot be drawn on a {canvas} image")]
    UnsupportedSymbol {
        symbol: &'static str,
        canvas: &'static str,
    },
    #[error("image has no raw pixel buffer")]
    NoPixelBuffer,

    // Resource failure
    #[error("unable to initialize {width}x{height} image")]
    ImageAllocation { width: u32, height: u32 },
    #[error("unable to allocate {0}")]
    Allocation(&'static str),
    #[error("failed to copy raster buffer: {0}")]
    RasterCopy(String),
    #[error("failed to encode image: {0}")]
    Encode(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ScaleError>;
