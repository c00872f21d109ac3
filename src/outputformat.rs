//! Output formats, their drivers and the scoped format override.
//!
//! A format names a driver; the driver decides which [`Renderer`] (if any)
//! draws images for it. Formats such as image maps or GDAL outputs have no
//! renderer of their own, so anything that needs pixels or a vector
//! document while they are active must switch formats temporarily with an
//! [`OutputFormatOverride`].

use std::ops::{Deref, DerefMut};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, ScaleError};
use crate::map::MapContext;
use crate::raster::RasterRenderer;
use crate::renderer::Renderer;
use crate::svg::SvgRenderer;

/// Name of the default raster format.
pub const RASTER_FORMAT: &str = "bmp";
/// Name of the default vector format.
pub const VECTOR_FORMAT: &str = "svg";

// ============================================================================
// Driver
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Driver {
    /// Software raster backend.
    Raster,
    /// SVG vector backend.
    Svg,
    /// HTML image maps. No renderer.
    ImageMap,
    /// Raster formats written through GDAL. No renderer.
    Gdal,
}

impl Driver {
    pub fn renderer(self) -> Option<Box<dyn Renderer>> {
        match self {
            Driver::Raster => Some(Box::new(RasterRenderer)),
            Driver::Svg => Some(Box::new(SvgRenderer)),
            Driver::ImageMap | Driver::Gdal => None,
        }
    }

    pub fn is_vector(self) -> bool {
        matches!(self, Driver::Svg)
    }
}

// ============================================================================
// OutputFormat
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputFormat {
    pub name: String,
    pub driver: Driver,
    pub mime_type: String,
    pub extension: String,
    /// Images start transparent instead of filled with a background.
    #[serde(default)]
    pub transparent: bool,
}

impl OutputFormat {
    pub fn new(name: &str, driver: Driver, mime_type: &str, extension: &str) -> Self {
        Self {
            name: name.to_string(),
            driver,
            mime_type: mime_type.to_string(),
            extension: extension.to_string(),
            transparent: false,
        }
    }

    pub fn renderer(&self) -> Option<Box<dyn Renderer>> {
        self.driver.renderer()
    }

    /// Copy of this format with the transparency option overridden.
    pub fn apply_override(&self, transparent: bool) -> OutputFormat {
        OutputFormat {
            transparent,
            ..self.clone()
        }
    }

    /// Whether an image in this format can be turned into a pixmap symbol.
    pub fn supports_pixel_buffer(&self) -> bool {
        self.renderer()
            .map(|r| r.caps().supports_pixel_buffer)
            .unwrap_or(false)
    }
}

// ============================================================================
// Registry
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct OutputFormatRegistry {
    formats: Vec<OutputFormat>,
}

impl OutputFormatRegistry {
    pub fn empty() -> Self {
        Self {
            formats: Vec::new(),
        }
    }

    /// Raster, vector and the two renderer-less formats.
    pub fn with_defaults() -> Self {
        Self {
            formats: vec![
                OutputFormat::new(RASTER_FORMAT, Driver::Raster, "image/bmp", "bmp"),
                OutputFormat::new(VECTOR_FORMAT, Driver::Svg, "image/svg+xml", "svg"),
                OutputFormat::new("imagemap", Driver::ImageMap, "text/html", "html"),
                OutputFormat::new("gtiff", Driver::Gdal, "image/tiff", "tif"),
            ],
        }
    }

    /// Add `format`, replacing any format with the same name.
    pub fn register(&mut self, format: OutputFormat) {
        match self
            .formats
            .iter_mut()
            .find(|f| f.name.eq_ignore_ascii_case(&format.name))
        {
            Some(existing) => *existing = format,
            None => self.formats.push(format),
        }
    }

    /// Look a format up by name (case-insensitive) or by mime type.
    pub fn select(&self, name: &str) -> Result<&OutputFormat> {
        self.formats
            .iter()
            .find(|f| f.name.eq_ignore_ascii_case(name) || f.mime_type.eq_ignore_ascii_case(name))
            .ok_or_else(|| ScaleError::UnknownOutputFormat(name.to_string()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &OutputFormat> {
        self.formats.iter()
    }
}

impl Default for OutputFormatRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

// ============================================================================
// Scoped override
// ============================================================================

/// Switches the map's active output format and switches it back on drop.
///
/// The guard derefs to the map, so work done through it sees the
/// temporary format. The original is restored on every exit path,
/// including early returns with `?`.
pub struct OutputFormatOverride<'a> {
    map: &'a mut MapContext,
    saved: Option<OutputFormat>,
}

impl<'a> OutputFormatOverride<'a> {
    pub fn new(map: &'a mut MapContext, name: &str) -> Result<Self> {
        let format = map.formats.select(name)?.clone();
        debug!(from = %map.output_format.name, to = %format.name, "output format override");
        let saved = std::mem::replace(&mut map.output_format, format);
        Ok(Self {
            map,
            saved: Some(saved),
        })
    }
}

impl Deref for OutputFormatOverride<'_> {
    type Target = MapContext;

    fn deref(&self) -> &MapContext {
        self.map
    }
}

impl DerefMut for OutputFormatOverride<'_> {
    fn deref_mut(&mut self) -> &mut MapContext {
        self.map
    }
}

impl Drop for OutputFormatOverride<'_> {
    fn drop(&mut self) {
        if let Some(saved) = self.saved.take() {
            debug!(format = %saved.name, "output format restored");
            self.map.output_format = saved;
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_driver_renderers() {
        assert_eq!(Driver::Raster.renderer().map(|r| r.name()), Some("raster"));
        assert_eq!(Driver::Svg.renderer().map(|r| r.name()), Some("svg"));
        assert!(Driver::ImageMap.renderer().is_none());
        assert!(Driver::Gdal.renderer().is_none());
        assert!(Driver::Svg.is_vector());
    }

    #[test]
    fn test_select() {
        let reg = OutputFormatRegistry::with_defaults();
        assert_eq!(reg.select("SVG").unwrap().driver, Driver::Svg);
        assert_eq!(reg.select("image/bmp").unwrap().name, "bmp");
        assert!(matches!(
            reg.select("webp"),
            Err(ScaleError::UnknownOutputFormat(_))
        ));
        assert!(matches!(
            OutputFormatRegistry::empty().select("bmp"),
            Err(ScaleError::UnknownOutputFormat(_))
        ));
    }

    #[test]
    fn test_register_replaces_by_name() {
        let mut reg = OutputFormatRegistry::with_defaults();
        let n = reg.iter().count();
        reg.register(OutputFormat::new("BMP", Driver::Gdal, "image/x-bmp", "bmp"));
        assert_eq!(reg.iter().count(), n);
        assert_eq!(reg.select("bmp").unwrap().driver, Driver::Gdal);
        reg.register(OutputFormat::new("jpeg", Driver::Gdal, "image/jpeg", "jpg"));
        assert_eq!(reg.iter().count(), n + 1);
    }

    #[test]
    fn test_apply_override() {
        let reg = OutputFormatRegistry::with_defaults();
        let f = reg.select("bmp").unwrap();
        let t = f.apply_override(true);
        assert!(t.transparent);
        assert!(!f.transparent);
        assert_eq!(t.name, f.name);
    }

    #[test]
    fn test_pixel_buffer_support() {
        let reg = OutputFormatRegistry::with_defaults();
        assert!(reg.select("bmp").unwrap().supports_pixel_buffer());
        assert!(!reg.select("svg").unwrap().supports_pixel_buffer());
        assert!(!reg.select("imagemap").unwrap().supports_pixel_buffer());
    }

    #[test]
    fn test_override_restores_on_drop() {
        let mut map = MapContext::default();
        map.select_output_format("imagemap").unwrap();
        {
            let guard = OutputFormatOverride::new(&mut map, "bmp").unwrap();
            assert_eq!(guard.output_format.name, "bmp");
        }
        assert_eq!(map.output_format.name, "imagemap");
    }

    #[test]
    fn test_override_restores_on_error_path() {
        fn failing(map: &mut MapContext) -> Result<()> {
            let guard = OutputFormatOverride::new(map, "svg")?;
            assert_eq!(guard.output_format.name, "svg");
            Err(ScaleError::NoPixelBuffer)
        }
        let mut map = MapContext::default();
        map.select_output_format("gtiff").unwrap();
        assert!(failing(&mut map).is_err());
        assert_eq!(map.output_format.name, "gtiff");
    }

    #[test]
    fn test_override_unknown_format_changes_nothing() {
        let mut map = MapContext::default();
        assert!(OutputFormatOverride::new(&mut map, "nope").is_err());
        assert_eq!(map.output_format.name, RASTER_FORMAT);
    }
}
