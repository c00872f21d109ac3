//! The map context: everything a scale computation or scalebar draw reads
//! and writes.
//!
//! Operations take `&mut MapContext` explicitly; there is no global state.
//! [`MapContext::compute_scale`] and the scalebar functions update
//! `extent`, `cellsize` and `scale_denom` in place.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::basics::Extent;
use crate::color::Rgba8;
use crate::error::{Result, ScaleError};
use crate::label_cache::LabelCache;
use crate::layer::{Layer, LayerSet};
use crate::outputformat::{Driver, OutputFormat, OutputFormatRegistry, RASTER_FORMAT};
use crate::renderer::{Canvas, Renderer};
use crate::scale::{adjust_extent, calculate_scale, cellsize, UNDEFINED};
use crate::scalebar::ScalebarConfig;
use crate::symbol::SymbolSet;
use crate::units::{LatitudeAdjustment, Units};

/// Resolution every pixel size in the configuration is expressed at.
pub const DEFAULT_RESOLUTION: f64 = 72.0;

// ============================================================================
// Configuration
// ============================================================================

/// Serializable map settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    pub name: String,
    pub extent: Extent,
    pub units: Option<Units>,
    pub width: i32,
    pub height: i32,
    /// Output resolution, pixels per inch.
    pub resolution: f64,
    pub defresolution: f64,
    /// 1 for pixel-center extents, 0 for edge-to-edge.
    pub pixel_adjustment: i32,
    pub latitude_adjustment: LatitudeAdjustment,
    pub image_color: Rgba8,
    pub output_format: String,
    /// Extra formats, added to the built-in ones.
    pub formats: Vec<OutputFormat>,
    pub scalebar: ScalebarConfig,
    pub layers: LayerSet,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            name: "map".to_string(),
            extent: Extent::new(-1.0, -1.0, -1.0, -1.0),
            units: None,
            width: 400,
            height: 300,
            resolution: DEFAULT_RESOLUTION,
            defresolution: DEFAULT_RESOLUTION,
            pixel_adjustment: 1,
            latitude_adjustment: LatitudeAdjustment::None,
            image_color: Rgba8::WHITE,
            output_format: RASTER_FORMAT.to_string(),
            formats: Vec::new(),
            scalebar: ScalebarConfig::default(),
            layers: LayerSet::new(),
        }
    }
}

// ============================================================================
// MapContext
// ============================================================================

pub struct MapContext {
    pub name: String,
    pub extent: Extent,
    pub units: Option<Units>,
    pub width: i32,
    pub height: i32,
    pub resolution: f64,
    pub defresolution: f64,
    pub pixel_adjustment: i32,
    pub latitude_adjustment: LatitudeAdjustment,
    pub image_color: Rgba8,
    /// Ground size of one pixel; output of [`MapContext::compute_scale`].
    pub cellsize: f64,
    /// Scale denominator; output of [`MapContext::compute_scale`].
    pub scale_denom: f64,
    pub scalebar: ScalebarConfig,
    /// The active output format.
    pub output_format: OutputFormat,
    pub formats: OutputFormatRegistry,
    pub symbolset: SymbolSet,
    pub layers: LayerSet,
    pub label_cache: LabelCache,
}

impl Default for MapContext {
    fn default() -> Self {
        let formats = OutputFormatRegistry::with_defaults();
        let output_format = formats
            .select(RASTER_FORMAT)
            .cloned()
            .unwrap_or_else(|_| OutputFormat::new(RASTER_FORMAT, Driver::Raster, "image/bmp", "bmp"));
        let cfg = MapConfig::default();
        Self {
            name: cfg.name,
            extent: cfg.extent,
            units: cfg.units,
            width: cfg.width,
            height: cfg.height,
            resolution: cfg.resolution,
            defresolution: cfg.defresolution,
            pixel_adjustment: cfg.pixel_adjustment,
            latitude_adjustment: cfg.latitude_adjustment,
            image_color: cfg.image_color,
            cellsize: 0.0,
            scale_denom: UNDEFINED,
            scalebar: cfg.scalebar,
            output_format,
            formats,
            symbolset: SymbolSet::new(),
            layers: cfg.layers,
            label_cache: LabelCache::new(),
        }
    }
}

impl MapContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a context from settings. Fails on an unknown output format.
    pub fn from_config(config: MapConfig) -> Result<Self> {
        let mut formats = OutputFormatRegistry::with_defaults();
        for format in config.formats {
            formats.register(format);
        }
        let output_format = formats.select(&config.output_format)?.clone();
        if config.resolution <= 0.0 || config.defresolution <= 0.0 {
            return Err(ScaleError::InvalidConfig(format!(
                "resolution must be positive, got {}/{}",
                config.resolution, config.defresolution
            )));
        }
        Ok(Self {
            name: config.name,
            extent: config.extent,
            units: config.units,
            width: config.width,
            height: config.height,
            resolution: config.resolution,
            defresolution: config.defresolution,
            pixel_adjustment: config.pixel_adjustment,
            latitude_adjustment: config.latitude_adjustment,
            image_color: config.image_color,
            cellsize: 0.0,
            scale_denom: UNDEFINED,
            scalebar: config.scalebar,
            output_format,
            formats,
            symbolset: SymbolSet::new(),
            layers: config.layers,
            label_cache: LabelCache::new(),
        })
    }

    /// Settings of this context. Internal layers are left out when the
    /// result is serialized.
    pub fn to_config(&self) -> MapConfig {
        MapConfig {
            name: self.name.clone(),
            extent: self.extent,
            units: self.units,
            width: self.width,
            height: self.height,
            resolution: self.resolution,
            defresolution: self.defresolution,
            pixel_adjustment: self.pixel_adjustment,
            latitude_adjustment: self.latitude_adjustment,
            image_color: self.image_color,
            output_format: self.output_format.name.clone(),
            formats: Vec::new(),
            scalebar: self.scalebar.clone(),
            layers: self.layers.clone(),
        }
    }

    /// Output resolution relative to the resolution sizes are given at.
    pub fn resolution_factor(&self) -> f64 {
        self.resolution / self.defresolution
    }

    pub fn select_output_format(&mut self, name: &str) -> Result<()> {
        self.output_format = self.formats.select(name)?.clone();
        Ok(())
    }

    /// Renderer of the active output format, if it has one.
    pub fn renderer(&self) -> Option<Box<dyn Renderer>> {
        self.output_format.renderer()
    }

    /// Square up the extent with the image, then store the resulting
    /// cellsize and scale denominator. Returns the scale denominator.
    pub fn compute_scale(&mut self) -> Result<f64> {
        let units = self.units.ok_or(ScaleError::MapUnitsNotSet)?;
        self.cellsize = adjust_extent(
            &mut self.extent,
            self.width,
            self.height,
            self.pixel_adjustment,
        );
        self.scale_denom = calculate_scale(
            &self.extent,
            units,
            self.width,
            self.height,
            self.pixel_adjustment,
            self.resolution,
            self.latitude_adjustment,
        )?;
        debug!(cellsize = self.cellsize, scale = self.scale_denom, "map scale");
        Ok(self.scale_denom)
    }

    /// Convert a size of `value` pixels into `layer`'s size units.
    ///
    /// Uses the larger of the two axis cellsizes. Layers sized in pixels
    /// get the value in map units.
    pub fn pix_to_layer_georef(&self, layer: &Layer, value: i32) -> Result<f64> {
        let map_units = self.units.ok_or(ScaleError::MapUnitsNotSet)?;
        let cs = cellsize(self.extent.minx, self.extent.maxx, self.width, self.pixel_adjustment)
            .max(cellsize(
                self.extent.miny,
                self.extent.maxy,
                self.height,
                self.pixel_adjustment,
            ));
        let units_factor = if layer.size_units == Units::Pixels {
            1.0
        } else {
            map_units.ratio_to(layer.size_units)
        };
        Ok(value as f64 * cs * self.resolution_factor() * units_factor)
    }

    /// A blank map image in the active output format, filled with the map's
    /// image color.
    pub fn create_map_image(&self) -> Result<Box<dyn Canvas>> {
        let renderer = self.renderer().ok_or_else(|| {
            let e = ScaleError::UnsupportedOutputFormat(self.output_format.name.clone());
            warn!("create_map_image: {}", e);
            e
        })?;
        let background = if self.output_format.transparent {
            None
        } else {
            Some(self.image_color)
        };
        renderer.create_image(self.width, self.height, background, self.resolution_factor())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layer::LayerType;

    fn world() -> MapContext {
        let mut map = MapContext::new();
        map.extent = Extent::new(-180.0, -90.0, 180.0, 90.0);
        map.units = Some(Units::DecimalDegrees);
        map.width = 256;
        map.height = 256;
        map.resolution = 96.0;
        map
    }

    #[test]
    fn test_defaults() {
        let map = MapContext::new();
        assert_eq!(map.output_format.name, RASTER_FORMAT);
        assert_eq!(map.resolution_factor(), 1.0);
        assert_eq!(map.scale_denom, UNDEFINED);
        assert!(map.units.is_none());
    }

    #[test]
    fn test_compute_scale_world() {
        let mut map = world();
        let scale = map.compute_scale().unwrap();
        // The extent grows vertically to 360 x 360 degrees.
        assert!((map.extent.miny - -180.0).abs() < 1e-9);
        assert!((map.cellsize - 360.0 / 255.0).abs() < 1e-12);
        let expected = 360.0 / (255.0 / (96.0 * 4374754.0));
        assert!((scale - expected).abs() / expected < 1e-12);
        assert_eq!(map.scale_denom, scale);
    }

    #[test]
    fn test_compute_scale_requires_units() {
        let mut map = world();
        map.units = None;
        assert!(matches!(map.compute_scale(), Err(ScaleError::MapUnitsNotSet)));
    }

    #[test]
    fn test_compute_scale_invalid_extent() {
        let mut map = MapContext::new();
        map.units = Some(Units::Meters);
        assert!(matches!(
            map.compute_scale(),
            Err(ScaleError::InvalidExtent { .. })
        ));
    }

    #[test]
    fn test_pix_to_layer_georef() {
        let mut map = MapContext::new();
        map.units = Some(Units::Meters);
        map.extent = Extent::new(0.0, 0.0, 1000.0, 500.0);
        map.width = 101;
        map.height = 101;
        let mut layer = Layer::new("l", LayerType::Point);
        // cellsize = max(10, 5) = 10 m
        assert!((map.pix_to_layer_georef(&layer, 3).unwrap() - 30.0).abs() < 1e-9);
        layer.size_units = Units::Kilometers;
        assert!((map.pix_to_layer_georef(&layer, 3).unwrap() - 0.03).abs() < 1e-9);
        map.resolution = 144.0;
        assert!((map.pix_to_layer_georef(&layer, 3).unwrap() - 0.06).abs() < 1e-9);
    }

    #[test]
    fn test_config_round_trip_keeps_settings() {
        let cfg: MapConfig = serde_json::from_str(
            r#"{"units":"meters","width":640,"height":480,"output_format":"svg",
                "extent":{"minx":0,"miny":0,"maxx":10,"maxy":10}}"#,
        )
        .unwrap();
        let map = MapContext::from_config(cfg).unwrap();
        assert_eq!(map.output_format.name, "svg");
        assert_eq!(map.width, 640);
        assert_eq!(map.units, Some(Units::Meters));
        let back = map.to_config();
        assert_eq!(back.output_format, "svg");
        assert_eq!(back.extent, Extent::new(0.0, 0.0, 10.0, 10.0));
    }

    #[test]
    fn test_from_config_unknown_format() {
        let cfg = MapConfig {
            output_format: "webp".to_string(),
            ..MapConfig::default()
        };
        assert!(matches!(
            MapContext::from_config(cfg),
            Err(ScaleError::UnknownOutputFormat(_))
        ));
    }

    #[test]
    fn test_create_map_image() {
        let mut map = MapContext::new();
        map.width = 20;
        map.height = 10;
        let img = map.create_map_image().unwrap();
        assert_eq!((img.width(), img.height()), (20, 10));
        map.select_output_format("gtiff").unwrap();
        assert!(map.create_map_image().is_err());
    }
}
