//! Scale denominator and extent/pixel arithmetic.
//!
//! The scale denominator `N` reads as "one unit on screen represents `N` of
//! the same unit on the ground". It depends on the extent, the image size
//! in pixels and the physical resolution of the output (pixels per inch).
//!
//! `pixel_adjustment` selects between edge-to-edge (0) and pixel-center to
//! pixel-center (1) extents: with 1, an image `w` pixels wide spans `w - 1`
//! cells.

use tracing::warn;

use crate::basics::Extent;
use crate::error::{Result, ScaleError};
use crate::units::{LatitudeAdjustment, Units};

/// Sentinel for "no defined value". Not an error: callers that care must
/// check for it explicitly.
pub const UNDEFINED: f64 = -1.0;

/// Compute the scale denominator for an extent rendered at `width` x `height`.
///
/// Fails on a degenerate or inverted extent, on image dimensions that
/// leave no cells after `pixel_adjustment`, and on a non-positive
/// resolution. Units without a physical size yield [`UNDEFINED`].
pub fn calculate_scale(
    extent: &Extent,
    units: Units,
    width: i32,
    height: i32,
    pixel_adjustment: i32,
    resolution: f64,
    adjustment: LatitudeAdjustment,
) -> Result<f64> {
    if !extent.is_valid() {
        let e = ScaleError::InvalidExtent {
            minx: extent.minx,
            miny: extent.miny,
            maxx: extent.maxx,
            maxy: extent.maxy,
        };
        warn!("calculate_scale: {}", e);
        return Err(e);
    }
    if width <= 0 || height <= 0 || width <= pixel_adjustment || height <= pixel_adjustment {
        let e = ScaleError::InvalidImageSize { width, height };
        warn!("calculate_scale: {}", e);
        return Err(e);
    }
    if !(resolution > 0.0 && resolution.is_finite()) {
        let e = ScaleError::InvalidConfig(format!("invalid resolution {}", resolution));
        warn!("calculate_scale: {}", e);
        return Err(e);
    }
    if !units.supports_scale() {
        return Ok(UNDEFINED);
    }

    let center_y = extent.center_y();
    let md = (width - pixel_adjustment) as f64
        / (resolution * units.inches_per_unit(center_y, adjustment));
    let gd = extent.width();
    Ok(gd / md)
}

/// Ground distance covered by one pixel along an axis.
#[inline]
pub fn cellsize(min: f64, max: f64, pixels: i32, pixel_adjustment: i32) -> f64 {
    (max - min) / (pixels - pixel_adjustment) as f64
}

/// Grow `extent` so both axes share one cellsize, and return that cellsize.
///
/// The larger of the two per-axis cellsizes wins; the other axis is padded
/// symmetrically. Returns 0 (leaving the extent untouched) for one-pixel
/// images or extents whose cellsize is not positive.
pub fn adjust_extent(extent: &mut Extent, width: i32, height: i32, pixel_adjustment: i32) -> f64 {
    if width == 1 || height == 1 || width <= pixel_adjustment || height <= pixel_adjustment {
        return 0.0;
    }

    let cs = cellsize(extent.minx, extent.maxx, width, pixel_adjustment).max(cellsize(
        extent.miny,
        extent.maxy,
        height,
        pixel_adjustment,
    ));
    if !(cs > 0.0) {
        return 0.0;
    }

    let ox = (((width - pixel_adjustment) as f64 - extent.width() / cs) / 2.0).max(0.0);
    let oy = (((height - pixel_adjustment) as f64 - extent.height() / cs) / 2.0).max(0.0);

    extent.minx -= ox * cs;
    extent.miny -= oy * cs;
    extent.maxx += ox * cs;
    extent.maxy += oy * cs;

    cs
}

/// Horizontal ground span that renders at `scale` on an image `width` pixels
/// wide. Inverse of [`calculate_scale`], using a pixel-center extent.
///
/// Returns [`UNDEFINED`] for a non-positive scale or width and for units
/// without a physical size.
pub fn delta_extent_for_scale(
    scale: f64,
    units: Units,
    center_lat: f64,
    width: i32,
    resolution: f64,
    adjustment: LatitudeAdjustment,
) -> f64 {
    if scale <= 0.0 || width <= 0 || !units.supports_scale() {
        return UNDEFINED;
    }
    let md = (width - 1) as f64 / (resolution * units.inches_per_unit(center_lat, adjustment));
    md * scale
}

/// Convert a pixel position into a georeferenced coordinate.
///
/// With `ul_is_y_origin` the pixel axis runs from the upper edge downwards,
/// as image rows do. Returns 0 when either span is empty.
pub fn pix_to_georef(
    pix_pos: i32,
    pix_min: i32,
    pix_max: i32,
    geo_min: f64,
    geo_max: f64,
    ul_is_y_origin: bool,
) -> f64 {
    let geo_width = geo_max - geo_min;
    let pix_width = pix_max - pix_min;
    if !(geo_width > 0.0 && pix_width > 0) {
        return 0.0;
    }

    let pix_to_geo = geo_width / pix_width as f64;
    let delta_pix = if ul_is_y_origin {
        pix_max - pix_pos
    } else {
        pix_pos - pix_min
    };
    geo_min + delta_pix as f64 * pix_to_geo
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn world() -> Extent {
        Extent::new(-180.0, -90.0, 180.0, 90.0)
    }

    #[test]
    fn test_world_in_degrees() {
        let scale = calculate_scale(
            &world(),
            Units::DecimalDegrees,
            256,
            256,
            1,
            96.0,
            LatitudeAdjustment::None,
        )
        .unwrap();
        let expected = 360.0 / (255.0 / (96.0 * 4374754.0));
        assert!((scale - expected).abs() / expected < 1e-12);
    }

    #[test]
    fn test_meters_edge_to_edge() {
        let extent = Extent::new(0.0, 0.0, 1000.0, 1000.0);
        let scale =
            calculate_scale(&extent, Units::Meters, 100, 100, 0, 72.0, LatitudeAdjustment::None)
                .unwrap();
        // 100 px at 72 dpi = 100/72 in on screen for 1000 m = 39370.1 in.
        let expected = 39370.1 / (100.0 / 72.0);
        assert!((scale - expected).abs() < 1e-6);
    }

    #[test]
    fn test_valid_inputs_give_positive_scale() {
        let extents = [
            Extent::new(0.0, 0.0, 1.0, 1.0),
            Extent::new(-5000.0, 10.0, -4000.0, 11.0),
            Extent::new(1e6, 1e6, 1.5e6, 1.2e6),
        ];
        for extent in &extents {
            for units in Units::ALL.iter().copied().filter(|u| u.supports_scale()) {
                for (w, h) in [(2, 2), (256, 256), (1024, 300)] {
                    let s = calculate_scale(extent, units, w, h, 1, 96.0, LatitudeAdjustment::None)
                        .unwrap();
                    assert!(s > 0.0 && s.is_finite(), "{:?} {:?} {}x{}", extent, units, w, h);
                }
            }
        }
    }

    #[test]
    fn test_degenerate_extent_rejected() {
        for extent in [
            Extent::new(0.0, 0.0, 0.0, 10.0),
            Extent::new(0.0, 10.0, 10.0, 0.0),
            Extent::new(5.0, 5.0, 5.0, 5.0),
        ] {
            let r = calculate_scale(&extent, Units::Meters, 100, 100, 1, 72.0, LatitudeAdjustment::None);
            assert!(matches!(r, Err(ScaleError::InvalidExtent { .. })));
        }
    }

    #[test]
    fn test_non_positive_size_rejected() {
        for (w, h) in [(0, 10), (10, 0), (-1, 10), (10, -5)] {
            let r = calculate_scale(&world(), Units::Meters, w, h, 1, 72.0, LatitudeAdjustment::None);
            assert!(matches!(r, Err(ScaleError::InvalidImageSize { .. })));
        }
    }

    #[test]
    fn test_no_cells_after_adjustment_rejected() {
        let extent = Extent::new(0.0, 0.0, 100.0, 100.0);
        let r = calculate_scale(&extent, Units::Meters, 1, 1, 1, 72.0, LatitudeAdjustment::None);
        assert!(matches!(r, Err(ScaleError::InvalidImageSize { width: 1, height: 1 })));
        let r = calculate_scale(&extent, Units::Meters, 100, 1, 1, 72.0, LatitudeAdjustment::None);
        assert!(matches!(r, Err(ScaleError::InvalidImageSize { .. })));
        // Edge-to-edge extents still work with a single pixel.
        let s = calculate_scale(&extent, Units::Meters, 1, 1, 0, 72.0, LatitudeAdjustment::None)
            .unwrap();
        assert!(s > 0.0 && s.is_finite());
    }

    #[test]
    fn test_bad_resolution_rejected() {
        let extent = Extent::new(0.0, 0.0, 100.0, 100.0);
        for res in [0.0, -72.0, f64::NAN, f64::INFINITY] {
            let r = calculate_scale(&extent, Units::Meters, 100, 100, 1, res, LatitudeAdjustment::None);
            assert!(matches!(r, Err(ScaleError::InvalidConfig(_))), "resolution {}", res);
        }
    }

    #[test]
    fn test_placeholder_units_are_soft_failure() {
        let r = calculate_scale(&world(), Units::Pixels, 100, 100, 1, 72.0, LatitudeAdjustment::None);
        assert_eq!(r.unwrap(), UNDEFINED);
        // Hard failures still win over the soft case.
        let r = calculate_scale(&world(), Units::Pixels, 0, 100, 1, 72.0, LatitudeAdjustment::None);
        assert!(r.is_err());
    }

    #[test]
    fn test_latitude_adjustment_raises_scale_denominator_less() {
        let north = Extent::new(0.0, 59.0, 1.0, 61.0);
        let plain =
            calculate_scale(&north, Units::DecimalDegrees, 200, 200, 1, 96.0, LatitudeAdjustment::None)
                .unwrap();
        let adjusted = calculate_scale(
            &north,
            Units::DecimalDegrees,
            200,
            200,
            1,
            96.0,
            LatitudeAdjustment::Spherical,
        )
        .unwrap();
        assert!(adjusted < plain);
    }

    #[test]
    fn test_adjust_extent_pads_short_axis() {
        let mut extent = Extent::new(0.0, 0.0, 100.0, 50.0);
        let cs = adjust_extent(&mut extent, 101, 101, 1);
        assert!((cs - 1.0).abs() < 1e-12);
        assert_eq!(extent.minx, 0.0);
        assert_eq!(extent.maxx, 100.0);
        assert!((extent.miny - -25.0).abs() < 1e-9);
        assert!((extent.maxy - 75.0).abs() < 1e-9);
    }

    #[test]
    fn test_adjust_extent_degenerate_sizes() {
        let mut extent = Extent::new(0.0, 0.0, 10.0, 10.0);
        assert_eq!(adjust_extent(&mut extent, 1, 100, 1), 0.0);
        assert_eq!(adjust_extent(&mut extent, 100, 1, 0), 0.0);
        assert_eq!(extent, Extent::new(0.0, 0.0, 10.0, 10.0));
        let mut flat = Extent::new(0.0, 0.0, 0.0, 0.0);
        assert_eq!(adjust_extent(&mut flat, 100, 100, 1), 0.0);
    }

    #[test]
    fn test_delta_extent_inverts_scale() {
        let extent = Extent::new(0.0, 0.0, 5000.0, 5000.0);
        let scale =
            calculate_scale(&extent, Units::Meters, 500, 500, 1, 96.0, LatitudeAdjustment::None)
                .unwrap();
        let delta =
            delta_extent_for_scale(scale, Units::Meters, 0.0, 500, 96.0, LatitudeAdjustment::None);
        assert!((delta - 5000.0).abs() < 1e-6);
    }

    #[test]
    fn test_delta_extent_sentinels() {
        let none = LatitudeAdjustment::None;
        assert_eq!(delta_extent_for_scale(0.0, Units::Meters, 0.0, 100, 96.0, none), UNDEFINED);
        assert_eq!(delta_extent_for_scale(1000.0, Units::Meters, 0.0, 0, 96.0, none), UNDEFINED);
        assert_eq!(delta_extent_for_scale(1000.0, Units::Pixels, 0.0, 100, 96.0, none), UNDEFINED);
    }

    #[test]
    fn test_pix_to_georef() {
        assert_eq!(pix_to_georef(50, 0, 100, 0.0, 1000.0, false), 500.0);
        assert_eq!(pix_to_georef(0, 0, 100, 0.0, 1000.0, true), 1000.0);
        assert_eq!(pix_to_georef(25, 0, 100, 200.0, 600.0, true), 500.0);
        assert_eq!(pix_to_georef(10, 0, 0, 0.0, 1000.0, false), 0.0);
        assert_eq!(pix_to_georef(10, 0, 100, 5.0, 5.0, false), 0.0);
    }
}
