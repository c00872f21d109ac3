//! Folding a rendered scalebar into the map image.
//!
//! The scalebar is drawn on its own canvas, turned into a symbol (a pixmap
//! for raster output, an SVG document for vector output) and attached to a
//! hidden point layer. Depending on `postlabelcache` the symbol is either
//! drawn onto the map right away or queued in the label cache so that it is
//! placed with the other labels.

use tracing::{debug, warn};

use crate::basics::{iround, PointD};
use crate::error::{Result, ScaleError};
use crate::label_cache::LabelCacheEntry;
use crate::layer::{
    Class, GeomTransform, Label, Layer, LayerRegistry, LayerStatus, LayerType, Style,
    MAX_LABEL_PRIORITY,
};
use crate::map::MapContext;
use crate::outputformat::{OutputFormatOverride, RASTER_FORMAT, VECTOR_FORMAT};
use crate::renderer::Canvas;
use crate::scalebar::{draw_scalebar, ScalebarPosition};
use crate::symbol::{Symbol, SymbolRegistry};
use crate::text::{LabelSize, LabelStyle};

/// Name of the symbol holding the rendered scalebar.
pub const SCALEBAR_SYMBOL: &str = "scalebar";
/// Name of the hidden layer the scalebar symbol hangs off.
pub const SCALEBAR_LAYER: &str = "__embed__scalebar";

/// Render the map's scalebar and attach it to `target`, the map image.
///
/// Any scalebar symbol left from an earlier call is replaced. Output
/// formats without a pixel buffer render through a temporary raster or
/// SVG format; the map's own format is back in place when this returns,
/// whether it succeeded or not.
pub fn embed_scalebar(map: &mut MapContext, target: &mut dyn Canvas) -> Result<()> {
    let result = embed(map, target);
    if let Err(e) = &result {
        warn!("embed_scalebar: {}", e);
    }
    result
}

fn embed(map: &mut MapContext, target: &mut dyn Canvas) -> Result<()> {
    map.symbolset.remove(SCALEBAR_SYMBOL);

    let mut symbol = render_symbol(map)?;
    symbol.transparent = map.scalebar.transparent;
    let point = placement_point(
        map.scalebar.position,
        map.width,
        map.height,
        symbol.size_x,
        symbol.size_y,
    );
    let symbol_index = map.symbolset.insert(symbol);

    let immediate = map.scalebar.postlabelcache;
    let layer_index = ensure_host_layer(&mut map.layers);
    let layer = map
        .layers
        .layer_mut(layer_index)
        .ok_or(ScaleError::Allocation("scalebar layer"))?;
    bind_symbol(layer, symbol_index, immediate);
    debug!(
        layer = layer_index,
        symbol = symbol_index,
        x = point.x,
        y = point.y,
        immediate,
        "embedding scalebar"
    );

    let result = if immediate {
        match map.symbolset.get(symbol_index) {
            Some(symbol) => target.draw_symbol(symbol, point, 1.0),
            None => Err(ScaleError::Allocation("scalebar symbol")),
        }
    } else {
        let label = &layer.classes[0].labels[0];
        map.label_cache.add(LabelCacheEntry {
            layer: layer_index,
            class: 0,
            point,
            symbol: Some(symbol_index),
            text: label.annotext.clone(),
            style: LabelStyle {
                size: label.size,
                ..LabelStyle::default()
            },
            priority: label.priority,
            force: label.force,
        });
        Ok(())
    };

    layer.status = LayerStatus::Delete;
    result
}

/// Draw the scalebar, switching to a format with a pixel buffer (or to SVG
/// for vector drivers) when the current one has none.
fn render_symbol(map: &mut MapContext) -> Result<Symbol> {
    let has_pixel_buffer = map
        .renderer()
        .map_or(false, |r| r.caps().supports_pixel_buffer);

    let canvas = if has_pixel_buffer {
        draw_scalebar(map)?
    } else {
        let fallback = if map.output_format.driver.is_vector() {
            VECTOR_FORMAT
        } else {
            RASTER_FORMAT
        };
        let mut guard = OutputFormatOverride::new(map, fallback)?;
        draw_scalebar(&mut guard)?
    };
    symbol_from_canvas(canvas.as_ref())
}

fn symbol_from_canvas(canvas: &dyn Canvas) -> Result<Symbol> {
    match canvas.vector_document() {
        Some(document) => Ok(Symbol::svg(
            SCALEBAR_SYMBOL,
            document,
            canvas.width() as f64,
            canvas.height() as f64,
        )),
        None => Ok(Symbol::pixmap(SCALEBAR_SYMBOL, canvas.raster_buffer_copy()?)),
    }
}

/// Center of a `size_x` x `size_y` symbol anchored at `position` on a
/// `map_width` x `map_height` image.
pub fn placement_point(
    position: ScalebarPosition,
    map_width: i32,
    map_height: i32,
    size_x: f64,
    size_y: f64,
) -> PointD {
    let left = iround(size_x / 2.0);
    let right = map_width - iround(size_x / 2.0);
    let center = iround(map_width as f64 / 2.0);
    let top = iround(size_y / 2.0);
    let bottom = map_height - iround(size_y / 2.0);

    let (x, y) = match position {
        ScalebarPosition::LowerLeft => (left, bottom),
        ScalebarPosition::LowerRight => (right, bottom),
        ScalebarPosition::LowerCenter => (center, bottom),
        ScalebarPosition::UpperRight => (right, top),
        ScalebarPosition::UpperLeft => (left, top),
        ScalebarPosition::UpperCenter => (center, top),
    };
    PointD::new(x as f64, y as f64)
}

/// Index of the scalebar host layer, created on first use.
///
/// A new host is a point layer with a single class, appended to the draw
/// order. An existing one without classes gets its class back.
pub fn ensure_host_layer(layers: &mut dyn LayerRegistry) -> usize {
    let index = match layers.index_of(SCALEBAR_LAYER) {
        Some(index) => index,
        None => {
            let mut layer = Layer::new(SCALEBAR_LAYER, LayerType::Point);
            layer.classes.push(Class::default());
            layers.append(layer)
        }
    };
    if let Some(layer) = layers.layer_mut(index) {
        if layer.classes.is_empty() {
            layer.classes.push(Class::default());
        }
    }
    index
}

/// Point the host layer at `symbol`.
///
/// Immediate mode uses style 0 of the first class. Deferred mode uses the
/// first style of the first label, creating a forced top-priority label
/// anchored at the label point if the class has none.
pub fn bind_symbol(layer: &mut Layer, symbol: usize, immediate: bool) {
    layer.status = LayerStatus::On;
    layer.scale_factor = 1.0;
    if layer.classes.is_empty() {
        layer.classes.push(Class::default());
    }
    let class = &mut layer.classes[0];

    if immediate {
        class.style_mut(0).symbol = Some(symbol);
        return;
    }

    if class.labels.is_empty() {
        class.labels.push(Label {
            force: true,
            size: LabelSize::Medium,
            priority: MAX_LABEL_PRIORITY,
            annotext: None,
            styles: Vec::new(),
        });
    }
    let label = &mut class.labels[0];
    if label.styles.is_empty() {
        label.styles.push(Style {
            symbol: None,
            geom_transform: GeomTransform::LabelPoint,
        });
    }
    label.styles[0].symbol = Some(symbol);
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::basics::Extent;
    use crate::color::Rgba8;
    use crate::scalebar::ScalebarStatus;
    use crate::symbol::SymbolKind;
    use crate::units::Units;

    /// Layer store that records every append.
    #[derive(Default)]
    struct FakeLayers {
        layers: Vec<Layer>,
        appends: usize,
    }

    impl LayerRegistry for FakeLayers {
        fn index_of(&self, name: &str) -> Option<usize> {
            self.layers.iter().position(|l| l.name == name)
        }

        fn layer(&self, index: usize) -> Option<&Layer> {
            self.layers.get(index)
        }

        fn layer_mut(&mut self, index: usize) -> Option<&mut Layer> {
            self.layers.get_mut(index)
        }

        fn append(&mut self, layer: Layer) -> usize {
            self.appends += 1;
            self.layers.push(layer);
            self.layers.len() - 1
        }

        fn len(&self) -> usize {
            self.layers.len()
        }
    }

    fn map() -> MapContext {
        let mut map = MapContext::default();
        map.units = Some(Units::Meters);
        map.width = 401;
        map.height = 301;
        map.extent = Extent::new(0.0, 0.0, 4000.0, 3000.0);
        map.scalebar.status = ScalebarStatus::Embed;
        map.scalebar.units = Units::Meters;
        map.scalebar.width = 300;
        map
    }

    #[test]
    fn test_placement_points() {
        let p = |pos| placement_point(pos, 400, 300, 101.0, 30.0);
        assert_eq!(p(ScalebarPosition::LowerLeft), PointD::new(51.0, 285.0));
        assert_eq!(p(ScalebarPosition::LowerRight), PointD::new(349.0, 285.0));
        assert_eq!(p(ScalebarPosition::LowerCenter), PointD::new(200.0, 285.0));
        assert_eq!(p(ScalebarPosition::UpperLeft), PointD::new(51.0, 15.0));
        assert_eq!(p(ScalebarPosition::UpperRight), PointD::new(349.0, 15.0));
        assert_eq!(p(ScalebarPosition::UpperCenter), PointD::new(200.0, 15.0));
    }

    #[test]
    fn test_host_layer_created_once() {
        let mut layers = FakeLayers::default();
        layers.append(Layer::new("roads", LayerType::Line));
        let a = ensure_host_layer(&mut layers);
        let b = ensure_host_layer(&mut layers);
        assert_eq!(a, 1);
        assert_eq!(a, b);
        assert_eq!(layers.appends, 2);
        let host = layers.layer(a).unwrap();
        assert_eq!(host.kind, LayerType::Point);
        assert_eq!(host.classes.len(), 1);
    }

    #[test]
    fn test_host_layer_class_restored() {
        let mut layers = FakeLayers::default();
        layers.append(Layer::new(SCALEBAR_LAYER, LayerType::Point));
        let i = ensure_host_layer(&mut layers);
        assert_eq!(i, 0);
        assert_eq!(layers.layer(0).unwrap().classes.len(), 1);
    }

    #[test]
    fn test_bind_deferred() {
        let mut layer = Layer::new(SCALEBAR_LAYER, LayerType::Point);
        layer.scale_factor = 3.0;
        bind_symbol(&mut layer, 4, false);
        assert_eq!(layer.scale_factor, 1.0);
        let label = &layer.classes[0].labels[0];
        assert!(label.force);
        assert_eq!(label.priority, MAX_LABEL_PRIORITY);
        assert_eq!(label.size, LabelSize::Medium);
        assert!(label.annotext.is_none());
        assert_eq!(label.styles[0].symbol, Some(4));
        assert_eq!(label.styles[0].geom_transform, GeomTransform::LabelPoint);

        // A second bind reuses the label.
        bind_symbol(&mut layer, 5, false);
        assert_eq!(layer.classes[0].labels.len(), 1);
        assert_eq!(layer.classes[0].labels[0].styles[0].symbol, Some(5));
    }

    #[test]
    fn test_bind_immediate() {
        let mut layer = Layer::new(SCALEBAR_LAYER, LayerType::Point);
        bind_symbol(&mut layer, 2, true);
        assert_eq!(layer.classes[0].styles[0].symbol, Some(2));
        assert!(layer.classes[0].labels.is_empty());
    }

    #[test]
    fn test_embed_deferred() {
        let mut m = map();
        let mut target = m.create_map_image().unwrap();
        embed_scalebar(&mut m, target.as_mut()).unwrap();

        let s = m.symbolset.index_of(SCALEBAR_SYMBOL).unwrap();
        assert!(matches!(m.symbolset.get(s).unwrap().kind, SymbolKind::Pixmap(_)));
        let l = m.layers.index_of(SCALEBAR_LAYER).unwrap();
        assert_eq!(m.layers.layer(l).unwrap().status, LayerStatus::Delete);
        assert_eq!(m.label_cache.len(), 1);
        let entry = &m.label_cache.entries()[0];
        assert!(entry.force);
        assert_eq!(entry.symbol, Some(s));
        assert_eq!(m.layers.legend_layers().count(), 0);

        // Nothing is drawn until the cache is flushed.
        let before = target.raster_buffer_copy().unwrap();
        assert!(before.data().chunks(4).all(|p| p == [255, 255, 255, 255]));
        let drawn = m.label_cache.render(target.as_mut(), &m.symbolset).unwrap();
        assert_eq!(drawn, 1);
        let after = target.raster_buffer_copy().unwrap();
        assert!(after.data().chunks(4).any(|p| p != [255, 255, 255, 255]));
    }

    #[test]
    fn test_embed_immediate_lower_left() {
        let mut m = map();
        m.scalebar.postlabelcache = true;
        let mut target = m.create_map_image().unwrap();
        embed_scalebar(&mut m, target.as_mut()).unwrap();
        assert!(m.label_cache.is_empty());

        let s = m.symbolset.index_of(SCALEBAR_SYMBOL).unwrap();
        let sym = m.symbolset.get(s).unwrap();
        let (sx, sy) = (sym.size_x as i32, sym.size_y as i32);
        let buf = target.raster_buffer_copy().unwrap();
        let mut marked = 0;
        for y in 0..buf.height() as i32 {
            for x in 0..buf.width() as i32 {
                if buf.pixel(x, y) != Rgba8::WHITE {
                    marked += 1;
                    assert!(x <= sx && y >= 301 - sy - 1, "stray pixel at {},{}", x, y);
                }
            }
        }
        assert!(marked > 0);
    }

    #[test]
    fn test_embed_twice_keeps_one_symbol() {
        let mut m = map();
        m.symbolset
            .insert(Symbol::svg("star", "<svg/>".to_string(), 8.0, 8.0));
        let mut target = m.create_map_image().unwrap();
        embed_scalebar(&mut m, target.as_mut()).unwrap();
        embed_scalebar(&mut m, target.as_mut()).unwrap();
        let count = m
            .symbolset
            .iter()
            .filter(|s| s.name == SCALEBAR_SYMBOL)
            .count();
        assert_eq!(count, 1);
        assert_eq!(m.symbolset.len(), 2);
        assert_eq!(m.layers.len(), 1);
    }

    #[test]
    fn test_transparent_symbol() {
        let mut m = map();
        m.scalebar.transparent = true;
        let mut target = m.create_map_image().unwrap();
        embed_scalebar(&mut m, target.as_mut()).unwrap();
        let s = m.symbolset.index_of(SCALEBAR_SYMBOL).unwrap();
        assert!(m.symbolset.get(s).unwrap().transparent);
    }

    #[test]
    fn test_transparent_scalebar_shows_map_underneath() {
        let blue = Rgba8::new_opaque(0, 0, 255);
        let blue_under_symbol = |transparent: bool| {
            let mut m = map();
            m.image_color = blue;
            m.scalebar.postlabelcache = true;
            m.scalebar.transparent = transparent;
            let mut target = m.create_map_image().unwrap();
            embed_scalebar(&mut m, target.as_mut()).unwrap();
            let s = m.symbolset.index_of(SCALEBAR_SYMBOL).unwrap();
            let sym = m.symbolset.get(s).unwrap();
            let (sx, sy) = (sym.size_x as i32, sym.size_y as i32);
            let buf = target.raster_buffer_copy().unwrap();
            let mut n = 0;
            for y in (301 - sy + 1)..300 {
                for x in 1..(sx - 1) {
                    if buf.pixel(x, y) == blue {
                        n += 1;
                    }
                }
            }
            n
        };
        assert!(blue_under_symbol(true) > 0);
        assert_eq!(blue_under_symbol(false), 0);
    }

    #[test]
    fn test_fallback_restores_format() {
        let mut m = map();
        m.select_output_format("gtiff").unwrap();
        let mut target = crate::raster::RasterCanvas::new(401, 301, Some(Rgba8::WHITE), 1.0).unwrap();
        embed_scalebar(&mut m, &mut target).unwrap();
        assert_eq!(m.output_format.name, "gtiff");
        let s = m.symbolset.index_of(SCALEBAR_SYMBOL).unwrap();
        assert!(matches!(m.symbolset.get(s).unwrap().kind, SymbolKind::Pixmap(_)));

        m.units = None;
        assert!(matches!(
            embed_scalebar(&mut m, &mut target),
            Err(ScaleError::MapUnitsNotSet)
        ));
        assert_eq!(m.output_format.name, "gtiff");
    }

    #[test]
    fn test_vector_output_embeds_svg() {
        let mut m = map();
        m.select_output_format("svg").unwrap();
        let mut target = m.create_map_image().unwrap();
        embed_scalebar(&mut m, target.as_mut()).unwrap();
        assert_eq!(m.output_format.name, "svg");
        let s = m.symbolset.index_of(SCALEBAR_SYMBOL).unwrap();
        assert!(matches!(m.symbolset.get(s).unwrap().kind, SymbolKind::Svg(_)));

        m.label_cache.render(target.as_mut(), &m.symbolset).unwrap();
        let doc = target.vector_document().unwrap();
        assert!(doc.contains("<g transform=\"translate("));
    }
}
