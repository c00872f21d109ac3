//! Map layers, classes, labels and styles.
//!
//! Only as much of a layer model as decorations need: a layer owns classes,
//! a class owns marker styles and labels, and a style references a symbol by
//! index. Layers marked [`LayerStatus::Delete`] are hidden from legends and
//! left out when the layer set is serialized.

use serde::ser::SerializeSeq;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::text::LabelSize;
use crate::units::Units;

/// Highest label priority; such labels are placed first.
pub const MAX_LABEL_PRIORITY: u8 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayerType {
    #[default]
    Point,
    Line,
    Polygon,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayerStatus {
    On,
    #[default]
    Off,
    /// Always drawn.
    Default,
    /// Internal layer, skipped by legends and serialization.
    Delete,
}

/// Geometry a style is applied to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GeomTransform {
    #[default]
    None,
    /// The point the owning label is anchored at.
    LabelPoint,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Style {
    /// Index into the map's symbol set.
    pub symbol: Option<usize>,
    pub geom_transform: GeomTransform,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Label {
    /// Draw even when colliding with already placed labels.
    pub force: bool,
    pub size: LabelSize,
    pub priority: u8,
    pub annotext: Option<String>,
    pub styles: Vec<Style>,
}

impl Default for Label {
    fn default() -> Self {
        Self {
            force: false,
            size: LabelSize::Medium,
            priority: 1,
            annotext: None,
            styles: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Class {
    pub name: Option<String>,
    pub styles: Vec<Style>,
    pub labels: Vec<Label>,
}

impl Class {
    /// Style `index`, allocating default styles up to it if needed.
    pub fn style_mut(&mut self, index: usize) -> &mut Style {
        if self.styles.len() <= index {
            self.styles.resize_with(index + 1, Style::default);
        }
        &mut self.styles[index]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layer {
    pub name: String,
    #[serde(default)]
    pub kind: LayerType,
    #[serde(default)]
    pub status: LayerStatus,
    #[serde(default = "default_scale_factor")]
    pub scale_factor: f64,
    /// Units of symbol sizes and offsets. `Pixels` means screen pixels.
    #[serde(default = "default_size_units")]
    pub size_units: Units,
    #[serde(default)]
    pub classes: Vec<Class>,
}

fn default_scale_factor() -> f64 {
    1.0
}

fn default_size_units() -> Units {
    Units::Pixels
}

impl Layer {
    pub fn new(name: &str, kind: LayerType) -> Self {
        Self {
            name: name.to_string(),
            kind,
            status: LayerStatus::Off,
            scale_factor: 1.0,
            size_units: Units::Pixels,
            classes: Vec::new(),
        }
    }
}

// ============================================================================
// Registry
// ============================================================================

/// Storage for map layers, addressed by index.
pub trait LayerRegistry {
    fn index_of(&self, name: &str) -> Option<usize>;
    fn layer(&self, index: usize) -> Option<&Layer>;
    fn layer_mut(&mut self, index: usize) -> Option<&mut Layer>;
    /// Append `layer` at the end of the draw order and return its index.
    fn append(&mut self, layer: Layer) -> usize;
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Layers plus their draw order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayerSet {
    layers: Vec<Layer>,
    order: Vec<usize>,
}

impl LayerSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Layer indices in draw order.
    pub fn draw_order(&self) -> &[usize] {
        &self.order
    }

    /// Layers in draw order, internal layers excluded.
    pub fn legend_layers(&self) -> impl Iterator<Item = &Layer> {
        self.order
            .iter()
            .filter_map(|&i| self.layers.get(i))
            .filter(|l| l.status != LayerStatus::Delete)
    }
}

impl LayerRegistry for LayerSet {
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
        let index = self.layers.len();
        self.layers.push(layer);
        self.order.push(index);
        index
    }

    fn len(&self) -> usize {
        self.layers.len()
    }
}

impl Serialize for LayerSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let visible: Vec<&Layer> = self.legend_layers().collect();
        let mut seq = serializer.serialize_seq(Some(visible.len()))?;
        for layer in visible {
            seq.serialize_element(layer)?;
        }
        seq.end()
    }
}

impl<'de> Deserialize<'de> for LayerSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let layers = Vec::<Layer>::deserialize(deserializer)?;
        let order = (0..layers.len()).collect();
        Ok(Self { layers, order })
    }
}

// ============================================================================
// Tests
// ============================================================================
