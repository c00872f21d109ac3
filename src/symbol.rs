//! Named symbols and the map's symbol set.
//!
//! A rendered scalebar is folded into the map as a symbol: a pixmap for
//! raster output or an SVG document for vector output.

use tracing::debug;

use crate::image::ImageBuffer;

// ============================================================================
// Symbol
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum SymbolKind {
    Pixmap(ImageBuffer),
    /// A complete `<svg>` document.
    Svg(String),
}

impl SymbolKind {
    pub fn name(&self) -> &'static str {
        match self {
            SymbolKind::Pixmap(_) => "pixmap",
            SymbolKind::Svg(_) => "svg",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Symbol {
    pub name: String,
    pub kind: SymbolKind,
    pub size_x: f64,
    pub size_y: f64,
    /// Composite the symbol over the target, leaving its empty pixels
    /// untouched. Opaque symbols overwrite the pixels they cover.
    pub transparent: bool,
}

impl Symbol {
    pub fn pixmap(name: impl Into<String>, image: ImageBuffer) -> Self {
        let (w, h) = (image.width() as f64, image.height() as f64);
        Self {
            name: name.into(),
            kind: SymbolKind::Pixmap(image),
            size_x: w,
            size_y: h,
            transparent: false,
        }
    }

    pub fn svg(name: impl Into<String>, document: String, width: f64, height: f64) -> Self {
        Self {
            name: name.into(),
            kind: SymbolKind::Svg(document),
            size_x: width,
            size_y: height,
            transparent: false,
        }
    }
}

// ============================================================================
// Registry
// ============================================================================

/// Storage for named symbols, addressed by index.
///
/// Indices of symbols after a removed one shift down by one.
pub trait SymbolRegistry {
    fn index_of(&self, name: &str) -> Option<usize>;
    fn get(&self, index: usize) -> Option<&Symbol>;
    /// Remove the symbol called `name`. Returns whether one was removed.
    fn remove(&mut self, name: &str) -> bool;
    /// Append `symbol` and return its index.
    fn insert(&mut self, symbol: Symbol) -> usize;
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The map's in-memory symbol set.
#[derive(Debug, Clone, Default)]
pub struct SymbolSet {
    symbols: Vec<Symbol>,
}

impl SymbolSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Symbol> {
        self.symbols.iter()
    }
}

impl SymbolRegistry for SymbolSet {
    fn index_of(&self, name: &str) -> Option<usize> {
        self.symbols.iter().position(|s| s.name == name)
    }

    fn get(&self, index: usize) -> Option<&Symbol> {
        self.symbols.get(index)
    }

    fn remove(&mut self, name: &str) -> bool {
        match self.index_of(name) {
            Some(i) => {
                self.symbols.remove(i);
                debug!(name, "evicted symbol");
                true
            }
            None => false,
        }
    }

    fn insert(&mut self, symbol: Symbol) -> usize {
        self.symbols.push(symbol);
        self.symbols.len() - 1
    }

    fn len(&self) -> usize {
        self.symbols.len()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn dummy(name: &str) -> Symbol {
        Symbol::svg(name, "<svg/>".to_string(), 10.0, 5.0)
    }

    #[test]
    fn test_insert_and_lookup() {
        let mut set = SymbolSet::new();
        assert!(set.is_empty());
        let a = set.insert(dummy("a"));
        let b = set.insert(dummy("b"));
        assert_eq!((a, b), (0, 1));
        assert_eq!(set.index_of("b"), Some(1));
        assert_eq!(set.get(1).map(|s| s.name.as_str()), Some("b"));
        assert_eq!(set.index_of("c"), None);
    }

    #[test]
    fn test_remove_shifts_indices() {
        let mut set = SymbolSet::new();
        set.insert(dummy("a"));
        set.insert(dummy("b"));
        assert!(set.remove("a"));
        assert!(!set.remove("a"));
        assert_eq!(set.len(), 1);
        assert_eq!(set.index_of("b"), Some(0));
    }

    #[test]
    fn test_pixmap_size_follows_image() {
        let img = ImageBuffer::new(7, 3).unwrap();
        let sym = Symbol::pixmap("p", img);
        assert_eq!((sym.size_x, sym.size_y), (7.0, 3.0));
        assert_eq!(sym.kind.name(), "pixmap");
        assert!(!sym.transparent);
    }
}
