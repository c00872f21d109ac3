//! Built-in 5x7 bitmap font used for scalebar labels.
//!
//! Glyphs are stored column-major: five bytes per character, one per
//! column, bit 0 being the top row. Each glyph sits in a 6x8 cell (one
//! column and one row of spacing). Only printable ASCII is covered; other
//! characters advance by one cell and draw nothing.

use crate::basics::{iround, RectD};
use crate::color::{CoverType, COVER_FULL, COVER_NONE};
use crate::text::LabelStyle;

const FIRST_CHAR: u8 = 0x20;
const GLYPH_COLUMNS: usize = 5;
const GLYPH_ROWS: u32 = 7;

/// Horizontal advance of one glyph cell in unscaled pixels.
pub const CELL_WIDTH: u32 = 6;
/// Height of one glyph cell in unscaled pixels.
pub const CELL_HEIGHT: u32 = 8;

#[rustfmt::skip]
const GLYPHS: [[u8; GLYPH_COLUMNS]; 95] = [
    [0x00, 0x00, 0x00, 0x00, 0x00], // ' '
    [0x00, 0x00, 0x5F, 0x00, 0x00], // !
    [0x00, 0x07, 0x00, 0x07, 0x00], // "
    [0x14, 0x7F, 0x14, 0x7F, 0x14], // #
    [0x24, 0x2A, 0x7F, 0x2A, 0x12], // $
    [0x23, 0x13, 0x08, 0x64, 0x62], // %
    [0x36, 0x49, 0x55, 0x22, 0x50], // &
    [0x00, 0x05, 0x03, 0x00, 0x00], // '
    [0x00, 0x1C, 0x22, 0x41, 0x00], // (
    [0x00, 0x41, 0x22, 0x1C, 0x00], // )
    [0x08, 0x2A, 0x1C, 0x2A, 0x08], // *
    [0x08, 0x08, 0x3E, 0x08, 0x08], // +
    [0x00, 0x50, 0x30, 0x00, 0x00], // ,
    [0x08, 0x08, 0x08, 0x08, 0x08], // -
    [0x00, 0x60, 0x60, 0x00, 0x00], // .
    [0x20, 0x10, 0x08, 0x04, 0x02], // /
    [0x3E, 0x51, 0x49, 0x45, 0x3E], // 0
    [0x00, 0x42, 0x7F, 0x40, 0x00], // 1
    [0x42, 0x61, 0x51, 0x49, 0x46], // 2
    [0x21, 0x41, 0x45, 0x4B, 0x31], // 3
    [0x18, 0x14, 0x12, 0x7F, 0x10], // 4
    [0x27, 0x45, 0x45, 0x45, 0x39], // 5
    [0x3C, 0x4A, 0x49, 0x49, 0x30], // 6
    [0x01, 0x71, 0x09, 0x05, 0x03], // 7
    [0x36, 0x49, 0x49, 0x49, 0x36], // 8
    [0x06, 0x49, 0x49, 0x29, 0x1E], // 9
    [0x00, 0x36, 0x36, 0x00, 0x00], // :
    [0x00, 0x56, 0x36, 0x00, 0x00], // ;
    [0x00, 0x08, 0x14, 0x22, 0x41], // <
    [0x14, 0x14, 0x14, 0x14, 0x14], // =
    [0x41, 0x22, 0x14, 0x08, 0x00], // >
    [0x02, 0x01, 0x51, 0x09, 0x06], // ?
    [0x32, 0x49, 0x79, 0x41, 0x3E], // @
    [0x7E, 0x11, 0x11, 0x11, 0x7E], // A
    [0x7F, 0x49, 0x49, 0x49, 0x36], // B
    [0x3E, 0x41, 0x41, 0x41, 0x22], // C
    [0x7F, 0x41, 0x41, 0x22, 0x1C], // D
    [0x7F, 0x49, 0x49, 0x49, 0x41], // E
    [0x7F, 0x09, 0x09, 0x01, 0x01], // F
    [0x3E, 0x41, 0x41, 0x51, 0x32], // G
    [0x7F, 0x08, 0x08, 0x08, 0x7F], // H
    [0x00, 0x41, 0x7F, 0x41, 0x00], // I
    [0x20, 0x40, 0x41, 0x3F, 0x01], // J
    [0x7F, 0x08, 0x14, 0x22, 0x41], // K
    [0x7F, 0x40, 0x40, 0x40, 0x40], // L
    [0x7F, 0x02, 0x04, 0x02, 0x7F], // M
    [0x7F, 0x04, 0x08, 0x10, 0x7F], // N
    [0x3E, 0x41, 0x41, 0x41, 0x3E], // O
    [0x7F, 0x09, 0x09, 0x09, 0x06], // P
    [0x3E, 0x41, 0x51, 0x21, 0x5E], // Q
    [0x7F, 0x09, 0x19, 0x29, 0x46], // R
    [0x46, 0x49, 0x49, 0x49, 0x31], // S
    [0x01, 0x01, 0x7F, 0x01, 0x01], // T
    [0x3F, 0x40, 0x40, 0x40, 0x3F], // U
    [0x1F, 0x20, 0x40, 0x20, 0x1F], // V
    [0x7F, 0x20, 0x18, 0x20, 0x7F], // W
    [0x63, 0x14, 0x08, 0x14, 0x63], // X
    [0x03, 0x04, 0x78, 0x04, 0x03], // Y
    [0x61, 0x51, 0x49, 0x45, 0x43], // Z
    [0x00, 0x00, 0x7F, 0x41, 0x41], // [
    [0x02, 0x04, 0x08, 0x10, 0x20], // '\'
    [0x41, 0x41, 0x7F, 0x00, 0x00], // ]
    [0x04, 0x02, 0x01, 0x02, 0x04], // ^
    [0x40, 0x40, 0x40, 0x40, 0x40], // _
    [0x00, 0x01, 0x02, 0x04, 0x00], // `
    [0x20, 0x54, 0x54, 0x54, 0x78], // a
    [0x7F, 0x48, 0x44, 0x44, 0x38], // b
    [0x38, 0x44, 0x44, 0x44, 0x20], // c
    [0x38, 0x44, 0x44, 0x48, 0x7F], // d
    [0x38, 0x54, 0x54, 0x54, 0x18], // e
    [0x08, 0x7E, 0x09, 0x01, 0x02], // f
    [0x08, 0x14, 0x54, 0x54, 0x3C], // g
    [0x7F, 0x08, 0x04, 0x04, 0x78], // h
    [0x00, 0x44, 0x7D, 0x40, 0x00], // i
    [0x20, 0x40, 0x44, 0x3D, 0x00], // j
    [0x00, 0x7F, 0x10, 0x28, 0x44], // k
    [0x00, 0x41, 0x7F, 0x40, 0x00], // l
    [0x7C, 0x04, 0x18, 0x04, 0x78], // m
    [0x7C, 0x08, 0x04, 0x04, 0x78], // n
    [0x38, 0x44, 0x44, 0x44, 0x38], // o
    [0x7C, 0x14, 0x14, 0x14, 0x08], // p
    [0x08, 0x14, 0x14, 0x18, 0x7C], // q
    [0x7C, 0x08, 0x04, 0x04, 0x08], // r
    [0x48, 0x54, 0x54, 0x54, 0x20], // s
    [0x04, 0x3F, 0x44, 0x40, 0x20], // t
    [0x3C, 0x40, 0x40, 0x20, 0x7C], // u
    [0x1C, 0x20, 0x40, 0x20, 0x1C], // v
    [0x3C, 0x40, 0x30, 0x40, 0x3C], // w
    [0x44, 0x28, 0x10, 0x28, 0x44], // x
    [0x0C, 0x50, 0x50, 0x50, 0x3C], // y
    [0x44, 0x64, 0x54, 0x4C, 0x44], // z
    [0x00, 0x08, 0x36, 0x41, 0x00], // {
    [0x00, 0x00, 0x7F, 0x00, 0x00], // |
    [0x00, 0x41, 0x36, 0x08, 0x00], // }
    [0x08, 0x04, 0x08, 0x10, 0x08], // ~
];

// ============================================================================
// BuiltinFont
// ============================================================================

/// The embedded 5x7 font at an integer magnification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuiltinFont {
    magnification: u32,
}

impl BuiltinFont {
    pub fn new(magnification: u32) -> Self {
        Self {
            magnification: magnification.max(1),
        }
    }

    /// Font for `style` drawn at `scale_factor` (the output resolution
    /// factor). The magnification is rounded, never below 1.
    pub fn for_style(style: &LabelStyle, scale_factor: f64) -> Self {
        let m = iround(style.size.magnification() as f64 * scale_factor);
        Self::new(m.max(1) as u32)
    }

    pub fn magnification(&self) -> u32 {
        self.magnification
    }

    /// Cell height in pixels.
    pub fn height(&self) -> u32 {
        CELL_HEIGHT * self.magnification
    }

    /// Advance of one character in pixels.
    pub fn advance(&self) -> u32 {
        CELL_WIDTH * self.magnification
    }

    /// Width of `text` in pixels.
    pub fn width(&self, text: &str) -> u32 {
        text.chars().count() as u32 * self.advance()
    }

    /// Bounding box of `text` with its top-left corner at the origin.
    pub fn measure(&self, text: &str) -> RectD {
        RectD::new(0.0, 0.0, self.width(text) as f64, self.height() as f64)
    }

    fn columns(ch: char) -> Option<&'static [u8; GLYPH_COLUMNS]> {
        let code = u32::from(ch);
        let first = u32::from(FIRST_CHAR);
        if code < first {
            return None;
        }
        GLYPHS.get((code - first) as usize)
    }

    /// Coverage of pixel row `row` (0 = top of the cell) of `ch`, magnified.
    ///
    /// The returned span is `advance()` pixels long; the spacing column and
    /// the spacing row are always empty.
    pub fn span(&self, ch: char, row: u32) -> Vec<CoverType> {
        let m = self.magnification;
        let mut span = vec![COVER_NONE; self.advance() as usize];
        let glyph_row = row / m;
        if glyph_row >= GLYPH_ROWS {
            return span;
        }
        if let Some(columns) = Self::columns(ch) {
            for (col, bits) in columns.iter().enumerate() {
                if bits & (1 << glyph_row) != 0 {
                    let start = col * m as usize;
                    for cover in &mut span[start..start + m as usize] {
                        *cover = COVER_FULL;
                    }
                }
            }
        }
        span
    }
}

impl Default for BuiltinFont {
    fn default() -> Self {
        Self::new(1)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_covers_printable_ascii() {
        assert_eq!(GLYPHS.len(), (0x7F - FIRST_CHAR) as usize);
        assert!(BuiltinFont::columns('~').is_some());
        assert!(BuiltinFont::columns('\n').is_none());
        assert!(BuiltinFont::columns('é').is_none());
    }

    #[test]
    fn test_metrics_scale_with_magnification() {
        let f1 = BuiltinFont::new(1);
        let f2 = BuiltinFont::new(2);
        assert_eq!(f1.width("0123456789"), 60);
        assert_eq!(f2.width("0123456789"), 120);
        assert_eq!(f1.height(), 8);
        assert_eq!(f2.height(), 16);
        let r = f2.measure("km");
        assert_eq!((r.width(), r.height()), (24.0, 16.0));
        assert_eq!(BuiltinFont::new(0).magnification(), 1);
    }

    #[test]
    fn test_for_style() {
        use crate::text::LabelSize;
        let mut style = LabelStyle::default();
        assert_eq!(BuiltinFont::for_style(&style, 1.0).magnification(), 2);
        assert_eq!(BuiltinFont::for_style(&style, 1.5).magnification(), 3);
        style.size = LabelSize::Tiny;
        assert_eq!(BuiltinFont::for_style(&style, 0.2).magnification(), 1);
    }

    #[test]
    fn test_span_of_digit_one() {
        let f = BuiltinFont::new(1);
        // '1' has a full-height stem in column 2.
        for row in 0..7 {
            assert_eq!(f.span('1', row)[2], COVER_FULL, "row {}", row);
        }
        assert_eq!(f.span('1', 7), vec![COVER_NONE; 6]);
        assert_eq!(f.span('1', 0)[5], COVER_NONE);
    }

    #[test]
    fn test_span_magnified() {
        let f = BuiltinFont::new(2);
        let span = f.span('1', 5);
        assert_eq!(span.len(), 12);
        assert_eq!(span[4], COVER_FULL);
        assert_eq!(span[5], COVER_FULL);
        assert_eq!(span[6], COVER_NONE);
    }

    #[test]
    fn test_space_is_blank() {
        let f = BuiltinFont::new(3);
        for row in 0..f.height() {
            assert!(f.span(' ', row).iter().all(|&c| c == COVER_NONE));
        }
    }
}
