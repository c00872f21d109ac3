//! Label styles, label anchoring and number formatting for scalebar text.

use serde::{Deserialize, Serialize};

use crate::basics::PointD;
use crate::color::Rgba8;

// ============================================================================
// Number formatting
// ============================================================================

/// Format a number the way C's `%g` does: six significant digits, trailing
/// zeros removed, exponent notation below 1e-4 and from 1e6 upwards.
///
/// Scalebar labels are products like `3 * 0.2`; the six-digit precision
/// hides the binary noise (`0.6000000000000001` prints as `0.6`).
pub fn format_number(v: f64) -> String {
    if v == 0.0 {
        return "0".to_string();
    }
    if v.is_nan() {
        return "nan".to_string();
    }
    if v.is_infinite() {
        return if v > 0.0 { "inf" } else { "-inf" }.to_string();
    }

    const PRECISION: i32 = 6;
    let sci = format!("{:.*e}", (PRECISION - 1) as usize, v);
    let (mantissa, exp) = match sci.split_once('e') {
        Some((m, e)) => (m, e.parse::<i32>().unwrap_or(0)),
        None => (sci.as_str(), 0),
    };

    if exp < -4 || exp >= PRECISION {
        let sign = if exp < 0 { '-' } else { '+' };
        format!("{}e{}{:02}", trim_fraction(mantissa), sign, exp.abs())
    } else {
        let decimals = (PRECISION - 1 - exp) as usize;
        trim_fraction(&format!("{:.*}", decimals, v)).to_string()
    }
}

fn trim_fraction(s: &str) -> &str {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.')
    } else {
        s
    }
}

// ============================================================================
// Label style
// ============================================================================

/// Where a label sits relative to its anchor point.
///
/// `CenterRight` puts the label to the right of the point, vertically
/// centered; `UpperLeft` puts it above and to the left, and so on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LabelPosition {
    UpperLeft,
    UpperCenter,
    UpperRight,
    CenterLeft,
    #[default]
    Center,
    CenterRight,
    LowerLeft,
    LowerCenter,
    LowerRight,
}

impl LabelPosition {
    /// Top-left corner of a `width` x `height` label anchored at `point`.
    pub fn origin(self, point: PointD, width: f64, height: f64) -> PointD {
        use LabelPosition::*;
        let x = match self {
            UpperLeft | CenterLeft | LowerLeft => point.x - width,
            UpperCenter | Center | LowerCenter => point.x - width / 2.0,
            UpperRight | CenterRight | LowerRight => point.x,
        };
        let y = match self {
            UpperLeft | UpperCenter | UpperRight => point.y - height,
            CenterLeft | Center | CenterRight => point.y - height / 2.0,
            LowerLeft | LowerCenter | LowerRight => point.y,
        };
        PointD::new(x, y)
    }
}

/// Bitmap font size. Each step maps to an integer magnification of the
/// built-in glyphs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LabelSize {
    Tiny,
    Small,
    #[default]
    Medium,
    Large,
    Giant,
}

impl LabelSize {
    pub fn magnification(self) -> u32 {
        match self {
            LabelSize::Tiny | LabelSize::Small => 1,
            LabelSize::Medium | LabelSize::Large => 2,
            LabelSize::Giant => 3,
        }
    }
}

/// How a label is drawn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelStyle {
    pub size: LabelSize,
    pub color: Rgba8,
    /// One-pixel halo drawn behind the glyphs.
    pub outline_color: Option<Rgba8>,
    pub position: LabelPosition,
}

impl Default for LabelStyle {
    fn default() -> Self {
        Self {
            size: LabelSize::default(),
            color: Rgba8::BLACK,
            outline_color: None,
            position: LabelPosition::Center,
        }
    }
}

impl LabelStyle {
    /// Copy of this style anchored at `position`.
    pub fn at(&self, position: LabelPosition) -> Self {
        Self {
            position,
            ..self.clone()
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
    fn test_format_plain() {
        assert_eq!(format_number(0.0), "0");
        assert_eq!(format_number(1.0), "1");
        assert_eq!(format_number(1500.0), "1500");
        assert_eq!(format_number(1.5), "1.5");
        assert_eq!(format_number(0.5), "0.5");
        assert_eq!(format_number(-2.25), "-2.25");
        assert_eq!(format_number(123456.0), "123456");
        assert_eq!(format_number(0.0001), "0.0001");
    }

    #[test]
    fn test_format_hides_binary_noise() {
        assert_eq!(format_number(3.0 * 0.2), "0.6");
        assert_eq!(format_number(0.1 + 0.2), "0.3");
        assert_eq!(format_number(7.0 * 0.001), "0.007");
    }

    #[test]
    fn test_format_exponent() {
        assert_eq!(format_number(1e6), "1e+06");
        assert_eq!(format_number(2.5e7), "2.5e+07");
        assert_eq!(format_number(0.00001), "1e-05");
        assert_eq!(format_number(1234567.0), "1.23457e+06");
        assert_eq!(format_number(999999.7), "1e+06");
    }

    #[test]
    fn test_label_origin() {
        let p = PointD::new(100.0, 50.0);
        let o = LabelPosition::Center.origin(p, 20.0, 10.0);
        assert_eq!((o.x, o.y), (90.0, 45.0));
        let o = LabelPosition::CenterRight.origin(p, 20.0, 10.0);
        assert_eq!((o.x, o.y), (100.0, 45.0));
        let o = LabelPosition::UpperLeft.origin(p, 20.0, 10.0);
        assert_eq!((o.x, o.y), (80.0, 40.0));
        let o = LabelPosition::LowerRight.origin(p, 20.0, 10.0);
        assert_eq!((o.x, o.y), (100.0, 50.0));
    }

    #[test]
    fn test_label_style_at() {
        let style = LabelStyle::default();
        let right = style.at(LabelPosition::CenterRight);
        assert_eq!(right.position, LabelPosition::CenterRight);
        assert_eq!(right.size, style.size);
    }

    #[test]
    fn test_label_style_from_partial_json() {
        let style: LabelStyle =
            serde_json::from_str(r##"{"size":"giant","outline_color":"#ffffff"}"##).unwrap();
        assert_eq!(style.size.magnification(), 3);
        assert_eq!(style.outline_color, Some(Rgba8::WHITE));
        assert_eq!(style.color, Rgba8::BLACK);
    }
}
