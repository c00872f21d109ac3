//! Snapping raw scalebar intervals to human-friendly values.
//!
//! Two interchangeable strategies:
//!
//! - [`round_interval_table`]: rounds to a granularity picked from a fixed
//!   ladder of magnitudes. Produces values like 30, 700 or 0.04.
//! - [`round_interval_log`]: snaps the leading digit to 1, 2, 5 or 10.
//!   Produces the classic 1-2-5 sequence.

use serde::{Deserialize, Serialize};

use crate::scale::UNDEFINED;

/// Upper bound of the table ladder; anything at or above it has no
/// reasonable round value.
const TABLE_LIMIT: f64 = 1e8;

// (upper bound, granularity); inputs below `upper bound` round to the
// nearest multiple of `granularity`.
const LADDER: [(f64, f64); 11] = [
    (0.001, 0.0001),
    (0.01, 0.001),
    (0.1, 0.01),
    (1.0, 0.1),
    (100.0, 1.0),
    (1e3, 10.0),
    (1e4, 100.0),
    (1e5, 1e3),
    (1e6, 1e4),
    (1e7, 1e5),
    (TABLE_LIMIT, 1e6),
];

/// Round `d` to the granularity of its magnitude bracket.
///
/// Returns [`UNDEFINED`] for `d >= 1e8`.
pub fn round_interval_table(d: f64) -> f64 {
    for &(limit, step) in LADDER.iter() {
        if d < limit {
            // Divide by the reciprocal for sub-unit steps so 0.3 stays 0.3
            // instead of 0.30000000000000004.
            return if step < 1.0 {
                let inv = (1.0 / step).round();
                (d * inv).round() / inv
            } else {
                (d / step).round() * step
            };
        }
    }
    UNDEFINED
}

/// Snap `d` to `{1, 2, 5, 10} x 10^floor(log10(d))`.
///
/// Only defined for positive finite input.
pub fn round_interval_log(d: f64) -> f64 {
    let magnitude = d.log10().floor() as i32;
    let ratio = scale_pow10(d, -magnitude);
    if ratio < 1.5 {
        scale_pow10(1.0, magnitude)
    } else if ratio < 4.0 {
        scale_pow10(2.0, magnitude)
    } else if ratio < 8.0 {
        scale_pow10(5.0, magnitude)
    } else {
        scale_pow10(1.0, magnitude + 1)
    }
}

/// `v * 10^exp`, dividing by the exact power for negative exponents so that
/// results like 0.002 land on the nearest double.
fn scale_pow10(v: f64, exp: i32) -> f64 {
    if exp >= 0 {
        v * 10f64.powi(exp)
    } else {
        v / 10f64.powi(-exp)
    }
}

/// Rounding strategy used by the scalebar layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntervalRounding {
    /// Magnitude ladder ([`round_interval_table`]).
    Table,
    /// 1-2-5 snapping ([`round_interval_log`]).
    #[default]
    LogRatio,
}

impl IntervalRounding {
    pub fn round(self, d: f64) -> f64 {
        match self {
            IntervalRounding::Table => round_interval_table(d),
            IntervalRounding::LogRatio => round_interval_log(d),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
