//! Map units and their conversion to inches.
//!
//! The conversion table is indexed by the [`Units`] discriminant. A
//! compile-time check guarantees the table has one entry per variant, in
//! declaration order, so a lookup can never land on the wrong unit.

use serde::{Deserialize, Serialize};

use crate::error::ScaleError;

// ============================================================================
// Units
// ============================================================================

/// Units a map or a scalebar can be expressed in.
///
/// `Pixels` and `Percentages` are placeholders: they have no physical size,
/// so they convert at a neutral factor of 1 and produce an undefined scale.
///
/// Deserializes through [`FromStr`](std::str::FromStr), so configuration
/// files accept the same case-insensitive names and abbreviations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Units {
    Inches = 0,
    Feet = 1,
    Miles = 2,
    Meters = 3,
    Kilometers = 4,
    DecimalDegrees = 5,
    Pixels = 6,
    Percentages = 7,
    NauticalMiles = 8,
}

struct UnitInfo {
    units: Units,
    label: &'static str,
    inches: f64,
}

const UNIT_TABLE: [UnitInfo; 9] = [
    UnitInfo {
        units: Units::Inches,
        label: "in",
        inches: 1.0,
    },
    UnitInfo {
        units: Units::Feet,
        label: "ft",
        inches: 12.0,
    },
    UnitInfo {
        units: Units::Miles,
        label: "mi",
        inches: 63360.0,
    },
    UnitInfo {
        units: Units::Meters,
        label: "m",
        inches: 39.3701,
    },
    UnitInfo {
        units: Units::Kilometers,
        label: "km",
        inches: 39370.1,
    },
    UnitInfo {
        units: Units::DecimalDegrees,
        label: "dd",
        inches: 4374754.0,
    },
    UnitInfo {
        units: Units::Pixels,
        label: "??",
        inches: 1.0,
    },
    UnitInfo {
        units: Units::Percentages,
        label: "??",
        inches: 1.0,
    },
    UnitInfo {
        units: Units::NauticalMiles,
        label: "NM",
        inches: 72913.3858,
    },
];

const _: () = {
    let mut i = 0;
    while i < UNIT_TABLE.len() {
        assert!(UNIT_TABLE[i].units as usize == i);
        i += 1;
    }
    assert!(UNIT_TABLE.len() == Units::ALL.len());
};

/// Whether angular units are corrected for the latitude of the view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LatitudeAdjustment {
    /// One degree is always the same length.
    #[default]
    None,
    /// Treat the earth as a perfect sphere and shorten degrees away from the
    /// equator by `sqrt(1 + cos²(lat)) / sqrt(2)`.
    Spherical,
}

impl LatitudeAdjustment {
    /// Multiplier applied to inches-per-degree at `center_lat` (degrees).
    pub fn factor(self, center_lat: f64) -> f64 {
        match self {
            LatitudeAdjustment::None => 1.0,
            LatitudeAdjustment::Spherical => {
                if center_lat == 0.0 {
                    return 1.0;
                }
                let cos_lat = (std::f64::consts::PI * center_lat / 180.0).cos();
                (1.0 + cos_lat * cos_lat).sqrt() / 2f64.sqrt()
            }
        }
    }
}

impl Units {
    pub const ALL: [Units; 9] = [
        Units::Inches,
        Units::Feet,
        Units::Miles,
        Units::Meters,
        Units::Kilometers,
        Units::DecimalDegrees,
        Units::Pixels,
        Units::Percentages,
        Units::NauticalMiles,
    ];

    fn info(self) -> &'static UnitInfo {
        &UNIT_TABLE[self as usize]
    }

    /// Suffix used on scalebar labels ("m", "km", "NM", ...).
    pub fn label(self) -> &'static str {
        self.info().label
    }

    /// Raw table factor, without any latitude correction.
    pub fn inches(self) -> f64 {
        self.info().inches
    }

    /// Linear ground units (everything but degrees and the placeholders).
    pub fn is_linear(self) -> bool {
        !matches!(
            self,
            Units::DecimalDegrees | Units::Pixels | Units::Percentages
        )
    }

    /// Units with a real-world size, i.e. everything except the placeholders.
    pub fn supports_scale(self) -> bool {
        !matches!(self, Units::Pixels | Units::Percentages)
    }

    /// Inches represented by one unit at the given center latitude.
    ///
    /// Only decimal degrees are latitude dependent; placeholder units return
    /// a neutral 1.0.
    pub fn inches_per_unit(self, center_lat: f64, adjustment: LatitudeAdjustment) -> f64 {
        match self {
            Units::DecimalDegrees => self.inches() * adjustment.factor(center_lat),
            Units::Pixels | Units::Percentages => 1.0,
            _ => self.inches(),
        }
    }

    /// Ratio used to express a distance in `self` as a distance in `to`.
    pub fn ratio_to(self, to: Units) -> f64 {
        self.inches_per_unit(0.0, LatitudeAdjustment::None)
            / to.inches_per_unit(0.0, LatitudeAdjustment::None)
    }
}

impl std::fmt::Display for Units {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl std::str::FromStr for Units {
    type Err = ScaleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let units = match s.to_ascii_lowercase().as_str() {
            "in" | "inches" => Units::Inches,
            "ft" | "feet" => Units::Feet,
            "mi" | "miles" => Units::Miles,
            "m" | "meters" => Units::Meters,
            "km" | "kilometers" => Units::Kilometers,
            "dd" | "decimal_degrees" => Units::DecimalDegrees,
            "pixels" => Units::Pixels,
            "percentages" => Units::Percentages,
            "nm" | "nautical_miles" | "nauticalmiles" => Units::NauticalMiles,
            _ => return Err(ScaleError::InvalidConfig(format!("unknown units '{}'", s))),
        };
        Ok(units)
    }
}

impl<'de> Deserialize<'de> for Units {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        name.parse().map_err(serde::de::Error::custom)
    }
}

// ============================================================================
// Tests
// ============================================================================
