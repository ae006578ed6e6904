use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, fmt};
use thiserror::Error;

/// Error type for unit conversions
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum UnitError {
    #[error("Unknown unit '{0}'")]
    Unknown(String),
    #[error("Cannot convert from '{from}' to '{to}'")]
    Incompatible { from: String, to: String },
}

/// A unit of measurement, as written in queries and drug model files (e.g. `kg`, `mg/l`)
///
/// Units are compared case-insensitively when converting. The empty unit and `-` both
/// denote a dimensionless value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Unit(String);

impl Unit {
    pub fn new(unit: impl Into<String>) -> Self {
        Self(unit.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_dimensionless(&self) -> bool {
        let unit = self.0.trim();
        unit.is_empty() || unit == "-"
    }

    /// Convert `value` expressed in this unit into `target`
    pub fn convert(&self, value: f64, target: &Unit) -> Result<f64, UnitError> {
        convert(value, self, target)
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Unit {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for Unit {
    fn from(s: String) -> Self {
        Self(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Dimension {
    Dimensionless,
    Mass,
    Length,
    Time,
    Volume,
    Flow,
    MassConcentration,
    MolarConcentration,
}

/// Multiplicative factor to the base unit of a dimension
#[derive(Debug, Clone, Copy)]
struct Scale {
    dimension: Dimension,
    factor: f64,
}

impl Scale {
    const fn new(dimension: Dimension, factor: f64) -> Self {
        Scale { dimension, factor }
    }
}

lazy_static! {
    static ref UNITS: HashMap<&'static str, Scale> = {
        use Dimension::*;
        HashMap::from([
            // dimensionless (base: -)
            ("-", Scale::new(Dimensionless, 1.0)),
            ("", Scale::new(Dimensionless, 1.0)),
            ("%", Scale::new(Dimensionless, 0.01)),
            // mass (base: g)
            ("kg", Scale::new(Mass, 1e3)),
            ("g", Scale::new(Mass, 1.0)),
            ("mg", Scale::new(Mass, 1e-3)),
            ("ug", Scale::new(Mass, 1e-6)),
            ("ng", Scale::new(Mass, 1e-9)),
            ("lb", Scale::new(Mass, 453.592_37)),
            ("oz", Scale::new(Mass, 28.349_523_125)),
            // length (base: m)
            ("m", Scale::new(Length, 1.0)),
            ("cm", Scale::new(Length, 1e-2)),
            ("mm", Scale::new(Length, 1e-3)),
            ("in", Scale::new(Length, 0.0254)),
            ("ft", Scale::new(Length, 0.3048)),
            // time (base: s)
            ("s", Scale::new(Time, 1.0)),
            ("min", Scale::new(Time, 60.0)),
            ("h", Scale::new(Time, 3600.0)),
            ("d", Scale::new(Time, 86_400.0)),
            ("w", Scale::new(Time, 604_800.0)),
            ("y", Scale::new(Time, 31_557_600.0)),
            // volume (base: l)
            ("l", Scale::new(Volume, 1.0)),
            ("dl", Scale::new(Volume, 1e-1)),
            ("ml", Scale::new(Volume, 1e-3)),
            ("ul", Scale::new(Volume, 1e-6)),
            // flow (base: l/h)
            ("l/h", Scale::new(Flow, 1.0)),
            ("ml/h", Scale::new(Flow, 1e-3)),
            ("l/min", Scale::new(Flow, 60.0)),
            ("ml/min", Scale::new(Flow, 0.06)),
            // mass concentration (base: g/l)
            ("g/l", Scale::new(MassConcentration, 1.0)),
            ("mg/l", Scale::new(MassConcentration, 1e-3)),
            ("ug/l", Scale::new(MassConcentration, 1e-6)),
            ("ng/ml", Scale::new(MassConcentration, 1e-6)),
            ("ug/ml", Scale::new(MassConcentration, 1e-3)),
            ("mg/dl", Scale::new(MassConcentration, 1e-2)),
            // molar concentration (base: mol/l)
            ("mol/l", Scale::new(MolarConcentration, 1.0)),
            ("mmol/l", Scale::new(MolarConcentration, 1e-3)),
            ("umol/l", Scale::new(MolarConcentration, 1e-6)),
        ])
    };
}

fn lookup(unit: &Unit) -> Result<Scale, UnitError> {
    let key = unit.as_str().trim().to_lowercase();
    UNITS
        .get(key.as_str())
        .copied()
        .ok_or_else(|| UnitError::Unknown(unit.as_str().to_string()))
}

/// Convert a value between two units of the same physical dimension
///
/// Identical unit strings always convert, even when the unit is not known to the table.
pub fn convert(value: f64, from: &Unit, to: &Unit) -> Result<f64, UnitError> {
    if from.as_str().trim() == to.as_str().trim()
        || (from.is_dimensionless() && to.is_dimensionless())
    {
        return Ok(value);
    }

    let source = lookup(from)?;
    let target = lookup(to)?;

    if source.dimension != target.dimension {
        return Err(UnitError::Incompatible {
            from: from.to_string(),
            to: to.to_string(),
        });
    }

    Ok(value * source.factor / target.factor)
}
