use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Error type for reading and coercing covariate values
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ValueError {
    #[error("'{value}' is not a valid {data_type} value")]
    Parse { value: String, data_type: DataType },
    #[error("A {from} value cannot be used where a {to} is expected")]
    Incompatible { from: DataType, to: DataType },
}

/// Declared type of a covariate value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    Int,
    Double,
    Bool,
    Date,
}

impl DataType {
    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Int | Self::Double)
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int => write!(f, "int"),
            Self::Double => write!(f, "double"),
            Self::Bool => write!(f, "bool"),
            Self::Date => write!(f, "date"),
        }
    }
}

/// A typed covariate value
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CovariateValue {
    Number(f64),
    Bool(bool),
    Date(NaiveDateTime),
}

impl CovariateValue {
    /// Parse a raw textual value according to its declared data type
    pub fn parse(raw: &str, data_type: DataType) -> Result<Self, ValueError> {
        let raw = raw.trim();
        let parse_error = || ValueError::Parse {
            value: raw.to_string(),
            data_type,
        };

        match data_type {
            DataType::Int | DataType::Double => raw
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .map(CovariateValue::Number)
                .ok_or_else(parse_error),
            DataType::Bool => match raw.to_lowercase().as_str() {
                "true" | "1" => Ok(CovariateValue::Bool(true)),
                "false" | "0" => Ok(CovariateValue::Bool(false)),
                _ => Err(parse_error()),
            },
            DataType::Date => parse_date(raw)
                .map(CovariateValue::Date)
                .ok_or_else(parse_error),
        }
    }

    /// The data type this value naturally carries
    pub fn data_type(&self) -> DataType {
        match self {
            Self::Number(_) => DataType::Double,
            Self::Bool(_) => DataType::Bool,
            Self::Date(_) => DataType::Date,
        }
    }

    /// Coerce this value to `target`
    ///
    /// Numbers and booleans convert into each other (non-zero is `true`); dates only
    /// convert to dates.
    pub fn coerce(self, target: DataType) -> Result<Self, ValueError> {
        match (self, target) {
            (Self::Number(v), DataType::Int) => Ok(Self::Number(v.round())),
            (Self::Number(_), DataType::Double) => Ok(self),
            (Self::Number(v), DataType::Bool) => Ok(Self::Bool(v != 0.0)),
            (Self::Bool(b), DataType::Int | DataType::Double) => {
                Ok(Self::Number(if b { 1.0 } else { 0.0 }))
            }
            (Self::Bool(_), DataType::Bool) => Ok(self),
            (Self::Date(_), DataType::Date) => Ok(self),
            (value, target) => Err(ValueError::Incompatible {
                from: value.data_type(),
                to: target,
            }),
        }
    }

    /// Numeric view of the value, booleans as 0/1
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(v) => Some(*v),
            Self::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            Self::Date(_) => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDateTime> {
        match self {
            Self::Date(d) => Some(*d),
            _ => None,
        }
    }
}

impl fmt::Display for CovariateValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(v) => write!(f, "{}", v),
            Self::Bool(b) => write!(f, "{}", if *b { 1 } else { 0 }),
            Self::Date(d) => write!(f, "{}", d.format("%Y-%m-%dT%H:%M:%S")),
        }
    }
}

const DATE_TIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S"];

/// Parse a date or date-time as found in queries; plain dates are taken at midnight
pub fn parse_date(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    DATE_TIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}
