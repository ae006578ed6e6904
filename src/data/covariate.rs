use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::data::unit::Unit;
use crate::data::value::{CovariateValue, DataType, ValueError};

/// How an observed covariate is expected to vary between measurements
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CovariateNature {
    /// Measured quantity that may drift between observations (e.g. body weight)
    #[default]
    Continuous,
    /// Value that only changes in steps (e.g. a genotype or a dialysis flag)
    Discrete,
}

/// A single covariate observation supplied for the patient
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientCovariate {
    id: String,
    event_time: NaiveDateTime,
    value: String,
    #[serde(default)]
    unit: Unit,
    data_type: DataType,
    #[serde(default)]
    nature: CovariateNature,
}

impl PatientCovariate {
    pub fn new(
        id: impl Into<String>,
        event_time: NaiveDateTime,
        value: impl Into<String>,
        unit: impl Into<Unit>,
        data_type: DataType,
    ) -> Self {
        PatientCovariate {
            id: id.into(),
            event_time,
            value: value.into(),
            unit: unit.into(),
            data_type,
            nature: CovariateNature::default(),
        }
    }

    pub fn with_nature(mut self, nature: CovariateNature) -> Self {
        self.nature = nature;
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Time at which the value was measured
    pub fn event_time(&self) -> NaiveDateTime {
        self.event_time
    }

    /// The raw value, as written in the query
    pub fn raw_value(&self) -> &str {
        &self.value
    }

    pub fn unit(&self) -> &Unit {
        &self.unit
    }

    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    pub fn nature(&self) -> CovariateNature {
        self.nature
    }

    /// Parse the raw value according to the declared data type
    pub fn value(&self) -> Result<CovariateValue, ValueError> {
        CovariateValue::parse(&self.value, self.data_type)
    }
}
