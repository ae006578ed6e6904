use chrono::NaiveDateTime;

use crate::data::*;

pub trait TreatmentBuilderExt {
    fn builder() -> TreatmentBuilder;
}

impl TreatmentBuilderExt for Treatment {
    fn builder() -> TreatmentBuilder {
        TreatmentBuilder {
            dosage_history: DosageHistory::default(),
            covariates: Vec::new(),
        }
    }
}

/// Incremental construction of a [`Treatment`]
pub struct TreatmentBuilder {
    dosage_history: DosageHistory,
    covariates: Vec<PatientCovariate>,
}

impl TreatmentBuilder {
    pub fn dosage(mut self, range: DosageTimeRange) -> Self {
        self.dosage_history.push(range);
        self
    }

    /// Add an open-ended dosage period starting at `start`
    pub fn administration(
        self,
        start: NaiveDateTime,
        formulation_and_route: FormulationAndRoute,
        dose: f64,
        dose_unit: &str,
    ) -> Self {
        let range = DosageTimeRange::new(start, None, formulation_and_route, dose, dose_unit);
        self.dosage(range)
    }

    pub fn observation(mut self, covariate: PatientCovariate) -> Self {
        self.covariates.push(covariate);
        self
    }

    pub fn covariate(
        self,
        id: &str,
        time: NaiveDateTime,
        value: &str,
        unit: &str,
        data_type: DataType,
    ) -> Self {
        let covariate = PatientCovariate::new(id, time, value, unit, data_type);
        self.observation(covariate)
    }

    pub fn build(self) -> Treatment {
        Treatment::new(self.dosage_history, self.covariates)
    }
}
