use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::data::covariate::PatientCovariate;
use crate::data::dosage::DosageHistory;
use crate::model::localized::Language;

/// Administration history and covariate observations of a patient
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Treatment {
    #[serde(default)]
    dosage_history: DosageHistory,
    #[serde(default)]
    covariates: Vec<PatientCovariate>,
}

impl Treatment {
    pub fn new(dosage_history: DosageHistory, covariates: Vec<PatientCovariate>) -> Self {
        Treatment {
            dosage_history,
            covariates,
        }
    }

    pub fn dosage_history(&self) -> &DosageHistory {
        &self.dosage_history
    }

    pub fn covariates(&self) -> &[PatientCovariate] {
        &self.covariates
    }
}

/// Everything the selection procedure needs to know about one incoming request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestContext {
    drug_id: String,
    #[serde(default)]
    language: Language,
    computation_time: NaiveDateTime,
    #[serde(skip_serializing_if = "Option::is_none")]
    treatment: Option<Treatment>,
}

impl RequestContext {
    /// Create a request context
    ///
    /// # Arguments
    ///
    /// * `drug_id` - Identifier of the drug whose models are candidates
    /// * `language` - Language the covariate report is rendered in
    /// * `computation_time` - Reference time, used to compute ages
    /// * `treatment` - The patient's treatment, if the query provided one
    pub fn new(
        drug_id: impl Into<String>,
        language: Language,
        computation_time: NaiveDateTime,
        treatment: Option<Treatment>,
    ) -> Self {
        RequestContext {
            drug_id: drug_id.into(),
            language,
            computation_time,
            treatment,
        }
    }

    pub fn drug_id(&self) -> &str {
        &self.drug_id
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn computation_time(&self) -> NaiveDateTime {
        self.computation_time
    }

    pub fn treatment(&self) -> Option<&Treatment> {
        self.treatment.as_ref()
    }
}
