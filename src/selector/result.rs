use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::data::covariate::PatientCovariate;
use crate::data::request::RequestContext;
use crate::data::unit::Unit;
use crate::data::value::{CovariateValue, DataType};
use crate::error::SelectionError;
use crate::model::{DrugModel, Language};
use crate::selector::extract::ExtractedCovariate;

/// Where the value of a reported covariate came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CovariateSource {
    /// Observed for the patient
    Patient,
    /// Standard value of the model
    Model,
}

impl fmt::Display for CovariateSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Patient => write!(f, "patient"),
            Self::Model => write!(f, "default"),
        }
    }
}

/// One line of the covariate report of the selected model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CovariateValidationResult {
    definition_id: String,
    name: String,
    description: String,
    value: CovariateValue,
    unit: Unit,
    data_type: DataType,
    source: CovariateSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    observation: Option<PatientCovariate>,
    #[serde(default)]
    warnings: Vec<String>,
}

impl CovariateValidationResult {
    pub fn definition_id(&self) -> &str {
        &self.definition_id
    }

    /// Display name in the requested language
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Value in the unit and data type of the definition
    pub fn value(&self) -> CovariateValue {
        self.value
    }

    pub fn unit(&self) -> &Unit {
        &self.unit
    }

    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    pub fn source(&self) -> CovariateSource {
        self.source
    }

    /// The patient observation the value was read from
    pub fn observation(&self) -> Option<&PatientCovariate> {
        self.observation.as_ref()
    }

    pub fn observation_time(&self) -> Option<NaiveDateTime> {
        self.observation.as_ref().map(|o| o.event_time())
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// Terminal result of the selection for one request
#[derive(Debug, Clone, PartialEq)]
pub enum SelectionOutcome {
    Selected {
        model: Arc<DrugModel>,
        covariate_results: Vec<CovariateValidationResult>,
    },
    Stopped(SelectionError),
}

impl SelectionOutcome {
    pub fn is_selected(&self) -> bool {
        matches!(self, Self::Selected { .. })
    }

    pub fn model(&self) -> Option<&Arc<DrugModel>> {
        match self {
            Self::Selected { model, .. } => Some(model),
            Self::Stopped(_) => None,
        }
    }

    pub fn error(&self) -> Option<&SelectionError> {
        match self {
            Self::Selected { .. } => None,
            Self::Stopped(error) => Some(error),
        }
    }
}

/// A request together with the outcome of its model selection
///
/// Until an outcome is applied, processing may continue and no model is set.
#[derive(Debug, Clone)]
pub struct RequestResult {
    request: RequestContext,
    continue_processing: bool,
    error_message: String,
    drug_model: Option<Arc<DrugModel>>,
    covariate_results: Vec<CovariateValidationResult>,
}

impl RequestResult {
    pub fn new(request: RequestContext) -> Self {
        RequestResult {
            request,
            continue_processing: true,
            error_message: String::new(),
            drug_model: None,
            covariate_results: Vec::new(),
        }
    }

    pub fn request(&self) -> &RequestContext {
        &self.request
    }

    pub fn continue_processing(&self) -> bool {
        self.continue_processing
    }

    /// Reason processing stopped, empty while it may continue
    pub fn error_message(&self) -> &str {
        &self.error_message
    }

    pub fn drug_model(&self) -> Option<&Arc<DrugModel>> {
        self.drug_model.as_ref()
    }

    pub fn covariate_results(&self) -> &[CovariateValidationResult] {
        &self.covariate_results
    }

    /// Record the outcome of the selection
    pub fn apply(&mut self, outcome: SelectionOutcome) {
        match outcome {
            SelectionOutcome::Selected {
                model,
                covariate_results,
            } => {
                self.continue_processing = true;
                self.error_message.clear();
                self.drug_model = Some(model);
                self.covariate_results = covariate_results;
            }
            SelectionOutcome::Stopped(error) => {
                self.continue_processing = false;
                self.error_message = error.to_string();
                self.drug_model = None;
                self.covariate_results.clear();
            }
        }
    }
}

/// Build the report of the selected model, ordered by display name then observation time
pub(crate) fn assemble(
    extracted: &[ExtractedCovariate],
    lang: Language,
    fallback: Language,
) -> Vec<CovariateValidationResult> {
    let mut results: Vec<CovariateValidationResult> = extracted
        .iter()
        .map(|entry| {
            let definition = entry.definition;
            CovariateValidationResult {
                definition_id: definition.id.clone(),
                name: definition
                    .name
                    .resolve_or(lang, fallback)
                    .unwrap_or(definition.id.as_str())
                    .to_string(),
                description: definition
                    .description
                    .resolve_or(lang, fallback)
                    .unwrap_or_default()
                    .to_string(),
                value: entry.value,
                unit: definition.unit.clone(),
                data_type: definition.data_type,
                source: entry.source(),
                observation: entry.observation.cloned(),
                warnings: entry
                    .warnings
                    .iter()
                    .filter_map(|text| text.resolve_or(lang, fallback))
                    .map(str::to_string)
                    .collect(),
            }
        })
        .collect();

    // Stable: entries without an observation keep their relative order
    results.sort_by(|a, b| {
        a.name
            .cmp(&b.name)
            .then_with(|| a.observation_time().cmp(&b.observation_time()))
    });
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::value::parse_date;
    use crate::selector::extract::extract_covariates;
    use crate::selector::options::SelectorOptions;

    const MODEL: &str = r#"{
        "id": "m1",
        "drugId": "imatinib",
        "covariates": [
            {
                "id": "bodyweight",
                "name": { "en": "Weight", "fr": "Poids" },
                "description": { "en": "Total body weight" },
                "unit": "kg",
                "dataType": "double",
                "value": 70
            },
            {
                "id": "gist",
                "name": { "en": "GIST", "fr": "GIST" },
                "description": { "en": "Gastrointestinal stromal tumour" },
                "unit": "-",
                "dataType": "bool",
                "value": false
            },
            {
                "id": "age",
                "name": { "en": "Age", "fr": "Âge" },
                "description": { "en": "Age in years" },
                "unit": "y",
                "dataType": "double",
                "type": "ageInYears",
                "value": 50
            }
        ]
    }"#;

    #[test]
    fn test_sorted_by_localized_name_then_time() {
        let model = DrugModel::from_str(MODEL).unwrap();
        let covariates = vec![
            PatientCovariate::new(
                "bodyweight",
                parse_date("2022-03-01").unwrap(),
                "75",
                "kg",
                DataType::Double,
            ),
            PatientCovariate::new(
                "bodyweight",
                parse_date("2022-01-01").unwrap(),
                "72",
                "kg",
                DataType::Double,
            ),
        ];
        let extracted = extract_covariates(
            &model,
            &covariates,
            parse_date("2022-06-01").unwrap(),
            &SelectorOptions::default(),
        )
        .unwrap();

        let english = assemble(&extracted, Language::English, Language::English);
        let names: Vec<&str> = english.iter().map(|r| r.name()).collect();
        assert_eq!(names, vec!["Age", "GIST", "Weight", "Weight"]);
        assert!(english[2].observation_time() < english[3].observation_time());
        assert_eq!(english[0].source(), CovariateSource::Model);
        assert_eq!(english[2].source(), CovariateSource::Patient);

        let french = assemble(&extracted, Language::French, Language::English);
        let names: Vec<&str> = french.iter().map(|r| r.name()).collect();
        assert_eq!(names, vec!["GIST", "Poids", "Poids", "Âge"]);
        assert_eq!(french[1].description(), "Total body weight");
    }

    #[test]
    fn test_apply_outcome() {
        let request = RequestContext::new(
            "imatinib",
            Language::English,
            parse_date("2022-06-01").unwrap(),
            None,
        );
        let mut result = RequestResult::new(request);
        assert!(result.continue_processing());

        result.apply(SelectionOutcome::Stopped(SelectionError::NoTreatment));
        assert!(!result.continue_processing());
        assert_eq!(result.error_message(), "No treatment set.");
        assert!(result.drug_model().is_none());

        let model = Arc::new(DrugModel::from_str(MODEL).unwrap());
        result.apply(SelectionOutcome::Selected {
            model: model.clone(),
            covariate_results: Vec::new(),
        });
        assert!(result.continue_processing());
        assert_eq!(result.error_message(), "");
        assert_eq!(result.drug_model().unwrap().id, "m1");
    }

    #[test]
    fn test_source_display() {
        assert_eq!(CovariateSource::Patient.to_string(), "patient");
        assert_eq!(CovariateSource::Model.to_string(), "default");
    }
}
