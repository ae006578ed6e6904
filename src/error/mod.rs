//! Error types for drug model selection
//!
//! Every reason the selection procedure can stop is a [`SelectionError`] variant whose
//! `Display` output is the exact message handed to downstream consumers. Those strings are
//! part of the public contract and must not be reworded.

use thiserror::Error;

use crate::data::unit::UnitError;
use crate::data::value::ValueError;
use crate::model::predicate::EvaluationError;

/// Reasons a request cannot continue past model selection
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SelectionError {
    #[error("No treatment set.")]
    NoTreatment,

    #[error("The drug files directory does not contain a drug model for the given drug: {drug_id}")]
    NoModelForDrug { drug_id: String },

    #[error("All formulations and routes must be equal.")]
    MixedFormulationsAndRoutes,

    #[error("No valid drug model found.")]
    NoValidModel,

    /// Ambiguous or mistyped patient data that no other model may work around
    #[error("Patient covariate error found when handling model {model_id}, details: {detail}")]
    PatientCovariate {
        model_id: String,
        detail: ExtractionError,
    },

    /// Patient values that could not be brought to the model's units or types
    #[error("Covariates extraction failed for drug model: {model_id}. It may be caused by covariates that could not be converted.")]
    ExtractionFailed {
        model_id: String,
        cause: ExtractionError,
    },

    #[error("Best drug model found but covariate definitions dont't support requested language.")]
    UnsupportedLanguage,
}

/// Irrecoverable problems found while reading patient covariates against a candidate model
///
/// Any of these stops the whole search: the defect lies in the patient data, so a later
/// candidate must not be allowed to hide it.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExtractionError {
    #[error("Multiple {covariate} not allowed.")]
    MultipleValues { covariate: String },

    #[error("Invalid data type of {covariate}.")]
    InvalidDataType { covariate: String },

    #[error("Evaluation failed for covariate {covariate}.")]
    EvaluationFailed { covariate: String },

    #[error("Unit conversion failed for covariate {covariate}: {error}")]
    Unit { covariate: String, error: UnitError },

    #[error("Value conversion failed for covariate {covariate}: {error}")]
    Value { covariate: String, error: ValueError },

    #[error("Constraint '{formula}' could not be evaluated: {error}")]
    Constraint {
        formula: String,
        error: EvaluationError,
    },
}

impl ExtractionError {
    /// Wrap this error into the stop reason reported for the model being examined
    pub fn for_model(self, model_id: &str) -> SelectionError {
        let model_id = model_id.to_string();
        match self {
            Self::MultipleValues { .. }
            | Self::InvalidDataType { .. }
            | Self::EvaluationFailed { .. } => SelectionError::PatientCovariate {
                model_id,
                detail: self,
            },
            Self::Unit { .. } | Self::Value { .. } | Self::Constraint { .. } => {
                SelectionError::ExtractionFailed {
                    model_id,
                    cause: self,
                }
            }
        }
    }
}
