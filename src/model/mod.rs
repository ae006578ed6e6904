//! Candidate drug models
//!
//! A drug can be described by several competing models, each with its own covariate
//! definitions, domain constraints and supported formulations. Models are parsed from JSON:
//!
//! ```ignore
//! use pharmsel::model::DrugModel;
//!
//! let model = DrugModel::from_str(r#"{
//!     "id": "ch.tucuxi.imatinib.gotta2012",
//!     "drugId": "imatinib",
//!     "formulationAndRoutes": [
//!         { "formulation": "oralSolution", "route": "oral", "absorption": "extravascular" }
//!     ],
//!     "covariates": [{
//!         "id": "bodyweight",
//!         "name": { "en": "Total Body Weight", "fr": "Poids total" },
//!         "description": { "en": "Total body weight of patient, in kilogramms" },
//!         "unit": "kg",
//!         "dataType": "double",
//!         "value": 70.0,
//!         "validation": { "formula": "bodyweight < 300", "inputs": [{ "name": "bodyweight" }] },
//!         "validationErrorMessage": { "en": "Body weight too big" }
//!     }],
//!     "constraints": [{
//!         "kind": "soft",
//!         "predicate": { "formula": "bodyweight in [44, 110]", "inputs": [{ "name": "bodyweight" }] },
//!         "errorMessage": { "en": "The body weight should be in [44,110]" }
//!     }]
//! }"#)?;
//! ```

mod errors;
pub mod library;
pub mod localized;
pub mod predicate;

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::data::dosage::FormulationAndRoute;
use crate::data::unit::Unit;
use crate::data::value::{CovariateValue, DataType};

pub use errors::ModelError;
pub use library::{DrugModelLookup, DrugModelRepository};
pub use localized::{Language, LocalizedText};
pub use predicate::{
    EvaluationError, Expression, OperationInput, OperationInputs, Predicate, PredicateEvaluator,
    PredicateTable,
};

// ═══════════════════════════════════════════════════════════════════════════════
// Covariate Definitions
// ═══════════════════════════════════════════════════════════════════════════════

/// What a covariate definition represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CovariateType {
    /// Read directly from the patient observation with the same id
    #[default]
    Standard,
    Sex,
    /// Age derived from the patient's birth date
    AgeInYears,
    AgeInMonths,
    AgeInWeeks,
    AgeInDays,
}

impl CovariateType {
    /// The unit an age covariate is counted in, `None` for non-age covariates
    pub fn age_unit(&self) -> Option<AgeUnit> {
        match self {
            Self::AgeInYears => Some(AgeUnit::Years),
            Self::AgeInMonths => Some(AgeUnit::Months),
            Self::AgeInWeeks => Some(AgeUnit::Weeks),
            Self::AgeInDays => Some(AgeUnit::Days),
            Self::Standard | Self::Sex => None,
        }
    }

    pub fn is_age(&self) -> bool {
        self.age_unit().is_some()
    }
}

/// Granularity of an age covariate; ages are always counted in complete units
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgeUnit {
    Years,
    Months,
    Weeks,
    Days,
}

/// How a covariate evolves between two observations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InterpolationMethod {
    /// Linear interpolation
    Linear,
    /// Last observation carried forward
    #[default]
    Locf,
}

/// A covariate as declared by a drug model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CovariateDefinition {
    /// Covariate identifier, unique within the model
    pub id: String,

    /// Display name per language
    pub name: LocalizedText,

    /// Description per language
    #[serde(default)]
    pub description: LocalizedText,

    /// Unit values are expressed in
    #[serde(default)]
    pub unit: Unit,

    pub data_type: DataType,

    #[serde(rename = "type", default)]
    pub covariate_type: CovariateType,

    #[serde(default)]
    pub interpolation: InterpolationMethod,

    /// Population value used when the patient has no observation
    pub value: CovariateValue,

    /// Computed covariates are derived by the model itself and never read from the patient
    #[serde(default)]
    pub computed: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation: Option<Predicate>,

    #[serde(default)]
    pub validation_error_message: LocalizedText,
}

impl CovariateDefinition {
    /// Name of the formula input the validation binds the covariate value to
    ///
    /// This is the first declared input of the validation, or the covariate id.
    pub fn validation_input(&self) -> &str {
        self.validation
            .as_ref()
            .and_then(|p| p.inputs.first())
            .map(|i| i.name.as_str())
            .unwrap_or(&self.id)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Domain Constraints
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConstraintKind {
    /// Failing excludes the model
    Hard,
    /// Failing only produces a warning
    Soft,
}

/// A rule restricting the patient population a model applies to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainConstraint {
    pub kind: ConstraintKind,

    /// The formula; its inputs name the covariates it requires
    pub predicate: Predicate,

    #[serde(default)]
    pub error_message: LocalizedText,
}

impl DomainConstraint {
    pub fn required_covariates(&self) -> impl Iterator<Item = &str> {
        self.predicate.input_names()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Drug Model
// ═══════════════════════════════════════════════════════════════════════════════

/// One candidate model of a drug
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct DrugModel {
    /// Unique model identifier
    pub id: String,

    /// Identifier of the drug this model describes
    pub drug_id: String,

    /// Formulation, route and absorption combinations the model supports
    #[serde(default)]
    pub formulation_and_routes: Vec<FormulationAndRoute>,

    /// Covariate definitions, in declaration order
    #[serde(default)]
    pub covariates: Vec<CovariateDefinition>,

    #[serde(default)]
    pub constraints: Vec<DomainConstraint>,
}

impl DrugModel {
    /// Parse and validate a model from JSON
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(json: &str) -> Result<Self, ModelError> {
        let model: DrugModel = serde_json::from_str(json)?;
        model.validate()?;
        Ok(model)
    }

    /// Check the structural rules the selection relies on
    pub fn validate(&self) -> Result<(), ModelError> {
        let mut seen = HashSet::new();
        for definition in &self.covariates {
            if !seen.insert(definition.id.as_str()) {
                return Err(ModelError::DuplicateCovariate {
                    model_id: self.id.clone(),
                    covariate: definition.id.clone(),
                });
            }

            if definition.covariate_type.is_age() && !definition.data_type.is_numeric() {
                return Err(ModelError::NonNumericAge {
                    model_id: self.id.clone(),
                    covariate: definition.id.clone(),
                });
            }

            if definition.value.coerce(definition.data_type).is_err() {
                return Err(ModelError::InvalidStandardValue {
                    model_id: self.id.clone(),
                    covariate: definition.id.clone(),
                });
            }
        }
        Ok(())
    }

    pub fn covariate(&self, id: &str) -> Option<&CovariateDefinition> {
        self.covariates.iter().find(|c| c.id == id)
    }

    /// Whether the model accepts administrations with `formulation_and_route`
    pub fn supports(&self, formulation_and_route: &FormulationAndRoute) -> bool {
        self.formulation_and_routes.contains(formulation_and_route)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::dosage::{AbsorptionModel, AdministrationRoute, Formulation};

    const MODEL: &str = r#"{
        "id": "ch.tucuxi.imatinib.gotta2012",
        "drugId": "imatinib",
        "formulationAndRoutes": [
            { "formulation": "oralSolution", "route": "oral", "absorption": "extravascular" }
        ],
        "covariates": [
            {
                "id": "bodyweight",
                "name": { "en": "Total Body Weight", "fr": "Poids total" },
                "description": { "en": "Total body weight of patient, in kilogramms" },
                "unit": "kg",
                "dataType": "double",
                "value": 70,
                "validation": { "formula": "bodyweight < 300", "inputs": [{ "name": "bodyweight" }] },
                "validationErrorMessage": { "en": "Body weight too big" }
            },
            {
                "id": "age",
                "name": { "en": "Age" },
                "description": { "en": "Age of the patient, in years" },
                "unit": "y",
                "dataType": "double",
                "type": "ageInYears",
                "value": 50
            }
        ],
        "constraints": [
            {
                "kind": "hard",
                "predicate": { "formula": "age > 18", "inputs": [{ "name": "age" }] },
                "errorMessage": { "en": "The patient must be an adult" }
            }
        ]
    }"#;

    #[test]
    fn test_parse_model() {
        let model = DrugModel::from_str(MODEL).expect("Should parse successfully");
        assert_eq!(model.drug_id, "imatinib");
        assert_eq!(model.covariates.len(), 2);
        assert_eq!(model.constraints[0].kind, ConstraintKind::Hard);
        assert_eq!(
            model.constraints[0].required_covariates().collect::<Vec<_>>(),
            vec!["age"]
        );

        let age = model.covariate("age").unwrap();
        assert_eq!(age.covariate_type, CovariateType::AgeInYears);
        assert_eq!(age.interpolation, InterpolationMethod::Locf);
        assert_eq!(age.validation_input(), "age");
        assert_eq!(age.value, CovariateValue::Number(50.0));
    }

    #[test]
    fn test_supports_formulation() {
        let model = DrugModel::from_str(MODEL).unwrap();
        let oral = FormulationAndRoute::new(
            Formulation::OralSolution,
            AdministrationRoute::Oral,
            AbsorptionModel::Extravascular,
        );
        let infusion = FormulationAndRoute::new(
            Formulation::ParenteralSolution,
            AdministrationRoute::IntravenousDrip,
            AbsorptionModel::Infusion,
        );
        assert!(model.supports(&oral));
        assert!(!model.supports(&infusion));
    }

    #[test]
    fn test_duplicate_covariate_rejected() {
        let mut model = DrugModel::from_str(MODEL).unwrap();
        let duplicate = model.covariates[0].clone();
        model.covariates.push(duplicate);
        assert!(matches!(
            model.validate(),
            Err(ModelError::DuplicateCovariate { .. })
        ));
    }

    #[test]
    fn test_unknown_field_rejected() {
        let result = DrugModel::from_str(r#"{ "id": "m", "drugId": "d", "colour": "blue" }"#);
        assert!(matches!(result, Err(ModelError::ParseError(_))));
    }
}
