//! Selection of the drug model best supported by a patient's covariates
//!
//! A drug is usually described by several published population models. Given a patient's
//! administration history and covariate observations, [`ModelSelector`] picks the model whose
//! covariate definitions, domain constraints and supported formulations fit the patient best,
//! and reports the covariate values that model would use.

pub mod data;
pub mod error;
pub mod model;
pub mod selector;

//extension traits
pub use crate::data::builder::TreatmentBuilderExt;
pub use crate::data::*;
pub use crate::model::{
    DrugModel, DrugModelLookup, DrugModelRepository, Language, LocalizedText, PredicateEvaluator,
    PredicateTable,
};
pub use crate::selector::{ModelSelector, RequestResult, SelectionOutcome, SelectorOptions};
pub use error::{ExtractionError, SelectionError};

pub mod prelude {
    pub mod data {
        pub use crate::data::{
            AbsorptionModel, AdministrationRoute, CovariateValue, DataType, DosageHistory,
            DosageTimeRange, Formulation, FormulationAndRoute, PatientCovariate, RequestContext,
            Treatment, Unit,
        };
    }
    pub mod model {
        pub use crate::model::{
            ConstraintKind, CovariateDefinition, CovariateType, DomainConstraint, DrugModel,
            DrugModelLookup, DrugModelRepository, EvaluationError, Language, LocalizedText,
            OperationInputs, Predicate, PredicateEvaluator, PredicateTable,
        };
    }

    //extension traits
    pub use crate::data::builder::TreatmentBuilderExt;
    pub use crate::data::*;
    pub use crate::model::{
        DrugModel, DrugModelRepository, EvaluationError, Language, OperationInputs,
        PredicateTable,
    };
    pub use crate::selector::{
        CovariateSource, CovariateValidationResult, ModelSelector, RequestResult,
        SelectionOutcome, SelectorOptions,
    };
    pub use crate::{ExtractionError, SelectionError};
}
