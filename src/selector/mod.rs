//! Covariate-driven drug model selection
//!
//! For one request, [`ModelSelector`] walks the candidate models of the requested drug in
//! repository order and picks the one that fits the patient best:
//!
//! 1. The administration history must use a single formulation, route and absorption.
//! 2. Each candidate supporting that administration gets the patient's covariates extracted
//!    against its definitions, is checked against its domain constraints and scored.
//! 3. The best scored survivor must be displayable in the requested language.
//!
//! A defect in the patient data found while examining any candidate stops the whole search,
//! even if a later candidate would have been a better fit.
//!
//! ```ignore
//! use pharmsel::prelude::*;
//!
//! let selector = ModelSelector::new(repository, evaluator);
//! let mut result = RequestResult::new(request);
//! selector.perform(&mut result);
//!
//! if result.continue_processing() {
//!     println!("Selected {}", result.drug_model().unwrap().id);
//! }
//! ```

mod constraints;
mod extract;
pub mod formulation;
mod localization;
pub mod options;
pub mod result;
mod score;

use chrono::NaiveDateTime;
use rayon::prelude::*;
use std::sync::Arc;
use thiserror::Error;

use crate::data::covariate::PatientCovariate;
use crate::data::dosage::FormulationAndRoute;
use crate::data::request::RequestContext;
use crate::error::SelectionError;
use crate::model::{DrugModel, DrugModelLookup, PredicateEvaluator};

use constraints::apply_constraints;
use extract::{extract_covariates, ExtractedCovariate};
use localization::check_language_support;
use score::score_candidate;

pub use formulation::{check_formulations_and_routes, is_compatible};
pub use options::SelectorOptions;
pub use result::{
    CovariateSource, CovariateValidationResult, RequestResult, SelectionOutcome,
};

/// Why a single candidate was set aside; the search goes on with the next one
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Rejection {
    #[error("The model does not support the administered formulation and route")]
    IncompatibleFormulation,
    #[error("Hard constraint '{formula}' not satisfied")]
    HardConstraint { formula: String },
}

/// A candidate that passed every check, with the covariates it would use
struct ScoredCandidate<'a> {
    model: &'a Arc<DrugModel>,
    score: u32,
    extracted: Vec<ExtractedCovariate<'a>>,
}

impl ScoredCandidate<'_> {
    /// Lower score wins; on equal scores, the model with more covariate definitions
    fn is_better_than(&self, other: &ScoredCandidate) -> bool {
        self.score < other.score
            || (self.score == other.score
                && other.model.covariates.len() < self.model.covariates.len())
    }
}

enum CandidateOutcome<'a> {
    /// Stop the whole search
    Abort(SelectionError),
    Rejected(Rejection),
    Survived(ScoredCandidate<'a>),
}

/// Selects, for each request, the candidate drug model that fits the patient best
#[derive(Debug, Clone)]
pub struct ModelSelector<L, E> {
    lookup: L,
    evaluator: E,
    options: SelectorOptions,
}

impl<L, E> ModelSelector<L, E>
where
    L: DrugModelLookup,
    E: PredicateEvaluator,
{
    pub fn new(lookup: L, evaluator: E) -> Self {
        Self::with_options(lookup, evaluator, SelectorOptions::default())
    }

    pub fn with_options(lookup: L, evaluator: E, options: SelectorOptions) -> Self {
        ModelSelector {
            lookup,
            evaluator,
            options,
        }
    }

    pub fn options(&self) -> &SelectorOptions {
        &self.options
    }

    /// Run the selection for `request`
    pub fn select(&self, request: &RequestContext) -> SelectionOutcome {
        match self.try_select(request) {
            Ok(outcome) => outcome,
            Err(error) => {
                tracing::warn!(
                    "Model selection for drug {} stopped: {}",
                    request.drug_id(),
                    error
                );
                SelectionOutcome::Stopped(error)
            }
        }
    }

    /// Run the selection for the request of `result` and record its outcome there
    pub fn perform(&self, result: &mut RequestResult) {
        let outcome = self.select(result.request());
        result.apply(outcome);
    }

    fn try_select(&self, request: &RequestContext) -> Result<SelectionOutcome, SelectionError> {
        let treatment = request.treatment().ok_or(SelectionError::NoTreatment)?;
        let agreed = check_formulations_and_routes(treatment.dosage_history())?;

        let candidates = self.lookup.models_for_drug(request.drug_id());
        if candidates.is_empty() {
            return Err(SelectionError::NoModelForDrug {
                drug_id: request.drug_id().to_string(),
            });
        }

        let mut best: Option<ScoredCandidate> = None;
        for model in &candidates {
            match self.evaluate_candidate(
                model,
                treatment.covariates(),
                agreed.as_ref(),
                request.computation_time(),
            ) {
                CandidateOutcome::Abort(error) => return Err(error),
                CandidateOutcome::Rejected(rejection) => {
                    tracing::warn!("Model {} rejected: {}", model.id, rejection);
                }
                CandidateOutcome::Survived(candidate) => {
                    tracing::debug!("Model {} scored {}", model.id, candidate.score);
                    if best.as_ref().map_or(true, |b| candidate.is_better_than(b)) {
                        best = Some(candidate);
                    }
                }
            }
        }

        let best = best.ok_or(SelectionError::NoValidModel)?;
        tracing::debug!(
            "Selected model {} with score {}",
            best.model.id,
            best.score
        );

        let fallback = self.options.fallback_language;
        check_language_support(best.model, &best.extracted, request.language(), fallback)?;

        Ok(SelectionOutcome::Selected {
            model: Arc::clone(best.model),
            covariate_results: result::assemble(&best.extracted, request.language(), fallback),
        })
    }

    fn evaluate_candidate<'a>(
        &self,
        model: &'a Arc<DrugModel>,
        covariates: &'a [PatientCovariate],
        agreed: Option<&FormulationAndRoute>,
        computation_time: NaiveDateTime,
    ) -> CandidateOutcome<'a> {
        if !is_compatible(model, agreed) {
            return CandidateOutcome::Rejected(Rejection::IncompatibleFormulation);
        }

        let mut extracted =
            match extract_covariates(model, covariates, computation_time, &self.options) {
                Ok(extracted) => extracted,
                Err(error) => return CandidateOutcome::Abort(error.for_model(&model.id)),
            };

        match apply_constraints(model, &mut extracted, &self.evaluator) {
            Ok(None) => {}
            Ok(Some(rejection)) => return CandidateOutcome::Rejected(rejection),
            Err(error) => return CandidateOutcome::Abort(error.for_model(&model.id)),
        }

        match score_candidate(&mut extracted, &self.evaluator) {
            Ok(score) => CandidateOutcome::Survived(ScoredCandidate {
                model,
                score,
                extracted,
            }),
            Err(error) => CandidateOutcome::Abort(error.for_model(&model.id)),
        }
    }
}

impl<L, E> ModelSelector<L, E>
where
    L: DrugModelLookup + Sync,
    E: PredicateEvaluator + Sync,
{
    /// Process independent requests in parallel
    pub fn perform_all(&self, results: &mut [RequestResult]) {
        results.par_iter_mut().for_each(|result| self.perform(result));
    }
}
