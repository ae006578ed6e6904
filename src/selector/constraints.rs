use chrono::NaiveDateTime;

use crate::data::value::CovariateValue;
use crate::error::ExtractionError;
use crate::model::predicate::{EvaluationError, OperationInputs, PredicateEvaluator};
use crate::model::{ConstraintKind, DomainConstraint, DrugModel, InterpolationMethod};
use crate::selector::extract::ExtractedCovariate;
use crate::selector::Rejection;

/// Evaluate the domain constraints of `model` against the extracted covariates
///
/// A constraint is only applied when every covariate it requires was extracted. It is
/// evaluated at each time one of those covariates was observed, or once on standard values
/// when none was. The first failing hard constraint rejects the model; failing soft ones
/// attach their message to the entries involved.
pub(crate) fn apply_constraints<'a, E: PredicateEvaluator + ?Sized>(
    model: &'a DrugModel,
    extracted: &mut [ExtractedCovariate<'a>],
    evaluator: &E,
) -> Result<Option<Rejection>, ExtractionError> {
    for constraint in &model.constraints {
        let required: Vec<&str> = constraint.required_covariates().collect();
        let applicable = required
            .iter()
            .all(|id| extracted.iter().any(|e| e.definition.id == *id));
        if !applicable {
            tracing::trace!(
                "Skipping constraint '{}' of {}",
                constraint.predicate.formula,
                model.id
            );
            continue;
        }

        for point in evaluation_points(extracted, &required) {
            if evaluate_at(constraint, extracted, point, evaluator)? {
                continue;
            }

            match constraint.kind {
                ConstraintKind::Hard => {
                    return Ok(Some(Rejection::HardConstraint {
                        formula: constraint.predicate.formula.to_string(),
                    }));
                }
                ConstraintKind::Soft => {
                    for entry in extracted.iter_mut().filter(|e| {
                        required.contains(&e.definition.id.as_str())
                            && (point.is_none() || e.time() == point)
                    }) {
                        entry.add_warning(&constraint.error_message);
                    }
                }
            }
        }
    }

    Ok(None)
}

/// Distinct observation times of the required covariates, `[None]` when there are none
fn evaluation_points(
    extracted: &[ExtractedCovariate],
    required: &[&str],
) -> Vec<Option<NaiveDateTime>> {
    let mut points: Vec<Option<NaiveDateTime>> = extracted
        .iter()
        .filter(|e| required.contains(&e.definition.id.as_str()))
        .filter_map(|e| e.time())
        .map(Some)
        .collect();
    points.sort();
    points.dedup();

    if points.is_empty() {
        points.push(None);
    }
    points
}

fn evaluate_at<E: PredicateEvaluator + ?Sized>(
    constraint: &DomainConstraint,
    extracted: &[ExtractedCovariate],
    point: Option<NaiveDateTime>,
    evaluator: &E,
) -> Result<bool, ExtractionError> {
    let predicate = &constraint.predicate;
    let failed = |error| ExtractionError::Constraint {
        formula: predicate.formula.to_string(),
        error,
    };

    let mut inputs = OperationInputs::new();
    for input in &predicate.inputs {
        let entries: Vec<&ExtractedCovariate> = extracted
            .iter()
            .filter(|e| e.definition.id == input.name)
            .collect();
        let value = value_at(&entries, point)
            .ok_or_else(|| failed(EvaluationError::MissingInput(input.name.clone())))?
            .coerce(input.data_type)
            .map_err(|_| {
                failed(EvaluationError::WrongType {
                    name: input.name.clone(),
                    expected: input.data_type,
                })
            })?;
        inputs.push(input.name.as_str(), value);
    }

    evaluator.evaluate(predicate, &inputs).map_err(failed)
}

/// Value of one covariate at `point`
///
/// `entries` are the extracted entries of a single definition, oldest first. The value is the
/// latest observation at or before `point`, or the earliest one when all are later. Linear
/// covariates are interpolated between the surrounding observations.
fn value_at(entries: &[&ExtractedCovariate], point: Option<NaiveDateTime>) -> Option<CovariateValue> {
    let first = entries.first()?;
    let Some(point) = point else {
        return Some(first.value);
    };

    let observed: Vec<(NaiveDateTime, CovariateValue)> = entries
        .iter()
        .filter_map(|e| e.time().map(|t| (t, e.value)))
        .collect();

    let Some(index) = observed.iter().rposition(|(t, _)| *t <= point) else {
        return observed.first().map(|(_, v)| *v).or(Some(first.value));
    };

    let (before_time, before) = observed[index];
    if first.definition.interpolation == InterpolationMethod::Linear && before_time < point {
        if let Some((after_time, after)) = observed.get(index + 1) {
            if let (Some(v0), Some(v1), CovariateValue::Number(_)) =
                (before.as_f64(), after.as_f64(), before)
            {
                let span = (*after_time - before_time).num_seconds() as f64;
                let elapsed = (point - before_time).num_seconds() as f64;
                return Some(CovariateValue::Number(v0 + (v1 - v0) * elapsed / span));
            }
        }
    }

    Some(before)
}
