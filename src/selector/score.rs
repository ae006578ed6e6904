use crate::error::ExtractionError;
use crate::model::predicate::{OperationInputs, PredicateEvaluator};
use crate::selector::extract::ExtractedCovariate;

/// Score a surviving candidate; lower is better
///
/// Every definition costs one point when the patient did not provide it, or when at least
/// one of its observations fails the definition's validation. Failing observations get the
/// validation message attached as a warning.
pub(crate) fn score_candidate<'a, E: PredicateEvaluator + ?Sized>(
    extracted: &mut [ExtractedCovariate<'a>],
    evaluator: &E,
) -> Result<u32, ExtractionError> {
    let mut score = 0;

    for group in extracted.chunk_by_mut(|a, b| std::ptr::eq(a.definition, b.definition)) {
        let definition = group[0].definition;

        if group[0].observation.is_none() {
            score += 1;
            continue;
        }

        let Some(validation) = &definition.validation else {
            continue;
        };

        let mut invalid = false;
        for entry in group.iter_mut() {
            let mut inputs = OperationInputs::new();
            inputs.push(definition.validation_input(), entry.value);

            let valid = evaluator.evaluate(validation, &inputs).map_err(|_| {
                ExtractionError::EvaluationFailed {
                    covariate: entry
                        .observation
                        .map_or_else(|| definition.id.clone(), |o| o.id().to_string()),
                }
            })?;

            if !valid {
                entry.add_warning(&definition.validation_error_message);
                invalid = true;
            }
        }

        if invalid {
            score += 1;
        }
    }

    Ok(score)
}
