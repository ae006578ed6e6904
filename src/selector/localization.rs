use crate::error::SelectionError;
use crate::model::{DrugModel, Language, LocalizedText};
use crate::selector::extract::ExtractedCovariate;

/// Whether every text reported for the selected model resolves in `lang` or `fallback`
///
/// Covers the name and description of each definition, the validation message of validated
/// definitions, and the warnings attached during selection.
pub(crate) fn check_language_support(
    model: &DrugModel,
    extracted: &[ExtractedCovariate],
    lang: Language,
    fallback: Language,
) -> Result<(), SelectionError> {
    let resolves = |text: &LocalizedText| text.resolve_or(lang, fallback).is_some();

    let definitions_ok = model.covariates.iter().all(|definition| {
        resolves(&definition.name)
            && resolves(&definition.description)
            && (definition.validation.is_none() || resolves(&definition.validation_error_message))
    });

    let warnings_ok = extracted
        .iter()
        .flat_map(|entry| entry.warnings.iter())
        .all(|text| resolves(*text));

    if definitions_ok && warnings_ok {
        Ok(())
    } else {
        tracing::warn!(
            "Model {} has covariate texts in neither {} nor {}",
            model.id,
            lang,
            fallback
        );
        Err(SelectionError::UnsupportedLanguage)
    }
}
