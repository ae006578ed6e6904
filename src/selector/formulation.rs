use crate::data::dosage::{DosageHistory, FormulationAndRoute};
use crate::error::SelectionError;
use crate::model::DrugModel;

/// The formulation and route shared by every period of the dosage history
///
/// Returns `None` for an empty history. Fails as soon as one period differs from the first.
pub fn check_formulations_and_routes(
    history: &DosageHistory,
) -> Result<Option<FormulationAndRoute>, SelectionError> {
    let mut formulation_and_routes = history.formulation_and_routes();
    let Some(first) = formulation_and_routes.next() else {
        return Ok(None);
    };

    if formulation_and_routes.any(|other| other != first) {
        return Err(SelectionError::MixedFormulationsAndRoutes);
    }

    Ok(Some(*first))
}

/// Whether `model` can be used for a treatment administered with `agreed`
pub fn is_compatible(model: &DrugModel, agreed: Option<&FormulationAndRoute>) -> bool {
    agreed.map_or(true, |formulation_and_route| model.supports(formulation_and_route))
}
