use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::data::unit::Unit;

/// Pharmaceutical form of the administered drug
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Formulation {
    Undefined,
    ParenteralSolution,
    OralSolution,
    Test,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AdministrationRoute {
    Undefined,
    Intramuscular,
    IntravenousBolus,
    IntravenousDrip,
    Nasal,
    Oral,
    Rectal,
    Subcutaneous,
    Sublingual,
    Transdermal,
    Vaginal,
}

/// Absorption model assumed for an administration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AbsorptionModel {
    Undefined,
    Extravascular,
    ExtravascularLag,
    Intravascular,
    Infusion,
}

/// The formulation, route and absorption model of an administration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormulationAndRoute {
    pub formulation: Formulation,
    pub route: AdministrationRoute,
    pub absorption: AbsorptionModel,
}

impl FormulationAndRoute {
    pub fn new(
        formulation: Formulation,
        route: AdministrationRoute,
        absorption: AbsorptionModel,
    ) -> Self {
        FormulationAndRoute {
            formulation,
            route,
            absorption,
        }
    }
}

impl fmt::Display for FormulationAndRoute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:?}/{:?}/{:?}",
            self.formulation, self.route, self.absorption
        )
    }
}

/// A period during which the patient received the same dosage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DosageTimeRange {
    start: NaiveDateTime,
    #[serde(skip_serializing_if = "Option::is_none")]
    end: Option<NaiveDateTime>,
    formulation_and_route: FormulationAndRoute,
    dose: f64,
    #[serde(default)]
    dose_unit: Unit,
}

impl DosageTimeRange {
    pub fn new(
        start: NaiveDateTime,
        end: Option<NaiveDateTime>,
        formulation_and_route: FormulationAndRoute,
        dose: f64,
        dose_unit: impl Into<Unit>,
    ) -> Self {
        DosageTimeRange {
            start,
            end,
            formulation_and_route,
            dose,
            dose_unit: dose_unit.into(),
        }
    }

    pub fn start(&self) -> NaiveDateTime {
        self.start
    }

    pub fn end(&self) -> Option<NaiveDateTime> {
        self.end
    }

    pub fn formulation_and_route(&self) -> &FormulationAndRoute {
        &self.formulation_and_route
    }

    pub fn dose(&self) -> f64 {
        self.dose
    }

    pub fn dose_unit(&self) -> &Unit {
        &self.dose_unit
    }
}

/// The patient's ordered administration history
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DosageHistory(Vec<DosageTimeRange>);

impl DosageHistory {
    pub fn new(ranges: Vec<DosageTimeRange>) -> Self {
        DosageHistory(ranges)
    }

    pub fn push(&mut self, range: DosageTimeRange) {
        self.0.push(range);
    }

    pub fn time_ranges(&self) -> &[DosageTimeRange] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Formulation and route of every period, in history order
    pub fn formulation_and_routes(&self) -> impl Iterator<Item = &FormulationAndRoute> {
        self.0.iter().map(|range| range.formulation_and_route())
    }
}
