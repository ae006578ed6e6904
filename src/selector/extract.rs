use chrono::{Datelike, NaiveDateTime};

use crate::data::covariate::PatientCovariate;
use crate::data::value::{CovariateValue, DataType};
use crate::error::ExtractionError;
use crate::model::{AgeUnit, CovariateDefinition, DrugModel, LocalizedText};
use crate::selector::options::SelectorOptions;
use crate::selector::result::CovariateSource;

/// The value a candidate model would use for one of its covariate definitions
///
/// A definition observed several times yields one entry per observation.
#[derive(Debug, Clone)]
pub(crate) struct ExtractedCovariate<'a> {
    pub definition: &'a CovariateDefinition,
    /// The patient observation the value was read from, `None` for the standard value
    pub observation: Option<&'a PatientCovariate>,
    /// Value in the definition's unit and data type
    pub value: CovariateValue,
    pub warnings: Vec<&'a LocalizedText>,
}

impl<'a> ExtractedCovariate<'a> {
    fn from_model(definition: &'a CovariateDefinition) -> Self {
        ExtractedCovariate {
            definition,
            observation: None,
            value: definition.value,
            warnings: Vec::new(),
        }
    }

    fn from_patient(
        definition: &'a CovariateDefinition,
        observation: &'a PatientCovariate,
        value: CovariateValue,
    ) -> Self {
        ExtractedCovariate {
            definition,
            observation: Some(observation),
            value,
            warnings: Vec::new(),
        }
    }

    pub fn source(&self) -> CovariateSource {
        match self.observation {
            Some(_) => CovariateSource::Patient,
            None => CovariateSource::Model,
        }
    }

    pub fn time(&self) -> Option<NaiveDateTime> {
        self.observation.map(|o| o.event_time())
    }

    pub fn add_warning(&mut self, text: &'a LocalizedText) {
        if !self.warnings.iter().any(|w| std::ptr::eq(*w, text)) {
            self.warnings.push(text);
        }
    }
}

/// Match the patient's observations against every non-computed definition of `model`
///
/// Entries come out in definition order, observations of one definition oldest first.
pub(crate) fn extract_covariates<'a>(
    model: &'a DrugModel,
    covariates: &'a [PatientCovariate],
    computation_time: NaiveDateTime,
    options: &SelectorOptions,
) -> Result<Vec<ExtractedCovariate<'a>>, ExtractionError> {
    let mut extracted = Vec::new();

    for definition in model.covariates.iter().filter(|d| !d.computed) {
        if let Some(unit) = definition.covariate_type.age_unit() {
            extracted.push(extract_age(
                definition,
                unit,
                covariates,
                computation_time,
                options,
            )?);
            continue;
        }

        let mut observations: Vec<&PatientCovariate> = covariates
            .iter()
            .filter(|c| c.id() == definition.id)
            .collect();

        if observations.is_empty() {
            extracted.push(ExtractedCovariate::from_model(definition));
            continue;
        }

        observations.sort_by_key(|c| c.event_time());
        for observation in observations {
            let value = convert_observation(definition, observation)?;
            extracted.push(ExtractedCovariate::from_patient(
                definition,
                observation,
                value,
            ));
        }
    }

    Ok(extracted)
}

/// Age covariates read the single birth date of the patient
fn extract_age<'a>(
    definition: &'a CovariateDefinition,
    unit: AgeUnit,
    covariates: &'a [PatientCovariate],
    computation_time: NaiveDateTime,
    options: &SelectorOptions,
) -> Result<ExtractedCovariate<'a>, ExtractionError> {
    let birthdate_id = options.birthdate_id.as_str();
    let mut birthdates = covariates.iter().filter(|c| c.id() == birthdate_id);

    let Some(birthdate) = birthdates.next() else {
        return Ok(ExtractedCovariate::from_model(definition));
    };

    // Repeats collapse when they denote the same date, whatever its spelling
    let same_as_first = |other: &PatientCovariate| {
        other.data_type() == birthdate.data_type()
            && (other.raw_value().trim() == birthdate.raw_value().trim()
                || matches!((other.value(), birthdate.value()), (Ok(a), Ok(b)) if a == b))
    };
    if birthdates.any(|other| !options.collapse_identical_birthdates || !same_as_first(other)) {
        return Err(ExtractionError::MultipleValues {
            covariate: birthdate_id.to_string(),
        });
    }

    if birthdate.data_type() != DataType::Date {
        return Err(ExtractionError::InvalidDataType {
            covariate: birthdate_id.to_string(),
        });
    }

    let value_error = |error| ExtractionError::Value {
        covariate: birthdate_id.to_string(),
        error,
    };
    let born = birthdate.value().map_err(value_error)?;
    let Some(born) = born.as_date() else {
        return Err(ExtractionError::InvalidDataType {
            covariate: birthdate_id.to_string(),
        });
    };

    let age = CovariateValue::Number(age_in(unit, born, computation_time))
        .coerce(definition.data_type)
        .map_err(value_error)?;

    Ok(ExtractedCovariate::from_patient(definition, birthdate, age))
}

/// Bring an observation to the data type and unit of its definition
fn convert_observation(
    definition: &CovariateDefinition,
    observation: &PatientCovariate,
) -> Result<CovariateValue, ExtractionError> {
    let value_error = |error| ExtractionError::Value {
        covariate: observation.id().to_string(),
        error,
    };

    let parsed = observation.value().map_err(value_error)?;
    if !definition.data_type.is_numeric() {
        return parsed.coerce(definition.data_type).map_err(value_error);
    }

    // Numbers are rounded to the target type only once they are in the target unit
    match parsed.coerce(DataType::Double).map_err(value_error)? {
        CovariateValue::Number(raw) => {
            let converted = observation
                .unit()
                .convert(raw, &definition.unit)
                .map_err(|error| ExtractionError::Unit {
                    covariate: observation.id().to_string(),
                    error,
                })?;
            CovariateValue::Number(converted)
                .coerce(definition.data_type)
                .map_err(value_error)
        }
        other => other.coerce(definition.data_type).map_err(value_error),
    }
}

/// Age at `at` of someone born at `born`, in complete units
pub fn age_in(unit: AgeUnit, born: NaiveDateTime, at: NaiveDateTime) -> f64 {
    match unit {
        AgeUnit::Days => (at - born).num_days() as f64,
        AgeUnit::Weeks => ((at - born).num_days() / 7) as f64,
        AgeUnit::Months => complete_months(born, at) as f64,
        AgeUnit::Years => (complete_months(born, at) / 12) as f64,
    }
}

fn complete_months(from: NaiveDateTime, to: NaiveDateTime) -> i64 {
    let mut months = (to.year() - from.year()) as i64 * 12 + to.month() as i64
        - from.month() as i64;

    let to_rest = (to.day(), to.time());
    let from_rest = (from.day(), from.time());
    if months > 0 && to_rest < from_rest {
        months -= 1;
    } else if months < 0 && to_rest > from_rest {
        months += 1;
    }

    months
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::value::parse_date;
    use approx::assert_relative_eq;

    fn date(s: &str) -> NaiveDateTime {
        parse_date(s).unwrap()
    }

    const MODEL: &str = r#"{
        "id": "ch.tucuxi.imatinib.gotta2012",
        "drugId": "imatinib",
        "covariates": [
            {
                "id": "bodyweight",
                "name": { "en": "Total Body Weight" },
                "unit": "kg",
                "dataType": "double",
                "value": 70
            },
            {
                "id": "age",
                "name": { "en": "Age" },
                "unit": "y",
                "dataType": "double",
                "type": "ageInYears",
                "value": 50
            },
            {
                "id": "gist",
                "name": { "en": "GIST" },
                "unit": "-",
                "dataType": "bool",
                "value": false
            },
            {
                "id": "clearance",
                "name": { "en": "Clearance" },
                "unit": "l/h",
                "dataType": "double",
                "value": 14.3,
                "computed": true
            }
        ]
    }"#;

    fn model() -> DrugModel {
        DrugModel::from_str(MODEL).unwrap()
    }

    fn extract<'a>(
        model: &'a DrugModel,
        covariates: &'a [PatientCovariate],
    ) -> Result<Vec<ExtractedCovariate<'a>>, ExtractionError> {
        extract_covariates(
            model,
            covariates,
            date("2022-06-01T12:00:00"),
            &SelectorOptions::default(),
        )
    }

    #[test]
    fn test_age_in_units() {
        let born = date("2000-01-01T12:00:00");
        let at = date("2010-01-01T12:00:00");
        assert_eq!(age_in(AgeUnit::Days, born, at), 3653.0);
        assert_eq!(age_in(AgeUnit::Weeks, born, at), 521.0);
        assert_eq!(age_in(AgeUnit::Months, born, at), 120.0);
        assert_eq!(age_in(AgeUnit::Years, born, at), 10.0);
    }

    #[test]
    fn test_age_counts_complete_years_only() {
        let born = date("2000-03-15T08:00:00");
        assert_eq!(age_in(AgeUnit::Years, born, date("2010-03-15T07:59:00")), 9.0);
        assert_eq!(age_in(AgeUnit::Years, born, date("2010-03-15T08:00:00")), 10.0);
        assert_eq!(age_in(AgeUnit::Months, born, date("2000-04-14T08:00:00")), 0.0);
    }

    #[test]
    fn test_missing_observations_use_standard_values() {
        let model = model();
        let extracted = extract(&model, &[]).unwrap();

        // The computed clearance is never extracted
        assert_eq!(extracted.len(), 3);
        assert!(extracted
            .iter()
            .all(|e| e.source() == CovariateSource::Model));
        assert_eq!(extracted[0].value, CovariateValue::Number(70.0));
    }

    #[test]
    fn test_observations_are_converted_and_sorted() {
        let model = model();
        let covariates = vec![
            PatientCovariate::new(
                "bodyweight",
                date("2022-05-01"),
                "80000",
                "g",
                DataType::Double,
            ),
            PatientCovariate::new(
                "bodyweight",
                date("2022-01-01"),
                "154",
                "lb",
                DataType::Double,
            ),
            PatientCovariate::new("gist", date("2022-01-01"), "1", "-", DataType::Bool),
        ];
        let extracted = extract(&model, &covariates).unwrap();

        let weights: Vec<&ExtractedCovariate> = extracted
            .iter()
            .filter(|e| e.definition.id == "bodyweight")
            .collect();
        assert_eq!(weights.len(), 2);
        assert_eq!(weights[0].time(), Some(date("2022-01-01")));
        assert_relative_eq!(
            weights[0].value.as_f64().unwrap(),
            69.853_225,
            epsilon = 1e-6
        );
        assert_relative_eq!(weights[1].value.as_f64().unwrap(), 80.0, epsilon = 1e-9);

        let gist = extracted.iter().find(|e| e.definition.id == "gist").unwrap();
        assert_eq!(gist.value, CovariateValue::Bool(true));
        assert_eq!(gist.source(), CovariateSource::Patient);
    }

    #[test]
    fn test_age_from_birthdate() {
        let model = model();
        let covariates = vec![PatientCovariate::new(
            "birthdate",
            date("2022-01-01"),
            "1990-01-01T00:00:00",
            "",
            DataType::Date,
        )];
        let extracted = extract(&model, &covariates).unwrap();
        let age = extracted.iter().find(|e| e.definition.id == "age").unwrap();
        assert_eq!(age.value, CovariateValue::Number(32.0));
        assert_eq!(age.observation.unwrap().id(), "birthdate");
    }

    #[test]
    fn test_multiple_birthdates_are_irrecoverable() {
        let model = model();
        let covariates = vec![
            PatientCovariate::new("birthdate", date("2022-01-01"), "1990-01-01", "", DataType::Date),
            PatientCovariate::new("birthdate", date("2022-02-01"), "1991-01-01", "", DataType::Date),
        ];
        assert_eq!(
            extract(&model, &covariates).unwrap_err(),
            ExtractionError::MultipleValues {
                covariate: "birthdate".to_string()
            }
        );
    }

    #[test]
    fn test_repeated_identical_birthdate_is_accepted() {
        let model = model();
        let covariates = vec![
            PatientCovariate::new("birthdate", date("2022-01-01"), "1990-01-01", "", DataType::Date),
            PatientCovariate::new("birthdate", date("2022-02-01"), "1990-01-01", "", DataType::Date),
        ];
        assert!(extract(&model, &covariates).is_ok());

        let strict = SelectorOptions {
            collapse_identical_birthdates: false,
            ..SelectorOptions::default()
        };
        let result = extract_covariates(&model, &covariates, date("2022-06-01"), &strict);
        assert!(matches!(result, Err(ExtractionError::MultipleValues { .. })));
    }

    #[test]
    fn test_birthdate_written_two_ways_is_one_date() {
        let model = model();
        let covariates = vec![
            PatientCovariate::new("birthdate", date("2022-01-01"), "1990-01-01", "", DataType::Date),
            PatientCovariate::new(
                "birthdate",
                date("2022-02-01"),
                "1990-01-01T00:00:00",
                "",
                DataType::Date,
            ),
        ];
        let extracted = extract(&model, &covariates).unwrap();
        let age = extracted.iter().find(|e| e.definition.id == "age").unwrap();
        assert_eq!(age.value, CovariateValue::Number(32.0));
    }

    #[test]
    fn test_int_definition_rounds_after_unit_conversion() {
        let model = DrugModel::from_str(
            r#"{
                "id": "ch.tucuxi.busulfan.paci2012",
                "drugId": "busulfan",
                "covariates": [{
                    "id": "height",
                    "name": { "en": "Height" },
                    "unit": "cm",
                    "dataType": "int",
                    "value": 170
                }]
            }"#,
        )
        .unwrap();
        let covariates = vec![PatientCovariate::new(
            "height",
            date("2022-01-01"),
            "1.84",
            "m",
            DataType::Double,
        )];
        let extracted = extract(&model, &covariates).unwrap();
        assert_eq!(extracted[0].value, CovariateValue::Number(184.0));
    }

    #[test]
    fn test_mistyped_birthdate_is_irrecoverable() {
        let model = model();
        let covariates = vec![PatientCovariate::new(
            "birthdate",
            date("2022-01-01"),
            "32",
            "",
            DataType::Double,
        )];
        assert_eq!(
            extract(&model, &covariates).unwrap_err(),
            ExtractionError::InvalidDataType {
                covariate: "birthdate".to_string()
            }
        );
    }

    #[test]
    fn test_incompatible_unit_is_irrecoverable() {
        let model = model();
        let covariates = vec![PatientCovariate::new(
            "gist",
            date("2022-01-01"),
            "1",
            "kg",
            DataType::Double,
        )];
        // A numeric gist coerces to a boolean, units are irrelevant for booleans
        assert!(extract(&model, &covariates).is_ok());

        let covariates = vec![PatientCovariate::new(
            "bodyweight",
            date("2022-01-01"),
            "70",
            "cm",
            DataType::Double,
        )];
        assert!(matches!(
            extract(&model, &covariates),
            Err(ExtractionError::Unit { .. })
        ));
    }

    #[test]
    fn test_date_where_number_expected() {
        let model = model();
        let covariates = vec![PatientCovariate::new(
            "bodyweight",
            date("2022-01-01"),
            "2022-01-01",
            "kg",
            DataType::Date,
        )];
        assert!(matches!(
            extract(&model, &covariates),
            Err(ExtractionError::Value { .. })
        ));
    }
}
