use criterion::{black_box, criterion_group, criterion_main, Criterion};
use pharmsel::data::value::parse_date;
use pharmsel::prelude::*;

const COVARIATES: &str = r#"[
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
        "name": { "en": "Age", "fr": "Âge" },
        "description": { "en": "Age of the patient, in years" },
        "unit": "y",
        "dataType": "double",
        "type": "ageInYears",
        "value": 50
    },
    {
        "id": "gist",
        "name": { "en": "GIST" },
        "description": { "en": "Gastrointestinal stromal tumour" },
        "unit": "-",
        "dataType": "bool",
        "value": false
    }
]"#;

fn repository(candidates: usize) -> DrugModelRepository {
    (0..candidates)
        .map(|i| {
            let json = format!(
                r#"{{
                    "id": "ch.tucuxi.imatinib.model{}",
                    "drugId": "imatinib",
                    "formulationAndRoutes": [
                        {{ "formulation": "parenteralSolution", "route": "oral", "absorption": "extravascular" }}
                    ],
                    "covariates": {},
                    "constraints": [{{
                        "kind": "soft",
                        "predicate": {{ "formula": "bodyweight in [44, 110]", "inputs": [{{ "name": "bodyweight" }}] }},
                        "errorMessage": {{ "en": "The body weight should be in [44,110]" }}
                    }}]
                }}"#,
                i, COVARIATES
            );
            DrugModel::from_str(&json).unwrap()
        })
        .collect()
}

fn evaluator() -> PredicateTable {
    PredicateTable::new()
        .rule("bodyweight < 300", |i| Ok(i.number("bodyweight")? < 300.0))
        .rule("bodyweight in [44, 110]", |i| {
            let weight = i.number("bodyweight")?;
            Ok((44.0..=110.0).contains(&weight))
        })
}

fn request(weights: usize) -> RequestContext {
    let oral = FormulationAndRoute::new(
        Formulation::ParenteralSolution,
        AdministrationRoute::Oral,
        AbsorptionModel::Extravascular,
    );
    let start = parse_date("2022-01-01T08:00:00").unwrap();

    let mut builder = Treatment::builder()
        .administration(start, oral, 400.0, "mg")
        .covariate("birthdate", start, "1990-01-01", "", DataType::Date)
        .covariate("gist", start, "1", "-", DataType::Bool);
    for day in 0..weights {
        let time = start + chrono::Duration::days(day as i64);
        let weight = (60 + day % 60).to_string();
        builder = builder.covariate("bodyweight", time, &weight, "kg", DataType::Double);
    }

    RequestContext::new(
        "imatinib",
        Language::French,
        parse_date("2022-06-01T12:00:00").unwrap(),
        Some(builder.build()),
    )
}

fn selection_benchmark(c: &mut Criterion) {
    // Few candidates, few observations
    let selector = ModelSelector::new(repository(3), evaluator());
    let simple = request(3);
    c.bench_function("select simple", |b| {
        b.iter(|| black_box(selector.select(black_box(&simple))))
    });

    // Many observations to interpolate and validate
    let dense = request(365);
    c.bench_function("select dense history", |b| {
        b.iter(|| black_box(selector.select(black_box(&dense))))
    });

    // Many candidates
    let selector = ModelSelector::new(repository(50), evaluator());
    c.bench_function("select many candidates", |b| {
        b.iter(|| black_box(selector.select(black_box(&simple))))
    });
}

fn batch_benchmark(c: &mut Criterion) {
    let selector = ModelSelector::new(repository(10), evaluator());
    c.bench_function("perform_all 100 requests", |b| {
        b.iter(|| {
            let mut results: Vec<RequestResult> =
                (0..100).map(|i| RequestResult::new(request(i % 20))).collect();
            selector.perform_all(&mut results);
            black_box(results);
        })
    });
}

criterion_group!(benches, selection_benchmark, batch_benchmark);
criterion_main!(benches);
