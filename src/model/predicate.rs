//! The boundary to the expression language of drug model files
//!
//! Constraint and validation formulas are opaque to this crate: they are handed, together
//! with named typed inputs, to a [`PredicateEvaluator`] supplied by the caller.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

use crate::data::value::{CovariateValue, DataType};

/// Error type for predicate evaluation
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvaluationError {
    #[error("Missing input '{0}'")]
    MissingInput(String),
    #[error("Input '{name}' is not of type {expected}")]
    WrongType { name: String, expected: DataType },
    #[error("No evaluator registered for formula '{0}'")]
    UnknownFormula(String),
    #[error("Evaluation failed: {0}")]
    Failed(String),
}

/// A formula text, as written in the drug model file
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Expression(pub String);

impl Expression {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A named, typed input a formula expects
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputDeclaration {
    pub name: String,
    #[serde(rename = "type", default = "default_input_type")]
    pub data_type: DataType,
}

fn default_input_type() -> DataType {
    DataType::Double
}

/// A boolean-valued formula and the inputs it reads
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Predicate {
    pub formula: Expression,
    #[serde(default)]
    pub inputs: Vec<InputDeclaration>,
}

impl Predicate {
    pub fn new(formula: impl Into<String>, inputs: &[&str]) -> Self {
        Predicate {
            formula: Expression::new(formula),
            inputs: inputs
                .iter()
                .map(|name| InputDeclaration {
                    name: name.to_string(),
                    data_type: DataType::Double,
                })
                .collect(),
        }
    }

    pub fn input_names(&self) -> impl Iterator<Item = &str> {
        self.inputs.iter().map(|i| i.name.as_str())
    }
}

/// A value bound to one input of a formula
#[derive(Debug, Clone, PartialEq)]
pub struct OperationInput {
    pub name: String,
    pub value: CovariateValue,
}

/// The inputs bound for one evaluation
#[derive(Debug, Clone, PartialEq, Default)]
pub struct OperationInputs(Vec<OperationInput>);

impl OperationInputs {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn push(&mut self, name: impl Into<String>, value: CovariateValue) {
        self.0.push(OperationInput {
            name: name.into(),
            value,
        });
    }

    pub fn get(&self, name: &str) -> Option<&CovariateValue> {
        self.0.iter().find(|i| i.name == name).map(|i| &i.value)
    }

    /// Numeric value of input `name`; booleans read as 0/1
    pub fn number(&self, name: &str) -> Result<f64, EvaluationError> {
        let value = self
            .get(name)
            .ok_or_else(|| EvaluationError::MissingInput(name.to_string()))?;
        value.as_f64().ok_or_else(|| EvaluationError::WrongType {
            name: name.to_string(),
            expected: DataType::Double,
        })
    }
}

/// Evaluates opaque boolean formulas
pub trait PredicateEvaluator {
    fn evaluate(
        &self,
        predicate: &Predicate,
        inputs: &OperationInputs,
    ) -> Result<bool, EvaluationError>;
}

impl<F> PredicateEvaluator for F
where
    F: Fn(&Predicate, &OperationInputs) -> Result<bool, EvaluationError>,
{
    fn evaluate(
        &self,
        predicate: &Predicate,
        inputs: &OperationInputs,
    ) -> Result<bool, EvaluationError> {
        self(predicate, inputs)
    }
}

type Rule = Box<dyn Fn(&OperationInputs) -> Result<bool, EvaluationError> + Send + Sync>;

/// An evaluator backed by a table of formula text to Rust closures
///
/// Useful when the formulas of a model set are known in advance.
#[derive(Default)]
pub struct PredicateTable {
    rules: HashMap<String, Rule>,
}

impl PredicateTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the closure evaluating `formula`
    pub fn rule<F>(mut self, formula: &str, rule: F) -> Self
    where
        F: Fn(&OperationInputs) -> Result<bool, EvaluationError> + Send + Sync + 'static,
    {
        self.rules.insert(formula.to_string(), Box::new(rule));
        self
    }
}

impl PredicateEvaluator for PredicateTable {
    fn evaluate(
        &self,
        predicate: &Predicate,
        inputs: &OperationInputs,
    ) -> Result<bool, EvaluationError> {
        let rule = self
            .rules
            .get(predicate.formula.as_str())
            .ok_or_else(|| EvaluationError::UnknownFormula(predicate.formula.to_string()))?;
        rule(inputs)
    }
}

impl fmt::Debug for PredicateTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut formulas: Vec<&String> = self.rules.keys().collect();
        formulas.sort();
        f.debug_struct("PredicateTable")
            .field("formulas", &formulas)
            .finish()
    }
}
