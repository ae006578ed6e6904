use serde::{Deserialize, Serialize};

use crate::model::localized::Language;

/// Options for drug model selection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SelectorOptions {
    /// Language texts fall back to when missing in the requested one (default: English)
    pub fallback_language: Language,

    /// Id of the patient observation age covariates are computed from (default: `birthdate`)
    ///
    /// A patient has a single birth date: more than one differing observation, or one that
    /// is not declared as a date, stops the selection.
    pub birthdate_id: String,

    /// Accept repeated birth date observations carrying the same value (default: `true`)
    pub collapse_identical_birthdates: bool,
}

impl Default for SelectorOptions {
    fn default() -> Self {
        Self {
            fallback_language: Language::English,
            birthdate_id: "birthdate".to_string(),
            collapse_identical_birthdates: true,
        }
    }
}

impl SelectorOptions {
    /// Read options from JSON; missing fields keep their defaults
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
