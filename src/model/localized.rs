//! Localized texts of drug model files

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Output language of a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Language {
    #[default]
    #[serde(rename = "en")]
    English,
    #[serde(rename = "fr")]
    French,
}

impl Language {
    /// The tag used as key in localized texts
    pub fn tag(&self) -> &'static str {
        match self {
            Self::English => "en",
            Self::French => "fr",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag.trim().to_lowercase().as_str() {
            "en" => Some(Self::English),
            "fr" => Some(Self::French),
            _ => None,
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tag())
    }
}

/// A text available in several languages, keyed by language tag
///
/// Empty strings count as missing translations.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocalizedText(BTreeMap<String, String>);

impl LocalizedText {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Add or replace the translation for `lang`
    pub fn with(mut self, lang: Language, text: impl Into<String>) -> Self {
        self.0.insert(lang.tag().to_string(), text.into());
        self
    }

    /// English-only text
    pub fn english(text: impl Into<String>) -> Self {
        Self::new().with(Language::English, text)
    }

    /// The translation for exactly `lang`, if present
    pub fn get(&self, lang: Language) -> Option<&str> {
        self.0
            .get(lang.tag())
            .map(|s| s.as_str())
            .filter(|s| !s.is_empty())
    }

    /// The translation for `lang`, falling back to English
    pub fn resolve(&self, lang: Language) -> Option<&str> {
        self.resolve_or(lang, Language::English)
    }

    /// The translation for `lang`, falling back to `fallback`
    pub fn resolve_or(&self, lang: Language, fallback: Language) -> Option<&str> {
        self.get(lang).or_else(|| self.get(fallback))
    }
}
