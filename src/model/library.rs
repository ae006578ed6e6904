//! Drug Model Repository
//!
//! Holds the candidate models of every known drug. The repository is built once, then
//! shared read-only between requests; models are handed out as [`Arc`]s.
//!
//! # Example
//!
//! ```rust,ignore
//! use pharmsel::model::{DrugModelLookup, DrugModelRepository};
//!
//! let repository = DrugModelRepository::from_dir(Path::new("drugfiles"))?;
//!
//! for model in repository.models_for_drug("imatinib") {
//!     println!("Candidate: {}", model.id);
//! }
//! ```
//!
//! The order of the candidates is the order models were added in, which for
//! [`DrugModelRepository::from_dir`] is the sorted order of the file paths. Ties between
//! equally good models are broken against this order, so it must stay reproducible.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::model::errors::ModelError;
use crate::model::DrugModel;

/// Source of candidate models for a drug
pub trait DrugModelLookup {
    /// All candidate models of `drug_id`, in a stable order
    fn models_for_drug(&self, drug_id: &str) -> Vec<Arc<DrugModel>>;
}

/// An in-memory, ordered registry of drug models
#[derive(Debug, Clone, Default)]
pub struct DrugModelRepository {
    models: Vec<Arc<DrugModel>>,
}

impl DrugModelRepository {
    /// Create a new empty repository
    pub fn new() -> Self {
        Self { models: Vec::new() }
    }

    /// Load models from a directory (recursively searches for .json files)
    pub fn from_dir(path: &Path) -> Result<Self, ModelError> {
        let mut repository = Self::new();
        repository.load_dir(path)?;
        Ok(repository)
    }

    /// Load models from a directory into this repository
    ///
    /// Files that fail to parse are skipped with a warning.
    pub fn load_dir(&mut self, path: &Path) -> Result<(), ModelError> {
        if !path.exists() {
            return Err(ModelError::RepositoryError(format!(
                "Directory not found: {}",
                path.display()
            )));
        }

        let mut files = Vec::new();
        Self::collect_json_files(path, &mut files)?;
        files.sort();

        for file_path in files {
            let content = std::fs::read_to_string(&file_path).map_err(|e| {
                ModelError::RepositoryError(format!(
                    "Failed to read {}: {}",
                    file_path.display(),
                    e
                ))
            })?;

            match DrugModel::from_str(&content) {
                Ok(model) => self.add(model),
                Err(e) => {
                    tracing::warn!("Failed to parse {}: {}", file_path.display(), e);
                }
            }
        }

        Ok(())
    }

    fn collect_json_files(path: &Path, files: &mut Vec<PathBuf>) -> Result<(), ModelError> {
        let entries = std::fs::read_dir(path).map_err(|e| {
            ModelError::RepositoryError(format!("Failed to read directory: {}", e))
        })?;

        for entry in entries {
            let entry = entry
                .map_err(|e| ModelError::RepositoryError(format!("Failed to read entry: {}", e)))?;
            let file_path = entry.path();

            if file_path.is_dir() {
                Self::collect_json_files(&file_path, files)?;
            } else if file_path.extension().is_some_and(|ext| ext == "json") {
                files.push(file_path);
            }
        }

        Ok(())
    }

    /// Add a model to the repository; a model with the same id is replaced in place
    pub fn add(&mut self, model: DrugModel) {
        let model = Arc::new(model);
        match self.models.iter().position(|m| m.id == model.id) {
            Some(index) => self.models[index] = model,
            None => self.models.push(model),
        }
    }

    /// Get a model by ID
    pub fn get(&self, id: &str) -> Option<&Arc<DrugModel>> {
        self.models.iter().find(|m| m.id == id)
    }

    /// Check if a model exists
    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// List all model IDs, in repository order
    pub fn list(&self) -> Vec<&str> {
        self.models.iter().map(|m| m.id.as_str()).collect()
    }

    /// Get the number of models
    pub fn len(&self) -> usize {
        self.models.len()
    }

    /// Check if the repository is empty
    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

impl DrugModelLookup for DrugModelRepository {
    fn models_for_drug(&self, drug_id: &str) -> Vec<Arc<DrugModel>> {
        self.models
            .iter()
            .filter(|m| m.drug_id == drug_id)
            .cloned()
            .collect()
    }
}

impl FromIterator<DrugModel> for DrugModelRepository {
    fn from_iter<I: IntoIterator<Item = DrugModel>>(iter: I) -> Self {
        let mut repository = Self::new();
        for model in iter {
            repository.add(model);
        }
        repository
    }
}
