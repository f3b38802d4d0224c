//! Access to motif model sets.
//!
//! A model repository is laid out as `<base>/<category tag>/<version>/`. Each
//! version directory holds the models of one type (for example base-pair models,
//! tagged `bp`). The pipeline only relies on [`ModelRepository`]; [`fs`] provides
//! a plain directory-listing implementation.

pub mod fs;

use crate::core::models::ids::{ModelId, ModelName};
use crate::core::models::query::LoopCategory;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelLoadError {
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("Invalid model repository entry '{path}': {message}")]
    InvalidEntry { path: String, message: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelGroup {
    pub id: ModelId,
    pub model_type: String,
    pub path: PathBuf,
}

/// The models a scorer runs a loop against.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelSet {
    pub names: Vec<ModelName>,
    pub groups: HashMap<ModelId, ModelGroup>,
}

impl ModelSet {
    pub fn load(
        repository: &dyn ModelRepository,
        dir: &Path,
        model_type: &str,
    ) -> Result<Self, ModelLoadError> {
        Ok(Self {
            names: repository.list_models(dir, model_type)?,
            groups: repository.load_model_groups(dir, model_type)?,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

pub trait ModelRepository {
    /// Lists the model names of `model_type` found in `dir`, in a stable order.
    fn list_models(&self, dir: &Path, model_type: &str) -> Result<Vec<ModelName>, ModelLoadError>;

    /// Loads the model groups of `model_type` found in `dir`, keyed by model id.
    fn load_model_groups(
        &self,
        dir: &Path,
        model_type: &str,
    ) -> Result<HashMap<ModelId, ModelGroup>, ModelLoadError>;
}

/// Directory holding the models for one loop category and model-set version.
pub fn model_dir(base: &Path, category: LoopCategory, version: &str) -> PathBuf {
    base.join(category.tag()).join(version)
}
