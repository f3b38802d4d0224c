use crate::core::models::query::LoopCategory;
use crate::core::repository::model_dir;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),
    #[error("Invalid value for '{name}': {reason}")]
    InvalidParameter { name: &'static str, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelConfig {
    pub model_type: String,
    pub model_version: String,
    pub model_repo_base: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    pub models: ModelConfig,
    pub max_alignment_range: usize,
}

impl PipelineConfig {
    pub fn model_dir(&self, category: LoopCategory) -> PathBuf {
        model_dir(
            &self.models.model_repo_base,
            category,
            &self.models.model_version,
        )
    }
}

#[derive(Default)]
pub struct PipelineConfigBuilder {
    model_type: Option<String>,
    model_version: Option<String>,
    model_repo_base: Option<PathBuf>,
    max_alignment_range: Option<usize>,
}

impl PipelineConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn model_type(mut self, model_type: impl Into<String>) -> Self {
        self.model_type = Some(model_type.into());
        self
    }
    pub fn model_version(mut self, version: impl Into<String>) -> Self {
        self.model_version = Some(version.into());
        self
    }
    pub fn model_repo_base(mut self, path: impl Into<PathBuf>) -> Self {
        self.model_repo_base = Some(path.into());
        self
    }
    pub fn max_alignment_range(mut self, range: usize) -> Self {
        self.max_alignment_range = Some(range);
        self
    }

    pub fn build(self) -> Result<PipelineConfig, ConfigError> {
        let model_type = self
            .model_type
            .ok_or(ConfigError::MissingParameter("model_type"))?;
        if model_type.is_empty() || model_type.contains(['/', '\\', '.']) {
            return Err(ConfigError::InvalidParameter {
                name: "model_type",
                reason: format!("'{model_type}' is not a usable file extension"),
            });
        }
        let model_version = self
            .model_version
            .ok_or(ConfigError::MissingParameter("model_version"))?;
        if model_version.is_empty() {
            return Err(ConfigError::InvalidParameter {
                name: "model_version",
                reason: "must not be empty".to_string(),
            });
        }

        Ok(PipelineConfig {
            models: ModelConfig {
                model_type,
                model_version,
                model_repo_base: self
                    .model_repo_base
                    .ok_or(ConfigError::MissingParameter("model_repo_base"))?,
            },
            max_alignment_range: self
                .max_alignment_range
                .ok_or(ConfigError::MissingParameter("max_alignment_range"))?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn complete_builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder::new()
            .model_type("bp")
            .model_version("0.6")
            .model_repo_base("/data/models")
            .max_alignment_range(20)
    }

    #[test]
    fn build_succeeds_with_all_parameters() {
        let config = complete_builder().build().unwrap();
        assert_eq!(config.models.model_type, "bp");
        assert_eq!(config.models.model_version, "0.6");
        assert_eq!(config.max_alignment_range, 20);
    }

    #[test]
    fn build_reports_first_missing_parameter() {
        let result = PipelineConfigBuilder::new().model_type("bp").build();
        assert_eq!(result, Err(ConfigError::MissingParameter("model_version")));

        let result = PipelineConfigBuilder::new()
            .model_type("bp")
            .model_version("0.6")
            .model_repo_base("/m")
            .build();
        assert_eq!(
            result,
            Err(ConfigError::MissingParameter("max_alignment_range"))
        );
    }

    #[test]
    fn build_rejects_model_type_with_path_separators() {
        let result = complete_builder().model_type("../bp").build();
        assert!(matches!(
            result,
            Err(ConfigError::InvalidParameter {
                name: "model_type",
                ..
            })
        ));
    }

    #[test]
    fn model_dir_is_derived_from_configuration() {
        let config = complete_builder().build().unwrap();
        assert_eq!(
            config.model_dir(LoopCategory::Internal),
            Path::new("/data/models").join("IL").join("0.6")
        );
    }
}
