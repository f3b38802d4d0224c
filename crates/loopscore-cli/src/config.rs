mod defaults;

pub use defaults::DefaultsConfig;

use crate::cli::RunArgs;
use crate::error::{CliError, Result};
use loopscore::engine::config::{PipelineConfig, PipelineConfigBuilder};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct PartialModelsConfig {
    model_type: Option<String>,
    model_version: Option<String>,
    repository: Option<PathBuf>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct PartialScoringConfig {
    max_alignment_range: Option<usize>,
    score_table: Option<PathBuf>,
}

/// A run configuration as read from TOML; every field may be left out.
///
/// ```toml
/// [models]
/// model-type = "bp"
/// model-version = "0.6"
/// repository = "/data/motif-models"
///
/// [scoring]
/// max-alignment-range = 20
/// score-table = "scores.csv"
/// ```
#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
pub struct PartialRunConfig {
    models: Option<PartialModelsConfig>,
    scoring: Option<PartialScoringConfig>,
}

/// Fully resolved settings for the `run` command.
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    pub pipeline: PipelineConfig,
    pub score_table: Option<PathBuf>,
}

impl PartialRunConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })
    }

    /// Command-line values win over `--set` values, which win over the file, which
    /// wins over `defaults`.
    pub fn merge_with_cli(mut self, args: &RunArgs, defaults: &DefaultsConfig) -> Result<RunConfig> {
        self.apply_set_values(&args.set_values)?;

        let models = self.models.take().unwrap_or_default();
        let scoring = self.scoring.take().unwrap_or_default();

        let model_repo_base = args
            .model_repo
            .clone()
            .or(models.repository)
            .ok_or_else(|| {
                CliError::Config(
                    "A model repository is required either as `models.repository` in the config file or via --model-repo."
                        .to_string(),
                )
            })?;

        let pipeline = PipelineConfigBuilder::new()
            .model_type(
                args.model_type
                    .clone()
                    .or(models.model_type)
                    .unwrap_or_else(|| defaults.model_type.clone()),
            )
            .model_version(
                args.model_version
                    .clone()
                    .or(models.model_version)
                    .unwrap_or_else(|| defaults.model_version.clone()),
            )
            .model_repo_base(model_repo_base)
            .max_alignment_range(
                args.max_alignment_range
                    .or(scoring.max_alignment_range)
                    .unwrap_or(defaults.max_alignment_range),
            )
            .build()
            .map_err(|e| CliError::Config(e.to_string()))?;

        Ok(RunConfig {
            pipeline,
            score_table: args.score_table.clone().or(scoring.score_table),
        })
    }

    fn apply_set_values(&mut self, set_values: &[String]) -> Result<()> {
        for kv_pair in set_values {
            let Some((key, value)) = kv_pair.split_once('=') else {
                return Err(CliError::Config(format!(
                    "Invalid --set format: '{}'. Expected KEY=VALUE.",
                    kv_pair
                )));
            };

            match key {
                "models.model-type" => {
                    self.models.get_or_insert_with(Default::default).model_type =
                        Some(value.to_string());
                }
                "models.model-version" => {
                    self.models.get_or_insert_with(Default::default).model_version =
                        Some(value.to_string());
                }
                "models.repository" => {
                    self.models.get_or_insert_with(Default::default).repository =
                        Some(PathBuf::from(value));
                }
                "scoring.max-alignment-range" => {
                    self.scoring
                        .get_or_insert_with(Default::default)
                        .max_alignment_range = Some(value.parse().map_err(|_| {
                        CliError::Config(format!("Invalid integer value for {}: {}", key, value))
                    })?);
                }
                "scoring.score-table" => {
                    self.scoring.get_or_insert_with(Default::default).score_table =
                        Some(PathBuf::from(value));
                }
                _ => {
                    return Err(CliError::Config(format!(
                        "Unsupported configuration key for --set: '{}'",
                        key
                    )));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Commands};
    use clap::Parser;
    use std::fs;
    use tempfile::{TempDir, tempdir};

    fn write_config_file(dir: &TempDir, content: &str) -> PathBuf {
        let file_path = dir.path().join("run.toml");
        fs::write(&file_path, content).unwrap();
        file_path
    }

    fn run_args(extra: &[&str]) -> RunArgs {
        let mut args = vec!["loopscore", "run", "Q1", "-Q", "queries", "-d", "results.db"];
        args.extend_from_slice(extra);
        match Cli::parse_from(args).command {
            Commands::Run(run_args) => run_args,
            _ => panic!("Expected 'run' subcommand"),
        }
    }

    #[test]
    fn file_values_fill_in_over_defaults() {
        let dir = tempdir().unwrap();
        let config_path = write_config_file(
            &dir,
            r#"
            [models]
            repository = "/data/models"
            model-version = "1.1"

            [scoring]
            score-table = "scores.csv"
            "#,
        );

        let config = PartialRunConfig::from_file(&config_path)
            .unwrap()
            .merge_with_cli(&run_args(&[]), &DefaultsConfig::default())
            .unwrap();

        assert_eq!(config.pipeline.models.model_type, "bp");
        assert_eq!(config.pipeline.models.model_version, "1.1");
        assert_eq!(
            config.pipeline.models.model_repo_base,
            PathBuf::from("/data/models")
        );
        assert_eq!(config.pipeline.max_alignment_range, 20);
        assert_eq!(config.score_table, Some(PathBuf::from("scores.csv")));
    }

    #[test]
    fn cli_args_override_file_values() {
        let dir = tempdir().unwrap();
        let config_path = write_config_file(
            &dir,
            r#"
            [models]
            repository = "/data/models"
            model-type = "bp"

            [scoring]
            max-alignment-range = 10 # Will be overridden
            "#,
        );

        let args = run_args(&["--model-type", "hmm", "-r", "35", "-m", "/other/models"]);
        let config = PartialRunConfig::from_file(&config_path)
            .unwrap()
            .merge_with_cli(&args, &DefaultsConfig::default())
            .unwrap();

        assert_eq!(config.pipeline.models.model_type, "hmm");
        assert_eq!(config.pipeline.max_alignment_range, 35);
        assert_eq!(
            config.pipeline.models.model_repo_base,
            PathBuf::from("/other/models")
        );
    }

    #[test]
    fn set_values_override_the_file() {
        let dir = tempdir().unwrap();
        let config_path = write_config_file(
            &dir,
            r#"
            [models]
            repository = "/data/models"

            [scoring]
            max-alignment-range = 10
            "#,
        );

        let args = run_args(&[
            "-S",
            "scoring.max-alignment-range=25",
            "-S",
            "models.model-version=0.7",
        ]);
        let config = PartialRunConfig::from_file(&config_path)
            .unwrap()
            .merge_with_cli(&args, &DefaultsConfig::default())
            .unwrap();

        assert_eq!(config.pipeline.max_alignment_range, 25);
        assert_eq!(config.pipeline.models.model_version, "0.7");
    }

    #[test]
    fn missing_model_repository_is_a_config_error() {
        let result = PartialRunConfig::default()
            .merge_with_cli(&run_args(&[]), &DefaultsConfig::default());
        assert!(matches!(result, Err(CliError::Config(msg)) if msg.contains("model repository")));
    }

    #[test]
    fn malformed_set_values_are_rejected() {
        let args = run_args(&["-m", "/data/models", "-S", "scoring.max-alignment-range"]);
        assert!(matches!(
            PartialRunConfig::default().merge_with_cli(&args, &DefaultsConfig::default()),
            Err(CliError::Config(_))
        ));

        let args = run_args(&["-m", "/data/models", "-S", "scoring.threads=4"]);
        assert!(matches!(
            PartialRunConfig::default().merge_with_cli(&args, &DefaultsConfig::default()),
            Err(CliError::Config(msg)) if msg.contains("Unsupported")
        ));
    }

    #[test]
    fn unknown_file_keys_are_parse_errors() {
        let dir = tempdir().unwrap();
        let config_path = write_config_file(&dir, "[models]\nrepo = \"/data\"\n");
        assert!(matches!(
            PartialRunConfig::from_file(&config_path),
            Err(CliError::FileParsing { .. })
        ));
    }

    #[test]
    fn invalid_model_type_surfaces_builder_error() {
        let args = run_args(&["-m", "/data/models", "--model-type", "b.p"]);
        assert!(matches!(
            PartialRunConfig::default().merge_with_cli(&args, &DefaultsConfig::default()),
            Err(CliError::Config(_))
        ));
    }
}
