use super::{ModelGroup, ModelLoadError, ModelRepository};
use crate::core::models::ids::{ModelId, ModelName};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

/// Treats every `<name>.<model_type>` file in a version directory as one model.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsModelRepository;

impl FsModelRepository {
    pub fn new() -> Self {
        Self
    }

    fn scan(dir: &Path, model_type: &str) -> Result<Vec<(ModelName, PathBuf)>, ModelLoadError> {
        let io_err = |e: std::io::Error| ModelLoadError::Io {
            path: dir.to_string_lossy().to_string(),
            source: e,
        };
        let suffix = format!(".{model_type}");

        let mut models = Vec::new();
        for entry in std::fs::read_dir(dir).map_err(io_err)? {
            let entry = entry.map_err(io_err)?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
                return Err(ModelLoadError::InvalidEntry {
                    path: path.to_string_lossy().to_string(),
                    message: "file name is not valid UTF-8".to_string(),
                });
            };
            match file_name.strip_suffix(&suffix) {
                Some(name) if !name.is_empty() => models.push((name.to_string(), path.clone())),
                _ => trace!("Skipping non-model file {:?}", path),
            }
        }
        models.sort_by(|a, b| a.0.cmp(&b.0));
        debug!(
            "Found {} '{}' model(s) in {:?}",
            models.len(),
            model_type,
            dir
        );
        Ok(models)
    }
}

impl ModelRepository for FsModelRepository {
    fn list_models(&self, dir: &Path, model_type: &str) -> Result<Vec<ModelName>, ModelLoadError> {
        Ok(Self::scan(dir, model_type)?
            .into_iter()
            .map(|(name, _)| name)
            .collect())
    }

    fn load_model_groups(
        &self,
        dir: &Path,
        model_type: &str,
    ) -> Result<HashMap<ModelId, ModelGroup>, ModelLoadError> {
        Ok(Self::scan(dir, model_type)?
            .into_iter()
            .map(|(name, path)| {
                let group = ModelGroup {
                    id: name.clone(),
                    model_type: model_type.to_string(),
                    path,
                };
                (name, group)
            })
            .collect())
    }
}
