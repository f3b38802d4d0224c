use crate::core::io::traits::LoadError;
use crate::core::models::ids::LoopId;
use crate::core::repository::ModelLoadError;
use crate::engine::scoring::ScoringError;
use crate::persistence::error::PersistenceError;
use std::path::PathBuf;
use thiserror::Error;

/// Failure of a scoring run.
///
/// None of these variants touch the query's tracking row. A caller that wants the
/// failure recorded must call `ResultSink::mark_failure` itself.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Query loading failed: {0}")]
    Load(#[from] LoadError),

    #[error("Failed to load models from {dir:?}: {source}")]
    Models {
        dir: PathBuf,
        #[source]
        source: ModelLoadError,
    },

    #[error("Scoring failed for loop {loop_id}: {source}")]
    Scoring {
        loop_id: LoopId,
        #[source]
        source: ScoringError,
    },

    #[error("Persistence failed: {0}")]
    Persistence(#[from] PersistenceError),
}
