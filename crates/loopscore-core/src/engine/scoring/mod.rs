//! Scoring contract and category dispatch.
//!
//! The alignment itself lives outside this crate. A [`LoopScorer`] turns one loop
//! and a model set into one [`LoopResult`] per model it aligned against, and the
//! [`registry::ScorerRegistry`] decides which scorer, if any, handles a loop category.

pub mod precomputed;
pub mod registry;

use crate::core::models::query::Loop;
use crate::core::models::result::LoopResult;
use crate::core::repository::ModelSet;
use thiserror::Error;

#[derive(Debug, Error)]
#[error("{message}")]
pub struct ScoringError {
    message: String,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
}

impl ScoringError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

pub trait LoopScorer {
    /// Scores every sequence instance of `lp` against the models in `models`.
    ///
    /// The returned list holds one result per model; within a result the sequence
    /// results keep the order in which they were scored.
    fn score(
        &self,
        lp: &Loop,
        models: &ModelSet,
        max_alignment_range: usize,
    ) -> Result<Vec<LoopResult>, ScoringError>;
}

impl<F> LoopScorer for F
where
    F: Fn(&Loop, &ModelSet, usize) -> Result<Vec<LoopResult>, ScoringError>,
{
    fn score(
        &self,
        lp: &Loop,
        models: &ModelSet,
        max_alignment_range: usize,
    ) -> Result<Vec<LoopResult>, ScoringError> {
        self(lp, models, max_alignment_range)
    }
}
