use super::ids::{LoopId, LoopKey, ModelId, QueryId};
use crate::core::utils::stats;
use thiserror::Error;

/// Stored in place of a sequence id when the scorer did not report one.
pub const MISSING_SEQUENCE_ID: &str = "0";

/// Orientation of the best alignment. Persisted as `0` (forward) or `1` (rotated).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Rotation {
    #[default]
    Forward,
    Rotated,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Invalid rotation indicator {0}; expected 0 or 1")]
pub struct InvalidRotation(pub i64);

impl Rotation {
    pub fn as_int(self) -> i32 {
        match self {
            Rotation::Forward => 0,
            Rotation::Rotated => 1,
        }
    }

    pub fn from_int(value: i64) -> Result<Self, InvalidRotation> {
        match value {
            0 => Ok(Rotation::Forward),
            1 => Ok(Rotation::Rotated),
            other => Err(InvalidRotation(other)),
        }
    }

    pub fn is_rotated(self) -> bool {
        self == Rotation::Rotated
    }
}

impl From<bool> for Rotation {
    fn from(rotated: bool) -> Self {
        if rotated {
            Rotation::Rotated
        } else {
            Rotation::Forward
        }
    }
}

/// Score of a single sequence instance against one model.
#[derive(Debug, Clone, PartialEq)]
pub struct SequenceResult {
    pub query_id: QueryId,
    pub sequence_id: Option<String>,
    pub loop_id: LoopId,
    pub score: f64,
    pub percentile: f64,
    pub interior_edit_distance: u32,
    pub full_edit_distance: u32,
    pub rotation: Rotation,
    pub motif_id: ModelId,
}

impl SequenceResult {
    /// The id written to storage: the reported id, or [`MISSING_SEQUENCE_ID`] when absent or empty.
    pub fn effective_sequence_id(&self) -> &str {
        match self.sequence_id.as_deref() {
            Some(id) if !id.is_empty() => id,
            _ => MISSING_SEQUENCE_ID,
        }
    }
}

/// Mean or median over the sequence results of one loop/model pairing.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScoreSummary {
    pub score: f64,
    pub percentile: f64,
    pub interior_edit_distance: f64,
    pub full_edit_distance: f64,
}

/// Aggregate result of scoring one loop against one model.
#[derive(Debug, Clone, PartialEq)]
pub struct LoopResult {
    pub loop_key: LoopKey,
    pub model_id: ModelId,
    pub mean: ScoreSummary,
    pub median: ScoreSummary,
    pub signature: String,
    pub best_rotation: Rotation,
    pub sequence_results: Vec<SequenceResult>,
}

impl LoopResult {
    /// Builds a result whose mean and median summaries are computed from `sequence_results`.
    /// The order of `sequence_results` is kept as given.
    pub fn from_sequences(
        loop_key: LoopKey,
        model_id: impl Into<ModelId>,
        signature: impl Into<String>,
        best_rotation: Rotation,
        sequence_results: Vec<SequenceResult>,
    ) -> Self {
        let column = |f: fn(&SequenceResult) -> f64| -> Vec<f64> {
            sequence_results.iter().map(f).collect()
        };
        let scores = column(|s| s.score);
        let percentiles = column(|s| s.percentile);
        let interior = column(|s| f64::from(s.interior_edit_distance));
        let full = column(|s| f64::from(s.full_edit_distance));

        let mean = ScoreSummary {
            score: stats::mean(&scores),
            percentile: stats::mean(&percentiles),
            interior_edit_distance: stats::mean(&interior),
            full_edit_distance: stats::mean(&full),
        };
        let median = ScoreSummary {
            score: stats::median(&scores),
            percentile: stats::median(&percentiles),
            interior_edit_distance: stats::median(&interior),
            full_edit_distance: stats::median(&full),
        };

        Self {
            loop_key,
            model_id: model_id.into(),
            mean,
            median,
            signature: signature.into(),
            best_rotation,
            sequence_results,
        }
    }

    pub fn query_id(&self) -> &str {
        &self.loop_key.query_id
    }

    pub fn loop_id(&self) -> LoopId {
        self.loop_key.loop_id
    }
}
