use super::{LoopScorer, ScoringError};
use crate::core::models::ids::LoopId;
use crate::core::models::query::Loop;
use crate::core::models::result::{LoopResult, Rotation, SequenceResult};
use crate::core::repository::ModelSet;
use serde::Deserialize;
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

#[derive(Debug, Deserialize)]
struct RawScoreRecord {
    loop_id: LoopId,
    seq_id: Option<String>,
    model_id: String,
    score: f64,
    percentile: f64,
    interior_edit_distance: u32,
    full_edit_distance: u32,
    rotation: i64,
    #[serde(default)]
    signature: String,
}

#[derive(Debug, Clone)]
struct ScoreRecord {
    seq_id: Option<String>,
    model_id: String,
    score: f64,
    percentile: f64,
    interior_edit_distance: u32,
    full_edit_distance: u32,
    rotation: Rotation,
    signature: String,
}

/// Replays per-sequence scores exported by an external aligner.
///
/// Expects CSV with the header
/// `loop_id,seq_id,model_id,score,percentile,interior_edit_distance,full_edit_distance,rotation,signature`.
/// One [`LoopResult`] is produced per model of the model set that has rows for the
/// loop, in model-set order; rows keep their file order within a result.
#[derive(Debug, Clone, Default)]
pub struct PrecomputedScorer {
    records: HashMap<LoopId, Vec<ScoreRecord>>,
}

impl PrecomputedScorer {
    pub fn from_path(path: &Path) -> Result<Self, ScoringError> {
        let file = std::fs::File::open(path).map_err(|e| {
            ScoringError::with_source(format!("Cannot open score table {path:?}"), e)
        })?;
        let scorer = Self::from_reader(file)?;
        info!(
            "Loaded precomputed scores for {} loop(s) from {:?}",
            scorer.records.len(),
            path
        );
        Ok(scorer)
    }

    pub fn from_reader(reader: impl Read) -> Result<Self, ScoringError> {
        let mut csv_reader = csv::Reader::from_reader(reader);
        let mut records: HashMap<LoopId, Vec<ScoreRecord>> = HashMap::new();
        for (line, row) in csv_reader.deserialize::<RawScoreRecord>().enumerate() {
            let malformed = || format!("Malformed score record {}", line + 1);
            let raw = row.map_err(|e| ScoringError::with_source(malformed(), e))?;
            let rotation = Rotation::from_int(raw.rotation)
                .map_err(|e| ScoringError::with_source(malformed(), e))?;
            records.entry(raw.loop_id).or_default().push(ScoreRecord {
                seq_id: raw.seq_id,
                model_id: raw.model_id,
                score: raw.score,
                percentile: raw.percentile,
                interior_edit_distance: raw.interior_edit_distance,
                full_edit_distance: raw.full_edit_distance,
                rotation,
                signature: raw.signature,
            });
        }
        Ok(Self { records })
    }

    fn to_sequence_result(lp: &Loop, record: &ScoreRecord) -> SequenceResult {
        SequenceResult {
            query_id: lp.query_id().to_string(),
            sequence_id: record.seq_id.clone(),
            loop_id: lp.id(),
            score: record.score,
            percentile: record.percentile,
            interior_edit_distance: record.interior_edit_distance,
            full_edit_distance: record.full_edit_distance,
            rotation: record.rotation,
            motif_id: record.model_id.clone(),
        }
    }
}

impl LoopScorer for PrecomputedScorer {
    fn score(
        &self,
        lp: &Loop,
        models: &ModelSet,
        max_alignment_range: usize,
    ) -> Result<Vec<LoopResult>, ScoringError> {
        let Some(rows) = self.records.get(&lp.id()) else {
            debug!("No precomputed scores for loop {}", lp.key());
            return Ok(Vec::new());
        };

        let mut results = Vec::new();
        for model in &models.names {
            let model_rows: Vec<&ScoreRecord> =
                rows.iter().filter(|r| &r.model_id == model).collect();
            if model_rows.is_empty() {
                continue;
            }

            let over_range = model_rows
                .iter()
                .filter(|r| {
                    r.interior_edit_distance.max(r.full_edit_distance) as usize
                        > max_alignment_range
                })
                .count();
            if over_range > 0 {
                debug!(
                    "{} row(s) for loop {} / model {} exceed the alignment range of {}",
                    over_range,
                    lp.key(),
                    model,
                    max_alignment_range
                );
            }

            let sequences: Vec<SequenceResult> = model_rows
                .iter()
                .map(|r| Self::to_sequence_result(lp, r))
                .collect();
            let best_rotation = sequences
                .iter()
                .fold(None::<&SequenceResult>, |best, s| match best {
                    Some(b) if b.score >= s.score => Some(b),
                    _ => Some(s),
                })
                .map(|s| s.rotation)
                .unwrap_or_default();
            let signature = model_rows
                .iter()
                .map(|r| r.signature.as_str())
                .find(|s| !s.is_empty())
                .unwrap_or_default()
                .to_string();

            results.push(LoopResult::from_sequences(
                lp.key(),
                model.clone(),
                signature,
                best_rotation,
                sequences,
            ));
        }
        Ok(results)
    }
}
