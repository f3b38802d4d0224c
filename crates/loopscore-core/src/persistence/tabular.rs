use super::error::PersistenceError;
use super::{ResultSink, RunStamp};
use crate::core::models::result::{LoopResult, SequenceResult};
use serde::Serialize;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use tracing::{debug, info, warn};

pub const LOOP_RESULTS_FILE: &str = "loop_results.csv";
pub const SEQUENCE_RESULTS_FILE: &str = "loop_instance_results.csv";

const LOOP_COLUMNS: [&str; 13] = [
    "query_id",
    "loop_id",
    "model_id",
    "mean_score",
    "mean_percentile",
    "mean_interior_edit_distance",
    "mean_full_edit_distance",
    "median_score",
    "median_percentile",
    "median_interior_edit_distance",
    "median_full_edit_distance",
    "signature",
    "rotation",
];

const SEQUENCE_COLUMNS: [&str; 9] = [
    "query_id",
    "seq_id",
    "loop_id",
    "score",
    "percentile",
    "interior_edit_distance",
    "full_edit_distance",
    "rotation",
    "model_id",
];

#[derive(Serialize)]
struct LoopRow<'a> {
    query_id: &'a str,
    loop_id: i64,
    model_id: &'a str,
    mean_score: f64,
    mean_percentile: f64,
    mean_interior_edit_distance: f64,
    mean_full_edit_distance: f64,
    median_score: f64,
    median_percentile: f64,
    median_interior_edit_distance: f64,
    median_full_edit_distance: f64,
    signature: &'a str,
    rotation: i32,
}

impl<'a> From<&'a LoopResult> for LoopRow<'a> {
    fn from(r: &'a LoopResult) -> Self {
        Self {
            query_id: &r.loop_key.query_id,
            loop_id: r.loop_key.loop_id,
            model_id: &r.model_id,
            mean_score: r.mean.score,
            mean_percentile: r.mean.percentile,
            mean_interior_edit_distance: r.mean.interior_edit_distance,
            mean_full_edit_distance: r.mean.full_edit_distance,
            median_score: r.median.score,
            median_percentile: r.median.percentile,
            median_interior_edit_distance: r.median.interior_edit_distance,
            median_full_edit_distance: r.median.full_edit_distance,
            signature: &r.signature,
            rotation: r.best_rotation.as_int(),
        }
    }
}

#[derive(Serialize)]
struct SequenceRow<'a> {
    query_id: &'a str,
    seq_id: &'a str,
    loop_id: i64,
    score: f64,
    percentile: f64,
    interior_edit_distance: u32,
    full_edit_distance: u32,
    rotation: i32,
    model_id: &'a str,
}

impl<'a> From<&'a SequenceResult> for SequenceRow<'a> {
    fn from(s: &'a SequenceResult) -> Self {
        Self {
            query_id: &s.query_id,
            seq_id: s.effective_sequence_id(),
            loop_id: s.loop_id,
            score: s.score,
            percentile: s.percentile,
            interior_edit_distance: s.interior_edit_distance,
            full_edit_distance: s.full_edit_distance,
            rotation: s.rotation.as_int(),
            model_id: &s.motif_id,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SinkState {
    Fresh,
    HeaderWritten,
    Closed,
}

/// Writes loop results and sequence results to two delimited files.
///
/// Files carry no tracking rows, so status marking is logged and otherwise ignored.
pub struct CsvSink<W: Write> {
    loops: csv::Writer<W>,
    sequences: csv::Writer<W>,
    state: SinkState,
}

impl CsvSink<File> {
    /// Creates `loop_results.csv` and `loop_instance_results.csv` in `dir`.
    pub fn create(dir: &Path) -> Result<Self, PersistenceError> {
        let open = |name: &str| {
            let path = dir.join(name);
            File::create(&path).map_err(|e| PersistenceError::Io {
                context: format!("Could not create {path:?}"),
                source: e,
            })
        };
        let sink = Self::from_writers(open(LOOP_RESULTS_FILE)?, open(SEQUENCE_RESULTS_FILE)?);
        info!("Writing results as CSV into {:?}", dir);
        Ok(sink)
    }
}

impl<W: Write> CsvSink<W> {
    pub fn from_writers(loops: W, sequences: W) -> Self {
        let writer = |w: W| csv::WriterBuilder::new().has_headers(false).from_writer(w);
        Self {
            loops: writer(loops),
            sequences: writer(sequences),
            state: SinkState::Fresh,
        }
    }

    /// Flushes both writers and hands back the underlying outputs.
    pub fn into_inner(self) -> Result<(W, W), PersistenceError> {
        let unwrap = |w: csv::Writer<W>| {
            w.into_inner().map_err(|e| PersistenceError::Io {
                context: "Could not flush CSV output".to_string(),
                source: e.into_error(),
            })
        };
        Ok((unwrap(self.loops)?, unwrap(self.sequences)?))
    }

    fn ensure_writable(&self) -> Result<(), PersistenceError> {
        match self.state {
            SinkState::Fresh => Err(PersistenceError::OutOfOrder(
                "results saved before the header was written",
            )),
            SinkState::HeaderWritten => Ok(()),
            SinkState::Closed => Err(PersistenceError::Unavailable),
        }
    }
}

impl<W: Write> ResultSink for CsvSink<W> {
    fn write_header(&mut self) -> Result<(), PersistenceError> {
        match self.state {
            SinkState::Fresh => {}
            SinkState::HeaderWritten => {
                return Err(PersistenceError::OutOfOrder("header written twice"));
            }
            SinkState::Closed => return Err(PersistenceError::Unavailable),
        }
        self.loops
            .write_record(LOOP_COLUMNS)
            .map_err(|e| PersistenceError::csv("Could not write loop header", e))?;
        self.sequences
            .write_record(SEQUENCE_COLUMNS)
            .map_err(|e| PersistenceError::csv("Could not write sequence header", e))?;
        self.state = SinkState::HeaderWritten;
        Ok(())
    }

    fn save(&mut self, result: &LoopResult, _stamp: &RunStamp) -> Result<(), PersistenceError> {
        self.ensure_writable()?;
        for sequence in &result.sequence_results {
            self.sequences
                .serialize(SequenceRow::from(sequence))
                .map_err(|e| {
                    PersistenceError::csv(
                        format!(
                            "Could not write sequence '{}' of loop {}",
                            sequence.effective_sequence_id(),
                            result.loop_key
                        ),
                        e,
                    )
                })?;
        }
        self.loops.serialize(LoopRow::from(result)).map_err(|e| {
            PersistenceError::csv(
                format!(
                    "Could not write result of loop {} for model '{}'",
                    result.loop_key, result.model_id
                ),
                e,
            )
        })
    }

    fn mark_all_done(&mut self, query_id: &str, _stamp: &RunStamp) -> Result<(), PersistenceError> {
        debug!("CSV output has no status rows; query '{}' done.", query_id);
        Ok(())
    }

    fn mark_failure(&mut self, query_id: &str, _stamp: &RunStamp) -> Result<(), PersistenceError> {
        warn!("CSV output has no status rows; query '{}' failed.", query_id);
        Ok(())
    }

    fn clean_up(&mut self) {
        if self.state == SinkState::Closed {
            return;
        }
        self.state = SinkState::Closed;
        for (name, result) in [
            (LOOP_RESULTS_FILE, self.loops.flush()),
            (SEQUENCE_RESULTS_FILE, self.sequences.flush()),
        ] {
            if let Err(e) = result {
                warn!("Failed to flush {}: {}", name, e);
            }
        }
    }
}
