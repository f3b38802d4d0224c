use super::error::PersistenceError;
use super::schema::{self, PREPARED_STATEMENTS};
use super::{ResultSink, RunStamp};
use crate::core::models::query::Query;
use crate::core::models::result::{LoopResult, Rotation, SequenceResult};
use chrono::{DateTime, Utc};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef};
use rusqlite::{Connection, OptionalExtension, ToSql, params};
use std::path::Path;
use tracing::{debug, info, trace, warn};

/// Value written to `loop_results.correspondences`; correspondences are not produced yet.
pub const CORRESPONDENCES_PLACEHOLDER: &str = "Intentionally left empty.";

impl ToSql for Rotation {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_int()))
    }
}

impl FromSql for Rotation {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let raw = i64::column_result(value)?;
        Rotation::from_int(raw).map_err(|e| FromSqlError::Other(Box::new(e)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryStatus {
    Pending,
    Done,
    Failed,
}

impl QueryStatus {
    pub fn code(self) -> i32 {
        match self {
            QueryStatus::Pending => 0,
            QueryStatus::Done => 1,
            QueryStatus::Failed => -1,
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(QueryStatus::Pending),
            1 => Some(QueryStatus::Done),
            -1 => Some(QueryStatus::Failed),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryStatusRecord {
    pub status: QueryStatus,
    pub time_completed: Option<DateTime<Utc>>,
}

/// Result sink backed by a SQLite database.
///
/// The connection is opened and every write statement prepared when the sink is
/// constructed; the prepared statements stay in the connection's statement cache
/// until [`ResultSink::clean_up`] releases the connection. The sink is meant for
/// a single calling thread.
///
/// Writes are not transactional. Each sequence result is an insert followed by a
/// separate status update, so a failure between the two leaves the result row
/// without an updated status row. A failing [`ResultSink::save`] leaves the rows
/// it already wrote in place, and nothing is retried.
pub struct SqliteSink {
    conn: Option<Connection>,
}

impl SqliteSink {
    /// Opens an existing result store. The schema must already exist.
    pub fn open(path: &Path) -> Result<Self, PersistenceError> {
        let conn = Connection::open(path).map_err(|e| {
            PersistenceError::store(format!("Could not open result store {path:?}"), e)
        })?;
        info!("Opened result store {:?}", path);
        Self::from_connection(conn)
    }

    /// Opens a result store, creating the schema first if necessary.
    pub fn create(path: &Path) -> Result<Self, PersistenceError> {
        let conn = Connection::open(path).map_err(|e| {
            PersistenceError::store(format!("Could not open result store {path:?}"), e)
        })?;
        schema::create_schema(&conn)?;
        info!("Opened result store {:?} (schema ensured)", path);
        Self::from_connection(conn)
    }

    pub fn from_connection(conn: Connection) -> Result<Self, PersistenceError> {
        for sql in PREPARED_STATEMENTS {
            conn.prepare_cached(sql)
                .map_err(|e| PersistenceError::store("Could not prepare statement", e))?;
        }
        Ok(Self { conn: Some(conn) })
    }

    pub fn is_open(&self) -> bool {
        self.conn.is_some()
    }

    fn connection(&self) -> Result<&Connection, PersistenceError> {
        self.conn.as_ref().ok_or(PersistenceError::Unavailable)
    }

    /// Inserts pending tracking rows for `query` and each of its sequence instances.
    /// Rows that already exist are left untouched.
    pub fn register_query(&mut self, query: &Query) -> Result<(), PersistenceError> {
        let conn = self.connection()?;
        let context = || format!("Could not register query '{}'", query.id());
        let tx = conn
            .unchecked_transaction()
            .map_err(|e| PersistenceError::store(context(), e))?;

        tx.execute(schema::REGISTER_QUERY_SQL, params![query.id()])
            .map_err(|e| PersistenceError::store(context(), e))?;
        let mut sequences = 0;
        for lp in query {
            for seq in lp.sequences() {
                tx.execute(
                    schema::REGISTER_SEQUENCE_SQL,
                    params![query.id(), seq.effective_id(), lp.id()],
                )
                .map_err(|e| PersistenceError::store(context(), e))?;
                sequences += 1;
            }
        }
        tx.commit()
            .map_err(|e| PersistenceError::store(context(), e))?;

        debug!(
            "Registered query '{}' with {} tracked sequence(s).",
            query.id(),
            sequences
        );
        Ok(())
    }

    /// Reads the tracking row of `query_id`, if there is one.
    pub fn query_status(
        &self,
        query_id: &str,
    ) -> Result<Option<QueryStatusRecord>, PersistenceError> {
        let conn = self.connection()?;
        let row: Option<(i64, Option<DateTime<Utc>>)> = conn
            .query_row(schema::SELECT_QUERY_STATUS_SQL, params![query_id], |row| {
                Ok((row.get(0)?, row.get(1)?))
            })
            .optional()
            .map_err(|e| {
                PersistenceError::store(format!("Could not read status of '{query_id}'"), e)
            })?;

        row.map(|(code, time_completed)| {
            let status = QueryStatus::from_code(code).ok_or_else(|| {
                PersistenceError::InvalidData(format!(
                    "query '{query_id}' has unknown status {code}"
                ))
            })?;
            Ok(QueryStatusRecord {
                status,
                time_completed,
            })
        })
        .transpose()
    }

    fn save_sequence_result(
        conn: &Connection,
        result: &SequenceResult,
        stamp: &RunStamp,
    ) -> Result<(), PersistenceError> {
        let seq_id = result.effective_sequence_id();
        let context = || {
            format!(
                "Could not save sequence '{}' of loop {} in query '{}'",
                seq_id, result.loop_id, result.query_id
            )
        };

        let count = conn
            .prepare_cached(schema::INSERT_SEQUENCE_RESULT_SQL)
            .and_then(|mut stmt| {
                stmt.execute(params![
                    result.query_id,
                    seq_id,
                    result.loop_id,
                    result.score,
                    result.percentile,
                    result.interior_edit_distance,
                    result.full_edit_distance,
                    result.rotation,
                    result.motif_id,
                ])
            })
            .map_err(|e| PersistenceError::store(context(), e))?;
        if count == 0 {
            return Err(PersistenceError::NoRowsAffected { context: context() });
        }

        let updated = conn
            .prepare_cached(schema::UPDATE_SEQUENCE_STATUS_SQL)
            .and_then(|mut stmt| {
                stmt.execute(params![stamp.time(), result.query_id, seq_id, result.loop_id])
            })
            .map_err(|e| PersistenceError::store(context(), e))?;
        if updated == 0 {
            trace!(
                "No tracking row for sequence '{}' of loop {} in query '{}'",
                seq_id, result.loop_id, result.query_id
            );
        }
        Ok(())
    }

    fn set_query_status(
        &self,
        query_id: &str,
        status: QueryStatus,
        stamp: &RunStamp,
    ) -> Result<(), PersistenceError> {
        let conn = self.connection()?;
        let updated = conn
            .prepare_cached(schema::UPDATE_QUERY_STATUS_SQL)
            .and_then(|mut stmt| stmt.execute(params![status.code(), stamp.time(), query_id]))
            .map_err(|e| {
                PersistenceError::store(
                    format!("Could not mark query '{query_id}' as {status:?}"),
                    e,
                )
            })?;
        if updated == 0 {
            warn!("Query '{}' has no tracking row; status not recorded.", query_id);
        } else {
            debug!("Marked query '{}' as {:?}.", query_id, status);
        }
        Ok(())
    }
}

impl ResultSink for SqliteSink {
    // Relational stores have no header.
    fn write_header(&mut self) -> Result<(), PersistenceError> {
        self.connection().map(|_| ())
    }

    fn save(&mut self, result: &LoopResult, stamp: &RunStamp) -> Result<(), PersistenceError> {
        let conn = self.connection()?;
        for sequence in &result.sequence_results {
            Self::save_sequence_result(conn, sequence, stamp)?;
        }

        let context = || {
            format!(
                "Could not save result of loop {} for model '{}'",
                result.loop_key, result.model_id
            )
        };
        let count = conn
            .prepare_cached(schema::INSERT_LOOP_RESULT_SQL)
            .and_then(|mut stmt| {
                stmt.execute(params![
                    result.loop_key.query_id,
                    result.loop_key.loop_id,
                    result.model_id,
                    result.mean.score,
                    result.mean.percentile,
                    result.mean.interior_edit_distance,
                    result.mean.full_edit_distance,
                    result.median.score,
                    result.median.percentile,
                    result.median.interior_edit_distance,
                    result.median.full_edit_distance,
                    result.signature,
                    result.best_rotation,
                    CORRESPONDENCES_PLACEHOLDER,
                ])
            })
            .map_err(|e| PersistenceError::store(context(), e))?;
        if count == 0 {
            return Err(PersistenceError::NoRowsAffected { context: context() });
        }

        debug!(
            "Saved loop {} / model '{}' with {} sequence result(s).",
            result.loop_key,
            result.model_id,
            result.sequence_results.len()
        );
        Ok(())
    }

    fn mark_all_done(&mut self, query_id: &str, stamp: &RunStamp) -> Result<(), PersistenceError> {
        self.set_query_status(query_id, QueryStatus::Done, stamp)
    }

    fn mark_failure(&mut self, query_id: &str, stamp: &RunStamp) -> Result<(), PersistenceError> {
        self.set_query_status(query_id, QueryStatus::Failed, stamp)
    }

    fn clean_up(&mut self) {
        let Some(conn) = self.conn.take() else {
            return;
        };
        match conn.close() {
            Ok(()) => debug!("Closed result store connection."),
            Err((_, e)) => warn!("Failed to close result store connection: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::ids::LoopKey;
    use crate::core::models::query::{LoopCategory, LoopSequence};
    use chrono::TimeZone;

    fn stamp(hour: u32) -> RunStamp {
        RunStamp::at(Utc.with_ymd_and_hms(2024, 3, 14, hour, 0, 0).unwrap())
    }

    fn memory_sink() -> SqliteSink {
        let conn = Connection::open_in_memory().unwrap();
        schema::create_schema(&conn).unwrap();
        SqliteSink::from_connection(conn).unwrap()
    }

    fn count(sink: &SqliteSink, table: &str) -> i64 {
        sink.connection()
            .unwrap()
            .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |r| r.get(0))
            .unwrap()
    }

    fn sequence(id: Option<&str>, rotation: Rotation) -> SequenceResult {
        SequenceResult {
            query_id: "Q1".to_string(),
            sequence_id: id.map(str::to_string),
            loop_id: 1,
            score: 3.5,
            percentile: 0.8,
            interior_edit_distance: 1,
            full_edit_distance: 2,
            rotation,
            motif_id: "IL_001".to_string(),
        }
    }

    fn loop_result(sequences: Vec<SequenceResult>) -> LoopResult {
        LoopResult::from_sequences(
            LoopKey::new("Q1", 1),
            "IL_001",
            "cWW-cWW",
            Rotation::Rotated,
            sequences,
        )
    }

    fn registered_query() -> Query {
        let mut query = Query::new("Q1");
        query
            .add_loop(
                1,
                LoopCategory::Internal,
                vec![LoopSequence::new("s1", "CAG*CUG"), LoopSequence::new("s2", "CGG*CCG")],
            )
            .unwrap();
        query
    }

    #[test]
    fn from_connection_fails_without_schema() {
        let conn = Connection::open_in_memory().unwrap();
        let result = SqliteSink::from_connection(conn);
        assert!(matches!(result, Err(PersistenceError::Store { .. })));
    }

    #[test]
    fn save_writes_instance_rows_status_updates_and_one_aggregate() {
        let mut sink = memory_sink();
        sink.register_query(&registered_query()).unwrap();

        let result = loop_result(vec![
            sequence(Some("s1"), Rotation::Forward),
            sequence(Some("s2"), Rotation::Rotated),
        ]);
        sink.save(&result, &stamp(9)).unwrap();

        assert_eq!(count(&sink, "loop_instance_results"), 2);
        assert_eq!(count(&sink, "loop_results"), 1);
        let done: i64 = sink
            .connection()
            .unwrap()
            .query_row(
                "SELECT COUNT(*) FROM query_sequences WHERE status = 1 AND time_completed = ?1",
                params![stamp(9).time()],
                |r| r.get(0),
            )
            .unwrap();
        assert_eq!(done, 2);
    }

    #[test]
    fn save_with_no_sequence_results_writes_only_the_aggregate() {
        let mut sink = memory_sink();
        sink.save(&loop_result(Vec::new()), &stamp(9)).unwrap();
        assert_eq!(count(&sink, "loop_instance_results"), 0);
        assert_eq!(count(&sink, "loop_results"), 1);
    }

    #[test]
    fn rotation_is_stored_as_zero_or_one() {
        let mut sink = memory_sink();
        let result = loop_result(vec![
            sequence(Some("s1"), Rotation::Forward),
            sequence(Some("s2"), Rotation::Rotated),
        ]);
        sink.save(&result, &stamp(9)).unwrap();

        let conn = sink.connection().unwrap();
        let mut stmt = conn
            .prepare("SELECT rotation FROM loop_instance_results ORDER BY seq_id")
            .unwrap();
        let stored: Vec<Rotation> = stmt
            .query_map([], |r| r.get(0))
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(stored, vec![Rotation::Forward, Rotation::Rotated]);

        let raw: i64 = conn
            .query_row("SELECT rotation FROM loop_results", [], |r| r.get(0))
            .unwrap();
        assert_eq!(raw, 1);
    }

    #[test]
    fn missing_sequence_id_is_stored_as_sentinel() {
        let mut sink = memory_sink();
        sink.save(&loop_result(vec![sequence(None, Rotation::Forward)]), &stamp(9))
            .unwrap();
        let seq_id: String = sink
            .connection()
            .unwrap()
            .query_row("SELECT seq_id FROM loop_instance_results", [], |r| r.get(0))
            .unwrap();
        assert_eq!(seq_id, "0");
    }

    #[test]
    fn aggregate_row_carries_placeholder_correspondences() {
        let mut sink = memory_sink();
        sink.save(&loop_result(Vec::new()), &stamp(9)).unwrap();
        let value: String = sink
            .connection()
            .unwrap()
            .query_row("SELECT correspondences FROM loop_results", [], |r| r.get(0))
            .unwrap();
        assert_eq!(value, CORRESPONDENCES_PLACEHOLDER);
    }

    #[test]
    fn mark_all_done_and_mark_failure_are_last_write_wins() {
        let mut sink = memory_sink();
        sink.register_query(&registered_query()).unwrap();

        sink.mark_all_done("Q1", &stamp(8)).unwrap();
        sink.mark_all_done("Q1", &stamp(9)).unwrap();
        let record = sink.query_status("Q1").unwrap().unwrap();
        assert_eq!(record.status, QueryStatus::Done);
        assert_eq!(record.time_completed, Some(stamp(9).time()));

        sink.mark_failure("Q1", &stamp(10)).unwrap();
        sink.mark_failure("Q1", &stamp(11)).unwrap();
        let record = sink.query_status("Q1").unwrap().unwrap();
        assert_eq!(record.status, QueryStatus::Failed);
        assert_eq!(record.time_completed, Some(stamp(11).time()));
    }

    #[test]
    fn register_query_creates_pending_rows_once() {
        let mut sink = memory_sink();
        let query = registered_query();
        sink.register_query(&query).unwrap();
        sink.mark_failure("Q1", &stamp(7)).unwrap();
        sink.register_query(&query).unwrap();

        assert_eq!(count(&sink, "query_sequences"), 2);
        let record = sink.query_status("Q1").unwrap().unwrap();
        assert_eq!(record.status, QueryStatus::Failed);
    }

    #[test]
    fn query_status_is_none_for_unknown_query() {
        let sink = memory_sink();
        assert_eq!(sink.query_status("nope").unwrap(), None);
    }

    #[test]
    fn marking_an_unregistered_query_is_not_an_error() {
        let mut sink = memory_sink();
        sink.mark_all_done("unknown", &stamp(9)).unwrap();
        assert_eq!(count(&sink, "query_info"), 0);
    }

    #[test]
    fn calls_after_clean_up_report_unavailable_store() {
        let mut sink = memory_sink();
        sink.clean_up();
        assert!(!sink.is_open());
        assert!(matches!(
            sink.write_header(),
            Err(PersistenceError::Unavailable)
        ));
        assert!(matches!(
            sink.save(&loop_result(Vec::new()), &stamp(9)),
            Err(PersistenceError::Unavailable)
        ));
        assert!(matches!(
            sink.mark_failure("Q1", &stamp(9)),
            Err(PersistenceError::Unavailable)
        ));
        sink.clean_up();
    }

    #[test]
    fn empty_sequence_id_status_row_is_completed_by_save() {
        let mut sink = memory_sink();
        let mut query = Query::new("Q1");
        query
            .add_loop(1, LoopCategory::Internal, vec![LoopSequence::new("", "CAG*CUG")])
            .unwrap();
        sink.register_query(&query).unwrap();

        sink.save(&loop_result(vec![sequence(Some(""), Rotation::Forward)]), &stamp(9))
            .unwrap();

        let conn = sink.connection().unwrap();
        let mut stmt = conn
            .prepare("SELECT seq_id, status FROM query_sequences")
            .unwrap();
        let rows: Vec<(String, i64)> = stmt
            .query_map([], |r| Ok((r.get(0)?, r.get(1)?)))
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(rows, vec![("0".to_string(), 1)]);
    }

    #[test]
    fn marking_store_errors_are_wrapped_with_context() {
        let mut sink = memory_sink();
        sink.register_query(&registered_query()).unwrap();
        sink.connection()
            .unwrap()
            .execute_batch("DROP TABLE query_info")
            .unwrap();

        let err = sink.mark_all_done("Q1", &stamp(9)).unwrap_err();
        assert!(matches!(err, PersistenceError::Store { .. }));
        assert!(err.to_string().starts_with("Could not mark query 'Q1' as Done"));

        let err = sink.mark_failure("Q1", &stamp(9)).unwrap_err();
        assert!(matches!(err, PersistenceError::Store { .. }));
        assert!(err.to_string().starts_with("Could not mark query 'Q1' as Failed"));
    }

    #[test]
    fn store_errors_are_wrapped_with_context() {
        let mut sink = memory_sink();
        sink.connection()
            .unwrap()
            .execute_batch("DROP TABLE loop_results")
            .unwrap();

        let err = sink.save(&loop_result(Vec::new()), &stamp(9)).unwrap_err();
        assert!(matches!(err, PersistenceError::Store { .. }));
        assert!(err.to_string().starts_with("Could not save result of loop Q1#1"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn query_status_codes_round_trip() {
        for status in [QueryStatus::Pending, QueryStatus::Done, QueryStatus::Failed] {
            assert_eq!(QueryStatus::from_code(i64::from(status.code())), Some(status));
        }
        assert_eq!(QueryStatus::from_code(2), None);
    }
}
