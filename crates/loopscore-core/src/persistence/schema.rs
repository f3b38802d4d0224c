use super::error::PersistenceError;
use rusqlite::Connection;
use tracing::debug;

pub const CREATE_TABLES_SQL: &str = "
CREATE TABLE IF NOT EXISTS loop_results (
    query_id                       TEXT    NOT NULL,
    loop_id                        INTEGER NOT NULL,
    model_id                       TEXT    NOT NULL,
    mean_score                     REAL,
    mean_percentile                REAL,
    mean_interior_edit_distance    REAL,
    mean_full_edit_distance        REAL,
    median_score                   REAL,
    median_percentile              REAL,
    median_interior_edit_distance  REAL,
    median_full_edit_distance      REAL,
    signature                      TEXT,
    rotation                       INTEGER NOT NULL CHECK (rotation IN (0, 1)),
    correspondences                TEXT
);

CREATE TABLE IF NOT EXISTS loop_instance_results (
    query_id                TEXT    NOT NULL,
    seq_id                  TEXT    NOT NULL,
    loop_id                 INTEGER NOT NULL,
    score                   REAL,
    percentile              REAL,
    interior_edit_distance  INTEGER,
    full_edit_distance      INTEGER,
    rotation                INTEGER NOT NULL CHECK (rotation IN (0, 1)),
    model_id                TEXT    NOT NULL
);

CREATE TABLE IF NOT EXISTS query_info (
    query_id        TEXT    PRIMARY KEY,
    status          INTEGER NOT NULL DEFAULT 0,
    time_completed  TIMESTAMP
);

CREATE TABLE IF NOT EXISTS query_sequences (
    query_id        TEXT    NOT NULL,
    seq_id          TEXT    NOT NULL,
    loop_id         INTEGER NOT NULL,
    status          INTEGER NOT NULL DEFAULT 0,
    time_completed  TIMESTAMP,
    PRIMARY KEY (query_id, seq_id, loop_id)
);
";

pub const INSERT_LOOP_RESULT_SQL: &str = "INSERT INTO loop_results (query_id, loop_id, model_id, mean_score, mean_percentile, mean_interior_edit_distance, mean_full_edit_distance, median_score, median_percentile, median_interior_edit_distance, median_full_edit_distance, signature, rotation, correspondences) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)";

pub const INSERT_SEQUENCE_RESULT_SQL: &str = "INSERT INTO loop_instance_results (query_id, seq_id, loop_id, score, percentile, interior_edit_distance, full_edit_distance, rotation, model_id) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)";

pub const UPDATE_SEQUENCE_STATUS_SQL: &str = "UPDATE query_sequences SET status = 1, time_completed = ?1 WHERE query_id = ?2 AND seq_id = ?3 AND loop_id = ?4";

pub const UPDATE_QUERY_STATUS_SQL: &str =
    "UPDATE query_info SET status = ?1, time_completed = ?2 WHERE query_id = ?3";

pub const SELECT_QUERY_STATUS_SQL: &str =
    "SELECT status, time_completed FROM query_info WHERE query_id = ?1";

pub const REGISTER_QUERY_SQL: &str =
    "INSERT OR IGNORE INTO query_info (query_id, status, time_completed) VALUES (?1, 0, NULL)";

pub const REGISTER_SEQUENCE_SQL: &str = "INSERT OR IGNORE INTO query_sequences (query_id, seq_id, loop_id, status, time_completed) VALUES (?1, ?2, ?3, 0, NULL)";

/// Statements a sink prepares up front, so a missing table fails at construction.
pub const PREPARED_STATEMENTS: [&str; 4] = [
    INSERT_LOOP_RESULT_SQL,
    INSERT_SEQUENCE_RESULT_SQL,
    UPDATE_SEQUENCE_STATUS_SQL,
    UPDATE_QUERY_STATUS_SQL,
];

/// Creates the result and tracking tables if they do not exist yet.
pub fn create_schema(conn: &Connection) -> Result<(), PersistenceError> {
    debug!("Ensuring result store schema exists.");
    conn.execute_batch(CREATE_TABLES_SQL)
        .map_err(|e| PersistenceError::store("Could not create result tables", e))
}
