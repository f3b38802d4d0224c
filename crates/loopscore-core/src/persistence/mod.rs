//! # Persistence Module
//!
//! Where scored results end up.
//!
//! ## Sink Contract
//!
//! Every sink implements [`ResultSink`]. A persistence run drives it in a fixed
//! order: [`ResultSink::write_header`] once, [`ResultSink::save`] once per loop
//! result, then [`ResultSink::clean_up`] once, even when a save failed. Status
//! marking ([`ResultSink::mark_all_done`], [`ResultSink::mark_failure`]) is never
//! issued by the pipeline itself; the caller decides the outcome of a run.
//!
//! Every status-updating call receives the same [`RunStamp`], taken once per run.
//!
//! ## Implementations
//!
//! - [`sqlite::SqliteSink`] - The relational store with result and tracking tables
//! - [`tabular::CsvSink`] - Delimited files with a header row, no tracking rows

pub mod error;
pub mod schema;
pub mod sqlite;
pub mod tabular;

use crate::core::models::result::LoopResult;
use chrono::{DateTime, Utc};
use error::PersistenceError;
use std::ops::{Deref, DerefMut};

/// Completion time shared by every status update of one persistence run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunStamp(DateTime<Utc>);

impl RunStamp {
    pub fn now() -> Self {
        Self(Utc::now())
    }

    pub fn at(time: DateTime<Utc>) -> Self {
        Self(time)
    }

    pub fn time(&self) -> DateTime<Utc> {
        self.0
    }
}

pub trait ResultSink {
    /// Writes whatever preamble the sink needs before the first result.
    fn write_header(&mut self) -> Result<(), PersistenceError>;

    /// Persists one loop result: its sequence results in order, then its aggregate.
    fn save(&mut self, result: &LoopResult, stamp: &RunStamp) -> Result<(), PersistenceError>;

    /// Records that every loop of `query_id` was processed.
    fn mark_all_done(&mut self, query_id: &str, stamp: &RunStamp) -> Result<(), PersistenceError>;

    /// Records that processing `query_id` failed.
    fn mark_failure(&mut self, query_id: &str, stamp: &RunStamp) -> Result<(), PersistenceError>;

    /// Releases the sink's resources. Failures are logged, never returned.
    fn clean_up(&mut self);
}

/// Calls [`ResultSink::clean_up`] when dropped.
pub struct SinkGuard<'a, S: ResultSink + ?Sized> {
    sink: &'a mut S,
}

impl<'a, S: ResultSink + ?Sized> SinkGuard<'a, S> {
    pub fn new(sink: &'a mut S) -> Self {
        Self { sink }
    }
}

impl<S: ResultSink + ?Sized> Deref for SinkGuard<'_, S> {
    type Target = S;

    fn deref(&self) -> &S {
        self.sink
    }
}

impl<S: ResultSink + ?Sized> DerefMut for SinkGuard<'_, S> {
    fn deref_mut(&mut self) -> &mut S {
        self.sink
    }
}

impl<S: ResultSink + ?Sized> Drop for SinkGuard<'_, S> {
    fn drop(&mut self) {
        self.sink.clean_up();
    }
}
