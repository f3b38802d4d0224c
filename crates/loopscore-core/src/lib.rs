//! # LoopScore Core Library
//!
//! Runs motif scoring models against the loops of a query and persists per-model
//! aggregate statistics together with per-sequence statistics, tracking each query's
//! outcome in the result store.
//!
//! ## Architecture
//!
//! - **[`core`]: The Foundation.** Query and result data models, query loading, the
//!   model repository, and small statistics helpers.
//!
//! - **[`engine`]: The Logic Core.** Run configuration, the scorer contract and its
//!   category registry, progress reporting, and the run-level error taxonomy.
//!
//! - **[`persistence`]: The Sinks.** The [`persistence::ResultSink`] contract with a
//!   SQLite implementation and a CSV implementation.
//!
//! - **[`workflows`]: The Public API.** The scoring orchestrator that drives a query
//!   from loading through scoring to persistence.

pub mod core;
pub mod engine;
pub mod persistence;
pub mod workflows;
