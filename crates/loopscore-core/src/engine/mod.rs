//! # Engine Module
//!
//! The stateful side of the scoring pipeline: how a run is configured, how loops
//! are dispatched to scorers, how progress is reported, and how failures are
//! classified.
//!
//! - **Configuration** ([`config`]) - Model type, model-set version, repository base, alignment range
//! - **Scoring** ([`scoring`]) - The scorer contract, the category registry, and a precomputed-score scorer
//! - **Progress Monitoring** ([`progress`]) - Callback-based progress events
//! - **Error Handling** ([`error`]) - The run-level error taxonomy

pub mod config;
pub mod error;
pub mod progress;
pub mod scoring;
