//! # Workflows Module
//!
//! High-level entry points that tie [`crate::core`], [`crate::engine`] and
//! [`crate::persistence`] together.
//!
//! ## Overview
//!
//! A scoring run has two separate phases. [`score::run`] dispatches every loop of a
//! query to the scorer registered for its category and collects the results in loop
//! order. [`score::persist`] then hands those results to a [`crate::persistence::ResultSink`].
//! Nothing is persisted unless the scoring phase finished for every loop.
//!
//! [`score::run_and_save`] chains query loading and both phases. It reports the
//! outcome through its `Result` and leaves status marking to the caller.

pub mod score;
