//! # Core Models Module
//!
//! Data shapes shared by scoring and persistence.
//!
//! ## Key Components
//!
//! - [`query`] - Queries and their loops, as handed over by a query loader
//! - [`result`] - Per-model loop results and per-instance sequence results produced by scorers
//! - [`ids`] - Identifier aliases and the `(query, loop)` key every persisted row traces back to
//!
//! Queries and loops are read-only after loading. Results are transient: a scorer
//! creates them, a sink consumes them once, and nothing caches them between runs.

pub mod ids;
pub mod query;
pub mod result;
