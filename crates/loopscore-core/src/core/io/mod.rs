//! Provides query input for the scoring pipeline.
//!
//! The pipeline only depends on the [`traits::QueryLoader`] contract. The TOML
//! loader in [`query_file`] is a simple file-backed implementation used by the
//! command-line tool and tests.

pub mod query_file;
pub mod traits;
