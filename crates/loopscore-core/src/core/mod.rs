//! # Core Module
//!
//! Stateless building blocks of the loop scoring pipeline.
//!
//! - **Data Model** ([`models`]) - Queries, loops, and the two-level result model
//! - **Query Input** ([`io`]) - The query loader contract and a TOML file loader
//! - **Model Repository** ([`repository`]) - Enumerating and loading motif model sets
//! - **Utilities** ([`utils`]) - Summary statistics used when aggregating sequence scores

pub mod io;
pub mod models;
pub mod repository;
pub mod utils;
