//! geno-graph: Neo4j store client for geno.
//!
//! Executes compiled upsert statements against a named database and reads
//! the live constraint catalog with `SHOW CONSTRAINTS`.

pub mod client;
pub mod constraints;
pub mod store;

pub use client::{GraphClient, GraphConfig, GraphError};
