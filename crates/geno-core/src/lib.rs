//! geno-core: entity model, constraint catalog, and the constraint-aware
//! Cypher compiler behind geno's graph imports.
//!
//! Identity for every node and relationship is derived from the target
//! database's declared constraints, so re-running an import converges on
//! the same graph instead of duplicating it.

pub mod adapter;
pub mod catalog;
pub mod config;
pub mod cypher;
pub mod error;
pub mod import;
pub mod input;
pub mod resolver;
pub mod store;
pub mod types;

pub use catalog::{CatalogError, Constraint, ConstraintRow, Constraints};
pub use config::{ConfigError, GenoConfig, Neo4jSettings};
pub use cypher::{CompileError, CompiledStatement, EntityKind, WriteAction, WriteTarget};
pub use error::{GenoError, Result};
pub use import::{ImportError, ImportReport, Importer, LabelTally};
pub use input::{Graph, GraphInputError};
pub use resolver::{ConstraintResolver, WriteMode};
pub use store::{StoreClient, StoreError, WriteCounters};
pub use types::{Node, NodeId, Properties, PropertySet, PropertyValue, Relationship};
