//! The store boundary: anything that can execute a compiled statement
//! against a named database and report what it created.

use std::future::Future;
use std::ops::AddAssign;

use serde::{Deserialize, Serialize};

use crate::cypher::{CompiledStatement, EntityKind};

/// Failure reported by a store client.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Store connection error: {0}")]
    Connection(String),

    #[error("Statement execution failed: {0}")]
    Execution(String),

    #[error("Unreadable store response: {0}")]
    Response(String),
}

/// Write counters returned for one executed statement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteCounters {
    pub nodes_created: u64,
    pub relationships_created: u64,
}

impl WriteCounters {
    /// Counters for `count` newly created entities of one kind.
    pub fn created(kind: EntityKind, count: u64) -> Self {
        match kind {
            EntityKind::Node => Self {
                nodes_created: count,
                relationships_created: 0,
            },
            EntityKind::Relationship => Self {
                nodes_created: 0,
                relationships_created: count,
            },
        }
    }
}

impl AddAssign for WriteCounters {
    fn add_assign(&mut self, other: Self) {
        self.nodes_created += other.nodes_created;
        self.relationships_created += other.relationships_created;
    }
}

/// Executes compiled statements. Batching, retries and timeouts are the
/// implementation's business.
pub trait StoreClient {
    fn execute(
        &self,
        statement: &CompiledStatement,
        database: &str,
    ) -> impl Future<Output = Result<WriteCounters, StoreError>> + Send;
}
