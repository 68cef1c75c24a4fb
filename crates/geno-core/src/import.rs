//! The import loop: compile every entity against the catalog, execute it,
//! and accumulate an explicit report.
//!
//! Nodes are written before relationships so that relationship endpoints
//! can be matched. The loop stops at the first failure.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::catalog::Constraints;
use crate::cypher::CompileError;
use crate::input::Graph;
use crate::resolver::{ConstraintResolver, WriteMode};
use crate::store::{StoreClient, StoreError, WriteCounters};
use crate::types::{Node, Relationship};

/// Tally key for nodes without labels.
pub const UNLABELED: &str = "<unlabeled>";

#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("Failed to compile {entity}: {source}")]
    Compile {
        entity: String,
        #[source]
        source: CompileError,
    },

    #[error("Failed to write {entity}: {source}")]
    Store {
        entity: String,
        #[source]
        source: StoreError,
    },
}

impl ImportError {
    /// Whether the failure is a compiler defect rather than a store problem.
    pub fn is_internal(&self) -> bool {
        match self {
            ImportError::Compile { source, .. } => source.is_internal(),
            ImportError::Store { .. } => false,
        }
    }
}

// ── Report ───────────────────────────────────────────────────────

/// Entities seen vs. entities the store reported as newly created.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LabelTally {
    pub found: u64,
    pub created: u64,
}

/// Outcome of one import run, keyed by node label and relationship type.
#[derive(Debug, Clone, Serialize)]
pub struct ImportReport {
    pub run_id: Uuid,
    pub database: String,
    pub mode: WriteMode,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub nodes: BTreeMap<String, LabelTally>,
    pub relationships: BTreeMap<String, LabelTally>,
    pub totals: WriteCounters,
}

impl ImportReport {
    pub fn new(database: impl Into<String>, mode: WriteMode) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            database: database.into(),
            mode,
            started_at: Utc::now(),
            finished_at: None,
            nodes: BTreeMap::new(),
            relationships: BTreeMap::new(),
            totals: WriteCounters::default(),
        }
    }

    /// Count a node once under each of its labels.
    pub fn record_node(&mut self, node: &Node, counters: WriteCounters) {
        let labels: Vec<&str> = if node.labels.is_empty() {
            vec![UNLABELED]
        } else {
            node.labels.iter().map(String::as_str).collect()
        };
        for label in labels {
            let tally = self.nodes.entry(label.to_string()).or_default();
            tally.found += 1;
            tally.created += counters.nodes_created;
        }
        self.totals += counters;
    }

    pub fn record_relationship(&mut self, rel: &Relationship, counters: WriteCounters) {
        let tally = self.relationships.entry(rel.label.clone()).or_default();
        tally.found += 1;
        tally.created += counters.relationships_created;
        self.totals += counters;
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }
}

impl fmt::Display for ImportReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "nodes report:")?;
        for (label, tally) in &self.nodes {
            writeln!(
                f,
                "\tNode label: {label} found: {} created: {}",
                tally.found, tally.created
            )?;
        }
        writeln!(f, "relationships report:")?;
        for (rel_type, tally) in &self.relationships {
            writeln!(
                f,
                "\tRelationship type: {rel_type} found: {} created: {}",
                tally.found, tally.created
            )?;
        }
        Ok(())
    }
}

// ── Importer ─────────────────────────────────────────────────────

/// Drives compile + execute over a whole graph.
pub struct Importer<'a, S> {
    store: &'a S,
    resolver: ConstraintResolver<'a>,
    database: String,
    mode: WriteMode,
}

impl<'a, S: StoreClient> Importer<'a, S> {
    pub fn new(store: &'a S, catalog: &'a Constraints, database: impl Into<String>) -> Self {
        Self {
            store,
            resolver: ConstraintResolver::new(catalog),
            database: database.into(),
            mode: WriteMode::default(),
        }
    }

    pub fn with_mode(mut self, mode: WriteMode) -> Self {
        self.mode = mode;
        self
    }

    /// Import all nodes, then all relationships.
    pub async fn run(&self, graph: &Graph) -> Result<ImportReport, ImportError> {
        let mut report = ImportReport::new(&self.database, self.mode);
        tracing::info!(
            run_id = %report.run_id,
            database = %self.database,
            mode = ?self.mode,
            nodes = graph.nodes.len(),
            relationships = graph.relationships.len(),
            "Starting import"
        );

        for node in &graph.nodes {
            let entity = format!("node {} ({node})", node.id);
            let statement = self
                .resolver
                .upsert_node(node, self.mode)
                .map_err(|source| ImportError::Compile {
                    entity: entity.clone(),
                    source,
                })?;
            let counters = self
                .store
                .execute(&statement, &self.database)
                .await
                .map_err(|source| ImportError::Store { entity, source })?;
            tracing::debug!(node_id = node.id, labels = %node, created = counters.nodes_created, "Wrote node");
            report.record_node(node, counters);
        }

        for rel in &graph.relationships {
            let entity = format!(
                "relationship {} ({}) between {} and {}",
                rel.id, rel.label, rel.start.id, rel.end.id
            );
            let statement = self
                .resolver
                .upsert_relationship(rel, self.mode)
                .map_err(|source| ImportError::Compile {
                    entity: entity.clone(),
                    source,
                })?;
            let counters = self
                .store
                .execute(&statement, &self.database)
                .await
                .map_err(|source| ImportError::Store { entity, source })?;
            tracing::debug!(
                rel_id = rel.id,
                rel_type = %rel.label,
                created = counters.relationships_created,
                "Wrote relationship"
            );
            report.record_relationship(rel, counters);
        }

        report.finish();
        tracing::info!(
            run_id = %report.run_id,
            nodes_created = report.totals.nodes_created,
            relationships_created = report.totals.relationships_created,
            "Import finished"
        );
        Ok(report)
    }
}
