//! Glue between the constraint catalog and the Cypher compiler.

use serde::{Deserialize, Serialize};

use crate::catalog::Constraints;
use crate::cypher::{self, CompileError, CompiledStatement};
use crate::types::{Node, Relationship};

/// How entities are written to the store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WriteMode {
    /// Match-or-create on identity properties.
    #[default]
    Merge,
    /// Unconditional create. Endpoints are still matched.
    Create,
}

/// Compiles entities against one database's constraint catalog.
#[derive(Debug, Clone, Copy)]
pub struct ConstraintResolver<'c> {
    catalog: &'c Constraints,
}

impl<'c> ConstraintResolver<'c> {
    pub fn new(catalog: &'c Constraints) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &'c Constraints {
        self.catalog
    }

    /// Compile a node with the given write mode, using the default variable.
    pub fn upsert_node(
        &self,
        node: &Node,
        mode: WriteMode,
    ) -> Result<CompiledStatement, CompileError> {
        match mode {
            WriteMode::Merge => self.merge_node(node, ""),
            WriteMode::Create => self.create_node(node, ""),
        }
    }

    /// Compile a relationship with the given write mode.
    pub fn upsert_relationship(
        &self,
        rel: &Relationship,
        mode: WriteMode,
    ) -> Result<CompiledStatement, CompileError> {
        match mode {
            WriteMode::Merge => self.merge_relationship(rel),
            WriteMode::Create => self.create_relationship(rel),
        }
    }

    pub fn merge_node(&self, node: &Node, prefix: &str) -> Result<CompiledStatement, CompileError> {
        let identity = self.catalog.get_node_constraints(node);
        if identity.is_empty() {
            tracing::debug!(node_id = node.id, labels = %node, "No identity properties, merging on labels only");
        }
        cypher::merge_node(node, &identity, prefix)
    }

    pub fn match_node(&self, node: &Node, prefix: &str) -> Result<CompiledStatement, CompileError> {
        let identity = self.catalog.get_node_constraints(node);
        cypher::match_node(node, &identity, prefix)
    }

    pub fn create_node(&self, node: &Node, prefix: &str) -> Result<CompiledStatement, CompileError> {
        cypher::create_node(node, prefix)
    }

    pub fn merge_relationship(&self, rel: &Relationship) -> Result<CompiledStatement, CompileError> {
        let left = self.catalog.get_node_constraints(&rel.start);
        let right = self.catalog.get_node_constraints(&rel.end);
        let identity = self.catalog.get_relationship_constraints(rel);
        cypher::merge_relationship(rel, &left, &right, &identity)
    }

    pub fn match_relationship(&self, rel: &Relationship) -> Result<CompiledStatement, CompileError> {
        let left = self.catalog.get_node_constraints(&rel.start);
        let right = self.catalog.get_node_constraints(&rel.end);
        let identity = self.catalog.get_relationship_constraints(rel);
        cypher::match_relationship(rel, &left, &right, &identity)
    }

    pub fn create_relationship(&self, rel: &Relationship) -> Result<CompiledStatement, CompileError> {
        let left = self.catalog.get_node_constraints(&rel.start);
        let right = self.catalog.get_node_constraints(&rel.end);
        cypher::create_relationship(rel, &left, &right)
    }
}
