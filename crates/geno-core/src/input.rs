//! Graph assembly from the JSON export format:
//!
//! ```json
//! {"nodes": [{"identity": 1, "labels": ["Person"], "properties": {...}}],
//!  "rels":  [{"identity": 7, "start": 1, "end": 2, "type": "KNOWS", "properties": {...}}]}
//! ```
//!
//! Relationship endpoints are resolved once here. Assembly is atomic: any
//! unresolved reference aborts it and nothing is returned.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Deserialize;

use crate::types::{Node, NodeId, Properties, Relationship};

#[derive(Debug, thiserror::Error)]
pub enum GraphInputError {
    #[error("Invalid graph JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Node not found: relationship references node {0}")]
    NodeNotFound(NodeId),
}

#[derive(Debug, Deserialize)]
struct RawNode {
    identity: NodeId,
    #[serde(default)]
    labels: Vec<String>,
    #[serde(default)]
    properties: Properties,
}

#[derive(Debug, Deserialize)]
struct RawRelationship {
    identity: NodeId,
    start: NodeId,
    end: NodeId,
    #[serde(rename = "type")]
    rel_type: String,
    #[serde(default)]
    properties: Properties,
}

#[derive(Debug, Deserialize)]
struct RawGraph {
    #[serde(default)]
    nodes: Vec<RawNode>,
    #[serde(default)]
    rels: Vec<RawRelationship>,
}

/// A fully resolved graph, ready for import.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    pub nodes: Vec<Arc<Node>>,
    pub relationships: Vec<Relationship>,
}

impl Graph {
    pub fn from_json(raw: &str) -> Result<Self, GraphInputError> {
        let parsed: RawGraph = serde_json::from_str(raw)?;
        Self::assemble(parsed)
    }

    pub fn from_slice(raw: &[u8]) -> Result<Self, GraphInputError> {
        let parsed: RawGraph = serde_json::from_slice(raw)?;
        Self::assemble(parsed)
    }

    fn assemble(raw: RawGraph) -> Result<Self, GraphInputError> {
        let nodes: Vec<Arc<Node>> = raw
            .nodes
            .into_iter()
            .map(|n| Arc::new(Node::new(n.identity, n.labels, n.properties)))
            .collect();

        // First node wins when identities repeat.
        let mut by_id: HashMap<NodeId, &Arc<Node>> = HashMap::with_capacity(nodes.len());
        for node in &nodes {
            by_id.entry(node.id).or_insert(node);
        }
        let resolve = |id: NodeId| {
            by_id
                .get(&id)
                .map(|n| Arc::clone(n))
                .ok_or(GraphInputError::NodeNotFound(id))
        };

        let relationships = raw
            .rels
            .into_iter()
            .map(|r| {
                Ok(Relationship::new(
                    r.identity,
                    resolve(r.start)?,
                    resolve(r.end)?,
                    r.rel_type,
                    r.properties,
                ))
            })
            .collect::<Result<Vec<_>, GraphInputError>>()?;

        tracing::debug!(
            nodes = nodes.len(),
            relationships = relationships.len(),
            "Assembled graph"
        );
        Ok(Self {
            nodes,
            relationships,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.relationships.is_empty()
    }
}
