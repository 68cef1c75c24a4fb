//! Read-only petgraph view over an assembled [`Graph`], so generic graph
//! algorithms can run on import data before it is written.

use std::collections::HashMap;

use petgraph::algo::connected_components;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;

use crate::input::Graph;
use crate::types::{Node, NodeId, PropertyValue, Relationship};

/// Property read as an edge weight.
pub const WEIGHT_PROPERTY: &str = "weight";

/// Numeric `weight` property of a relationship, or 0.0.
pub fn relationship_weight(rel: &Relationship) -> f64 {
    rel.properties
        .get(WEIGHT_PROPERTY)
        .and_then(PropertyValue::as_f64)
        .unwrap_or(0.0)
}

pub struct PetgraphView<'g> {
    graph: DiGraph<&'g Node, &'g Relationship>,
    index: HashMap<NodeId, NodeIndex>,
}

impl<'g> PetgraphView<'g> {
    pub fn new(source: &'g Graph) -> Self {
        let mut graph = DiGraph::with_capacity(source.nodes.len(), source.relationships.len());
        let mut index = HashMap::with_capacity(source.nodes.len());

        for node in &source.nodes {
            // Duplicate identities resolve to the first node, as in assembly.
            index
                .entry(node.id)
                .or_insert_with(|| graph.add_node(node.as_ref()));
        }
        for rel in &source.relationships {
            if let (Some(&a), Some(&b)) = (index.get(&rel.start.id), index.get(&rel.end.id)) {
                graph.add_edge(a, b, rel);
            }
        }

        Self { graph, index }
    }

    pub fn graph(&self) -> &DiGraph<&'g Node, &'g Relationship> {
        &self.graph
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn node_index(&self, id: NodeId) -> Option<NodeIndex> {
        self.index.get(&id).copied()
    }

    pub fn node(&self, id: NodeId) -> Option<&'g Node> {
        self.node_index(id).map(|ix| self.graph[ix])
    }

    /// Weakly connected components.
    pub fn component_count(&self) -> usize {
        connected_components(&self.graph)
    }

    /// Sum of edge weights leaving `id`.
    pub fn out_weight(&self, id: NodeId) -> f64 {
        let Some(ix) = self.node_index(id) else {
            return 0.0;
        };
        self.graph
            .edges(ix)
            .map(|edge| relationship_weight(edge.weight()))
            .sum()
    }
}
