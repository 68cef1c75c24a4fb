//! Entity model for graph-shaped import data.
//!
//! Nodes and relationships are built once during graph assembly and never
//! mutated afterwards. Relationships hold their endpoints as shared handles
//! so that compiling a relationship never has to look a node up again.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Stable identity of an entity within one loaded graph.
pub type NodeId = i64;

/// Property map of a node or relationship. Ordered by key.
pub type Properties = BTreeMap<String, PropertyValue>;

/// A set of property names, e.g. the identity properties of an entity.
pub type PropertySet = BTreeSet<String>;

// ── Property Values ──────────────────────────────────────────────

/// A property value as it appears in graph input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    List(Vec<PropertyValue>),
}

impl PropertyValue {
    pub fn is_null(&self) -> bool {
        matches!(self, PropertyValue::Null)
    }

    /// Numeric view of the value. Integers are widened; everything else is `None`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            PropertyValue::Integer(i) => Some(*i as f64),
            PropertyValue::Float(f) => Some(*f),
            _ => None,
        }
    }
}

impl From<&str> for PropertyValue {
    fn from(s: &str) -> Self {
        PropertyValue::String(s.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(s: String) -> Self {
        PropertyValue::String(s)
    }
}

impl From<i64> for PropertyValue {
    fn from(i: i64) -> Self {
        PropertyValue::Integer(i)
    }
}

impl From<f64> for PropertyValue {
    fn from(f: f64) -> Self {
        PropertyValue::Float(f)
    }
}

impl From<bool> for PropertyValue {
    fn from(b: bool) -> Self {
        PropertyValue::Bool(b)
    }
}

impl<T: Into<PropertyValue>> From<Option<T>> for PropertyValue {
    fn from(opt: Option<T>) -> Self {
        opt.map(Into::into).unwrap_or(PropertyValue::Null)
    }
}

// ── Node ─────────────────────────────────────────────────────────

/// A labelled node with its properties.
///
/// Label order only affects how the label expression is rendered.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: NodeId,
    pub labels: Vec<String>,
    pub properties: Properties,
}

impl Node {
    pub fn new<L, S>(id: NodeId, labels: L, properties: Properties) -> Self
    where
        L: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            id,
            labels: labels.into_iter().map(Into::into).collect(),
            properties,
        }
    }

    pub fn has_label(&self, label: &str) -> bool {
        self.labels.iter().any(|l| l == label)
    }
}

/// All labels joined with `:`.
impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.labels.join(":"))
    }
}

// ── Relationship ─────────────────────────────────────────────────

/// A typed relationship between two resolved nodes.
#[derive(Debug, Clone, PartialEq)]
pub struct Relationship {
    pub id: NodeId,
    pub start: Arc<Node>,
    pub end: Arc<Node>,
    /// The relationship type. A relationship has exactly one.
    pub label: String,
    pub properties: Properties,
}

impl Relationship {
    pub fn new(
        id: NodeId,
        start: Arc<Node>,
        end: Arc<Node>,
        label: impl Into<String>,
        properties: Properties,
    ) -> Self {
        Self {
            id,
            start,
            end,
            label: label.into(),
            properties,
        }
    }
}

impl fmt::Display for Relationship {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label)
    }
}
