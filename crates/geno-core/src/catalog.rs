//! Constraint catalog: classifies declared constraints into six buckets and
//! resolves which properties of an entity are identity properties.
//!
//! The catalog is built once per target database, either from introspection
//! rows (`SHOW CONSTRAINTS`) or from static configuration, and is read-only
//! afterwards. It is safe to share across threads.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::types::{Node, PropertySet, Relationship};

/// Errors raised while building a catalog. The build is all-or-nothing.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CatalogError {
    #[error("Malformed constraint row: {reason}")]
    MalformedConstraintRow { reason: String },

    #[error("Constraint applies to more than one label or type: {labels:?}")]
    MultiLabelConstraintUnsupported { labels: Vec<String> },

    #[error("Unknown constraint combination: entity type {entity_type}, constraint type {constraint_type}")]
    UnknownConstraintCombination {
        entity_type: String,
        constraint_type: String,
    },
}

impl CatalogError {
    fn malformed(reason: impl Into<String>) -> Self {
        CatalogError::MalformedConstraintRow {
            reason: reason.into(),
        }
    }
}

// ── Raw Rows ─────────────────────────────────────────────────────

/// One raw constraint row with the columns `labelsOrTypes`, `entityType`,
/// `properties` and `type`. Extra columns are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConstraintRow(Map<String, Value>);

impl ConstraintRow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert, mostly for fixtures.
    pub fn with(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.insert(column, value);
        self
    }

    pub fn insert(&mut self, column: &str, value: impl Into<Value>) {
        self.0.insert(column.to_string(), value.into());
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.0.get(column)
    }

    fn string(&self, column: &str) -> Result<String, CatalogError> {
        match self.get(column) {
            None => Err(CatalogError::malformed(format!("missing column `{column}`"))),
            Some(Value::String(s)) => Ok(s.clone()),
            Some(other) => Err(CatalogError::malformed(format!(
                "column `{column}` is not a string: {other}"
            ))),
        }
    }

    fn list(&self, column: &str) -> Result<&Vec<Value>, CatalogError> {
        match self.get(column) {
            None => Err(CatalogError::malformed(format!("missing column `{column}`"))),
            Some(Value::Array(items)) => Ok(items),
            Some(other) => Err(CatalogError::malformed(format!(
                "column `{column}` is not a list: {other}"
            ))),
        }
    }

    fn string_list(&self, column: &str) -> Result<Vec<String>, CatalogError> {
        strings_of(self.list(column)?, column)
    }
}

fn strings_of(items: &[Value], column: &str) -> Result<Vec<String>, CatalogError> {
    items
        .iter()
        .map(|item| match item {
            Value::String(s) => Ok(s.clone()),
            other => Err(CatalogError::malformed(format!(
                "column `{column}` holds a non-string entry: {other}"
            ))),
        })
        .collect()
}

// ── Catalog ──────────────────────────────────────────────────────

/// A single declared constraint: one label (or relationship type) and the
/// properties it covers jointly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Constraint {
    pub label: String,
    pub properties: Vec<String>,
}

impl Constraint {
    pub fn new<P, S>(label: impl Into<String>, properties: P) -> Self
    where
        P: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            label: label.into(),
            properties: properties.into_iter().map(Into::into).collect(),
        }
    }
}

/// The classified constraints of one database.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Constraints {
    pub node_uniqueness: Vec<Constraint>,
    pub node_keys: Vec<Constraint>,
    pub node_property_existence: Vec<Constraint>,
    pub relationship_uniqueness: Vec<Constraint>,
    pub relationship_keys: Vec<Constraint>,
    pub relationship_property_existence: Vec<Constraint>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Bucket {
    NodeUniqueness,
    NodeKeys,
    NodePropertyExistence,
    RelationshipUniqueness,
    RelationshipKeys,
    RelationshipPropertyExistence,
}

/// `(entityType, type)` → bucket.
const DISPATCH: [(&str, &str, Bucket); 6] = [
    ("NODE", "UNIQUENESS", Bucket::NodeUniqueness),
    ("NODE", "NODE_KEY", Bucket::NodeKeys),
    ("NODE", "NODE_PROPERTY_EXISTENCE", Bucket::NodePropertyExistence),
    ("RELATIONSHIP", "RELATIONSHIP_UNIQUENESS", Bucket::RelationshipUniqueness),
    ("RELATIONSHIP", "RELATIONSHIP_KEY", Bucket::RelationshipKeys),
    (
        "RELATIONSHIP",
        "RELATIONSHIP_PROPERTY_EXISTENCE",
        Bucket::RelationshipPropertyExistence,
    ),
];

impl Constraints {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a catalog from raw rows. Fails on the first bad row; no partial
    /// catalog is ever returned.
    pub fn from_rows<'a, I>(rows: I) -> Result<Self, CatalogError>
    where
        I: IntoIterator<Item = &'a ConstraintRow>,
    {
        let mut catalog = Constraints::default();
        for row in rows {
            let (bucket, constraint) = classify(row)?;
            catalog.bucket_mut(bucket).push(constraint);
        }
        tracing::debug!(constraints = catalog.len(), "Built constraint catalog");
        Ok(catalog)
    }

    fn bucket_mut(&mut self, bucket: Bucket) -> &mut Vec<Constraint> {
        match bucket {
            Bucket::NodeUniqueness => &mut self.node_uniqueness,
            Bucket::NodeKeys => &mut self.node_keys,
            Bucket::NodePropertyExistence => &mut self.node_property_existence,
            Bucket::RelationshipUniqueness => &mut self.relationship_uniqueness,
            Bucket::RelationshipKeys => &mut self.relationship_keys,
            Bucket::RelationshipPropertyExistence => &mut self.relationship_property_existence,
        }
    }

    /// Total number of constraints across all buckets.
    pub fn len(&self) -> usize {
        self.node_uniqueness.len()
            + self.node_keys.len()
            + self.node_property_existence.len()
            + self.relationship_uniqueness.len()
            + self.relationship_keys.len()
            + self.relationship_property_existence.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Identity properties of a node: every property named by a node key,
    /// node existence, or node uniqueness constraint on any of its labels.
    pub fn get_node_constraints(&self, node: &Node) -> PropertySet {
        [
            &self.node_keys,
            &self.node_property_existence,
            &self.node_uniqueness,
        ]
        .into_iter()
        .flatten()
        .filter(|c| node.has_label(&c.label))
        .flat_map(|c| c.properties.iter().cloned())
        .collect()
    }

    /// Identity properties of a relationship, matched against its single type.
    pub fn get_relationship_constraints(&self, rel: &Relationship) -> PropertySet {
        [
            &self.relationship_keys,
            &self.relationship_property_existence,
            &self.relationship_uniqueness,
        ]
        .into_iter()
        .flatten()
        .filter(|c| c.label == rel.label)
        .flat_map(|c| c.properties.iter().cloned())
        .collect()
    }
}

fn classify(row: &ConstraintRow) -> Result<(Bucket, Constraint), CatalogError> {
    let raw_labels = row.list("labelsOrTypes")?;
    if raw_labels.len() > 1 {
        return Err(CatalogError::MultiLabelConstraintUnsupported {
            labels: raw_labels
                .iter()
                .map(|v| v.as_str().map(str::to_string).unwrap_or_else(|| v.to_string()))
                .collect(),
        });
    }
    let label = strings_of(raw_labels, "labelsOrTypes")?
        .pop()
        .ok_or_else(|| CatalogError::malformed("column `labelsOrTypes` is empty"))?;

    let entity_type = row.string("entityType")?;
    let properties = row.string_list("properties")?;
    let constraint_type = row.string("type")?;

    let bucket = DISPATCH
        .iter()
        .find(|(e, t, _)| *e == entity_type && *t == constraint_type)
        .map(|(_, _, bucket)| *bucket)
        .ok_or(CatalogError::UnknownConstraintCombination {
            entity_type,
            constraint_type,
        })?;

    Ok((bucket, Constraint { label, properties }))
}

impl fmt::Display for Constraints {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sections = [
            ("NODE UNIQUENESS", &self.node_uniqueness),
            ("NODE KEYS", &self.node_keys),
            ("NODE REQUIRED PROPERTIES", &self.node_property_existence),
            ("RELATIONSHIP UNIQUENESS", &self.relationship_uniqueness),
            ("RELATIONSHIP KEYS", &self.relationship_keys),
            (
                "RELATIONSHIP REQUIRED PROPERTIES",
                &self.relationship_property_existence,
            ),
        ];
        for (i, (title, constraints)) in sections.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            f.write_str(title)?;
            for c in constraints.iter() {
                write!(f, "\n\t{}: {}", c.label, c.properties.join(", "))?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Properties;
    use serde_json::json;
    use std::sync::Arc;

    fn row(labels: Value, entity: &str, props: Value, kind: &str) -> ConstraintRow {
        ConstraintRow::new()
            .with("labelsOrTypes", labels)
            .with("entityType", entity)
            .with("properties", props)
            .with("type", kind)
    }

    #[test]
    fn uniqueness_row_lands_in_node_uniqueness() {
        let rows = [row(json!(["Person"]), "NODE", json!(["email"]), "UNIQUENESS")];
        let catalog = Constraints::from_rows(&rows).unwrap();

        assert_eq!(
            catalog.node_uniqueness,
            vec![Constraint::new("Person", ["email"])]
        );
        assert_eq!(catalog.len(), 1);
    }

    #[test]
    fn every_dispatch_entry_has_its_own_bucket() {
        let rows: Vec<ConstraintRow> = DISPATCH
            .iter()
            .map(|(entity, kind, _)| row(json!(["L"]), entity, json!(["p"]), kind))
            .collect();
        let catalog = Constraints::from_rows(&rows).unwrap();

        assert_eq!(catalog.node_uniqueness.len(), 1);
        assert_eq!(catalog.node_keys.len(), 1);
        assert_eq!(catalog.node_property_existence.len(), 1);
        assert_eq!(catalog.relationship_uniqueness.len(), 1);
        assert_eq!(catalog.relationship_keys.len(), 1);
        assert_eq!(catalog.relationship_property_existence.len(), 1);
    }

    #[test]
    fn multi_label_row_is_rejected() {
        let rows = [row(json!(["A", "B"]), "NODE", json!(["p"]), "UNIQUENESS")];
        let err = Constraints::from_rows(&rows).unwrap_err();
        assert_eq!(
            err,
            CatalogError::MultiLabelConstraintUnsupported {
                labels: vec!["A".to_string(), "B".to_string()]
            }
        );
    }

    #[test]
    fn malformed_rows_are_rejected() {
        let missing = ConstraintRow::new()
            .with("labelsOrTypes", json!(["A"]))
            .with("entityType", "NODE")
            .with("type", "UNIQUENESS");
        let wrong_type = row(json!("A"), "NODE", json!(["p"]), "UNIQUENESS");
        let bad_entry = row(json!(["A"]), "NODE", json!(["p", 3]), "UNIQUENESS");
        let empty = row(json!([]), "NODE", json!(["p"]), "UNIQUENESS");

        for bad in [missing, wrong_type, bad_entry, empty] {
            let err = Constraints::from_rows([&bad]).unwrap_err();
            assert!(
                matches!(err, CatalogError::MalformedConstraintRow { .. }),
                "unexpected error {err:?}"
            );
        }
    }

    #[test]
    fn unknown_combination_aborts_whole_build() {
        let rows = [
            row(json!(["Person"]), "NODE", json!(["email"]), "UNIQUENESS"),
            row(json!(["Person"]), "NODE", json!(["age"]), "NODE_PROPERTY_TYPE"),
        ];
        let err = Constraints::from_rows(&rows).unwrap_err();
        assert_eq!(
            err,
            CatalogError::UnknownConstraintCombination {
                entity_type: "NODE".to_string(),
                constraint_type: "NODE_PROPERTY_TYPE".to_string(),
            }
        );
    }

    #[test]
    fn node_constraints_union_over_all_labels() {
        let catalog = Constraints {
            node_uniqueness: vec![Constraint::new("Person", ["email"])],
            node_keys: vec![Constraint::new("Employee", ["badge", "email"])],
            node_property_existence: vec![Constraint::new("Company", ["name"])],
            relationship_keys: vec![Constraint::new("Person", ["since"])],
            ..Default::default()
        };
        let node = Node::new(1, ["Person", "Employee"], Properties::new());

        let got = catalog.get_node_constraints(&node);
        let want: PropertySet = ["badge", "email"].into_iter().map(String::from).collect();
        assert_eq!(got, want);
    }

    #[test]
    fn relationship_constraints_match_type_only() {
        let catalog = Constraints {
            node_keys: vec![Constraint::new("KNOWS", ["ignored"])],
            relationship_uniqueness: vec![Constraint::new("KNOWS", ["since"])],
            relationship_property_existence: vec![Constraint::new("KNOWS", ["since", "via"])],
            relationship_keys: vec![Constraint::new("LIKES", ["score"])],
            ..Default::default()
        };
        let a = Arc::new(Node::new(1, ["KNOWS"], Properties::new()));
        let rel = Relationship::new(7, a.clone(), a, "KNOWS", Properties::new());

        let got = catalog.get_relationship_constraints(&rel);
        let want: PropertySet = ["since", "via"].into_iter().map(String::from).collect();
        assert_eq!(got, want);
    }

    #[test]
    fn display_lists_buckets() {
        let catalog = Constraints {
            node_keys: vec![Constraint::new("Person", ["first", "last"])],
            ..Default::default()
        };
        let text = catalog.to_string();
        assert!(text.starts_with("NODE UNIQUENESS\nNODE KEYS\n\tPerson: first, last\n"));
        assert!(text.ends_with("RELATIONSHIP REQUIRED PROPERTIES"));
    }

    #[test]
    fn catalog_deserializes_from_static_config() {
        let catalog: Constraints = serde_json::from_value(json!({
            "node_uniqueness": [{"label": "Person", "properties": ["email"]}]
        }))
        .unwrap();
        assert_eq!(catalog.node_uniqueness.len(), 1);
        assert!(catalog.relationship_keys.is_empty());
    }
}
