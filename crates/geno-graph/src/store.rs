//! Executes compiled statements through the graph client.

use geno_core::{CompiledStatement, PropertyValue, StoreClient, StoreError, WriteCounters};
use neo4rs::{
    query, BoltBoolean, BoltFloat, BoltInteger, BoltList, BoltNull, BoltString, BoltType, Query,
};

use crate::client::GraphClient;

impl StoreClient for GraphClient {
    async fn execute(
        &self,
        statement: &CompiledStatement,
        database: &str,
    ) -> Result<WriteCounters, StoreError> {
        let (Some(target), Some(text)) = (&statement.target, statement.tallied_text()) else {
            self.run_on(database, to_query(&statement.text, statement))
                .await?;
            return Ok(WriteCounters::default());
        };

        let rows = self
            .query_rows_on(database, to_query(&text, statement))
            .await?;
        let created = match rows.first() {
            Some(row) => row
                .get::<i64>("created")
                .map_err(|e| StoreError::Response(format!("created count: {e}")))?,
            None => 0,
        };
        Ok(WriteCounters::created(
            target.kind,
            u64::try_from(created).unwrap_or_default(),
        ))
    }
}

/// Cypher `text` plus every parameter of `statement` converted to Bolt.
pub fn to_query(text: &str, statement: &CompiledStatement) -> Query {
    statement
        .params
        .iter()
        .fold(query(text), |q, (name, value)| q.param(name, to_bolt(value)))
}

pub fn to_bolt(value: &PropertyValue) -> BoltType {
    match value {
        PropertyValue::Null => BoltType::Null(BoltNull),
        PropertyValue::Bool(v) => BoltType::Boolean(BoltBoolean::new(*v)),
        PropertyValue::Integer(v) => BoltType::Integer(BoltInteger::new(*v)),
        PropertyValue::Float(v) => BoltType::Float(BoltFloat::new(*v)),
        PropertyValue::String(v) => BoltType::String(BoltString::new(v)),
        PropertyValue::List(items) => BoltType::List(BoltList {
            value: items.iter().map(to_bolt).collect(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geno_core::{cypher, Node, PropertySet};
    use std::collections::BTreeMap;

    #[test]
    fn converts_scalars_and_lists() {
        assert_eq!(to_bolt(&PropertyValue::Integer(7)), BoltType::from(7i64));
        assert_eq!(to_bolt(&PropertyValue::Bool(true)), BoltType::from(true));
        assert_eq!(
            to_bolt(&PropertyValue::String("x".to_string())),
            BoltType::from("x".to_string())
        );
        assert_eq!(to_bolt(&PropertyValue::Null), BoltType::Null(BoltNull));

        let list = to_bolt(&PropertyValue::List(vec![
            PropertyValue::Integer(1),
            PropertyValue::Integer(2),
        ]));
        assert_eq!(
            list,
            BoltType::List(BoltList {
                value: vec![BoltType::from(1i64), BoltType::from(2i64)],
            })
        );
    }

    #[test]
    fn query_carries_every_parameter() {
        let statement = CompiledStatement {
            text: "MERGE (n:Person {email:$email})\n".to_string(),
            params: BTreeMap::from([("email".to_string(), PropertyValue::from("a@b.com"))]),
            target: None,
        };
        let q = to_query(&statement.text, &statement);
        assert!(q.has_param_key("email"));
        assert!(!q.has_param_key("name"));
    }

    #[test]
    fn tallied_query_keeps_parameters() {
        let node = Node::new(
            1,
            ["Person"],
            BTreeMap::from([
                ("email".to_string(), PropertyValue::from("a@b.com")),
                ("name".to_string(), PropertyValue::from("Al")),
            ]),
        );
        let identity = PropertySet::from(["email".to_string()]);
        let statement = cypher::merge_node(&node, &identity, "").unwrap();
        let text = statement.tallied_text().unwrap();
        assert!(text.ends_with("RETURN count(CASE WHEN created THEN 1 END) AS created\n"));

        let q = to_query(&text, &statement);
        assert!(q.has_param_key("email"));
        assert!(q.has_param_key("name"));
    }
}
