//! Constraint-aware Cypher compiler.
//!
//! Turns a node or relationship plus its identity properties into a single
//! parameterized statement. Identity properties key the MERGE/MATCH
//! pattern; every other property is only written when the entity is
//! created. All values are bound as parameters named `prefix + key`, so
//! the three participants of a relationship statement (`left`, `right`,
//! `rel`) never collide.
//!
//! Every function here is pure: same input, byte-identical output.

use std::borrow::Cow;
use std::collections::BTreeMap;

use crate::types::{Node, Properties, PropertySet, PropertyValue, Relationship};

/// Variable used for a node when no prefix is given.
pub const DEFAULT_NODE_VARIABLE: &str = "n";
/// Prefix (and variable) of a relationship's start node.
pub const LEFT_PREFIX: &str = "left";
/// Prefix (and variable) of a relationship's end node.
pub const RIGHT_PREFIX: &str = "right";
/// Parameter prefix of a relationship's own properties.
pub const REL_PREFIX: &str = "rel";
/// Variable bound to the relationship itself.
pub const REL_VARIABLE: &str = "r";

/// Marker set on creation so a statement can report what it created.
pub const CREATED_MARKER: &str = "_geno_created";

/// Errors from statement compilation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CompileError {
    /// The bound parameter map lost entries; the templating is broken.
    #[error("Parameter binding mismatch: expected {expected} parameters, bound {actual}")]
    ParameterBindingMismatch { expected: usize, actual: usize },

    /// An identity property is null, which would widen the pattern to every
    /// entity with the same labels.
    #[error("Identity properties {keys:?} of {variable} are null")]
    NullIdentityProperty { variable: String, keys: Vec<String> },
}

impl CompileError {
    /// Internal errors point at a compiler defect rather than bad input.
    pub fn is_internal(&self) -> bool {
        matches!(self, CompileError::ParameterBindingMismatch { .. })
    }
}

/// What a write statement writes, so the store can count creations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Node,
    Relationship,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteAction {
    Merge,
    Create,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteTarget {
    pub variable: String,
    pub kind: EntityKind,
    pub action: WriteAction,
}

/// A statement ready for the store: Cypher text plus its parameters.
/// Match-only statements carry no target.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompiledStatement {
    pub text: String,
    pub params: BTreeMap<String, PropertyValue>,
    pub target: Option<WriteTarget>,
}

impl CompiledStatement {
    fn writing(mut self, variable: &str, kind: EntityKind, action: WriteAction) -> Self {
        self.target = Some(WriteTarget {
            variable: variable.to_string(),
            kind,
            action,
        });
        self
    }

    /// The statement extended to return one row with a `created` count.
    ///
    /// MERGE tags new entities through an extra `ON CREATE SET` and strips
    /// the tag again in the same statement; CREATE counts every row.
    pub fn tallied_text(&self) -> Option<String> {
        let target = self.target.as_ref()?;
        let v = quote_identifier(&target.variable);
        let tail = match target.action {
            WriteAction::Merge => format!(
                "ON CREATE SET {v}.{CREATED_MARKER}=true\n\
                 WITH {v}, {v}.{CREATED_MARKER} IS NOT NULL AS created\n\
                 REMOVE {v}.{CREATED_MARKER}\n\
                 RETURN count(CASE WHEN created THEN 1 END) AS created\n"
            ),
            WriteAction::Create => format!("RETURN count({v}) AS created\n"),
        };
        Some(format!("{}{tail}", self.text))
    }
}

// ── Nodes ────────────────────────────────────────────────────────

/// `MERGE` a node on its identity properties, setting the rest on create.
///
/// ```text
/// MERGE (n:Person {email:$email})
/// ON CREATE SET n.name=$name
/// ```
pub fn merge_node(
    node: &Node,
    identity: &PropertySet,
    prefix: &str,
) -> Result<CompiledStatement, CompileError> {
    let split = Partition::of(&node.properties, identity);
    let variable = node_variable(prefix);
    split.require_identity(variable)?;

    let mut text = format!(
        "MERGE ({}{}{})",
        quote_identifier(variable),
        label_expression(&node.labels),
        property_map(&split.constrained, prefix),
    );
    push_on_create_set(&mut text, variable, &split.unconstrained, prefix);
    text.push('\n');

    let mut bindings = Bindings::default();
    bindings.bind(prefix, &split.constrained);
    bindings.bind(prefix, &split.unconstrained);
    Ok(bindings
        .finish(text)?
        .writing(variable, EntityKind::Node, WriteAction::Merge))
}

/// `MATCH` a node on its identity properties only.
pub fn match_node(
    node: &Node,
    identity: &PropertySet,
    prefix: &str,
) -> Result<CompiledStatement, CompileError> {
    let split = Partition::of(&node.properties, identity);
    let variable = node_variable(prefix);
    split.require_identity(variable)?;

    let text = format!(
        "MATCH ({}{}{})\n",
        quote_identifier(variable),
        label_expression(&node.labels),
        property_map(&split.constrained, prefix),
    );

    let mut bindings = Bindings::default();
    bindings.bind(prefix, &split.constrained);
    bindings.finish(text)
}

/// Unconditionally `CREATE` a node with all of its properties.
pub fn create_node(node: &Node, prefix: &str) -> Result<CompiledStatement, CompileError> {
    let all = non_null(&node.properties);
    let variable = node_variable(prefix);

    let text = format!(
        "CREATE ({}{}{})\n",
        quote_identifier(variable),
        label_expression(&node.labels),
        property_map(&all, prefix),
    );

    let mut bindings = Bindings::default();
    bindings.bind(prefix, &all);
    Ok(bindings
        .finish(text)?
        .writing(variable, EntityKind::Node, WriteAction::Create))
}

// ── Relationships ────────────────────────────────────────────────

/// Match both endpoints, then `MERGE` the relationship on its identity
/// properties and set the rest on create.
pub fn merge_relationship(
    rel: &Relationship,
    left_identity: &PropertySet,
    right_identity: &PropertySet,
    identity: &PropertySet,
) -> Result<CompiledStatement, CompileError> {
    let split = Partition::of(&rel.properties, identity);
    split.require_identity(REL_VARIABLE)?;

    let mut clause = format!(
        "MERGE ({LEFT_PREFIX})-[{REL_VARIABLE}{}{}]-({RIGHT_PREFIX})",
        type_expression(&rel.label),
        property_map(&split.constrained, REL_PREFIX),
    );
    push_on_create_set(&mut clause, REL_VARIABLE, &split.unconstrained, REL_PREFIX);
    clause.push('\n');

    let mut bound = split.constrained;
    bound.extend(split.unconstrained);
    Ok(
        compose_relationship(rel, left_identity, right_identity, clause, &bound)?.writing(
            REL_VARIABLE,
            EntityKind::Relationship,
            WriteAction::Merge,
        ),
    )
}

/// Match both endpoints and the relationship between them.
pub fn match_relationship(
    rel: &Relationship,
    left_identity: &PropertySet,
    right_identity: &PropertySet,
    identity: &PropertySet,
) -> Result<CompiledStatement, CompileError> {
    let split = Partition::of(&rel.properties, identity);
    split.require_identity(REL_VARIABLE)?;

    let clause = format!(
        "MATCH ({LEFT_PREFIX})-[{REL_VARIABLE}{}{}]-({RIGHT_PREFIX})\n",
        type_expression(&rel.label),
        property_map(&split.constrained, REL_PREFIX),
    );

    compose_relationship(rel, left_identity, right_identity, clause, &split.constrained)
}

/// Match both endpoints and unconditionally `CREATE` the relationship,
/// directed from start to end.
pub fn create_relationship(
    rel: &Relationship,
    left_identity: &PropertySet,
    right_identity: &PropertySet,
) -> Result<CompiledStatement, CompileError> {
    let all = non_null(&rel.properties);

    let clause = format!(
        "CREATE ({LEFT_PREFIX})-[{REL_VARIABLE}{}{}]->({RIGHT_PREFIX})\n",
        type_expression(&rel.label),
        property_map(&all, REL_PREFIX),
    );

    Ok(
        compose_relationship(rel, left_identity, right_identity, clause, &all)?.writing(
            REL_VARIABLE,
            EntityKind::Relationship,
            WriteAction::Create,
        ),
    )
}

/// MATCH(left) + MATCH(right) + clause, with one merged parameter map.
fn compose_relationship(
    rel: &Relationship,
    left_identity: &PropertySet,
    right_identity: &PropertySet,
    clause: String,
    rel_props: &[Entry<'_>],
) -> Result<CompiledStatement, CompileError> {
    let left = match_node(&rel.start, left_identity, LEFT_PREFIX)?;
    let right = match_node(&rel.end, right_identity, RIGHT_PREFIX)?;

    let mut text = left.text;
    text.push_str(&right.text);
    text.push_str(&clause);

    let mut bindings = Bindings::default();
    bindings.absorb(left.params);
    bindings.absorb(right.params);
    bindings.bind(REL_PREFIX, rel_props);
    bindings.finish(text)
}

// ── Templating ───────────────────────────────────────────────────

type Entry<'e> = (&'e str, &'e PropertyValue);

/// Properties split by identity membership. Nulls are classified like any
/// other property but never rendered or bound.
struct Partition<'e> {
    constrained: Vec<Entry<'e>>,
    unconstrained: Vec<Entry<'e>>,
    null_identity: Vec<&'e str>,
}

impl<'e> Partition<'e> {
    fn of(properties: &'e Properties, identity: &PropertySet) -> Self {
        let mut split = Partition {
            constrained: Vec::new(),
            unconstrained: Vec::new(),
            null_identity: Vec::new(),
        };
        // BTreeMap iteration keeps both halves in key order.
        for (key, value) in properties {
            let is_identity = identity.contains(key);
            if value.is_null() {
                if is_identity {
                    split.null_identity.push(key.as_str());
                }
                continue;
            }
            let side = if is_identity {
                &mut split.constrained
            } else {
                &mut split.unconstrained
            };
            side.push((key.as_str(), value));
        }
        split
    }

    /// A null identity value must not silently drop out of the pattern.
    fn require_identity(&self, variable: &str) -> Result<(), CompileError> {
        if self.null_identity.is_empty() {
            return Ok(());
        }
        Err(CompileError::NullIdentityProperty {
            variable: variable.to_string(),
            keys: self.null_identity.iter().map(|k| k.to_string()).collect(),
        })
    }
}

fn non_null(properties: &Properties) -> Vec<Entry<'_>> {
    properties
        .iter()
        .filter(|(_, v)| !v.is_null())
        .map(|(k, v)| (k.as_str(), v))
        .collect()
}

/// Collects parameters and checks that nothing was overwritten.
#[derive(Default)]
struct Bindings {
    params: BTreeMap<String, PropertyValue>,
    expected: usize,
}

impl Bindings {
    fn bind(&mut self, prefix: &str, entries: &[Entry<'_>]) {
        for (key, value) in entries {
            self.params.insert(param_name(prefix, key), (*value).clone());
        }
        self.expected += entries.len();
    }

    fn absorb(&mut self, params: BTreeMap<String, PropertyValue>) {
        self.expected += params.len();
        self.params.extend(params);
    }

    fn finish(self, text: String) -> Result<CompiledStatement, CompileError> {
        if self.params.len() != self.expected {
            return Err(CompileError::ParameterBindingMismatch {
                expected: self.expected,
                actual: self.params.len(),
            });
        }
        Ok(CompiledStatement {
            text,
            params: self.params,
            target: None,
        })
    }
}

fn node_variable(prefix: &str) -> &str {
    if prefix.is_empty() {
        DEFAULT_NODE_VARIABLE
    } else {
        prefix
    }
}

fn param_name(prefix: &str, key: &str) -> String {
    format!("{prefix}{key}")
}

/// `:A:B`, or nothing for an unlabeled node.
pub fn label_expression(labels: &[String]) -> String {
    labels
        .iter()
        .map(|l| format!(":{}", quote_identifier(l)))
        .collect()
}

fn type_expression(rel_type: &str) -> String {
    format!(":{}", quote_identifier(rel_type))
}

/// ` {k:$pk, k2:$pk2}`, or nothing when there are no entries.
fn property_map(entries: &[Entry<'_>], prefix: &str) -> String {
    if entries.is_empty() {
        return String::new();
    }
    let body = entries
        .iter()
        .map(|(key, _)| {
            format!(
                "{}:${}",
                quote_identifier(key),
                quote_identifier(&param_name(prefix, key))
            )
        })
        .collect::<Vec<_>>()
        .join(", ");
    format!(" {{{body}}}")
}

fn push_on_create_set(text: &mut String, variable: &str, entries: &[Entry<'_>], prefix: &str) {
    if entries.is_empty() {
        return;
    }
    let variable = quote_identifier(variable);
    let assignments = entries
        .iter()
        .map(|(key, _)| {
            format!(
                "{variable}.{}=${}",
                quote_identifier(key),
                quote_identifier(&param_name(prefix, key))
            )
        })
        .collect::<Vec<_>>()
        .join(", ");
    text.push_str("\nON CREATE SET ");
    text.push_str(&assignments);
}

/// Backtick-quote a name unless it is a plain identifier.
pub fn quote_identifier(name: &str) -> Cow<'_, str> {
    let mut chars = name.chars();
    let plain = matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
    if plain {
        Cow::Borrowed(name)
    } else {
        Cow::Owned(format!("`{}`", name.replace('`', "``")))
    }
}
