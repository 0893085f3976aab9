//! Declarative schema: type tags, list schemas, map schemas and wildcards.
//!
//! Schemas use the same JSON-like notation as the data they describe: a string
//! is a type tag, a one-element list is a homogeneous list of that element,
//! and an object is a map. An object whose only key is [`WILDCARD_KEY`]
//! accepts any key, each value matching the wildcard's sub-schema.
//!
//! ```json5
//! {
//!   name: "str",
//!   ports: ["int"],
//!   limits: { __wildcard__: "float" },
//! }
//! ```

use crate::error::SchemaError;
use crate::types::TypeRegistry;
use crate::value::{Map, Value, join_path};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Reserved key marking a wildcard map schema.
pub const WILDCARD_KEY: &str = "__wildcard__";

/// A node of the schema tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaNode {
    /// Leaf holding a type tag such as `"int"`.
    Type(String),
    /// Homogeneous list of the inner schema.
    List(Box<SchemaNode>),
    /// Map with a fixed set of keys.
    Map(BTreeMap<String, SchemaNode>),
    /// Map accepting any key; every value matches the inner schema.
    Wildcard(Box<SchemaNode>),
}

impl SchemaNode {
    pub fn ty(tag: impl Into<String>) -> Self {
        SchemaNode::Type(tag.into())
    }

    pub fn list(inner: SchemaNode) -> Self {
        SchemaNode::List(Box::new(inner))
    }

    pub fn map<K, I>(entries: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, SchemaNode)>,
    {
        SchemaNode::Map(
            entries
                .into_iter()
                .map(|(key, node)| (key.into(), node))
                .collect(),
        )
    }

    pub fn wildcard(inner: SchemaNode) -> Self {
        SchemaNode::Wildcard(Box::new(inner))
    }

    /// True for map and wildcard nodes, whose layers merge key by key.
    pub fn is_map(&self) -> bool {
        matches!(self, SchemaNode::Map(_) | SchemaNode::Wildcard(_))
    }

    /// Sub-schema governing `key` inside a map node.
    pub fn child(&self, key: &str) -> Option<&SchemaNode> {
        match self {
            SchemaNode::Map(entries) => entries.get(key),
            SchemaNode::Wildcard(inner) => Some(inner),
            SchemaNode::Type(_) | SchemaNode::List(_) => None,
        }
    }

    /// Parse schema notation into a node.
    pub fn from_value(value: &Value) -> Result<Self, SchemaError> {
        node_from_value(value, "/")
    }
}

/// A validated-shape schema whose root is a map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    root: SchemaNode,
}

impl Schema {
    /// Wrap a root node, which must be a map or wildcard map.
    pub fn new(root: SchemaNode) -> Result<Self, SchemaError> {
        if !root.is_map() {
            return Err(SchemaError::RootNotMap);
        }
        Ok(Self { root })
    }

    /// Parse schema notation.
    pub fn from_value(value: &Value) -> Result<Self, SchemaError> {
        Self::new(SchemaNode::from_value(value)?)
    }

    /// Parse schema notation from JSON5 text.
    pub fn from_json5_str(contents: &str) -> Result<Self, SchemaError> {
        let json: serde_json::Value =
            json5::from_str(contents).map_err(|err| SchemaError::Load(err.to_string()))?;
        let value = Value::from_json(json).map_err(SchemaError::Load)?;
        Self::from_value(&value)
    }

    /// Read and parse a schema document.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, SchemaError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .map_err(|err| SchemaError::Load(format!("{}: {err}", path.display())))?;
        Self::from_json5_str(&contents)
    }

    pub fn root(&self) -> &SchemaNode {
        &self.root
    }

    /// Ensure every type tag in the schema is registered.
    pub fn check(&self, registry: &TypeRegistry) -> Result<(), SchemaError> {
        check_node(&self.root, registry, "/")
    }

    /// Zero-value tree matching this schema.
    pub fn skeleton(&self, registry: &TypeRegistry) -> Result<Value, SchemaError> {
        skeleton(&self.root, registry)
    }
}

fn node_from_value(value: &Value, path: &str) -> Result<SchemaNode, SchemaError> {
    match value {
        Value::String(tag) => Ok(SchemaNode::Type(tag.clone())),
        Value::List(items) => {
            let [inner] = items.as_slice() else {
                return Err(SchemaError::ListArity {
                    path: path.to_string(),
                    len: items.len(),
                });
            };
            Ok(SchemaNode::list(node_from_value(inner, &join_path(path, "0"))?))
        }
        Value::Map(map) => map_from_value(map, path),
        Value::Integer(_) | Value::Float(_) | Value::Boolean(_) => Err(SchemaError::InvalidNode {
            path: path.to_string(),
            message: format!("expected a type name, list or map, got {value}"),
        }),
    }
}

fn map_from_value(map: &Map, path: &str) -> Result<SchemaNode, SchemaError> {
    if let Some(inner) = map.get(WILDCARD_KEY) {
        if map.len() != 1 {
            return Err(SchemaError::WildcardSiblings {
                path: path.to_string(),
                marker: WILDCARD_KEY,
                len: map.len(),
            });
        }
        let node = node_from_value(inner, &join_path(path, WILDCARD_KEY))?;
        return Ok(SchemaNode::wildcard(node));
    }
    let mut entries = BTreeMap::new();
    for (key, item) in map {
        entries.insert(key.clone(), node_from_value(item, &join_path(path, key))?);
    }
    Ok(SchemaNode::Map(entries))
}

fn check_node(node: &SchemaNode, registry: &TypeRegistry, path: &str) -> Result<(), SchemaError> {
    match node {
        SchemaNode::Type(tag) if registry.contains(tag) => Ok(()),
        SchemaNode::Type(tag) => Err(SchemaError::UnknownType {
            path: path.to_string(),
            tag: tag.clone(),
        }),
        SchemaNode::List(inner) => check_node(inner, registry, &join_path(path, "0")),
        SchemaNode::Map(entries) => entries
            .iter()
            .try_for_each(|(key, child)| check_node(child, registry, &join_path(path, key))),
        SchemaNode::Wildcard(inner) => check_node(inner, registry, &join_path(path, WILDCARD_KEY)),
    }
}

/// Zero-value tree for a schema node.
///
/// Wildcard maps and lists are empty; concrete maps get every declared key.
pub fn skeleton(node: &SchemaNode, registry: &TypeRegistry) -> Result<Value, SchemaError> {
    skeleton_at(node, registry, "/")
}

fn skeleton_at(
    node: &SchemaNode,
    registry: &TypeRegistry,
    path: &str,
) -> Result<Value, SchemaError> {
    match node {
        SchemaNode::Type(tag) => registry.zero(tag).ok_or_else(|| SchemaError::UnknownType {
            path: path.to_string(),
            tag: tag.clone(),
        }),
        SchemaNode::List(_) => Ok(Value::List(Vec::new())),
        SchemaNode::Wildcard(_) => Ok(Value::map()),
        SchemaNode::Map(entries) => {
            let mut map = Map::new();
            for (key, child) in entries {
                map.insert(key.clone(), skeleton_at(child, registry, &join_path(path, key))?);
            }
            Ok(Value::Map(map))
        }
    }
}
