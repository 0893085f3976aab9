//! Read-only, path-addressable projection of a merged configuration.

use crate::error::ConfigError;
use crate::value::{Map, Value};
use serde::{Serialize, Serializer};
use std::fmt;
use std::sync::Arc;

/// One step from a view's root to the node it wraps.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Key(String),
    Index(usize),
}

/// Immutable snapshot of (part of) a merged configuration tree.
///
/// Cloning is cheap; all clones share the snapshot. Views taken before an
/// update keep observing the tree they were built from.
#[derive(Clone)]
pub struct ConfigView {
    root: Arc<Value>,
    location: Vec<Segment>,
}

/// Result of a view lookup.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewItem {
    /// A string, number or bool.
    Scalar(Value),
    /// A nested map.
    Section(ConfigView),
    /// A list; map elements are nested views, scalars pass through.
    Sequence(Vec<ViewItem>),
}

impl ViewItem {
    pub fn as_scalar(&self) -> Option<&Value> {
        match self {
            ViewItem::Scalar(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_section(&self) -> Option<&ConfigView> {
        match self {
            ViewItem::Section(view) => Some(view),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&[ViewItem]> {
        match self {
            ViewItem::Sequence(items) => Some(items),
            _ => None,
        }
    }

    /// Owned copy of the underlying data.
    pub fn to_value(&self) -> Value {
        match self {
            ViewItem::Scalar(value) => value.clone(),
            ViewItem::Section(view) => view.to_value(),
            ViewItem::Sequence(items) => {
                Value::List(items.iter().map(ViewItem::to_value).collect())
            }
        }
    }
}

impl ConfigView {
    /// Wrap a merged tree. The root is expected to be a map.
    pub fn new(tree: Value) -> Self {
        Self::from_shared(Arc::new(tree))
    }

    pub(crate) fn from_shared(root: Arc<Value>) -> Self {
        Self {
            root,
            location: Vec::new(),
        }
    }

    /// Child view at `location`, sharing this snapshot.
    fn descend(&self, segment: Segment) -> Self {
        let mut location = self.location.clone();
        location.push(segment);
        Self {
            root: Arc::clone(&self.root),
            location,
        }
    }

    /// Resolve this view's location within the snapshot.
    fn node(&self) -> &Value {
        let mut node = self.root.as_ref();
        for segment in &self.location {
            let next = match (node, segment) {
                (Value::Map(map), Segment::Key(key)) => map.get(key),
                (Value::List(items), Segment::Index(idx)) => items.get(*idx),
                _ => None,
            };
            // Unreachable for locations built by `descend`.
            node = match next {
                Some(next) => next,
                None => return &EMPTY,
            };
        }
        node
    }

    fn entries(&self) -> Option<&Map> {
        self.node().as_map()
    }

    /// Look up a direct child.
    pub fn get(&self, name: &str) -> Option<ViewItem> {
        let value = self.entries()?.get(name)?;
        Some(self.expose(value, Segment::Key(name.to_string())))
    }

    fn expose(&self, value: &Value, segment: Segment) -> ViewItem {
        match value {
            Value::Map(_) => ViewItem::Section(self.descend(segment)),
            Value::List(items) => {
                let list = self.descend(segment);
                ViewItem::Sequence(
                    items
                        .iter()
                        .enumerate()
                        .map(|(idx, item)| list.expose(item, Segment::Index(idx)))
                        .collect(),
                )
            }
            scalar => ViewItem::Scalar(scalar.clone()),
        }
    }

    /// Look up a dotted path such as `db.replicas.0.host`.
    pub fn lookup(&self, dotted: &str) -> Option<ViewItem> {
        let mut current = ViewItem::Section(self.clone());
        for part in dotted.split('.') {
            current = match current {
                ViewItem::Section(view) => view.get(part)?,
                ViewItem::Sequence(items) => {
                    let idx = part.parse::<usize>().ok()?;
                    items.into_iter().nth(idx)?
                }
                ViewItem::Scalar(_) => return None,
            };
        }
        Some(current)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries().is_some_and(|map| map.contains_key(name))
    }

    /// Child keys in sorted order.
    pub fn keys(&self) -> Vec<String> {
        self.entries()
            .map(|map| map.keys().cloned().collect())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.entries().map_or(0, Map::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Nested section by dotted path.
    pub fn section(&self, dotted: &str) -> Option<ConfigView> {
        match self.lookup(dotted)? {
            ViewItem::Section(view) => Some(view),
            _ => None,
        }
    }

    pub fn get_str(&self, dotted: &str) -> Option<String> {
        self.scalar(dotted)?.as_str().map(str::to_string)
    }

    pub fn get_i64(&self, dotted: &str) -> Option<i64> {
        self.scalar(dotted)?.as_i64()
    }

    pub fn get_f64(&self, dotted: &str) -> Option<f64> {
        self.scalar(dotted)?.as_f64()
    }

    pub fn get_bool(&self, dotted: &str) -> Option<bool> {
        self.scalar(dotted)?.as_bool()
    }

    fn scalar(&self, dotted: &str) -> Option<Value> {
        match self.lookup(dotted)? {
            ViewItem::Scalar(value) => Some(value),
            _ => None,
        }
    }

    /// Views cannot be written to; use `Config::update` instead.
    pub fn set(&self, name: &str, _value: impl Into<Value>) -> Result<(), ConfigError> {
        Err(ConfigError::ReadOnly {
            name: name.to_string(),
        })
    }

    /// Owned copy of the wrapped subtree.
    pub fn to_value(&self) -> Value {
        self.node().clone()
    }

    /// Pretty JSON rendering with sorted keys.
    pub fn to_json_pretty(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self.node())?)
    }
}

static EMPTY: Value = Value::Map(Map::new());

impl PartialEq for ConfigView {
    fn eq(&self, other: &Self) -> bool {
        self.node() == other.node()
    }
}

impl fmt::Debug for ConfigView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ConfigView").field(self.node()).finish()
    }
}

impl fmt::Display for ConfigView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.node())
    }
}

impl Serialize for ConfigView {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.node().serialize(serializer)
    }
}
