//! Schema-guided merge helpers for layered configuration.

use crate::error::CascadeError;
use crate::schema::{Schema, SchemaNode};
use crate::types::TypeRegistry;
use crate::value::{Map, Value, join_path};

/// Deep-merge `layers` in order (lowest priority first) into one map.
///
/// Map-typed keys merge recursively; lists and leaves replace the value
/// already present. Leaves are stored in their coerced form.
pub fn cascade<'a, I>(
    schema: &Schema,
    registry: &TypeRegistry,
    layers: I,
) -> Result<Value, CascadeError>
where
    I: IntoIterator<Item = &'a Value>,
{
    let mut merged = Map::new();
    for layer in layers {
        merge_layer(&mut merged, schema.root(), registry, layer, "/")?;
    }
    Ok(Value::Map(merged))
}

/// Merge one layer's map into the accumulator.
fn merge_layer(
    base: &mut Map,
    node: &SchemaNode,
    registry: &TypeRegistry,
    overlay: &Value,
    path: &str,
) -> Result<(), CascadeError> {
    let Value::Map(overlay_map) = overlay else {
        return Err(CascadeError {
            path: path.to_string(),
            message: format!("expected a map, got {}", overlay.kind()),
        });
    };

    for (key, value) in overlay_map {
        // Keys outside a concrete map schema never survive validation.
        let Some(sub) = node.child(key) else {
            continue;
        };
        let child_path = join_path(path, key);
        if sub.is_map() {
            let slot = base.entry(key.clone()).or_insert_with(Value::map);
            if !matches!(slot, Value::Map(_)) {
                *slot = Value::map();
            }
            if let Value::Map(slot_map) = slot {
                merge_layer(slot_map, sub, registry, value, &child_path)?;
            }
        } else {
            base.insert(key.clone(), normalize(sub, registry, value, &child_path)?);
        }
    }
    Ok(())
}

/// Produce the canonical form of a replaced value (leaf or whole list).
fn normalize(
    node: &SchemaNode,
    registry: &TypeRegistry,
    value: &Value,
    path: &str,
) -> Result<Value, CascadeError> {
    match node {
        SchemaNode::Type(tag) => match registry.parse(tag, value) {
            Some(result) => result.map_err(|message| CascadeError {
                path: path.to_string(),
                message,
            }),
            None => Err(CascadeError {
                path: path.to_string(),
                message: format!("type {tag:?} is not registered"),
            }),
        },
        SchemaNode::List(inner) => {
            let Value::List(items) = value else {
                return Err(CascadeError {
                    path: path.to_string(),
                    message: format!("expected a list, got {}", value.kind()),
                });
            };
            items
                .iter()
                .enumerate()
                .map(|(idx, item)| {
                    normalize(inner, registry, item, &join_path(path, &idx.to_string()))
                })
                .collect::<Result<Vec<_>, _>>()
                .map(Value::List)
        }
        SchemaNode::Map(_) | SchemaNode::Wildcard(_) => {
            let mut map = Map::new();
            merge_layer(&mut map, node, registry, value, path)?;
            Ok(Value::Map(map))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn schema(text: &str) -> Schema {
        Schema::from_json5_str(text).expect("schema")
    }

    fn data(json: serde_json::Value) -> Value {
        Value::from_json(json).expect("value")
    }

    #[test]
    fn maps_merge_and_lists_replace() {
        let schema = schema(r#"{ a: { b: "int", c: "int" }, d: ["int"] }"#);
        let registry = TypeRegistry::new();
        let skeleton = schema.skeleton(&registry).expect("skeleton");
        let first = data(json!({ "a": { "b": 1 }, "d": [1, 2] }));
        let second = data(json!({ "a": { "c": 2 }, "d": [3] }));
        let merged = cascade(&schema, &registry, [&skeleton, &first, &second]).expect("cascade");
        assert_eq!(merged, data(json!({ "a": { "b": 1, "c": 2 }, "d": [3] })));
    }

    #[test]
    fn wildcard_keys_accumulate_across_layers() {
        let schema = schema(r#"{ __wildcard__: "int" }"#);
        let registry = TypeRegistry::new();
        let skeleton = schema.skeleton(&registry).expect("skeleton");
        let first = data(json!({ "x": 1, "y": 2 }));
        let second = data(json!({ "y": 5, "z": 3 }));
        let merged = cascade(&schema, &registry, [&skeleton, &first, &second]).expect("cascade");
        assert_eq!(merged, data(json!({ "x": 1, "y": 5, "z": 3 })));
    }

    #[test]
    fn nested_wildcard_sections_merge_deeply() {
        let schema = schema(r#"{ hosts: { __wildcard__: { port: "int", tls: "bool" } } }"#);
        let registry = TypeRegistry::new();
        let first = data(json!({ "hosts": { "web": { "port": 80, "tls": false } } }));
        let second = data(json!({ "hosts": { "web": { "tls": true }, "db": { "port": 5432 } } }));
        let merged = cascade(&schema, &registry, [&first, &second]).expect("cascade");
        assert_eq!(
            merged,
            data(json!({ "hosts": {
                "web": { "port": 80, "tls": true },
                "db": { "port": 5432 },
            } }))
        );
    }

    #[test]
    fn leaves_are_stored_coerced() {
        let schema = schema(r#"{ port: "int", debug: "bool", ratio: "float", ids: ["int"] }"#);
        let registry = TypeRegistry::new();
        let layer = data(json!({ "port": "8080", "debug": "True", "ratio": 1, "ids": ["1", 2] }));
        let merged = cascade(&schema, &registry, [&layer]).expect("cascade");
        assert_eq!(
            merged,
            data(json!({ "port": 8080, "debug": true, "ratio": 1.0, "ids": [1, 2] }))
        );
    }

    #[test]
    fn list_of_maps_replaces_wholesale() {
        let schema = schema(r#"{ servers: [{ host: "str", port: "int" }] }"#);
        let registry = TypeRegistry::new();
        let first = data(json!({
            "servers": [{ "host": "a", "port": 1 }, { "host": "b", "port": 2 }],
        }));
        let second = data(json!({ "servers": [{ "port": "3" }] }));
        let merged = cascade(&schema, &registry, [&first, &second]).expect("cascade");
        assert_eq!(merged, data(json!({ "servers": [{ "port": 3 }] })));
    }

    #[test]
    fn reapplying_a_layer_is_idempotent() {
        let schema = schema(r#"{ a: { b: "int" }, l: ["str"], w: { __wildcard__: "float" } }"#);
        let registry = TypeRegistry::new();
        let skeleton = schema.skeleton(&registry).expect("skeleton");
        let update = data(json!({ "a": { "b": 4 }, "l": ["x"], "w": { "k": 0.5 } }));
        let once = cascade(&schema, &registry, [&skeleton, &update]).expect("once");
        let twice = cascade(&schema, &registry, [&once, &update]).expect("twice");
        assert_eq!(once, twice);
    }

    #[test]
    fn unvalidated_leaf_fails_with_path() {
        let schema = schema(r#"{ a: { b: "int" } }"#);
        let err = cascade(&schema, &TypeRegistry::new(), [&data(json!({ "a": { "b": "x" } }))])
            .unwrap_err();
        assert_eq!(err.path, "/a/b");
    }
}
