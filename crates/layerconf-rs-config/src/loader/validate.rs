//! Schema validation that collects every violation instead of stopping early.

use crate::error::FieldError;
use crate::schema::{Schema, SchemaNode};
use crate::types::TypeRegistry;
use crate::value::{Map, Value, join_path};

/// Check `data` against `schema`, returning one error per violation.
///
/// Keys declared in the schema but missing from `data` are not errors;
/// partial layers are completed by the cascade.
pub fn validate(schema: &Schema, registry: &TypeRegistry, data: &Value) -> Vec<FieldError> {
    let mut errors = Vec::new();
    validate_node(schema.root(), registry, data, "/", &mut errors);
    errors
}

fn validate_node(
    node: &SchemaNode,
    registry: &TypeRegistry,
    data: &Value,
    path: &str,
    errors: &mut Vec<FieldError>,
) {
    match node {
        SchemaNode::Type(tag) => match registry.parse(tag, data) {
            Some(Ok(_)) => {}
            Some(Err(reason)) => errors.push(FieldError::new(path, reason)),
            None => errors.push(FieldError::new(path, format!("type {tag:?} is not registered"))),
        },
        SchemaNode::List(inner) => {
            let Value::List(items) = data else {
                errors.push(FieldError::new(path, format!("expected a list, got {}", data.kind())));
                return;
            };
            for (idx, item) in items.iter().enumerate() {
                validate_node(inner, registry, item, &join_path(path, &idx.to_string()), errors);
            }
        }
        SchemaNode::Map(entries) => {
            let Some(map) = expect_map(data, path, errors) else {
                return;
            };
            for (key, item) in map {
                let child = join_path(path, key);
                match entries.get(key) {
                    Some(sub) => validate_node(sub, registry, item, &child, errors),
                    None => errors.push(FieldError::new(
                        child,
                        format!(
                            "unexpected key {key:?}, expected one of [{}]",
                            entries.keys().cloned().collect::<Vec<_>>().join(", ")
                        ),
                    )),
                }
            }
        }
        SchemaNode::Wildcard(inner) => {
            let Some(map) = expect_map(data, path, errors) else {
                return;
            };
            for (key, item) in map {
                validate_node(inner, registry, item, &join_path(path, key), errors);
            }
        }
    }
}

fn expect_map<'a>(data: &'a Value, path: &str, errors: &mut Vec<FieldError>) -> Option<&'a Map> {
    match data {
        Value::Map(map) => Some(map),
        _ => {
            errors.push(FieldError::new(path, format!("expected a map, got {}", data.kind())));
            None
        }
    }
}
