//! Build a local-override layer from `dotted.key=value` assignments.

use super::layer_io::parse_json5_str;
use crate::error::ConfigError;
use crate::value::{Map, Value};

/// Fold assignments like `db.port=5432` into a nested map.
///
/// Values starting with `[` or `{` are decoded as JSON5; anything else stays
/// a string and is coerced by the type registry during validation. Later
/// assignments to the same key win.
pub fn parse_assignments<I, S>(assignments: I) -> Result<Value, ConfigError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut root = Map::new();
    for assignment in assignments {
        let input = assignment.as_ref();
        let (key, raw) = input.split_once('=').ok_or_else(|| invalid(input, "expected key=value"))?;
        let segments = key.trim().split('.').collect::<Vec<_>>();
        if segments.iter().any(|segment| segment.is_empty()) {
            return Err(invalid(input, "empty key segment"));
        }
        let value = parse_raw(input, raw)?;
        insert(&mut root, &segments, value, input)?;
    }
    Ok(Value::Map(root))
}

fn parse_raw(input: &str, raw: &str) -> Result<Value, ConfigError> {
    let trimmed = raw.trim_start();
    if trimmed.starts_with('[') || trimmed.starts_with('{') {
        parse_json5_str(input, raw).map_err(|err| invalid(input, &err.reason))
    } else {
        Ok(Value::String(raw.to_string()))
    }
}

fn insert(map: &mut Map, segments: &[&str], value: Value, input: &str) -> Result<(), ConfigError> {
    let [head, rest @ ..] = segments else {
        return Ok(());
    };
    if rest.is_empty() {
        map.insert(head.to_string(), value);
        return Ok(());
    }
    let slot = map.entry(head.to_string()).or_insert_with(Value::map);
    match slot {
        Value::Map(child) => insert(child, rest, value, input),
        _ => Err(invalid(input, &format!("{head} is already set to a non-map value"))),
    }
}

fn invalid(input: &str, message: &str) -> ConfigError {
    ConfigError::InvalidAssignment {
        input: input.to_string(),
        message: message.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn builds_nested_maps() {
        let value = parse_assignments(["db.host=localhost", "db.port=5432", "debug=true"])
            .expect("assignments");
        assert_eq!(
            value,
            Value::from_json(json!({
                "db": { "host": "localhost", "port": "5432" },
                "debug": "true",
            }))
            .expect("value")
        );
    }

    #[test]
    fn decodes_structured_values() {
        let value = parse_assignments(["ports=[80, 443]", "env={ HOME: '/root' }", "note=a=b"])
            .expect("assignments");
        assert_eq!(
            value,
            Value::from_json(json!({
                "ports": [80, 443],
                "env": { "HOME": "/root" },
                "note": "a=b",
            }))
            .expect("value")
        );
    }

    #[test]
    fn rejects_malformed_assignments() {
        assert!(matches!(
            parse_assignments(["verbose"]),
            Err(ConfigError::InvalidAssignment { .. })
        ));
        assert!(matches!(
            parse_assignments(["db..port=1"]),
            Err(ConfigError::InvalidAssignment { .. })
        ));
        assert!(matches!(
            parse_assignments(["db=1", "db.port=2"]),
            Err(ConfigError::InvalidAssignment { .. })
        ));
    }
}
