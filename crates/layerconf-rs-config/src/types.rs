//! Registry mapping schema type tags to coercion and zero-value functions.

use crate::value::Value;
use log::debug;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Coerces a raw value into the canonical form for a type tag.
pub type ParseFn = Arc<dyn Fn(&Value) -> Result<Value, String> + Send + Sync>;
/// Produces the zero value for a type tag.
pub type ZeroFn = Arc<dyn Fn() -> Value + Send + Sync>;

#[derive(Clone)]
struct TypeEntry {
    parse: ParseFn,
    zero: ZeroFn,
}

/// Type tags known to a loader. Built-ins: `str`, `int`, `float`, `bool`.
#[derive(Clone)]
pub struct TypeRegistry {
    entries: HashMap<String, TypeEntry>,
}

impl TypeRegistry {
    /// Registry with only the built-in tags.
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry.register("str", parse_str, || Value::String(String::new()));
        registry.register("int", parse_int, || Value::Integer(0));
        registry.register("float", parse_float, || Value::Float(0.0));
        registry.register("bool", parse_bool, || Value::Boolean(false));
        registry
    }

    /// Registry without any tags.
    pub fn empty() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Register (or replace) a type tag.
    pub fn register<P, Z>(&mut self, tag: impl Into<String>, parse: P, zero: Z)
    where
        P: Fn(&Value) -> Result<Value, String> + Send + Sync + 'static,
        Z: Fn() -> Value + Send + Sync + 'static,
    {
        let tag = tag.into();
        debug!("registering config type (tag={tag})");
        self.entries.insert(
            tag,
            TypeEntry {
                parse: Arc::new(parse),
                zero: Arc::new(zero),
            },
        );
    }

    /// Builder-style variant of [`TypeRegistry::register`].
    pub fn with_type<P, Z>(mut self, tag: impl Into<String>, parse: P, zero: Z) -> Self
    where
        P: Fn(&Value) -> Result<Value, String> + Send + Sync + 'static,
        Z: Fn() -> Value + Send + Sync + 'static,
    {
        self.register(tag, parse, zero);
        self
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.entries.contains_key(tag)
    }

    /// Coerce `value` with the function registered for `tag`.
    ///
    /// Returns `None` when the tag is unknown.
    pub fn parse(&self, tag: &str, value: &Value) -> Option<Result<Value, String>> {
        self.entries.get(tag).map(|entry| (entry.parse)(value))
    }

    /// Zero value for `tag`, or `None` when the tag is unknown.
    pub fn zero(&self, tag: &str) -> Option<Value> {
        self.entries.get(tag).map(|entry| (entry.zero)())
    }

    /// Registered tags, sorted.
    pub fn tags(&self) -> Vec<String> {
        let mut tags = self.entries.keys().cloned().collect::<Vec<_>>();
        tags.sort();
        tags
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeRegistry")
            .field("tags", &self.tags())
            .finish()
    }
}

/// Floats that convert to `i64` without saturating. The upper bound is 2^63.
const INT_RANGE: std::ops::Range<f64> = i64::MIN as f64..9.223_372_036_854_776e18;

fn parse_str(value: &Value) -> Result<Value, String> {
    match value {
        Value::String(text) => Ok(Value::String(text.clone())),
        Value::Float(number) => Ok(Value::String(format!("{number:?}"))),
        Value::Integer(_) | Value::Boolean(_) => Ok(Value::String(value.to_string())),
        Value::List(_) | Value::Map(_) => Err(format!("expected a string, got a {}", value.kind())),
    }
}

fn parse_int(value: &Value) -> Result<Value, String> {
    match value {
        Value::Integer(number) => Ok(Value::Integer(*number)),
        Value::Float(number) if number.is_finite() && number.fract() == 0.0 => {
            if INT_RANGE.contains(number) {
                Ok(Value::Integer(*number as i64))
            } else {
                Err(format!("{number:?} is out of range for int"))
            }
        }
        Value::String(text) => text
            .trim()
            .parse::<i64>()
            .map(Value::Integer)
            .map_err(|_| format!("invalid literal for int: {text:?}")),
        _ => Err(format!("expected an integer, got {}", describe(value))),
    }
}

fn parse_float(value: &Value) -> Result<Value, String> {
    let number = match value {
        Value::Float(number) => *number,
        Value::Integer(number) => *number as f64,
        Value::String(text) => text
            .trim()
            .parse::<f64>()
            .map_err(|_| format!("could not convert string to float: {text:?}"))?,
        _ => return Err(format!("expected a float, got {}", describe(value))),
    };
    // Persisted output is JSON, which has no infinities or NaN.
    if number.is_finite() {
        Ok(Value::Float(number))
    } else {
        Err(format!("{number} is not a finite float"))
    }
}

fn parse_bool(value: &Value) -> Result<Value, String> {
    match value {
        Value::Boolean(flag) => Ok(Value::Boolean(*flag)),
        Value::String(text) => match text.to_lowercase().as_str() {
            "true" => Ok(Value::Boolean(true)),
            "false" => Ok(Value::Boolean(false)),
            _ => Err(format!("\"{text}\" is not true or false")),
        },
        _ => Err(format!("{} is not true or false", describe(value))),
    }
}

fn describe(value: &Value) -> String {
    if value.is_scalar() {
        format!("{} {value}", value.kind())
    } else {
        format!("a {}", value.kind())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn builtin_zero_values() {
        let registry = TypeRegistry::new();
        assert_eq!(registry.zero("str"), Some(Value::from("")));
        assert_eq!(registry.zero("int"), Some(Value::Integer(0)));
        assert_eq!(registry.zero("float"), Some(Value::Float(0.0)));
        assert_eq!(registry.zero("bool"), Some(Value::Boolean(false)));
        assert_eq!(registry.zero("duration"), None);
    }

    #[test]
    fn bool_accepts_only_literal_words() {
        let registry = TypeRegistry::new();
        assert_eq!(
            registry.parse("bool", &Value::from("TRUE")),
            Some(Ok(Value::Boolean(true)))
        );
        assert_eq!(
            registry.parse("bool", &Value::from("False")),
            Some(Ok(Value::Boolean(false)))
        );
        assert_eq!(
            registry.parse("bool", &Value::from("yes")),
            Some(Err("\"yes\" is not true or false".to_string()))
        );
        assert!(matches!(registry.parse("bool", &Value::Integer(1)), Some(Err(_))));
    }

    #[test]
    fn int_coerces_strings_and_whole_floats() {
        let registry = TypeRegistry::new();
        assert_eq!(
            registry.parse("int", &Value::from(" 42 ")),
            Some(Ok(Value::Integer(42)))
        );
        assert_eq!(
            registry.parse("int", &Value::Float(3.0)),
            Some(Ok(Value::Integer(3)))
        );
        assert!(matches!(registry.parse("int", &Value::Float(3.5)), Some(Err(_))));
        assert!(matches!(registry.parse("int", &Value::map()), Some(Err(_))));
    }

    #[test]
    fn int_rejects_floats_beyond_i64() {
        let registry = TypeRegistry::new();
        assert_eq!(
            registry.parse("int", &Value::Float(1e20)),
            Some(Err("1e20 is out of range for int".to_string()))
        );
        assert_eq!(
            registry.parse("int", &Value::Float(-9_223_372_036_854_775_808.0)),
            Some(Ok(Value::Integer(i64::MIN)))
        );

        let decoded = crate::loader::parse_json5_str("inline", "{ port: 18446744073709551615 }")
            .expect("decoded");
        let port = decoded.as_map().and_then(|map| map.get("port")).expect("port");
        assert!(matches!(registry.parse("int", port), Some(Err(_))));
    }

    #[test]
    fn float_rejects_non_finite_values() {
        let registry = TypeRegistry::new();
        assert!(matches!(registry.parse("float", &Value::from("inf")), Some(Err(_))));
        assert!(matches!(registry.parse("float", &Value::from("NaN")), Some(Err(_))));
        assert!(matches!(
            registry.parse("float", &Value::Float(f64::INFINITY)),
            Some(Err(_))
        ));
        assert_eq!(
            registry.parse("float", &Value::from(" 2.5")),
            Some(Ok(Value::Float(2.5)))
        );
    }

    #[test]
    fn str_keeps_the_fraction_of_whole_floats() {
        let registry = TypeRegistry::new();
        assert_eq!(
            registry.parse("str", &Value::Float(1.0)),
            Some(Ok(Value::from("1.0")))
        );
        assert_eq!(
            registry.parse("str", &Value::Float(2.5)),
            Some(Ok(Value::from("2.5")))
        );
    }

    #[test]
    fn str_rejects_containers() {
        let registry = TypeRegistry::new();
        assert_eq!(
            registry.parse("str", &Value::Integer(7)),
            Some(Ok(Value::from("7")))
        );
        assert_eq!(
            registry.parse("str", &Value::List(Vec::new())),
            Some(Err("expected a string, got a list".to_string()))
        );
    }

    #[test]
    fn custom_types_extend_the_registry() {
        let registry = TypeRegistry::new().with_type(
            "port",
            |value| match value.as_i64() {
                Some(port) if (1..=65535).contains(&port) => Ok(Value::Integer(port)),
                _ => Err(format!("{value} is not a valid port")),
            },
            || Value::Integer(8080),
        );
        assert!(registry.contains("port"));
        assert_eq!(registry.zero("port"), Some(Value::Integer(8080)));
        assert_eq!(
            registry.parse("port", &Value::Integer(0)),
            Some(Err("0 is not a valid port".to_string()))
        );
        assert_eq!(registry.tags(), vec!["bool", "float", "int", "port", "str"]);
    }
}
