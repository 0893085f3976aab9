//! Sample schemas and data builders.

use layerconf_rs_config::{Schema, Value};

/// Schema of a small network service, exercising every node kind.
pub const SERVICE_SCHEMA: &str = r#"{
  name: "str",
  debug: "bool",
  server: { host: "str", port: "int", timeout: "float" },
  upstreams: [{ host: "str", weight: "int" }],
  tags: ["str"],
  limits: { __wildcard__: "int" },
}"#;

pub fn service_schema() -> Schema {
    Schema::from_json5_str(SERVICE_SCHEMA).expect("service schema")
}

/// Build a data tree from a JSON literal.
pub fn data(json: serde_json::Value) -> Value {
    Value::from_json(json).expect("value")
}
