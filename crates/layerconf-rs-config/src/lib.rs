//! Schema-driven layered configuration.
//!
//! A [`Schema`] describes the expected shape and leaf types. [`Config::load`]
//! reads every source, validates each one independently, cascades the usable
//! ones over a zero-value skeleton and exposes the merged tree through an
//! immutable [`ConfigView`].

mod error;
mod loader;
mod schema;
mod types;
mod value;
mod view;

/// Error types returned by schema, loading and validation APIs.
pub use error::{
    CascadeError, ConfigError, FieldError, ParseError, SchemaError, SourceError, SourceErrorKind,
};
/// Layered loader, source parsing and the core algorithms.
pub use loader::{
    Config, ConfigOptions, Json5Parser, LOCAL_UPDATES_LAYER, LayerReport, LayerStatus,
    SKELETON_LAYER, SourceParser, cascade, default_source_paths, parse_assignments,
    parse_json5_str, validate,
};
/// Schema model and skeleton generation.
pub use schema::{Schema, SchemaNode, WILDCARD_KEY, skeleton};
/// Type tag registry.
pub use types::{ParseFn, TypeRegistry, ZeroFn};
/// Generic data tree.
pub use value::{Map, Value};
/// Read-only configuration views.
pub use view::{ConfigView, ViewItem};
