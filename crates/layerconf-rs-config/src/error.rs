//! Error types for schema checking, source loading, validation and cascading.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Problems with the schema itself. These are never recovered from.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// A leaf names a type tag that is not in the registry.
    #[error("schema at {path}: type {tag:?} is not registered")]
    UnknownType { path: String, tag: String },
    /// A list schema must hold exactly one inner schema.
    #[error("schema at {path}: a list schema should have exactly one item, got {len}")]
    ListArity { path: String, len: usize },
    /// The wildcard key shares its map with other keys.
    #[error("schema at {path}: a map with {marker} should have only one item, got {len}")]
    WildcardSiblings {
        path: String,
        marker: &'static str,
        len: usize,
    },
    /// A schema node is neither a type tag, a list nor a map.
    #[error("schema at {path}: {message}")]
    InvalidNode { path: String, message: String },
    /// The schema root has to describe a map.
    #[error("schema root must be a map")]
    RootNotMap,
    /// Reading or decoding a schema document failed.
    #[error("failed to load schema: {0}")]
    Load(String),
}

/// Failure reported by a source parser.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{identifier} did not parse: {reason}")]
pub struct ParseError {
    /// Path or logical name of the source.
    pub identifier: String,
    /// Underlying reason.
    pub reason: String,
}

impl ParseError {
    pub fn new(identifier: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            reason: reason.into(),
        }
    }
}

/// A single path-qualified validation failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    /// Slash-delimited location from the root (`/`, `/a/b`, `/list/0`).
    pub path: String,
    /// What went wrong at that location.
    pub message: String,
}

impl FieldError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.path, self.message)
    }
}

/// Why a single source did not contribute to the cascade.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceErrorKind {
    /// The source does not exist.
    NotFound,
    /// The parser rejected the source.
    Parse(String),
    /// The source parsed but did not match the schema.
    Invalid(Vec<FieldError>),
}

/// A per-source load or validation failure, tagged with its identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceError {
    pub identifier: String,
    pub kind: SourceErrorKind,
}

impl SourceError {
    /// Render one line per problem, prefixed with the source identifier.
    pub fn messages(&self) -> Vec<String> {
        match &self.kind {
            SourceErrorKind::NotFound => vec![format!("{} - file not found", self.identifier)],
            SourceErrorKind::Parse(reason) => {
                vec![format!("{} - file did not parse: {reason}", self.identifier)]
            }
            SourceErrorKind::Invalid(errors) => errors
                .iter()
                .map(|err| format!("{} - {err}", self.identifier))
                .collect(),
        }
    }
}

impl fmt::Display for SourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.messages().join("; "))
    }
}

impl std::error::Error for SourceError {}

/// Coercion failure while merging a layer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cascade failed at {path}: {message}")]
pub struct CascadeError {
    pub path: String,
    pub message: String,
}

/// Errors returned at the config API boundary.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The schema is malformed.
    #[error(transparent)]
    Schema(#[from] SchemaError),
    /// A layer could not be merged.
    #[error(transparent)]
    Cascade(#[from] CascadeError),
    /// Every declared source failed to load or validate.
    #[error("no good configuration found:\n{}", render_source_errors(.errors))]
    NoUsableSource { errors: Vec<SourceError> },
    /// An update payload did not validate; nothing was applied.
    #[error("update did not validate:\n{}", render_field_errors(.errors))]
    UpdateRejected { errors: Vec<FieldError> },
    /// Writes through a view are not supported.
    #[error("config view does not support assignment (key {name:?})")]
    ReadOnly { name: String },
    /// A `key=value` override could not be interpreted.
    #[error("invalid assignment {input:?}: {message}")]
    InvalidAssignment { input: String, message: String },
    /// Persisting the merged configuration failed.
    #[error("failed to write config to {}: {source}", .path.display())]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Converting JSON values failed.
    #[error("failed to decode config: {0}")]
    DecodeFailed(#[from] serde_json::Error),
}

fn render_source_errors(errors: &[SourceError]) -> String {
    errors
        .iter()
        .flat_map(SourceError::messages)
        .map(|line| format!("  {line}"))
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_field_errors(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|err| format!("  {err}"))
        .collect::<Vec<_>>()
        .join("\n")
}
