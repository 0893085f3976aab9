//! IO helpers for reading config sources from disk.

use super::{DEFAULT_CONFIG_DIR_PREFIX, DEFAULT_CONFIG_FILE, LoadedLayer, validate};
use crate::error::{ParseError, SourceError, SourceErrorKind};
use crate::schema::Schema;
use crate::types::TypeRegistry;
use crate::value::Value;
use directories::UserDirs;
use log::{debug, warn};
use std::fs;
use std::path::{Path, PathBuf};

/// Turns a source path into a data tree.
pub trait SourceParser {
    /// Whether the source exists at all.
    fn exists(&self, source: &Path) -> bool {
        source.exists()
    }

    /// Read and decode the source.
    fn parse(&self, source: &Path) -> Result<Value, ParseError>;
}

impl<F> SourceParser for F
where
    F: Fn(&Path) -> Result<Value, ParseError>,
{
    fn parse(&self, source: &Path) -> Result<Value, ParseError> {
        self(source)
    }
}

/// Default parser: reads a file and decodes JSON5 (plain JSON included).
#[derive(Debug, Clone, Copy, Default)]
pub struct Json5Parser;

impl SourceParser for Json5Parser {
    fn parse(&self, source: &Path) -> Result<Value, ParseError> {
        let identifier = source.display().to_string();
        let contents = fs::read_to_string(source)
            .map_err(|err| ParseError::new(&identifier, err.to_string()))?;
        parse_json5_str(&identifier, &contents)
    }
}

/// Decode JSON5 text into a data tree.
pub fn parse_json5_str(identifier: &str, contents: &str) -> Result<Value, ParseError> {
    let json: serde_json::Value =
        json5::from_str(contents).map_err(|err| ParseError::new(identifier, err.to_string()))?;
    Value::from_json(json).map_err(|reason| ParseError::new(identifier, reason))
}

/// Validate a decoded tree; an invalid tree becomes a source error.
pub(super) fn accept_layer(
    identifier: &str,
    value: Value,
    schema: &Schema,
    registry: &TypeRegistry,
) -> Result<LoadedLayer, SourceError> {
    let errors = validate(schema, registry, &value);
    if !errors.is_empty() {
        warn!(
            "config source failed validation (source={identifier}, errors={})",
            errors.len()
        );
        return Err(SourceError {
            identifier: identifier.to_string(),
            kind: SourceErrorKind::Invalid(errors),
        });
    }
    debug!("accepted config layer (source={identifier})");
    Ok(LoadedLayer {
        identifier: identifier.to_string(),
        value,
    })
}

/// Check existence, parse, then validate one source file.
pub(super) fn load_source(
    path: &Path,
    parser: &dyn SourceParser,
    schema: &Schema,
    registry: &TypeRegistry,
) -> Result<LoadedLayer, SourceError> {
    let identifier = path.display().to_string();
    if !parser.exists(path) {
        debug!("config source missing (source={identifier})");
        return Err(SourceError {
            identifier,
            kind: SourceErrorKind::NotFound,
        });
    }
    debug!("loading config source (source={identifier})");
    let value = parser.parse(path).map_err(|err| {
        warn!("config source did not parse (source={identifier}, reason={})", err.reason);
        SourceError {
            identifier: identifier.clone(),
            kind: SourceErrorKind::Parse(err.reason),
        }
    })?;
    accept_layer(&identifier, value, schema, registry)
}

/// Conventional system and user source paths for an application, lowest priority first.
///
/// System: `/etc/<app>/config.json5` on Unix. User: `~/.<app>/config.json5`.
pub fn default_source_paths(app_name: &str) -> Vec<PathBuf> {
    let mut paths = Vec::new();
    if let Some(path) = default_system_config_path(app_name) {
        paths.push(path);
    }
    if let Some(path) = default_user_config_path(app_name) {
        paths.push(path);
    }
    paths
}

/// Default system config path on Unix; None elsewhere.
fn default_system_config_path(app_name: &str) -> Option<PathBuf> {
    #[cfg(unix)]
    {
        Some(Path::new("/etc").join(app_name).join(DEFAULT_CONFIG_FILE))
    }
    #[cfg(not(unix))]
    {
        let _ = app_name;
        None
    }
}

/// Default user config path under the home directory.
fn default_user_config_path(app_name: &str) -> Option<PathBuf> {
    UserDirs::new().map(|dirs| {
        dirs.home_dir()
            .join(format!("{DEFAULT_CONFIG_DIR_PREFIX}{app_name}"))
            .join(DEFAULT_CONFIG_FILE)
    })
}
