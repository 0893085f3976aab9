//! Layered configuration loader.
//!
//! Builds the schema skeleton, loads and validates every declared source,
//! cascades the good ones (plus optional local overrides) and exposes the
//! result through an immutable [`ConfigView`].

mod layer_io;
mod merge;
mod overrides;
mod validate;


pub use layer_io::{Json5Parser, SourceParser, default_source_paths, parse_json5_str};
pub use merge::cascade;
pub use overrides::parse_assignments;
pub use validate::validate;

use crate::error::{ConfigError, SourceError};
use crate::schema::Schema;
use crate::types::TypeRegistry;
use crate::value::Value;
use crate::view::{ConfigView, ViewItem};
use log::{debug, info, warn};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Default config filename for conventional source locations.
const DEFAULT_CONFIG_FILE: &str = "config.json5";
/// Prefix of the per-user config directory (`~/.<app>`).
const DEFAULT_CONFIG_DIR_PREFIX: &str = ".";
/// Identifier of the zero-value base layer.
pub const SKELETON_LAYER: &str = "skeleton";
/// Identifier of the in-memory override layer.
pub const LOCAL_UPDATES_LAYER: &str = "local_updates";

/// Options for [`Config::load`].
pub struct ConfigOptions {
    /// Shape and leaf types every source must match.
    pub schema: Schema,
    /// Source paths, lowest priority first.
    pub sources: Vec<PathBuf>,
    /// In-memory overrides applied after every source (e.g. from CLI flags).
    pub local_updates: Option<Value>,
    /// Parser used for every source; defaults to [`Json5Parser`].
    pub parser: Option<Box<dyn SourceParser>>,
    /// Type tags available to the schema; defaults to the built-ins.
    pub type_registry: Option<TypeRegistry>,
}

impl ConfigOptions {
    /// Options with no sources, the default parser and the built-in types.
    pub fn new(schema: Schema) -> Self {
        Self {
            schema,
            sources: Vec::new(),
            local_updates: None,
            parser: None,
            type_registry: None,
        }
    }

    /// Add a source path; later sources take precedence.
    pub fn with_source(mut self, path: impl AsRef<Path>) -> Self {
        self.sources.push(path.as_ref().to_path_buf());
        self
    }

    /// Add several source paths in priority order.
    pub fn with_sources<I, P>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        self.sources
            .extend(paths.into_iter().map(|path| path.as_ref().to_path_buf()));
        self
    }

    /// Add the conventional system and user paths for `app_name`.
    pub fn with_default_sources(self, app_name: &str) -> Self {
        self.with_sources(default_source_paths(app_name))
    }

    /// Set the highest-priority in-memory layer.
    pub fn with_local_updates(mut self, local_updates: Value) -> Self {
        self.local_updates = Some(local_updates);
        self
    }

    /// Replace the source parser.
    pub fn with_parser(mut self, parser: impl SourceParser + 'static) -> Self {
        self.parser = Some(Box::new(parser));
        self
    }

    /// Replace the type registry.
    pub fn with_type_registry(mut self, registry: TypeRegistry) -> Self {
        self.type_registry = Some(registry);
        self
    }
}

impl fmt::Debug for ConfigOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigOptions")
            .field("schema", &self.schema)
            .field("sources", &self.sources)
            .field("local_updates", &self.local_updates)
            .field("parser", &self.parser.as_ref().map(|_| "custom"))
            .field("type_registry", &self.type_registry)
            .finish()
    }
}

/// Outcome of one layer during the last load.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerReport {
    /// Path, or [`SKELETON_LAYER`] / [`LOCAL_UPDATES_LAYER`].
    pub identifier: String,
    pub status: LayerStatus,
}

/// Whether a layer contributed to the cascade.
#[derive(Debug, Clone, PartialEq)]
pub enum LayerStatus {
    Loaded,
    Skipped(SourceError),
}

/// Internal representation of a layer that loaded and validated.
#[derive(Debug, Clone)]
struct LoadedLayer {
    identifier: String,
    value: Value,
}

/// Merged tree plus per-layer metadata from one load pass.
struct LoadOutcome {
    merged: Value,
    layers: Vec<LayerReport>,
}

/// A loaded, validated and merged configuration.
pub struct Config {
    schema: Schema,
    registry: TypeRegistry,
    parser: Box<dyn SourceParser>,
    sources: Vec<PathBuf>,
    local_updates: Option<Value>,
    /// Accepted `update` payloads, re-applied by `reload`.
    updates: Vec<Value>,
    merged: Arc<Value>,
    view: ConfigView,
    layers: Vec<LayerReport>,
}

impl Config {
    /// Load every source, cascade the usable ones and expose the result.
    ///
    /// Sources that are missing, fail to parse or fail validation are skipped
    /// and recorded. Loading fails only when the schema is malformed or when
    /// no source (local overrides included) was usable.
    pub fn load(options: ConfigOptions) -> Result<Self, ConfigError> {
        let ConfigOptions {
            schema,
            sources,
            local_updates,
            parser,
            type_registry,
        } = options;
        let registry = type_registry.unwrap_or_default();
        let parser = parser.unwrap_or_else(|| Box::new(Json5Parser) as Box<dyn SourceParser>);

        let outcome = load_layers(
            &schema,
            &registry,
            parser.as_ref(),
            &sources,
            local_updates.as_ref(),
        )?;
        let merged = Arc::new(outcome.merged);
        Ok(Self {
            schema,
            registry,
            parser,
            sources,
            local_updates,
            updates: Vec::new(),
            view: ConfigView::from_shared(Arc::clone(&merged)),
            merged,
            layers: outcome.layers,
        })
    }

    /// Snapshot of the current configuration.
    pub fn view(&self) -> ConfigView {
        self.view.clone()
    }

    /// Look up a top-level key in the current snapshot.
    pub fn get(&self, name: &str) -> Option<ViewItem> {
        self.view.get(name)
    }

    /// Look up a dotted path in the current snapshot.
    pub fn lookup(&self, dotted: &str) -> Option<ViewItem> {
        self.view.lookup(dotted)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.view.contains(name)
    }

    pub fn keys(&self) -> Vec<String> {
        self.view.keys()
    }

    /// The merged tree.
    pub fn merged(&self) -> &Value {
        &self.merged
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn type_registry(&self) -> &TypeRegistry {
        &self.registry
    }

    /// Per-layer outcomes of the last load, skeleton first.
    pub fn layers(&self) -> &[LayerReport] {
        &self.layers
    }

    /// One `"<source> - <message>"` line per problem found during the last load.
    pub fn errors(&self) -> Vec<String> {
        self.layers
            .iter()
            .filter_map(|layer| match &layer.status {
                LayerStatus::Skipped(err) => Some(err.messages()),
                LayerStatus::Loaded => None,
            })
            .flatten()
            .collect()
    }

    /// Cascade `data` on top of the current configuration and re-expose it.
    ///
    /// `data` may be partial but must otherwise match the schema. On failure
    /// nothing changes.
    pub fn update(&mut self, data: Value) -> Result<(), ConfigError> {
        let errors = validate(&self.schema, &self.registry, &data);
        if !errors.is_empty() {
            warn!("rejected config update (errors={})", errors.len());
            return Err(ConfigError::UpdateRejected { errors });
        }
        let merged = cascade(&self.schema, &self.registry, [self.merged.as_ref(), &data])?;
        self.expose(merged);
        self.updates.push(data);
        debug!("applied config update (updates={})", self.updates.len());
        Ok(())
    }

    /// Re-read every source and re-apply accepted updates.
    ///
    /// On failure the current configuration is kept.
    pub fn reload(&mut self) -> Result<(), ConfigError> {
        info!("reloading config (sources={})", self.sources.len());
        let outcome = load_layers(
            &self.schema,
            &self.registry,
            self.parser.as_ref(),
            &self.sources,
            self.local_updates.as_ref(),
        )?;
        let mut merged = outcome.merged;
        for update in &self.updates {
            merged = cascade(&self.schema, &self.registry, [&merged, update])?;
        }
        self.expose(merged);
        self.layers = outcome.layers;
        Ok(())
    }

    /// Pretty JSON with sorted keys.
    pub fn to_json_pretty(&self) -> Result<String, ConfigError> {
        self.view.to_json_pretty()
    }

    /// Persist the merged configuration as JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let mut contents = self.to_json_pretty()?;
        contents.push('\n');
        fs::write(path, contents).map_err(|source| ConfigError::WriteFailed {
            path: path.to_path_buf(),
            source,
        })?;
        info!("wrote merged config (path={})", path.display());
        Ok(())
    }

    /// Swap in a new merged tree and a fresh view over it.
    fn expose(&mut self, merged: Value) {
        self.merged = Arc::new(merged);
        self.view = ConfigView::from_shared(Arc::clone(&self.merged));
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("sources", &self.sources)
            .field("layers", &self.layers)
            .field("merged", &self.merged)
            .finish_non_exhaustive()
    }
}

/// Skeleton, sources and local overrides -> merged tree.
fn load_layers(
    schema: &Schema,
    registry: &TypeRegistry,
    parser: &dyn SourceParser,
    sources: &[PathBuf],
    local_updates: Option<&Value>,
) -> Result<LoadOutcome, ConfigError> {
    schema.check(registry)?;
    let skeleton = schema.skeleton(registry)?;
    let mut layers = vec![LayerReport {
        identifier: SKELETON_LAYER.to_string(),
        status: LayerStatus::Loaded,
    }];
    let mut merge_layers = vec![LoadedLayer {
        identifier: SKELETON_LAYER.to_string(),
        value: skeleton,
    }];
    let mut failures = Vec::new();

    let mut record = |result: Result<LoadedLayer, SourceError>| match result {
        Ok(layer) => {
            layers.push(LayerReport {
                identifier: layer.identifier.clone(),
                status: LayerStatus::Loaded,
            });
            merge_layers.push(layer);
        }
        Err(err) => {
            layers.push(LayerReport {
                identifier: err.identifier.clone(),
                status: LayerStatus::Skipped(err.clone()),
            });
            failures.push(err);
        }
    };

    for path in sources {
        record(layer_io::load_source(path, parser, schema, registry));
    }
    if let Some(local_updates) = local_updates {
        record(layer_io::accept_layer(
            LOCAL_UPDATES_LAYER,
            local_updates.clone(),
            schema,
            registry,
        ));
    }

    if merge_layers.len() == 1 {
        warn!("no usable config source (failures={})", failures.len());
        return Err(ConfigError::NoUsableSource { errors: failures });
    }

    let merged = cascade(schema, registry, merge_layers.iter().map(|layer| &layer.value))?;
    info!(
        "config loaded (layers={}, skipped={})",
        merge_layers.len(),
        failures.len()
    );
    Ok(LoadOutcome { merged, layers })
}
