//! Public surface for layerconf.
//!
//! Re-exports the configuration engine and provides a small logging helper so
//! embedding binaries set up output the same way.

pub mod cli;

/// Re-export for convenience.
pub use layerconf_rs_config as config;
pub use layerconf_rs_config::{
    Config, ConfigError, ConfigOptions, ConfigView, Schema, SchemaNode, TypeRegistry, Value,
    ViewItem,
};

#[inline]
/// Initialize logging using env_logger if the "logging" feature is enabled.
///
/// This is a no-op if the feature is not enabled. Binaries are still expected
/// to call this early in startup to ensure log output is wired up.
pub fn init_logging() {
    #[cfg(feature = "logging")]
    {
        let _ = env_logger::try_init();
    }
}
