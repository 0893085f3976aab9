//! Test helpers shared across layerconf crates.

pub mod files;
pub mod fixtures;
pub mod parser;

pub use files::{SourceDir, write_json5};
pub use fixtures::{SERVICE_SCHEMA, data, service_schema};
pub use parser::MemoryParser;
