//! Command-line front end for inspecting layered configuration.

use anyhow::{Context, bail};
use clap::{Args, Parser, Subcommand};
use layerconf_rs_config::{
    Config, ConfigError, ConfigOptions, LayerStatus, Schema, SchemaError, TypeRegistry, ViewItem,
    default_source_paths, parse_assignments,
};
use log::{debug, info};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Process exit statuses, stable across releases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ExitStatus {
    Usage = 1,
    Option = 2,
    FileNotFound = 3,
    BadFileRead = 4,
    FileInsteadOfDir = 5,
    InvalidConfig = 9,
}

/// Failures of the command-line glue itself.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("no file found: {0:?}")]
    FileNotFound(PathBuf),
    #[error("expected a directory, found a file: {0:?}")]
    FileInsteadOfDir(PathBuf),
    #[error("no such key: {0}")]
    UnknownKey(String),
}

/// Command-line options for the layerconf tool.
#[derive(Debug, Parser)]
#[command(name = "layerconf", version, about = "Validate and merge layered configuration files")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Load every source and report which ones were usable
    Check(LoadArgs),
    /// Print the merged configuration, or a single dotted key
    Show {
        #[command(flatten)]
        load: LoadArgs,
        /// Dotted key to print, e.g. server.port
        key: Option<String>,
    },
    /// Print the zero-value skeleton of a schema
    Skeleton {
        /// Path to the schema document
        #[arg(long)]
        schema: PathBuf,
    },
    /// Write the merged configuration as JSON
    Dump {
        #[command(flatten)]
        load: LoadArgs,
        /// Output file
        #[arg(long)]
        out: PathBuf,
    },
}

/// Options shared by every command that loads a configuration.
#[derive(Debug, Args)]
pub struct LoadArgs {
    /// Path to the schema document
    #[arg(long)]
    pub schema: PathBuf,
    /// Config source, lowest priority first (repeatable)
    #[arg(long = "source", value_name = "PATH")]
    pub sources: Vec<PathBuf>,
    /// Override applied after every source (repeatable)
    #[arg(long = "set", value_name = "KEY=VALUE")]
    pub assignments: Vec<String>,
    /// Application name used for the default source locations
    #[arg(long, default_value = "layerconf")]
    pub app: String,
}

/// Run a parsed command, writing results to `out`.
pub fn run(cli: Cli, out: &mut dyn Write) -> anyhow::Result<()> {
    match cli.command {
        Command::Check(load) => check(&load, out),
        Command::Show { load, key } => show(&load, key.as_deref(), out),
        Command::Skeleton { schema } => skeleton(&schema, out),
        Command::Dump { load, out: path } => dump(&load, &path, out),
    }
}

/// Map a failure to the exit status reported to the shell.
pub fn exit_status(err: &anyhow::Error) -> ExitStatus {
    if let Some(err) = err.downcast_ref::<CliError>() {
        return match err {
            CliError::FileNotFound(_) => ExitStatus::FileNotFound,
            CliError::FileInsteadOfDir(_) => ExitStatus::FileInsteadOfDir,
            CliError::UnknownKey(_) => ExitStatus::Usage,
        };
    }
    if let Some(err) = err.downcast_ref::<SchemaError>() {
        return match err {
            SchemaError::Load(_) => ExitStatus::BadFileRead,
            _ => ExitStatus::InvalidConfig,
        };
    }
    match err.downcast_ref::<ConfigError>() {
        Some(ConfigError::InvalidAssignment { .. }) => ExitStatus::Option,
        _ => ExitStatus::InvalidConfig,
    }
}

fn check(args: &LoadArgs, out: &mut dyn Write) -> anyhow::Result<()> {
    let config = load(args)?;
    for layer in config.layers() {
        match &layer.status {
            LayerStatus::Loaded => writeln!(out, "ok    {}", layer.identifier)?,
            LayerStatus::Skipped(err) => {
                writeln!(out, "skip  {}", layer.identifier)?;
                for message in err.messages() {
                    writeln!(out, "      {message}")?;
                }
            }
        }
    }
    Ok(())
}

fn show(args: &LoadArgs, key: Option<&str>, out: &mut dyn Write) -> anyhow::Result<()> {
    let config = load(args)?;
    let Some(key) = key else {
        writeln!(out, "{}", config.to_json_pretty()?)?;
        return Ok(());
    };
    match config.lookup(key) {
        Some(ViewItem::Scalar(value)) => writeln!(out, "{value}")?,
        Some(item) => writeln!(out, "{}", serde_json::to_string_pretty(&item.to_value())?)?,
        None => bail!(CliError::UnknownKey(key.to_string())),
    }
    Ok(())
}

fn skeleton(schema: &Path, out: &mut dyn Write) -> anyhow::Result<()> {
    let schema = load_schema(schema)?;
    let skeleton = schema.skeleton(&TypeRegistry::new())?;
    writeln!(out, "{}", serde_json::to_string_pretty(&skeleton)?)?;
    Ok(())
}

fn dump(args: &LoadArgs, path: &Path, out: &mut dyn Write) -> anyhow::Result<()> {
    let config = load(args)?;
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        assert_dir_exists(parent)?;
    }
    config
        .write_json(path)
        .with_context(|| format!("writing {}", path.display()))?;
    writeln!(out, "wrote {}", path.display())?;
    Ok(())
}

fn load(args: &LoadArgs) -> anyhow::Result<Config> {
    let schema = load_schema(&args.schema)?;
    let sources = if args.sources.is_empty() {
        default_source_paths(&args.app)
    } else {
        args.sources.clone()
    };
    debug!("resolved config sources: {sources:?}");

    let mut options = ConfigOptions::new(schema).with_sources(sources);
    if !args.assignments.is_empty() {
        options = options.with_local_updates(parse_assignments(&args.assignments)?);
    }
    let config = Config::load(options)?;
    info!("loaded config (keys={})", config.keys().len());
    Ok(config)
}

fn load_schema(path: &Path) -> anyhow::Result<Schema> {
    let path = assert_file_exists(path)?;
    Ok(Schema::from_path(path)?)
}

/// Absolute path of an existing file.
fn assert_file_exists(path: &Path) -> Result<PathBuf, CliError> {
    let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    if absolute.exists() {
        Ok(absolute)
    } else {
        Err(CliError::FileNotFound(absolute))
    }
}

/// Create `path` as a directory when missing; a file in its place is an error.
fn assert_dir_exists(path: &Path) -> anyhow::Result<()> {
    if !path.exists() {
        fs::create_dir_all(path).with_context(|| format!("creating {}", path.display()))?;
    } else if !path.is_dir() {
        bail!(CliError::FileInsteadOfDir(path.to_path_buf()));
    }
    Ok(())
}
