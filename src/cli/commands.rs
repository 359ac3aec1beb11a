use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::debug;

use crate::config::{GeneratorConfig, DEFAULT_CONFIG_FILES};
use crate::generator::{
    render, FileOutcome, Generator, InitConfigTemplate, InitSpecTemplate,
};

/// Command-line interface for mcpgen
///
/// Generates a typed server skeleton from an API description and keeps hand-written
/// handlers intact across runs.
#[derive(Parser, Debug)]
#[command(name = "mcpgen", version)]
#[command(about = "Schema-first server generator", long_about = None)]
pub struct Cli {
    /// Log at debug level
    #[arg(short, long, global = true, default_value_t = false)]
    pub verbose: bool,

    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate types, server wiring and handler stubs
    Generate {
        /// Path to the generator configuration (default: mcpgen.yaml, then mcpgen.yml)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Load the configuration and spec and resolve every schema reference
    Validate {
        /// Path to the generator configuration (default: mcpgen.yaml, then mcpgen.yml)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Write a starter mcpgen.yaml and mcp.yaml
    ///
    /// With NAME, the files go into a new directory of that name; without, into the current
    /// directory. Existing files are never overwritten.
    Init {
        /// Directory to create
        name: Option<PathBuf>,
    },
}

/// Execute the CLI command
///
/// # Errors
///
/// Returns an error if:
/// - The configuration or spec cannot be loaded or fails validation
/// - A schema reference cannot be resolved
/// - Generated code fails to parse
/// - The handler file cannot be merged
/// - `init` would overwrite an existing file
pub fn run_cli(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Generate { config } => {
            let config = load_config(config.as_deref())?;
            let report = Generator::from_config(config)?.run()?;
            for file in &report.files {
                let name = file
                    .path
                    .file_name()
                    .map_or_else(|| file.label.to_string(), |n| n.to_string_lossy().into_owned());
                match file.outcome {
                    FileOutcome::Written => println!("✅ Generated {name} → {:?}", file.path),
                    FileOutcome::Unchanged => println!("✅ Unchanged {name} → {:?}", file.path),
                    FileOutcome::Kept => println!("✅ Kept {name} → {:?}", file.path),
                    FileOutcome::Merged(summary) => {
                        println!("✅ Merged {name} → {:?} ({summary})", file.path)
                    }
                }
            }
            println!("✅ {} types", report.types.len());
            Ok(())
        }
        Commands::Validate { config } => {
            let config = load_config(config.as_deref())?;
            let spec_path = config.spec_path();
            let summary = Generator::from_config(config)?.check()?;
            println!("✅ {} is valid: {summary}", spec_path.display());
            Ok(())
        }
        Commands::Init { name } => {
            let cwd = env::current_dir().context("Failed to read current directory")?;
            let dir = match name {
                Some(name) => cwd.join(name),
                None => cwd,
            };
            for path in init_project(&dir)? {
                println!("✅ Created {path:?}");
            }
            Ok(())
        }
    }
}

/// The explicit configuration path, or the default file in the current directory.
fn load_config(path: Option<&Path>) -> Result<GeneratorConfig> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => {
            let cwd = env::current_dir().context("Failed to read current directory")?;
            GeneratorConfig::find_default(&cwd).with_context(|| {
                format!(
                    "no {} found in {}; run `mcpgen init` or pass --config",
                    DEFAULT_CONFIG_FILES.join(" or "),
                    cwd.display()
                )
            })?
        }
    };
    debug!(config = %path.display(), "loading configuration");
    Ok(GeneratorConfig::load(&path)?)
}

/// Write the starter configuration and spec into `dir`, creating it if needed.
///
/// The spec title is the directory name.
///
/// # Errors
///
/// Fails before writing anything when either file already exists.
pub fn init_project(dir: &Path) -> Result<Vec<PathBuf>> {
    let config_path = dir.join(DEFAULT_CONFIG_FILES[0]);
    let spec_path = dir.join("mcp.yaml");
    for path in [&config_path, &spec_path] {
        if path.exists() {
            bail!("{} already exists, refusing to overwrite", path.display());
        }
    }

    let name = dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| "mcp-server".to_string());

    fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))?;
    let config = render(&InitConfigTemplate, "mcpgen.yaml")?;
    let spec = render(&InitSpecTemplate { name }, "mcp.yaml")?;
    fs::write(&config_path, config)
        .with_context(|| format!("Failed to write {}", config_path.display()))?;
    fs::write(&spec_path, spec).with_context(|| format!("Failed to write {}", spec_path.display()))?;
    Ok(vec![config_path, spec_path])
}
