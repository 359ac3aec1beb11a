//! Generation configuration (`mcpgen.yaml`).
//!
//! ```yaml
//! spec: mcp.yaml
//! output: src/generated
//! types:
//!   filename: types.rs
//!   module: super::types
//! server:
//!   filename: server.rs
//!   module: super::server
//! resolver:
//!   filename: resolver.rs
//!   module: super::resolver
//!   type: Resolver
//!   preserve: true
//! handlers:
//!   filename: handlers.rs
//! models:
//!   Timestamp:
//!     model: chrono::NaiveDateTime
//! ```
//!
//! Every key is optional. Paths are relative to the directory of the configuration file.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{GenError, Result};
use crate::spec::find_spec_file;

/// Configuration files tried, in order, when none is given.
pub const DEFAULT_CONFIG_FILES: [&str; 2] = ["mcpgen.yaml", "mcpgen.yml"];

#[allow(clippy::expect_used)]
static IDENT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("identifier regex should be valid"));

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TypesConfig {
    pub filename: String,
    /// Module path other generated files use to import the types.
    pub module: String,
}

impl Default for TypesConfig {
    fn default() -> Self {
        Self {
            filename: "types.rs".to_string(),
            module: "super::types".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub filename: String,
    pub module: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            filename: "server.rs".to_string(),
            module: "super::server".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Scaffold holding the resolver struct; written once.
    pub filename: String,
    pub module: String,
    /// Name of the struct the handler traits are implemented for.
    #[serde(rename = "type")]
    pub type_name: String,
    /// Merge new handlers into the existing handler file instead of overwriting it.
    pub preserve: bool,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            filename: "resolver.rs".to_string(),
            module: "super::resolver".to_string(),
            type_name: "Resolver".to_string(),
            preserve: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HandlersConfig {
    pub filename: String,
}

impl Default for HandlersConfig {
    fn default() -> Self {
        Self {
            filename: "handlers.rs".to_string(),
        }
    }
}

/// External type for a schema name: `chrono::NaiveDate` or `{ model: chrono::NaiveDate }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ModelOverride {
    Path(String),
    Model { model: String },
}

impl ModelOverride {
    pub fn model(&self) -> &str {
        match self {
            ModelOverride::Path(p) => p,
            ModelOverride::Model { model } => model,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationOptions {
    /// Generate even when the spec fails validation.
    pub skip_validation: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub spec: PathBuf,
    pub output: PathBuf,
    pub types: TypesConfig,
    pub server: ServerConfig,
    pub resolver: ResolverConfig,
    pub handlers: HandlersConfig,
    /// Crate name generated code imports runtime support from.
    pub runtime_crate: String,
    /// Write `mod.rs` in the output directory declaring the generated modules.
    pub mod_file: bool,
    pub models: BTreeMap<String, ModelOverride>,
    pub options: GenerationOptions,
    /// Directory relative paths resolve against; the config file's directory.
    #[serde(skip)]
    pub base_dir: PathBuf,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            spec: PathBuf::from("mcp.yaml"),
            output: PathBuf::from("generated"),
            types: TypesConfig::default(),
            server: ServerConfig::default(),
            resolver: ResolverConfig::default(),
            handlers: HandlersConfig::default(),
            runtime_crate: "mcpgen_runtime".to_string(),
            mod_file: true,
            models: BTreeMap::new(),
            options: GenerationOptions::default(),
            base_dir: PathBuf::from("."),
        }
    }
}

impl GeneratorConfig {
    /// Load from YAML, JSON or TOML, chosen by extension, and validate.
    pub fn load(path: &Path) -> Result<Self> {
        let config_err = |message: String| GenError::Config {
            path: path.to_path_buf(),
            message,
        };
        let content = fs::read_to_string(path).map_err(|e| config_err(e.to_string()))?;
        let mut config: GeneratorConfig = match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => {
                serde_yaml::from_str(&content).map_err(|e| config_err(e.to_string()))?
            }
            Some("json") => serde_json::from_str(&content).map_err(|e| config_err(e.to_string()))?,
            Some("toml") => toml::from_str(&content).map_err(|e| config_err(e.to_string()))?,
            other => {
                return Err(config_err(format!(
                    "unsupported config file format {:?} (use .yaml, .yml, .json or .toml)",
                    other.unwrap_or("")
                )))
            }
        };
        config.base_dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        config.validate().map_err(config_err)?;
        Ok(config)
    }

    /// The first of [`DEFAULT_CONFIG_FILES`] that exists in `dir`.
    pub fn find_default(dir: &Path) -> Option<PathBuf> {
        DEFAULT_CONFIG_FILES
            .iter()
            .map(|name| dir.join(name))
            .find(|p| p.exists())
    }

    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.spec.as_os_str().is_empty() {
            return Err("spec path is required".to_string());
        }
        if self.output.as_os_str().is_empty() {
            return Err("output is required".to_string());
        }
        for (key, filename) in [
            ("types.filename", &self.types.filename),
            ("server.filename", &self.server.filename),
            ("resolver.filename", &self.resolver.filename),
            ("handlers.filename", &self.handlers.filename),
        ] {
            if !filename.ends_with(".rs") || filename.len() <= 3 {
                return Err(format!("{key} must name a .rs file, got {filename:?}"));
            }
        }
        for (key, module) in [
            ("types.module", &self.types.module),
            ("server.module", &self.server.module),
            ("resolver.module", &self.resolver.module),
        ] {
            if syn::parse_str::<syn::Path>(module).is_err() {
                return Err(format!("{key} must be a Rust module path, got {module:?}"));
            }
        }
        if !IDENT_RE.is_match(&self.resolver.type_name) {
            return Err(format!(
                "resolver.type must be a Rust identifier, got {:?}",
                self.resolver.type_name
            ));
        }
        if !IDENT_RE.is_match(&self.runtime_crate) {
            return Err(format!(
                "runtime_crate must be a crate name, got {:?}",
                self.runtime_crate
            ));
        }
        for (name, model) in &self.models {
            if model.model().trim().is_empty() {
                return Err(format!("models.{name}.model is empty"));
            }
        }
        Ok(())
    }

    /// Spec path, with extension fallback.
    pub fn spec_path(&self) -> PathBuf {
        find_spec_file(&self.base_dir.join(&self.spec))
    }

    pub fn output_dir(&self) -> PathBuf {
        self.base_dir.join(&self.output)
    }

    /// Module name of a generated file (`types.rs` → `types`).
    pub fn module_name(filename: &str) -> &str {
        filename.strip_suffix(".rs").unwrap_or(filename)
    }
}
