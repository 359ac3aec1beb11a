use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::types::ApiSpec;
use crate::error::{GenError, Result};

/// Load an API description from YAML (`.yaml`, `.yml`) or JSON (`.json`).
///
/// The document is parsed but not validated; see [`ApiSpec::validate`].
pub fn load_spec(path: &Path) -> Result<ApiSpec> {
    let load_err = |message: String| GenError::SpecLoad {
        path: path.to_path_buf(),
        message,
    };

    let content = fs::read_to_string(path).map_err(|e| load_err(e.to_string()))?;
    let value: serde_json::Value = match path.extension().and_then(|e| e.to_str()) {
        Some("yaml") | Some("yml") => {
            serde_yaml::from_str(&content).map_err(|e| load_err(format!("invalid YAML: {e}")))?
        }
        Some("json") => {
            serde_json::from_str(&content).map_err(|e| load_err(format!("invalid JSON: {e}")))?
        }
        other => {
            return Err(load_err(format!(
                "unsupported spec file format {:?} (use .yaml, .yml, or .json)",
                other.unwrap_or("")
            )))
        }
    };
    let spec: ApiSpec = serde_json::from_value(value).map_err(|e| load_err(e.to_string()))?;
    debug!(
        path = %path.display(),
        tools = spec.tools.len(),
        resources = spec.resources.len(),
        prompts = spec.prompts.len(),
        schemas = spec.components.schemas.len(),
        "loaded spec"
    );
    Ok(spec)
}

/// Resolve the spec path, trying the other supported extensions when the file is missing.
///
/// `mcp.yaml` falls back to `mcp.yml` and `mcp.json`; a path without extension tries all three.
pub fn find_spec_file(path: &Path) -> PathBuf {
    if path.exists() {
        return path.to_path_buf();
    }
    ["yaml", "yml", "json"]
        .iter()
        .map(|ext| path.with_extension(ext))
        .find(|candidate| candidate.exists())
        .unwrap_or_else(|| path.to_path_buf())
}
