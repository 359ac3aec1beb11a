use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::debug;

use super::types::Schema;
use crate::error::{GenError, Result};

/// Loads schema documents referenced by file path.
///
/// Relative paths resolve against the directory of the API description; relative paths inside
/// a loaded document resolve against that document's own directory. Documents are cached by
/// canonical absolute path, so each file is read and parsed once per run.
#[derive(Debug)]
pub struct SchemaLoader {
    base_dir: PathBuf,
    cache: HashMap<PathBuf, Value>,
}

impl SchemaLoader {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            cache: HashMap::new(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Number of distinct documents parsed so far.
    pub fn cached_documents(&self) -> usize {
        self.cache.len()
    }

    /// Load the schema an external reference (`file.json` or `file.yaml#/json/pointer`) points at.
    ///
    /// Returns a key that identifies the target across the run (canonical path plus pointer)
    /// together with the parsed schema.
    pub fn load(&mut self, reference: &str) -> Result<(String, Schema)> {
        let (file, pointer) = match reference.split_once('#') {
            Some((file, pointer)) => (file, pointer),
            None => (reference, ""),
        };
        if file.is_empty() {
            return Err(GenError::schema_ref(
                reference,
                "external reference",
                "missing file path",
            ));
        }

        let path = self.canonical_path(reference, file)?;
        let document: &Value = match self.cache.entry(path.clone()) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                let mut doc = read_document(reference, &path)?;
                if let Some(dir) = path.parent() {
                    rebase_refs(&mut doc, dir);
                }
                debug!(path = %path.display(), "loaded external schema document");
                entry.insert(doc)
            }
        };

        let node = if pointer.is_empty() {
            document
        } else {
            document.pointer(pointer).ok_or_else(|| {
                GenError::schema_ref(
                    reference,
                    path.display().to_string(),
                    format!("pointer {pointer} does not exist in the document"),
                )
            })?
        };
        let schema: Schema = serde_json::from_value(node.clone()).map_err(|e| {
            GenError::schema_ref(
                reference,
                path.display().to_string(),
                format!("not a schema: {e}"),
            )
        })?;
        Ok((format!("{}#{pointer}", path.display()), schema))
    }

    fn canonical_path(&self, reference: &str, file: &str) -> Result<PathBuf> {
        let candidate = Path::new(file);
        let joined = if candidate.is_absolute() {
            candidate.to_path_buf()
        } else {
            self.base_dir.join(candidate)
        };
        joined.canonicalize().map_err(|e| {
            GenError::schema_ref(
                reference,
                joined.display().to_string(),
                format!("cannot open referenced file: {e}"),
            )
        })
    }
}

fn read_document(reference: &str, path: &Path) -> Result<Value> {
    let content = fs::read_to_string(path).map_err(|e| {
        GenError::schema_ref(
            reference,
            path.display().to_string(),
            format!("cannot read referenced file: {e}"),
        )
    })?;
    let parsed = match path.extension().and_then(|e| e.to_str()) {
        Some("yaml") | Some("yml") => {
            serde_yaml::from_str::<Value>(&content).map_err(|e| e.to_string())
        }
        _ => serde_json::from_str::<Value>(&content).map_err(|e| e.to_string()),
    };
    parsed.map_err(|message| {
        GenError::schema_ref(
            reference,
            path.display().to_string(),
            format!("malformed schema document: {message}"),
        )
    })
}

/// Make every relative file `$ref` in `value` absolute, anchored at `dir`. Pointer-only refs
/// (`#/...`) are left alone.
fn rebase_refs(value: &mut Value, dir: &Path) {
    match value {
        Value::Object(map) => {
            if let Some(Value::String(reference)) = map.get_mut("$ref") {
                let (file, pointer) = match reference.split_once('#') {
                    Some((file, pointer)) => (file, Some(pointer)),
                    None => (reference.as_str(), None),
                };
                if !file.is_empty() && Path::new(file).is_relative() {
                    let mut rebased = dir.join(file).display().to_string();
                    if let Some(pointer) = pointer {
                        rebased.push('#');
                        rebased.push_str(pointer);
                    }
                    *reference = rebased;
                }
            }
            map.values_mut().for_each(|v| rebase_refs(v, dir));
        }
        Value::Array(items) => items.iter_mut().for_each(|v| rebase_refs(v, dir)),
        _ => {}
    }
}
