use std::collections::BTreeMap;

use indexmap::IndexMap;
use serde_json::Value;
use tracing::debug;

use super::loader::SchemaLoader;
use super::types::{AdditionalProperties, Schema, LOCAL_REF_PREFIX};
use crate::error::{GenError, Result};

/// Target of a `$ref`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reference<'a> {
    /// A name in the document's `components.schemas` table.
    Local(&'a str),
    /// A file path, optionally followed by `#/json/pointer`.
    External(&'a str),
}

/// Classify a `$ref` string.
///
/// # Errors
///
/// `SchemaRef` for `#/components/schemas` without a name and for any other `#` pointer.
pub fn parse_reference<'r>(reference: &'r str, location: &str) -> Result<Reference<'r>> {
    if !reference.starts_with('#') {
        return Ok(Reference::External(reference));
    }
    match reference.strip_prefix(LOCAL_REF_PREFIX) {
        Some(name) if !name.is_empty() => Ok(Reference::Local(name)),
        _ if reference.trim_end_matches('/') == "#/components/schemas" => Err(
            GenError::schema_ref(reference, location, "incomplete schema reference"),
        ),
        _ => Err(GenError::schema_ref(
            reference,
            location,
            "unsupported reference format (expected #/components/schemas/<name> or a file path)",
        )),
    }
}

#[derive(Default)]
struct InlineState {
    local_stack: Vec<String>,
    external_stack: Vec<String>,
    /// Schemas re-entered while being resolved; `None` until their definition is inlined.
    defs: BTreeMap<String, Option<Schema>>,
}

/// Dereferences schemas against the component table and external files.
pub struct ReferenceResolver<'a> {
    components: &'a IndexMap<String, Schema>,
    loader: &'a mut SchemaLoader,
}

impl<'a> ReferenceResolver<'a> {
    pub fn new(components: &'a IndexMap<String, Schema>, loader: &'a mut SchemaLoader) -> Self {
        Self { components, loader }
    }

    /// Look up a component schema by name.
    pub fn local(&self, name: &str, location: &str) -> Result<&'a Schema> {
        self.components.get(name).ok_or_else(|| {
            GenError::schema_ref(
                format!("{LOCAL_REF_PREFIX}{name}"),
                location,
                format!("schema {name:?} not found in components.schemas"),
            )
        })
    }

    pub fn has_local(&self, name: &str) -> bool {
        self.components.contains_key(name)
    }

    /// Load the schema behind an external reference.
    pub fn external(&mut self, reference: &str) -> Result<(String, Schema)> {
        self.loader.load(reference)
    }

    /// Fully dereference `schema`.
    ///
    /// Every `$ref` in properties, items, unions, `not`, `additionalProperties` and
    /// `patternProperties` is replaced by its target, recursively, and `x-` extension keys are
    /// removed. A component reference that re-enters a schema already being resolved becomes
    /// `{"$ref": "#/$defs/<name>"}` and the component is inlined once under the root's `$defs`.
    ///
    /// # Errors
    ///
    /// `SchemaRef` for missing components, unreadable files and cycles through external files.
    pub fn resolve(&mut self, schema: &Schema, location: &str) -> Result<Schema> {
        let mut state = InlineState::default();
        let mut root = self.inline(schema, location, &mut state)?;

        loop {
            let pending = state
                .defs
                .iter()
                .find(|(_, def)| def.is_none())
                .map(|(name, _)| name.clone());
            let Some(name) = pending else { break };
            let target = self.local(&name, location)?;
            state.local_stack.push(name.clone());
            let resolved = self.inline(target, &format!("{location}.$defs.{name}"), &mut state)?;
            state.local_stack.pop();
            state.defs.insert(name, Some(resolved));
        }

        if !state.defs.is_empty() {
            let mut defs = serde_json::Map::new();
            for (name, def) in state.defs {
                let value = serde_json::to_value(def.unwrap_or_default()).map_err(|e| {
                    GenError::schema_ref(name.clone(), location, e.to_string())
                })?;
                defs.insert(name, value);
            }
            debug!(location, defs = defs.len(), "recursive schema embedded with $defs");
            root.extra.insert("$defs".to_string(), Value::Object(defs));
        }
        Ok(root)
    }

    /// [`ReferenceResolver::resolve`] serialized to JSON.
    pub fn resolve_to_value(&mut self, schema: &Schema, location: &str) -> Result<Value> {
        let resolved = self.resolve(schema, location)?;
        serde_json::to_value(resolved)
            .map_err(|e| GenError::schema_ref("", location, format!("cannot serialize: {e}")))
    }

    fn inline(&mut self, schema: &Schema, location: &str, state: &mut InlineState) -> Result<Schema> {
        if let Some(reference) = &schema.reference {
            return match parse_reference(reference, location)? {
                Reference::Local(name) => {
                    if state.local_stack.iter().any(|n| n == name) {
                        state.defs.entry(name.to_string()).or_insert(None);
                        return Ok(Schema::reference_to(format!(
                            "#/$defs/{}",
                            escape_pointer(name)
                        )));
                    }
                    let target = self.local(name, location)?;
                    state.local_stack.push(name.to_string());
                    let out = self.inline(target, location, state);
                    state.local_stack.pop();
                    out
                }
                Reference::External(path) => {
                    let (key, target) = self.loader.load(path)?;
                    if state.external_stack.contains(&key) {
                        return Err(GenError::schema_ref(
                            reference.clone(),
                            location,
                            "cyclic schema: the file references itself",
                        ));
                    }
                    state.external_stack.push(key);
                    let out = self.inline(&target, location, state);
                    state.external_stack.pop();
                    out
                }
            };
        }

        let mut out = schema.clone();
        out.extra.retain(|k, _| !k.starts_with("x-"));

        if let Some(props) = &schema.properties {
            let mut resolved = IndexMap::with_capacity(props.len());
            for (name, prop) in props {
                let loc = format!("{location}.properties.{name}");
                resolved.insert(name.clone(), self.inline(prop, &loc, state)?);
            }
            out.properties = Some(resolved);
        }
        if let Some(items) = &schema.items {
            let loc = format!("{location}.items");
            out.items = Some(Box::new(self.inline(items, &loc, state)?));
        }
        out.any_of = self.inline_all(schema.any_of.as_deref(), location, "anyOf", state)?;
        out.one_of = self.inline_all(schema.one_of.as_deref(), location, "oneOf", state)?;
        out.all_of = self.inline_all(schema.all_of.as_deref(), location, "allOf", state)?;
        if let Some(not) = &schema.not {
            let loc = format!("{location}.not");
            out.not = Some(Box::new(self.inline(not, &loc, state)?));
        }
        if let Some(AdditionalProperties::Schema(extra)) = &schema.additional_properties {
            let loc = format!("{location}.additionalProperties");
            out.additional_properties = Some(AdditionalProperties::Schema(Box::new(
                self.inline(extra, &loc, state)?,
            )));
        }
        if let Some(pattern) = &schema.pattern_properties {
            let mut resolved = IndexMap::with_capacity(pattern.len());
            for (pat, prop) in pattern {
                let loc = format!("{location}.patternProperties.{pat}");
                resolved.insert(pat.clone(), self.inline(prop, &loc, state)?);
            }
            out.pattern_properties = Some(resolved);
        }
        Ok(out)
    }

    fn inline_all(
        &mut self,
        branches: Option<&[Schema]>,
        location: &str,
        keyword: &str,
        state: &mut InlineState,
    ) -> Result<Option<Vec<Schema>>> {
        let Some(branches) = branches else {
            return Ok(None);
        };
        let mut out = Vec::with_capacity(branches.len());
        for (i, branch) in branches.iter().enumerate() {
            let loc = format!("{location}.{keyword}[{i}]");
            out.push(self.inline(branch, &loc, state)?);
        }
        Ok(Some(out))
    }
}

fn escape_pointer(name: &str) -> String {
    name.replace('~', "~0").replace('/', "~1")
}
