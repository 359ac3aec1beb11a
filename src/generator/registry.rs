use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use super::types::{GeneratedTypes, TypeRenderer};
use crate::error::Result;
use crate::naming::to_type_name;
use crate::schema::{ReferenceResolver, Schema};

/// A schema name bound to a hand-written type instead of a generated one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomTypeMapping {
    /// Type as written at use sites.
    pub type_name: String,
    /// Path to `use`, when the type lives in another module.
    pub import_path: Option<String>,
}

impl CustomTypeMapping {
    /// Interpret a mapping string.
    ///
    /// `i64`, `String` and other plain names are used as-is; generic types such as
    /// `Vec<my_crate::Id>` are copied verbatim; `chrono::NaiveDate` is imported and written as
    /// `NaiveDate`.
    pub fn parse(model: &str) -> Self {
        let model = model.trim();
        if model.contains('<') || !model.contains("::") {
            return Self {
                type_name: model.to_string(),
                import_path: None,
            };
        }
        let last = model.rsplit("::").next().unwrap_or(model);
        Self {
            type_name: last.to_string(),
            import_path: Some(model.trim_start_matches("::").to_string()),
        }
    }

    /// The same type written by its full path, for when the short name would clash.
    pub fn qualified(&self) -> Self {
        match &self.import_path {
            Some(path) => Self {
                type_name: path.clone(),
                import_path: None,
            },
            None => self.clone(),
        }
    }
}

#[derive(Debug)]
struct Entry {
    schema: Schema,
    location: String,
}

/// Named schemas collected for the types file.
///
/// Component schemas and the per-operation input, output, content, argument and parameter
/// shapes all land here; [`TypeRegistry::generate`] turns them into one sorted Rust file.
#[derive(Debug)]
pub struct TypeRegistry {
    entries: BTreeMap<String, Entry>,
    /// Mappings from the generator configuration.
    configured: BTreeMap<String, CustomTypeMapping>,
    /// Mappings from `x-mcpgen-type` annotations; these win over configured ones.
    annotated: BTreeMap<String, CustomTypeMapping>,
    runtime_crate: String,
}

impl TypeRegistry {
    pub fn new(runtime_crate: impl Into<String>) -> Self {
        Self {
            entries: BTreeMap::new(),
            configured: BTreeMap::new(),
            annotated: BTreeMap::new(),
            runtime_crate: runtime_crate.into(),
        }
    }

    pub fn runtime_crate(&self) -> &str {
        &self.runtime_crate
    }

    /// Register a named schema. Returns `false`, leaving the registry unchanged, when the name
    /// is already taken.
    pub fn add_schema(&mut self, name: &str, schema: Schema, location: impl Into<String>) -> bool {
        if self.entries.contains_key(name) {
            return false;
        }
        if let Some(model) = schema.type_override() {
            debug!(schema = name, model, "custom type from annotation");
            self.annotated
                .insert(name.to_string(), CustomTypeMapping::parse(model));
        }
        self.entries.insert(
            name.to_string(),
            Entry {
                schema,
                location: location.into(),
            },
        );
        true
    }

    pub fn add_custom_mapping(&mut self, name: &str, mapping: CustomTypeMapping) {
        self.configured.insert(name.to_string(), mapping);
    }

    pub fn schema(&self, name: &str) -> Option<&Schema> {
        self.entries.get(name).map(|e| &e.schema)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Registry name whose generated type is called `type_name`.
    pub fn key_for_type(&self, type_name: &str) -> Option<&str> {
        if self.entries.contains_key(type_name) {
            return Some(type_name);
        }
        self.entries
            .keys()
            .find(|key| to_type_name(key) == type_name)
            .map(String::as_str)
    }

    /// The custom mapping for `name`; annotations take precedence over configuration.
    pub fn custom_mapping(&self, name: &str) -> Option<&CustomTypeMapping> {
        self.annotated
            .get(name)
            .or_else(|| self.configured.get(name))
    }

    /// Rust type name used for the schema registered as `name`.
    pub fn type_name(&self, name: &str) -> String {
        match self.custom_mapping(name) {
            Some(mapping) => mapping.type_name.clone(),
            None => to_type_name(name),
        }
    }

    /// Names of every generated (non-custom) declaration's Rust type.
    pub(crate) fn declared_type_names(&self) -> BTreeSet<String> {
        self.entries
            .keys()
            .filter(|name| self.custom_mapping(name).is_none())
            .map(|name| to_type_name(name))
            .collect()
    }

    pub(crate) fn entries(&self) -> impl Iterator<Item = (&str, &Schema, &str)> {
        self.entries
            .iter()
            .map(|(name, e)| (name.as_str(), &e.schema, e.location.as_str()))
    }

    /// Render every registered schema into the source of the types file (unformatted).
    ///
    /// # Errors
    ///
    /// `SchemaRef` when a reference cannot be followed.
    pub fn generate(
        &self,
        resolver: &mut ReferenceResolver<'_>,
        header: &str,
    ) -> Result<GeneratedTypes> {
        TypeRenderer::new(self, resolver).render(header)
    }
}
