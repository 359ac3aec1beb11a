use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, trace};

use super::format::string_literal;
use super::registry::{CustomTypeMapping, TypeRegistry};
use super::templates::{render, TypesTemplate};
use crate::error::Result;
use crate::naming::{field_name, to_type_name, variant_name};
use crate::schema::{parse_reference, Primitive, Reference, ReferenceResolver, Schema, SchemaKind};

/// Where a type expression appears; decides whether a reference is boxed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Position {
    /// Right-hand side of a top-level `type` alias.
    Alias,
    /// A struct field, possibly wrapped in `Option`.
    Field,
    /// Inside a `Vec` or `BTreeMap`, which already provide indirection.
    Element,
}

/// A struct field as rendered into the types file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDef {
    pub name: String,
    pub ty: String,
    pub doc: Vec<String>,
    /// Complete `#[serde(...)]` attribute, or empty.
    pub serde_attr: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantDef {
    pub name: String,
    /// Wire value as a Rust string literal.
    pub literal: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeclarationBody {
    Struct(Vec<FieldDef>),
    Enum(Vec<VariantDef>),
    Alias(String),
}

/// One item of the types file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub name: String,
    pub doc: Vec<String>,
    pub body: DeclarationBody,
}

impl Declaration {
    pub fn is_struct(&self) -> bool {
        matches!(self.body, DeclarationBody::Struct(_))
    }

    pub fn is_enum(&self) -> bool {
        matches!(self.body, DeclarationBody::Enum(_))
    }

    pub fn fields(&self) -> &[FieldDef] {
        match &self.body {
            DeclarationBody::Struct(fields) => fields,
            _ => &[],
        }
    }

    pub fn variants(&self) -> &[VariantDef] {
        match &self.body {
            DeclarationBody::Enum(variants) => variants,
            _ => &[],
        }
    }

    pub fn target(&self) -> &str {
        match &self.body {
            DeclarationBody::Alias(target) => target,
            _ => "",
        }
    }
}

/// Output of [`TypeRegistry::generate`].
#[derive(Debug, Clone)]
pub struct GeneratedTypes {
    /// Unformatted source of the types file.
    pub source: String,
    /// Declared type names, sorted.
    pub declared: Vec<String>,
}

pub(crate) struct TypeRenderer<'r, 'a> {
    registry: &'r TypeRegistry,
    resolver: &'r mut ReferenceResolver<'a>,
    declarations: BTreeMap<String, Declaration>,
    /// Type names already in use, so that nested declarations get unique names.
    taken: BTreeSet<String>,
    /// Imported short name -> full path.
    imports: BTreeMap<String, String>,
    /// Loader key of each external document -> declared type name.
    external: BTreeMap<String, String>,
}

impl<'r, 'a> TypeRenderer<'r, 'a> {
    pub(crate) fn new(registry: &'r TypeRegistry, resolver: &'r mut ReferenceResolver<'a>) -> Self {
        Self {
            taken: registry.declared_type_names(),
            registry,
            resolver,
            declarations: BTreeMap::new(),
            imports: BTreeMap::new(),
            external: BTreeMap::new(),
        }
    }

    pub(crate) fn render(mut self, header: &str) -> Result<GeneratedTypes> {
        let registry = self.registry;
        for (name, schema, location) in registry.entries() {
            if registry.custom_mapping(name).is_some() {
                debug!(schema = name, "custom mapping, no declaration emitted");
                continue;
            }
            self.declare(to_type_name(name), schema, location)?;
        }

        let declared: Vec<String> = self.declarations.keys().cloned().collect();
        let needs_serde = self
            .declarations
            .values()
            .any(|d| d.is_struct() || d.is_enum());
        let imports: BTreeSet<String> = self.imports.into_values().collect();
        let template = TypesTemplate {
            header: header.to_string(),
            imports: imports.into_iter().collect(),
            needs_serde,
            declarations: self.declarations.into_values().collect(),
        };
        let source = render(&template, "types")?;
        Ok(GeneratedTypes { source, declared })
    }

    /// Declare `schema` under `type_name`.
    fn declare(&mut self, type_name: String, schema: &Schema, location: &str) -> Result<()> {
        let kind = schema.kind();
        let doc = doc_lines(schema.description.as_deref(), &type_name, &kind);
        let body = match &kind {
            SchemaKind::Object if schema.type_override().is_none() => {
                DeclarationBody::Struct(self.fields(&type_name, schema, location)?)
            }
            SchemaKind::Enum(values) if schema.type_override().is_none() => {
                DeclarationBody::Enum(variants(values))
            }
            SchemaKind::Reference(reference) if schema.type_override().is_none() => {
                if let Reference::External(path) = parse_reference(reference, location)? {
                    let (key, target) = self.resolver.external(path)?;
                    if target.type_override().is_none() && !self.external.contains_key(&key) {
                        // The document's own content is declared under this name.
                        self.external.insert(key, type_name.clone());
                        return self.declare(type_name, &target, location);
                    }
                }
                DeclarationBody::Alias(self.type_expr(schema, &type_name, location, Position::Alias)?)
            }
            _ => DeclarationBody::Alias(self.type_expr(schema, &type_name, location, Position::Alias)?),
        };
        trace!(type_name = %type_name, location, "declared");
        self.taken.insert(type_name.clone());
        self.declarations.insert(
            type_name.clone(),
            Declaration {
                name: type_name,
                doc,
                body,
            },
        );
        Ok(())
    }

    fn fields(&mut self, type_name: &str, schema: &Schema, location: &str) -> Result<Vec<FieldDef>> {
        let Some(properties) = &schema.properties else {
            return Ok(Vec::new());
        };
        let mut used = BTreeSet::new();
        let mut fields = Vec::with_capacity(properties.len());
        for (wire_name, prop) in properties {
            let loc = format!("{location}.properties.{wire_name}");
            let hint = format!("{type_name}{}", to_type_name(wire_name));
            let required = schema.is_required(wire_name);
            let overridden = prop.type_override().is_some();
            let kind = prop.kind();
            let nullable = !overridden
                && matches!(kind, SchemaKind::Nullable(_) | SchemaKind::Union { nullable: true });

            let mut attrs = Vec::new();
            let name = unique_field_name(field_name(wire_name), &mut used);
            if name.trim_start_matches("r#") != wire_name {
                attrs.push(format!("rename = {}", string_literal(wire_name)));
            }

            let ty = if prop.is_omittable() {
                let inner = match kind {
                    SchemaKind::Nullable(inner) if !overridden => {
                        self.type_expr(&inner, &hint, &loc, Position::Field)?
                    }
                    SchemaKind::Union { .. } if !overridden => "serde_json::Value".to_string(),
                    _ => self.type_expr(prop, &hint, &loc, Position::Field)?,
                };
                let omittable = self.use_import(
                    "Omittable",
                    &format!("{}::Omittable", self.registry.runtime_crate()),
                );
                attrs.push("default".to_string());
                attrs.push(format!("skip_serializing_if = \"{omittable}::is_unset\""));
                format!("{omittable}<{inner}>")
            } else {
                let base = self.type_expr(prop, &hint, &loc, Position::Field)?;
                if required {
                    base
                } else {
                    attrs.push("default".to_string());
                    attrs.push("skip_serializing_if = \"Option::is_none\"".to_string());
                    if nullable {
                        base
                    } else {
                        format!("Option<{base}>")
                    }
                }
            };

            fields.push(FieldDef {
                name,
                ty,
                doc: prop
                    .description
                    .as_deref()
                    .map(description_lines)
                    .unwrap_or_default(),
                serde_attr: if attrs.is_empty() {
                    String::new()
                } else {
                    format!("#[serde({})]", attrs.join(", "))
                },
            });
        }
        Ok(fields)
    }

    fn type_expr(
        &mut self,
        schema: &Schema,
        hint: &str,
        location: &str,
        position: Position,
    ) -> Result<String> {
        if let Some(model) = schema.type_override() {
            return Ok(self.use_mapping(&CustomTypeMapping::parse(model)));
        }
        let ty = match schema.kind() {
            SchemaKind::Reference(reference) => self.reference_type(&reference, location, position)?,
            SchemaKind::Nullable(inner) => {
                format!("Option<{}>", self.type_expr(&inner, hint, location, position)?)
            }
            SchemaKind::Union { nullable: true } => "Option<serde_json::Value>".to_string(),
            SchemaKind::Union { nullable: false } => "serde_json::Value".to_string(),
            SchemaKind::Enum(values) => {
                let name = self.nested_name(schema, hint);
                self.taken.insert(name.clone());
                self.declarations.insert(
                    name.clone(),
                    Declaration {
                        name: name.clone(),
                        doc: doc_lines(schema.description.as_deref(), &name, &SchemaKind::Enum(Vec::new())),
                        body: DeclarationBody::Enum(variants(&values)),
                    },
                );
                name
            }
            SchemaKind::Array(items) => {
                let element = match items {
                    Some(items) => self.type_expr(
                        &items,
                        &format!("{hint}Item"),
                        &format!("{location}.items"),
                        Position::Element,
                    )?,
                    None => "serde_json::Value".to_string(),
                };
                format!("Vec<{element}>")
            }
            SchemaKind::Object => {
                let name = self.nested_name(schema, hint);
                self.declare(name.clone(), schema, location)?;
                name
            }
            SchemaKind::Map(values) => {
                let map = self.use_import("BTreeMap", "std::collections::BTreeMap");
                let value = self.type_expr(
                    &values,
                    &format!("{hint}Value"),
                    &format!("{location}.additionalProperties"),
                    Position::Element,
                )?;
                format!("{map}<String, {value}>")
            }
            SchemaKind::OpenObject => "serde_json::Map<String, serde_json::Value>".to_string(),
            SchemaKind::Primitive(Primitive::String) => "String".to_string(),
            SchemaKind::Primitive(Primitive::DateTime) => {
                let chrono = format!("{}::chrono", self.registry.runtime_crate());
                let date_time = self.use_import("DateTime", &format!("{chrono}::DateTime"));
                let utc = self.use_import("Utc", &format!("{chrono}::Utc"));
                format!("{date_time}<{utc}>")
            }
            SchemaKind::Primitive(Primitive::Integer) => "i64".to_string(),
            SchemaKind::Primitive(Primitive::Number) => "f64".to_string(),
            SchemaKind::Primitive(Primitive::Boolean) => "bool".to_string(),
            SchemaKind::Null | SchemaKind::Dynamic => "serde_json::Value".to_string(),
        };
        Ok(ty)
    }

    fn reference_type(&mut self, reference: &str, location: &str, position: Position) -> Result<String> {
        let ty = match parse_reference(reference, location)? {
            Reference::Local(name) => {
                if let Some(mapping) = self.registry.custom_mapping(name) {
                    let mapping = mapping.clone();
                    return Ok(self.use_mapping(&mapping));
                }
                self.resolver.local(name, location)?;
                to_type_name(name)
            }
            Reference::External(path) => {
                let (key, target) = self.resolver.external(path)?;
                if let Some(model) = target.type_override() {
                    return Ok(self.use_mapping(&CustomTypeMapping::parse(model)));
                }
                match self.external.get(&key) {
                    Some(existing) => existing.clone(),
                    None => {
                        let base = target
                            .title
                            .as_deref()
                            .map(to_type_name)
                            .unwrap_or_else(|| external_base_name(path));
                        let name = self.claim(base);
                        self.external.insert(key, name.clone());
                        self.declare(name.clone(), &target, &format!("{location} ({path})"))?;
                        name
                    }
                }
            }
        };
        Ok(match position {
            Position::Field => format!("Box<{ty}>"),
            Position::Alias | Position::Element => ty,
        })
    }

    /// Name for an anonymous nested declaration: its title, else the hint, made unique.
    fn nested_name(&mut self, schema: &Schema, hint: &str) -> String {
        let base = schema
            .title
            .as_deref()
            .map(to_type_name)
            .unwrap_or_else(|| hint.to_string());
        self.claim(base)
    }

    fn claim(&mut self, base: String) -> String {
        if self.taken.insert(base.clone()) {
            return base;
        }
        let mut n = 2;
        loop {
            let candidate = format!("{base}{n}");
            if self.taken.insert(candidate.clone()) {
                return candidate;
            }
            n += 1;
        }
    }

    fn use_mapping(&mut self, mapping: &CustomTypeMapping) -> String {
        match &mapping.import_path {
            Some(path) => self.use_import(&mapping.type_name, path),
            None => mapping.type_name.clone(),
        }
    }

    /// Import `path` as `short` and return the name to write. Falls back to the full path when
    /// `short` is already bound to something else.
    fn use_import(&mut self, short: &str, path: &str) -> String {
        match self.imports.get(short) {
            Some(existing) if existing == path => short.to_string(),
            Some(_) => path.to_string(),
            None if self.taken.contains(short) => path.to_string(),
            None => {
                self.imports.insert(short.to_string(), path.to_string());
                short.to_string()
            }
        }
    }
}

fn variants(values: &[String]) -> Vec<VariantDef> {
    let mut seen_values = BTreeSet::new();
    let mut used = BTreeSet::new();
    let mut out = Vec::with_capacity(values.len());
    for value in values {
        if !seen_values.insert(value.as_str()) {
            continue;
        }
        let base = variant_name(value);
        let mut name = base.clone();
        let mut n = 2;
        while !used.insert(name.clone()) {
            name = format!("{}{n}", base.trim_start_matches("r#"));
            n += 1;
        }
        out.push(VariantDef {
            name,
            literal: string_literal(value),
        });
    }
    out
}

fn unique_field_name(base: String, used: &mut BTreeSet<String>) -> String {
    if used.insert(base.clone()) {
        return base;
    }
    let bare = base.trim_start_matches("r#").to_string();
    let mut n = 2;
    loop {
        let candidate = format!("{bare}_{n}");
        if used.insert(candidate.clone()) {
            return candidate;
        }
        n += 1;
    }
}

fn description_lines(description: &str) -> Vec<String> {
    description
        .trim()
        .lines()
        .map(|l| l.trim_end().to_string())
        .collect()
}

fn doc_lines(description: Option<&str>, name: &str, kind: &SchemaKind) -> Vec<String> {
    match description.map(str::trim).filter(|d| !d.is_empty()) {
        Some(d) => description_lines(d),
        None => {
            let phrase = match kind {
                SchemaKind::Object => "an object",
                SchemaKind::Enum(_) => "a string enum",
                SchemaKind::Array(_) => "an array",
                SchemaKind::Map(_) | SchemaKind::OpenObject => "a map",
                SchemaKind::Reference(_) => "a referenced",
                SchemaKind::Nullable(_) => "a nullable",
                SchemaKind::Union { .. } => "a union",
                SchemaKind::Primitive(_) => "a scalar",
                SchemaKind::Null | SchemaKind::Dynamic => "an untyped",
            };
            vec![format!("`{name}` represents {phrase} schema.")]
        }
    }
}

/// `schemas/user.json` -> `User`; `common.yaml#/definitions/Address` -> `Address`.
fn external_base_name(reference: &str) -> String {
    let (file, pointer) = reference.split_once('#').unwrap_or((reference, ""));
    let last_segment = pointer.rsplit('/').find(|s| !s.is_empty());
    match last_segment {
        Some(segment) => to_type_name(segment),
        None => {
            let stem = file.rsplit(['/', '\\']).next().unwrap_or(file);
            to_type_name(stem)
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use indexmap::IndexMap;
    use serde_json::json;

    use super::*;
    use crate::schema::SchemaLoader;

    /// Raw types source for a component table.
    fn render_components(components: serde_json::Value) -> String {
        let components: IndexMap<String, Schema> = serde_json::from_value(components).unwrap();
        let mut registry = TypeRegistry::new("mcpgen_runtime");
        for (name, schema) in &components {
            registry.add_schema(name, schema.clone(), format!("components.schemas.{name}"));
        }
        let mut loader = SchemaLoader::new(".");
        let mut resolver = ReferenceResolver::new(&components, &mut loader);
        registry.generate(&mut resolver, "Types.").unwrap().source
    }

    /// The item starting at `head`, through its closing brace at column 0.
    fn item<'s>(source: &'s str, head: &str) -> &'s str {
        let start = source.find(head).unwrap_or_else(|| panic!("{head} missing in:\n{source}"));
        let len = source[start..].find("\n}").unwrap();
        &source[start..start + len + 2]
    }

    #[test]
    fn test_omittable_field_renders_tri_state() {
        let source = render_components(json!({
            "Patch": {
                "type": "object",
                "properties": {
                    "note": {"type": "string", "x-mcpgen-omittable": true},
                    "due": {"type": ["integer", "null"], "x-mcpgen-omittable": true}
                }
            }
        }));
        assert!(source.contains("use mcpgen_runtime::Omittable;"));
        let patch = item(&source, "pub struct Patch {");
        assert!(patch.contains(
            "#[serde(default, skip_serializing_if = \"Omittable::is_unset\")]\n    pub note: Omittable<String>,"
        ));
        assert!(patch.contains("pub due: Omittable<i64>,"));
        assert!(!patch.contains("Option<"));
    }

    #[test]
    fn test_string_enum_keeps_wire_values() {
        let source = render_components(json!({
            "task_status": {"type": "string", "enum": ["in_progress", "done"]}
        }));
        assert_eq!(
            item(&source, "pub enum TaskStatus {"),
            "pub enum TaskStatus {\n    InProgress,\n    Done,\n}"
        );
        assert!(source.contains("TaskStatus::InProgress => \"in_progress\","));
        assert!(source.contains("TaskStatus::Done => \"done\","));
        assert!(source.contains("\"in_progress\" => Ok(TaskStatus::InProgress),"));
        assert!(source.contains("\"done\" => Ok(TaskStatus::Done),"));
    }

    #[test]
    fn test_multi_branch_union_field_is_dynamic() {
        let source = render_components(json!({
            "Cell": {
                "type": "object",
                "required": ["value"],
                "properties": {
                    "value": {"anyOf": [{"type": "string"}, {"type": "integer"}, {"type": "boolean"}]},
                    "fallback": {"oneOf": [{"type": "string"}, {"type": "integer"}, {"type": "null"}]},
                    "label": {"anyOf": [{"type": "string"}, {"type": "null"}]}
                }
            }
        }));
        let cell = item(&source, "pub struct Cell {");
        assert!(cell.contains("pub value: serde_json::Value,"));
        assert!(cell.contains("pub fallback: Option<serde_json::Value>,"));
        assert!(cell.contains("pub label: Option<String>,"));
        assert!(!cell.contains("Option<Option<"));
    }

    #[test]
    fn test_required_property_is_a_plain_field() {
        let source = render_components(json!({
            "Ref": {
                "type": "object",
                "required": ["id"],
                "properties": {"id": {"type": "string"}}
            }
        }));
        let record = item(&source, "pub struct Ref {");
        assert_eq!(record.matches("pub ").count(), 2, "{record}");
        assert!(record.contains("pub id: String,"));
        assert!(!record.contains("#[serde("));
    }

    #[test]
    fn test_titled_untyped_property_becomes_record() {
        let source = render_components(json!({
            "Envelope": {
                "type": "object",
                "required": ["marker"],
                "properties": {"marker": {"title": "Marker", "description": "Opaque marker."}}
            }
        }));
        assert!(source.contains("pub struct Marker {"));
        assert!(item(&source, "pub struct Envelope {").contains("pub marker: Marker,"));
    }

    #[test]
    fn test_external_base_name() {
        assert_eq!(external_base_name("schemas/user.json"), "User");
        assert_eq!(external_base_name("common.yaml#/definitions/Address"), "Address");
        assert_eq!(external_base_name("./shared/order_schema.yaml"), "Order");
    }

    #[test]
    fn test_variants_dedupe() {
        let values: Vec<String> = ["in-progress", "in_progress", "done", "done"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let out = variants(&values);
        let names: Vec<&str> = out.iter().map(|v| v.name.as_str()).collect();
        assert_eq!(names, ["InProgress", "InProgress2", "Done"]);
        assert_eq!(out[1].literal, "\"in_progress\"");
    }

    #[test]
    fn test_unique_field_name() {
        let mut used = BTreeSet::new();
        assert_eq!(unique_field_name("r#type".into(), &mut used), "r#type");
        assert_eq!(unique_field_name("r#type".into(), &mut used), "type_2");
    }

    #[test]
    fn test_doc_lines_fallback() {
        assert_eq!(
            doc_lines(None, "Task", &SchemaKind::Object),
            vec!["`Task` represents an object schema.".to_string()]
        );
        assert_eq!(
            doc_lines(Some("  First.\nSecond.  "), "Task", &SchemaKind::Object),
            vec!["First.".to_string(), "Second.".to_string()]
        );
    }
}
