//! View models for the server and handler templates.
//!
//! Every string a template prints verbatim (literals, embedded schemas, signatures) is
//! prepared here, so the templates stay free of logic.

use indexmap::IndexMap;
use serde_json::Value;

use super::format::{optional_string_literal, raw_string_literal, string_literal};
use super::registry::TypeRegistry;
use crate::error::{GenError, Result};
use crate::merge::{HandlerCategory, HandlerId};
use crate::naming::{handler_method_name, to_type_name};
use crate::schema::{ReferenceResolver, Schema};
use crate::spec::{ApiSpec, Prompt, Resource, Tool};

/// Type name of a per-operation shape, e.g. `get-weather` + `input` -> `GetWeatherInput`.
pub fn operation_type_name(operation: &str, suffix: &str) -> String {
    to_type_name(&format!("{operation}_{suffix}"))
}

/// Schema for the placeholders of a URI template: one required string per placeholder.
pub fn template_params_schema(uri_template: &str) -> Schema {
    let params = mcpgen_runtime::uri_template::extract_params(uri_template);
    let properties: IndexMap<String, Schema> = params
        .iter()
        .map(|p| (p.clone(), Schema::with_type("string")))
        .collect();
    Schema {
        description: Some(format!("Placeholders of `{uri_template}`.")),
        properties: Some(properties),
        required: params,
        ..Schema::with_type("object")
    }
}

/// Schema for the arguments of a prompt. `None` when the prompt takes none.
pub fn prompt_args_schema(prompt: &Prompt) -> Option<Schema> {
    if prompt.arguments.is_empty() {
        return None;
    }
    let properties: IndexMap<String, Schema> = prompt
        .arguments
        .iter()
        .map(|arg| {
            let schema = Schema {
                description: arg.description.clone(),
                ..Schema::with_type("string")
            };
            (arg.name.clone(), schema)
        })
        .collect();
    Some(Schema {
        description: Some(format!("Arguments of the `{}` prompt.", prompt.name)),
        properties: Some(properties),
        required: prompt
            .arguments
            .iter()
            .filter(|a| a.required)
            .map(|a| a.name.clone())
            .collect(),
        ..Schema::with_type("object")
    })
}

/// A handler method: what goes in the trait and what a fresh stub looks like.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerView {
    pub category: HandlerCategory,
    /// Operation name as written in the API description.
    pub operation: String,
    pub method: String,
    pub doc: Vec<String>,
    /// `async fn name(&self, ...) -> Result<..., HandlerError>`
    pub signature: String,
}

impl HandlerView {
    fn new(category: HandlerCategory, operation: &str, description: Option<&str>, params: &str, output: &str) -> Self {
        let method = handler_method_name(operation);
        let signature = format!(
            "async fn {method}(&self, ctx: &RequestContext{params}) -> Result<{output}, HandlerError>"
        );
        let doc = description
            .map(|d| d.trim().lines().map(|l| l.trim_end().to_string()).collect())
            .unwrap_or_default();
        Self {
            category,
            operation: operation.to_string(),
            method,
            doc,
            signature,
        }
    }

    pub fn id(&self) -> HandlerId {
        HandlerId::new(self.category, self.method.clone())
    }

    /// Unformatted stub method that reports itself as not implemented.
    pub fn stub(&self) -> String {
        format!(
            "{} {{\n    Err(HandlerError::not_implemented({}))\n}}",
            self.signature,
            string_literal(&self.operation)
        )
    }
}

#[derive(Debug, Clone)]
pub struct AnnotationView {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Clone)]
pub struct ToolView {
    pub handler: HandlerView,
    pub name_literal: String,
    pub description_literal: String,
    pub input_type: String,
    pub output_type: String,
    /// Raw string literal holding the resolved input schema.
    pub input_schema: String,
    /// `None` or `Some(embedded_schema(...))`.
    pub output_schema: String,
    pub read_only: bool,
    pub destructive: bool,
    pub idempotent: bool,
    pub open_world: bool,
    pub annotations: Vec<AnnotationView>,
}

#[derive(Debug, Clone)]
pub struct ResourceView {
    pub handler: HandlerView,
    pub name_literal: String,
    /// URI, or URI template for templated resources.
    pub address_literal: String,
    pub description_literal: String,
    pub mime_type_literal: String,
    /// Placeholder record, templated resources only.
    pub params_type: Option<String>,
    /// Declared content type, when the resource has a schema.
    pub content_type: Option<String>,
}

impl ResourceView {
    pub fn params_type_name(&self) -> &str {
        self.params_type.as_deref().unwrap_or("serde_json::Value")
    }
}

#[derive(Debug, Clone)]
pub struct PromptArgumentView {
    pub name_literal: String,
    pub description_literal: String,
    pub required: bool,
}

#[derive(Debug, Clone)]
pub struct PromptView {
    pub handler: HandlerView,
    pub name_literal: String,
    pub description_literal: String,
    pub arguments: Vec<PromptArgumentView>,
    pub args_type: Option<String>,
}

impl PromptView {
    pub fn has_args(&self) -> bool {
        self.args_type.is_some()
    }

    pub fn args_type_name(&self) -> &str {
        self.args_type.as_deref().unwrap_or_default()
    }
}

/// Every operation of an API description, ready for rendering.
#[derive(Debug, Clone, Default)]
pub struct ServerViews {
    pub tools: Vec<ToolView>,
    pub resources: Vec<ResourceView>,
    pub resource_templates: Vec<ResourceView>,
    pub prompts: Vec<PromptView>,
}

impl ServerViews {
    /// Build views for `spec`. Type names come from `registry`; embedded schemas are resolved
    /// through `resolver`.
    pub fn build(
        spec: &ApiSpec,
        registry: &TypeRegistry,
        resolver: &mut ReferenceResolver<'_>,
    ) -> Result<Self> {
        let mut views = ServerViews::default();
        for tool in &spec.tools {
            views.tools.push(tool_view(tool, registry, resolver)?);
        }
        for resource in &spec.resources {
            let view = resource_view(resource, registry);
            if resource.is_template() {
                views.resource_templates.push(view);
            } else {
                views.resources.push(view);
            }
        }
        for prompt in &spec.prompts {
            views.prompts.push(prompt_view(prompt, registry));
        }
        Ok(views)
    }

    /// All handlers, grouped by category in trait order.
    pub fn handlers(&self) -> impl Iterator<Item = &HandlerView> {
        self.tools
            .iter()
            .map(|t| &t.handler)
            .chain(self.resources.iter().map(|r| &r.handler))
            .chain(self.resource_templates.iter().map(|r| &r.handler))
            .chain(self.prompts.iter().map(|p| &p.handler))
    }

    pub fn handlers_for(&self, category: HandlerCategory) -> Vec<&HandlerView> {
        self.handlers().filter(|h| h.category == category).collect()
    }

    pub fn handler(&self, id: &HandlerId) -> Option<&HandlerView> {
        self.handlers()
            .find(|h| h.category == id.category && h.method == id.name)
    }
}

/// Rust type for a per-operation shape registered under `type_name`. Custom mappings are
/// written by full path since the types module does not re-export their imports.
fn signature_type(registry: &TypeRegistry, type_name: &str) -> String {
    let key = registry.key_for_type(type_name).unwrap_or(type_name);
    match registry.custom_mapping(key) {
        Some(mapping) => mapping.qualified().type_name,
        None => to_type_name(type_name),
    }
}

fn embed(schema: &Schema, resolver: &mut ReferenceResolver<'_>, location: &str) -> Result<String> {
    let value: Value = resolver.resolve_to_value(schema, location)?;
    let json = serde_json::to_string(&value)
        .map_err(|e| GenError::schema_ref("", location, format!("cannot serialize: {e}")))?;
    Ok(raw_string_literal(&json))
}

fn tool_view(tool: &Tool, registry: &TypeRegistry, resolver: &mut ReferenceResolver<'_>) -> Result<ToolView> {
    let location = format!("tools[{}]", tool.name);
    let input_type = signature_type(registry, &operation_type_name(&tool.name, "input"));
    let input_schema = match &tool.input_schema {
        Some(schema) => embed(schema, resolver, &format!("{location}.inputSchema"))?,
        None => raw_string_literal(r#"{"type":"object"}"#),
    };
    let (output_type, output_schema) = match &tool.output_schema {
        Some(schema) => (
            signature_type(registry, &operation_type_name(&tool.name, "output")),
            format!(
                "Some(embedded_schema({}))",
                embed(schema, resolver, &format!("{location}.outputSchema"))?
            ),
        ),
        None => ("serde_json::Value".to_string(), "None".to_string()),
    };
    let params = format!(", input: {input_type}");
    Ok(ToolView {
        handler: HandlerView::new(
            HandlerCategory::Tool,
            &tool.name,
            tool.description.as_deref(),
            &params,
            &output_type,
        ),
        name_literal: string_literal(&tool.name),
        description_literal: optional_string_literal(tool.description.as_deref()),
        input_type,
        output_type,
        input_schema,
        output_schema,
        read_only: tool.readonly,
        destructive: tool.destructive,
        idempotent: tool.idempotent,
        open_world: tool.open_world,
        annotations: tool
            .annotations
            .iter()
            .map(|(k, v)| AnnotationView {
                key: string_literal(k),
                value: string_literal(v),
            })
            .collect(),
    })
}

fn resource_view(resource: &Resource, registry: &TypeRegistry) -> ResourceView {
    let content_type = resource
        .schema
        .as_ref()
        .map(|_| signature_type(registry, &operation_type_name(&resource.name, "content")));
    let (category, params_type, params) = if resource.is_template() {
        let params_type = signature_type(registry, &operation_type_name(&resource.name, "params"));
        let params = format!(", uri: &str, params: {params_type}");
        (HandlerCategory::ResourceTemplate, Some(params_type), params)
    } else {
        (HandlerCategory::Resource, None, ", uri: &str".to_string())
    };
    ResourceView {
        handler: HandlerView::new(
            category,
            &resource.name,
            resource.description.as_deref(),
            &params,
            "ResourceContents",
        ),
        name_literal: string_literal(&resource.name),
        address_literal: string_literal(resource.address()),
        description_literal: optional_string_literal(resource.description.as_deref()),
        mime_type_literal: optional_string_literal(resource.mime_type.as_deref()),
        params_type,
        content_type,
    }
}

fn prompt_view(prompt: &Prompt, registry: &TypeRegistry) -> PromptView {
    let args_type = (!prompt.arguments.is_empty())
        .then(|| signature_type(registry, &operation_type_name(&prompt.name, "args")));
    let params = args_type
        .as_ref()
        .map(|t| format!(", args: {t}"))
        .unwrap_or_default();
    PromptView {
        handler: HandlerView::new(
            HandlerCategory::Prompt,
            &prompt.name,
            prompt.description.as_deref(),
            &params,
            "PromptResult",
        ),
        name_literal: string_literal(&prompt.name),
        description_literal: optional_string_literal(prompt.description.as_deref()),
        arguments: prompt
            .arguments
            .iter()
            .map(|a| PromptArgumentView {
                name_literal: string_literal(&a.name),
                description_literal: optional_string_literal(a.description.as_deref()),
                required: a.required,
            })
            .collect(),
        args_type,
    }
}
