use askama::Template;

use super::types::Declaration;
use super::views::{PromptView, ResourceView, ToolView};
use crate::error::{GenError, Result};

/// Template data for the types file
#[derive(Template)]
#[template(path = "types.rs.txt", escape = "none")]
pub struct TypesTemplate {
    /// Text of the module doc line
    pub header: String,
    /// Full paths to `use`, sorted
    pub imports: Vec<String>,
    /// Whether any declaration derives or implements serde traits
    pub needs_serde: bool,
    /// Declarations sorted by name
    pub declarations: Vec<Declaration>,
}

/// Template data for the server wiring file
#[derive(Template)]
#[template(path = "server.rs.txt", escape = "none")]
pub struct ServerTemplate {
    pub title: String,
    pub version: String,
    pub title_literal: String,
    pub version_literal: String,
    pub description_literal: String,
    pub runtime_crate: String,
    pub types_module: String,
    pub tools: Vec<ToolView>,
    pub resources: Vec<ResourceView>,
    pub resource_templates: Vec<ResourceView>,
    pub prompts: Vec<PromptView>,
}

/// One `impl <Trait> for <Resolver>` block of a fresh handler file
#[derive(Debug, Clone)]
pub struct ImplBlockView {
    pub trait_name: String,
    /// Unformatted stub methods
    pub stubs: Vec<String>,
}

/// Template data for a freshly generated handler file
#[derive(Template)]
#[template(path = "handlers.rs.txt", escape = "none")]
pub struct HandlersTemplate {
    pub title: String,
    pub runtime_crate: String,
    pub types_module: String,
    pub server_module: String,
    pub resolver_module: String,
    pub resolver_type: String,
    pub blocks: Vec<ImplBlockView>,
}

/// Template for the resolver type, written once
#[derive(Template)]
#[template(path = "resolver.rs.txt", escape = "none")]
pub struct ResolverTemplate {
    pub title: String,
    pub resolver_type: String,
}

/// Template data for generating mod.rs module declarations
#[derive(Template)]
#[template(path = "mod.rs.txt", escape = "none")]
pub struct ModRsTemplate {
    /// Module names to declare
    pub modules: Vec<String>,
}

/// Starter generator configuration written by `mcpgen init`
#[derive(Template)]
#[template(path = "init/mcpgen.yaml.txt", escape = "none")]
pub struct InitConfigTemplate;

/// Starter API description written by `mcpgen init`
#[derive(Template)]
#[template(path = "init/mcp.yaml.txt", escape = "none")]
pub struct InitSpecTemplate {
    pub name: String,
}

/// Render `template`, reporting failures against `file`.
pub fn render<T: Template>(template: &T, file: &str) -> Result<String> {
    template.render().map_err(|e| GenError::CodeFormat {
        file: file.to_string(),
        message: format!("template rendering failed: {e}"),
        source_code: String::new(),
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;

    #[test]
    fn test_mod_rs_lists_modules() {
        let out = render(
            &ModRsTemplate {
                modules: vec!["handlers".into(), "types".into()],
            },
            "mod.rs",
        )
        .unwrap();
        assert!(out.contains("pub mod handlers;"));
        assert!(out.contains("pub mod types;"));
    }

    #[test]
    fn test_init_templates_parse() {
        let config = render(&InitConfigTemplate, "mcpgen.yaml").unwrap();
        let value: serde_yaml::Value = serde_yaml::from_str(&config).unwrap();
        assert_eq!(value["spec"], "mcp.yaml");

        let spec = render(
            &InitSpecTemplate {
                name: "notes".into(),
            },
            "mcp.yaml",
        )
        .unwrap();
        let parsed: crate::spec::ApiSpec = serde_yaml::from_str(&spec).unwrap();
        assert_eq!(parsed.info.title, "notes");
        parsed.validate().unwrap();
    }

    #[test]
    fn test_resolver_template_parses() {
        let out = render(
            &ResolverTemplate {
                title: "notes".into(),
                resolver_type: "Resolver".into(),
            },
            "resolver.rs",
        )
        .unwrap();
        assert!(out.contains("pub struct Resolver"));
        assert!(out.contains("// Add shared dependencies here."));
        syn::parse_file(&out).unwrap();
    }
}
