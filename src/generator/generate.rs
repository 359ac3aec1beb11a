use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use super::format::{check_source, format_generated, format_method, format_source};
use super::registry::{CustomTypeMapping, TypeRegistry};
use super::templates::{
    render, HandlersTemplate, ImplBlockView, ModRsTemplate, ResolverTemplate, ServerTemplate,
};
use super::views::{operation_type_name, prompt_args_schema, template_params_schema, ServerViews};
use crate::config::GeneratorConfig;
use crate::error::{GenError, Result};
use crate::naming::to_type_name;
use crate::merge::{
    merge, HandlerCategory, HandlerId, MergeSummary, MergeWriter, RequiredHandlers,
    ResolverSourceParser,
};
use crate::schema::{ReferenceResolver, Schema, SchemaLoader, LOCAL_REF_PREFIX};
use crate::spec::{load_spec, ApiSpec};

/// What a run did to one output file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileOutcome {
    Written,
    /// Generated content equals what is on disk; the file was not rewritten.
    Unchanged,
    /// User-owned file that already exists.
    Kept,
    Merged(MergeSummary),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileReport {
    pub label: &'static str,
    pub path: PathBuf,
    pub outcome: FileOutcome,
}

/// Result of [`Generator::run`].
#[derive(Debug, Clone, Default)]
pub struct GenerationReport {
    pub files: Vec<FileReport>,
    /// Names declared in the types file, sorted.
    pub types: Vec<String>,
}

impl GenerationReport {
    /// Merge counts of the handler file, when it was merged.
    pub fn merge_summary(&self) -> Option<MergeSummary> {
        self.files.iter().find_map(|f| match f.outcome {
            FileOutcome::Merged(summary) => Some(summary),
            _ => None,
        })
    }
}

/// Counts reported by [`Generator::check`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SpecSummary {
    pub tools: usize,
    pub resources: usize,
    pub resource_templates: usize,
    pub prompts: usize,
    /// Named schemas resolved, custom-mapped ones excluded.
    pub schemas: usize,
    /// External schema files loaded.
    pub external_documents: usize,
}

impl std::fmt::Display for SpecSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} tools, {} resources, {} resource templates, {} prompts, {} schemas",
            self.tools, self.resources, self.resource_templates, self.prompts, self.schemas
        )
    }
}

/// Turns an API description into the types, server, resolver and handler files.
pub struct Generator {
    config: GeneratorConfig,
    spec: ApiSpec,
    loader: SchemaLoader,
}

impl Generator {
    /// `spec_dir` anchors relative `$ref` file paths.
    pub fn new(config: GeneratorConfig, spec: ApiSpec, spec_dir: impl Into<PathBuf>) -> Self {
        Self {
            config,
            spec,
            loader: SchemaLoader::new(spec_dir),
        }
    }

    /// Load the API description named by `config` and validate it unless
    /// `options.skip_validation` is set.
    pub fn from_config(config: GeneratorConfig) -> Result<Self> {
        let spec_path = config.spec_path();
        let spec = load_spec(&spec_path)?;
        if config.options.skip_validation {
            warn!(spec = %spec_path.display(), "spec validation skipped");
        } else {
            spec.validate()?;
        }
        let spec_dir = spec_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        Ok(Self::new(config, spec, spec_dir))
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    pub fn spec(&self) -> &ApiSpec {
        &self.spec
    }

    /// Collect every named schema: components first, then per-operation shapes.
    ///
    /// # Errors
    ///
    /// `SpecValidation` when an operation's type name is already taken by a different schema.
    pub fn build_registry(&self) -> Result<TypeRegistry> {
        let mut registry = TypeRegistry::new(&self.config.runtime_crate);
        for (name, model) in &self.config.models {
            registry.add_custom_mapping(name, CustomTypeMapping::parse(model.model()));
        }
        for (name, schema) in &self.spec.components.schemas {
            registry.add_schema(name, schema.clone(), format!("components.schemas.{name}"));
        }
        check_component_type_names(&registry, &self.spec)?;

        for tool in &self.spec.tools {
            let location = format!("tools[{}]", tool.name);
            if let Some(input) = &tool.input_schema {
                let type_name = operation_type_name(&tool.name, "input");
                add_operation_schema(&mut registry, &type_name, input, &format!("{location}.inputSchema"))?;
            }
            if let Some(output) = &tool.output_schema {
                let type_name = operation_type_name(&tool.name, "output");
                add_operation_schema(&mut registry, &type_name, output, &format!("{location}.outputSchema"))?;
            }
        }
        for resource in &self.spec.resources {
            let location = format!("resources[{}]", resource.name);
            if let Some(schema) = &resource.schema {
                let type_name = operation_type_name(&resource.name, "content");
                add_operation_schema(&mut registry, &type_name, schema, &format!("{location}.schema"))?;
            }
            if resource.is_template() {
                let type_name = operation_type_name(&resource.name, "params");
                let schema = template_params_schema(resource.address());
                add_operation_schema(&mut registry, &type_name, &schema, &format!("{location}.uriTemplate"))?;
            }
        }
        for prompt in &self.spec.prompts {
            if let Some(schema) = prompt_args_schema(prompt) {
                let type_name = operation_type_name(&prompt.name, "args");
                let location = format!("prompts[{}].arguments", prompt.name);
                add_operation_schema(&mut registry, &type_name, &schema, &location)?;
            }
        }
        Ok(registry)
    }

    /// Resolve every schema the generator would touch without writing anything.
    ///
    /// # Errors
    ///
    /// The first `SchemaRef` or `SpecValidation` error met.
    pub fn check(&mut self) -> Result<SpecSummary> {
        let registry = self.build_registry()?;
        let mut resolver = ReferenceResolver::new(&self.spec.components.schemas, &mut self.loader);
        let mut schemas = 0;
        for (name, schema, location) in registry.entries() {
            if registry.custom_mapping(name).is_some() {
                continue;
            }
            resolver.resolve_to_value(schema, location)?;
            schemas += 1;
        }
        Ok(SpecSummary {
            tools: self.spec.tools.len(),
            resources: self.spec.resources.iter().filter(|r| !r.is_template()).count(),
            resource_templates: self.spec.resources.iter().filter(|r| r.is_template()).count(),
            prompts: self.spec.prompts.len(),
            schemas,
            external_documents: self.loader.cached_documents(),
        })
    }

    /// Generate every output file.
    ///
    /// The types and server files are rewritten when their content changes. The resolver file
    /// is created once. The handler file is created once and merged on later runs, or
    /// regenerated when `resolver.preserve` is off.
    pub fn run(&mut self) -> Result<GenerationReport> {
        let output_dir = self.config.output_dir();
        fs::create_dir_all(&output_dir)
            .map_err(|e| GenError::io("create directory", &output_dir, e))?;

        let registry = self.build_registry()?;
        let mut resolver = ReferenceResolver::new(&self.spec.components.schemas, &mut self.loader);

        let title = &self.spec.info.title;
        let types = registry.generate(
            &mut resolver,
            &format!("Types for {title} {}.", self.spec.info.version),
        )?;
        let views = ServerViews::build(&self.spec, &registry, &mut resolver)?;
        debug!(
            types = types.declared.len(),
            tools = views.tools.len(),
            resources = views.resources.len(),
            resource_templates = views.resource_templates.len(),
            prompts = views.prompts.len(),
            "views built"
        );

        let mut report = GenerationReport {
            types: types.declared.clone(),
            ..Default::default()
        };

        let types_file = &self.config.types.filename;
        let types_source = format_generated(types_file, &types.source)?;
        report.files.push(write_generated("types", &output_dir.join(types_file), &types_source)?);

        let server_file = &self.config.server.filename;
        let server_raw = render(&self.server_template(&views), server_file)?;
        let server_source = format_generated(server_file, &server_raw)?;
        report.files.push(write_generated("server", &output_dir.join(server_file), &server_source)?);

        if self.config.mod_file {
            let mod_raw = render(&self.mod_template(), "mod.rs")?;
            let mod_source = format_generated("mod.rs", &mod_raw)?;
            report.files.push(write_generated("mod.rs", &output_dir.join("mod.rs"), &mod_source)?);
        }

        report.files.push(self.write_resolver(&output_dir)?);
        report.files.push(self.write_handlers(&output_dir, &views)?);

        info!(
            output = %output_dir.display(),
            files = report.files.len(),
            types = report.types.len(),
            "generation complete"
        );
        Ok(report)
    }

    fn server_template(&self, views: &ServerViews) -> ServerTemplate {
        let info = &self.spec.info;
        ServerTemplate {
            title: info.title.clone(),
            version: info.version.clone(),
            title_literal: format!("{:?}", info.title),
            version_literal: format!("{:?}", info.version),
            description_literal: super::format::optional_string_literal(info.description.as_deref()),
            runtime_crate: self.config.runtime_crate.clone(),
            types_module: self.config.types.module.clone(),
            tools: views.tools.clone(),
            resources: views.resources.clone(),
            resource_templates: views.resource_templates.clone(),
            prompts: views.prompts.clone(),
        }
    }

    fn mod_template(&self) -> ModRsTemplate {
        let mut modules: Vec<String> = [
            &self.config.types.filename,
            &self.config.server.filename,
            &self.config.resolver.filename,
            &self.config.handlers.filename,
        ]
        .into_iter()
        .map(|f| GeneratorConfig::module_name(f).to_string())
        .collect();
        modules.sort();
        modules.dedup();
        ModRsTemplate { modules }
    }

    fn write_resolver(&self, output_dir: &Path) -> Result<FileReport> {
        let filename = &self.config.resolver.filename;
        let path = output_dir.join(filename);
        if path.exists() {
            debug!(path = %path.display(), "resolver exists, left untouched");
            return Ok(FileReport {
                label: "resolver",
                path,
                outcome: FileOutcome::Kept,
            });
        }
        let source = render(
            &ResolverTemplate {
                title: self.spec.info.title.clone(),
                resolver_type: self.config.resolver.type_name.clone(),
            },
            filename,
        )?;
        check_source(filename, &source)?;
        write_file(&path, &source)?;
        Ok(FileReport {
            label: "resolver",
            path,
            outcome: FileOutcome::Written,
        })
    }

    fn write_handlers(&self, output_dir: &Path, views: &ServerViews) -> Result<FileReport> {
        let filename = &self.config.handlers.filename;
        let path = output_dir.join(filename);
        if !path.exists() || !self.config.resolver.preserve {
            let source = self.fresh_handlers(views)?;
            write_file(&path, &source)?;
            return Ok(FileReport {
                label: "handlers",
                path,
                outcome: FileOutcome::Written,
            });
        }

        let parser = ResolverSourceParser::new(&self.config.resolver.type_name);
        let parsed = parser.parse(&path)?;
        let mut existing = parser.extract_handlers(&parsed);
        let required = RequiredHandlers::from_spec(&self.spec);
        let plan = merge(&mut existing, &required);
        let summary = plan.summary();
        if !plan.changed() {
            debug!(path = %path.display(), "handlers up to date");
            return Ok(FileReport {
                label: "handlers",
                path,
                outcome: FileOutcome::Merged(summary),
            });
        }

        let writer = MergeWriter::new(
            &parser,
            &parsed,
            &self.config.resolver.type_name,
            &self.config.runtime_crate,
        );
        let merged = writer.write(&plan, |id| stub_for(views, id, filename))?;
        write_file(&path, &merged)?;
        Ok(FileReport {
            label: "handlers",
            path,
            outcome: FileOutcome::Merged(summary),
        })
    }

    /// A complete handler file with one stub per operation.
    fn fresh_handlers(&self, views: &ServerViews) -> Result<String> {
        let blocks = HandlerCategory::ALL
            .into_iter()
            .map(|category| ImplBlockView {
                trait_name: category.trait_name().to_string(),
                stubs: views.handlers_for(category).iter().map(|h| h.stub()).collect(),
            })
            .collect();
        let template = HandlersTemplate {
            title: self.spec.info.title.clone(),
            runtime_crate: self.config.runtime_crate.clone(),
            types_module: self.config.types.module.clone(),
            server_module: self.config.server.module.clone(),
            resolver_module: self.config.resolver.module.clone(),
            resolver_type: self.config.resolver.type_name.clone(),
            blocks,
        };
        let filename = &self.config.handlers.filename;
        format_source(filename, &render(&template, filename)?)
    }
}

/// Register a per-operation schema under `type_name`.
///
/// A schema that is a reference to the component already declaring `type_name`, or identical
/// to it, is not declared twice.
fn add_operation_schema(
    registry: &mut TypeRegistry,
    type_name: &str,
    schema: &Schema,
    location: &str,
) -> Result<()> {
    let Some(existing_key) = registry.key_for_type(type_name).map(str::to_string) else {
        registry.add_schema(type_name, schema.clone(), location);
        return Ok(());
    };
    let self_reference = schema
        .reference
        .as_deref()
        .and_then(|r| r.strip_prefix(LOCAL_REF_PREFIX))
        == Some(existing_key.as_str());
    if self_reference || registry.schema(&existing_key) == Some(schema) {
        debug!(type_name, location, "type already declared by {existing_key}");
        return Ok(());
    }
    Err(GenError::SpecValidation(format!(
        "{location} needs the type name {type_name}, which {existing_key:?} already declares with a different schema"
    )))
}

/// Two generated components may not share a Rust type name (`user` and `User`,
/// `task_status` and `task-status`).
fn check_component_type_names(registry: &TypeRegistry, spec: &ApiSpec) -> Result<()> {
    let mut declared: BTreeMap<String, &str> = BTreeMap::new();
    for name in spec.components.schemas.keys() {
        if registry.custom_mapping(name).is_some() {
            continue;
        }
        let type_name = to_type_name(name);
        if let Some(previous) = declared.get(&type_name) {
            return Err(GenError::SpecValidation(format!(
                "components.schemas.{previous} and components.schemas.{name} both generate the type {type_name}"
            )));
        }
        declared.insert(type_name, name);
    }
    Ok(())
}

fn stub_for(views: &ServerViews, id: &HandlerId, filename: &str) -> Result<String> {
    let view = views.handler(id).ok_or_else(|| {
        GenError::SpecValidation(format!("no operation produces the {id}"))
    })?;
    format_method(filename, &view.stub())
}

fn write_file(path: &Path, contents: &str) -> Result<()> {
    fs::write(path, contents).map_err(|e| GenError::io("write", path, e))?;
    info!(path = %path.display(), bytes = contents.len(), "wrote file");
    Ok(())
}

/// Write a generator-owned file unless its content is already current.
fn write_generated(label: &'static str, path: &Path, contents: &str) -> Result<FileReport> {
    let current = fs::read_to_string(path).ok();
    let outcome = if current.as_deref() == Some(contents) {
        debug!(path = %path.display(), "unchanged");
        FileOutcome::Unchanged
    } else {
        write_file(path, contents)?;
        FileOutcome::Written
    };
    Ok(FileReport {
        label,
        path: path.to_path_buf(),
        outcome,
    })
}
