//! # Generator Module
//!
//! Turns an API description into a typed server skeleton.
//!
//! ## Overview
//!
//! One run writes up to five files into the configured output directory:
//!
//! - **types.rs** - One Rust type per named schema and per operation input, output, content,
//!   URI parameters and prompt arguments. Always regenerated.
//! - **server.rs** - Handler traits, definition tables and dispatch. Always regenerated.
//! - **mod.rs** - Module declarations, when `mod_file` is enabled.
//! - **resolver.rs** - The user's resolver type. Written once, never touched again.
//! - **handlers.rs** - One stub per operation. Written once, then merged on later runs:
//!   new operations get stubs, removed ones move to the orphaned section, and hand-written
//!   bodies are never rewritten.
//!
//! ## Pipeline
//!
//! ```text
//! mcp.yaml → TypeRegistry → TypeRenderer ─┐
//!          → ServerViews ─────────────────┼→ Askama templates → syn + prettyplease → files
//!          → RequiredHandlers → merge ────┘
//! ```
//!
//! Generated files start with [`GENERATED_HEADER`] and are formatted through
//! `prettyplease`, so the same input always yields byte-identical output.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use mcpgen::config::GeneratorConfig;
//! use mcpgen::generator::Generator;
//!
//! let config = GeneratorConfig::load("mcpgen.yaml".as_ref())?;
//! let report = Generator::from_config(config)?.run()?;
//! if let Some(summary) = report.merge_summary() {
//!     println!("handlers: {summary}");
//! }
//! ```

mod format;
mod generate;
mod registry;
mod templates;
#[cfg(test)]
mod tests;
mod types;
mod views;

pub use format::{check_source, format_generated, format_method, format_source, GENERATED_HEADER};
pub use generate::{FileOutcome, FileReport, GenerationReport, Generator, SpecSummary};
pub use registry::{CustomTypeMapping, TypeRegistry};
pub use templates::{render, InitConfigTemplate, InitSpecTemplate};
pub use types::{Declaration, GeneratedTypes};
pub use views::{operation_type_name, HandlerView, ServerViews};
