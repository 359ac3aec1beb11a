//! # mcpgen
//!
//! **mcpgen** is a schema-first generator for typed MCP servers. An API description listing
//! tools, resources and prompts goes in; a Rust server skeleton comes out, and hand-written
//! handler code survives every regeneration.
//!
//! ## Overview
//!
//! - **[`spec`]** - Loading and validating the API description (`mcp.yaml`)
//! - **[`config`]** - The generator configuration (`mcpgen.yaml`)
//! - **[`schema`]** - JSON Schema model, `$ref` resolution and the external schema loader
//! - **[`generator`]** - Type registry, type rendering, server wiring and the run orchestrator
//! - **[`merge`]** - Handler file parsing and the incremental merge with its orphaned section
//! - **[`naming`]** - Identifier rules shared by the generator and the merge
//! - **[`cli`]** - The `mcpgen` command line
//! - **[`logging`]** - `tracing` subscriber setup
//!
//! ### Generation Flow
//!
//! ```mermaid
//! sequenceDiagram
//!     participant User
//!     participant CLI as CLI<br/>(mcpgen)
//!     participant Gen as generator::Generator
//!     participant Reg as generator::TypeRegistry
//!     participant Res as schema::ReferenceResolver
//!     participant Merge as merge
//!     participant FS as File System
//!
//!     User->>CLI: mcpgen generate
//!     CLI->>Gen: Generator::from_config(config)
//!     Gen->>Reg: register components and operation shapes
//!     Reg->>Res: follow $refs
//!     Reg-->>Gen: types source
//!     Gen->>FS: types.rs, server.rs, mod.rs
//!     Gen->>FS: resolver.rs (only when missing)
//!     Gen->>Merge: parse handlers.rs, plan, write
//!     Merge-->>Gen: merged source + summary
//!     Gen->>FS: handlers.rs
//!     CLI-->>User: ✅ per file
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! mcpgen init notes-server
//! cd notes-server
//! mcpgen generate
//! ```
//!
//! From code:
//!
//! ```rust,ignore
//! use mcpgen::config::GeneratorConfig;
//! use mcpgen::generator::Generator;
//!
//! let config = GeneratorConfig::load("mcpgen.yaml".as_ref())?;
//! let report = Generator::from_config(config)?.run()?;
//! ```
//!
//! ## Handler Preservation
//!
//! The handler file is written once. Later runs add stubs for new operations, move handlers of
//! removed operations into a commented orphaned section at the end of the file, and copy an
//! orphan's source back above a fresh stub when its operation returns. Method bodies are never
//! rewritten.

pub mod cli;
pub mod config;
pub mod error;
pub mod generator;
pub mod logging;
pub mod merge;
pub mod naming;
pub mod schema;
pub mod spec;

pub use config::GeneratorConfig;
pub use error::{GenError, Result};
pub use generator::Generator;
pub use spec::{load_spec, ApiSpec};
