//! # mcpgen-runtime
//!
//! Support types shared by every server generated with `mcpgen`.
//!
//! Generated code depends on this crate for:
//!
//! - **[`Omittable`]** - tri-state wrapper for fields that distinguish "absent" from "null"
//! - **[`HandlerError`]** - the error type returned by every handler
//! - **[`RequestContext`]** - per-call metadata passed to handlers
//! - **Definitions** - [`ToolDefinition`], [`ResourceDefinition`], [`PromptDefinition`] and friends
//!   that describe the server to a client
//! - **[`uri_template`]** - placeholder extraction and matching for templated resources
//! - **[`OrphanedHandler`]** - marker entries for handlers quarantined by the generator
//!
//! `chrono` is re-exported so that generated `DateTime<Utc>` fields resolve without an extra
//! dependency in the generated crate.

mod definition;
mod handler;
mod omittable;
mod orphan;
pub mod uri_template;

pub use chrono;
pub use definition::{
    embedded_schema, PromptArgument, PromptDefinition, ResourceDefinition,
    ResourceTemplateDefinition, ServerInfo, ToolAnnotations, ToolDefinition,
};
pub use handler::{
    HandlerError, PromptMessage, PromptResult, RequestContext, ResourceContents, Role,
};
pub use omittable::Omittable;
pub use orphan::OrphanedHandler;
