//! # Schema Module
//!
//! JSON-Schema handling for the generator:
//!
//! - **[`Schema`]** - the subset of JSON Schema (draft 2020-12 flavoured) the generator reads,
//!   with every other keyword preserved verbatim
//! - **[`SchemaLoader`]** - loads and caches schema documents referenced by file path
//! - **[`ReferenceResolver`]** - inlines `$ref`s into a self-contained copy for embedding
//!
//! Two annotations steer type generation and are stripped from resolved copies:
//!
//! ```yaml
//! created_on:
//!   type: string
//!   x-mcpgen-type: chrono::NaiveDate   # reference an existing type instead of generating one
//! nickname:
//!   type: string
//!   x-mcpgen-omittable: true           # absent / null / value
//! ```

mod loader;
mod resolve;
mod types;

#[cfg(test)]
mod tests;

pub use loader::SchemaLoader;
pub use resolve::{parse_reference, Reference, ReferenceResolver};
pub use types::{
    AdditionalProperties, Primitive, Schema, SchemaKind, SchemaType, LOCAL_REF_PREFIX,
    OMITTABLE_ANNOTATION, TYPE_ANNOTATION,
};
