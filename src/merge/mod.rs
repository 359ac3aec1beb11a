//! # Merge Module
//!
//! Keeps a user-owned handler file in step with the API description without touching the
//! code already written in it.
//!
//! ## Flow
//!
//! ```text
//! handlers.rs → ResolverSourceParser → ExistingHandlers ─┐
//!                                                         ├→ merge() → MergePlan → MergeWriter → handlers.rs
//! API description → RequiredHandlers ─────────────────────┘
//! ```
//!
//! - **Parsing** ([`ResolverSourceParser`]) finds `impl <HandlerTrait> for <Resolver>` blocks
//!   with `syn`, records each method's exact text and byte range, and reads the orphaned
//!   section at the end of the file.
//! - **Planning** ([`merge`]) compares handler identities (trait plus method name) with the
//!   operations the description requires: missing ones get stubs, extra ones are orphaned,
//!   orphaned ones that are required again are restored.
//! - **Writing** ([`MergeWriter`]) splices stubs before the closing brace of the matching
//!   `impl` block, cuts orphaned methods out, and rebuilds the orphaned section (see
//!   [`trailer`]).
//!
//! A merge that changes nothing leaves the file untouched.

mod category;
mod engine;
mod parser;
pub mod trailer;


pub use category::{HandlerCategory, HandlerId, RequiredHandlers};
pub use engine::{merge, MergePlan, MergeSummary, MergeWriter, RESTORED_NOTE};
pub use parser::{
    ExistingHandlers, HandlerRecord, ImplBlock, LineIndex, ParsedHandlerFile,
    ResolverSourceParser, Trailer,
};
pub use trailer::OrphanEntry;
