//! # CLI Module
//!
//! Command-line interface for the `mcpgen` binary.
//!
//! ## Commands
//!
//! ### `generate`
//!
//! Run the whole pipeline for a configuration file:
//!
//! ```bash
//! mcpgen generate --config mcpgen.yaml
//! ```
//!
//! Prints one line per output file. The handler file line carries the merge status, e.g.
//! `added 1 new, orphaned 0, restored 0 from orphaned`.
//!
//! ### `validate`
//!
//! Load the configuration and spec and resolve every schema reference without writing:
//!
//! ```bash
//! mcpgen validate
//! ```
//!
//! ### `init`
//!
//! Scaffold a starter `mcpgen.yaml` and `mcp.yaml`:
//!
//! ```bash
//! mcpgen init notes-server
//! ```
//!
//! ## Usage from Code
//!
//! ```rust,ignore
//! use clap::Parser;
//! use mcpgen::cli::{run_cli, Cli};
//!
//! run_cli(Cli::parse())?;
//! ```

mod commands;


pub use commands::{init_project, run_cli, Cli, Commands};
