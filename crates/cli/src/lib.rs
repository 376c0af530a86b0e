//! # Metaforge CLI
//!
//! Command-line interface, model client and deployment driver for Metaforge.
//!
//! ## Commands
//!
//! - `generate` - Parse a prompt, render the metadata and deploy it
//! - `parse` - Parse a prompt into a draft file
//! - `render` - Render a saved draft into a directory
//! - `deploy` - Deploy a saved draft without calling the model
//!

pub mod ai;
pub mod commands;
pub mod config;
pub mod deploy;
pub mod pipeline;

pub use ai::{GeminiParser, PromptParser};
pub use commands::{Cli, execute, init_tracing, report_error};
pub use config::ForgeConfig;
pub use deploy::{CommandRunner, DeployDriver, DeployState, DeployStep, SystemRunner};
pub use pipeline::{Pipeline, RequestOutcome, RunOptions};

// Re-export dependencies for use in main.rs
pub use metaforge_codegen;
pub use metaforge_core;
pub use metaforge_ir;

/// CLI version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// CLI name
pub const NAME: &str = env!("CARGO_PKG_NAME");
