//! Command-line surface
//!
//! One prompt (or saved draft) in, one summary line or one error out.

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use colored::Colorize;
use metaforge_codegen::{Generator, summarize};
use metaforge_core::Validatable;
use metaforge_ir::{DraftFile, FinalSchema, load_draft, save_draft};
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use crate::ai::{GeminiParser, PromptParser};
use crate::config::ForgeConfig;
use crate::pipeline::{Pipeline, RequestOutcome, RunOptions};

/// Default output directory of `render`
pub const DEFAULT_RENDER_DIR: &str = "metaforge-out";

#[derive(Debug, Parser)]
#[command(name = "metaforge")]
#[command(about = "Turn a plain-language schema request into deployed Salesforce metadata")]
#[command(version)]
pub struct Cli {
    #[command(flatten)]
    pub config: ForgeConfig,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Parse a prompt, render the metadata and deploy it
    Generate {
        /// Natural-language description of the object
        prompt: String,

        /// Stop after writing files into the project
        #[arg(long)]
        dry_run: bool,

        /// Also save the parsed draft to this file
        #[arg(long, value_name = "FILE")]
        save_draft: Option<PathBuf>,
    },

    /// Parse a prompt into a draft without rendering
    Parse {
        /// Natural-language description of the object
        prompt: String,

        /// Write the draft here instead of stdout
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Render a saved draft into a directory
    Render {
        /// Draft JSON file
        draft: PathBuf,

        /// Output directory
        #[arg(long, default_value = DEFAULT_RENDER_DIR)]
        out: PathBuf,
    },

    /// Deploy a saved draft without calling the model
    Deploy {
        /// Draft JSON file
        draft: PathBuf,

        /// Stop after writing files into the project
        #[arg(long)]
        dry_run: bool,
    },
}

impl Cli {
    /// Parse `std::env::args`
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

// ============================================================================
// Logging
// ============================================================================

/// Install the log subscriber. `RUST_LOG` wins over `-v`.
pub fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

// ============================================================================
// Execution
// ============================================================================

/// Run a parsed command line
pub async fn execute(cli: Cli) -> Result<()> {
    let Cli {
        config, command, ..
    } = cli;
    config.validate().context("Invalid configuration")?;

    match command {
        Command::Generate {
            prompt,
            dry_run,
            save_draft: draft_path,
        } => {
            let parser = GeminiParser::from_config(&config)?;
            let draft = parser.parse(&prompt).await?;

            if let Some(path) = draft_path {
                save_draft(&DraftFile::new(draft.clone()).with_prompt(&prompt), &path)?;
                tracing::info!(path = %path.display(), "saved draft");
            }

            let outcome = Pipeline::new(config)
                .deploy_draft(&draft, RunOptions { dry_run })
                .await?;
            print_outcome(&outcome);
        }

        Command::Parse { prompt, output } => {
            let parser = GeminiParser::from_config(&config)?;
            let draft = parser.parse(&prompt).await?;
            let file = DraftFile::new(draft).with_prompt(&prompt);

            match output {
                Some(path) => {
                    save_draft(&file, &path)?;
                    println!("{} {}", "Saved draft to".green(), path.display());
                }
                None => println!("{}", serde_json::to_string_pretty(&file)?),
            }
        }

        Command::Render { draft, out } => {
            let file = load_draft(&draft)?;
            let schema = FinalSchema::from_draft(&file.draft)?;
            let generator = Generator::new(config.generator_config().with_output_dir(&out));
            let artifacts = generator.render_and_write(&schema)?;

            eprint!("{}", summarize(&artifacts));
            println!(
                "{} Wrote {} files to {}",
                schema.summary().green(),
                artifacts.file_count(),
                out.display()
            );
        }

        Command::Deploy { draft, dry_run } => {
            let file = load_draft(&draft)?;
            let outcome = Pipeline::new(config)
                .deploy_draft(&file.draft, RunOptions { dry_run })
                .await?;
            print_outcome(&outcome);
        }
    }

    Ok(())
}

fn print_outcome(outcome: &RequestOutcome) {
    println!("{}", outcome.message.green());
    if outcome.deploy.is_none() {
        println!(
            "{} {} files promoted, deployment skipped",
            "Dry run:".yellow(),
            outcome.promoted.len()
        );
    }
}

/// Print an error the way callers expect: `Error: <message>`
pub fn report_error(err: &anyhow::Error) {
    eprintln!("{} {:#}", "Error:".red().bold(), err);
}
