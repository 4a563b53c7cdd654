//! Request Tree CLI
//!
//! Builds causal request trees from captured browser network logs
//! and writes them as JSON reports.

use anyhow::Result;
use clap::{Parser, Subcommand};
use env_logger::Env;
use std::path::PathBuf;

use request_tree::commands::{
    display_schema, display_version, execute_build, validate_args, validate_report_file, BuildArgs,
};
use request_tree::graph::AssemblerConfig;
use request_tree::utils::config::DEFAULT_HEAVY_CHAINS;

/// Request Tree - who fetched what while a page loaded
#[derive(Parser, Debug)]
#[command(name = "request-tree")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
enum Commands {
    /// Build a request tree report from a capture file
    Build {
        /// Capture file (normalized capture or DevTools network log)
        #[arg(short, long, env = "REQUEST_TREE_INPUT")]
        input: PathBuf,

        /// Output path for the JSON report
        #[arg(short, long, default_value = "report.json")]
        output: PathBuf,

        /// Number of heavy request chains to include
        #[arg(long, default_value_t = DEFAULT_HEAVY_CHAINS)]
        heavy: usize,

        /// Attach requests with no initiator under their frame's document
        #[arg(long)]
        frame_fallback: bool,

        /// Print the tree and a text summary to stdout
        #[arg(long)]
        summary: bool,

        /// Depth limit for the printed tree
        #[arg(long, default_value = "6")]
        depth: usize,
    },

    /// Validate a report JSON file
    Validate {
        /// Path to report JSON file
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Display schema information
    Schema {
        /// Show full schema details
        #[arg(long)]
        show: bool,
    },

    /// Display version information
    Version,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(log_level)).init();

    match cli.command {
        Commands::Build {
            input,
            output,
            heavy,
            frame_fallback,
            summary,
            depth,
        } => {
            let args = BuildArgs {
                input,
                output_json: output,
                heavy_chains: heavy,
                assembler: AssemblerConfig::new().with_frame_fallback(frame_fallback),
                print_summary: summary,
                tree_depth: depth,
            };

            validate_args(&args)?;
            execute_build(args)?;
        }

        Commands::Validate { file } => {
            validate_report_file(&file)?;
        }

        Commands::Schema { show } => {
            display_schema(show);
        }

        Commands::Version => {
            display_version();
        }
    }

    Ok(())
}
