//! Línea de comandos (`stepflow`).

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "stepflow", author, version, about = "Declare, compile and run string-passing pipelines", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List catalog pipelines and components
    List,
    /// Compile pipelines to workflow documents
    Compile {
        /// Pipelines to compile
        pipelines: Vec<String>,
        /// Compile every catalog pipeline
        #[arg(long, conflicts_with = "pipelines")]
        all: bool,
        /// Output directory or explicit .yaml path (default: STEPFLOW_OUTPUT_DIR)
        #[arg(long, short)]
        out: Option<PathBuf>,
        /// Image used by every executor (default: STEPFLOW_BASE_IMAGE or the component's)
        #[arg(long)]
        image: Option<String>,
    },
    /// Run a pipeline locally and print task outputs
    Run {
        pipeline: String,
        /// Pipeline parameter override
        #[arg(long = "param", short, value_name = "KEY=VALUE", value_parser = parse_key_val)]
        params: Vec<(String, String)>,
        /// Seed for random components (default: STEPFLOW_SEED)
        #[arg(long)]
        seed: Option<u64>,
        /// Print the outcome as JSON
        #[arg(long)]
        json: bool,
    },
    /// Run a single component (container entrypoint of compiled documents)
    Exec {
        #[arg(long)]
        component: String,
        #[arg(long = "input", value_name = "KEY=VALUE", value_parser = parse_key_val)]
        inputs: Vec<(String, String)>,
        /// Write the output here instead of stdout
        #[arg(long)]
        output_path: Option<PathBuf>,
    },
    /// Load a document, validate its DAG and print it
    Inspect { file: PathBuf },
}

/// `KEY=VALUE`; el valor puede contener `=` y ser vacío.
pub fn parse_key_val(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((k, v)) if !k.trim().is_empty() => Ok((k.trim().to_string(), v.to_string())),
        _ => Err(format!("expected KEY=VALUE, got '{s}'")),
    }
}
