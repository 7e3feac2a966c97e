//! `josamask` command line: batch masking, dry-run inspection and config
//! printing on top of the lopdf backend and the heuristic tokenizer.

pub mod config;
pub mod inspect;
pub mod process;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use josamask_text::HeuristicTokenizer;
use std::path::PathBuf;

use config::ConfigArgs;
use process::{ProcessRequest, DEFAULT_SUFFIX};

#[derive(Debug, Parser)]
#[command(name = "josamask", version, about = "Mask Korean nouns and particle-bearing words in PDFs")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// More log output (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Mask one or more PDF files
    Mask(MaskArgs),
    /// Show tokens and masked fragments without writing a file
    Inspect(InspectArgs),
    /// Print the effective configuration as JSON
    Config(ShowConfigArgs),
}

#[derive(Debug, Args)]
pub struct MaskArgs {
    #[arg(required = true, value_name = "PDF")]
    pub files: Vec<PathBuf>,

    #[arg(short, long, value_name = "DIR", default_value = ".")]
    pub output_dir: PathBuf,

    /// Appended to each input's file stem
    #[arg(long, default_value = DEFAULT_SUFFIX)]
    pub suffix: String,

    /// Re-read each output and check it against its source
    #[arg(long)]
    pub verify: bool,

    /// Write a JSON report next to each output
    #[arg(long)]
    pub report: bool,

    #[command(flatten)]
    pub config: ConfigArgs,
}

#[derive(Debug, Args)]
pub struct InspectArgs {
    #[arg(value_name = "PDF")]
    pub file: PathBuf,

    /// Print JSON instead of text
    #[arg(long)]
    pub json: bool,

    #[command(flatten)]
    pub config: ConfigArgs,
}

#[derive(Debug, Args)]
pub struct ShowConfigArgs {
    /// Also write the configuration to this file
    #[arg(long, value_name = "FILE")]
    pub save: Option<PathBuf>,

    #[command(flatten)]
    pub config: ConfigArgs,
}

impl Cli {
    /// Log filter implied by -v/-q; `RUST_LOG` still wins.
    pub fn log_level(&self) -> &'static str {
        match (self.quiet, self.verbose) {
            (true, _) => "warn",
            (false, 0) => "info",
            (false, 1) => "debug",
            _ => "trace",
        }
    }

    /// Runs the subcommand. `Ok(false)` means some file failed.
    pub fn run(self) -> Result<bool> {
        match self.command {
            Command::Mask(args) => run_mask(args),
            Command::Inspect(args) => run_inspect(args),
            Command::Config(args) => run_config(args),
        }
    }
}

fn run_mask(args: MaskArgs) -> Result<bool> {
    let config = args.config.resolve()?;
    let tokenizer = HeuristicTokenizer::new();
    let request = ProcessRequest {
        files: args.files,
        output_directory: args.output_dir,
        suffix: args.suffix,
        verify: args.verify,
        report: args.report,
    };

    let result = process::process_pdfs(&request, &config, &tokenizer)?;
    for path in &result.processed_files {
        println!("{}", path);
    }
    for error in &result.errors {
        eprintln!("error: {}", error);
    }
    Ok(result.success)
}

fn run_inspect(args: InspectArgs) -> Result<bool> {
    let config = args.config.resolve()?;
    let pages = inspect::inspect_pdf(&args.file, &config, &HeuristicTokenizer::new())?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&pages)?);
    } else {
        print!("{}", inspect::render(&pages));
    }
    Ok(true)
}

fn run_config(args: ShowConfigArgs) -> Result<bool> {
    let config = args.config.resolve()?;
    if let Some(path) = &args.save {
        config::save_config(path, &config)?;
    }
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(true)
}
