//! Quip CLI - Perceptual image hashing and comparison tool.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use quip_core::HashType;
use tracing_subscriber::{fmt, EnvFilter};

mod commands;
mod exit_codes;
mod utils;

use exit_codes::ExitCode;

const EXIT_CODES_HELP: &str = "\
Exit codes:
  0   Success
  1   General error
  65  File is not a decodable image
  66  Cannot read input file
  74  Cannot write output";

#[derive(Parser)]
#[command(name = "quip")]
#[command(author, version, about = "Perceptual image hashing for similarity lookups", long_about = None)]
#[command(after_help = EXIT_CODES_HELP)]
struct Cli {
    /// Suppress human-readable output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Log progress to stderr (repeat for more detail)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// When to use colors
    #[arg(long, global = true, value_enum, default_value_t = ColorChoice::Auto)]
    color: ColorChoice,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum ColorChoice {
    Auto,
    Always,
    Never,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute perceptual digests and the content fingerprint of an image
    Hash {
        /// Path to the image
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Hash types to compute, comma-separated (default: all)
        #[arg(short, long, value_delimiter = ',')]
        types: Vec<HashType>,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Hamming distance between two images for each hash type
    Compare {
        /// First image
        #[arg(value_name = "A")]
        first: PathBuf,

        /// Second image
        #[arg(value_name = "B")]
        second: PathBuf,

        /// Hash types to compare, comma-separated (default: all)
        #[arg(short, long, value_delimiter = ',')]
        types: Vec<HashType>,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "quip=info,quip_core=info",
        _ => "quip=debug,quip_core=debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();

    match cli.color {
        ColorChoice::Always => colored::control::set_override(true),
        ColorChoice::Never => colored::control::set_override(false),
        ColorChoice::Auto => {}
    }
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Hash { file, types, json } => {
            commands::hash::execute(file, types, json, cli.quiet)
        }
        Commands::Compare {
            first,
            second,
            types,
            json,
        } => commands::compare::execute(first, second, types, json, cli.quiet),
    };

    if let Err(err) = result {
        let exit = ExitCode::from_anyhow(&err);
        eprintln!("Error: {}", exit.message);
        std::process::exit(exit.code);
    }
}
