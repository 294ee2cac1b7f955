use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use colored::Colorize;
use olxcheck::cli::ValidateCommand;
use olxcheck::{Registries, Result};
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "olxcheck")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Semantic validator for OLX course directories", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a course directory or root course file
    Validate {
        /// Course directory (containing course.xml) or a root XML file
        path: PathBuf,

        /// Number of stages to run, 1-8 (0 = all)
        #[arg(short, long, value_parser = clap::value_parser!(u8).range(0..=8))]
        steps: Option<u8>,

        /// Diagnostic code to suppress (repeatable)
        #[arg(short, long = "ignore", value_name = "CODE")]
        ignore: Vec<String>,

        /// Output in JSON format
        #[arg(short, long)]
        json: bool,

        /// Only print findings
        #[arg(short, long, conflicts_with = "verbose")]
        quiet: bool,

        /// Show object and file locations, and info-level logs
        #[arg(short, long)]
        verbose: bool,

        /// Config file (default: <course>/olxcheck.toml)
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,
    },

    /// List diagnostic codes and their severities
    Codes {
        /// Output in JSON format
        #[arg(short, long)]
        json: bool,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn init_tracing(quiet: bool, verbose: bool) {
    let default = if quiet {
        "error"
    } else if verbose {
        "info"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_env("OLXCHECK_LOG").unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: Cli) -> Result<bool> {
    match cli.command {
        Commands::Validate {
            path,
            steps,
            ignore,
            json,
            quiet,
            verbose,
            config,
        } => {
            init_tracing(quiet, verbose);
            let registries = Registries::builtin();
            let command = ValidateCommand {
                path,
                steps,
                ignore,
                json,
                quiet,
                verbose,
                config,
            };
            olxcheck::cli::validate::run(&command, &registries)
        }

        Commands::Codes { json } => {
            init_tracing(false, false);
            olxcheck::cli::codes::run(json)?;
            Ok(true)
        }

        Commands::Completions { shell } => {
            generate(shell, &mut Cli::command(), "olxcheck", &mut io::stdout());
            Ok(true)
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(err) => {
            eprintln!("{} {:#}", "Error:".red().bold(), err);
            ExitCode::from(2)
        }
    }
}
