mod commands;
mod config;
mod runner;
mod tap;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand, ValueEnum};

/// Output format for CLI responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    Text,
    Json,
}

/// Skein parser with search-based syntax error recovery.
#[derive(Parser)]
#[command(
    name = "skein",
    version,
    about = "Skein parser with search-based syntax error recovery"
)]
struct Cli {
    /// Output format (text or json)
    #[arg(long, global = true, default_value = "text", value_enum)]
    output: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, global = true)]
    quiet: bool,

    /// Log chosen repairs (equivalent to RUST_LOG=debug)
    #[arg(long, short, global = true)]
    verbose: bool,

    /// Path to a skein.toml with a [recovery] section
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse source files and report recovery diagnostics
    Check {
        /// Source files to parse
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Print the recovered syntax tree of a source file
    Tree {
        /// Path to the source file
        file: PathBuf,
    },

    /// Run the recovery conformance suite
    Test {
        /// Path to the conformance suite directory
        #[arg(default_value = "conformance")]
        suite_dir: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .init();

    let recovery = match config::load(cli.config.as_deref()) {
        Ok(c) => c.recovery,
        Err(msg) => {
            report_error(&msg, cli.output, cli.quiet);
            process::exit(2);
        }
    };

    match cli.command {
        Commands::Check { files } => {
            commands::check::cmd_check(&files, recovery, cli.output, cli.quiet);
        }
        Commands::Tree { file } => {
            commands::tree::cmd_tree(&file, recovery, cli.output, cli.quiet);
        }
        Commands::Test { suite_dir } => {
            commands::test::cmd_test(&suite_dir, recovery, cli.quiet);
        }
    }
}

pub(crate) fn report_error(msg: &str, output: OutputFormat, quiet: bool) {
    if quiet {
        return;
    }
    match output {
        OutputFormat::Text => eprintln!("{}", msg),
        OutputFormat::Json => {
            eprintln!("{}", serde_json::json!({ "error": msg }));
        }
    }
}
