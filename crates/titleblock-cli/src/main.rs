mod commands;
mod output;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "titleblock",
    version,
    about = "Locate title blocks in engineering drawings and extract their metadata"
)]
struct Cli {
    /// Log pipeline decisions to stderr (same as RUST_LOG=debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract title block fields from a JSON page description
    Extract {
        /// Path to a page description (one page object or an array of pages)
        input_file: PathBuf,

        /// Predefined engine configuration: standard (default) or extended
        #[arg(short, long, value_name = "NAME")]
        preset: Option<String>,

        /// Custom JSON engine configuration (overrides --preset)
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// Output format: table (default) or json
        #[arg(short, long, default_value = "table")]
        output: String,

        /// Write the full analysis to a JSON file
        #[arg(short = 'O', long = "out", value_name = "FILE")]
        out: Option<PathBuf>,
    },
    /// Show the vector lines and table cells detected on each page
    Grid {
        /// Path to a page description
        input_file: PathBuf,

        /// Predefined engine configuration: standard (default) or extended
        #[arg(short, long, value_name = "NAME")]
        preset: Option<String>,

        /// Custom JSON engine configuration (overrides --preset)
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// Output format: table (default) or json
        #[arg(short, long, default_value = "table")]
        output: String,
    },
    /// Manage and inspect engine configurations
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// List predefined configurations
    List,
    /// Print a predefined configuration as JSON
    Show {
        /// Preset name (e.g., "standard")
        preset: String,
    },
    /// Print the configuration schema with field descriptions and example
    Schema,
    /// Validate a custom configuration file
    Validate {
        /// Path to JSON configuration file
        file: PathBuf,
    },
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        tracing_subscriber::EnvFilter::new("debug")
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Extract {
            input_file,
            preset,
            config,
            output,
            out,
        } => commands::extract::run(input_file, preset, config, &output, out),
        Commands::Grid {
            input_file,
            preset,
            config,
            output,
        } => commands::grid::run(input_file, preset, config, &output),
        Commands::Config { action } => match action {
            ConfigAction::List => commands::config::list(),
            ConfigAction::Show { preset } => commands::config::show(&preset),
            ConfigAction::Schema => commands::config::schema(),
            ConfigAction::Validate { file } => commands::config::validate(&file),
        },
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
