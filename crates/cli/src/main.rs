mod commands;
mod config;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use crate::commands::{expand, inspect, process as pipeline, query, sync};
use crate::config::Config;

/// Output format for CLI responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    Text,
    Json,
}

/// Form submission screening and routing.
#[derive(Parser)]
#[command(
    name = "formroute",
    version,
    about = "Form submission screening and routing"
)]
struct Cli {
    /// TOML configuration file (built-in defaults when omitted)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output format (text or json)
    #[arg(long, global = true, default_value = "text", value_enum)]
    output: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List stored submissions matching an ad-hoc query
    Query {
        /// Directory used as the submission store
        #[arg(long)]
        store: PathBuf,
        /// Key suffix after the entry prefix; `[start-end]` ranges are expanded
        #[arg(long, default_value = "")]
        suffix: String,
        /// Query rule sets, as inline JSON or a path to a JSON file
        #[arg(long)]
        query: String,
    },

    /// Check a submission against the exclusion rules
    Screen {
        /// Path to the submission JSON file
        file: PathBuf,
        /// Report which rule sets were evaluated
        #[arg(long)]
        trace: bool,
    },

    /// Print the topic the routing rules select for a submission
    Route {
        /// Path to the submission JSON file
        file: PathBuf,
        /// Report which rule sets were evaluated
        #[arg(long)]
        trace: bool,
    },

    /// Print a submission with attachment fields replaced by public URLs
    Compile {
        /// Path to the submission JSON file
        file: PathBuf,
    },

    /// List the attachments found in a submission
    Attachments {
        /// Path to the submission JSON file
        file: PathBuf,
    },

    /// Print every expansion of a range pattern
    Expand {
        /// Pattern such as `2024-0[1-3]/`
        pattern: String,
    },

    /// Screen, route, locate and publish every stored submission
    Process {
        /// Directory used as the submission store
        #[arg(long)]
        store: PathBuf,
        /// Key suffix after the entry prefix; `[start-end]` ranges are expanded
        #[arg(long, default_value = "")]
        suffix: String,
        /// Coordinates every address resolves to, as LAT,LON
        #[arg(long)]
        coordinates: Option<String>,
    },

    /// Copy missing attachments of stored submissions into the store
    Sync {
        /// Directory used as the submission and attachment store
        #[arg(long)]
        store: PathBuf,
        /// Key suffix after the entry prefix; `[start-end]` ranges are expanded
        #[arg(long, default_value = "")]
        suffix: String,
        /// Local mirror of the download base URL
        #[arg(long)]
        source: Option<PathBuf>,
        /// Only count missing attachments
        #[arg(long)]
        skip_download: bool,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.quiet);

    let config = match Config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(msg) => {
            report_error(&msg, cli.output, cli.quiet);
            process::exit(1);
        }
    };

    if let Err(msg) = run(cli.command, &config, cli.output, cli.quiet) {
        report_error(&msg, cli.output, cli.quiet);
        process::exit(1);
    }
}

fn run(command: Commands, config: &Config, output: OutputFormat, quiet: bool) -> Result<(), String> {
    match command {
        Commands::Query {
            store,
            suffix,
            query: rules,
        } => query::cmd_query(&store, &suffix, &rules, config, output),
        Commands::Screen { file, trace } => {
            inspect::cmd_screen(&file, config, trace, output, quiet)
        }
        Commands::Route { file, trace } => inspect::cmd_route(&file, config, trace, output),
        Commands::Compile { file } => inspect::cmd_compile(&file, config),
        Commands::Attachments { file } => inspect::cmd_attachments(&file, config, output),
        Commands::Expand { pattern } => expand::cmd_expand(&pattern, output),
        Commands::Process {
            store,
            suffix,
            coordinates,
        } => pipeline::cmd_process(
            &store,
            &suffix,
            coordinates.as_deref(),
            config,
            output,
            quiet,
        ),
        Commands::Sync {
            store,
            suffix,
            source,
            skip_download,
        } => sync::cmd_sync(
            &store,
            &suffix,
            source.as_deref(),
            skip_download,
            config,
            output,
        ),
    }
}

/// Log to stderr so stdout stays machine-readable. `RUST_LOG` overrides
/// the default level.
fn init_logging(quiet: bool) {
    let default = if quiet { "error" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
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
