//! crdgen CLI - generate type descriptors from Kubernetes CRDs

use clap::{Parser, Subcommand};
use miette::Result;
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, fmt};

mod commands;
mod display;
mod emitter;
mod exit_codes;
mod options;

use options::ConfigArgs;

#[derive(Parser)]
#[command(name = "crdgen")]
#[command(author = "crdgen Contributors")]
#[command(version)]
#[command(about = "Generate statically-typed descriptors from Kubernetes CRDs", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level filter (overridden by RUST_LOG)
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    /// Enable debug output
    #[arg(long, global = true)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a descriptor file per CRD kind
    Generate {
        #[command(flatten)]
        config: ConfigArgs,

        /// Output directory
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Write all descriptors to stdout instead of files
        #[arg(long, conflicts_with = "output")]
        stdout: bool,

        /// Overwrite existing files
        #[arg(long)]
        force: bool,
    },

    /// Resolve CRDs without writing anything
    Check {
        #[command(flatten)]
        config: ConfigArgs,

        /// Output the report as JSON
        #[arg(long)]
        json: bool,
    },
}

fn init_logging(level: &str, debug: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if debug {
            EnvFilter::new("crdgen=debug,crdgen_types=debug,crdgen_core=debug")
        } else {
            EnvFilter::new(level)
        }
    });
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    // Setup miette for nice error display
    miette::set_panic_hook();

    let cli = Cli::parse();

    if cli.debug {
        // SAFETY: We're the only thread at this point (start of main)
        unsafe { std::env::set_var("RUST_BACKTRACE", "1") };
    }
    init_logging(&cli.log_level, cli.debug);

    match cli.command {
        Commands::Generate {
            config,
            output,
            stdout,
            force,
        } => commands::generate::run(config, output, stdout, force),

        Commands::Check { config, json } => commands::check::run(config, json),
    }
}
