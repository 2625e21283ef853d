//! Depot CLI - caching proxy for Maven-style artifact repositories

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use depot_core::Layout;

mod commands;
mod error;
mod exit_codes;

use error::{CliError, Result};

#[derive(Parser)]
#[command(name = "depot")]
#[command(author = "Depot Contributors")]
#[command(version)]
#[command(about = "Caching proxy for Maven-style artifact repositories", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Proxy configuration file
    #[arg(short, long, global = true, env = "DEPOT_CONFIG")]
    config: Option<PathBuf>,

    /// Enable debug output
    #[arg(long, global = true)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the repository path of an artifact
    Resolve {
        /// groupId:artifactId:version[:type[:classifier]]
        coordinate: String,

        /// Layout to encode with
        #[arg(short, long, default_value = "default")]
        layout: Layout,

        /// Also print the metadata document paths
        #[arg(long)]
        metadata: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Decode a repository path, optionally into another layout
    Path {
        /// Repository-relative path
        path: String,

        /// Layout the path is in
        #[arg(short, long, default_value = "default")]
        layout: Layout,

        /// Re-encode in this layout
        #[arg(long)]
        to: Option<Layout>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Validate the configuration and show connectors
    Check,

    /// Fetch a path into a managed repository
    Fetch {
        /// Managed repository id
        repo: String,

        /// Repository-relative path, in the managed repository's layout
        path: String,
    },

    /// Merge remote metadata into a managed repository
    Merge {
        /// Managed repository id
        repo: String,

        /// Path of a maven-metadata.xml document
        path: String,
    },

    /// Verify a local file against its checksum files
    Verify {
        /// Artifact file
        file: PathBuf,
    },
}

fn main() {
    // Setup miette for nice error display
    miette::set_panic_hook();

    let cli = Cli::parse();

    // Set debug level
    if cli.debug {
        // SAFETY: We're the only thread at this point (start of main)
        unsafe { std::env::set_var("RUST_BACKTRACE", "1") };
    }

    let code = match run(cli) {
        Ok(()) => exit_codes::SUCCESS,
        Err(err) => {
            let code = err.exit_code();
            eprintln!("{:?}", miette::Report::new(err));
            code
        }
    };
    std::process::exit(code);
}

fn run(cli: Cli) -> Result<()> {
    let config = cli.config;
    match cli.command {
        Commands::Resolve {
            coordinate,
            layout,
            metadata,
            json,
        } => commands::resolve::run(&coordinate, layout, metadata, json),

        Commands::Path {
            path,
            layout,
            to,
            json,
        } => commands::path::run(&path, layout, to, json),

        Commands::Check => commands::check::run(&commands::config_path(config)?),

        Commands::Fetch { repo, path } => {
            let config = commands::config_path(config)?;
            runtime()?.block_on(commands::fetch::run(&config, &repo, &path))
        }

        Commands::Merge { repo, path } => {
            let config = commands::config_path(config)?;
            runtime()?.block_on(commands::fetch::merge(&config, &repo, &path))
        }

        Commands::Verify { file } => commands::verify::run(&file),
    }
}

fn runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| CliError::internal(format!("failed to start runtime: {}", e)))
}
