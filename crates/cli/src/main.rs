//! swcache entry point.
//!
//! Registers the offline cache worker against a live origin and serves
//! requests through it. Logging goes to stderr so response bodies can be
//! piped from stdout.

use anyhow::Result;
use clap::{Parser, Subcommand};
use swcache_core::AppConfig;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser, Debug)]
#[command(name = "swcache")]
#[command(about = "Offline shell cache for a static site")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Install and activate the configured cache version
    Register,

    /// Serve a request through the active worker
    Fetch {
        /// Path on the origin (e.g. /rooms/) or an absolute URL
        path: String,

        /// Treat the request as a page navigation
        #[arg(long)]
        navigate: bool,

        #[arg(long, default_value = "GET")]
        method: String,

        /// Simulate a network that is unreachable
        #[arg(long)]
        offline: bool,
    },

    /// List cache stores
    Caches,

    /// List the URLs held by a store
    Entries {
        /// Store name (default: the configured cache version)
        #[arg(long)]
        store: Option<String>,
    },

    /// Print the effective configuration as JSON
    Config,

    /// Forget the active worker for the configured origin
    Unregister {
        /// Also delete every cache store
        #[arg(long)]
        purge: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let args = Args::parse();
    let config = AppConfig::load()?;
    tracing::debug!(origin = %config.origin, version = %config.cache_version, "configuration loaded");

    match args.command {
        Command::Register => commands::register(&config).await,
        Command::Fetch { path, navigate, method, offline } => {
            commands::fetch(&config, &path, navigate, &method, offline).await
        }
        Command::Caches => commands::caches(&config).await,
        Command::Entries { store } => commands::entries(&config, store.as_deref()).await,
        Command::Config => commands::print_config(&config),
        Command::Unregister { purge } => commands::unregister(&config, purge).await,
    }
}
