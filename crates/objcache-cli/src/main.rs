//! objcache - inspect and edit object caches from the shell
//!
//! Values are read and written as JSON.
//!
//! Subcommands:
//! - `objcache hash <identifier>` - Print the on-disk token for a name
//! - `objcache create-cache <name>` - Create a cache
//! - `objcache delete-cache <name>` - Delete a cache and its objects
//! - `objcache put <cache> <key> <json>` - Store a value
//! - `objcache get <cache> <key>` - Print a stored value
//! - `objcache rm <cache> <key>` - Delete a stored value
//! - `objcache path <cache> [key]` - Print where a cache or object lives
//! - `objcache config` - Print the effective configuration

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use objcache::ObjCacheConfig;

mod commands;

#[derive(Parser)]
#[command(name = "objcache")]
#[command(about = "Filesystem-backed object cache")]
#[command(version)]
struct Cli {
    /// TOML config file with an [objcache] section
    #[arg(long, global = true, env = "OBJCACHE_CONFIG")]
    config: Option<PathBuf>,

    /// Directory the client root lives in
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    /// Client name
    #[arg(long, global = true)]
    client: Option<String>,

    /// Write objects in place instead of through a temp file
    #[arg(long, global = true)]
    no_atomic: bool,

    /// More logging (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the hashed token for an identifier
    Hash {
        identifier: String,
    },

    /// Create a cache
    CreateCache {
        name: String,

        /// Replace an existing cache with an empty one
        #[arg(long, conflicts_with = "ignore_existing")]
        overwrite: bool,

        /// Succeed without changes if the cache exists
        #[arg(long)]
        ignore_existing: bool,
    },

    /// Delete a cache and everything in it
    DeleteCache {
        name: String,

        /// Succeed if the cache does not exist
        #[arg(long)]
        ignore_missing: bool,
    },

    /// Store a JSON value under a key
    Put {
        cache: String,
        key: String,

        /// JSON value, e.g. '{"a": 1}' or '"text"'
        json: String,

        /// Replace an existing value
        #[arg(long)]
        overwrite: bool,

        /// Create the cache if it does not exist
        #[arg(long)]
        create_cache: bool,
    },

    /// Print the JSON value stored under a key
    Get {
        cache: String,
        key: String,
    },

    /// Delete the value stored under a key
    Rm {
        cache: String,
        key: String,
    },

    /// Print the on-disk path of a cache, or of an object within it
    Path {
        cache: String,
        key: Option<String>,
    },

    /// Print the effective configuration as TOML
    Config,
}

impl Cli {
    /// Config file (or environment), then command-line overrides.
    fn effective_config(&self) -> Result<ObjCacheConfig> {
        let mut config = match &self.config {
            Some(path) => ObjCacheConfig::from_file(path)?,
            None => ObjCacheConfig::from_env()?,
        };

        if let Some(root) = &self.root {
            config.root_base = root.clone();
        }
        if let Some(client) = &self.client {
            config.client_name = client.clone();
        }
        if self.no_atomic {
            config.atomic_writes = false;
        }

        Ok(config)
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        _ => tracing::Level::DEBUG,
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .init();

    let config = cli
        .effective_config()
        .context("failed to load configuration")?;

    match cli.command {
        Commands::Hash { identifier } => commands::hash(&identifier),
        Commands::CreateCache {
            name,
            overwrite,
            ignore_existing,
        } => commands::create_cache(&config, &name, overwrite, ignore_existing)?,
        Commands::DeleteCache {
            name,
            ignore_missing,
        } => commands::delete_cache(&config, &name, ignore_missing)?,
        Commands::Put {
            cache,
            key,
            json,
            overwrite,
            create_cache,
        } => commands::put(&config, &cache, &key, &json, overwrite, create_cache)?,
        Commands::Get { cache, key } => commands::get(&config, &cache, &key)?,
        Commands::Rm { cache, key } => commands::rm(&config, &cache, &key)?,
        Commands::Path { cache, key } => commands::path(&config, &cache, key.as_deref())?,
        Commands::Config => commands::show_config(&config)?,
    }

    Ok(())
}
