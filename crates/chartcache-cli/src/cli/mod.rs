//! CLI for the chartcache artifact cache.

mod commands;

use anyhow::Result;
use chartcache_core::config::{self, CacheConfig};
use chartcache_core::Cache;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use commands::{run_checksum, run_fetch, run_import, run_list, run_verify};

/// Top-level CLI for the chartcache artifact cache.
#[derive(Debug, Parser)]
#[command(name = "chartcache")]
#[command(about = "chartcache: checksum-verified local cache for chart archives", long_about = None)]
pub struct Cli {
    /// Cache directory (overrides `cache_dir` in config.toml).
    #[arg(long, global = true, value_name = "DIR")]
    pub cache_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Fetch a chart archive through the cache (download only on miss).
    Fetch {
        /// HTTP/HTTPS URL of the archive.
        url: String,
        /// Expected SHA-256 of the archive (lowercase hex).
        sha256: String,
        /// Copy the verified archive here instead of printing the cache path.
        #[arg(long, short)]
        output: Option<PathBuf>,
        /// Retry transient download failures up to N more times (overrides config).
        #[arg(long, value_name = "N")]
        retries: Option<u32>,
    },

    /// Add a local archive to the cache after verifying its checksum.
    Import {
        /// Path to the archive.
        path: PathBuf,
        /// Expected SHA-256 of the archive (lowercase hex).
        sha256: String,
    },

    /// List cached archives.
    List {
        /// Print JSON instead of a table.
        #[arg(long)]
        json: bool,
    },

    /// Re-hash every cached archive and report corrupt ones.
    Verify {
        /// Delete corrupt entries so the next fetch downloads them again.
        #[arg(long)]
        prune: bool,
    },

    /// Compute SHA-256 of a file.
    Checksum {
        /// Path to the file.
        path: PathBuf,
    },
}

impl Cli {
    /// Parse args, run the command and return the process exit code.
    pub fn run_from_args() -> Result<i32> {
        let cli = Cli::parse();
        let mut cfg = config::load_or_init()?;
        if let Some(dir) = cli.cache_dir {
            cfg.cache_dir = Some(dir);
        }
        tracing::debug!("loaded config: {:?}", cfg);

        match cli.command {
            CliCommand::Fetch {
                url,
                sha256,
                output,
                retries,
            } => {
                let cache = open_cache(&cfg)?;
                let policy = match retries {
                    Some(n) => chartcache_core::retry::RetryPolicy {
                        max_attempts: n.saturating_add(1),
                        ..cfg.retry.clone().unwrap_or_default().to_policy()
                    },
                    None => cfg
                        .retry
                        .as_ref()
                        .map(|r| r.to_policy())
                        .unwrap_or_else(chartcache_core::retry::RetryPolicy::never),
                };
                run_fetch(&cache, &url, &sha256, output.as_deref(), &policy)?;
            }
            CliCommand::Import { path, sha256 } => {
                let cache = open_cache(&cfg)?;
                run_import(&cache, &path, &sha256)?;
            }
            CliCommand::List { json } => run_list(&open_cache(&cfg)?, json)?,
            CliCommand::Verify { prune } => {
                let corrupt = run_verify(&open_cache(&cfg)?, prune)?;
                if corrupt > 0 {
                    return Ok(2);
                }
            }
            CliCommand::Checksum { path } => run_checksum(&path)?,
        }

        Ok(0)
    }
}

fn open_cache(cfg: &CacheConfig) -> Result<Cache> {
    let cache = Cache::from_config(cfg)?;
    tracing::debug!(
        dir = %cache.dir().display(),
        extension = cache.extension(),
        "opened cache"
    );
    Ok(cache)
}

#[cfg(test)]
mod tests;
