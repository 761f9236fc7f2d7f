use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::retry::RetryPolicy;
use crate::transport::TransportOptions;

/// Retry policy parameters (optional section in config.toml). Applied by callers, never by the cache.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of attempts per fetch (including the first).
    pub max_attempts: u32,
    /// Base delay in seconds for exponential backoff (e.g. 0.25 = 250ms).
    pub base_delay_secs: f64,
    /// Maximum backoff delay in seconds.
    pub max_delay_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_secs: 0.5,
            max_delay_secs: 30,
        }
    }
}

impl RetryConfig {
    pub fn to_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts.max(1),
            base_delay: Duration::from_secs_f64(self.base_delay_secs.max(0.0)),
            max_delay: Duration::from_secs(self.max_delay_secs),
        }
    }
}

/// HTTP settings for cache misses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransportConfig {
    pub connect_timeout_secs: u64,
    /// Hard limit for one download, headers to last byte.
    pub timeout_secs: u64,
    /// Abort when below this many bytes/sec for `low_speed_time_secs`.
    pub low_speed_limit_bytes: u32,
    pub low_speed_time_secs: u64,
    #[serde(default)]
    pub user_agent: Option<String>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: 30,
            timeout_secs: 600,
            low_speed_limit_bytes: 1024,
            low_speed_time_secs: 60,
            user_agent: None,
        }
    }
}

impl TransportConfig {
    pub fn to_options(&self) -> TransportOptions {
        TransportOptions {
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            timeout: Duration::from_secs(self.timeout_secs),
            low_speed_limit: self.low_speed_limit_bytes,
            low_speed_time: Duration::from_secs(self.low_speed_time_secs),
            user_agent: self.user_agent.clone(),
            ..TransportOptions::default()
        }
    }
}

/// Global configuration loaded from `~/.config/chartcache/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Cache directory; defaults to `~/.cache/chartcache/charts`.
    #[serde(default)]
    pub cache_dir: Option<PathBuf>,
    /// Entry file extension (entries are named `<sha256>.<extension>`).
    #[serde(default = "default_extension")]
    pub extension: String,
    #[serde(default)]
    pub transport: TransportConfig,
    /// Optional retry policy for callers; if missing, no retries.
    #[serde(default)]
    pub retry: Option<RetryConfig>,
}

fn default_extension() -> String {
    "tgz".to_string()
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            cache_dir: None,
            extension: default_extension(),
            transport: TransportConfig::default(),
            retry: None,
        }
    }
}

impl CacheConfig {
    /// Configured cache directory, or the XDG cache default.
    pub fn resolved_cache_dir(&self) -> Result<PathBuf> {
        match &self.cache_dir {
            Some(dir) => Ok(dir.clone()),
            None => default_cache_dir(),
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("chartcache")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// `$XDG_CACHE_HOME/chartcache/charts`.
pub fn default_cache_dir() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("chartcache")?;
    Ok(xdg_dirs.get_cache_home().join("charts"))
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<CacheConfig> {
    load_or_init_at(&config_path()?)
}

/// Like `load_or_init` for an explicit path.
pub fn load_or_init_at(path: &Path) -> Result<CacheConfig> {
    if !path.exists() {
        let default_cfg = CacheConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(path)?;
    let cfg: CacheConfig = toml::from_str(&data)?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_values() {
        let cfg = CacheConfig::default();
        assert!(cfg.cache_dir.is_none());
        assert_eq!(cfg.extension, "tgz");
        assert_eq!(cfg.transport.connect_timeout_secs, 30);
        assert_eq!(cfg.transport.timeout_secs, 600);
        assert!(cfg.retry.is_none());
    }

    #[test]
    fn config_toml_roundtrip() {
        let cfg = CacheConfig::default();
        let toml = toml::to_string_pretty(&cfg).unwrap();
        let parsed: CacheConfig = toml::from_str(&toml).unwrap();
        assert_eq!(parsed.extension, cfg.extension);
        assert_eq!(parsed.transport.timeout_secs, cfg.transport.timeout_secs);
        assert_eq!(
            parsed.transport.low_speed_limit_bytes,
            cfg.transport.low_speed_limit_bytes
        );
    }

    #[test]
    fn empty_file_uses_defaults() {
        let cfg: CacheConfig = toml::from_str("").unwrap();
        assert_eq!(cfg.extension, "tgz");
        assert_eq!(cfg.transport.low_speed_time_secs, 60);
    }

    #[test]
    fn config_toml_custom_values() {
        let toml = r#"
            cache_dir = "/var/cache/charts"
            extension = "tar.gz"

            [transport]
            connect_timeout_secs = 5
            timeout_secs = 120
            low_speed_limit_bytes = 512
            low_speed_time_secs = 10
            user_agent = "chartcache/0.1"

            [retry]
            max_attempts = 4
            base_delay_secs = 0.25
            max_delay_secs = 8
        "#;
        let cfg: CacheConfig = toml::from_str(toml).unwrap();
        assert_eq!(cfg.cache_dir.as_deref(), Some(Path::new("/var/cache/charts")));
        assert_eq!(cfg.resolved_cache_dir().unwrap(), PathBuf::from("/var/cache/charts"));
        assert_eq!(cfg.extension, "tar.gz");

        let opts = cfg.transport.to_options();
        assert_eq!(opts.connect_timeout, Duration::from_secs(5));
        assert_eq!(opts.timeout, Duration::from_secs(120));
        assert_eq!(opts.low_speed_limit, 512);
        assert_eq!(opts.user_agent.as_deref(), Some("chartcache/0.1"));

        let policy = cfg.retry.as_ref().unwrap().to_policy();
        assert_eq!(policy.max_attempts, 4);
        assert_eq!(policy.base_delay, Duration::from_millis(250));
        assert_eq!(policy.max_delay, Duration::from_secs(8));
        let waits: Vec<_> = (1..=7).map(|n| policy.backoff(n)).collect();
        assert_eq!(
            waits,
            [250, 500, 1_000, 2_000, 4_000, 8_000, 8_000].map(Duration::from_millis)
        );
    }

    #[test]
    fn zero_attempts_in_config_still_fetches_once() {
        let cfg = RetryConfig {
            max_attempts: 0,
            base_delay_secs: -1.0,
            max_delay_secs: 1,
        };
        let policy = cfg.to_policy();
        assert_eq!(policy.max_attempts, 1);
        assert_eq!(policy.backoff(1), Duration::ZERO);
    }

    #[test]
    fn load_or_init_writes_default_then_reads_it() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let first = load_or_init_at(&path).unwrap();
        assert!(path.exists());
        std::fs::write(&path, "extension = \"tar\"\n").unwrap();
        let second = load_or_init_at(&path).unwrap();
        assert_eq!(first.extension, "tgz");
        assert_eq!(second.extension, "tar");
    }
}
