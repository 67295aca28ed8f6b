use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::cache::{SqliteStorage, DEFAULT_MAX_BYTES};

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
  pub pokeapi: PokeApiConfig,
  /// Public base URL of this service, used to build image references
  pub public_url: String,
  pub cache: CacheConfig,
  pub refresh: RefreshConfig,
  pub log: LogConfig,
  /// Problems found while loading, reported once logging is up
  #[serde(skip)]
  pub warnings: Vec<String>,
}

impl Default for Config {
  fn default() -> Self {
    Self {
      pokeapi: PokeApiConfig::default(),
      public_url: "http://localhost:3000".to_string(),
      cache: CacheConfig::default(),
      refresh: RefreshConfig::default(),
      log: LogConfig::default(),
      warnings: Vec::new(),
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PokeApiConfig {
  pub base_url: String,
  /// Per-request timeout; expiry surfaces as an upstream failure
  pub timeout_secs: u64,
}

impl Default for PokeApiConfig {
  fn default() -> Self {
    Self {
      base_url: "https://pokeapi.co/api/v2".to_string(),
      timeout_secs: 30,
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
  pub memory_ttl_secs: u64,
  /// Memory budget of the process-local tier, keys and values included
  pub memory_max_bytes: u64,
  /// SQLite file for the shared tier. Unset disables the shared tier
  /// and with it the bulk refresh job.
  pub shared_path: Option<PathBuf>,
  /// Expiry for shared entries; unset means they never expire
  pub shared_ttl_secs: Option<u64>,
}

impl Default for CacheConfig {
  fn default() -> Self {
    Self {
      memory_ttl_secs: 60 * 60 * 5,
      memory_max_bytes: DEFAULT_MAX_BYTES,
      shared_path: None,
      shared_ttl_secs: None,
    }
  }
}

impl CacheConfig {
  pub fn memory_ttl(&self) -> Duration {
    Duration::from_secs(self.memory_ttl_secs)
  }

  pub fn shared_ttl(&self) -> Option<Duration> {
    self.shared_ttl_secs.map(Duration::from_secs)
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RefreshConfig {
  pub batch_size: usize,
  pub interval_secs: u64,
}

impl Default for RefreshConfig {
  fn default() -> Self {
    Self {
      batch_size: 10,
      interval_secs: 60 * 60 * 4,
    }
  }
}

impl RefreshConfig {
  pub fn interval(&self) -> Duration {
    Duration::from_secs(self.interval_secs)
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LogConfig {
  /// fatal, error, warn, log, debug, verbose (or a tracing level name)
  pub level: String,
  /// Optional file to write logs to, in addition to stderr
  pub file: Option<PathBuf>,
}

impl Default for LogConfig {
  fn default() -> Self {
    Self {
      level: "log".to_string(),
      file: None,
    }
  }
}

impl Config {
  /// Load configuration from file, then apply environment overrides.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./pokecache.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/pokecache/config.yaml
  ///
  /// Without any file the defaults are used.
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    let mut config = match path {
      Some(p) => Self::load_from_path(&p)?,
      None => Self::default(),
    };

    config.apply_env(|key| std::env::var(key).ok());
    config.validate()?;
    Ok(config)
  }

  fn find_config_file() -> Option<PathBuf> {
    // Check current directory
    let local = PathBuf::from("pokecache.yaml");
    if local.exists() {
      return Some(local);
    }

    // Check XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("pokecache").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    Self::from_yaml(&contents)
      .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))
  }

  fn from_yaml(contents: &str) -> Result<Self, serde_yaml::Error> {
    serde_yaml::from_str(contents)
  }

  /// Apply environment overrides through `lookup`.
  ///
  /// Recognised: POKEAPI_BASE_URL, API_URL, CACHE_DB_PATH,
  /// POKEMON_CACHING_BATCH_SIZE, LOG_LEVEL. Ignored values are recorded in `warnings`.
  pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
    let lookup = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(url) = lookup("POKEAPI_BASE_URL") {
      self.pokeapi.base_url = url;
    }
    if let Some(url) = lookup("API_URL") {
      self.public_url = url;
    }
    if let Some(path) = lookup("CACHE_DB_PATH") {
      self.cache.shared_path = Some(PathBuf::from(path));
    }
    if let Some(size) = lookup("POKEMON_CACHING_BATCH_SIZE") {
      match size.trim().parse::<usize>() {
        Ok(size) if size > 0 => self.refresh.batch_size = size,
        _ => self
          .warnings
          .push(format!("Ignoring invalid POKEMON_CACHING_BATCH_SIZE {:?}", size)),
      }
    }
    if let Some(level) = lookup("LOG_LEVEL") {
      self.log.level = level;
    }
  }

  /// Enable the shared tier at the default data path unless a path is already set.
  pub fn enable_default_shared_cache(&mut self) -> Result<()> {
    if self.cache.shared_path.is_none() {
      self.cache.shared_path = Some(SqliteStorage::default_path()?);
    }
    Ok(())
  }

  pub fn validate(&self) -> Result<()> {
    let url = url::Url::parse(&self.pokeapi.base_url)
      .map_err(|e| eyre!("Invalid pokeapi.base_url {}: {}", self.pokeapi.base_url, e))?;
    if url.cannot_be_a_base() {
      return Err(eyre!(
        "pokeapi.base_url {} cannot be used as a base URL",
        self.pokeapi.base_url
      ));
    }
    if self.refresh.batch_size == 0 {
      return Err(eyre!("refresh.batch_size must be at least 1"));
    }
    if self.refresh.interval_secs == 0 {
      return Err(eyre!("refresh.interval_secs must be at least 1"));
    }
    Ok(())
  }
}
