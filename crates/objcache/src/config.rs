//! Client configuration with environment variable and file-based loading.
//!
//! Environment variables:
//! - `OBJCACHE_ROOT`: Directory that client roots are created under
//! - `OBJCACHE_CLIENT`: Client name (a directory under the root)
//! - `OBJCACHE_ATOMIC_WRITES`: "false" or "0" to write objects in place
//!
//! Default root: the platform cache directory, e.g. `~/.cache/objcache`

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

pub const DEFAULT_CLIENT_NAME: &str = "ObjCache";

/// Configuration for a [`Client`](crate::Client).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ObjCacheConfig {
    /// Directory the client root lives in.
    #[serde(default = "default_root_base")]
    pub root_base: PathBuf,

    /// Client name, used verbatim as the root directory name.
    #[serde(default = "default_client_name")]
    pub client_name: String,

    /// Write objects to a temp file and rename into place.
    /// Set to false for the plain truncate-and-write behaviour.
    #[serde(default = "default_true")]
    pub atomic_writes: bool,
}

fn default_true() -> bool {
    true
}

fn default_client_name() -> String {
    DEFAULT_CLIENT_NAME.to_string()
}

/// Get the default root base (`<cache dir>/objcache`).
fn default_root_base() -> PathBuf {
    directories::BaseDirs::new()
        .map(|dirs| dirs.cache_dir().join("objcache"))
        .unwrap_or_else(|| PathBuf::from(".objcache"))
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}

impl Default for ObjCacheConfig {
    fn default() -> Self {
        Self {
            root_base: default_root_base(),
            client_name: default_client_name(),
            atomic_writes: true,
        }
    }
}

impl ObjCacheConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(root) = env::var("OBJCACHE_ROOT") {
            config.root_base = PathBuf::from(root);
        }
        if let Ok(name) = env::var("OBJCACHE_CLIENT") {
            config.client_name = name;
        }
        if let Ok(value) = env::var("OBJCACHE_ATOMIC_WRITES") {
            config.atomic_writes = parse_bool(&value)
                .with_context(|| format!("invalid OBJCACHE_ATOMIC_WRITES value: {value}"))?;
        }

        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to environment.
    ///
    /// The file should contain an `[objcache]` section:
    /// ```toml
    /// [objcache]
    /// root_base = "/var/cache/myapp"
    /// client_name = "PyCache"
    /// atomic_writes = true
    /// ```
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;

        let table: toml::Table = contents
            .parse()
            .with_context(|| format!("failed to parse TOML: {}", path.display()))?;

        if let Some(section) = table.get("objcache") {
            let config: ObjCacheConfig = section
                .clone()
                .try_into()
                .context("failed to parse [objcache] section")?;
            Ok(config)
        } else {
            Self::from_env()
        }
    }

    /// Create a config rooted at a specific directory.
    pub fn with_root_base(path: impl Into<PathBuf>) -> Self {
        Self {
            root_base: path.into(),
            ..Self::default()
        }
    }

    /// Replace the client name.
    pub fn client_name(mut self, name: impl Into<String>) -> Self {
        self.client_name = name.into();
        self
    }

    /// Directory the client will own: `root_base / client_name`.
    pub fn client_root(&self) -> PathBuf {
        self.root_base.join(&self.client_name)
    }

    /// Render as a TOML document with an `[objcache]` section.
    pub fn to_toml(&self) -> Result<String> {
        let mut table = toml::Table::new();
        table.insert(
            "objcache".to_string(),
            toml::Value::try_from(self).context("failed to serialize config")?,
        );
        toml::to_string(&table).context("failed to render config")
    }
}
