//! Sync configuration
//!
//! ## Configuration Sources (in precedence order)
//!
//! 1. CLI flags (applied by the caller on top of the loaded value)
//! 2. `--config <path>`, or `modsync.yaml` in the platform config directory
//! 3. Built-in defaults
//!
//! ## File format
//!
//! ```yaml
//! source:
//!   plugins_url: https://metamodule.info/plugins
//!   modules_url: https://metamodule.info/hx/plugins/open_list
//! library:
//!   token_url: https://api.vcvrack.com/token
//!   modules_url: https://api.vcvrack.com/modules
//! timeout_seconds: 30
//! aliases:
//!   - plugin: Bogaudio
//!     from: Bogaudio-PolyCon16
//!     to: Bogaudio-PolyCon
//! ```
//!
//! Credentials never live in the file.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

use crate::alias::{AliasResolver, AliasRule};
use crate::error::SyncError;

pub const DEFAULT_PLUGINS_URL: &str = "https://metamodule.info/plugins";
pub const DEFAULT_MODULE_LISTING_URL: &str = "https://metamodule.info/hx/plugins/open_list";
pub const DEFAULT_TOKEN_URL: &str = "https://api.vcvrack.com/token";
pub const DEFAULT_LIBRARY_MODULES_URL: &str = "https://api.vcvrack.com/modules";

/// Default per-request timeout (30 seconds)
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 30;

const MIN_TIMEOUT_SECONDS: u64 = 1;

/// File name looked up in the platform config directory
pub const CONFIG_FILE_NAME: &str = "modsync.yaml";

/// Where the MetaModule listing lives
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Page listing every plugin as `<li id=...>`
    pub plugins_url: String,

    /// Endpoint returning one plugin's module links (scoped by `HX-Target`)
    pub modules_url: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            plugins_url: DEFAULT_PLUGINS_URL.to_string(),
            modules_url: DEFAULT_MODULE_LISTING_URL.to_string(),
        }
    }
}

/// Where the VCV Rack Library API lives
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LibraryConfig {
    /// Credential exchange endpoint
    pub token_url: String,

    /// Library modules endpoint (GET to list, POST to add)
    pub modules_url: String,
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            token_url: DEFAULT_TOKEN_URL.to_string(),
            modules_url: DEFAULT_LIBRARY_MODULES_URL.to_string(),
        }
    }
}

/// Top-level sync configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    pub source: SourceConfig,

    pub library: LibraryConfig,

    /// Per-request timeout in seconds
    pub timeout_seconds: u64,

    /// Diff only - report what would be added without adding it
    pub dry_run: bool,

    /// Alias rules applied after the built-in ones
    pub aliases: Vec<AliasRule>,

    /// Restrict the sync to these source plugins (empty = all)
    pub plugins: Vec<String>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            source: SourceConfig::default(),
            library: LibraryConfig::default(),
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
            dry_run: false,
            aliases: Vec::new(),
            plugins: Vec::new(),
        }
    }
}

impl SyncConfig {
    /// Load configuration
    ///
    /// An explicit path must exist. Without one, the platform config
    /// file is used when present, otherwise the defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self, SyncError> {
        match explicit {
            Some(path) => Self::load_from_path(path),
            None => match Self::default_config_path() {
                Some(path) if path.exists() => Self::load_from_path(&path),
                _ => {
                    debug!("No config file found, using defaults");
                    Ok(Self::default())
                }
            },
        }
    }

    /// Load configuration from a specific YAML file
    pub fn load_from_path(path: &Path) -> Result<Self, SyncError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            SyncError::config(format!("failed to read {}: {e}", path.display()))
        })?;

        let config = Self::from_yaml(&content)
            .map_err(|e| SyncError::config(format!("{}: {}", path.display(), e.message())))?;

        debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Parse and validate configuration from a YAML string
    pub fn from_yaml(content: &str) -> Result<Self, SyncError> {
        let config: SyncConfig = serde_yaml_ng::from_str(content)
            .map_err(|e| SyncError::config(format!("failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// `<platform config dir>/modsync.yaml`
    pub fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("io", "modsync", "modsync")
            .map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
    }

    /// Check that every endpoint is an http(s) URL
    pub fn validate(&self) -> Result<(), SyncError> {
        let urls = [
            ("source.plugins_url", &self.source.plugins_url),
            ("source.modules_url", &self.source.modules_url),
            ("library.token_url", &self.library.token_url),
            ("library.modules_url", &self.library.modules_url),
        ];

        for (field, url) in urls {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(SyncError::config(format!(
                    "{field} must start with http:// or https:// (got '{url}')"
                )));
            }
        }

        Ok(())
    }

    /// Request timeout, clamped to a one second minimum
    pub fn timeout(&self) -> Duration {
        if self.timeout_seconds < MIN_TIMEOUT_SECONDS {
            warn!(
                "Configured timeout_seconds={} is too low; using minimum of {} seconds",
                self.timeout_seconds, MIN_TIMEOUT_SECONDS
            );
            return Duration::from_secs(MIN_TIMEOUT_SECONDS);
        }
        Duration::from_secs(self.timeout_seconds)
    }

    /// Built-in alias rules plus the configured ones
    pub fn alias_resolver(&self) -> Result<AliasResolver, SyncError> {
        AliasResolver::with_rules(self.aliases.iter().cloned())
    }
}

/// Library account credentials
#[derive(Clone)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}
