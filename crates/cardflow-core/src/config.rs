//! `cardflow.toml` loading and API credential resolution.
//!
//! Every section and field is optional; missing values fall back to the
//! defaults below. The first existing file wins, searched in order:
//!
//! 1. an explicit path (`--config`), which must exist;
//! 2. `./cardflow.toml`;
//! 3. `<config_dir>/cardflow/config.toml`.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::cache::WritePolicy;
use crate::error::ErrorCode;
use crate::source::RetryPolicy;

pub const LOCAL_CONFIG_FILE: &str = "cardflow.toml";
pub const KEY_ENV: &str = "TRELLO_KEY";
pub const TOKEN_ENV: &str = "TRELLO_TOKEN";
pub const KEY_LEN: usize = 32;
pub const TOKEN_LEN: usize = 64;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("config file {} does not exist", path.display())]
    NotFound { path: PathBuf },

    #[error("no Trello {what}: set {env} or create {}", file.display())]
    MissingCredential {
        what: &'static str,
        env: &'static str,
        file: PathBuf,
    },

    #[error("Trello {what} must be {expected} characters, got {actual}")]
    CredentialLength {
        what: &'static str,
        expected: usize,
        actual: usize,
    },
}

impl ConfigError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Read { .. } | Self::Parse { .. } | Self::NotFound { .. } => {
                ErrorCode::ConfigParseError
            }
            Self::MissingCredential { .. } => ErrorCode::CredentialMissing,
            Self::CredentialLength { .. } => ErrorCode::CredentialInvalid,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub chart: ChartConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_api_root")]
    pub root: String,
    #[serde(default = "default_key_file")]
    pub key_file: PathBuf,
    #[serde(default = "default_token_file")]
    pub token_file: PathBuf,
    /// Per-list cap on actions fetched for the time series.
    #[serde(default = "default_action_limit")]
    pub action_limit: u32,
    /// Item ids per `batch/` request.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            root: default_api_root(),
            key_file: default_key_file(),
            token_file: default_token_file(),
            action_limit: default_action_limit(),
            batch_size: default_batch_size(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
        }
    }
}

impl RetryConfig {
    #[must_use]
    pub const fn policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            initial_backoff: Duration::from_millis(self.initial_backoff_ms),
            max_backoff: Duration::from_millis(self.max_backoff_ms),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_cache_dir")]
    pub dir: PathBuf,
    #[serde(default)]
    pub overwrite: WritePolicy,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            dir: default_cache_dir(),
            overwrite: WritePolicy::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartConfig {
    /// Bucket names longer than this are truncated in snapshot items.
    #[serde(default = "default_max_bucket_name_len")]
    pub max_bucket_name_len: usize,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            max_bucket_name_len: default_max_bucket_name_len(),
        }
    }
}

fn default_api_root() -> String {
    "https://api.trello.com/1".to_string()
}

fn default_key_file() -> PathBuf {
    PathBuf::from(".ttrellokey")
}

fn default_token_file() -> PathBuf {
    PathBuf::from(".ttrellotoken")
}

const fn default_action_limit() -> u32 {
    1000
}

const fn default_batch_size() -> usize {
    10
}

const fn default_max_attempts() -> u32 {
    3
}

const fn default_initial_backoff_ms() -> u64 {
    250
}

const fn default_max_backoff_ms() -> u64 {
    4000
}

fn default_cache_dir() -> PathBuf {
    PathBuf::from(".")
}

const fn default_max_bucket_name_len() -> usize {
    13
}

impl Config {
    /// Parse one config file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Read`] or [`ConfigError::Parse`].
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Resolve configuration from the standard search locations.
    ///
    /// Returns the config and the file it came from, if any.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NotFound`] if `explicit` is given but missing,
    /// or a read/parse error for the file that was selected.
    pub fn resolve(explicit: Option<&Path>) -> Result<(Self, Option<PathBuf>), ConfigError> {
        Self::resolve_in(
            explicit,
            Path::new("."),
            dirs::config_dir().map(|dir| dir.join("cardflow")),
        )
    }

    /// [`Config::resolve`] with explicit search roots.
    ///
    /// # Errors
    ///
    /// Same as [`Config::resolve`].
    pub fn resolve_in(
        explicit: Option<&Path>,
        working_dir: &Path,
        user_dir: Option<PathBuf>,
    ) -> Result<(Self, Option<PathBuf>), ConfigError> {
        if let Some(path) = explicit {
            if !path.exists() {
                return Err(ConfigError::NotFound {
                    path: path.to_path_buf(),
                });
            }
            return Ok((Self::load_from(path)?, Some(path.to_path_buf())));
        }

        let candidates = std::iter::once(working_dir.join(LOCAL_CONFIG_FILE))
            .chain(user_dir.map(|dir| dir.join("config.toml")));
        for path in candidates {
            if path.exists() {
                tracing::debug!(path = %path.display(), "loading config");
                return Ok((Self::load_from(&path)?, Some(path)));
            }
        }
        Ok((Self::default(), None))
    }
}

/// Trello API key and token.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub key: String,
    pub token: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("key", &"<redacted>")
            .field("token", &"<redacted>")
            .finish()
    }
}

impl Credentials {
    /// Load credentials: `TRELLO_KEY`/`TRELLO_TOKEN` first, then the
    /// configured key and token files.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingCredential`] if neither source has a
    /// value and [`ConfigError::CredentialLength`] for a wrong length.
    pub fn load(api: &ApiConfig) -> Result<Self, ConfigError> {
        Self::from_sources(
            std::env::var(KEY_ENV).ok(),
            std::env::var(TOKEN_ENV).ok(),
            &api.key_file,
            &api.token_file,
        )
    }

    /// Resolve credentials from explicit env values and file paths.
    ///
    /// # Errors
    ///
    /// Same as [`Credentials::load`].
    pub fn from_sources(
        env_key: Option<String>,
        env_token: Option<String>,
        key_file: &Path,
        token_file: &Path,
    ) -> Result<Self, ConfigError> {
        let key = read_secret("key", KEY_ENV, env_key, key_file)?;
        let token = read_secret("token", TOKEN_ENV, env_token, token_file)?;
        Self::new(key, token)
    }

    /// Validate a key/token pair.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::CredentialLength`] if the key is not 32
    /// characters or the token is not 64.
    pub fn new(key: String, token: String) -> Result<Self, ConfigError> {
        check_len("key", &key, KEY_LEN)?;
        check_len("token", &token, TOKEN_LEN)?;
        Ok(Self { key, token })
    }
}

fn read_secret(
    what: &'static str,
    env: &'static str,
    from_env: Option<String>,
    file: &Path,
) -> Result<String, ConfigError> {
    if let Some(value) = from_env.map(|v| v.trim().to_string()).filter(|v| !v.is_empty()) {
        return Ok(value);
    }
    let missing = || ConfigError::MissingCredential {
        what,
        env,
        file: file.to_path_buf(),
    };
    if !file.exists() {
        return Err(missing());
    }
    let raw = std::fs::read_to_string(file).map_err(|source| ConfigError::Read {
        path: file.to_path_buf(),
        source,
    })?;
    let value = raw.trim().to_string();
    if value.is_empty() {
        return Err(missing());
    }
    Ok(value)
}

fn check_len(what: &'static str, value: &str, expected: usize) -> Result<(), ConfigError> {
    let actual = value.chars().count();
    if actual == expected {
        Ok(())
    } else {
        Err(ConfigError::CredentialLength {
            what,
            expected,
            actual,
        })
    }
}
