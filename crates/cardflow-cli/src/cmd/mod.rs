//! Subcommand implementations.
//!
//! Every command receives a [`Context`]: the resolved configuration plus
//! the output mode. Credentials and the HTTP client are built on demand so
//! cache-only runs never need them.

pub mod boards;
pub mod lists;
pub mod static_cmd;
pub mod summary;
pub mod timed;

use std::path::Path;

use anyhow::Context as _;
use cardflow_core::cache::{CacheStore, WritePolicy};
use cardflow_core::config::{Config, Credentials};
use cardflow_core::source::TrelloClient;
use chrono::NaiveDate;

use crate::output::OutputMode;

pub struct Context {
    pub config: Config,
    pub output: OutputMode,
}

impl Context {
    /// Resolve configuration from `--config` or the standard locations.
    pub fn load(explicit: Option<&Path>, output: OutputMode) -> anyhow::Result<Self> {
        let (config, config_path) =
            Config::resolve(explicit).context("failed to load configuration")?;
        if let Some(path) = &config_path {
            tracing::debug!(path = %path.display(), "using config file");
        }
        Ok(Self { config, output })
    }

    /// Authenticated board service client.
    pub fn client(&self) -> anyhow::Result<TrelloClient> {
        let credentials =
            Credentials::load(&self.config.api).context("failed to load Trello credentials")?;
        Ok(TrelloClient::new(
            &self.config.api,
            credentials,
            self.config.retry.policy(),
        ))
    }

    pub fn cache(&self) -> CacheStore {
        CacheStore::new(&self.config.cache.dir)
    }

    /// Configured write policy, upgraded to always-write by `--force`.
    pub const fn policy(&self, force: bool) -> WritePolicy {
        self.config.cache.overwrite.forced(force)
    }

    /// Policy for a refresh that replaces `artifact`. A file that exists
    /// but could not be used (no rows, or no paired watermark) is always
    /// replaced.
    pub fn refresh_policy(&self, force: bool, artifact: &Path) -> WritePolicy {
        if artifact.exists() {
            WritePolicy::Always
        } else {
            self.policy(force)
        }
    }
}

/// Today's date in UTC, used in chart titles and default file names.
pub fn today() -> NaiveDate {
    cardflow_core::instant::now().date()
}

/// Split comma-separated values, trimming blanks. Accepts repeated flags
/// as well as `a,b,c`.
pub fn split_list(values: &[String]) -> Vec<String> {
    values
        .iter()
        .flat_map(|value| value.split(','))
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .collect()
}
