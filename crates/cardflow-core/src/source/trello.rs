//! Trello REST API v1 client.

use std::cell::Cell;
use std::time::Duration;

use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::config::{ApiConfig, Credentials};
use crate::event::RawAction;
use crate::source::{
    Board, BoardSource, Bucket, RawCard, RetryPolicy, SourceError, fetch_in_batches,
};

const USER_AGENT: &str = concat!("cardflow/", env!("CARGO_PKG_VERSION"));

/// One entry of a `batch/` response, keyed by HTTP status.
#[derive(Debug, Deserialize)]
struct BatchEntry {
    #[serde(rename = "200", default)]
    ok: Option<Vec<RawAction>>,
}

/// Blocking Trello client. Every GET goes through the [`RetryPolicy`].
#[derive(Debug)]
pub struct TrelloClient {
    agent: ureq::Agent,
    root: String,
    credentials: Credentials,
    retry: RetryPolicy,
    action_limit: u32,
    requests: Cell<u64>,
}

impl TrelloClient {
    #[must_use]
    pub fn new(api: &ApiConfig, credentials: Credentials, retry: RetryPolicy) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_secs(30))
            .user_agent(USER_AGENT)
            .build();
        Self {
            agent,
            root: api.root.trim_end_matches('/').to_string(),
            credentials,
            retry,
            action_limit: api.action_limit,
            requests: Cell::new(0),
        }
    }

    /// HTTP requests issued so far, retries included.
    #[must_use]
    pub fn requests(&self) -> u64 {
        self.requests.get()
    }

    fn url(&self, command: &str) -> String {
        format!("{}/{}", self.root, command.trim_start_matches('/'))
    }

    fn get_json<T: DeserializeOwned>(
        &self,
        command: &str,
        params: &[(&str, &str)],
    ) -> Result<T, SourceError> {
        let url = self.url(command);
        self.retry.run(command, |attempt| {
            self.requests.set(self.requests.get() + 1);
            tracing::trace!(url = %url, attempt, "GET");

            let mut request = self
                .agent
                .get(&url)
                .set("Accept", "application/json")
                .query("key", &self.credentials.key)
                .query("token", &self.credentials.token);
            for (name, value) in params {
                request = request.query(name, value);
            }

            let response = request.call().map_err(|err| match err {
                ureq::Error::Status(status, _) => SourceError::Status {
                    url: url.clone(),
                    status,
                },
                ureq::Error::Transport(transport) => SourceError::Transport {
                    url: url.clone(),
                    message: transport.to_string(),
                },
            })?;

            response
                .into_json::<T>()
                .map_err(|err| SourceError::Decode {
                    url: url.clone(),
                    message: err.to_string(),
                })
        })
    }
}

/// The `urls` parameter of a `batch/` request for these cards.
fn batch_urls(item_ids: &[String]) -> String {
    item_ids
        .iter()
        .map(|id| format!("/cards/{id}/actions?filter=all"))
        .collect::<Vec<_>>()
        .join(",")
}

/// Successful sub-results of a batch, in request order.
fn flatten_batch(entries: Vec<BatchEntry>) -> Vec<RawAction> {
    entries
        .into_iter()
        .filter_map(|entry| entry.ok)
        .flatten()
        .collect()
}

impl BoardSource for TrelloClient {
    fn list_boards(&self) -> Result<Vec<Board>, SourceError> {
        self.get_json("members/me/boards", &[])
    }

    fn list_buckets(&self, board_id: &str) -> Result<Vec<Bucket>, SourceError> {
        self.get_json(&format!("boards/{board_id}/lists"), &[])
    }

    fn list_items(&self, bucket_id: &str) -> Result<Vec<RawCard>, SourceError> {
        self.get_json(&format!("lists/{bucket_id}/cards"), &[])
    }

    fn list_actions_for_buckets(&self, buckets: &[Bucket]) -> Result<Vec<RawAction>, SourceError> {
        let limit = self.action_limit.to_string();
        let mut actions = Vec::new();
        for bucket in buckets {
            let batch: Vec<RawAction> = self.get_json(
                &format!("lists/{}/actions", bucket.id),
                &[("limit", limit.as_str())],
            )?;
            tracing::debug!(list = %bucket.name, actions = batch.len(), "fetched list actions");
            actions.extend(batch);
        }
        Ok(actions)
    }

    fn list_actions_for_items(
        &self,
        item_ids: &[String],
        batch_size: usize,
    ) -> Result<Vec<RawAction>, SourceError> {
        Ok(fetch_in_batches(item_ids, batch_size, |chunk| {
            let urls = batch_urls(chunk);
            let entries: Vec<BatchEntry> = self.get_json("batch/", &[("urls", urls.as_str())])?;
            Ok(flatten_batch(entries))
        }))
    }
}
