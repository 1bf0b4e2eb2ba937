//! Where board data comes from.
//!
//! [`BoardSource`] is the seam between the aggregators and the network.
//! [`TrelloClient`] implements it over the Trello REST API; tests use
//! in-memory fakes.

mod retry;
mod trello;

pub use retry::RetryPolicy;
pub use trello::TrelloClient;

use serde::{Deserialize, Serialize};

use crate::error::ErrorCode;
use crate::event::RawAction;

/// A board the credentials can see.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    pub id: String,
    pub name: String,
}

/// A list (column) on a board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bucket {
    pub id: String,
    pub name: String,
}

/// A card label.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub color: Option<String>,
}

/// A card as listed under a bucket.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawCard {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub id_short: Option<u64>,
    #[serde(default)]
    pub short_url: String,
    #[serde(default)]
    pub labels: Vec<Label>,
    #[serde(default)]
    pub closed: bool,
}

/// Errors talking to the board service.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("request to {url} failed: {message}")]
    Transport { url: String, message: String },

    #[error("request to {url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("unexpected response from {url}: {message}")]
    Decode { url: String, message: String },

    #[error("gave up after {attempts} attempts: {last}")]
    RetriesExhausted {
        attempts: u32,
        last: Box<SourceError>,
    },
}

impl SourceError {
    /// Whether retrying the same request could succeed.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        match self {
            Self::Transport { .. } => true,
            Self::Status { status, .. } => *status == 429 || *status >= 500,
            Self::Decode { .. } | Self::RetriesExhausted { .. } => false,
        }
    }

    #[must_use]
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Status {
                status: 401 | 403, ..
            } => ErrorCode::CredentialInvalid,
            Self::Transport { .. } | Self::Status { .. } => ErrorCode::UpstreamRequestFailed,
            Self::Decode { .. } => ErrorCode::UpstreamDecodeFailed,
            Self::RetriesExhausted { last, .. } => last.code(),
        }
    }
}

/// Read access to one board service account.
pub trait BoardSource {
    /// Boards visible to the account.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] if the request fails.
    fn list_boards(&self) -> Result<Vec<Board>, SourceError>;

    /// Lists of a board, in board order.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] if the request fails.
    fn list_buckets(&self, board_id: &str) -> Result<Vec<Bucket>, SourceError>;

    /// Open cards in a list.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] if the request fails.
    fn list_items(&self, bucket_id: &str) -> Result<Vec<RawCard>, SourceError>;

    /// Recent actions of each list, concatenated in list order.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] if any request fails.
    fn list_actions_for_buckets(&self, buckets: &[Bucket]) -> Result<Vec<RawAction>, SourceError>;

    /// Full action history of the given cards, fetched `batch_size` cards
    /// per request.
    ///
    /// A batch that still fails after retries is logged and skipped; the
    /// remaining batches keep their order.
    ///
    /// # Errors
    ///
    /// Implementations may fail on errors unrelated to a single batch.
    fn list_actions_for_items(
        &self,
        item_ids: &[String],
        batch_size: usize,
    ) -> Result<Vec<RawAction>, SourceError>;
}

/// Split `item_ids` into chunks of `batch_size` and fetch each with `fetch`.
///
/// Results are concatenated in chunk order. A failing chunk is logged at
/// `warn` and skipped. A zero `batch_size` is treated as one.
pub fn fetch_in_batches(
    item_ids: &[String],
    batch_size: usize,
    mut fetch: impl FnMut(&[String]) -> Result<Vec<RawAction>, SourceError>,
) -> Vec<RawAction> {
    let batch_size = batch_size.max(1);
    let total = item_ids.len().div_ceil(batch_size);
    let mut actions = Vec::new();
    let mut failed = 0_usize;
    for (index, chunk) in item_ids.chunks(batch_size).enumerate() {
        tracing::debug!(batch = index + 1, total, items = chunk.len(), "fetching item actions");
        match fetch(chunk) {
            Ok(batch) => actions.extend(batch),
            Err(err) => {
                failed += 1;
                tracing::warn!(
                    batch = index + 1,
                    total,
                    code = %err.code(),
                    "skipping batch: {err}"
                );
            }
        }
    }
    tracing::info!(batches = total, failed, actions = actions.len(), "completed item batches");
    actions
}

/// Board whose name contains `target`; the last match wins.
#[must_use]
pub fn find_board<'a>(boards: &'a [Board], target: &str) -> Option<&'a Board> {
    boards.iter().rev().find(|board| board.name.contains(target))
}

/// Bucket whose name equals `name` exactly.
#[must_use]
pub fn find_bucket<'a>(buckets: &'a [Bucket], name: &str) -> Option<&'a Bucket> {
    buckets.iter().find(|bucket| bucket.name == name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board(id: &str, name: &str) -> Board {
        Board {
            id: id.into(),
            name: name.into(),
        }
    }

    #[test]
    fn find_board_uses_substring_and_last_match() {
        let boards = vec![
            board("1", "Kano Roadmap"),
            board("2", "Personal"),
            board("3", "Roadmap 2019"),
        ];
        assert_eq!(find_board(&boards, "Roadmap").map(|b| b.id.as_str()), Some("3"));
        assert_eq!(find_board(&boards, "Pers").map(|b| b.id.as_str()), Some("2"));
        assert!(find_board(&boards, "roadmap").is_none());
        assert!(find_board(&[], "x").is_none());
    }

    #[test]
    fn find_bucket_is_exact() {
        let buckets = vec![
            Bucket {
                id: "a".into(),
                name: "Todo".into(),
            },
            Bucket {
                id: "b".into(),
                name: "Todo later".into(),
            },
        ];
        assert_eq!(find_bucket(&buckets, "Todo").map(|b| b.id.as_str()), Some("a"));
        assert!(find_bucket(&buckets, "Tod").is_none());
    }

    #[test]
    fn card_decodes_with_missing_fields() {
        let card: RawCard = serde_json::from_str(
            r#"{"id":"c1","name":"Fix","shortUrl":"https://trello.com/c/x","labels":[{"name":"bug","color":"red"}]}"#,
        )
        .expect("decode");
        assert_eq!(card.labels.len(), 1);
        assert_eq!(card.labels[0].color.as_deref(), Some("red"));
        assert!(!card.closed);
        assert_eq!(card.id_short, None);
    }

    fn action(id: &str) -> RawAction {
        RawAction {
            id: id.into(),
            ..RawAction::default()
        }
    }

    #[test]
    fn batches_are_ceil_of_ids_over_size() {
        let ids: Vec<String> = (0..23).map(|i| format!("c{i}")).collect();
        let mut sizes = Vec::new();
        let actions = fetch_in_batches(&ids, 10, |chunk| {
            sizes.push(chunk.len());
            Ok(chunk.iter().map(|id| action(id)).collect())
        });
        assert_eq!(sizes, [10, 10, 3]);
        assert_eq!(actions.len(), 23);
        assert_eq!(actions[0].id, "c0");
        assert_eq!(actions[22].id, "c22");
    }

    #[test]
    fn failing_batch_is_skipped_in_order() {
        let ids: Vec<String> = (0..6).map(|i| format!("c{i}")).collect();
        let mut call = 0;
        let actions = fetch_in_batches(&ids, 2, |chunk| {
            call += 1;
            if call == 2 {
                return Err(SourceError::Status {
                    url: "batch".into(),
                    status: 500,
                });
            }
            Ok(chunk.iter().map(|id| action(id)).collect())
        });
        let ids: Vec<&str> = actions.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, ["c0", "c1", "c4", "c5"]);
    }

    #[test]
    fn no_ids_means_no_requests() {
        let mut calls = 0;
        let actions = fetch_in_batches(&[], 10, |_| {
            calls += 1;
            Ok(Vec::new())
        });
        assert!(actions.is_empty());
        assert_eq!(calls, 0);
    }

    #[test]
    fn transient_classification() {
        let status = |status| SourceError::Status {
            url: "u".into(),
            status,
        };
        assert!(status(500).is_transient());
        assert!(status(429).is_transient());
        assert!(!status(404).is_transient());
        assert_eq!(status(401).code(), ErrorCode::CredentialInvalid);
        let exhausted = SourceError::RetriesExhausted {
            attempts: 3,
            last: Box::new(status(502)),
        };
        assert!(!exhausted.is_transient());
        assert_eq!(exhausted.code(), ErrorCode::UpstreamRequestFailed);
    }
}
