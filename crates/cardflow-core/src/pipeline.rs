//! Collection flows: board name in, aggregator input out.
//!
//! These tie a [`BoardSource`] to the event model and the aggregators. They
//! never touch the cache; callers decide when to load or save.

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::error::ErrorCode;
use crate::event;
use crate::snapshot::ItemRecord;
use crate::source::{Board, BoardSource, Bucket, RawCard, SourceError, find_board, find_bucket};
use crate::timeseries::{CountMatrix, assemble};

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("no board matching '{target}'")]
    BoardNotFound { target: String },

    #[error("board '{board}' has no card activity with a destination list")]
    NoActivity { board: String },

    #[error(transparent)]
    Source(#[from] SourceError),
}

impl PipelineError {
    #[must_use]
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::BoardNotFound { .. } => ErrorCode::BoardNotFound,
            Self::NoActivity { .. } => ErrorCode::NoActivity,
            Self::Source(err) => err.code(),
        }
    }
}

/// Result of a full historical pull.
#[derive(Debug, Clone, Serialize)]
pub struct CountsRun {
    pub board: Board,
    /// Earliest event timestamp; the first day of `matrix`.
    pub watermark: NaiveDateTime,
    pub matrix: CountMatrix,
    /// Distinct items whose history was fetched.
    pub items: usize,
    /// Bucketed events the matrix was built from.
    pub events: usize,
}

/// Cards of one bucket, for the summary report.
#[derive(Debug, Clone, Serialize)]
pub struct BucketCards {
    pub bucket: Bucket,
    pub cards: Vec<RawCard>,
}

/// Find the board whose name contains `target` (last match wins).
///
/// # Errors
///
/// Returns [`PipelineError::BoardNotFound`] or a source error.
pub fn resolve_board(source: &impl BoardSource, target: &str) -> Result<Board, PipelineError> {
    let boards = source.list_boards()?;
    let board = find_board(&boards, target)
        .cloned()
        .ok_or_else(|| PipelineError::BoardNotFound {
            target: target.to_string(),
        })?;
    tracing::debug!(board = %board.name, id = %board.id, "resolved board");
    Ok(board)
}

/// Every open item on the board, tagged with its bucket name truncated to
/// `max_bucket_len` characters.
///
/// # Errors
///
/// Returns [`PipelineError`] if the board is missing or a request fails.
pub fn collect_items(
    source: &impl BoardSource,
    board: &str,
    max_bucket_len: usize,
) -> Result<Vec<ItemRecord>, PipelineError> {
    let board = resolve_board(source, board)?;
    let buckets = source.list_buckets(&board.id)?;

    let mut items = Vec::new();
    for bucket in &buckets {
        let label = truncate_name(&bucket.name, max_bucket_len);
        let cards = source.list_items(&bucket.id)?;
        tracing::debug!(list = %bucket.name, cards = cards.len(), "fetched cards");
        items.extend(cards.into_iter().map(|card| ItemRecord {
            bucket: label.clone(),
            name: card.name,
            id: card.id,
        }));
    }
    tracing::info!(board = %board.name, lists = buckets.len(), items = items.len(), "collected items");
    Ok(items)
}

/// Pull the full action history of every item seen on the board's lists
/// and assemble the daily count matrix from the earliest event to now.
///
/// # Errors
///
/// Returns [`PipelineError::NoActivity`] when no bucketed event survives,
/// [`PipelineError::BoardNotFound`], or a source error.
pub fn collect_counts(
    source: &impl BoardSource,
    board: &str,
    batch_size: usize,
) -> Result<CountsRun, PipelineError> {
    let board = resolve_board(source, board)?;
    let buckets = source.list_buckets(&board.id)?;

    let list_actions = source.list_actions_for_buckets(&buckets)?;
    let item_ids: Vec<String> = event::unique_item_ids(&list_actions).into_iter().collect();
    tracing::info!(
        lists = buckets.len(),
        actions = list_actions.len(),
        items = item_ids.len(),
        "found items with activity"
    );

    let item_actions = source.list_actions_for_items(&item_ids, batch_size)?;
    let events = event::flatten(&item_actions);
    let Some(watermark) = events.iter().map(|event| event.timestamp).min() else {
        return Err(PipelineError::NoActivity { board: board.name });
    };

    let matrix = assemble(&events, watermark, None);
    tracing::info!(
        board = %board.name,
        events = events.len(),
        %watermark,
        days = matrix.len(),
        "assembled time series"
    );
    Ok(CountsRun {
        board,
        watermark,
        matrix,
        items: item_ids.len(),
        events: events.len(),
    })
}

/// Cards of the named buckets, in the order given.
///
/// Names that match no bucket are logged and skipped.
///
/// # Errors
///
/// Returns [`PipelineError`] if the board is missing or a request fails.
pub fn collect_bucket_cards(
    source: &impl BoardSource,
    board: &str,
    names: &[String],
) -> Result<Vec<BucketCards>, PipelineError> {
    let board = resolve_board(source, board)?;
    let buckets = source.list_buckets(&board.id)?;

    let mut out = Vec::with_capacity(names.len());
    for name in names {
        let Some(bucket) = find_bucket(&buckets, name) else {
            tracing::warn!(
                code = %ErrorCode::BucketNotFound,
                board = %board.name,
                "no list named '{name}'"
            );
            continue;
        };
        let cards = source.list_items(&bucket.id)?;
        out.push(BucketCards {
            bucket: bucket.clone(),
            cards,
        });
    }
    Ok(out)
}

fn truncate_name(name: &str, max_len: usize) -> String {
    name.chars().take(max_len).collect()
}
