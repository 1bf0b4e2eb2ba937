//! Flatten raw actions into [`Event`] records and drop unbucketable ones.
//!
//! Defaulting rules, applied in order:
//!
//! 1. `destination` is `data.listAfter.name` when present.
//! 2. Otherwise `destination` falls back to `data.list.name` (creation and
//!    deletion actions carry the list there instead of `listAfter`).
//! 3. `closed` is `data.card.closed`, defaulting to `false` when the field
//!    is absent.
//!
//! Every other missing field becomes `None` (or an empty string for the
//! board and actor names). The timestamp is the only required field.

use crate::error::ErrorCode;
use crate::event::{Event, EventCategory, RawAction};
use crate::instant;

/// Errors raised while normalizing a single action.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NormalizeError {
    /// The action has no `date` field.
    #[error("action {action_id} has no timestamp")]
    MissingTimestamp { action_id: String },

    /// The `date` field is not a recognisable timestamp.
    #[error("action {action_id} has unparseable timestamp '{raw}'")]
    InvalidTimestamp { action_id: String, raw: String },
}

impl NormalizeError {
    /// Machine-readable code associated with this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        ErrorCode::InvalidTimestamp
    }
}

/// Normalize one raw action.
///
/// # Errors
///
/// Returns [`NormalizeError`] if the action's timestamp is missing or
/// cannot be parsed. Missing optional fields never fail.
pub fn normalize(raw: &RawAction) -> Result<Event, NormalizeError> {
    let Some(date) = raw.date.as_deref() else {
        return Err(NormalizeError::MissingTimestamp {
            action_id: raw.id.clone(),
        });
    };
    let timestamp = instant::parse(date).ok_or_else(|| NormalizeError::InvalidTimestamp {
        action_id: raw.id.clone(),
        raw: date.to_string(),
    })?;

    let data = &raw.data;
    // Empty names count as absent so `listAfter` can fall back to `list`.
    let list_name = |list: Option<&crate::event::NamedRef>| {
        list.and_then(|l| l.name.clone()).filter(|name| !name.is_empty())
    };

    let destination =
        list_name(data.list_after.as_ref()).or_else(|| list_name(data.list.as_ref()));
    let card = data.card.as_ref();

    Ok(Event {
        id: raw.id.clone(),
        board: list_name(data.board.as_ref()).unwrap_or_default(),
        destination,
        source: list_name(data.list_before.as_ref()),
        item_short_id: card.and_then(|c| c.id_short),
        item_name: card.and_then(|c| c.name.clone()),
        closed: card.and_then(|c| c.closed).unwrap_or(false),
        timestamp,
        category: EventCategory::from(raw.kind.as_deref().unwrap_or_default()),
        actor: raw
            .member_creator
            .as_ref()
            .and_then(|m| m.full_name.clone())
            .unwrap_or_default(),
    })
}

/// Keep only events that resolve to a destination bucket, in order.
#[must_use]
pub fn retain_bucketed(events: Vec<Event>) -> Vec<Event> {
    events
        .into_iter()
        .filter(|event| event.destination.is_some())
        .collect()
}

/// Normalize a batch of raw actions and drop the unbucketable ones.
///
/// Actions with a bad timestamp are logged and skipped.
#[must_use]
pub fn flatten(raw: &[RawAction]) -> Vec<Event> {
    let mut skipped = 0_usize;
    let events: Vec<Event> = raw
        .iter()
        .filter_map(|action| match normalize(action) {
            Ok(event) => Some(event),
            Err(err) => {
                skipped += 1;
                tracing::warn!(code = %err.code(), "skipping action: {err}");
                None
            }
        })
        .collect();

    let normalized = events.len();
    let bucketed = retain_bucketed(events);
    tracing::debug!(
        total = raw.len(),
        skipped,
        unbucketed = normalized - bucketed.len(),
        kept = bucketed.len(),
        "flattened actions"
    );
    bucketed
}
