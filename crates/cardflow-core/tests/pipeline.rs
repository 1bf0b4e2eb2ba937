//! Collection flows against an in-memory board source.
//!
//! Covers: board resolution, item tagging and truncation, the full
//! counts pull (watermark, matrix shape, batching), summary bucket lookup,
//! and error mapping.

use std::cell::RefCell;
use std::collections::HashMap;

use cardflow_core::error::ErrorCode;
use cardflow_core::event::RawAction;
use cardflow_core::pipeline::{
    PipelineError, collect_bucket_cards, collect_counts, collect_items, resolve_board,
};
use cardflow_core::source::{
    Board, BoardSource, Bucket, RawCard, SourceError, fetch_in_batches,
};
use chrono::{Duration, NaiveDate};
use serde_json::json;

// ===========================================================================
// Fake source
// ===========================================================================

#[derive(Default)]
struct FakeBoard {
    boards: Vec<Board>,
    buckets: HashMap<String, Vec<Bucket>>,
    cards: HashMap<String, Vec<RawCard>>,
    list_actions: HashMap<String, Vec<RawAction>>,
    card_actions: HashMap<String, Vec<RawAction>>,
    failing_batches: Vec<usize>,
    batch_calls: RefCell<Vec<Vec<String>>>,
}

impl BoardSource for FakeBoard {
    fn list_boards(&self) -> Result<Vec<Board>, SourceError> {
        Ok(self.boards.clone())
    }

    fn list_buckets(&self, board_id: &str) -> Result<Vec<Bucket>, SourceError> {
        Ok(self.buckets.get(board_id).cloned().unwrap_or_default())
    }

    fn list_items(&self, bucket_id: &str) -> Result<Vec<RawCard>, SourceError> {
        Ok(self.cards.get(bucket_id).cloned().unwrap_or_default())
    }

    fn list_actions_for_buckets(&self, buckets: &[Bucket]) -> Result<Vec<RawAction>, SourceError> {
        Ok(buckets
            .iter()
            .flat_map(|b| self.list_actions.get(&b.id).cloned().unwrap_or_default())
            .collect())
    }

    fn list_actions_for_items(
        &self,
        item_ids: &[String],
        batch_size: usize,
    ) -> Result<Vec<RawAction>, SourceError> {
        Ok(fetch_in_batches(item_ids, batch_size, |chunk| {
            let mut calls = self.batch_calls.borrow_mut();
            calls.push(chunk.to_vec());
            if self.failing_batches.contains(&calls.len()) {
                return Err(SourceError::Status {
                    url: "batch/".into(),
                    status: 502,
                });
            }
            Ok(chunk
                .iter()
                .flat_map(|id| self.card_actions.get(id).cloned().unwrap_or_default())
                .collect())
        }))
    }
}

fn board(id: &str, name: &str) -> Board {
    Board {
        id: id.into(),
        name: name.into(),
    }
}

fn bucket(id: &str, name: &str) -> Bucket {
    Bucket {
        id: id.into(),
        name: name.into(),
    }
}

fn card(id: &str, name: &str) -> RawCard {
    RawCard {
        id: id.into(),
        name: name.into(),
        ..RawCard::default()
    }
}

/// A card action `days` after 2019-01-01 09:00 UTC.
fn action(id: &str, kind: &str, card: (&str, u64), list: &str, days: i64) -> RawAction {
    let date = NaiveDate::from_ymd_opt(2019, 1, 1)
        .and_then(|d| d.and_hms_opt(9, 0, 0))
        .expect("valid")
        + Duration::days(days);
    serde_json::from_value(json!({
        "id": id,
        "type": kind,
        "date": date.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string(),
        "data": {
            "board": {"name": "Roadmap"},
            "listAfter": {"name": list},
            "card": {"id": card.0, "idShort": card.1, "name": format!("card {}", card.1)}
        },
        "memberCreator": {"fullName": "Ada"}
    }))
    .expect("valid action json")
}

fn roadmap() -> FakeBoard {
    let mut fake = FakeBoard {
        boards: vec![board("b0", "Old Roadmap"), board("b1", "Team Roadmap 2019")],
        ..FakeBoard::default()
    };
    fake.buckets.insert(
        "b1".into(),
        vec![bucket("l1", "Todo"), bucket("l2", "In Development Now")],
    );
    fake.cards
        .insert("l1".into(), vec![card("c1", "Write docs"), card("c2", "Ship it")]);
    fake.cards.insert("l2".into(), vec![card("c3", "Fix parser")]);

    fake.list_actions.insert(
        "l1".into(),
        vec![action("x1", "createCard", ("c1", 1), "Todo", 0)],
    );
    fake.list_actions.insert(
        "l2".into(),
        vec![action("x2", "updateCard", ("c2", 2), "In Development Now", 2)],
    );

    // Newest first, as the service returns them.
    fake.card_actions.insert(
        "c1".into(),
        vec![action("a1", "createCard", ("c1", 1), "Todo", 0)],
    );
    fake.card_actions.insert(
        "c2".into(),
        vec![
            action("a3", "updateCard", ("c2", 2), "In Development Now", 2),
            action("a2", "createCard", ("c2", 2), "Todo", 1),
        ],
    );
    fake
}

// ===========================================================================
// Items
// ===========================================================================

#[test]
fn resolve_board_prefers_last_substring_match() {
    let fake = roadmap();
    let found = resolve_board(&fake, "Roadmap").expect("board");
    assert_eq!(found.id, "b1");
}

#[test]
fn missing_board_is_reported() {
    let err = collect_items(&roadmap(), "Nope", 13).expect_err("no board");
    assert!(matches!(err, PipelineError::BoardNotFound { .. }));
    assert_eq!(err.code(), ErrorCode::BoardNotFound);
}

#[test]
fn items_carry_truncated_bucket_names() {
    let items = collect_items(&roadmap(), "2019", 13).expect("items");
    let tagged: Vec<(&str, &str)> = items
        .iter()
        .map(|i| (i.bucket.as_str(), i.name.as_str()))
        .collect();
    assert_eq!(
        tagged,
        [
            ("Todo", "Write docs"),
            ("Todo", "Ship it"),
            ("In Developmen", "Fix parser"),
        ]
    );
    assert_eq!(items[2].id, "c3");
}

// ===========================================================================
// Counts
// ===========================================================================

#[test]
fn counts_start_at_earliest_event() {
    let run = collect_counts(&roadmap(), "Roadmap", 10).expect("counts");
    assert_eq!(run.board.id, "b1");
    assert_eq!(run.items, 2);
    assert_eq!(run.events, 3);
    assert_eq!(run.watermark.to_string(), "2019-01-01 09:00:00");
    assert_eq!(run.matrix.first_date(), Some(run.watermark));
    // From 2019 to today: far more than three days.
    assert!(run.matrix.len() > 3);

    // Day 0: only c1 exists.
    assert_eq!(run.matrix.count(0, "Todo"), 1);
    // Day 1: c2 created in Todo.
    assert_eq!(run.matrix.count(1, "Todo"), 2);
    // Day 2: c2 moved on.
    assert_eq!(run.matrix.count(2, "Todo"), 1);
    assert_eq!(run.matrix.count(2, "In Development Now"), 1);
}

#[test]
fn item_actions_are_batched() {
    let mut fake = roadmap();
    for i in 3..=25 {
        let id = format!("c{i}");
        fake.list_actions
            .get_mut("l1")
            .expect("bucket")
            .push(action(&format!("x{i}"), "createCard", (&id, i), "Todo", 0));
    }
    let run = collect_counts(&fake, "Roadmap", 10).expect("counts");
    let calls = fake.batch_calls.borrow();
    assert_eq!(calls.len(), 3);
    assert_eq!(calls.iter().map(Vec::len).sum::<usize>(), 25);
    assert_eq!(run.items, 25);
}

#[test]
fn failed_batch_is_skipped() {
    let mut fake = roadmap();
    fake.failing_batches = vec![1];
    // Batch size 1: c1 fails, c2 still contributes.
    let run = collect_counts(&fake, "Roadmap", 1).expect("counts");
    assert_eq!(fake.batch_calls.borrow().len(), 2);
    assert_eq!(run.events, 2);
    assert_eq!(run.matrix.count(0, "Todo"), 1);
}

#[test]
fn no_activity_is_an_error() {
    let mut fake = roadmap();
    fake.list_actions.clear();
    let err = collect_counts(&fake, "Roadmap", 10).expect_err("no activity");
    assert!(matches!(err, PipelineError::NoActivity { .. }));
    assert_eq!(err.code(), ErrorCode::NoActivity);
}

// ===========================================================================
// Summary
// ===========================================================================

#[test]
fn bucket_cards_follow_requested_order_and_skip_unknown() {
    let names = vec!["In Development Now".to_string(), "Missing".into(), "Todo".into()];
    let picked = collect_bucket_cards(&roadmap(), "Roadmap", &names).expect("cards");
    let order: Vec<&str> = picked.iter().map(|b| b.bucket.name.as_str()).collect();
    assert_eq!(order, ["In Development Now", "Todo"]);
    assert_eq!(picked[1].cards.len(), 2);
}
