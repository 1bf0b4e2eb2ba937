//! Board actions: the raw wire shape and the flat [`Event`] record.
//!
//! The board service reports each change as a nested JSON "action" whose
//! fields vary by action type. [`RawAction`] decodes that shape with every
//! nested field optional; [`normalize`] flattens it into an [`Event`] using
//! named defaulting rules.
//!
//! # Raw shape (subset)
//!
//! ```text
//! { "id": "...", "type": "updateCard", "date": "2018-09-01T12:00:00.000Z",
//!   "data": { "board": {"name"}, "list": {"name"},
//!             "listBefore": {"name"}, "listAfter": {"name"},
//!             "card": {"id", "idShort", "name", "closed"} },
//!   "memberCreator": { "fullName": "..." } }
//! ```

pub mod normalize;
pub mod types;

pub use normalize::{NormalizeError, flatten, normalize, retain_bucketed};
pub use types::EventCategory;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// One action exactly as the board service sends it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawAction {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub data: RawActionData,
    #[serde(default)]
    pub member_creator: Option<RawMember>,
}

/// The `data` object of an action.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawActionData {
    #[serde(default)]
    pub board: Option<NamedRef>,
    #[serde(default)]
    pub list: Option<NamedRef>,
    #[serde(default)]
    pub list_before: Option<NamedRef>,
    #[serde(default)]
    pub list_after: Option<NamedRef>,
    #[serde(default)]
    pub card: Option<RawCardRef>,
}

/// A `{id, name}` reference to a board or list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedRef {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

/// The card an action refers to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawCardRef {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub id_short: Option<u64>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub closed: Option<bool>,
}

/// The member that produced an action.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawMember {
    #[serde(default)]
    pub full_name: Option<String>,
}

/// A flat, typed action record.
///
/// `destination` is `None` when the action names no list at all; such
/// events cannot be bucketed and are removed by [`retain_bucketed`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Action id assigned by the service.
    pub id: String,
    /// Board name (empty when the action omits it).
    pub board: String,
    /// Bucket the item is in after this action.
    pub destination: Option<String>,
    /// Bucket the item left, for list moves.
    pub source: Option<String>,
    /// Board-local short id of the item.
    pub item_short_id: Option<u64>,
    /// Display name of the item at the time of the action.
    pub item_name: Option<String>,
    /// Whether the item was archived by/at this action.
    pub closed: bool,
    /// UTC instant of the action, whole seconds.
    pub timestamp: NaiveDateTime,
    pub category: EventCategory,
    /// Full name of the member that made the change (empty when absent).
    pub actor: String,
}

/// Distinct item ids referenced by a batch of raw actions.
///
/// Actions without a card id contribute nothing.
#[must_use]
pub fn unique_item_ids(actions: &[RawAction]) -> BTreeSet<String> {
    actions
        .iter()
        .filter_map(|action| action.data.card.as_ref()?.id.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn action_with_card(card_id: Option<&str>) -> RawAction {
        RawAction {
            id: "a".into(),
            data: RawActionData {
                card: Some(RawCardRef {
                    id: card_id.map(str::to_string),
                    ..RawCardRef::default()
                }),
                ..RawActionData::default()
            },
            ..RawAction::default()
        }
    }

    #[test]
    fn unique_ids_collapse_repeats() {
        let actions = vec![
            action_with_card(Some("c1")),
            action_with_card(Some("c2")),
            action_with_card(Some("c1")),
        ];
        let ids = unique_item_ids(&actions);
        assert_eq!(ids.len(), 2);
        assert!(ids.contains("c1"));
        assert!(ids.contains("c2"));
    }

    #[test]
    fn actions_without_card_contribute_nothing() {
        let actions = vec![RawAction::default(), action_with_card(None)];
        assert!(unique_item_ids(&actions).is_empty());
    }

    #[test]
    fn raw_action_decodes_service_json() {
        let json = r#"{
            "id": "5b8a",
            "type": "updateCard",
            "date": "2018-09-01T12:00:00.000Z",
            "data": {
                "board": {"id": "b1", "name": "Roadmap"},
                "listBefore": {"id": "l1", "name": "Todo"},
                "listAfter": {"id": "l2", "name": "Doing"},
                "card": {"id": "c9", "idShort": 42, "name": "Ship it", "closed": false},
                "old": {"idList": "l1"}
            },
            "memberCreator": {"id": "m1", "fullName": "Ada Lovelace"}
        }"#;
        let action: RawAction = serde_json::from_str(json).expect("decode");
        assert_eq!(action.kind.as_deref(), Some("updateCard"));
        let after = action.data.list_after.and_then(|l| l.name);
        assert_eq!(after.as_deref(), Some("Doing"));
        let card = action.data.card.expect("card");
        assert_eq!(card.id_short, Some(42));
        assert_eq!(
            action.member_creator.and_then(|m| m.full_name).as_deref(),
            Some("Ada Lovelace")
        );
    }

    #[test]
    fn raw_action_tolerates_sparse_json() {
        let action: RawAction = serde_json::from_str(r#"{"id": "x"}"#).expect("decode");
        assert_eq!(action.id, "x");
        assert!(action.kind.is_none());
        assert!(action.data.card.is_none());
    }
}
