//! Action categories reported by the board service.
//!
//! Only four categories move an item between buckets; every other action
//! type is carried through as [`EventCategory::Other`] so the raw type
//! string survives for diagnostics.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The kind of change an action records.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EventCategory {
    /// A card field changed (including list moves and archiving).
    UpdateCard,
    /// A card was created in a list.
    CreateCard,
    /// A card was deleted.
    DeleteCard,
    /// A card arrived from another board.
    MoveCardToBoard,
    /// Any other action type (comments, checklist edits, ...).
    Other(String),
}

impl EventCategory {
    /// The categories that contribute to bucket residency counts.
    pub const BUCKET_RELEVANT: [Self; 4] = [
        Self::UpdateCard,
        Self::CreateCard,
        Self::DeleteCard,
        Self::MoveCardToBoard,
    ];

    /// Return the service's action type string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::UpdateCard => "updateCard",
            Self::CreateCard => "createCard",
            Self::DeleteCard => "deleteCard",
            Self::MoveCardToBoard => "moveCardToBoard",
            Self::Other(raw) => raw.as_str(),
        }
    }

    /// Whether actions of this category are considered by the bucket counter.
    #[must_use]
    pub const fn is_bucket_relevant(&self) -> bool {
        !matches!(self, Self::Other(_))
    }
}

impl fmt::Display for EventCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for EventCategory {
    fn from(s: &str) -> Self {
        match s {
            "updateCard" => Self::UpdateCard,
            "createCard" => Self::CreateCard,
            "deleteCard" => Self::DeleteCard,
            "moveCardToBoard" => Self::MoveCardToBoard,
            other => Self::Other(other.to_string()),
        }
    }
}

impl FromStr for EventCategory {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from(s))
    }
}

// Serialized as the raw action type string.
impl Serialize for EventCategory {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for EventCategory {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(Self::from(s.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relevant_categories_roundtrip() {
        for category in EventCategory::BUCKET_RELEVANT {
            let parsed = EventCategory::from(category.as_str());
            assert_eq!(parsed, category);
            assert!(parsed.is_bucket_relevant());
        }
    }

    #[test]
    fn unknown_types_are_preserved() {
        let category = EventCategory::from("commentCard");
        assert_eq!(category, EventCategory::Other("commentCard".into()));
        assert_eq!(category.to_string(), "commentCard");
        assert!(!category.is_bucket_relevant());
    }

    #[test]
    fn matching_is_case_sensitive() {
        assert!(!EventCategory::from("UpdateCard").is_bucket_relevant());
    }

    #[test]
    fn serde_uses_type_string() {
        let json = serde_json::to_string(&EventCategory::MoveCardToBoard).expect("serialize");
        assert_eq!(json, "\"moveCardToBoard\"");
        let back: EventCategory = serde_json::from_str("\"createCard\"").expect("deserialize");
        assert_eq!(back, EventCategory::CreateCard);
    }
}
