//! Columnar view of an event history with interned categorical columns.
//!
//! The counter runs once per day over the full history, so the string
//! columns it filters and groups on (`category`, `board`, `destination`,
//! `actor`) are interned into [`Symbol`]s once up front. Strings are only
//! materialised again when results are handed back to callers.

use std::collections::HashMap;

use chrono::NaiveDateTime;

use crate::event::{Event, EventCategory};

/// Index into an [`Interner`] table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Symbol(u32);

/// Insertion-ordered string table.
#[derive(Debug, Clone, Default)]
pub struct Interner {
    index_of: HashMap<String, Symbol>,
    names: Vec<String>,
}

impl Interner {
    /// Return the symbol for `name`, adding it on first sight.
    ///
    /// # Panics
    ///
    /// Panics if more than `u32::MAX` distinct strings are interned.
    pub fn intern(&mut self, name: &str) -> Symbol {
        if let Some(&symbol) = self.index_of.get(name) {
            return symbol;
        }
        let symbol = Symbol(u32::try_from(self.names.len()).expect("interner table overflow"));
        self.names.push(name.to_string());
        self.index_of.insert(name.to_string(), symbol);
        symbol
    }

    /// Look up an already-interned string.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Symbol> {
        self.index_of.get(name).copied()
    }

    /// Resolve a symbol produced by this interner.
    #[must_use]
    pub fn resolve(&self, symbol: Symbol) -> &str {
        &self.names[symbol.0 as usize]
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Interned strings in first-seen order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }
}

/// Parallel columns for a batch of events, in input order.
///
/// The `i`-th element of each column belongs to the `i`-th event.
#[derive(Debug, Clone, Default)]
pub struct EventFrame {
    timestamps: Vec<NaiveDateTime>,
    items: Vec<Option<u64>>,
    categories: Vec<Symbol>,
    boards: Vec<Symbol>,
    destinations: Vec<Option<Symbol>>,
    actors: Vec<Symbol>,
    closed: Vec<bool>,
    relevant: Vec<bool>,
    category_names: Interner,
    board_names: Interner,
    bucket_names: Interner,
    actor_names: Interner,
}

impl EventFrame {
    /// Decompose events into columns, interning the categorical ones.
    #[must_use]
    pub fn from_events(events: &[Event]) -> Self {
        let n = events.len();
        let mut frame = Self {
            timestamps: Vec::with_capacity(n),
            items: Vec::with_capacity(n),
            categories: Vec::with_capacity(n),
            boards: Vec::with_capacity(n),
            destinations: Vec::with_capacity(n),
            actors: Vec::with_capacity(n),
            closed: Vec::with_capacity(n),
            relevant: Vec::with_capacity(n),
            ..Self::default()
        };

        for event in events {
            frame.timestamps.push(event.timestamp);
            frame.items.push(event.item_short_id);
            frame
                .categories
                .push(frame.category_names.intern(event.category.as_str()));
            frame.boards.push(frame.board_names.intern(&event.board));
            frame.destinations.push(
                event
                    .destination
                    .as_deref()
                    .map(|bucket| frame.bucket_names.intern(bucket)),
            );
            frame.actors.push(frame.actor_names.intern(&event.actor));
            frame.closed.push(event.closed);
            frame.relevant.push(event.category.is_bucket_relevant());
        }

        tracing::trace!(
            rows = n,
            categories = frame.category_names.len(),
            buckets = frame.bucket_names.len(),
            actors = frame.actor_names.len(),
            "built event frame"
        );
        frame
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    #[must_use]
    pub fn timestamp(&self, row: usize) -> NaiveDateTime {
        self.timestamps[row]
    }

    /// Item short id; `None` rows all share one dedup key.
    #[must_use]
    pub fn item(&self, row: usize) -> Option<u64> {
        self.items[row]
    }

    #[must_use]
    pub fn closed(&self, row: usize) -> bool {
        self.closed[row]
    }

    /// Whether the row's category participates in bucket counting.
    #[must_use]
    pub fn is_bucket_relevant(&self, row: usize) -> bool {
        self.relevant[row]
    }

    #[must_use]
    pub fn destination(&self, row: usize) -> Option<Symbol> {
        self.destinations[row]
    }

    #[must_use]
    pub fn category(&self, row: usize) -> EventCategory {
        EventCategory::from(self.category_names.resolve(self.categories[row]))
    }

    #[must_use]
    pub fn board(&self, row: usize) -> &str {
        self.board_names.resolve(self.boards[row])
    }

    #[must_use]
    pub fn actor(&self, row: usize) -> &str {
        self.actor_names.resolve(self.actors[row])
    }

    /// Bucket name table for resolving [`EventFrame::destination`] symbols.
    #[must_use]
    pub const fn buckets(&self) -> &Interner {
        &self.bucket_names
    }

    /// Actor name table (distinct members seen in the history).
    #[must_use]
    pub const fn actors(&self) -> &Interner {
        &self.actor_names
    }

    /// Board name table (distinct boards seen in the history).
    #[must_use]
    pub const fn boards(&self) -> &Interner {
        &self.board_names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn event(id: &str, category: &str, dest: Option<&str>, actor: &str) -> Event {
        Event {
            id: id.into(),
            board: "Roadmap".into(),
            destination: dest.map(str::to_string),
            source: None,
            item_short_id: Some(1),
            item_name: None,
            closed: false,
            timestamp: NaiveDate::from_ymd_opt(2018, 9, 1)
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .expect("valid"),
            category: EventCategory::from(category),
            actor: actor.into(),
        }
    }

    #[test]
    fn interner_dedups_and_resolves() {
        let mut interner = Interner::default();
        let a = interner.intern("Todo");
        let b = interner.intern("Done");
        assert_eq!(interner.intern("Todo"), a);
        assert_ne!(a, b);
        assert_eq!(interner.resolve(b), "Done");
        assert_eq!(interner.get("Done"), Some(b));
        assert_eq!(interner.get("Nope"), None);
        assert_eq!(interner.names().collect::<Vec<_>>(), ["Todo", "Done"]);
    }

    #[test]
    fn frame_columns_align_with_events() {
        let events = vec![
            event("1", "createCard", Some("Todo"), "Ada"),
            event("2", "commentCard", None, "Ada"),
            event("3", "updateCard", Some("Done"), "Grace"),
            event("4", "updateCard", Some("Todo"), "Grace"),
        ];
        let frame = EventFrame::from_events(&events);
        assert_eq!(frame.len(), 4);
        assert_eq!(frame.buckets().len(), 2);
        assert_eq!(frame.actors().len(), 2);
        assert_eq!(frame.boards().len(), 1);
        assert_eq!(frame.destination(0), frame.destination(3));
        assert!(frame.destination(1).is_none());
        assert!(!frame.is_bucket_relevant(1));
        assert_eq!(frame.category(2), EventCategory::UpdateCard);
        assert_eq!(frame.actor(2), "Grace");
        assert_eq!(frame.board(0), "Roadmap");
    }

    #[test]
    fn empty_history_builds_empty_frame() {
        let frame = EventFrame::from_events(&[]);
        assert!(frame.is_empty());
        assert!(frame.buckets().is_empty());
    }
}
