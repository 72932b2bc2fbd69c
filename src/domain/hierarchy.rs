//! The canonical ordered board state and read-only queries over it.
//!
//! Queries are linear scans over lists and cards. Boards are small (tens of
//! lists, low hundreds of cards) and every query is side-effect free, so the
//! drag resolver can call them on each pointer-move tick.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

use crate::domain::card::Card;
use crate::domain::identity::{CardId, ListId};
use crate::domain::list::List;

/// Ordered lists, each holding ordered cards
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hierarchy {
    #[serde(rename = "containers", default)]
    pub lists: Vec<List>,
}

/// A structural invariant that a hierarchy fails to hold
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvariantViolation {
    #[error("identifier {0} appears more than once")]
    DuplicateId(String),
}

impl Hierarchy {
    pub fn new(lists: Vec<List>) -> Self {
        Self { lists }
    }

    /// Builds a hierarchy from persisted board data.
    ///
    /// Absent, malformed or inconsistent data yields an empty hierarchy.
    pub fn from_persisted(data: Option<&serde_json::Value>) -> Self {
        let Some(value) = data else {
            return Self::default();
        };
        if value.is_null() {
            return Self::default();
        }

        match serde_json::from_value::<Hierarchy>(value.clone()) {
            Ok(hierarchy) => hierarchy.validated(),
            Err(err) => {
                tracing::warn!(error = %err, "malformed board data, starting with no lists");
                Self::default()
            }
        }
    }

    /// Same as [`Hierarchy::from_persisted`] for data stored as a JSON string
    pub fn from_json_str(data: &str) -> Self {
        match serde_json::from_str::<serde_json::Value>(data) {
            Ok(value) => Self::from_persisted(Some(&value)),
            Err(err) => {
                tracing::warn!(error = %err, "board data is not valid JSON, starting with no lists");
                Self::default()
            }
        }
    }

    fn validated(self) -> Self {
        match self.check_invariants() {
            Ok(()) => self,
            Err(violation) => {
                tracing::warn!(%violation, "inconsistent board data, starting with no lists");
                Self::default()
            }
        }
    }

    /// Checks that no identifier appears twice, across lists and cards
    pub fn check_invariants(&self) -> Result<(), InvariantViolation> {
        let mut seen = HashSet::new();
        for list in &self.lists {
            if !seen.insert(list.id.as_str()) {
                return Err(InvariantViolation::DuplicateId(list.id.to_string()));
            }
            for card in &list.cards {
                if !seen.insert(card.id.as_str()) {
                    return Err(InvariantViolation::DuplicateId(card.id.to_string()));
                }
            }
        }
        Ok(())
    }

    /// Whether any list or card already uses `id`
    pub fn contains_id(&self, id: &str) -> bool {
        self.lists.iter().any(|list| {
            list.id.as_str() == id || list.cards.iter().any(|card| card.id.as_str() == id)
        })
    }

    /// The list that currently owns `card_id`
    pub fn find_owning_list(&self, card_id: &CardId) -> Option<&List> {
        self.lists.iter().find(|list| list.contains_card(card_id))
    }

    pub fn find_list_by_id(&self, list_id: &ListId) -> Option<&List> {
        self.lists.iter().find(|list| &list.id == list_id)
    }

    pub fn index_of_list(&self, list_id: &ListId) -> Option<usize> {
        self.lists.iter().position(|list| &list.id == list_id)
    }

    pub fn index_of_card_in_list(&self, list: &List, card_id: &CardId) -> Option<usize> {
        list.index_of_card(card_id)
    }

    pub fn find_card(&self, card_id: &CardId) -> Option<&Card> {
        self.find_owning_list(card_id).and_then(|list| list.card(card_id))
    }

    /// Title of a card, or an empty string when the card is gone
    pub fn card_title(&self, card_id: &CardId) -> &str {
        self.find_card(card_id)
            .map(|card| card.title.as_str())
            .unwrap_or("")
    }

    pub fn card_description(&self, card_id: &CardId) -> &str {
        self.find_card(card_id)
            .and_then(|card| card.description.as_deref())
            .unwrap_or("")
    }

    pub fn list_title(&self, list_id: &ListId) -> &str {
        self.find_list_by_id(list_id)
            .map(|list| list.title.as_str())
            .unwrap_or("")
    }

    pub fn list_description(&self, list_id: &ListId) -> &str {
        self.find_list_by_id(list_id)
            .and_then(|list| list.description.as_deref())
            .unwrap_or("")
    }

    /// Cards of a list, empty when the list is gone
    pub fn list_cards(&self, list_id: &ListId) -> &[Card] {
        self.find_list_by_id(list_id)
            .map(|list| list.cards.as_slice())
            .unwrap_or(&[])
    }

    pub fn card_count(&self) -> usize {
        self.lists.iter().map(List::len).sum()
    }
}
