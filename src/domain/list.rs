use serde::{Deserialize, Serialize};

use crate::domain::card::Card;
use crate::domain::identity::{CardId, ListId};

/// An ordered collection of cards
///
/// Persisted as a "container" whose cards live under `items`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct List {
    pub id: ListId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "items", default)]
    pub cards: Vec<Card>,
}

impl List {
    /// Creates an empty list
    pub fn new(id: ListId, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            description: None,
            cards: Vec::new(),
        }
    }

    pub fn with_cards(mut self, cards: Vec<Card>) -> Self {
        self.cards = cards;
        self
    }

    /// Position of a card within this list
    pub fn index_of_card(&self, card_id: &CardId) -> Option<usize> {
        self.cards.iter().position(|card| &card.id == card_id)
    }

    pub fn card(&self, card_id: &CardId) -> Option<&Card> {
        self.cards.iter().find(|card| &card.id == card_id)
    }

    pub fn contains_card(&self, card_id: &CardId) -> bool {
        self.index_of_card(card_id).is_some()
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }
}

/// Partial update for a list's editable fields; `None` leaves a field as is
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListPatch {
    pub title: Option<String>,
    pub description: Option<String>,
}

impl ListPatch {
    pub fn title(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            description: None,
        }
    }

    pub fn description(description: impl Into<String>) -> Self {
        Self {
            title: None,
            description: Some(description.into()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.description.is_none()
    }

    /// Merges the provided fields into `list`
    pub fn apply_to(&self, list: &mut List) {
        if let Some(title) = &self.title {
            list.title = title.clone();
        }
        if let Some(description) = &self.description {
            list.description = Some(description.clone());
        }
    }
}
