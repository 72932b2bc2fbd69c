//! Structural commands over a [`Hierarchy`].
//!
//! Every command reads the current snapshot and produces a new one; the input
//! is never modified, so a snapshot already handed to persistence stays intact.
//! A command whose precondition fails is a no-op rather than an error.

use serde::{Deserialize, Serialize};

use crate::domain::card::Card;
use crate::domain::hierarchy::Hierarchy;
use crate::domain::identity::{CardId, ListId};
use crate::domain::list::{List, ListPatch};

/// A structural change to the board
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum Command {
    AddList {
        id: ListId,
        title: String,
    },
    AddCard {
        list_id: ListId,
        id: CardId,
        title: String,
    },
    RenameList {
        list_id: ListId,
        patch: ListPatch,
    },
    UpdateCard {
        list_id: ListId,
        card: Card,
    },
    DeleteList {
        list_id: ListId,
    },
    DeleteCard {
        list_id: ListId,
        card_id: CardId,
    },
    ReorderCardsInList {
        list_id: ListId,
        from_index: usize,
        to_index: usize,
    },
    MoveCardBetweenLists {
        from_list_id: ListId,
        to_list_id: ListId,
        from_index: usize,
        to_index: usize,
    },
    ReorderLists {
        from_index: usize,
        to_index: usize,
    },
}

impl Command {
    /// Appends a new empty list under a freshly minted id
    pub fn add_list(title: impl Into<String>) -> Self {
        Self::AddList {
            id: ListId::generate(),
            title: title.into(),
        }
    }

    /// Appends a new card under a freshly minted id
    pub fn add_card(list_id: ListId, title: impl Into<String>) -> Self {
        Self::AddCard {
            list_id,
            id: CardId::generate(),
            title: title.into(),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::AddList { .. } => "add_list",
            Self::AddCard { .. } => "add_card",
            Self::RenameList { .. } => "rename_list",
            Self::UpdateCard { .. } => "update_card",
            Self::DeleteList { .. } => "delete_list",
            Self::DeleteCard { .. } => "delete_card",
            Self::ReorderCardsInList { .. } => "reorder_cards_in_list",
            Self::MoveCardBetweenLists { .. } => "move_card_between_lists",
            Self::ReorderLists { .. } => "reorder_lists",
        }
    }
}

/// Outcome of applying a [`Command`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    Applied(Hierarchy),
    NoOp,
}

impl Mutation {
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied(_))
    }

    pub fn into_applied(self) -> Option<Hierarchy> {
        match self {
            Self::Applied(hierarchy) => Some(hierarchy),
            Self::NoOp => None,
        }
    }
}

/// Moves the element at `from` so that it ends up at `to`.
///
/// `to` is a position in the sequence *after* the element has been removed,
/// so moving index 0 to index 2 in `[A, B, C, D]` gives `[B, C, A, D]`.
/// `to` is clamped to the last valid position. Returns `None` when `from` is
/// out of range or the move would not change the order.
pub fn array_move<T: Clone>(items: &[T], from: usize, to: usize) -> Option<Vec<T>> {
    if from >= items.len() {
        return None;
    }
    let to = to.min(items.len() - 1);
    if from == to {
        return None;
    }

    let mut moved = items.to_vec();
    let item = moved.remove(from);
    moved.insert(to, item);
    Some(moved)
}

impl Hierarchy {
    /// Applies `command`, returning the new snapshot or [`Mutation::NoOp`]
    pub fn apply(&self, command: &Command) -> Mutation {
        let next = match command {
            Command::AddList { id, title } => self.with_list_added(id, title),
            Command::AddCard { list_id, id, title } => self.with_card_added(list_id, id, title),
            Command::RenameList { list_id, patch } => self.with_list_renamed(list_id, patch),
            Command::UpdateCard { list_id, card } => self.with_card_replaced(list_id, card),
            Command::DeleteList { list_id } => self.without_list(list_id),
            Command::DeleteCard { list_id, card_id } => self.without_card(list_id, card_id),
            Command::ReorderCardsInList {
                list_id,
                from_index,
                to_index,
            } => self.with_cards_reordered(list_id, *from_index, *to_index),
            Command::MoveCardBetweenLists {
                from_list_id,
                to_list_id,
                from_index,
                to_index,
            } => self.with_card_moved(from_list_id, to_list_id, *from_index, *to_index),
            Command::ReorderLists {
                from_index,
                to_index,
            } => array_move(&self.lists, *from_index, *to_index).map(Hierarchy::new),
        };

        match next {
            Some(hierarchy) => {
                tracing::debug!(command = command.name(), "applied board mutation");
                Mutation::Applied(hierarchy)
            }
            None => {
                tracing::trace!(command = command.name(), "board mutation was a no-op");
                Mutation::NoOp
            }
        }
    }

    /// Applies `command`, returning an unchanged copy when it is a no-op
    pub fn execute(&self, command: &Command) -> Hierarchy {
        self.apply(command)
            .into_applied()
            .unwrap_or_else(|| self.clone())
    }

    fn with_list_added(&self, id: &ListId, title: &str) -> Option<Hierarchy> {
        if self.contains_id(id.as_str()) {
            return None;
        }
        let mut next = self.clone();
        next.lists.push(List::new(id.clone(), title));
        Some(next)
    }

    fn with_card_added(&self, list_id: &ListId, id: &CardId, title: &str) -> Option<Hierarchy> {
        let index = self.index_of_list(list_id)?;
        if self.contains_id(id.as_str()) {
            return None;
        }
        let mut next = self.clone();
        next.lists[index].cards.push(Card::new(id.clone(), title));
        Some(next)
    }

    fn with_list_renamed(&self, list_id: &ListId, patch: &ListPatch) -> Option<Hierarchy> {
        let index = self.index_of_list(list_id)?;
        let mut list = self.lists[index].clone();
        patch.apply_to(&mut list);
        if list == self.lists[index] {
            return None;
        }
        let mut next = self.clone();
        next.lists[index] = list;
        Some(next)
    }

    fn with_card_replaced(&self, list_id: &ListId, card: &Card) -> Option<Hierarchy> {
        let list_index = self.index_of_list(list_id)?;
        let card_index = self.lists[list_index].index_of_card(&card.id)?;
        if &self.lists[list_index].cards[card_index] == card {
            return None;
        }
        let mut next = self.clone();
        next.lists[list_index].cards[card_index] = card.clone();
        Some(next)
    }

    fn without_list(&self, list_id: &ListId) -> Option<Hierarchy> {
        let index = self.index_of_list(list_id)?;
        let mut next = self.clone();
        next.lists.remove(index);
        Some(next)
    }

    fn without_card(&self, list_id: &ListId, card_id: &CardId) -> Option<Hierarchy> {
        let list_index = self.index_of_list(list_id)?;
        let card_index = self.lists[list_index].index_of_card(card_id)?;
        let mut next = self.clone();
        next.lists[list_index].cards.remove(card_index);
        Some(next)
    }

    fn with_cards_reordered(&self, list_id: &ListId, from: usize, to: usize) -> Option<Hierarchy> {
        let index = self.index_of_list(list_id)?;
        let cards = array_move(&self.lists[index].cards, from, to)?;
        let mut next = self.clone();
        next.lists[index].cards = cards;
        Some(next)
    }

    fn with_card_moved(
        &self,
        from_list_id: &ListId,
        to_list_id: &ListId,
        from: usize,
        to: usize,
    ) -> Option<Hierarchy> {
        let source = self.index_of_list(from_list_id)?;
        let destination = self.index_of_list(to_list_id)?;
        if from >= self.lists[source].cards.len() {
            return None;
        }

        let mut next = self.clone();
        let card = next.lists[source].cards.remove(from);
        let cards = &mut next.lists[destination].cards;
        let to = to.min(cards.len());
        cards.insert(to, card);

        if source == destination && from == to {
            return None;
        }
        Some(next)
    }
}
