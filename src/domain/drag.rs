//! Turns drag lifecycle events into board commands.
//!
//! The gesture layer reports which entity is lifted (`active`) and which one
//! the pointer is over (`over`). Card drags resolve continuously on every
//! move tick; list drags resolve only on drop. Anything that cannot be
//! resolved against the current snapshot yields no command.

use serde::{Deserialize, Serialize};

use crate::domain::hierarchy::Hierarchy;
use crate::domain::identity::{CardId, EntityId, ListId};
use crate::domain::mutation::Command;

/// A raw event from the gesture layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "phase", rename_all = "lowercase")]
pub enum DragEvent {
    Start {
        active: String,
    },
    Move {
        active: String,
        #[serde(default)]
        over: Option<String>,
    },
    End {
        active: String,
        #[serde(default)]
        over: Option<String>,
    },
}

/// Whether a drag is in progress
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragPhase {
    Idle,
    Dragging,
}

/// Tracks the lifted entity across a drag gesture
#[derive(Debug, Clone, Default)]
pub struct DragResolver {
    active: Option<EntityId>,
}

impl DragResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active(&self) -> Option<&EntityId> {
        self.active.as_ref()
    }

    pub fn phase(&self) -> DragPhase {
        if self.active.is_some() {
            DragPhase::Dragging
        } else {
            DragPhase::Idle
        }
    }

    /// Feeds one event through the state machine and returns the command to apply
    pub fn handle(&mut self, board: &Hierarchy, event: &DragEvent) -> Option<Command> {
        match event {
            DragEvent::Start { active } => {
                self.start(active);
                None
            }
            DragEvent::Move { active, over } => self.drag_move(board, active, over.as_deref()),
            DragEvent::End { active, over } => self.end(board, active, over.as_deref()),
        }
    }

    pub fn start(&mut self, active: &str) {
        self.active = EntityId::parse(active);
        if self.active.is_none() {
            tracing::trace!(active, "drag started on an unrecognised id");
        }
    }

    pub fn drag_move(
        &self,
        board: &Hierarchy,
        active: &str,
        over: Option<&str>,
    ) -> Option<Command> {
        let (active, over) = classify(active, over)?;
        resolve_move(board, &active, &over)
    }

    /// Resolves the drop, then clears the active entity whatever the outcome
    pub fn end(&mut self, board: &Hierarchy, active: &str, over: Option<&str>) -> Option<Command> {
        let command =
            classify(active, over).and_then(|(active, over)| resolve_end(board, &active, &over));
        self.active = None;
        command
    }
}

fn classify(active: &str, over: Option<&str>) -> Option<(EntityId, EntityId)> {
    let over = over?;
    if active == over {
        return None;
    }
    match (EntityId::parse(active), EntityId::parse(over)) {
        (Some(active), Some(over)) => Some((active, over)),
        _ => {
            tracing::trace!(active, over, "ignoring drag with an unrecognised id");
            None
        }
    }
}

/// Resolution applied on every move tick: only card drags produce commands
pub fn resolve_move(board: &Hierarchy, active: &EntityId, over: &EntityId) -> Option<Command> {
    if active == over {
        return None;
    }
    match (active, over) {
        (EntityId::Card(active), EntityId::Card(over)) => card_over_card(board, active, over),
        (EntityId::Card(active), EntityId::List(over)) => card_over_list(board, active, over),
        _ => None,
    }
}

/// Resolution applied on drop: list reordering plus the card cases from [`resolve_move`]
pub fn resolve_end(board: &Hierarchy, active: &EntityId, over: &EntityId) -> Option<Command> {
    match (active, over) {
        (EntityId::List(active), EntityId::List(over)) if active != over => {
            let from_index = board.index_of_list(active)?;
            let to_index = board.index_of_list(over)?;
            Some(Command::ReorderLists {
                from_index,
                to_index,
            })
        }
        _ => resolve_move(board, active, over),
    }
}

// The hovered card's slot becomes the insertion point, so cards shift as the
// pointer crosses them.
fn card_over_card(board: &Hierarchy, active: &CardId, over: &CardId) -> Option<Command> {
    let active_list = board.find_owning_list(active)?;
    let over_list = board.find_owning_list(over)?;
    let from_index = board.index_of_card_in_list(active_list, active)?;
    let to_index = board.index_of_card_in_list(over_list, over)?;

    if active_list.id == over_list.id {
        Some(Command::ReorderCardsInList {
            list_id: active_list.id.clone(),
            from_index,
            to_index,
        })
    } else {
        Some(Command::MoveCardBetweenLists {
            from_list_id: active_list.id.clone(),
            to_list_id: over_list.id.clone(),
            from_index,
            to_index,
        })
    }
}

fn card_over_list(board: &Hierarchy, active: &CardId, over: &ListId) -> Option<Command> {
    let active_list = board.find_owning_list(active)?;
    let target = board.find_list_by_id(over)?;
    let from_index = board.index_of_card_in_list(active_list, active)?;

    Some(Command::MoveCardBetweenLists {
        from_list_id: active_list.id.clone(),
        to_list_id: target.id.clone(),
        from_index,
        to_index: target.len(),
    })
}
