//! # Boardwalk Core
//!
//! Ordering engine for a kanban-style board editor.
//!
//! A board holds ordered lists, each holding ordered cards. This crate keeps
//! that hierarchy consistent while users add, edit, reorder and drag lists
//! and cards around, and keeps a storage backend in step with every change.
//! Gesture capture and rendering are left to the embedding UI, which feeds
//! drag events in as plain identifiers.

pub mod config;
pub mod domain;
pub mod error;
pub mod session;
pub mod storage;
pub mod sync;

// Re-export commonly used types
pub use config::BoardwalkConfig;
pub use domain::{
    board::BoardRecord,
    card::Card,
    drag::{DragEvent, DragPhase, DragResolver},
    hierarchy::Hierarchy,
    identity::{kind_of, BoardId, CardId, EntityId, EntityKind, ListId},
    list::{List, ListPatch},
    mutation::{array_move, Command, Mutation},
};
pub use error::{BoardwalkError, Result};
pub use session::BoardSession;
pub use storage::Storage;
pub use sync::{BoardName, PendingWrite, SyncBridge};
