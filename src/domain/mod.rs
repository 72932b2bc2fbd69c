pub mod board;
pub mod card;
pub mod drag;
pub mod hierarchy;
pub mod identity;
pub mod list;
pub mod mutation;

pub use board::BoardRecord;
pub use card::Card;
pub use drag::{DragEvent, DragPhase, DragResolver};
pub use hierarchy::{Hierarchy, InvariantViolation};
pub use identity::{kind_of, BoardId, CardId, EntityId, EntityKind, ListId};
pub use list::{List, ListPatch};
pub use mutation::{array_move, Command, Mutation};
