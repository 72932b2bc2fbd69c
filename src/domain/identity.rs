use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use uuid::Uuid;

use crate::error::BoardwalkError;

/// Namespace prefix carried by every list identifier
pub const LIST_PREFIX: &str = "list-";

/// Namespace prefix carried by every card identifier
pub const CARD_PREFIX: &str = "card-";

/// Kind of entity an identifier refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    List,
    Card,
    Unknown,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::List => write!(f, "list"),
            Self::Card => write!(f, "card"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// Classifies a raw identifier by its namespace prefix.
///
/// The check is case-sensitive and needs a non-empty suffix after the prefix,
/// so `"list-"` on its own is `Unknown`.
pub fn kind_of(id: &str) -> EntityKind {
    if has_namespace(id, LIST_PREFIX) {
        EntityKind::List
    } else if has_namespace(id, CARD_PREFIX) {
        EntityKind::Card
    } else {
        EntityKind::Unknown
    }
}

fn has_namespace(id: &str, prefix: &str) -> bool {
    id.len() > prefix.len() && id.starts_with(prefix)
}

fn random_suffix() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Identifier of a list (e.g. `list-3f2a...`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ListId(String);

impl ListId {
    /// Mints a fresh list identifier
    pub fn generate() -> Self {
        Self(format!("{}{}", LIST_PREFIX, random_suffix()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for ListId {
    type Err = BoardwalkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match kind_of(s) {
            EntityKind::List => Ok(Self(s.to_string())),
            _ => Err(BoardwalkError::InvalidListId(s.to_string())),
        }
    }
}

impl TryFrom<String> for ListId {
    type Error = BoardwalkError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match kind_of(&value) {
            EntityKind::List => Ok(Self(value)),
            _ => Err(BoardwalkError::InvalidListId(value)),
        }
    }
}

impl From<ListId> for String {
    fn from(id: ListId) -> Self {
        id.0
    }
}

impl fmt::Display for ListId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a card (e.g. `card-9bc1...`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CardId(String);

impl CardId {
    /// Mints a fresh card identifier
    pub fn generate() -> Self {
        Self(format!("{}{}", CARD_PREFIX, random_suffix()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for CardId {
    type Err = BoardwalkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match kind_of(s) {
            EntityKind::Card => Ok(Self(s.to_string())),
            _ => Err(BoardwalkError::InvalidCardId(s.to_string())),
        }
    }
}

impl TryFrom<String> for CardId {
    type Error = BoardwalkError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match kind_of(&value) {
            EntityKind::Card => Ok(Self(value)),
            _ => Err(BoardwalkError::InvalidCardId(value)),
        }
    }
}

impl From<CardId> for String {
    fn from(id: CardId) -> Self {
        id.0
    }
}

impl fmt::Display for CardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A classified identifier, produced once at the edge of the engine
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EntityId {
    List(ListId),
    Card(CardId),
}

impl EntityId {
    /// Classifies a raw id; returns `None` for identifiers outside both namespaces
    pub fn parse(raw: &str) -> Option<Self> {
        match kind_of(raw) {
            EntityKind::List => Some(Self::List(ListId(raw.to_string()))),
            EntityKind::Card => Some(Self::Card(CardId(raw.to_string()))),
            EntityKind::Unknown => None,
        }
    }

    pub fn kind(&self) -> EntityKind {
        match self {
            Self::List(_) => EntityKind::List,
            Self::Card(_) => EntityKind::Card,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::List(id) => id.as_str(),
            Self::Card(id) => id.as_str(),
        }
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Unique identifier of a persisted board
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BoardId(Uuid);

impl BoardId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl FromStr for BoardId {
    type Err = BoardwalkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|_| BoardwalkError::InvalidBoardId(s.to_string()))
    }
}

impl fmt::Display for BoardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
