use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::hierarchy::Hierarchy;
use crate::domain::identity::BoardId;
use crate::error::{BoardwalkError, Result};

/// A persisted board: its identity, name and raw structural data
///
/// `data` is kept as raw JSON so that a board whose data is missing or
/// malformed still loads, with an empty hierarchy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardRecord {
    pub id: BoardId,
    pub name: String,
    #[serde(default)]
    pub data: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BoardRecord {
    /// Creates a board with no lists
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = validate_board_name(name.into())?;
        let now = Utc::now();
        Ok(Self {
            id: BoardId::generate(),
            name,
            data: serde_json::Value::Object(serde_json::Map::new()),
            created_at: now,
            updated_at: now,
        })
    }

    /// The structural data, defaulting to no lists when absent or malformed.
    /// Data stored as an encoded JSON string is decoded first.
    pub fn hierarchy(&self) -> Hierarchy {
        match &self.data {
            serde_json::Value::String(encoded) => Hierarchy::from_json_str(encoded),
            value => Hierarchy::from_persisted(Some(value)),
        }
    }

    pub fn set_hierarchy(&mut self, hierarchy: &Hierarchy) -> Result<()> {
        self.data = serde_json::to_value(hierarchy)?;
        self.updated_at = Utc::now();
        Ok(())
    }

    pub fn rename(&mut self, name: impl Into<String>) -> Result<()> {
        self.name = validate_board_name(name.into())?;
        self.updated_at = Utc::now();
        Ok(())
    }
}

/// Rejects names that are empty or whitespace only
pub fn validate_board_name(name: String) -> Result<String> {
    if name.trim().is_empty() {
        Err(BoardwalkError::InvalidBoardName)
    } else {
        Ok(name)
    }
}
