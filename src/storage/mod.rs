use crate::{
    domain::{BoardId, BoardRecord, Hierarchy},
    error::Result,
};
use async_trait::async_trait;

pub mod file_storage;
pub mod memory_storage;

pub use file_storage::FileStorage;
pub use memory_storage::MemoryStorage;

/// Storage trait for persisting boards and their structural data
#[async_trait]
pub trait Storage: Send + Sync {
    /// Initializes the storage backend, creating a default board when none exists
    async fn initialize(&self) -> Result<()>;

    /// Creates an empty board with the given name
    async fn create_board(&self, name: &str) -> Result<BoardRecord>;

    /// Lists all boards, oldest first
    async fn list_boards(&self) -> Result<Vec<BoardRecord>>;

    /// Loads a board by ID
    async fn load_board(&self, id: &BoardId) -> Result<BoardRecord>;

    /// Replaces the structural data of a board, leaving its name untouched
    async fn save(&self, id: &BoardId, hierarchy: &Hierarchy) -> Result<()>;

    /// Renames a board
    async fn rename_board(&self, id: &BoardId, name: &str) -> Result<()>;

    /// Checks if the storage is initialized
    async fn is_initialized(&self) -> bool;
}
