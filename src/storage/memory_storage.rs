use crate::{
    config::BoardwalkConfig,
    domain::{BoardId, BoardRecord, Hierarchy},
    error::{BoardwalkError, Result},
    storage::Storage,
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;

/// In-process storage, for embedding and tests
///
/// Every successful `save` is also appended to a history so callers can
/// observe the order in which writes landed.
#[derive(Default)]
pub struct MemoryStorage {
    config: BoardwalkConfig,
    boards: RwLock<HashMap<BoardId, BoardRecord>>,
    saves: RwLock<Vec<(BoardId, Hierarchy)>>,
    initialized: AtomicBool,
    fail_writes: AtomicBool,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: BoardwalkConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Makes every subsequent `save` and `rename_board` fail until switched back
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Structural writes that succeeded, oldest first
    pub async fn save_history(&self) -> Vec<(BoardId, Hierarchy)> {
        self.saves.read().await.clone()
    }

    fn check_writable(&self) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            Err(BoardwalkError::StorageError(
                "writes are disabled".to_string(),
            ))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn initialize(&self) -> Result<()> {
        let mut boards = self.boards.write().await;
        if boards.is_empty() {
            let board = BoardRecord::new(self.config.default_board_name.clone())?;
            boards.insert(board.id, board);
        }
        self.initialized.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn create_board(&self, name: &str) -> Result<BoardRecord> {
        let board = BoardRecord::new(name)?;
        self.boards.write().await.insert(board.id, board.clone());
        Ok(board)
    }

    async fn list_boards(&self) -> Result<Vec<BoardRecord>> {
        let mut boards: Vec<BoardRecord> = self.boards.read().await.values().cloned().collect();
        boards.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(boards)
    }

    async fn load_board(&self, id: &BoardId) -> Result<BoardRecord> {
        self.boards
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| BoardwalkError::BoardNotFound(id.to_string()))
    }

    async fn save(&self, id: &BoardId, hierarchy: &Hierarchy) -> Result<()> {
        self.check_writable()?;

        let mut boards = self.boards.write().await;
        let board = boards
            .get_mut(id)
            .ok_or_else(|| BoardwalkError::BoardNotFound(id.to_string()))?;
        board.set_hierarchy(hierarchy)?;

        self.saves.write().await.push((*id, hierarchy.clone()));
        Ok(())
    }

    async fn rename_board(&self, id: &BoardId, name: &str) -> Result<()> {
        self.check_writable()?;

        let mut boards = self.boards.write().await;
        let board = boards
            .get_mut(id)
            .ok_or_else(|| BoardwalkError::BoardNotFound(id.to_string()))?;
        board.rename(name)
    }

    async fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
    }
}
