//! Keeps the persistence backend in step with the in-memory board.
//!
//! Each board gets one worker task fed by an unbounded queue. Writes are
//! issued in the order they were enqueued, one at a time, so a slow write can
//! never be overtaken by a later one. Enqueueing never blocks the caller.
//!
//! Structural writes are fire-and-forget: a failure is logged and the
//! in-memory snapshot is kept. The board name is the one exception: a rename
//! is applied optimistically and undone if the write fails.

use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;

use crate::domain::{BoardId, Hierarchy};
use crate::error::{BoardwalkError, Result};
use crate::storage::Storage;

/// Observable board name, shared between a session and its sync worker
#[derive(Debug, Clone)]
pub struct BoardName {
    current: Arc<watch::Sender<String>>,
}

impl BoardName {
    pub fn new(name: impl Into<String>) -> Self {
        let (sender, _) = watch::channel(name.into());
        Self {
            current: Arc::new(sender),
        }
    }

    pub fn get(&self) -> String {
        self.current.borrow().clone()
    }

    /// Receiver notified on every change, including rollbacks
    pub fn subscribe(&self) -> watch::Receiver<String> {
        self.current.subscribe()
    }

    /// Sets the name, returning the previous one
    fn replace(&self, name: String) -> String {
        self.current.send_replace(name)
    }

    /// Restores `previous` unless a newer name has replaced `attempted` meanwhile
    fn rollback(&self, attempted: &str, previous: String) -> bool {
        self.current.send_if_modified(|current| {
            if current.as_str() == attempted {
                *current = previous;
                true
            } else {
                false
            }
        })
    }
}

/// Outcome of a queued write that the caller may await
#[derive(Debug)]
pub struct PendingWrite {
    outcome: oneshot::Receiver<Result<()>>,
}

impl PendingWrite {
    /// Waits for the write to complete
    pub async fn outcome(self) -> Result<()> {
        self.outcome.await.map_err(|_| BoardwalkError::SyncClosed)?
    }
}

enum SyncJob {
    Save {
        snapshot: Arc<Hierarchy>,
        version: u64,
    },
    Rename {
        name: BoardName,
        attempted: String,
        previous: String,
        done: oneshot::Sender<Result<()>>,
    },
    Flush {
        done: oneshot::Sender<()>,
    },
}

/// Per-board single-flight write queue
pub struct SyncBridge {
    board_id: BoardId,
    jobs: mpsc::UnboundedSender<SyncJob>,
    worker: JoinHandle<()>,
}

impl SyncBridge {
    /// Spawns the board's worker on the current tokio runtime
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime, as [`tokio::spawn`] does.
    pub fn spawn(board_id: BoardId, storage: Arc<dyn Storage>) -> Self {
        let (jobs, queue) = mpsc::unbounded_channel();
        let worker = tokio::spawn(run_worker(board_id, storage, queue));
        Self {
            board_id,
            jobs,
            worker,
        }
    }

    pub fn board_id(&self) -> &BoardId {
        &self.board_id
    }

    /// Queues a structural write of `snapshot`
    pub fn save(&self, snapshot: Arc<Hierarchy>, version: u64) {
        if self.jobs.send(SyncJob::Save { snapshot, version }).is_err() {
            tracing::warn!(board = %self.board_id, version, "sync worker gone, dropping board write");
        }
    }

    /// Optimistically renames the board and queues the write.
    ///
    /// Empty names and names equal to the current one are ignored and
    /// return `None`. If the write fails the previous name is restored.
    pub fn rename(&self, name: &BoardName, new_name: &str) -> Option<PendingWrite> {
        if new_name.trim().is_empty() || name.get() == new_name {
            return None;
        }

        let previous = name.replace(new_name.to_string());
        let (done, outcome) = oneshot::channel();
        let job = SyncJob::Rename {
            name: name.clone(),
            attempted: new_name.to_string(),
            previous,
            done,
        };

        if let Err(mpsc::error::SendError(job)) = self.jobs.send(job) {
            if let SyncJob::Rename {
                name,
                attempted,
                previous,
                done,
            } = job
            {
                tracing::warn!(board = %self.board_id, "sync worker gone, reverting board name");
                name.rollback(&attempted, previous);
                let _ = done.send(Err(BoardwalkError::SyncClosed));
            }
        }

        Some(PendingWrite { outcome })
    }

    /// Waits until every write queued so far has completed
    pub async fn flush(&self) -> Result<()> {
        let (done, flushed) = oneshot::channel();
        self.jobs
            .send(SyncJob::Flush { done })
            .map_err(|_| BoardwalkError::SyncClosed)?;
        flushed.await.map_err(|_| BoardwalkError::SyncClosed)
    }

    /// Closes the queue and waits for outstanding writes to finish
    pub async fn shutdown(self) {
        drop(self.jobs);
        if let Err(err) = self.worker.await {
            tracing::warn!(board = %self.board_id, error = %err, "sync worker ended abnormally");
        }
    }
}

async fn run_worker(
    board_id: BoardId,
    storage: Arc<dyn Storage>,
    mut queue: mpsc::UnboundedReceiver<SyncJob>,
) {
    while let Some(job) = queue.recv().await {
        match job {
            SyncJob::Save { snapshot, version } => match storage.save(&board_id, &snapshot).await {
                Ok(()) => tracing::trace!(board = %board_id, version, "board data saved"),
                Err(err) => {
                    tracing::warn!(board = %board_id, version, error = %err, "failed to save board data")
                }
            },
            SyncJob::Rename {
                name,
                attempted,
                previous,
                done,
            } => {
                let result = storage.rename_board(&board_id, &attempted).await;
                if let Err(err) = &result {
                    tracing::warn!(
                        board = %board_id,
                        error = %err,
                        name = %attempted,
                        previous = %previous,
                        "failed to rename board, reverting"
                    );
                    name.rollback(&attempted, previous);
                }
                let _ = done.send(result);
            }
            SyncJob::Flush { done } => {
                let _ = done.send(());
            }
        }
    }
    tracing::trace!(board = %board_id, "sync worker stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{BoardRecord, Command};
    use crate::storage::MemoryStorage;
    use async_trait::async_trait;
    use std::time::Duration;
    use tokio::sync::Mutex;

    /// Storage whose n-th save takes longer than the (n+1)-th
    struct SlowFirstStorage {
        inner: MemoryStorage,
        remaining_delay_ms: Mutex<u64>,
    }

    #[async_trait]
    impl Storage for SlowFirstStorage {
        async fn initialize(&self) -> Result<()> {
            self.inner.initialize().await
        }

        async fn create_board(&self, name: &str) -> Result<BoardRecord> {
            self.inner.create_board(name).await
        }

        async fn list_boards(&self) -> Result<Vec<BoardRecord>> {
            self.inner.list_boards().await
        }

        async fn load_board(&self, id: &BoardId) -> Result<BoardRecord> {
            self.inner.load_board(id).await
        }

        async fn save(&self, id: &BoardId, hierarchy: &Hierarchy) -> Result<()> {
            let delay = {
                let mut remaining = self.remaining_delay_ms.lock().await;
                let delay = *remaining;
                *remaining = remaining.saturating_sub(20);
                delay
            };
            tokio::time::sleep(Duration::from_millis(delay)).await;
            self.inner.save(id, hierarchy).await
        }

        async fn rename_board(&self, id: &BoardId, name: &str) -> Result<()> {
            self.inner.rename_board(id, name).await
        }

        async fn is_initialized(&self) -> bool {
            self.inner.is_initialized().await
        }
    }

    async fn memory_board() -> (Arc<MemoryStorage>, BoardRecord) {
        let storage = Arc::new(MemoryStorage::new());
        let board = storage.create_board("A").await.unwrap();
        (storage, board)
    }

    #[tokio::test]
    async fn test_writes_land_in_enqueue_order() {
        let storage = Arc::new(SlowFirstStorage {
            inner: MemoryStorage::new(),
            remaining_delay_ms: Mutex::new(60),
        });
        let board = storage.create_board("A").await.unwrap();
        let bridge = SyncBridge::spawn(board.id, storage.clone());

        let mut snapshot = Hierarchy::default();
        let mut expected = Vec::new();
        for (version, title) in ["one", "two", "three", "four"].into_iter().enumerate() {
            snapshot = snapshot.execute(&Command::add_list(title));
            expected.push((board.id, snapshot.clone()));
            bridge.save(Arc::new(snapshot.clone()), version as u64 + 1);
        }

        bridge.flush().await.unwrap();

        assert_eq!(storage.inner.save_history().await, expected);
        let stored = storage.load_board(&board.id).await.unwrap().hierarchy();
        assert_eq!(stored.lists.len(), 4);
    }

    #[tokio::test]
    async fn test_failed_save_is_absorbed() {
        let (storage, board) = memory_board().await;
        let bridge = SyncBridge::spawn(board.id, storage.clone());

        storage.set_fail_writes(true);
        bridge.save(Arc::new(Hierarchy::default().execute(&Command::add_list("x"))), 1);
        bridge.flush().await.unwrap();
        storage.set_fail_writes(false);

        let next = Hierarchy::default().execute(&Command::add_list("y"));
        bridge.save(Arc::new(next.clone()), 2);
        bridge.flush().await.unwrap();

        assert_eq!(storage.load_board(&board.id).await.unwrap().hierarchy(), next);
    }

    #[tokio::test]
    async fn test_rename_success() {
        let (storage, board) = memory_board().await;
        let bridge = SyncBridge::spawn(board.id, storage.clone());
        let name = BoardName::new("A");

        let pending = bridge.rename(&name, "B").unwrap();
        assert_eq!(name.get(), "B");
        pending.outcome().await.unwrap();

        assert_eq!(name.get(), "B");
        assert_eq!(storage.load_board(&board.id).await.unwrap().name, "B");
    }

    #[tokio::test]
    async fn test_rename_failure_rolls_back() {
        let (storage, board) = memory_board().await;
        let bridge = SyncBridge::spawn(board.id, storage.clone());
        let name = BoardName::new("A");
        let mut changes = name.subscribe();

        storage.set_fail_writes(true);
        let pending = bridge.rename(&name, "B").unwrap();
        assert_eq!(name.get(), "B");

        assert!(pending.outcome().await.is_err());
        assert_eq!(name.get(), "A");
        assert!(changes.has_changed().unwrap());
        assert_eq!(*changes.borrow_and_update(), "A");
        assert_eq!(storage.load_board(&board.id).await.unwrap().name, "A");
    }

    #[tokio::test]
    async fn test_rollback_keeps_newer_name() {
        let name = BoardName::new("A");
        let previous = name.replace("B".to_string());
        name.replace("C".to_string());

        assert!(!name.rollback("B", previous));
        assert_eq!(name.get(), "C");
    }

    #[tokio::test]
    async fn test_rename_ignores_empty_and_unchanged_names() {
        let (storage, board) = memory_board().await;
        let bridge = SyncBridge::spawn(board.id, storage);
        let name = BoardName::new("A");

        assert!(bridge.rename(&name, "").is_none());
        assert!(bridge.rename(&name, "  ").is_none());
        assert!(bridge.rename(&name, "A").is_none());
        assert_eq!(name.get(), "A");
    }

    #[tokio::test]
    async fn test_shutdown_drains_queue() {
        let (storage, board) = memory_board().await;
        let bridge = SyncBridge::spawn(board.id, storage.clone());

        let snapshot = Hierarchy::default().execute(&Command::add_list("Todo"));
        bridge.save(Arc::new(snapshot.clone()), 1);
        bridge.shutdown().await;

        assert_eq!(storage.load_board(&board.id).await.unwrap().hierarchy(), snapshot);
    }

    #[test]
    #[should_panic]
    fn test_spawn_outside_runtime_panics() {
        let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::new());
        let _bridge = SyncBridge::spawn(BoardId::generate(), storage);
    }
}
