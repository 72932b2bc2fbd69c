//! An editing session over a single board.
//!
//! The session owns the canonical snapshot and replaces it on every applied
//! command. Snapshots are shared with the sync worker as `Arc`s and never
//! modified afterwards, so a write still in flight always sees the state it
//! was queued with.

use std::sync::Arc;

use crate::domain::{
    BoardId, BoardRecord, Card, CardId, Command, DragEvent, DragPhase, DragResolver, EntityId,
    Hierarchy, ListId, ListPatch, Mutation,
};
use crate::error::Result;
use crate::storage::Storage;
use crate::sync::{BoardName, PendingWrite, SyncBridge};

/// A board being edited by one user agent
pub struct BoardSession {
    id: BoardId,
    name: BoardName,
    hierarchy: Arc<Hierarchy>,
    version: u64,
    drag: DragResolver,
    sync: SyncBridge,
}

impl BoardSession {
    /// Starts a session for an already loaded board record
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime, since the board's sync
    /// worker is spawned onto the current runtime.
    pub fn new(record: &BoardRecord, storage: Arc<dyn Storage>) -> Self {
        Self {
            id: record.id,
            name: BoardName::new(record.name.clone()),
            hierarchy: Arc::new(record.hierarchy()),
            version: 0,
            drag: DragResolver::new(),
            sync: SyncBridge::spawn(record.id, storage),
        }
    }

    /// Loads a board from storage and starts a session for it
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime; see [`BoardSession::new`].
    pub async fn open(storage: Arc<dyn Storage>, id: &BoardId) -> Result<Self> {
        let record = storage.load_board(id).await?;
        tracing::debug!(board = %id, name = %record.name, "opened board session");
        Ok(Self::new(&record, storage))
    }

    pub fn id(&self) -> &BoardId {
        &self.id
    }

    pub fn name(&self) -> String {
        self.name.get()
    }

    pub fn board_name(&self) -> &BoardName {
        &self.name
    }

    /// The canonical snapshot
    pub fn hierarchy(&self) -> &Hierarchy {
        &self.hierarchy
    }

    /// A shared handle on the canonical snapshot
    pub fn snapshot(&self) -> Arc<Hierarchy> {
        Arc::clone(&self.hierarchy)
    }

    /// Number of snapshots applied since the session started
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn active_id(&self) -> Option<&EntityId> {
        self.drag.active()
    }

    pub fn drag_phase(&self) -> DragPhase {
        self.drag.phase()
    }

    /// Applies a command; returns whether the board changed.
    ///
    /// A changed board becomes the canonical snapshot and is queued for
    /// persistence.
    pub fn apply(&mut self, command: &Command) -> bool {
        match self.hierarchy.apply(command) {
            Mutation::Applied(next) => {
                self.hierarchy = Arc::new(next);
                self.version += 1;
                self.sync.save(self.snapshot(), self.version);
                true
            }
            Mutation::NoOp => false,
        }
    }

    /// Appends a list, returning its new id
    pub fn add_list(&mut self, title: impl Into<String>) -> Option<ListId> {
        let id = ListId::generate();
        let command = Command::AddList {
            id: id.clone(),
            title: title.into(),
        };
        self.apply(&command).then_some(id)
    }

    /// Appends a card to a list, returning its new id; `None` if the list is gone
    pub fn add_card(&mut self, list_id: &ListId, title: impl Into<String>) -> Option<CardId> {
        let id = CardId::generate();
        let command = Command::AddCard {
            list_id: list_id.clone(),
            id: id.clone(),
            title: title.into(),
        };
        self.apply(&command).then_some(id)
    }

    pub fn rename_list(&mut self, list_id: &ListId, patch: ListPatch) -> bool {
        self.apply(&Command::RenameList {
            list_id: list_id.clone(),
            patch,
        })
    }

    pub fn update_card(&mut self, list_id: &ListId, card: Card) -> bool {
        self.apply(&Command::UpdateCard {
            list_id: list_id.clone(),
            card,
        })
    }

    pub fn delete_list(&mut self, list_id: &ListId) -> bool {
        self.apply(&Command::DeleteList {
            list_id: list_id.clone(),
        })
    }

    pub fn delete_card(&mut self, list_id: &ListId, card_id: &CardId) -> bool {
        self.apply(&Command::DeleteCard {
            list_id: list_id.clone(),
            card_id: card_id.clone(),
        })
    }

    pub fn reorder_cards_in_list(
        &mut self,
        list_id: &ListId,
        from_index: usize,
        to_index: usize,
    ) -> bool {
        self.apply(&Command::ReorderCardsInList {
            list_id: list_id.clone(),
            from_index,
            to_index,
        })
    }

    pub fn move_card_between_lists(
        &mut self,
        from_list_id: &ListId,
        to_list_id: &ListId,
        from_index: usize,
        to_index: usize,
    ) -> bool {
        self.apply(&Command::MoveCardBetweenLists {
            from_list_id: from_list_id.clone(),
            to_list_id: to_list_id.clone(),
            from_index,
            to_index,
        })
    }

    pub fn reorder_lists(&mut self, from_index: usize, to_index: usize) -> bool {
        self.apply(&Command::ReorderLists {
            from_index,
            to_index,
        })
    }

    /// Feeds a gesture event through the drag resolver; returns whether the board changed
    pub fn handle_drag(&mut self, event: &DragEvent) -> bool {
        match self.drag.handle(&self.hierarchy, event) {
            Some(command) => self.apply(&command),
            None => false,
        }
    }

    pub fn drag_start(&mut self, active: &str) {
        self.drag.start(active);
    }

    pub fn drag_move(&mut self, active: &str, over: Option<&str>) -> bool {
        match self.drag.drag_move(&self.hierarchy, active, over) {
            Some(command) => self.apply(&command),
            None => false,
        }
    }

    pub fn drag_end(&mut self, active: &str, over: Option<&str>) -> bool {
        match self.drag.end(&self.hierarchy, active, over) {
            Some(command) => self.apply(&command),
            None => false,
        }
    }

    /// Renames the board optimistically; see [`SyncBridge::rename`]
    pub fn rename_board(&self, name: &str) -> Option<PendingWrite> {
        self.sync.rename(&self.name, name)
    }

    /// Waits until every queued write has reached storage
    pub async fn flush(&self) -> Result<()> {
        self.sync.flush().await
    }

    /// Ends the session once all queued writes have completed
    pub async fn close(self) {
        self.sync.shutdown().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;

    async fn session() -> (Arc<MemoryStorage>, BoardSession) {
        let storage = Arc::new(MemoryStorage::new());
        let board = storage.create_board("A").await.unwrap();
        let session = BoardSession::open(storage.clone(), &board.id).await.unwrap();
        (storage, session)
    }

    #[tokio::test]
    async fn test_open_missing_board_fails() {
        let storage = Arc::new(MemoryStorage::new());
        assert!(BoardSession::open(storage, &BoardId::generate()).await.is_err());
    }

    #[tokio::test]
    async fn test_crud_persists_each_change() {
        let (storage, mut session) = session().await;

        let todo = session.add_list("Todo").unwrap();
        let card = session.add_card(&todo, "Task").unwrap();
        assert!(session.rename_list(&todo, ListPatch::title("To do")));
        assert!(session.update_card(&todo, Card::new(card.clone(), "Task!")));
        assert_eq!(session.version(), 4);

        session.flush().await.unwrap();
        let stored = storage.load_board(session.id()).await.unwrap().hierarchy();
        assert_eq!(&stored, session.hierarchy());
        assert_eq!(stored.card_title(&card), "Task!");
        assert_eq!(storage.save_history().await.len(), 4);
    }

    #[tokio::test]
    async fn test_noop_commands_are_not_persisted() {
        let (storage, mut session) = session().await;
        let todo = session.add_list("Todo").unwrap();
        let missing: ListId = "list-missing".parse().unwrap();

        assert!(session.add_card(&missing, "lost").is_none());
        assert!(!session.delete_card(&todo, &"card-missing".parse().unwrap()));
        assert!(!session.reorder_lists(0, 0));
        assert!(!session.delete_list(&missing));
        assert_eq!(session.version(), 1);

        session.flush().await.unwrap();
        assert_eq!(storage.save_history().await.len(), 1);
    }

    #[tokio::test]
    async fn test_snapshots_are_not_mutated_by_later_commands() {
        let (_storage, mut session) = session().await;
        let todo = session.add_list("Todo").unwrap();
        let before = session.snapshot();

        session.add_card(&todo, "Task").unwrap();
        session.delete_list(&todo);

        assert_eq!(before.lists.len(), 1);
        assert!(before.lists[0].cards.is_empty());
        assert!(session.hierarchy().lists.is_empty());
    }

    #[tokio::test]
    async fn test_drag_moves_card_and_clears_active() {
        let (storage, mut session) = session().await;
        let todo = session.add_list("Todo").unwrap();
        let done = session.add_list("Done").unwrap();
        let first = session.add_card(&todo, "one").unwrap();
        let second = session.add_card(&todo, "two").unwrap();

        session.drag_start(first.as_str());
        assert_eq!(session.drag_phase(), DragPhase::Dragging);

        assert!(session.drag_move(first.as_str(), Some(second.as_str())));
        assert_eq!(session.hierarchy().list_cards(&todo)[1].id, first);

        assert!(session.drag_move(first.as_str(), Some(done.as_str())));
        assert!(!session.drag_move(first.as_str(), Some(first.as_str())));
        assert!(!session.drag_end(first.as_str(), None));

        assert!(session.active_id().is_none());
        assert_eq!(session.hierarchy().list_cards(&done)[0].id, first);
        assert_eq!(session.hierarchy().list_cards(&todo).len(), 1);

        session.flush().await.unwrap();
        let stored = storage.load_board(session.id()).await.unwrap().hierarchy();
        assert_eq!(&stored, session.hierarchy());
    }

    #[tokio::test]
    async fn test_handle_drag_reorders_lists_on_drop() {
        let (_storage, mut session) = session().await;
        let a = session.add_list("A").unwrap();
        let b = session.add_list("B").unwrap();

        session.handle_drag(&DragEvent::Start {
            active: b.to_string(),
        });
        assert!(!session.handle_drag(&DragEvent::Move {
            active: b.to_string(),
            over: Some(a.to_string()),
        }));
        assert!(session.handle_drag(&DragEvent::End {
            active: b.to_string(),
            over: Some(a.to_string()),
        }));

        assert_eq!(session.hierarchy().lists[0].id, b);
        assert_eq!(session.drag_phase(), DragPhase::Idle);
    }

    #[tokio::test]
    async fn test_rename_board_rolls_back_on_failure() {
        let (storage, session) = session().await;

        storage.set_fail_writes(true);
        let pending = session.rename_board("B").unwrap();
        assert_eq!(session.name(), "B");
        assert!(pending.outcome().await.is_err());
        assert_eq!(session.name(), "A");

        storage.set_fail_writes(false);
        session.rename_board("C").unwrap().outcome().await.unwrap();
        assert_eq!(session.name(), "C");
        assert_eq!(storage.load_board(session.id()).await.unwrap().name, "C");
    }

    #[tokio::test]
    async fn test_close_drains_pending_writes() {
        let (storage, mut session) = session().await;
        session.add_list("Todo").unwrap();
        let expected = session.snapshot();
        let id = *session.id();

        session.close().await;

        let stored = storage.load_board(&id).await.unwrap().hierarchy();
        assert_eq!(stored, *expected);
    }
}
