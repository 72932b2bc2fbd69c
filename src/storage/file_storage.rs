use crate::{
    config::{BoardwalkConfig, STORAGE_DIR},
    domain::{BoardId, BoardRecord, Hierarchy},
    error::{BoardwalkError, Result},
    storage::Storage,
};
use async_trait::async_trait;
use std::{
    path::{Path, PathBuf},
    str::FromStr,
};
use tokio::fs;

/// File-based storage: one JSON document per board
pub struct FileStorage {
    root_path: PathBuf,
    config: BoardwalkConfig,
}

impl FileStorage {
    /// Creates a new FileStorage instance for the given project root with default settings
    pub fn new(project_root: impl AsRef<Path>) -> Self {
        Self::with_config(project_root, BoardwalkConfig::default())
    }

    pub fn with_config(project_root: impl AsRef<Path>, config: BoardwalkConfig) -> Self {
        Self {
            root_path: project_root.as_ref().join(STORAGE_DIR),
            config,
        }
    }

    /// Creates a FileStorage using the project's `config.json`, if any
    pub async fn open(project_root: impl AsRef<Path>) -> Result<Self> {
        let config = BoardwalkConfig::load(project_root.as_ref()).await?;
        Ok(Self::with_config(project_root, config))
    }

    fn boards_dir(&self) -> PathBuf {
        self.root_path.join(&self.config.boards_dir)
    }

    fn board_file(&self, id: &BoardId) -> PathBuf {
        self.boards_dir().join(format!("{}.json", id))
    }

    async fn ensure_directory_exists(&self, path: &Path) -> Result<()> {
        if !path.exists() {
            fs::create_dir_all(path).await?;
        }
        Ok(())
    }

    async fn write_record(&self, record: &BoardRecord) -> Result<()> {
        self.ensure_directory_exists(&self.boards_dir()).await?;

        let json = serde_json::to_string_pretty(record)?;
        fs::write(self.board_file(&record.id), json).await?;
        Ok(())
    }

    async fn board_ids(&self) -> Result<Vec<BoardId>> {
        let boards_dir = self.boards_dir();

        if !boards_dir.exists() {
            return Ok(Vec::new());
        }

        let mut entries = fs::read_dir(&boards_dir).await?;
        let mut ids = Vec::new();

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|s| s.to_str()) == Some("json") {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    match BoardId::from_str(stem) {
                        Ok(id) => ids.push(id),
                        Err(_) => tracing::debug!(file = %path.display(), "skipping non-board file"),
                    }
                }
            }
        }

        Ok(ids)
    }
}

#[async_trait]
impl Storage for FileStorage {
    async fn initialize(&self) -> Result<()> {
        self.ensure_directory_exists(&self.root_path).await?;
        self.ensure_directory_exists(&self.boards_dir()).await?;

        if self.board_ids().await?.is_empty() {
            let board = BoardRecord::new(self.config.default_board_name.clone())?;
            self.write_record(&board).await?;
        }

        Ok(())
    }

    async fn create_board(&self, name: &str) -> Result<BoardRecord> {
        let board = BoardRecord::new(name)?;
        self.write_record(&board).await?;
        Ok(board)
    }

    async fn list_boards(&self) -> Result<Vec<BoardRecord>> {
        let mut boards = Vec::new();
        for id in self.board_ids().await? {
            boards.push(self.load_board(&id).await?);
        }

        boards.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(boards)
    }

    async fn load_board(&self, id: &BoardId) -> Result<BoardRecord> {
        let file_path = self.board_file(id);

        if !file_path.exists() {
            return Err(BoardwalkError::BoardNotFound(id.to_string()));
        }

        let contents = fs::read_to_string(&file_path).await?;
        let board: BoardRecord = serde_json::from_str(&contents)?;

        Ok(board)
    }

    async fn save(&self, id: &BoardId, hierarchy: &Hierarchy) -> Result<()> {
        let mut board = self.load_board(id).await?;
        board.set_hierarchy(hierarchy)?;
        self.write_record(&board).await
    }

    async fn rename_board(&self, id: &BoardId, name: &str) -> Result<()> {
        let mut board = self.load_board(id).await?;
        board.rename(name)?;
        self.write_record(&board).await
    }

    async fn is_initialized(&self) -> bool {
        self.root_path.exists() && self.boards_dir().exists()
    }
}
