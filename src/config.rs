use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::error::{BoardwalkError, Result};

/// Directory, relative to the project root, holding all board state
pub const STORAGE_DIR: &str = ".boardwalk";

const CONFIG_FILE: &str = "config.json";

/// Workspace configuration, read from `.boardwalk/config.json`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoardwalkConfig {
    /// Name given to the board created when storage is first initialized
    pub default_board_name: String,
    /// Sub-directory of the storage directory holding one file per board
    pub boards_dir: String,
}

impl Default for BoardwalkConfig {
    fn default() -> Self {
        Self {
            default_board_name: "Untitled Board".to_string(),
            boards_dir: "boards".to_string(),
        }
    }
}

impl BoardwalkConfig {
    pub fn path(project_root: impl AsRef<Path>) -> PathBuf {
        project_root.as_ref().join(STORAGE_DIR).join(CONFIG_FILE)
    }

    /// Loads the configuration for a project, falling back to defaults when
    /// no config file exists
    pub async fn load(project_root: impl AsRef<Path>) -> Result<Self> {
        let path = Self::path(project_root);
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)
            .await
            .map_err(|err| BoardwalkError::ConfigError(format!("{}: {}", path.display(), err)))?;
        let config: Self = serde_json::from_str(&contents)
            .map_err(|err| BoardwalkError::ConfigError(format!("{}: {}", path.display(), err)))?;

        if config.default_board_name.trim().is_empty() {
            return Err(BoardwalkError::ConfigError(
                "default_board_name must not be empty".to_string(),
            ));
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn write_config(root: &Path, contents: &str) {
        let path = BoardwalkConfig::path(root);
        fs::create_dir_all(path.parent().unwrap()).await.unwrap();
        fs::write(path, contents).await.unwrap();
    }

    #[tokio::test]
    async fn test_missing_config_uses_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config = BoardwalkConfig::load(temp_dir.path()).await.unwrap();
        assert_eq!(config, BoardwalkConfig::default());
    }

    #[test]
    fn test_config_lives_in_storage_dir() {
        let path = BoardwalkConfig::path("/work");
        assert_eq!(path, Path::new("/work").join(".boardwalk").join("config.json"));
        assert_eq!(BoardwalkConfig::default().boards_dir, "boards");
    }

    #[tokio::test]
    async fn test_partial_config_fills_defaults() {
        let temp_dir = TempDir::new().unwrap();
        write_config(temp_dir.path(), r#"{"default_board_name":"Roadmap"}"#).await;

        let config = BoardwalkConfig::load(temp_dir.path()).await.unwrap();
        assert_eq!(config.default_board_name, "Roadmap");
        assert_eq!(config.boards_dir, "boards");
    }

    #[tokio::test]
    async fn test_malformed_config_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        write_config(temp_dir.path(), "{ nope").await;
        assert!(matches!(
            BoardwalkConfig::load(temp_dir.path()).await,
            Err(BoardwalkError::ConfigError(_))
        ));

        write_config(temp_dir.path(), r#"{"default_board_name":""}"#).await;
        assert!(BoardwalkConfig::load(temp_dir.path()).await.is_err());
    }
}
