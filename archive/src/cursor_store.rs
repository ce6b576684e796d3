use crate::{sanitize_file_stem, write_atomic};
use boardwatch_core::{Cursor, CursorError};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Owns the per-board cursor files under one directory.
#[derive(Debug, Clone)]
pub struct CursorStore {
    dir: PathBuf,
}

impl CursorStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn cursor_path(&self, board: &str) -> PathBuf {
        self.dir.join(format!("{}.json", sanitize_file_stem(board)))
    }

    /// Read the board's cursor.
    ///
    /// `CursorError::NotFound` is returned only when the board has no cursor
    /// file, or the file is blank (left behind by an interrupted first run).
    /// Anything unreadable or unparseable is an error, never "no history".
    pub async fn load(&self, board: &str) -> Result<Cursor, CursorError> {
        let path = self.cursor_path(board);
        let text = match tokio::fs::read_to_string(&path).await {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(CursorError::NotFound {
                    board: board.to_string(),
                })
            }
            Err(e) => {
                return Err(CursorError::Read {
                    board: board.to_string(),
                    source: e,
                })
            }
        };

        if text.trim().is_empty() {
            return Err(CursorError::NotFound {
                board: board.to_string(),
            });
        }

        let cursor: Cursor = serde_json::from_str(&text).map_err(|e| CursorError::Corrupt {
            board: board.to_string(),
            source: e,
        })?;
        debug!(board, references = cursor.len(), "Loaded cursor");
        Ok(cursor)
    }

    /// Atomically replace the board's cursor.
    pub async fn save(&self, board: &str, cursor: &Cursor) -> Result<(), CursorError> {
        let bytes = serde_json::to_vec_pretty(cursor).map_err(|e| CursorError::Write {
            board: board.to_string(),
            source: e.into(),
        })?;

        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| CursorError::Write {
                board: board.to_string(),
                source: e,
            })?;

        write_atomic(&self.cursor_path(board), &bytes)
            .await
            .map_err(|e| CursorError::Write {
                board: board.to_string(),
                source: e,
            })?;
        debug!(board, references = cursor.len(), "Saved cursor");
        Ok(())
    }
}
