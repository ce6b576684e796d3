use crate::{sanitize_file_stem, write_atomic};
use boardwatch_core::{
    ArchiveError, CoreError, ErrorRecovery, ErrorReporter, ExtractedArticle, FailureContext,
};
use chrono::{DateTime, Local};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// One file in the archive directory, as shown in listings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchivedEntry {
    pub name: String,
    pub modified: DateTime<Local>,
    pub size: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteSummary {
    pub written: usize,
    pub failed: usize,
}

/// Owns the article files: one pretty-printed JSON file per article, keyed by
/// board and title. Writing the same key again replaces the file.
#[derive(Debug, Clone)]
pub struct ResultStore {
    dir: PathBuf,
}

impl ResultStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn file_name_for(article: &ExtractedArticle) -> String {
        format!(
            "{}_{}.json",
            sanitize_file_stem(&article.board),
            sanitize_file_stem(&article.title)
        )
    }

    pub async fn write(&self, article: &ExtractedArticle) -> Result<PathBuf, ArchiveError> {
        let bytes =
            serde_json::to_vec_pretty(article).map_err(|e| ArchiveError::SerializeFailed {
                title: article.title.clone(),
                source: e,
            })?;

        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| ArchiveError::WriteFailed {
                title: article.title.clone(),
                source: e,
            })?;

        let path = self.dir.join(Self::file_name_for(article));
        write_atomic(&path, &bytes)
            .await
            .map_err(|e| ArchiveError::WriteFailed {
                title: article.title.clone(),
                source: e,
            })?;
        debug!(path = %path.display(), "Archived article");
        Ok(path)
    }

    /// Write every article; a failed write is reported and the rest continue.
    pub async fn write_all(
        &self,
        articles: &[ExtractedArticle],
        reporter: &ErrorReporter,
    ) -> WriteSummary {
        let mut summary = WriteSummary::default();
        for article in articles {
            match self.write(article).await {
                Ok(_) => summary.written += 1,
                Err(e) => {
                    summary.failed += 1;
                    ErrorRecovery::handle(
                        reporter,
                        &CoreError::Archive(e),
                        FailureContext::ArticleWrite,
                    );
                }
            }
        }
        info!(
            dir = %self.dir.display(),
            written = summary.written,
            failed = summary.failed,
            "Archived articles"
        );
        summary
    }

    /// All archived articles, least recently modified first.
    pub async fn list(&self) -> Result<Vec<ArchivedEntry>, ArchiveError> {
        let list_error = |e: std::io::Error| ArchiveError::ListFailed {
            path: self.dir.display().to_string(),
            source: e,
        };

        let mut read_dir = match tokio::fs::read_dir(&self.dir).await {
            Ok(read_dir) => read_dir,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(list_error(e)),
        };

        let mut entries = Vec::new();
        while let Some(entry) = read_dir.next_entry().await.map_err(list_error)? {
            let name = entry.file_name().to_string_lossy().into_owned();
            // Skip in-flight temp files and anything that is not an article
            if name.starts_with('.') || !name.ends_with(".json") {
                continue;
            }
            let metadata = entry.metadata().await.map_err(list_error)?;
            if !metadata.is_file() {
                continue;
            }
            let modified = metadata.modified().map_err(list_error)?;
            entries.push(ArchivedEntry {
                name,
                modified: DateTime::<Local>::from(modified),
                size: metadata.len(),
            });
        }

        entries.sort_by(|a, b| a.modified.cmp(&b.modified).then_with(|| a.name.cmp(&b.name)));
        Ok(entries)
    }

    pub async fn read(&self, name: &str) -> Result<ExtractedArticle, ArchiveError> {
        let path = self.resolve(name)?;
        let text = tokio::fs::read_to_string(&path).await.map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                ArchiveError::NotFound {
                    name: name.to_string(),
                }
            } else {
                ArchiveError::ReadFailed {
                    name: name.to_string(),
                    source: e,
                }
            }
        })?;
        serde_json::from_str(&text).map_err(|e| ArchiveError::Corrupt {
            name: name.to_string(),
            source: e,
        })
    }

    pub async fn delete(&self, name: &str) -> Result<(), ArchiveError> {
        let path = self.resolve(name)?;
        tokio::fs::remove_file(&path).await.map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                ArchiveError::NotFound {
                    name: name.to_string(),
                }
            } else {
                ArchiveError::DeleteFailed {
                    name: name.to_string(),
                    source: e,
                }
            }
        })?;
        info!(name, "Deleted archived article");
        Ok(())
    }

    /// Map a listing name back to a path inside the archive directory.
    fn resolve(&self, name: &str) -> Result<PathBuf, ArchiveError> {
        let invalid = name.is_empty()
            || name.starts_with('.')
            || name.contains(['/', '\\'])
            || !name.ends_with(".json");
        if invalid {
            return Err(ArchiveError::InvalidName {
                name: name.to_string(),
            });
        }
        Ok(self.dir.join(name))
    }
}
