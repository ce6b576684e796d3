//! Flat-file persistence: one cursor file per board, one file per article.

use std::io;
use std::path::Path;
use tokio::io::AsyncWriteExt;

pub mod cursor_store;
pub mod result_store;

#[cfg(test)]
mod tests;

pub use cursor_store::CursorStore;
pub use result_store::{ArchivedEntry, ResultStore, WriteSummary};

/// Replace `target` with `bytes` so readers see either the old or the new
/// contents, never a prefix.
///
/// The temp file lives next to the target so the final rename stays on one
/// filesystem.
pub(crate) async fn write_atomic(target: &Path, bytes: &[u8]) -> io::Result<()> {
    let file_name = target
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("entry");
    let temp_file = target.with_file_name(format!(".{}.{}.tmp", file_name, uuid::Uuid::new_v4()));

    let result = async {
        let mut file = tokio::fs::OpenOptions::new()
            .create_new(true)
            .write(true)
            .open(&temp_file)
            .await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        file.sync_all().await?;
        drop(file);

        tokio::fs::rename(&temp_file, target).await
    }
    .await;

    if result.is_err() {
        let _ = tokio::fs::remove_file(&temp_file).await;
    }
    result
}

/// Letters (CJK included), digits, `.`, `-` and `_` are kept; every other
/// character becomes `_`. Leading dots are dropped.
pub(crate) fn sanitize_file_stem(raw: &str) -> String {
    let cleaned: String = raw
        .trim()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.').to_string();
    if cleaned.is_empty() {
        "_".to_string()
    } else {
        cleaned
    }
}
