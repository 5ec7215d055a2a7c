//! File-system side of the integration
//!
//! Reference-data extracts arrive as XML files in per-kind source
//! directories and are moved to success or fail directories once processed.
//! Export files are written to per-scenario output directories.

pub mod xml;

pub use xml::{parse_records, read_records, render_records, write_records};

use crate::domain::{FormbridgeError, Result};
use std::path::{Path, PathBuf};

/// Create `dir` and its parents if missing
pub async fn ensure_dir(dir: &Path) -> Result<()> {
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| FormbridgeError::Io(format!("{}: {e}", dir.display())))
}

/// Regular files directly inside `dir`, sorted by name
pub async fn list_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut entries = tokio::fs::read_dir(dir)
        .await
        .map_err(|e| FormbridgeError::Io(format!("{}: {e}", dir.display())))?;

    let mut files = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        if entry.file_type().await?.is_file() {
            files.push(entry.path());
        }
    }
    files.sort();
    Ok(files)
}

/// Move `file` into `dest_dir`, replacing a file of the same name
pub async fn move_into(file: &Path, dest_dir: &Path) -> Result<PathBuf> {
    let name = file
        .file_name()
        .ok_or_else(|| FormbridgeError::Io(format!("{} has no file name", file.display())))?;
    let dest = dest_dir.join(name);

    if tokio::fs::try_exists(&dest).await? {
        tokio::fs::remove_file(&dest).await?;
    }
    if tokio::fs::rename(file, &dest).await.is_err() {
        // Different file systems: copy then remove
        tokio::fs::copy(file, &dest).await?;
        tokio::fs::remove_file(file).await?;
    }
    Ok(dest)
}
