//! Directory listings.
//!
//! Immediate children only: names are enumerated, dot-prefixed names are
//! dropped, and the rest resolve concurrently in abbreviated mode. A child
//! whose resolution fails is logged and omitted rather than failing the
//! whole listing. The fan-out imposes no ordering; only the final stable
//! sort does, so repeated listings of an unchanged directory are identical.

use std::path::Path;

use futures_util::future::join_all;
use tracing::warn;

use crate::entry::{EntryType, FileEntry};
use crate::error::{AppError, AppResult};

use super::{ResolveMode, Shelf};

/// Listing order policy, fixed per `Shelf`. Secondary key in either policy
/// is case-sensitive byte-wise order on `file_name`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListOrder {
    /// Directories rank before non-directories, then name order. Default.
    DirectoriesFirst,
    /// Pure name order with no directory grouping.
    Alphabetical,
}

impl Shelf {
    /// List the immediate children of `dir` as abbreviated entries.
    pub(crate) async fn list(&self, parent: &str, dir: &Path) -> AppResult<Vec<FileEntry>> {
        let mut read_dir = tokio::fs::read_dir(dir)
            .await
            .map_err(|e| AppError::from_fs(&e, parent))?;

        let mut names: Vec<String> = Vec::new();
        while let Some(dirent) = read_dir
            .next_entry()
            .await
            .map_err(|e| AppError::from_fs(&e, parent))?
        {
            let name = dirent.file_name().to_string_lossy().to_string();
            if name.starts_with('.') {
                continue;
            }
            names.push(name);
        }

        let resolutions = names.into_iter().map(|name| {
            let child = if parent.is_empty() { name.clone() } else { format!("{}/{}", parent, name) };
            async move {
                let resolved = self.resolve_entry(&child, ResolveMode::Abbreviated).await;
                (name, resolved)
            }
        });

        let mut entries: Vec<FileEntry> = Vec::new();
        for (name, resolved) in join_all(resolutions).await {
            match resolved {
                Ok(entry) => entries.push(entry),
                // Partial-success policy: one bad child never fails the listing.
                Err(e) => warn!("dropping child '{}' from listing of '{}': {}", name, parent, e),
            }
        }

        // Vec::sort_by is stable, so unchanged directories list identically.
        match self.order() {
            ListOrder::DirectoriesFirst => entries.sort_by(|a, b| {
                let a_dir = a.entry_type == EntryType::Directory;
                let b_dir = b.entry_type == EntryType::Directory;
                b_dir.cmp(&a_dir).then_with(|| a.file_name.cmp(&b.file_name))
            }),
            ListOrder::Alphabetical => entries.sort_by(|a, b| a.file_name.cmp(&b.file_name)),
        }
        Ok(entries)
    }
}
