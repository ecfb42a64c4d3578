//!
//! datashelf resolver module
//! -------------------------
//! This module implements metadata resolution over the managed file tree.
//! A `Shelf` is anchored at a configured storage root and resolves logical
//! paths like `experiments/run7/results.csv` into classified `FileEntry`
//! records, rejecting any path that climbs above the root.
//!
//! Key responsibilities:
//! - Logical-path normalization and the traversal guard.
//! - Stat + extension classification + supported_views assembly.
//! - Eager CSV profiling in full resolutions; abbreviated (child) mode skips
//!   it so a directory listing never pays O(file size) per CSV child.
//! - Directory listings (see `listing`), attached only on explicit request.
//!
//! Everything is computed fresh per request; the `Shelf` itself is read-only
//! after construction and is shared across request tasks via `Arc`.

use std::path::{Path, PathBuf};

use crate::codec::PathCodec;
use crate::entry::{classify, initial_metadata, supported_views, EntryStatus, EntryType, FileEntry};
use crate::error::{AppError, AppResult};
use crate::tabular;

mod listing;
pub use listing::ListOrder;

/// Resolution depth. Abbreviated is used for children inside a directory
/// listing: it skips CSV profiling entirely and never expands children.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ResolveMode {
    Full,
    Abbreviated,
}

/// Read-only handle over the managed tree.
#[derive(Clone)]
pub struct Shelf {
    root: PathBuf,
    codec: PathCodec,
    order: ListOrder,
}

impl Shelf {
    pub fn new(root: impl Into<PathBuf>, codec: PathCodec) -> Self {
        Shelf { root: root.into(), codec, order: ListOrder::DirectoriesFirst }
    }

    /// Select the listing order policy. One policy per deployment; the
    /// default is directories-first.
    pub fn with_order(mut self, order: ListOrder) -> Self {
        self.order = order;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn codec(&self) -> &PathCodec {
        &self.codec
    }

    pub(crate) fn order(&self) -> ListOrder {
        self.order
    }

    /// Normalize a logical path and anchor it under the storage root.
    /// Returns the normalized root-relative path (empty for the root itself)
    /// together with the real filesystem path.
    pub fn locate(&self, logical: &str) -> AppResult<(String, PathBuf)> {
        let normalized = normalize(logical)?;
        let full = if normalized.is_empty() { self.root.clone() } else { self.root.join(&normalized) };
        Ok((normalized, full))
    }

    /// Resolve one logical path into a `FileEntry`.
    ///
    /// `include_children` attaches the ordered directory listing and is
    /// honored only on directories; children are never populated implicitly.
    pub async fn resolve(&self, logical: &str, include_children: bool) -> AppResult<FileEntry> {
        let mut entry = self.resolve_entry(logical, ResolveMode::Full).await?;
        if include_children && entry.entry_type == EntryType::Directory {
            let (_, full) = self.locate(logical)?;
            entry.children = Some(self.list(&entry.file_path, &full).await?);
        }
        Ok(entry)
    }

    /// Stat, classify and assemble one entry. No children at this level.
    pub(crate) async fn resolve_entry(&self, logical: &str, mode: ResolveMode) -> AppResult<FileEntry> {
        let (normalized, full) = self.locate(logical)?;
        let md = tokio::fs::metadata(&full)
            .await
            .map_err(|e| AppError::from_fs(&e, &normalized))?;

        let file_name = normalized.rsplit('/').next().unwrap_or("").to_string();
        let entry_type = classify(&file_name, md.is_dir());

        // Full resolutions profile CSVs eagerly; abbreviated ones leave the
        // tabular view as a null placeholder.
        let profile = match (entry_type, mode) {
            (EntryType::Tabular, ResolveMode::Full) => Some(tabular::profile(&full).await?),
            _ => None,
        };

        // The root itself carries no identifier; every other path encodes.
        let id = if normalized.is_empty() {
            String::new()
        } else {
            self.codec.encode(&normalized)?
        };

        Ok(FileEntry {
            file_name,
            id,
            supported_views: supported_views(entry_type, md.len(), profile.as_ref()),
            entry_type,
            metadata: initial_metadata(),
            status: EntryStatus::Ready,
            children: None,
            file_path: normalized,
        })
    }
}

/// Normalize a logical path: backslashes become slashes, empty and `.`
/// components drop, `..` pops. Popping past the root is a traversal error.
fn normalize(logical: &str) -> AppResult<String> {
    let cleaned = logical.replace('\\', "/");
    let mut parts: Vec<&str> = Vec::new();
    for comp in cleaned.split('/') {
        match comp {
            "" | "." => {}
            ".." => {
                if parts.pop().is_none() {
                    return Err(AppError::traversal("path_escape", "path resolves above the storage root"));
                }
            }
            c => {
                if c.contains('\0') {
                    return Err(AppError::user("nul_in_path", "path contains a NUL byte"));
                }
                parts.push(c);
            }
        }
    }
    Ok(parts.join("/"))
}
