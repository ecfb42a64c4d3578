//! FileEntry data model.
//!
//! One `FileEntry` describes a single file or directory in the managed tree:
//! its normalized logical path, opaque identifier, classification, the views
//! it supports, and (on explicit request only) its children. Entries are
//! computed fresh per request; nothing here persists.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::tabular::CsvProfile;

/// Classification of an entry, a pure function of the fixed extension table
/// plus the directory flag (the directory flag always wins).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryType {
    Directory,
    Tabular,
    ScalableImage,
    File,
}

/// Lifecycle status. Uploading/preprocessing are produced by the upload
/// pipeline, which sits outside this core; resolution always yields Ready.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryStatus {
    Ready,
    Uploading,
    Preprocessing,
}

/// Wire-shape metadata record for one file or directory.
///
/// Field names and order are part of the external contract; `children` is
/// omitted entirely unless explicitly requested on a directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileEntry {
    pub file_path: String,
    pub file_name: String,
    pub id: String,
    pub supported_views: Map<String, Value>,
    #[serde(rename = "type")]
    pub entry_type: EntryType,
    pub metadata: Value,
    pub status: EntryStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<FileEntry>>,
}

/// Classify a name against the fixed extension table. Matching is
/// case-insensitive; a directory classifies as Directory regardless of name.
pub fn classify(file_name: &str, is_dir: bool) -> EntryType {
    if is_dir {
        return EntryType::Directory;
    }
    let ext = file_name.rsplit_once('.').map(|(_, e)| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("csv") => EntryType::Tabular,
        Some("png") | Some("jpg") | Some("dzi") => EntryType::ScalableImage,
        _ => EntryType::File,
    }
}

/// Build the supported_views mapping for an entry.
///
/// Every entry carries a `raw` view sized to byte length. Tabular entries
/// additionally carry a `tabular` view: the profile descriptor when one was
/// computed, a null placeholder in abbreviated (child) resolutions.
/// Scalable images carry a null `scalable_image` placeholder; tiling is
/// served elsewhere.
pub fn supported_views(entry_type: EntryType, size: u64, profile: Option<&CsvProfile>) -> Map<String, Value> {
    let mut views = Map::new();
    views.insert("raw".to_string(), json!({ "size": size }));
    match entry_type {
        EntryType::Tabular => {
            let descriptor = match profile {
                Some(p) => serde_json::to_value(p).unwrap_or(Value::Null),
                None => Value::Null,
            };
            views.insert("tabular".to_string(), descriptor);
        }
        EntryType::ScalableImage => {
            views.insert("scalable_image".to_string(), Value::Null);
        }
        EntryType::Directory | EntryType::File => {}
    }
    views
}

/// Fixed initial metadata shape carried by every entry.
pub fn initial_metadata() -> Value {
    json!({ "version": 1, "namespaces": {} })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_table() {
        assert_eq!(classify("data.csv", false), EntryType::Tabular);
        assert_eq!(classify("DATA.CSV", false), EntryType::Tabular);
        assert_eq!(classify("scan.png", false), EntryType::ScalableImage);
        assert_eq!(classify("scan.jpg", false), EntryType::ScalableImage);
        assert_eq!(classify("slide.dzi", false), EntryType::ScalableImage);
        assert_eq!(classify("notes.txt", false), EntryType::File);
        assert_eq!(classify("no_extension", false), EntryType::File);
        assert_eq!(classify(".hidden", false), EntryType::File);
    }

    #[test]
    fn directory_flag_wins() {
        assert_eq!(classify("looks_like.csv", true), EntryType::Directory);
        assert_eq!(classify("image.png", true), EntryType::Directory);
    }

    #[test]
    fn views_always_carry_raw() {
        let v = supported_views(EntryType::File, 42, None);
        assert_eq!(v.get("raw").unwrap(), &json!({ "size": 42 }));
        assert_eq!(v.len(), 1);
    }

    #[test]
    fn tabular_placeholder_until_profiled() {
        let v = supported_views(EntryType::Tabular, 10, None);
        assert!(v.get("tabular").unwrap().is_null());
        let v = supported_views(EntryType::ScalableImage, 10, None);
        assert!(v.get("scalable_image").unwrap().is_null());
    }

    #[test]
    fn wire_field_names() {
        let entry = FileEntry {
            file_path: "a/b.csv".into(),
            file_name: "b.csv".into(),
            id: "00ff".into(),
            supported_views: supported_views(EntryType::Tabular, 3, None),
            entry_type: EntryType::Tabular,
            metadata: initial_metadata(),
            status: EntryStatus::Ready,
            children: None,
        };
        let v = serde_json::to_value(&entry).unwrap();
        assert_eq!(v["type"], "tabular");
        assert_eq!(v["status"], "ready");
        assert_eq!(v["metadata"], json!({ "version": 1, "namespaces": {} }));
        assert!(v.get("children").is_none());
        for key in ["file_path", "file_name", "id", "supported_views"] {
            assert!(v.get(key).is_some(), "missing field {}", key);
        }
    }
}
