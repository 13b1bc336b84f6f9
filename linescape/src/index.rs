//! Repository file index: which file owns which range of line positions.
//!
//! The index is produced by the server for one resolved commit and lists every
//! file in line order. Entries are contiguous: each `line_offset` equals the
//! previous entry's `line_offset + line_count`.

use serde::{Deserialize, Serialize};

use crate::coord::LinePosition;

/// One file of the indexed snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexEntry {
    pub path: String,
    pub line_offset: u64,
    pub line_count: u64,
    /// Content hash used to fetch the file's outline bitmask.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
}

impl IndexEntry {
    /// One past the last line position of the file, clamped to `u64::MAX`.
    pub fn line_end(&self) -> u64 {
        self.line_offset.saturating_add(self.line_count)
    }

    pub fn contains_line(&self, line: LinePosition) -> bool {
        line >= self.line_offset && line < self.line_end()
    }
}

/// Wire shape of the index document; `entries` is `null` for empty repositories.
#[derive(Debug, Clone, Default, Deserialize)]
struct IndexDocument {
    entries: Option<Vec<IndexEntry>>,
}

/// Ordered file index supporting line lookups.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileIndex {
    entries: Vec<IndexEntry>,
}

impl FileIndex {
    /// Builds an index, sorting entries by line offset.
    pub fn new(mut entries: Vec<IndexEntry>) -> Self {
        entries.sort_by_key(|e| e.line_offset);
        Self { entries }
    }

    /// Parses the server's `{"entries": [...]}` index document.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let doc: IndexDocument = serde_json::from_str(json)?;
        Ok(Self::new(doc.entries.unwrap_or_default()))
    }

    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Total number of indexed lines.
    pub fn line_count(&self) -> u64 {
        self.entries.last().map(IndexEntry::line_end).unwrap_or(0)
    }

    /// Finds the entry owning `line`, if any.
    pub fn entry_for_line(&self, line: LinePosition) -> Option<&IndexEntry> {
        let idx = self.entries.partition_point(|e| e.line_offset <= line);
        let entry = self.entries.get(idx.checked_sub(1)?)?;
        entry.contains_line(line).then_some(entry)
    }

    /// Finds an entry by its repository path.
    pub fn entry_for_path(&self, path: &str) -> Option<&IndexEntry> {
        self.entries.iter().find(|e| e.path == path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(path: &str, offset: u64, count: u64) -> IndexEntry {
        IndexEntry {
            path: path.to_string(),
            line_offset: offset,
            line_count: count,
            hash: None,
        }
    }

    fn sample() -> FileIndex {
        FileIndex::new(vec![
            entry("src/main.rs", 0, 10),
            entry("README.md", 10, 5),
            entry("Cargo.toml", 15, 20),
        ])
    }

    #[test]
    fn test_entry_for_line_boundaries() {
        let index = sample();
        assert_eq!(index.entry_for_line(0).map(|e| e.path.as_str()), Some("src/main.rs"));
        assert_eq!(index.entry_for_line(9).map(|e| e.path.as_str()), Some("src/main.rs"));
        assert_eq!(index.entry_for_line(10).map(|e| e.path.as_str()), Some("README.md"));
        assert_eq!(index.entry_for_line(34).map(|e| e.path.as_str()), Some("Cargo.toml"));
        assert!(index.entry_for_line(35).is_none());
    }

    #[test]
    fn test_empty_file_owns_no_lines() {
        let index = FileIndex::new(vec![entry("a", 0, 3), entry("empty", 3, 0), entry("b", 3, 2)]);
        assert_eq!(index.entry_for_line(3).map(|e| e.path.as_str()), Some("b"));
    }

    #[test]
    fn test_line_count_uses_last_entry() {
        assert_eq!(sample().line_count(), 35);
        assert_eq!(FileIndex::default().line_count(), 0);
    }

    #[test]
    fn test_from_json_camel_case() {
        let json = r#"{"entries":[
            {"path":"a.rs","lineOffset":0,"lineCount":4,"hash":"abc"},
            {"path":"b.rs","lineOffset":4,"lineCount":2}
        ]}"#;
        let index = FileIndex::from_json(json).unwrap();
        assert_eq!(index.len(), 2);
        assert_eq!(index.entries()[0].hash.as_deref(), Some("abc"));
        assert_eq!(index.entry_for_path("b.rs").map(|e| e.line_end()), Some(6));
    }

    #[test]
    fn test_line_end_saturates_on_huge_entries() {
        let json = format!(
            r#"{{"entries":[{{"path":"huge","lineOffset":{},"lineCount":{}}}]}}"#,
            u64::MAX - 1,
            u64::MAX
        );
        let index = FileIndex::from_json(&json).unwrap();
        assert_eq!(index.line_count(), u64::MAX);
        assert_eq!(index.entry_for_line(u64::MAX - 1).map(|e| e.path.as_str()), Some("huge"));
    }

    #[test]
    fn test_from_json_null_entries() {
        let index = FileIndex::from_json(r#"{"entries":null}"#).unwrap();
        assert!(index.is_empty());
    }
}
