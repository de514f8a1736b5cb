use serde::Deserialize;
use serde::de::{self, Deserializer, MapAccess, Visitor};
use std::collections::HashSet;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// The table compiled into the crate
pub(crate) const BUNDLED_TABLE: &str = include_str!("../data/mime_types.json");

/// One row of the table: a MIME type and its ordered extensions.
/// The first extension is the canonical one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub mime_type: String,
    pub extensions: Vec<String>,
}

/// Rows in the order the resource lists them
#[derive(Debug, Clone)]
pub struct MimeTable {
    entries: Vec<Entry>,
}

impl MimeTable {
    /// Parse a table from its JSON text
    pub fn from_json(json: &str) -> Result<Self, TableError> {
        serde_json::from_str(json).map_err(|e| TableError::Malformed(Arc::new(e)))
    }

    /// Read and parse a table from a JSON file
    pub fn from_path(path: &Path) -> Result<Self, TableError> {
        let json = std::fs::read_to_string(path).map_err(|e| TableError::Read {
            path: path.to_path_buf(),
            source: Arc::new(e),
        })?;
        Self::from_json(&json)
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<Entry> {
        self.entries
    }
}

/// Values are either a single extension or a list of them
#[derive(Deserialize)]
#[serde(untagged)]
enum Extensions {
    One(String),
    Many(Vec<String>),
}

impl From<Extensions> for Vec<String> {
    fn from(value: Extensions) -> Self {
        match value {
            Extensions::One(ext) => vec![ext],
            Extensions::Many(exts) => exts,
        }
    }
}

struct TableVisitor;

impl<'de> Visitor<'de> for TableVisitor {
    type Value = MimeTable;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an object mapping MIME types to an extension or a list of extensions")
    }

    // Walks the map by hand so the resource's key order survives.
    fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
        let mut seen = HashSet::new();

        while let Some((mime_type, extensions)) = map.next_entry::<String, Extensions>()? {
            if !seen.insert(mime_type.clone()) {
                return Err(de::Error::custom(format!(
                    "duplicate MIME type {mime_type:?}"
                )));
            }

            let extensions: Vec<String> = extensions.into();
            if extensions.is_empty() {
                return Err(de::Error::custom(format!(
                    "MIME type {mime_type:?} has no extensions"
                )));
            }

            entries.push(Entry {
                mime_type,
                extensions,
            });
        }

        Ok(MimeTable { entries })
    }
}

impl<'de> Deserialize<'de> for MimeTable {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_map(TableVisitor)
    }
}

/// The table resource could not be loaded. Cloneable so a cached failure
/// can be handed to every caller.
#[derive(Debug, Clone, thiserror::Error)]
pub enum TableError {
    #[error("Failed to read MIME table {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: Arc<io::Error>,
    },

    #[error("Malformed MIME table: {0}")]
    Malformed(#[source] Arc<serde_json::Error>),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_single_and_list_values() {
        let table = MimeTable::from_json(r#"{"a/b": "x", "c/d": ["y", "z"]}"#).unwrap();
        let entries = table.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].mime_type, "a/b");
        assert_eq!(entries[0].extensions, vec!["x"]);
        assert_eq!(entries[1].extensions, vec!["y", "z"]);
    }

    #[test]
    fn test_key_order_is_preserved() {
        let table = MimeTable::from_json(r#"{"z/z": "a", "a/a": "b", "m/m": "c"}"#).unwrap();
        let types: Vec<_> = table.entries().iter().map(|e| e.mime_type.as_str()).collect();
        assert_eq!(types, vec!["z/z", "a/a", "m/m"]);
    }

    #[test]
    fn test_mixed_case_kept_verbatim() {
        let table = MimeTable::from_json(r#"{"a/b": ["Foo", "bar"]}"#).unwrap();
        assert_eq!(table.entries()[0].extensions, vec!["Foo", "bar"]);
    }

    #[test]
    fn test_rejects_malformed_json() {
        let result = MimeTable::from_json(r#"{"a/b": "x""#);
        assert!(matches!(result, Err(TableError::Malformed(_))));

        let result = MimeTable::from_json(r#"["a/b", "x"]"#);
        assert!(matches!(result, Err(TableError::Malformed(_))));

        let result = MimeTable::from_json(r#"{"a/b": 5}"#);
        assert!(matches!(result, Err(TableError::Malformed(_))));
    }

    #[test]
    fn test_rejects_empty_extension_list() {
        let err = MimeTable::from_json(r#"{"a/b": []}"#).unwrap_err();
        assert!(matches!(err, TableError::Malformed(_)));
        assert!(err.to_string().contains("has no extensions"));
    }

    #[test]
    fn test_rejects_duplicate_type() {
        let err = MimeTable::from_json(r#"{"a/b": "x", "a/b": "y"}"#).unwrap_err();
        assert!(err.to_string().contains("duplicate MIME type"));
    }

    #[test]
    fn test_from_path() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("types.json");
        fs::write(&path, r#"{"text/plain": "txt"}"#).unwrap();

        let table = MimeTable::from_path(&path).unwrap();
        assert_eq!(table.entries()[0].mime_type, "text/plain");
    }

    #[test]
    fn test_from_missing_path() {
        let temp_dir = TempDir::new().unwrap();
        let result = MimeTable::from_path(&temp_dir.path().join("missing.json"));
        assert!(matches!(result, Err(TableError::Read { .. })));
    }

    #[test]
    fn test_bundled_table_parses() {
        let table = MimeTable::from_json(BUNDLED_TABLE).unwrap();
        assert!(!table.entries().is_empty());
    }
}
