//! Collaborator interfaces for entity and file persistence.
//!
//! Entity management (clients, companies, files, subscriptions, lists) and
//! CSV uploads live behind these seams; the aggregation core never touches
//! them. The in-memory and local-disk implementations stand in for the
//! hosted backends in tests and development.

use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

/// Generic record store: CRUD by id plus equality-filtered select.
pub trait RecordStore {
    fn select(&self, table: &str, filter: Option<(&str, &Value)>) -> Vec<Value>;
    fn insert(&self, table: &str, row: Value) -> Value;
    /// Merges the patch into the row; `None` when the id is unknown.
    fn update(&self, table: &str, id: &str, patch: Value) -> Option<Value>;
    fn delete(&self, table: &str, id: &str) -> bool;
}

/// In-memory record store. Rows are JSON objects keyed by an `id` field;
/// ids are assigned on insert when absent.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    tables: Mutex<HashMap<String, Vec<Value>>>,
    next_id: AtomicU64,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn row_id(row: &Value) -> Option<String> {
    match row.get("id") {
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    }
}

impl RecordStore for InMemoryStore {
    fn select(&self, table: &str, filter: Option<(&str, &Value)>) -> Vec<Value> {
        let tables = self.tables.lock().unwrap();
        let rows = match tables.get(table) {
            Some(rows) => rows,
            None => return Vec::new(),
        };
        match filter {
            Some((field, value)) => rows
                .iter()
                .filter(|row| row.get(field) == Some(value))
                .cloned()
                .collect(),
            None => rows.clone(),
        }
    }

    fn insert(&self, table: &str, mut row: Value) -> Value {
        if row_id(&row).is_none() {
            let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
            if let Value::Object(map) = &mut row {
                map.insert("id".to_string(), json!(id.to_string()));
            } else {
                let mut map = Map::new();
                map.insert("id".to_string(), json!(id.to_string()));
                map.insert("value".to_string(), row);
                row = Value::Object(map);
            }
        }
        self.tables
            .lock()
            .unwrap()
            .entry(table.to_string())
            .or_default()
            .push(row.clone());
        row
    }

    fn update(&self, table: &str, id: &str, patch: Value) -> Option<Value> {
        let mut tables = self.tables.lock().unwrap();
        let rows = tables.get_mut(table)?;
        let row = rows
            .iter_mut()
            .find(|row| row_id(row).as_deref() == Some(id))?;
        if let (Value::Object(target), Value::Object(source)) = (&mut *row, patch) {
            for (key, value) in source {
                target.insert(key, value);
            }
        }
        Some(row.clone())
    }

    fn delete(&self, table: &str, id: &str) -> bool {
        let mut tables = self.tables.lock().unwrap();
        let rows = match tables.get_mut(table) {
            Some(rows) => rows,
            None => return false,
        };
        let before = rows.len();
        rows.retain(|row| row_id(row).as_deref() != Some(id));
        rows.len() < before
    }
}

/// File store for uploaded lists: save bytes, read them back, delete.
pub trait FileStore {
    fn save(&self, contents: &[u8]) -> std::io::Result<PathBuf>;
    fn read(&self, path: &Path) -> std::io::Result<Vec<u8>>;
    fn delete(&self, path: &Path) -> std::io::Result<()>;
}

/// Local-disk file store rooted at one directory.
#[derive(Debug)]
pub struct LocalFileStore {
    root: PathBuf,
    counter: AtomicU64,
}

impl LocalFileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            counter: AtomicU64::new(0),
        }
    }
}

impl FileStore for LocalFileStore {
    fn save(&self, contents: &[u8]) -> std::io::Result<PathBuf> {
        std::fs::create_dir_all(&self.root)?;
        let n = self.counter.fetch_add(1, Ordering::Relaxed);
        let path = self.root.join(format!("upload-{}-{}.csv", std::process::id(), n));
        std::fs::write(&path, contents)?;
        Ok(path)
    }

    fn read(&self, path: &Path) -> std::io::Result<Vec<u8>> {
        std::fs::read(path)
    }

    fn delete(&self, path: &Path) -> std::io::Result<()> {
        std::fs::remove_file(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_assigns_ids_and_select_filters_by_equality() {
        let store = InMemoryStore::new();
        let a = store.insert("clients", json!({ "nom": "Alice", "ville": "Paris" }));
        store.insert("clients", json!({ "nom": "Bob", "ville": "Lyon" }));
        assert!(row_id(&a).is_some());

        let all = store.select("clients", None);
        assert_eq!(all.len(), 2);

        let paris = store.select("clients", Some(("ville", &json!("Paris"))));
        assert_eq!(paris.len(), 1);
        assert_eq!(paris[0]["nom"], "Alice");
    }

    #[test]
    fn update_merges_patch_and_reports_missing_rows() {
        let store = InMemoryStore::new();
        let row = store.insert("company", json!({ "name": "Acme" }));
        let id = row_id(&row).unwrap();

        let updated = store
            .update("company", &id, json!({ "name": "Acme SARL", "naf": "6201Z" }))
            .unwrap();
        assert_eq!(updated["name"], "Acme SARL");
        assert_eq!(updated["naf"], "6201Z");

        assert!(store.update("company", "no-such-id", json!({})).is_none());
    }

    #[test]
    fn delete_removes_exactly_the_row() {
        let store = InMemoryStore::new();
        let row = store.insert("file", json!({ "path": "a.csv" }));
        let id = row_id(&row).unwrap();
        assert!(store.delete("file", &id));
        assert!(!store.delete("file", &id));
        assert!(store.select("file", None).is_empty());
    }

    #[test]
    fn file_store_round_trip() {
        let root = std::env::temp_dir().join("prosperian-api-store-test");
        let store = LocalFileStore::new(&root);
        let path = store.save(b"nom;siren\nAcme;123456789\n").unwrap();
        assert_eq!(store.read(&path).unwrap(), b"nom;siren\nAcme;123456789\n");
        store.delete(&path).unwrap();
        assert!(store.read(&path).is_err());
    }
}
