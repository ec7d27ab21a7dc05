//! Key-value persistence for synced entities and audit records.
//!
//! # Table design
//!
//! Every entity kind owns one redb table, named by configuration:
//! ```text
//! key:   item id (&str)
//! value: JSON document with the entity's fixed field names
//! ```
//!
//! Writes go through `batch_write`, which splits the input into chunks of
//! `BATCH_SIZE`. Each chunk is one write transaction: an item that cannot be
//! stored fails on its own, a transaction that cannot commit fails the whole
//! chunk, and neither stops the remaining chunks.

use std::path::Path;

use redb::{Database, ReadableTable, TableDefinition, TableError};
use serde_json::Value;

use crate::error::{CrmError, Result};
use crate::model::DBWriteResult;

pub const BATCH_SIZE: usize = 25;

// ---------------------------------------------------------------------------
// Items
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct KvItem {
    pub key: String,
    pub value: Value,
}

impl KvItem {
    pub fn new(key: impl Into<String>, value: Value) -> Self {
        Self {
            key: key.into(),
            value,
        }
    }
}

/// Projection of an entity onto its persisted item.
pub trait ToItem {
    fn to_item(&self) -> KvItem;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemFailure {
    pub key: String,
    pub error: String,
}

// ---------------------------------------------------------------------------
// ItemStore
// ---------------------------------------------------------------------------

pub trait ItemStore: Send + Sync {
    /// Write `items` to `table` in one transaction.
    ///
    /// Items that could not be written are returned; `Err` means nothing in
    /// the chunk was persisted.
    fn write_chunk(&self, table: &str, items: &[KvItem]) -> Result<Vec<ItemFailure>>;

    fn get(&self, table: &str, key: &str) -> Result<Option<Value>>;

    /// All items of `table` in key order. A table never written is empty.
    fn list(&self, table: &str) -> Result<Vec<KvItem>>;

    fn put(&self, table: &str, item: KvItem) -> Result<()> {
        let failures = self.write_chunk(table, std::slice::from_ref(&item))?;
        match failures.into_iter().next() {
            Some(f) => Err(CrmError::Store(format!("{}: {}", f.key, f.error))),
            None => Ok(()),
        }
    }
}

/// Write `items` to `table` in chunks of `BATCH_SIZE`, isolating failures
/// per item and per chunk.
pub fn batch_write<T: ToItem>(store: &dyn ItemStore, table: &str, items: &[T]) -> DBWriteResult {
    let mut result = DBWriteResult::default();

    for (index, chunk) in items.chunks(BATCH_SIZE).enumerate() {
        let kv: Vec<KvItem> = chunk.iter().map(ToItem::to_item).collect();
        match store.write_chunk(table, &kv) {
            Ok(failures) => {
                result.successful_inserts += kv.len() - failures.len();
                for f in failures {
                    tracing::error!(table, key = %f.key, "failed to insert item: {}", f.error);
                    result.record_failure(f.key, f.error);
                }
            }
            Err(e) => {
                tracing::error!(table, chunk = index, size = kv.len(), "chunk write failed: {e}");
                for item in kv {
                    result.failed_inserts += 1;
                    result.failed_ids.push(item.key);
                }
                result.errors.push(format!("chunk {index}: {e}"));
            }
        }
    }

    tracing::info!(
        table,
        successful = result.successful_inserts,
        failed = result.failed_inserts,
        "batch write complete"
    );
    result
}

// ---------------------------------------------------------------------------
// RedbStore
// ---------------------------------------------------------------------------

fn table_def(name: &str) -> TableDefinition<'_, &'static str, &'static [u8]> {
    TableDefinition::new(name)
}

fn store_err(e: impl std::fmt::Display) -> CrmError {
    CrmError::Store(e.to_string())
}

/// `ItemStore` backed by a single redb database file.
pub struct RedbStore {
    db: Database,
}

impl RedbStore {
    /// Open or create the database at `path`, creating parent directories.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let db = Database::create(path).map_err(store_err)?;
        Ok(Self { db })
    }
}

impl ItemStore for RedbStore {
    fn write_chunk(&self, table: &str, items: &[KvItem]) -> Result<Vec<ItemFailure>> {
        let mut failures = Vec::new();
        let wt = self.db.begin_write().map_err(store_err)?;
        {
            let mut t = wt.open_table(table_def(table)).map_err(store_err)?;
            for item in items {
                if item.key.trim().is_empty() {
                    failures.push(ItemFailure {
                        key: item.key.clone(),
                        error: "item key is empty".to_string(),
                    });
                    continue;
                }
                let bytes = match serde_json::to_vec(&item.value) {
                    Ok(b) => b,
                    Err(e) => {
                        failures.push(ItemFailure {
                            key: item.key.clone(),
                            error: e.to_string(),
                        });
                        continue;
                    }
                };
                if let Err(e) = t.insert(item.key.as_str(), bytes.as_slice()) {
                    failures.push(ItemFailure {
                        key: item.key.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }
        wt.commit().map_err(store_err)?;
        Ok(failures)
    }

    fn get(&self, table: &str, key: &str) -> Result<Option<Value>> {
        let rt = self.db.begin_read().map_err(store_err)?;
        let t = match rt.open_table(table_def(table)) {
            Ok(t) => t,
            Err(TableError::TableDoesNotExist(_)) => return Ok(None),
            Err(e) => return Err(store_err(e)),
        };
        match t.get(key).map_err(store_err)? {
            Some(v) => Ok(Some(serde_json::from_slice(v.value())?)),
            None => Ok(None),
        }
    }

    fn list(&self, table: &str) -> Result<Vec<KvItem>> {
        let rt = self.db.begin_read().map_err(store_err)?;
        let t = match rt.open_table(table_def(table)) {
            Ok(t) => t,
            Err(TableError::TableDoesNotExist(_)) => return Ok(Vec::new()),
            Err(e) => return Err(store_err(e)),
        };
        let mut items = Vec::new();
        for entry in t.iter().map_err(store_err)? {
            let (k, v) = entry.map_err(store_err)?;
            items.push(KvItem::new(k.value(), serde_json::from_slice(v.value())?));
        }
        Ok(items)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
