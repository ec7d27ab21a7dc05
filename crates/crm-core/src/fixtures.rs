//! Test doubles and builders shared by the unit tests.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use rust_decimal::Decimal;
use serde_json::{json, Value};
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

use crate::error::{CrmError, Result};
use crate::mail::{MailTransport, OutboundEmail};
use crate::model::{Contact, Quote, SalesRep};
use crate::store::{ItemFailure, ItemStore, KvItem};
use crate::types::QuoteStatus;

// ---------------------------------------------------------------------------
// Entities and events
// ---------------------------------------------------------------------------

pub fn quote(id: &str, created_at: &str) -> Quote {
    Quote {
        id: id.to_string(),
        contact: Contact {
            id: format!("P{id}"),
            name: format!("Contacto {id}"),
            email: format!("contacto{id}@example.com"),
        },
        sales_rep: SalesRep::placeholder(""),
        item_ids: Vec::new(),
        amount: Decimal::new(10050, 2),
        status: QuoteStatus::Sent,
        created_at: created_at.to_string(),
    }
}

pub fn storage_event(bucket: &str, key: &str) -> Value {
    json!({
        "Records": [{
            "s3": {
                "bucket": { "name": bucket },
                "object": { "key": key },
            }
        }]
    })
}

// ---------------------------------------------------------------------------
// Stores
// ---------------------------------------------------------------------------

type Tables = BTreeMap<String, BTreeMap<String, Value>>;

/// In-memory `ItemStore` with the same per-item rules as `RedbStore`.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl ItemStore for MemoryStore {
    fn write_chunk(&self, table: &str, items: &[KvItem]) -> Result<Vec<ItemFailure>> {
        let mut tables = self.tables.lock().unwrap();
        let t = tables.entry(table.to_string()).or_default();
        let mut failures = Vec::new();
        for item in items {
            if item.key.trim().is_empty() {
                failures.push(ItemFailure {
                    key: item.key.clone(),
                    error: "item key is empty".into(),
                });
                continue;
            }
            t.insert(item.key.clone(), item.value.clone());
        }
        Ok(failures)
    }

    fn get(&self, table: &str, key: &str) -> Result<Option<Value>> {
        let tables = self.tables.lock().unwrap();
        Ok(tables.get(table).and_then(|t| t.get(key)).cloned())
    }

    fn list(&self, table: &str) -> Result<Vec<KvItem>> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .get(table)
            .map(|t| {
                t.iter()
                    .map(|(k, v)| KvItem::new(k.clone(), v.clone()))
                    .collect()
            })
            .unwrap_or_default())
    }
}

/// Rejects one specific key; everything else is stored.
pub struct RejectingStore {
    key: String,
    inner: MemoryStore,
}

impl RejectingStore {
    pub fn new(key: &str) -> Self {
        Self {
            key: key.to_string(),
            inner: MemoryStore::default(),
        }
    }
}

impl ItemStore for RejectingStore {
    fn write_chunk(&self, table: &str, items: &[KvItem]) -> Result<Vec<ItemFailure>> {
        let (rejected, accepted): (Vec<_>, Vec<_>) =
            items.iter().cloned().partition(|i| i.key == self.key);
        let mut failures = self.inner.write_chunk(table, &accepted)?;
        failures.extend(rejected.into_iter().map(|i| ItemFailure {
            key: i.key,
            error: "rejected".into(),
        }));
        Ok(failures)
    }

    fn get(&self, table: &str, key: &str) -> Result<Option<Value>> {
        self.inner.get(table, key)
    }

    fn list(&self, table: &str) -> Result<Vec<KvItem>> {
        self.inner.list(table)
    }
}

/// Fails the `n`th `write_chunk` call (zero-based) as a whole.
pub struct FailingChunkStore {
    fail_at: usize,
    calls: AtomicUsize,
    inner: MemoryStore,
}

impl FailingChunkStore {
    pub fn new(fail_at: usize) -> Self {
        Self {
            fail_at,
            calls: AtomicUsize::new(0),
            inner: MemoryStore::default(),
        }
    }
}

impl ItemStore for FailingChunkStore {
    fn write_chunk(&self, table: &str, items: &[KvItem]) -> Result<Vec<ItemFailure>> {
        if self.calls.fetch_add(1, Ordering::SeqCst) == self.fail_at {
            return Err(CrmError::Store("transaction aborted".into()));
        }
        self.inner.write_chunk(table, items)
    }

    fn get(&self, table: &str, key: &str) -> Result<Option<Value>> {
        self.inner.get(table, key)
    }

    fn list(&self, table: &str) -> Result<Vec<KvItem>> {
        self.inner.list(table)
    }
}

// ---------------------------------------------------------------------------
// Mail
// ---------------------------------------------------------------------------

/// Records every message; optionally fails for one recipient.
#[derive(Default)]
pub struct RecordingTransport {
    fail_for: Option<String>,
    sent: Mutex<Vec<OutboundEmail>>,
}

impl RecordingTransport {
    pub fn failing_for(recipient: &str) -> Self {
        Self {
            fail_for: Some(recipient.to_string()),
            sent: Mutex::default(),
        }
    }

    pub fn sent(&self) -> Vec<OutboundEmail> {
        self.sent.lock().unwrap().clone()
    }
}

impl MailTransport for RecordingTransport {
    fn send(&self, email: &OutboundEmail) -> Result<String> {
        if self.fail_for.as_deref() == Some(email.to.as_str()) {
            return Err(CrmError::Mail(format!("mailbox unavailable: {}", email.to)));
        }
        let mut sent = self.sent.lock().unwrap();
        sent.push(email.clone());
        Ok(format!("msg-{}", sent.len()))
    }
}

// ---------------------------------------------------------------------------
// DBF
// ---------------------------------------------------------------------------

pub struct DbfField {
    name: String,
    kind: u8,
    length: u8,
    decimals: u8,
}

impl DbfField {
    pub fn character(name: &str, length: u8) -> Self {
        Self::new(name, b'C', length, 0)
    }

    pub fn numeric(name: &str, length: u8, decimals: u8) -> Self {
        Self::new(name, b'N', length, decimals)
    }

    pub fn date(name: &str) -> Self {
        Self::new(name, b'D', 8, 0)
    }

    pub fn logical(name: &str) -> Self {
        Self::new(name, b'L', 1, 0)
    }

    fn new(name: &str, kind: u8, length: u8, decimals: u8) -> Self {
        Self {
            name: name.to_string(),
            kind,
            length,
            decimals,
        }
    }

    /// Latin-1 cell bytes: numbers right-justified, everything else
    /// left-aligned, both space padded and cut to the field width.
    fn cell(&self, value: &str) -> Vec<u8> {
        let bytes = latin1(value);
        let width = self.length as usize;
        let mut cell = if self.kind == b'N' && bytes.len() < width {
            let mut padded = vec![b' '; width - bytes.len()];
            padded.extend_from_slice(&bytes);
            padded
        } else {
            bytes
        };
        cell.resize(width, b' ');
        cell
    }
}

fn latin1(s: &str) -> Vec<u8> {
    s.chars()
        .map(|c| u8::try_from(u32::from(c)).unwrap_or(b'?'))
        .collect()
}

/// Builds a dBase III table in memory.
pub struct DbfBuilder {
    fields: Vec<DbfField>,
    rows: Vec<(bool, Vec<String>)>,
}

impl DbfBuilder {
    pub fn new(fields: Vec<DbfField>) -> Self {
        Self {
            fields,
            rows: Vec::new(),
        }
    }

    pub fn row(mut self, values: &[&str]) -> Self {
        self.rows
            .push((false, values.iter().map(|v| v.to_string()).collect()));
        self
    }

    pub fn deleted_row(mut self, values: &[&str]) -> Self {
        self.rows
            .push((true, values.iter().map(|v| v.to_string()).collect()));
        self
    }

    pub fn build(self) -> Vec<u8> {
        let header_len = 32 + 32 * self.fields.len() + 1;
        let record_len = 1 + self.fields.iter().map(|f| f.length as usize).sum::<usize>();

        let mut out = vec![0u8; 32];
        out[0] = 0x03;
        out[1..4].copy_from_slice(&[124, 6, 10]);
        out[4..8].copy_from_slice(&(self.rows.len() as u32).to_le_bytes());
        out[8..10].copy_from_slice(&(header_len as u16).to_le_bytes());
        out[10..12].copy_from_slice(&(record_len as u16).to_le_bytes());

        for field in &self.fields {
            let mut desc = [0u8; 32];
            let name = field.name.as_bytes();
            desc[..name.len().min(10)].copy_from_slice(&name[..name.len().min(10)]);
            desc[11] = field.kind;
            desc[16] = field.length;
            desc[17] = field.decimals;
            out.extend_from_slice(&desc);
        }
        out.push(0x0D);

        for (deleted, values) in &self.rows {
            out.push(if *deleted { b'*' } else { b' ' });
            for (i, field) in self.fields.iter().enumerate() {
                let value = values.get(i).map(String::as_str).unwrap_or("");
                out.extend_from_slice(&field.cell(value));
            }
        }
        out.push(0x1A);
        out
    }
}

// ---------------------------------------------------------------------------
// Archives
// ---------------------------------------------------------------------------

/// Write a zip at `dir/name` holding `entries`.
pub fn write_zip(dir: &Path, name: &str, entries: &[(&str, Vec<u8>)]) -> PathBuf {
    let path = dir.join(name);
    let file = std::fs::File::create(&path).unwrap();
    let mut zip = ZipWriter::new(file);
    let options =
        SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);
    for (entry, content) in entries {
        zip.start_file(*entry, options).unwrap();
        zip.write_all(content).unwrap();
    }
    zip.finish().unwrap();
    path
}
