//! dBase III / FoxPro table decoding.
//!
//! # Layout
//!
//! ```text
//! [ header: 32 bytes | field descriptors: 32 bytes each | 0x0D | (backlink) ]
//! [ record: deletion flag (1 byte) | field bytes ... ] × record_count
//! [ 0x1A ]
//! ```
//!
//! Header offsets used here: record count `u32` LE at 4, header length
//! `u16` LE at 8, record length `u16` LE at 10. Descriptors carry the name
//! (11 bytes, NUL padded), type at 11, length at 16, decimal count at 17.
//! Text is ISO-8859-1.

use std::path::Path;
use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use super::decode_latin1;
use crate::error::{CrmError, Result};
use crate::model::{FieldValue, RawRecord};

const HEADER_SIZE: usize = 32;
const DESCRIPTOR_SIZE: usize = 32;
const DESCRIPTOR_END: u8 = 0x0D;
const END_OF_FILE: u8 = 0x1A;
const DELETED: u8 = b'*';

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub name: String,
    pub kind: char,
    pub length: usize,
    pub decimals: u8,
}

/// A DBF file loaded into memory. Records are decoded on iteration.
#[derive(Debug)]
pub struct DbfTable {
    name: String,
    data: Vec<u8>,
    fields: Vec<FieldDescriptor>,
    header_len: usize,
    record_len: usize,
    record_count: usize,
}

impl DbfTable {
    pub fn open(path: &Path) -> Result<Self> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let data = std::fs::read(path)?;
        Self::from_bytes(name, data)
    }

    pub fn from_bytes(name: impl Into<String>, data: Vec<u8>) -> Result<Self> {
        let name = name.into();
        let malformed = |reason: String| CrmError::Dbf {
            table: name.clone(),
            reason,
        };

        if data.len() < HEADER_SIZE + 1 {
            return Err(malformed(format!("{} bytes is shorter than a header", data.len())));
        }
        let record_count = u32::from_le_bytes([data[4], data[5], data[6], data[7]]) as usize;
        let header_len = u16::from_le_bytes([data[8], data[9]]) as usize;
        let record_len = u16::from_le_bytes([data[10], data[11]]) as usize;
        if header_len <= HEADER_SIZE || header_len > data.len() {
            return Err(malformed(format!("header length {header_len} out of range")));
        }

        let mut fields = Vec::new();
        let mut offset = HEADER_SIZE;
        while offset + DESCRIPTOR_SIZE <= header_len && data[offset] != DESCRIPTOR_END {
            let raw = &data[offset..offset + DESCRIPTOR_SIZE];
            let name_end = raw[..11].iter().position(|&b| b == 0).unwrap_or(11);
            fields.push(FieldDescriptor {
                name: decode_latin1(&raw[..name_end]).trim().to_string(),
                kind: char::from(raw[11]).to_ascii_uppercase(),
                length: raw[16] as usize,
                decimals: raw[17],
            });
            offset += DESCRIPTOR_SIZE;
        }

        let width: usize = 1 + fields.iter().map(|f| f.length).sum::<usize>();
        if width > record_len {
            return Err(malformed(format!(
                "fields need {width} bytes but records are {record_len}"
            )));
        }

        Ok(Self {
            name,
            data,
            fields,
            header_len,
            record_len,
            record_count,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    /// Live (non-deleted) records in file order.
    pub fn records(&self) -> impl Iterator<Item = RawRecord> + '_ {
        (0..self.record_count)
            .map_while(move |i| {
                let start = self.header_len + i * self.record_len;
                let end = start + self.record_len;
                if end > self.data.len() || self.data[start] == END_OF_FILE {
                    tracing::debug!(
                        table = %self.name,
                        read = i,
                        declared = self.record_count,
                        "table ends before declared record count"
                    );
                    return None;
                }
                Some(&self.data[start..end])
            })
            .filter(|raw| raw[0] != DELETED)
            .map(move |raw| self.decode_record(&raw[1..]))
    }

    fn decode_record(&self, mut raw: &[u8]) -> RawRecord {
        let mut record = RawRecord::new();
        for field in &self.fields {
            let (cell, rest) = raw.split_at(field.length);
            record.push(field.name.clone(), decode_field(field, cell));
            raw = rest;
        }
        record
    }
}

/// Read every live record of the table at `path`.
pub fn read_records(path: &Path) -> Result<Vec<RawRecord>> {
    let table = DbfTable::open(path)?;
    Ok(table.records().collect())
}

fn trim_bytes<'a>(bytes: &'a [u8], strip: &[u8]) -> &'a [u8] {
    let start = bytes.iter().position(|b| !strip.contains(b)).unwrap_or(bytes.len());
    let end = bytes.iter().rposition(|b| !strip.contains(b)).map_or(start, |i| i + 1);
    &bytes[start..end]
}

fn decode_field(field: &FieldDescriptor, cell: &[u8]) -> FieldValue {
    match field.kind {
        'C' => {
            let end = cell.iter().rposition(|&b| b != b' ' && b != 0).map_or(0, |i| i + 1);
            FieldValue::Text(decode_latin1(&cell[..end]))
        }
        'N' | 'F' => decode_number(trim_bytes(cell, b" \0*\x1a")),
        'D' => {
            let raw = trim_bytes(cell, b" \0");
            if raw.is_empty() || raw.iter().all(|&b| b == b'0') {
                return FieldValue::Null;
            }
            let text = decode_latin1(raw);
            match NaiveDate::parse_from_str(&text, "%Y%m%d") {
                Ok(d) => FieldValue::Date(d),
                Err(_) => {
                    tracing::warn!(field = %field.name, value = %text, "unparseable date");
                    FieldValue::Null
                }
            }
        }
        'L' => match cell.first() {
            Some(b'T' | b't' | b'Y' | b'y') => FieldValue::Bool(true),
            Some(b'F' | b'f' | b'N' | b'n') => FieldValue::Bool(false),
            _ => FieldValue::Null,
        },
        'I' if cell.len() == 4 => {
            FieldValue::Integer(i32::from_le_bytes([cell[0], cell[1], cell[2], cell[3]]) as i64)
        }
        'M' | 'G' | 'P' => FieldValue::Null,
        _ => FieldValue::Text(decode_latin1(trim_bytes(cell, b" \0"))),
    }
}

fn decode_number(raw: &[u8]) -> FieldValue {
    if raw.is_empty() {
        return FieldValue::Null;
    }
    let text = decode_latin1(raw);
    if let Ok(i) = text.parse::<i64>() {
        return FieldValue::Integer(i);
    }
    match Decimal::from_str(&text).or_else(|_| Decimal::from_scientific(&text)) {
        Ok(d) => FieldValue::Decimal(d),
        Err(_) => FieldValue::Text(text),
    }
}
