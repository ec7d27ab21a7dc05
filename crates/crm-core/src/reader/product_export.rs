use std::fs::File;
use std::path::{Path, PathBuf};

use csv::{ByteRecord, Reader, ReaderBuilder};

use super::decode_latin1;
use crate::error::Result;
use crate::model::{FieldValue, Product, RawRecord};

/// Literal in the fourth column that marks the column-header row.
pub const HEADER_MARKER: &str = "Clave";

const ID_COLUMN: usize = 3;
const DESCRIPTION_COLUMN: usize = 4;
const PRODUCT_TYPE_COLUMN: usize = 14;
const MIN_COLUMNS: usize = PRODUCT_TYPE_COLUMN + 1;

/// Product catalogue exported by the ERP as ISO-8859-1 CSV with a variable
/// preamble before the header row.
#[derive(Debug, Clone)]
pub struct ProductExport {
    path: PathBuf,
}

impl ProductExport {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Lazily iterate the data rows. Each call starts from the top of the
    /// file. A file without a header row yields nothing.
    pub fn records(&self) -> Result<ExportRecords> {
        let reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_path(&self.path)?;
        Ok(ExportRecords {
            reader,
            row: ByteRecord::new(),
            seeking_header: true,
        })
    }
}

pub struct ExportRecords {
    reader: Reader<File>,
    row: ByteRecord,
    seeking_header: bool,
}

impl Iterator for ExportRecords {
    type Item = Result<RawRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.reader.read_byte_record(&mut self.row) {
                Ok(true) => {}
                Ok(false) => return None,
                Err(e) => return Some(Err(e.into())),
            }
            if self.seeking_header {
                if self.row.get(ID_COLUMN) == Some(HEADER_MARKER.as_bytes()) {
                    self.seeking_header = false;
                }
                continue;
            }
            if let Some(record) = product_row(&self.row) {
                return Some(Ok(record));
            }
        }
    }
}

fn product_row(row: &ByteRecord) -> Option<RawRecord> {
    if row.iter().all(|f| f.is_empty()) || row.len() < MIN_COLUMNS {
        return None;
    }
    let cell = |i: usize| decode_latin1(row.get(i).unwrap_or_default()).trim().to_string();
    let id = cell(ID_COLUMN);
    if id.is_empty() {
        return None;
    }
    Some(
        RawRecord::new()
            .with("id", FieldValue::Text(id))
            .with("description", FieldValue::Text(cell(DESCRIPTION_COLUMN)))
            .with("product_type", FieldValue::Text(cell(PRODUCT_TYPE_COLUMN))),
    )
}

/// Read every product in the export.
pub fn read_products(path: &Path) -> Result<Vec<Product>> {
    let mut products = Vec::new();
    for record in ProductExport::new(path).records()? {
        let record = record?;
        products.push(Product {
            id: record.text("id"),
            description: record.text("description"),
            product_type: record.text("product_type"),
        });
    }
    tracing::info!(count = products.len(), path = %path.display(), "read products");
    Ok(products)
}
