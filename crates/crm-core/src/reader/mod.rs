//! Readers for the CSV exports and the zipped DBF tables of the quoting
//! system.

pub mod archive;
pub mod dbf;
pub mod product_export;
pub mod sales_reps;

use std::path::{Path, PathBuf};

pub use archive::{load_quote_tables, ExtractedArchive, QuoteTables};
pub use dbf::DbfTable;
pub use product_export::{read_products, ProductExport};
pub use sales_reps::{read_sales_reps, SalesRepTable};

/// Decode ISO-8859-1 bytes. Every byte maps to the code point of the same
/// value, so the conversion is exact and never fails.
pub fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| char::from(b)).collect()
}

/// Find `filename` under `dir` ignoring ASCII case. The top level is
/// searched before subdirectories.
pub fn find_file(dir: &Path, filename: &str) -> Option<PathBuf> {
    let entries = std::fs::read_dir(dir).ok()?;
    let mut subdirs = Vec::new();
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            subdirs.push(path);
            continue;
        }
        let matches = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.eq_ignore_ascii_case(filename));
        if matches {
            return Some(path);
        }
    }
    subdirs.sort();
    subdirs.iter().find_map(|d| find_file(d, filename))
}
