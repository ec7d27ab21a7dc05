use std::fs::File;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use super::{dbf, find_file};
use crate::error::{CrmError, Result};
use crate::model::RawRecord;

pub const QUOTE_HEADERS_FILE: &str = "cotizac.DBF";
pub const QUOTE_ITEMS_FILE: &str = "cotizad.DBF";
pub const CLIENTS_FILE: &str = "clientes.DBF";
pub const PROSPECTS_FILE: &str = "prospect.DBF";

/// A zip archive unpacked into a private scratch directory. The directory
/// and everything in it is removed when this value is dropped.
pub struct ExtractedArchive {
    dir: TempDir,
}

impl ExtractedArchive {
    pub fn extract(zip_path: &Path) -> Result<Self> {
        Self::extract_in(&std::env::temp_dir(), zip_path)
    }

    /// Like [`extract`](Self::extract), with the scratch directory created
    /// under `parent`.
    pub fn extract_in(parent: &Path, zip_path: &Path) -> Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix("crm-archive-")
            .tempdir_in(parent)?;
        let mut archive = zip::ZipArchive::new(File::open(zip_path)?)?;
        archive.extract(dir.path())?;
        tracing::debug!(
            entries = archive.len(),
            scratch = %dir.path().display(),
            "extracted archive"
        );
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Locate `filename` anywhere in the archive, ignoring case.
    pub fn find(&self, filename: &str) -> Option<PathBuf> {
        find_file(self.dir.path(), filename)
    }

    pub fn require(&self, filename: &str) -> Result<PathBuf> {
        self.find(filename)
            .ok_or_else(|| CrmError::MissingTable(filename.to_string()))
    }
}

/// The four tables of a quoting-system export.
#[derive(Debug, Default)]
pub struct QuoteTables {
    pub headers: Vec<RawRecord>,
    pub items: Vec<RawRecord>,
    pub clients: Vec<RawRecord>,
    pub prospects: Vec<RawRecord>,
}

/// Unpack `zip_path` and decode its quote tables.
///
/// The header and line-item tables are required; without them the export
/// holds no quotes and empty tables are returned. The client and prospect
/// tables are optional.
pub fn load_quote_tables(zip_path: &Path) -> Result<QuoteTables> {
    load_quote_tables_in(&std::env::temp_dir(), zip_path)
}

/// [`load_quote_tables`] with the scratch directory placed under `parent`.
/// The scratch directory is gone when this returns, on success or error.
pub fn load_quote_tables_in(parent: &Path, zip_path: &Path) -> Result<QuoteTables> {
    let archive = ExtractedArchive::extract_in(parent, zip_path)?;

    let (headers_path, items_path) = match (
        archive.require(QUOTE_HEADERS_FILE),
        archive.require(QUOTE_ITEMS_FILE),
    ) {
        (Ok(h), Ok(i)) => (h, i),
        (Err(e), _) | (_, Err(e)) => {
            tracing::error!("{e}");
            return Ok(QuoteTables::default());
        }
    };

    let optional = |name: &str| -> Result<Vec<RawRecord>> {
        match archive.find(name) {
            Some(path) => dbf::read_records(&path),
            None => {
                tracing::warn!(table = name, "reference table not in archive");
                Ok(Vec::new())
            }
        }
    };

    let tables = QuoteTables {
        headers: dbf::read_records(&headers_path)?,
        items: dbf::read_records(&items_path)?,
        clients: optional(CLIENTS_FILE)?,
        prospects: optional(PROSPECTS_FILE)?,
    };
    tracing::info!(
        headers = tables.headers.len(),
        items = tables.items.len(),
        clients = tables.clients.len(),
        prospects = tables.prospects.len(),
        "loaded quote tables"
    );
    Ok(tables)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{write_zip, DbfBuilder, DbfField};
    use tempfile::TempDir;

    fn one_column(name: &str, values: &[&str]) -> Vec<u8> {
        let mut b = DbfBuilder::new(vec![DbfField::character(name, 10)]);
        for v in values {
            b = b.row(&[v]);
        }
        b.build()
    }

    #[test]
    fn scratch_directory_is_removed_on_drop() {
        let dir = TempDir::new().unwrap();
        let zip = write_zip(dir.path(), "export.zip", &[("COTIZAC.DBF", one_column("NO_COT", &["1"]))]);
        let archive = ExtractedArchive::extract(&zip).unwrap();
        let scratch = archive.path().to_path_buf();
        assert!(archive.find("cotizac.dbf").is_some());
        drop(archive);
        assert!(!scratch.exists());
    }

    #[test]
    fn not_a_zip_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.zip");
        std::fs::write(&path, b"definitely not a zip").unwrap();
        assert!(matches!(
            ExtractedArchive::extract(&path),
            Err(CrmError::Zip(_))
        ));
    }

    #[test]
    fn missing_required_table_yields_empty_tables() {
        let dir = TempDir::new().unwrap();
        let zip = write_zip(dir.path(), "export.zip", &[("cotizac.dbf", one_column("NO_COT", &["1"]))]);
        let tables = load_quote_tables(&zip).unwrap();
        assert!(tables.headers.is_empty());
        assert!(tables.items.is_empty());
    }

    #[test]
    fn optional_tables_default_to_empty() {
        let dir = TempDir::new().unwrap();
        let zip = write_zip(
            dir.path(),
            "export.zip",
            &[
                ("Cotizac.DBF", one_column("NO_COT", &["1", "2"])),
                ("COTIZAD.dbf", one_column("NO_COT", &["1"])),
            ],
        );
        let tables = load_quote_tables(&zip).unwrap();
        assert_eq!(tables.headers.len(), 2);
        assert_eq!(tables.items.len(), 1);
        assert!(tables.clients.is_empty());
        assert!(tables.prospects.is_empty());
    }

    #[test]
    fn scratch_directory_is_removed_when_a_table_is_corrupt() {
        let dir = TempDir::new().unwrap();
        let scratch_parent = TempDir::new().unwrap();
        let zip = write_zip(
            dir.path(),
            "export.zip",
            &[
                ("cotizac.DBF", vec![0x03, 0x7c, 0x01]),
                ("cotizad.DBF", one_column("NO_COT", &["1"])),
            ],
        );

        let err = load_quote_tables_in(scratch_parent.path(), &zip).unwrap_err();
        assert!(matches!(err, CrmError::Dbf { .. }));
        assert_eq!(std::fs::read_dir(scratch_parent.path()).unwrap().count(), 0);
    }

    #[test]
    fn scratch_directory_is_removed_after_successful_load() {
        let dir = TempDir::new().unwrap();
        let scratch_parent = TempDir::new().unwrap();
        let zip = write_zip(
            dir.path(),
            "export.zip",
            &[
                ("cotizac.DBF", one_column("NO_COT", &["1"])),
                ("cotizad.DBF", one_column("NO_COT", &["1"])),
            ],
        );

        load_quote_tables_in(scratch_parent.path(), &zip).unwrap();
        assert_eq!(std::fs::read_dir(scratch_parent.path()).unwrap().count(), 0);
    }
}
