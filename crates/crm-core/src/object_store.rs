//! Fetching the object named by a storage event into a local scratch file.

use std::path::PathBuf;

use tempfile::TempPath;

use crate::error::{CrmError, Result};
use crate::event::ObjectLocation;

pub trait ObjectStore {
    /// Copy the object to a temporary file that is removed when the returned
    /// guard drops.
    fn download(&self, location: &ObjectLocation) -> Result<TempPath>;
}

/// Objects laid out on disk as `<root>/<bucket>/<key>`.
#[derive(Debug, Clone)]
pub struct LocalObjectStore {
    root: PathBuf,
}

impl LocalObjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn resolve(&self, location: &ObjectLocation) -> PathBuf {
        self.root.join(&location.bucket).join(&location.key)
    }
}

impl ObjectStore for LocalObjectStore {
    fn download(&self, location: &ObjectLocation) -> Result<TempPath> {
        let source = self.resolve(location);
        if !source.is_file() {
            return Err(CrmError::ObjectNotFound(format!(
                "{}/{}",
                location.bucket, location.key
            )));
        }
        let mut target = tempfile::Builder::new()
            .prefix("crm-object-")
            .suffix(&location.suffix())
            .tempfile()?;
        let mut reader = std::fs::File::open(&source)?;
        std::io::copy(&mut reader, target.as_file_mut())?;
        tracing::debug!(
            source = %source.display(),
            target = %target.path().display(),
            "downloaded object"
        );
        Ok(target.into_temp_path())
    }
}
