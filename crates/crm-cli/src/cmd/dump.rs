use anyhow::{bail, Result};
use crm_core::store::{ItemStore, RedbStore};
use std::path::Path;

use crate::output::print_json;

pub fn run(store_path: &Path, table: &str) -> Result<()> {
    if !store_path.exists() {
        bail!("store not found: {}", store_path.display());
    }
    let store = RedbStore::open(store_path)?;
    let items: serde_json::Map<String, serde_json::Value> = store
        .list(table)?
        .into_iter()
        .map(|item| (item.key, item.value))
        .collect();
    print_json(&items)
}
