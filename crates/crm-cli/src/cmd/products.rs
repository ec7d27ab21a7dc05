use anyhow::Result;
use crm_core::config::{IngestConfig, ProcessEnv};
use crm_core::jobs::products::run_products;
use crm_core::object_store::LocalObjectStore;
use crm_core::store::RedbStore;

use super::accept_event;
use crate::output::print_json;

pub fn run(event: &str) -> Result<()> {
    let config = IngestConfig::from_env(&ProcessEnv)?;
    let Some(event) = accept_event(event)? else {
        return Ok(());
    };
    let store = RedbStore::open(&config.store_path)?;
    let objects = LocalObjectStore::new(&config.object_root);

    let response = run_products(&event, &objects, &store, &config.table_name);
    print_json(&response)
}
