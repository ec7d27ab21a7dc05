use serde_json::Value;

use super::{run_ingest, JobResponse};
use crate::object_store::ObjectStore;
use crate::reader::read_products;
use crate::store::ItemStore;

/// Sync the product catalogue export named by `event` into `table`.
pub fn run_products(
    event: &Value,
    objects: &dyn ObjectStore,
    store: &dyn ItemStore,
    table: &str,
) -> JobResponse {
    run_ingest(event, objects, store, table, read_products)
}
