use serde_json::Value;

use super::{run_ingest, JobResponse};
use crate::object_store::ObjectStore;
use crate::reader::read_sales_reps;
use crate::store::ItemStore;

/// Sync the sales-rep sheet named by `event` into `table`.
pub fn run_sales_reps(
    event: &Value,
    objects: &dyn ObjectStore,
    store: &dyn ItemStore,
    table: &str,
) -> JobResponse {
    run_ingest(event, objects, store, table, read_sales_reps)
}
