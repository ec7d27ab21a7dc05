//! One invocation of a sync job: storage event in, structured response out.
//!
//! Handlers never fail. Input problems become a [`JobResponse`] with the
//! matching status code; per-record and per-item failures are counted in the
//! body.

pub mod products;
pub mod quotes;
pub mod sales_reps;

use std::path::Path;

use serde::Serialize;
use serde_json::{json, Value};

use crate::error::Result;
use crate::event::parse_storage_event;
use crate::model::DBWriteResult;
use crate::object_store::ObjectStore;
use crate::store::{batch_write, ItemStore, ToItem};

pub use quotes::{run_quotes, QuotesJob};

pub const INVALID_EVENT_MESSAGE: &str = "Invalid event structure";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobResponse {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    pub body: Value,
}

impl JobResponse {
    pub fn ok(body: impl Serialize) -> Self {
        Self {
            status_code: 200,
            body: serde_json::to_value(body).unwrap_or(Value::Null),
        }
    }

    pub fn invalid_event() -> Self {
        Self {
            status_code: 400,
            body: json!({ "error": INVALID_EVENT_MESSAGE }),
        }
    }

    pub fn failure(message: impl std::fmt::Display) -> Self {
        Self {
            status_code: 500,
            body: json!({ "error": message.to_string() }),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }
}

/// Write outcome plus the number of records read.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IngestSummary {
    pub total: usize,
    #[serde(flatten)]
    pub write: DBWriteResult,
}

/// Shared flow of the flat-file jobs: locate the object, read it into
/// entities and batch-write them to `table`.
pub(crate) fn run_ingest<T, F>(
    event: &Value,
    objects: &dyn ObjectStore,
    store: &dyn ItemStore,
    table: &str,
    read: F,
) -> JobResponse
where
    T: ToItem,
    F: FnOnce(&Path) -> Result<Vec<T>>,
{
    let location = match parse_storage_event(event) {
        Ok(l) => l,
        Err(e) => {
            tracing::error!("rejecting event: {e}");
            return JobResponse::invalid_event();
        }
    };
    tracing::info!(bucket = %location.bucket, key = %location.key, "processing object");

    let items = match objects.download(&location).and_then(|scratch| {
        let path: &Path = &scratch;
        read(path)
    }) {
        Ok(items) => items,
        Err(e) => {
            tracing::error!(key = %location.key, "failed to read object: {e}");
            return JobResponse::failure(e);
        }
    };

    let write = batch_write(store, table, &items);
    JobResponse::ok(IngestSummary {
        total: items.len(),
        write,
    })
}
