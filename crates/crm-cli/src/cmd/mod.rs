pub mod dump;
pub mod products;
pub mod quotes;
pub mod sales_reps;
pub mod serve;

use anyhow::{Context, Result};
use crm_core::event::parse_storage_event;
use crm_core::jobs::JobResponse;
use serde_json::Value;
use std::io::Read;

use crate::output::print_json;

/// Read the storage event from a file, or stdin when `source` is `-`.
pub fn read_event(source: &str) -> Result<Value> {
    let raw = if source == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("failed to read event from stdin")?;
        buf
    } else {
        std::fs::read_to_string(source).with_context(|| format!("failed to read event {source}"))?
    };
    serde_json::from_str(&raw).context("event is not valid JSON")
}

/// Read the event and check its shape before any store or reference data is
/// opened. An invalid event prints the 400 response and yields `None`.
pub fn accept_event(source: &str) -> Result<Option<Value>> {
    let event = read_event(source)?;
    if let Err(e) = parse_storage_event(&event) {
        tracing::error!("rejecting event: {e}");
        print_json(&JobResponse::invalid_event())?;
        return Ok(None);
    }
    Ok(Some(event))
}
