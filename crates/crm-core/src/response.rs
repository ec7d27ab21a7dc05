//! Validation and recording of prospect responses to follow-up emails.

use std::collections::HashMap;

use chrono::{DateTime, SecondsFormat, Utc};
use uuid::Uuid;

use crate::error::{CrmError, Result};
use crate::model::ResponseRecord;
use crate::store::{ItemStore, ToItem};
use crate::types::{response_type, ResponseType};

pub const PARAM_PROSPECT_ID: &str = "id";
pub const PARAM_RESPONSE: &str = "response";
pub const PARAM_TRANSACTION_ID: &str = "email_transaction_id";

const REQUIRED_PARAMS: [&str; 3] = [PARAM_PROSPECT_ID, PARAM_RESPONSE, PARAM_TRANSACTION_ID];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseQuery {
    pub prospect_id: String,
    pub response_type: ResponseType,
    pub email_transaction_id: String,
}

/// Check query parameters in a fixed order and report the first problem as
/// `CrmError::InvalidRequest` carrying the client-facing message.
pub fn validate_query(params: &HashMap<String, String>) -> Result<ResponseQuery> {
    for name in REQUIRED_PARAMS {
        if params.get(name).map_or(true, |v| v.is_empty()) {
            return Err(CrmError::InvalidRequest(format!(
                "Missing required parameter: {name}"
            )));
        }
    }
    let param = |name: &str| params.get(name).map(String::as_str).unwrap_or_default();

    let response_type = response_type::parse_from_string(param(PARAM_RESPONSE)).ok_or_else(|| {
        CrmError::InvalidRequest(format!(
            "Invalid response type. Must be one of: {}",
            response_type::valid_values()
        ))
    })?;

    let prospect_id = param(PARAM_PROSPECT_ID).trim();
    if prospect_id.is_empty() {
        return Err(CrmError::InvalidRequest("Prospect ID cannot be empty".into()));
    }
    let email_transaction_id = param(PARAM_TRANSACTION_ID).trim();
    if email_transaction_id.is_empty() {
        return Err(CrmError::InvalidRequest(
            "Email transaction ID cannot be empty".into(),
        ));
    }

    Ok(ResponseQuery {
        prospect_id: prospect_id.to_string(),
        response_type,
        email_transaction_id: email_transaction_id.to_string(),
    })
}

pub fn build_record(query: ResponseQuery, received_at: DateTime<Utc>) -> ResponseRecord {
    ResponseRecord {
        response_id: Uuid::new_v4().to_string(),
        received_at: received_at.to_rfc3339_opts(SecondsFormat::Secs, true),
        email_transaction_id: query.email_transaction_id,
        prospect_id: query.prospect_id,
        response_type: query.response_type,
    }
}

/// Persist one response. Store failures are returned as `CrmError::Store`.
pub fn save_record(store: &dyn ItemStore, table: &str, record: &ResponseRecord) -> Result<()> {
    store.put(table, record.to_item())?;
    tracing::info!(
        table,
        response_id = %record.response_id,
        prospect = %record.prospect_id,
        response = response_type::to_display_string(record.response_type),
        "response recorded"
    );
    Ok(())
}
