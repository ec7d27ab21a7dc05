//! Join of quote headers with their line items, contact, and sales rep.

use std::collections::HashMap;

use rust_decimal::Decimal;

use crate::error::{CrmError, Result};
use crate::model::{Quote, RawRecord};
use crate::reader::{QuoteTables, SalesRepTable};
use crate::resolver::{self, ContactTable};
use crate::types::quote_status;

/// Column names of the quote header (`cotizac`) and line-item (`cotizad`)
/// tables.
pub mod fields {
    pub const QUOTE_ID: &str = "NO_COT";
    pub const CONTACT_KEY: &str = "CVE_CTE";
    pub const CONTACT_KIND: &str = "TIPO_CTE";
    pub const SALES_REP_ID: &str = "CVE_AGE";
    pub const TOTAL: &str = "TOTAL_COT";
    pub const STATUS: &str = "STATUS_COT";
    pub const CREATED_AT: &str = "F_ALTA_COT";
    pub const PRODUCT_ID: &str = "CVE_PROD";
}

/// Product ids per canonical quote id, in line-item order.
pub type GroupedItems = HashMap<String, Vec<String>>;

/// Group line items by parent quote in a single pass.
pub fn group_items_by_quote(items: &[RawRecord]) -> GroupedItems {
    let mut grouped = GroupedItems::new();
    for item in items {
        let quote_id = item.text(fields::QUOTE_ID);
        let product_id = item.text(fields::PRODUCT_ID);
        if quote_id.is_empty() || product_id.is_empty() {
            continue;
        }
        grouped.entry(quote_id).or_default().push(product_id);
    }
    grouped
}

/// Build one quote from its header row.
///
/// `Ok(None)` when the counterparty cannot be resolved to a contact with an
/// email; such quotes are never constructed. `Err` when the row itself is
/// unusable.
pub fn assemble(
    header: &RawRecord,
    grouped: &GroupedItems,
    clients: &ContactTable,
    prospects: &ContactTable,
    sales_reps: &SalesRepTable,
) -> Result<Option<Quote>> {
    let id = header.text(fields::QUOTE_ID);
    if id.is_empty() {
        return Err(CrmError::InvalidRecord(format!(
            "quote header without {}",
            fields::QUOTE_ID
        )));
    }

    let Some(contact) = resolver::resolve(
        &header.text(fields::CONTACT_KIND),
        &header.text(fields::CONTACT_KEY),
        prospects,
        clients,
    ) else {
        tracing::debug!(quote = %id, "skipping quote: no contact with email");
        return Ok(None);
    };

    let amount = match header.get(fields::TOTAL) {
        Some(value) => value
            .to_decimal()
            .map_err(|e| CrmError::InvalidRecord(format!("quote {id}: {}: {e}", fields::TOTAL)))?
            .unwrap_or(Decimal::ZERO),
        None => Decimal::ZERO,
    };

    Ok(Some(Quote {
        item_ids: grouped.get(&id).cloned().unwrap_or_default(),
        contact,
        sales_rep: sales_reps.lookup(&header.text(fields::SALES_REP_ID)),
        amount,
        status: quote_status::parse_from_string(&header.text(fields::STATUS)),
        created_at: header.text(fields::CREATED_AT),
        id,
    }))
}

/// Assemble every quote in `tables`. Rows that fail are logged and skipped.
pub fn assemble_all(tables: &QuoteTables, sales_reps: &SalesRepTable) -> Vec<Quote> {
    let grouped = group_items_by_quote(&tables.items);
    let clients = ContactTable::clients(tables.clients.iter().cloned());
    let prospects = ContactTable::prospects(tables.prospects.iter().cloned());

    let mut quotes = Vec::with_capacity(tables.headers.len());
    let mut dropped = 0usize;
    for header in &tables.headers {
        match assemble(header, &grouped, &clients, &prospects, sales_reps) {
            Ok(Some(quote)) => quotes.push(quote),
            Ok(None) => dropped += 1,
            Err(e) => {
                dropped += 1;
                tracing::error!(quote = %header.text(fields::QUOTE_ID), "error parsing quote record: {e}");
            }
        }
    }
    tracing::info!(assembled = quotes.len(), dropped, "assembled quotes");
    quotes
}
