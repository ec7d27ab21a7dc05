use crate::store::{KvItem, ToItem};
use crate::types::{email_status, quote_status, response_type};
use crate::types::{EmailStatus, QuoteStatus, ResponseType};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::json;

// ---------------------------------------------------------------------------
// FieldValue / RawRecord
// ---------------------------------------------------------------------------

/// A single decoded cell from a CSV export or DBF table.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Null,
    Text(String),
    Integer(i64),
    Decimal(Decimal),
    Date(NaiveDate),
    Bool(bool),
}

impl FieldValue {
    /// Canonical string form used for joins and persisted ids.
    ///
    /// Numbers lose formatting artifacts (`12.00` and `12` both become `12`),
    /// dates are ISO `YYYY-MM-DD`, text is trimmed, null is empty.
    pub fn canonical(&self) -> String {
        match self {
            FieldValue::Null => String::new(),
            FieldValue::Text(s) => s.trim().to_string(),
            FieldValue::Integer(i) => i.to_string(),
            FieldValue::Decimal(d) => d.normalize().to_string(),
            FieldValue::Date(d) => d.format("%Y-%m-%d").to_string(),
            FieldValue::Bool(b) => b.to_string(),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    /// Numeric view of the value. `Ok(None)` for null or blank text.
    pub fn to_decimal(&self) -> Result<Option<Decimal>, String> {
        match self {
            FieldValue::Null => Ok(None),
            FieldValue::Integer(i) => Ok(Some(Decimal::from(*i))),
            FieldValue::Decimal(d) => Ok(Some(*d)),
            FieldValue::Text(s) if s.trim().is_empty() => Ok(None),
            FieldValue::Text(s) => s
                .trim()
                .parse::<Decimal>()
                .map(Some)
                .map_err(|e| format!("'{}' is not a number: {e}", s.trim())),
            other => Err(format!("{other:?} is not a number")),
        }
    }
}

/// One source row: field names in source order with their decoded values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRecord {
    fields: Vec<(String, FieldValue)>,
}

impl RawRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, name: impl Into<String>, value: FieldValue) {
        self.fields.push((name.into(), value));
    }

    pub fn with(mut self, name: impl Into<String>, value: FieldValue) -> Self {
        self.push(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// Canonical string for `name`, empty when the field is absent.
    pub fn text(&self, name: &str) -> String {
        self.get(name).map(FieldValue::canonical).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Contact / SalesRep / Product
// ---------------------------------------------------------------------------

/// Counterparty of a quote, resolved from either the prospect or the client
/// table. Always carries a non-empty email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Contact {
    pub id: String,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SalesRep {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
}

impl SalesRep {
    /// Stand-in for an id that has no row in the reference table.
    pub fn placeholder(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }
}

impl ToItem for SalesRep {
    fn to_item(&self) -> KvItem {
        KvItem::new(
            &self.id,
            json!({
                "id": self.id,
                "name": self.name,
                "email": self.email,
                "phone": self.phone,
            }),
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Product {
    pub id: String,
    pub description: String,
    pub product_type: String,
}

impl ToItem for Product {
    fn to_item(&self) -> KvItem {
        KvItem::new(
            &self.id,
            json!({
                "id": self.id,
                "description": self.description,
                "product_type": self.product_type,
            }),
        )
    }
}

// ---------------------------------------------------------------------------
// Quote
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct Quote {
    pub id: String,
    pub contact: Contact,
    pub sales_rep: SalesRep,
    pub item_ids: Vec<String>,
    pub amount: Decimal,
    pub status: QuoteStatus,
    /// Verbatim from the source export.
    pub created_at: String,
}

impl ToItem for Quote {
    fn to_item(&self) -> KvItem {
        KvItem::new(
            &self.id,
            json!({
                "id": self.id,
                "contact_id": self.contact.id,
                "contact_name": self.contact.name,
                "contact_email": self.contact.email,
                "sales_rep_id": self.sales_rep.id,
                "sales_rep_name": self.sales_rep.name,
                "sales_rep_email": self.sales_rep.email,
                "sales_rep_phone": self.sales_rep.phone,
                "item_ids": self.item_ids,
                "amount": self.amount.to_string(),
                "status": quote_status::to_display_string(self.status),
                "created_at": self.created_at,
            }),
        )
    }
}

// ---------------------------------------------------------------------------
// EmailTransaction
// ---------------------------------------------------------------------------

/// Audit record for one delivered follow-up email. Append-only.
#[derive(Debug, Clone, PartialEq)]
pub struct EmailTransaction {
    pub id: String,
    pub quote_id: String,
    pub email_address: String,
    pub sent_at: String,
    pub status: EmailStatus,
}

impl ToItem for EmailTransaction {
    fn to_item(&self) -> KvItem {
        KvItem::new(
            &self.id,
            json!({
                "id": self.id,
                "quote_id": self.quote_id,
                "email_address": self.email_address,
                "sent_at": self.sent_at,
                "status": email_status::to_display_string(self.status),
            }),
        )
    }
}

// ---------------------------------------------------------------------------
// ResponseRecord
// ---------------------------------------------------------------------------

/// A prospect's click on one of the response links in a follow-up email.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseRecord {
    pub response_id: String,
    pub received_at: String,
    pub email_transaction_id: String,
    pub prospect_id: String,
    pub response_type: ResponseType,
}

impl ToItem for ResponseRecord {
    fn to_item(&self) -> KvItem {
        KvItem::new(
            &self.response_id,
            json!({
                "response_id": self.response_id,
                "received_at": self.received_at,
                "email_transaction_id": self.email_transaction_id,
                "prospect_id": self.prospect_id,
                "response_type": response_type::to_display_string(self.response_type),
            }),
        )
    }
}

// ---------------------------------------------------------------------------
// DBWriteResult
// ---------------------------------------------------------------------------

/// Outcome of one `batch_write` call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DBWriteResult {
    pub successful_inserts: usize,
    pub failed_inserts: usize,
    pub failed_ids: Vec<String>,
    pub errors: Vec<String>,
}

impl DBWriteResult {
    pub fn record_failure(&mut self, id: impl Into<String>, error: impl Into<String>) {
        self.failed_inserts += 1;
        self.failed_ids.push(id.into());
        self.errors.push(error.into());
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
