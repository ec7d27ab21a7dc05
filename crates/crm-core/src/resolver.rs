//! Resolution of a quote's counterparty into a single `Contact`.

use std::collections::HashMap;

use crate::model::{Contact, RawRecord};

/// `TIPO_CTE` value for quotes addressed to a prospect.
pub const PROSPECT_MARKER: &str = "P";
/// `TIPO_CTE` value for quotes addressed to an existing client.
pub const CLIENT_MARKER: &str = "C";

/// Separators tried, in order, when an email field holds several addresses.
const EMAIL_SEPARATORS: [char; 4] = [';', ',', ' ', '|'];

/// Column names of a contact source table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContactFields {
    pub id: &'static str,
    pub name: &'static str,
    pub email: &'static str,
}

pub const PROSPECT_FIELDS: ContactFields = ContactFields {
    id: "CVE_PROS",
    name: "NOM_PROS",
    email: "EMAIL_PROS",
};

pub const CLIENT_FIELDS: ContactFields = ContactFields {
    id: "CVE_CTE",
    name: "NOM_CTE",
    email: "EMAIL_CTE",
};

/// Rows of a prospect or client table keyed by canonical id.
#[derive(Debug, Clone)]
pub struct ContactTable {
    fields: ContactFields,
    rows: HashMap<String, RawRecord>,
}

impl ContactTable {
    /// Index `records` by their id column. A repeated id keeps the last row.
    pub fn new(fields: ContactFields, records: impl IntoIterator<Item = RawRecord>) -> Self {
        let rows = records
            .into_iter()
            .map(|r| (r.text(fields.id), r))
            .collect();
        Self { fields, rows }
    }

    pub fn prospects(records: impl IntoIterator<Item = RawRecord>) -> Self {
        Self::new(PROSPECT_FIELDS, records)
    }

    pub fn clients(records: impl IntoIterator<Item = RawRecord>) -> Self {
        Self::new(CLIENT_FIELDS, records)
    }

    /// The contact stored under `key`, if it has a usable email.
    pub fn contact(&self, key: &str) -> Option<Contact> {
        let row = self.rows.get(key.trim())?;
        let email = extract_email(&row.text(self.fields.email));
        if email.is_empty() {
            return None;
        }
        Some(Contact {
            id: row.text(self.fields.id),
            name: row.text(self.fields.name),
            email,
        })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Resolve the contact a quote header points at.
///
/// `discriminator` selects the table (`P` prospects, `C` clients). Any other
/// discriminator yields `None`, as does a key without a usable contact.
pub fn resolve(
    discriminator: &str,
    key: &str,
    prospects: &ContactTable,
    clients: &ContactTable,
) -> Option<Contact> {
    match discriminator.trim().to_uppercase().as_str() {
        PROSPECT_MARKER => prospects.contact(key),
        CLIENT_MARKER => clients.contact(key),
        _ => None,
    }
}

/// First address in a field that may list several.
///
/// Splits on the first separator kind present (`;` then `,` then space then
/// `|`) and returns the first piece containing `@`. Without separators the
/// whole field is returned if it contains `@`. Otherwise empty.
pub fn extract_email(raw: &str) -> String {
    let raw = raw.trim();
    if raw.is_empty() {
        return String::new();
    }
    if let Some(sep) = EMAIL_SEPARATORS.iter().find(|s| raw.contains(**s)) {
        return raw
            .split(*sep)
            .map(str::trim)
            .find(|candidate| candidate.contains('@'))
            .unwrap_or_default()
            .to_string();
    }
    if raw.contains('@') {
        raw.to_string()
    } else {
        String::new()
    }
}
