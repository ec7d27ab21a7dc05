use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

use crate::error::Result;
use crate::model::SalesRep;

/// One row of the sales-rep sheet (`AGENTE,NOMBRE,EMAIL,TEL`, UTF-8).
#[derive(Debug, Deserialize)]
struct SalesRepRow {
    #[serde(rename = "AGENTE", default)]
    id: String,
    #[serde(rename = "NOMBRE", default)]
    name: String,
    #[serde(rename = "EMAIL", default)]
    email: String,
    #[serde(rename = "TEL", default)]
    phone: String,
}

impl From<SalesRepRow> for SalesRep {
    fn from(row: SalesRepRow) -> Self {
        SalesRep {
            id: row.id.trim().to_string(),
            name: row.name.trim().to_string(),
            email: row.email.trim().to_string(),
            phone: row.phone.trim().to_string(),
        }
    }
}

/// Read all sales reps. A missing file reads as an empty sheet.
pub fn read_sales_reps(path: &Path) -> Result<Vec<SalesRep>> {
    if !path.exists() {
        tracing::warn!(path = %path.display(), "sales rep sheet not found");
        return Ok(Vec::new());
    }
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_path(path)?;
    let mut reps = Vec::new();
    for row in reader.deserialize::<SalesRepRow>() {
        reps.push(SalesRep::from(row?));
    }
    tracing::info!(count = reps.len(), path = %path.display(), "read sales reps");
    Ok(reps)
}

// ---------------------------------------------------------------------------
// SalesRepTable
// ---------------------------------------------------------------------------

/// Sales reps indexed by id for the quote join.
#[derive(Debug, Clone, Default)]
pub struct SalesRepTable {
    by_id: HashMap<String, SalesRep>,
}

impl SalesRepTable {
    pub fn new(reps: impl IntoIterator<Item = SalesRep>) -> Self {
        let by_id = reps
            .into_iter()
            .filter(|r| !r.id.is_empty())
            .map(|r| (r.id.clone(), r))
            .collect();
        Self { by_id }
    }

    pub fn load(path: &Path) -> Result<Self> {
        Ok(Self::new(read_sales_reps(path)?))
    }

    /// The rep for `id`, or a placeholder with empty contact fields.
    pub fn lookup(&self, id: &str) -> SalesRep {
        let id = id.trim();
        self.by_id
            .get(id)
            .cloned()
            .unwrap_or_else(|| SalesRep::placeholder(id))
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}
