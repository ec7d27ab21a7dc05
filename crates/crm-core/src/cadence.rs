//! Selection of quotes due for a follow-up email.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::path::Path;

use chrono::{DateTime, NaiveDate, NaiveDateTime};

use crate::config::CadenceConfig;
use crate::model::Quote;

const SECONDS_PER_DAY: i64 = 86_400;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CadenceMode {
    /// Every quote whose age matches an offset qualifies.
    #[default]
    EveryQuote,
    /// At most one quote per offset: the last one seen wins. Results are
    /// ordered by offset.
    OnePerOffset,
}

#[derive(Debug, Clone)]
pub struct CadenceFilter {
    offsets: BTreeSet<i64>,
    allow_list: Option<HashSet<String>>,
    mode: CadenceMode,
}

impl CadenceFilter {
    pub fn new(offsets: impl IntoIterator<Item = i64>) -> Self {
        Self {
            offsets: offsets.into_iter().collect(),
            allow_list: None,
            mode: CadenceMode::default(),
        }
    }

    pub fn with_allow_list(mut self, ids: impl IntoIterator<Item = String>) -> Self {
        self.allow_list = Some(ids.into_iter().collect());
        self
    }

    pub fn with_mode(mut self, mode: CadenceMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn from_config(config: &CadenceConfig) -> Self {
        let mode = if config.one_per_offset {
            CadenceMode::OnePerOffset
        } else {
            CadenceMode::EveryQuote
        };
        let filter = Self::new(config.offsets.iter().copied()).with_mode(mode);
        match &config.allow_list {
            Some(path) => filter.with_allow_list(load_allow_list(path)),
            None => filter,
        }
    }

    pub fn offsets(&self) -> &BTreeSet<i64> {
        &self.offsets
    }

    /// Quotes whose age in whole days at `now` is one of the offsets and,
    /// when an allow-list is set, whose id is on it.
    pub fn filter(&self, quotes: &[Quote], now: NaiveDateTime) -> Vec<Quote> {
        let due = quotes.iter().filter_map(|quote| {
            let Some(created) = parse_created_at(&quote.created_at) else {
                tracing::warn!(quote = %quote.id, created_at = %quote.created_at, "unparseable creation date");
                return None;
            };
            let age = days_since(created, now);
            if !self.offsets.contains(&age) {
                return None;
            }
            if let Some(allowed) = &self.allow_list {
                if !allowed.contains(&quote.id) {
                    tracing::debug!(quote = %quote.id, "quote not on allow-list");
                    return None;
                }
            }
            Some((age, quote))
        });

        let selected: Vec<Quote> = match self.mode {
            CadenceMode::EveryQuote => due.map(|(_, q)| q.clone()).collect(),
            CadenceMode::OnePerOffset => due
                .collect::<BTreeMap<i64, &Quote>>()
                .into_values()
                .cloned()
                .collect(),
        };
        tracing::info!(
            candidates = quotes.len(),
            selected = selected.len(),
            "applied email cadence"
        );
        selected
    }
}

/// Whole days from `created` to `now`, rounded down.
pub fn days_since(created: NaiveDateTime, now: NaiveDateTime) -> i64 {
    (now - created).num_seconds().div_euclid(SECONDS_PER_DAY)
}

/// Parse an ISO date or date-time as stored in `Quote::created_at`. A bare
/// date means midnight; an explicit offset is dropped after conversion to
/// that offset's wall-clock time.
pub fn parse_created_at(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if let Ok(d) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return d.and_hms_opt(0, 0, 0);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_local());
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
}

/// Read a JSON array of quote ids. Any failure yields an empty list, which
/// excludes every quote.
pub fn load_allow_list(path: &Path) -> HashSet<String> {
    let ids = std::fs::read_to_string(path)
        .map_err(|e| e.to_string())
        .and_then(|s| serde_json::from_str::<Vec<String>>(&s).map_err(|e| e.to_string()));
    match ids {
        Ok(ids) => ids.into_iter().map(|id| id.trim().to_string()).collect(),
        Err(e) => {
            tracing::warn!(path = %path.display(), "allow-list unavailable, excluding all quotes: {e}");
            HashSet::new()
        }
    }
}
