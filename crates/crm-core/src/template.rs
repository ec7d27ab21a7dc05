//! `{{ name }}` placeholder rendering for the quote email body.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::OnceLock;

use regex::{Captures, Regex};

use crate::error::{CrmError, Result};

static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();

fn placeholder() -> &'static Regex {
    PLACEHOLDER.get_or_init(|| Regex::new(r"\{\{\s*([A-Za-z_][A-Za-z0-9_]*)\s*\}\}").unwrap())
}

pub type TemplateVars = BTreeMap<String, String>;

#[derive(Debug, Clone)]
pub struct Template {
    source: String,
}

impl Template {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        std::fs::read_to_string(path)
            .map(Self::new)
            .map_err(|e| CrmError::Template(format!("{}: {e}", path.display())))
    }

    /// Substitute every placeholder. Values are HTML-escaped; names with no
    /// value render as an empty string.
    pub fn render(&self, vars: &TemplateVars) -> String {
        placeholder()
            .replace_all(&self.source, |caps: &Captures| {
                vars.get(&caps[1]).map(|v| escape_html(v)).unwrap_or_default()
            })
            .into_owned()
    }
}

pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}
