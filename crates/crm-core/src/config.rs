//! Job configuration, built once at process entry and passed down.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{CrmError, Result};

pub const DEFAULT_STORE_PATH: &str = "crm.redb";
pub const DEFAULT_OBJECT_ROOT: &str = ".";
pub const DEFAULT_TEMPLATE_PATH: &str = "assets/template.html";

// ---------------------------------------------------------------------------
// EnvSource
// ---------------------------------------------------------------------------

/// Source of configuration variables. Unset and empty are the same.
pub trait EnvSource {
    fn var(&self, name: &str) -> Option<String>;

    fn require(&self, name: &str) -> Result<String> {
        self.optional(name)
            .ok_or_else(|| CrmError::MissingConfig(name.to_string()))
    }

    fn optional(&self, name: &str) -> Option<String> {
        self.var(name).filter(|v| !v.trim().is_empty())
    }

    fn or_default(&self, name: &str, default: &str) -> String {
        self.optional(name).unwrap_or_else(|| default.to_string())
    }
}

/// The process environment.
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn var(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

impl EnvSource for HashMap<String, String> {
    fn var(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

// ---------------------------------------------------------------------------
// Job configs
// ---------------------------------------------------------------------------

/// Products and sales-rep sync jobs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestConfig {
    pub table_name: String,
    pub store_path: PathBuf,
    pub object_root: PathBuf,
}

impl IngestConfig {
    pub fn from_env(env: &dyn EnvSource) -> Result<Self> {
        Ok(Self {
            table_name: env.require("TABLE_NAME")?,
            store_path: env.or_default("CRM_STORE_PATH", DEFAULT_STORE_PATH).into(),
            object_root: env.or_default("CRM_OBJECT_ROOT", DEFAULT_OBJECT_ROOT).into(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailConfig {
    pub sender: String,
    pub endpoint: String,
    pub api_key: Option<String>,
}

impl MailConfig {
    pub fn from_env(env: &dyn EnvSource) -> Result<Self> {
        Ok(Self {
            sender: env.require("SENDER_EMAIL")?,
            endpoint: env.require("MAIL_ENDPOINT")?,
            api_key: env.optional("MAIL_API_KEY"),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuotesConfig {
    pub quotes_table: String,
    pub transactions_table: String,
    pub mail: MailConfig,
    pub template_path: PathBuf,
    pub sales_reps_path: Option<PathBuf>,
    pub cadence_path: Option<PathBuf>,
    pub store_path: PathBuf,
    pub object_root: PathBuf,
}

impl QuotesConfig {
    pub fn from_env(env: &dyn EnvSource) -> Result<Self> {
        Ok(Self {
            quotes_table: env.require("QUOTES_TABLE_NAME")?,
            transactions_table: env.require("TRANSACTIONS_TABLE_NAME")?,
            mail: MailConfig::from_env(env)?,
            template_path: env.or_default("TEMPLATE_PATH", DEFAULT_TEMPLATE_PATH).into(),
            sales_reps_path: env.optional("SALES_REPS_PATH").map(PathBuf::from),
            cadence_path: env.optional("CADENCE_CONFIG_PATH").map(PathBuf::from),
            store_path: env.or_default("CRM_STORE_PATH", DEFAULT_STORE_PATH).into(),
            object_root: env.or_default("CRM_OBJECT_ROOT", DEFAULT_OBJECT_ROOT).into(),
        })
    }
}

/// Web-response endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseApiConfig {
    pub table_name: String,
    pub enable_cors: bool,
    pub store_path: PathBuf,
}

impl ResponseApiConfig {
    pub fn from_env(env: &dyn EnvSource) -> Result<Self> {
        Ok(Self {
            table_name: env.require("TABLE_NAME")?,
            enable_cors: env.require("ENABLE_CORS")?.trim().eq_ignore_ascii_case("true"),
            store_path: env.or_default("CRM_STORE_PATH", DEFAULT_STORE_PATH).into(),
        })
    }
}

// ---------------------------------------------------------------------------
// CadenceConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CadenceConfig {
    /// Days after creation on which a follow-up is sent.
    #[serde(default = "default_offsets")]
    pub offsets: Vec<i64>,
    #[serde(default)]
    pub one_per_offset: bool,
    /// JSON array of quote ids allowed to receive email.
    #[serde(default)]
    pub allow_list: Option<PathBuf>,
}

fn default_offsets() -> Vec<i64> {
    vec![3, 5, 7]
}

impl Default for CadenceConfig {
    fn default() -> Self {
        Self {
            offsets: default_offsets(),
            one_per_offset: false,
            allow_list: None,
        }
    }
}

impl CadenceConfig {
    /// Load from YAML. A relative `allow_list` resolves against the config
    /// file's directory.
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        let mut cfg: CadenceConfig = serde_yaml::from_str(&data)?;
        if let (Some(list), Some(dir)) = (&cfg.allow_list, path.parent()) {
            if list.is_relative() {
                cfg.allow_list = Some(dir.join(list));
            }
        }
        Ok(cfg)
    }

    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::load(p),
            None => Ok(Self::default()),
        }
    }
}
