use thiserror::Error;

#[derive(Debug, Error)]
pub enum CrmError {
    #[error("environment variable '{0}' is not set")]
    MissingConfig(String),

    #[error("invalid event: {0}")]
    InvalidEvent(String),

    #[error("invalid record: {0}")]
    InvalidRecord(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("object not found: {0}")]
    ObjectNotFound(String),

    #[error("malformed DBF table '{table}': {reason}")]
    Dbf { table: String, reason: String },

    #[error("required table missing from archive: {0}")]
    MissingTable(String),

    #[error("store error: {0}")]
    Store(String),

    #[error("mail transport error: {0}")]
    Mail(String),

    #[error("template error: {0}")]
    Template(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Zip(#[from] zip::result::ZipError),
}

pub type Result<T> = std::result::Result<T, CrmError>;
