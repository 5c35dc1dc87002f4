//! Error types for the upkeep engine.
//!
//! Only store failures and caller mistakes (unknown ids, bad input) surface
//! as errors. Problems with individual records during a sync or completion
//! pass are logged and skipped instead.

use std::path::PathBuf;
use thiserror::Error;

use crate::models::SourceType;

#[derive(Debug, Error)]
pub enum UpkeepError {
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to (de)serialize {what}: {source}")]
    Json {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to parse config {}: {message}", path.display())]
    ConfigParse { path: PathBuf, message: String },

    #[error("invalid date '{0}', use YYYY-MM-DD")]
    InvalidDate(String),

    #[error("invalid recurrence pattern '{0}'")]
    InvalidPattern(String),

    #[error("unknown source type '{0}'")]
    UnknownSourceType(String),

    #[error(transparent)]
    Provenance(#[from] ProvenanceError),

    #[error("{source_type} item {id} not found")]
    ItemNotFound { source_type: SourceType, id: u64 },

    #[error("reminder {0} not found")]
    ReminderNotFound(u64),

    #[error("template {0} not found")]
    TemplateNotFound(u64),

    #[error("store lock poisoned")]
    LockPoisoned,
}

/// Failure to parse a provenance key. Kept separate so sync can log it
/// against the offending reminder without aborting the pass.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProvenanceError {
    #[error("missing 'auto:' prefix in '{0}'")]
    MissingPrefix(String),

    #[error("malformed provenance '{0}'")]
    Malformed(String),

    #[error("unknown provenance tag '{0}'")]
    UnknownTag(String),

    #[error("bad record id '{0}'")]
    BadId(String),

    #[error("bad group key '{0}'")]
    BadGroupKey(String),
}

pub type Result<T> = std::result::Result<T, UpkeepError>;
