//! Error types for the shift store.

use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

/// Result type alias for shift store operations.
pub type StateResult<T> = Result<T, StateError>;

/// Marker that identifies an index-infrastructure failure in query error text.
const MISSING_INDEX_MARKER: &str = "index";

static REMEDIATION_LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"https://[^\s]+").expect("remediation link pattern is valid"));

fn link_suffix(link: &Option<String>) -> String {
    link.as_deref()
        .map(|l| format!(" (create it at {l})"))
        .unwrap_or_default()
}

/// Errors that can occur during shift store operations.
#[derive(Debug, Error)]
pub enum StateError {
    #[error("failed to open database: {0}")]
    Open(String),

    #[error("transaction error: {0}")]
    Transaction(String),

    #[error("table error: {0}")]
    Table(String),

    #[error("read error: {0}")]
    Read(String),

    #[error("write error: {0}")]
    Write(String),

    #[error("serialization error: {0}")]
    Serialize(String),

    #[error("deserialization error: {0}")]
    Deserialize(String),

    #[error("not found: {0}")]
    NotFound(String),

    /// No store is configured; nothing is read or written.
    #[error("store is offline")]
    Offline,

    /// A partitioned, ordered query has no index to run on. It will never
    /// produce data until the index exists.
    #[error("missing query index{}", link_suffix(.link))]
    MissingIndex { link: Option<String> },
}

impl StateError {
    /// Classify the text of a failed query. Index-infrastructure failures
    /// are only reported out of band, as a message that mentions the index
    /// and usually embeds a link to create it.
    pub fn from_query_message(message: &str) -> Self {
        if message.contains(MISSING_INDEX_MARKER) {
            StateError::MissingIndex {
                link: REMEDIATION_LINK
                    .find(message)
                    .map(|m| m.as_str().to_string()),
            }
        } else {
            StateError::Read(message.to_string())
        }
    }

    pub fn is_missing_index(&self) -> bool {
        matches!(self, StateError::MissingIndex { .. })
    }

    pub fn is_offline(&self) -> bool {
        matches!(self, StateError::Offline)
    }
}
