//! Error taxonomy shared by every DailySend crate.
//!
//! Per-contact and per-source failures are recoverable: the run counts them
//! and moves on. Everything else aborts the run.

use std::path::PathBuf;

/// Errors produced while loading contacts, delivering messages or persisting progress.
#[derive(Debug, thiserror::Error)]
pub enum DailySendError {
    /// A raw record did not normalize into a valid contact.
    #[error("invalid contact '{raw}': {reason}")]
    Validation { raw: String, reason: String },

    /// One contact source could not be parsed; it is skipped.
    #[error("failed to parse source '{source_name}': {reason}")]
    SourceParse { source_name: String, reason: String },

    /// No source matched any configured pattern, or nothing could be read from them.
    #[error("no contacts found (patterns: {})", patterns.join(", "))]
    NoContactsFound { patterns: Vec<String> },

    /// Sources were read but every record failed validation.
    #[error("catalog is empty: all {rejected} records failed validation")]
    EmptyCatalog { rejected: usize },

    /// A single delivery attempt failed.
    #[error("delivery failed: {0}")]
    Delivery(String),

    /// Progress could not be written or read back; counters are at risk.
    #[error("persistence failure: {0}")]
    Persistence(String),

    /// No media file to attach to outgoing messages.
    #[error("no attachment found at {}", path.display())]
    MissingAttachment { path: PathBuf },

    #[error("configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, DailySendError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_contacts_message_lists_patterns() {
        let err = DailySendError::NoContactsFound {
            patterns: vec!["SDB (*.csv".into(), "contacts*.csv".into()],
        };
        assert_eq!(
            err.to_string(),
            "no contacts found (patterns: SDB (*.csv, contacts*.csv)"
        );
    }
}
