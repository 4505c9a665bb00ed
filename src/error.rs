//! Error types for ledgermail.

use thiserror::Error;

/// Common error type for ledgermail operations.
#[derive(Error, Debug)]
pub enum MailError {
    /// Content or name absent. This is an expected outcome for lookups,
    /// not a fault: reading an unknown hash or an unbound address lands here.
    #[error("{0} not found")]
    NotFound(String),

    /// A name is already bound to this mailbox.
    #[error("name already registered: {0}")]
    AlreadyRegistered(String),

    /// Backing store write/read failure.
    #[error("storage error: {0}")]
    Storage(String),

    /// Malformed message content. Callers must treat this as a
    /// data-integrity issue, not a retryable transient.
    #[error("decode error: {0}")]
    Decode(String),

    /// Directory call failure.
    #[error("directory error: {0}")]
    Directory(String),

    /// Validation error for caller input.
    #[error("validation error: {0}")]
    Validation(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Result type alias for ledgermail operations.
pub type Result<T> = std::result::Result<T, MailError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_display() {
        let err = MailError::NotFound("content 1234".to_string());
        assert_eq!(err.to_string(), "content 1234 not found");
    }

    #[test]
    fn test_already_registered_display() {
        let err = MailError::AlreadyRegistered("alice".to_string());
        assert_eq!(err.to_string(), "name already registered: alice");
    }

    #[test]
    fn test_storage_display() {
        let err = MailError::Storage("disk full".to_string());
        assert_eq!(err.to_string(), "storage error: disk full");
    }

    #[test]
    fn test_decode_display() {
        let err = MailError::Decode("missing required field `from`".to_string());
        assert_eq!(
            err.to_string(),
            "decode error: missing required field `from`"
        );
    }

    #[test]
    fn test_validation_display() {
        let err = MailError::Validation("destination name is empty".to_string());
        assert_eq!(
            err.to_string(),
            "validation error: destination name is empty"
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: MailError = io_err.into();
        assert!(matches!(err, MailError::Io(_)));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_result_alias() {
        fn sample_ok() -> Result<i32> {
            Ok(42)
        }

        fn sample_err() -> Result<i32> {
            Err(MailError::Directory("timeout".to_string()))
        }

        assert_eq!(sample_ok().unwrap(), 42);
        assert!(sample_err().is_err());
    }
}
