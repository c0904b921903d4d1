//! Error types for `taskdeck`.

/// Errors that can occur in the task data layer.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A JSON serialization error occurred.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A YAML serialization error occurred.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// The database could not be opened or its schema could not be
    /// ensured. Fatal for the current data-layer session; a later retry
    /// starts from a fresh handle.
    #[error("storage unavailable: {0}")]
    StorageUnavailable(#[source] rusqlite::Error),

    /// A write to storage failed. In-memory collections are not rolled
    /// back when a view mutation returns this; see [`crate::view`].
    #[error("storage write failed: {0}")]
    StorageWriteFailed(#[source] rusqlite::Error),

    /// A database query failed.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// A required field was empty after trimming.
    #[error("invalid input: {0} must not be empty")]
    InvalidInput(&'static str),

    /// An account with the given email already exists.
    #[error("an account with this email already exists")]
    EmailTaken,

    /// The email/password pair did not match any account. The same
    /// value is returned for an unknown email and a wrong password.
    #[error("invalid email or password")]
    InvalidCredentials,
}

/// A specialized Result type for this crate.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_input_display() {
        let err = Error::InvalidInput("email");
        assert_eq!(err.to_string(), "invalid input: email must not be empty");
    }

    #[test]
    fn test_credentials_error_does_not_name_the_failing_check() {
        let err = Error::InvalidCredentials;
        let message = err.to_string();
        assert!(!message.contains("password only"));
        assert!(!message.contains("account"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: Error = io.into();
        assert!(matches!(err, Error::Io(_)));
    }
}
