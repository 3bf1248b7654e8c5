//! Error types for the laser protocol.
//!
//! `LaserError` is the single error type returned by transports, the protocol
//! engine and the client. It is built with `thiserror` so that I/O errors can be
//! lifted with `?`.
//!
//! ## Error Hierarchy
//!
//! - **`UnknownCommand`**: the token is not present in the bound device table.
//! - **`Protocol`**: the device answered, but the payload did not contain the
//!   expected echo or response shape (NAK, corrupted frame, unexpected value).
//! - **`Timeout`**: no complete response within the configured timeout.
//! - **`ValueFormat`**: the response shape matched but the captured text did not
//!   parse as the declared type. Also raised when a Set argument cannot be
//!   coerced to the declared type.
//! - **`Connection`**: the transport could not be opened at construction time.
//! - **`MissingValue`**: a Set command that declares a value type was sent
//!   without one.
//! - **`Io`**: any other transport I/O failure after the connection is open.
//! - **`Config`**: invalid connection settings or device table data.
//! - **`Closed`**: an exchange was attempted on a closed transport.
//!
//! Nothing in this crate retries; every error surfaces from the call that
//! caused it.

use std::io;

use thiserror::Error;

use crate::value::ValueType;

/// Convenience alias for results using the laser error type.
pub type LaserResult<T> = std::result::Result<T, LaserError>;

#[allow(missing_docs)]
#[derive(Error, Debug)]
pub enum LaserError {
    #[error("Unknown command {0}")]
    UnknownCommand(String),

    #[error("Unexpected response from device: {0:?}")]
    Protocol(String),

    #[error("Timed out waiting for response")]
    Timeout,

    #[error("Cannot read {value:?} as {value_type}")]
    ValueFormat { value: String, value_type: ValueType },

    #[error("Failed to connect to {target}: {source}")]
    Connection {
        target: String,
        #[source]
        source: io::Error,
    },

    #[error("Command {0} requires a value")]
    MissingValue(String),

    #[error("I/O error: {0}")]
    Io(#[source] io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Transport is closed")]
    Closed,
}

impl LaserError {
    /// Wrap a connection-time failure for `target`.
    pub fn connection(target: impl Into<String>, source: io::Error) -> Self {
        LaserError::Connection {
            target: target.into(),
            source,
        }
    }

    /// True for failures where the device may still answer a later request.
    pub fn is_timeout(&self) -> bool {
        matches!(self, LaserError::Timeout)
    }
}

impl From<io::Error> for LaserError {
    fn from(err: io::Error) -> Self {
        match err.kind() {
            // Socket read timeouts report WouldBlock on Unix and TimedOut on Windows.
            io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => LaserError::Timeout,
            _ => LaserError::Io(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = LaserError::UnknownCommand("ZZZ".to_string());
        assert_eq!(err.to_string(), "Unknown command ZZZ");

        let err = LaserError::ValueFormat {
            value: "abc".to_string(),
            value_type: ValueType::Float,
        };
        assert_eq!(err.to_string(), "Cannot read \"abc\" as float");
    }

    #[test]
    fn test_io_timeout_maps_to_timeout() {
        let err: LaserError = io::Error::new(io::ErrorKind::WouldBlock, "again").into();
        assert!(err.is_timeout());

        let err: LaserError = io::Error::new(io::ErrorKind::TimedOut, "late").into();
        assert!(err.is_timeout());
    }

    #[test]
    fn test_other_io_stays_io() {
        let err: LaserError = io::Error::new(io::ErrorKind::BrokenPipe, "gone").into();
        assert!(matches!(err, LaserError::Io(_)));
    }

    #[test]
    fn test_connection_error_names_target() {
        let err = LaserError::connection(
            "10.0.0.1:10001",
            io::Error::new(io::ErrorKind::ConnectionRefused, "refused"),
        );
        assert!(err.to_string().starts_with("Failed to connect to 10.0.0.1:10001"));
    }
}
