//! Error types for bambu-core.
//!
//! This module defines all error types that can occur when talking to a
//! printer over MQTT or FTPS, and when managing several printers at once.
//!
//! Nothing in this crate retries on its own. The table below is a guide for
//! callers that want to.
//!
//! | Error Type | Strategy | Rationale |
//! |------------|----------|-----------|
//! | [`Error::Timeout`] | Retry later | Printer asleep, busy or unreachable |
//! | [`Error::Mqtt`] / [`Error::Io`] | Retry later | Network fault |
//! | [`Error::ConnectionFailed`] | Check access code | Broker refused the session |
//! | [`Error::Tls`] | Do not retry | Handshake cannot succeed as configured |
//! | [`Error::Ftp`] | Depends on code | 5xx replies are permanent |
//! | [`Error::Cancelled`] | Do not retry | Caller asked to stop |
//! | [`Error::InvalidConfig`] | Do not retry | Fix configuration and restart |
//! | [`Error::Disposed`] | Do not retry | Create a new printer |

use std::time::Duration;

use thiserror::Error;

/// Errors that can occur when communicating with a printer.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new error variants
/// in future versions without breaking downstream code.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// MQTT transport or protocol error from the event loop.
    #[error("MQTT error: {0}")]
    Mqtt(#[from] rumqttc::ConnectionError),

    /// MQTT request could not be queued (client side).
    #[error("MQTT client error: {0}")]
    Client(#[from] rumqttc::ClientError),

    /// TLS configuration or handshake error.
    #[error("TLS error: {0}")]
    Tls(#[from] rustls::Error),

    /// I/O error.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// The broker refused the session or closed it before it was usable.
    #[error("Connection to {host} failed: {reason}")]
    ConnectionFailed {
        /// Printer host or IP.
        host: String,
        /// What went wrong.
        reason: String,
    },

    /// Unexpected reply from the FTPS server.
    #[error("FTP error {code}: {message}")]
    Ftp {
        /// Three-digit reply code (0 when the reply was unparseable).
        code: u16,
        /// Reply text.
        message: String,
    },

    /// Operation timed out.
    #[error("Operation '{operation}' timed out after {duration:?}")]
    Timeout {
        /// The operation that timed out.
        operation: String,
        /// The timeout duration.
        duration: Duration,
    },

    /// Operation was cancelled.
    #[error("Operation cancelled")]
    Cancelled,

    /// A report could not be decoded.
    #[error("Decode error: {0}")]
    Decode(#[from] bambu_types::DecodeError),

    /// Invalid configuration provided.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A printer with this IP is already registered.
    #[error("Printer with IP {0} already exists.")]
    DuplicatePrinter(String),

    /// No printer with this IP is registered.
    #[error("Printer with IP {0} not found")]
    PrinterNotFound(String),

    /// The printer has been disposed.
    #[error("Printer has been disposed")]
    Disposed,
}

impl Error {
    /// Create a timeout error with operation context.
    pub fn timeout(operation: impl Into<String>, duration: Duration) -> Self {
        Self::Timeout {
            operation: operation.into(),
            duration,
        }
    }

    /// Create a configuration error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig(message.into())
    }

    /// Create a connection failure for a host.
    pub fn connection_failed(host: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ConnectionFailed {
            host: host.into(),
            reason: reason.into(),
        }
    }

    /// Create an FTP reply error.
    pub fn ftp(code: u16, message: impl Into<String>) -> Self {
        Self::Ftp {
            code,
            message: message.into(),
        }
    }

    /// Whether the error came from the network or TLS layer.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Error::Mqtt(_) | Error::Client(_) | Error::Tls(_) | Error::Io(_)
        )
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::Timeout { .. })
    }
}

/// Result type alias using bambu-core's Error type.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::timeout("connect", Duration::from_secs(10));
        assert!(err.to_string().contains("connect"));
        assert!(err.to_string().contains("10s"));

        let err = Error::DuplicatePrinter("192.168.1.50".to_string());
        assert_eq!(
            err.to_string(),
            "Printer with IP 192.168.1.50 already exists."
        );

        let err = Error::ftp(530, "Login incorrect.");
        assert_eq!(err.to_string(), "FTP error 530: Login incorrect.");

        let err = Error::connection_failed("10.0.0.2", "bad username or password");
        assert!(err.to_string().contains("10.0.0.2"));
        assert!(err.to_string().contains("bad username"));
    }

    #[test]
    fn test_error_classification() {
        let io = Error::from(std::io::Error::new(
            std::io::ErrorKind::ConnectionRefused,
            "refused",
        ));
        assert!(io.is_transport());
        assert!(!io.is_timeout());

        let timeout = Error::timeout("list_files", Duration::from_secs(5));
        assert!(timeout.is_timeout());
        assert!(!timeout.is_transport());

        assert!(!Error::Cancelled.is_transport());
        assert!(!Error::Disposed.is_timeout());
    }

    #[test]
    fn test_decode_error_conversion() {
        let decode = bambu_types::Report::from_json_str("[]").unwrap_err();
        let err: Error = decode.into();
        assert!(matches!(err, Error::Decode(_)));
        assert!(err.to_string().contains("not a JSON object"));
    }

    #[test]
    fn test_invalid_config() {
        let err = Error::invalid_config("access code must not be empty");
        assert_eq!(
            err.to_string(),
            "Invalid configuration: access code must not be empty"
        );
    }
}
