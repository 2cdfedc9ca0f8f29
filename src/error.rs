//! Error types for wscat.
//!
//! This module defines all error types used throughout the crate.
//!
//! # Usage
//!
//! All fallible operations return [`Result<T>`] which uses [`Error`]:
//!
//! ```ignore
//! use wscat::{Result, Target};
//!
//! fn example() -> Result<()> {
//!     let target = Target::parse("ws://localhost:9000/echo")?;
//!     println!("{}", target.host_port());
//!     Ok(())
//! }
//! ```
//!
//! # Error Categories
//!
//! | Category | Variants |
//! |----------|----------|
//! | Setup | [`Error::InvalidUrl`], [`Error::UnsupportedScheme`], [`Error::HeaderParse`] |
//! | Connection | [`Error::Connect`], [`Error::Tls`], [`Error::Handshake`] |
//! | Relay | [`Error::BridgeIo`], [`Error::RelayAborted`] |

// ============================================================================
// Imports
// ============================================================================

use std::io::Error as IoError;
use std::result::Result as StdResult;

use thiserror::Error;

use crate::bridge::Direction;

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
///
/// All fallible operations in this crate return this type.
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
///
/// Each variant names the failing operation and carries its cause.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Setup Errors
    // ========================================================================
    /// Target URL could not be parsed.
    ///
    /// Returned for syntactically invalid or non-absolute URLs.
    #[error("Invalid URL {url:?}: {message}")]
    InvalidUrl {
        /// The raw input string.
        url: String,
        /// Description of the parse failure.
        message: String,
    },

    /// URL scheme is not one of `ws`, `wss`, `http`, `https`.
    #[error("Unsupported URL scheme: {scheme:?}")]
    UnsupportedScheme {
        /// The rejected scheme.
        scheme: String,
    },

    /// Header string is not of the form `Name: value`.
    #[error("Invalid header {header:?}: {message}")]
    HeaderParse {
        /// The offending raw header string.
        header: String,
        /// Description of the problem.
        message: String,
    },

    // ========================================================================
    // Connection Errors
    // ========================================================================
    /// TCP connection could not be opened.
    #[error("Failed to connect to {addr}: {source}")]
    Connect {
        /// The `host:port` that was dialed.
        addr: String,
        /// Underlying network error.
        #[source]
        source: IoError,
    },

    /// TLS session could not be established.
    #[error("TLS handshake with {host} failed: {message}")]
    Tls {
        /// Server name used for the TLS session.
        host: String,
        /// Description of the TLS failure.
        message: String,
    },

    /// WebSocket upgrade was rejected or failed.
    ///
    /// Carries the HTTP status when the server answered with a
    /// non-101 response.
    #[error("WebSocket handshake failed{}: {message}", fmt_status(*.status))]
    Handshake {
        /// HTTP status returned by the server, if any.
        status: Option<u16>,
        /// Description of the failure.
        message: String,
    },

    // ========================================================================
    // Relay Errors
    // ========================================================================
    /// A relay direction failed with something other than end-of-stream.
    #[error("Relay error ({direction}): {message}")]
    BridgeIo {
        /// Direction that failed.
        direction: Direction,
        /// Description of the failure.
        message: String,
    },

    /// Both relay tasks ended without reporting a result.
    #[error("Relay tasks exited without reporting a result")]
    RelayAborted,
}

/// Formats an optional HTTP status for the handshake error message.
fn fmt_status(status: Option<u16>) -> String {
    status.map(|code| format!(" (HTTP {code})")).unwrap_or_default()
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates an invalid URL error.
    #[inline]
    pub fn invalid_url(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidUrl {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Creates an unsupported scheme error.
    #[inline]
    pub fn unsupported_scheme(scheme: impl Into<String>) -> Self {
        Self::UnsupportedScheme {
            scheme: scheme.into(),
        }
    }

    /// Creates a header parse error.
    #[inline]
    pub fn header_parse(header: impl Into<String>, message: impl Into<String>) -> Self {
        Self::HeaderParse {
            header: header.into(),
            message: message.into(),
        }
    }

    /// Creates a connect error.
    #[inline]
    pub fn connect(addr: impl Into<String>, source: IoError) -> Self {
        Self::Connect {
            addr: addr.into(),
            source,
        }
    }

    /// Creates a TLS error.
    #[inline]
    pub fn tls(host: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Tls {
            host: host.into(),
            message: message.into(),
        }
    }

    /// Creates a handshake error.
    #[inline]
    pub fn handshake(status: Option<u16>, message: impl Into<String>) -> Self {
        Self::Handshake {
            status,
            message: message.into(),
        }
    }

    /// Creates a relay error for one direction.
    #[inline]
    pub fn bridge_io(direction: Direction, message: impl Into<String>) -> Self {
        Self::BridgeIo {
            direction,
            message: message.into(),
        }
    }
}

// ============================================================================
// Error Predicates
// ============================================================================

impl Error {
    /// Returns `true` if this error happened before the relay started.
    #[inline]
    #[must_use]
    pub fn is_setup_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidUrl { .. }
                | Self::UnsupportedScheme { .. }
                | Self::HeaderParse { .. }
                | Self::Connect { .. }
                | Self::Tls { .. }
                | Self::Handshake { .. }
        )
    }

    /// Returns the HTTP status of a rejected handshake.
    #[inline]
    #[must_use]
    pub fn handshake_status(&self) -> Option<u16> {
        match self {
            Self::Handshake { status, .. } => *status,
            _ => None,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::ErrorKind;

    #[test]
    fn test_error_display() {
        let err = Error::unsupported_scheme("ftp");
        assert_eq!(err.to_string(), "Unsupported URL scheme: \"ftp\"");
    }

    #[test]
    fn test_handshake_display_with_status() {
        let err = Error::handshake(Some(403), "Forbidden");
        assert_eq!(
            err.to_string(),
            "WebSocket handshake failed (HTTP 403): Forbidden"
        );
        assert_eq!(err.handshake_status(), Some(403));
    }

    #[test]
    fn test_handshake_display_without_status() {
        let err = Error::handshake(None, "connection reset");
        assert_eq!(
            err.to_string(),
            "WebSocket handshake failed: connection reset"
        );
        assert_eq!(err.handshake_status(), None);
    }

    #[test]
    fn test_connect_display_names_address() {
        let io_err = IoError::new(ErrorKind::ConnectionRefused, "refused");
        let err = Error::connect("localhost:9000", io_err);
        assert_eq!(
            err.to_string(),
            "Failed to connect to localhost:9000: refused"
        );
    }

    #[test]
    fn test_bridge_io_display() {
        let err = Error::bridge_io(Direction::Inbound, "broken pipe");
        assert_eq!(err.to_string(), "Relay error (inbound): broken pipe");
    }

    #[test]
    fn test_is_setup_error() {
        assert!(Error::invalid_url("x", "bad").is_setup_error());
        assert!(Error::header_parse("x", "bad").is_setup_error());
        assert!(Error::tls("example.com", "bad cert").is_setup_error());
        assert!(!Error::bridge_io(Direction::Outbound, "eof").is_setup_error());
        assert!(!Error::RelayAborted.is_setup_error());
    }
}
