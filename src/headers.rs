//! Handshake header construction.
//!
//! Builds the [`HeaderSet`] sent with the WebSocket upgrade request from
//! user-supplied `Name: value` strings, the origin policy and any
//! credentials embedded in the [`Target`].
//!
//! # Example
//!
//! ```
//! use wscat::{HeaderBuilder, Origin, Target};
//!
//! let mut target = Target::parse("ws://user:pass@example.com/").unwrap();
//! let headers = HeaderBuilder::new()
//!     .header("X-Trace: 42")
//!     .origin(Origin::SameHost)
//!     .build(&mut target)
//!     .unwrap();
//!
//! assert_eq!(headers.get("origin"), Some("//example.com:80"));
//! assert_eq!(headers.get("authorization"), Some("Basic dXNlcjpwYXNz"));
//! assert!(target.credentials().is_none());
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as Base64Standard;
use regex::Regex;
use tokio_tungstenite::tungstenite::http::header::{AUTHORIZATION, ORIGIN, PROXY_AUTHORIZATION};
use tokio_tungstenite::tungstenite::http::{HeaderMap, HeaderName, HeaderValue};
use tracing::debug;

use crate::error::{Error, Result};
use crate::target::{Credentials, Target};

// ============================================================================
// Constants
// ============================================================================

/// Origin sentinel that derives the origin from the target host.
pub const SAME_HOST: &str = "samehost";

/// `Name: value` with optional whitespace around both parts.
static HEADER_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*([^:\s][^:]*?)\s*:\s*(.*?)\s*$").expect("header pattern is valid")
});

// ============================================================================
// Origin
// ============================================================================

/// Policy for the `Origin` request header.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Origin {
    /// `//host:port` of the target.
    #[default]
    SameHost,
    /// A literal origin sent verbatim.
    Literal(String),
}

impl Origin {
    /// Resolves the header value for a target.
    #[must_use]
    pub fn resolve(&self, target: &Target) -> String {
        match self {
            Self::SameHost => format!("//{}", target.host_port()),
            Self::Literal(origin) => origin.clone(),
        }
    }
}

impl FromStr for Origin {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        if s == SAME_HOST {
            Ok(Self::SameHost)
        } else {
            Ok(Self::Literal(s.to_owned()))
        }
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SameHost => f.write_str(SAME_HOST),
            Self::Literal(origin) => f.write_str(origin),
        }
    }
}

// ============================================================================
// HeaderSet
// ============================================================================

/// Case-insensitive header map sent with the upgrade request.
#[derive(Debug, Clone, Default)]
pub struct HeaderSet {
    inner: HeaderMap,
}

impl HeaderSet {
    /// Returns a header value as a string, if present and printable.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.inner.get(name).and_then(|v| v.to_str().ok())
    }

    /// Returns the number of headers.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Returns `true` if there are no headers.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Iterates over name/value pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&HeaderName, &HeaderValue)> {
        self.inner.iter()
    }
}

// ============================================================================
// Header Parsing
// ============================================================================

/// Splits a raw `Name: value` string into trimmed name and value.
///
/// # Errors
///
/// Returns [`Error::HeaderParse`] if the string has no name or no colon.
pub fn parse_header_line(raw: &str) -> Result<(String, String)> {
    let captures = HEADER_LINE
        .captures(raw)
        .ok_or_else(|| Error::header_parse(raw, "expected \"Name: value\""))?;

    Ok((captures[1].to_owned(), captures[2].to_owned()))
}

/// Parses and validates a raw header into typed name and value.
fn parse_header(raw: &str) -> Result<(HeaderName, HeaderValue)> {
    let (name, value) = parse_header_line(raw)?;

    let name = HeaderName::from_bytes(name.as_bytes())
        .map_err(|e| Error::header_parse(raw, format!("invalid name: {e}")))?;
    let value = HeaderValue::from_str(&value)
        .map_err(|e| Error::header_parse(raw, format!("invalid value: {e}")))?;

    Ok((name, value))
}

/// Encodes credentials as a Basic authorization value.
fn basic_auth(credentials: &Credentials) -> String {
    let password = credentials.password.as_deref().unwrap_or_default();
    let token = Base64Standard.encode(format!("{}:{password}", credentials.user));
    format!("Basic {token}")
}

// ============================================================================
// HeaderBuilder
// ============================================================================

/// Builder for the upgrade request [`HeaderSet`].
#[derive(Debug, Default, Clone)]
pub struct HeaderBuilder {
    /// Raw `Name: value` strings in order.
    raw: Vec<String>,
    /// Origin policy.
    origin: Origin,
}

impl HeaderBuilder {
    /// Creates a builder with no headers and the same-host origin.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a raw `Name: value` header string.
    #[inline]
    #[must_use]
    pub fn header(mut self, raw: impl Into<String>) -> Self {
        self.raw.push(raw.into());
        self
    }

    /// Adds several raw header strings.
    #[inline]
    #[must_use]
    pub fn headers<I, S>(mut self, raw: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.raw.extend(raw.into_iter().map(Into::into));
        self
    }

    /// Sets the origin policy.
    #[inline]
    #[must_use]
    pub fn origin(mut self, origin: Origin) -> Self {
        self.origin = origin;
        self
    }

    /// Builds the header set, moving credentials out of `target`.
    ///
    /// # Errors
    ///
    /// - [`Error::HeaderParse`] for the first malformed header string
    /// - [`Error::HeaderParse`] if the origin is not a valid header value
    pub fn build(self, target: &mut Target) -> Result<HeaderSet> {
        let mut inner = HeaderMap::new();

        for raw in &self.raw {
            let (name, mut value) = parse_header(raw)?;
            if name == AUTHORIZATION || name == PROXY_AUTHORIZATION {
                value.set_sensitive(true);
            }
            inner.insert(name, value);
        }

        let origin = self.origin.resolve(target);
        let origin_value = HeaderValue::from_str(&origin)
            .map_err(|e| Error::header_parse(format!("Origin: {origin}"), e.to_string()))?;
        inner.insert(ORIGIN, origin_value);

        if let Some(credentials) = target.take_credentials() {
            let mut value = HeaderValue::from_str(&basic_auth(&credentials))
                .map_err(|e| Error::header_parse("Authorization", e.to_string()))?;
            value.set_sensitive(true);
            inner.insert(AUTHORIZATION, value);
            debug!(user = %credentials.user, "Using basic authentication");
        }

        debug!(count = inner.len(), origin = %origin, "Headers built");

        Ok(HeaderSet { inner })
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn target(raw: &str) -> Target {
        Target::parse(raw).expect("valid url")
    }

    #[test]
    fn test_parse_trims_whitespace() {
        let (name, value) = parse_header_line("X-Test:  value ").unwrap();
        assert_eq!(name, "X-Test");
        assert_eq!(value, "value");
    }

    #[test]
    fn test_parse_keeps_inner_whitespace_and_colons() {
        let (name, value) = parse_header_line("  X-Forwarded :  a b:c  ").unwrap();
        assert_eq!(name, "X-Forwarded");
        assert_eq!(value, "a b:c");
    }

    #[test]
    fn test_parse_empty_value() {
        let (name, value) = parse_header_line("X-Empty:").unwrap();
        assert_eq!(name, "X-Empty");
        assert_eq!(value, "");
    }

    #[test]
    fn test_parse_rejects_missing_colon() {
        let err = parse_header_line("badheader").unwrap_err();
        assert!(matches!(err, Error::HeaderParse { ref header, .. } if header == "badheader"));
    }

    #[test]
    fn test_parse_rejects_missing_name() {
        assert!(parse_header_line(": value").is_err());
    }

    #[test]
    fn test_parse_rejects_blank_line() {
        assert!(parse_header_line("").is_err());
        assert!(parse_header_line("   ").is_err());
    }

    #[test]
    fn test_build_rejects_invalid_name() {
        let mut t = target("ws://example.com/");
        let err = HeaderBuilder::new()
            .header("Bad Name: x")
            .build(&mut t)
            .unwrap_err();
        assert!(matches!(err, Error::HeaderParse { .. }));
    }

    #[test]
    fn test_last_header_wins() {
        let mut t = target("ws://example.com/");
        let headers = HeaderBuilder::new()
            .header("X-Token: first")
            .header("x-token: second")
            .build(&mut t)
            .unwrap();
        assert_eq!(headers.get("X-Token"), Some("second"));
    }

    #[test]
    fn test_same_host_origin() {
        let mut t = target("ws://example.com/");
        let headers = HeaderBuilder::new().build(&mut t).unwrap();
        assert_eq!(headers.get("Origin"), Some("//example.com:80"));
    }

    #[test]
    fn test_literal_origin_overrides_user_header() {
        let mut t = target("ws://example.com/");
        let headers = HeaderBuilder::new()
            .header("Origin: http://evil.example")
            .origin(Origin::Literal("http://localhost/".into()))
            .build(&mut t)
            .unwrap();
        assert_eq!(headers.get("origin"), Some("http://localhost/"));
    }

    #[test]
    fn test_origin_from_str() {
        assert_eq!(Origin::from_str("samehost").unwrap(), Origin::SameHost);
        assert_eq!(
            Origin::from_str("http://a.test").unwrap(),
            Origin::Literal("http://a.test".into())
        );
    }

    #[test]
    fn test_basic_auth_with_password() {
        let mut t = target("ws://user:pass@example.com/");
        let headers = HeaderBuilder::new().build(&mut t).unwrap();
        let expected = format!("Basic {}", Base64Standard.encode("user:pass"));
        assert_eq!(headers.get("Authorization"), Some(expected.as_str()));
        assert!(t.credentials().is_none());
    }

    #[test]
    fn test_debug_hides_authorization() {
        let mut t = target("ws://user:pass@example.com/");
        let headers = HeaderBuilder::new()
            .header("Proxy-Authorization: Bearer s3cret")
            .build(&mut t)
            .unwrap();

        let debug = format!("{headers:?}");
        assert!(!debug.contains("dXNlcjpwYXNz"), "{debug}");
        assert!(!debug.contains("s3cret"), "{debug}");
        assert!(debug.contains("Sensitive"), "{debug}");
        assert_eq!(headers.get("Authorization"), Some("Basic dXNlcjpwYXNz"));
    }

    #[test]
    fn test_basic_auth_user_only() {
        let mut t = target("ws://user@example.com/");
        let headers = HeaderBuilder::new().build(&mut t).unwrap();
        let expected = format!("Basic {}", Base64Standard.encode("user:"));
        assert_eq!(headers.get("Authorization"), Some(expected.as_str()));
    }

    #[test]
    fn test_no_credentials_no_authorization() {
        let mut t = target("ws://example.com/");
        let headers = HeaderBuilder::new().build(&mut t).unwrap();
        assert_eq!(headers.get("Authorization"), None);
        assert_eq!(headers.len(), 1);
    }

    #[test]
    fn test_first_bad_header_reported() {
        let mut t = target("ws://example.com/");
        let err = HeaderBuilder::new()
            .headers(["X-Ok: 1", "nope", "also-bad"])
            .build(&mut t)
            .unwrap_err();
        assert!(matches!(err, Error::HeaderParse { ref header, .. } if header == "nope"));
    }
}
