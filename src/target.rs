//! Target URL normalization.
//!
//! Turns the raw URL string given on the command line into a [`Target`]:
//! a `ws`/`wss` endpoint with an explicit port and any embedded
//! credentials split out.
//!
//! # Normalization Rules
//!
//! | Input scheme | Normalized | Default port |
//! |--------------|------------|--------------|
//! | `ws`, `http`, none (`//host`) | `ws` | 80 |
//! | `wss`, `https` | `wss` | 443 |
//! | anything else | rejected | - |
//!
//! # Example
//!
//! ```
//! use wscat::{Scheme, Target};
//!
//! let target = Target::parse("https://example.com/feed?x=1").unwrap();
//! assert_eq!(target.scheme(), Scheme::Wss);
//! assert_eq!(target.host_port(), "example.com:443");
//! assert_eq!(target.request_uri(), "wss://example.com:443/feed?x=1");
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use url::{ParseError, Url};

use crate::error::{Error, Result};

// ============================================================================
// Scheme
// ============================================================================

/// WebSocket scheme after alias rewriting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scheme {
    /// Plain WebSocket.
    Ws,
    /// WebSocket over TLS.
    Wss,
}

impl Scheme {
    /// Resolves a raw URL scheme, rewriting `http(s)` aliases.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedScheme`] for anything else.
    pub fn from_raw(scheme: &str) -> Result<Self> {
        match scheme.to_ascii_lowercase().as_str() {
            "ws" | "http" | "" => Ok(Self::Ws),
            "wss" | "https" => Ok(Self::Wss),
            _ => Err(Error::unsupported_scheme(scheme)),
        }
    }

    /// Returns the scheme string.
    #[inline]
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Ws => "ws",
            Self::Wss => "wss",
        }
    }

    /// Returns the port used when the URL has none.
    #[inline]
    #[must_use]
    pub const fn default_port(&self) -> u16 {
        match self {
            Self::Ws => 80,
            Self::Wss => 443,
        }
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Credentials
// ============================================================================

/// User-info embedded in the target URL (`user[:password]@host`).
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Decoded user name.
    pub user: String,
    /// Decoded password, if one was given.
    pub password: Option<String>,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

// ============================================================================
// Target
// ============================================================================

/// Normalized remote endpoint.
///
/// The port is always explicit and the scheme is always `ws` or `wss`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    scheme: Scheme,
    host: String,
    port: u16,
    path_and_query: String,
    credentials: Option<Credentials>,
}

impl Target {
    /// Parses and normalizes a raw URL string.
    ///
    /// Scheme-relative input (`//host/path`) is treated as `ws`.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidUrl`] if the string is not an absolute URL with a host
    /// - [`Error::UnsupportedScheme`] if the scheme is not a WebSocket or HTTP scheme
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();

        let (url, raw_scheme) = match Url::parse(trimmed) {
            Ok(url) => {
                let scheme = url.scheme().to_owned();
                (url, scheme)
            }
            Err(ParseError::RelativeUrlWithoutBase) if trimmed.starts_with("//") => {
                let url = Url::parse(&format!("ws:{trimmed}"))
                    .map_err(|e| Error::invalid_url(raw, e.to_string()))?;
                (url, String::new())
            }
            Err(e) => return Err(Error::invalid_url(raw, e.to_string())),
        };

        let scheme = Scheme::from_raw(&raw_scheme)?;

        let host = url
            .host_str()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| Error::invalid_url(raw, "missing host"))?
            .to_owned();

        // `Url` drops a port equal to its scheme's default, so fall back
        // to the normalized scheme's default either way.
        let port = url.port().unwrap_or_else(|| scheme.default_port());

        let mut path_and_query = url.path().to_owned();
        if path_and_query.is_empty() {
            path_and_query.push('/');
        }
        if let Some(query) = url.query() {
            path_and_query.push('?');
            path_and_query.push_str(query);
        }

        let credentials = Self::extract_credentials(raw, &url)?;

        Ok(Self {
            scheme,
            host,
            port,
            path_and_query,
            credentials,
        })
    }

    /// Splits percent-decoded user-info out of the parsed URL.
    fn extract_credentials(raw: &str, url: &Url) -> Result<Option<Credentials>> {
        if url.username().is_empty() && url.password().is_none() {
            return Ok(None);
        }

        let decode = |part: &str| {
            urlencoding::decode(part)
                .map(|s| s.into_owned())
                .map_err(|e| Error::invalid_url(raw, format!("bad user-info encoding: {e}")))
        };

        let user = decode(url.username())?;
        let password = url.password().map(decode).transpose()?;

        Ok(Some(Credentials { user, password }))
    }

    /// Returns the normalized scheme.
    #[inline]
    #[must_use]
    pub const fn scheme(&self) -> Scheme {
        self.scheme
    }

    /// Returns `true` if the connection must be wrapped in TLS.
    #[inline]
    #[must_use]
    pub const fn is_secure(&self) -> bool {
        matches!(self.scheme, Scheme::Wss)
    }

    /// Returns the host, with IPv6 literals in brackets.
    #[inline]
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Returns the host without IPv6 brackets, as used for TLS server names.
    #[inline]
    #[must_use]
    pub fn server_name(&self) -> &str {
        self.host.trim_start_matches('[').trim_end_matches(']')
    }

    /// Returns the port.
    #[inline]
    #[must_use]
    pub const fn port(&self) -> u16 {
        self.port
    }

    /// Returns `host:port`.
    #[inline]
    #[must_use]
    pub fn host_port(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Returns the path and query, always starting with `/`.
    #[inline]
    #[must_use]
    pub fn path_and_query(&self) -> &str {
        &self.path_and_query
    }

    /// Returns embedded credentials, if still present.
    #[inline]
    #[must_use]
    pub fn credentials(&self) -> Option<&Credentials> {
        self.credentials.as_ref()
    }

    /// Removes and returns embedded credentials.
    #[inline]
    pub fn take_credentials(&mut self) -> Option<Credentials> {
        self.credentials.take()
    }

    /// Returns the URI sent in the upgrade request.
    ///
    /// Never includes credentials.
    #[must_use]
    pub fn request_uri(&self) -> String {
        format!(
            "{}://{}:{}{}",
            self.scheme, self.host, self.port, self.path_and_query
        )
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.request_uri())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use proptest::prelude::*;

    #[test]
    fn test_ws_default_port() {
        let target = Target::parse("ws://example.com/path").expect("valid url");
        assert_eq!(target.scheme(), Scheme::Ws);
        assert_eq!(target.host_port(), "example.com:80");
        assert_eq!(target.path_and_query(), "/path");
    }

    #[test]
    fn test_wss_default_port() {
        let target = Target::parse("wss://example.com").expect("valid url");
        assert_eq!(target.port(), 443);
        assert_eq!(target.path_and_query(), "/");
        assert!(target.is_secure());
    }

    #[test]
    fn test_http_aliases_rewritten() {
        let plain = Target::parse("http://example.com/a").expect("valid url");
        assert_eq!(plain.scheme(), Scheme::Ws);
        assert_eq!(plain.port(), 80);

        let secure = Target::parse("https://example.com/a").expect("valid url");
        assert_eq!(secure.scheme(), Scheme::Wss);
        assert_eq!(secure.port(), 443);
    }

    #[test]
    fn test_scheme_relative_is_ws() {
        let target = Target::parse("//example.com/chat").expect("valid url");
        assert_eq!(target.scheme(), Scheme::Ws);
        assert_eq!(target.host_port(), "example.com:80");
    }

    #[test]
    fn test_explicit_port_kept() {
        let target = Target::parse("ws://localhost:9000/echo").expect("valid url");
        assert_eq!(target.host_port(), "localhost:9000");
        assert_eq!(target.request_uri(), "ws://localhost:9000/echo");
    }

    #[test]
    fn test_explicit_default_port_kept() {
        let target = Target::parse("wss://example.com:443/").expect("valid url");
        assert_eq!(target.port(), 443);
    }

    #[test]
    fn test_https_with_ws_port() {
        let target = Target::parse("https://example.com:80/").expect("valid url");
        assert_eq!(target.scheme(), Scheme::Wss);
        assert_eq!(target.port(), 80);
    }

    #[test]
    fn test_query_preserved() {
        let target = Target::parse("ws://example.com/feed?a=1&b=2").expect("valid url");
        assert_eq!(target.path_and_query(), "/feed?a=1&b=2");
    }

    #[test]
    fn test_ipv6_host() {
        let target = Target::parse("ws://[::1]:8080/").expect("valid url");
        assert_eq!(target.host_port(), "[::1]:8080");
        assert_eq!(target.server_name(), "::1");
    }

    #[test]
    fn test_unsupported_scheme() {
        let err = Target::parse("ftp://example.com/").unwrap_err();
        assert!(matches!(err, Error::UnsupportedScheme { ref scheme } if scheme == "ftp"));
    }

    #[test]
    fn test_invalid_url() {
        assert!(matches!(
            Target::parse("not a url").unwrap_err(),
            Error::InvalidUrl { .. }
        ));
        assert!(matches!(
            Target::parse("ws://").unwrap_err(),
            Error::InvalidUrl { .. }
        ));
    }

    #[test]
    fn test_credentials_extracted() {
        let mut target = Target::parse("ws://user:p%40ss@example.com/").expect("valid url");
        let creds = target.take_credentials().expect("credentials present");
        assert_eq!(creds.user, "user");
        assert_eq!(creds.password.as_deref(), Some("p@ss"));
        assert!(target.credentials().is_none());
        assert_eq!(target.request_uri(), "ws://example.com:80/");
    }

    #[test]
    fn test_credentials_user_only() {
        let target = Target::parse("ws://user@example.com/").expect("valid url");
        let creds = target.credentials().expect("credentials present");
        assert_eq!(creds.user, "user");
        assert_eq!(creds.password, None);
    }

    #[test]
    fn test_credentials_debug_redacts_password() {
        let target = Target::parse("ws://user:secret@example.com/").expect("valid url");
        let debug = format!("{:?}", target.credentials());
        assert!(!debug.contains("secret"));
    }

    proptest! {
        #[test]
        fn prop_default_port_follows_scheme(
            scheme in prop::sample::select(vec!["ws", "http", "wss", "https"]),
            host in "[a-z]{1,12}(\\.[a-z]{2,6})?",
            path in "(/[a-z0-9]{0,8}){0,3}",
        ) {
            let raw = format!("{scheme}://{host}{path}");
            let target = Target::parse(&raw).unwrap();
            let expected = if matches!(scheme, "wss" | "https") { 443 } else { 80 };
            prop_assert_eq!(target.port(), expected);
            prop_assert_eq!(target.host(), host.as_str());
        }

        #[test]
        fn prop_other_schemes_rejected(scheme in "(ftp|gopher|file|mailto|x[a-z]{1,5})") {
            let raw = format!("{scheme}://example.com/");
            let rejected = matches!(
                Target::parse(&raw),
                Err(Error::UnsupportedScheme { .. })
            );
            prop_assert!(rejected);
        }
    }
}
