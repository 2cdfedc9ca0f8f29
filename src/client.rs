//! Client configuration and session setup.
//!
//! [`ClientConfig`] collects everything the CLI gathers and runs the setup
//! pipeline: URL normalization, header construction, transport connect and
//! WebSocket handshake. The result is a [`Session`] ready to be bridged.
//!
//! # Example
//!
//! ```no_run
//! use wscat::{ClientConfig, Result};
//!
//! # async fn example() -> Result<()> {
//! let session = ClientConfig::builder()
//!     .url("wss://echo.example.com/")
//!     .header("Authorization: Bearer abc")
//!     .build()?
//!     .connect()
//!     .await?;
//!
//! session.run(tokio::io::stdin(), tokio::io::stdout()).await?;
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Imports
// ============================================================================

use tokio::io::{AsyncRead, AsyncWrite};
use tokio_tungstenite::WebSocketStream;
use tracing::debug;

use crate::bridge::{Bridge, Direction, Framing, MessageKind};
use crate::error::{Error, Result};
use crate::headers::{HeaderBuilder, HeaderSet, Origin};
use crate::target::Target;
use crate::transport::{self, TlsOptions, Transport};

// ============================================================================
// ClientConfig
// ============================================================================

/// Validated client configuration.
///
/// Use [`ClientConfig::builder()`] to create one.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Raw target URL as given by the user.
    url: String,
    /// Raw `Name: value` header strings.
    headers: Vec<String>,
    /// Origin policy.
    origin: Origin,
    /// TLS options for `wss`.
    tls: TlsOptions,
    /// Outbound framing.
    framing: Framing,
    /// Outbound message kind.
    kind: MessageKind,
}

impl ClientConfig {
    /// Creates a new configuration builder.
    #[inline]
    #[must_use]
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::new()
    }

    /// Returns the raw target URL.
    #[inline]
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Returns the origin policy.
    #[inline]
    #[must_use]
    pub fn origin(&self) -> &Origin {
        &self.origin
    }

    /// Normalizes the URL and builds the header set.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidUrl`] / [`Error::UnsupportedScheme`] from URL normalization
    /// - [`Error::HeaderParse`] from header construction
    pub fn prepare(&self) -> Result<(Target, HeaderSet)> {
        let mut target = Target::parse(&self.url)?;
        let headers = HeaderBuilder::new()
            .headers(self.headers.iter().cloned())
            .origin(self.origin.clone())
            .build(&mut target)?;

        debug!(url = %target, "Target normalized");

        Ok((target, headers))
    }

    /// Runs the full setup pipeline and returns a live session.
    ///
    /// Any failure is fatal for the session; nothing is retried.
    ///
    /// # Errors
    ///
    /// Any setup error: [`Error::InvalidUrl`], [`Error::UnsupportedScheme`],
    /// [`Error::HeaderParse`], [`Error::Connect`], [`Error::Tls`] or
    /// [`Error::Handshake`].
    pub async fn connect(&self) -> Result<Session> {
        let (target, headers) = self.prepare()?;
        let stream = transport::connect(&target, &self.tls).await?;
        let (socket, status) = transport::handshake(stream, &target, &headers).await?;

        Ok(Session {
            target,
            status,
            socket,
            framing: self.framing,
            kind: self.kind,
        })
    }
}

// ============================================================================
// ClientConfigBuilder
// ============================================================================

/// Builder for [`ClientConfig`].
#[derive(Debug, Default, Clone)]
pub struct ClientConfigBuilder {
    url: Option<String>,
    headers: Vec<String>,
    origin: Origin,
    tls: TlsOptions,
    framing: Framing,
    kind: MessageKind,
}

impl ClientConfigBuilder {
    /// Creates a builder with defaults: same-host origin, validated TLS,
    /// line framing, binary messages.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the target URL.
    #[inline]
    #[must_use]
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Adds a raw `Name: value` header.
    #[inline]
    #[must_use]
    pub fn header(mut self, header: impl Into<String>) -> Self {
        self.headers.push(header.into());
        self
    }

    /// Adds several raw headers.
    #[inline]
    #[must_use]
    pub fn headers<I, S>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.headers.extend(headers.into_iter().map(Into::into));
        self
    }

    /// Sets the origin policy.
    #[inline]
    #[must_use]
    pub fn origin(mut self, origin: Origin) -> Self {
        self.origin = origin;
        self
    }

    /// Disables TLS certificate validation.
    #[inline]
    #[must_use]
    pub fn insecure(mut self, insecure: bool) -> Self {
        self.tls.insecure = insecure;
        self
    }

    /// Sets the outbound framing.
    #[inline]
    #[must_use]
    pub fn framing(mut self, framing: Framing) -> Self {
        self.framing = framing;
        self
    }

    /// Sets the outbound message kind.
    #[inline]
    #[must_use]
    pub fn message_kind(mut self, kind: MessageKind) -> Self {
        self.kind = kind;
        self
    }

    /// Builds the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidUrl`] if no URL was set.
    pub fn build(self) -> Result<ClientConfig> {
        let url = self
            .url
            .filter(|u| !u.trim().is_empty())
            .ok_or_else(|| Error::invalid_url("", "a target URL is required"))?;

        Ok(ClientConfig {
            url,
            headers: self.headers,
            origin: self.origin,
            tls: self.tls,
            framing: self.framing,
            kind: self.kind,
        })
    }
}

// ============================================================================
// Session
// ============================================================================

/// Established WebSocket session, ready to be bridged.
pub struct Session {
    target: Target,
    status: u16,
    socket: WebSocketStream<Transport>,
    framing: Framing,
    kind: MessageKind,
}

impl Session {
    /// Returns the normalized target (without credentials).
    #[inline]
    #[must_use]
    pub fn target(&self) -> &Target {
        &self.target
    }

    /// Returns the HTTP status of the upgrade response.
    #[inline]
    #[must_use]
    pub const fn status(&self) -> u16 {
        self.status
    }

    /// Bridges the session to `input` and `output` until either direction ends.
    ///
    /// # Errors
    ///
    /// See [`Bridge::run`].
    pub async fn run<R, W>(self, input: R, output: W) -> Result<Direction>
    where
        R: AsyncRead + Unpin + Send + 'static,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        Bridge::new(self.socket)
            .framing(self.framing)
            .message_kind(self.kind)
            .run(input, output)
            .await
    }
}

// ============================================================================
// Tests
// ============================================================================
