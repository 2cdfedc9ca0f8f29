//! TCP and TLS transport setup.
//!
//! Opens the byte stream the WebSocket handshake runs over. Plain `ws`
//! targets get a bare TCP stream; `wss` targets are wrapped in a TLS
//! client session validated against the platform trust store.

// ============================================================================
// Imports
// ============================================================================

use tokio::net::TcpStream;
use tokio_native_tls::TlsConnector;
use tokio_tungstenite::MaybeTlsStream;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::target::Target;

// ============================================================================
// Types
// ============================================================================

/// Transport stream returned by [`connect`].
pub type Transport = MaybeTlsStream<TcpStream>;

// ============================================================================
// TlsOptions
// ============================================================================

/// TLS client options for `wss` targets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TlsOptions {
    /// Skip certificate and hostname validation.
    pub insecure: bool,
}

impl TlsOptions {
    /// Options that accept any certificate.
    #[inline]
    #[must_use]
    pub const fn insecure() -> Self {
        Self { insecure: true }
    }

    /// Builds the async TLS connector.
    fn connector(&self, host: &str) -> Result<TlsConnector> {
        let mut builder = native_tls::TlsConnector::builder();
        if self.insecure {
            warn!(host, "TLS certificate validation disabled");
            builder
                .danger_accept_invalid_certs(true)
                .danger_accept_invalid_hostnames(true);
        }

        let connector = builder
            .build()
            .map_err(|e| Error::tls(host, format!("failed to build connector: {e}")))?;

        Ok(TlsConnector::from(connector))
    }
}

// ============================================================================
// Connect
// ============================================================================

/// Opens a stream to the target, upgrading to TLS for `wss`.
///
/// No retries or timeouts are applied.
///
/// # Errors
///
/// - [`Error::Connect`] if the TCP connection fails
/// - [`Error::Tls`] if the TLS handshake or certificate validation fails
pub async fn connect(target: &Target, tls: &TlsOptions) -> Result<Transport> {
    let addr = target.host_port();

    let stream = TcpStream::connect(addr.as_str())
        .await
        .map_err(|e| Error::connect(addr.as_str(), e))?;

    if let Err(e) = stream.set_nodelay(true) {
        debug!(error = %e, "Failed to set TCP_NODELAY");
    }

    debug!(%addr, peer = ?stream.peer_addr().ok(), "TCP connection established");

    if !target.is_secure() {
        return Ok(MaybeTlsStream::Plain(stream));
    }

    let host = target.server_name();
    let connector = tls.connector(host)?;
    let tls_stream = connector
        .connect(host, stream)
        .await
        .map_err(|e| Error::tls(host, e.to_string()))?;

    debug!(host, "TLS session established");

    Ok(MaybeTlsStream::NativeTls(tls_stream))
}

// ============================================================================
// Tests
// ============================================================================
