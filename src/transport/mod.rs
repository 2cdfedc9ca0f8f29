//! Transport layer.
//!
//! Gets from a normalized [`Target`](crate::Target) to a live WebSocket
//! connection.
//!
//! # Connection Lifecycle
//!
//! ```text
//! Target ──connect──► TcpStream ──(wss)──► TlsStream ──handshake──► WebSocketStream
//! ```
//!
//! 1. `connect` - Open TCP to `host:port`, wrap in TLS for `wss`
//! 2. `handshake` - Send the upgrade request with the built headers
//! 3. The resulting stream is handed to the [`Bridge`](crate::Bridge)
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `connector` | TCP connect and optional TLS wrap |
//! | `handshake` | WebSocket upgrade request/response |

// ============================================================================
// Submodules
// ============================================================================

/// TCP connect and optional TLS wrap.
pub mod connector;

/// WebSocket upgrade handshake.
pub mod handshake;

// ============================================================================
// Re-exports
// ============================================================================

pub use connector::{TlsOptions, Transport, connect};
pub use handshake::handshake;
