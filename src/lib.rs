//! wscat - bridge a WebSocket connection to standard input and output.
//!
//! This library provides the connection setup and relay core behind the
//! `wscat` command-line tool: send what arrives on stdin, print what
//! arrives on the socket.
//!
//! # Architecture
//!
//! ```text
//! raw URL ──► Target ──► HeaderSet ──► Transport ──► WebSocketStream ──► Bridge
//!                                   (TCP / TLS)      (handshake)       stdin ⇄ socket ⇄ stdout
//! ```
//!
//! Key design principles:
//!
//! - Every setup step returns a typed [`Error`]; nothing is retried
//! - The [`Bridge`] exclusively owns the connection
//! - Two relay tasks, first terminal signal wins
//!
//! # Quick Start
//!
//! ```no_run
//! use wscat::{ClientConfig, Origin, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let session = ClientConfig::builder()
//!         .url("ws://localhost:9000/echo")
//!         .origin(Origin::SameHost)
//!         .build()?
//!         .connect()
//!         .await?;
//!
//!     session.run(tokio::io::stdin(), tokio::io::stdout()).await?;
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`bridge`] | Bidirectional relay: [`Bridge`] |
//! | [`client`] | Configuration and setup pipeline: [`ClientConfig`], [`Session`] |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`headers`] | Upgrade request headers: [`HeaderBuilder`], [`HeaderSet`] |
//! | [`target`] | URL normalization: [`Target`] |
//! | [`transport`] | TCP/TLS connect and WebSocket handshake |

// ============================================================================
// Modules
// ============================================================================

/// Bidirectional relay between socket and byte streams.
pub mod bridge;

/// Client configuration and session setup.
///
/// Use [`ClientConfig::builder()`] to create a configuration.
pub mod client;

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// Upgrade request header construction.
pub mod headers;

/// Target URL normalization.
pub mod target;

/// Transport connect and WebSocket handshake.
pub mod transport;

// ============================================================================
// Re-exports
// ============================================================================

// Relay types
pub use bridge::{Bridge, Direction, Framing, MessageKind};

// Client types
pub use client::{ClientConfig, ClientConfigBuilder, Session};

// Error types
pub use error::{Error, Result};

// Header types
pub use headers::{HeaderBuilder, HeaderSet, Origin, SAME_HOST, parse_header_line};

// Target types
pub use target::{Credentials, Scheme, Target};

// Transport types
pub use transport::TlsOptions;
