//! Bidirectional relay between a WebSocket and a pair of byte streams.
//!
//! The bridge runs two independent tasks:
//!
//! - **Inbound**: every data message from the socket is written to the
//!   output followed by a single `\n`.
//! - **Outbound**: the input is cut into messages according to
//!   [`Framing`] and sent as [`MessageKind`] messages.
//!
//! Each task posts exactly one terminal signal into a shared channel sized
//! for both, so neither ever blocks on the post. [`Bridge::run`] returns
//! as soon as the first signal arrives. The other task is left running;
//! dropping the runtime is what tears it down.
//!
//! # Example
//!
//! ```ignore
//! use wscat::Bridge;
//!
//! let ended = Bridge::new(socket)
//!     .run(tokio::io::stdin(), tokio::io::stdout())
//!     .await?;
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::time::Duration;

use futures_util::{Sink, SinkExt, Stream, StreamExt};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_tungstenite::WebSocketStream;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tracing::{debug, trace};

use crate::error::{Error, Result};

// ============================================================================
// Constants
// ============================================================================

/// One slot per relay direction.
const SIGNAL_CAPACITY: usize = 2;

/// How long the peer gets to drop the connection after its close frame.
const CLOSE_TIMEOUT: Duration = Duration::from_secs(1);

// ============================================================================
// Direction
// ============================================================================

/// Relay direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Socket to output.
    Inbound,
    /// Input to socket.
    Outbound,
}

impl Direction {
    /// Returns the direction name.
    #[inline]
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Inbound => "inbound",
            Self::Outbound => "outbound",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Framing / MessageKind
// ============================================================================

/// How outbound input is cut into messages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum Framing {
    /// One message per input line, line terminator stripped.
    #[default]
    Line,
    /// The whole input up to end-of-stream as a single message.
    Stream,
}

/// Type of outbound messages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum MessageKind {
    /// Binary messages carrying raw bytes.
    #[default]
    Binary,
    /// Text messages; input must be UTF-8.
    Text,
}

impl MessageKind {
    /// Wraps a payload in a message of this kind.
    fn message(self, payload: Vec<u8>) -> Result<Message> {
        match self {
            Self::Binary => Ok(Message::binary(payload)),
            Self::Text => String::from_utf8(payload)
                .map(Message::text)
                .map_err(|e| {
                    Error::bridge_io(Direction::Outbound, format!("input is not UTF-8: {e}"))
                }),
        }
    }
}

// ============================================================================
// Bridge
// ============================================================================

/// Relay between a WebSocket connection and an input/output stream pair.
///
/// Owns the connection for its whole lifetime.
pub struct Bridge<S> {
    socket: WebSocketStream<S>,
    framing: Framing,
    kind: MessageKind,
}

impl<S> Bridge<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    /// Creates a bridge with line framing and binary messages.
    #[inline]
    #[must_use]
    pub fn new(socket: WebSocketStream<S>) -> Self {
        Self {
            socket,
            framing: Framing::default(),
            kind: MessageKind::default(),
        }
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

    /// Runs both relay directions until the first one terminates.
    ///
    /// # Returns
    ///
    /// The direction that reached end-of-stream first.
    ///
    /// # Errors
    ///
    /// - [`Error::BridgeIo`] if the first direction to finish failed
    /// - [`Error::RelayAborted`] if both tasks died without reporting
    pub async fn run<R, W>(self, input: R, output: W) -> Result<Direction>
    where
        R: AsyncRead + Unpin + Send + 'static,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let Self {
            socket,
            framing,
            kind,
        } = self;

        let (sink, stream) = socket.split();
        let (signal_tx, mut signal_rx) = mpsc::channel::<Result<Direction>>(SIGNAL_CAPACITY);

        let inbound_tx = signal_tx.clone();
        tokio::spawn(async move {
            let result = relay_inbound(stream, output)
                .await
                .map(|()| Direction::Inbound);
            let _ = inbound_tx.send(result).await;
        });

        tokio::spawn(async move {
            let result = relay_outbound(sink, input, framing, kind)
                .await
                .map(|()| Direction::Outbound);
            let _ = signal_tx.send(result).await;
        });

        debug!(?framing, ?kind, "Relay started");

        let signal = signal_rx.recv().await.ok_or(Error::RelayAborted)?;

        match &signal {
            Ok(direction) => debug!(%direction, "Relay reached end of stream"),
            Err(e) => debug!(error = %e, "Relay failed"),
        }

        signal
    }
}

// ============================================================================
// Inbound
// ============================================================================

/// Copies every data message to `output`, one per line.
async fn relay_inbound<St, W>(mut stream: St, mut output: W) -> Result<()>
where
    St: Stream<Item = std::result::Result<Message, WsError>> + Unpin,
    W: AsyncWrite + Unpin,
{
    while let Some(message) = stream.next().await {
        match message {
            Ok(Message::Text(text)) => write_line(&mut output, text.as_str().as_bytes()).await?,
            Ok(Message::Binary(data)) => write_line(&mut output, &data).await?,
            Ok(Message::Close(frame)) => {
                debug!(?frame, "Close frame received");
                finish_close(&mut stream).await;
                return Ok(());
            }
            Ok(other) => trace!(len = other.len(), "Control frame skipped"),
            Err(WsError::ConnectionClosed | WsError::AlreadyClosed) => return Ok(()),
            Err(e) => return Err(Error::bridge_io(Direction::Inbound, e.to_string())),
        }
    }

    debug!("WebSocket stream ended");
    Ok(())
}

/// Keeps polling after a close frame so the queued reply gets flushed.
///
/// Stops when the peer drops the connection or after [`CLOSE_TIMEOUT`].
async fn finish_close<St>(stream: &mut St)
where
    St: Stream<Item = std::result::Result<Message, WsError>> + Unpin,
{
    let drain = async { while let Some(Ok(_)) = stream.next().await {} };

    if timeout(CLOSE_TIMEOUT, drain).await.is_err() {
        debug!("Peer kept the connection open after closing");
    }
}

/// Writes one message payload plus the line separator.
async fn write_line<W>(output: &mut W, payload: &[u8]) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let write = async {
        output.write_all(payload).await?;
        output.write_all(b"\n").await?;
        output.flush().await
    };

    write
        .await
        .map_err(|e| Error::bridge_io(Direction::Inbound, format!("failed to write output: {e}")))?;

    trace!(len = payload.len(), "Message relayed to output");
    Ok(())
}

// ============================================================================
// Outbound
// ============================================================================

/// Cuts `input` into messages and sends them until end-of-stream.
async fn relay_outbound<Si, R>(
    mut sink: Si,
    input: R,
    framing: Framing,
    kind: MessageKind,
) -> Result<()>
where
    Si: Sink<Message, Error = WsError> + Unpin,
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(input);
    let read_error = |e: std::io::Error| {
        Error::bridge_io(Direction::Outbound, format!("failed to read input: {e}"))
    };

    match framing {
        Framing::Line => {
            let mut line = Vec::new();
            loop {
                let n = reader.read_until(b'\n', &mut line).await.map_err(read_error)?;
                if n == 0 {
                    break;
                }
                strip_line_ending(&mut line);
                send(&mut sink, kind, std::mem::take(&mut line)).await?;
            }
        }
        Framing::Stream => {
            let mut payload = Vec::new();
            reader.read_to_end(&mut payload).await.map_err(read_error)?;
            if !payload.is_empty() {
                send(&mut sink, kind, payload).await?;
            }
        }
    }

    debug!("Input reached end of stream");
    Ok(())
}

/// Removes a trailing `\n` or `\r\n`.
fn strip_line_ending(line: &mut Vec<u8>) {
    if line.last() == Some(&b'\n') {
        line.pop();
        if line.last() == Some(&b'\r') {
            line.pop();
        }
    }
}

/// Sends one payload as a message of `kind`.
async fn send<Si>(sink: &mut Si, kind: MessageKind, payload: Vec<u8>) -> Result<()>
where
    Si: Sink<Message, Error = WsError> + Unpin,
{
    let len = payload.len();
    let message = kind.message(payload)?;

    sink.send(message).await.map_err(|e| {
        Error::bridge_io(Direction::Outbound, format!("failed to send message: {e}"))
    })?;

    trace!(len, "Message sent");
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
