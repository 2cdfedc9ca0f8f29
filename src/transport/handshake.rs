//! WebSocket opening handshake.
//!
//! Sends the upgrade request over an already connected transport and
//! turns the server's answer into either a live [`WebSocketStream`] or an
//! [`Error::Handshake`] carrying the HTTP status.

// ============================================================================
// Imports
// ============================================================================

use tokio::io::{AsyncRead, AsyncWrite};
use tokio_tungstenite::WebSocketStream;
use tokio_tungstenite::client_async_with_config;
use tokio_tungstenite::tungstenite::Error as WsError;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::headers::HeaderSet;
use crate::target::Target;

// ============================================================================
// Constants
// ============================================================================

/// Maximum number of response body bytes included in error messages.
const MAX_BODY_PREVIEW: usize = 256;

// ============================================================================
// Handshake
// ============================================================================

/// Performs the client upgrade handshake over `stream`.
///
/// The request carries every header in `headers` in addition to the
/// protocol-required ones.
///
/// # Returns
///
/// The live connection and the HTTP status of the upgrade response.
///
/// # Errors
///
/// Returns [`Error::Handshake`] if the request cannot be built, the server
/// answers with anything other than `101 Switching Protocols`, or the
/// exchange fails.
pub async fn handshake<S>(
    stream: S,
    target: &Target,
    headers: &HeaderSet,
) -> Result<(WebSocketStream<S>, u16)>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut request = target
        .request_uri()
        .into_client_request()
        .map_err(|e| Error::handshake(None, format!("invalid request: {e}")))?;

    for (name, value) in headers.iter() {
        request.headers_mut().insert(name.clone(), value.clone());
    }

    debug!(uri = %request.uri(), headers = request.headers().len(), "Sending upgrade request");

    let (socket, response) = client_async_with_config(request, stream, None)
        .await
        .map_err(handshake_error)?;

    let status = response.status().as_u16();
    info!(url = %target, status, "WebSocket connection established");

    Ok((socket, status))
}

/// Maps a tungstenite handshake failure to [`Error::Handshake`].
fn handshake_error(err: WsError) -> Error {
    match err {
        WsError::Http(response) => {
            let status = response.status();
            let mut message = status
                .canonical_reason()
                .unwrap_or("unexpected response")
                .to_owned();

            if let Some(body) = response.body().as_deref() {
                let preview = String::from_utf8_lossy(&body[..body.len().min(MAX_BODY_PREVIEW)]);
                let preview = preview.trim();
                if !preview.is_empty() {
                    message.push_str(": ");
                    message.push_str(preview);
                }
            }

            warn!(status = status.as_u16(), "Upgrade rejected by server");
            Error::handshake(Some(status.as_u16()), message)
        }
        other => Error::handshake(None, other.to_string()),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use futures_util::{SinkExt, StreamExt};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};
    use tokio::sync::oneshot;
    use tokio_tungstenite::accept_hdr_async;
    use tokio_tungstenite::tungstenite::Message;
    use tokio_tungstenite::tungstenite::handshake::server::{Request, Response};

    use crate::headers::HeaderBuilder;

    async fn listener() -> (TcpListener, u16) {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind should succeed");
        let port = listener.local_addr().unwrap().port();
        (listener, port)
    }

    #[tokio::test]
    async fn test_handshake_sends_headers() {
        let (listener, port) = listener().await;
        let (seen_tx, seen_rx) = oneshot::channel();

        tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            let callback = |req: &Request, resp: Response| {
                let _ = seen_tx.send((
                    req.uri().to_string(),
                    req.headers().get("host").cloned(),
                    req.headers().get("x-test").cloned(),
                    req.headers().get("origin").cloned(),
                    req.headers().get("authorization").cloned(),
                ));
                Ok(resp)
            };
            let mut ws = accept_hdr_async(socket, callback).await.unwrap();
            ws.send(Message::text("welcome")).await.unwrap();
        });

        let mut target = Target::parse(&format!("ws://user:pass@127.0.0.1:{port}/chat")).unwrap();
        let headers = HeaderBuilder::new()
            .header("X-Test: yes")
            .build(&mut target)
            .unwrap();

        let stream = TcpStream::connect(target.host_port()).await.unwrap();
        let (mut socket, status) = handshake(stream, &target, &headers)
            .await
            .expect("handshake should succeed");

        assert_eq!(status, 101);

        let (uri, host, x_test, origin, authorization) = seen_rx.await.unwrap();
        assert_eq!(uri, "/chat");
        assert_eq!(host.unwrap(), format!("127.0.0.1:{port}").as_str());
        assert_eq!(x_test.unwrap(), "yes");
        assert_eq!(origin.unwrap(), format!("//127.0.0.1:{port}").as_str());
        assert_eq!(authorization.unwrap(), "Basic dXNlcjpwYXNz");

        let message = socket.next().await.unwrap().unwrap();
        assert_eq!(message.into_text().unwrap().as_str(), "welcome");
    }

    #[tokio::test]
    async fn test_handshake_rejected_with_status() {
        let (listener, port) = listener().await;

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 4096];
            let _ = socket.read(&mut buf).await;
            let _ = socket
                .write_all(
                    b"HTTP/1.1 403 Forbidden\r\n\
                      Content-Length: 6\r\n\
                      Connection: close\r\n\r\ndenied",
                )
                .await;
        });

        let mut target = Target::parse(&format!("ws://127.0.0.1:{port}/")).unwrap();
        let headers = HeaderBuilder::new().build(&mut target).unwrap();

        let stream = TcpStream::connect(target.host_port()).await.unwrap();
        let err = handshake(stream, &target, &headers).await.unwrap_err();

        assert_eq!(err.handshake_status(), Some(403));
        assert!(err.to_string().contains("403"));
    }

    #[tokio::test]
    async fn test_handshake_peer_hangs_up() {
        let (listener, port) = listener().await;

        tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            drop(socket);
        });

        let mut target = Target::parse(&format!("ws://127.0.0.1:{port}/")).unwrap();
        let headers = HeaderBuilder::new().build(&mut target).unwrap();

        let stream = TcpStream::connect(target.host_port()).await.unwrap();
        let err = handshake(stream, &target, &headers).await.unwrap_err();

        assert!(matches!(err, Error::Handshake { status: None, .. }));
    }
}
