//! Transport abstraction and the tokio-tungstenite implementation.

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::debug;

use notify_core::error::{AppError, ErrorKind};
use notify_core::result::AppResult;
use notify_core::types::Credential;

/// An open, bidirectional text channel to the notification server.
///
/// Owned exclusively by the connection manager.
#[async_trait]
pub trait Transport: Send {
    /// Writes one text frame.
    async fn send_text(&mut self, text: String) -> AppResult<()>;

    /// Next inbound text frame. `None` once the peer has closed; `Some(Err)`
    /// on a transport failure. Both end the transport.
    async fn next_text(&mut self) -> Option<AppResult<String>>;

    /// Closes the transport. Errors are swallowed; the transport is gone either way.
    async fn close(&mut self);
}

/// Opens transports.
#[async_trait]
pub trait Connector: Send + Sync + 'static {
    /// Opens a transport to `url`, which already carries the credential.
    async fn connect(&self, url: &str) -> AppResult<Box<dyn Transport>>;
}

/// Builds the handshake URL with the credential as a query parameter.
pub fn handshake_url(base: &str, param: &str, credential: &Credential) -> String {
    let separator = if base.contains('?') { '&' } else { '?' };
    format!(
        "{base}{separator}{param}={}",
        urlencoding::encode(credential.expose())
    )
}

/// WebSocket connector backed by tokio-tungstenite.
#[derive(Debug, Clone, Default)]
pub struct WsConnector;

#[async_trait]
impl Connector for WsConnector {
    async fn connect(&self, url: &str) -> AppResult<Box<dyn Transport>> {
        let (stream, response) = tokio_tungstenite::connect_async(url)
            .await
            .map_err(|e| {
                AppError::with_source(
                    ErrorKind::Transport,
                    format!("WebSocket handshake failed: {e}"),
                    e,
                )
            })?;

        debug!(status = %response.status(), "WebSocket handshake complete");
        Ok(Box::new(WsTransport { stream }))
    }
}

/// A live WebSocket.
pub struct WsTransport {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl std::fmt::Debug for WsTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WsTransport").finish()
    }
}

#[async_trait]
impl Transport for WsTransport {
    async fn send_text(&mut self, text: String) -> AppResult<()> {
        self.stream.send(Message::text(text)).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Transport,
                format!("WebSocket send failed: {e}"),
                e,
            )
        })
    }

    async fn next_text(&mut self) -> Option<AppResult<String>> {
        loop {
            match self.stream.next().await? {
                Ok(Message::Text(text)) => return Some(Ok(text.as_str().to_owned())),
                // Left to the decoder to reject.
                Ok(Message::Binary(bytes)) => {
                    return Some(Ok(String::from_utf8_lossy(&bytes).into_owned()));
                }
                Ok(Message::Close(frame)) => {
                    debug!(?frame, "Server sent close frame");
                    return None;
                }
                // tungstenite answers pings itself.
                Ok(Message::Ping(_) | Message::Pong(_) | Message::Frame(_)) => continue,
                Err(e) => {
                    return Some(Err(AppError::with_source(
                        ErrorKind::Transport,
                        format!("WebSocket read failed: {e}"),
                        e,
                    )));
                }
            }
        }
    }

    async fn close(&mut self) {
        if let Err(e) = self.stream.close(None).await {
            debug!(error = %e, "WebSocket close did not complete cleanly");
        }
    }
}
