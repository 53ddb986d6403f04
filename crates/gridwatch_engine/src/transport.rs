use std::time::Duration;

use futures_util::StreamExt;
use gridwatch_logging::{gw_debug, gw_info, gw_warn};
use thiserror::Error;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("connect timed out after {0:?}")]
    ConnectTimeout(Duration),
    #[error("websocket error: {0}")]
    WebSocket(#[from] tungstenite::Error),
    #[error("{0}")]
    Other(String),
}

/// Receive side of one open streaming connection.
#[async_trait::async_trait]
pub trait FrameStream: Send {
    /// Next text frame. `None` means the peer closed the stream.
    async fn next_frame(&mut self) -> Option<Result<String, TransportError>>;

    async fn close(&mut self);
}

/// Opens streaming connections. The reconnector owns whatever it returns.
#[async_trait::async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, url: &str) -> Result<Box<dyn FrameStream>, TransportError>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct WsConnector;

#[async_trait::async_trait]
impl Connector for WsConnector {
    async fn connect(&self, url: &str) -> Result<Box<dyn FrameStream>, TransportError> {
        let (inner, response) = connect_async(url).await?;
        gw_debug!("WebSocket handshake complete, status {}", response.status());
        Ok(Box::new(WsFrameStream { inner }))
    }
}

struct WsFrameStream {
    inner: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

#[async_trait::async_trait]
impl FrameStream for WsFrameStream {
    async fn next_frame(&mut self) -> Option<Result<String, TransportError>> {
        loop {
            match self.inner.next().await? {
                Ok(Message::Text(text)) => return Some(Ok(text.as_str().to_owned())),
                Ok(Message::Binary(data)) => match std::str::from_utf8(&data) {
                    Ok(text) => return Some(Ok(text.to_owned())),
                    Err(_) => gw_warn!("Dropping non UTF-8 binary frame ({} bytes)", data.len()),
                },
                Ok(Message::Close(frame)) => {
                    gw_info!("Server closed the stream: {:?}", frame);
                    return None;
                }
                // Pongs are answered by tungstenite while reading.
                Ok(Message::Ping(_) | Message::Pong(_) | Message::Frame(_)) => {}
                Err(err) => return Some(Err(err.into())),
            }
        }
    }

    async fn close(&mut self) {
        if let Err(err) = self.inner.close(None).await {
            gw_debug!("Ignoring error while closing stream: {}", err);
        }
    }
}
