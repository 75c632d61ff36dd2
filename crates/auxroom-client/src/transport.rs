//! WebSocket transport for the room channel.
//!
//! A thin layer over tokio-tungstenite: connect, read text frames, write
//! text frames. Reconnection policy lives in the engine
//! (`auxroom_core::ConnectionTracker`); the session loop just reports what
//! happens here. A close frame from the server and a socket error both end
//! the stream the same way - the engine treats them identically.

use futures_util::{SinkExt, StreamExt};
use thiserror::Error;
use tokio::net::TcpStream;
use tokio_tungstenite::{
    MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message,
};
use url::Url;

/// Transport-level errors.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The WebSocket handshake or an I/O operation failed.
    #[error("websocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),
}

/// One established WebSocket connection to a room channel.
pub struct Transport {
    socket: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl Transport {
    /// Connect and complete the WebSocket handshake.
    pub async fn connect(url: Url) -> Result<Self, TransportError> {
        let (socket, _response) = connect_async(url.to_string()).await?;
        Ok(Self { socket })
    }

    /// Next inbound text frame.
    ///
    /// Returns `None` when the connection is gone, whether by error, socket
    /// close, or a normal close frame. Non-text frames are skipped; control
    /// frames are handled by the underlying stream.
    pub async fn next_text(&mut self) -> Option<String> {
        loop {
            match self.socket.next().await? {
                Ok(Message::Text(text)) => return Some(text),
                Ok(Message::Close(_)) | Err(_) => return None,
                // Binary frames are not part of the chat protocol; ignore.
                Ok(_) => {},
            }
        }
    }

    /// Send one text frame.
    pub async fn send_text(&mut self, text: String) -> Result<(), TransportError> {
        self.socket.send(Message::Text(text)).await?;
        Ok(())
    }
}
