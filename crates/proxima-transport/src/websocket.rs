//! WebSocket channels over `tokio-tungstenite`.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::handshake::server::{
    ErrorResponse, Request, Response,
};

use crate::{
    Connection, ConnectionId, Frame, HandshakeMetadata, PendingConnection, Transport,
    TransportError,
};

static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

type WsStream = tokio_tungstenite::WebSocketStream<TcpStream>;

/// Listens for WebSocket upgrades on a TCP socket.
pub struct WebSocketTransport {
    listener: TcpListener,
}

impl WebSocketTransport {
    /// Binds the listener. Port `0` picks a free port; see [`Self::local_addr`].
    pub async fn bind(addr: &str) -> Result<Self, TransportError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| TransportError::Bind {
                addr: addr.to_string(),
                source,
            })?;
        tracing::info!(addr, "WebSocket transport listening");
        Ok(Self { listener })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }
}

impl Transport for WebSocketTransport {
    type Pending = PendingWebSocket;
    type Connection = WebSocketConnection;
    type Error = TransportError;

    async fn accept(&mut self) -> Result<Self::Pending, Self::Error> {
        let (stream, peer) = self
            .listener
            .accept()
            .await
            .map_err(TransportError::Accept)?;
        tracing::trace!(%peer, "TCP connection accepted");
        Ok(PendingWebSocket { stream, peer })
    }

    async fn shutdown(&self) -> Result<(), Self::Error> {
        // The listener closes when the transport is dropped.
        tracing::debug!("WebSocket transport stopped accepting");
        Ok(())
    }
}

/// A TCP socket that has not sent its upgrade request yet.
#[derive(Debug)]
pub struct PendingWebSocket {
    stream: TcpStream,
    peer: SocketAddr,
}

impl PendingWebSocket {
    pub fn peer_addr(&self) -> SocketAddr {
        self.peer
    }
}

impl PendingConnection for PendingWebSocket {
    type Connection = WebSocketConnection;
    type Error = TransportError;

    async fn upgrade(self) -> Result<Self::Connection, Self::Error> {
        // Record the upgrade request so credentials carried in cookies,
        // headers, or the query string reach the authenticator.
        let mut metadata = HandshakeMetadata::new();
        let capture = |req: &Request, resp: Response| -> Result<Response, ErrorResponse> {
            for (name, value) in req.headers() {
                if let Ok(value) = value.to_str() {
                    metadata.push_header(name.as_str(), value);
                }
            }
            if let Some(query) = req.uri().query() {
                metadata.set_query(query);
            }
            Ok(resp)
        };

        let ws = tokio_tungstenite::accept_hdr_async(self.stream, capture)
            .await
            .map_err(|e| TransportError::Handshake(e.to_string()))?;

        let id = ConnectionId::new(
            NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed),
        );
        tracing::debug!(%id, peer = %self.peer, "WebSocket upgrade complete");

        // Split so an outbound emit never waits behind a pending receive.
        let (sink, stream) = ws.split();
        Ok(WebSocketConnection {
            id,
            metadata,
            sink: Mutex::new(sink),
            stream: Mutex::new(stream),
        })
    }
}

/// An upgraded client socket, split into independently locked halves.
pub struct WebSocketConnection {
    id: ConnectionId,
    metadata: HandshakeMetadata,
    sink: Mutex<SplitSink<WsStream, Message>>,
    stream: Mutex<SplitStream<WsStream>>,
}

impl Connection for WebSocketConnection {
    type Error = TransportError;

    async fn send(&self, data: &[u8]) -> Result<(), Self::Error> {
        // JSON frames go out as text so browser clients can read them
        // without a Blob round-trip.
        let msg = match std::str::from_utf8(data) {
            Ok(text) => Message::text(text.to_owned()),
            Err(_) => Message::binary(data.to_vec()),
        };
        self.sink
            .lock()
            .await
            .send(msg)
            .await
            .map_err(|e| TransportError::Send(e.to_string()))
    }

    async fn recv(&self) -> Result<Option<Frame>, Self::Error> {
        let mut stream = self.stream.lock().await;
        loop {
            return match stream.next().await {
                Some(Ok(Message::Binary(data))) => Ok(Some(Frame::Data(data.into()))),
                Some(Ok(Message::Text(text))) => Ok(Some(Frame::Data(text.as_bytes().to_vec()))),
                // tungstenite answers pings itself; the handler only needs
                // to know the peer is alive.
                Some(Ok(Message::Ping(_) | Message::Pong(_))) => Ok(Some(Frame::KeepAlive)),
                Some(Ok(Message::Close(_))) | None => Ok(None),
                Some(Ok(Message::Frame(_))) => continue,
                Some(Err(e)) => Err(TransportError::Receive(e.to_string())),
            };
        }
    }

    async fn close(&self) -> Result<(), Self::Error> {
        self.sink
            .lock()
            .await
            .close()
            .await
            .map_err(|e| TransportError::ConnectionClosed(e.to_string()))
    }

    fn id(&self) -> ConnectionId {
        self.id
    }

    fn metadata(&self) -> &HandshakeMetadata {
        &self.metadata
    }
}
