//! WebSocket transport
//!
//! Adapts an upgraded axum WebSocket to the [`Transport`] trait.

use super::{wait_closed, CloseReason, Payload, Transport, TransportError};
use async_trait::async_trait;
use axum::extract::ws::{CloseFrame, Message, Utf8Bytes, WebSocket};
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::sync::{watch, Mutex};

/// Upper bound on sending the close frame to a peer that stopped reading
const CLOSE_TIMEOUT: Duration = Duration::from_secs(5);

/// WebSocket connection split into independently locked halves
pub struct WebSocketTransport {
    sink: Mutex<SplitSink<WebSocket, Message>>,
    stream: Mutex<SplitStream<WebSocket>>,
    shutdown: watch::Sender<bool>,
}

impl WebSocketTransport {
    /// Wrap an upgraded socket
    pub fn new(socket: WebSocket) -> Self {
        let (sink, stream) = socket.split();
        let (shutdown, _) = watch::channel(false);

        Self {
            sink: Mutex::new(sink),
            stream: Mutex::new(stream),
            shutdown,
        }
    }

    fn is_closed(&self) -> bool {
        *self.shutdown.borrow()
    }
}

fn into_message(payload: Payload) -> Message {
    match payload {
        Payload::Text(text) => Message::Text(text.to_string().into()),
        Payload::Binary(data) => Message::Binary(data.to_vec().into()),
    }
}

#[async_trait]
impl Transport for WebSocketTransport {
    async fn receive(&self) -> Result<Payload, TransportError> {
        let closed = wait_closed(self.shutdown.subscribe());
        tokio::pin!(closed);

        let mut stream = tokio::select! {
            biased;
            () = &mut closed => return Err(TransportError::Closed),
            stream = self.stream.lock() => stream,
        };

        loop {
            let frame = tokio::select! {
                biased;
                () = &mut closed => return Err(TransportError::Closed),
                frame = stream.next() => frame,
            };

            match frame {
                Some(Ok(Message::Text(text))) => return Ok(Payload::text(text.as_str())),
                Some(Ok(Message::Binary(data))) => return Ok(Payload::binary(&data[..])),
                Some(Ok(Message::Ping(_) | Message::Pong(_))) => {
                    // Pong is handled automatically by axum
                    tracing::trace!("Control frame received");
                }
                Some(Ok(Message::Close(frame))) => {
                    tracing::trace!(frame = ?frame, "Close frame received");
                    return Err(TransportError::Closed);
                }
                Some(Err(e)) => return Err(TransportError::Receive(Box::new(e))),
                None => return Err(TransportError::Closed),
            }
        }
    }

    async fn send(&self, payload: Payload) -> Result<(), TransportError> {
        if self.is_closed() {
            return Err(TransportError::Closed);
        }

        let closed = wait_closed(self.shutdown.subscribe());
        let message = into_message(payload);

        tokio::select! {
            biased;
            () = closed => Err(TransportError::Closed),
            result = async {
                let mut sink = self.sink.lock().await;
                sink.send(message).await
            } => result.map_err(|e| TransportError::Send(Box::new(e))),
        }
    }

    async fn close(&self, reason: CloseReason) {
        if self.shutdown.send_replace(true) {
            return;
        }

        // Raising the flag above released any send holding the sink.
        let frame = CloseFrame {
            code: reason.code(),
            reason: Utf8Bytes::from_static(reason.description()),
        };

        let result = tokio::time::timeout(CLOSE_TIMEOUT, async {
            let mut sink = self.sink.lock().await;
            sink.send(Message::Close(Some(frame))).await
        })
        .await;

        match result {
            Ok(Ok(())) => tracing::trace!(reason = %reason, "Close frame sent"),
            Ok(Err(e)) => tracing::debug!(error = %e, "Failed to send close frame"),
            Err(_) => tracing::debug!("Timed out sending close frame"),
        }
    }
}

impl std::fmt::Debug for WebSocketTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebSocketTransport")
            .field("closed", &self.is_closed())
            .finish()
    }
}
