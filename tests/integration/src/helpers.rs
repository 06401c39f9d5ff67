//! Test helpers for integration tests
//!
//! Provides utilities for spawning a relay on a loopback port, opening
//! WebSocket clients against it and reading its counters.

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{Context, Result};
use futures_util::StreamExt;
use relay_common::RelayConfig;
use reqwest::{Client, Response};
use serde_json::Value;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

/// WebSocket client connected to the test relay
pub type WsClient = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Upper bound for any single wait in a test
pub const WAIT: Duration = Duration::from_secs(5);

/// Test server instance that manages lifecycle
pub struct TestServer {
    pub addr: SocketAddr,
    pub path: String,
    pub client: Client,
    shutdown: Option<oneshot::Sender<()>>,
    _handle: JoinHandle<()>,
}

impl TestServer {
    /// Start a new test server with default settings
    pub async fn start() -> Result<Self> {
        Self::start_with_config(test_config()?).await
    }

    /// Start a test server with custom config
    ///
    /// Host and port are ignored; the server always binds an ephemeral
    /// loopback port.
    pub async fn start_with_config(config: RelayConfig) -> Result<Self> {
        let listener = TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0))).await?;
        let addr = listener.local_addr()?;
        let path = config.server.path.clone();

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let handle = tokio::spawn(async move {
            let shutdown = async {
                let _ = shutdown_rx.await;
            };
            if let Err(e) = relay_gateway::serve(listener, config, shutdown).await {
                eprintln!("test relay stopped: {e}");
            }
        });

        let client = Client::builder().timeout(WAIT).build()?;

        Ok(Self {
            addr,
            path,
            client,
            shutdown: Some(shutdown_tx),
            _handle: handle,
        })
    }

    /// Get base URL for the server
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Get the WebSocket URL of the relay endpoint
    pub fn ws_url(&self) -> String {
        format!("ws://{}{}", self.addr, self.path)
    }

    /// Make a GET request
    pub async fn get(&self, path: &str) -> Result<Response> {
        let url = format!("{}{}", self.base_url(), path);
        Ok(self.client.get(&url).send().await?)
    }

    /// Fetch the hub counters
    pub async fn stats(&self) -> Result<Value> {
        let response = self.get("/stats").await?;
        anyhow::ensure!(
            response.status().is_success(),
            "stats returned {}",
            response.status()
        );
        Ok(response.json().await?)
    }

    /// Open a WebSocket client against the relay endpoint
    pub async fn connect(&self) -> Result<WsClient> {
        let (ws, _response) = connect_async(self.ws_url()).await?;
        Ok(ws)
    }

    /// Wait until the hub reports `expected` registered clients
    pub async fn wait_for_connected(&self, expected: u64) -> Result<()> {
        self.wait_for_stat("connected", expected).await
    }

    /// Wait until a hub counter reaches `expected`
    pub async fn wait_for_stat(&self, field: &str, expected: u64) -> Result<()> {
        let poll = async {
            loop {
                let stats = self.stats().await?;
                if stats[field].as_u64() == Some(expected) {
                    return Ok::<_, anyhow::Error>(());
                }
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        };

        tokio::time::timeout(WAIT, poll)
            .await
            .with_context(|| format!("{field} never reached {expected}"))?
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
    }
}

/// Create a test configuration from defaults only
pub fn test_config() -> Result<RelayConfig> {
    RelayConfig::from_lookup(|_| None).map_err(|e| anyhow::anyhow!("Config error: {}", e))
}

/// Read the next data frame, failing on close or timeout
pub async fn next_message(ws: &mut WsClient) -> Result<Message> {
    loop {
        let message = tokio::time::timeout(WAIT, ws.next())
            .await
            .context("timed out waiting for a message")?
            .context("stream ended")??;

        match message {
            Message::Ping(_) | Message::Pong(_) => continue,
            Message::Close(frame) => anyhow::bail!("connection closed: {frame:?}"),
            other => return Ok(other),
        }
    }
}

/// Read until the server closes the connection and return its close code
pub async fn expect_close(ws: &mut WsClient) -> Result<Option<u16>> {
    loop {
        let message = tokio::time::timeout(WAIT, ws.next())
            .await
            .context("timed out waiting for close")?;

        match message {
            Some(Ok(Message::Close(frame))) => return Ok(frame.map(|frame| u16::from(frame.code))),
            Some(Ok(_)) => continue,
            Some(Err(_)) | None => return Ok(None),
        }
    }
}
