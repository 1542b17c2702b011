//! In-process transport with the same semantics as [`TcpConnection`].
//!
//! The server side is a [`MemoryConnection`]; the [`MemoryClient`] end
//! plays the remote peer. Lines pushed by the client go through the same
//! keepalive filter and liveness refresh as the TCP reader.
//!
//! [`TcpConnection`]: crate::transport::tcp::TcpConnection

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use tokio::time::{Duration, Instant};

use crate::common::lock;
use crate::protocol::{is_keepalive, ServerMessage};
use crate::transport::{Connection, Transport};

pub struct MemoryConnection {
    name: String,
    inbound: Mutex<VecDeque<String>>,
    outbound: Mutex<Option<mpsc::UnboundedSender<String>>>,
    last_seen: Mutex<Instant>,
    closed: AtomicBool,
}

impl MemoryConnection {
    /// Create a connected pair with no start-up grace.
    pub fn pair(name: impl Into<String>) -> (Arc<MemoryConnection>, MemoryClient) {
        Self::with_grace(name, Duration::ZERO)
    }

    /// Create a connected pair whose liveness clock starts `grace` in the
    /// future.
    pub fn with_grace(
        name: impl Into<String>,
        grace: Duration,
    ) -> (Arc<MemoryConnection>, MemoryClient) {
        let (tx, rx) = mpsc::unbounded_channel();
        let conn = Arc::new(MemoryConnection {
            name: name.into(),
            inbound: Mutex::new(VecDeque::new()),
            outbound: Mutex::new(Some(tx)),
            last_seen: Mutex::new(Instant::now() + grace),
            closed: AtomicBool::new(false),
        });
        let client = MemoryClient {
            conn: conn.clone(),
            rx,
        };
        (conn, client)
    }

    fn deliver(&self, line: &str) {
        if self.is_closed() {
            return;
        }
        *lock(&self.last_seen) = Instant::now();
        if !is_keepalive(line) {
            lock(&self.inbound).push_back(line.to_string());
        }
    }
}

#[async_trait::async_trait]
impl Transport for MemoryConnection {
    async fn send(&self, msg: &ServerMessage) -> anyhow::Result<()> {
        let outbound = lock(&self.outbound);
        let tx = outbound
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("connection {} is closed", self.name))?;
        tx.send(msg.to_string())
            .map_err(|_| anyhow::anyhow!("connection {} is closed", self.name))
    }

    fn try_recv(&self) -> Option<String> {
        lock(&self.inbound).pop_front()
    }

    fn has_message(&self) -> bool {
        !lock(&self.inbound).is_empty()
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        lock(&self.outbound).take();
    }

    fn last_seen(&self) -> Instant {
        *lock(&self.last_seen)
    }

    fn peer(&self) -> String {
        self.name.clone()
    }
}

/// The remote end of a [`MemoryConnection`].
pub struct MemoryClient {
    conn: Arc<MemoryConnection>,
    rx: mpsc::UnboundedReceiver<String>,
}

impl MemoryClient {
    /// The server-side handle, ready to register with the server components.
    pub fn connection(&self) -> Connection {
        self.conn.clone()
    }

    /// Send one line to the server. Ignored once the link is closed.
    pub fn send_line(&self, line: &str) {
        self.conn.deliver(line);
    }

    /// Next line from the server; `None` once the link is closed and drained.
    pub async fn recv(&mut self) -> Option<String> {
        self.rx.recv().await
    }

    /// Next line from the server if one is already waiting.
    pub fn try_recv(&mut self) -> Option<String> {
        self.rx.try_recv().ok()
    }

    /// Drop the link from the client side.
    pub fn disconnect(&self) {
        self.conn.close();
    }

    pub fn is_closed(&self) -> bool {
        self.conn.is_closed()
    }
}
