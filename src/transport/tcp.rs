use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use log::{debug, info, warn};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout, Duration, Instant};

use crate::common::lock;
use crate::config::ServerConfig;
use crate::protocol::{is_keepalive, ServerMessage};
use crate::transport::Transport;

/// Size of a single socket read.
const READ_CHUNK: usize = 512;

/// Per-connection limits, usually taken from [`ServerConfig`].
#[derive(Debug, Clone)]
pub struct TcpOptions {
    /// Added to the initial last-seen timestamp to absorb setup latency.
    pub grace: Duration,
    /// Inbound lines buffered before the reader stops pulling from the socket.
    pub inbound_capacity: usize,
    /// Longest accepted line; anything longer closes the connection.
    pub max_line_len: usize,
    pub write_timeout: Duration,
    /// Back-pressure poll period while the inbound buffer is full.
    pub poll_interval: Duration,
}

impl TcpOptions {
    pub fn from_config(config: &ServerConfig) -> Self {
        Self {
            grace: config.connect_grace(),
            inbound_capacity: config.inbound_capacity,
            max_line_len: config.max_line_len,
            write_timeout: config.write_timeout(),
            poll_interval: config.poll_interval(),
        }
    }
}

impl Default for TcpOptions {
    fn default() -> Self {
        Self::from_config(&ServerConfig::default())
    }
}

/// State shared between the connection handle and its reader task.
struct Shared {
    inbound: Mutex<VecDeque<String>>,
    last_seen: Mutex<Instant>,
    closed: AtomicBool,
}

impl Shared {
    fn beat(&self) {
        *lock(&self.last_seen) = Instant::now();
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

/// A player socket with a background line reader.
pub struct TcpConnection {
    peer: SocketAddr,
    shared: Arc<Shared>,
    writer: tokio::sync::Mutex<Option<OwnedWriteHalf>>,
    reader: Mutex<Option<JoinHandle<()>>>,
    write_timeout: Duration,
}

impl TcpConnection {
    /// Wrap an accepted stream and start its reader task.
    pub fn spawn(stream: TcpStream, options: TcpOptions) -> anyhow::Result<Arc<Self>> {
        let peer = stream.peer_addr()?;
        stream.set_nodelay(true)?;
        let (read_half, write_half) = stream.into_split();

        let shared = Arc::new(Shared {
            inbound: Mutex::new(VecDeque::with_capacity(options.inbound_capacity)),
            last_seen: Mutex::new(Instant::now() + options.grace),
            closed: AtomicBool::new(false),
        });
        let write_timeout = options.write_timeout;
        let reader = tokio::spawn(read_loop(read_half, shared.clone(), options, peer));

        Ok(Arc::new(Self {
            peer,
            shared,
            writer: tokio::sync::Mutex::new(Some(write_half)),
            reader: Mutex::new(Some(reader)),
            write_timeout,
        }))
    }

    pub fn peer_addr(&self) -> SocketAddr {
        self.peer
    }
}

async fn read_loop(
    mut read_half: OwnedReadHalf,
    shared: Arc<Shared>,
    options: TcpOptions,
    peer: SocketAddr,
) {
    let mut chunk = [0u8; READ_CHUNK];
    let mut pending: Vec<u8> = Vec::new();

    'read: while !shared.is_closed() {
        let n = match read_half.read(&mut chunk).await {
            Ok(0) => {
                info!("'{}' closed the connection", peer);
                break;
            }
            Ok(n) => n,
            Err(e) => {
                debug!("'{}' read error: {}", peer, e);
                break;
            }
        };
        // Any byte counts as a sign of life, complete line or not.
        shared.beat();
        pending.extend_from_slice(&chunk[..n]);

        while let Some(pos) = pending.iter().position(|&b| b == b'\n') {
            let mut raw: Vec<u8> = pending.drain(..=pos).collect();
            raw.pop();
            if raw.last() == Some(&b'\r') {
                raw.pop();
            }
            if raw.len() > options.max_line_len {
                warn!("'{}' sent a {} byte line, closing", peer, raw.len());
                break 'read;
            }
            let line = String::from_utf8_lossy(&raw).into_owned();
            if is_keepalive(&line) {
                continue;
            }
            loop {
                let full = lock(&shared.inbound).len() >= options.inbound_capacity;
                if !full {
                    break;
                }
                if shared.is_closed() {
                    return;
                }
                sleep(options.poll_interval).await;
            }
            lock(&shared.inbound).push_back(line);
        }

        if pending.len() > options.max_line_len {
            warn!("'{}' sent an unterminated line over {} bytes, closing", peer, options.max_line_len);
            break;
        }
    }
    shared.closed.store(true, Ordering::SeqCst);
}

#[async_trait::async_trait]
impl Transport for TcpConnection {
    async fn send(&self, msg: &ServerMessage) -> anyhow::Result<()> {
        if self.is_closed() {
            return Err(anyhow::anyhow!("connection to {} is closed", self.peer));
        }
        let line = format!("{}\n", msg);

        let mut guard = self.writer.lock().await;
        if self.is_closed() {
            guard.take();
            return Err(anyhow::anyhow!("connection to {} is closed", self.peer));
        }
        let writer = guard
            .as_mut()
            .ok_or_else(|| anyhow::anyhow!("connection to {} is closed", self.peer))?;

        let written = timeout(self.write_timeout, writer.write_all(line.as_bytes())).await;
        let result = match written {
            Ok(Ok(())) => {
                // close() ran while this write held the half
                if self.is_closed() && guard.take().is_some() {
                    info!("'{}' disconnected", self.peer);
                }
                return Ok(());
            }
            Ok(Err(e)) => anyhow::anyhow!("write to {} failed: {}", self.peer, e),
            Err(_) => anyhow::anyhow!("write to {} timed out after {:?}", self.peer, self.write_timeout),
        };
        drop(guard);
        self.close();
        Err(result)
    }

    fn try_recv(&self) -> Option<String> {
        lock(&self.shared.inbound).pop_front()
    }

    fn has_message(&self) -> bool {
        !lock(&self.shared.inbound).is_empty()
    }

    fn is_closed(&self) -> bool {
        self.shared.is_closed()
    }

    fn close(&self) {
        self.shared.closed.store(true, Ordering::SeqCst);
        if let Some(reader) = lock(&self.reader).take() {
            reader.abort();
        }
        // A send in flight holds the writer; it drops the half itself when
        // the write returns.
        if let Ok(mut writer) = self.writer.try_lock() {
            if writer.take().is_some() {
                info!("'{}' disconnected", self.peer);
            }
        }
    }

    fn last_seen(&self) -> Instant {
        *lock(&self.shared.last_seen)
    }

    fn peer(&self) -> String {
        self.peer.to_string()
    }
}

impl Drop for TcpConnection {
    fn drop(&mut self) {
        if let Some(reader) = lock(&self.reader).take() {
            reader.abort();
        }
    }
}
