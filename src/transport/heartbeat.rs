use std::sync::{Arc, Mutex};

use log::{debug, warn};
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration, Instant, MissedTickBehavior};

use crate::common::lock;
use crate::transport::Connection;

/// Drops connections that have gone silent.
///
/// HeartbeatMonitor holds every registered connection and periodically
/// compares each one's last-seen timestamp with the configured timeout:
/// - silent longer than the timeout: closed and deregistered
/// - already closed by someone else: deregistered
/// - otherwise left alone
///
/// It is the only component that disconnects a client for silence, whatever
/// phase the client is in. Holders of the same connection notice through
/// `is_closed()`.
pub struct HeartbeatMonitor {
    timeout: Duration,
    clients: Mutex<Vec<Connection>>,
}

impl HeartbeatMonitor {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            clients: Mutex::new(Vec::new()),
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Start watching a connection.
    pub fn register(&self, conn: Connection) {
        lock(&self.clients).push(conn);
    }

    /// Number of connections currently watched.
    pub fn len(&self) -> usize {
        lock(&self.clients).len()
    }

    pub fn is_empty(&self) -> bool {
        lock(&self.clients).is_empty()
    }

    /// Run one check. Returns how many connections were dropped for silence.
    pub fn sweep(&self) -> usize {
        let now = Instant::now();
        let mut timed_out = 0;
        lock(&self.clients).retain(|conn| {
            if conn.is_closed() {
                conn.close();
                return false;
            }
            let silent = now.saturating_duration_since(conn.last_seen());
            if silent > self.timeout {
                warn!("'{}' timed out after {:?} of silence", conn.peer(), silent);
                conn.close();
                timed_out += 1;
                return false;
            }
            true
        });
        if timed_out > 0 {
            debug!("heartbeat sweep dropped {} connection(s)", timed_out);
        }
        timed_out
    }

    /// Sweep every `period` until the task is aborted.
    pub fn spawn(self: Arc<Self>, period: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                self.sweep();
            }
        })
    }
}
