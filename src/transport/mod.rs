use std::sync::Arc;

use tokio::time::Instant;

use crate::protocol::ServerMessage;

/// A player's line-oriented link to the server.
///
/// A single background producer fills the inbound queue; game logic drains
/// it without blocking through [`Transport::try_recv`]. Keepalive lines
/// refresh [`Transport::last_seen`] but never reach the queue. `is_closed`
/// is a one-way flag, so any holder may poll it.
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    /// Write one message followed by `\n`.
    async fn send(&self, msg: &ServerMessage) -> anyhow::Result<()>;

    /// Oldest buffered inbound line, if any.
    fn try_recv(&self) -> Option<String>;

    fn has_message(&self) -> bool;

    /// Drop every buffered inbound line, returning how many were dropped.
    /// Used in phases where client input has no meaning, so the reader is
    /// never held up by a full buffer.
    fn discard_pending(&self) -> usize {
        let mut dropped = 0;
        while self.try_recv().is_some() {
            dropped += 1;
        }
        dropped
    }

    fn is_closed(&self) -> bool;

    /// Tear the link down. Idempotent.
    fn close(&self);

    /// When traffic was last received from the peer.
    fn last_seen(&self) -> Instant;

    /// Human-readable peer identity for logs.
    fn peer(&self) -> String;
}

/// A transport shared between the heartbeat monitor, the queue and a match.
pub type Connection = Arc<dyn Transport>;

pub mod heartbeat;
pub mod memory;
pub mod tcp;
