use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use log::info;
use rand::Rng;
use tokio::task::JoinHandle;
use tokio::time::Duration;

use crate::game::{Match, MatchOutcome};
use crate::transport::Connection;

/// Starts matches and keeps count of the ones still running.
pub struct GamesManager {
    poll_interval: Duration,
    next_id: AtomicU64,
    live: Arc<AtomicUsize>,
}

impl GamesManager {
    pub fn new(poll_interval: Duration) -> Self {
        Self {
            poll_interval,
            next_id: AtomicU64::new(1),
            live: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Matches started and not yet finished.
    pub fn live(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }

    /// Start a match; a coin flip decides who shoots first.
    pub fn create(&self, p1: Connection, p2: Connection) -> JoinHandle<MatchOutcome> {
        let first = if rand::rng().random_bool(0.5) { 0 } else { 1 };
        self.create_with_first(p1, p2, first)
    }

    /// Start a match with a fixed first shooter (0 for `p1`, 1 for `p2`).
    pub fn create_with_first(
        &self,
        p1: Connection,
        p2: Connection,
        first: usize,
    ) -> JoinHandle<MatchOutcome> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        info!(
            "match {}: '{}' vs '{}', player {} shoots first",
            id,
            p1.peer(),
            p2.peer(),
            first + 1
        );
        let game = Match::new(id, p1, p2, first, self.poll_interval);

        let live = self.live.clone();
        live.fetch_add(1, Ordering::SeqCst);
        tokio::spawn(async move {
            let outcome = game.run().await;
            live.fetch_sub(1, Ordering::SeqCst);
            outcome
        })
    }
}
