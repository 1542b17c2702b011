//! FIFO pairing of waiting connections.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use log::{debug, info};
use tokio::task::JoinHandle;
use tokio::time::{interval, sleep, Duration, MissedTickBehavior};

use crate::common::lock;
use crate::games::GamesManager;
use crate::protocol::ServerMessage;
use crate::transport::Connection;

/// Waiting room between accept and match start.
///
/// Connections are paired in arrival order on every tick. A closed entry is
/// discarded when it reaches the head; a closed second entry sends the first
/// back to the front so it keeps its place.
pub struct MatchmakingQueue {
    waiting: Mutex<VecDeque<Connection>>,
    games: Arc<GamesManager>,
}

impl MatchmakingQueue {
    pub fn new(games: Arc<GamesManager>) -> Self {
        Self {
            waiting: Mutex::new(VecDeque::new()),
            games,
        }
    }

    pub fn games(&self) -> &Arc<GamesManager> {
        &self.games
    }

    /// Enqueue a fresh connection and tell it to wait.
    pub async fn add(&self, conn: Connection) {
        if let Err(e) = conn.send(&ServerMessage::OpponentWait).await {
            debug!("could not send wait notice to '{}': {:#}", conn.peer(), e);
        }
        lock(&self.waiting).push_back(conn);
    }

    pub fn len(&self) -> usize {
        lock(&self.waiting).len()
    }

    pub fn is_empty(&self) -> bool {
        lock(&self.waiting).is_empty()
    }

    /// Pull every pair of live connections off the queue, oldest first.
    pub fn take_pairs(&self) -> Vec<(Connection, Connection)> {
        let mut waiting = lock(&self.waiting);
        let mut pairs = Vec::new();

        if waiting.len() == 1 && waiting.front().is_some_and(|c| c.is_closed()) {
            waiting.pop_front();
        }
        while waiting.len() >= 2 {
            let Some(first) = waiting.pop_front() else { break };
            if first.is_closed() {
                continue;
            }
            let Some(second) = waiting.pop_front() else {
                waiting.push_front(first);
                break;
            };
            if second.is_closed() {
                waiting.push_front(first);
                continue;
            }
            pairs.push((first, second));
        }
        pairs
    }

    /// Throw away anything queued players have sent while waiting.
    pub fn discard_waiting_input(&self) {
        for conn in lock(&self.waiting).iter() {
            let dropped = conn.discard_pending();
            if dropped > 0 {
                debug!("dropped {} line(s) from waiting '{}'", dropped, conn.peer());
            }
        }
    }

    /// One matchmaking pass: pair, notify, start matches. Returns the number
    /// of matches started.
    pub async fn tick(&self) -> usize {
        self.discard_waiting_input();
        let pairs = self.take_pairs();
        let started = pairs.len();
        for (p1, p2) in pairs {
            for conn in [&p1, &p2] {
                if let Err(e) = conn.send(&ServerMessage::OpponentFound).await {
                    debug!("could not notify '{}' of its match: {:#}", conn.peer(), e);
                }
            }
            self.games.create(p1, p2);
        }
        started
    }

    /// Tick after `initial_delay`, then `delay` after each completed pass.
    pub fn spawn(self: Arc<Self>, initial_delay: Duration, delay: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            sleep(initial_delay).await;
            loop {
                let started = self.tick().await;
                if started > 0 {
                    debug!("matchmaking started {} match(es)", started);
                }
                sleep(delay).await;
            }
        })
    }

    /// Log queue length and running matches every `period`.
    pub fn spawn_status(self: Arc<Self>, period: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                info!(
                    "{} player(s) waiting, {} match(es) running",
                    self.len(),
                    self.games.live()
                );
            }
        })
    }
}
