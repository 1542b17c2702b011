//! Match coordination: two player actors sharing a turn pointer, a ready
//! gate and each other's fleets.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use log::{debug, error, info, warn};
use tokio::sync::Notify;
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::Duration;

use crate::common::lock;
use crate::fleet::Fleet;
use crate::player::PlayerActor;
use crate::transport::Connection;

/// Players per match.
pub const PARTIES: usize = 2;

/// The other side of a two-player match.
pub fn opponent(side: usize) -> usize {
    1 - side
}

/// Which side may currently shoot.
///
/// Only the side holding the turn can hand it over, so two actors can never
/// race to set it.
#[derive(Debug)]
pub struct TurnPointer {
    current: AtomicUsize,
}

impl TurnPointer {
    pub fn new(first: usize) -> Self {
        Self {
            current: AtomicUsize::new(first),
        }
    }

    pub fn current(&self) -> usize {
        self.current.load(Ordering::SeqCst)
    }

    pub fn is(&self, side: usize) -> bool {
        self.current() == side
    }

    /// Hand the turn from `from` to its opponent. Fails if `from` does not
    /// hold it.
    pub fn pass(&self, from: usize) -> bool {
        self.current
            .compare_exchange(from, opponent(from), Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }
}

/// Two-party rendezvous in front of `GAME_START`.
///
/// Each side checks in with [`ReadyGate::arrive`]; the call that completes
/// the count returns `true` and that caller opens the gate once the start
/// announcements are out, releasing every waiter at once.
#[derive(Debug)]
pub struct ReadyGate {
    parties: usize,
    arrived: AtomicUsize,
    open: AtomicBool,
    notify: Notify,
}

impl ReadyGate {
    pub fn new(parties: usize) -> Self {
        Self {
            parties,
            arrived: AtomicUsize::new(0),
            open: AtomicBool::new(false),
            notify: Notify::new(),
        }
    }

    /// Check in. Returns `true` for the last party to arrive.
    pub fn arrive(&self) -> bool {
        self.arrived.fetch_add(1, Ordering::SeqCst) + 1 == self.parties
    }

    pub fn arrived(&self) -> usize {
        self.arrived.load(Ordering::SeqCst)
    }

    pub fn open(&self) {
        self.open.store(true, Ordering::SeqCst);
        self.notify.notify_waiters();
    }

    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }

    /// Resolve once the gate is open.
    pub async fn wait(&self) {
        loop {
            let notified = self.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            if self.is_open() {
                return;
            }
            notified.await;
        }
    }
}

/// How a match ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchOutcome {
    /// `winner` sank every opposing ship.
    Victory { winner: usize },
    /// The other side's connection was lost.
    Forfeit { winner: usize },
    /// Both sides went away with nobody left to notify.
    Abandoned,
    /// Ended on an internal consistency violation.
    Aborted,
}

struct Side {
    conn: Connection,
    fleet: Mutex<Fleet>,
}

/// One game between two connections.
pub struct Match {
    id: u64,
    sides: [Side; PARTIES],
    turn: TurnPointer,
    ready: ReadyGate,
    /// Serialises check-in against early-input discards.
    start: Mutex<()>,
    outcome: Mutex<Option<MatchOutcome>>,
    poll_interval: Duration,
}

impl Match {
    /// `first` (0 or 1) is the side that shoots first.
    pub fn new(
        id: u64,
        p1: Connection,
        p2: Connection,
        first: usize,
        poll_interval: Duration,
    ) -> Arc<Self> {
        let side = |conn| Side {
            conn,
            fleet: Mutex::new(Fleet::default()),
        };
        Arc::new(Self {
            id,
            sides: [side(p1), side(p2)],
            turn: TurnPointer::new(first % PARTIES),
            ready: ReadyGate::new(PARTIES),
            start: Mutex::new(()),
            outcome: Mutex::new(None),
            poll_interval,
        })
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn connection(&self, side: usize) -> &Connection {
        &self.sides[side].conn
    }

    pub fn turn(&self) -> &TurnPointer {
        &self.turn
    }

    pub fn ready(&self) -> &ReadyGate {
        &self.ready
    }

    /// Check `side` in at the ready gate. Returns `true` for the last side
    /// in, which also drops whatever either client sent before the start.
    pub(crate) fn check_in(&self, side: usize) -> bool {
        let _start = lock(&self.start);
        let last = self.ready.arrive();
        if last {
            for s in 0..PARTIES {
                self.discard_input(s);
            }
        }
        debug!(
            "match {}: player {} ready ({}/{})",
            self.id,
            side + 1,
            self.ready.arrived(),
            PARTIES
        );
        last
    }

    /// Drop lines `side` sent while waiting for the other grid. Does nothing
    /// once both sides are in, so input sent after `TURN_START` survives.
    pub(crate) fn discard_early_input(&self, side: usize) {
        let _start = lock(&self.start);
        if self.ready.arrived() < PARTIES {
            self.discard_input(side);
        }
    }

    fn discard_input(&self, side: usize) {
        let dropped = self.sides[side].conn.discard_pending();
        if dropped > 0 {
            debug!(
                "match {}: dropped {} line(s) player {} sent before the start",
                self.id,
                dropped,
                side + 1
            );
        }
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// A side's fleet. Never hold the guard across an await.
    pub(crate) fn fleet(&self, side: usize) -> MutexGuard<'_, Fleet> {
        lock(&self.sides[side].fleet)
    }

    pub fn outcome(&self) -> Option<MatchOutcome> {
        *lock(&self.outcome)
    }

    pub fn is_finished(&self) -> bool {
        self.outcome().is_some()
    }

    /// Record the outcome. Only the first caller wins; it is then the one
    /// responsible for announcing it.
    pub(crate) fn finish(&self, outcome: MatchOutcome) -> bool {
        let mut slot = lock(&self.outcome);
        if slot.is_some() {
            return false;
        }
        *slot = Some(outcome);
        true
    }

    pub fn close_all(&self) {
        for side in &self.sides {
            side.conn.close();
        }
    }

    /// Run both player actors to completion and close both connections.
    pub async fn run(self: Arc<Self>) -> MatchOutcome {
        let mut actors = JoinSet::new();
        for side in 0..PARTIES {
            actors.spawn(PlayerActor::new(self.clone(), side).run());
        }

        while let Some(joined) = actors.join_next().await {
            let failure = match joined {
                Ok(Ok(())) => continue,
                Ok(Err(e)) => format!("{:#}", e),
                Err(e) => e.to_string(),
            };
            error!("match {}: player task failed: {}", self.id, failure);
            self.finish(MatchOutcome::Aborted);
            self.close_all();
        }

        self.finish(MatchOutcome::Abandoned);
        self.close_all();
        let outcome = self.outcome().unwrap_or(MatchOutcome::Abandoned);
        match outcome {
            MatchOutcome::Aborted => warn!("match {} aborted", self.id),
            _ => info!("match {} finished: {:?}", self.id, outcome),
        }
        outcome
    }

    pub fn spawn(self: Arc<Self>) -> JoinHandle<MatchOutcome> {
        tokio::spawn(self.run())
    }
}
