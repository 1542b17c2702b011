use std::collections::HashSet;
use std::sync::Arc;

use log::{debug, error, info};
use tokio::time::{sleep, timeout};

use crate::coord::Coord;
use crate::fleet::{Fleet, ShotOutcome};
use crate::game::{opponent, Match, MatchOutcome};
use crate::grid::parse_grid;
use crate::protocol::{parse_shot, ServerMessage};
use crate::ship::Ship;
use crate::transport::Connection;

/// Where a player is in the match protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerState {
    AwaitingGrid,
    GridAccepted,
    AwaitingReady,
    TurnActive,
    TurnWait,
    Terminated,
}

/// What the turn loop does after handling one message.
enum Flow {
    Continue,
    Finished,
}

/// Drives one side of a [`Match`].
///
/// The actor owns its shot history; the fleets, the turn pointer and the
/// ready gate are shared with the opposing actor through the match.
pub struct PlayerActor {
    game: Arc<Match>,
    side: usize,
    state: PlayerState,
    shots: HashSet<Coord>,
}

impl PlayerActor {
    pub fn new(game: Arc<Match>, side: usize) -> Self {
        Self {
            game,
            side,
            state: PlayerState::AwaitingGrid,
            shots: HashSet::new(),
        }
    }

    pub fn state(&self) -> PlayerState {
        self.state
    }

    /// Play until the match ends or this side's connection goes away.
    pub async fn run(mut self) -> anyhow::Result<()> {
        let result = self.play().await;
        self.enter(PlayerState::Terminated);
        result
    }

    async fn play(&mut self) -> anyhow::Result<()> {
        let Some(ships) = self.await_grid().await else {
            return Ok(());
        };
        *self.game.fleet(self.side) = Fleet::new(ships);
        self.enter(PlayerState::GridAccepted);

        if self.game.check_in(self.side) {
            self.announce_start().await;
            self.game.ready().open();
        }
        self.enter(PlayerState::AwaitingReady);
        if !self.await_ready().await {
            return Ok(());
        }

        self.turn_loop().await
    }

    fn conn(&self) -> &Connection {
        self.game.connection(self.side)
    }

    fn enter(&mut self, state: PlayerState) {
        if self.state != state {
            debug!(
                "match {}: player {} {:?} -> {:?}",
                self.game.id(),
                self.side + 1,
                self.state,
                state
            );
            self.state = state;
        }
    }

    async fn send(&self, msg: ServerMessage) {
        self.send_to(self.side, msg).await
    }

    /// Send failures are only logged; a dead link is picked up by the next
    /// liveness check.
    async fn send_to(&self, side: usize, msg: ServerMessage) {
        if let Err(e) = self.game.connection(side).send(&msg).await {
            debug!(
                "match {}: could not send {} to player {}: {:#}",
                self.game.id(),
                msg,
                side + 1,
                e
            );
        }
    }

    /// Next inbound line, or `None` once this actor should stop: the match
    /// has ended, this side is gone, or the opponent is gone (which also
    /// settles the match as a forfeit).
    async fn next_message(&mut self) -> Option<String> {
        loop {
            if self.game.is_finished() {
                return None;
            }
            if let Some(line) = self.conn().try_recv() {
                return Some(line);
            }
            if self.conn().is_closed() {
                info!(
                    "match {}: player {} disconnected",
                    self.game.id(),
                    self.side + 1
                );
                return None;
            }
            if self.game.connection(opponent(self.side)).is_closed() {
                self.claim_forfeit().await;
                return None;
            }
            sleep(self.game.poll_interval()).await;
        }
    }

    async fn claim_forfeit(&self) {
        if self.game.finish(MatchOutcome::Forfeit { winner: self.side }) {
            info!(
                "match {}: player {} wins by forfeit",
                self.game.id(),
                self.side + 1
            );
            self.send(ServerMessage::WinOpponentDc).await;
            self.game.close_all();
        }
    }

    async fn await_grid(&mut self) -> Option<Vec<Ship>> {
        self.enter(PlayerState::AwaitingGrid);
        loop {
            self.send(ServerMessage::SendGrid).await;
            let line = self.next_message().await?;
            match parse_grid(&line) {
                Ok(ships) => {
                    self.send(ServerMessage::GridOk).await;
                    return Some(ships);
                }
                Err(e) => {
                    debug!(
                        "match {}: player {} grid rejected: {}",
                        self.game.id(),
                        self.side + 1,
                        e
                    );
                    self.send(ServerMessage::GridErr).await;
                }
            }
        }
    }

    /// Sent by whichever side completes the ready count, before the gate
    /// opens, so both clients see `GAME_START` ahead of any turn traffic.
    async fn announce_start(&self) {
        info!("match {}: both grids accepted", self.game.id());
        let first = self.game.turn().current();
        self.send_to(first, ServerMessage::GameStart).await;
        self.send_to(first, ServerMessage::TurnStart).await;
        self.send_to(opponent(first), ServerMessage::GameStart).await;
    }

    /// Wait for the gate while still watching both connections. Anything
    /// the client sends meanwhile is dropped.
    async fn await_ready(&mut self) -> bool {
        loop {
            if self.game.ready().is_open() {
                return true;
            }
            if self.game.is_finished() || self.conn().is_closed() {
                return false;
            }
            if self.game.connection(opponent(self.side)).is_closed() {
                self.claim_forfeit().await;
                return false;
            }
            self.game.discard_early_input(self.side);
            let _ = timeout(self.game.poll_interval(), self.game.ready().wait()).await;
        }
    }

    fn sync_turn_state(&mut self) {
        if self.game.turn().is(self.side) {
            self.enter(PlayerState::TurnActive);
        } else {
            self.enter(PlayerState::TurnWait);
        }
    }

    async fn turn_loop(&mut self) -> anyhow::Result<()> {
        loop {
            self.sync_turn_state();
            let Some(line) = self.next_message().await else {
                return Ok(());
            };
            if !self.game.turn().is(self.side) {
                debug!(
                    "match {}: player {} sent {:?} out of turn, dropped",
                    self.game.id(),
                    self.side + 1,
                    line
                );
                continue;
            }
            self.enter(PlayerState::TurnActive);
            if let Flow::Finished = self.take_turn(&line).await? {
                return Ok(());
            }
        }
    }

    async fn take_turn(&mut self, line: &str) -> anyhow::Result<Flow> {
        let coord = match parse_shot(line) {
            Ok(coord) => coord,
            Err(e) => {
                debug!(
                    "match {}: player {}: {}",
                    self.game.id(),
                    self.side + 1,
                    e
                );
                self.send(ServerMessage::Invalid).await;
                return Ok(Flow::Continue);
            }
        };
        if !self.shots.insert(coord) {
            self.send(ServerMessage::Duplicate).await;
            return Ok(Flow::Continue);
        }

        let target = opponent(self.side);
        let outcome = self.game.fleet(target).shoot_at(coord);
        match outcome {
            ShotOutcome::Ocean => {
                self.send(ServerMessage::Ocean).await;
                self.send_to(target, ServerMessage::OceanAt(coord)).await;
            }
            ShotOutcome::Hit => {
                self.send(ServerMessage::Hit).await;
                self.send_to(target, ServerMessage::HitAt(coord)).await;
            }
            ShotOutcome::Sunk(ship) => {
                let sank = ServerMessage::sank(&ship);
                self.send(sank.clone()).await;
                self.send_to(target, sank).await;
            }
            ShotOutcome::Duplicate => {
                error!(
                    "match {}: cell {} hit twice on player {} despite shot history",
                    self.game.id(),
                    coord,
                    target + 1
                );
                if self.game.finish(MatchOutcome::Aborted) {
                    self.game.close_all();
                }
                anyhow::bail!("cell {} resolved twice", coord);
            }
        }

        let defeated = self.game.fleet(target).is_defeated();
        if defeated {
            if self.game.finish(MatchOutcome::Victory { winner: self.side }) {
                info!(
                    "match {}: player {} sank the last ship",
                    self.game.id(),
                    self.side + 1
                );
                let lost = ServerMessage::lost(&self.game.fleet(self.side));
                self.send(ServerMessage::Win).await;
                self.send_to(target, lost).await;
                self.game.close_all();
            }
            return Ok(Flow::Finished);
        }

        self.game.turn().pass(self.side);
        self.enter(PlayerState::TurnWait);
        self.send(ServerMessage::TurnEnd).await;
        self.send_to(target, ServerMessage::TurnStart).await;
        Ok(Flow::Continue)
    }
}
