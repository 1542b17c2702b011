mod bitboard;
pub mod client;
mod common;
mod config;
mod coord;
mod fleet;
pub mod game;
pub mod games;
pub mod grid;
mod logging;
pub mod matchmaking;
mod player;
pub mod protocol;
pub mod server;
mod ship;
pub mod transport;

pub use bitboard::{BitBoard, BitBoardError};
pub use client::GameClient;
pub use config::*;
pub use coord::Coord;
pub use fleet::{Fleet, ShotOutcome};
pub use game::{Match, MatchOutcome, ReadyGate, TurnPointer};
pub use games::GamesManager;
pub use grid::{parse_grid, random_submission, GridError, ShipToken};
pub use logging::{init_logging, LOG_ENV};
pub use matchmaking::MatchmakingQueue;
pub use player::{PlayerActor, PlayerState};
pub use protocol::{ProtocolError, ServerMessage};
pub use server::Server;
pub use ship::{HitOutcome, Orientation, Ship};
pub use transport::heartbeat::HeartbeatMonitor;
pub use transport::memory::{MemoryClient, MemoryConnection};
pub use transport::tcp::{TcpConnection, TcpOptions};
pub use transport::{Connection, Transport};
