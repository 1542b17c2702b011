//! Line-oriented wire protocol.
//!
//! Every message is one UTF-8 line terminated by `\n`. Clients send grid
//! submissions, `SHOOT_CCRR` and `PING` keepalives; the server answers with
//! the [`ServerMessage`] lines below.

use core::fmt;

use crate::coord::Coord;
use crate::fleet::Fleet;
use crate::ship::Ship;

/// Prefix of keepalive lines. Anything starting with it only refreshes
/// liveness.
pub const KEEPALIVE_PREFIX: &str = "PING";
const SHOOT_PREFIX: &str = "SHOOT_";
const SHOOT_LEN: usize = 10;

/// Errors from decoding a client command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// The line is not a `SHOOT_` command of the right length.
    NotAShot(String),
    /// The coordinate field is not four digits.
    Malformed(String),
    /// The coordinate is outside `1..=10` on either axis.
    OutOfRange { col: u8, row: u8 },
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProtocolError::NotAShot(line) => write!(f, "not a shot command: {:?}", line),
            ProtocolError::Malformed(coord) => write!(f, "malformed coordinate: {:?}", coord),
            ProtocolError::OutOfRange { col, row } => {
                write!(f, "coordinate out of range: column {}, row {}", col, row)
            }
        }
    }
}

impl std::error::Error for ProtocolError {}

pub fn is_keepalive(line: &str) -> bool {
    line.starts_with(KEEPALIVE_PREFIX)
}

/// Decode `SHOOT_CCRR`. The caller answers any error with `INVALID`.
pub fn parse_shot(line: &str) -> Result<Coord, ProtocolError> {
    if !line.starts_with(SHOOT_PREFIX) || line.len() != SHOOT_LEN {
        return Err(ProtocolError::NotAShot(line.to_string()));
    }
    Coord::parse(&line[SHOOT_PREFIX.len()..])
}

/// Everything the server can say to a client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerMessage {
    OpponentWait,
    OpponentFound,
    SendGrid,
    GridErr,
    GridOk,
    GameStart,
    TurnStart,
    TurnEnd,
    /// Shooter's view of a hit.
    Hit,
    /// Shooter's view of a miss.
    Ocean,
    /// Defender's view of a hit at the given cell.
    HitAt(Coord),
    /// Defender's view of a miss at the given cell.
    OceanAt(Coord),
    /// Sent to both sides with the sunk ship's cells.
    Sank(Vec<Coord>),
    Invalid,
    Duplicate,
    Win,
    /// Sent to the loser with the winner's remaining ships.
    Lost(String),
    WinOpponentDc,
}

impl ServerMessage {
    pub fn sank(ship: &Ship) -> Self {
        ServerMessage::Sank(ship.cells().to_vec())
    }

    pub fn lost(winner: &Fleet) -> Self {
        ServerMessage::Lost(winner.layout())
    }
}

impl fmt::Display for ServerMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServerMessage::OpponentWait => f.write_str("OPPONENT_WAIT"),
            ServerMessage::OpponentFound => f.write_str("OPPONENT_FOUND"),
            ServerMessage::SendGrid => f.write_str("SEND_GRID"),
            ServerMessage::GridErr => f.write_str("GRID_ERR"),
            ServerMessage::GridOk => f.write_str("GRID_OK"),
            ServerMessage::GameStart => f.write_str("GAME_START"),
            ServerMessage::TurnStart => f.write_str("TURN_START"),
            ServerMessage::TurnEnd => f.write_str("TURN_END"),
            ServerMessage::Hit => f.write_str("HIT"),
            ServerMessage::Ocean => f.write_str("OCEAN"),
            ServerMessage::HitAt(c) => write!(f, "HIT_{}", c),
            ServerMessage::OceanAt(c) => write!(f, "OCEAN_{}", c),
            ServerMessage::Sank(cells) => {
                f.write_str("SANK")?;
                for cell in cells {
                    write!(f, "_{}", cell)?;
                }
                Ok(())
            }
            ServerMessage::Invalid => f.write_str("INVALID"),
            ServerMessage::Duplicate => f.write_str("DUPLICATE"),
            ServerMessage::Win => f.write_str("WIN"),
            ServerMessage::Lost(layout) => write!(f, "LOST_{}", layout),
            ServerMessage::WinOpponentDc => f.write_str("WIN_OPPONENT_DC"),
        }
    }
}
