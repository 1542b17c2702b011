//! Grid submission parsing and placement validation.
//!
//! A submission is seven `CCRROLL` tokens joined by `_`: two-digit column,
//! two-digit row, `H`/`V` orientation and two-digit length. Checks run in a
//! fixed order and the first failure rejects the whole submission:
//!
//! 1. exactly seven tokens of seven characters each,
//! 2. lengths form the multiset {1, 1, 2, 2, 3, 4, 5},
//! 3. orientation is `H` or `V`,
//! 4. the ship fits on the board,
//! 5. no cell of the ship lies on, or next to (diagonals included), a ship
//!    accepted earlier in the same submission.

use core::fmt;

use rand::Rng;

use crate::bitboard::{BitBoard, BitBoardError};
use crate::config::{BOARD_SIZE, FLEET_LENGTHS, NUM_SHIPS, SHIP_TOKEN_LEN};
use crate::coord::{parse_two_digits, Coord};
use crate::ship::{Orientation, Ship};

/// Occupied-or-buffered cells of the ships accepted so far.
pub type PlacementGrid = BitBoard<u128, { BOARD_SIZE as usize }>;

/// Why a grid submission was rejected. `index` is the zero-based token
/// position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GridError {
    TokenCount(usize),
    TokenLength { index: usize, len: usize },
    BadNumber { index: usize },
    LengthSet,
    Orientation { index: usize, found: char },
    OutOfBounds { index: usize },
    Touching { index: usize },
}

impl fmt::Display for GridError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GridError::TokenCount(n) => write!(f, "expected {} ships, got {}", NUM_SHIPS, n),
            GridError::TokenLength { index, len } => write!(
                f,
                "ship {} is {} characters long, expected {}",
                index, len, SHIP_TOKEN_LEN
            ),
            GridError::BadNumber { index } => write!(f, "ship {} has a non-numeric field", index),
            GridError::LengthSet => write!(f, "ship lengths must be {:?}", FLEET_LENGTHS),
            GridError::Orientation { index, found } => {
                write!(f, "ship {} has orientation {:?}, expected H or V", index, found)
            }
            GridError::OutOfBounds { index } => write!(f, "ship {} does not fit on the board", index),
            GridError::Touching { index } => write!(f, "ship {} touches another ship", index),
        }
    }
}

impl std::error::Error for GridError {}

impl From<BitBoardError> for GridError {
    fn from(_: BitBoardError) -> Self {
        GridError::OutOfBounds { index: 0 }
    }
}

/// One decoded `CCRROLL` token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShipToken {
    pub col: u8,
    pub row: u8,
    pub orientation: Orientation,
    pub length: usize,
}

impl ShipToken {
    /// Cells this token covers, or `None` if any would fall off the board.
    pub fn cells(&self) -> Option<Vec<Coord>> {
        (0..self.length)
            .map(|i| {
                let (col, row) = match self.orientation {
                    Orientation::Horizontal => (self.col as usize + i, self.row as usize),
                    Orientation::Vertical => (self.col as usize, self.row as usize + i),
                };
                if col > BOARD_SIZE as usize || row > BOARD_SIZE as usize {
                    return None;
                }
                Coord::new(col as u8, row as u8).ok()
            })
            .collect()
    }
}

impl fmt::Display for ShipToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02}{:02}{}{:02}",
            self.col,
            self.row,
            self.orientation.as_char(),
            self.length
        )
    }
}

/// Validate a raw submission and build its ships, in token order.
pub fn parse_grid(input: &str) -> Result<Vec<Ship>, GridError> {
    let tokens: Vec<&str> = input.split('_').collect();
    if tokens.len() != NUM_SHIPS {
        return Err(GridError::TokenCount(tokens.len()));
    }
    for (index, token) in tokens.iter().enumerate() {
        // Non-ASCII tokens are rejected here so byte slicing below is safe.
        if token.len() != SHIP_TOKEN_LEN || !token.is_ascii() {
            return Err(GridError::TokenLength {
                index,
                len: token.chars().count(),
            });
        }
    }

    let mut lengths = Vec::with_capacity(NUM_SHIPS);
    for (index, token) in tokens.iter().enumerate() {
        let length = parse_two_digits(&token[5..7]).ok_or(GridError::BadNumber { index })?;
        lengths.push(length as usize);
    }
    let mut sorted = lengths.clone();
    sorted.sort_unstable();
    let mut expected = FLEET_LENGTHS;
    expected.sort_unstable();
    if sorted != expected {
        return Err(GridError::LengthSet);
    }

    let mut orientations = Vec::with_capacity(NUM_SHIPS);
    for (index, token) in tokens.iter().enumerate() {
        let found = token.as_bytes()[4] as char;
        let orientation =
            Orientation::from_char(found).ok_or(GridError::Orientation { index, found })?;
        orientations.push(orientation);
    }

    let mut placements = Vec::with_capacity(NUM_SHIPS);
    for (index, token) in tokens.iter().enumerate() {
        let col = parse_two_digits(&token[0..2]).ok_or(GridError::BadNumber { index })?;
        let row = parse_two_digits(&token[2..4]).ok_or(GridError::BadNumber { index })?;
        let ship = ShipToken {
            col,
            row,
            orientation: orientations[index],
            length: lengths[index],
        };
        let cells = ship.cells().ok_or(GridError::OutOfBounds { index })?;
        placements.push(cells);
    }

    let mut blocked = PlacementGrid::new();
    let mut ships = Vec::with_capacity(NUM_SHIPS);
    for (index, cells) in placements.into_iter().enumerate() {
        let mask = PlacementGrid::from_cells(cells.iter().map(Coord::index))?;
        if !(blocked & mask).is_empty() {
            return Err(GridError::Touching { index });
        }
        blocked |= mask.with_neighbours();
        ships.push(Ship::new(cells));
    }
    Ok(ships)
}

/// Produce a random submission that passes [`parse_grid`].
pub fn random_submission<R: Rng>(rng: &mut R) -> String {
    'layout: loop {
        let mut blocked = PlacementGrid::new();
        let mut tokens = Vec::with_capacity(NUM_SHIPS);
        for &length in FLEET_LENGTHS.iter() {
            let mut placed = false;
            for _ in 0..100 {
                let orientation = if rng.random() {
                    Orientation::Horizontal
                } else {
                    Orientation::Vertical
                };
                let span = BOARD_SIZE as usize - length + 1;
                let (max_col, max_row) = match orientation {
                    Orientation::Horizontal => (span, BOARD_SIZE as usize),
                    Orientation::Vertical => (BOARD_SIZE as usize, span),
                };
                let token = ShipToken {
                    col: rng.random_range(1..=max_col) as u8,
                    row: rng.random_range(1..=max_row) as u8,
                    orientation,
                    length,
                };
                let Some(cells) = token.cells() else { continue };
                let Ok(mask) = PlacementGrid::from_cells(cells.iter().map(Coord::index)) else {
                    continue;
                };
                if (blocked & mask).is_empty() {
                    blocked |= mask.with_neighbours();
                    tokens.push(token.to_string());
                    placed = true;
                    break;
                }
            }
            if !placed {
                continue 'layout;
            }
        }
        return tokens.join("_");
    }
}
