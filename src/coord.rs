//! Board coordinates in their wire form.
//!
//! Every coordinate on the wire is four digits, `CCRR`: a two-digit column
//! followed by a two-digit row, both counted from 1. Ship tokens, ship cells,
//! shots and outcome messages all use this same order.

use core::fmt;

use crate::config::BOARD_SIZE;
use crate::protocol::ProtocolError;

/// A cell on the 10×10 board, 1-indexed on both axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Coord {
    col: u8,
    row: u8,
}

impl Coord {
    /// Build a coordinate, checking both axes are within `1..=BOARD_SIZE`.
    pub fn new(col: u8, row: u8) -> Result<Self, ProtocolError> {
        if !(1..=BOARD_SIZE).contains(&col) || !(1..=BOARD_SIZE).contains(&row) {
            return Err(ProtocolError::OutOfRange { col, row });
        }
        Ok(Self { col, row })
    }

    /// Parse the four-character `CCRR` form.
    pub fn parse(s: &str) -> Result<Self, ProtocolError> {
        if s.len() != 4 || !s.is_ascii() {
            return Err(ProtocolError::Malformed(s.to_string()));
        }
        let col = parse_two_digits(&s[0..2]).ok_or_else(|| ProtocolError::Malformed(s.to_string()))?;
        let row = parse_two_digits(&s[2..4]).ok_or_else(|| ProtocolError::Malformed(s.to_string()))?;
        Self::new(col, row)
    }

    pub fn col(&self) -> u8 {
        self.col
    }

    pub fn row(&self) -> u8 {
        self.row
    }

    /// Zero-based `(row, col)` for bitboard indexing.
    pub fn index(&self) -> (usize, usize) {
        (self.row as usize - 1, self.col as usize - 1)
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}{:02}", self.col, self.row)
    }
}

/// Strict two ASCII digit parser; rejects signs and whitespace that
/// `str::parse` would otherwise tolerate.
pub(crate) fn parse_two_digits(s: &str) -> Option<u8> {
    let bytes = s.as_bytes();
    if bytes.len() != 2 || !bytes.iter().all(u8::is_ascii_digit) {
        return None;
    }
    Some((bytes[0] - b'0') * 10 + (bytes[1] - b'0'))
}
