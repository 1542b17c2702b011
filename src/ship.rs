//! Ships and single-ship hit resolution.

use core::fmt;

use crate::coord::Coord;

/// Orientation of a ship on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Horizontal,
    Vertical,
}

impl Orientation {
    /// Parse the single-character token form (`H` or `V`).
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            'H' => Some(Orientation::Horizontal),
            'V' => Some(Orientation::Vertical),
            _ => None,
        }
    }

    pub fn as_char(&self) -> char {
        match self {
            Orientation::Horizontal => 'H',
            Orientation::Vertical => 'V',
        }
    }
}

/// What a single shot did to a single ship.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitOutcome {
    /// The coordinate is not part of this ship.
    Miss,
    /// A fresh cell was hit and the ship still floats.
    Hit,
    /// The last unhit cell was hit.
    Sunk,
    /// The cell had already been hit. The shot history should make this
    /// unreachable.
    Duplicate,
}

/// A placed ship: its occupied cells in placement order and the cells
/// already hit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ship {
    cells: Vec<Coord>,
    hits: Vec<Coord>,
}

impl Ship {
    pub fn new(cells: Vec<Coord>) -> Self {
        Self {
            cells,
            hits: Vec::new(),
        }
    }

    /// Occupied cells, in placement order.
    pub fn cells(&self) -> &[Coord] {
        &self.cells
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn contains(&self, coord: Coord) -> bool {
        self.cells.contains(&coord)
    }

    /// Cells not yet hit.
    pub fn health(&self) -> usize {
        self.cells.len() - self.hits.len()
    }

    pub fn is_sunk(&self) -> bool {
        self.health() == 0
    }

    /// Resolve a shot against this ship. Only a fresh hit mutates state.
    pub fn hit(&mut self, coord: Coord) -> HitOutcome {
        if !self.contains(coord) {
            return HitOutcome::Miss;
        }
        if self.hits.contains(&coord) {
            return HitOutcome::Duplicate;
        }
        self.hits.push(coord);
        if self.is_sunk() {
            HitOutcome::Sunk
        } else {
            HitOutcome::Hit
        }
    }
}

/// Cells joined by `_`, the form used by `SANK_` and `LOST_`.
impl fmt::Display for Ship {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, cell) in self.cells.iter().enumerate() {
            if i > 0 {
                f.write_str("_")?;
            }
            write!(f, "{}", cell)?;
        }
        Ok(())
    }
}
