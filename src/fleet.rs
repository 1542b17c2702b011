use crate::coord::Coord;
use crate::ship::{HitOutcome, Ship};

/// Result of a shot against a whole fleet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShotOutcome {
    Ocean,
    Hit,
    /// Carries the ship that went down; it is no longer in the fleet.
    Sunk(Ship),
    /// A ship reported the cell as already hit.
    Duplicate,
}

/// The ships a player still has afloat.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fleet {
    ships: Vec<Ship>,
}

impl Fleet {
    pub fn new(ships: Vec<Ship>) -> Self {
        Self { ships }
    }

    pub fn ships(&self) -> &[Ship] {
        &self.ships
    }

    /// Ships still afloat.
    pub fn len(&self) -> usize {
        self.ships.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ships.is_empty()
    }

    /// A player has lost once every ship has been sunk and removed.
    pub fn is_defeated(&self) -> bool {
        self.ships.is_empty()
    }

    /// Fire at `coord`. The first ship that reacts decides the outcome; a
    /// sunk ship is removed from the fleet.
    pub fn shoot_at(&mut self, coord: Coord) -> ShotOutcome {
        for i in 0..self.ships.len() {
            match self.ships[i].hit(coord) {
                HitOutcome::Miss => continue,
                HitOutcome::Hit => return ShotOutcome::Hit,
                HitOutcome::Duplicate => return ShotOutcome::Duplicate,
                HitOutcome::Sunk => return ShotOutcome::Sunk(self.ships.remove(i)),
            }
        }
        ShotOutcome::Ocean
    }

    /// Every remaining ship's cells joined by `_`.
    pub fn layout(&self) -> String {
        self.ships
            .iter()
            .map(Ship::to_string)
            .collect::<Vec<_>>()
            .join("_")
    }
}
