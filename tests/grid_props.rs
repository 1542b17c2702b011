use std::collections::HashSet;

use battleship_server::{parse_grid, random_submission, Coord, Fleet, ShotOutcome, BOARD_SIZE};
use proptest::prelude::*;
use rand::{rngs::SmallRng, SeedableRng};

fn touching(a: Coord, b: Coord) -> bool {
    (a.col() as i16 - b.col() as i16).abs() <= 1 && (a.row() as i16 - b.row() as i16).abs() <= 1
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn random_submission_is_accepted(seed in any::<u64>()) {
        let mut rng = SmallRng::seed_from_u64(seed);
        let grid = random_submission(&mut rng);
        let ships = parse_grid(&grid);
        prop_assert!(ships.is_ok(), "{} rejected: {:?}", grid, ships);
    }

    #[test]
    fn accepted_ships_never_touch(seed in any::<u64>()) {
        let mut rng = SmallRng::seed_from_u64(seed);
        let ships = parse_grid(&random_submission(&mut rng)).unwrap();
        for (i, a) in ships.iter().enumerate() {
            for b in ships.iter().skip(i + 1) {
                for &ca in a.cells() {
                    for &cb in b.cells() {
                        prop_assert!(!touching(ca, cb), "{} touches {}", ca, cb);
                    }
                }
            }
        }
    }

    #[test]
    fn parse_grid_never_panics(input in "\\PC{0,80}") {
        let _ = parse_grid(&input);
    }

    #[test]
    fn sweeping_the_board_sinks_everything(seed in any::<u64>()) {
        let mut rng = SmallRng::seed_from_u64(seed);
        let mut fleet = Fleet::new(parse_grid(&random_submission(&mut rng)).unwrap());
        let mut sunk_cells = HashSet::new();
        let mut hits = 0;
        for col in 1..=BOARD_SIZE {
            for row in 1..=BOARD_SIZE {
                let coord = Coord::new(col, row).unwrap();
                match fleet.shoot_at(coord) {
                    ShotOutcome::Ocean => {}
                    ShotOutcome::Hit => hits += 1,
                    ShotOutcome::Sunk(ship) => {
                        hits += 1;
                        for &cell in ship.cells() {
                            prop_assert!(sunk_cells.insert(cell));
                        }
                    }
                    ShotOutcome::Duplicate => prop_assert!(false, "fresh cell {} reported twice", coord),
                }
            }
        }
        prop_assert!(fleet.is_defeated());
        prop_assert_eq!(hits, 18);
        prop_assert_eq!(sunk_cells.len(), 18);
    }
}
