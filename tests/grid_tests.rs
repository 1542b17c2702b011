use battleship_server::{parse_grid, Coord, GridError};

/// A fleet with no two ships touching, diagonals included.
const VALID: &str = "0101H05_0103H04_0105H03_0107H02_0109H02_0801V01_0810H01";

#[test]
fn test_valid_grid_builds_ships_in_order() {
    let ships = parse_grid(VALID).unwrap();
    let lengths: Vec<_> = ships.iter().map(|s| s.len()).collect();
    assert_eq!(lengths, vec![5, 4, 3, 2, 2, 1, 1]);
    let carrier: Vec<String> = ships[0].cells().iter().map(Coord::to_string).collect();
    assert_eq!(carrier, vec!["0101", "0201", "0301", "0401", "0501"]);
    assert_eq!(ships[5].cells(), &[Coord::new(8, 1).unwrap()]);
}

#[test]
fn test_vertical_runs_down_rows() {
    let grid = "0101V05_0301V04_0501V03_0701V02_0901V02_0308H01_0808H01";
    let ships = parse_grid(grid).unwrap();
    let cells: Vec<String> = ships[0].cells().iter().map(Coord::to_string).collect();
    assert_eq!(cells, vec!["0101", "0102", "0103", "0104", "0105"]);
}

#[test]
fn test_wrong_token_count() {
    assert_eq!(
        parse_grid("0101H05_0103H04"),
        Err(GridError::TokenCount(2))
    );
    assert_eq!(parse_grid(""), Err(GridError::TokenCount(1)));
}

#[test]
fn test_wrong_token_length() {
    let grid = "0101H5_0103H04_0105H03_0107H02_0109H02_0801V01_0810H01";
    assert!(matches!(
        parse_grid(grid),
        Err(GridError::TokenLength { index: 0, .. })
    ));
}

#[test]
fn test_non_ascii_token_is_rejected_not_sliced() {
    let grid = "0101H0é_0103H04_0105H03_0107H02_0109H02_0801V01_0810H01";
    assert!(parse_grid(grid).is_err());
}

#[test]
fn test_wrong_length_multiset() {
    // two carriers, no battleship
    let grid = "0101H05_0103H05_0105H03_0107H02_0109H02_0801V01_0810H01";
    assert_eq!(parse_grid(grid), Err(GridError::LengthSet));
}

#[test]
fn test_length_check_precedes_orientation_check() {
    let grid = "0101X05_0103H05_0105H03_0107H02_0109H02_0801V01_0810H01";
    assert_eq!(parse_grid(grid), Err(GridError::LengthSet));
}

#[test]
fn test_bad_orientation() {
    let grid = "0101H05_0103D04_0105H03_0107H02_0109H02_0801V01_0810H01";
    assert_eq!(
        parse_grid(grid),
        Err(GridError::Orientation { index: 1, found: 'D' })
    );
}

#[test]
fn test_off_the_board() {
    let grid = "0701H05_0103H04_0105H03_0107H02_0109H02_0801V01_0810H01";
    assert_eq!(parse_grid(grid), Err(GridError::OutOfBounds { index: 0 }));

    let grid = "0101H05_0103H04_0105H03_0107H02_0910V02_0801V01_0810H01";
    assert_eq!(parse_grid(grid), Err(GridError::OutOfBounds { index: 4 }));
}

#[test]
fn test_zero_coordinate_is_out_of_bounds() {
    let grid = "0001H05_0103H04_0105H03_0107H02_0109H02_0801V01_0810H01";
    assert_eq!(parse_grid(grid), Err(GridError::OutOfBounds { index: 0 }));
}

#[test]
fn test_adjacent_ships_rejected() {
    // battleship directly below the carrier
    let grid = "0101H05_0102H04_0105H03_0107H02_0109H02_0801V01_0810H01";
    assert_eq!(parse_grid(grid), Err(GridError::Touching { index: 1 }));
}

#[test]
fn test_diagonal_contact_rejected() {
    // single cell at 0602 touches the carrier's end at 0501 diagonally
    let grid = "0101H05_0103H04_0105H03_0107H02_0109H02_0602V01_0810H01";
    assert_eq!(parse_grid(grid), Err(GridError::Touching { index: 5 }));
}

#[test]
fn test_overlap_rejected() {
    let grid = "0101H05_0103H04_0105H03_0107H02_0109H02_0301V01_0810H01";
    assert_eq!(parse_grid(grid), Err(GridError::Touching { index: 5 }));
}

#[test]
fn test_buffers_may_overlap() {
    // rows 1 and 3 share the row-2 buffer, which is allowed
    let ships = parse_grid(VALID).unwrap();
    assert_eq!(ships.len(), 7);
}

#[test]
fn test_orthogonal_neighbours_touch() {
    // 0101 and the vertical ship starting at 0201 share an edge
    let grid = "0101H01_0103H01_0105H02_0108H02_0201V03_0401V04_0601V05";
    assert_eq!(parse_grid(grid), Err(GridError::Touching { index: 4 }));
}
