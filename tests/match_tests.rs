use battleship_server::{
    parse_grid, Fleet, Match, MatchOutcome, MemoryClient, MemoryConnection, ReadyGate,
    TurnPointer,
};
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout, Duration};

/// A fleet with no two ships touching; columns 9 and 10 are open water.
const GRID: &str = "0101H05_0103H04_0105H03_0107H02_0109H02_0801V01_0810H01";
/// A fleet with a single-cell ship in the top-left corner.
const CORNER: &str = "0101H01_0103H05_0105H04_0107H03_0109H02_0801V02_1001V01";

fn start(first: usize) -> (JoinHandle<MatchOutcome>, MemoryClient, MemoryClient) {
    let (_, p1) = MemoryConnection::pair("p1");
    let (_, p2) = MemoryConnection::pair("p2");
    let game = Match::new(1, p1.connection(), p2.connection(), first, Duration::from_millis(1));
    (game.spawn(), p1, p2)
}

async fn expect(client: &mut MemoryClient, line: &str) {
    let got = timeout(Duration::from_secs(5), client.recv())
        .await
        .unwrap_or_else(|_| panic!("timed out waiting for {}", line));
    assert_eq!(got.as_deref(), Some(line));
}

async fn expect_closed(client: &mut MemoryClient) {
    let got = timeout(Duration::from_secs(5), client.recv())
        .await
        .expect("timed out waiting for close");
    assert_eq!(got, None);
}

/// Both players submit `GRID`; the first shooter is `p1`.
async fn setup() -> (JoinHandle<MatchOutcome>, MemoryClient, MemoryClient) {
    setup_with(GRID, GRID).await
}

async fn setup_with(
    grid1: &str,
    grid2: &str,
) -> (JoinHandle<MatchOutcome>, MemoryClient, MemoryClient) {
    let (handle, mut p1, mut p2) = start(0);
    expect(&mut p1, "SEND_GRID").await;
    expect(&mut p2, "SEND_GRID").await;
    p1.send_line(grid1);
    expect(&mut p1, "GRID_OK").await;
    p2.send_line(grid2);
    expect(&mut p2, "GRID_OK").await;
    expect(&mut p1, "GAME_START").await;
    expect(&mut p1, "TURN_START").await;
    expect(&mut p2, "GAME_START").await;
    (handle, p1, p2)
}

async fn outcome(handle: JoinHandle<MatchOutcome>) -> MatchOutcome {
    timeout(Duration::from_secs(5), handle)
        .await
        .expect("match did not finish")
        .expect("match task panicked")
}

/// `shooter` misses at `cell`, then the turn moves to `defender`.
async fn miss(shooter: &mut MemoryClient, defender: &mut MemoryClient, cell: &str) {
    shooter.send_line(&format!("SHOOT_{}", cell));
    expect(shooter, "OCEAN").await;
    expect(defender, &format!("OCEAN_{}", cell)).await;
    expect(shooter, "TURN_END").await;
    expect(defender, "TURN_START").await;
}

#[test]
fn test_turn_pointer_only_holder_passes() {
    let turn = TurnPointer::new(0);
    assert!(turn.is(0));
    assert!(!turn.pass(1));
    assert!(turn.is(0));
    assert!(turn.pass(0));
    assert_eq!(turn.current(), 1);
}

#[tokio::test]
async fn test_ready_gate_releases_waiters() {
    let gate = std::sync::Arc::new(ReadyGate::new(2));
    let waiter = {
        let gate = gate.clone();
        tokio::spawn(async move { gate.wait().await })
    };
    assert!(!gate.arrive());
    assert!(gate.arrive());
    assert_eq!(gate.arrived(), 2);
    gate.open();
    timeout(Duration::from_secs(1), waiter).await.unwrap().unwrap();
    // late waiters pass straight through
    gate.wait().await;
}

#[tokio::test]
async fn test_grid_error_reprompts() {
    let (handle, mut p1, mut p2) = start(0);
    expect(&mut p1, "SEND_GRID").await;
    p1.send_line("0101H05");
    expect(&mut p1, "GRID_ERR").await;
    expect(&mut p1, "SEND_GRID").await;
    p1.send_line(GRID);
    expect(&mut p1, "GRID_OK").await;
    expect(&mut p2, "SEND_GRID").await;
    p2.disconnect();
    expect(&mut p1, "WIN_OPPONENT_DC").await;
    expect_closed(&mut p1).await;
    assert_eq!(outcome(handle).await, MatchOutcome::Forfeit { winner: 0 });
}

#[tokio::test]
async fn test_second_player_can_start() {
    let (handle, mut p1, mut p2) = start(1);
    expect(&mut p1, "SEND_GRID").await;
    expect(&mut p2, "SEND_GRID").await;
    p2.send_line(GRID);
    p1.send_line(GRID);
    expect(&mut p1, "GRID_OK").await;
    expect(&mut p2, "GRID_OK").await;
    expect(&mut p2, "GAME_START").await;
    expect(&mut p2, "TURN_START").await;
    expect(&mut p1, "GAME_START").await;
    miss(&mut p2, &mut p1, "1010").await;
    p1.disconnect();
    expect(&mut p2, "WIN_OPPONENT_DC").await;
    assert_eq!(outcome(handle).await, MatchOutcome::Forfeit { winner: 1 });
}

#[tokio::test]
async fn test_sinking_a_single_cell_ship() {
    let (handle, mut p1, mut p2) = setup_with(GRID, CORNER).await;
    p1.send_line("SHOOT_0101");
    expect(&mut p1, "SANK_0101").await;
    expect(&mut p2, "SANK_0101").await;
    expect(&mut p1, "TURN_END").await;
    expect(&mut p2, "TURN_START").await;
    p2.disconnect();
    expect(&mut p1, "WIN_OPPONENT_DC").await;
    assert_eq!(outcome(handle).await, MatchOutcome::Forfeit { winner: 0 });
}

#[tokio::test]
async fn test_hit_reports_cell_to_defender() {
    let (_handle, mut p1, mut p2) = setup().await;
    p1.send_line("SHOOT_0301");
    expect(&mut p1, "HIT").await;
    expect(&mut p2, "HIT_0301").await;
    expect(&mut p1, "TURN_END").await;
    expect(&mut p2, "TURN_START").await;
}

#[tokio::test]
async fn test_invalid_shot_keeps_turn() {
    let (_handle, mut p1, mut p2) = setup().await;
    p1.send_line("SHOOT_1111");
    expect(&mut p1, "INVALID").await;
    p1.send_line("hello");
    expect(&mut p1, "INVALID").await;
    miss(&mut p1, &mut p2, "1001").await;
}

#[tokio::test]
async fn test_duplicate_shot_keeps_turn() {
    let (_handle, mut p1, mut p2) = setup().await;
    miss(&mut p1, &mut p2, "1001").await;
    miss(&mut p2, &mut p1, "1001").await;
    p1.send_line("SHOOT_1001");
    expect(&mut p1, "DUPLICATE").await;
    miss(&mut p1, &mut p2, "1002").await;
}

#[tokio::test]
async fn test_out_of_turn_message_is_dropped() {
    let (_handle, mut p1, mut p2) = setup().await;
    p2.send_line("SHOOT_0101");
    sleep(Duration::from_millis(50)).await;
    miss(&mut p1, &mut p2, "1001").await;
    sleep(Duration::from_millis(50)).await;
    assert_eq!(p1.try_recv(), None);
    assert_eq!(p2.try_recv(), None);
    // the dropped shot did not count against p2's history
    p2.send_line("SHOOT_0101");
    expect(&mut p2, "HIT").await;
    expect(&mut p1, "HIT_0101").await;
}

#[tokio::test]
async fn test_shot_sent_before_start_is_dropped() {
    let (_handle, mut p1, mut p2) = start(0);
    expect(&mut p1, "SEND_GRID").await;
    p1.send_line(GRID);
    expect(&mut p1, "GRID_OK").await;
    p1.send_line("SHOOT_1001");
    sleep(Duration::from_millis(50)).await;

    expect(&mut p2, "SEND_GRID").await;
    p2.send_line(GRID);
    expect(&mut p2, "GRID_OK").await;
    expect(&mut p1, "GAME_START").await;
    expect(&mut p1, "TURN_START").await;
    expect(&mut p2, "GAME_START").await;
    sleep(Duration::from_millis(50)).await;
    assert_eq!(p1.try_recv(), None);
    assert_eq!(p2.try_recv(), None);

    // not in p1's shot history either
    miss(&mut p1, &mut p2, "1001").await;
}

#[tokio::test]
async fn test_disconnect_in_ready_phase_forfeits() {
    let (handle, mut p1, mut p2) = start(0);
    expect(&mut p1, "SEND_GRID").await;
    p1.send_line(GRID);
    expect(&mut p1, "GRID_OK").await;
    p2.disconnect();
    expect(&mut p1, "WIN_OPPONENT_DC").await;
    expect_closed(&mut p1).await;
    expect(&mut p2, "SEND_GRID").await;
    expect_closed(&mut p2).await;
    assert_eq!(outcome(handle).await, MatchOutcome::Forfeit { winner: 0 });
}

#[tokio::test]
async fn test_both_leaving_abandons_the_match() {
    let (handle, p1, p2) = start(0);
    p1.disconnect();
    p2.disconnect();
    assert_eq!(outcome(handle).await, MatchOutcome::Abandoned);
}

#[tokio::test]
async fn test_full_game_to_victory() {
    let (handle, mut p1, mut p2) = setup().await;
    let ships = parse_grid(GRID).unwrap();
    let layout = Fleet::new(ships.clone()).layout();
    let mut misses = (1..=10)
        .map(|row| format!("10{:02}", row))
        .chain((1..=10).map(|row| format!("09{:02}", row)));

    let last_ship = ships.len() - 1;
    for (i, ship) in ships.iter().enumerate() {
        let cells = ship.cells();
        for (j, cell) in cells.iter().enumerate() {
            p1.send_line(&format!("SHOOT_{}", cell));
            if j + 1 < cells.len() {
                expect(&mut p1, "HIT").await;
                expect(&mut p2, &format!("HIT_{}", cell)).await;
            } else {
                let sank = format!("SANK_{}", ship);
                expect(&mut p1, &sank).await;
                expect(&mut p2, &sank).await;
                if i == last_ship {
                    break;
                }
            }
            expect(&mut p1, "TURN_END").await;
            expect(&mut p2, "TURN_START").await;
            let cell = misses.next().unwrap();
            miss(&mut p2, &mut p1, &cell).await;
        }
    }

    expect(&mut p1, "WIN").await;
    expect(&mut p2, &format!("LOST_{}", layout)).await;
    expect_closed(&mut p1).await;
    expect_closed(&mut p2).await;
    assert_eq!(outcome(handle).await, MatchOutcome::Victory { winner: 0 });
}
