use battleship_server::{init_logging, random_submission, Coord, GameClient, BOARD_SIZE};
use clap::Parser;
use log::{debug, info, LevelFilter};
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde_json::json;
use tokio::time::Duration;

/// Plays one game against the server with a random fleet and random shots.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[arg(long, default_value = "127.0.0.1:12345")]
    connect: String,
    #[arg(long, help = "Fix RNG seed for a reproducible bot (e.g., --seed 12345)")]
    seed: Option<u64>,
    /// Interval between keepalive pings.
    #[arg(long, default_value_t = 500)]
    keepalive_ms: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging(LevelFilter::Warn);
    let cli = Cli::parse();

    let mut rng = match cli.seed {
        Some(s) => SmallRng::seed_from_u64(s),
        None => SmallRng::from_rng(&mut rand::rng()),
    };
    let mut targets: Vec<Coord> = (1..=BOARD_SIZE)
        .flat_map(|col| (1..=BOARD_SIZE).map(move |row| (col, row)))
        .filter_map(|(col, row)| Coord::new(col, row).ok())
        .collect();
    targets.shuffle(&mut rng);

    let mut client = GameClient::connect(&cli.connect).await?;
    client.start_keepalive(Duration::from_millis(cli.keepalive_ms));
    info!("connected to {}", cli.connect);

    let mut shots = 0usize;
    let mut hits = 0usize;
    let mut sunk = 0usize;
    let mut awaiting_result = false;
    let mut outcome = "disconnected";

    while let Some(line) = client.next_line().await? {
        debug!("<- {}", line);
        let fire = match line.as_str() {
            "SEND_GRID" => {
                client.send_line(&random_submission(&mut rng)).await?;
                false
            }
            "TURN_START" | "INVALID" | "DUPLICATE" => true,
            "HIT" => {
                hits += 1;
                awaiting_result = false;
                false
            }
            "OCEAN" => {
                awaiting_result = false;
                false
            }
            "WIN" => {
                outcome = "won";
                break;
            }
            "WIN_OPPONENT_DC" => {
                outcome = "won_by_forfeit";
                break;
            }
            l if l.starts_with("LOST_") => {
                outcome = "lost";
                break;
            }
            l if l.starts_with("SANK_") => {
                if awaiting_result {
                    hits += 1;
                    sunk += 1;
                    awaiting_result = false;
                }
                false
            }
            _ => false,
        };

        if fire {
            let Some(target) = targets.pop() else {
                anyhow::bail!("ran out of targets");
            };
            client.send_line(&format!("SHOOT_{}", target)).await?;
            shots += 1;
            awaiting_result = true;
        }
    }

    let summary = json!({
        "outcome": outcome,
        "shots": shots,
        "hits": hits,
        "sunk": sunk,
    });
    println!("{}", serde_json::to_string(&summary)?);
    Ok(())
}
