use std::path::PathBuf;

use battleship_server::{init_logging, Server, ServerConfig};
use clap::Parser;
use log::{info, LevelFilter};

#[derive(Parser)]
#[command(author, version, about = "Two-player Battleship server", long_about = None)]
struct Cli {
    /// JSON file with server settings; flags below override it.
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long, help = "Listen address (e.g., --bind 0.0.0.0:12345)")]
    bind: Option<String>,
    /// Silence after which a client is dropped.
    #[arg(long)]
    heartbeat_timeout_ms: Option<u64>,
    /// Delay between matchmaking passes.
    #[arg(long)]
    matchmaking_delay_ms: Option<u64>,
    #[arg(long)]
    poll_interval_ms: Option<u64>,
    /// Print the effective configuration as JSON and exit.
    #[arg(long)]
    print_config: bool,
}

impl Cli {
    fn into_config(self) -> anyhow::Result<ServerConfig> {
        let mut config = match &self.config {
            Some(path) => ServerConfig::from_json_file(path)?,
            None => ServerConfig::default(),
        };
        if let Some(bind) = self.bind {
            config.bind = bind;
        }
        if let Some(ms) = self.heartbeat_timeout_ms {
            config.heartbeat_timeout_ms = ms;
        }
        if let Some(ms) = self.matchmaking_delay_ms {
            config.matchmaking_delay_ms = ms;
        }
        if let Some(ms) = self.poll_interval_ms {
            config.poll_interval_ms = ms;
        }
        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging(LevelFilter::Info);
    let cli = Cli::parse();
    let print_config = cli.print_config;
    let config = cli.into_config()?;

    if print_config {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }

    let server = Server::bind(config).await?;
    tokio::select! {
        result = server.run() => result,
        _ = tokio::signal::ctrl_c() => {
            info!("interrupted, shutting down");
            Ok(())
        }
    }
}
