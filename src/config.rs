use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

pub const BOARD_SIZE: u8 = 10;
pub const NUM_SHIPS: usize = 7;
/// Ship lengths every submitted fleet must contain, in any order.
pub const FLEET_LENGTHS: [usize; NUM_SHIPS] = [5, 4, 3, 2, 2, 1, 1];
/// Characters in one `CCRROLL` ship token.
pub const SHIP_TOKEN_LEN: usize = 7;

/// Runtime settings for the game server.
///
/// Every timing value is stored in whole milliseconds (or seconds) so the
/// struct round-trips cleanly through JSON; use the accessors to get
/// [`Duration`]s.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    pub heartbeat_timeout_ms: u64,
    pub connect_grace_ms: u64,
    pub matchmaking_initial_delay_ms: u64,
    pub matchmaking_delay_ms: u64,
    pub poll_interval_ms: u64,
    pub status_interval_secs: u64,
    pub inbound_capacity: usize,
    pub max_line_len: usize,
    pub write_timeout_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:12345".to_string(),
            heartbeat_timeout_ms: 2000,
            connect_grace_ms: 1000,
            matchmaking_initial_delay_ms: 1000,
            matchmaking_delay_ms: 2000,
            poll_interval_ms: 10,
            status_interval_secs: 10,
            inbound_capacity: 64,
            max_line_len: 256,
            write_timeout_ms: 5000,
        }
    }
}

impl ServerConfig {
    /// Load a configuration from a JSON file. Missing fields take their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("cannot read config {}: {}", path.display(), e))?;
        let config: ServerConfig = serde_json::from_str(&raw)
            .map_err(|e| anyhow::anyhow!("invalid config {}: {}", path.display(), e))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the server cannot run with.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.heartbeat_timeout_ms == 0 {
            return Err(anyhow::anyhow!("heartbeat_timeout_ms must be greater than zero"));
        }
        if self.poll_interval_ms == 0 {
            return Err(anyhow::anyhow!("poll_interval_ms must be greater than zero"));
        }
        if self.inbound_capacity == 0 {
            return Err(anyhow::anyhow!("inbound_capacity must be greater than zero"));
        }
        if self.max_line_len == 0 {
            return Err(anyhow::anyhow!("max_line_len must be greater than zero"));
        }
        Ok(())
    }

    pub fn heartbeat_timeout(&self) -> Duration {
        Duration::from_millis(self.heartbeat_timeout_ms)
    }

    /// How often the heartbeat monitor sweeps: the timeout divided by 1.5,
    /// rounded up.
    pub fn sweep_period(&self) -> Duration {
        Duration::from_millis((self.heartbeat_timeout_ms * 2).div_ceil(3).max(1))
    }

    pub fn connect_grace(&self) -> Duration {
        Duration::from_millis(self.connect_grace_ms)
    }

    pub fn matchmaking_initial_delay(&self) -> Duration {
        Duration::from_millis(self.matchmaking_initial_delay_ms)
    }

    pub fn matchmaking_delay(&self) -> Duration {
        Duration::from_millis(self.matchmaking_delay_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn status_interval(&self) -> Duration {
        Duration::from_secs(self.status_interval_secs)
    }

    pub fn write_timeout(&self) -> Duration {
        Duration::from_millis(self.write_timeout_ms)
    }
}
