use std::net::SocketAddr;
use std::sync::Arc;

use log::{info, warn};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tokio::time::sleep;

use crate::config::ServerConfig;
use crate::games::GamesManager;
use crate::matchmaking::MatchmakingQueue;
use crate::transport::heartbeat::HeartbeatMonitor;
use crate::transport::tcp::{TcpConnection, TcpOptions};
use crate::transport::Connection;

/// The listening server: accept loop plus the heartbeat, matchmaking and
/// status background tasks.
pub struct Server {
    config: ServerConfig,
    listener: TcpListener,
    heartbeat: Arc<HeartbeatMonitor>,
    queue: Arc<MatchmakingQueue>,
}

impl Server {
    pub async fn bind(config: ServerConfig) -> anyhow::Result<Self> {
        config.validate()?;
        let listener = TcpListener::bind(&config.bind).await?;
        let heartbeat = Arc::new(HeartbeatMonitor::new(config.heartbeat_timeout()));
        let games = Arc::new(GamesManager::new(config.poll_interval()));
        let queue = Arc::new(MatchmakingQueue::new(games));
        Ok(Self {
            config,
            listener,
            heartbeat,
            queue,
        })
    }

    pub fn local_addr(&self) -> anyhow::Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn heartbeat(&self) -> &Arc<HeartbeatMonitor> {
        &self.heartbeat
    }

    pub fn queue(&self) -> &Arc<MatchmakingQueue> {
        &self.queue
    }

    pub fn games(&self) -> &Arc<GamesManager> {
        self.queue.games()
    }

    /// Accept players until the task is dropped.
    pub async fn run(self) -> anyhow::Result<()> {
        info!("listening on {}", self.local_addr()?);
        let tasks = self.start_background();
        let result = self.accept_loop().await;
        for task in tasks {
            task.abort();
        }
        result
    }

    fn start_background(&self) -> Vec<JoinHandle<()>> {
        vec![
            self.heartbeat.clone().spawn(self.config.sweep_period()),
            self.queue.clone().spawn(
                self.config.matchmaking_initial_delay(),
                self.config.matchmaking_delay(),
            ),
            self.queue.clone().spawn_status(self.config.status_interval()),
        ]
    }

    async fn accept_loop(&self) -> anyhow::Result<()> {
        let options = TcpOptions::from_config(&self.config);
        loop {
            match self.listener.accept().await {
                Ok((stream, _)) => self.admit(stream, options.clone()).await,
                Err(e) => {
                    warn!("accept failed: {}", e);
                    sleep(self.config.poll_interval()).await;
                }
            }
        }
    }

    /// Wrap a fresh socket, put it under heartbeat watch and queue it.
    async fn admit(&self, stream: TcpStream, options: TcpOptions) {
        let conn: Connection = match TcpConnection::spawn(stream, options) {
            Ok(conn) => conn,
            Err(e) => {
                warn!("could not set up connection: {:#}", e);
                return;
            }
        };
        info!("'{}' connected", conn.peer());
        self.heartbeat.register(conn.clone());
        self.queue.add(conn).await;
    }
}
