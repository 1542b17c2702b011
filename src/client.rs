//! Minimal line client for the game server, used by the bot and the tests.

use std::sync::Arc;

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpStream, ToSocketAddrs};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{interval, timeout, Duration, MissedTickBehavior};

use crate::protocol::KEEPALIVE_PREFIX;

pub struct GameClient {
    lines: Lines<BufReader<OwnedReadHalf>>,
    writer: Arc<Mutex<OwnedWriteHalf>>,
    keepalive: Option<JoinHandle<()>>,
}

impl GameClient {
    pub async fn connect(addr: impl ToSocketAddrs) -> anyhow::Result<Self> {
        let stream = TcpStream::connect(addr).await.context("connect failed")?;
        stream.set_nodelay(true)?;
        let (read_half, write_half) = stream.into_split();
        Ok(Self {
            lines: BufReader::new(read_half).lines(),
            writer: Arc::new(Mutex::new(write_half)),
            keepalive: None,
        })
    }

    pub async fn send_line(&self, line: &str) -> anyhow::Result<()> {
        let mut writer = self.writer.lock().await;
        writer.write_all(line.as_bytes()).await?;
        writer.write_all(b"\n").await?;
        Ok(())
    }

    /// Next server line; `None` once the server has closed the connection.
    pub async fn next_line(&mut self) -> anyhow::Result<Option<String>> {
        Ok(self.lines.next_line().await?)
    }

    /// Next server line, failing on timeout or end of stream.
    pub async fn recv_timeout(&mut self, limit: Duration) -> anyhow::Result<String> {
        match timeout(limit, self.next_line()).await {
            Ok(Ok(Some(line))) => Ok(line),
            Ok(Ok(None)) => Err(anyhow::anyhow!("server closed the connection")),
            Ok(Err(e)) => Err(e),
            Err(_) => Err(anyhow::anyhow!("no message within {:?}", limit)),
        }
    }

    /// Read one line and check it is exactly `expected`.
    pub async fn expect(&mut self, expected: &str, limit: Duration) -> anyhow::Result<()> {
        let line = self.recv_timeout(limit).await?;
        if line != expected {
            anyhow::bail!("expected {:?}, got {:?}", expected, line);
        }
        Ok(())
    }

    /// Send `PING` every `period` until the client is dropped.
    pub fn start_keepalive(&mut self, period: Duration) {
        let writer = self.writer.clone();
        let task = tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let mut writer = writer.lock().await;
                let ping = format!("{}\n", KEEPALIVE_PREFIX);
                if writer.write_all(ping.as_bytes()).await.is_err() {
                    break;
                }
            }
        });
        if let Some(old) = self.keepalive.replace(task) {
            old.abort();
        }
    }

    pub fn stop_keepalive(&mut self) {
        if let Some(task) = self.keepalive.take() {
            task.abort();
        }
    }
}

impl Drop for GameClient {
    fn drop(&mut self) {
        self.stop_keepalive();
    }
}
