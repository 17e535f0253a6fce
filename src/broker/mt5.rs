//! MT5 bridge connector
//!
//! Live market access goes through a TCP bridge terminal-side, speaking
//! a newline-delimited text protocol. Every call here is request/response
//! with a read timeout; a timeout or short read surfaces as a plain
//! error and the control loop treats it as a transient failure.
//!
//! Protocol:
//!   -> RATES:<symbol>,<timeframe>,<count>
//!   <- CANDLE:<epoch>,<open>,<high>,<low>,<close>,<volume> ... END
//!   -> ACCOUNT
//!   <- ACCOUNT:<balance>,<equity>
//!   -> POSITIONS:<symbol|*>
//!   <- POSITION:<symbol>,<BUY|SELL>,<epoch> ... END
//!   -> ORDER:<symbol>,<BUY|SELL>,<lots>,<sl>,<tp>
//!   <- ORDER_OK:<ticket>,<price> | ORDER_ERROR:<message>

use std::str::FromStr;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use chrono::DateTime;
use rust_decimal::Decimal;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio::time::timeout;
use tracing::{info, warn};

use crate::broker::{Broker, OrderRequest, OrderResult};
use crate::core::series::CandleSeries;
use crate::core::types::{AccountInfo, Candle, Direction, Position};

struct Connection {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
}

/// Live connector backed by the MT5 TCP bridge
pub struct Mt5Bridge {
    host: String,
    port: u16,
    io_timeout: Duration,
    conn: Mutex<Option<Connection>>,
}

impl Mt5Bridge {
    pub fn new(host: String, port: u16, io_timeout: Duration) -> Self {
        Self {
            host,
            port,
            io_timeout,
            conn: Mutex::new(None),
        }
    }

    /// Send one command and collect reply lines until `END`
    async fn request_many(&self, command: &str) -> Result<Vec<String>> {
        let mut guard = self.conn.lock().await;
        let conn = guard.as_mut().context("bridge not connected")?;

        conn.writer.write_all(command.as_bytes()).await?;
        conn.writer.write_all(b"\n").await?;

        let mut lines = Vec::new();
        loop {
            let mut line = String::new();
            let read = timeout(self.io_timeout, conn.reader.read_line(&mut line))
                .await
                .context("bridge read timed out")??;
            if read == 0 {
                bail!("bridge closed the connection");
            }

            let line = line.trim().to_string();
            if line == "END" {
                break;
            }
            lines.push(line);
        }
        Ok(lines)
    }

    /// Send one command and read exactly one reply line
    async fn request_one(&self, command: &str) -> Result<String> {
        let mut guard = self.conn.lock().await;
        let conn = guard.as_mut().context("bridge not connected")?;

        conn.writer.write_all(command.as_bytes()).await?;
        conn.writer.write_all(b"\n").await?;

        let mut line = String::new();
        let read = timeout(self.io_timeout, conn.reader.read_line(&mut line))
            .await
            .context("bridge read timed out")??;
        if read == 0 {
            bail!("bridge closed the connection");
        }
        Ok(line.trim().to_string())
    }
}

#[async_trait]
impl Broker for Mt5Bridge {
    async fn connect(&mut self) -> Result<()> {
        let addr = format!("{}:{}", self.host, self.port);
        info!("Connecting to MT5 bridge at {addr}...");

        let stream = timeout(self.io_timeout, TcpStream::connect(&addr))
            .await
            .context("bridge connect timed out")??;
        let (read_half, write_half) = stream.into_split();

        let mut guard = self.conn.lock().await;
        *guard = Some(Connection {
            reader: BufReader::new(read_half),
            writer: write_half,
        });

        info!("Connected to MT5 bridge");
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<()> {
        let mut guard = self.conn.lock().await;
        if let Some(mut conn) = guard.take() {
            let _ = conn.writer.shutdown().await;
        }
        info!("Disconnected from MT5 bridge");
        Ok(())
    }

    async fn get_candles(
        &self,
        symbol: &str,
        timeframe: &str,
        count: usize,
    ) -> Result<CandleSeries> {
        let lines = self
            .request_many(&format!("RATES:{symbol},{timeframe},{count}"))
            .await?;

        let mut candles = Vec::with_capacity(lines.len());
        for line in &lines {
            let payload = line
                .strip_prefix("CANDLE:")
                .ok_or_else(|| anyhow!("unexpected bridge line: {line}"))?;
            candles.push(parse_candle(payload)?);
        }

        Ok(CandleSeries::from_candles(count, candles))
    }

    async fn get_account(&self) -> Result<AccountInfo> {
        let line = self.request_one("ACCOUNT").await?;
        let payload = line
            .strip_prefix("ACCOUNT:")
            .ok_or_else(|| anyhow!("unexpected bridge line: {line}"))?;

        let parts: Vec<&str> = payload.split(',').collect();
        if parts.len() < 2 {
            bail!("malformed account line: {line}");
        }

        Ok(AccountInfo {
            balance: Decimal::from_str(parts[0])?,
            equity: Decimal::from_str(parts[1])?,
        })
    }

    async fn get_positions(&self, symbol: Option<&str>) -> Result<Vec<Position>> {
        let filter = symbol.unwrap_or("*");
        let lines = self.request_many(&format!("POSITIONS:{filter}")).await?;

        let mut positions = Vec::with_capacity(lines.len());
        for line in &lines {
            let payload = line
                .strip_prefix("POSITION:")
                .ok_or_else(|| anyhow!("unexpected bridge line: {line}"))?;
            positions.push(parse_position(payload)?);
        }
        Ok(positions)
    }

    async fn place_order(&self, order: OrderRequest) -> Result<OrderResult> {
        let command = format!(
            "ORDER:{},{},{},{},{}",
            order.symbol, order.direction, order.lots, order.stop_loss, order.take_profit
        );
        let line = self.request_one(&command).await?;

        if let Some(payload) = line.strip_prefix("ORDER_OK:") {
            let parts: Vec<&str> = payload.split(',').collect();
            if parts.len() < 2 {
                bail!("malformed order reply: {line}");
            }
            return Ok(OrderResult {
                ticket: parts[0].parse()?,
                fill_price: Decimal::from_str(parts[1])?,
            });
        }

        if let Some(error) = line.strip_prefix("ORDER_ERROR:") {
            warn!("Order rejected by bridge: {error}");
            bail!("order rejected: {error}");
        }

        bail!("unexpected bridge line: {line}")
    }
}

fn parse_candle(payload: &str) -> Result<Candle> {
    let parts: Vec<&str> = payload.split(',').collect();
    if parts.len() < 6 {
        bail!("malformed candle line: {payload}");
    }

    let epoch: i64 = parts[0].parse()?;
    let time = DateTime::from_timestamp(epoch, 0)
        .ok_or_else(|| anyhow!("bad candle timestamp: {epoch}"))?;

    Ok(Candle::new(
        time,
        Decimal::from_str(parts[1])?,
        Decimal::from_str(parts[2])?,
        Decimal::from_str(parts[3])?,
        Decimal::from_str(parts[4])?,
        Decimal::from_str(parts[5])?,
    ))
}

fn parse_position(payload: &str) -> Result<Position> {
    let parts: Vec<&str> = payload.split(',').collect();
    if parts.len() < 3 {
        bail!("malformed position line: {payload}");
    }

    let direction = match parts[1] {
        "BUY" => Direction::Buy,
        "SELL" => Direction::Sell,
        other => bail!("bad position direction: {other}"),
    };

    let epoch: i64 = parts[2].parse()?;
    let entry_time = DateTime::from_timestamp(epoch, 0)
        .ok_or_else(|| anyhow!("bad position timestamp: {epoch}"))?;

    Ok(Position {
        symbol: parts[0].to_string(),
        direction,
        entry_time,
    })
}
