//! In-process stand-in for a Redis server.
//!
//! [`MockServer`] speaks just enough RESP to let a [`RedisClient`] finish its
//! handshake and run commands: `PING` answers `PONG`, `GET` answers nil and
//! every other command answers `OK`. Stopping the server closes the listener
//! and every accepted connection, which is how tests simulate an outage.
//!
//! # Feature Flag
//!
//! This module is only available when the `test-utils` feature is enabled:
//!
//! ```toml
//! [dev-dependencies]
//! fman-redis = { version = "...", features = ["test-utils"] }
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use fman_redis::{MockServer, RedisClient};
//!
//! let server = MockServer::start().await?;
//! let client = RedisClient::connect(server.config());
//! client.wait_resolved().await;
//! assert!(client.is_alive());
//!
//! server.stop().await;
//! ```
//!
//! [`RedisClient`]: crate::RedisClient

use std::io;
use std::net::SocketAddr;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::{JoinHandle, JoinSet};

use crate::RedisConfig;

/// Minimal RESP server bound to a local port.
#[derive(Debug)]
pub struct MockServer {
    addr: SocketAddr,
    handle: JoinHandle<()>,
}

impl MockServer {
    /// Binds an ephemeral local port and starts serving.
    pub async fn start() -> io::Result<Self> {
        Self::bind(SocketAddr::from(([127, 0, 0, 1], 0))).await
    }

    /// Binds `addr` and starts serving.
    ///
    /// Restarting on the address of a stopped server simulates recovery.
    pub async fn bind(addr: SocketAddr) -> io::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        let addr = listener.local_addr()?;
        let handle = tokio::spawn(accept_loop(listener));

        Ok(Self { addr, handle })
    }

    /// Returns the address the server listens on.
    #[must_use]
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Returns a client configuration pointing at this server.
    #[must_use]
    pub fn config(&self) -> RedisConfig {
        RedisConfig::new(self.addr.ip().to_string(), self.addr.port())
            .with_connect_timeout_secs(1)
            .with_response_timeout_secs(1)
    }

    /// Stops accepting and closes every open connection.
    pub async fn stop(self) {
        self.handle.abort();
        let _ = self.handle.await;
    }
}

async fn accept_loop(listener: TcpListener) {
    // Dropping the set when the loop is aborted closes every connection.
    let mut connections = JoinSet::new();
    while let Ok((stream, _)) = listener.accept().await {
        connections.spawn(serve(stream));
    }
}

async fn serve(stream: TcpStream) -> io::Result<()> {
    let (reader, mut writer) = stream.into_split();
    let mut reader = BufReader::new(reader);

    while let Some(command) = read_command(&mut reader).await? {
        let reply: &[u8] = match command.as_deref() {
            Some("PING") => b"+PONG\r\n",
            Some("GET") => b"$-1\r\n",
            _ => b"+OK\r\n",
        };
        writer.write_all(reply).await?;
    }

    Ok(())
}

/// Reads one RESP array and returns its upper-cased command name.
///
/// Returns `None` once the peer closes the connection.
async fn read_command<R>(reader: &mut R) -> io::Result<Option<Option<String>>>
where
    R: AsyncBufRead + Unpin,
{
    let Some(header) = read_line(reader).await? else {
        return Ok(None);
    };
    let count = parse_prefixed(&header, '*')?;

    let mut name = None;
    for _ in 0..count {
        let line = read_line(reader)
            .await?
            .ok_or_else(|| io::Error::from(io::ErrorKind::UnexpectedEof))?;
        let len = parse_prefixed(&line, '$')?;

        let mut bulk = vec![0; len + 2];
        reader.read_exact(&mut bulk).await?;
        bulk.truncate(len);

        if name.is_none() {
            name = Some(String::from_utf8_lossy(&bulk).to_ascii_uppercase());
        }
    }

    Ok(Some(name))
}

async fn read_line<R>(reader: &mut R) -> io::Result<Option<String>>
where
    R: AsyncBufRead + Unpin,
{
    let mut line = String::new();
    if reader.read_line(&mut line).await? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim_end().to_owned()))
}

fn parse_prefixed(line: &str, prefix: char) -> io::Result<usize> {
    line.strip_prefix(prefix)
        .and_then(|count| count.parse().ok())
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, format!("unexpected `{line}`")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn reads_command_names() {
        let input: &[u8] = b"*1\r\n$4\r\nping\r\n*2\r\n$3\r\nGET\r\n$3\r\nkey\r\n";
        let mut reader = BufReader::new(input);

        let first = read_command(&mut reader).await.unwrap();
        assert_eq!(first, Some(Some("PING".to_owned())));

        let second = read_command(&mut reader).await.unwrap();
        assert_eq!(second, Some(Some("GET".to_owned())));

        assert_eq!(read_command(&mut reader).await.unwrap(), None);
    }

    #[tokio::test]
    async fn rejects_inline_commands() {
        let mut reader = BufReader::new(&b"PING\r\n"[..]);
        let err = read_command(&mut reader).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }
}
