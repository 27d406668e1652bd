//! Snapshot fetching from the HAProxy admin socket.

use async_trait::async_trait;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::{TcpStream, UnixStream};
use tracing::debug;

use crate::error::WatchError;

#[cfg(test)]
use mockall::automock;

/// Bound on a whole query (connect, send, read until EOF)
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Maximum accepted response size (32 MB)
/// A full 100k-entry stick table is around 10 MB
const MAX_SNAPSHOT_SIZE: usize = 32 * 1024 * 1024;

/// Something that can produce the raw text of a connection table.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait SnapshotSource: Send + Sync {
    async fn fetch(&self) -> Result<String, WatchError>;
}

/// Where the admin socket lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlAddress {
    Unix(PathBuf),
    Tcp(SocketAddr),
}

impl ControlAddress {
    /// `host:port` for a TCP stats socket, anything else is a Unix socket path.
    pub fn parse(address: &str) -> Self {
        match address.trim().parse::<SocketAddr>() {
            Ok(addr) => ControlAddress::Tcp(addr),
            Err(_) => ControlAddress::Unix(PathBuf::from(address.trim())),
        }
    }
}

impl std::fmt::Display for ControlAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ControlAddress::Unix(path) => write!(f, "unix:{}", path.display()),
            ControlAddress::Tcp(addr) => write!(f, "tcp:{}", addr),
        }
    }
}

/// Queries `show table <name>` over the HAProxy admin socket.
#[derive(Debug, Clone)]
pub struct AdminSocket {
    address: ControlAddress,
    table: String,
    timeout: Duration,
}

impl AdminSocket {
    pub fn new(address: ControlAddress, table: impl Into<String>) -> Self {
        Self {
            address,
            table: table.into(),
            timeout: FETCH_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn address(&self) -> &ControlAddress {
        &self.address
    }

    fn command(&self) -> String {
        format!("show table {}\n", self.table)
    }

    async fn query(&self) -> Result<String, WatchError> {
        let command = self.command();
        match &self.address {
            ControlAddress::Unix(path) => {
                let stream = UnixStream::connect(path)
                    .await
                    .map_err(|e| WatchError::Fetch(format!("{}: {}", self.address, e)))?;
                exchange(stream, &command).await
            }
            ControlAddress::Tcp(addr) => {
                let stream = TcpStream::connect(addr)
                    .await
                    .map_err(|e| WatchError::Fetch(format!("{}: {}", self.address, e)))?;
                exchange(stream, &command).await
            }
        }
    }
}

#[async_trait]
impl SnapshotSource for AdminSocket {
    async fn fetch(&self) -> Result<String, WatchError> {
        debug!("Querying {} for table {}", self.address, self.table);
        match tokio::time::timeout(self.timeout, self.query()).await {
            Ok(result) => result,
            Err(_) => Err(WatchError::Timeout(self.timeout)),
        }
    }
}

/// Send one command and read the reply until the proxy closes the stream.
async fn exchange<S>(mut stream: S, command: &str) -> Result<String, WatchError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let io_err = |e: std::io::Error| WatchError::Fetch(e.to_string());

    stream.write_all(command.as_bytes()).await.map_err(io_err)?;
    stream.flush().await.map_err(io_err)?;

    let mut body = Vec::new();
    (&mut stream)
        .take(MAX_SNAPSHOT_SIZE as u64 + 1)
        .read_to_end(&mut body)
        .await
        .map_err(io_err)?;

    if body.len() > MAX_SNAPSHOT_SIZE {
        return Err(WatchError::Fetch(format!(
            "Response too large (max: {} bytes)",
            MAX_SNAPSHOT_SIZE
        )));
    }

    Ok(String::from_utf8_lossy(&body).into_owned())
}
