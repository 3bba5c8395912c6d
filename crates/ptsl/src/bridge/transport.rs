//! Physical link to the host process.
//!
//! One connection carries every request. [`Transport`] holds the write half
//! behind a mutex so concurrent callers never interleave frames, and
//! [`FrameReceiver`] owns the read half for the single demultiplexing reader.

use std::fmt;
use std::io;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::{TcpStream, UnixStream};
use tokio::sync::Mutex;
use tokio::time::Instant;
use tokio_util::codec::{FramedRead, FramedWrite};
use tokio_util::sync::CancellationToken;

use super::codec::FrameCodec;
use super::protocol::{ClientMessage, HostMessage};
use crate::error::{Error, TransportError};

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 31416;

/// How long `Transport::close` spends flushing the write half.
const CLOSE_FLUSH_TIMEOUT: Duration = Duration::from_millis(500);

/// Deadline `timeout` from now. Saturates for timeouts too large to add.
pub fn deadline_after(timeout: Duration) -> Instant {
    let now = Instant::now();
    now.checked_add(timeout)
        .unwrap_or_else(|| now + Duration::from_secs(60 * 60 * 24 * 365))
}

/// Address at which the host listens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    Tcp { host: String, port: u16 },
    Unix { path: PathBuf },
}

impl Endpoint {
    pub fn tcp(host: impl Into<String>, port: u16) -> Self {
        Self::Tcp {
            host: host.into(),
            port,
        }
    }

    pub fn unix(path: impl Into<PathBuf>) -> Self {
        Self::Unix { path: path.into() }
    }
}

impl Default for Endpoint {
    fn default() -> Self {
        Self::tcp(DEFAULT_HOST, DEFAULT_PORT)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tcp { host, port } => write!(f, "tcp://{host}:{port}"),
            Self::Unix { path } => write!(f, "unix://{}", path.display()),
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum EndpointParseError {
    #[error("unsupported endpoint scheme in '{0}'")]
    UnsupportedScheme(String),
    #[error("missing host in '{0}'")]
    MissingHost(String),
    #[error("missing or invalid port in '{0}'")]
    InvalidPort(String),
    #[error("missing Unix socket path in '{0}'")]
    MissingUnixPath(String),
}

impl FromStr for Endpoint {
    type Err = EndpointParseError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        if let Some(path) = input.strip_prefix("unix://") {
            if path.is_empty() {
                return Err(EndpointParseError::MissingUnixPath(input.to_string()));
            }
            return Ok(Self::unix(path));
        }

        let Some(addr) = input.strip_prefix("tcp://") else {
            return Err(EndpointParseError::UnsupportedScheme(input.to_string()));
        };
        let (host, port) = addr
            .rsplit_once(':')
            .ok_or_else(|| EndpointParseError::InvalidPort(input.to_string()))?;
        if host.is_empty() {
            return Err(EndpointParseError::MissingHost(input.to_string()));
        }
        let port = port
            .parse::<u16>()
            .map_err(|_| EndpointParseError::InvalidPort(input.to_string()))?;
        Ok(Self::tcp(host, port))
    }
}

pub type BoxReader = Box<dyn AsyncRead + Send + Unpin>;
pub type BoxWriter = Box<dyn AsyncWrite + Send + Unpin>;

/// An established byte stream, split into halves.
pub struct Connection {
    pub reader: BoxReader,
    pub writer: BoxWriter,
}

impl Connection {
    pub fn new<R, W>(reader: R, writer: W) -> Self
    where
        R: AsyncRead + Send + Unpin + 'static,
        W: AsyncWrite + Send + Unpin + 'static,
    {
        Self {
            reader: Box::new(reader),
            writer: Box::new(writer),
        }
    }

    /// Split any bidirectional stream (e.g. `tokio::io::DuplexStream`).
    pub fn from_stream<S>(stream: S) -> Self
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        let (reader, writer) = tokio::io::split(stream);
        Self::new(reader, writer)
    }
}

/// Opens connections to an endpoint.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn open(&self, endpoint: &Endpoint) -> Result<Connection, Error>;
}

/// Connects over real TCP or Unix sockets.
#[derive(Debug, Clone)]
pub struct SocketConnector {
    connect_timeout: Duration,
}

impl SocketConnector {
    pub fn new(connect_timeout: Duration) -> Self {
        Self { connect_timeout }
    }

    async fn dial(endpoint: &Endpoint) -> io::Result<Connection> {
        match endpoint {
            Endpoint::Tcp { host, port } => {
                let stream = TcpStream::connect((host.as_str(), *port)).await?;
                stream.set_nodelay(true)?;
                let (reader, writer) = stream.into_split();
                Ok(Connection::new(reader, writer))
            }
            Endpoint::Unix { path } => {
                let stream = UnixStream::connect(path).await?;
                let (reader, writer) = stream.into_split();
                Ok(Connection::new(reader, writer))
            }
        }
    }
}

impl Default for SocketConnector {
    fn default() -> Self {
        Self::new(Duration::from_secs(5))
    }
}

#[async_trait]
impl Connector for SocketConnector {
    async fn open(&self, endpoint: &Endpoint) -> Result<Connection, Error> {
        tracing::debug!(%endpoint, "Connecting to host");
        let result = match tokio::time::timeout(self.connect_timeout, Self::dial(endpoint)).await
        {
            Ok(result) => result,
            Err(_) => Err(io::Error::new(
                io::ErrorKind::TimedOut,
                format!("no answer within {:?}", self.connect_timeout),
            )),
        };
        result.map_err(|source| {
            tracing::debug!(%endpoint, error = %source, "Host unavailable");
            Error::HostUnavailable {
                endpoint: endpoint.clone(),
                source,
            }
        })
    }
}

/// Write side of a connection plus its closed flag.
pub struct Transport {
    writer: Mutex<FramedWrite<BoxWriter, FrameCodec<ClientMessage>>>,
    closed: CancellationToken,
}

/// Read side of a connection. Yields `None` once the link is closed.
pub struct FrameReceiver {
    reader: FramedRead<BoxReader, FrameCodec<HostMessage>>,
    closed: CancellationToken,
}

impl Transport {
    pub fn open(connection: Connection, max_frame_length: usize) -> (Self, FrameReceiver) {
        let closed = CancellationToken::new();
        let writer = FramedWrite::new(
            connection.writer,
            FrameCodec::with_max_frame_length(max_frame_length),
        );
        let reader = FramedRead::new(
            connection.reader,
            FrameCodec::with_max_frame_length(max_frame_length),
        );
        (
            Self {
                writer: Mutex::new(writer),
                closed: closed.clone(),
            },
            FrameReceiver { reader, closed },
        )
    }

    /// Write one frame, giving up at `deadline`. Frames from concurrent
    /// callers never interleave.
    ///
    /// A local `close` pre-empts a write stuck on a host that stopped
    /// reading. A write that stalls past the deadline may have left part of
    /// a frame on the wire, so it closes the link.
    pub async fn send(&self, msg: ClientMessage, deadline: Instant) -> Result<(), TransportError> {
        if self.closed.is_cancelled() {
            return Err(TransportError::Closed);
        }
        let mut writer = tokio::select! {
            _ = self.closed.cancelled() => return Err(TransportError::Closed),
            locked = tokio::time::timeout_at(deadline, self.writer.lock()) => match locked {
                Ok(writer) => writer,
                // Still queued behind another writer; nothing was written.
                Err(_) => return Err(TransportError::WriteTimeout),
            },
        };
        if self.closed.is_cancelled() {
            return Err(TransportError::Closed);
        }

        let written = tokio::select! {
            _ = self.closed.cancelled() => return Err(TransportError::Closed),
            written = tokio::time::timeout_at(deadline, writer.send(msg)) => written,
        };
        match written {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) if e.kind() == io::ErrorKind::InvalidInput => {
                // Oversized frame: nothing was written, the link is still fine.
                Err(TransportError::Io(e))
            }
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "Write to host failed, closing link");
                self.closed.cancel();
                Err(TransportError::Io(e))
            }
            Err(_) => {
                tracing::warn!("Write to host stalled, closing link");
                self.closed.cancel();
                Err(TransportError::WriteTimeout)
            }
        }
    }

    /// Shut the link down. Safe to call more than once.
    ///
    /// Flushing the write half is bounded so a host that stopped reading
    /// cannot hold this up.
    pub async fn close(&self) {
        if self.closed.is_cancelled() {
            return;
        }
        self.closed.cancel();
        let flush = async {
            let mut writer = self.writer.lock().await;
            writer.close().await
        };
        match tokio::time::timeout(CLOSE_FLUSH_TIMEOUT, flush).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::debug!(error = %e, "Error shutting down write half"),
            Err(_) => tracing::debug!("Gave up flushing write half"),
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.is_cancelled()
    }

    /// Token cancelled when either side of the link is closed.
    pub fn closed(&self) -> CancellationToken {
        self.closed.clone()
    }
}

impl FrameReceiver {
    /// Wait for the next complete frame.
    ///
    /// `Ok(None)` means the host closed the stream or the transport was
    /// closed locally. A read error also marks the link closed.
    pub async fn receive(&mut self) -> Result<Option<HostMessage>, TransportError> {
        let next = tokio::select! {
            _ = self.closed.cancelled() => return Ok(None),
            next = self.reader.next() => next,
        };
        match next {
            Some(Ok(msg)) => Ok(Some(msg)),
            Some(Err(e)) => {
                self.closed.cancel();
                Err(TransportError::Io(e))
            }
            None => {
                self.closed.cancel();
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::protocol::{CorrelationTag, ResponseHeader, TaskStatus};

    fn closing(reason: &str) -> HostMessage {
        HostMessage::Closing {
            reason: reason.to_string(),
        }
    }

    fn soon() -> Instant {
        Instant::now() + Duration::from_secs(5)
    }

    /// Client transport plus the host's framed halves.
    fn pipe() -> (
        Transport,
        FrameReceiver,
        FramedRead<tokio::io::ReadHalf<tokio::io::DuplexStream>, FrameCodec<ClientMessage>>,
        FramedWrite<tokio::io::WriteHalf<tokio::io::DuplexStream>, FrameCodec<HostMessage>>,
    ) {
        let (client, host) = tokio::io::duplex(64 * 1024);
        let (transport, receiver) = Transport::open(Connection::from_stream(client), 1024 * 1024);
        let (host_read, host_write) = tokio::io::split(host);
        (
            transport,
            receiver,
            FramedRead::new(host_read, FrameCodec::new()),
            FramedWrite::new(host_write, FrameCodec::new()),
        )
    }

    #[test]
    fn endpoint_display_and_parse() {
        let tcp: Endpoint = "tcp://localhost:31416".parse().unwrap();
        assert_eq!(tcp, Endpoint::tcp("localhost", 31416));
        assert_eq!(tcp.to_string(), "tcp://localhost:31416");

        let unix: Endpoint = "unix:///tmp/ptsl.sock".parse().unwrap();
        assert_eq!(unix, Endpoint::unix("/tmp/ptsl.sock"));
        assert_eq!(unix.to_string(), "unix:///tmp/ptsl.sock");

        assert_eq!(Endpoint::default().to_string(), "tcp://127.0.0.1:31416");
    }

    #[test]
    fn endpoint_parse_errors() {
        assert!(matches!(
            "http://x:1".parse::<Endpoint>(),
            Err(EndpointParseError::UnsupportedScheme(_))
        ));
        assert!(matches!(
            "tcp://:1".parse::<Endpoint>(),
            Err(EndpointParseError::MissingHost(_))
        ));
        assert!(matches!(
            "tcp://host".parse::<Endpoint>(),
            Err(EndpointParseError::InvalidPort(_))
        ));
        assert!(matches!(
            "tcp://host:99999".parse::<Endpoint>(),
            Err(EndpointParseError::InvalidPort(_))
        ));
        assert!(matches!(
            "unix://".parse::<Endpoint>(),
            Err(EndpointParseError::MissingUnixPath(_))
        ));
    }

    #[tokio::test]
    async fn send_and_receive_frames() {
        let (transport, mut receiver, mut host_rx, mut host_tx) = pipe();

        transport
            .send(
                ClientMessage::Disconnect {
                    session_id: Some("s".to_string()),
                },
                soon(),
            )
            .await
            .unwrap();
        let got = host_rx.next().await.unwrap().unwrap();
        assert!(matches!(got, ClientMessage::Disconnect { session_id: Some(s) } if s == "s"));

        let tag = CorrelationTag::new();
        host_tx
            .send(HostMessage::Response {
                header: ResponseHeader {
                    tag,
                    command: 33,
                    status: TaskStatus::Completed,
                    task_id: None,
                },
                body: "{}".to_string(),
                error: None,
            })
            .await
            .unwrap();
        match receiver.receive().await.unwrap() {
            Some(HostMessage::Response { header, .. }) => assert_eq!(header.tag, tag),
            other => panic!("unexpected frame: {other:?}"),
        }
    }

    #[tokio::test]
    async fn host_eof_reads_as_none() {
        let (transport, mut receiver, host_rx, host_tx) = pipe();
        drop(host_rx);
        drop(host_tx);
        assert!(receiver.receive().await.unwrap().is_none());
        assert!(transport.is_closed());
    }

    #[tokio::test]
    async fn close_is_idempotent_and_wakes_reader() {
        let (transport, mut receiver, _host_rx, _host_tx) = pipe();
        let reader = tokio::spawn(async move { receiver.receive().await });

        transport.close().await;
        transport.close().await;

        assert!(reader.await.unwrap().unwrap().is_none());
        assert!(matches!(
            transport
                .send(ClientMessage::Disconnect { session_id: None }, soon())
                .await,
            Err(TransportError::Closed)
        ));
    }

    #[tokio::test]
    async fn closing_frame_is_delivered() {
        let (transport, mut receiver, _host_rx, mut host_tx) = pipe();
        host_tx.send(closing("bye")).await.unwrap();
        let msg = receiver.receive().await.unwrap();
        assert!(matches!(msg, Some(HostMessage::Closing { ref reason }) if reason == "bye"));
        assert!(!transport.is_closed());
    }

    fn bulky() -> ClientMessage {
        ClientMessage::Disconnect {
            session_id: Some("x".repeat(4096)),
        }
    }

    #[tokio::test]
    async fn stalled_write_times_out_and_closes_link() {
        // Host end is held open but never read, so the pipe fills up.
        let (client, _host) = tokio::io::duplex(32);
        let (transport, _receiver) = Transport::open(Connection::from_stream(client), 1024 * 1024);

        let started = Instant::now();
        let err = transport
            .send(bulky(), Instant::now() + Duration::from_millis(100))
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::WriteTimeout), "{err}");
        assert!(started.elapsed() < Duration::from_secs(1));
        assert!(transport.is_closed());

        let closed = tokio::time::timeout(Duration::from_secs(2), transport.close()).await;
        assert!(closed.is_ok(), "close hung on a host that never reads");
    }

    #[tokio::test]
    async fn close_preempts_stuck_write() {
        let (client, _host) = tokio::io::duplex(32);
        let (transport, _receiver) = Transport::open(Connection::from_stream(client), 1024 * 1024);
        let transport = std::sync::Arc::new(transport);

        let writer = {
            let transport = std::sync::Arc::clone(&transport);
            tokio::spawn(async move {
                transport
                    .send(bulky(), Instant::now() + Duration::from_secs(60))
                    .await
            })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;

        let closed = tokio::time::timeout(Duration::from_secs(2), transport.close()).await;
        assert!(closed.is_ok(), "close hung behind a stuck write");
        let sent = tokio::time::timeout(Duration::from_secs(1), writer)
            .await
            .unwrap()
            .unwrap();
        assert!(matches!(sent, Err(TransportError::Closed)));
    }

    #[tokio::test]
    async fn oversized_send_keeps_link_open() {
        let (client, _host) = tokio::io::duplex(1024);
        let (transport, _receiver) = Transport::open(Connection::from_stream(client), 8);
        let err = transport
            .send(
                ClientMessage::Disconnect {
                    session_id: Some("longer than eight bytes".to_string()),
                },
                soon(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::Io(_)));
        assert!(!transport.is_closed());
    }

    #[tokio::test]
    async fn refused_tcp_is_host_unavailable() {
        // Bind then drop to get a port nobody listens on.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let endpoint = Endpoint::tcp("127.0.0.1", port);
        let err = SocketConnector::default()
            .open(&endpoint)
            .await
            .err()
            .unwrap();
        assert!(matches!(err, Error::HostUnavailable { endpoint: ref e, .. } if *e == endpoint));
    }

    #[tokio::test]
    async fn missing_unix_socket_is_host_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let endpoint = Endpoint::unix(dir.path().join("absent.sock"));
        let err = SocketConnector::default()
            .open(&endpoint)
            .await
            .err()
            .unwrap();
        assert!(err.is_host_unreachable());
    }

    #[tokio::test]
    async fn unix_socket_connects() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("host.sock");
        let listener = tokio::net::UnixListener::bind(&path).unwrap();
        let accept = tokio::spawn(async move { listener.accept().await.map(|_| ()) });

        let connection = SocketConnector::default()
            .open(&Endpoint::unix(&path))
            .await;
        assert!(connection.is_ok());
        accept.await.unwrap().unwrap();
    }
}
