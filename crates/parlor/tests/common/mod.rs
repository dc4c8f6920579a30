//! Shared helpers for the end-to-end server tests: a raw line-speaking
//! test client and timeout-guarded reads.

use std::net::SocketAddr;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::time::timeout;

/// A minimal game client: connects, speaks one line per message.
pub struct TestClient {
    lines: Lines<BufReader<OwnedReadHalf>>,
    writer: OwnedWriteHalf,
}

impl TestClient {
    /// Connects to the server and performs the handshake (sends `name`
    /// as the first line).
    pub async fn join(addr: SocketAddr, name: &str) -> Self {
        let stream = TcpStream::connect(addr).await.expect("should connect");
        let (read, writer) = stream.into_split();
        let mut client = Self {
            lines: BufReader::new(read).lines(),
            writer,
        };
        client.send(name).await;
        client
    }

    /// Sends one line.
    pub async fn send(&mut self, line: &str) {
        self.writer
            .write_all(line.as_bytes())
            .await
            .expect("should send");
        self.writer.write_all(b"\n").await.expect("should send");
    }

    /// Receives the next line, failing the test after 5 s.
    pub async fn recv(&mut self) -> String {
        timeout(Duration::from_secs(5), self.lines.next_line())
            .await
            .expect("timed out waiting for a line")
            .expect("read failed")
            .expect("server closed the connection")
    }

    /// Asserts the next line equals `expected`.
    pub async fn expect(&mut self, expected: &str) {
        assert_eq!(self.recv().await, expected);
    }

    /// Asserts that no line arrives for a while.
    pub async fn expect_silence(&mut self) {
        match timeout(Duration::from_millis(150), self.lines.next_line())
            .await
        {
            Err(_) | Ok(Ok(None)) => {}
            Ok(line) => panic!("expected silence, got {line:?}"),
        }
    }
}

/// Initializes test logging once; respects `RUST_LOG`.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .try_init();
}
