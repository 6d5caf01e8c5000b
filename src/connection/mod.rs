//! Network session: dial, read, write, reconnect.
//!
//! The engine cycles through [`ConnectionState`] forever:
//!
//! ```text
//! Idle -> Connecting -> Connected -> Disconnected -> Connecting -> ...
//! ```
//!
//! A failed dial is retried after a fixed delay, with no limit and no backoff.
//! Once connected, a reader and a writer run side by side on the socket; when
//! either one stops, the socket is dropped and `Disconnect` is emitted.
//!
//! Both queues are bounded `mpsc` channels. A full queue suspends the
//! producer, which is the only backpressure in the system: a consumer that
//! stops draining events stalls the reader and nothing is dropped. The one
//! exception is the outbound queue while no socket is live, which is drained
//! and discarded so that producers never wait on a connection that does not
//! exist yet.

pub mod io;
pub mod outbound;

use std::time::Duration;

use tokio::io::{AsyncBufRead, AsyncWrite, BufReader};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::domain::{Event, Line};

pub use outbound::Outbound;

use self::io::{drain_while, read_loop, write_loop, ReadEnd, WriteEnd};

pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_secs(10);
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(60);
/// One slot per queue: the closest a tokio channel gets to a synchronous
/// hand-off.
pub const DEFAULT_QUEUE_CAPACITY: usize = 1;

/// Receiving end of the inbound event queue.
pub type Events = mpsc::Receiver<Event>;

#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// `host:port` to dial
    pub server: String,
    pub reconnect_delay: Duration,
    /// Longest silence from the server before the connection is dropped
    pub idle_timeout: Duration,
    pub event_queue: usize,
    pub command_queue: usize,
}

impl ConnectionConfig {
    pub fn new(server: impl Into<String>) -> Self {
        Self {
            server: server.into(),
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
            event_queue: DEFAULT_QUEUE_CAPACITY,
            command_queue: DEFAULT_QUEUE_CAPACITY,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Idle,
    Connecting,
    Connected,
    Disconnected,
}

pub struct Connection {
    config: ConnectionConfig,
    events: mpsc::Sender<Event>,
    commands: mpsc::Receiver<Line>,
    state: watch::Sender<ConnectionState>,
}

impl Connection {
    /// Creates the engine together with both ends its users need.
    pub fn new(config: ConnectionConfig) -> (Self, Outbound, Events) {
        let (event_tx, event_rx) = mpsc::channel(config.event_queue.max(1));
        let (cmd_tx, cmd_rx) = mpsc::channel(config.command_queue.max(1));
        let (state, _) = watch::channel(ConnectionState::Idle);

        let connection = Self {
            config,
            events: event_tx,
            commands: cmd_rx,
            state,
        };
        (connection, Outbound::new(cmd_tx), event_rx)
    }

    pub fn state(&self) -> watch::Receiver<ConnectionState> {
        self.state.subscribe()
    }

    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    /// Runs until the event receiver is dropped.
    pub async fn run(mut self) {
        loop {
            self.state.send_replace(ConnectionState::Connecting);
            let stream = self.dial().await;

            while let Ok(line) = self.commands.try_recv() {
                debug!(line = %line, "Dropping line queued before connect");
            }
            self.state.send_replace(ConnectionState::Connected);

            let (read_half, write_half) = stream.into_split();
            let end = self.session(BufReader::new(read_half), write_half).await;
            self.state.send_replace(ConnectionState::Disconnected);

            if !self.finish(end).await {
                info!("Event consumer gone, connection engine stopping");
                return;
            }
        }
    }

    /// Reports how a session ended and emits `Disconnect`. Returns `false`
    /// when nobody is listening for events any more.
    async fn finish(&mut self, end: Option<ReadEnd>) -> bool {
        let server = &self.config.server;
        match end {
            Some(ReadEnd::ConsumerGone) => return false,
            Some(ReadEnd::Eof) => info!(server = %server, "Server closed the connection"),
            Some(ReadEnd::IdleTimeout) => warn!(
                server = %server,
                timeout = ?self.config.idle_timeout,
                "Server went quiet, reconnecting"
            ),
            Some(ReadEnd::Failed(e)) => warn!(server = %server, error = %e, "Read failed"),
            None => info!(server = %server, "Writer stopped, dropping connection"),
        }

        drain_while(&mut self.commands, self.events.send(Event::Disconnect))
            .await
            .is_ok()
    }

    /// Dials until a connection is established.
    async fn dial(&mut self) -> TcpStream {
        let server = self.config.server.clone();
        loop {
            info!(server = %server, "Dialing");
            match drain_while(&mut self.commands, TcpStream::connect(server.as_str())).await {
                Ok(stream) => {
                    info!(server = %server, "Connected");
                    return stream;
                }
                Err(e) => {
                    warn!(
                        server = %server,
                        error = %e,
                        "Could not connect, retrying in {:?}",
                        self.config.reconnect_delay
                    );
                    let delay = tokio::time::sleep(self.config.reconnect_delay);
                    drain_while(&mut self.commands, delay).await;
                }
            }
        }
    }

    /// Drives reader and writer on one socket. `None` means the writer
    /// stopped first.
    async fn session<R, W>(&mut self, mut reader: R, mut writer: W) -> Option<ReadEnd>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let commands = &mut self.commands;

        let reading = read_loop(&mut reader, &self.events, self.config.idle_timeout);
        let writing = async {
            if write_loop(commands, &mut writer).await == WriteEnd::QueueClosed {
                // nobody can send any more; keep the reader going
                std::future::pending::<()>().await;
            }
        };

        tokio::select! {
            end = reading => Some(end),
            _ = writing => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::ErrorKind;

    use tokio::io::{AsyncBufReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::time::timeout;
    use tokio_test::io::Builder;

    const WAIT: Duration = Duration::from_secs(5);

    async fn listen() -> (TcpListener, ConnectionConfig) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let mut config = ConnectionConfig::new(listener.local_addr().unwrap().to_string());
        config.reconnect_delay = Duration::from_millis(50);
        config.event_queue = 8;
        config.command_queue = 8;
        (listener, config)
    }

    async fn next(events: &mut Events) -> Event {
        timeout(WAIT, events.recv()).await.unwrap().unwrap()
    }

    #[tokio::test]
    async fn test_connect_then_lines_in_order() {
        let (listener, config) = listen().await;
        let (conn, _out, mut events) = Connection::new(config);
        let mut state = conn.state();
        conn.spawn();

        let (mut sock, _) = listener.accept().await.unwrap();
        assert_eq!(next(&mut events).await, Event::Connect);
        assert_eq!(*state.borrow_and_update(), ConnectionState::Connected);

        sock.write_all(b":srv 001 bot :Welcome\r\nnot-a-problem\r\n:srv 002 bot :Host\r\n")
            .await
            .unwrap();
        assert!(next(&mut events).await.is_command("001"));
        assert!(next(&mut events).await.is_command("not-a-problem"));
        assert!(next(&mut events).await.is_command("002"));
    }

    #[tokio::test]
    async fn test_ping_round_trip() {
        let (listener, config) = listen().await;
        let (conn, out, mut events) = Connection::new(config);
        conn.spawn();

        let (sock, _) = listener.accept().await.unwrap();
        let (read_half, mut write_half) = sock.into_split();
        let mut server_reader = tokio::io::BufReader::new(read_half);
        assert_eq!(next(&mut events).await, Event::Connect);

        write_half.write_all(b"PING abc\r\n").await.unwrap();
        let ping = next(&mut events).await;
        assert!(out.handle_ping(&ping).await);

        let mut reply = String::new();
        timeout(WAIT, server_reader.read_line(&mut reply))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(reply, "PONG abc\r\n");
    }

    #[tokio::test]
    async fn test_disconnect_then_reconnect() {
        let (listener, config) = listen().await;
        let (conn, _out, mut events) = Connection::new(config);
        conn.spawn();

        let (sock, _) = listener.accept().await.unwrap();
        assert_eq!(next(&mut events).await, Event::Connect);
        drop(sock);

        assert_eq!(next(&mut events).await, Event::Disconnect);
        let (_sock, _) = timeout(WAIT, listener.accept()).await.unwrap().unwrap();
        assert_eq!(next(&mut events).await, Event::Connect);
    }

    #[tokio::test]
    async fn test_idle_timeout_forces_reconnect() {
        let (listener, mut config) = listen().await;
        config.idle_timeout = Duration::from_millis(100);
        let (conn, _out, mut events) = Connection::new(config);
        conn.spawn();

        let (_sock, _) = listener.accept().await.unwrap();
        assert_eq!(next(&mut events).await, Event::Connect);
        assert_eq!(next(&mut events).await, Event::Disconnect);
        let (_sock2, _) = timeout(WAIT, listener.accept()).await.unwrap().unwrap();
        assert_eq!(next(&mut events).await, Event::Connect);
    }

    #[tokio::test]
    async fn test_dial_failure_is_retried() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let mut config = ConnectionConfig::new(addr.to_string());
        config.reconnect_delay = Duration::from_millis(50);
        let (conn, _out, mut events) = Connection::new(config);
        let mut state = conn.state();
        conn.spawn();

        timeout(WAIT, state.wait_for(|s| *s == ConnectionState::Connecting))
            .await
            .unwrap()
            .unwrap();

        let listener = TcpListener::bind(addr).await.unwrap();
        let (_sock, _) = timeout(WAIT, listener.accept()).await.unwrap().unwrap();
        assert_eq!(next(&mut events).await, Event::Connect);
    }

    #[tokio::test]
    async fn test_writer_stopping_ends_session_with_disconnect() {
        let mut config = ConnectionConfig::new("127.0.0.1:0");
        config.event_queue = 8;
        config.command_queue = 8;
        let (mut conn, out, mut events) = Connection::new(config);

        // a server that never speaks and a socket that refuses writes
        let reader = BufReader::new(Builder::new().wait(Duration::from_secs(30)).build());
        let writer = Builder::new()
            .write_error(std::io::Error::new(ErrorKind::BrokenPipe, "gone"))
            .build();
        out.nick("bot").await.unwrap();

        let end = timeout(WAIT, conn.session(reader, writer)).await.unwrap();
        assert!(end.is_none());

        assert!(conn.finish(end).await);
        let mut seen = Vec::new();
        while let Ok(event) = events.try_recv() {
            seen.push(event);
        }
        assert_eq!(seen.last(), Some(&Event::Disconnect));
    }

    #[tokio::test]
    async fn test_lines_sent_while_disconnected_are_dropped() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let mut config = ConnectionConfig::new(addr.to_string());
        config.reconnect_delay = Duration::from_millis(100);
        let (conn, out, mut events) = Connection::new(config);
        let mut state = conn.state();
        conn.spawn();

        timeout(WAIT, state.wait_for(|s| *s == ConnectionState::Connecting))
            .await
            .unwrap()
            .unwrap();
        // none of these may block on the one-slot queue
        timeout(WAIT, async {
            for _ in 0..5 {
                out.join("#stale").await.unwrap();
            }
        })
        .await
        .unwrap();

        let listener = TcpListener::bind(addr).await.unwrap();
        let (sock, _) = timeout(WAIT, listener.accept()).await.unwrap().unwrap();
        assert_eq!(next(&mut events).await, Event::Connect);

        out.nick("bot").await.unwrap();
        let mut server_reader = tokio::io::BufReader::new(sock);
        let mut first = String::new();
        timeout(WAIT, server_reader.read_line(&mut first))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(first, "NICK bot\r\n");
    }

    #[tokio::test]
    async fn test_engine_stops_without_consumer() {
        let (listener, config) = listen().await;
        let (conn, _out, events) = Connection::new(config);
        let handle = conn.spawn();
        drop(events);

        let _accepted = listener.accept().await.unwrap();
        timeout(WAIT, handle).await.unwrap().unwrap();
    }
}
