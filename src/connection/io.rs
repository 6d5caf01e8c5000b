use std::future::Future;
use std::io::ErrorKind;
use std::time::Duration;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::codec;
use crate::domain::{Event, Line};

/// Why a reader loop returned.
#[derive(Debug)]
pub enum ReadEnd {
    Eof,
    IdleTimeout,
    Failed(std::io::Error),
    ConsumerGone,
}

/// Why a writer loop returned.
#[derive(Debug, PartialEq, Eq)]
pub enum WriteEnd {
    StreamClosed,
    QueueClosed,
}

/// Emits `Connect`, then forwards every parsed line until the peer goes
/// quiet for `idle`, closes, or the consumer drops its receiver.
///
/// Each send waits for queue capacity, so a slow consumer stalls reading.
pub async fn read_loop<R>(reader: &mut R, events: &mpsc::Sender<Event>, idle: Duration) -> ReadEnd
where
    R: AsyncBufRead + Unpin,
{
    if events.send(Event::Connect).await.is_err() {
        return ReadEnd::ConsumerGone;
    }

    let mut buf = Vec::new();
    loop {
        buf.clear();
        match timeout(idle, reader.read_until(b'\n', &mut buf)).await {
            Err(_) => return ReadEnd::IdleTimeout,
            Ok(Err(e)) => return ReadEnd::Failed(e),
            Ok(Ok(0)) => return ReadEnd::Eof,
            Ok(Ok(_)) => {}
        }

        let raw = String::from_utf8_lossy(&buf);
        match codec::parse(&raw) {
            Ok(line) => {
                debug!(line = %line, "Received");
                if events.send(Event::Line(line)).await.is_err() {
                    return ReadEnd::ConsumerGone;
                }
            }
            Err(e) => warn!(error = %e, raw = %raw.trim_end(), "Discarding malformed line"),
        }
    }
}

/// Writes queued lines in order until the stream closes or every sender
/// is dropped. Other write errors skip the line.
pub async fn write_loop<W>(commands: &mut mpsc::Receiver<Line>, writer: &mut W) -> WriteEnd
where
    W: AsyncWrite + Unpin,
{
    while let Some(line) = commands.recv().await {
        debug!(line = %line, "Sending");
        let wire = codec::build(&line);
        let result = async {
            writer.write_all(wire.as_bytes()).await?;
            writer.flush().await
        }
        .await;

        match result {
            Ok(()) => {}
            Err(e) if is_stream_closed(&e) => {
                info!(error = %e, "Stream closed, writer stopping");
                return WriteEnd::StreamClosed;
            }
            Err(e) => warn!(error = %e, line = %line, "Failed to send line"),
        }
    }
    WriteEnd::QueueClosed
}

/// Runs `fut` to completion while throwing away whatever arrives on the
/// outbound queue. Used whenever no socket is live.
pub async fn drain_while<F: Future>(commands: &mut mpsc::Receiver<Line>, fut: F) -> F::Output {
    tokio::pin!(fut);
    loop {
        tokio::select! {
            out = &mut fut => return out,
            Some(line) = commands.recv() => {
                warn!(line = %line, "Not connected, dropping outbound line");
            }
        }
    }
}

fn is_stream_closed(e: &std::io::Error) -> bool {
    matches!(
        e.kind(),
        ErrorKind::BrokenPipe
            | ErrorKind::ConnectionReset
            | ErrorKind::ConnectionAborted
            | ErrorKind::NotConnected
            | ErrorKind::UnexpectedEof
            | ErrorKind::WriteZero
    )
}
