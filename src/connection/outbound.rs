use tokio::sync::mpsc;
use tracing::warn;

use crate::app::{ChanfeedError, Result};
use crate::domain::{Event, Line, LineBuilder};

/// Cloneable handle onto the outbound command queue.
///
/// Sends wait while the queue is full. Lines sent while the engine has no
/// live socket are dropped by the engine.
#[derive(Clone, Debug)]
pub struct Outbound {
    tx: mpsc::Sender<Line>,
}

impl Outbound {
    pub(crate) fn new(tx: mpsc::Sender<Line>) -> Self {
        Self { tx }
    }

    pub async fn send(&self, line: Line) -> Result<()> {
        self.tx.send(line).await.map_err(|_| ChanfeedError::EngineGone)
    }

    /// Answers a `PING` with a `PONG` carrying the same parameters.
    ///
    /// Returns `true` when the event was a ping, in which case callers should
    /// not process it any further.
    pub async fn handle_ping(&self, event: &Event) -> bool {
        let Some(ping) = event.as_line().filter(|l| l.command() == "PING") else {
            return false;
        };

        let pong = LineBuilder::new()
            .command("PONG")
            .args(ping.arguments().to_vec())
            .suffix(ping.suffix())
            .consume();
        match pong {
            Ok(pong) => {
                if let Err(e) = self.send(pong).await {
                    warn!(error = %e, "Could not queue PONG");
                }
            }
            Err(e) => warn!(error = %e, "Could not build PONG"),
        }
        true
    }

    pub async fn nick(&self, nick: &str) -> Result<()> {
        self.send(Line::new("NICK", &[nick])?).await
    }

    pub async fn user(&self, user: &str, realname: &str) -> Result<()> {
        let line = LineBuilder::new()
            .command("USER")
            .args(vec![user.to_string(), "8".into(), "*".into()])
            .suffix(realname)
            .consume()?;
        self.send(line).await
    }

    pub async fn join(&self, channel: &str) -> Result<()> {
        self.send(Line::new("JOIN", &[channel])?).await
    }

    pub async fn part(&self, channel: &str) -> Result<()> {
        self.send(Line::new("PART", &[channel])?).await
    }

    /// Sends `text` to `target`, stripping anything that would break framing.
    pub async fn privmsg(&self, target: &str, text: &str) -> Result<()> {
        let line = LineBuilder::new()
            .command("PRIVMSG")
            .args_from_str(target)
            .suffix(text)
            .sanitize()
            .consume()?;
        self.send(line).await
    }
}
