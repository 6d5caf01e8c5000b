//! The feed bot: registers on the server, keeps its channels joined and
//! announces new feed items in them.

pub mod announcer;

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::app::{AppContext, ChanfeedError, Result};
use crate::cache::MemoryCache;
use crate::config::Config;
use crate::connection::{Connection, Events, Outbound};
use crate::domain::{Event, Line};
use crate::poller::FeedPoller;
use crate::tracker::{joined_channel, ChannelTracker};

pub use announcer::{announce, announcement};

/// Capacity between a poller and its announcer.
const ANNOUNCE_QUEUE: usize = 16;

/// Consumer of connection events.
pub struct Bot {
    config: Arc<Config>,
    outbound: Outbound,
    events: Events,
    tracker: ChannelTracker,
}

impl Bot {
    /// Queues a join for every configured channel.
    pub async fn new(config: Arc<Config>, outbound: Outbound, events: Events) -> Result<Self> {
        let mut tracker = ChannelTracker::new(outbound.clone());
        for channel in config.channels.keys() {
            tracker.join(channel).await?;
        }
        Ok(Self {
            config,
            outbound,
            events,
            tracker,
        })
    }

    pub fn tracker(&self) -> &ChannelTracker {
        &self.tracker
    }

    /// Processes events until the engine goes away.
    pub async fn run(mut self) {
        while let Some(event) = self.events.recv().await {
            match self.handle(&event).await {
                Ok(()) => {}
                Err(ChanfeedError::EngineGone) => break,
                Err(e) => warn!(error = %e, "Failed to handle event"),
            }
        }
        info!("Event stream closed, bot stopping");
    }

    async fn handle(&mut self, event: &Event) -> Result<()> {
        log_event(event);
        if self.outbound.handle_ping(event).await {
            return Ok(());
        }
        self.tracker.handle(event).await?;

        match event {
            Event::Connect => {
                self.outbound.nick(&self.config.nick).await?;
                self.outbound
                    .user(&self.config.nick, self.config.realname())
                    .await?;
            }
            Event::Line(line) => {
                if let Some(mode) = operator_grant(&self.config, line) {
                    info!(mode = %mode, "Granting operator status");
                    self.outbound.send(mode).await?;
                }
            }
            Event::Disconnect => {}
        }
        Ok(())
    }
}

/// `MODE <channel> +o <nick>` for a `JOIN` by a user whose host is listed
/// in that channel's `ops`.
pub fn operator_grant(config: &Config, line: &Line) -> Option<Line> {
    if line.command() != "JOIN" {
        return None;
    }
    let channel = joined_channel(line);
    let settings = config.channels.get(channel)?;

    let (user, host) = line.prefix().rsplit_once('@')?;
    if !user.contains('!') || !settings.ops.iter().any(|op| op == host) {
        return None;
    }
    let nick = line.nick();
    if nick.is_empty() || nick == config.nick {
        return None;
    }
    Line::new("MODE", &[channel, "+o", nick]).ok()
}

fn log_event(event: &Event) {
    match event {
        Event::Connect => info!("Connected"),
        Event::Disconnect => info!("Disconnected"),
        Event::Line(line) => debug!(command = line.command(), "Handling line"),
    }
}

/// Runs the bot until its event stream ends.
pub async fn run(config: Config) -> Result<()> {
    let ctx = AppContext::new(config)?;
    let config = ctx.config.clone();

    let (connection, outbound, events) = Connection::new(config.connection());
    connection.spawn();

    let delay = config.timing.announce_delay() * config.channels.len() as u32;
    for (channel, url) in config.feeds() {
        let (tx, rx) = mpsc::channel(ANNOUNCE_QUEUE);
        let poller = FeedPoller::new(
            url,
            ctx.fetcher.clone(),
            ctx.normalizer.clone(),
            MemoryCache::new(),
            config.timing.poll_interval(),
        );
        info!(channel, url, "Watching feed");
        tokio::spawn(poller.run(tx));
        tokio::spawn(announce(outbound.clone(), channel.to_string(), rx, delay));
    }

    Bot::new(config, outbound, events).await?.run().await;
    Ok(())
}
