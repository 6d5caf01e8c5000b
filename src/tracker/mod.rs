//! Channel membership tracking.
//!
//! [`ChannelTracker`] reconciles what the application asked for (`join`,
//! `part`) with what the connection is able to do, and keeps a roster of
//! who is in each confirmed channel.
//!
//! - Before the server's welcome (`001`), joins are queued. The welcome
//!   flushes the queue in order.
//! - A disconnect moves every joined channel back into the queue, so the
//!   next welcome rejoins them.
//! - Rosters are seeded by a names exchange (`353`… `366`) and then kept
//!   current with `JOIN`/`PART` lines.
//!
//! All state is owned by the single task that consumes connection events;
//! no locking is involved.
//!
//! Names replies are staged in one shared buffer. Two names exchanges for
//! different channels must not interleave, or their members end up mixed.
//!
//! A confirmed `PART` of our own only removes our nick from the member list;
//! the channel stays in the roster, so a later disconnect queues it for
//! rejoin like any other.

use std::collections::HashMap;

use tracing::{debug, info, warn};

use crate::app::Result;
use crate::connection::Outbound;
use crate::domain::{Event, Line};

pub struct ChannelTracker {
    outbound: Outbound,
    roster: HashMap<String, Vec<String>>,
    join_queue: Vec<String>,
    names_staging: Vec<String>,
    welcomed: bool,
}

impl ChannelTracker {
    pub fn new(outbound: Outbound) -> Self {
        Self {
            outbound,
            roster: HashMap::new(),
            join_queue: Vec::new(),
            names_staging: Vec::new(),
            welcomed: false,
        }
    }

    /// Join `channel` now if the server has welcomed us, or once it does.
    pub async fn join(&mut self, channel: &str) -> Result<()> {
        if self.roster.contains_key(channel) || self.is_queued(channel) {
            return Ok(());
        }
        if self.welcomed {
            self.outbound.join(channel).await
        } else {
            debug!(channel, "Queueing join until welcome");
            self.join_queue.push(channel.to_string());
            Ok(())
        }
    }

    /// Leave `channel`. A join that is still queued is simply cancelled.
    pub async fn part(&mut self, channel: &str) -> Result<()> {
        if self.is_queued(channel) {
            self.join_queue.retain(|c| c != channel);
            return Ok(());
        }
        if !self.roster.contains_key(channel) {
            return Ok(());
        }
        self.outbound.part(channel).await
    }

    /// Apply one connection event.
    pub async fn handle(&mut self, event: &Event) -> Result<()> {
        match event {
            Event::Connect => {}
            Event::Disconnect => self.on_disconnect(),
            Event::Line(line) => match line.command() {
                "001" => self.on_welcome().await?,
                "JOIN" => self.on_join(line),
                "PART" => self.on_part(line),
                "353" => self.on_names(line),
                "366" => self.on_end_of_names(line),
                _ => {}
            },
        }
        Ok(())
    }

    fn on_disconnect(&mut self) {
        let mut channels: Vec<String> = self.roster.drain().map(|(channel, _)| channel).collect();
        channels.sort();
        for channel in channels {
            if !self.is_queued(&channel) {
                self.join_queue.push(channel);
            }
        }
        self.names_staging.clear();
        self.welcomed = false;
        debug!(queued = ?self.join_queue, "Disconnected, channels queued for rejoin");
    }

    async fn on_welcome(&mut self) -> Result<()> {
        self.welcomed = true;
        let queued = std::mem::take(&mut self.join_queue);
        for channel in &queued {
            self.outbound.join(channel).await?;
        }
        Ok(())
    }

    fn on_join(&mut self, line: &Line) {
        let channel = joined_channel(line);
        // our own JOIN confirmation arrives before the names exchange
        let Some(members) = self.roster.get_mut(channel) else {
            return;
        };
        let nick = line.nick();
        info!(nick, channel, "User joined channel");
        members.push(nick.to_string());
    }

    fn on_part(&mut self, line: &Line) {
        let Some(channel) = line.arguments().first() else {
            warn!(line = %line, "PART without a channel");
            return;
        };
        if !line.prefix().contains('!') {
            warn!(line = %line, "PART without a nick!ident prefix");
            return;
        }
        let Some(members) = self.roster.get_mut(channel.as_str()) else {
            warn!(channel = %channel, "PART for a channel we are not tracking");
            return;
        };

        let nick = line.nick();
        match members.iter().position(|m| m == nick) {
            Some(i) => {
                members.remove(i);
                info!(nick, channel = %channel, members = ?members, "User left channel");
            }
            None => warn!(nick, channel = %channel, "PART for a user not in the channel"),
        }
    }

    fn on_names(&mut self, line: &Line) {
        if line.arguments().is_empty() || line.suffix().is_empty() {
            warn!(line = %line, "Names reply without enough parameters");
            return;
        }
        self.names_staging.extend(
            line.suffix()
                .split(' ')
                .filter(|n| !n.is_empty())
                .map(String::from),
        );
    }

    fn on_end_of_names(&mut self, line: &Line) {
        let names = std::mem::take(&mut self.names_staging);
        let Some(channel) = line.arguments().last() else {
            warn!(line = %line, "End of names without a channel");
            return;
        };
        info!(channel = %channel, users = names.len(), "Joined channel");
        self.join_queue.retain(|c| c != channel);
        self.roster.insert(channel.clone(), names);
    }

    fn is_queued(&self, channel: &str) -> bool {
        self.join_queue.iter().any(|c| c == channel)
    }

    pub fn roster(&self) -> &HashMap<String, Vec<String>> {
        &self.roster
    }

    pub fn members(&self, channel: &str) -> Option<&[String]> {
        self.roster.get(channel).map(Vec::as_slice)
    }

    pub fn is_joined(&self, channel: &str) -> bool {
        self.roster.contains_key(channel)
    }

    pub fn join_queue(&self) -> &[String] {
        &self.join_queue
    }

    pub fn is_welcomed(&self) -> bool {
        self.welcomed
    }
}

/// Channel named by a `JOIN` line: its suffix, empty when there is none.
pub fn joined_channel(line: &Line) -> &str {
    line.suffix()
}
