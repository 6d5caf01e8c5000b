//! Configuration management for chanfeed.
//!
//! Configuration is read from `~/.config/chanfeed/config.toml` unless a path
//! is given. If the default file doesn't exist, a commented template is
//! written there and loading fails so the user can fill it in.

pub mod timing;

pub use timing::TimingConfig;

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use url::Url;

use crate::connection::ConnectionConfig;

/// Main configuration struct.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// `host:port` of the chat server
    pub server: String,
    pub nick: String,
    #[serde(default)]
    pub realname: String,
    #[serde(default)]
    pub timing: TimingConfig,
    /// Channel name to its feeds and operators
    #[serde(default)]
    pub channels: BTreeMap<String, ChannelConfig>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ChannelConfig {
    /// Feed URLs announced in this channel
    pub feeds: Vec<String>,
    /// Hosts whose users get channel-operator status on join
    pub ops: Vec<String>,
}

impl Config {
    /// Load and validate configuration.
    ///
    /// With no explicit path the default location is used, creating a
    /// template there on first run.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config_path = match path {
            Some(p) => p.to_path_buf(),
            None => {
                let default_path = Self::default_config_path()?;
                if !default_path.exists() {
                    Self::create_default_config(&default_path)?;
                    return Err(ConfigError::CreatedTemplate(default_path));
                }
                default_path
            }
        };

        let content = fs::read_to_string(&config_path).map_err(|e| ConfigError::Io {
            path: config_path.clone(),
            source: e,
        })?;

        Self::from_toml(&content).map_err(|e| match e {
            ConfigError::Parse { source, .. } => ConfigError::Parse {
                path: config_path,
                source,
            },
            other => other,
        })
    }

    /// Parse and validate configuration text.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content).map_err(|e| ConfigError::Parse {
            path: PathBuf::new(),
            source: e,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default config file path: `~/.config/chanfeed/config.toml`
    pub fn default_config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir.join("chanfeed").join("config.toml"))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: String| -> Result<(), ConfigError> { Err(ConfigError::Invalid(msg)) };

        if self.server.trim().is_empty() {
            return invalid("server must not be empty".into());
        }
        if self.nick.is_empty()
            || self.nick.starts_with(':')
            || self.nick.contains(|c: char| c == ' ' || c.is_control())
        {
            return invalid(format!("nick {:?} must be a single word", self.nick));
        }
        for (channel, settings) in &self.channels {
            if channel.is_empty()
                || channel.starts_with(':')
                || channel.contains(|c: char| c == ' ' || c.is_control())
            {
                return invalid(format!("channel name {channel:?} must be a single word"));
            }
            for feed in &settings.feeds {
                match Url::parse(feed) {
                    Ok(url) if matches!(url.scheme(), "http" | "https") => {}
                    Ok(url) => {
                        return invalid(format!(
                            "feed {feed} in {channel} uses unsupported scheme {}",
                            url.scheme()
                        ))
                    }
                    Err(e) => return invalid(format!("feed {feed} in {channel}: {e}")),
                }
            }
        }
        self.timing.validate().map_err(ConfigError::Invalid)
    }

    /// Settings for the connection engine.
    pub fn connection(&self) -> ConnectionConfig {
        ConnectionConfig {
            server: self.server.clone(),
            reconnect_delay: self.timing.reconnect_delay(),
            idle_timeout: self.timing.idle_timeout(),
            event_queue: self.timing.event_queue,
            command_queue: self.timing.command_queue,
        }
    }

    /// Real name sent at registration, the nick when unset.
    pub fn realname(&self) -> &str {
        if self.realname.is_empty() {
            &self.nick
        } else {
            &self.realname
        }
    }

    /// Every `(channel, feed url)` pair.
    pub fn feeds(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.channels.iter().flat_map(|(channel, settings)| {
            settings
                .feeds
                .iter()
                .map(move |feed| (channel.as_str(), feed.as_str()))
        })
    }

    /// Create a default config file with comments.
    fn create_default_config(path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let mut file = fs::File::create(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        file.write_all(Self::default_config_content().as_bytes())
            .map_err(|e| ConfigError::Io {
                path: path.to_path_buf(),
                source: e,
            })?;

        Ok(())
    }

    /// The template written on first run.
    pub fn default_config_content() -> &'static str {
        r##"# chanfeed configuration

# Chat server to connect to (host:port). Plain TCP only.
server = "irc.example.net:6667"

# Identity used at registration
nick = "chanfeed"
realname = "chanfeed feed announcer"

[timing]
# Fixed delay between connection attempts; retries never stop
reconnect_delay_secs = 10
# Reconnect when the server sends nothing for this long
idle_timeout_secs = 60
# How often each feed is fetched
poll_interval_secs = 300
# Pause before each announcement, multiplied by the number of channels
announce_delay_secs = 1
# Queue capacities; a full queue makes the producer wait
event_queue = 1
command_queue = 1

# One table per channel. Feeds are announced there; users connecting from
# one of the `ops` hosts are given channel-operator status when they join.
[channels."#chanfeed"]
feeds = ["https://blog.rust-lang.org/feed.xml"]
ops = []
"##
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("Wrote a template config to {0}; edit it and run again")]
    CreatedTemplate(PathBuf),

    #[error("Failed to read/write config file at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
