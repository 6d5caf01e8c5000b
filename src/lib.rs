//! # chanfeed
//!
//! A chat bot that watches RSS/Atom feeds and announces new items in
//! IRC-style channels.
//!
//! ## Architecture
//!
//! Two independent pipelines meet at the outbound command queue:
//!
//! ```text
//! socket → codec::parse → events → Bot + ChannelTracker ─┐
//!                                                         ├→ commands → codec::build → socket
//! Fetcher → Normalizer → FeedPoller → announcer ─────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! # Write a template config on first run, then edit it
//! chanfeed run
//!
//! # Validate a config without connecting
//! chanfeed --config ./chanfeed.toml check
//! ```
//!
//! ## Modules
//!
//! - [`app`]: Shared context and error types
//! - [`bot`]: Event consumer and feed announcers
//! - [`cache`]: Seen-item sets
//! - [`cli`]: Command-line interface definitions
//! - [`codec`]: Wire line parser and builder
//! - [`config`]: TOML configuration
//! - [`connection`]: Reconnecting network session
//! - [`domain`]: Lines, events and feed items
//! - [`fetcher`]: HTTP fetching with conditional requests
//! - [`normalizer`]: Feed parsing and normalization
//! - [`poller`]: Per-feed polling loop
//! - [`tracker`]: Channel membership

/// Shared context and error handling.
///
/// [`AppContext`](app::AppContext) holds the configuration, fetcher and
/// normalizer shared by every poller.
pub mod app;

/// The bot proper.
///
/// - [`Bot`](bot::Bot): registers, keeps channels joined, grants ops
/// - [`announce`](bot::announce): turns new items into channel messages
pub mod bot;

pub mod cache;

/// Command-line interface using clap.
///
/// - `run` - Connect and announce until interrupted
/// - `check` - Validate the configuration
pub mod cli;

/// Parsing and building of protocol lines.
pub mod codec;

/// Configuration management.
///
/// Loads from `~/.config/chanfeed/config.toml` unless `--config` is given.
pub mod config;

/// Connection engine.
///
/// - [`Connection`](connection::Connection): dial/read/write/reconnect loop
/// - [`Outbound`](connection::Outbound): cloneable handle onto the command queue
pub mod connection;

/// Core domain models.
///
/// - [`Line`](domain::Line): one protocol line
/// - [`Event`](domain::Event): what the connection reports
/// - [`FeedItem`](domain::FeedItem): one feed entry
pub mod domain;

/// HTTP fetching with conditional request support.
pub mod fetcher;

/// Feed parsing and normalization.
///
/// Converts RSS and Atom documents into [`FeedItem`](domain::FeedItem)s.
pub mod normalizer;

pub mod poller;

pub mod tracker;

pub use bot::run;
