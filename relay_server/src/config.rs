//! Relay server configuration.
//!
//! Every setting can be given as a command-line flag or an environment
//! variable. `PORT` is honoured for compatibility with hosted platforms that
//! inject it.

use clap::{Parser, ValueEnum};
use std::time::Duration;

/// Default bind host.
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default listen port.
pub const DEFAULT_PORT: u16 = 3000;

/// Default per-connection outbound queue length.
pub const DEFAULT_SEND_QUEUE_CAPACITY: usize = 256;

/// Default interval between WebSocket pings, in seconds.
pub const DEFAULT_HEARTBEAT_INTERVAL_SECS: u64 = 30;

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Pretty,
    /// One JSON object per line.
    Json,
}

/// Relay server configuration.
#[derive(Debug, Clone, Parser)]
#[command(name = "relay-server", version, about = "WebRTC rendezvous relay")]
pub struct Config {
    /// Host to bind.
    #[arg(long, env = "RELAY_HOST", default_value = DEFAULT_HOST)]
    pub host: String,

    /// Port to bind (0 for auto-assign).
    #[arg(long, env = "PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Outbound frames buffered per connection before new ones are dropped.
    #[arg(long, env = "RELAY_SEND_QUEUE_CAPACITY", default_value_t = DEFAULT_SEND_QUEUE_CAPACITY)]
    pub send_queue_capacity: usize,

    /// Seconds between WebSocket pings (0 disables).
    #[arg(long, env = "RELAY_HEARTBEAT_INTERVAL_SECS", default_value_t = DEFAULT_HEARTBEAT_INTERVAL_SECS)]
    pub heartbeat_interval_secs: u64,

    /// Log output format.
    #[arg(long, env = "RELAY_LOG_FORMAT", value_enum, default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.into(),
            port: DEFAULT_PORT,
            send_queue_capacity: DEFAULT_SEND_QUEUE_CAPACITY,
            heartbeat_interval_secs: DEFAULT_HEARTBEAT_INTERVAL_SECS,
            log_format: LogFormat::Pretty,
        }
    }
}

impl Config {
    /// `host:port` for the listener.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Ping interval, or `None` when heartbeats are disabled.
    pub fn heartbeat_interval(&self) -> Option<Duration> {
        (self.heartbeat_interval_secs > 0).then(|| Duration::from_secs(self.heartbeat_interval_secs))
    }

    /// Outbound queue length, never zero (a zero-capacity channel panics).
    pub fn send_queue_capacity(&self) -> usize {
        self.send_queue_capacity.max(1)
    }
}
