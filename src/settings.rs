use std::{env, time::Duration};

use crate::backoff::BackoffPolicy;

/// Holds all tunables, read-once from ENV with fallbacks. Constructed
/// explicitly by the embedding host and handed to [`DisplayClient::new`];
/// there is no global instance.
///
/// [`DisplayClient::new`]: crate::DisplayClient::new
#[derive(Debug, Clone)]
pub struct Settings {
    /// Monitor endpoint host. Default `127.0.0.1`.
    pub monitor_host: String,
    /// Monitor endpoint port. Default `8765`.
    pub monitor_port: u16,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
    pub backoff_factor: f64,
    /// Capacity of the inbound frame broadcast channel.
    pub frame_buffer_capacity: usize,
    /// Capacity of the outbound payload queue drained by the channel task.
    pub outbound_buffer_capacity: usize,
    /// Capacity of the lifecycle event broadcast channel.
    pub event_buffer_capacity: usize,
    /// Accept the first-generation single-video command schema and emit
    /// `finished` events in its legacy shape.
    pub legacy_single_video: bool,
}

impl Settings {
    pub fn from_env() -> Self {
        // optionally load .env
        let _ = dotenvy::dotenv();

        fn parse_usize(var: &str, default: usize) -> usize {
            env::var(var)
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default)
        }

        fn parse_u16(var: &str, default: u16) -> u16 {
            env::var(var)
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default)
        }

        fn parse_f64(var: &str, default: f64) -> f64 {
            env::var(var)
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default)
        }

        fn parse_bool(var: &str, default: bool) -> bool {
            env::var(var)
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default)
        }

        fn parse_millis(var: &str, default_ms: u64) -> Duration {
            env::var(var)
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .map(Duration::from_millis)
                .unwrap_or_else(|| Duration::from_millis(default_ms))
        }

        Settings {
            monitor_host: env::var("MONITOR_HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            monitor_port: parse_u16("MONITOR_PORT", 8765),
            initial_backoff: parse_millis("INITIAL_BACKOFF_MS", 1_000),
            max_backoff: parse_millis("MAX_BACKOFF_MS", 30_000),
            backoff_factor: parse_f64("BACKOFF_FACTOR", 1.5),
            frame_buffer_capacity: parse_usize("FRAME_BUFFER_CAPACITY", 100),
            outbound_buffer_capacity: parse_usize("OUTBOUND_BUFFER_CAPACITY", 64),
            event_buffer_capacity: parse_usize("EVENT_BUFFER_CAPACITY", 100),
            legacy_single_video: parse_bool("LEGACY_SINGLE_VIDEO", false),
        }
    }

    /// WebSocket URL of the Monitor endpoint.
    pub fn monitor_url(&self) -> String {
        format!("ws://{}:{}", self.monitor_host, self.monitor_port)
    }

    pub fn backoff_policy(&self) -> BackoffPolicy {
        BackoffPolicy::new(self.initial_backoff, self.max_backoff, self.backoff_factor)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            monitor_host: "127.0.0.1".to_string(),
            monitor_port: 8765,
            initial_backoff: Duration::from_millis(1_000),
            max_backoff: Duration::from_millis(30_000),
            backoff_factor: 1.5,
            frame_buffer_capacity: 100,
            outbound_buffer_capacity: 64,
            event_buffer_capacity: 100,
            legacy_single_video: false,
        }
    }
}
