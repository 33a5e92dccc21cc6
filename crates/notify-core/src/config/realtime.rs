//! Real-time notification channel configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Real-time (WebSocket) channel configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RealtimeConfig {
    /// WebSocket endpoint, without the credential parameter.
    #[serde(default = "default_server_url")]
    pub server_url: String,
    /// Query parameter carrying the bearer credential in the handshake.
    #[serde(default = "default_token_param")]
    pub token_param: String,
    /// Maximum time to wait for a transport to open, in seconds.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_seconds: u64,
    /// Interval between liveness probes, in seconds.
    #[serde(default = "default_probe_interval")]
    pub probe_interval_seconds: u64,
    /// Force-close an open channel silent for this many seconds. Unset disables it.
    #[serde(default)]
    pub idle_timeout_seconds: Option<u64>,
    /// Capacity of the command queue feeding the connection manager.
    #[serde(default = "default_command_buffer")]
    pub command_buffer_size: usize,
    /// Inbound frames larger than this are discarded.
    #[serde(default = "default_max_frame_bytes")]
    pub max_frame_bytes: usize,
    /// Reconnect backoff settings.
    #[serde(default)]
    pub reconnect: ReconnectConfig,
    /// Store and alert settings.
    #[serde(default)]
    pub notifications: NotificationStoreConfig,
}

/// Exponential backoff settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconnectConfig {
    /// Delay before the first reconnect, in milliseconds.
    #[serde(default = "default_base_delay")]
    pub base_delay_ms: u64,
    /// Upper bound on any reconnect delay, in milliseconds.
    #[serde(default = "default_max_delay")]
    pub max_delay_ms: u64,
    /// Scheduled reconnects allowed before giving up.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

/// Notification store and ephemeral alert settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationStoreConfig {
    /// Size of the recent-notification window.
    #[serde(default = "default_recent_capacity")]
    pub recent_capacity: usize,
    /// How long an ephemeral alert stays visible, in milliseconds.
    #[serde(default = "default_alert_display")]
    pub alert_display_ms: u64,
    /// Buffer of the announcement broadcast channel.
    #[serde(default = "default_announcement_buffer")]
    pub announcement_buffer: usize,
}

impl RealtimeConfig {
    /// Rejects settings the client cannot run with.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.server_url.trim().is_empty() {
            return Err(AppError::configuration("realtime.server_url is empty"));
        }
        if self.probe_interval_seconds == 0 {
            return Err(AppError::configuration(
                "realtime.probe_interval_seconds must be positive",
            ));
        }
        if self.command_buffer_size == 0 || self.max_frame_bytes == 0 {
            return Err(AppError::configuration(
                "realtime buffer sizes must be positive",
            ));
        }
        if self.reconnect.base_delay_ms > self.reconnect.max_delay_ms {
            return Err(AppError::configuration(format!(
                "realtime.reconnect.base_delay_ms ({}) exceeds max_delay_ms ({})",
                self.reconnect.base_delay_ms, self.reconnect.max_delay_ms
            )));
        }
        if self.notifications.recent_capacity == 0 || self.notifications.announcement_buffer == 0 {
            return Err(AppError::configuration(
                "realtime.notifications capacities must be positive",
            ));
        }
        Ok(())
    }

    /// Connect timeout as a [`Duration`].
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_seconds)
    }

    /// Probe interval as a [`Duration`].
    pub fn probe_interval(&self) -> Duration {
        Duration::from_secs(self.probe_interval_seconds)
    }

    /// Idle timeout as a [`Duration`], if enabled.
    pub fn idle_timeout(&self) -> Option<Duration> {
        self.idle_timeout_seconds
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }
}

impl NotificationStoreConfig {
    /// Alert display time as a [`Duration`].
    pub fn alert_display(&self) -> Duration {
        Duration::from_millis(self.alert_display_ms)
    }
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            server_url: default_server_url(),
            token_param: default_token_param(),
            connect_timeout_seconds: default_connect_timeout(),
            probe_interval_seconds: default_probe_interval(),
            idle_timeout_seconds: None,
            command_buffer_size: default_command_buffer(),
            max_frame_bytes: default_max_frame_bytes(),
            reconnect: ReconnectConfig::default(),
            notifications: NotificationStoreConfig::default(),
        }
    }
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            base_delay_ms: default_base_delay(),
            max_delay_ms: default_max_delay(),
            max_attempts: default_max_attempts(),
        }
    }
}

impl Default for NotificationStoreConfig {
    fn default() -> Self {
        Self {
            recent_capacity: default_recent_capacity(),
            alert_display_ms: default_alert_display(),
            announcement_buffer: default_announcement_buffer(),
        }
    }
}

fn default_server_url() -> String {
    "ws://localhost:8080/api/ws".to_string()
}

fn default_token_param() -> String {
    "token".to_string()
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_probe_interval() -> u64 {
    25
}

fn default_command_buffer() -> usize {
    64
}

fn default_max_frame_bytes() -> usize {
    65_536
}

fn default_base_delay() -> u64 {
    1_000
}

fn default_max_delay() -> u64 {
    30_000
}

fn default_max_attempts() -> u32 {
    10
}

fn default_recent_capacity() -> usize {
    50
}

fn default_alert_display() -> u64 {
    6_000
}

fn default_announcement_buffer() -> usize {
    32
}
