//! Runtime tunables of the coordinator.

use std::time::Duration;

use thiserror::Error;

use crate::domain::{DEFAULT_TYPING_TIMEOUT, value_object::DEFAULT_MAX_MESSAGE_LENGTH};

/// Upper bound for a single history page
pub const MAX_PAGE_SIZE: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{0} must be greater than zero")]
    Zero(&'static str),

    #[error(
        "sweep interval ({sweep:?}) must not exceed half of the typing timeout ({timeout:?})"
    )]
    SweepTooSlow { sweep: Duration, timeout: Duration },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatConfig {
    /// How long a typing indicator stays live without a refresh
    pub typing_timeout: Duration,
    /// Period of the typing expiry sweep
    pub sweep_interval: Duration,
    /// Bound on a single socket write
    pub delivery_timeout: Duration,
    /// Maximum message body length, in chars
    pub max_message_length: usize,
    /// Number of messages sent to a connection when it joins a room
    pub backfill_limit: usize,
    /// Capacity of each connection's outbound queue
    pub outbound_queue_capacity: usize,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            typing_timeout: DEFAULT_TYPING_TIMEOUT,
            sweep_interval: DEFAULT_TYPING_TIMEOUT / 4,
            delivery_timeout: Duration::from_secs(5),
            max_message_length: DEFAULT_MAX_MESSAGE_LENGTH,
            backfill_limit: 50,
            outbound_queue_capacity: 256,
        }
    }
}

impl ChatConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.typing_timeout.is_zero() {
            return Err(ConfigError::Zero("typing timeout"));
        }
        if self.sweep_interval.is_zero() {
            return Err(ConfigError::Zero("sweep interval"));
        }
        if self.delivery_timeout.is_zero() {
            return Err(ConfigError::Zero("delivery timeout"));
        }
        if self.max_message_length == 0 {
            return Err(ConfigError::Zero("max message length"));
        }
        if self.backfill_limit == 0 {
            return Err(ConfigError::Zero("backfill limit"));
        }
        if self.outbound_queue_capacity == 0 {
            return Err(ConfigError::Zero("outbound queue capacity"));
        }
        // Expiry broadcasts must fire within timeout/2 of the deadline
        if self.sweep_interval > self.typing_timeout / 2 {
            return Err(ConfigError::SweepTooSlow {
                sweep: self.sweep_interval,
                timeout: self.typing_timeout,
            });
        }
        Ok(())
    }
}
