//! Outbound notification channels.
//!
//! The string form of each variant is what gets stored in the
//! `alert_logs.channel` column, so renaming a variant is a data migration.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Chat webhook channel (Discord-style embeds).
pub const CHANNEL_DISCORD: &str = "discord";

/// Email report channel delivered via SMTP.
pub const CHANNEL_EMAIL: &str = "email";

/// A named outbound notification medium.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertChannel {
    Discord,
    Email,
}

impl AlertChannel {
    /// The canonical lowercase name used in storage and on the wire.
    pub fn as_str(self) -> &'static str {
        match self {
            AlertChannel::Discord => CHANNEL_DISCORD,
            AlertChannel::Email => CHANNEL_EMAIL,
        }
    }
}

impl fmt::Display for AlertChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AlertChannel {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            CHANNEL_DISCORD => Ok(AlertChannel::Discord),
            CHANNEL_EMAIL => Ok(AlertChannel::Email),
            other => Err(CoreError::Validation(format!(
                "Unknown notification channel: {other}"
            ))),
        }
    }
}
