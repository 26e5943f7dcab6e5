//! Best-effort notifications: the audit channel, a direct message, or the process log.

use async_trait::async_trait;
use poise::serenity_prelude::{self as serenity, ChannelId, Http, UserId};
use std::sync::Arc;
use tracing::{info, warn};

use crate::error::{BotError, Result};

/// Where a notice should go, tried in the order given
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Destination {
    AuditChannel,
    Direct(UserId),
}

/// Raw delivery, one destination at a time
#[async_trait]
pub trait NoticeSink: Send + Sync {
    async fn send(&self, destination: Destination, text: &str) -> Result<()>;

    /// Whether `destination` is set up at all; unconfigured ones are skipped quietly
    fn configured(&self, _destination: Destination) -> bool {
        true
    }
}

/// Delivers through Discord
pub struct SerenityNoticeSink {
    http: Arc<Http>,
    audit_channel: Option<ChannelId>,
}

impl SerenityNoticeSink {
    pub fn new(http: Arc<Http>, audit_channel: Option<ChannelId>) -> Self {
        Self { http, audit_channel }
    }
}

#[async_trait]
impl NoticeSink for SerenityNoticeSink {
    async fn send(&self, destination: Destination, text: &str) -> Result<()> {
        match destination {
            Destination::AuditChannel => {
                let channel = self.audit_channel.ok_or_else(|| BotError::ConfigValidation {
                    message: "AUDIT_CHANNEL_ID is not set".to_string(),
                })?;
                channel.say(self.http.as_ref(), text).await?;
            }
            Destination::Direct(user_id) => {
                user_id
                    .direct_message(self.http.as_ref(), serenity::CreateMessage::new().content(text))
                    .await?;
            }
        }
        Ok(())
    }

    fn configured(&self, destination: Destination) -> bool {
        match destination {
            Destination::AuditChannel => self.audit_channel.is_some(),
            Destination::Direct(_) => true,
        }
    }
}

/// Tries each destination in turn and falls back to the log. Never fails.
#[derive(Clone)]
pub struct Notifier {
    sink: Arc<dyn NoticeSink>,
}

impl Notifier {
    pub fn new(sink: Arc<dyn NoticeSink>) -> Self {
        Self { sink }
    }

    /// Returns the destination that took the notice, if any
    pub async fn deliver(&self, route: &[Destination], text: &str) -> Option<Destination> {
        for destination in route.iter().filter(|d| self.sink.configured(**d)) {
            match self.sink.send(*destination, text).await {
                Ok(()) => return Some(*destination),
                Err(e) => warn!("Could not deliver notice to {:?}: {}", destination, e),
            }
        }
        info!("{}", text);
        None
    }

    pub async fn audit(&self, text: &str) {
        self.deliver(&[Destination::AuditChannel], text).await;
    }

    pub async fn tell_user(&self, user_id: UserId, text: &str) {
        self.deliver(&[Destination::Direct(user_id)], text).await;
    }
}

/// Audit line for one applied overwrite
pub fn audit_line(role: &str, channel: &str, applied: &impl std::fmt::Display) -> String {
    format!(
        "`{}` [INFO] Role {} | Channel {} | Permissions {}",
        chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC"),
        role,
        channel,
        applied
    )
}
