use poise::serenity_prelude::{ChannelId, Permissions};
use std::time::Duration;

use crate::error::{BotError, Result};

pub const DEFAULT_DATA_FILE: &str = "permissions_data.json";
pub const DEFAULT_PREFIX: &str = ".";
pub const DEFAULT_SELECTION_TIMEOUT_SECS: u64 = 180;

/// Runtime settings, read from the environment (and `.env`)
#[derive(Debug, Clone)]
pub struct BotConfig {
    pub token: String,
    /// JSON file holding snapshots and templates
    pub data_file: String,
    /// Where audit records go; `None` logs them instead
    pub audit_channel: Option<ChannelId>,
    pub prefix: String,
    /// How long the permission buttons stay live
    pub selection_timeout: Duration,
}

impl BotConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let token = lookup("DISCORD_TOKEN")
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| BotError::ConfigValidation {
                message: "Missing DISCORD_TOKEN environment variable".to_string(),
            })?;

        Ok(Self {
            token,
            data_file: lookup("PERMISSIONS_DATA_FILE")
                .unwrap_or_else(|| DEFAULT_DATA_FILE.to_string()),
            audit_channel: lookup("AUDIT_CHANNEL_ID")
                .and_then(|s| s.trim().parse::<u64>().ok())
                .filter(|id| *id != 0)
                .map(ChannelId::new),
            prefix: lookup("COMMAND_PREFIX")
                .filter(|p| !p.is_empty())
                .unwrap_or_else(|| DEFAULT_PREFIX.to_string()),
            selection_timeout: Duration::from_secs(
                lookup("SELECTION_TIMEOUT_SECS")
                    .and_then(|s| s.trim().parse().ok())
                    .filter(|secs| *secs > 0)
                    .unwrap_or(DEFAULT_SELECTION_TIMEOUT_SECS),
            ),
        })
    }
}

/// Decode the application ID from the token's first segment, if it looks like one
pub fn application_id_from_token(token: &str) -> Option<String> {
    use base64::Engine;

    let first = token.split('.').next()?;
    // Discord tokens use URL-safe base64 without padding
    let decoded = base64::engine::general_purpose::STANDARD_NO_PAD
        .decode(first)
        .or_else(|_| base64::engine::general_purpose::URL_SAFE_NO_PAD.decode(first))
        .ok()?;
    let id = String::from_utf8(decoded).ok()?;
    (!id.is_empty() && id.chars().all(|c| c.is_ascii_digit())).then_some(id)
}

/// OAuth2 link that adds the bot with administrator rights
pub fn invite_url(client_id: u64) -> String {
    format!(
        "https://discord.com/api/oauth2/authorize?client_id={}&permissions={}&scope={}",
        client_id,
        Permissions::ADMINISTRATOR.bits(),
        urlencoding::encode("bot applications.commands")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = BotConfig::from_lookup(lookup(&[("DISCORD_TOKEN", "abc")])).unwrap();
        assert_eq!(config.data_file, DEFAULT_DATA_FILE);
        assert_eq!(config.prefix, ".");
        assert_eq!(config.audit_channel, None);
        assert_eq!(config.selection_timeout, Duration::from_secs(180));
    }

    #[test]
    fn test_overrides() {
        let config = BotConfig::from_lookup(lookup(&[
            ("DISCORD_TOKEN", "abc"),
            ("PERMISSIONS_DATA_FILE", "state/perms.json"),
            ("AUDIT_CHANNEL_ID", "123456789012345678"),
            ("COMMAND_PREFIX", "!"),
            ("SELECTION_TIMEOUT_SECS", "60"),
        ]))
        .unwrap();
        assert_eq!(config.data_file, "state/perms.json");
        assert_eq!(config.audit_channel, Some(ChannelId::new(123456789012345678)));
        assert_eq!(config.prefix, "!");
        assert_eq!(config.selection_timeout, Duration::from_secs(60));
    }

    #[test]
    fn test_missing_token() {
        assert!(matches!(
            BotConfig::from_lookup(lookup(&[("AUDIT_CHANNEL_ID", "1")])),
            Err(BotError::ConfigValidation { .. })
        ));
    }

    #[test]
    fn test_bad_audit_channel_is_ignored() {
        let config = BotConfig::from_lookup(lookup(&[
            ("DISCORD_TOKEN", "abc"),
            ("AUDIT_CHANNEL_ID", "not-a-number"),
        ]))
        .unwrap();
        assert_eq!(config.audit_channel, None);
    }

    #[test]
    fn test_application_id_from_token() {
        // "123456789012345678" base64-encoded without padding
        let token = "MTIzNDU2Nzg5MDEyMzQ1Njc4.GxYz.signature";
        assert_eq!(
            application_id_from_token(token).as_deref(),
            Some("123456789012345678")
        );
        assert_eq!(application_id_from_token("not base64!"), None);
    }

    #[test]
    fn test_invite_url() {
        assert_eq!(
            invite_url(42),
            "https://discord.com/api/oauth2/authorize?client_id=42&permissions=8&scope=bot%20applications.commands"
        );
    }
}
