use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::permissions::OverwriteSettings;

/// Channel ID -> overwrite captured for one role
pub type ChannelSnapshots = BTreeMap<String, OverwriteSettings>;

/// The whole persisted document: guild ID -> guild record.
///
/// On disk every ID is a decimal string:
/// `{ guild_id: { role_id: { channel_id: { flag: bool } }, "templates": { name: { channel_id: {..} } } } }`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StoreDocument {
    pub guilds: BTreeMap<String, GuildRecord>,
}

/// Per-guild state
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GuildRecord {
    /// Saved templates (name -> per-channel snapshots)
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub templates: BTreeMap<String, ChannelSnapshots>,

    /// Snapshots taken before the first change (role ID -> channel snapshots)
    #[serde(flatten)]
    pub roles: BTreeMap<String, ChannelSnapshots>,
}

impl StoreDocument {
    pub fn guild(&self, guild_id: &str) -> Option<&GuildRecord> {
        self.guilds.get(guild_id)
    }

    /// Get or create guild record
    pub fn guild_mut(&mut self, guild_id: &str) -> &mut GuildRecord {
        self.guilds.entry(guild_id.to_string()).or_default()
    }

    pub fn snapshot(&self, guild_id: &str, role_id: &str, channel_id: &str) -> Option<&OverwriteSettings> {
        self.guild(guild_id)?.roles.get(role_id)?.get(channel_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::permissions::{FlagState, PermissionFlag};

    #[test]
    fn test_document_layout() {
        let mut doc = StoreDocument::default();
        let guild = doc.guild_mut("1");
        let snapshot = OverwriteSettings::default().with(PermissionFlag::SendMessages, FlagState::Deny);
        guild
            .roles
            .entry("10".to_string())
            .or_default()
            .insert("100".to_string(), snapshot);
        let copy = guild.roles["10"].clone();
        guild.templates.insert("readonly".to_string(), copy);

        let json = serde_json::to_value(&doc).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "1": {
                    "10": { "100": { "send_messages": false } },
                    "templates": { "readonly": { "100": { "send_messages": false } } }
                }
            })
        );

        let back: StoreDocument = serde_json::from_value(json).unwrap();
        assert_eq!(back, doc);
        assert_eq!(back.snapshot("1", "10", "100"), Some(&snapshot));
        assert!(back.snapshot("1", "10", "200").is_none());
    }

    #[test]
    fn test_guild_without_templates_key() {
        let json = r#"{ "5": { "7": { "9": { "view_channel": true } } } }"#;
        let doc: StoreDocument = serde_json::from_str(json).unwrap();
        let guild = doc.guild("5").unwrap();
        assert!(guild.templates.is_empty());
        assert_eq!(guild.roles.len(), 1);
    }
}
