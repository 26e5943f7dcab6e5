//! Turns user-typed role and channel references into guild entities.
//!
//! Roles resolve by exact name, then by `<@&id>` mention or bare ID.
//! Channels resolve by `<#id>` mention, then exact name, then the first channel
//! whose name contains the token (case-insensitive). Tokens that match nothing are dropped.

use poise::serenity_prelude::{ChannelId, RoleId};
use tracing::debug;

use super::view::{ChannelInfo, GuildView, RoleInfo};
use crate::error::{BotError, Result, TargetKind};

fn split_tokens(input: &str) -> impl Iterator<Item = &str> {
    input.split(',').map(str::trim).filter(|t| !t.is_empty())
}

/// `<@&123>`, `@&123` or `123`
fn parse_role_reference(token: &str) -> Option<RoleId> {
    let digits = token.trim_matches(|c| matches!(c, '<' | '@' | '&' | '>'));
    digits.parse::<u64>().ok().filter(|id| *id != 0).map(RoleId::new)
}

/// Only the full `<#123>` form counts as a mention
fn parse_channel_mention(token: &str) -> Option<Option<ChannelId>> {
    let inner = token.strip_prefix("<#")?.strip_suffix('>')?;
    Some(inner.parse::<u64>().ok().filter(|id| *id != 0).map(ChannelId::new))
}

pub fn resolve_role<'a>(view: &'a GuildView, token: &str) -> Option<&'a RoleInfo> {
    view.roles
        .iter()
        .find(|r| r.name == token)
        .or_else(|| parse_role_reference(token).and_then(|id| view.role(id)))
}

pub fn resolve_channel<'a>(view: &'a GuildView, token: &str) -> Option<&'a ChannelInfo> {
    if let Some(mention) = parse_channel_mention(token) {
        return mention.and_then(|id| view.channel(id));
    }

    if let Some(channel) = view.channels.iter().find(|c| c.name == token) {
        return Some(channel);
    }

    // Typed "#general" without Discord turning it into a mention
    let name = token.strip_prefix('#').unwrap_or(token);
    if name.is_empty() {
        return None;
    }
    if let Some(channel) = view.channels.iter().find(|c| c.name == name) {
        return Some(channel);
    }

    let needle = name.to_lowercase();
    view.channels
        .iter()
        .find(|c| c.name.to_lowercase().contains(&needle))
}

/// Resolve a comma-separated role list. Duplicates collapse to one entry.
pub fn resolve_roles(view: &GuildView, input: &str) -> Result<Vec<RoleInfo>> {
    let mut roles: Vec<RoleInfo> = Vec::new();
    for token in split_tokens(input) {
        match resolve_role(view, token) {
            Some(role) if !roles.iter().any(|r| r.id == role.id) => roles.push(role.clone()),
            Some(_) => {}
            None => debug!("Dropping unresolved role reference '{}'", token),
        }
    }

    if roles.is_empty() {
        return Err(BotError::NoValidTargets {
            kind: TargetKind::Role,
        });
    }
    Ok(roles)
}

/// Resolve a comma-separated channel list. Duplicates collapse to one entry.
pub fn resolve_channels(view: &GuildView, input: &str) -> Result<Vec<ChannelInfo>> {
    let mut channels: Vec<ChannelInfo> = Vec::new();
    for token in split_tokens(input) {
        match resolve_channel(view, token) {
            Some(channel) if !channels.iter().any(|c| c.id == channel.id) => {
                channels.push(channel.clone())
            }
            Some(_) => {}
            None => debug!("Dropping unresolved channel reference '{}'", token),
        }
    }

    if channels.is_empty() {
        return Err(BotError::NoValidTargets {
            kind: TargetKind::Channel,
        });
    }
    Ok(channels)
}

/// Fails on the first role at or above the bot's highest role
pub fn ensure_within_hierarchy(roles: &[RoleInfo], bot_top_position: u16) -> Result<()> {
    match roles.iter().find(|r| r.position >= bot_top_position) {
        Some(role) => Err(BotError::HierarchyViolation {
            role: role.name.clone(),
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use poise::serenity_prelude::GuildId;

    fn view() -> GuildView {
        GuildView {
            guild_id: GuildId::new(1),
            roles: vec![
                RoleInfo { id: RoleId::new(10), name: "Member".into(), position: 1 },
                RoleInfo { id: RoleId::new(11), name: "Mod".into(), position: 5 },
            ],
            channels: vec![
                ChannelInfo { id: ChannelId::new(100), name: "general".into() },
                ChannelInfo { id: ChannelId::new(101), name: "rules".into() },
                ChannelInfo { id: ChannelId::new(102), name: "general-voice".into() },
                ChannelInfo { id: ChannelId::new(103), name: "Off-Topic".into() },
            ],
            bot_top_position: 3,
        }
    }

    #[test]
    fn test_roles_by_name_and_mention() {
        let view = view();
        let roles = resolve_roles(&view, "Member, <@&11>, Ghost, 11").unwrap();
        let ids: Vec<u64> = roles.iter().map(|r| r.id.get()).collect();
        assert_eq!(ids, vec![10, 11]);
    }

    #[test]
    fn test_no_roles() {
        let err = resolve_roles(&view(), "Ghost,,<@&999>").unwrap_err();
        assert!(matches!(err, BotError::NoValidTargets { kind: TargetKind::Role }));
    }

    #[test]
    fn test_mention_beats_fuzzy_name() {
        let view = view();
        // 102's name contains "general", but the mention wins.
        assert_eq!(resolve_channel(&view, "<#102>").unwrap().id.get(), 102);
        // A mention of a channel outside the guild does not fall back to names.
        assert!(resolve_channel(&view, "<#999>").is_none());
    }

    #[test]
    fn test_channel_name_matching() {
        let view = view();
        assert_eq!(resolve_channel(&view, "general").unwrap().id.get(), 100);
        assert_eq!(resolve_channel(&view, "#rules").unwrap().id.get(), 101);
        assert_eq!(resolve_channel(&view, "off").unwrap().id.get(), 103);
        assert_eq!(resolve_channel(&view, "VOICE").unwrap().id.get(), 102);
        assert!(resolve_channel(&view, "announcements").is_none());
        // Nothing left to match once the '#' is gone.
        assert!(resolve_channel(&view, "#").is_none());
        assert!(matches!(
            resolve_channels(&view, "#, #"),
            Err(BotError::NoValidTargets { kind: TargetKind::Channel })
        ));
    }

    #[test]
    fn test_channels_list() {
        let view = view();
        let channels = resolve_channels(&view, "#general,#rules, general").unwrap();
        let ids: Vec<u64> = channels.iter().map(|c| c.id.get()).collect();
        assert_eq!(ids, vec![100, 101]);

        assert!(matches!(
            resolve_channels(&view, "nothing-here"),
            Err(BotError::NoValidTargets { kind: TargetKind::Channel })
        ));
    }

    #[test]
    fn test_hierarchy() {
        let view = view();
        let member = resolve_roles(&view, "Member").unwrap();
        assert!(ensure_within_hierarchy(&member, view.bot_top_position).is_ok());

        let both = resolve_roles(&view, "Member,Mod").unwrap();
        match ensure_within_hierarchy(&both, view.bot_top_position) {
            Err(BotError::HierarchyViolation { role }) => assert_eq!(role, "Mod"),
            other => panic!("unexpected {:?}", other),
        }

        // Equal rank is not manageable either.
        let equal = vec![RoleInfo { id: RoleId::new(12), name: "Bot".into(), position: 3 }];
        assert!(ensure_within_hierarchy(&equal, 3).is_err());
    }
}
