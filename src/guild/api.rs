use async_trait::async_trait;
use poise::serenity_prelude::{self as serenity, ChannelId, GuildId, Http, RoleId, UserId};
use std::sync::Arc;
use tracing::debug;

use super::view::{ChannelInfo, GuildView, RoleInfo};
use crate::error::{BotError, Result};
use crate::permissions::OverwriteSettings;

/// The Discord calls the permission commands need
#[async_trait]
pub trait GuildApi: Send + Sync {
    /// Fetch the guild's roles, channels and the bot's rank
    async fn guild_view(&self, guild_id: GuildId) -> Result<GuildView>;

    /// Current overwrite for `role_id` on `channel_id` (all `Inherit` when there is none)
    async fn current_overwrite(&self, channel_id: ChannelId, role_id: RoleId) -> Result<OverwriteSettings>;

    /// Replace the role's overwrite on the channel with `settings`
    async fn apply_overwrite(
        &self,
        channel_id: ChannelId,
        role_id: RoleId,
        settings: &OverwriteSettings,
    ) -> Result<()>;
}

/// `GuildApi` backed by the Discord HTTP API
pub struct SerenityGuildApi {
    http: Arc<Http>,
    bot_id: UserId,
}

impl SerenityGuildApi {
    pub fn new(http: Arc<Http>, bot_id: UserId) -> Self {
        Self { http, bot_id }
    }
}

#[async_trait]
impl GuildApi for SerenityGuildApi {
    async fn guild_view(&self, guild_id: GuildId) -> Result<GuildView> {
        let http = self.http.as_ref();

        let roles = guild_id.roles(http).await?;
        let bot_member = guild_id.member(http, self.bot_id).await?;
        let bot_top_position = bot_member
            .roles
            .iter()
            .filter_map(|id| roles.get(id))
            .map(|r| r.position)
            .max()
            .unwrap_or(0);

        let mut role_infos: Vec<RoleInfo> = roles
            .values()
            .map(|r| RoleInfo {
                id: r.id,
                name: r.name.clone(),
                position: r.position,
            })
            .collect();
        role_infos.sort_by(|a, b| b.position.cmp(&a.position).then(a.id.cmp(&b.id)));

        let mut channels: Vec<serenity::GuildChannel> =
            guild_id.channels(http).await?.into_values().collect();
        channels.sort_by(|a, b| a.position.cmp(&b.position).then(a.id.cmp(&b.id)));

        debug!(
            "Fetched guild {}: {} roles, {} channels, bot rank {}",
            guild_id,
            role_infos.len(),
            channels.len(),
            bot_top_position
        );

        Ok(GuildView {
            guild_id,
            roles: role_infos,
            channels: channels
                .into_iter()
                .map(|c| ChannelInfo { id: c.id, name: c.name })
                .collect(),
            bot_top_position,
        })
    }

    async fn current_overwrite(&self, channel_id: ChannelId, role_id: RoleId) -> Result<OverwriteSettings> {
        let channel = channel_id
            .to_channel(self.http.as_ref())
            .await?
            .guild()
            .ok_or_else(|| BotError::PlatformCallFailure {
                message: format!("Channel {} is not a guild channel", channel_id),
            })?;

        Ok(channel
            .permission_overwrites
            .iter()
            .find(|ow| matches!(ow.kind, serenity::PermissionOverwriteType::Role(r) if r == role_id))
            .map(|ow| OverwriteSettings::from_bits(ow.allow, ow.deny))
            .unwrap_or_default())
    }

    async fn apply_overwrite(
        &self,
        channel_id: ChannelId,
        role_id: RoleId,
        settings: &OverwriteSettings,
    ) -> Result<()> {
        // An all-Inherit record still writes an (empty) overwrite rather than deleting it.
        let kind = serenity::PermissionOverwriteType::Role(role_id);
        let (allow, deny) = settings.to_bits();
        channel_id
            .create_permission(
                self.http.as_ref(),
                serenity::PermissionOverwrite { allow, deny, kind },
            )
            .await?;
        Ok(())
    }
}

#[cfg(test)]
pub mod testing {
    use super::*;
    use parking_lot::Mutex;
    use std::collections::{HashMap, HashSet};

    /// In-memory guild: overwrites keyed by (channel, role)
    pub struct FakeGuildApi {
        pub view: GuildView,
        pub overwrites: Mutex<HashMap<(ChannelId, RoleId), OverwriteSettings>>,
        pub failing_channels: HashSet<ChannelId>,
        pub applied: Mutex<Vec<(ChannelId, RoleId, OverwriteSettings)>>,
    }

    impl FakeGuildApi {
        pub fn new(view: GuildView) -> Self {
            Self {
                view,
                overwrites: Mutex::new(HashMap::new()),
                failing_channels: HashSet::new(),
                applied: Mutex::new(Vec::new()),
            }
        }

        pub fn set_live(&self, channel_id: ChannelId, role_id: RoleId, settings: OverwriteSettings) {
            self.overwrites.lock().insert((channel_id, role_id), settings);
        }

        pub fn live(&self, channel_id: ChannelId, role_id: RoleId) -> OverwriteSettings {
            self.overwrites
                .lock()
                .get(&(channel_id, role_id))
                .copied()
                .unwrap_or_default()
        }

        pub fn mutation_count(&self) -> usize {
            self.applied.lock().len()
        }
    }

    #[async_trait]
    impl GuildApi for FakeGuildApi {
        async fn guild_view(&self, _guild_id: GuildId) -> Result<GuildView> {
            Ok(self.view.clone())
        }

        async fn current_overwrite(&self, channel_id: ChannelId, role_id: RoleId) -> Result<OverwriteSettings> {
            Ok(self.live(channel_id, role_id))
        }

        async fn apply_overwrite(
            &self,
            channel_id: ChannelId,
            role_id: RoleId,
            settings: &OverwriteSettings,
        ) -> Result<()> {
            if self.failing_channels.contains(&channel_id) {
                return Err(BotError::PlatformCallFailure {
                    message: "Unknown Channel".to_string(),
                });
            }
            self.set_live(channel_id, role_id, *settings);
            self.applied.lock().push((channel_id, role_id, *settings));
            Ok(())
        }
    }
}
