use poise::serenity_prelude::{ChannelId, GuildId, RoleId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleInfo {
    pub id: RoleId,
    pub name: String,
    /// Hierarchy rank, higher outranks lower
    pub position: u16,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelInfo {
    pub id: ChannelId,
    pub name: String,
}

/// Roles and channels of a guild as seen at the start of a command
#[derive(Debug, Clone)]
pub struct GuildView {
    pub guild_id: GuildId,
    pub roles: Vec<RoleInfo>,
    /// In Discord's display order
    pub channels: Vec<ChannelInfo>,
    /// Position of the bot's highest role (0 when it only has @everyone)
    pub bot_top_position: u16,
}

impl GuildView {
    pub fn role(&self, id: RoleId) -> Option<&RoleInfo> {
        self.roles.iter().find(|r| r.id == id)
    }

    pub fn channel(&self, id: ChannelId) -> Option<&ChannelInfo> {
        self.channels.iter().find(|c| c.id == id)
    }
}
