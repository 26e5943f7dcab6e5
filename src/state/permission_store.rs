use poise::serenity_prelude::{ChannelId, GuildId, RoleId};
use std::sync::Arc;
use tracing::{debug, info};

use super::backend::StoreBackend;
use super::document::{ChannelSnapshots, StoreDocument};
use crate::error::{BotError, Result};
use crate::permissions::OverwriteSettings;

/// Snapshots and templates, held in memory and flushed in full after every change
pub struct PermissionStore {
    document: StoreDocument,
    backend: Box<dyn StoreBackend>,
}

impl PermissionStore {
    /// Load the document through the backend
    pub async fn open(backend: Box<dyn StoreBackend>) -> Result<Self> {
        let document = backend.load().await?;
        info!(
            "Loaded permission store from {} ({} guilds)",
            backend.describe(),
            document.guilds.len()
        );
        Ok(Self { document, backend })
    }

    /// Apply `change` to a copy, flush it, and only then keep it
    async fn commit<F>(&mut self, change: F) -> Result<()>
    where
        F: FnOnce(&mut StoreDocument),
    {
        let mut next = self.document.clone();
        change(&mut next);
        self.backend.save(&next).await?;
        self.document = next;
        Ok(())
    }

    pub fn document(&self) -> &StoreDocument {
        &self.document
    }

    /// Stored pre-change overwrite for a (guild, role, channel) triple
    pub fn snapshot(
        &self,
        guild_id: GuildId,
        role_id: RoleId,
        channel_id: ChannelId,
    ) -> Option<OverwriteSettings> {
        self.document
            .snapshot(
                &guild_id.to_string(),
                &role_id.to_string(),
                &channel_id.to_string(),
            )
            .copied()
    }

    /// Persist `snapshot` unless one already exists for the triple.
    /// Returns whether a new snapshot was written.
    pub async fn record_snapshot_if_absent(
        &mut self,
        guild_id: GuildId,
        role_id: RoleId,
        channel_id: ChannelId,
        snapshot: OverwriteSettings,
    ) -> Result<bool> {
        if self.snapshot(guild_id, role_id, channel_id).is_some() {
            return Ok(false);
        }

        self.commit(|doc| {
            doc.guild_mut(&guild_id.to_string())
                .roles
                .entry(role_id.to_string())
                .or_default()
                .insert(channel_id.to_string(), snapshot);
        })
        .await?;

        debug!(
            "Recorded snapshot for role {} in channel {} (guild {})",
            role_id, channel_id, guild_id
        );
        Ok(true)
    }

    /// Every snapshot recorded for a role in a guild
    pub fn role_snapshots(&self, guild_id: GuildId, role_id: RoleId) -> Option<&ChannelSnapshots> {
        self.document
            .guild(&guild_id.to_string())?
            .roles
            .get(&role_id.to_string())
    }

    /// Copy the role's snapshots into the guild's templates under `name`.
    /// Returns the number of channels saved.
    pub async fn save_template(
        &mut self,
        guild_id: GuildId,
        role_id: RoleId,
        role_name: &str,
        name: &str,
    ) -> Result<usize> {
        let snapshots = match self.role_snapshots(guild_id, role_id) {
            Some(s) if !s.is_empty() => s.clone(),
            _ => {
                return Err(BotError::NoDataToSave {
                    role: role_name.to_string(),
                })
            }
        };
        let count = snapshots.len();

        self.commit(|doc| {
            doc.guild_mut(&guild_id.to_string())
                .templates
                .insert(name.to_string(), snapshots);
        })
        .await?;

        info!(
            "Saved template '{}' from role {} ({} channels, guild {})",
            name, role_id, count, guild_id
        );
        Ok(count)
    }

    pub fn template(&self, guild_id: GuildId, name: &str) -> Result<ChannelSnapshots> {
        self.document
            .guild(&guild_id.to_string())
            .and_then(|g| g.templates.get(name))
            .cloned()
            .ok_or_else(|| BotError::TemplateNotFound {
                name: name.to_string(),
            })
    }

    /// Template names with their channel counts, sorted by name
    pub fn template_names(&self, guild_id: GuildId) -> Vec<(String, usize)> {
        self.document
            .guild(&guild_id.to_string())
            .map(|g| {
                g.templates
                    .iter()
                    .map(|(name, snapshots)| (name.clone(), snapshots.len()))
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Shared permission store type
pub type SharedPermissionStore = Arc<tokio::sync::RwLock<PermissionStore>>;

pub fn create_shared_permission_store(store: PermissionStore) -> SharedPermissionStore {
    Arc::new(tokio::sync::RwLock::new(store))
}
