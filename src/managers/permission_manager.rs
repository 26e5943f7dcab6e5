use poise::serenity_prelude::{ChannelId, GuildId, UserId};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::error::{BotError, Result};
use crate::guild::{ensure_within_hierarchy, ChannelInfo, GuildApi, GuildView, RoleInfo};
use crate::notify::{audit_line, Notifier};
use crate::permissions::OverwriteSettings;
use crate::state::SharedPermissionStore;

/// What happened to one (role, channel) pair
#[derive(Debug, Clone)]
pub struct PairOutcome {
    pub role: String,
    pub channel: String,
    pub error: Option<String>,
}

impl PairOutcome {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Result of a bulk apply/revert/template run
#[derive(Debug, Clone, Default)]
pub struct BulkReport {
    pub outcomes: Vec<PairOutcome>,
    /// Pairs left alone (no snapshot, or channel gone)
    pub skipped: usize,
}

impl BulkReport {
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }

    fn push_ok(&mut self, role: &str, channel: &str) {
        self.outcomes.push(PairOutcome {
            role: role.to_string(),
            channel: channel.to_string(),
            error: None,
        });
    }

    fn push_err(&mut self, role: &str, channel: &str, e: &BotError) {
        self.outcomes.push(PairOutcome {
            role: role.to_string(),
            channel: channel.to_string(),
            error: Some(e.to_string()),
        });
    }
}

/// Applies, reverts and replays role overwrites, keeping the store in step
pub struct PermissionManager {
    store: SharedPermissionStore,
    notifier: Notifier,
}

impl PermissionManager {
    pub fn new(store: SharedPermissionStore, notifier: Notifier) -> Self {
        Self { store, notifier }
    }

    pub fn store(&self) -> &SharedPermissionStore {
        &self.store
    }

    /// Persist the pre-change overwrite for the triple if none is stored yet
    async fn snapshot_before_change(
        &self,
        api: &dyn GuildApi,
        guild_id: GuildId,
        role: &RoleInfo,
        channel: &ChannelInfo,
    ) -> Result<()> {
        if self.store.read().await.snapshot(guild_id, role.id, channel.id).is_some() {
            return Ok(());
        }

        let current = api.current_overwrite(channel.id, role.id).await?;
        let mut store = self.store.write().await;
        if store
            .record_snapshot_if_absent(guild_id, role.id, channel.id, current)
            .await?
        {
            debug!(
                "Captured {} for role '{}' in #{} before change",
                current, role.name, channel.name
            );
        }
        Ok(())
    }

    /// Apply `selection` to every (role, channel) pair.
    ///
    /// Fails up front when a role is at or above the bot or nothing was selected;
    /// after that, each pair succeeds or fails on its own.
    pub async fn apply_selection(
        &self,
        api: &dyn GuildApi,
        guild_id: GuildId,
        roles: &[RoleInfo],
        channels: &[ChannelInfo],
        bot_top_position: u16,
        selection: &OverwriteSettings,
        invoker: UserId,
    ) -> Result<BulkReport> {
        ensure_within_hierarchy(roles, bot_top_position)?;
        if selection.is_empty() {
            return Err(BotError::NoSelection);
        }

        let mut report = BulkReport::default();
        for role in roles {
            for channel in channels {
                let result = match self.snapshot_before_change(api, guild_id, role, channel).await {
                    Ok(()) => api.apply_overwrite(channel.id, role.id, selection).await,
                    Err(e) => Err(e),
                };

                match result {
                    Ok(()) => {
                        info!(
                            "Applied {} for role '{}' in #{} (guild {})",
                            selection, role.name, channel.name, guild_id
                        );
                        report.push_ok(&role.name, &channel.name);
                        self.notifier
                            .audit(&audit_line(&role.name, &channel.name, selection))
                            .await;
                    }
                    Err(e) => {
                        error!(
                            "Failed to apply permissions for role '{}' in #{}: {}",
                            role.name, channel.name, e
                        );
                        report.push_err(&role.name, &channel.name, &e);
                        self.notifier
                            .tell_user(invoker, &format!("[EXCEPTION] {}", e))
                            .await;
                    }
                }
            }
        }

        Ok(report)
    }

    /// Put back the stored snapshot for every pair that has one
    pub async fn revert(
        &self,
        api: &dyn GuildApi,
        guild_id: GuildId,
        roles: &[RoleInfo],
        channels: &[ChannelInfo],
    ) -> BulkReport {
        let mut report = BulkReport::default();
        for role in roles {
            for channel in channels {
                let snapshot = self.store.read().await.snapshot(guild_id, role.id, channel.id);
                let Some(snapshot) = snapshot else {
                    debug!("No snapshot for role '{}' in #{}, skipping", role.name, channel.name);
                    report.skipped += 1;
                    continue;
                };

                match api.apply_overwrite(channel.id, role.id, &snapshot).await {
                    Ok(()) => {
                        info!("Reverted role '{}' in #{} to {}", role.name, channel.name, snapshot);
                        report.push_ok(&role.name, &channel.name);
                    }
                    Err(e) => {
                        error!("Failed to revert role '{}' in #{}: {}", role.name, channel.name, e);
                        report.push_err(&role.name, &channel.name, &e);
                    }
                }
            }
        }
        report
    }

    /// Save the role's snapshots as template `name`. Returns the channel count.
    pub async fn save_template(&self, guild_id: GuildId, role: &RoleInfo, name: &str) -> Result<usize> {
        self.store
            .write()
            .await
            .save_template(guild_id, role.id, &role.name, name)
            .await
    }

    /// Replay template `name` onto `role`. Channels that no longer exist are skipped.
    pub async fn apply_template(
        &self,
        api: &dyn GuildApi,
        view: &GuildView,
        role: &RoleInfo,
        name: &str,
    ) -> Result<BulkReport> {
        let template = self.store.read().await.template(view.guild_id, name)?;

        let mut report = BulkReport::default();
        for (channel_key, settings) in &template {
            let channel = channel_key
                .parse::<u64>()
                .ok()
                .filter(|id| *id != 0)
                .and_then(|id| view.channel(ChannelId::new(id)));
            let Some(channel) = channel else {
                warn!("Template '{}' references missing channel {}, skipping", name, channel_key);
                report.skipped += 1;
                continue;
            };

            match api.apply_overwrite(channel.id, role.id, settings).await {
                Ok(()) => {
                    info!("Applied template '{}' to role '{}' in #{}", name, role.name, channel.name);
                    report.push_ok(&role.name, &channel.name);
                }
                Err(e) => {
                    error!("Failed to apply template '{}' in #{}: {}", name, channel.name, e);
                    report.push_err(&role.name, &channel.name, &e);
                }
            }
        }

        Ok(report)
    }
}

/// Shared permission manager type. The manager holds no mutable state of its own.
pub type SharedPermissionManager = Arc<PermissionManager>;

pub fn create_shared_permission_manager(
    store: SharedPermissionStore,
    notifier: Notifier,
) -> SharedPermissionManager {
    Arc::new(PermissionManager::new(store, notifier))
}
