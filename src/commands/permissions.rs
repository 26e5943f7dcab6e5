use tracing::info;

use crate::error::BotError;
use crate::guild::{ensure_within_hierarchy, resolve_channels, resolve_roles, ChannelInfo, GuildView};
use crate::managers::BulkReport;
use crate::selector::collect_selection;
use crate::{Context, Error};

/// Discord rejects messages over 2000 characters
const MAX_REPLY_LEN: usize = 1900;

/// One line per pair, `[SUCCESS] <action> <role> in <channel>` or `[ERROR] ...`
pub(crate) fn render_report(report: &BulkReport, action: &str) -> String {
    let mut lines: Vec<String> = report
        .outcomes
        .iter()
        .map(|o| match &o.error {
            None => format!("[SUCCESS] {} {} in {}", action, o.role, o.channel),
            Some(e) => format!("[ERROR] Failed for {} in {}: {}", o.role, o.channel, e),
        })
        .collect();

    if report.skipped > 0 {
        lines.push(format!("[INFO] Skipped {} without saved data", report.skipped));
    }

    let mut response = String::new();
    for (i, line) in lines.iter().enumerate() {
        if response.len() + line.len() + 1 > MAX_REPLY_LEN {
            response.push_str(&format!("... and {} more", lines.len() - i));
            break;
        }
        response.push_str(line);
        response.push('\n');
    }
    response
}

/// Channels an undo covers: the given list, or every channel when it is missing or blank
pub(crate) fn undo_targets(view: &GuildView, channels: Option<&str>) -> Result<Vec<ChannelInfo>, BotError> {
    match channels.map(str::trim) {
        Some(list) if !list.is_empty() => resolve_channels(view, list),
        _ => Ok(view.channels.clone()),
    }
}

/// Grant or revoke permissions for roles on channels, picked with buttons
#[poise::command(
    prefix_command,
    slash_command,
    guild_only,
    required_permissions = "MANAGE_ROLES",
    required_bot_permissions = "MANAGE_ROLES"
)]
pub async fn set(
    ctx: Context<'_>,
    #[description = "Roles (names or mentions, comma-separated)"] roles: String,
    #[description = "Channels (names or mentions, comma-separated)"]
    #[rest]
    channels: String,
) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("This command must be used in a guild")?;
    let data = ctx.data();

    let view = data.guild_api.guild_view(guild_id).await?;
    let roles = resolve_roles(&view, &roles)?;
    let channels = resolve_channels(&view, &channels)?;
    ensure_within_hierarchy(&roles, view.bot_top_position)?;

    let role_names: Vec<&str> = roles.iter().map(|r| r.name.as_str()).collect();
    let prompt = format!("[INFO] Choose permissions for roles [{}]", role_names.join(", "));
    let selection = collect_selection(ctx, &prompt, data.config.selection_timeout).await?;

    info!(
        "{} applying {} to {} roles x {} channels",
        ctx.author().name,
        selection,
        roles.len(),
        channels.len()
    );

    let report = data
        .permission_manager
        .apply_selection(
            data.guild_api.as_ref(),
            guild_id,
            &roles,
            &channels,
            view.bot_top_position,
            &selection,
            ctx.author().id,
        )
        .await?;

    ctx.say(render_report(&report, "Applied permissions for")).await?;
    Ok(())
}

/// Restore the permissions saved before the first `set` (all channels if none given)
#[poise::command(
    prefix_command,
    slash_command,
    guild_only,
    required_permissions = "MANAGE_ROLES",
    required_bot_permissions = "MANAGE_ROLES"
)]
pub async fn undo(
    ctx: Context<'_>,
    #[description = "Roles (names or mentions, comma-separated)"] roles: String,
    #[description = "Channels (defaults to every channel)"]
    #[rest]
    channels: Option<String>,
) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("This command must be used in a guild")?;
    let data = ctx.data();

    let view = data.guild_api.guild_view(guild_id).await?;
    let roles = resolve_roles(&view, &roles)?;
    let channels = undo_targets(&view, channels.as_deref())?;

    let report = data
        .permission_manager
        .revert(data.guild_api.as_ref(), guild_id, &roles, &channels)
        .await;

    if report.outcomes.is_empty() {
        ctx.say("[INFO] No saved permissions to revert for those roles and channels.")
            .await?;
    } else {
        ctx.say(render_report(&report, "Reverted permissions for")).await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TargetKind;
    use crate::managers::PairOutcome;
    use poise::serenity_prelude::{ChannelId, GuildId};

    fn view() -> GuildView {
        GuildView {
            guild_id: GuildId::new(1),
            roles: Vec::new(),
            channels: vec![
                ChannelInfo { id: ChannelId::new(100), name: "general".into() },
                ChannelInfo { id: ChannelId::new(101), name: "rules".into() },
            ],
            bot_top_position: 3,
        }
    }

    #[test]
    fn test_undo_defaults_to_every_channel() {
        let view = view();
        assert_eq!(undo_targets(&view, None).unwrap(), view.channels);
        assert_eq!(undo_targets(&view, Some("   ")).unwrap(), view.channels);
    }

    #[test]
    fn test_undo_with_channel_list() {
        let view = view();
        let targets = undo_targets(&view, Some("#rules")).unwrap();
        assert_eq!(targets, vec![view.channels[1].clone()]);

        assert!(matches!(
            undo_targets(&view, Some("ghost")),
            Err(BotError::NoValidTargets { kind: TargetKind::Channel })
        ));
    }

    fn outcome(channel: &str, error: Option<&str>) -> PairOutcome {
        PairOutcome {
            role: "Member".to_string(),
            channel: channel.to_string(),
            error: error.map(String::from),
        }
    }

    #[test]
    fn test_render_report() {
        let report = BulkReport {
            outcomes: vec![outcome("general", None), outcome("rules", Some("Missing Access"))],
            skipped: 2,
        };
        let text = render_report(&report, "Applied permissions for");
        assert_eq!(
            text,
            "[SUCCESS] Applied permissions for Member in general\n\
             [ERROR] Failed for Member in rules: Missing Access\n\
             [INFO] Skipped 2 without saved data\n"
        );
    }

    #[test]
    fn test_render_report_truncates() {
        let report = BulkReport {
            outcomes: (0..200).map(|i| outcome(&format!("channel-{}", i), None)).collect(),
            skipped: 0,
        };
        let text = render_report(&report, "Reverted permissions for");
        assert!(text.len() <= MAX_REPLY_LEN + 32);
        assert!(text.ends_with("more"));
    }
}
