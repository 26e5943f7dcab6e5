use poise::serenity_prelude as serenity;

use super::permissions::render_report;
use crate::error::{BotError, TargetKind};
use crate::guild::resolve_role;
use crate::{Context, Error};

/// Save a role's recorded permissions as a named template
#[poise::command(
    prefix_command,
    slash_command,
    guild_only,
    required_permissions = "MANAGE_ROLES"
)]
pub async fn template_save(
    ctx: Context<'_>,
    #[description = "Role (name or mention)"] role: String,
    #[description = "Template name"] name: String,
) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("This command must be used in a guild")?;
    let data = ctx.data();

    let view = data.guild_api.guild_view(guild_id).await?;
    let role = resolve_role(&view, role.trim()).ok_or(BotError::NoValidTargets {
        kind: TargetKind::Role,
    })?;

    let channels = data
        .permission_manager
        .save_template(guild_id, role, &name)
        .await?;

    ctx.say(format!(
        "[SUCCESS] Template '{}' saved for {} ({} channels)",
        name, role.name, channels
    ))
    .await?;
    Ok(())
}

/// Apply a saved template to a role
#[poise::command(
    prefix_command,
    slash_command,
    guild_only,
    required_permissions = "MANAGE_ROLES",
    required_bot_permissions = "MANAGE_ROLES"
)]
pub async fn template_apply(
    ctx: Context<'_>,
    #[description = "Role (name or mention)"] role: String,
    #[description = "Template name"] name: String,
) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("This command must be used in a guild")?;
    let data = ctx.data();

    let view = data.guild_api.guild_view(guild_id).await?;
    let role = resolve_role(&view, role.trim()).ok_or(BotError::NoValidTargets {
        kind: TargetKind::Role,
    })?;

    let report = data
        .permission_manager
        .apply_template(data.guild_api.as_ref(), &view, role, &name)
        .await?;

    if report.outcomes.is_empty() {
        ctx.say(format!(
            "[INFO] None of the channels in template '{}' exist anymore.",
            name
        ))
        .await?;
    } else {
        let action = format!("Applied template '{}' to", name);
        ctx.say(render_report(&report, &action)).await?;
    }
    Ok(())
}

/// List this server's saved templates
#[poise::command(prefix_command, slash_command, guild_only)]
pub async fn template_list(ctx: Context<'_>) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("This command must be used in a guild")?;
    let templates = ctx
        .data()
        .permission_manager
        .store()
        .read()
        .await
        .template_names(guild_id);

    if templates.is_empty() {
        ctx.say("[INFO] No templates saved yet. Use `template_save <role> <name>`.")
            .await?;
        return Ok(());
    }

    let mut embed = serenity::CreateEmbed::new()
        .title("Permission Templates")
        .color(0x3498db);
    for (name, channels) in templates.iter().take(25) {
        embed = embed.field(name, format!("{} channels", channels), true);
    }

    ctx.send(poise::CreateReply::default().embed(embed)).await?;
    Ok(())
}
