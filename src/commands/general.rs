use poise::serenity_prelude as serenity;
use tracing::info;

use crate::{Context, Error};

/// Check if the bot is running
#[poise::command(prefix_command, slash_command)]
pub async fn ping(ctx: Context<'_>) -> Result<(), Error> {
    info!("Ping command called by {}", ctx.author().name);
    ctx.send(poise::CreateReply::default()
        .content("Pong! Bot is working!")
        .ephemeral(true))
        .await?;
    Ok(())
}

/// Show help information
#[poise::command(prefix_command, slash_command)]
pub async fn help(ctx: Context<'_>) -> Result<(), Error> {
    let prefix = &ctx.data().config.prefix;
    let embed = serenity::CreateEmbed::new()
        .title("Permission Commands")
        .description("Roles and channels are names or mentions, separated by commas.")
        .field(
            format!("{}set <roles> <channels>", prefix),
            "Pick permissions with buttons and apply them to every role/channel pair",
            false,
        )
        .field(
            format!("{}undo <roles> [channels]", prefix),
            "Restore what the roles had before the first `set` (all channels by default)",
            false,
        )
        .field(
            format!("{}template_save <role> <name>", prefix),
            "Save the role's recorded permissions as a template",
            false,
        )
        .field(
            format!("{}template_apply <role> <name>", prefix),
            "Apply a saved template to a role",
            false,
        )
        .field(format!("{}template_list", prefix), "List saved templates", false)
        .field(format!("{}ping", prefix), "Check if the bot is running", false)
        .color(0x3498db);

    ctx.send(poise::CreateReply::default().embed(embed).ephemeral(true)).await?;
    Ok(())
}
