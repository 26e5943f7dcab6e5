use anyhow::Result;
use clap::Parser;
use dotenv::dotenv;
use poise::serenity_prelude as serenity;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::filter::LevelFilter;

/// Discord bot that sets, reverts and templates role permissions on channels
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Log verbosity (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: LevelFilter,

    /// Keep snapshots and templates in memory only (nothing written to disk)
    #[arg(long)]
    ephemeral: bool,

    /// Register slash commands per-guild instead of globally (faster for testing)
    #[arg(long)]
    guild_commands: bool,

    /// Specific guild ID to register slash commands to (for testing)
    #[arg(long)]
    guild_id: Option<u64>,
}

mod commands;
mod config;
mod error;
mod guild;
mod logging;
mod managers;
mod notify;
mod permissions;
mod selector;
mod state;

use commands::{help, ping, set, template_apply, template_list, template_save, undo};
use config::BotConfig;
use guild::{GuildApi, SerenityGuildApi};
use managers::{create_shared_permission_manager, SharedPermissionManager};
use notify::{Notifier, SerenityNoticeSink};
use state::{
    create_shared_permission_store, JsonFileBackend, MemoryBackend, PermissionStore,
    StoreBackend,
};

type Error = Box<dyn std::error::Error + Send + Sync>;
type Context<'a> = poise::Context<'a, Data, Error>;

/// Shared application state
pub struct Data {
    pub config: BotConfig,
    pub guild_api: Arc<dyn GuildApi>,
    pub permission_manager: SharedPermissionManager,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    let args = Args::parse();

    logging::init(args.log_level);

    let config = BotConfig::from_env()?;

    if let Some(app_id) = config::application_id_from_token(&config.token) {
        info!("Bot ID: {} (configure intents at https://discord.com/developers/applications/{}/bot)", app_id, app_id);
    }

    let backend: Box<dyn StoreBackend> = if args.ephemeral {
        warn!("--ephemeral: permission snapshots will not survive a restart");
        Box::new(MemoryBackend::new())
    } else {
        Box::new(JsonFileBackend::new(config.data_file.clone()))
    };
    let store = create_shared_permission_store(PermissionStore::open(backend).await?);

    match config.audit_channel {
        Some(id) => info!("Audit records go to channel {}", id),
        None => warn!("AUDIT_CHANNEL_ID not set: audit records will only be logged"),
    }

    let guild_commands = args.guild_commands;
    let target_guild_id = args.guild_id;
    let prefix = config.prefix.clone();
    let setup_config = config.clone();

    // Build framework
    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: vec![
                ping(),
                help(),
                set(),
                undo(),
                template_save(),
                template_apply(),
                template_list(),
            ],
            prefix_options: poise::PrefixFrameworkOptions {
                prefix: Some(prefix),
                ..Default::default()
            },
            pre_command: |ctx| {
                Box::pin(async move {
                    info!(
                        "Command '{}' invoked by {} (ID: {}) in {}",
                        ctx.command().qualified_name,
                        ctx.author().name,
                        ctx.author().id,
                        ctx.guild_id().map(|g| g.to_string()).unwrap_or_else(|| "DM".to_string())
                    );
                })
            },
            post_command: |ctx| {
                Box::pin(async move {
                    info!(
                        "Command '{}' completed for {}",
                        ctx.command().qualified_name,
                        ctx.author().name
                    );
                })
            },
            on_error: |error| {
                Box::pin(async move {
                    match error {
                        poise::FrameworkError::Command { error, ctx, .. } => {
                            error!("Error in command '{}': {}", ctx.command().qualified_name, error);
                            let _ = ctx.say(format!("[ERROR] {}", error)).await;
                        }
                        poise::FrameworkError::ArgumentParse { error, input, ctx, .. } => {
                            error!("Argument parse error in '{}': {} (input: {:?})", ctx.command().qualified_name, error, input);
                            let _ = ctx
                                .say(format!("[ERROR] Usage: see `{}help`", ctx.prefix()))
                                .await;
                        }
                        poise::FrameworkError::MissingBotPermissions { missing_permissions, ctx, .. } => {
                            error!("Bot missing permissions for '{}': {:?}", ctx.command().qualified_name, missing_permissions);
                            let _ = ctx.say(format!("[ERROR] Bot is missing permissions: {}", missing_permissions)).await;
                        }
                        poise::FrameworkError::MissingUserPermissions { missing_permissions, ctx, .. } => {
                            error!("User {} missing permissions for '{}': {:?}", ctx.author().name, ctx.command().qualified_name, missing_permissions);
                            if let Some(missing) = missing_permissions {
                                let _ = ctx.say(format!("[ERROR] You need: {}", missing)).await;
                            }
                        }
                        poise::FrameworkError::GuildOnly { ctx, .. } => {
                            error!("Command '{}' is guild-only, used in DM by {}", ctx.command().qualified_name, ctx.author().name);
                        }
                        other => {
                            if let Err(e) = poise::builtins::on_error(other).await {
                                error!("Error while handling framework error: {}", e);
                            }
                        }
                    }
                })
            },
            ..Default::default()
        })
        .setup(move |ctx, ready, framework| {
            Box::pin(async move {
                info!("Logged in as {} (ID: {})", ready.user.name, ready.user.id);
                info!("Invite URL:\n{}", config::invite_url(ready.user.id.get()));

                let guilds_to_register: Vec<serenity::GuildId> = match target_guild_id {
                    Some(gid) => vec![serenity::GuildId::new(gid)],
                    None => ready.guilds.iter().map(|g| g.id).collect(),
                };

                if guild_commands || target_guild_id.is_some() {
                    for guild_id in &guilds_to_register {
                        info!("Registering commands to guild: {}", guild_id);
                        if let Err(e) = poise::builtins::register_in_guild(
                            ctx,
                            &framework.options().commands,
                            *guild_id,
                        ).await {
                            error!("Failed to register commands for guild {}: {}", guild_id, e);
                        }
                    }
                } else {
                    info!("Registering commands globally...");
                    if let Err(e) = poise::builtins::register_globally(
                        ctx,
                        &framework.options().commands,
                    ).await {
                        error!("Failed to register commands globally: {}", e);
                    }
                }

                let guild_api: Arc<dyn GuildApi> =
                    Arc::new(SerenityGuildApi::new(ctx.http.clone(), ready.user.id));
                let notifier = Notifier::new(Arc::new(SerenityNoticeSink::new(
                    ctx.http.clone(),
                    setup_config.audit_channel,
                )));

                Ok(Data {
                    config: setup_config,
                    guild_api,
                    permission_manager: create_shared_permission_manager(store, notifier),
                })
            })
        })
        .build();

    // Prefix commands need message content
    let intents = serenity::GatewayIntents::non_privileged()
        | serenity::GatewayIntents::MESSAGE_CONTENT;

    let mut client = serenity::ClientBuilder::new(&config.token, intents)
        .framework(framework)
        .await?;

    info!("Starting bot...");
    if let Err(e) = client.start().await {
        let err_str = e.to_string();
        if err_str.contains("Disallowed") || err_str.contains("intents") {
            error!("Failed to start bot: {}", e);
            error!("Enable MESSAGE_CONTENT under Bot -> Privileged Gateway Intents at https://discord.com/developers/applications");
            return Err(anyhow::anyhow!("Disallowed gateway intents: MESSAGE_CONTENT"));
        }
        return Err(e.into());
    }
    warn!("Bot ended.");

    Ok(())
}
