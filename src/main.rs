use std::env;

use poise::serenity_prelude as serenity;
use serenity::{Client, FullEvent, GatewayIntents};

mod category;
mod commands;
mod handlers;
mod settings;
mod utils;

use commands::{help, leaveserver};
use handlers::greeting;
use settings::Settings;

type Error = Box<dyn std::error::Error + Send + Sync>;
type Context<'a> = poise::Context<'a, Data, Error>;

// User data, which is stored and accessible in all command invocations
pub struct Data {
    pub settings: Settings,
}

async fn on_error(error: poise::FrameworkError<'_, Data, Error>) {
    // This is our global error handler
    match error {
        poise::FrameworkError::Setup { error, .. } => panic!("Failed to start bot: {:?}", error),
        poise::FrameworkError::Command { error, ctx, .. } => {
            println!("Error in command `{}`: {:?}", ctx.command().name, error,);
        }
        error => {
            if let Err(e) = poise::builtins::on_error(error).await {
                println!("Error while handling error: {}", e)
            }
        }
    }
}

async fn handle_event(
    ctx: &serenity::Context,
    event: &FullEvent,
    _framework: poise::FrameworkContext<'_, Data, Error>,
    data: &Data,
) -> Result<(), Error> {
    match event {
        FullEvent::GuildMemberAddition { new_member, .. } => {
            log::info!(
                "{} joined guild {}",
                new_member.user.name,
                new_member.guild_id
            );
            // Invite tracking is not wired up, the greeting renders without
            // inviter information.
            greeting::send_welcome(
                ctx,
                new_member,
                greeting::InviterData::default(),
                &data.settings,
            )
            .await;
        }
        FullEvent::GuildMemberRemoval { guild_id, user, .. } => {
            log::info!("{} left guild {}", user.name, guild_id);
            greeting::send_farewell(ctx, *guild_id, user, &data.settings).await;
        }
        _ => {}
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    // Initialize logger
    env_logger::init();

    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Get the bot token from environment variables
    let token = env::var("DISCORD_TOKEN")
        .expect("Expected a Discord bot token in the environment variable DISCORD_TOKEN");

    let settings_file = env::var("SETTINGS_FILE").unwrap_or_else(|_| "settings.json".to_string());
    let settings = Settings::load(&settings_file).expect("Failed to load the settings file");

    // Set gateway intents
    let intents = GatewayIntents::GUILDS
        | GatewayIntents::GUILD_MEMBERS
        | GatewayIntents::GUILD_MESSAGES
        | GatewayIntents::MESSAGE_CONTENT;

    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: vec![help(), leaveserver()],
            prefix_options: poise::PrefixFrameworkOptions {
                prefix: Some("-".into()),
                ..Default::default()
            },
            on_error: |error| Box::pin(on_error(error)),
            pre_command: |ctx| {
                Box::pin(async move {
                    log::info!("Executing command {}...", ctx.command().qualified_name);
                })
            },
            post_command: |ctx| {
                Box::pin(async move {
                    log::info!("Executed command {}!", ctx.command().qualified_name);
                })
            },
            event_handler: |ctx, event, framework, data| {
                Box::pin(handle_event(ctx, event, framework, data))
            },
            ..Default::default()
        })
        .setup(move |ctx, _ready, framework| {
            Box::pin(async move {
                log::info!("Logged in as {}", _ready.user.name);
                println!("🤖 {} is online and ready!", _ready.user.name);
                poise::builtins::register_globally(ctx, &framework.options().commands).await?;
                Ok(Data { settings })
            })
        })
        .build();

    let mut client = Client::builder(&token, intents)
        .framework(framework)
        .await
        .expect("Error creating client");

    // Start the bot
    log::info!("Starting bot...");
    if let Err(why) = client.start().await {
        log::error!("Client error: {:?}", why);
    }
}
