use serenity::model::prelude::*;
use serenity::prelude::*;

use dotenvy::dotenv;
use std::env;
use std::sync::Arc;
use tracing::{error, info};

use role_bot::handler::Handler;
use role_bot::settings::Settings;
use role_bot::BotState;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    dotenv().ok();

    tracing_subscriber::fmt()
        .pretty()
        .with_env_filter(tracing_subscriber::EnvFilter::new(
            env::var("RUST_LOG").unwrap_or_else(|_| "role_bot=info".to_string()),
        ))
        .init();

    let settings = Settings::from_env()?;
    let state = Arc::new(BotState::new(settings));
    state.store.prepare().await?;
    info!(path = %state.store.dir().display(), "using config directory");

    let intents = GatewayIntents::GUILDS
        | GatewayIntents::GUILD_MEMBERS
        | GatewayIntents::GUILD_VOICE_STATES
        | GatewayIntents::GUILD_MESSAGE_REACTIONS;
    let mut client = Client::builder(&state.settings.token, intents)
        .event_handler(Handler::new(Arc::clone(&state)))
        .await?;

    let shard_manager = client.shard_manager.clone();
    tokio::spawn(async move {
        if let Err(why) = tokio::signal::ctrl_c().await {
            error!(error = %why, "Could not register ctrl+c handler");
            return;
        }
        info!("shutting down");
        shard_manager.lock().await.shutdown_all().await;
    });

    // start listening for events by starting a single shard
    if let Err(why) = client.start().await {
        error!(error = %why, "An error occurred while running the client");
    }
    Ok(())
}
