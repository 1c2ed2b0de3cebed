use serenity::builder::CreateApplicationCommand;
use serenity::model::channel::ChannelType;
use serenity::model::prelude::application_command::{
    ApplicationCommandInteraction, CommandDataOptionValue,
};
use serenity::model::prelude::command::CommandOptionType;
use serenity::prelude::Context;

use crate::commands::require_manager;
use crate::config::CHANNELS_DOCUMENT;
use crate::permissions::ManagerDomain;
use crate::utils::{interaction_reply_ephemeral, required_resolved};
use crate::voice_status;
use crate::BotState;

pub async fn run(
    command: &ApplicationCommandInteraction,
    ctx: &Context,
    state: &BotState,
) -> Result<(), anyhow::Error> {
    let Some(guild_id) = require_manager(command, ctx, state, ManagerDomain::Channel).await? else {
        return Ok(());
    };
    let CommandDataOptionValue::Channel(channel) = required_resolved(command, "channel")? else {
        anyhow::bail!("option `channel` is not a channel");
    };
    let name = channel.name.clone().unwrap_or_else(|| channel.id.to_string());

    let added = {
        let _guard = state.store.lock(CHANNELS_DOCUMENT).await;
        let mut channels = state.store.channels().await?;
        let added = channels.authorize(&name, channel.id);
        if added {
            state.store.save_channels(&channels).await?;
        }
        added
    };

    if !added {
        return interaction_reply_ephemeral(
            command,
            ctx,
            format!("The channel <#{}> is already whitelisted", channel.id),
        )
        .await;
    }

    info!(channel_id = %channel.id, %name, "channel whitelisted");
    let platform = state.platform(ctx);
    if let Err(why) = voice_status::refresh(&platform, &state.store, guild_id, channel.id).await {
        warn!(error = %why, channel_id = %channel.id, "Failed to update voice status");
    }

    interaction_reply_ephemeral(
        command,
        ctx,
        format!("The channel <#{}> has been whitelisted", channel.id),
    )
    .await
}

pub fn register(command: &mut CreateApplicationCommand) -> &mut CreateApplicationCommand {
    command
        .name("addchannel")
        .description("Add channel to channels the bot is allowed to update.")
        .create_option(|option| {
            option
                .name("channel")
                .description("The voice channel the bot is allowed to edit")
                .kind(CommandOptionType::Channel)
                .channel_types(&[ChannelType::Voice])
                .required(true)
        })
}
