use serenity::builder::CreateApplicationCommand;
use serenity::model::channel::ChannelType;
use serenity::model::prelude::application_command::{
    ApplicationCommandInteraction, CommandDataOptionValue,
};
use serenity::model::prelude::command::CommandOptionType;
use serenity::prelude::Context;

use crate::commands::require_manager;
use crate::config::{guild_document, CHANNELS_DOCUMENT};
use crate::permissions::ManagerDomain;
use crate::platform::Platform;
use crate::utils::{interaction_reply_ephemeral, required_resolved};
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

    let removed = {
        let _guard = state.store.lock(CHANNELS_DOCUMENT).await;
        let mut channels = state.store.channels().await?;
        let removed = channels.revoke(channel.id);
        if removed {
            state.store.save_channels(&channels).await?;
        }
        removed
    };

    let reply = if removed {
        info!(channel_id = %channel.id, "channel removed from whitelist");
        format!("The channel <#{}> has been removed from the whitelist", channel.id)
    } else {
        format!("The channel <#{}> is already not whitelisted", channel.id)
    };
    interaction_reply_ephemeral(command, ctx, reply).await?;

    let icon = state
        .store
        .field(&guild_document(guild_id), "Active Icon")
        .await?;
    if let (Some(icon), Some(name)) = (icon.as_str(), channel.name.as_deref()) {
        if let Some(stripped) = strip_icon(name, icon) {
            state.platform(ctx).rename_channel(channel.id, stripped).await?;
        }
    }
    Ok(())
}

/// The channel name without a trailing active icon, if it has one.
fn strip_icon<'a>(name: &'a str, icon: &str) -> Option<&'a str> {
    if icon.is_empty() {
        return None;
    }
    name.strip_suffix(icon)
}

pub fn register(command: &mut CreateApplicationCommand) -> &mut CreateApplicationCommand {
    command
        .name("removechannel")
        .description("Remove channel from channels the bot is allowed to update.")
        .create_option(|option| {
            option
                .name("channel")
                .description("The voice channel the bot is no longer allowed to edit")
                .kind(CommandOptionType::Channel)
                .channel_types(&[ChannelType::Voice])
                .required(true)
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_trailing_icon() {
        assert_eq!(strip_icon("Gaming 📊", "📊"), Some("Gaming "));
        assert_eq!(strip_icon("Gaming", "📊"), None);
        assert_eq!(strip_icon("📊 Gaming", "📊"), None);
        assert_eq!(strip_icon("Gaming", ""), None);
    }
}
