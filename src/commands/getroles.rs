use serenity::builder::CreateApplicationCommand;
use serenity::model::prelude::application_command::ApplicationCommandInteraction;
use serenity::prelude::Context;

use crate::commands::{message_key, message_link_option};
use crate::role_map::{MessageKey, RoleBinding};
use crate::utils::interaction_reply_ephemeral;
use crate::BotState;

pub async fn run(
    command: &ApplicationCommandInteraction,
    ctx: &Context,
    state: &BotState,
) -> Result<(), anyhow::Error> {
    let Some(key) = message_key(command, ctx).await? else {
        return Ok(());
    };

    let channels = state.store.channels().await?;
    interaction_reply_ephemeral(command, ctx, listing(&key, channels.role_bot.bindings(&key))).await
}

fn listing(key: &MessageKey, bindings: &[RoleBinding]) -> String {
    if bindings.is_empty() {
        return "There does not appear to be any data associated with this message".to_string();
    }
    let mut message = String::from("# Roles:\n");
    for binding in bindings {
        message.push_str(&format!("- {} <@&{}>\n", binding.emote, binding.role_id));
    }
    message.push_str(&key.to_string());
    message
}

pub fn register(command: &mut CreateApplicationCommand) -> &mut CreateApplicationCommand {
    command
        .name("getroles")
        .description("Shows roles associated with a message.")
        .create_option(message_link_option)
}
