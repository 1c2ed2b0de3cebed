use serenity::builder::CreateApplicationCommand;
use serenity::model::prelude::application_command::ApplicationCommandInteraction;
use serenity::prelude::Context;

use crate::commands::{message_key, message_link_option, rejection, require_manager};
use crate::permissions::ManagerDomain;
use crate::reaction_roles;
use crate::utils::{interaction_defer_ephemeral, interaction_followup_ephemeral};
use crate::BotState;

pub async fn run(
    command: &ApplicationCommandInteraction,
    ctx: &Context,
    state: &BotState,
) -> Result<(), anyhow::Error> {
    if require_manager(command, ctx, state, ManagerDomain::Role)
        .await?
        .is_none()
    {
        return Ok(());
    }
    let Some(key) = message_key(command, ctx).await? else {
        return Ok(());
    };

    interaction_defer_ephemeral(command, ctx).await?;

    let platform = state.platform(ctx);
    let reply = match reaction_roles::reload(&platform, &state.store, &key).await {
        Ok(count) => format!("Reloaded {count} reactions on {key}"),
        Err(why) => rejection(why)?,
    };
    interaction_followup_ephemeral(command, ctx, reply).await
}

pub fn register(command: &mut CreateApplicationCommand) -> &mut CreateApplicationCommand {
    command
        .name("reloadroles")
        .description("Re-add the bot's reactions to a roles message.")
        .create_option(message_link_option)
}
