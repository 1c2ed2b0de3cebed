use serenity::builder::CreateApplicationCommand;
use serenity::model::prelude::application_command::{
    ApplicationCommandInteraction, CommandDataOptionValue,
};
use serenity::model::prelude::command::CommandOptionType;
use serenity::prelude::Context;

use crate::commands::{message_key, message_link_option, rejection, require_manager};
use crate::permissions::ManagerDomain;
use crate::reaction_roles;
use crate::utils::{interaction_defer_ephemeral, interaction_followup_ephemeral, required_resolved};
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
    let CommandDataOptionValue::Role(role) = required_resolved(command, "role")? else {
        anyhow::bail!("option `role` is not a role");
    };
    let Some(key) = message_key(command, ctx).await? else {
        return Ok(());
    };

    interaction_defer_ephemeral(command, ctx).await?;

    let platform = state.platform(ctx);
    let reply = match reaction_roles::remove_role(&platform, &state.store, &key, role.id).await {
        Ok(emote) => format!("{key} no longer assigns <@&{}> for {emote}", role.id),
        Err(why) => rejection(why)?,
    };
    interaction_followup_ephemeral(command, ctx, reply).await
}

pub fn register(command: &mut CreateApplicationCommand) -> &mut CreateApplicationCommand {
    command
        .name("removerole")
        .description("Remove a role from the roles message.")
        .create_option(|option| {
            option
                .name("role")
                .description("The role you wish to remove")
                .kind(CommandOptionType::Role)
                .required(true)
        })
        .create_option(message_link_option)
}
