use serenity::builder::CreateApplicationCommand;
use serenity::model::prelude::application_command::{
    ApplicationCommandInteraction, CommandDataOptionValue,
};
use serenity::model::prelude::command::CommandOptionType;
use serenity::prelude::Context;

use crate::commands::{message_key, message_link_option, rejection, require_manager};
use crate::emote::Emote;
use crate::permissions::ManagerDomain;
use crate::reaction_roles;
use crate::role_map::{BindOutcome, RoleBinding};
use crate::utils::{
    interaction_defer_ephemeral, interaction_followup_ephemeral, interaction_reply_ephemeral,
    required_resolved, required_string,
};
use crate::BotState;

pub async fn run(
    command: &ApplicationCommandInteraction,
    ctx: &Context,
    state: &BotState,
) -> Result<(), anyhow::Error> {
    let Some(guild_id) = require_manager(command, ctx, state, ManagerDomain::Role).await? else {
        return Ok(());
    };
    let CommandDataOptionValue::Role(role) = required_resolved(command, "role")? else {
        anyhow::bail!("option `role` is not a role");
    };
    if role.id.0 == guild_id.0 {
        return interaction_reply_ephemeral(
            command,
            ctx,
            "Last I checked you don't need to assign the role @everyone",
        )
        .await;
    }
    let emote: Emote = match required_string(command, "emote")?.parse() {
        Ok(emote) => emote,
        Err(why) => return interaction_reply_ephemeral(command, ctx, format!(":x: {why}")).await,
    };
    let Some(key) = message_key(command, ctx).await? else {
        return Ok(());
    };

    interaction_defer_ephemeral(command, ctx).await?;

    let platform = state.platform(ctx);
    let binding = RoleBinding::new(role.id, role.name.clone(), emote.clone());
    let reply = match reaction_roles::add_role(&platform, &state.store, &key, binding).await {
        Ok(BindOutcome::Added) => format!("{key} has had the role <@&{}> added to it as {emote}", role.id),
        Ok(BindOutcome::Replaced { old, new }) => {
            format!("{key} has had the emote for <@&{}> changed from {old} to {new}", role.id)
        }
        Ok(BindOutcome::Unchanged) => {
            format!("{key} already has the role <@&{}> bound to {emote}", role.id)
        }
        Err(why) => rejection(why)?,
    };
    interaction_followup_ephemeral(command, ctx, reply).await
}

pub fn register(command: &mut CreateApplicationCommand) -> &mut CreateApplicationCommand {
    command
        .name("addrole")
        .description("Allow for a role to be added to the roles message.")
        .create_option(|option| {
            option
                .name("role")
                .description("The role you wish to add")
                .kind(CommandOptionType::Role)
                .required(true)
        })
        .create_option(|option| {
            option
                .name("emote")
                .description("The emote to use as the reaction (make sure it's one the bot has too)")
                .kind(CommandOptionType::String)
                .required(true)
        })
        .create_option(message_link_option)
}
