use std::num::ParseIntError;

use serenity::builder::CreateApplicationCommand;
use serenity::model::id::RoleId;
use serenity::model::prelude::application_command::ApplicationCommandInteraction;
use serenity::model::prelude::command::CommandOptionType;
use serenity::prelude::Context;

use crate::commands::{message_key, message_link_option, rejection, require_manager};
use crate::emote::Emote;
use crate::error::EmoteParseError;
use crate::permissions::ManagerDomain;
use crate::reaction_roles;
use crate::role_map::RoleBinding;
use crate::utils::{
    interaction_defer_ephemeral, interaction_followup_ephemeral, interaction_reply_ephemeral,
    required_string,
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

    let roles = match parse_role_mentions(required_string(command, "roles")?) {
        Ok(roles) => roles,
        Err(why) => {
            return interaction_reply_ephemeral(command, ctx, format!(":x: Invalid role mention: {why}"))
                .await
        }
    };
    let emotes = match parse_emotes(required_string(command, "emotes")?) {
        Ok(emotes) => emotes,
        Err(why) => return interaction_reply_ephemeral(command, ctx, format!(":x: {why}")).await,
    };
    if roles.len() != emotes.len() {
        return interaction_reply_ephemeral(
            command,
            ctx,
            format!(
                "{} roles but {} emotes detected.\nEnsure emotes are separated via spaces and try again",
                roles.len(),
                emotes.len()
            ),
        )
        .await;
    }
    let Some(key) = message_key(command, ctx).await? else {
        return Ok(());
    };

    interaction_defer_ephemeral(command, ctx).await?;

    let guild_roles = guild_id.roles(&ctx.http).await?;
    let mut bindings = Vec::with_capacity(roles.len());
    for (role_id, emote) in roles.into_iter().zip(emotes) {
        let Some(role) = guild_roles.get(&role_id) else {
            return interaction_followup_ephemeral(command, ctx, format!("Role: <@&{role_id}> not found"))
                .await;
        };
        bindings.push(RoleBinding::new(role_id, role.name.clone(), emote));
    }
    let pairings: String = bindings
        .iter()
        .map(|binding| format!("- {} <@&{}>\n", binding.emote, binding.role_id))
        .collect();

    let platform = state.platform(ctx);
    let reply = match reaction_roles::bulk_add(&platform, &state.store, &key, bindings).await {
        Ok(()) => format!("{key} has had the following roles added to it:\n{pairings}"),
        Err(why) => rejection(why)?,
    };
    interaction_followup_ephemeral(command, ctx, reply).await
}

/// Reads role ids out of a run of role mentions such as `<@&1>, <@&2>`.
fn parse_role_mentions(input: &str) -> Result<Vec<RoleId>, ParseIntError> {
    let compact: String = input
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '>' && *c != ',')
        .collect();
    compact
        .split("<@&")
        .skip(1)
        .map(|id| id.parse().map(RoleId))
        .collect()
}

fn parse_emotes(input: &str) -> Result<Vec<Emote>, EmoteParseError> {
    input.split_whitespace().map(str::parse).collect()
}

pub fn register(command: &mut CreateApplicationCommand) -> &mut CreateApplicationCommand {
    command
        .name("bulkaddroles")
        .description("Replace every role on a roles message at once.")
        .create_option(|option| {
            option
                .name("roles")
                .description("The roles you wish to add, in order")
                .kind(CommandOptionType::String)
                .required(true)
        })
        .create_option(|option| {
            option
                .name("emotes")
                .description("Emotes to use per role in the same order (separate with spaces)")
                .kind(CommandOptionType::String)
                .required(true)
        })
        .create_option(message_link_option)
}
