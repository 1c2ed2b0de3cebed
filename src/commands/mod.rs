pub mod addchannel;
pub mod addrole;
pub mod bulkaddroles;
pub mod checkupdate;
pub mod generateroles;
pub mod getroles;
pub mod reloadroles;
pub mod removechannel;
pub mod removerole;

use serenity::builder::{CreateApplicationCommandOption, CreateApplicationCommands};
use serenity::model::id::GuildId;
use serenity::model::prelude::application_command::ApplicationCommandInteraction;
use serenity::model::prelude::command::CommandOptionType;
use serenity::prelude::Context;

use crate::permissions::{is_approved, Invoker, ManagerDomain};
use crate::reaction_roles::ReactionRoleError;
use crate::role_map::MessageKey;
use crate::utils::{interaction_reply_ephemeral, required_string};
use crate::BotState;

pub fn register_all(commands: &mut CreateApplicationCommands) -> &mut CreateApplicationCommands {
    commands
        .create_application_command(|command| addchannel::register(command))
        .create_application_command(|command| removechannel::register(command))
        .create_application_command(|command| addrole::register(command))
        .create_application_command(|command| removerole::register(command))
        .create_application_command(|command| bulkaddroles::register(command))
        .create_application_command(|command| reloadroles::register(command))
        .create_application_command(|command| getroles::register(command))
        .create_application_command(|command| generateroles::register(command))
        .create_application_command(|command| checkupdate::register(command))
}

pub(crate) fn message_link_option(
    option: &mut CreateApplicationCommandOption,
) -> &mut CreateApplicationCommandOption {
    option
        .name("messagelink")
        .description("The link to the message (right click and Copy Message Link)")
        .kind(CommandOptionType::String)
        .required(true)
}

/// Returns the guild if the invoker may use commands of `domain`, otherwise
/// answers the interaction with a refusal.
pub(crate) async fn require_manager(
    command: &ApplicationCommandInteraction,
    ctx: &Context,
    state: &BotState,
    domain: ManagerDomain,
) -> Result<Option<GuildId>, anyhow::Error> {
    let (Some(guild_id), Some(member)) = (command.guild_id, command.member.as_ref()) else {
        interaction_reply_ephemeral(command, ctx, "This command can only be used in a server").await?;
        return Ok(None);
    };

    let server_name = ctx.cache.guild_field(guild_id, |guild| guild.name.clone());
    let config = state.store.guild(guild_id, server_name.as_deref()).await?;
    if is_approved(&config, domain, &Invoker::from_member(member)) {
        return Ok(Some(guild_id));
    }

    info!(user = %member.user.name, ?domain, "manager command refused");
    interaction_reply_ephemeral(command, ctx, ":x: You are not allowed to use this command").await?;
    Ok(None)
}

/// Parses the `messagelink` option, answering the interaction when it is not a
/// message link.
pub(crate) async fn message_key(
    command: &ApplicationCommandInteraction,
    ctx: &Context,
) -> Result<Option<MessageKey>, anyhow::Error> {
    let link = required_string(command, "messagelink")?;
    match link.parse::<MessageKey>() {
        Ok(key) => Ok(Some(key)),
        Err(why) => {
            interaction_reply_ephemeral(command, ctx, format!(":x: {why}")).await?;
            Ok(None)
        }
    }
}

/// Turns a failed reaction role edit into the message shown to the invoker.
/// Storage failures are not the invoker's problem and are propagated instead.
pub(crate) fn rejection(why: ReactionRoleError) -> Result<String, anyhow::Error> {
    match why {
        ReactionRoleError::RoleMap(why) => Ok(format!(":x: {why}")),
        ReactionRoleError::NotStored(key) => {
            Ok(format!("There does not appear to be any data associated with {key}"))
        }
        ReactionRoleError::Platform(why) => {
            warn!(error = %why, "platform call failed during a role command");
            Ok(format!(
                ":x: Discord rejected the change ({why}). Is the message reachable and are the \
                 emotes from servers the bot is also present in?"
            ))
        }
        ReactionRoleError::Config(why) => Err(why.into()),
    }
}
