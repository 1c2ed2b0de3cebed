use serenity::builder::CreateApplicationCommand;
use serenity::model::prelude::application_command::ApplicationCommandInteraction;
use serenity::model::prelude::command::CommandOptionType;
use serenity::prelude::Context;

use crate::commands::require_manager;
use crate::permissions::ManagerDomain;
use crate::utils::{
    interaction_defer_ephemeral, interaction_followup_ephemeral, interaction_reply_ephemeral,
    required_string, string_option,
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
    let names = role_names(required_string(command, "roles")?);
    if names.is_empty() {
        return interaction_reply_ephemeral(command, ctx, ":x: No role names given").await;
    }
    let colour = string_option(command, "colour").and_then(parse_colour);
    debug!(?names, ?colour, "generating roles");

    interaction_defer_ephemeral(command, ctx).await?;

    let mut message = String::from("## Generated the following roles:\n");
    for name in names {
        let role = guild_id
            .create_role(&ctx.http, |role| {
                role.name(name);
                if let Some(colour) = colour {
                    role.colour(u64::from(colour));
                }
                role
            })
            .await?;
        message.push_str(&format!("- <@&{}>\n", role.id));
    }
    interaction_followup_ephemeral(command, ctx, message).await
}

/// Role names are separated by `,.` so that names may contain commas.
fn role_names(input: &str) -> Vec<&str> {
    input
        .split(",.")
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .collect()
}

/// Reads `R,G,B` or a hex colour (`#` optional). Anything invalid means no colour.
fn parse_colour(input: &str) -> Option<u32> {
    if input.contains(',') {
        let compact: String = input.chars().filter(|c| !c.is_whitespace()).collect();
        let channels = compact
            .split(',')
            .map(|channel| channel.parse::<u8>().ok())
            .collect::<Option<Vec<u8>>>()?;
        let [r, g, b] = channels[..] else {
            return None;
        };
        return Some(u32::from_be_bytes([0, r, g, b]));
    }

    let hex = input.trim().trim_start_matches('#');
    if hex.is_empty() || hex.len() > 6 {
        return None;
    }
    u32::from_str_radix(hex, 16).ok()
}

pub fn register(command: &mut CreateApplicationCommand) -> &mut CreateApplicationCommand {
    command
        .name("generateroles")
        .description("A quick role creation command.")
        .create_option(|option| {
            option
                .name("roles")
                .description("Role names list. Separate each role with a \",.\"")
                .kind(CommandOptionType::String)
                .required(true)
        })
        .create_option(|option| {
            option
                .name("colour")
                .description("R,G,B values or #hex value for the roles (Default = None)")
                .kind(CommandOptionType::String)
                .required(false)
        })
}
