use anyhow::anyhow;
use serenity::model::prelude::application_command::{
    ApplicationCommandInteraction, CommandDataOptionValue,
};
use serenity::model::prelude::InteractionResponseType;
use serenity::prelude::Context;

pub async fn interaction_reply_ephemeral(
    command: &ApplicationCommandInteraction,
    ctx: &Context,
    content: impl ToString,
) -> Result<(), anyhow::Error> {
    command
        .create_interaction_response(&ctx.http, |response| {
            response
                .kind(InteractionResponseType::ChannelMessageWithSource)
                .interaction_response_data(|message| message.content(content).ephemeral(true))
        })
        .await?;
    Ok(())
}

/// Acknowledges a command that makes several platform calls before answering.
pub async fn interaction_defer_ephemeral(
    command: &ApplicationCommandInteraction,
    ctx: &Context,
) -> Result<(), anyhow::Error> {
    command
        .create_interaction_response(&ctx.http, |response| {
            response
                .kind(InteractionResponseType::DeferredChannelMessageWithSource)
                .interaction_response_data(|message| message.ephemeral(true))
        })
        .await?;
    Ok(())
}

pub async fn interaction_followup_ephemeral(
    command: &ApplicationCommandInteraction,
    ctx: &Context,
    content: impl ToString,
) -> Result<(), anyhow::Error> {
    command
        .create_followup_message(&ctx.http, |response| response.content(content).ephemeral(true))
        .await?;
    Ok(())
}

/// Replies if the command was not answered yet, otherwise follows up.
pub async fn interaction_error(
    command: &ApplicationCommandInteraction,
    ctx: &Context,
    content: impl ToString,
) -> Result<(), anyhow::Error> {
    let content = content.to_string();
    if interaction_reply_ephemeral(command, ctx, &content).await.is_err() {
        interaction_followup_ephemeral(command, ctx, content).await?;
    }
    Ok(())
}

pub fn string_option<'a>(command: &'a ApplicationCommandInteraction, name: &str) -> Option<&'a str> {
    command
        .data
        .options
        .iter()
        .find(|option| option.name == name)?
        .value
        .as_ref()?
        .as_str()
}

pub fn required_string<'a>(
    command: &'a ApplicationCommandInteraction,
    name: &str,
) -> Result<&'a str, anyhow::Error> {
    string_option(command, name).ok_or_else(|| anyhow!("missing option `{name}`"))
}

pub fn required_resolved<'a>(
    command: &'a ApplicationCommandInteraction,
    name: &str,
) -> Result<&'a CommandDataOptionValue, anyhow::Error> {
    command
        .data
        .options
        .iter()
        .find(|option| option.name == name)
        .and_then(|option| option.resolved.as_ref())
        .ok_or_else(|| anyhow!("missing option `{name}`"))
}
