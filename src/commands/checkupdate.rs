use serenity::builder::CreateApplicationCommand;
use serenity::model::prelude::application_command::ApplicationCommandInteraction;
use serenity::prelude::Context;

use crate::commands::require_manager;
use crate::permissions::ManagerDomain;
use crate::update::{self, VersionStatus, CURRENT_VERSION};
use crate::utils::{interaction_defer_ephemeral, interaction_followup_ephemeral, interaction_reply_ephemeral};
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
    let Some(url) = &state.settings.update_manifest_url else {
        return interaction_reply_ephemeral(
            command,
            ctx,
            format!("Update checks are disabled. Current version: `{CURRENT_VERSION}`"),
        )
        .await;
    };

    interaction_defer_ephemeral(command, ctx).await?;

    let status = update::check_version(&state.http_client, url).await?;
    let (activity, online_status) = status.presence();
    ctx.set_presence(Some(activity), online_status).await;

    let reply = match status {
        VersionStatus::Outdated { current, latest } => format!(
            "# Update Found\nCurrent version: `{current}`\nVersion available: `{latest}`"
        ),
        VersionStatus::UpToDate { current } => {
            format!("The bot is up to date. Current version: `{current}`")
        }
    };
    interaction_followup_ephemeral(command, ctx, reply).await
}

pub fn register(command: &mut CreateApplicationCommand) -> &mut CreateApplicationCommand {
    command
        .name("checkupdate")
        .description("Compare the bot to the latest version available.")
}
