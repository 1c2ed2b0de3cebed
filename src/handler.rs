use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serenity::async_trait;
use serenity::model::prelude::*;
use serenity::prelude::*;

use tracing::Instrument;
use tracing::Level;

use crate::commands;
use crate::config::{guild_document, CHANNELS_DOCUMENT};
use crate::resolver::{self, ReactionEvent, ReactionKind};
use crate::update;
use crate::utils::interaction_error;
use crate::voice_status;
use crate::BotState;

pub struct Handler {
    state: Arc<BotState>,
    update_started: AtomicBool,
}

impl Handler {
    pub fn new(state: Arc<BotState>) -> Self {
        Self {
            state,
            update_started: AtomicBool::new(false),
        }
    }

    async fn reaction(&self, ctx: Context, reaction: Reaction, kind: ReactionKind) {
        let Some(event) = ReactionEvent::from_reaction(&reaction, kind) else {
            return;
        };
        if event.user_id == ctx.cache.current_user_id() {
            return;
        }

        let channels = match self.state.store.channels().await {
            Ok(channels) => channels,
            Err(why) => {
                error!(error = %why, "Failed to load channels document");
                return;
            }
        };
        if !channels.role_bot.contains(&event.key) {
            return;
        }

        let span = span!(
            Level::DEBUG,
            "reaction_role",
            message = %event.key,
            user_id = %event.user_id,
            emote = %event.emote,
            kind = ?kind
        );
        async {
            let platform = self.state.platform(&ctx);
            match resolver::handle(&platform, &channels.role_bot, &event).await {
                Ok(Some(change)) => debug!(?change, "reaction role applied"),
                Ok(None) => trace!("emote not bound on this message"),
                Err(why) => warn!(error = %why, "Failed to apply reaction role"),
            }
        }
        .instrument(span)
        .await;
    }

    async fn refresh_voice(&self, ctx: &Context, guild_id: GuildId, channels: &[ChannelId]) {
        let platform = self.state.platform(ctx);
        let refreshes = channels.iter().map(|channel_id| {
            let platform = &platform;
            async move {
                if let Err(why) =
                    voice_status::refresh(platform, &self.state.store, guild_id, *channel_id).await
                {
                    warn!(error = %why, %guild_id, %channel_id, "Failed to update voice status");
                }
            }
        });
        futures::future::join_all(refreshes).await;
    }

    async fn register_commands(&self, ctx: &Context, guild_id: GuildId) {
        let commands =
            GuildId::set_application_commands(&guild_id, &ctx.http, commands::register_all).await;

        if let Err(why) = commands {
            error!(error = %why, %guild_id, "Failed to register commands.");
        }
    }
}

#[async_trait]
impl EventHandler for Handler {
    async fn ready(&self, ctx: Context, ready: Ready) {
        info!(user = %ready.user.name, "Bot is connected!");

        let store = &self.state.store;
        if let Err(why) = store.ensure_integrity(CHANNELS_DOCUMENT, None).await {
            error!(error = %why, "Failed to check channels document");
        }
        for guild in &ready.guilds {
            if let Err(why) = store.ensure_integrity(&guild_document(guild.id), None).await {
                error!(error = %why, guild_id = %guild.id, "Failed to check guild document");
            }
            self.register_commands(&ctx, guild.id).await;
        }

        if let Some(url) = &self.state.settings.update_manifest_url {
            if !self.update_started.swap(true, Ordering::SeqCst) {
                update::start(
                    ctx.clone(),
                    self.state.http_client.clone(),
                    url.clone(),
                    self.state.settings.update_check_interval,
                );
            }
        }
    }

    async fn guild_create(&self, ctx: Context, guild: Guild, is_new: bool) {
        if is_new {
            info!(guild_id = %guild.id, name = %guild.name, "Joined guild");
            let document = guild_document(guild.id);
            if let Err(why) = self
                .state
                .store
                .ensure_integrity(&document, Some(&guild.name))
                .await
            {
                error!(error = %why, guild_id = %guild.id, "Failed to create guild document");
            }
        }
        self.register_commands(&ctx, guild.id).await;
    }

    async fn reaction_add(&self, ctx: Context, add_reaction: Reaction) {
        self.reaction(ctx, add_reaction, ReactionKind::Add).await;
    }

    async fn reaction_remove(&self, ctx: Context, removed_reaction: Reaction) {
        self.reaction(ctx, removed_reaction, ReactionKind::Remove)
            .await;
    }

    async fn voice_state_update(&self, ctx: Context, old: Option<VoiceState>, new: VoiceState) {
        let Some(guild_id) = new.guild_id else {
            return;
        };
        let before = old.and_then(|state| state.channel_id);
        if before == new.channel_id {
            return;
        }

        let channels: Vec<ChannelId> = before.into_iter().chain(new.channel_id).collect();
        self.refresh_voice(&ctx, guild_id, &channels).await;
    }

    async fn guild_member_update(&self, ctx: Context, old: Option<Member>, new: Member) {
        if old.is_some_and(|old| old.roles == new.roles) {
            return;
        }

        let user_id = new.user.id;
        let channel_id = ctx
            .cache
            .guild_field(new.guild_id, |guild| {
                guild.voice_states.get(&user_id).and_then(|state| state.channel_id)
            })
            .flatten();
        if let Some(channel_id) = channel_id {
            self.refresh_voice(&ctx, new.guild_id, &[channel_id]).await;
        }
    }

    async fn interaction_create(&self, ctx: Context, interaction: Interaction) {
        match interaction {
            Interaction::ApplicationCommand(command) => {
                let span = span!(
                    Level::DEBUG,
                    "application_command",
                    interaction_id = command.id.0,
                    guild_id = %command.guild_id.unwrap_or_default(),
                    channel_id = %command.channel_id,
                    user = %command.user,
                    command_name = %command.data.name
                );

                async {
                    trace!(command = ?command, "received command interaction");
                    let state = &self.state;
                    let res = match command.data.name.as_str() {
                        "addchannel" => commands::addchannel::run(&command, &ctx, state).await,
                        "removechannel" => commands::removechannel::run(&command, &ctx, state).await,
                        "addrole" => commands::addrole::run(&command, &ctx, state).await,
                        "removerole" => commands::removerole::run(&command, &ctx, state).await,
                        "bulkaddroles" => commands::bulkaddroles::run(&command, &ctx, state).await,
                        "reloadroles" => commands::reloadroles::run(&command, &ctx, state).await,
                        "getroles" => commands::getroles::run(&command, &ctx, state).await,
                        "generateroles" => commands::generateroles::run(&command, &ctx, state).await,
                        "checkupdate" => commands::checkupdate::run(&command, &ctx, state).await,
                        _ => {
                            warn!(command_name = %command.data.name, command_options = ?command.data.options, "unknown command received");
                            interaction_error(&command, &ctx, "Command is currently not implemented").await
                        }
                    };

                    if let Err(why) = res {
                        warn!(error = %why, "Cannot respond to slash command");
                        interaction_error(&command, &ctx, format!("There was an error processing this command:\n```rust\n{why}\n```")).await.ok();
                    }
                }
                .instrument(span)
                .await;
            }
            _ => {
                trace!("ignoring non-command interaction");
            }
        }
    }
}
