//! Outbound calls to the chat platform.
//!
//! Core logic talks to Discord only through [`Platform`], so it can be driven
//! by a recording fake in tests.

use serde_json::json;
use serenity::async_trait;
use serenity::model::channel::{Channel, ReactionType};
use serenity::model::id::{ChannelId, GuildId, RoleId, UserId};
use serenity::prelude::Context;

use crate::emote::Emote;
use crate::error::PlatformError;
use crate::role_map::MessageKey;
use crate::voice_status::VoiceChannelSnapshot;

const API_BASE: &str = "https://discord.com/api/v10";

#[async_trait]
pub trait Platform: Send + Sync {
    /// Fails if the message cannot be fetched.
    async fn fetch_message(&self, key: &MessageKey) -> Result<(), PlatformError>;
    async fn add_reaction(&self, key: &MessageKey, emote: &Emote) -> Result<(), PlatformError>;
    async fn remove_own_reaction(&self, key: &MessageKey, emote: &Emote)
        -> Result<(), PlatformError>;
    async fn remove_own_reactions(&self, key: &MessageKey) -> Result<(), PlatformError>;
    async fn clear_reactions(&self, key: &MessageKey) -> Result<(), PlatformError>;

    async fn member_roles(
        &self,
        guild_id: GuildId,
        user_id: UserId,
    ) -> Result<Vec<RoleId>, PlatformError>;
    async fn grant_role(
        &self,
        guild_id: GuildId,
        user_id: UserId,
        role_id: RoleId,
    ) -> Result<(), PlatformError>;
    async fn revoke_role(
        &self,
        guild_id: GuildId,
        user_id: UserId,
        role_id: RoleId,
    ) -> Result<(), PlatformError>;

    /// Members currently connected to a voice channel, or `None` if the channel
    /// is unknown.
    async fn voice_channel(
        &self,
        guild_id: GuildId,
        channel_id: ChannelId,
    ) -> Result<Option<VoiceChannelSnapshot>, PlatformError>;
    async fn set_voice_status(&self, channel_id: ChannelId, status: &str)
        -> Result<(), PlatformError>;
    async fn rename_channel(&self, channel_id: ChannelId, name: &str) -> Result<(), PlatformError>;
}

/// [`Platform`] backed by the serenity context of the current event.
pub struct SerenityPlatform {
    ctx: Context,
    client: reqwest::Client,
    token: String,
}

impl SerenityPlatform {
    pub fn new(ctx: Context, client: reqwest::Client, token: &str) -> Self {
        let token = if token.starts_with("Bot ") {
            token.to_string()
        } else {
            format!("Bot {token}")
        };
        Self { ctx, client, token }
    }

    /// Reactions need the emote name, which legacy bindings do not store.
    async fn reaction(&self, key: &MessageKey, emote: &Emote) -> Result<ReactionType, PlatformError> {
        match emote {
            Emote::Custom { id, name: None, .. } => {
                let emoji = key.guild_id.emoji(&self.ctx.http, *id).await?;
                Ok(ReactionType::Custom {
                    animated: emoji.animated,
                    id: emoji.id,
                    name: Some(emoji.name),
                })
            }
            _ => Ok(emote.to_reaction()),
        }
    }
}

#[async_trait]
impl Platform for SerenityPlatform {
    async fn fetch_message(&self, key: &MessageKey) -> Result<(), PlatformError> {
        key.channel_id
            .message(&self.ctx.http, key.message_id)
            .await?;
        Ok(())
    }

    async fn add_reaction(&self, key: &MessageKey, emote: &Emote) -> Result<(), PlatformError> {
        let reaction = self.reaction(key, emote).await?;
        key.channel_id
            .create_reaction(&self.ctx.http, key.message_id, reaction)
            .await?;
        Ok(())
    }

    async fn remove_own_reaction(
        &self,
        key: &MessageKey,
        emote: &Emote,
    ) -> Result<(), PlatformError> {
        let reaction = self.reaction(key, emote).await?;
        key.channel_id
            .delete_reaction(&self.ctx.http, key.message_id, None, reaction)
            .await?;
        Ok(())
    }

    async fn remove_own_reactions(&self, key: &MessageKey) -> Result<(), PlatformError> {
        let message = key
            .channel_id
            .message(&self.ctx.http, key.message_id)
            .await?;
        for reaction in message.reactions.into_iter().filter(|r| r.me) {
            key.channel_id
                .delete_reaction(&self.ctx.http, key.message_id, None, reaction.reaction_type)
                .await?;
        }
        Ok(())
    }

    async fn clear_reactions(&self, key: &MessageKey) -> Result<(), PlatformError> {
        key.channel_id
            .delete_reactions(&self.ctx.http, key.message_id)
            .await?;
        Ok(())
    }

    async fn member_roles(
        &self,
        guild_id: GuildId,
        user_id: UserId,
    ) -> Result<Vec<RoleId>, PlatformError> {
        Ok(guild_id.member(&self.ctx, user_id).await?.roles)
    }

    async fn grant_role(
        &self,
        guild_id: GuildId,
        user_id: UserId,
        role_id: RoleId,
    ) -> Result<(), PlatformError> {
        let mut member = guild_id.member(&self.ctx, user_id).await?;
        member.add_role(&self.ctx.http, role_id).await?;
        Ok(())
    }

    async fn revoke_role(
        &self,
        guild_id: GuildId,
        user_id: UserId,
        role_id: RoleId,
    ) -> Result<(), PlatformError> {
        let mut member = guild_id.member(&self.ctx, user_id).await?;
        member.remove_role(&self.ctx.http, role_id).await?;
        Ok(())
    }

    async fn voice_channel(
        &self,
        guild_id: GuildId,
        channel_id: ChannelId,
    ) -> Result<Option<VoiceChannelSnapshot>, PlatformError> {
        let Some(guild) = self.ctx.cache.guild(guild_id) else {
            return Ok(None);
        };
        let Some(Channel::Guild(channel)) = guild.channels.get(&channel_id) else {
            return Ok(None);
        };

        let members = guild
            .voice_states
            .values()
            .filter(|state| state.channel_id == Some(channel_id))
            .map(|state| {
                let roles = guild
                    .members
                    .get(&state.user_id)
                    .or(state.member.as_ref())
                    .map(|member| member.roles.as_slice())
                    .unwrap_or_default();
                roles
                    .iter()
                    .filter_map(|id| guild.roles.get(id))
                    .map(|role| role.name.clone())
                    .collect()
            })
            .collect();

        Ok(Some(VoiceChannelSnapshot {
            name: channel.name.clone(),
            members,
        }))
    }

    async fn set_voice_status(
        &self,
        channel_id: ChannelId,
        status: &str,
    ) -> Result<(), PlatformError> {
        // not covered by serenity's http client
        self.client
            .put(format!("{API_BASE}/channels/{channel_id}/voice-status"))
            .header("Authorization", &self.token)
            .json(&json!({ "status": status }))
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    async fn rename_channel(&self, channel_id: ChannelId, name: &str) -> Result<(), PlatformError> {
        channel_id.edit(&self.ctx.http, |c| c.name(name)).await?;
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod fake {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use super::*;

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum Call {
        FetchMessage(MessageKey),
        AddReaction(MessageKey, Emote),
        RemoveOwnReaction(MessageKey, Emote),
        RemoveOwnReactions(MessageKey),
        ClearReactions(MessageKey),
        MemberRoles(UserId),
        Grant(UserId, RoleId),
        Revoke(UserId, RoleId),
        VoiceChannel(ChannelId),
        SetVoiceStatus(ChannelId, String),
        Rename(ChannelId, String),
    }

    /// Records every call and tracks the bot's reactions per message. Reaction
    /// or role calls fail after being recorded when the matching flag is set, and
    /// adding any emote in `rejected_emotes` fails.
    #[derive(Default)]
    pub struct FakePlatform {
        pub calls: Mutex<Vec<Call>>,
        pub reactions: Mutex<HashMap<MessageKey, Vec<Emote>>>,
        pub roles: HashMap<UserId, Vec<RoleId>>,
        pub channels: HashMap<ChannelId, VoiceChannelSnapshot>,
        pub rejected_emotes: Vec<Emote>,
        pub fail_reactions: bool,
        pub fail_roles: bool,
    }

    impl FakePlatform {
        pub fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }

        /// The bot's reactions currently on the message, in the order added.
        pub fn reactions_on(&self, key: &MessageKey) -> Vec<Emote> {
            self.reactions
                .lock()
                .unwrap()
                .get(key)
                .cloned()
                .unwrap_or_default()
        }

        fn record(&self, call: Call, fail: bool) -> Result<(), PlatformError> {
            self.calls.lock().unwrap().push(call);
            if fail {
                Err(PlatformError::Other("missing permissions".to_string()))
            } else {
                Ok(())
            }
        }
    }

    #[async_trait]
    impl Platform for FakePlatform {
        async fn fetch_message(&self, key: &MessageKey) -> Result<(), PlatformError> {
            self.record(Call::FetchMessage(*key), false)
        }

        async fn add_reaction(&self, key: &MessageKey, emote: &Emote) -> Result<(), PlatformError> {
            let rejected = self.rejected_emotes.contains(emote);
            self.record(Call::AddReaction(*key, emote.clone()), self.fail_reactions || rejected)?;
            let mut reactions = self.reactions.lock().unwrap();
            let on_message = reactions.entry(*key).or_default();
            if !on_message.contains(emote) {
                on_message.push(emote.clone());
            }
            Ok(())
        }

        async fn remove_own_reaction(
            &self,
            key: &MessageKey,
            emote: &Emote,
        ) -> Result<(), PlatformError> {
            self.record(Call::RemoveOwnReaction(*key, emote.clone()), self.fail_reactions)?;
            if let Some(on_message) = self.reactions.lock().unwrap().get_mut(key) {
                on_message.retain(|e| e != emote);
            }
            Ok(())
        }

        async fn remove_own_reactions(&self, key: &MessageKey) -> Result<(), PlatformError> {
            self.record(Call::RemoveOwnReactions(*key), self.fail_reactions)?;
            self.reactions.lock().unwrap().remove(key);
            Ok(())
        }

        async fn clear_reactions(&self, key: &MessageKey) -> Result<(), PlatformError> {
            self.record(Call::ClearReactions(*key), self.fail_reactions)?;
            self.reactions.lock().unwrap().remove(key);
            Ok(())
        }

        async fn member_roles(
            &self,
            _guild_id: GuildId,
            user_id: UserId,
        ) -> Result<Vec<RoleId>, PlatformError> {
            self.record(Call::MemberRoles(user_id), false)?;
            Ok(self.roles.get(&user_id).cloned().unwrap_or_default())
        }

        async fn grant_role(
            &self,
            _guild_id: GuildId,
            user_id: UserId,
            role_id: RoleId,
        ) -> Result<(), PlatformError> {
            self.record(Call::Grant(user_id, role_id), self.fail_roles)
        }

        async fn revoke_role(
            &self,
            _guild_id: GuildId,
            user_id: UserId,
            role_id: RoleId,
        ) -> Result<(), PlatformError> {
            self.record(Call::Revoke(user_id, role_id), self.fail_roles)
        }

        async fn voice_channel(
            &self,
            _guild_id: GuildId,
            channel_id: ChannelId,
        ) -> Result<Option<VoiceChannelSnapshot>, PlatformError> {
            self.record(Call::VoiceChannel(channel_id), false)?;
            Ok(self.channels.get(&channel_id).cloned())
        }

        async fn set_voice_status(
            &self,
            channel_id: ChannelId,
            status: &str,
        ) -> Result<(), PlatformError> {
            self.record(Call::SetVoiceStatus(channel_id, status.to_string()), false)
        }

        async fn rename_channel(
            &self,
            channel_id: ChannelId,
            name: &str,
        ) -> Result<(), PlatformError> {
            self.record(Call::Rename(channel_id, name.to_string()), false)
        }
    }
}
