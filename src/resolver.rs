//! Turns reaction events on bound messages into role grants and revocations.

use serenity::model::channel::Reaction;
use serenity::model::id::{RoleId, UserId};

use crate::emote::Emote;
use crate::error::PlatformError;
use crate::platform::Platform;
use crate::role_map::{MessageKey, RoleBinding, RoleMap};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReactionKind {
    Add,
    Remove,
}

#[derive(Debug, Clone)]
pub struct ReactionEvent {
    pub key: MessageKey,
    pub emote: Emote,
    pub user_id: UserId,
    pub kind: ReactionKind,
    /// Roles the member held when the event was sent, if the event carried them.
    pub held_roles: Option<Vec<RoleId>>,
}

impl ReactionEvent {
    /// `None` for reactions outside guilds or with an emote kind we do not know.
    pub fn from_reaction(reaction: &Reaction, kind: ReactionKind) -> Option<Self> {
        Some(Self {
            key: MessageKey::new(reaction.guild_id?, reaction.channel_id, reaction.message_id),
            emote: Emote::from_reaction(&reaction.emoji)?,
            user_id: reaction.user_id?,
            kind,
            held_roles: reaction.member.as_ref().map(|member| member.roles.clone()),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleChange {
    Granted(RoleId),
    Revoked(RoleId),
    /// The member already was in the requested state.
    Unchanged(RoleId),
}

/// The binding an event refers to, if any.
pub fn resolve<'a>(role_map: &'a RoleMap, event: &ReactionEvent) -> Option<&'a RoleBinding> {
    role_map
        .bindings(&event.key)
        .iter()
        .find(|binding| binding.emote == event.emote)
}

/// Applies one reaction event. Events on unbound messages or with unbound
/// emotes return `Ok(None)` without touching the platform.
pub async fn handle(
    platform: &dyn Platform,
    role_map: &RoleMap,
    event: &ReactionEvent,
) -> Result<Option<RoleChange>, PlatformError> {
    let Some(binding) = resolve(role_map, event) else {
        return Ok(None);
    };
    let role_id = binding.role_id;
    let guild_id = event.key.guild_id;

    let held = match &event.held_roles {
        Some(roles) => roles.contains(&role_id),
        None => platform
            .member_roles(guild_id, event.user_id)
            .await?
            .contains(&role_id),
    };

    let change = match (event.kind, held) {
        (ReactionKind::Add, false) => {
            platform.grant_role(guild_id, event.user_id, role_id).await?;
            RoleChange::Granted(role_id)
        }
        (ReactionKind::Remove, true) => {
            platform.revoke_role(guild_id, event.user_id, role_id).await?;
            RoleChange::Revoked(role_id)
        }
        _ => RoleChange::Unchanged(role_id),
    };
    Ok(Some(change))
}
