use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serenity::model::id::{ChannelId, GuildId, MessageId, RoleId};

use crate::config::snowflake;
use crate::emote::Emote;
use crate::error::{LinkError, RoleMapError};

/// Addresses a bound message. Stored and displayed as its message link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MessageKey {
    pub guild_id: GuildId,
    pub channel_id: ChannelId,
    pub message_id: MessageId,
}

impl MessageKey {
    pub fn new(guild_id: GuildId, channel_id: ChannelId, message_id: MessageId) -> Self {
        Self {
            guild_id,
            channel_id,
            message_id,
        }
    }
}

impl fmt::Display for MessageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "https://discord.com/channels/{}/{}/{}",
            self.guild_id, self.channel_id, self.message_id
        )
    }
}

impl FromStr for MessageKey {
    type Err = LinkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || LinkError(s.to_string());
        let link = s.trim().trim_end_matches('/');

        let mut segments = link.rsplit('/');
        let mut next_id = || {
            segments
                .next()
                .and_then(|segment| segment.parse::<u64>().ok())
                .ok_or_else(err)
        };
        let message_id = next_id()?;
        let channel_id = next_id()?;
        let guild_id = next_id()?;

        if segments.next() != Some("channels") {
            return Err(err());
        }

        Ok(Self::new(
            GuildId(guild_id),
            ChannelId(channel_id),
            MessageId(message_id),
        ))
    }
}

impl TryFrom<String> for MessageKey {
    type Error = LinkError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<MessageKey> for String {
    fn from(value: MessageKey) -> Self {
        value.to_string()
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct RoleBinding {
    #[serde(rename = "Role Name")]
    pub role_name: String,
    #[serde(rename = "Role ID", with = "snowflake")]
    pub role_id: RoleId,
    #[serde(rename = "Role Emote")]
    pub emote: Emote,
}

impl RoleBinding {
    pub fn new(role_id: RoleId, role_name: impl Into<String>, emote: Emote) -> Self {
        Self {
            role_name: role_name.into(),
            role_id,
            emote,
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct BoundMessage {
    #[serde(rename = "Roles", default)]
    pub roles: Vec<RoleBinding>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindOutcome {
    Added,
    /// The role was already bound with another emote. The caller swaps the
    /// reaction on the message.
    Replaced { old: Emote, new: Emote },
    Unchanged,
}

/// Message to ordered role bindings.
///
/// Within one message no two bindings share a role id or an emote. Messages
/// without bindings have no entry.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(transparent)]
pub struct RoleMap(IndexMap<MessageKey, BoundMessage>);

impl RoleMap {
    pub fn bindings(&self, key: &MessageKey) -> &[RoleBinding] {
        self.0.get(key).map_or(&[], |message| message.roles.as_slice())
    }

    pub fn contains(&self, key: &MessageKey) -> bool {
        self.0.contains_key(key)
    }

    pub fn messages(&self) -> impl Iterator<Item = &MessageKey> {
        self.0.keys()
    }

    pub fn bind(
        &mut self,
        key: &MessageKey,
        binding: RoleBinding,
    ) -> Result<BindOutcome, RoleMapError> {
        let existing = self.bindings(key);

        let current = existing.iter().find(|b| b.role_id == binding.role_id);
        if current.is_some_and(|b| b.emote == binding.emote) {
            return Ok(BindOutcome::Unchanged);
        }

        // also checked for replacements, so the new emote stays unique
        if let Some(other) = existing
            .iter()
            .find(|b| b.role_id != binding.role_id && b.emote == binding.emote)
        {
            return Err(RoleMapError::EmoteCollision {
                emote: binding.emote,
                role_id: other.role_id,
            });
        }

        let roles = &mut self.0.entry(*key).or_default().roles;
        match roles.iter_mut().find(|b| b.role_id == binding.role_id) {
            Some(current) => {
                let old = std::mem::replace(&mut current.emote, binding.emote.clone());
                current.role_name = binding.role_name;
                Ok(BindOutcome::Replaced {
                    old,
                    new: binding.emote,
                })
            }
            None => {
                roles.push(binding);
                Ok(BindOutcome::Added)
            }
        }
    }

    /// Removes the binding for `role_id` and returns its emote, so the caller
    /// can strip the reaction.
    pub fn unbind(&mut self, key: &MessageKey, role_id: RoleId) -> Result<Emote, RoleMapError> {
        let message = self
            .0
            .get_mut(key)
            .ok_or(RoleMapError::BindingNotFound(role_id))?;
        let index = message
            .roles
            .iter()
            .position(|b| b.role_id == role_id)
            .ok_or(RoleMapError::BindingNotFound(role_id))?;

        let removed = message.roles.remove(index);
        if message.roles.is_empty() {
            self.0.shift_remove(key);
        }
        Ok(removed.emote)
    }

    /// Swaps in a whole new binding list for the message and returns the previous
    /// one. Nothing changes if the new list repeats a role or an emote.
    pub fn bulk_replace(
        &mut self,
        key: &MessageKey,
        bindings: Vec<RoleBinding>,
    ) -> Result<Vec<RoleBinding>, RoleMapError> {
        validate(&bindings)?;

        let previous = if bindings.is_empty() {
            self.0.shift_remove(key)
        } else {
            self.0.insert(*key, BoundMessage { roles: bindings })
        };
        Ok(previous.map(|message| message.roles).unwrap_or_default())
    }
}

fn validate(bindings: &[RoleBinding]) -> Result<(), RoleMapError> {
    for (index, binding) in bindings.iter().enumerate() {
        let earlier = &bindings[..index];
        if earlier.iter().any(|b| b.role_id == binding.role_id) {
            return Err(RoleMapError::DuplicateRole(binding.role_id));
        }
        if earlier.iter().any(|b| b.emote == binding.emote) {
            return Err(RoleMapError::DuplicateEmote(binding.emote.clone()));
        }
    }
    Ok(())
}
