use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serenity::model::id::{ChannelId, GuildId};

use crate::role_map::RoleMap;

pub const CHANNELS_DOCUMENT: &str = "channels";

pub fn guild_document(guild_id: GuildId) -> String {
    format!("configs-{guild_id}")
}

/// Per-guild settings, stored as `configs-<guild id>.json`.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct GuildConfig {
    #[serde(rename = "Server Name")]
    pub server_name: Option<String>,
    #[serde(rename = "White List")]
    pub white_list: bool,
    #[serde(rename = "Use Alias")]
    pub use_alias: bool,
    #[serde(rename = "Active Icon")]
    pub active_icon: String,
    #[serde(rename = "Priority Order")]
    pub priority_order: bool,
    /// Role name to alias. Iteration order is the tie-break priority.
    #[serde(rename = "Roles List")]
    pub roles_list: IndexMap<String, Option<String>>,
    #[serde(rename = "Fill Character")]
    pub fill_character: String,
    #[serde(rename = "Partial Character")]
    pub partial_character: String,
    #[serde(rename = "Empty Character")]
    pub empty_character: String,
    #[serde(rename = "Role Manager Handles")]
    pub role_manager_handles: Vec<String>,
    #[serde(rename = "Role Manager Roles")]
    pub role_manager_roles: Vec<u64>,
    #[serde(rename = "Channel Manager Handles")]
    pub channel_manager_handles: Vec<String>,
    #[serde(rename = "Channel Manager Roles")]
    pub channel_manager_roles: Vec<u64>,
}

impl GuildConfig {
    pub fn defaults(server_name: Option<&str>) -> Self {
        let roles_list = [
            ("First Role Name", "1st Alias"),
            ("Second Role Name", "2nd Alias"),
            ("Third Role Name", "3rd Alias"),
        ]
        .into_iter()
        .map(|(name, alias)| (name.to_string(), Some(alias.to_string())))
        .collect();

        Self {
            server_name: server_name.map(str::to_string),
            white_list: true,
            use_alias: true,
            active_icon: "📊".to_string(),
            priority_order: true,
            roles_list,
            fill_character: "\u{2588}".to_string(),
            partial_character: "\u{2592}".to_string(),
            empty_character: "\u{2591}".to_string(),
            role_manager_handles: Vec::new(),
            role_manager_roles: Vec::new(),
            channel_manager_handles: Vec::new(),
            channel_manager_roles: Vec::new(),
        }
    }

    /// Name shown in the status for a role: its alias when aliases apply.
    pub fn display_name<'a>(&'a self, role: &'a str) -> &'a str {
        if !(self.white_list && self.use_alias) {
            return role;
        }
        match self.roles_list.get(role) {
            Some(Some(alias)) if !alias.is_empty() => alias.as_str(),
            _ => role,
        }
    }
}

/// The global document: authorized voice channels and the reaction role map.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
pub struct ChannelsConfig {
    /// Channel name at the time it was added, to channel id.
    #[serde(rename = "Channels")]
    pub channels: IndexMap<String, u64>,
    #[serde(rename = "Role Bot")]
    pub role_bot: RoleMap,
}

impl ChannelsConfig {
    pub fn is_authorized(&self, channel_id: ChannelId) -> bool {
        self.channels.values().any(|id| *id == channel_id.0)
    }

    /// Returns false if the channel was already authorized.
    pub fn authorize(&mut self, name: &str, channel_id: ChannelId) -> bool {
        if self.is_authorized(channel_id) {
            return false;
        }
        self.channels.insert(name.to_string(), channel_id.0);
        true
    }

    /// Returns false if the channel was not authorized.
    pub fn revoke(&mut self, channel_id: ChannelId) -> bool {
        let before = self.channels.len();
        self.channels.retain(|_, id| *id != channel_id.0);
        self.channels.len() != before
    }
}

/// Stores role ids as plain integers, the format existing files use.
pub(crate) mod snowflake {
    use serde::{Deserialize, Deserializer, Serializer};
    use serenity::model::id::RoleId;

    pub fn serialize<S: Serializer>(id: &RoleId, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(id.0)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<RoleId, D::Error> {
        u64::deserialize(deserializer).map(RoleId)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_document_field_names() {
        let value = serde_json::to_value(GuildConfig::defaults(Some("Moose"))).unwrap();
        let object = value.as_object().unwrap();

        for key in [
            "Server Name",
            "White List",
            "Use Alias",
            "Active Icon",
            "Priority Order",
            "Roles List",
            "Fill Character",
            "Partial Character",
            "Empty Character",
            "Role Manager Handles",
            "Role Manager Roles",
            "Channel Manager Handles",
            "Channel Manager Roles",
        ] {
            assert!(object.contains_key(key), "missing {key}");
        }
        assert_eq!(object["Server Name"], "Moose");
    }

    #[test]
    fn alias_only_in_whitelist_alias_mode() {
        let mut config = GuildConfig::defaults(None);
        config.roles_list.insert("Blank".to_string(), Some(String::new()));
        config.roles_list.insert("Null".to_string(), None);

        assert_eq!(config.display_name("First Role Name"), "1st Alias");
        assert_eq!(config.display_name("Blank"), "Blank");
        assert_eq!(config.display_name("Null"), "Null");
        assert_eq!(config.display_name("Unlisted"), "Unlisted");

        config.use_alias = false;
        assert_eq!(config.display_name("First Role Name"), "First Role Name");

        config.use_alias = true;
        config.white_list = false;
        assert_eq!(config.display_name("First Role Name"), "First Role Name");
    }

    #[test]
    fn channel_authorization() {
        let mut channels = ChannelsConfig::default();

        assert!(channels.authorize("General", ChannelId(10)));
        assert!(!channels.authorize("General renamed", ChannelId(10)));
        assert!(channels.is_authorized(ChannelId(10)));
        assert!(channels.revoke(ChannelId(10)));
        assert!(!channels.revoke(ChannelId(10)));
        assert!(!channels.is_authorized(ChannelId(10)));
    }
}
