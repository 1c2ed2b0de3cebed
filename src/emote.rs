//! Canonical emote identity.
//!
//! An emote is either a literal unicode symbol or a custom guild emote. Custom
//! emotes arrive as `<:name:id>`, `<a:name:id>` or a bare numeric id and are all
//! normalized to [`Emote::Custom`], which compares by id only. That way a binding
//! stored in either form matches a reaction event carrying the other.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serenity::model::channel::ReactionType;
use serenity::model::id::EmojiId;

use crate::error::EmoteParseError;

#[derive(Debug, Clone)]
pub enum Emote {
    Unicode(String),
    Custom {
        id: EmojiId,
        name: Option<String>,
        animated: bool,
    },
}

impl Emote {
    pub fn custom_id(&self) -> Option<EmojiId> {
        match self {
            Emote::Custom { id, .. } => Some(*id),
            Emote::Unicode(_) => None,
        }
    }

    pub fn from_reaction(reaction: &ReactionType) -> Option<Self> {
        match reaction {
            ReactionType::Unicode(symbol) => Some(Emote::Unicode(symbol.clone())),
            ReactionType::Custom { animated, id, name } => Some(Emote::Custom {
                id: *id,
                name: name.clone(),
                animated: *animated,
            }),
            _ => None,
        }
    }

    pub fn to_reaction(&self) -> ReactionType {
        match self {
            Emote::Unicode(symbol) => ReactionType::Unicode(symbol.clone()),
            Emote::Custom { id, name, animated } => ReactionType::Custom {
                animated: *animated,
                id: *id,
                name: name.clone(),
            },
        }
    }
}

impl PartialEq for Emote {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Emote::Unicode(a), Emote::Unicode(b)) => a == b,
            (Emote::Custom { id: a, .. }, Emote::Custom { id: b, .. }) => a == b,
            _ => false,
        }
    }
}

impl Eq for Emote {}

impl fmt::Display for Emote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Emote::Unicode(symbol) => f.write_str(symbol),
            Emote::Custom {
                id,
                name: Some(name),
                animated,
            } => {
                let prefix = if *animated { "a" } else { "" };
                write!(f, "<{prefix}:{name}:{id}>")
            }
            Emote::Custom { id, name: None, .. } => write!(f, "{id}"),
        }
    }
}

impl FromStr for Emote {
    type Err = EmoteParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() || s.contains(char::is_whitespace) {
            return Err(EmoteParseError(s.to_string()));
        }

        if let Ok(id) = s.parse::<u64>() {
            return Ok(Emote::Custom {
                id: EmojiId(id),
                name: None,
                animated: false,
            });
        }

        if let Some(inner) = s.strip_prefix('<').and_then(|s| s.strip_suffix('>')) {
            let (animated, rest) = match inner.strip_prefix("a:") {
                Some(rest) => (true, rest),
                None => (false, inner.strip_prefix(':').unwrap_or(inner)),
            };
            let (name, id) = rest
                .rsplit_once(':')
                .ok_or_else(|| EmoteParseError(s.to_string()))?;
            let id = id
                .parse::<u64>()
                .map_err(|_| EmoteParseError(s.to_string()))?;
            return Ok(Emote::Custom {
                id: EmojiId(id),
                name: (!name.is_empty()).then(|| name.to_string()),
                animated,
            });
        }

        Ok(Emote::Unicode(s.to_string()))
    }
}

// Custom emotes without a known name are kept as bare integers, which is how
// older files stored them.
impl Serialize for Emote {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Emote::Custom { id, name: None, .. } => serializer.serialize_u64(id.0),
            _ => serializer.collect_str(self),
        }
    }
}

impl<'de> Deserialize<'de> for Emote {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Stored {
            Id(u64),
            Text(String),
        }

        match Stored::deserialize(deserializer)? {
            Stored::Id(id) => Ok(Emote::Custom {
                id: EmojiId(id),
                name: None,
                animated: false,
            }),
            Stored::Text(text) => text.parse().map_err(serde::de::Error::custom),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_custom_forms() {
        let full: Emote = "<:pog:123456>".parse().unwrap();
        let animated: Emote = "<a:dance:42>".parse().unwrap();
        let bare: Emote = "123456".parse().unwrap();

        assert_eq!(full.custom_id(), Some(EmojiId(123456)));
        assert_eq!(animated.to_string(), "<a:dance:42>");
        assert_eq!(full, bare);
    }

    #[test]
    fn unicode_compares_by_symbol() {
        let a: Emote = "🎮".parse().unwrap();
        let b: Emote = "🎮".parse().unwrap();
        let c: Emote = "🎨".parse().unwrap();

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(a, "123".parse::<Emote>().unwrap());
    }

    #[test]
    fn rejects_blank_and_spaced() {
        assert!("".parse::<Emote>().is_err());
        assert!("🎮 🎨".parse::<Emote>().is_err());
        assert!("<:broken>".parse::<Emote>().is_err());
    }

    #[test]
    fn stored_forms() {
        let legacy: Emote = serde_json::from_str("987").unwrap();
        assert_eq!(legacy.custom_id(), Some(EmojiId(987)));
        assert_eq!(serde_json::to_string(&legacy).unwrap(), "987");

        let named: Emote = serde_json::from_str("\"<:pog:987>\"").unwrap();
        assert_eq!(named, legacy);
        assert_eq!(serde_json::to_string(&named).unwrap(), "\"<:pog:987>\"");
    }

    #[test]
    fn matches_reaction_events() {
        let stored: Emote = "987".parse().unwrap();
        let event = ReactionType::Custom {
            animated: false,
            id: EmojiId(987),
            name: Some("pog".to_string()),
        };

        assert_eq!(Emote::from_reaction(&event), Some(stored));
    }
}
