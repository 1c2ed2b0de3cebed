use serenity::model::id::RoleId;

use crate::emote::Emote;

/// Failures reading, healing or writing a stored document.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("the document \"{0}\" is not a recognised type")]
    UnknownDocumentKind(String),
    #[error("requested entry \"{field}\" not present in config type: {document}.json")]
    MissingRequiredField { document: String, field: String },
    #[error("{0}.json does not contain a JSON object")]
    NotAnObject(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// User-facing rejections from the role map. None of these mutate state.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RoleMapError {
    #[error("the emote {emote} is already used for the role <@&{role_id}>")]
    EmoteCollision { emote: Emote, role_id: RoleId },
    #[error("the message has no reaction role for <@&{0}>")]
    BindingNotFound(RoleId),
    #[error("the role <@&{0}> is listed more than once")]
    DuplicateRole(RoleId),
    #[error("the emote {0} is listed more than once")]
    DuplicateEmote(Emote),
}

/// A call to the chat platform failed. Logged and dropped, never retried.
#[derive(Debug, thiserror::Error)]
pub enum PlatformError {
    #[error("discord error: {0}")]
    Discord(#[from] serenity::Error),
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{0}")]
    Other(String),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("\"{0}\" is not a message link")]
pub struct LinkError(pub String);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("\"{0}\" is not an emote")]
pub struct EmoteParseError(pub String);
