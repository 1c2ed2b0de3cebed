//! JSON document storage under the config directory.
//!
//! Every document is read and written whole. Callers that read, modify and write
//! back a document hold [`ConfigStore::lock`] for that document while doing so,
//! since serenity dispatches events concurrently.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::Value;
use serenity::model::id::GuildId;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::instrument;

use crate::config::{guild_document, ChannelsConfig, GuildConfig, CHANNELS_DOCUMENT};
use crate::error::ConfigError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Channels,
    Guild,
}

impl DocumentKind {
    pub fn of(name: &str) -> Result<Self, ConfigError> {
        if name == CHANNELS_DOCUMENT {
            Ok(DocumentKind::Channels)
        } else if name.starts_with("configs-") {
            Ok(DocumentKind::Guild)
        } else {
            Err(ConfigError::UnknownDocumentKind(name.to_string()))
        }
    }

    pub fn defaults(self, server_name: Option<&str>) -> Result<Value, ConfigError> {
        let value = match self {
            DocumentKind::Channels => serde_json::to_value(ChannelsConfig::default())?,
            DocumentKind::Guild => serde_json::to_value(GuildConfig::defaults(server_name))?,
        };
        Ok(value)
    }
}

#[derive(Debug)]
pub struct ConfigStore {
    dir: PathBuf,
    locks: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl ConfigStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Creates the config directory if it is missing.
    pub async fn prepare(&self) -> Result<(), ConfigError> {
        if tokio::fs::metadata(&self.dir).await.is_err() {
            info!(path = %self.dir.display(), "creating missing config directory");
            tokio::fs::create_dir_all(&self.dir).await?;
        }
        Ok(())
    }

    /// Serializes read-modify-write access to one document.
    pub async fn lock(&self, name: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(locks.entry(name.to_string()).or_default())
        };
        lock.lock_owned().await
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.json"))
    }

    async fn read(&self, name: &str) -> Result<Option<Value>, ConfigError> {
        match tokio::fs::read(self.path(name)).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    /// Adds every top-level default key missing from the stored document and
    /// writes the result back if anything was added. Existing keys are kept as is.
    #[instrument(skip(self))]
    pub async fn ensure_integrity(
        &self,
        name: &str,
        server_name: Option<&str>,
    ) -> Result<Value, ConfigError> {
        let kind = DocumentKind::of(name)?;
        let defaults = kind.defaults(server_name)?;

        let (document, changed) = match self.read(name).await? {
            Some(Value::Object(mut stored)) => {
                let mut changed = false;
                if let Value::Object(defaults) = defaults {
                    for (key, value) in defaults {
                        if !stored.contains_key(&key) {
                            warn!(document = name, entry = %key, "missing entry, adding default");
                            stored.insert(key, value);
                            changed = true;
                        }
                    }
                }
                (Value::Object(stored), changed)
            }
            Some(_) => return Err(ConfigError::NotAnObject(name.to_string())),
            None => {
                info!(document = name, "generating new document");
                (defaults, true)
            }
        };

        if changed {
            self.save_value(name, &document).await?;
        }
        Ok(document)
    }

    /// Reads a document, seeding it with its defaults if it does not exist yet.
    pub async fn load_value(&self, name: &str) -> Result<Value, ConfigError> {
        match self.read(name).await? {
            Some(value) => Ok(value),
            None => self.ensure_integrity(name, None).await,
        }
    }

    /// Overwrites the whole document.
    pub async fn save_value(&self, name: &str, document: &Value) -> Result<(), ConfigError> {
        self.save(name, document).await
    }

    /// Reads one top-level entry, healing the document once if it is missing.
    pub async fn field(&self, name: &str, field: &str) -> Result<Value, ConfigError> {
        let mut document = self.load_value(name).await?;
        if document.get(field).is_none() {
            document = self.ensure_integrity(name, None).await?;
        }
        document
            .get_mut(field)
            .map(Value::take)
            .ok_or_else(|| ConfigError::MissingRequiredField {
                document: name.to_string(),
                field: field.to_string(),
            })
    }

    pub async fn load<T: DeserializeOwned>(
        &self,
        name: &str,
        server_name: Option<&str>,
    ) -> Result<T, ConfigError> {
        let document = self.ensure_integrity(name, server_name).await?;
        Ok(serde_json::from_value(document)?)
    }

    pub async fn save<T: Serialize + ?Sized>(
        &self,
        name: &str,
        document: &T,
    ) -> Result<(), ConfigError> {
        let mut buf = Vec::new();
        let mut serializer =
            serde_json::Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"    "));
        document.serialize(&mut serializer)?;

        let path = self.path(name);
        let staging = path.with_extension("json.tmp");
        tokio::fs::write(&staging, &buf).await?;
        tokio::fs::rename(&staging, &path).await?;
        debug!(document = name, "saved document");
        Ok(())
    }

    pub async fn guild(
        &self,
        guild_id: GuildId,
        server_name: Option<&str>,
    ) -> Result<GuildConfig, ConfigError> {
        self.load(&guild_document(guild_id), server_name).await
    }

    pub async fn channels(&self) -> Result<ChannelsConfig, ConfigError> {
        self.load(CHANNELS_DOCUMENT, None).await
    }

    pub async fn save_channels(&self, channels: &ChannelsConfig) -> Result<(), ConfigError> {
        self.save(CHANNELS_DOCUMENT, channels).await
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use tempfile::TempDir;

    use super::*;

    fn store() -> (TempDir, ConfigStore) {
        let dir = TempDir::new().unwrap();
        let store = ConfigStore::new(dir.path());
        (dir, store)
    }

    async fn raw(store: &ConfigStore, name: &str) -> String {
        tokio::fs::read_to_string(store.path(name)).await.unwrap()
    }

    #[tokio::test]
    async fn seeds_missing_documents() {
        let (_dir, store) = store();

        let channels = store.load_value("channels").await.unwrap();
        assert_eq!(channels, json!({"Channels": {}, "Role Bot": {}}));

        let guild = store.guild(GuildId(7), Some("Moose")).await.unwrap();
        assert_eq!(guild.server_name.as_deref(), Some("Moose"));
        assert!(store.path("configs-7").exists());
    }

    #[tokio::test]
    async fn heals_without_overwriting() {
        let (_dir, store) = store();
        store
            .save_value("configs-1", &json!({"White List": false, "Active Icon": "🔊"}))
            .await
            .unwrap();

        let healed = store.ensure_integrity("configs-1", None).await.unwrap();

        assert_eq!(healed["White List"], false);
        assert_eq!(healed["Active Icon"], "🔊");
        assert_eq!(healed["Priority Order"], true);
        assert_eq!(healed["Fill Character"], "\u{2588}");

        let on_disk: Value = serde_json::from_str(&raw(&store, "configs-1").await).unwrap();
        assert_eq!(on_disk, healed);
    }

    #[tokio::test]
    async fn integrity_is_idempotent() {
        let (_dir, store) = store();
        store
            .save_value("channels", &json!({"Channels": {"Lobby": 5}}))
            .await
            .unwrap();

        let once = store.ensure_integrity("channels", None).await.unwrap();
        let text_once = raw(&store, "channels").await;
        let twice = store.ensure_integrity("channels", None).await.unwrap();

        assert_eq!(once, twice);
        assert_eq!(text_once, raw(&store, "channels").await);
    }

    #[tokio::test]
    async fn guild_integrity_is_idempotent() {
        let (_dir, store) = store();
        store
            .save_value(
                "configs-9",
                &json!({"Use Alias": false, "Roles List": {"Tank": null}, "Custom": 1}),
            )
            .await
            .unwrap();

        let once = store.ensure_integrity("configs-9", Some("Moose")).await.unwrap();
        let text_once = raw(&store, "configs-9").await;
        let twice = store.ensure_integrity("configs-9", Some("Moose")).await.unwrap();

        assert_eq!(once, twice);
        assert_eq!(text_once, raw(&store, "configs-9").await);
        assert_eq!(once["Use Alias"], false);
        assert_eq!(once["Roles List"], json!({"Tank": null}));
        assert_eq!(once["Custom"], 1);
        assert_eq!(once["Server Name"], "Moose");
    }

    #[tokio::test]
    async fn unknown_document_kind() {
        let (_dir, store) = store();

        let err = store.ensure_integrity("secrets", None).await.unwrap_err();
        assert!(matches!(err, ConfigError::UnknownDocumentKind(name) if name == "secrets"));
    }

    #[tokio::test]
    async fn missing_field_after_healing() {
        let (_dir, store) = store();

        let icon = store.field("configs-3", "Active Icon").await.unwrap();
        assert_eq!(icon, "📊");

        let err = store.field("configs-3", "Nonexistent").await.unwrap_err();
        assert!(matches!(err, ConfigError::MissingRequiredField { .. }));
    }

    #[tokio::test]
    async fn save_overwrites_whole_document() {
        let (_dir, store) = store();
        store
            .save_value("channels", &json!({"Channels": {"A": 1}, "Extra": true}))
            .await
            .unwrap();
        store
            .save_value("channels", &json!({"Channels": {}}))
            .await
            .unwrap();

        let stored = store.read("channels").await.unwrap().unwrap();
        assert_eq!(stored, json!({"Channels": {}}));
    }

    #[tokio::test]
    async fn rejects_non_object_documents() {
        let (_dir, store) = store();
        store.save_value("channels", &json!([1, 2])).await.unwrap();

        let err = store.ensure_integrity("channels", None).await.unwrap_err();
        assert!(matches!(err, ConfigError::NotAnObject(_)));
    }
}
