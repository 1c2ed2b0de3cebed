pub mod commands;
pub mod config;
pub mod emote;
pub mod error;
pub mod handler;
pub mod permissions;
pub mod platform;
pub mod reaction_roles;
pub mod resolver;
pub mod role_map;
pub mod settings;
pub mod store;
pub mod update;
pub mod utils;
pub mod voice_status;

#[macro_use]
extern crate tracing;

use serenity::prelude::Context;

use crate::platform::SerenityPlatform;
use crate::settings::Settings;
use crate::store::ConfigStore;

/// Shared by the event handler and every command.
pub struct BotState {
    pub settings: Settings,
    pub store: ConfigStore,
    pub http_client: reqwest::Client,
}

impl BotState {
    pub fn new(settings: Settings) -> Self {
        let store = ConfigStore::new(&settings.config_dir);
        Self {
            settings,
            store,
            http_client: reqwest::Client::new(),
        }
    }

    pub fn platform(&self, ctx: &Context) -> SerenityPlatform {
        SerenityPlatform::new(ctx.clone(), self.http_client.clone(), &self.settings.token)
    }
}
