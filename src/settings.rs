use std::env;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context as _;

const DEFAULT_CONFIG_DIR: &str = "config";
const DEFAULT_UPDATE_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

/// Process settings, read from the environment (and `.env`).
#[derive(Clone)]
pub struct Settings {
    pub token: String,
    pub config_dir: PathBuf,
    /// `Cargo.toml` of the latest release. Update checks are off without it.
    pub update_manifest_url: Option<String>,
    pub update_check_interval: Duration,
}

impl Settings {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        let token = env::var("DISCORD_TOKEN").context("DISCORD_TOKEN is not set")?;
        Self::from_vars(token, |name| env::var(name).ok())
    }

    fn from_vars(
        token: String,
        var: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, anyhow::Error> {
        let token = token.trim().to_string();
        if token.is_empty() {
            anyhow::bail!("DISCORD_TOKEN is empty");
        }

        let update_check_interval = match var("UPDATE_CHECK_INTERVAL") {
            Some(value) => humantime::parse_duration(&value)
                .with_context(|| format!("invalid UPDATE_CHECK_INTERVAL \"{value}\""))?,
            None => DEFAULT_UPDATE_INTERVAL,
        };

        Ok(Self {
            token,
            config_dir: var("CONFIG_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_DIR)),
            update_manifest_url: var("UPDATE_MANIFEST_URL").filter(|url| !url.is_empty()),
            update_check_interval,
        })
    }
}
