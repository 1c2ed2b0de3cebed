//! Periodic check of the published release version.
//!
//! Runs on its own task and shares no state with event handling; it only sets
//! the bot's presence.

use std::time::Duration;

use semver::Version;
use serde::Deserialize;
use serenity::model::gateway::Activity;
use serenity::model::user::OnlineStatus;
use serenity::prelude::Context;

pub const CURRENT_VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Deserialize)]
struct Manifest {
    package: Package,
}

#[derive(Debug, Deserialize)]
struct Package {
    version: Version,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionStatus {
    UpToDate { current: Version },
    Outdated { current: Version, latest: Version },
}

impl VersionStatus {
    pub fn presence(&self) -> (Activity, OnlineStatus) {
        match self {
            VersionStatus::UpToDate { current } => (
                Activity::playing(format!("Current version: V{current}")),
                OnlineStatus::Online,
            ),
            VersionStatus::Outdated { latest, .. } => (
                Activity::playing(format!("Outdated. V{latest} is available")),
                OnlineStatus::DoNotDisturb,
            ),
        }
    }
}

pub fn parse_manifest(text: &str) -> Result<Version, anyhow::Error> {
    let manifest: Manifest = toml::from_str(text)?;
    Ok(manifest.package.version)
}

pub fn compare(current: Version, latest: Version) -> VersionStatus {
    if latest > current {
        VersionStatus::Outdated { current, latest }
    } else {
        VersionStatus::UpToDate { current }
    }
}

pub async fn check_version(
    client: &reqwest::Client,
    manifest_url: &str,
) -> Result<VersionStatus, anyhow::Error> {
    let text = client
        .get(manifest_url)
        .send()
        .await?
        .error_for_status()?
        .text()
        .await?;
    let latest = parse_manifest(&text)?;
    Ok(compare(Version::parse(CURRENT_VERSION)?, latest))
}

pub fn start(ctx: Context, client: reqwest::Client, manifest_url: String, interval: Duration) {
    tokio::spawn(async move {
        loop {
            match check_version(&client, &manifest_url).await {
                Ok(status) => {
                    match &status {
                        VersionStatus::UpToDate { current } => {
                            info!(%current, "up to date")
                        }
                        VersionStatus::Outdated { current, latest } => {
                            warn!(%current, %latest, "an update is available")
                        }
                    }
                    let (activity, online_status) = status.presence();
                    ctx.set_presence(Some(activity), online_status).await;
                }
                Err(e) => error!(error = %e, "error checking for updates"),
            }
            tokio::time::sleep(interval).await;
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_package_version() {
        let manifest = r#"
            [package]
            name = "role_bot"
            version = "1.4.2"

            [dependencies]
            anyhow = "1"
        "#;

        assert_eq!(parse_manifest(manifest).unwrap(), Version::new(1, 4, 2));
        assert!(parse_manifest("[workspace]\nmembers = []").is_err());
    }

    #[test]
    fn newer_release_is_outdated() {
        let status = compare(Version::new(1, 1, 0), Version::new(1, 2, 0));
        assert!(matches!(status, VersionStatus::Outdated { .. }));
        assert_eq!(status.presence().1, OnlineStatus::DoNotDisturb);

        let status = compare(Version::new(1, 1, 0), Version::new(1, 1, 0));
        assert_eq!(
            status,
            VersionStatus::UpToDate {
                current: Version::new(1, 1, 0)
            }
        );
        assert_eq!(status.presence().0.name, "Current version: V1.1.0");
    }

    #[test]
    fn running_version_parses() {
        assert!(Version::parse(CURRENT_VERSION).is_ok());
    }
}
