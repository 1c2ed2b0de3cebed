//! Voice channel status: the most common tracked role among connected members,
//! rendered as a percentage bar.

use indexmap::IndexMap;
use rand::seq::IndexedRandom;
use rand::Rng;
use serenity::model::id::{ChannelId, GuildId};
use tracing::instrument;

use crate::config::{ChannelsConfig, GuildConfig};
use crate::platform::Platform;
use crate::store::ConfigStore;

const EVERYONE: &str = "@everyone";
const BAR_SLOTS: usize = 10;

/// Connected members of one voice channel, each as the names of their roles.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VoiceChannelSnapshot {
    pub name: String,
    pub members: Vec<Vec<String>>,
}

/// A channel is managed if it was authorized or its name carries the active icon.
pub fn is_eligible(
    channels: &ChannelsConfig,
    config: &GuildConfig,
    channel_id: ChannelId,
    name: &str,
) -> bool {
    channels.is_authorized(channel_id)
        || (!config.active_icon.is_empty() && name.ends_with(&config.active_icon))
}

/// Role names of one member that count towards the status.
pub fn valid_roles<'a>(
    config: &'a GuildConfig,
    roles: &'a [String],
) -> impl Iterator<Item = &'a str> + 'a {
    roles
        .iter()
        .map(String::as_str)
        .filter(|name| *name != EVERYONE)
        .filter(|name| config.roles_list.contains_key(*name) == config.white_list)
}

/// Occurrences of each valid role, in first-seen order.
pub fn tally<'a>(config: &'a GuildConfig, members: &'a [Vec<String>]) -> IndexMap<&'a str, usize> {
    let mut counts = IndexMap::new();
    for roles in members {
        for role in valid_roles(config, roles) {
            *counts.entry(role).or_insert(0) += 1;
        }
    }
    counts
}

/// Picks the role shown in the status.
///
/// With priority order the most frequent role wins and ties go to the role
/// listed first in "Roles List" (unlisted roles after listed ones, in first-seen
/// order). Without it, the random pool is the leading run of roles whose count
/// equals the count of the *least* frequent role, so the pool is empty unless all
/// counts are equal and no role is picked.
pub fn pick_role<'a, R: Rng + ?Sized>(
    config: &GuildConfig,
    counts: &IndexMap<&'a str, usize>,
    rng: &mut R,
) -> Option<(&'a str, usize)> {
    let mut sorted: Vec<(&'a str, usize)> = counts.iter().map(|(r, c)| (*r, *c)).collect();
    sorted.sort_by(|a, b| b.1.cmp(&a.1));

    if config.priority_order {
        let top = sorted.first()?.1;
        sorted
            .iter()
            .take_while(|(_, count)| *count == top)
            .min_by_key(|(role, _)| config.roles_list.get_index_of(*role).unwrap_or(usize::MAX))
            .copied()
    } else {
        let last = sorted.last()?.1;
        let pool: Vec<_> = sorted
            .iter()
            .take_while(|(_, count)| *count == last)
            .copied()
            .collect();
        pool.choose(rng).copied()
    }
}

pub fn render_bar(config: &GuildConfig, percent: usize, name: &str) -> String {
    let filled = (percent / 10).min(BAR_SLOTS);
    let partial = usize::from(percent % 10 != 0 && filled < BAR_SLOTS);
    let empty = BAR_SLOTS - filled - partial;

    format!(
        "{}{}{} {percent}% {name}",
        config.fill_character.repeat(filled),
        config.partial_character.repeat(partial),
        config.empty_character.repeat(empty),
    )
}

/// The status text for a channel, or `None` when it should be left alone.
pub fn compute_status<R: Rng + ?Sized>(
    config: &GuildConfig,
    snapshot: &VoiceChannelSnapshot,
    rng: &mut R,
) -> Option<String> {
    let counts = tally(config, &snapshot.members);
    let (role, count) = pick_role(config, &counts, rng)?;

    let percent = count * 100 / snapshot.members.len();
    Some(render_bar(config, percent, config.display_name(role)))
}

/// Recomputes and publishes the status of one voice channel. Returns the status
/// that was set, if any.
#[instrument(skip(platform, store))]
pub async fn refresh(
    platform: &dyn Platform,
    store: &ConfigStore,
    guild_id: GuildId,
    channel_id: ChannelId,
) -> Result<Option<String>, anyhow::Error> {
    let Some(snapshot) = platform.voice_channel(guild_id, channel_id).await? else {
        return Ok(None);
    };
    let channels = store.channels().await?;
    let config = store.guild(guild_id, None).await?;

    if !is_eligible(&channels, &config, channel_id, &snapshot.name) {
        return Ok(None);
    }

    let status = compute_status(&config, &snapshot, &mut rand::rng());
    match &status {
        Some(status) => platform.set_voice_status(channel_id, status).await?,
        None if !config.priority_order => {
            debug!("no unique random tie-break pool, status left untouched")
        }
        None => trace!("no tracked roles connected"),
    }
    Ok(status)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use tempfile::TempDir;

    use super::*;
    use crate::platform::fake::{Call, FakePlatform};

    fn config(roles: &[&str]) -> GuildConfig {
        let mut config = GuildConfig::defaults(None);
        config.use_alias = false;
        config.roles_list = roles.iter().map(|r| (r.to_string(), None)).collect();
        config
    }

    /// Builds members from `(role, how many members hold it)` groups.
    fn members(groups: &[(&str, usize)], others: usize) -> Vec<Vec<String>> {
        let mut members: Vec<Vec<String>> = groups
            .iter()
            .flat_map(|(role, n)| std::iter::repeat_with(move || vec![role.to_string()]).take(*n))
            .collect();
        members.extend(std::iter::repeat_with(Vec::new).take(others));
        members
    }

    fn snapshot(members: Vec<Vec<String>>) -> VoiceChannelSnapshot {
        VoiceChannelSnapshot {
            name: "Lobby".to_string(),
            members,
        }
    }

    fn rng() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    #[test]
    fn strict_maximum_wins_regardless_of_priority() {
        let config = config(&["C", "B", "A"]);
        let members = members(&[("A", 5), ("B", 3), ("C", 3)], 0);

        let counts = tally(&config, &members);

        assert_eq!(pick_role(&config, &counts, &mut rng()), Some(("A", 5)));
    }

    #[test]
    fn priority_order_breaks_ties() {
        let config = config(&["B", "A"]);
        let status = compute_status(&config, &snapshot(members(&[("A", 4), ("B", 4)], 2)), &mut rng());

        assert_eq!(status.as_deref(), Some("████░░░░░░ 40% B"));
    }

    #[test]
    fn partial_glyph_for_remainder() {
        let config = config(&["A"]);
        let status = compute_status(&config, &snapshot(members(&[("A", 3)], 4)), &mut rng());

        assert_eq!(status.as_deref(), Some("████▒░░░░░ 42% A"));
    }

    #[test]
    fn full_channel() {
        let config = config(&["A"]);
        let status = compute_status(&config, &snapshot(members(&[("A", 2)], 0)), &mut rng());

        assert_eq!(status.as_deref(), Some("██████████ 100% A"));
    }

    #[test]
    fn alias_shown_in_whitelist_mode() {
        let mut config = config(&["A"]);
        config.use_alias = true;
        config.roles_list.insert("A".to_string(), Some("Team A".to_string()));

        let status = compute_status(&config, &snapshot(members(&[("A", 1)], 0)), &mut rng());

        assert_eq!(status.as_deref(), Some("██████████ 100% Team A"));
    }

    #[test]
    fn random_tie_draws_from_all_tied() {
        let mut config = config(&["A", "B"]);
        config.priority_order = false;
        let members = members(&[("A", 3), ("B", 3)], 0);
        let counts = tally(&config, &members);

        let mut rng = rng();
        let winners: Vec<_> = (0..64)
            .filter_map(|_| pick_role(&config, &counts, &mut rng))
            .map(|(role, _)| role)
            .collect();

        assert_eq!(winners.len(), 64);
        assert!(winners.contains(&"A"));
        assert!(winners.contains(&"B"));
    }

    #[test]
    fn random_pool_follows_least_frequent_role() {
        let mut config = config(&["A", "B", "C"]);
        config.priority_order = false;

        let unequal = members(&[("A", 3), ("B", 1)], 0);
        let counts = tally(&config, &unequal);
        assert_eq!(pick_role(&config, &counts, &mut rng()), None);

        let single = members(&[("C", 2)], 3);
        let counts = tally(&config, &single);
        assert_eq!(pick_role(&config, &counts, &mut rng()), Some(("C", 2)));
    }

    #[test]
    fn nothing_tracked_means_no_update() {
        let config = config(&["A"]);

        assert_eq!(compute_status(&config, &snapshot(Vec::new()), &mut rng()), None);
        assert_eq!(
            compute_status(&config, &snapshot(members(&[("Z", 3)], 1)), &mut rng()),
            None
        );
    }

    #[test]
    fn blacklist_counts_unlisted_roles() {
        let mut config = config(&["Muted"]);
        config.white_list = false;
        let members = vec![
            vec!["@everyone".to_string(), "Muted".to_string(), "Guest".to_string()],
            vec!["Guest".to_string()],
        ];

        let counts = tally(&config, &members);

        assert_eq!(counts.len(), 1);
        assert_eq!(counts["Guest"], 2);
    }

    #[test]
    fn unlisted_ties_keep_first_seen_order() {
        let mut config = config(&[]);
        config.white_list = false;
        let members = members(&[("Y", 2), ("X", 2)], 0);

        let counts = tally(&config, &members);

        assert_eq!(pick_role(&config, &counts, &mut rng()), Some(("Y", 2)));
    }

    #[test]
    fn eligibility() {
        let mut channels = ChannelsConfig::default();
        let config = config(&[]);

        assert!(!is_eligible(&channels, &config, ChannelId(1), "Lobby"));
        assert!(is_eligible(&channels, &config, ChannelId(1), "Lobby 📊"));

        channels.authorize("Lobby", ChannelId(1));
        assert!(is_eligible(&channels, &config, ChannelId(1), "Lobby"));
    }

    #[test]
    fn empty_icon_only_admits_authorized_channels() {
        let mut channels = ChannelsConfig::default();
        let mut config = config(&[]);
        config.active_icon = String::new();

        assert!(!is_eligible(&channels, &config, ChannelId(2), "Lobby"));

        channels.authorize("Lobby", ChannelId(2));
        assert!(is_eligible(&channels, &config, ChannelId(2), "Lobby"));
    }

    #[tokio::test]
    async fn refresh_publishes_for_eligible_channels() {
        let dir = TempDir::new().unwrap();
        let store = ConfigStore::new(dir.path());
        store.save("configs-1", &config(&["A"])).await.unwrap();

        let platform = FakePlatform {
            channels: HashMap::from([
                (ChannelId(20), snapshot(members(&[("A", 1)], 1))),
                (
                    ChannelId(21),
                    VoiceChannelSnapshot {
                        name: "Games 📊".to_string(),
                        members: members(&[("A", 1)], 0),
                    },
                ),
            ]),
            ..Default::default()
        };

        let skipped = refresh(&platform, &store, GuildId(1), ChannelId(20)).await.unwrap();
        let set = refresh(&platform, &store, GuildId(1), ChannelId(21)).await.unwrap();

        assert_eq!(skipped, None);
        assert_eq!(set.as_deref(), Some("██████████ 100% A"));
        assert_eq!(
            platform.calls(),
            [
                Call::VoiceChannel(ChannelId(20)),
                Call::VoiceChannel(ChannelId(21)),
                Call::SetVoiceStatus(ChannelId(21), "██████████ 100% A".to_string()),
            ]
        );
    }
}
