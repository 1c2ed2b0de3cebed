//! Role map edits that keep the reactions on the bound message in sync.
//!
//! The external reaction call always runs before the document is saved, so a
//! failed call never leaves a binding without its reaction.

use serenity::model::id::RoleId;

use crate::config::CHANNELS_DOCUMENT;
use crate::emote::Emote;
use crate::error::{ConfigError, PlatformError, RoleMapError};
use crate::platform::Platform;
use crate::role_map::{BindOutcome, MessageKey, RoleBinding};
use crate::store::ConfigStore;

#[derive(Debug, thiserror::Error)]
pub enum ReactionRoleError {
    #[error(transparent)]
    RoleMap(#[from] RoleMapError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Platform(#[from] PlatformError),
    #[error("the message {0} has no reaction roles")]
    NotStored(MessageKey),
}

pub async fn add_role(
    platform: &dyn Platform,
    store: &ConfigStore,
    key: &MessageKey,
    binding: RoleBinding,
) -> Result<BindOutcome, ReactionRoleError> {
    platform.fetch_message(key).await?;

    let _guard = store.lock(CHANNELS_DOCUMENT).await;
    let mut channels = store.channels().await?;
    let emote = binding.emote.clone();

    let outcome = channels.role_bot.bind(key, binding)?;
    match &outcome {
        BindOutcome::Added => platform.add_reaction(key, &emote).await?,
        BindOutcome::Replaced { old, new } => {
            platform.add_reaction(key, new).await?;
            if let Err(why) = platform.remove_own_reaction(key, old).await {
                warn!(message = %key, error = %why, "failed to remove old reaction, undoing swap");
                if let Err(why) = platform.remove_own_reaction(key, new).await {
                    error!(message = %key, error = %why, "failed to remove new reaction");
                }
                return Err(why.into());
            }
        }
        BindOutcome::Unchanged => return Ok(outcome),
    }

    store.save_channels(&channels).await?;
    info!(message = %key, ?outcome, "role binding stored");
    Ok(outcome)
}

pub async fn remove_role(
    platform: &dyn Platform,
    store: &ConfigStore,
    key: &MessageKey,
    role_id: RoleId,
) -> Result<Emote, ReactionRoleError> {
    let _guard = store.lock(CHANNELS_DOCUMENT).await;
    let mut channels = store.channels().await?;
    if !channels.role_bot.contains(key) {
        return Err(ReactionRoleError::NotStored(*key));
    }

    let emote = channels.role_bot.unbind(key, role_id)?;
    platform.remove_own_reaction(key, &emote).await?;

    store.save_channels(&channels).await?;
    info!(message = %key, %role_id, "role binding removed");
    Ok(emote)
}

/// Replaces every binding on the message and rebuilds its reactions.
pub async fn bulk_add(
    platform: &dyn Platform,
    store: &ConfigStore,
    key: &MessageKey,
    bindings: Vec<RoleBinding>,
) -> Result<(), ReactionRoleError> {
    platform.fetch_message(key).await?;

    let _guard = store.lock(CHANNELS_DOCUMENT).await;
    let mut channels = store.channels().await?;
    let previous = channels.role_bot.bulk_replace(key, bindings)?;

    if let Err(why) = apply_reactions(platform, key, channels.role_bot.bindings(key), true).await {
        warn!(message = %key, error = %why, "failed to apply reactions, restoring previous ones");
        if let Err(why) = apply_reactions(platform, key, &previous, true).await {
            error!(message = %key, error = %why, "failed to restore previous reactions");
        }
        return Err(why.into());
    }

    store.save_channels(&channels).await?;
    info!(message = %key, "role bindings replaced");
    Ok(())
}

/// Puts the bot's reactions back on a bound message. Returns how many were added.
pub async fn reload(
    platform: &dyn Platform,
    store: &ConfigStore,
    key: &MessageKey,
) -> Result<usize, ReactionRoleError> {
    let channels = store.channels().await?;
    let bindings = channels.role_bot.bindings(key);
    if bindings.is_empty() {
        return Err(ReactionRoleError::NotStored(*key));
    }

    apply_reactions(platform, key, bindings, false).await?;
    Ok(bindings.len())
}

/// Removes existing reactions (everyone's with `clear_all`, else only the
/// bot's) and adds one per binding, in order.
async fn apply_reactions(
    platform: &dyn Platform,
    key: &MessageKey,
    bindings: &[RoleBinding],
    clear_all: bool,
) -> Result<(), PlatformError> {
    if clear_all {
        platform.clear_reactions(key).await?;
    } else {
        platform.remove_own_reactions(key).await?;
    }
    for binding in bindings {
        platform.add_reaction(key, &binding.emote).await?;
    }
    Ok(())
}
