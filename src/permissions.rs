use serenity::model::guild::Member;
use serenity::model::id::RoleId;

use crate::config::GuildConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManagerDomain {
    /// Reaction role commands.
    Role,
    /// Voice channel authorization commands.
    Channel,
}

/// The member invoking a command.
#[derive(Debug, Clone, Copy)]
pub struct Invoker<'a> {
    pub name: &'a str,
    pub roles: &'a [RoleId],
    pub administrator: bool,
}

impl<'a> Invoker<'a> {
    pub fn from_member(member: &'a Member) -> Self {
        Self {
            name: &member.user.name,
            roles: &member.roles,
            administrator: member.permissions.is_some_and(|p| p.administrator()),
        }
    }
}

/// Anyone may manage a domain with no configured handles or roles. Otherwise
/// the invoker needs a listed handle, a listed role, or administrator.
pub fn is_approved(config: &GuildConfig, domain: ManagerDomain, invoker: &Invoker<'_>) -> bool {
    let (handles, roles) = match domain {
        ManagerDomain::Role => (&config.role_manager_handles, &config.role_manager_roles),
        ManagerDomain::Channel => (&config.channel_manager_handles, &config.channel_manager_roles),
    };

    if handles.is_empty() && roles.is_empty() {
        return true;
    }

    handles.iter().any(|handle| handle == invoker.name)
        || invoker.roles.iter().any(|role| roles.contains(&role.0))
        || invoker.administrator
}
