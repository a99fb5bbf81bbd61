//! Tier rules for privileged account actions.
//!
//! Everything here is pure: callers load the roles, ask the policy, and only
//! then touch the database. A denial therefore never leaves side effects.

use crate::models::Role;
use thiserror::Error;

/// Why a privileged action was refused. The display text is returned to the
/// caller verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Denial {
    #[error("You cannot ban your own account")]
    SelfBan,
    #[error("You cannot change your own role")]
    SelfRoleChange,
    #[error("Only moderators and owners can ban users")]
    MemberCannotBan,
    #[error("Moderators cannot ban other moderators")]
    ModeratorVsModerator,
    #[error("Moderators cannot ban the owner")]
    ModeratorVsOwner,
    #[error("Only the owner can change user roles")]
    NotOwner,
    #[error("The owner role cannot be changed through this interface")]
    OwnerRoleLocked,
}

/// Roles that may be granted through the role-change endpoint.
pub fn assignable_role(level: i16) -> Option<Role> {
    match Role::from_level(level)? {
        Role::Owner => None,
        role => Some(role),
    }
}

pub fn can_change_role(actor_role: Role, target_current_role: Role) -> bool {
    actor_role == Role::Owner && target_current_role != Role::Owner
}

pub fn authorize_role_change(
    actor_id: i32,
    actor_role: Role,
    target_id: i32,
    target_role: Role,
) -> Result<(), Denial> {
    if actor_id == target_id {
        return Err(Denial::SelfRoleChange);
    }
    if actor_role != Role::Owner {
        return Err(Denial::NotOwner);
    }
    if !can_change_role(actor_role, target_role) {
        return Err(Denial::OwnerRoleLocked);
    }
    Ok(())
}

/// Members never ban, whoever the target is.
pub fn ensure_can_ban(actor_role: Role) -> Result<(), Denial> {
    if actor_role.is_staff() {
        Ok(())
    } else {
        Err(Denial::MemberCannotBan)
    }
}

/// Nobody bans upward, and peers may not ban peers except at the owner tier.
pub fn authorize_ban(
    actor_role: Role,
    target_role: Role,
    actor_id: i32,
    target_id: i32,
) -> Result<(), Denial> {
    if actor_id == target_id {
        return Err(Denial::SelfBan);
    }
    match (actor_role, target_role) {
        (Role::Member, _) => Err(Denial::MemberCannotBan),
        (Role::Moderator, Role::Moderator) => Err(Denial::ModeratorVsModerator),
        (Role::Moderator, Role::Owner) => Err(Denial::ModeratorVsOwner),
        (Role::Moderator, Role::Member) | (Role::Owner, _) => Ok(()),
    }
}
