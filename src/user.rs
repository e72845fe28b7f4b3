//! Target user resolution and docker group reconciliation

use serde::Serialize;

use crate::error::Result;
use crate::host::{Host, HostCommand};

/// Pick the account that should end up in the docker group.
///
/// The user who invoked sudo wins over the effective user; an empty
/// `SUDO_USER` counts as unset.
pub fn resolve_target_user(sudo_user: Option<&str>, current_user: &str) -> String {
    sudo_user
        .map(str::trim)
        .filter(|user| !user.is_empty())
        .unwrap_or(current_user)
        .to_string()
}

/// What group reconciliation did
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum GroupOutcome {
    AlreadyMember { user: String },
    Added { user: String },
    /// Target is root; nothing to do
    SkippedRoot,
    /// Target has no passwd entry
    SkippedUnknownUser { user: String },
}

/// Whether `user` has a passwd entry (`id -u <user>`)
pub fn user_exists<H: Host>(host: &H, user: &str) -> Result<bool> {
    Ok(host.run(&HostCommand::probe("id", ["-u", user]))?.is_success())
}

/// Whether `user` already belongs to `group` (`id -nG <user>`)
pub fn is_member<H: Host>(host: &H, user: &str, group: &str) -> Result<bool> {
    let command = HostCommand::probe("id", ["-nG", user]);
    let output = host.run(&command)?.ensure_success(&command)?;
    Ok(output.stdout.split_whitespace().any(|g| g == group))
}

/// Add `user` to `group` unless already a member.
///
/// Root and unknown accounts are skipped without touching the group
/// database. `usermod` failing is fatal.
pub fn reconcile_group<H: Host>(host: &H, user: &str, group: &str) -> Result<GroupOutcome> {
    if user == "root" {
        return Ok(GroupOutcome::SkippedRoot);
    }
    if !user_exists(host, user)? {
        return Ok(GroupOutcome::SkippedUnknownUser {
            user: user.to_string(),
        });
    }

    if is_member(host, user, group)? {
        tracing::info!("User {} is already in the {} group", user, group);
        return Ok(GroupOutcome::AlreadyMember {
            user: user.to_string(),
        });
    }

    tracing::info!("Adding user {} to the {} group", user, group);
    let usermod = HostCommand::new("usermod", ["-aG", group, user]);
    host.run(&usermod)?.ensure_success(&usermod)?;
    tracing::info!("User {} added to {}; log out and back in to apply", user, group);
    Ok(GroupOutcome::Added {
        user: user.to_string(),
    })
}
