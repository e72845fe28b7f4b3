//! AUR helper bootstrap
//!
//! Builds the configured helper (yay by default) from its AUR git repository
//! when it is not already on the search path.
//!
//! # Flow
//!
//! 1. Install `git` and `base-devel` through the lock-aware invoker
//! 2. Clone `https://aur.archlinux.org/<helper>.git` into a fresh temp dir
//! 3. Run `makepkg -si --noconfirm` inside the clone
//! 4. Drop the temp dir
//!
//! # Constraints
//!
//! - `makepkg` forbids running as root. When archdock is root and a non-root
//!   build user is known, the build tree is chowned to that user and makepkg
//!   runs through `sudo -u <user>`.
//! - The build directory is a [`TempDir`], so it is removed on every exit
//!   path, failed builds included.

use std::path::Path;

use tempfile::TempDir;

use crate::config::{AUR_BUILD_PREREQUISITES, RetryPolicy};
use crate::error::Result;
use crate::host::{Host, HostCommand};
use crate::pacman;
use crate::types::AurHelper;

/// Outcome of [`ensure_aur_helper`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HelperStatus {
    /// Found on the search path, nothing built
    AlreadyPresent,
    /// Built and installed during this run
    Bootstrapped,
    /// AUR use is disabled (`--aur-helper none`)
    Disabled,
}

impl HelperStatus {
    pub fn is_available(self) -> bool {
        !matches!(self, Self::Disabled)
    }
}

/// Wrap `command` so it runs as `user` via sudo.
pub fn run_as(user: &str, command: HostCommand) -> HostCommand {
    let mut args = vec!["-u".to_string(), user.to_string(), command.program];
    args.extend(command.args);
    HostCommand {
        program: "sudo".to_string(),
        args,
        ..command
    }
}

/// Make sure `helper` is installed, building it from source if needed.
///
/// `build_user` is the unprivileged account makepkg should run as when the
/// process is root. Every failure is fatal and propagates.
pub fn ensure_aur_helper<H: Host>(
    host: &H,
    policy: &RetryPolicy,
    helper: AurHelper,
    build_user: Option<&str>,
) -> Result<HelperStatus> {
    ensure_aur_helper_in(host, policy, helper, build_user, &std::env::temp_dir())
}

/// [`ensure_aur_helper`] with the build directory created under `tmp_root`
pub fn ensure_aur_helper_in<H: Host>(
    host: &H,
    policy: &RetryPolicy,
    helper: AurHelper,
    build_user: Option<&str>,
    tmp_root: &Path,
) -> Result<HelperStatus> {
    let (Some(binary), Some(repo_url)) = (helper.binary(), helper.repo_url()) else {
        return Ok(HelperStatus::Disabled);
    };

    if host.has_binary(binary) {
        tracing::debug!("AUR helper {} already installed", binary);
        return Ok(HelperStatus::AlreadyPresent);
    }

    tracing::info!("AUR helper {} not found, building it from the AUR", binary);
    pacman::run_with_retry(host, policy, &pacman::install_packages(AUR_BUILD_PREREQUISITES))?;

    let build_dir = tempfile::Builder::new()
        .prefix(&format!("archdock-{}-", binary))
        .tempdir_in(tmp_root)?;
    build_in(host, &build_dir, binary, &repo_url, build_user)?;

    tracing::info!("AUR helper {} installed", binary);
    Ok(HelperStatus::Bootstrapped)
}

fn build_in<H: Host>(
    host: &H,
    build_dir: &TempDir,
    binary: &str,
    repo_url: &str,
    build_user: Option<&str>,
) -> Result<()> {
    let checkout = build_dir.path().join(binary);
    let checkout_arg = checkout.display().to_string();

    let clone = HostCommand::new("git", ["clone", "--depth", "1", repo_url, checkout_arg.as_str()]);
    tracing::info!("Cloning {}", repo_url);
    host.run(&clone)?.ensure_success(&clone)?;

    let unprivileged = build_user.filter(|user| host.is_root() && *user != "root");
    let makepkg = HostCommand::new("makepkg", ["-si", "--noconfirm"]).current_dir(&checkout);
    let makepkg = match unprivileged {
        Some(user) => {
            hand_over(host, build_dir.path(), user)?;
            run_as(user, makepkg)
        }
        None => makepkg,
    };

    tracing::info!("Building {} with makepkg", binary);
    host.run(&makepkg)?.ensure_success(&makepkg)?;
    Ok(())
}

/// Give `user` ownership of the build tree so makepkg can write into it
fn hand_over<H: Host>(host: &H, dir: &Path, user: &str) -> Result<()> {
    let target = dir.display().to_string();
    let chown = HostCommand::new("chown", ["-R", user, target.as_str()]);
    host.run(&chown)?.ensure_success(&chown)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_as_prefixes_sudo() {
        let cmd = HostCommand::new("makepkg", ["-si", "--noconfirm"]).current_dir("/tmp/build");
        let wrapped = run_as("alice", cmd);
        assert_eq!(wrapped.to_string(), "sudo -u alice makepkg -si --noconfirm");
        assert_eq!(wrapped.cwd.as_deref(), Some(Path::new("/tmp/build")));
        assert!(wrapped.mutating);
    }

    #[test]
    fn test_helper_status_availability() {
        assert!(HelperStatus::AlreadyPresent.is_available());
        assert!(HelperStatus::Bootstrapped.is_available());
        assert!(!HelperStatus::Disabled.is_available());
    }
}
