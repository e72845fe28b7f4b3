//! Lock-aware package manager invocation
//!
//! pacman refuses to run while `/var/lib/pacman/db.lck` exists. Instead of
//! failing on the first collision with another pacman (or an AUR helper
//! calling into one), every package operation goes through [`run_with_retry`],
//! which polls the lock and retries failed transactions on a fixed interval.
//!
//! # Attempt accounting
//!
//! Lock waits and command failures draw from the same attempt budget. With
//! the default policy of 10 attempts a lock that never clears means the
//! command is never executed, and the caller gets [`ArchDockError::LockHeld`].

use crate::config::RetryPolicy;
use crate::error::{ArchDockError, Result};
use crate::host::{Host, HostCommand};

/// Run a package-manager command, retrying on lock contention and failure.
///
/// Returns after the first successful execution. When the budget runs out the
/// last failure is returned: `CommandFailed` with the last exit code if the
/// command ever ran, `LockHeld` if the lock never cleared.
pub fn run_with_retry<H: Host>(host: &H, policy: &RetryPolicy, command: &HostCommand) -> Result<()> {
    invoke(host, policy, command, true)
}

/// Like [`run_with_retry`], but a command that ran and failed is not retried.
///
/// Lock waits still draw from the attempt budget. Used for operations whose
/// failures are deterministic, where retrying only burns time.
pub fn run_when_unlocked<H: Host>(host: &H, policy: &RetryPolicy, command: &HostCommand) -> Result<()> {
    invoke(host, policy, command, false)
}

fn invoke<H: Host>(
    host: &H,
    policy: &RetryPolicy,
    command: &HostCommand,
    retry_failures: bool,
) -> Result<()> {
    let mut last_code: Option<Option<i32>> = None;
    let mut attempt = 0;

    while attempt < policy.max_attempts {
        attempt += 1;

        if host.path_exists(&policy.lock_file) {
            tracing::info!(
                "Package manager is locked ({}), waiting {}s (attempt {}/{})",
                policy.lock_file.display(),
                policy.interval.as_secs(),
                attempt,
                policy.max_attempts
            );
            host.sleep(policy.interval);
            continue;
        }

        let output = host.run(command)?;
        if output.is_success() {
            tracing::debug!("`{}` succeeded on attempt {}", command, attempt);
            return Ok(());
        }
        last_code = Some(output.exit_code);
        if !retry_failures {
            break;
        }

        if attempt < policy.max_attempts {
            tracing::warn!(
                "`{}` failed with exit code {:?}, retrying in {}s (attempt {}/{})",
                command,
                output.exit_code,
                policy.interval.as_secs(),
                attempt,
                policy.max_attempts
            );
            host.sleep(policy.interval);
        }
    }

    tracing::error!("Failed to execute `{}` after {} attempt(s)", command, attempt);
    Err(match last_code {
        Some(code) => ArchDockError::command_failed(command.to_string(), code),
        None => ArchDockError::LockHeld {
            lock_file: policy.lock_file.clone(),
            attempts: policy.max_attempts,
        },
    })
}

/// `pacman -Syu --noconfirm`
pub fn system_upgrade() -> HostCommand {
    HostCommand::new("pacman", ["-Syu", "--noconfirm"])
}

/// `pacman -S --needed --noconfirm <packages>`
pub fn install_packages(packages: &[&str]) -> HostCommand {
    let mut args = vec!["-S", "--needed", "--noconfirm"];
    args.extend_from_slice(packages);
    HostCommand::new("pacman", args)
}

/// `<helper> -S --needed --noconfirm <packages>`; helpers escalate via sudo themselves
pub fn aur_install(helper: &str, packages: &[&str]) -> HostCommand {
    let mut args = vec!["-S", "--needed", "--noconfirm"];
    args.extend_from_slice(packages);
    HostCommand::new(helper, args)
}
