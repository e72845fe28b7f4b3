//! Runtime configuration for a setup run
//!
//! There is no configuration file. `SetupConfig::default()` reproduces the
//! stock behavior; the CLI layer overrides individual fields.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::{ArchDockError, Result};
use crate::types::AurHelper;

/// pacman's database lock sentinel
pub const DEFAULT_LOCK_FILE: &str = "/var/lib/pacman/db.lck";
/// Attempt bound shared by lock waits and command failures
pub const DEFAULT_MAX_ATTEMPTS: u32 = 10;
/// Sleep between attempts
pub const DEFAULT_RETRY_INTERVAL: Duration = Duration::from_secs(10);
/// Packages installed on a fresh system
pub const DOCKER_PACKAGES: &[&str] = &["docker", "docker-compose", "containerd", "runc"];
/// Packages makepkg needs to build an AUR helper
pub const AUR_BUILD_PREREQUISITES: &[&str] = &["git", "base-devel"];
/// AUR package carrying a newer compose release
pub const DEFAULT_COMPOSE_AUR_PACKAGE: &str = "docker-compose-bin";
/// Image used to prove the runtime works
pub const DEFAULT_SMOKE_TEST_IMAGE: &str = "hello-world";
/// Group granting non-root access to the Docker socket
pub const DOCKER_GROUP: &str = "docker";

/// Retry policy for package-manager invocations
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub lock_file: PathBuf,
    pub max_attempts: u32,
    pub interval: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            lock_file: PathBuf::from(DEFAULT_LOCK_FILE),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            interval: DEFAULT_RETRY_INTERVAL,
        }
    }
}

/// Everything a setup run needs to know up front.
///
/// Environment-derived values (`sudo_user`) are captured once by the binary
/// and passed in here, so the orchestrator never reads process globals.
#[derive(Debug, Clone)]
pub struct SetupConfig {
    pub retry: RetryPolicy,
    pub aur_helper: AurHelper,
    pub compose_aur_package: String,
    pub smoke_test_image: String,
    pub skip_smoke_test: bool,
    pub docker_group: String,
    /// Explicit target user; wins over `sudo_user`
    pub user_override: Option<String>,
    /// Value of `SUDO_USER` at startup
    pub sudo_user: Option<String>,
}

impl Default for SetupConfig {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            aur_helper: AurHelper::default(),
            compose_aur_package: DEFAULT_COMPOSE_AUR_PACKAGE.to_string(),
            smoke_test_image: DEFAULT_SMOKE_TEST_IMAGE.to_string(),
            skip_smoke_test: false,
            docker_group: DOCKER_GROUP.to_string(),
            user_override: None,
            sudo_user: None,
        }
    }
}

impl SetupConfig {
    /// Reject values that would make the run meaningless
    pub fn validate(&self) -> Result<()> {
        if self.retry.max_attempts == 0 {
            return Err(ArchDockError::config("max attempts must be at least 1"));
        }
        if self.compose_aur_package.trim().is_empty() {
            return Err(ArchDockError::config("compose AUR package name is empty"));
        }
        if self.smoke_test_image.trim().is_empty() {
            return Err(ArchDockError::config("smoke test image is empty"));
        }
        if self.docker_group.trim().is_empty() {
            return Err(ArchDockError::config("docker group name is empty"));
        }
        if let Some(user) = &self.user_override {
            if user.trim().is_empty() {
                return Err(ArchDockError::config("--user must not be empty"));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_stock_behavior() {
        let config = SetupConfig::default();
        assert_eq!(config.retry.lock_file, PathBuf::from("/var/lib/pacman/db.lck"));
        assert_eq!(config.retry.max_attempts, 10);
        assert_eq!(config.retry.interval, Duration::from_secs(10));
        assert_eq!(config.aur_helper, AurHelper::Yay);
        assert_eq!(config.smoke_test_image, "hello-world");
        assert_eq!(config.docker_group, "docker");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_attempts() {
        let mut config = SetupConfig::default();
        config.retry.max_attempts = 0;
        assert!(matches!(config.validate(), Err(ArchDockError::Config(_))));
    }

    #[test]
    fn test_validate_rejects_blank_user_override() {
        let config = SetupConfig {
            user_override: Some("  ".to_string()),
            ..SetupConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
