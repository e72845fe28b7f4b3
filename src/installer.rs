//! Installation orchestrator
//!
//! Decides between verifying an existing Docker installation and performing a
//! fresh one, then walks the matching sequence of steps. Every step returns
//! `Result` and is propagated with `?`; the only failures downgraded to
//! warnings are a missing Compose on an existing install and a failed smoke
//! test. Both land in [`InstallReport::warnings`].

use serde::Serialize;
use strum::IntoEnumIterator;

use crate::aur::{self, HelperStatus};
use crate::compose::{self, ComposeInstall};
use crate::config::{DOCKER_PACKAGES, SetupConfig};
use crate::error::{ArchDockError, Result};
use crate::host::{Host, HostCommand};
use crate::pacman;
use crate::types::{ComposeVariant, InstallPath, Service};
use crate::user::{self, GroupOutcome};

/// Version reported for components a dry-run only pretended to install
pub const PLANNED_VERSION: &str = "not installed (dry-run)";

/// Outcome of the smoke-test container run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SmokeTest {
    Passed,
    Failed { reason: String },
    Skipped,
    /// Only fresh installs run the smoke test
    NotRun,
}

/// What a run observed and changed
#[derive(Debug, Clone, Serialize)]
pub struct InstallReport {
    pub path: InstallPath,
    pub docker_version: String,
    pub compose: Option<ComposeInstall>,
    pub aur_helper: Option<HelperStatus>,
    pub target_user: String,
    pub group: GroupOutcome,
    pub smoke_test: SmokeTest,
    pub warnings: Vec<String>,
}

/// Drives one setup run against a [`Host`]
pub struct Installer<H> {
    host: H,
    config: SetupConfig,
}

impl<H: Host> Installer<H> {
    pub fn new(host: H, config: SetupConfig) -> Self {
        Self { host, config }
    }

    /// Run to completion.
    ///
    /// `Ok` maps to exit 0 whatever the warnings; `Err` carries its own exit
    /// code via [`ArchDockError::exit_code`].
    pub fn run(&self) -> Result<InstallReport> {
        self.config.validate()?;
        let target_user = self.target_user()?;
        tracing::debug!("Target user resolved to {}", target_user);

        if self.host.has_binary("docker") {
            tracing::info!("Docker is already installed, verifying");
            self.verify_existing(target_user)
        } else {
            tracing::info!("Docker not found, starting installation");
            self.fresh_install(target_user)
        }
    }

    fn target_user(&self) -> Result<String> {
        if let Some(user) = &self.config.user_override {
            return Ok(user.trim().to_string());
        }
        let current = self.host.current_user()?;
        Ok(user::resolve_target_user(
            self.config.sudo_user.as_deref(),
            &current,
        ))
    }

    fn verify_existing(&self, target_user: String) -> Result<InstallReport> {
        let mut warnings = Vec::new();

        let docker_version = self.docker_version()?;
        tracing::info!("{}", docker_version);

        let compose = compose::detect(&self.host)?;
        if compose.is_none() {
            let msg = "Docker Compose is not installed (neither plugin nor standalone)";
            tracing::warn!("{}", msg);
            warnings.push(msg.to_string());
        }

        let group = user::reconcile_group(&self.host, &target_user, &self.config.docker_group)?;
        if matches!(
            group,
            GroupOutcome::SkippedRoot | GroupOutcome::SkippedUnknownUser { .. }
        ) {
            let msg = format!(
                "No regular user to add to the {} group; only root can use Docker",
                self.config.docker_group
            );
            tracing::warn!("{}", msg);
            warnings.push(msg);
        }

        tracing::info!("Docker installation verified");
        Ok(InstallReport {
            path: InstallPath::InstalledVerify,
            docker_version,
            compose,
            aur_helper: None,
            target_user,
            group,
            smoke_test: SmokeTest::NotRun,
            warnings,
        })
    }

    fn fresh_install(&self, target_user: String) -> Result<InstallReport> {
        let policy = &self.config.retry;
        let mut warnings = Vec::new();

        tracing::info!("Updating system packages");
        pacman::run_with_retry(&self.host, policy, &pacman::system_upgrade())?;

        tracing::info!("Installing {}", DOCKER_PACKAGES.join(", "));
        pacman::run_with_retry(&self.host, policy, &pacman::install_packages(DOCKER_PACKAGES))?;

        for service in Service::iter() {
            self.enable_service(service)?;
        }

        let aur_helper = self.install_compose_from_aur(&target_user)?;

        let group = user::reconcile_group(&self.host, &target_user, &self.config.docker_group)?;

        // Under dry-run nothing was installed, so missing binaries are expected
        let dry_run = self.host.is_dry_run();
        let docker_version = match self.docker_version() {
            Ok(version) => version,
            Err(e) if dry_run => {
                tracing::info!(
                    "[dry-run] docker is not usable yet ({}), assuming the planned install",
                    e
                );
                PLANNED_VERSION.to_string()
            }
            Err(e) => return Err(e),
        };
        tracing::info!("Installed {}", docker_version);

        let compose = match compose::detect(&self.host)? {
            Some(compose) => compose,
            None if dry_run => {
                tracing::info!("[dry-run] assuming the Docker Compose plugin from the planned install");
                ComposeInstall {
                    variant: ComposeVariant::Plugin,
                    version: PLANNED_VERSION.to_string(),
                }
            }
            None => {
                tracing::error!("Docker Compose installation failed");
                return Err(ArchDockError::ComposeMissing);
            }
        };

        let smoke_test = self.smoke_test();
        if let SmokeTest::Failed { reason } = &smoke_test {
            let msg = format!("Docker smoke test failed: {}", reason);
            tracing::warn!("{}", msg);
            warnings.push(msg);
        }

        tracing::info!("Docker installation completed");
        Ok(InstallReport {
            path: InstallPath::FreshInstall,
            docker_version,
            compose: Some(compose),
            aur_helper: Some(aur_helper),
            target_user,
            group,
            smoke_test,
            warnings,
        })
    }

    fn enable_service(&self, service: Service) -> Result<()> {
        let unit: &'static str = service.into();
        tracing::info!("Enabling and starting {}.service", unit);
        let command = HostCommand::new("systemctl", ["enable", "--now", unit]);
        self.host.run(&command)?.ensure_success(&command)?;
        Ok(())
    }

    /// Bootstrap the helper if needed and use it for the newer compose release.
    ///
    /// The AUR package conflicts with the repository `docker-compose` installed
    /// just before, and `--noconfirm` answers pacman's removal prompt with its
    /// default "no". A failure here is therefore usually deterministic, so the
    /// command runs once after the lock clears instead of being retried.
    fn install_compose_from_aur(&self, target_user: &str) -> Result<HelperStatus> {
        let helper = self.config.aur_helper;
        let build_user = (target_user != "root").then_some(target_user);
        let status = aur::ensure_aur_helper(&self.host, &self.config.retry, helper, build_user)?;

        let Some(binary) = helper.binary().filter(|_| status.is_available()) else {
            tracing::info!("AUR disabled, keeping the repository docker-compose");
            return Ok(status);
        };

        let package = self.config.compose_aur_package.as_str();
        tracing::info!("Installing {} with {}", package, binary);
        let mut command = pacman::aur_install(binary, &[package]);
        if let Some(user) = build_user.filter(|_| self.host.is_root()) {
            command = aur::run_as(user, command);
        }
        pacman::run_when_unlocked(&self.host, &self.config.retry, &command)?;
        Ok(status)
    }

    fn docker_version(&self) -> Result<String> {
        let command = HostCommand::probe("docker", ["--version"]);
        let output = self.host.run(&command)?.ensure_success(&command)?;
        Ok(output.first_line().unwrap_or_default().to_string())
    }

    fn smoke_test(&self) -> SmokeTest {
        if self.config.skip_smoke_test {
            tracing::info!("Smoke test skipped");
            return SmokeTest::Skipped;
        }

        let image = self.config.smoke_test_image.as_str();
        tracing::info!("Running smoke test container {}", image);
        let command = HostCommand::new("docker", ["run", "--rm", image]);
        match self.host.run(&command) {
            Ok(output) if output.is_success() => {
                tracing::info!("Docker smoke test passed");
                SmokeTest::Passed
            }
            Ok(output) => SmokeTest::Failed {
                reason: format!("`{}` exited with {:?}", command, output.exit_code),
            },
            Err(e) => SmokeTest::Failed {
                reason: e.to_string(),
            },
        }
    }
}
