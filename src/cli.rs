use clap::Parser;
use std::path::PathBuf;

use crate::config::{
    DEFAULT_COMPOSE_AUR_PACKAGE, DEFAULT_LOCK_FILE, DEFAULT_MAX_ATTEMPTS, DEFAULT_SMOKE_TEST_IMAGE,
    RetryPolicy, SetupConfig,
};
use crate::types::AurHelper;

/// archdock - Install and verify Docker and Docker Compose on Arch Linux
#[derive(Parser, Debug)]
#[command(name = "archdock")]
#[command(about = "Install and verify Docker and Docker Compose on Arch Linux")]
#[command(version)]
pub struct Cli {
    /// Dry-run mode: show what would be executed without making changes.
    ///
    /// Detection (docker --version, compose probes, group lookups) still
    /// executes so the preview is realistic.
    #[arg(long)]
    pub dry_run: bool,

    /// Attempts per package operation, lock waits included
    #[arg(long, default_value_t = DEFAULT_MAX_ATTEMPTS, value_parser = clap::value_parser!(u32).range(1..))]
    pub max_attempts: u32,

    /// Seconds to wait between package operation attempts
    #[arg(long, default_value_t = 10)]
    pub retry_interval: u64,

    /// pacman lock file to poll
    #[arg(long, default_value = DEFAULT_LOCK_FILE)]
    pub lock_file: PathBuf,

    /// AUR helper to use for the newer compose release (yay, paru, none)
    #[arg(long, default_value = "yay")]
    pub aur_helper: AurHelper,

    /// AUR package providing the newer compose release
    #[arg(long, default_value = DEFAULT_COMPOSE_AUR_PACKAGE)]
    pub compose_aur_package: String,

    /// Image used for the post-install smoke test
    #[arg(long, default_value = DEFAULT_SMOKE_TEST_IMAGE)]
    pub smoke_test_image: String,

    /// Do not run the smoke test container
    #[arg(long)]
    pub skip_smoke_test: bool,

    /// User to add to the docker group (default: SUDO_USER, then current user)
    #[arg(short, long)]
    pub user: Option<String>,

    /// Skip the root privilege check (also ARCHDOCK_SKIP_ROOT_CHECK=1)
    #[arg(long)]
    pub skip_root_check: bool,

    /// Print the final report as JSON on stdout
    #[arg(long)]
    pub json: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    pub fn parse_args() -> Self {
        <Self as clap::Parser>::parse()
    }

    /// Build the run configuration; `sudo_user` is read by the caller
    pub fn to_config(&self, sudo_user: Option<String>) -> SetupConfig {
        SetupConfig {
            retry: RetryPolicy {
                lock_file: self.lock_file.clone(),
                max_attempts: self.max_attempts,
                interval: std::time::Duration::from_secs(self.retry_interval),
            },
            aur_helper: self.aur_helper,
            compose_aur_package: self.compose_aur_package.clone(),
            smoke_test_image: self.smoke_test_image.clone(),
            skip_smoke_test: self.skip_smoke_test,
            user_override: self.user.clone(),
            sudo_user,
            ..SetupConfig::default()
        }
    }

    /// Default tracing filter directive for the chosen verbosity
    pub fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_no_args_matches_defaults() {
        let cli = Cli::try_parse_from(["archdock"]).unwrap();
        assert!(!cli.dry_run);
        let config = cli.to_config(None);
        let defaults = SetupConfig::default();
        assert_eq!(config.retry, defaults.retry);
        assert_eq!(config.aur_helper, defaults.aur_helper);
        assert_eq!(config.compose_aur_package, defaults.compose_aur_package);
        assert_eq!(config.smoke_test_image, defaults.smoke_test_image);
        assert_eq!(cli.log_level(), "info");
    }

    #[test]
    fn test_cli_overrides() {
        let cli = Cli::try_parse_from([
            "archdock",
            "--dry-run",
            "--max-attempts",
            "3",
            "--retry-interval",
            "1",
            "--aur-helper",
            "none",
            "--user",
            "alice",
            "-vv",
        ])
        .unwrap();
        let config = cli.to_config(Some("bob".to_string()));
        assert!(cli.dry_run);
        assert_eq!(config.retry.max_attempts, 3);
        assert_eq!(config.retry.interval.as_secs(), 1);
        assert_eq!(config.aur_helper, AurHelper::None);
        assert_eq!(config.user_override.as_deref(), Some("alice"));
        assert_eq!(config.sudo_user.as_deref(), Some("bob"));
        assert_eq!(cli.log_level(), "trace");
    }

    #[test]
    fn test_cli_rejects_zero_attempts() {
        assert!(Cli::try_parse_from(["archdock", "--max-attempts", "0"]).is_err());
    }

    #[test]
    fn test_cli_rejects_unknown_helper() {
        assert!(Cli::try_parse_from(["archdock", "--aur-helper", "trizen"]).is_err());
    }
}
