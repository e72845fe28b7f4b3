//! Type-safe names for the things archdock installs and probes
//!
//! Stringly-typed package, unit and helper names are replaced with strum enums
//! so the CLI parser and the orchestrator share one spelling.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

/// AUR helper used to install the newer compose variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[derive(Display, EnumString, EnumIter, IntoStaticStr)]
#[serde(rename_all = "lowercase")]
pub enum AurHelper {
    #[default]
    #[strum(serialize = "yay")]
    Yay,
    #[strum(serialize = "paru")]
    Paru,
    #[strum(serialize = "none")]
    None,
}

impl AurHelper {
    /// Binary name on the search path, `None` when AUR use is disabled
    pub fn binary(self) -> Option<&'static str> {
        match self {
            Self::None => None,
            other => Some(other.into()),
        }
    }

    /// Git URL of the helper's AUR package
    pub fn repo_url(self) -> Option<String> {
        self.binary()
            .map(|name| format!("https://aur.archlinux.org/{}.git", name))
    }
}

/// Distribution of the Compose CLI that answered the probe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[derive(Display, EnumString, EnumIter)]
#[serde(rename_all = "lowercase")]
pub enum ComposeVariant {
    /// `docker compose`, integrated into the Docker CLI
    #[strum(serialize = "plugin")]
    Plugin,
    /// `docker-compose`, a separate executable
    #[strum(serialize = "standalone")]
    Standalone,
}

impl ComposeVariant {
    /// Detection order. The plugin always wins when both answer.
    pub const PREFERENCE: [ComposeVariant; 2] = [Self::Plugin, Self::Standalone];

    /// Program and arguments that print the variant's version
    pub fn version_command(self) -> (&'static str, &'static [&'static str]) {
        match self {
            Self::Plugin => ("docker", &["compose", "version"]),
            Self::Standalone => ("docker-compose", &["version"]),
        }
    }

    /// Human-readable form used in log lines
    pub fn describe(self) -> &'static str {
        match self {
            Self::Plugin => "Docker Compose plugin",
            Self::Standalone => "standalone docker-compose",
        }
    }
}

/// systemd units enabled after a fresh install
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[derive(Display, EnumString, EnumIter, IntoStaticStr)]
#[serde(rename_all = "lowercase")]
pub enum Service {
    #[strum(serialize = "docker")]
    Docker,
    #[strum(serialize = "containerd")]
    Containerd,
}

/// Which branch of the orchestrator ran
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
pub enum InstallPath {
    /// Docker was already present; only verification and group reconciliation ran
    #[strum(serialize = "installed_verify")]
    InstalledVerify,
    /// Docker was absent and has been installed
    #[strum(serialize = "fresh_install")]
    FreshInstall,
}
