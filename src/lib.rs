//! archdock library
//!
//! Installs and idempotently verifies Docker and Docker Compose on an Arch
//! Linux host: lock-aware pacman retries, AUR helper bootstrap, docker group
//! reconciliation and a smoke test, all driven through the [`Host`] seam.

pub mod aur;
pub mod cli;
pub mod compose;
pub mod config;
pub mod error;
pub mod host;
pub mod installer;
pub mod pacman;
pub mod process_guard;
pub mod sanity;
pub mod types;
pub mod user;

pub use config::{RetryPolicy, SetupConfig};
pub use error::{ArchDockError, Result};
pub use host::{CommandOutput, DryRunHost, Host, HostCommand, SystemHost};
pub use installer::{InstallReport, Installer, SmokeTest};
pub use types::{AurHelper, ComposeVariant, InstallPath, Service};
pub use user::{GroupOutcome, resolve_target_user};
