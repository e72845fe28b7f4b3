//! Tests for the AUR helper bootstrap
//!
//! These tests verify:
//! - The build directory is gone after a failed clone or build
//! - The build directory is gone after a successful bootstrap
//! - An installed helper is never rebuilt

mod common;

use std::path::{Path, PathBuf};
use std::time::Duration;

use archdock::aur::{HelperStatus, ensure_aur_helper_in};
use archdock::{ArchDockError, AurHelper, RetryPolicy};
use common::ScriptedHost;
use tempfile::TempDir;

fn policy() -> RetryPolicy {
    RetryPolicy {
        lock_file: PathBuf::from("/var/lib/pacman/db.lck"),
        max_attempts: 10,
        interval: Duration::from_secs(10),
    }
}

/// Names of everything left under `root`
fn leftovers(root: &Path) -> Vec<String> {
    std::fs::read_dir(root)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect()
}

#[test]
fn test_build_dir_removed_when_clone_fails() {
    let tmp = TempDir::new().unwrap();
    let host = ScriptedHost::new().fail("git clone", 128);

    let err = ensure_aur_helper_in(&host, &policy(), AurHelper::Yay, None, tmp.path()).unwrap_err();

    assert!(matches!(err, ArchDockError::CommandFailed { code: Some(128), .. }));
    assert!(!host.ran("makepkg"));
    // the clone target really lived under the injected root
    let clone = host.calls().into_iter().find(|c| c.starts_with("git clone")).unwrap();
    assert!(clone.contains(&tmp.path().display().to_string()));
    assert!(clone.contains("archdock-yay-"));
    assert_eq!(leftovers(tmp.path()), Vec::<String>::new());
}

#[test]
fn test_build_dir_removed_when_makepkg_fails() {
    let tmp = TempDir::new().unwrap();
    let host = ScriptedHost::new().fail("sudo -u alice makepkg", 4);

    let err =
        ensure_aur_helper_in(&host, &policy(), AurHelper::Yay, Some("alice"), tmp.path()).unwrap_err();

    assert_eq!(err.exit_code(), 4);
    assert!(host.ran("chown -R alice"));
    assert!(leftovers(tmp.path()).is_empty());
}

#[test]
fn test_build_dir_removed_after_bootstrap() {
    let tmp = TempDir::new().unwrap();
    let host = ScriptedHost::new();

    let status = ensure_aur_helper_in(&host, &policy(), AurHelper::Paru, Some("alice"), tmp.path())
        .unwrap();

    assert_eq!(status, HelperStatus::Bootstrapped);
    assert!(host.ran("git clone --depth 1 https://aur.archlinux.org/paru.git"));
    assert!(host.ran("sudo -u alice makepkg -si --noconfirm"));
    assert!(leftovers(tmp.path()).is_empty());
}

#[test]
fn test_present_helper_creates_nothing() {
    let tmp = TempDir::new().unwrap();
    let host = ScriptedHost::new().with_binary("yay");

    let status = ensure_aur_helper_in(&host, &policy(), AurHelper::Yay, None, tmp.path()).unwrap();

    assert_eq!(status, HelperStatus::AlreadyPresent);
    assert!(host.calls().is_empty());
    assert!(leftovers(tmp.path()).is_empty());
}
