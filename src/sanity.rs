//! Pre-flight sanity checks for the runtime environment
//!
//! Verifies before anything is installed that:
//! - Required runtime binaries are present
//! - archdock runs with root privileges (EUID 0)

use crate::error::{ArchDockError, Result};
use crate::host::Host;

/// Result of environment verification
#[derive(Debug)]
pub struct SanityCheckResult {
    pub missing_binaries: Vec<String>,
    pub is_root: bool,
}

impl SanityCheckResult {
    /// Returns true if all checks passed
    pub fn is_ok(&self) -> bool {
        self.missing_binaries.is_empty() && self.is_root
    }
}

/// Binaries every run needs before Docker exists
const REQUIRED_BINARIES: &[&str] = &[
    "pacman",    // Package installation
    "systemctl", // Service enablement (systemd)
    "id",        // Group membership queries (coreutils)
    "usermod",   // Group mutation (shadow)
];

/// Perform all sanity checks and return the result
pub fn verify_environment<H: Host>(host: &H) -> SanityCheckResult {
    let missing_binaries = REQUIRED_BINARIES
        .iter()
        .filter(|binary| !host.has_binary(binary))
        .map(|binary| (*binary).to_string())
        .collect();

    SanityCheckResult {
        missing_binaries,
        is_root: host.is_root(),
    }
}

/// Map binary names to their Arch Linux package names
fn get_package_for_binary(binary: &str) -> &'static str {
    match binary {
        "pacman" => "pacman",
        "systemctl" => "systemd",
        "id" => "coreutils",
        "usermod" => "shadow",
        _ => "unknown",
    }
}

/// Render a failed check for stderr
pub fn describe_failure(result: &SanityCheckResult) -> String {
    let mut out = String::new();
    out.push_str("╔══════════════════════════════════════════════════════════════════╗\n");
    out.push_str("║                  archdock - Pre-flight Check Failed              ║\n");
    out.push_str("╚══════════════════════════════════════════════════════════════════╝\n\n");

    if !result.is_root {
        out.push_str("❌ ERROR: Root privileges required\n");
        out.push_str("   Installing packages, enabling services and editing groups need root.\n\n");
        out.push_str("   Solution: run with sudo:\n");
        out.push_str("     sudo archdock\n\n");
    }

    if !result.missing_binaries.is_empty() {
        out.push_str("❌ ERROR: Missing required binaries\n\n");
        for binary in &result.missing_binaries {
            out.push_str(&format!(
                "   • {} (install: pacman -S {})\n",
                binary,
                get_package_for_binary(binary)
            ));
        }
        out.push_str("\n   archdock only supports Arch Linux and derivatives.\n");
    }
    out
}

/// Skip root check (for development/testing)
/// Set ARCHDOCK_SKIP_ROOT_CHECK=1 to skip
pub fn should_skip_root_check() -> bool {
    std::env::var("ARCHDOCK_SKIP_ROOT_CHECK")
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

/// Run pre-flight checks, optionally waiving the root requirement
pub fn run_preflight_checks<H: Host>(host: &H, skip_root: bool) -> Result<()> {
    tracing::debug!("Running pre-flight sanity checks (skip_root={})", skip_root);

    let mut result = verify_environment(host);
    if skip_root && !result.is_root {
        tracing::warn!("Root check skipped");
        result.is_root = true;
    }

    if !result.is_ok() {
        eprintln!("{}", describe_failure(&result));
        let mut reasons = Vec::new();
        if !result.is_root {
            reasons.push("not running as root".to_string());
        }
        if !result.missing_binaries.is_empty() {
            reasons.push(format!("missing {}", result.missing_binaries.join(", ")));
        }
        return Err(ArchDockError::preflight(reasons.join("; ")));
    }

    tracing::debug!("Pre-flight checks passed");
    Ok(())
}
