//! Docker Compose detection
//!
//! Probes `docker compose version` first and `docker-compose version` second.
//! The first variant that answers wins, so an integrated plugin always shadows
//! a standalone binary that happens to be installed too.

use serde::Serialize;

use crate::error::{ArchDockError, Result};
use crate::host::{Host, HostCommand};
use crate::types::ComposeVariant;

/// A compose CLI that answered its version probe
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComposeInstall {
    pub variant: ComposeVariant,
    pub version: String,
}

/// Probe one variant. A binary that cannot be spawned counts as absent.
pub fn probe<H: Host>(host: &H, variant: ComposeVariant) -> Result<Option<ComposeInstall>> {
    let (program, args) = variant.version_command();
    let command = HostCommand::probe(program, args.iter().copied());
    let output = match host.run(&command) {
        Ok(output) => output,
        Err(ArchDockError::Spawn { .. }) => return Ok(None),
        Err(e) => return Err(e),
    };
    if !output.is_success() {
        return Ok(None);
    }
    Ok(Some(ComposeInstall {
        variant,
        version: output.first_line().unwrap_or_default().to_string(),
    }))
}

/// First variant, in preference order, that answers
pub fn detect<H: Host>(host: &H) -> Result<Option<ComposeInstall>> {
    for variant in ComposeVariant::PREFERENCE {
        if let Some(found) = probe(host, variant)? {
            tracing::info!("{} detected: {}", variant.describe(), found.version);
            return Ok(Some(found));
        }
        tracing::debug!("{} not available", variant.describe());
    }
    Ok(None)
}
