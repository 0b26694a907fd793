//! Database snapshots: sources, listing and installation.

pub mod backup;
pub mod install;
pub mod resolve;
pub mod source;

pub use backup::{BackupId, latest_backup, list_backups};
pub use install::{InstallReport, InstallState, SnapshotInstaller, Stage};
pub use resolve::{NodeKind, SnapshotUrls, resolve};
pub use source::{NetworkType, SnapshotKind, SourceDescriptor, SourceRegistry};

use crate::core::output;
use anyhow::Context;
use std::path::Path;

/// Host behind `snapshot download default-main`.
pub const DEFAULT_MAIN_DOMAIN: &str = "34.143.247.77";
/// Host behind `snapshot download default-nile`.
pub const DEFAULT_NILE_DOMAIN: &str = "database.nileex.io";

/// Print the backups published by `domain`.
pub fn show_list(registry: &SourceRegistry, domain: &str) -> anyhow::Result<()> {
    let names = list_backups(registry, domain)
        .with_context(|| format!("Failed to list backups from {}", domain))?;

    output::action("Available backup:");
    for name in &names {
        output::list_item(name);
    }
    Ok(())
}

/// Install the newest lite snapshot from `domain`.
pub fn download_latest_lite(
    registry: &SourceRegistry,
    root: &Path,
    domain: &str,
) -> anyhow::Result<InstallReport> {
    let backup = latest_backup(registry, domain)
        .with_context(|| format!("Failed to find the latest backup on {}", domain))?;
    output::info(&format!("Latest backup from {} is: {}", domain, backup));

    SnapshotInstaller::new(registry, root).install(domain, &backup.to_string(), NodeKind::Lite)
}
