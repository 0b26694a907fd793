//! Single node on the local Docker host

use crate::core::error::{Result, TrondError};
use crate::core::{fs_utils, output, process};
use anyhow::Context;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use super::env;

/// Deployment profile for `node run-single`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeProfile {
    FullMain,
    FullNile,
    WitnessPrivate,
}

impl NodeProfile {
    pub fn default_compose_file(&self) -> &'static str {
        match self {
            NodeProfile::FullMain => "single_node/docker-compose.fullnode.main.yml",
            NodeProfile::FullNile => "single_node/docker-compose.fullnode.nile.yml",
            NodeProfile::WitnessPrivate => "single_node/docker-compose.witness.private.yml",
        }
    }

    /// Subdirectory of `logs/` the node writes to.
    pub fn log_dir(&self) -> &'static str {
        match self {
            NodeProfile::FullMain => "mainnet",
            NodeProfile::FullNile => "nile",
            NodeProfile::WitnessPrivate => "private",
        }
    }
}

impl FromStr for NodeProfile {
    type Err = TrondError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "full-main" => Ok(NodeProfile::FullMain),
            "full-nile" => Ok(NodeProfile::FullNile),
            "witness-private" => Ok(NodeProfile::WitnessPrivate),
            other => Err(TrondError::UnsupportedProfile(other.to_string())),
        }
    }
}

impl fmt::Display for NodeProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            NodeProfile::FullMain => "full-main",
            NodeProfile::FullNile => "full-nile",
            NodeProfile::WitnessPrivate => "witness-private",
        })
    }
}

/// Compose file for `profile`; an explicit path wins. Relative paths are
/// taken from `root`.
pub fn compose_file(root: &Path, profile: NodeProfile, explicit: Option<&Path>) -> PathBuf {
    match explicit {
        Some(path) => root.join(path),
        None => root.join(profile.default_compose_file()),
    }
}

fn resolve_compose(root: &Path, profile: NodeProfile, explicit: Option<&Path>) -> Result<PathBuf> {
    let file = compose_file(root, profile, explicit);
    output::field("compose file", &file.display().to_string());
    fs_utils::require_file(&file)?;
    Ok(file)
}

/// Start a node: `docker-compose -f <file> up -d`.
pub fn start(root: &Path, profile: NodeProfile, explicit: Option<&Path>) -> anyhow::Result<()> {
    env::require_local(root)?;

    output::action(&format!("Starting {} node", profile));
    let file = resolve_compose(root, profile, explicit)?;
    process::compose_up(root, &file)
        .with_context(|| format!("Failed to start node with {}", file.display()))?;

    output::success("node started");
    let logs = format!("./logs/{}", profile.log_dir());
    output::info(&format!(
        "Logs are in {logs}. Run 'tail -f {logs}/tron.log' to follow them."
    ));
    output::info("Check the container status with 'docker ps'.");
    Ok(())
}

/// Stop a node: `docker-compose -f <file> down`.
pub fn stop(root: &Path, profile: NodeProfile, explicit: Option<&Path>) -> anyhow::Result<()> {
    output::action(&format!("Stopping {} node", profile));
    let file = resolve_compose(root, profile, explicit)?;
    let out = process::compose_down(root, &file)
        .with_context(|| format!("Failed to stop node with {}", file.display()))?;

    for line in out.lines().filter(|l| !l.trim().is_empty()) {
        output::detail(line);
    }
    output::success("node stopped");
    Ok(())
}
