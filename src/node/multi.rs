//! Multi-node private network over SSH
//!
//! Hosts are handled one after another, in layout order. The first failing
//! host aborts the run.

use crate::core::error::Result;
use crate::core::fs_utils::{self, PathKind};
use crate::core::{output, progress};
use crate::helpers::remote::SshTarget;
use anyhow::{Context, bail};
use std::path::{Path, PathBuf};

use super::layout::{Layout, RemoteNode};

/// Directories created under each node directory by `env-multi`.
pub const REMOTE_DIRS: [&str; 3] = ["logs", "conf", "output-directory"];

fn print_node(i: usize, total: usize, node: &RemoteNode) {
    output::action_numbered(i + 1, total, &format!("Node {}", node.node_ip));
    output::field("Directory", &node.node_directory);
    output::field("Config File", &node.config_file);
    output::field("Compose File", &node.docker_compose_file);
    output::field("Type", &format!("{:?}", node.node_type).to_lowercase());
    output::field("SSH Port", &node.ssh_port.to_string());
    output::field("SSH User", &node.ssh_user);
}

/// Resolve auth and probe the host. Both outcomes are reported as the node's
/// SSH status; only a missing auth method comes back as an error, for the
/// caller to raise once it needs the connection.
fn connect(node: &RemoteNode) -> Result<SshTarget> {
    let target = match node.target() {
        Ok(target) => target,
        Err(e) => {
            output::field("SSH Status", &e.to_string());
            return Err(e);
        }
    };
    output::field("Auth Method", &target.auth.describe());

    let probe = progress::with_spinner(&format!("probing {}", node.node_ip), || target.check());
    let status = match probe {
        Ok(()) => "Open".to_string(),
        Err(e) => e.to_string(),
    };
    output::field("SSH Status", &status);
    Ok(target)
}

fn file_name(local: &str) -> anyhow::Result<String> {
    Path::new(local)
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .with_context(|| format!("'{}' does not name a file", local))
}

/// Check every node, then create remote directories, then copy files.
pub fn env_multi(root: &Path) -> anyhow::Result<()> {
    let layout = Layout::load(root).context("Failed to load the node layout")?;
    let total = layout.nodes.len();

    output::action("Nodes:");
    let mut targets = Vec::with_capacity(total);
    let mut failed = false;
    for (i, node) in layout.nodes.iter().enumerate() {
        print_node(i, total, node);
        targets.push(connect(node));

        for (what, file) in [
            ("config file", &node.config_file),
            ("docker-compose file", &node.docker_compose_file),
        ] {
            if fs_utils::path_kind(&root.join(file)) != PathKind::File {
                output::error(&format!("{} not exists or not a file: {}", what, file));
                failed = true;
            }
        }
    }
    if failed {
        bail!("configuration file check failed, please check it and try again");
    }

    output::action("Creating remote directories");
    let mut ready = Vec::with_capacity(total);
    for (i, (node, target)) in layout.nodes.iter().zip(targets).enumerate() {
        output::action_numbered(i + 1, total, &format!("Node {}", node.node_ip));
        let target = target.with_context(|| format!("Cannot authenticate to {}", node.node_ip))?;
        for dir in REMOTE_DIRS {
            let remote = node.remote_path(&[dir]);
            let created = target
                .mkdir_if_missing(&remote)
                .with_context(|| format!("Failed to create {} on {}", remote, node.node_ip))?;
            if created {
                output::sub_action(&format!("created {}", remote));
            } else {
                output::skip(&format!("{} already exists, skipping", remote));
            }
        }
        ready.push(target);
    }

    output::action("Copying files");
    for (i, (node, target)) in layout.nodes.iter().zip(&ready).enumerate() {
        output::action_numbered(i + 1, total, &format!("Node {}", node.node_ip));
        let uploads: [(PathBuf, String); 2] = [
            (
                root.join(&node.config_file),
                node.remote_path(&["conf", &file_name(&node.config_file)?]),
            ),
            (
                root.join(&node.docker_compose_file),
                node.remote_path(&[&file_name(&node.docker_compose_file)?]),
            ),
        ];
        for (local, remote) in &uploads {
            output::sub_action(&format!("{} -> {}:{}", local.display(), node.node_ip, remote));
            target
                .upload(local, remote)
                .with_context(|| format!("SCP to {} failed", node.node_ip))?;
        }
    }

    output::success("remote environment is ready");
    Ok(())
}

/// Start (or with `down`, stop) every node in the layout.
pub fn run_multi(root: &Path, down: bool) -> anyhow::Result<()> {
    let layout = Layout::load(root).context("Failed to load the node layout")?;
    let total = layout.nodes.len();
    let verb = if down { "stop" } else { "start" };

    for (i, node) in layout.nodes.iter().enumerate() {
        print_node(i, total, node);
        let target = connect(node);

        let compose_file = node.node_type.remote_compose_file();
        let target =
            target.with_context(|| format!("Cannot authenticate to {}", node.node_ip))?;
        let out = target
            .compose(&node.node_directory, compose_file, down)
            .with_context(|| format!("Failed to {} remote node {}", verb, node.node_ip))?;
        for line in out.lines().filter(|l| !l.trim().is_empty()) {
            output::detail(line);
        }
        output::sub_action(&format!("{} node succeeded on {}", verb, node.node_ip));
    }

    output::success(&format!("{} node(s) done", total));
    Ok(())
}
