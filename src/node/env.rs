//! Local working tree checks

use crate::core::error::Result;
use crate::core::fs_utils::{self, PathKind};
use crate::core::output;
use std::path::{Path, PathBuf};

/// Directories shipped with the repository.
pub const REQUIRED_DIRS: [&str; 3] = ["conf", "single_node", "private_net"];

/// Directories created on first use.
pub const CREATED_DIRS: [&str; 2] = ["logs", "output-directory"];

pub const REQUIRED_FILES: [&str; 9] = [
    "conf/main_net_config.conf",
    "conf/nile_net_config.conf",
    "conf/private_net_config_witness1.conf",
    "conf/private_net_config_witness2.conf",
    "conf/private_net_config_others.conf",
    "single_node/docker-compose.fullnode.main.yml",
    "single_node/docker-compose.fullnode.nile.yml",
    "single_node/docker-compose.witness.private.yml",
    "private_net/docker-compose.yml",
];

/// Outcome of [`check_local`].
#[derive(Debug, Default)]
pub struct EnvReport {
    /// Human-readable description of every failed requirement.
    pub problems: Vec<String>,
    /// Directories created during the check.
    pub created: Vec<PathBuf>,
}

impl EnvReport {
    pub fn is_ok(&self) -> bool {
        self.problems.is_empty()
    }
}

/// Check the layout under `root`, creating the on-demand directories.
///
/// Every problem is reported; the check does not stop at the first one.
pub fn check_local(root: &Path) -> Result<EnvReport> {
    let mut report = EnvReport::default();

    for dir in REQUIRED_DIRS {
        let path = root.join(dir);
        match fs_utils::path_kind(&path) {
            PathKind::Dir => output::detail(&format!("directory exists: {}", dir)),
            PathKind::File => report.problems.push(format!("target is not a directory: {}", dir)),
            PathKind::Missing => report.problems.push(format!("directory not exists: {}", dir)),
        }
    }

    for dir in CREATED_DIRS {
        let path = root.join(dir);
        match fs_utils::path_kind(&path) {
            PathKind::Dir => output::detail(&format!("directory exists: {}", dir)),
            PathKind::File => report.problems.push(format!("target is not a directory: {}", dir)),
            PathKind::Missing => {
                output::sub_action(&format!("creating directory {}", dir));
                std::fs::create_dir_all(&path)?;
                if dir == "output-directory" {
                    output::info("no history database, the node will sync from block 0");
                }
                report.created.push(path);
            }
        }
    }

    for file in REQUIRED_FILES {
        if fs_utils::path_kind(&root.join(file)) != PathKind::File {
            report.problems.push(format!("file not exists or not a file: {}", file));
        }
    }

    for problem in &report.problems {
        output::error(problem);
    }
    Ok(report)
}

/// Run [`check_local`] and fail if anything is missing.
pub fn require_local(root: &Path) -> anyhow::Result<()> {
    let report = check_local(root)?;
    if !report.is_ok() {
        anyhow::bail!(
            "local environment check failed ({} problems) in {}",
            report.problems.len(),
            root.display()
        );
    }
    output::success("local environment is ready");
    Ok(())
}
