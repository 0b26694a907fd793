//! Docker automation for java-tron nodes
//!
//! `trond` builds node images, installs database snapshots and starts or
//! stops nodes, locally through docker-compose or on remote hosts over SSH.
//!
//! # Snapshot pipeline
//!
//! ```text
//! resolve URLs -> download .md5sum -> download .tgz -> verify -> extract -> relocate
//! ```
//!
//! ```ignore
//! use trond::snapshot::{NodeKind, SnapshotInstaller, SourceRegistry};
//!
//! let registry = SourceRegistry::builtin();
//! let mut installer = SnapshotInstaller::new(&registry, ".");
//! installer.install("34.143.247.77", "backup20250205", NodeKind::Lite)?;
//! ```
//!
//! # Working tree
//!
//! Every operation is relative to a root directory laid out like the
//! tron-docker repository: `conf/`, `single_node/`, `private_net/`,
//! `tools/gradlew/`, `tools/docker/docker_env/`, plus `logs/` and
//! `output-directory/` created on demand.

pub mod core;
pub mod docker;
pub mod helpers;
pub mod node;
pub mod snapshot;

pub use crate::core::error::{Result, TrondError};
pub use crate::core::output;
