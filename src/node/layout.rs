//! Private network layout file
//!
//! `conf/private_net_layout.toml` lists the remote hosts, one `[[nodes]]`
//! table each:
//!
//! ```toml
//! [[nodes]]
//! node_ip = "192.168.1.10"
//! node_directory = "/home/tron/tron-docker"
//! config_file = "./conf/private_net_config_witness1.conf"
//! docker_compose_file = "./single_node/docker-compose.witness.private.yml"
//! node_type = "sr"
//! ssh_user = "tron"
//! ssh_key = "~/.ssh/id_rsa"
//! ```

use crate::core::error::{Result, TrondError};
use crate::helpers::remote::{Auth, SshTarget};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Location of the layout file, relative to the root.
pub const LAYOUT_FILE: &str = "conf/private_net_layout.toml";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeType {
    #[default]
    Full,
    Sr,
}

impl NodeType {
    /// Compose file started on the remote host, relative to its node directory.
    pub fn remote_compose_file(&self) -> &'static str {
        match self {
            NodeType::Full => "./single_node/docker-compose.fullnode.private.yml",
            NodeType::Sr => "./single_node/docker-compose.witness.private.yml",
        }
    }
}

fn default_ssh_port() -> u16 {
    22
}

#[derive(Debug, Clone, Deserialize)]
pub struct RemoteNode {
    pub node_ip: String,
    pub node_directory: String,
    pub config_file: String,
    pub docker_compose_file: String,
    #[serde(default)]
    pub node_type: NodeType,
    #[serde(default = "default_ssh_port")]
    pub ssh_port: u16,
    pub ssh_user: String,
    #[serde(default)]
    pub ssh_password: Option<String>,
    #[serde(default)]
    pub ssh_key: Option<String>,
}

impl RemoteNode {
    /// Connection details, with auth picked from the entry and `SSH_AUTH_SOCK`.
    pub fn target(&self) -> Result<SshTarget> {
        let sock = std::env::var_os("SSH_AUTH_SOCK");
        let auth = Auth::select(
            &self.node_ip,
            self.ssh_key.as_deref(),
            self.ssh_password.as_deref(),
            sock.as_deref(),
        )?;
        Ok(SshTarget {
            host: self.node_ip.clone(),
            port: self.ssh_port,
            user: self.ssh_user.clone(),
            auth,
        })
    }

    /// Remote path `<node_directory>/<parts...>`.
    pub fn remote_path(&self, parts: &[&str]) -> String {
        let mut path = self.node_directory.trim_end_matches('/').to_string();
        for part in parts {
            path.push('/');
            path.push_str(part);
        }
        path
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Layout {
    #[serde(default)]
    pub nodes: Vec<RemoteNode>,
}

impl Layout {
    /// Parse layout text; `path` is only used in error messages.
    pub fn parse(path: &Path, text: &str) -> Result<Self> {
        let invalid = |reason: String| TrondError::InvalidLayout {
            path: path.to_path_buf(),
            reason,
        };

        let layout: Layout = toml::from_str(text).map_err(|e| invalid(e.to_string()))?;
        if layout.nodes.is_empty() {
            return Err(invalid("no [[nodes]] entries".to_string()));
        }
        for (i, node) in layout.nodes.iter().enumerate() {
            if node.node_ip.trim().is_empty() {
                return Err(invalid(format!("node {} has an empty node_ip", i)));
            }
            if node.node_directory.trim().is_empty() {
                return Err(invalid(format!("node {} has an empty node_directory", i)));
            }
        }
        Ok(layout)
    }

    pub fn path(root: &Path) -> PathBuf {
        root.join(LAYOUT_FILE)
    }

    /// Load `conf/private_net_layout.toml` under `root`.
    pub fn load(root: &Path) -> Result<Self> {
        let path = Self::path(root);
        if !path.is_file() {
            return Err(TrondError::MissingFile(path));
        }
        let text = std::fs::read_to_string(&path)?;
        Self::parse(&path, &text)
    }
}
