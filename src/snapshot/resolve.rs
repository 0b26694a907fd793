//! Snapshot URL resolution

use crate::core::error::TrondError;
use std::fmt;
use std::str::FromStr;

use super::source::SourceRegistry;

/// Suffix of the checksum sidecar published next to every archive.
pub const CHECKSUM_SUFFIX: &str = ".md5sum";

/// Snapshot variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Full,
    Lite,
}

impl NodeKind {
    /// File name of the archive for this variant.
    pub fn archive_name(&self) -> &'static str {
        match self {
            NodeKind::Full => "FullNode_output-directory.tgz",
            NodeKind::Lite => "LiteFullNode_output-directory.tgz",
        }
    }
}

impl FromStr for NodeKind {
    type Err = TrondError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "full" => Ok(NodeKind::Full),
            "lite" => Ok(NodeKind::Lite),
            other => Err(TrondError::UnsupportedNodeType(other.to_string())),
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeKind::Full => write!(f, "full"),
            NodeKind::Lite => write!(f, "lite"),
        }
    }
}

/// Data archive URL and its checksum sidecar URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotUrls {
    pub data: String,
    pub checksum: String,
}

/// Build the URLs for `backup` of `kind` served by `domain`.
///
/// A registry entry with a download URL override wins; any other domain is
/// served over plain HTTP at its root.
pub fn resolve(registry: &SourceRegistry, domain: &str, backup: &str, kind: NodeKind) -> SnapshotUrls {
    let base = registry
        .entries()
        .iter()
        .find(|e| e.domain == domain && e.download_url.is_some())
        .map(|e| e.base_url())
        .unwrap_or_else(|| format!("http://{}", domain));

    let data = format!("{}/{}/{}", base, backup, kind.archive_name());
    let checksum = format!("{}{}", data, CHECKSUM_SUFFIX);
    SnapshotUrls { data, checksum }
}
