//! Snapshot sources
//!
//! The registry is built once and handed to whatever needs it; nothing reads
//! it through a global.

use crate::core::error::{Result, TrondError};
use crate::core::output;
use std::fmt;

/// Families of published snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SnapshotKind {
    FullLevelNA,
    FullLevelSG,
    FullLevelNAWithAccountHistory,
    FullRocksSG,
    LiteLevelSG,
    NileLevel,
}

/// Which chain a snapshot belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NetworkType {
    Mainnet,
    Nile,
}

impl NetworkType {
    /// Directory name under `output-directory/`.
    pub fn dir_name(&self) -> &'static str {
        match self {
            NetworkType::Mainnet => "mainnet",
            NetworkType::Nile => "nile",
        }
    }
}

impl fmt::Display for NetworkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NetworkType::Mainnet => write!(f, "Mainnet"),
            NetworkType::Nile => write!(f, "Nile"),
        }
    }
}

/// What a source serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    Full,
    Lite,
    All,
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataType::Full => write!(f, "Fullnode Data Source"),
            DataType::Lite => write!(f, "Lite Fullnode Data Source"),
            DataType::All => write!(f, "Fullnode/Lite Fullnode Data Source"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DbEngine {
    LevelDb,
    RocksDb,
}

impl fmt::Display for DbEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DbEngine::LevelDb => write!(f, "LevelDB"),
            DbEngine::RocksDb => write!(f, "RocksDB"),
        }
    }
}

/// One snapshot host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDescriptor {
    pub kind: SnapshotKind,
    pub domain: String,
    pub region: String,
    pub engine: DbEngine,
    pub network: NetworkType,
    pub data_type: DataType,
    /// Base URL used instead of `http://<domain>` when set. Such sources
    /// have no browsable index.
    pub download_url: Option<String>,
    pub description: String,
}

impl SourceDescriptor {
    /// Scheme, host and optional path prefix snapshots are served under.
    pub fn base_url(&self) -> String {
        match &self.download_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => format!("http://{}", self.domain),
        }
    }

    /// Whether backups can be listed from an HTML index.
    pub fn is_browsable(&self) -> bool {
        self.download_url.is_none()
    }
}

/// Immutable table of known sources.
#[derive(Debug, Clone)]
pub struct SourceRegistry {
    entries: Vec<SourceDescriptor>,
}

#[allow(clippy::too_many_arguments)]
fn entry(
    kind: SnapshotKind,
    domain: &str,
    region: &str,
    engine: DbEngine,
    network: NetworkType,
    data_type: DataType,
    download_url: Option<&str>,
    description: &str,
) -> SourceDescriptor {
    SourceDescriptor {
        kind,
        domain: domain.to_string(),
        region: region.to_string(),
        engine,
        network,
        data_type,
        download_url: download_url.map(str::to_string),
        description: description.to_string(),
    }
}

impl SourceRegistry {
    pub fn new(entries: Vec<SourceDescriptor>) -> Self {
        Self { entries }
    }

    /// The published snapshot hosts.
    pub fn builtin() -> Self {
        use DataType::*;
        use DbEngine::*;
        use NetworkType::*;
        use SnapshotKind::*;

        Self::new(vec![
            entry(
                FullLevelNA,
                "34.86.86.229",
                "America",
                LevelDb,
                Mainnet,
                Full,
                None,
                "Exclude internal transactions (About 2094G on 25-Jan-2025)",
            ),
            entry(
                FullLevelSG,
                "34.143.247.77",
                "Singapore",
                LevelDb,
                Mainnet,
                Full,
                None,
                "Exclude internal transactions (About 2093G on 24-Jan-2025)",
            ),
            entry(
                FullLevelSG,
                "35.247.128.170",
                "Singapore",
                LevelDb,
                Mainnet,
                Full,
                None,
                "Include internal transactions (About 2278G on 24-Jan-2025)",
            ),
            entry(
                FullLevelNAWithAccountHistory,
                "34.48.6.163",
                "America",
                LevelDb,
                Mainnet,
                Full,
                None,
                "Exclude internal transactions, include account history TRX balance (About 2627G on 24-Jan-2025)",
            ),
            entry(
                FullRocksSG,
                "35.197.17.205",
                "America",
                RocksDb,
                Mainnet,
                Full,
                None,
                "Exclude internal transactions (About 2067G on 24-Jan-2025)",
            ),
            entry(
                LiteLevelSG,
                "34.143.247.77",
                "Singapore",
                LevelDb,
                Mainnet,
                Lite,
                None,
                "(About 46G on 24-Jan-2025)",
            ),
            entry(
                NileLevel,
                "database.nileex.io",
                "Singapore",
                LevelDb,
                Nile,
                All,
                Some("https://nile-snapshots.s3-accelerate.amazonaws.com"),
                "Fullnode/Lite Fullnode (About 30G on 24-Jan-2025)",
            ),
        ])
    }

    pub fn entries(&self) -> &[SourceDescriptor] {
        &self.entries
    }

    /// Entry for a (kind, domain) pair.
    pub fn lookup(&self, kind: SnapshotKind, domain: &str) -> Option<&SourceDescriptor> {
        self.entries
            .iter()
            .find(|e| e.kind == kind && e.domain == domain)
    }

    pub fn contains(&self, domain: &str) -> bool {
        self.entries.iter().any(|e| e.domain == domain)
    }

    /// First entry for a domain, or `UnsupportedDomain`.
    ///
    /// A domain listed under several kinds shares network and base URL
    /// across them, so any of its entries will do.
    pub fn require(&self, domain: &str) -> Result<&SourceDescriptor> {
        self.entries
            .iter()
            .find(|e| e.domain == domain)
            .ok_or_else(|| TrondError::UnsupportedDomain(domain.to_string()))
    }

    pub fn network_for(&self, domain: &str) -> Result<NetworkType> {
        self.require(domain).map(|e| e.network)
    }

    /// Entries of one data type, in registry order.
    pub fn by_data_type(&self, data_type: DataType) -> impl Iterator<Item = &SourceDescriptor> {
        self.entries.iter().filter(move |e| e.data_type == data_type)
    }

    /// Print every source, lite sources first.
    pub fn show(&self) {
        for data_type in [DataType::Lite, DataType::Full, DataType::All] {
            let mut group = self.by_data_type(data_type).peekable();
            if group.peek().is_none() {
                continue;
            }
            output::action(&format!("{}:", data_type));
            for e in group {
                output::sub_action(&format!("Region: {}", e.region));
                output::field("DBType", &e.engine.to_string());
                output::field("Host", &e.domain);
                output::field("Network", &e.network.to_string());
                output::field("Description", &e.description);
            }
        }
    }
}
