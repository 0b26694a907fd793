//! Snapshot install pipeline
//!
//! resolve → download checksum → download data → verify → extract →
//! relocate. Each step either completes or leaves the installer in
//! [`InstallState::Failed`] naming the step; nothing already written is
//! rolled back.

use crate::core::error::{Result, TrondError};
use crate::core::output;
use crate::helpers::acquire::{DownloadTask, download_file};
use crate::helpers::extract::{self, ExtractStats};
use anyhow::Context;
use std::fmt;
use std::path::{Path, PathBuf};

use super::resolve::{self, NodeKind};
use super::source::SourceRegistry;

/// Directory the archives unpack into, relative to the root.
pub const OUTPUT_DIR: &str = "output-directory";
/// Database directory inside an extracted archive.
pub const DATABASE_DIR: &str = "database";

/// Pipeline steps, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Resolving,
    DownloadingChecksum,
    DownloadingData,
    Verifying,
    Extracting,
    Relocating,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Stage::Resolving => "resolving",
            Stage::DownloadingChecksum => "downloading checksum",
            Stage::DownloadingData => "downloading data",
            Stage::Verifying => "verifying",
            Stage::Extracting => "extracting",
            Stage::Relocating => "relocating",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallState {
    Idle,
    Running(Stage),
    Done,
    Failed(Stage),
}

/// What a finished install produced.
#[derive(Debug, Clone)]
pub struct InstallReport {
    pub archive: PathBuf,
    pub database: PathBuf,
    pub stats: ExtractStats,
}

/// Where a network's database lives under `root`.
pub fn database_dir(root: &Path, network_dir: &str) -> PathBuf {
    root.join(OUTPUT_DIR).join(network_dir).join(DATABASE_DIR)
}

/// Downloads and installs one snapshot into a working tree.
pub struct SnapshotInstaller<'a> {
    registry: &'a SourceRegistry,
    root: PathBuf,
    state: InstallState,
}

impl<'a> SnapshotInstaller<'a> {
    pub fn new(registry: &'a SourceRegistry, root: impl Into<PathBuf>) -> Self {
        Self {
            registry,
            root: root.into(),
            state: InstallState::Idle,
        }
    }

    pub fn state(&self) -> InstallState {
        self.state
    }

    fn enter(&mut self, stage: Stage) {
        self.state = InstallState::Running(stage);
    }

    /// Run the whole pipeline for `backup` of `kind` from `domain`.
    pub fn install(&mut self, domain: &str, backup: &str, kind: NodeKind) -> anyhow::Result<InstallReport> {
        output::action(&format!("Installing {} snapshot {} from {}", kind, backup, domain));

        match self.run(domain, backup, kind) {
            Ok(report) => {
                self.state = InstallState::Done;
                output::success(&format!("database ready at {}", report.database.display()));
                Ok(report)
            }
            Err(e) => {
                let stage = match self.state {
                    InstallState::Running(stage) => stage,
                    _ => Stage::Resolving,
                };
                self.state = InstallState::Failed(stage);
                Err(e).with_context(|| format!("snapshot install failed while {}", stage))
            }
        }
    }

    fn run(&mut self, domain: &str, backup: &str, kind: NodeKind) -> Result<InstallReport> {
        self.enter(Stage::Resolving);
        let network = self.registry.network_for(domain)?;
        let network_dir = self.root.join(OUTPUT_DIR).join(network.dir_name());
        let database = database_dir(&self.root, network.dir_name());

        if network_dir.is_dir() {
            if database.exists() {
                return Err(TrondError::DatabaseExists(database));
            }
        } else {
            output::sub_action(&format!("creating directory {}", network_dir.display()));
            std::fs::create_dir_all(&network_dir)?;
        }

        let urls = resolve::resolve(self.registry, domain, backup, kind);

        self.enter(Stage::DownloadingChecksum);
        output::sub_action("downloading checksum");
        let sidecar = download_file(&urls.checksum, &self.root, None)?;

        self.enter(Stage::DownloadingData);
        output::sub_action("downloading snapshot");
        let task = DownloadTask::with_sidecar(&urls.data, Some(&sidecar))?;
        let archive = task.fetch(&self.root)?;

        self.enter(Stage::Verifying);
        output::sub_action("verifying");
        task.verify(&archive)?;

        self.enter(Stage::Extracting);
        output::sub_action(&format!("extracting {}", task.file_name));
        let stats = extract::extract_tgz(&archive, &self.root)?;

        self.enter(Stage::Relocating);
        output::sub_action(&format!("moving database to {}", database.display()));
        relocate(&self.root, &database)?;

        Ok(InstallReport {
            archive,
            database,
            stats,
        })
    }
}

/// Move the freshly extracted `output-directory/database` to `database`.
fn relocate(root: &Path, database: &Path) -> Result<()> {
    let extracted = root.join(OUTPUT_DIR).join(DATABASE_DIR);
    if !extracted.is_dir() {
        return Err(TrondError::MissingExtractedData(extracted));
    }
    if database.exists() {
        return Err(TrondError::DatabaseExists(database.to_path_buf()));
    }
    std::fs::rename(&extracted, database)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::source::{DataType, DbEngine, NetworkType, SnapshotKind, SourceDescriptor};
    use md5::{Digest, Md5};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const BACKUP: &str = "backup20250204";

    fn registry_for(domain: &str, network: NetworkType) -> SourceRegistry {
        SourceRegistry::new(vec![SourceDescriptor {
            kind: SnapshotKind::LiteLevelSG,
            domain: domain.to_string(),
            region: "Local".to_string(),
            engine: DbEngine::LevelDb,
            network,
            data_type: DataType::Lite,
            download_url: None,
            description: "test".to_string(),
        }])
    }

    fn tgz(files: &[(&str, &[u8])]) -> Vec<u8> {
        let encoder = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
        let mut builder = tar::Builder::new(encoder);
        for (name, content) in files {
            let mut header = tar::Header::new_gnu();
            header.set_size(content.len() as u64);
            header.set_mode(0o644);
            header.set_cksum();
            builder.append_data(&mut header, name, *content).unwrap();
        }
        builder.into_inner().unwrap().finish().unwrap()
    }

    async fn serve(server: &MockServer, archive: Vec<u8>, declared_md5: &str) {
        let name = NodeKind::Lite.archive_name();
        Mock::given(method("GET"))
            .and(path(format!("/{}/{}.md5sum", BACKUP, name)))
            .respond_with(
                ResponseTemplate::new(200).set_body_string(format!("{}  {}\n", declared_md5, name)),
            )
            .mount(server)
            .await;
        Mock::given(method("GET"))
            .and(path(format!("/{}/{}", BACKUP, name)))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(archive))
            .mount(server)
            .await;
    }

    #[test]
    fn test_relocate_requires_extracted_database() {
        let dir = tempfile::tempdir().unwrap();
        let target = database_dir(dir.path(), "mainnet");
        std::fs::create_dir_all(target.parent().unwrap()).unwrap();

        assert!(matches!(
            relocate(dir.path(), &target),
            Err(TrondError::MissingExtractedData(_))
        ));
    }

    #[test]
    fn test_unknown_domain_fails_while_resolving() {
        let reg = SourceRegistry::builtin();
        let dir = tempfile::tempdir().unwrap();
        let mut installer = SnapshotInstaller::new(&reg, dir.path());

        let err = installer.install("example.com", BACKUP, NodeKind::Lite).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<TrondError>(),
            Some(TrondError::UnsupportedDomain(_))
        ));
        assert_eq!(installer.state(), InstallState::Failed(Stage::Resolving));
        assert!(!dir.path().join(OUTPUT_DIR).exists());
    }

    #[tokio::test]
    async fn test_existing_database_aborts_before_network() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&mock_server)
            .await;

        let domain = mock_server.address().to_string();
        let reg = registry_for(&domain, NetworkType::Mainnet);
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(database_dir(dir.path(), "mainnet")).unwrap();

        let mut installer = SnapshotInstaller::new(&reg, dir.path());
        let err = installer.install(&domain, BACKUP, NodeKind::Lite).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<TrondError>(),
            Some(TrondError::DatabaseExists(_))
        ));
        assert_eq!(installer.state(), InstallState::Failed(Stage::Resolving));

        mock_server.verify().await;
    }

    #[tokio::test]
    async fn test_checksum_mismatch_fails_while_verifying() {
        let mock_server = MockServer::start().await;
        let archive = tgz(&[("output-directory/database/CURRENT", b"x".as_slice())]);
        serve(&mock_server, archive, "00000000000000000000000000000000").await;

        let domain = mock_server.address().to_string();
        let reg = registry_for(&domain, NetworkType::Mainnet);
        let dir = tempfile::tempdir().unwrap();

        let mut installer = SnapshotInstaller::new(&reg, dir.path());
        let err = installer.install(&domain, BACKUP, NodeKind::Lite).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<TrondError>(),
            Some(TrondError::ChecksumMismatch { .. })
        ));
        assert_eq!(installer.state(), InstallState::Failed(Stage::Verifying));
        // nothing extracted, archive kept
        assert!(!dir.path().join("output-directory/database").exists());
        assert!(dir.path().join(NodeKind::Lite.archive_name()).exists());
    }

    #[tokio::test]
    async fn test_archive_without_database_fails_while_relocating() {
        let mock_server = MockServer::start().await;
        let archive = tgz(&[("output-directory/other/file", b"x".as_slice())]);
        let md5 = hex::encode(Md5::digest(&archive));
        serve(&mock_server, archive, &md5).await;

        let domain = mock_server.address().to_string();
        let reg = registry_for(&domain, NetworkType::Nile);
        let dir = tempfile::tempdir().unwrap();

        let mut installer = SnapshotInstaller::new(&reg, dir.path());
        let err = installer.install(&domain, BACKUP, NodeKind::Lite).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<TrondError>(),
            Some(TrondError::MissingExtractedData(_))
        ));
        assert_eq!(installer.state(), InstallState::Failed(Stage::Relocating));
    }

    #[tokio::test]
    async fn test_install_relocates_database() {
        let mock_server = MockServer::start().await;
        let archive = tgz(&[
            ("output-directory/database/CURRENT", b"MANIFEST-000002\n".as_slice()),
            ("output-directory/database/000001.sst", b"0123456789".as_slice()),
        ]);
        let md5 = hex::encode(Md5::digest(&archive));
        serve(&mock_server, archive, &md5).await;

        let domain = mock_server.address().to_string();
        let reg = registry_for(&domain, NetworkType::Nile);
        let dir = tempfile::tempdir().unwrap();

        let mut installer = SnapshotInstaller::new(&reg, dir.path());
        let report = installer.install(&domain, BACKUP, NodeKind::Lite).unwrap();

        assert_eq!(installer.state(), InstallState::Done);
        assert_eq!(report.stats, ExtractStats { files: 2, bytes: 26 });
        assert_eq!(report.database, database_dir(dir.path(), "nile"));
        assert!(report.database.join("CURRENT").is_file());
        assert!(!dir.path().join("output-directory/database").exists());
    }
}
