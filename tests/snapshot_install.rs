//! Snapshot install pipeline against a mock snapshot host.

use md5::{Digest, Md5};
use std::path::Path;
use trond::TrondError;
use trond::helpers::extract::ExtractStats;
use trond::snapshot::source::{DataType, DbEngine};
use trond::snapshot::{
    InstallState, NetworkType, NodeKind, SnapshotInstaller, SnapshotKind, SourceDescriptor,
    SourceRegistry, Stage, resolve,
};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn mock_registry(domain: &str) -> SourceRegistry {
    SourceRegistry::new(vec![SourceDescriptor {
        kind: SnapshotKind::FullLevelSG,
        domain: domain.to_string(),
        region: "Local".to_string(),
        engine: DbEngine::LevelDb,
        network: NetworkType::Mainnet,
        data_type: DataType::Full,
        download_url: None,
        description: "mock".to_string(),
    }])
}

fn snapshot_archive() -> Vec<u8> {
    let encoder = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
    let mut builder = tar::Builder::new(encoder);

    let mut add = |name: &str, data: &[u8]| {
        let mut header = tar::Header::new_gnu();
        header.set_size(data.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder.append_data(&mut header, name, data).unwrap();
    };
    add("output-directory/database/CURRENT", b"MANIFEST-000004\n");
    add("output-directory/database/LOCK", b"");
    add("output-directory/database/block/000005.ldb", &[7u8; 4096]);

    builder.into_inner().unwrap().finish().unwrap()
}

async fn mount(server: &MockServer, backup: &str, kind: NodeKind, archive: &[u8]) {
    let name = kind.archive_name();
    let md5 = hex::encode(Md5::digest(archive));

    Mock::given(method("GET"))
        .and(path(format!("/{}/{}.md5sum", backup, name)))
        .respond_with(ResponseTemplate::new(200).set_body_string(format!("{} {}\n", md5, name)))
        .expect(1)
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/{}/{}", backup, name)))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(archive.to_vec()))
        .expect(1)
        .mount(server)
        .await;
}

fn read(p: &Path) -> String {
    std::fs::read_to_string(p).unwrap()
}

#[tokio::test]
async fn install_downloads_verifies_extracts_and_relocates() {
    let server = MockServer::start().await;
    let archive = snapshot_archive();
    mount(&server, "backup20250205", NodeKind::Full, &archive).await;

    let domain = server.address().to_string();
    let registry = mock_registry(&domain);
    let root = tempfile::tempdir().unwrap();

    let mut installer = SnapshotInstaller::new(&registry, root.path());
    assert_eq!(installer.state(), InstallState::Idle);
    let report = installer
        .install(&domain, "backup20250205", NodeKind::Full)
        .unwrap();

    assert_eq!(installer.state(), InstallState::Done);
    assert_eq!(report.stats, ExtractStats { files: 3, bytes: 16 + 4096 });
    assert_eq!(report.archive, root.path().join("FullNode_output-directory.tgz"));
    assert!(root.path().join("FullNode_output-directory.tgz.md5sum").is_file());

    let db = root.path().join("output-directory/mainnet/database");
    assert_eq!(report.database, db);
    assert_eq!(read(&db.join("CURRENT")), "MANIFEST-000004\n");
    assert_eq!(std::fs::metadata(db.join("block/000005.ldb")).unwrap().len(), 4096);
    assert!(!root.path().join("output-directory/database").exists());

    server.verify().await;
}

#[tokio::test]
async fn second_install_aborts_before_any_request() {
    let server = MockServer::start().await;
    let archive = snapshot_archive();
    mount(&server, "backup20250205", NodeKind::Full, &archive).await;

    let domain = server.address().to_string();
    let registry = mock_registry(&domain);
    let root = tempfile::tempdir().unwrap();

    SnapshotInstaller::new(&registry, root.path())
        .install(&domain, "backup20250205", NodeKind::Full)
        .unwrap();

    // Each file was served once; a second request would break `expect(1)`.
    let mut again = SnapshotInstaller::new(&registry, root.path());
    let err = again
        .install(&domain, "backup20250205", NodeKind::Full)
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<TrondError>(),
        Some(TrondError::DatabaseExists(_))
    ));
    assert_eq!(again.state(), InstallState::Failed(Stage::Resolving));

    server.verify().await;
}

#[tokio::test]
async fn missing_checksum_fails_before_data_download() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/backup20250205/LiteFullNode_output-directory.tgz"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0u8; 16]))
        .expect(0)
        .mount(&server)
        .await;

    let domain = server.address().to_string();
    let registry = mock_registry(&domain);
    let root = tempfile::tempdir().unwrap();

    let mut installer = SnapshotInstaller::new(&registry, root.path());
    let err = installer
        .install(&domain, "backup20250205", NodeKind::Lite)
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<TrondError>(),
        Some(TrondError::HttpStatus { status: 404, .. })
    ));
    assert_eq!(installer.state(), InstallState::Failed(Stage::DownloadingChecksum));

    server.verify().await;
}

#[tokio::test]
async fn sidecar_naming_another_file_fails_before_data_download() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/backup20250205/LiteFullNode_output-directory.tgz.md5sum"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            "5eb63bbbe01eeed093cb22bb8f5acdc3 FullNode_output-directory.tgz\n",
        ))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/backup20250205/LiteFullNode_output-directory.tgz"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0u8; 16]))
        .expect(0)
        .mount(&server)
        .await;

    let domain = server.address().to_string();
    let registry = mock_registry(&domain);
    let root = tempfile::tempdir().unwrap();

    let mut installer = SnapshotInstaller::new(&registry, root.path());
    let err = installer
        .install(&domain, "backup20250205", NodeKind::Lite)
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<TrondError>(),
        Some(TrondError::FilenameMismatch { .. })
    ));
    assert_eq!(installer.state(), InstallState::Failed(Stage::DownloadingData));

    server.verify().await;
}

#[test]
fn resolved_urls_match_mock_layout() {
    let registry = mock_registry("127.0.0.1:8080");
    let urls = resolve(&registry, "127.0.0.1:8080", "backup20250205", NodeKind::Lite);
    assert_eq!(
        urls.data,
        "http://127.0.0.1:8080/backup20250205/LiteFullNode_output-directory.tgz"
    );
    assert_eq!(urls.checksum, format!("{}.md5sum", urls.data));
}
