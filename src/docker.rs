//! java-tron image builds
//!
//! Builds and tests go through the repository's Gradle wrapper in
//! `tools/gradlew`, which needs JDK 1.8.

use crate::core::{fs_utils, output, process};
use anyhow::{Context, bail};
use std::path::Path;

pub const GRADLE_DIR: &str = "tools/gradlew";
pub const DOCKER_ENV_DIR: &str = "tools/docker/docker_env";
pub const INSTALL_SCRIPT: &str = "./check-install-docker.sh";

/// Image coordinates: `<org>/<artifact>:<version>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageSpec {
    pub org: String,
    pub artifact: String,
    pub version: String,
}

impl Default for ImageSpec {
    fn default() -> Self {
        Self {
            org: "tronprotocol".to_string(),
            artifact: "java-tron".to_string(),
            version: "latest".to_string(),
        }
    }
}

impl std::fmt::Display for ImageSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}:{}", self.org, self.artifact, self.version)
    }
}

impl ImageSpec {
    fn gradle(&self, task: &str) -> String {
        format!(
            "./gradlew --no-daemon {} -PdockerOrgName={} -PdockerArtifactName={} -Prelease.releaseVersion={}",
            task, self.org, self.artifact, self.version
        )
    }

    /// `sourceDocker` invocation; an empty network omits `-Pnetwork`.
    pub fn build_script(&self, network: &str) -> String {
        let mut script = self.gradle("sourceDocker");
        if !network.is_empty() {
            script.push_str(&format!(" -Pnetwork={}", network));
        }
        script
    }

    pub fn test_script(&self) -> String {
        self.gradle("testDocker")
    }
}

/// Whether `java -version` output names a 1.8 runtime.
pub fn is_jdk_1_8(version_output: &str) -> bool {
    version_output.contains("\"1.8.")
}

/// Fail unless the `java` on PATH is 1.8.
pub fn require_jdk_1_8() -> anyhow::Result<()> {
    process::require_tool("java")?;
    // java prints its version banner on stderr
    let (_, banner) = process::run_combined("java", &["-version".to_string()])
        .context("Failed to run 'java -version'")?;
    if !is_jdk_1_8(&banner) {
        bail!(
            "JDK version should be 1.8, found: {}",
            banner.lines().next().unwrap_or("unknown")
        );
    }
    Ok(())
}

fn run_in(root: &Path, dir: &str, script: &str) -> anyhow::Result<()> {
    let workdir = root.join(dir);
    if fs_utils::path_kind(&workdir) != fs_utils::PathKind::Dir {
        bail!("directory not found: {}", workdir.display());
    }
    process::run_streaming(script, &workdir)
        .with_context(|| format!("'{}' failed in {}", script, workdir.display()))?;
    Ok(())
}

/// Build an image from source.
pub fn build(root: &Path, image: &ImageSpec, network: &str) -> anyhow::Result<()> {
    require_jdk_1_8()?;

    output::action(&format!("Building {}", image));
    output::info("The build may take a long time, depending on your network speed.");
    run_in(root, GRADLE_DIR, &image.build_script(network))?;
    output::success(&format!("built {}", image));
    Ok(())
}

/// Run the image test suite.
pub fn test(root: &Path, image: &ImageSpec) -> anyhow::Result<()> {
    require_jdk_1_8()?;

    output::action(&format!("Testing {}", image));
    run_in(root, GRADLE_DIR, &image.test_script())?;
    output::success(&format!("tested {}", image));
    Ok(())
}

/// Check for Docker and docker-compose, installing them if missing.
pub fn install_docker(root: &Path) -> anyhow::Result<()> {
    output::action("Checking Docker installation");
    run_in(root, DOCKER_ENV_DIR, INSTALL_SCRIPT)
}
