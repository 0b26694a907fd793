//! trond CLI - java-tron Docker automation
//!
//! Usage:
//!   trond docker build|test|install-docker       Build and test node images
//!   trond snapshot source|list|download          Fetch database snapshots
//!   trond node env|env-multi|run-single|run-multi
//!                                                Deploy and manage nodes

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use trond::docker::{self, ImageSpec};
use trond::node::{self, NodeProfile};
use trond::output;
use trond::snapshot::{self, NodeKind, SnapshotInstaller, SourceRegistry};

#[derive(Parser)]
#[command(name = "trond")]
#[command(about = "Docker automation for java-tron nodes: image builds, snapshots and deployments")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Working tree (a tron-docker checkout)
    #[arg(short = 'C', long, global = true, env = "TROND_ROOT", default_value = ".")]
    root: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Build and test java-tron images
    #[command(subcommand)]
    Docker(DockerCommand),

    /// List and download database snapshots
    #[command(subcommand)]
    Snapshot(SnapshotCommand),

    /// Check environments and run nodes
    #[command(subcommand)]
    Node(NodeCommand),
}

#[derive(Args)]
struct ImageArgs {
    /// Organization name of the image
    #[arg(short = 'o', long, default_value = "tronprotocol")]
    org: String,

    /// Artifact name of the image
    #[arg(short = 'a', long, default_value = "java-tron")]
    artifact: String,

    /// Release version of the image
    #[arg(short = 'v', long, default_value = "latest")]
    version: String,
}

impl From<ImageArgs> for ImageSpec {
    fn from(a: ImageArgs) -> Self {
        ImageSpec {
            org: a.org,
            artifact: a.artifact,
            version: a.version,
        }
    }
}

#[derive(Subcommand)]
enum DockerCommand {
    /// Build a java-tron image from source (requires JDK 1.8)
    Build {
        #[command(flatten)]
        image: ImageArgs,

        /// Which code the image is built from: mainnet or nile
        #[arg(short = 'n', long, default_value = "mainnet")]
        network: String,
    },

    /// Run the image test suite (requires JDK 1.8)
    Test {
        #[command(flatten)]
        image: ImageArgs,
    },

    /// Check for Docker and docker-compose, installing them if missing
    InstallDocker,
}

#[derive(Subcommand)]
enum SnapshotCommand {
    /// Show available snapshot sources
    Source,

    /// List backups published by a source
    List {
        /// Source domain (see `trond snapshot source`)
        #[arg(short, long)]
        domain: String,
    },

    /// Download, verify and install a snapshot into ./output-directory
    Download(DownloadArgs),
}

#[derive(Args)]
#[command(args_conflicts_with_subcommands = true, subcommand_negates_reqs = true)]
struct DownloadArgs {
    #[command(subcommand)]
    preset: Option<DownloadPreset>,

    /// Source domain (see `trond snapshot source`)
    #[arg(short, long, required = true)]
    domain: Option<String>,

    /// Backup name (see `trond snapshot list`)
    #[arg(short, long, required = true)]
    backup: Option<String>,

    /// Snapshot type: full or lite
    #[arg(short = 't', long = "type", required = true)]
    node_type: Option<String>,
}

#[derive(Subcommand)]
enum DownloadPreset {
    /// Latest mainnet lite snapshot from 34.143.247.77
    DefaultMain,
    /// Latest nile lite snapshot from database.nileex.io
    DefaultNile,
}

#[derive(Subcommand)]
enum NodeCommand {
    /// Check the local working tree
    Env,

    /// Check remote hosts and push configuration to them
    EnvMulti,

    /// Start (or stop) a single local node
    RunSingle(RunSingleArgs),

    /// Start (or stop) every node in conf/private_net_layout.toml
    RunMulti {
        #[command(subcommand)]
        action: Option<StopCommand>,
    },
}

#[derive(Args)]
#[command(args_conflicts_with_subcommands = true, subcommand_negates_reqs = true)]
struct RunSingleArgs {
    #[command(subcommand)]
    action: Option<RunSingleStop>,

    #[command(flatten)]
    target: SingleTarget,
}

#[derive(Args)]
struct SingleTarget {
    /// Node profile: full-main, full-nile or witness-private
    #[arg(short = 't', long = "type", required = true)]
    profile: Option<String>,

    /// Use this docker-compose file instead of the profile's default
    #[arg(short = 'f', long = "compose-file")]
    compose_file: Option<PathBuf>,
}

#[derive(Subcommand)]
enum RunSingleStop {
    /// Stop the node
    Stop(SingleTarget),
}

#[derive(Subcommand)]
enum StopCommand {
    /// Stop the nodes
    Stop,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            output::error(&format!("{:#}", e));
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let root = cli.root;
    if !root.is_dir() {
        anyhow::bail!("working tree not found: {}", root.display());
    }

    match cli.command {
        Commands::Docker(cmd) => match cmd {
            DockerCommand::Build { image, network } => docker::build(&root, &image.into(), &network),
            DockerCommand::Test { image } => docker::test(&root, &image.into()),
            DockerCommand::InstallDocker => docker::install_docker(&root),
        },
        Commands::Snapshot(cmd) => run_snapshot(&root, cmd),
        Commands::Node(cmd) => match cmd {
            NodeCommand::Env => node::require_local(&root),
            NodeCommand::EnvMulti => node::env_multi(&root),
            NodeCommand::RunSingle(args) => match args.action {
                Some(RunSingleStop::Stop(target)) => {
                    let (profile, file) = single_target(target)?;
                    node::single::stop(&root, profile, file.as_deref())
                }
                None => {
                    let (profile, file) = single_target(args.target)?;
                    node::single::start(&root, profile, file.as_deref())
                }
            },
            NodeCommand::RunMulti { action } => {
                node::run_multi(&root, matches!(action, Some(StopCommand::Stop)))
            }
        },
    }
}

fn single_target(target: SingleTarget) -> Result<(NodeProfile, Option<PathBuf>)> {
    let profile = target.profile.context("--type is required")?.parse::<NodeProfile>()?;
    Ok((profile, target.compose_file))
}

fn run_snapshot(root: &Path, cmd: SnapshotCommand) -> Result<()> {
    let registry = SourceRegistry::builtin();

    match cmd {
        SnapshotCommand::Source => {
            registry.show();
            Ok(())
        }
        SnapshotCommand::List { domain } => snapshot::show_list(&registry, &domain),
        SnapshotCommand::Download(args) => {
            let report = match args.preset {
                Some(DownloadPreset::DefaultMain) => {
                    snapshot::download_latest_lite(&registry, root, snapshot::DEFAULT_MAIN_DOMAIN)?
                }
                Some(DownloadPreset::DefaultNile) => {
                    snapshot::download_latest_lite(&registry, root, snapshot::DEFAULT_NILE_DOMAIN)?
                }
                None => {
                    let domain = args.domain.context("--domain is required")?;
                    let backup = args.backup.context("--backup is required")?;
                    let kind = args
                        .node_type
                        .context("--type is required")?
                        .parse::<NodeKind>()?;
                    // Fail on an unknown source before touching the tree.
                    registry.require(&domain)?;
                    SnapshotInstaller::new(&registry, root).install(&domain, &backup, kind)?
                }
            };
            output::field("archive", &report.archive.display().to_string());
            output::field(
                "extracted",
                &format!(
                    "{} files, {}",
                    report.stats.files,
                    output::format_size(report.stats.bytes)
                ),
            );
            Ok(())
        }
    }
}
