//! Lattice Verify - convergence checks for SearchCluster deployments

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use kube::{Client, ResourceExt};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use lattice_verify::annotate::expected_fingerprints;
use lattice_verify::crd::SearchCluster;
use lattice_verify::reader::KubeStateReader;
use lattice_verify::retry::ConvergenceConfig;
use lattice_verify::steps::StepList;

/// Lattice Verify - wait for a SearchCluster to converge to its spec
#[derive(Parser, Debug)]
#[command(name = "lattice-verify", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the standard checklist against a live cluster
    ///
    /// Steps run in order, each polled until it passes or its deadline
    /// passes. The first step that does not converge aborts the run.
    Check(CheckArgs),

    /// Stamp every pod with its node set fingerprint and wait until visible
    Annotate(RunArgs),

    /// Print the fingerprint of every node set without contacting the cluster
    Fingerprint(FileArg),
}

/// Path to the desired SearchCluster
#[derive(Args, Debug)]
struct FileArg {
    /// Path to the SearchCluster YAML manifest
    #[arg(short = 'f', long = "file")]
    file: PathBuf,
}

/// Arguments shared by every command that polls the cluster
#[derive(Args, Debug)]
struct RunArgs {
    #[command(flatten)]
    manifest: FileArg,

    /// Seconds each step may take to converge
    #[arg(long, env = "VERIFY_TIMEOUT_SECS", default_value = "300")]
    timeout_secs: u64,

    /// Seconds between two attempts of a step
    #[arg(long, env = "VERIFY_INTERVAL_SECS", default_value = "1")]
    interval_secs: u64,
}

impl RunArgs {
    fn convergence(&self) -> ConvergenceConfig {
        ConvergenceConfig::new(
            Duration::from_secs(self.timeout_secs),
            Duration::from_secs(self.interval_secs),
        )
    }
}

/// Check mode arguments
#[derive(Args, Debug)]
struct CheckArgs {
    #[command(flatten)]
    run: RunArgs,

    /// Stamp pods with their fingerprint before checking
    ///
    /// Use after a mutation so the expected-pods step detects pods that still
    /// run the previous spec.
    #[arg(long)]
    annotate: bool,

    /// Additionally wait for every pod to report this phase (e.g. Running)
    #[arg(long)]
    phase: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Check(args) => run_check(args).await,
        Commands::Annotate(args) => run_steps(&args, StepList::annotate_with_fingerprint()).await,
        Commands::Fingerprint(args) => print_fingerprints(&args.file),
    }
}

/// Load and validate the desired cluster from a YAML manifest
fn load_cluster(path: &Path) -> anyhow::Result<SearchCluster> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read manifest {:?}: {}", path, e))?;
    let cluster: SearchCluster = serde_yaml::from_str(&content)
        .map_err(|e| anyhow::anyhow!("Failed to parse SearchCluster manifest: {}", e))?;
    cluster.spec.validate()?;
    Ok(cluster)
}

async fn run_check(args: CheckArgs) -> anyhow::Result<()> {
    let mut steps = StepList::new();
    if args.annotate {
        steps.extend(StepList::annotate_with_fingerprint());
    }
    if let Some(phase) = &args.phase {
        steps.extend(StepList::pods_in_phase(phase.as_str()));
    }
    steps.extend(StepList::k8s_checks());

    run_steps(&args.run, steps).await
}

async fn run_steps(args: &RunArgs, steps: StepList) -> anyhow::Result<()> {
    let cluster = load_cluster(&args.manifest.file)?;
    let config = args.convergence();

    let client = Client::try_default()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to create Kubernetes client: {}", e))?;
    let reader = KubeStateReader::new(client);

    info!(
        cluster = %cluster.name_any(),
        steps = steps.len(),
        timeout_secs = config.timeout.as_secs(),
        interval_secs = config.interval.as_secs(),
        "verifying cluster"
    );
    steps.run(&cluster, &reader, &config).await?;
    info!(cluster = %cluster.name_any(), "cluster converged");
    Ok(())
}

fn print_fingerprints(path: &Path) -> anyhow::Result<()> {
    let cluster = load_cluster(path)?;
    for (stateful_set, fingerprint) in expected_fingerprints(&cluster)? {
        println!("{stateful_set}\t{fingerprint}");
    }
    Ok(())
}
