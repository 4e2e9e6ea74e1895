// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use std::io;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use pgprovision::artifact::ArtifactWriter;
use pgprovision::config::Config;
use pgprovision::kubernetes::{create_client, KubeControlPlane, RetryPolicy};
use pgprovision::plan::{run_plan, Profile, ProvisionPlan};
use pgprovision::prompt::TerminalPrompter;
use pgprovision::reconcilers::{ConflictPolicy, Reconciler};

/// Provision the PostgreSQL namespace, secrets and connection settings
#[derive(Parser, Debug)]
#[command(name = "pgprovision", version, about)]
struct Args {
    /// Built-in plan to run
    #[arg(value_enum, default_value = "postgres")]
    profile: Profile,

    /// YAML plan file, replaces the profile
    #[arg(long)]
    plan: Option<PathBuf>,

    /// What to do with resources that already exist
    #[arg(long, value_enum, default_value = "prompt")]
    on_conflict: ConflictPolicy,

    /// Kubeconfig file, otherwise the environment is inferred
    #[arg(long)]
    kubeconfig: Option<PathBuf>,

    /// Directory for the submitted documents, overrides PGPROVISION_ARTIFACT_DIR
    #[arg(long)]
    artifact_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let mut config = Config::from_env()?;
    if let Some(dir) = args.artifact_dir {
        config.artifact_dir = dir;
    }

    let plan = match &args.plan {
        Some(path) => ProvisionPlan::from_file(path)
            .with_context(|| format!("Invalid plan {}", path.display()))?,
        None => ProvisionPlan::for_profile(args.profile),
    };
    info!(
        "Provisioning {} resources in namespace {}",
        plan.resources.len(),
        plan.namespace
    );

    let client = create_client(args.kubeconfig.as_deref()).await?;
    let control_plane = KubeControlPlane::new(client, config.call_timeout);

    let mut reconciler = Reconciler::new(control_plane, TerminalPrompter::stdio())
        .with_artifacts(ArtifactWriter::new(&config.artifact_dir))
        .with_retry(RetryPolicy::new(config.max_retries));

    let report = run_plan(&mut reconciler, &plan, args.on_conflict).await?;

    for (identity, outcome) in &report.entries {
        println!("{}: {}", identity, outcome);
    }

    if let Some((identity, cause)) = report.failure() {
        bail!("Provisioning stopped at {}: {}", identity, cause);
    }
    Ok(())
}
