use std::path::Path;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Args;
use tracing::info;

use diskdump_core::{BackupProducer, DockerPgDump};
use diskdump_disk::{DiskClient, RetentionPolicy, RetentionReport, StorageClient};

use crate::config::AppConfig;
use crate::progress::with_spinner;

#[derive(Args)]
pub struct RunArgs {
    /// Number of newest backups to keep (overrides the config)
    #[arg(long)]
    keep: Option<usize>,

    /// Leave the local archive in place after a successful upload
    #[arg(long)]
    keep_local: bool,
}

/// What one run does with the remote folder and the local artifact.
pub struct Plan<'a> {
    pub folder: &'a str,
    pub policy: RetentionPolicy,
    pub remove_local: bool,
}

pub async fn run(args: RunArgs, config_path: Option<&Path>) -> Result<()> {
    let config = AppConfig::load(config_path)?;
    let storage = DiskClient::new(config.disk_settings())?;
    let producer = DockerPgDump::new(config.dump_settings());
    let plan = Plan {
        folder: &config.disk.folder,
        policy: args
            .keep
            .map(RetentionPolicy::keep)
            .unwrap_or_else(|| config.retention_policy()),
        remove_local: !args.keep_local,
    };

    let report = execute(&storage, &producer, &plan).await?;
    if !report.is_ok() {
        println!("  {} old backups could not be deleted:", report.failed.len());
        for (path, err) in &report.failed {
            println!("    {path}: {}", err.chain());
        }
    }
    println!("Backup complete.");
    Ok(())
}

/// Folder → dump → upload → retention → local cleanup. The first failing
/// phase aborts the run; the local artifact then stays on disk.
pub async fn execute(
    storage: &dyn StorageClient,
    producer: &dyn BackupProducer,
    plan: &Plan<'_>,
) -> Result<RetentionReport> {
    let start = Instant::now();

    with_spinner(
        &format!("Creating folder '{}'", plan.folder),
        |_| format!("Folder '{}' ready", plan.folder),
        storage.ensure_folder(plan.folder),
    )
    .await
    .context("folder creation failed")?;

    let artifact = with_spinner(
        "Dumping database",
        |a: &diskdump_core::BackupArtifact| format!("Backup file {} created", a.name),
        producer.produce_backup(),
    )
    .await
    .context("backup failed")?;

    let remote = format!("{}/{}", plan.folder.trim_end_matches('/'), artifact.name);
    with_spinner(
        &format!("Uploading {}", artifact.name),
        |_| format!("Backup file {} uploaded", artifact.name),
        storage.upload_file(&artifact.path, &remote),
    )
    .await
    .with_context(|| format!("upload failed, local archive kept at {}", artifact.path.display()))?;

    let report = with_spinner(
        "Cleaning up old backups",
        |r: &RetentionReport| {
            format!(
                "Old backups cleaned up ({} kept, {} deleted)",
                r.kept.len(),
                r.deleted.len()
            )
        },
        storage.enforce_retention(plan.folder, plan.policy),
    )
    .await
    .context("retention failed")?;

    if plan.remove_local {
        producer.remove_artifact(&artifact.path).await;
    }

    info!(
        artifact = %artifact.name,
        elapsed_secs = start.elapsed().as_secs_f64(),
        "Run finished"
    );
    Ok(report)
}
