use std::path::Path;

use anyhow::{Context, Result};
use clap::Args;

use diskdump_disk::{DiskClient, RetentionPolicy, RetentionReport, StorageClient};

use crate::config::AppConfig;
use crate::progress::with_spinner;

#[derive(Args)]
pub struct PruneArgs {
    /// Number of newest backups to keep (overrides the config)
    #[arg(long)]
    keep: Option<usize>,
}

pub async fn run(args: PruneArgs, config_path: Option<&Path>) -> Result<()> {
    let config = AppConfig::load(config_path)?;
    let storage = DiskClient::new(config.disk_settings())?;
    let policy = args
        .keep
        .map(RetentionPolicy::keep)
        .unwrap_or_else(|| config.retention_policy());

    let report = with_spinner(
        &format!("Pruning '{}' to {} backups", config.disk.folder, policy.keep),
        |r: &RetentionReport| format!("{} kept, {} deleted", r.kept.len(), r.deleted.len()),
        storage.enforce_retention(&config.disk.folder, policy),
    )
    .await
    .context("retention failed")?;

    for path in &report.deleted {
        println!("  deleted {path}");
    }
    if !report.is_ok() {
        for (path, err) in &report.failed {
            println!("  failed  {path}: {}", err.chain());
        }
        anyhow::bail!("{} old backups could not be deleted", report.failed.len());
    }
    Ok(())
}
