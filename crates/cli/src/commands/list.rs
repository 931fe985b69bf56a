use std::path::Path;

use anyhow::{Context, Result};
use clap::Args;

use diskdump_disk::{DiskClient, RetentionPolicy, StorageClient, retention};

use crate::config::AppConfig;
use crate::progress::with_spinner;

#[derive(Args)]
pub struct ListArgs {
    /// Retention count used for the KEEP column (default: from config)
    #[arg(long)]
    keep: Option<usize>,
}

pub async fn run(args: ListArgs, config_path: Option<&Path>) -> Result<()> {
    let config = AppConfig::load(config_path)?;
    let storage = DiskClient::new(config.disk_settings())?;
    let policy = args
        .keep
        .map(RetentionPolicy::keep)
        .unwrap_or_else(|| config.retention_policy());

    let folder = with_spinner(
        "Listing remote backups",
        |f: &diskdump_disk::Resource| format!("{} items", f.children().len()),
        storage.get_resource(&config.disk.folder),
    )
    .await
    .context("listing failed")?;

    let mut items = folder.into_children();
    if items.is_empty() {
        println!("No backups found in '{}'.", config.disk.folder);
        return Ok(());
    }
    retention::order_newest_first(&mut items);
    let (kept, _) = policy.split(&items);

    println!("{:<40} {:<26} {:<10} {:<6}", "NAME", "CREATED", "SIZE", "KEEP");
    println!("{}", "-".repeat(84));
    for (i, item) in items.iter().enumerate() {
        println!(
            "{:<40} {:<26} {:<10} {:<6}",
            item.name,
            item.created.format("%Y-%m-%d %H:%M:%S %:z"),
            item.size.map(format_bytes).unwrap_or_else(|| "-".to_string()),
            if i < kept.len() { "yes" } else { "no" },
        );
    }
    Ok(())
}

fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = 1024 * KB;
    const GB: u64 = 1024 * MB;
    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{bytes} B")
    }
}
