use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::Args;
use tracing::info;

use crate::config::{AppConfig, DatabaseConfig, DiskConfig, RetentionConfig};

#[derive(Args)]
pub struct InitArgs {
    /// Database to dump
    #[arg(long)]
    db_name: String,

    /// Database user passed to pg_dump
    #[arg(long, default_value = "postgres")]
    db_user: String,

    /// Name of the Docker container running PostgreSQL
    #[arg(long)]
    container: String,

    /// Yandex Disk OAuth token
    #[arg(long)]
    token: String,

    /// Application folder name on the disk
    #[arg(long)]
    app_name: String,

    /// Remote folder for backups, inside the application folder
    #[arg(long, default_value = "backups")]
    folder: String,

    /// Number of newest backups to keep
    #[arg(long, default_value_t = 7)]
    keep: usize,

    /// Local directory for dumps and archives
    #[arg(long, default_value = ".")]
    work_dir: PathBuf,

    /// Overwrite an existing config file
    #[arg(long)]
    force: bool,
}

pub async fn run(args: InitArgs, config_path: Option<&Path>) -> Result<()> {
    let path = config_path
        .map(Path::to_path_buf)
        .unwrap_or_else(AppConfig::config_path);
    if path.exists() && !args.force {
        anyhow::bail!(
            "config already exists at {} (use --force to overwrite)",
            path.display()
        );
    }

    let config = AppConfig {
        database: DatabaseConfig {
            name: args.db_name,
            username: args.db_user,
            container: args.container,
            docker_bin: "docker".to_string(),
            extra_args: Vec::new(),
            dump_timeout_secs: 60 * 60,
            work_dir: args.work_dir,
        },
        disk: DiskConfig {
            token: args.token,
            app_name: args.app_name,
            app_root: diskdump_disk::client::DEFAULT_APP_ROOT.to_string(),
            folder: args.folder,
            api_base: diskdump_disk::client::DEFAULT_API_BASE.to_string(),
            request_timeout_secs: 120,
            upload_timeout_secs: 60 * 60,
        },
        retention: RetentionConfig { keep: args.keep },
    };
    config.validate()?;
    config.save(&path)?;

    info!(config_path = %path.display(), "Config saved");
    println!("Config written to {}", path.display());
    println!("Run `diskdump config` to review it, `diskdump run` to take a backup.");
    Ok(())
}
