use std::path::Path;

use anyhow::Result;
use clap::Args;

use crate::config::AppConfig;

#[derive(Args)]
pub struct ConfigArgs;

pub async fn run(_args: ConfigArgs, config_path: Option<&Path>) -> Result<()> {
    let config = AppConfig::load(config_path)?;
    let path = config_path
        .map(Path::to_path_buf)
        .unwrap_or_else(AppConfig::config_path);

    println!("Config: {}", path.display());
    println!("{}", "=".repeat(60));
    for (field, value) in config.describe() {
        println!("{field:<28} = {value}");
    }
    println!("{}", "=".repeat(60));
    Ok(())
}
