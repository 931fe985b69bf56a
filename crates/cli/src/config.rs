use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use diskdump_core::DumpSettings;
use diskdump_disk::client::{DEFAULT_API_BASE, DEFAULT_APP_ROOT};
use diskdump_disk::{DiskSettings, OAuthToken, RetentionPolicy};

const CONFIG_FILE: &str = "diskdump.toml";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub disk: DiskConfig,
    #[serde(default)]
    pub retention: RetentionConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub name: String,
    pub username: String,
    pub container: String,
    #[serde(default = "default_docker_bin")]
    pub docker_bin: String,
    #[serde(default)]
    pub extra_args: Vec<String>,
    #[serde(default = "default_dump_timeout")]
    pub dump_timeout_secs: u64,
    #[serde(default = "default_work_dir")]
    pub work_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiskConfig {
    pub token: String,
    pub app_name: String,
    #[serde(default = "default_app_root")]
    pub app_root: String,
    #[serde(default = "default_folder")]
    pub folder: String,
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_upload_timeout")]
    pub upload_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetentionConfig {
    pub keep: usize,
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self { keep: 7 }
    }
}

fn default_docker_bin() -> String {
    "docker".to_string()
}

fn default_dump_timeout() -> u64 {
    60 * 60
}

fn default_work_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_app_root() -> String {
    DEFAULT_APP_ROOT.to_string()
}

fn default_folder() -> String {
    "backups".to_string()
}

fn default_api_base() -> String {
    DEFAULT_API_BASE.to_string()
}

fn default_request_timeout() -> u64 {
    120
}

fn default_upload_timeout() -> u64 {
    60 * 60
}

impl AppConfig {
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("diskdump")
            .join(CONFIG_FILE)
    }

    /// Read the file, apply environment overrides, validate.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = path.map(Path::to_path_buf).unwrap_or_else(Self::config_path);
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("config not found at {}", path.display()))?;
        let mut config: AppConfig = toml::from_str(&content)
            .with_context(|| format!("failed to parse config {}", path.display()))?;
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)
            .with_context(|| format!("failed to write config to {}", path.display()))?;
        Ok(())
    }

    /// Environment variables take precedence over the file.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(v) = lookup("DB_NAME") {
            self.database.name = v;
        }
        if let Some(v) = lookup("DB_USERNAME") {
            self.database.username = v;
        }
        if let Some(v) = lookup("DB_DOCKERNAME") {
            self.database.container = v;
        }
        if let Some(v) = lookup("AUTH_TOKEN") {
            self.disk.token = v;
        }
        if let Some(v) = lookup("YA_APP_NAME") {
            self.disk.app_name = v;
        }
        if let Some(v) = lookup("BACKUPS_NUM") {
            self.retention.keep = v
                .trim()
                .parse()
                .with_context(|| format!("BACKUPS_NUM must be a non-negative integer, got {v:?}"))?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        let required = [
            ("database.name", &self.database.name),
            ("database.username", &self.database.username),
            ("database.container", &self.database.container),
            ("disk.token", &self.disk.token),
            ("disk.app_name", &self.disk.app_name),
            ("disk.folder", &self.disk.folder),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                anyhow::bail!("config field {field} must not be empty");
            }
        }
        Ok(())
    }

    /// Every effective setting as (field, value), token masked.
    pub fn describe(&self) -> Vec<(&'static str, String)> {
        vec![
            ("database.name", self.database.name.clone()),
            ("database.username", self.database.username.clone()),
            ("database.container", self.database.container.clone()),
            ("database.docker_bin", self.database.docker_bin.clone()),
            ("database.extra_args", self.database.extra_args.join(" ")),
            (
                "database.dump_timeout_secs",
                self.database.dump_timeout_secs.to_string(),
            ),
            (
                "database.work_dir",
                self.database.work_dir.display().to_string(),
            ),
            ("disk.token", OAuthToken::new(&self.disk.token).masked()),
            ("disk.app_name", self.disk.app_name.clone()),
            ("disk.app_root", self.disk.app_root.clone()),
            ("disk.folder", self.disk.folder.clone()),
            ("disk.api_base", self.disk.api_base.clone()),
            (
                "disk.request_timeout_secs",
                self.disk.request_timeout_secs.to_string(),
            ),
            (
                "disk.upload_timeout_secs",
                self.disk.upload_timeout_secs.to_string(),
            ),
            ("retention.keep", self.retention.keep.to_string()),
        ]
    }

    pub fn dump_settings(&self) -> DumpSettings {
        let db = &self.database;
        let mut settings = DumpSettings::new(&db.name, &db.username, &db.container);
        settings.docker_bin = db.docker_bin.clone();
        settings.extra_args = db.extra_args.clone();
        settings.work_dir = db.work_dir.clone();
        settings.timeout = Duration::from_secs(db.dump_timeout_secs);
        settings
    }

    pub fn disk_settings(&self) -> DiskSettings {
        let disk = &self.disk;
        let mut settings = DiskSettings::new(OAuthToken::new(&disk.token), &disk.app_name);
        settings.app_root = disk.app_root.clone();
        settings.api_base = disk.api_base.clone();
        settings.request_timeout = Duration::from_secs(disk.request_timeout_secs);
        settings.upload_timeout = Duration::from_secs(disk.upload_timeout_secs);
        settings
    }

    pub fn retention_policy(&self) -> RetentionPolicy {
        RetentionPolicy::keep(self.retention.keep)
    }
}
