use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{Local, NaiveDate};
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::archive::{Archiver, ZipArchiver};
use crate::artifact::BackupArtifact;
use crate::error::{BackupError, Result, Stage, StepError};

const DEFAULT_DUMP_TIMEOUT: Duration = Duration::from_secs(60 * 60);

#[async_trait]
pub trait BackupProducer: Send + Sync {
    /// Dump, archive and verify. The returned artifact exists on disk.
    async fn produce_backup(&self) -> Result<BackupArtifact>;

    /// Best-effort removal of a local artifact. Failures are only logged.
    async fn remove_artifact(&self, path: &Path);
}

/// Where and how to dump the database.
#[derive(Debug, Clone)]
pub struct DumpSettings {
    pub db_name: String,
    pub username: String,
    pub container: String,
    pub docker_bin: String,
    pub extra_args: Vec<String>,
    pub work_dir: PathBuf,
    pub timeout: Duration,
}

impl DumpSettings {
    pub fn new(db_name: &str, username: &str, container: &str) -> Self {
        Self {
            db_name: db_name.to_string(),
            username: username.to_string(),
            container: container.to_string(),
            docker_bin: "docker".to_string(),
            extra_args: Vec::new(),
            work_dir: PathBuf::from("."),
            timeout: DEFAULT_DUMP_TIMEOUT,
        }
    }
}

/// External program whose stdout is the raw dump.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DumpCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl DumpCommand {
    /// `docker exec <container> pg_dump -U <user> [extra] <db>`
    pub fn docker_pg_dump(settings: &DumpSettings) -> Self {
        let mut args = vec![
            "exec".to_string(),
            settings.container.clone(),
            "pg_dump".to_string(),
            "-U".to_string(),
            settings.username.clone(),
        ];
        args.extend(settings.extra_args.iter().cloned());
        args.push(settings.db_name.clone());
        Self {
            program: settings.docker_bin.clone(),
            args,
        }
    }
}

impl std::fmt::Display for DumpCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// PostgreSQL running in a Docker container, dumped with `pg_dump`.
pub struct DockerPgDump {
    settings: DumpSettings,
    command: DumpCommand,
    archiver: Arc<dyn Archiver>,
}

impl DockerPgDump {
    pub fn new(settings: DumpSettings) -> Self {
        let command = DumpCommand::docker_pg_dump(&settings);
        Self {
            settings,
            command,
            archiver: Arc::new(ZipArchiver),
        }
    }

    pub fn with_command(mut self, command: DumpCommand) -> Self {
        self.command = command;
        self
    }

    pub fn with_archiver(mut self, archiver: impl Archiver + 'static) -> Self {
        self.archiver = Arc::new(archiver);
        self
    }

    pub fn settings(&self) -> &DumpSettings {
        &self.settings
    }

    /// Run the pipeline naming the artifact after `date`.
    pub async fn produce_backup_on(&self, date: NaiveDate) -> Result<BackupArtifact> {
        let artifact =
            BackupArtifact::for_date(&self.settings.db_name, date, &self.settings.work_dir);
        let raw = artifact.raw_dump_path();

        info!(
            db = %self.settings.db_name,
            container = %self.settings.container,
            dump = %raw.display(),
            "Dumping database"
        );
        self.dump_to(&raw).await.map_err(BackupError::at(Stage::Dump))?;

        // Compression of a multi-gigabyte dump must not stall the runtime.
        let archiver = Arc::clone(&self.archiver);
        let (source, dest) = (raw.clone(), artifact.path.clone());
        tokio::task::spawn_blocking(move || archiver.archive(&source, &dest))
            .await
            .map_err(|e| StepError::Io(e.into()))
            .and_then(std::convert::identity)
            .map_err(BackupError::at(Stage::Archive))?;

        tokio::fs::remove_file(&raw)
            .await
            .map_err(|e| BackupError::at(Stage::Cleanup)(e.into()))?;

        if !tokio::fs::try_exists(&artifact.path).await.unwrap_or(false) {
            return Err(BackupError::ArtifactNotCreated {
                path: artifact.path,
            });
        }

        info!(artifact = %artifact.path.display(), "Backup archive created");
        Ok(artifact)
    }

    async fn dump_to(&self, out: &Path) -> std::result::Result<(), StepError> {
        if let Some(parent) = out.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let file = tokio::fs::File::create(out).await?.into_std().await;

        debug!(command = %self.command, "spawning dump tool");
        let child = Command::new(&self.command.program)
            .args(&self.command.args)
            .stdin(Stdio::null())
            .stdout(Stdio::from(file))
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let output = tokio::time::timeout(self.settings.timeout, child.wait_with_output())
            .await
            .map_err(|_| StepError::Timeout(self.settings.timeout))??;

        if !output.status.success() {
            return Err(StepError::Exit {
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl BackupProducer for DockerPgDump {
    async fn produce_backup(&self) -> Result<BackupArtifact> {
        self.produce_backup_on(Local::now().date_naive()).await
    }

    async fn remove_artifact(&self, path: &Path) {
        match tokio::fs::remove_file(path).await {
            Ok(()) => info!(path = %path.display(), "Local backup file removed"),
            Err(e) => warn!(path = %path.display(), error = %e, "Backup file remove failed"),
        }
    }
}
