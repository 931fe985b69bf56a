use std::path::PathBuf;
use std::process::ExitStatus;
use std::time::Duration;

use thiserror::Error;

/// Step of the backup pipeline that produced an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Dump,
    Archive,
    Cleanup,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stage::Dump => write!(f, "dump"),
            Stage::Archive => write!(f, "archive"),
            Stage::Cleanup => write!(f, "cleanup"),
        }
    }
}

#[derive(Debug, Error)]
pub enum StepError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("process exited with {status}: {stderr}")]
    Exit { status: ExitStatus, stderr: String },

    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error(transparent)]
    Zip(#[from] zip::result::ZipError),
}

#[derive(Debug, Error)]
pub enum BackupError {
    #[error("backup {stage} step failed")]
    DumpFailed {
        stage: Stage,
        #[source]
        source: StepError,
    },

    #[error("backup archive {} was not created", path.display())]
    ArtifactNotCreated { path: PathBuf },
}

impl BackupError {
    pub(crate) fn at(stage: Stage) -> impl FnOnce(StepError) -> Self {
        move |source| BackupError::DumpFailed { stage, source }
    }
}

pub type Result<T> = std::result::Result<T, BackupError>;
