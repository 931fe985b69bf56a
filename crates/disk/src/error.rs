use std::error::Error as _;

use reqwest::StatusCode;
use thiserror::Error;

/// Underlying reason a remote call failed.
#[derive(Debug, Error)]
pub enum Cause {
    #[error(transparent)]
    Transport(#[from] reqwest::Error),

    #[error("HTTP {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Decode(#[from] serde_json::Error),

    #[error("{0}")]
    Protocol(String),
}

#[derive(Debug, Error)]
pub enum DiskError {
    #[error("invalid client configuration: {0}")]
    Config(String),

    #[error("failed to create folder {path}")]
    FolderCreateFailed {
        path: String,
        #[source]
        cause: Cause,
    },

    #[error("failed to fetch resource {path}")]
    ResourceFetchFailed {
        path: String,
        #[source]
        cause: Cause,
    },

    #[error("failed to decode resource {path}")]
    DecodeFailed {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to obtain upload link for {path}")]
    UploadSessionFailed {
        path: String,
        #[source]
        cause: Cause,
    },

    #[error("failed to upload to {path}")]
    UploadTransferFailed {
        path: String,
        #[source]
        cause: Cause,
    },

    #[error("failed to delete {path}")]
    DeleteFailed {
        path: String,
        #[source]
        cause: Cause,
    },
}

impl DiskError {
    /// HTTP status returned by the provider, if the failure was a status error.
    pub fn status(&self) -> Option<StatusCode> {
        match self.cause()? {
            Cause::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    fn cause(&self) -> Option<&Cause> {
        match self {
            DiskError::FolderCreateFailed { cause, .. }
            | DiskError::ResourceFetchFailed { cause, .. }
            | DiskError::UploadSessionFailed { cause, .. }
            | DiskError::UploadTransferFailed { cause, .. }
            | DiskError::DeleteFailed { cause, .. } => Some(cause),
            DiskError::Config(_) | DiskError::DecodeFailed { .. } => None,
        }
    }

    /// Message with every source appended, for log lines.
    pub fn chain(&self) -> String {
        let mut out = self.to_string();
        let mut source = self.source();
        while let Some(err) = source {
            out.push_str(": ");
            out.push_str(&err.to_string());
            source = err.source();
        }
        out
    }
}
