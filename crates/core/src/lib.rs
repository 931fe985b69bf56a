pub mod archive;
pub mod artifact;
pub mod error;
pub mod producer;

pub use artifact::BackupArtifact;
pub use error::{BackupError, Stage, StepError};
pub use producer::{BackupProducer, DockerPgDump, DumpCommand, DumpSettings};
