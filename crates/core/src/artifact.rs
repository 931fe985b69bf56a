use std::path::{Path, PathBuf};

use chrono::NaiveDate;

/// Compression scheme of a backup archive. Only zip is produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ArchiveFormat {
    #[default]
    Zip,
}

impl ArchiveFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ArchiveFormat::Zip => "zip",
        }
    }
}

impl std::fmt::Display for ArchiveFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}

/// A compressed database dump sitting on the local filesystem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupArtifact {
    pub name: String,
    pub path: PathBuf,
    pub format: ArchiveFormat,
}

impl BackupArtifact {
    /// Artifact for `db_name` dumped on `date`, placed in `dir`.
    pub fn for_date(db_name: &str, date: NaiveDate, dir: &Path) -> Self {
        let format = ArchiveFormat::default();
        let name = format!("{}.{}", dump_name(db_name, date), format.extension());
        let path = dir.join(&name);
        Self { name, path, format }
    }

    /// Path of the raw (uncompressed) dump that feeds this archive.
    pub fn raw_dump_path(&self) -> PathBuf {
        self.path.with_extension("")
    }
}

/// `{db}_dump_{YYYYMMDD}`, shared by the raw dump and the archive entry.
pub fn dump_name(db_name: &str, date: NaiveDate) -> String {
    format!("{db_name}_dump_{}", date.format("%Y%m%d"))
}
