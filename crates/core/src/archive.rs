use std::fs::File;
use std::path::Path;

use tracing::debug;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::StepError;

/// Packs a single raw dump file into an archive.
pub trait Archiver: Send + Sync {
    fn archive(&self, source: &Path, dest: &Path) -> Result<(), StepError>;
}

/// Deflate-compressed zip with one entry named after the source file.
#[derive(Debug, Clone, Copy, Default)]
pub struct ZipArchiver;

impl Archiver for ZipArchiver {
    fn archive(&self, source: &Path, dest: &Path) -> Result<(), StepError> {
        let mut input = File::open(source)?;
        let output = File::create(dest)?;

        let entry = source
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("dump.sql");
        let options = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .large_file(true);

        let mut writer = ZipWriter::new(output);
        writer.start_file(entry, options)?;
        let bytes = std::io::copy(&mut input, &mut writer)?;
        writer.finish()?;

        debug!(source = %source.display(), dest = %dest.display(), bytes, "archive written");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Read;

    use super::*;

    #[test]
    fn zip_contains_single_named_entry() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("sales_dump_20240301");
        std::fs::write(&source, b"CREATE TABLE t (id int);\n").unwrap();
        let dest = dir.path().join("sales_dump_20240301.zip");

        ZipArchiver.archive(&source, &dest).unwrap();

        let mut zip = zip::ZipArchive::new(File::open(&dest).unwrap()).unwrap();
        assert_eq!(zip.len(), 1);
        let mut entry = zip.by_index(0).unwrap();
        assert_eq!(entry.name(), "sales_dump_20240301");
        let mut content = String::new();
        entry.read_to_string(&mut content).unwrap();
        assert_eq!(content, "CREATE TABLE t (id int);\n");
    }

    #[test]
    fn missing_source_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = ZipArchiver
            .archive(&dir.path().join("absent"), &dir.path().join("absent.zip"))
            .unwrap_err();
        assert!(matches!(err, StepError::Io(_)));
        assert!(!dir.path().join("absent.zip").exists());
    }
}
