use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use tracing::info;

use crate::error::{ExportError, Result};

/// A finished file ready to hand to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportFile {
    pub filename: String,
    pub mime: &'static str,
    pub bytes: Vec<u8>,
}

impl ExportFile {
    pub fn new(filename: impl Into<String>, mime: &'static str, bytes: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            mime,
            bytes,
        }
    }
}

/// Where exported files go: a browser download, a directory, memory.
pub trait DownloadSink: Send + Sync {
    fn deliver(&self, file: &ExportFile) -> Result<()>;
}

// ---------------------------------------------------------------------------
// DirectorySink
// ---------------------------------------------------------------------------

/// Writes each file into a fixed output directory, creating it on demand.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Full path a file with `filename` would be written to.
    pub fn path_for(&self, filename: &str) -> Result<PathBuf> {
        // Filenames come from stems the caller controls; keep them inside `dir`.
        let name = Path::new(filename);
        if name.components().count() != 1 || name.file_name().is_none() {
            return Err(ExportError::InvalidInput(format!(
                "filename must not contain path separators: {filename}"
            )));
        }
        Ok(self.dir.join(name))
    }
}

impl DownloadSink for DirectorySink {
    fn deliver(&self, file: &ExportFile) -> Result<()> {
        let path = self.path_for(&file.filename)?;
        std::fs::create_dir_all(&self.dir)?;
        std::fs::write(&path, &file.bytes)?;
        info!("Wrote {} ({} bytes)", path.display(), file.bytes.len());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// MemorySink
// ---------------------------------------------------------------------------

/// Collects delivered files in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    files: Mutex<Vec<ExportFile>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn files(&self) -> Vec<ExportFile> {
        self.files.lock().clone()
    }

    pub fn last(&self) -> Option<ExportFile> {
        self.files.lock().last().cloned()
    }

    pub fn len(&self) -> usize {
        self.files.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.lock().is_empty()
    }
}

impl DownloadSink for MemorySink {
    fn deliver(&self, file: &ExportFile) -> Result<()> {
        self.files.lock().push(file.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directory_sink_writes_file() {
        let tmp = tempfile::tempdir().unwrap();
        let sink = DirectorySink::new(tmp.path().join("out"));
        let file = ExportFile::new("report-2024-01-01.csv", "text/csv", b"A,B".to_vec());

        sink.deliver(&file).unwrap();

        let written = std::fs::read(tmp.path().join("out/report-2024-01-01.csv")).unwrap();
        assert_eq!(written, b"A,B");
    }

    #[test]
    fn test_directory_sink_rejects_path_separators() {
        let tmp = tempfile::tempdir().unwrap();
        let sink = DirectorySink::new(tmp.path());
        let file = ExportFile::new("../escape.csv", "text/csv", Vec::new());
        assert!(matches!(
            sink.deliver(&file),
            Err(ExportError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_memory_sink_collects_in_order() {
        let sink = MemorySink::new();
        assert!(sink.is_empty());
        sink.deliver(&ExportFile::new("a.csv", "text/csv", vec![1]))
            .unwrap();
        sink.deliver(&ExportFile::new("b.csv", "text/csv", vec![2]))
            .unwrap();
        assert_eq!(sink.len(), 2);
        assert_eq!(sink.files()[0].filename, "a.csv");
        assert_eq!(sink.last().unwrap().bytes, vec![2]);
    }
}
