use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use crate::error::StorageError;

const MAX_NAME_ATTEMPTS: u32 = 1000;

/// The upload directory. Documents reference their source file by the bare
/// filename stored on the record.
#[derive(Debug, Clone)]
pub struct UploadStorage {
    upload_directory: PathBuf,
}

impl UploadStorage {
    pub fn new<P: AsRef<Path>>(upload_directory: P) -> Self {
        Self {
            upload_directory: upload_directory.as_ref().to_path_buf(),
        }
    }

    pub fn upload_directory(&self) -> &Path {
        &self.upload_directory
    }

    /// Path of a stored upload, if it is still on disk.
    pub fn resolve(&self, filename: &str) -> Option<PathBuf> {
        let name = Path::new(filename).file_name()?;
        let path = self.upload_directory.join(name);
        path.is_file().then_some(path)
    }

    /// Copies `source` into the upload directory and returns the stored path.
    ///
    /// Taken names get a numeric suffix (`report_2.pdf`, `report_3.pdf`, ...).
    /// The target is opened with `create_new`, so concurrent imports of the
    /// same name never overwrite each other.
    pub fn import(&self, source: &Path) -> Result<PathBuf, StorageError> {
        super::ensure_directory(&self.upload_directory)?;

        let filename = source
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("document");
        let (stem, ext) = match filename.rfind('.') {
            Some(dot) if dot > 0 => (&filename[..dot], Some(&filename[dot..])),
            _ => (filename, None),
        };

        let mut reader = std::fs::File::open(source).map_err(|e| StorageError::CopyFile {
            from: source.to_path_buf(),
            to: self.upload_directory.clone(),
            source: e,
        })?;

        for counter in 1..=MAX_NAME_ATTEMPTS {
            let candidate = match (counter, ext) {
                (1, _) => filename.to_string(),
                (n, Some(ext)) => format!("{}_{}{}", stem, n, ext),
                (n, None) => format!("{}_{}", stem, n),
            };
            let target = self.upload_directory.join(&candidate);

            match OpenOptions::new().write(true).create_new(true).open(&target) {
                Ok(mut file) => {
                    std::io::copy(&mut reader, &mut file).map_err(|e| StorageError::CopyFile {
                        from: source.to_path_buf(),
                        to: target.clone(),
                        source: e,
                    })?;
                    return Ok(target);
                }
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => continue,
                Err(e) => {
                    return Err(StorageError::WriteFile {
                        path: target,
                        source: e,
                    })
                }
            }
        }

        Err(StorageError::FileExists(self.upload_directory.join(filename)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn source_file(dir: &TempDir, name: &str, content: &[u8]) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_import_copies_file() {
        let src_dir = TempDir::new().unwrap();
        let up_dir = TempDir::new().unwrap();
        let storage = UploadStorage::new(up_dir.path().join("uploads"));

        let src = source_file(&src_dir, "report.pdf", b"%PDF-1.5");
        let stored = storage.import(&src).unwrap();

        assert!(stored.ends_with("uploads/report.pdf"));
        assert_eq!(std::fs::read(&stored).unwrap(), b"%PDF-1.5");
        assert!(src.exists());
    }

    #[test]
    fn test_import_picks_unique_names() {
        let src_dir = TempDir::new().unwrap();
        let up_dir = TempDir::new().unwrap();
        let storage = UploadStorage::new(up_dir.path());
        let src = source_file(&src_dir, "report.pdf", b"one");

        let first = storage.import(&src).unwrap();
        let second = storage.import(&src).unwrap();
        let third = storage.import(&src).unwrap();

        assert_eq!(first.file_name().unwrap(), "report.pdf");
        assert_eq!(second.file_name().unwrap(), "report_2.pdf");
        assert_eq!(third.file_name().unwrap(), "report_3.pdf");
    }

    #[test]
    fn test_import_without_extension() {
        let src_dir = TempDir::new().unwrap();
        let up_dir = TempDir::new().unwrap();
        let storage = UploadStorage::new(up_dir.path());
        let src = source_file(&src_dir, "README", b"x");

        storage.import(&src).unwrap();
        let again = storage.import(&src).unwrap();
        assert_eq!(again.file_name().unwrap(), "README_2");
    }

    #[test]
    fn test_import_missing_source() {
        let up_dir = TempDir::new().unwrap();
        let storage = UploadStorage::new(up_dir.path());
        let result = storage.import(Path::new("/nonexistent/file.pdf"));
        assert!(matches!(result, Err(StorageError::CopyFile { .. })));
    }

    #[test]
    fn test_resolve() {
        let up_dir = TempDir::new().unwrap();
        let storage = UploadStorage::new(up_dir.path());
        std::fs::write(up_dir.path().join("a.txt"), b"a").unwrap();

        assert_eq!(storage.resolve("a.txt"), Some(up_dir.path().join("a.txt")));
        assert_eq!(storage.resolve("missing.txt"), None);
        // Only the bare name is honoured.
        assert_eq!(
            storage.resolve("../../etc/a.txt"),
            Some(up_dir.path().join("a.txt"))
        );
        assert_eq!(storage.resolve(""), None);
    }
}
