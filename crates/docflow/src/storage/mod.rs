//! On-disk locations the workflow reads from and writes to.

pub mod artifacts;
pub mod uploads;

use std::path::Path;

use crate::error::StorageError;

pub use artifacts::{ArtifactKind, ArtifactStorage};
pub use uploads::UploadStorage;

fn ensure_directory(path: &Path) -> Result<(), StorageError> {
    if !path.exists() {
        std::fs::create_dir_all(path).map_err(|e| StorageError::CreateDirectory {
            path: path.to_path_buf(),
            source: e,
        })?;
    }
    Ok(())
}
