use std::io::Write;
use std::path::{Path, PathBuf};

use crate::document::DocumentId;
use crate::error::StorageError;

/// Generated binaries and where they live below the output directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    Audio,
    Image,
}

impl ArtifactKind {
    fn directory(&self) -> &'static str {
        match self {
            ArtifactKind::Audio => "audio",
            ArtifactKind::Image => "images",
        }
    }

    fn extension(&self) -> &'static str {
        match self {
            ArtifactKind::Audio => "mp3",
            ArtifactKind::Image => "png",
        }
    }
}

/// Writes speech and image artifacts at `audio/doc_{id}.mp3` and
/// `images/doc_{id}.png`.
///
/// Paths are deterministic per document, so a retried step replaces its own
/// earlier output instead of accumulating copies. Content is written to a
/// sibling temp file and renamed into place, so a reader never observes a
/// half-written artifact.
#[derive(Debug, Clone)]
pub struct ArtifactStorage {
    output_directory: PathBuf,
}

impl ArtifactStorage {
    pub fn new<P: AsRef<Path>>(output_directory: P) -> Self {
        Self {
            output_directory: output_directory.as_ref().to_path_buf(),
        }
    }

    pub fn output_directory(&self) -> &Path {
        &self.output_directory
    }

    pub fn path_for(&self, kind: ArtifactKind, id: DocumentId) -> PathBuf {
        self.output_directory
            .join(kind.directory())
            .join(format!("doc_{}.{}", id, kind.extension()))
    }

    pub fn store(
        &self,
        kind: ArtifactKind,
        id: DocumentId,
        content: &[u8],
    ) -> Result<PathBuf, StorageError> {
        let path = self.path_for(kind, id);
        let dir = self.output_directory.join(kind.directory());
        super::ensure_directory(&dir)?;

        let tmp = dir.join(format!(".doc_{}.{}.tmp", id, kind.extension()));
        let write = |target: &Path| -> std::io::Result<()> {
            let mut file = std::fs::File::create(target)?;
            file.write_all(content)?;
            file.sync_all()
        };
        write(&tmp).map_err(|e| StorageError::WriteFile {
            path: tmp.clone(),
            source: e,
        })?;

        std::fs::rename(&tmp, &path).map_err(|e| {
            let _ = std::fs::remove_file(&tmp);
            StorageError::WriteFile {
                path: path.clone(),
                source: e,
            }
        })?;

        tracing::debug!(?kind, id, bytes = content.len(), "Artifact stored");
        Ok(path)
    }
}
