//! Input resolution: validate the archive path and identify its container.
//!
//! Checking the file up front turns "No such file" and "unknown format" into
//! precise errors before a scratch directory is even created.

use crate::error::Comic2PdfError;
use comic_archive::{ArchiveError, ArchiveFormat};
use std::path::{Path, PathBuf};
use tracing::debug;

/// A validated input archive.
#[derive(Debug, Clone)]
pub struct ResolvedInput {
    pub path: PathBuf,
    pub format: ArchiveFormat,
    /// Archive size on disk.
    pub len: u64,
}

/// Validate that `path` is a readable archive of a supported format.
pub fn resolve_input(path: &Path) -> Result<ResolvedInput, Comic2PdfError> {
    let metadata = match std::fs::metadata(path) {
        Ok(m) => m,
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(Comic2PdfError::PermissionDenied {
                path: path.to_path_buf(),
            });
        }
        Err(_) => {
            return Err(Comic2PdfError::InputNotFound {
                path: path.to_path_buf(),
            });
        }
    };

    if metadata.is_dir() {
        return Err(Comic2PdfError::UnsupportedArchive {
            path: path.to_path_buf(),
            detail: "path is a directory".into(),
        });
    }

    let format = comic_archive::detect_format(path).map_err(|e| match e {
        ArchiveError::Io { source, .. }
            if source.kind() == std::io::ErrorKind::PermissionDenied =>
        {
            Comic2PdfError::PermissionDenied {
                path: path.to_path_buf(),
            }
        }
        ArchiveError::UnknownFormat { .. } => Comic2PdfError::UnsupportedArchive {
            path: path.to_path_buf(),
            detail: e.to_string(),
        },
        other => Comic2PdfError::Extraction {
            path: path.to_path_buf(),
            source: other,
        },
    })?;

    debug!(path = %path.display(), format = %format, "Resolved input archive");
    Ok(ResolvedInput {
        path: path.to_path_buf(),
        format,
        len: metadata.len(),
    })
}
