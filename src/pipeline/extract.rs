//! Extraction: unpack the archive into the scratch directory and list pages.
//!
//! ## Page order
//!
//! Page order is *only* the byte-wise order of the archive-relative paths.
//! `page10.jpg` sorts before `page2.jpg`; scanners almost always zero-pad,
//! and guessing at "natural" order breaks the archives that rely on plain
//! sorting (`001a.jpg`, `001b.jpg`, …).
//!
//! ## Nested directories
//!
//! The unpacked tree is walked recursively and pages are keyed by their full
//! relative path (`chapter1/01.jpg`), so two `01.jpg` in different folders
//! stay distinct and each chapter's pages stay together.

use crate::error::Comic2PdfError;
use comic_archive::ArchiveFormat;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Extensions treated as page images (compared case-insensitively).
pub const SUPPORTED_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

/// Unpacks an archive into a directory and returns its page images in order.
///
/// The orchestrator only talks to this trait, so the pipeline can be driven
/// by a fake extractor in tests.
pub trait PageExtractor {
    /// Unpack `archive` into the existing, empty, writable `dir` and return
    /// the sorted paths of all supported page images under it.
    fn extract(&self, archive: &Path, dir: &Path) -> Result<Vec<PathBuf>, Comic2PdfError>;
}

/// [`PageExtractor`] backed by the `comic-archive` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct ArchiveExtractor {
    format: Option<ArchiveFormat>,
}

impl ArchiveExtractor {
    /// Extractor for an archive whose format has already been detected.
    pub fn with_format(format: ArchiveFormat) -> Self {
        Self {
            format: Some(format),
        }
    }
}

impl PageExtractor for ArchiveExtractor {
    fn extract(&self, archive: &Path, dir: &Path) -> Result<Vec<PathBuf>, Comic2PdfError> {
        let extraction_err = |source| Comic2PdfError::Extraction {
            path: archive.to_path_buf(),
            source,
        };

        let format = match self.format {
            Some(f) => f,
            None => comic_archive::detect_format(archive).map_err(extraction_err)?,
        };

        comic_archive::unpack(archive, format, dir).map_err(extraction_err)?;

        let images = list_page_images(dir).map_err(|e| Comic2PdfError::Extraction {
            path: archive.to_path_buf(),
            source: comic_archive::ArchiveError::Io {
                path: dir.to_path_buf(),
                source: e,
            },
        })?;

        info!(
            "Extracted {} page images from {} ({})",
            images.len(),
            archive.display(),
            format
        );
        Ok(images)
    }
}

/// Recursively list supported page images under `root`, sorted by their
/// `/`-separated path relative to `root`.
///
/// Symlinks, dot-files and `__MACOSX` resource-fork folders are skipped.
pub fn list_page_images(root: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut found: Vec<(String, PathBuf)> = Vec::new();
    let mut pending = vec![root.to_path_buf()];

    while let Some(dir) = pending.pop() {
        for entry in std::fs::read_dir(&dir)? {
            let entry = entry?;
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if is_junk(&name) {
                debug!("Skipping {}", entry.path().display());
                continue;
            }

            let file_type = entry.file_type()?;
            let path = entry.path();
            if file_type.is_dir() {
                pending.push(path);
            } else if file_type.is_file() && has_supported_extension(&path) {
                found.push((relative_name(root, &path), path));
            }
        }
    }

    found.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(found.into_iter().map(|(_, p)| p).collect())
}

/// `true` when the file extension is one of [`SUPPORTED_EXTENSIONS`].
pub fn has_supported_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| {
            SUPPORTED_EXTENSIONS
                .iter()
                .any(|s| e.eq_ignore_ascii_case(s))
        })
        .unwrap_or(false)
}

/// Path of `path` relative to `root`, joined with `/` on every platform.
pub fn relative_name(root: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

fn is_junk(name: &str) -> bool {
    name.starts_with('.') || name == "__MACOSX"
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn touch(root: &Path, rel: &str) {
        let p = root.join(rel);
        fs::create_dir_all(p.parent().unwrap()).unwrap();
        fs::write(p, b"x").unwrap();
    }

    fn names(root: &Path, paths: &[PathBuf]) -> Vec<String> {
        paths.iter().map(|p| relative_name(root, p)).collect()
    }

    #[test]
    fn filters_extensions_case_insensitively() {
        let dir = tempfile::tempdir().unwrap();
        for f in ["b.PNG", "a.jpg", "c.JpEg", "notes.txt", "thumbs.db", "d.gif", "noext"] {
            touch(dir.path(), f);
        }

        let pages = list_page_images(dir.path()).unwrap();
        assert_eq!(names(dir.path(), &pages), vec!["a.jpg", "b.PNG", "c.JpEg"]);
    }

    #[test]
    fn sort_is_lexicographic_not_natural() {
        let dir = tempfile::tempdir().unwrap();
        for f in ["page2.jpg", "page10.jpg", "page1.jpg"] {
            touch(dir.path(), f);
        }

        let pages = list_page_images(dir.path()).unwrap();
        assert_eq!(
            names(dir.path(), &pages),
            vec!["page1.jpg", "page10.jpg", "page2.jpg"]
        );
    }

    #[test]
    fn nested_folders_keep_full_relative_paths() {
        let dir = tempfile::tempdir().unwrap();
        for f in ["ch2/01.jpg", "ch1/02.jpg", "ch1/01.jpg", "cover.jpg"] {
            touch(dir.path(), f);
        }

        let pages = list_page_images(dir.path()).unwrap();
        assert_eq!(
            names(dir.path(), &pages),
            vec!["ch1/01.jpg", "ch1/02.jpg", "ch2/01.jpg", "cover.jpg"]
        );
    }

    #[test]
    fn skips_macos_resource_forks_and_dotfiles() {
        let dir = tempfile::tempdir().unwrap();
        for f in ["__MACOSX/._01.jpg", "._01.jpg", ".hidden/02.jpg", "01.jpg"] {
            touch(dir.path(), f);
        }

        let pages = list_page_images(dir.path()).unwrap();
        assert_eq!(names(dir.path(), &pages), vec!["01.jpg"]);
    }

    #[test]
    fn corrupt_archive_maps_to_extraction_error() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("broken.cbz");
        fs::write(&archive, b"PK\x03\x04 not really a zip").unwrap();
        let scratch = tempfile::tempdir().unwrap();

        let err = ArchiveExtractor::default()
            .extract(&archive, scratch.path())
            .unwrap_err();
        assert!(matches!(err, Comic2PdfError::Extraction { .. }), "got {err:?}");
    }
}
