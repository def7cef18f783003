//! Error types for the comic2pdf library.
//!
//! Every failure is terminal for the run: nothing is retried and no page is
//! skipped. The pipeline stops at the first error, removes its scratch
//! directory, and hands the error back to the caller.
//!
//! Each variant knows which [`Stage`] produced it so the CLI can tell the user
//! *where* the conversion broke as well as *why*.

use comic_archive::ArchiveError;
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the comic2pdf library.
#[derive(Debug, Error)]
pub enum Comic2PdfError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input archive was not found at the given path.
    #[error("Archive not found: '{path}'\nCheck the path exists and is readable.")]
    InputNotFound { path: PathBuf },

    /// Process does not have read permission on the archive.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    // ── Extraction errors ─────────────────────────────────────────────────
    /// The file is not a container format we recognise or can unpack.
    #[error("Unsupported archive '{path}': {detail}\nSupported: .cbz/.zip, .cbr/.rar, .cb7/.7z, .cbt/.tar, .tar.gz")]
    UnsupportedArchive { path: PathBuf, detail: String },

    /// The archive decoder failed (corrupt data, unsupported compression,
    /// password-protected entry, I/O failure while unpacking).
    #[error("Extraction failed for '{path}': {source}")]
    Extraction {
        path: PathBuf,
        #[source]
        source: ArchiveError,
    },

    /// The archive unpacked fine but held no `.jpg`, `.jpeg` or `.png` files.
    #[error("No images found to create PDF ('{path}')\nOnly .jpg, .jpeg and .png pages are converted.")]
    EmptyInput { path: PathBuf },

    // ── Transform errors ──────────────────────────────────────────────────
    /// A page image could not be opened or decoded.
    #[error("Cannot decode page image '{path}': {detail}")]
    ImageDecode { path: PathBuf, detail: String },

    /// The recompressed JPEG could not be written.
    #[error("Cannot write compressed page '{path}': {detail}")]
    ImageEncode { path: PathBuf, detail: String },

    // ── Output errors ─────────────────────────────────────────────────────
    /// The PDF could not be serialised or persisted to the output path.
    #[error("Failed to write PDF '{path}': {detail}")]
    DocumentWrite { path: PathBuf, detail: String },

    // ── Scratch directory ─────────────────────────────────────────────────
    /// The temporary working directory could not be created.
    #[error("Cannot create scratch directory: {0}")]
    ScratchDir(#[source] std::io::Error),

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Pipeline stage that produced an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Config,
    Input,
    Scratch,
    Extract,
    Transform,
    Assemble,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::Config => "config",
            Stage::Input => "input",
            Stage::Scratch => "scratch",
            Stage::Extract => "extract",
            Stage::Transform => "transform",
            Stage::Assemble => "assemble",
        })
    }
}

impl Comic2PdfError {
    /// The pipeline stage this error belongs to.
    pub fn stage(&self) -> Stage {
        match self {
            Self::InvalidConfig(_) => Stage::Config,
            Self::InputNotFound { .. } | Self::PermissionDenied { .. } => Stage::Input,
            Self::ScratchDir(_) => Stage::Scratch,
            Self::UnsupportedArchive { .. } | Self::Extraction { .. } => Stage::Extract,
            Self::ImageDecode { .. } | Self::ImageEncode { .. } => Stage::Transform,
            Self::EmptyInput { .. } | Self::DocumentWrite { .. } => Stage::Assemble,
        }
    }

    /// Serialisable form of this error, as printed by `comic2pdf --json`.
    pub fn report(&self) -> ErrorReport {
        ErrorReport {
            stage: self.stage(),
            message: self.to_string(),
        }
    }
}

/// Machine-readable error summary: the failing stage and the full message.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorReport {
    pub stage: Stage,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_display() {
        let e = Comic2PdfError::EmptyInput {
            path: "book.cbz".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("No images found"), "got: {msg}");
        assert!(msg.contains("book.cbz"), "got: {msg}");
    }

    #[test]
    fn extraction_wraps_archive_error() {
        let e = Comic2PdfError::Extraction {
            path: "broken.cbz".into(),
            source: ArchiveError::Unpack {
                format: comic_archive::ArchiveFormat::Zip,
                detail: "invalid Zip archive".into(),
            },
        };
        assert!(e.to_string().contains("broken.cbz"));
        assert!(e.to_string().contains("invalid Zip archive"));
        assert!(std::error::Error::source(&e).is_some());
    }

    #[test]
    fn stages_follow_the_pipeline() {
        let decode = Comic2PdfError::ImageDecode {
            path: "01.jpg".into(),
            detail: "bad header".into(),
        };
        assert_eq!(decode.stage(), Stage::Transform);

        let write = Comic2PdfError::DocumentWrite {
            path: "out.pdf".into(),
            detail: "disk full".into(),
        };
        assert_eq!(write.stage(), Stage::Assemble);
        assert_eq!(write.stage().to_string(), "assemble");

        assert_eq!(
            Comic2PdfError::InvalidConfig("quality".into()).stage(),
            Stage::Config
        );
    }

    #[test]
    fn report_serialises_stage_and_message() {
        let e = Comic2PdfError::EmptyInput {
            path: "book.cbz".into(),
        };
        let json = serde_json::to_value(e.report()).unwrap();
        assert_eq!(json["stage"], "assemble");
        assert!(json["message"].as_str().unwrap().contains("book.cbz"));

        let e = Comic2PdfError::UnsupportedArchive {
            path: "notes.txt".into(),
            detail: "unknown container".into(),
        };
        assert_eq!(serde_json::to_value(e.report()).unwrap()["stage"], "extract");
    }
}
