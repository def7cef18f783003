//! Result types returned by the conversion entry points.
//!
//! Everything here is `Serialize` so the CLI can print it with `--json`.

use crate::pipeline::transform::PageColor;
use serde::Serialize;
use std::path::PathBuf;

/// Outcome of a successful conversion.
#[derive(Debug, Clone, Serialize)]
pub struct ConversionOutput {
    /// Path the PDF was written to.
    pub output_path: PathBuf,
    /// Per-page details, in page order.
    pub pages: Vec<PageInfo>,
    /// Aggregate numbers for the run.
    pub stats: ConversionStats,
}

/// One page of the output document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageInfo {
    /// 1-indexed page number.
    pub page_num: usize,
    /// File name inside the archive, `/`-separated.
    pub source: String,
    /// Page width in pixels (and PDF points).
    pub width: u32,
    /// Page height in pixels (and PDF points).
    pub height: u32,
    pub color: PageColor,
    /// Size of the embedded JPEG stream.
    pub jpeg_bytes: u64,
}

/// Aggregate statistics for a conversion run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ConversionStats {
    pub page_count: usize,
    pub archive_bytes: u64,
    pub output_bytes: u64,
    pub extract_duration_ms: u64,
    pub transform_duration_ms: u64,
    pub assemble_duration_ms: u64,
    pub total_duration_ms: u64,
}

impl ConversionStats {
    /// Output size relative to the input archive; below 1.0 means the PDF is smaller.
    pub fn size_ratio(&self) -> Option<f64> {
        (self.archive_bytes > 0).then(|| self.output_bytes as f64 / self.archive_bytes as f64)
    }
}

/// What [`crate::inspect`] finds inside an archive.
#[derive(Debug, Clone, Serialize)]
pub struct ArchiveSummary {
    /// Detected container, e.g. `"zip"`.
    pub format: String,
    /// Supported page images, in the order they would become pages.
    pub pages: Vec<String>,
}
