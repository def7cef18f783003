//! # comic2pdf
//!
//! Convert comic book archives (`.cbz`, `.cbr`, `.cb7`, `.cbt`) into a single PDF.
//!
//! ## Pipeline Overview
//!
//! ```text
//! archive
//!  │
//!  ├─ 1. Input      validate the path, detect zip / rar / 7z / tar from the header
//!  ├─ 2. Extract    unpack into a private scratch dir, list .jpg/.jpeg/.png
//!  ├─ 3. Transform  grayscale or RGB, shrink to the bounding box (Lanczos3)
//!  ├─ 4. Encode     JPEG at the configured quality
//!  ├─ 5. Assemble   one page per image, page size = image size
//!  └─ 6. Output     PDF written atomically + per-page stats
//! ```
//!
//! Pages are ordered by their path inside the archive, compared byte-wise.
//! The scratch directory is removed on every exit path.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use comic2pdf::{convert, ConversionConfig};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConversionConfig::builder()
//!         .grayscale(true)
//!         .quality(75)
//!         .build()?;
//!     let output = convert("Saga 01.cbz", "Saga 01.pdf", &config)?;
//!     eprintln!(
//!         "{} pages, {} bytes",
//!         output.stats.page_count, output.stats.output_bytes
//!     );
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `comic2pdf` binary (clap + anyhow + indicatif + tracing-subscriber) |
//! | `rar`   | on      | RAR / CBR support through the `unrar` crate (builds bundled C++ code) |
//! | `sevenz`| on      | 7-Zip / CB7 support through the `sevenz-rust` crate |
//!
//! Disable all three when using only the library for zip and tar archives:
//! ```toml
//! comic2pdf = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use comic_archive::ArchiveFormat;
pub use config::{ConversionConfig, ConversionConfigBuilder, DEFAULT_MAX_DIMENSION, DEFAULT_QUALITY};
pub use convert::{convert, convert_with, inspect};
pub use error::{Comic2PdfError, ErrorReport, Stage};
pub use output::{ArchiveSummary, ConversionOutput, ConversionStats, PageInfo};
pub use pipeline::assemble::{DocumentSink, PdfAssembler};
pub use pipeline::extract::{ArchiveExtractor, PageExtractor};
pub use pipeline::transform::{PageColor, TransformedPage};
pub use progress::{ConversionProgressCallback, NoopProgressCallback, ProgressCallback};
