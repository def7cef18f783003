//! Conversion entry points.
//!
//! [`convert`] is the one-call API: validate the archive, unpack it into a
//! private scratch directory, transform every page, write the PDF. The scratch
//! directory is a [`tempfile::TempDir`] owned by this call; it is removed when
//! the call returns, whether the conversion succeeded, failed, or panicked.
//!
//! [`convert_with`] is the same pipeline with the extractor and document sink
//! supplied by the caller.

use crate::config::ConversionConfig;
use crate::error::Comic2PdfError;
use crate::output::{ArchiveSummary, ConversionOutput, ConversionStats, PageInfo};
use crate::pipeline::assemble::{self, DocumentSink, PdfAssembler};
use crate::pipeline::extract::{self, ArchiveExtractor, PageExtractor};
use crate::pipeline::{input, transform};
use std::path::Path;
use std::time::Instant;
use tempfile::TempDir;
use tracing::{debug, info, warn};

/// Title used when neither the config nor the input path provides one.
const FALLBACK_TITLE: &str = "Comic";

/// Convert a comic archive into a PDF at `output`.
///
/// # Arguments
/// * `input`  — `.cbz`/`.cbr`/`.cbt` (or plain zip/rar/tar/tar.gz) archive
/// * `output` — PDF path; missing parent directories are created
/// * `config` — page bounds, JPEG quality, colour mode
///
/// # Errors
/// Any failure aborts the whole conversion. No output file is left behind
/// unless the PDF was written completely.
pub fn convert(
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<ConversionOutput, Comic2PdfError> {
    let input = input.as_ref();
    config.validate()?;
    info!("Starting conversion: {}", input.display());

    let resolved = input::resolve_input(input)?;
    let title = config
        .title
        .clone()
        .unwrap_or_else(|| default_title(&resolved.path));

    convert_with(
        &resolved.path,
        output.as_ref(),
        config,
        &ArchiveExtractor::with_format(resolved.format),
        || PdfAssembler::new(&title),
    )
}

/// Run the pipeline with a caller-supplied extractor and document sink.
///
/// `new_document` is invoked at most once, after every page has been
/// transformed.
pub fn convert_with<E, D, F>(
    input: &Path,
    output: &Path,
    config: &ConversionConfig,
    extractor: &E,
    new_document: F,
) -> Result<ConversionOutput, Comic2PdfError>
where
    E: PageExtractor + ?Sized,
    D: DocumentSink,
    F: FnOnce() -> D,
{
    config.validate()?;
    let scratch = create_scratch(config.scratch_root.as_deref())?;
    debug!("Scratch directory: {}", scratch.path().display());

    let result = run_pipeline(input, output, config, extractor, new_document, scratch.path());

    let scratch_path = scratch.path().to_path_buf();
    if let Err(e) = scratch.close() {
        warn!("Failed to remove scratch directory {}: {}", scratch_path.display(), e);
    }
    result
}

/// Unpack `input` and list the pages it would produce, without converting.
pub fn inspect(input: impl AsRef<Path>) -> Result<ArchiveSummary, Comic2PdfError> {
    let resolved = input::resolve_input(input.as_ref())?;
    let scratch = create_scratch(None)?;

    let pages = ArchiveExtractor::with_format(resolved.format)
        .extract(&resolved.path, scratch.path())
        .map(|paths| {
            paths
                .iter()
                .map(|p| extract::relative_name(scratch.path(), p))
                .collect()
        });

    let scratch_path = scratch.path().to_path_buf();
    if let Err(e) = scratch.close() {
        warn!("Failed to remove scratch directory {}: {}", scratch_path.display(), e);
    }

    Ok(ArchiveSummary {
        format: resolved.format.name().to_string(),
        pages: pages?,
    })
}

// ── Internal helpers ─────────────────────────────────────────────────────

fn run_pipeline<E, D, F>(
    input: &Path,
    output: &Path,
    config: &ConversionConfig,
    extractor: &E,
    new_document: F,
    scratch: &Path,
) -> Result<ConversionOutput, Comic2PdfError>
where
    E: PageExtractor + ?Sized,
    D: DocumentSink,
    F: FnOnce() -> D,
{
    let total_start = Instant::now();

    // ── Step 1: Extract ──────────────────────────────────────────────────
    let extract_start = Instant::now();
    let images = extractor.extract(input, scratch)?;
    let extract_duration_ms = extract_start.elapsed().as_millis() as u64;
    if images.is_empty() {
        return Err(Comic2PdfError::EmptyInput {
            path: input.to_path_buf(),
        });
    }
    let total = images.len();
    info!("Found {} pages in {}ms", total, extract_duration_ms);

    if let Some(ref cb) = config.progress_callback {
        cb.on_conversion_start(total);
    }

    // ── Step 2: Transform each page ──────────────────────────────────────
    let transform_start = Instant::now();
    let mut transformed = Vec::with_capacity(total);
    let mut pages = Vec::with_capacity(total);
    for (idx, source) in images.iter().enumerate() {
        let page_num = idx + 1;
        let name = extract::relative_name(scratch, source);
        if let Some(ref cb) = config.progress_callback {
            cb.on_page_start(page_num, total, &name);
        }

        let page = match transform::transform_page(source, config) {
            Ok(page) => page,
            Err(e) => {
                if let Some(ref cb) = config.progress_callback {
                    cb.on_page_error(page_num, total, &e.to_string());
                }
                return Err(e);
            }
        };

        if let Some(ref cb) = config.progress_callback {
            cb.on_page_complete(page_num, total, page.width, page.height);
        }
        pages.push(PageInfo {
            page_num,
            source: name,
            width: page.width,
            height: page.height,
            color: page.color,
            jpeg_bytes: page.jpeg_bytes,
        });
        transformed.push(page);
    }
    let transform_duration_ms = transform_start.elapsed().as_millis() as u64;

    // ── Step 3: Assemble ─────────────────────────────────────────────────
    let assemble_start = Instant::now();
    let output_bytes = assemble::assemble(&transformed, output, new_document)?;
    let assemble_duration_ms = assemble_start.elapsed().as_millis() as u64;

    if let Some(ref cb) = config.progress_callback {
        cb.on_conversion_complete(total);
    }

    let stats = ConversionStats {
        page_count: total,
        archive_bytes: std::fs::metadata(input).map(|m| m.len()).unwrap_or(0),
        output_bytes,
        extract_duration_ms,
        transform_duration_ms,
        assemble_duration_ms,
        total_duration_ms: total_start.elapsed().as_millis() as u64,
    };
    info!(
        "Conversion complete: {} pages, {} → {} bytes, {}ms total",
        stats.page_count, stats.archive_bytes, stats.output_bytes, stats.total_duration_ms
    );

    Ok(ConversionOutput {
        output_path: output.to_path_buf(),
        pages,
        stats,
    })
}

fn create_scratch(root: Option<&Path>) -> Result<TempDir, Comic2PdfError> {
    let mut builder = tempfile::Builder::new();
    builder.prefix("comic2pdf-");
    match root {
        Some(dir) => builder.tempdir_in(dir),
        None => builder.tempdir(),
    }
    .map_err(Comic2PdfError::ScratchDir)
}

/// The input file name without its extension, e.g. `Saga 01` for `Saga 01.cbz`.
fn default_title(input: &Path) -> String {
    input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| FALLBACK_TITLE.to_string())
}
