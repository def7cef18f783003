//! CLI binary for comic2pdf.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `ConversionConfig` and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use comic2pdf::{
    convert, inspect, Comic2PdfError, ConversionConfig, ConversionOutput,
    ConversionProgressCallback, ProgressCallback, DEFAULT_MAX_DIMENSION, DEFAULT_QUALITY,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const TICKS: [&str; 11] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: a live bar plus one log line per page.
struct CliProgressCallback {
    bar: ProgressBar,
    /// Start of the page currently being transformed.
    page_started: Mutex<Option<Instant>>,
}

impl CliProgressCallback {
    /// Start as a spinner; `on_conversion_start` turns it into a bar once the
    /// archive has been unpacked and the page count is known.
    fn new_dynamic() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        bar.enable_steady_tick(Duration::from_millis(80));
        Self::with_bar(bar)
    }

    fn with_bar(bar: ProgressBar) -> Arc<Self> {
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&TICKS);

        bar.set_style(spinner_style);
        bar.set_prefix("Unpacking");
        bar.set_message("Reading archive…");

        Arc::new(Self {
            bar,
            page_started: Mutex::new(None),
        })
    }

    fn activate_bar(&self, total: usize) {
        let progress_style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} pages  \
             ⏱ {elapsed_precise}  ETA {eta_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(&TICKS);

        self.bar.set_length(total as u64);
        self.bar.set_style(progress_style);
        self.bar.set_prefix("Converting");
        self.bar.reset_eta();
    }

    /// Clear the bar after a failure no page callback reported, e.g. while
    /// unpacking or writing the PDF. A bar already abandoned by
    /// `on_page_error` is left on screen.
    fn abort(&self) {
        if !self.bar.is_finished() {
            self.bar.finish_and_clear();
        }
    }

    fn page_elapsed_secs(&self) -> f64 {
        self.page_started
            .lock()
            .ok()
            .and_then(|mut started| started.take())
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0)
    }
}

impl ConversionProgressCallback for CliProgressCallback {
    fn on_conversion_start(&self, total_pages: usize) {
        self.activate_bar(total_pages);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Converting {total_pages} pages…"))
        ));
    }

    fn on_page_start(&self, _page_num: usize, _total: usize, name: &str) {
        if let Ok(mut started) = self.page_started.lock() {
            *started = Some(Instant::now());
        }
        self.bar.set_message(name.to_string());
    }

    fn on_page_complete(&self, page_num: usize, total: usize, width: u32, height: u32) {
        let elapsed = self.page_elapsed_secs();
        self.bar.println(format!(
            "  {} Page {:>3}/{:<3}  {:<11}  {}",
            green("✓"),
            page_num,
            total,
            dim(&format!("{width}x{height}")),
            dim(&format!("{elapsed:.1}s")),
        ));
        self.bar.inc(1);
    }

    fn on_page_error(&self, page_num: usize, total: usize, error: &str) {
        let elapsed = self.page_elapsed_secs();

        let first_line = error.lines().next().unwrap_or(error);
        let msg = match first_line.char_indices().nth(79) {
            Some((cut, _)) => format!("{}\u{2026}", &first_line[..cut]),
            None => first_line.to_string(),
        };

        self.bar.println(format!(
            "  {} Page {:>3}/{:<3}  {}  {}",
            red("✗"),
            page_num,
            total,
            red(&msg),
            dim(&format!("{elapsed:.1}s")),
        ));
        self.bar.abandon();
    }

    fn on_conversion_complete(&self, total_pages: usize) {
        self.bar.finish_and_clear();
        eprintln!(
            "{} {} pages converted",
            green("✔"),
            bold(&total_pages.to_string())
        );
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Basic conversion
  comic2pdf "Saga 01.cbz" "Saga 01.pdf"

  # Smaller file for an e-reader: grayscale, tighter bounds, lower quality
  comic2pdf --grayscale --max-width 1072 --max-height 1448 --quality 70 manga.cbr manga.pdf

  # List the pages an archive would produce, in order
  comic2pdf --inspect-only book.cbz

  # Machine-readable summary
  comic2pdf --json book.cbz book.pdf > book.json

SUPPORTED ARCHIVES:
  .cbz / .zip      ZIP
  .cbr / .rar      RAR (needs the `rar` feature, on by default)
  .cb7 / .7z       7-Zip (needs the `sevenz` feature, on by default)
  .cbt / .tar      TAR, optionally gzip-compressed (.tar.gz / .tgz)

  The container is detected from the file header; the extension is only a
  fallback. Pages are the .jpg, .jpeg and .png files inside, in name order.

ENVIRONMENT VARIABLES:
  RUST_LOG         Log filter override (e.g. RUST_LOG=comic2pdf=debug)
"#;

/// Convert comic archives (CBZ/CBR/CB7/CBT) to PDF.
#[derive(Parser, Debug)]
#[command(
    name = "comic2pdf",
    version,
    about = "Convert comic archives (CBZ/CBR/CB7/CBT) to PDF",
    long_about = "Convert a comic book archive into a single PDF. Every page is resized to fit \
a bounding box, optionally converted to grayscale, recompressed as JPEG, and placed on its own \
PDF page sized exactly to the image.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Comic archive to convert (.cbz, .cbr, .cb7, .cbt, .zip, .rar, .7z, .tar, .tar.gz).
    input: PathBuf,

    /// Path of the PDF to write.
    #[arg(required_unless_present = "inspect_only")]
    output: Option<PathBuf>,

    /// Maximum page width in pixels.
    #[arg(long, default_value_t = DEFAULT_MAX_DIMENSION,
          value_parser = clap::value_parser!(u32).range(1..))]
    max_width: u32,

    /// Maximum page height in pixels.
    #[arg(long, default_value_t = DEFAULT_MAX_DIMENSION,
          value_parser = clap::value_parser!(u32).range(1..))]
    max_height: u32,

    /// JPEG quality (1–100).
    #[arg(long, default_value_t = DEFAULT_QUALITY,
          value_parser = clap::value_parser!(u8).range(1..=100))]
    quality: u8,

    /// Convert every page to grayscale.
    #[arg(long)]
    grayscale: bool,

    /// PDF title metadata. Defaults to the input file name.
    #[arg(long)]
    title: Option<String>,

    /// Print the conversion result as JSON on stdout.
    #[arg(long)]
    json: bool,

    /// Disable progress bar.
    #[arg(long)]
    no_progress: bool,

    /// List the archive's pages only, no conversion.
    #[arg(long)]
    inspect_only: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long)]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar replaces INFO logs; --verbose always wins.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json && !cli.inspect_only;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    match run(&cli, show_progress) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let cause = err
                .chain()
                .find_map(|e| e.downcast_ref::<Comic2PdfError>());
            match cause {
                Some(cause) => {
                    eprintln!("{} [{}] {:#}", red("error"), cause.stage(), err);
                    if cli.json {
                        if let Ok(json) = serde_json::to_string_pretty(&cause.report()) {
                            println!("{json}");
                        }
                    }
                }
                None => eprintln!("{} {:#}", red("error"), err),
            }
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli, show_progress: bool) -> Result<()> {
    // ── Inspect-only mode ────────────────────────────────────────────────
    if cli.inspect_only {
        let summary = inspect(&cli.input).context("Failed to inspect archive")?;

        if cli.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&summary).context("Failed to serialise summary")?
            );
        } else {
            println!("File:    {}", cli.input.display());
            println!("Format:  {}", summary.format);
            println!("Pages:   {}", summary.pages.len());
            for (i, page) in summary.pages.iter().enumerate() {
                println!("  {:>4}  {}", i + 1, page);
            }
        }
        return Ok(());
    }

    let output_path = cli
        .output
        .as_ref()
        .context("An output path is required unless --inspect-only is given")?;

    let cli_progress = show_progress.then(CliProgressCallback::new_dynamic);
    let progress_cb = cli_progress
        .clone()
        .map(|cb| cb as Arc<dyn ConversionProgressCallback>);

    let config = build_config(cli, progress_cb)?;

    // ── Run conversion ───────────────────────────────────────────────────
    let output = match convert(&cli.input, output_path, &config) {
        Ok(output) => output,
        Err(e) => {
            if let Some(cb) = &cli_progress {
                cb.abort();
            }
            return Err(e).context("Conversion failed");
        }
    };

    if cli.json {
        let json = serde_json::to_string_pretty(&output).context("Failed to serialise output")?;
        println!("{json}");
    } else if !cli.quiet {
        print_summary(&output);
    }
    Ok(())
}

/// Map CLI args to `ConversionConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<ConversionConfig> {
    let mut builder = ConversionConfig::builder()
        .max_width(cli.max_width)
        .max_height(cli.max_height)
        .quality(cli.quality)
        .grayscale(cli.grayscale);

    if let Some(ref title) = cli.title {
        builder = builder.title(title.clone());
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

fn print_summary(output: &ConversionOutput) {
    let stats = &output.stats;
    eprintln!(
        "{}  {} pages  {}ms  →  {}",
        green("✔"),
        stats.page_count,
        stats.total_duration_ms,
        bold(&output.output_path.display().to_string()),
    );

    let ratio = stats
        .size_ratio()
        .map(|r| format!("  ({:.0}% of archive)", r * 100.0))
        .unwrap_or_default();
    eprintln!(
        "   {} → {}{}",
        dim(&format_bytes(stats.archive_bytes)),
        dim(&format_bytes(stats.output_bytes)),
        ratio,
    );
}

fn format_bytes(n: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KiB", "MiB", "GiB"];
    let mut value = n as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{n} B")
    } else {
        format!("{value:.1} {}", UNITS[unit])
    }
}
