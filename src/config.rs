//! Configuration types for comic-archive-to-PDF conversion.
//!
//! All conversion behaviour is controlled through [`ConversionConfig`], built
//! via its [`ConversionConfigBuilder`]. Setters store values as given;
//! `build()` rejects out-of-range ones, so a built config is always usable.

use crate::error::Comic2PdfError;
use crate::progress::ProgressCallback;
use std::fmt;
use std::path::PathBuf;

/// Default bounding box edge, in pixels.
pub const DEFAULT_MAX_DIMENSION: u32 = 1600;

/// Default JPEG quality.
pub const DEFAULT_QUALITY: u8 = 85;

/// Configuration for a single archive conversion.
///
/// # Example
/// ```rust
/// use comic2pdf::ConversionConfig;
///
/// let config = ConversionConfig::builder()
///     .max_width(1200)
///     .max_height(1800)
///     .quality(70)
///     .grayscale(true)
///     .build()
///     .unwrap();
/// assert_eq!(config.bounds(), (1200, 1800));
/// ```
#[derive(Clone)]
pub struct ConversionConfig {
    /// Maximum page width in pixels. Default: 1600.
    ///
    /// Pages wider than this are scaled down, preserving aspect ratio. Pages
    /// already inside the bounding box are never enlarged.
    pub max_width: u32,

    /// Maximum page height in pixels. Default: 1600.
    pub max_height: u32,

    /// JPEG quality used when recompressing every page, 1–100. Default: 85.
    ///
    /// Lower values shrink the PDF at the cost of visible block artefacts;
    /// around 85 is hard to tell apart from the source on typical scans.
    pub quality: u8,

    /// Desaturate every page to 8-bit grayscale. Default: false.
    ///
    /// Single-channel JPEGs are roughly a third of the size of their colour
    /// counterparts, which matters for black-and-white manga scans.
    pub grayscale: bool,

    /// Title written to the PDF `/Info` dictionary.
    /// If None, the input file stem is used.
    pub title: Option<String>,

    /// Parent directory for the per-run scratch directory.
    /// If None, the system temp directory is used.
    pub scratch_root: Option<PathBuf>,

    /// Receives per-page progress events. Default: None.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            max_width: DEFAULT_MAX_DIMENSION,
            max_height: DEFAULT_MAX_DIMENSION,
            quality: DEFAULT_QUALITY,
            grayscale: false,
            title: None,
            scratch_root: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ConversionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionConfig")
            .field("max_width", &self.max_width)
            .field("max_height", &self.max_height)
            .field("quality", &self.quality)
            .field("grayscale", &self.grayscale)
            .field("title", &self.title)
            .field("scratch_root", &self.scratch_root)
            .field(
                "progress_callback",
                &self
                    .progress_callback
                    .as_ref()
                    .map(|_| "<dyn ConversionProgressCallback>"),
            )
            .finish()
    }
}

impl ConversionConfig {
    /// Create a new builder for `ConversionConfig`.
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder {
            config: Self::default(),
        }
    }

    /// The `(max_width, max_height)` bounding box.
    pub fn bounds(&self) -> (u32, u32) {
        (self.max_width, self.max_height)
    }

    /// Check the invariants every pipeline stage relies on.
    pub fn validate(&self) -> Result<(), Comic2PdfError> {
        if self.max_width == 0 || self.max_height == 0 {
            return Err(Comic2PdfError::InvalidConfig(format!(
                "max width and height must be ≥ 1, got {}x{}",
                self.max_width, self.max_height
            )));
        }
        if !(1..=100).contains(&self.quality) {
            return Err(Comic2PdfError::InvalidConfig(format!(
                "JPEG quality must be 1–100, got {}",
                self.quality
            )));
        }
        Ok(())
    }
}

/// Builder for [`ConversionConfig`].
#[derive(Debug)]
pub struct ConversionConfigBuilder {
    config: ConversionConfig,
}

impl ConversionConfigBuilder {
    pub fn max_width(mut self, px: u32) -> Self {
        self.config.max_width = px;
        self
    }

    pub fn max_height(mut self, px: u32) -> Self {
        self.config.max_height = px;
        self
    }

    pub fn quality(mut self, q: u8) -> Self {
        self.config.quality = q;
        self
    }

    pub fn grayscale(mut self, v: bool) -> Self {
        self.config.grayscale = v;
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.config.title = Some(title.into());
        self
    }

    pub fn scratch_root(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.scratch_root = Some(dir.into());
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ConversionConfig, Comic2PdfError> {
        self.config.validate()?;
        Ok(self.config)
    }
}
