//! Page transformation: decode, normalise colour, downscale, recompress.
//!
//! ## Colour
//!
//! With `grayscale` set every page becomes 8-bit luminance; otherwise it is
//! forced to 8-bit RGB. Either way the alpha channel is dropped by the image
//! crate's conversion (transparent pixels keep their stored colour), since a
//! JPEG page cannot carry transparency.
//!
//! ## Size
//!
//! Thumbnail semantics: a page larger than the bounding box is scaled down
//! with Lanczos3 so it fits entirely inside, keeping its aspect ratio. Pages
//! already inside the box are left at their original size.

use crate::config::ConversionConfig;
use crate::error::Comic2PdfError;
use crate::pipeline::encode;
use image::imageops::FilterType;
use image::{DynamicImage, ImageReader};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Channel layout of a transformed page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PageColor {
    /// One 8-bit luminance channel.
    Gray,
    /// Three 8-bit channels.
    Rgb,
}

impl PageColor {
    /// Number of colour components per pixel.
    pub fn channels(&self) -> u8 {
        match self {
            PageColor::Gray => 1,
            PageColor::Rgb => 3,
        }
    }
}

/// A recompressed page ready for the document assembler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformedPage {
    /// The compressed JPEG on disk.
    pub path: PathBuf,
    /// Final width in pixels.
    pub width: u32,
    /// Final height in pixels.
    pub height: u32,
    pub color: PageColor,
    /// Size of the JPEG file.
    pub jpeg_bytes: u64,
}

/// Dimensions of a `width`×`height` image shrunk to fit in `max_w`×`max_h`.
///
/// Never enlarges, never returns 0, never exceeds the box.
pub fn fit_within(width: u32, height: u32, max_w: u32, max_h: u32) -> (u32, u32) {
    if width <= max_w && height <= max_h {
        return (width, height);
    }
    let ratio = f64::min(max_w as f64 / width as f64, max_h as f64 / height as f64);
    let w = ((width as f64 * ratio).round() as u32).clamp(1, max_w.max(1));
    let h = ((height as f64 * ratio).round() as u32).clamp(1, max_h.max(1));
    (w, h)
}

/// Apply the colour policy and downscale to the bounding box.
pub fn prepare_image(img: DynamicImage, max_w: u32, max_h: u32, grayscale: bool) -> DynamicImage {
    let img = if grayscale {
        DynamicImage::ImageLuma8(img.to_luma8())
    } else {
        DynamicImage::ImageRgb8(img.to_rgb8())
    };

    let (w, h) = fit_within(img.width(), img.height(), max_w, max_h);
    if (w, h) == (img.width(), img.height()) {
        return img;
    }
    debug!(
        "Resizing {}x{} → {}x{}",
        img.width(),
        img.height(),
        w,
        h
    );
    img.resize_exact(w, h, FilterType::Lanczos3)
}

/// Decode the image at `path`.
///
/// The format is sniffed from the content, so a PNG saved as `.jpg` still opens.
pub fn load_image(path: &Path) -> Result<DynamicImage, Comic2PdfError> {
    let decode_err = |detail: String| Comic2PdfError::ImageDecode {
        path: path.to_path_buf(),
        detail,
    };

    ImageReader::open(path)
        .map_err(|e| decode_err(e.to_string()))?
        .with_guessed_format()
        .map_err(|e| decode_err(e.to_string()))?
        .decode()
        .map_err(|e| decode_err(e.to_string()))
}

/// Transform one page image and write its compressed sibling.
pub fn transform_page(
    source: &Path,
    config: &ConversionConfig,
) -> Result<TransformedPage, Comic2PdfError> {
    let img = load_image(source)?;
    let (src_w, src_h) = (img.width(), img.height());

    let img = prepare_image(img, config.max_width, config.max_height, config.grayscale);
    let dest = encode::compressed_path(source);
    let jpeg_bytes = encode::encode_jpeg(&img, config.quality, &dest)?;

    debug!(
        "Transformed {} ({}x{} → {}x{})",
        source.display(),
        src_w,
        src_h,
        img.width(),
        img.height()
    );

    Ok(TransformedPage {
        path: dest,
        width: img.width(),
        height: img.height(),
        color: if config.grayscale {
            PageColor::Gray
        } else {
            PageColor::Rgb
        },
        jpeg_bytes,
    })
}
