//! JPEG encoding: `DynamicImage` → compressed sibling file on disk.
//!
//! Pages are always re-encoded as baseline JPEG, whatever the source format.
//! PDF viewers decode `/DCTDecode` streams natively, so the bytes written here
//! are embedded into the document verbatim by [`crate::pipeline::assemble`]
//! without a second re-encode.

use crate::error::Comic2PdfError;
use image::codecs::jpeg::JpegEncoder;
use image::DynamicImage;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Suffix appended to a page's path to name its compressed copy.
pub const COMPRESSED_SUFFIX: &str = "_compressed.jpg";

/// Path of the compressed copy of `source`: `01.png` → `01.png_compressed.jpg`.
pub fn compressed_path(source: &Path) -> PathBuf {
    let mut name = source.as_os_str().to_owned();
    name.push(COMPRESSED_SUFFIX);
    PathBuf::from(name)
}

/// Encode `img` as JPEG at `quality` and write it to `dest`.
///
/// The pixel layout of `img` is kept: `Luma8` produces a single-component
/// JPEG, `Rgb8` a three-component one. Returns the number of bytes written.
pub fn encode_jpeg(img: &DynamicImage, quality: u8, dest: &Path) -> Result<u64, Comic2PdfError> {
    let encode_err = |detail: String| Comic2PdfError::ImageEncode {
        path: dest.to_path_buf(),
        detail,
    };

    let mut buf = Vec::new();
    img.write_with_encoder(JpegEncoder::new_with_quality(&mut buf, quality))
        .map_err(|e| encode_err(e.to_string()))?;

    std::fs::write(dest, &buf).map_err(|e| encode_err(e.to_string()))?;

    debug!(
        "Encoded {}x{} page → {} ({} bytes, q={})",
        img.width(),
        img.height(),
        dest.display(),
        buf.len(),
        quality
    );
    Ok(buf.len() as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma, Rgb, RgbImage};

    #[test]
    fn compressed_path_appends_suffix() {
        assert_eq!(
            compressed_path(Path::new("/scratch/ch1/01.png")),
            PathBuf::from("/scratch/ch1/01.png_compressed.jpg")
        );
    }

    #[test]
    fn grayscale_stays_single_channel() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("gray.jpg");
        let img = DynamicImage::ImageLuma8(GrayImage::from_pixel(16, 8, Luma([128])));

        let written = encode_jpeg(&img, 80, &dest).unwrap();
        assert_eq!(written, std::fs::metadata(&dest).unwrap().len());

        let decoded = image::open(&dest).unwrap();
        assert_eq!(decoded.color(), image::ColorType::L8);
        assert_eq!((decoded.width(), decoded.height()), (16, 8));
    }

    #[test]
    fn lower_quality_gives_smaller_files() {
        let dir = tempfile::tempdir().unwrap();
        let img = DynamicImage::ImageRgb8(RgbImage::from_fn(64, 64, |x, y| {
            Rgb([(x * 4) as u8, (y * 4) as u8, ((x ^ y) * 4) as u8])
        }));

        let high = encode_jpeg(&img, 95, &dir.path().join("high.jpg")).unwrap();
        let low = encode_jpeg(&img, 10, &dir.path().join("low.jpg")).unwrap();
        assert!(low < high, "q10 = {low} bytes, q95 = {high} bytes");
    }

    #[test]
    fn unwritable_destination_is_encode_error() {
        let img = DynamicImage::ImageRgb8(RgbImage::new(4, 4));
        let err = encode_jpeg(&img, 85, Path::new("/definitely/not/a/dir/out.jpg")).unwrap_err();
        assert!(matches!(err, Comic2PdfError::ImageEncode { .. }));
    }
}
