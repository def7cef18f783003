//! # comic-archive
//!
//! Detect and unpack the container formats comic books are distributed in,
//! so that callers only ever deal with a directory of extracted files.
//!
//! ## Supported containers
//!
//! | Format | Extensions       | Magic bytes              | Backend          |
//! |--------|------------------|--------------------------|------------------|
//! | Zip    | `.cbz`, `.zip`   | `PK\x03\x04`, `PK\x05\x06` | `zip`          |
//! | Rar    | `.cbr`, `.rar`   | `Rar!\x1a\x07`           | `unrar` (`rar`)  |
//! | Tar    | `.cbt`, `.tar`   | `ustar` at offset 257    | `tar`            |
//! | TarGz  | `.tgz`, `.tar.gz`| `\x1f\x8b`               | `flate2` + `tar` |
//! | 7z     | `.cb7`, `.7z`    | `7z\xbc\xaf\x27\x1c`     | `sevenz-rust` (`sevenz`) |
//!
//! Detection trusts the magic bytes first. Comic archives are frequently
//! mislabelled (a `.cbr` that is really a zip is common), so the extension is
//! only consulted when the header is inconclusive.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use comic_archive::{detect_format, unpack};
//! use std::path::Path;
//!
//! let input = Path::new("issue-001.cbz");
//! let format = detect_format(input).expect("readable archive");
//! unpack(input, format, Path::new("/tmp/issue-001")).expect("unpack failed");
//! ```

use std::fmt;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

/// Bytes read from the head of a file for format sniffing. Covers the tar
/// `ustar` signature at offset 257.
const SNIFF_LEN: usize = 512;

// ── Error type ───────────────────────────────────────────────────────────────

/// Errors returned by comic-archive operations.
#[derive(Error, Debug)]
pub enum ArchiveError {
    /// The archive file could not be opened or read.
    #[error("Cannot read archive '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Neither the header nor the extension identifies a known container.
    #[error("Unrecognised archive format for '{path}' (first bytes: {magic:02x?})")]
    UnknownFormat { path: PathBuf, magic: Vec<u8> },

    /// Support for this container was compiled out.
    #[error("{format} support is disabled in this build (enable the `{feature}` feature)")]
    FeatureDisabled {
        format: ArchiveFormat,
        feature: &'static str,
    },

    /// The decoder rejected the archive: corrupt data, unsupported
    /// compression method, encrypted entry, or a write failure under `dest`.
    #[error("Failed to unpack {format} archive: {detail}")]
    Unpack {
        format: ArchiveFormat,
        detail: String,
    },
}

// ── Format detection ─────────────────────────────────────────────────────────

/// Container formats recognised by [`detect_format`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArchiveFormat {
    Zip,
    Rar,
    Tar,
    TarGz,
    /// 7-Zip (`.cb7`).
    SevenZip,
}

impl ArchiveFormat {
    /// Identify a container from the first bytes of the file.
    pub fn from_magic(head: &[u8]) -> Option<Self> {
        if head.starts_with(b"PK\x03\x04") || head.starts_with(b"PK\x05\x06") {
            Some(Self::Zip)
        } else if head.starts_with(b"Rar!\x1a\x07") {
            Some(Self::Rar)
        } else if head.starts_with(&[0x1f, 0x8b]) {
            Some(Self::TarGz)
        } else if head.starts_with(b"7z\xbc\xaf\x27\x1c") {
            Some(Self::SevenZip)
        } else if head.len() >= 262 && &head[257..262] == b"ustar" {
            Some(Self::Tar)
        } else {
            None
        }
    }

    /// Identify a container from the file name.
    pub fn from_extension(path: &Path) -> Option<Self> {
        let name = path.file_name()?.to_str()?.to_ascii_lowercase();
        if name.ends_with(".tar.gz") || name.ends_with(".tgz") {
            return Some(Self::TarGz);
        }
        match name.rsplit_once('.')?.1 {
            "cbz" | "zip" => Some(Self::Zip),
            "cbr" | "rar" => Some(Self::Rar),
            "cbt" | "tar" => Some(Self::Tar),
            "cb7" | "7z" => Some(Self::SevenZip),
            _ => None,
        }
    }

    /// Short lowercase name, e.g. `"zip"`.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Zip => "zip",
            Self::Rar => "rar",
            Self::Tar => "tar",
            Self::TarGz => "tar.gz",
            Self::SevenZip => "7z",
        }
    }
}

impl fmt::Display for ArchiveFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Sniff the container format of the file at `path`.
///
/// Magic bytes win over the extension.
pub fn detect_format(path: &Path) -> Result<ArchiveFormat, ArchiveError> {
    let io_err = |source| ArchiveError::Io {
        path: path.to_path_buf(),
        source,
    };

    let mut head = Vec::with_capacity(SNIFF_LEN);
    File::open(path)
        .map_err(io_err)?
        .take(SNIFF_LEN as u64)
        .read_to_end(&mut head)
        .map_err(io_err)?;

    if let Some(format) = ArchiveFormat::from_magic(&head) {
        debug!(format = %format, "Detected archive format from header");
        return Ok(format);
    }
    if let Some(format) = ArchiveFormat::from_extension(path) {
        debug!(format = %format, "Detected archive format from extension");
        return Ok(format);
    }

    head.truncate(8);
    Err(ArchiveError::UnknownFormat {
        path: path.to_path_buf(),
        magic: head,
    })
}

// ── Unpacking ────────────────────────────────────────────────────────────────

/// Unpack every entry of `archive` into `dest`, preserving directory layout.
///
/// `dest` must already exist. Nothing is written outside it: entries with
/// absolute paths or `..` components are refused by the underlying decoders.
pub fn unpack(archive: &Path, format: ArchiveFormat, dest: &Path) -> Result<(), ArchiveError> {
    debug!(
        archive = %archive.display(),
        dest = %dest.display(),
        format = %format,
        "Unpacking archive"
    );
    match format {
        ArchiveFormat::Zip => unpack_zip(archive, dest),
        ArchiveFormat::Tar => {
            let file = open(archive)?;
            unpack_tar(BufReader::new(file), format, dest)
        }
        ArchiveFormat::TarGz => {
            let file = open(archive)?;
            unpack_tar(flate2::read::GzDecoder::new(BufReader::new(file)), format, dest)
        }
        ArchiveFormat::Rar => unpack_rar(archive, dest),
        ArchiveFormat::SevenZip => unpack_7z(archive, dest),
    }
}

fn open(path: &Path) -> Result<File, ArchiveError> {
    File::open(path).map_err(|source| ArchiveError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn unpack_zip(archive: &Path, dest: &Path) -> Result<(), ArchiveError> {
    let unpack_err = |e: zip::result::ZipError| ArchiveError::Unpack {
        format: ArchiveFormat::Zip,
        detail: e.to_string(),
    };

    let mut zip = zip::ZipArchive::new(BufReader::new(open(archive)?)).map_err(unpack_err)?;
    debug!(entries = zip.len(), "Zip central directory read");
    zip.extract(dest).map_err(unpack_err)
}

fn unpack_tar<R: Read>(reader: R, format: ArchiveFormat, dest: &Path) -> Result<(), ArchiveError> {
    let mut tar = tar::Archive::new(reader);
    tar.unpack(dest).map_err(|e| ArchiveError::Unpack {
        format,
        detail: e.to_string(),
    })
}

#[cfg(feature = "rar")]
fn unpack_rar(archive: &Path, dest: &Path) -> Result<(), ArchiveError> {
    let unpack_err = |e: unrar::error::UnrarError| ArchiveError::Unpack {
        format: ArchiveFormat::Rar,
        detail: e.to_string(),
    };

    let mut cursor = unrar::Archive::new(archive)
        .open_for_processing()
        .map_err(unpack_err)?;
    while let Some(header) = cursor.read_header().map_err(unpack_err)? {
        cursor = if header.entry().is_file() {
            header.extract_with_base(dest).map_err(unpack_err)?
        } else {
            header.skip().map_err(unpack_err)?
        };
    }
    Ok(())
}

#[cfg(not(feature = "rar"))]
fn unpack_rar(_archive: &Path, _dest: &Path) -> Result<(), ArchiveError> {
    Err(ArchiveError::FeatureDisabled {
        format: ArchiveFormat::Rar,
        feature: "rar",
    })
}

#[cfg(feature = "sevenz")]
fn unpack_7z(archive: &Path, dest: &Path) -> Result<(), ArchiveError> {
    // Open first so a missing file is an I/O error, not a decoder error.
    open(archive)?;
    sevenz_rust::decompress_file(archive, dest).map_err(|e| ArchiveError::Unpack {
        format: ArchiveFormat::SevenZip,
        detail: e.to_string(),
    })
}

#[cfg(not(feature = "sevenz"))]
fn unpack_7z(_archive: &Path, _dest: &Path) -> Result<(), ArchiveError> {
    Err(ArchiveError::FeatureDisabled {
        format: ArchiveFormat::SevenZip,
        feature: "sevenz",
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn magic_bytes_identify_formats() {
        assert_eq!(ArchiveFormat::from_magic(b"PK\x03\x04rest"), Some(ArchiveFormat::Zip));
        assert_eq!(ArchiveFormat::from_magic(b"PK\x05\x06"), Some(ArchiveFormat::Zip));
        assert_eq!(ArchiveFormat::from_magic(b"Rar!\x1a\x07\x00"), Some(ArchiveFormat::Rar));
        assert_eq!(ArchiveFormat::from_magic(&[0x1f, 0x8b, 8, 0]), Some(ArchiveFormat::TarGz));
        assert_eq!(
            ArchiveFormat::from_magic(b"7z\xbc\xaf\x27\x1c\x00\x04"),
            Some(ArchiveFormat::SevenZip)
        );
        assert_eq!(ArchiveFormat::from_magic(b"%PDF-1.7"), None);

        let mut tar_head = vec![0u8; 512];
        tar_head[257..262].copy_from_slice(b"ustar");
        assert_eq!(ArchiveFormat::from_magic(&tar_head), Some(ArchiveFormat::Tar));
    }

    #[test]
    fn extension_fallback_is_case_insensitive() {
        assert_eq!(ArchiveFormat::from_extension(Path::new("a/Issue.CBZ")), Some(ArchiveFormat::Zip));
        assert_eq!(ArchiveFormat::from_extension(Path::new("x.cbr")), Some(ArchiveFormat::Rar));
        assert_eq!(ArchiveFormat::from_extension(Path::new("x.cbt")), Some(ArchiveFormat::Tar));
        assert_eq!(ArchiveFormat::from_extension(Path::new("x.tar.gz")), Some(ArchiveFormat::TarGz));
        assert_eq!(ArchiveFormat::from_extension(Path::new("x.cb7")), Some(ArchiveFormat::SevenZip));
        assert_eq!(ArchiveFormat::from_extension(Path::new("noext")), None);
    }

    #[test]
    fn header_beats_misleading_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("really-a-zip.cbr");
        let file = File::create(&path).unwrap();
        let mut zip = zip::ZipWriter::new(file);
        zip.start_file("01.png", zip::write::SimpleFileOptions::default())
            .unwrap();
        zip.write_all(b"not really a png").unwrap();
        zip.finish().unwrap();

        assert_eq!(detect_format(&path).unwrap(), ArchiveFormat::Zip);
    }

    #[test]
    fn unknown_format_reports_magic() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mystery.bin");
        std::fs::write(&path, b"hello world, not an archive").unwrap();

        match detect_format(&path) {
            Err(ArchiveError::UnknownFormat { magic, .. }) => assert_eq!(magic, b"hello wo"),
            other => panic!("expected UnknownFormat, got {other:?}"),
        }
    }

    #[test]
    fn unpack_zip_preserves_nested_layout() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("book.cbz");
        let mut zip = zip::ZipWriter::new(File::create(&path).unwrap());
        let opts = zip::write::SimpleFileOptions::default();
        zip.start_file("cover.jpg", opts).unwrap();
        zip.write_all(b"cover").unwrap();
        zip.start_file("chapter1/01.png", opts).unwrap();
        zip.write_all(b"page").unwrap();
        zip.finish().unwrap();

        let out = tempfile::tempdir().unwrap();
        unpack(&path, ArchiveFormat::Zip, out.path()).unwrap();

        assert_eq!(std::fs::read(out.path().join("cover.jpg")).unwrap(), b"cover");
        assert_eq!(std::fs::read(out.path().join("chapter1/01.png")).unwrap(), b"page");
    }

    #[test]
    fn unpack_tar_and_tar_gz() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("01.jpg");
        std::fs::write(&src, b"jpeg bytes").unwrap();

        let tar_path = dir.path().join("book.cbt");
        let mut builder = tar::Builder::new(File::create(&tar_path).unwrap());
        builder.append_path_with_name(&src, "pages/01.jpg").unwrap();
        builder.into_inner().unwrap().flush().unwrap();

        let out = tempfile::tempdir().unwrap();
        unpack(&tar_path, detect_format(&tar_path).unwrap(), out.path()).unwrap();
        assert_eq!(std::fs::read(out.path().join("pages/01.jpg")).unwrap(), b"jpeg bytes");

        let gz_path = dir.path().join("book.tar.gz");
        let gz = flate2::write::GzEncoder::new(
            File::create(&gz_path).unwrap(),
            flate2::Compression::default(),
        );
        let mut builder = tar::Builder::new(gz);
        builder.append_path_with_name(&src, "01.jpg").unwrap();
        builder.into_inner().unwrap().finish().unwrap();

        assert_eq!(detect_format(&gz_path).unwrap(), ArchiveFormat::TarGz);
        let out = tempfile::tempdir().unwrap();
        unpack(&gz_path, ArchiveFormat::TarGz, out.path()).unwrap();
        assert!(out.path().join("01.jpg").exists());
    }

    #[test]
    fn corrupt_zip_is_an_unpack_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.cbz");
        std::fs::write(&path, b"PK\x03\x04 truncated garbage").unwrap();

        let out = tempfile::tempdir().unwrap();
        let err = unpack(&path, ArchiveFormat::Zip, out.path()).unwrap_err();
        assert!(matches!(err, ArchiveError::Unpack { format: ArchiveFormat::Zip, .. }));
    }

    fn fixture(name: &str) -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures").join(name)
    }

    #[test]
    fn rar_fixture_is_detected_from_header() {
        assert_eq!(detect_format(&fixture("two-pages.cbr")).unwrap(), ArchiveFormat::Rar);
    }

    #[cfg(feature = "rar")]
    #[test]
    fn unpack_rar_extracts_every_page() {
        let out = tempfile::tempdir().unwrap();
        unpack(&fixture("two-pages.cbr"), ArchiveFormat::Rar, out.path()).unwrap();

        for name in ["01.png", "02.png"] {
            let bytes = std::fs::read(out.path().join(name)).unwrap();
            assert!(bytes.starts_with(b"\x89PNG"), "{name} is not a PNG");
        }
    }

    #[cfg(feature = "rar")]
    #[test]
    fn truncated_rar_is_an_unpack_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cut.cbr");
        let full = std::fs::read(fixture("two-pages.cbr")).unwrap();
        std::fs::write(&path, &full[..60]).unwrap();

        let out = tempfile::tempdir().unwrap();
        let err = unpack(&path, ArchiveFormat::Rar, out.path()).unwrap_err();
        assert!(matches!(err, ArchiveError::Unpack { format: ArchiveFormat::Rar, .. }), "got {err:?}");
    }

    #[cfg(not(feature = "rar"))]
    #[test]
    fn rar_without_feature_is_disabled() {
        let out = tempfile::tempdir().unwrap();
        let err = unpack(&fixture("two-pages.cbr"), ArchiveFormat::Rar, out.path()).unwrap_err();
        assert!(matches!(err, ArchiveError::FeatureDisabled { feature: "rar", .. }), "got {err:?}");
    }

    #[cfg(feature = "sevenz")]
    #[test]
    fn unpack_7z_preserves_nested_layout() {
        let src = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(src.path().join("ch1")).unwrap();
        std::fs::write(src.path().join("ch1/01.jpg"), b"first").unwrap();
        std::fs::write(src.path().join("cover.png"), b"cover").unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("book.cb7");
        sevenz_rust::compress_to_path(src.path(), path.as_path()).unwrap();
        assert_eq!(detect_format(&path).unwrap(), ArchiveFormat::SevenZip);

        let out = tempfile::tempdir().unwrap();
        unpack(&path, ArchiveFormat::SevenZip, out.path()).unwrap();
        assert_eq!(std::fs::read(out.path().join("ch1/01.jpg")).unwrap(), b"first");
        assert_eq!(std::fs::read(out.path().join("cover.png")).unwrap(), b"cover");
    }

    #[cfg(feature = "sevenz")]
    #[test]
    fn corrupt_7z_is_an_unpack_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.cb7");
        std::fs::write(&path, b"7z\xbc\xaf\x27\x1c\x00\x04 garbage").unwrap();

        let out = tempfile::tempdir().unwrap();
        let err = unpack(&path, ArchiveFormat::SevenZip, out.path()).unwrap_err();
        assert!(matches!(err, ArchiveError::Unpack { format: ArchiveFormat::SevenZip, .. }), "got {err:?}");
    }

    #[cfg(not(feature = "sevenz"))]
    #[test]
    fn seven_zip_without_feature_is_disabled() {
        let out = tempfile::tempdir().unwrap();
        let err = unpack(Path::new("x.cb7"), ArchiveFormat::SevenZip, out.path()).unwrap_err();
        assert!(matches!(err, ArchiveError::FeatureDisabled { feature: "sevenz", .. }), "got {err:?}");
    }
}
