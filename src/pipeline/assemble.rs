//! Document assembly: one PDF page per transformed image.
//!
//! Each page's MediaBox equals the image's pixel size (one pixel per point),
//! and the image is drawn with a `cm` matrix that scales the unit square to
//! the full page. No margins, no resampling: the viewer shows exactly the
//! pixels the transform stage produced.
//!
//! The recompressed JPEG is embedded verbatim as a `/DCTDecode` image
//! XObject, so there is no second lossy pass.
//!
//! The whole document is built in memory and written once. Saving goes through
//! a temp file in the destination directory followed by a rename, so a failed
//! run never leaves a truncated PDF at the output path.

use crate::error::Comic2PdfError;
use crate::pipeline::transform::{PageColor, TransformedPage};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, ObjectId, Stream, StringFormat};
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::{debug, info};

/// Resource name of the page image inside each page's `/XObject` dictionary.
const IMAGE_NAME: &[u8] = b"Im0";

/// Receives transformed pages in order and persists them as one document.
///
/// The orchestrator only talks to this trait, so the pipeline can run
/// against an in-memory fake in tests.
pub trait DocumentSink {
    /// Append a page sized to `page.width` × `page.height` showing `page`.
    fn add_page(&mut self, page: &TransformedPage) -> Result<(), Comic2PdfError>;

    /// Pages added so far.
    fn page_count(&self) -> usize;

    /// Write the document to `path`, returning the number of bytes written.
    fn save(self, path: &Path) -> Result<u64, Comic2PdfError>
    where
        Self: Sized;
}

/// Build a document from `pages` and save it to `output`.
///
/// `new_document` is only called once the page list is known to be non-empty.
pub fn assemble<D, F>(
    pages: &[TransformedPage],
    output: &Path,
    new_document: F,
) -> Result<u64, Comic2PdfError>
where
    D: DocumentSink,
    F: FnOnce() -> D,
{
    if pages.is_empty() {
        return Err(Comic2PdfError::EmptyInput {
            path: output.to_path_buf(),
        });
    }

    let mut doc = new_document();
    for page in pages {
        doc.add_page(page)?;
    }
    debug!("Assembled {} pages", doc.page_count());
    doc.save(output)
}

/// [`DocumentSink`] producing a PDF with `lopdf`.
pub struct PdfAssembler {
    doc: Document,
    pages_id: ObjectId,
    kids: Vec<Object>,
}

impl PdfAssembler {
    /// Start an empty PDF whose `/Info` carries `title`.
    pub fn new(title: &str) -> Self {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let info_id = doc.add_object(dictionary! {
            "Title" => text_string(title),
            "Producer" => text_string(concat!("comic2pdf ", env!("CARGO_PKG_VERSION"))),
        });
        doc.trailer.set("Info", info_id);

        Self {
            doc,
            pages_id,
            kids: Vec::new(),
        }
    }

    /// Append a page showing the JPEG `data`, which must be `width`×`height`
    /// pixels with the channel layout given by `color`.
    pub fn add_jpeg_page(
        &mut self,
        data: Vec<u8>,
        width: u32,
        height: u32,
        color: PageColor,
    ) -> lopdf::Result<()> {
        let (w, h) = (width as i64, height as i64);
        let color_space = match color {
            PageColor::Gray => "DeviceGray",
            PageColor::Rgb => "DeviceRGB",
        };

        let image = Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => w,
                "Height" => h,
                "ColorSpace" => color_space,
                "BitsPerComponent" => 8_i64,
                "Filter" => "DCTDecode",
            },
            data,
        )
        .with_compression(false);
        let image_id = self.doc.add_object(image);

        let content = Content {
            operations: vec![
                Operation::new("q", vec![]),
                Operation::new(
                    "cm",
                    vec![w.into(), 0_i64.into(), 0_i64.into(), h.into(), 0_i64.into(), 0_i64.into()],
                ),
                Operation::new("Do", vec![Object::Name(IMAGE_NAME.to_vec())]),
                Operation::new("Q", vec![]),
            ],
        };
        let content_id = self.doc.add_object(Stream::new(dictionary! {}, content.encode()?));

        let mut xobjects = lopdf::Dictionary::new();
        xobjects.set(IMAGE_NAME, image_id);

        let page_id = self.doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => self.pages_id,
            "MediaBox" => vec![0_i64.into(), 0_i64.into(), w.into(), h.into()],
            "Contents" => content_id,
            "Resources" => dictionary! { "XObject" => xobjects },
        });
        self.kids.push(page_id.into());
        Ok(())
    }

    /// Write the page tree and catalog. Called exactly once, by `save`.
    fn finish(&mut self) {
        let pages = dictionary! {
            "Type" => "Pages",
            "Kids" => self.kids.clone(),
            "Count" => self.kids.len() as i64,
        };
        self.doc.objects.insert(self.pages_id, Object::Dictionary(pages));

        let catalog_id = self.doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => self.pages_id,
        });
        self.doc.trailer.set("Root", catalog_id);
        self.doc.compress();
    }
}

impl DocumentSink for PdfAssembler {
    fn add_page(&mut self, page: &TransformedPage) -> Result<(), Comic2PdfError> {
        let data = std::fs::read(&page.path).map_err(|e| Comic2PdfError::DocumentWrite {
            path: page.path.clone(),
            detail: format!("cannot read compressed page: {e}"),
        })?;
        self.add_jpeg_page(data, page.width, page.height, page.color)
            .map_err(|e| Comic2PdfError::DocumentWrite {
                path: page.path.clone(),
                detail: e.to_string(),
            })
    }

    fn page_count(&self) -> usize {
        self.kids.len()
    }

    fn save(mut self, path: &Path) -> Result<u64, Comic2PdfError> {
        let write_err = |detail: String| Comic2PdfError::DocumentWrite {
            path: path.to_path_buf(),
            detail,
        };

        self.finish();

        let parent = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(parent).map_err(|e| write_err(e.to_string()))?;

        let mut tmp = tempfile::Builder::new()
            .prefix(".comic2pdf-")
            .suffix(".pdf.tmp")
            .tempfile_in(parent)
            .map_err(|e| write_err(e.to_string()))?;
        {
            let mut writer = BufWriter::new(tmp.as_file_mut());
            self.doc
                .save_to(&mut writer)
                .map_err(|e| write_err(e.to_string()))?;
            writer.flush().map_err(|e| write_err(e.to_string()))?;
        }
        let len = tmp
            .as_file()
            .metadata()
            .map_err(|e| write_err(e.to_string()))?
            .len();

        tmp.persist(path).map_err(|e| write_err(e.error.to_string()))?;
        info!("Wrote {} pages ({} bytes) to {}", self.kids.len(), len, path.display());
        Ok(len)
    }
}

/// PDF text string: literal for ASCII, UTF-16BE with BOM otherwise.
fn text_string(s: &str) -> Object {
    if s.is_ascii() {
        return Object::string_literal(s);
    }
    let mut bytes = vec![0xFE, 0xFF];
    for unit in s.encode_utf16() {
        bytes.extend_from_slice(&unit.to_be_bytes());
    }
    Object::String(bytes, StringFormat::Hexadecimal)
}
