use bytes::Bytes;
use folio_core::{FolioError, FolioResult};
use printpdf::image_crate::{self, DynamicImage};
use printpdf::{Image, ImageTransform, Mm, PdfDocument, PdfDocumentReference, PdfLayerIndex, PdfPageIndex};

/// Converts an ordered list of images into one PDF document.
///
/// The staging store treats this as an opaque function with a single failure
/// outcome: any undecodable image, an empty input set, or a failure to
/// produce the output yields [`FolioError::Assembly`].
pub trait DocumentAssembler: Send + Sync {
    /// Produces one PDF titled `title`, with one page per image, pages in
    /// input order.
    fn assemble(&self, title: &str, images: &[Bytes]) -> FolioResult<Vec<u8>>;
}

/// [`DocumentAssembler`] backed by `printpdf`.
///
/// Each image becomes one page sized to the image's pixel dimensions at the
/// configured DPI, so pages keep the aspect ratio of the originals.
pub struct ImagePdfAssembler {
    dpi: f32,
}

impl ImagePdfAssembler {
    /// Creates an assembler rendering at the default 300 DPI.
    pub fn new() -> Self {
        Self { dpi: 300.0 }
    }

    /// Creates an assembler rendering at a custom DPI.
    pub fn with_dpi(dpi: f32) -> Self {
        Self { dpi }
    }

    fn page_size(&self, image: &DynamicImage) -> (Mm, Mm) {
        let width = Mm(image.width() as f32 * 25.4 / self.dpi);
        let height = Mm(image.height() as f32 * 25.4 / self.dpi);
        (width, height)
    }

    fn place(
        &self,
        doc: &PdfDocumentReference,
        page: PdfPageIndex,
        layer: PdfLayerIndex,
        image: DynamicImage,
    ) {
        let transform = ImageTransform {
            dpi: Some(self.dpi),
            ..ImageTransform::default()
        };
        Image::from_dynamic_image(&image).add_to_layer(doc.get_page(page).get_layer(layer), transform);
    }
}

impl Default for ImagePdfAssembler {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentAssembler for ImagePdfAssembler {
    fn assemble(&self, title: &str, images: &[Bytes]) -> FolioResult<Vec<u8>> {
        let mut decoded = Vec::with_capacity(images.len());
        for (index, bytes) in images.iter().enumerate() {
            let image = image_crate::load_from_memory(bytes)
                .map_err(|e| FolioError::Assembly(format!("image {index}: {e}")))?;
            decoded.push(image);
        }

        let mut iter = decoded.into_iter();
        let first = iter
            .next()
            .ok_or_else(|| FolioError::Assembly("no images to assemble".to_string()))?;

        let (width, height) = self.page_size(&first);
        let (doc, page, layer) = PdfDocument::new(title, width, height, "Page 1");
        self.place(&doc, page, layer, first);

        for (index, image) in iter.enumerate() {
            let (width, height) = self.page_size(&image);
            let (page, layer) = doc.add_page(width, height, format!("Page {}", index + 2));
            self.place(&doc, page, layer, image);
        }

        doc.save_to_bytes()
            .map_err(|e| FolioError::Assembly(format!("pdf write: {e}")))
    }
}
