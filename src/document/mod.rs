//! Paginated coloring-book documents.
//!
//! - `layout`: page geometry, aspect-ratio fitting and cover captions.
//! - `assembler`: the async decode/place/finish pipeline over `PageCanvas`.
//! - `pdf`: the `lopdf` canvas.
//! - `decode`: the `image`-crate decoder.
pub mod assembler;
pub mod decode;
pub mod layout;
pub mod pdf;

pub use assembler::{build_document, document_file_name, save_document, DecodedImage, PageCanvas, RasterDecoder};
pub use decode::PixelDecoder;
pub use layout::{PageGeometry, LETTER_PORTRAIT};
pub use pdf::PdfCanvas;

use crate::error::AppResult;
use crate::generation::GeneratedImage;

/// Build a US-letter PDF for the given images.
pub async fn assemble_pdf<D>(
    decoder: &D,
    cover: &GeneratedImage,
    pages: &[GeneratedImage],
    title: &str,
    recipient_name: &str,
) -> AppResult<Vec<u8>>
where
    D: RasterDecoder + ?Sized,
{
    build_document(decoder, LETTER_PORTRAIT, PdfCanvas::new, cover, pages, title, recipient_name).await
}

#[cfg(test)]
mod tests {
    use super::decode::testing::png;
    use super::*;

    #[tokio::test]
    async fn cover_and_pages_become_pdf_pages() {
        let cover = GeneratedImage::from_bytes(&png(64, 64, [0, 0, 0, 255]), "image/png");
        let pages = vec![
            GeneratedImage::from_bytes(&png(32, 64, [255, 255, 255, 255]), "image/png"),
            GeneratedImage::from_bytes(&png(64, 32, [10, 10, 10, 255]), "image/png"),
        ];
        let bytes = assemble_pdf(&PixelDecoder, &cover, &pages, "Space Dinosaurs Adventures", "Alex")
            .await
            .unwrap();
        let doc = lopdf::Document::load_mem(&bytes).unwrap();
        assert_eq!(doc.get_pages().len(), 3);
    }
}
