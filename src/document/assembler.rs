//! Assembles generated images into a paginated coloring book.
//!
//! Every image is decoded concurrently; the document is only finished after
//! the whole set of decodes has settled and each image has been placed on
//! its page.
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use futures::future::try_join_all;

use super::layout::{cover_captions, place_image, Caption, PageGeometry, PageRole, Rect};
use crate::error::{AppResult, RenderError};
use crate::generation::GeneratedImage;

/// Pixels of a decoded image, flattened to 8-bit RGB.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    pub rgb: Vec<u8>,
}

#[async_trait]
pub trait RasterDecoder: Send + Sync {
    /// Decode an encoded image. Its dimensions are unknown until this resolves.
    async fn decode(&self, image: &GeneratedImage) -> Result<DecodedImage, RenderError>;
}

/// Drawing surface for a multi-page document. Coordinates are inches from the
/// top-left corner of the page.
pub trait PageCanvas {
    /// Number of open pages. A fresh canvas starts with one page.
    fn page_count(&self) -> usize;

    /// Open another page and return its index.
    fn add_page(&mut self) -> usize;

    /// Place `image` on `page`. The canvas takes ownership of the pixels.
    fn draw_image(&mut self, page: usize, image: DecodedImage, rect: Rect) -> Result<(), RenderError>;

    fn draw_text(&mut self, page: usize, caption: &Caption) -> Result<(), RenderError>;

    /// Finalize and serialize the document.
    fn finish(self) -> Result<Vec<u8>, RenderError>;
}

struct Placement {
    page: usize,
    role: PageRole,
    rect: Rect,
    image: DecodedImage,
}

/// Lay out `cover` and `pages` and return the finished document.
///
/// The canvas is only opened once every decode has settled. The cover uses
/// its first page; every page image opens one more page, in order.
pub async fn build_document<D, C, F>(
    decoder: &D,
    geometry: PageGeometry,
    open_canvas: F,
    cover: &GeneratedImage,
    pages: &[GeneratedImage],
    title: &str,
    recipient_name: &str,
) -> AppResult<Vec<u8>>
where
    D: RasterDecoder + ?Sized,
    C: PageCanvas,
    F: FnOnce(PageGeometry) -> C,
{
    let slots = std::iter::once((0usize, PageRole::Cover, cover))
        .chain(pages.iter().enumerate().map(|(i, page)| (i + 1, PageRole::Interior, page)));
    tracing::info!(pages = pages.len() + 1, "assembling coloring book \"{}\"", title);

    let placements = try_join_all(slots.map(move |(page, role, encoded)| async move {
        let image = decoder.decode(encoded).await?;
        let rect = place_image(&geometry, role, image.width, image.height);
        tracing::debug!(page, width = image.width, height = image.height, "image decoded");
        Ok::<_, RenderError>(Placement { page, role, rect, image })
    }))
    .await?;

    let mut canvas = open_canvas(geometry);
    if canvas.page_count() == 0 {
        canvas.add_page();
    }
    for Placement { page, role, rect, image } in placements {
        while canvas.page_count() <= page {
            canvas.add_page();
        }
        canvas.draw_image(page, image, rect)?;
        if role == PageRole::Cover {
            for caption in cover_captions(&geometry, &rect, title, recipient_name).iter() {
                canvas.draw_text(page, caption)?;
            }
        }
    }

    let bytes = canvas.finish()?;
    tracing::info!(bytes = bytes.len(), "coloring book assembled");
    Ok(bytes)
}

/// `{name}_{title}_Coloring_Book.pdf`, with every whitespace run in the title
/// turned into one underscore.
pub fn document_file_name(recipient_name: &str, title: &str) -> String {
    let name: String = recipient_name
        .chars()
        .map(|c| if c == '/' || c == '\\' { '_' } else { c })
        .collect();
    format!("{}_{}_Coloring_Book.pdf", name, collapse_whitespace(title))
}

fn collapse_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_run = false;
    for c in text.chars() {
        if c.is_whitespace() {
            if !in_run {
                out.push('_');
            }
            in_run = true;
        } else if c == '/' || c == '\\' {
            out.push('_');
            in_run = false;
        } else {
            out.push(c);
            in_run = false;
        }
    }
    out
}

pub async fn save_document(dir: &Path, file_name: &str, bytes: &[u8]) -> AppResult<PathBuf> {
    tokio::fs::create_dir_all(dir).await.map_err(RenderError::from)?;
    let path = dir.join(file_name);
    tokio::fs::write(&path, bytes).await.map_err(RenderError::from)?;
    tracing::info!("Saved {} ({} bytes)", path.display(), bytes.len());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::layout::{FontWeight, LETTER_PORTRAIT};
    use crate::error::{AppError, ErrorKind};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    #[derive(Debug, Clone, PartialEq)]
    enum Event {
        Open,
        AddPage(usize),
        Decoded(String),
        Image { page: usize, rect: Rect },
        Text { page: usize, text: String, weight: FontWeight },
        Finish,
    }

    type Log = Arc<Mutex<Vec<Event>>>;

    /// Images carry their "size" as `WIDTHxHEIGHT:DELAY_MS` in the data field.
    struct SlowDecoder {
        log: Log,
    }

    #[async_trait]
    impl RasterDecoder for SlowDecoder {
        async fn decode(&self, image: &GeneratedImage) -> Result<DecodedImage, RenderError> {
            let (dims, delay) = image.data.split_once(':').unwrap();
            let (w, h) = dims.split_once('x').unwrap();
            tokio::time::sleep(Duration::from_millis(delay.parse().unwrap())).await;
            if w == "0" {
                return Err(RenderError::NoPage(99));
            }
            self.log.lock().unwrap().push(Event::Decoded(image.data.clone()));
            Ok(DecodedImage { width: w.parse().unwrap(), height: h.parse().unwrap(), rgb: Vec::new() })
        }
    }

    struct RecordingCanvas {
        log: Log,
        pages: usize,
    }

    impl PageCanvas for RecordingCanvas {
        fn page_count(&self) -> usize {
            self.pages
        }

        fn add_page(&mut self) -> usize {
            self.pages += 1;
            self.log.lock().unwrap().push(Event::AddPage(self.pages - 1));
            self.pages - 1
        }

        fn draw_image(&mut self, page: usize, _image: DecodedImage, rect: Rect) -> Result<(), RenderError> {
            self.log.lock().unwrap().push(Event::Image { page, rect });
            Ok(())
        }

        fn draw_text(&mut self, page: usize, caption: &Caption) -> Result<(), RenderError> {
            self.log.lock().unwrap().push(Event::Text {
                page,
                text: caption.text.clone(),
                weight: caption.weight,
            });
            Ok(())
        }

        fn finish(self) -> Result<Vec<u8>, RenderError> {
            self.log.lock().unwrap().push(Event::Finish);
            Ok(b"%PDF-fake".to_vec())
        }
    }

    fn canvas(log: &Log) -> impl FnOnce(PageGeometry) -> RecordingCanvas {
        let log = log.clone();
        move |_| {
            log.lock().unwrap().push(Event::Open);
            RecordingCanvas { log, pages: 1 }
        }
    }

    fn img(spec: &str) -> GeneratedImage {
        GeneratedImage::new(spec, "image/png")
    }

    #[tokio::test]
    async fn finishes_only_after_every_slow_decode() {
        let log: Log = Arc::default();
        let decoder = SlowDecoder { log: log.clone() };
        let canvas = canvas(&log);
        let cover = img("1024x1024:80");
        let pages = vec![img("500x1000:60"), img("1600x900:5"), img("800x800:30")];

        let bytes = build_document(&decoder, LETTER_PORTRAIT, canvas, &cover, &pages, "Space Dinosaurs Adventures", "Alex")
            .await
            .unwrap();
        assert_eq!(bytes, b"%PDF-fake");

        let events = log.lock().unwrap().clone();
        assert_eq!(events.last(), Some(&Event::Finish));
        let decoded: Vec<&Event> = events.iter().filter(|e| matches!(e, Event::Decoded(_))).collect();
        assert_eq!(decoded.len(), 4);
        // Decodes finished out of order; fastest first.
        assert_eq!(decoded[0], &Event::Decoded("1600x900:5".into()));

        let last_decode = events.iter().rposition(|e| matches!(e, Event::Decoded(_))).unwrap();
        let opened = events.iter().position(|e| e == &Event::Open).unwrap();
        assert!(last_decode < opened);
        assert_eq!(
            events.iter().filter(|e| matches!(e, Event::AddPage(_))).count(),
            3
        );

        let image_pages: Vec<usize> = events
            .iter()
            .filter_map(|e| match e {
                Event::Image { page, .. } => Some(*page),
                _ => None,
            })
            .collect();
        assert_eq!(image_pages, vec![0, 1, 2, 3]);
    }

    #[tokio::test]
    async fn cover_gets_title_and_dedication_only() {
        let log: Log = Arc::default();
        let decoder = SlowDecoder { log: log.clone() };
        let canvas = canvas(&log);
        build_document(&decoder, LETTER_PORTRAIT, canvas, &img("1024x1024:0"), &[img("1024x1024:0")], "Ocean Adventures", "Mia")
            .await
            .unwrap();

        let events = log.lock().unwrap().clone();
        let texts: Vec<&Event> = events.iter().filter(|e| matches!(e, Event::Text { .. })).collect();
        assert_eq!(
            texts,
            vec![
                &Event::Text { page: 0, text: "Ocean Adventures".into(), weight: FontWeight::Bold },
                &Event::Text { page: 0, text: "Specially made for Mia!".into(), weight: FontWeight::Regular },
            ]
        );
        assert!(events.contains(&Event::Image {
            page: 1,
            rect: Rect { x: 0.5, y: 0.5, width: 7.5, height: 7.5 }
        }));
    }

    #[tokio::test]
    async fn decode_failure_never_finishes() {
        let log: Log = Arc::default();
        let decoder = SlowDecoder { log: log.clone() };
        let canvas = canvas(&log);
        let err = build_document(&decoder, LETTER_PORTRAIT, canvas, &img("1024x1024:0"), &[img("0x0:10")], "T", "N")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Assembly);
        assert!(matches!(err, AppError::Assembly(_)));
        let events = log.lock().unwrap().clone();
        assert!(!events.contains(&Event::Open));
        assert!(!events.contains(&Event::Finish));
    }

    #[test]
    fn file_name_replaces_whitespace_runs() {
        assert_eq!(
            document_file_name("Alex", "Space Dinosaurs Adventures"),
            "Alex_Space_Dinosaurs_Adventures_Coloring_Book.pdf"
        );
        assert_eq!(
            document_file_name("Lily", "Enchanted \t Forest  Adventures"),
            "Lily_Enchanted_Forest_Adventures_Coloring_Book.pdf"
        );
    }

    #[test]
    fn file_name_cannot_escape_directory() {
        assert_eq!(document_file_name("../x", "a/b"), ".._x_a_b_Coloring_Book.pdf");
    }

    #[tokio::test]
    async fn save_writes_into_directory() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("nested");
        let path = save_document(&target, "Alex_Book_Coloring_Book.pdf", b"%PDF").await.unwrap();
        assert_eq!(path, target.join("Alex_Book_Coloring_Book.pdf"));
        assert_eq!(std::fs::read(path).unwrap(), b"%PDF");
    }
}
