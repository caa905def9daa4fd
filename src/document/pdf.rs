//! `PageCanvas` that writes a PDF with `lopdf`.
//!
//! Pages are buffered as content operations and only turned into objects in
//! `finish`. Text uses the standard Helvetica fonts, so no font files are
//! embedded.
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream, StringFormat};

use super::assembler::{DecodedImage, PageCanvas};
use super::layout::{Caption, FontWeight, PageGeometry, Rect};
use crate::error::RenderError;

const POINTS_PER_INCH: f64 = 72.0;
const REGULAR_FONT: &str = "F1";
const BOLD_FONT: &str = "F2";

#[derive(Default)]
struct PageContent {
    operations: Vec<Operation>,
    images: Vec<(String, ObjectId)>,
}

pub struct PdfCanvas {
    geometry: PageGeometry,
    doc: Document,
    regular_font: ObjectId,
    bold_font: ObjectId,
    pages: Vec<PageContent>,
}

impl PdfCanvas {
    pub fn new(geometry: PageGeometry) -> Self {
        let mut doc = Document::with_version("1.5");
        let regular_font = doc.add_object(standard_font("Helvetica"));
        let bold_font = doc.add_object(standard_font("Helvetica-Bold"));
        PdfCanvas {
            geometry,
            doc,
            regular_font,
            bold_font,
            pages: vec![PageContent::default()],
        }
    }

    fn page_mut(&mut self, page: usize) -> Result<&mut PageContent, RenderError> {
        self.pages.get_mut(page).ok_or(RenderError::NoPage(page))
    }

    /// PDF user space has its origin at the bottom-left corner.
    fn to_points_y(&self, y_inches: f64) -> f32 {
        ((self.geometry.height - y_inches) * POINTS_PER_INCH) as f32
    }
}

fn standard_font(base: &str) -> Dictionary {
    dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => base,
        "Encoding" => "WinAnsiEncoding",
    }
}

fn pt(inches: f64) -> f32 {
    (inches * POINTS_PER_INCH) as f32
}

fn real(value: f32) -> Object {
    Object::Real(value)
}

impl PageCanvas for PdfCanvas {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn add_page(&mut self) -> usize {
        self.pages.push(PageContent::default());
        self.pages.len() - 1
    }

    fn draw_image(&mut self, page: usize, image: DecodedImage, rect: Rect) -> Result<(), RenderError> {
        let stream = Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => image.width as i64,
                "Height" => image.height as i64,
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => 8_i64,
            },
            image.rgb,
        );
        let image_id = self.doc.add_object(stream);
        let name = format!("Im{}", image_id.0);
        let bottom = self.to_points_y(rect.bottom());
        let content = self.page_mut(page)?;
        content.operations.extend([
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![real(pt(rect.width)), real(0.0), real(0.0), real(pt(rect.height)), real(pt(rect.x)), real(bottom)],
            ),
            Operation::new("Do", vec![Object::Name(name.clone().into_bytes())]),
            Operation::new("Q", vec![]),
        ]);
        content.images.push((name, image_id));
        Ok(())
    }

    fn draw_text(&mut self, page: usize, caption: &Caption) -> Result<(), RenderError> {
        let width = text_width(&caption.text, caption.weight, caption.size_pt);
        let x = pt(caption.center_x) - width / 2.0;
        let y = self.to_points_y(caption.baseline_y);
        let font = match caption.weight {
            FontWeight::Regular => REGULAR_FONT,
            FontWeight::Bold => BOLD_FONT,
        };
        let content = self.page_mut(page)?;
        content.operations.extend([
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec![Object::Name(font.as_bytes().to_vec()), real(caption.size_pt as f32)]),
            Operation::new("Td", vec![real(x), real(y)]),
            Operation::new("Tj", vec![Object::String(win_ansi(&caption.text), StringFormat::Literal)]),
            Operation::new("ET", vec![]),
        ]);
        Ok(())
    }

    fn finish(mut self) -> Result<Vec<u8>, RenderError> {
        let pages_id = self.doc.new_object_id();
        let media_box = vec![
            Object::Integer(0),
            Object::Integer(0),
            real(pt(self.geometry.width)),
            real(pt(self.geometry.height)),
        ];
        let fonts = dictionary! {
            REGULAR_FONT => self.regular_font,
            BOLD_FONT => self.bold_font,
        };

        let mut kids = Vec::with_capacity(self.pages.len());
        for page in std::mem::take(&mut self.pages) {
            let content = Content { operations: page.operations };
            let content_id = self.doc.add_object(Stream::new(dictionary! {}, content.encode()?));
            let mut xobjects = Dictionary::new();
            for (name, id) in page.images {
                xobjects.set(name, id);
            }
            let page_id = self.doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "MediaBox" => media_box.clone(),
                "Contents" => content_id,
                "Resources" => dictionary! {
                    "Font" => fonts.clone(),
                    "XObject" => xobjects,
                },
            });
            kids.push(Object::Reference(page_id));
        }

        let count = kids.len() as i64;
        self.doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
            }),
        );
        let catalog_id = self.doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        self.doc.trailer.set("Root", catalog_id);
        self.doc.compress();

        let mut out = Vec::new();
        self.doc.save_to(&mut out)?;
        Ok(out)
    }
}

/// Latin-1 subset of WinAnsi; anything outside it prints as `?`.
fn win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| if (c as u32) < 0x100 { c as u8 } else { b'?' })
        .collect()
}

/// Width of `text` in points, from the Helvetica metrics.
pub fn text_width(text: &str, weight: FontWeight, size_pt: f64) -> f32 {
    let table = match weight {
        FontWeight::Regular => &HELVETICA_WIDTHS,
        FontWeight::Bold => &HELVETICA_BOLD_WIDTHS,
    };
    let units: u32 = text
        .chars()
        .map(|c| match c as u32 {
            code @ 32..=126 => table[(code - 32) as usize] as u32,
            _ => 556,
        })
        .sum();
    (units as f64 * size_pt / 1000.0) as f32
}

// Glyph widths for ASCII 32..=126 in 1/1000 em.
#[rustfmt::skip]
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556,
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556,
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556,
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,
];

#[rustfmt::skip]
const HELVETICA_BOLD_WIDTHS: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611,
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556,
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611,
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584,
];
