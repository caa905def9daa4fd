//! Page geometry and image placement, in inches with the origin at the
//! top-left corner of the page.

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    pub width: f64,
    pub height: f64,
    pub margin: f64,
}

/// US letter, portrait, half-inch margins on every side.
pub const LETTER_PORTRAIT: PageGeometry = PageGeometry { width: 8.5, height: 11.0, margin: 0.5 };

impl PageGeometry {
    pub fn printable_width(&self) -> f64 {
        self.width - self.margin * 2.0
    }

    pub fn printable_height(&self) -> f64 {
        self.height - self.margin * 2.0
    }

    pub fn printable_ratio(&self) -> f64 {
        self.printable_width() / self.printable_height()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageRole {
    Cover,
    Interior,
}

/// Largest box of the image's aspect ratio that fits in `max_width` × `max_height`.
///
/// Wider-than-box images are clamped on width; everything else, including an
/// exact ratio match, is clamped on height.
pub fn fit_within(image_width: u32, image_height: u32, max_width: f64, max_height: f64) -> Size {
    let ratio = image_width as f64 / image_height as f64;
    if ratio > max_width / max_height {
        Size { width: max_width, height: max_width / ratio }
    } else {
        Size { width: max_height * ratio, height: max_height }
    }
}

/// Where an image of the given pixel size lands on a page.
///
/// Always horizontally centered. The cover is vertically centered; interior
/// pages sit flush against the top margin.
pub fn place_image(geometry: &PageGeometry, role: PageRole, image_width: u32, image_height: u32) -> Rect {
    let size = fit_within(
        image_width,
        image_height,
        geometry.printable_width(),
        geometry.printable_height(),
    );
    let x = (geometry.width - size.width) / 2.0;
    let y = match role {
        PageRole::Cover => (geometry.height - size.height) / 2.0,
        PageRole::Interior => geometry.margin,
    };
    Rect { x, y, width: size.width, height: size.height }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontWeight {
    Regular,
    Bold,
}

pub const TITLE_FONT_SIZE: f64 = 24.0;
pub const DEDICATION_FONT_SIZE: f64 = 18.0;
/// Baseline offsets below the cover image.
pub const TITLE_OFFSET: f64 = 0.5;
pub const DEDICATION_OFFSET: f64 = 0.8;

/// One line of horizontally centered text.
#[derive(Debug, Clone, PartialEq)]
pub struct Caption {
    pub text: String,
    pub weight: FontWeight,
    pub size_pt: f64,
    pub center_x: f64,
    pub baseline_y: f64,
}

pub fn dedication(recipient_name: &str) -> String {
    format!("Specially made for {}!", recipient_name)
}

/// Title and dedication lines rendered under the cover image.
pub fn cover_captions(geometry: &PageGeometry, image: &Rect, title: &str, recipient_name: &str) -> [Caption; 2] {
    let center_x = geometry.width / 2.0;
    [
        Caption {
            text: title.to_string(),
            weight: FontWeight::Bold,
            size_pt: TITLE_FONT_SIZE,
            center_x,
            baseline_y: image.bottom() + TITLE_OFFSET,
        },
        Caption {
            text: dedication(recipient_name),
            weight: FontWeight::Regular,
            size_pt: DEDICATION_FONT_SIZE,
            center_x,
            baseline_y: image.bottom() + DEDICATION_OFFSET,
        },
    ]
}
