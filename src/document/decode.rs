//! `RasterDecoder` backed by the `image` crate.
use async_trait::async_trait;

use super::assembler::{DecodedImage, RasterDecoder};
use crate::error::RenderError;
use crate::generation::GeneratedImage;

/// Decodes on the blocking pool and flattens transparency onto white paper.
#[derive(Debug, Clone, Copy, Default)]
pub struct PixelDecoder;

#[async_trait]
impl RasterDecoder for PixelDecoder {
    async fn decode(&self, image: &GeneratedImage) -> Result<DecodedImage, RenderError> {
        let bytes = image.decode_bytes()?;
        tokio::task::spawn_blocking(move || decode_bytes(&bytes)).await?
    }
}

pub fn decode_bytes(bytes: &[u8]) -> Result<DecodedImage, RenderError> {
    let rgba = image::load_from_memory(bytes)?.to_rgba8();
    let (width, height) = rgba.dimensions();
    let mut rgb = Vec::with_capacity(width as usize * height as usize * 3);
    for pixel in rgba.pixels() {
        let [r, g, b, a] = pixel.0;
        let alpha = a as u32;
        for channel in [r, g, b] {
            rgb.push(((channel as u32 * alpha + 255 * (255 - alpha)) / 255) as u8);
        }
    }
    Ok(DecodedImage { width, height, rgb })
}

#[cfg(test)]
pub(crate) mod testing {
    use image::{ImageFormat, Rgba, RgbaImage};
    use std::io::Cursor;

    /// PNG bytes of a `width` × `height` image filled with `color`.
    pub fn png(width: u32, height: u32, color: [u8; 4]) -> Vec<u8> {
        let img = RgbaImage::from_pixel(width, height, Rgba(color));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Png).unwrap();
        out.into_inner()
    }

    /// PNG bytes of pseudo-random pixels, which barely compress.
    pub fn noise_png(width: u32, height: u32, seed: u32) -> Vec<u8> {
        let mut state = seed | 1;
        let img = RgbaImage::from_fn(width, height, |_, _| {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            let [r, g, b, _] = state.to_le_bytes();
            Rgba([r, g, b, 255])
        });
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Png).unwrap();
        out.into_inner()
    }
}

#[cfg(test)]
mod tests {
    use super::testing::png;
    use super::*;

    #[tokio::test]
    async fn decodes_dimensions_from_png() {
        let image = GeneratedImage::from_bytes(&png(40, 30, [0, 0, 0, 255]), "image/png");
        let decoded = PixelDecoder.decode(&image).await.unwrap();
        assert_eq!((decoded.width, decoded.height), (40, 30));
        assert_eq!(decoded.rgb.len(), 40 * 30 * 3);
        assert!(decoded.rgb.iter().all(|&c| c == 0));
    }

    #[test]
    fn transparent_pixels_become_white() {
        let decoded = decode_bytes(&png(2, 2, [0, 0, 0, 0])).unwrap();
        assert!(decoded.rgb.iter().all(|&c| c == 255));
    }

    #[tokio::test]
    async fn garbage_is_an_image_error() {
        let image = GeneratedImage::from_bytes(b"not a png", "image/png");
        let err = PixelDecoder.decode(&image).await.unwrap_err();
        assert!(matches!(err, RenderError::Image(_)));
    }

    #[tokio::test]
    async fn bad_base64_is_reported() {
        let image = GeneratedImage::new("***", "image/png");
        let err = PixelDecoder.decode(&image).await.unwrap_err();
        assert!(matches!(err, RenderError::Base64(_)));
    }
}
