//! White 8-bit grayscale drawing surface with PNG output.

use image::{GrayImage, ImageEncoder, Luma};

use super::font::TextRender;
use crate::error::{ReolkodeError, Result};

const WHITE: Luma<u8> = Luma([255]);
const BLACK: Luma<u8> = Luma([0]);

/// Text coverage at or above this becomes ink; below stays paper.
const INK_THRESHOLD: f32 = 0.5;

pub struct Canvas {
    img: GrayImage,
}

impl Canvas {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            img: GrayImage::from_pixel(width, height, WHITE),
        }
    }

    pub fn width(&self) -> u32 {
        self.img.width()
    }

    pub fn height(&self) -> u32 {
        self.img.height()
    }

    /// Fill a black rectangle. Parts outside the canvas are clipped.
    pub fn fill_rect(&mut self, x: u32, y: u32, width: u32, height: u32) {
        let x_end = x.saturating_add(width).min(self.img.width());
        let y_end = y.saturating_add(height).min(self.img.height());
        for py in y..y_end {
            for px in x..x_end {
                self.img.put_pixel(px, py, BLACK);
            }
        }
    }

    /// Stamp rasterized text with its top-left corner at `(x, y)`.
    pub fn draw_text(&mut self, text: &TextRender, x: u32, y: u32) {
        for ty in 0..text.height {
            for tx in 0..text.width {
                if text.coverage(tx, ty) < INK_THRESHOLD {
                    continue;
                }
                let px = x as usize + tx;
                let py = y as usize + ty;
                if px < self.img.width() as usize && py < self.img.height() as usize {
                    self.img.put_pixel(px as u32, py as u32, BLACK);
                }
            }
        }
    }

    /// Encode as an 8-bit grayscale PNG.
    pub fn to_png(&self) -> Result<Vec<u8>> {
        let mut png_bytes = Vec::new();
        let encoder = image::codecs::png::PngEncoder::new(&mut png_bytes);
        encoder
            .write_image(
                self.img.as_raw(),
                self.img.width(),
                self.img.height(),
                image::ExtendedColorType::L8,
            )
            .map_err(|e: image::ImageError| ReolkodeError::Image(e.to_string()))?;
        Ok(png_bytes)
    }

    pub fn into_image(self) -> GrayImage {
        self.img
    }
}
