// In-memory RGBA surface
//
// Backs the flipbook surface contract with an `image::RgbaImage`. Draws
// are unscaled pixel copies clipped to both the source image and the
// surface.

use flipbook_core::{FrameImage, Rect, Surface};
use image::{Rgba, RgbaImage};

const TRANSPARENT: Rgba<u8> = Rgba([0, 0, 0, 0]);

/// A decoded frame ready to be copied onto a [`RasterSurface`].
#[derive(Debug, Clone)]
pub struct RasterFrame {
    pixels: RgbaImage,
}

impl RasterFrame {
    pub fn new(pixels: RgbaImage) -> Self {
        Self { pixels }
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }
}

impl FrameImage for RasterFrame {
    fn dimensions(&self) -> (u32, u32) {
        self.pixels.dimensions()
    }
}

/// Fixed-size RGBA canvas.
#[derive(Debug, Clone)]
pub struct RasterSurface {
    pixels: RgbaImage,
}

impl RasterSurface {
    /// Creates a fully transparent surface.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            pixels: RgbaImage::from_pixel(width, height, TRANSPARENT),
        }
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba<u8>> {
        (x < self.pixels.width() && y < self.pixels.height()).then(|| *self.pixels.get_pixel(x, y))
    }
}

impl Surface for RasterSurface {
    type Image = RasterFrame;

    fn size(&self) -> (u32, u32) {
        self.pixels.dimensions()
    }

    fn clear_rect(&mut self, rect: Rect) {
        let x_end = rect.x.saturating_add(rect.w).min(self.pixels.width());
        let y_end = rect.y.saturating_add(rect.h).min(self.pixels.height());
        for y in rect.y..y_end {
            for x in rect.x..x_end {
                self.pixels.put_pixel(x, y, TRANSPARENT);
            }
        }
    }

    fn draw_image(&mut self, image: &RasterFrame, src: Rect, dst: Rect) {
        let (iw, ih) = image.dimensions();
        let (sw, sh) = self.size();
        // No scaling: copy the overlap of both rectangles.
        let w = src
            .w
            .min(dst.w)
            .min(iw.saturating_sub(src.x))
            .min(sw.saturating_sub(dst.x));
        let h = src
            .h
            .min(dst.h)
            .min(ih.saturating_sub(src.y))
            .min(sh.saturating_sub(dst.y));

        for dy in 0..h {
            for dx in 0..w {
                let pixel = *image.pixels.get_pixel(src.x + dx, src.y + dy);
                self.pixels.put_pixel(dst.x + dx, dst.y + dy, pixel);
            }
        }
    }
}
