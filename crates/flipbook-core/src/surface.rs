// Drawable surface contract
//
// The player only needs to clear a region and blit an image rectangle.
// Hosts plug in whatever raster target they own.

use std::collections::HashMap;

/// Pixel rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl Rect {
    pub const fn new(x: u32, y: u32, w: u32, h: u32) -> Self {
        Self { x, y, w, h }
    }

    /// Rectangle of the given size anchored at the origin.
    pub const fn at_origin(w: u32, h: u32) -> Self {
        Self { x: 0, y: 0, w, h }
    }
}

/// A loaded, ready-to-draw image.
pub trait FrameImage {
    /// Natural pixel size (width, height).
    fn dimensions(&self) -> (u32, u32);
}

/// A raster target frames are painted onto.
pub trait Surface {
    type Image: FrameImage;

    /// Surface size (width, height) in pixels.
    fn size(&self) -> (u32, u32);

    /// Resets every pixel inside `rect` to transparent.
    fn clear_rect(&mut self, rect: Rect);

    /// Copies the `src` region of `image` onto the `dst` region.
    fn draw_image(&mut self, image: &Self::Image, src: Rect, dst: Rect);
}

/// Clears the whole surface, then draws `image` unscaled at the origin.
pub fn paint_frame<S: Surface>(surface: &mut S, image: &S::Image) {
    let (width, height) = surface.size();
    surface.clear_rect(Rect::at_origin(width, height));
    let (iw, ih) = image.dimensions();
    surface.draw_image(image, Rect::at_origin(iw, ih), Rect::at_origin(iw, ih));
}

/// Resolves a surface identifier to a drawable surface.
pub trait SurfaceLookup<S> {
    fn take_surface(&mut self, id: &str) -> Option<S>;
}

/// Id-keyed surface table for hosts without their own lookup.
#[derive(Debug)]
pub struct SurfaceRegistry<S> {
    surfaces: HashMap<String, S>,
}

impl<S> SurfaceRegistry<S> {
    pub fn new() -> Self {
        Self {
            surfaces: HashMap::new(),
        }
    }

    pub fn register(&mut self, id: impl Into<String>, surface: S) {
        self.surfaces.insert(id.into(), surface);
    }

    pub fn contains(&self, id: &str) -> bool {
        self.surfaces.contains_key(id)
    }
}

impl<S> Default for SurfaceRegistry<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> SurfaceLookup<S> for SurfaceRegistry<S> {
    fn take_surface(&mut self, id: &str) -> Option<S> {
        self.surfaces.remove(id)
    }
}
