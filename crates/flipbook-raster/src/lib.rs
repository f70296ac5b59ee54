// Raster backends for flipbook playback
//
// An RGBA canvas surface plus file and HTTP image loaders, all built on
// the `image` crate.

pub mod source;
pub mod surface;

pub use source::{FileImageLoader, HttpImageLoader, SourceImageLoader, SourceKind, decode_frame};
pub use surface::{RasterFrame, RasterSurface};
