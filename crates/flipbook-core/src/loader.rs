// Asset loader
//
// Resolves every configured image source concurrently. The batch is
// all-or-nothing: the first failure fails the whole load and the other
// in-flight loads are dropped.

use futures_util::future::{LocalBoxFuture, try_join_all};
use log::{debug, info};

use crate::error::{AssetErrorKind, AssetLoadError};

/// Resolves a single source identifier into a drawable image.
pub trait ImageLoader {
    type Image;

    fn load<'a>(&'a self, source: &'a str) -> LocalBoxFuture<'a, Result<Self::Image, AssetErrorKind>>;
}

/// Loaded images, index-aligned with the configured sources.
#[derive(Debug, Clone)]
pub struct FrameSet<I> {
    images: Vec<I>,
}

impl<I> FrameSet<I> {
    pub fn new(images: Vec<I>) -> Self {
        Self { images }
    }

    pub fn get(&self, index: usize) -> Option<&I> {
        self.images.get(index)
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &I> {
        self.images.iter()
    }
}

impl<I> Default for FrameSet<I> {
    fn default() -> Self {
        Self { images: Vec::new() }
    }
}

/// Loads all `sources` concurrently, preserving their order.
///
/// An empty source list resolves immediately to an empty set.
pub async fn load_frames<L>(loader: &L, sources: &[String]) -> Result<FrameSet<L::Image>, AssetLoadError>
where
    L: ImageLoader + ?Sized,
{
    if sources.is_empty() {
        debug!("no image sources configured");
        return Ok(FrameSet::default());
    }

    let pending = sources.iter().enumerate().map(|(index, source)| async move {
        loader
            .load(source)
            .await
            .map_err(|kind| AssetLoadError::new(index, source.as_str(), kind))
    });
    let images = try_join_all(pending).await?;

    info!("loaded {} flipbook frames", images.len());
    Ok(FrameSet::new(images))
}
