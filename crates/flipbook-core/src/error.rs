// Flipbook error taxonomy
//
// Configuration problems are caught at construction. Asset failures carry
// the source that broke the batch.

use thiserror::Error;

/// Invalid playback configuration.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("fps must be a positive finite number, got {0}")]
    InvalidFps(f64),

    #[error("first frame {first} must be below last frame {last}")]
    EmptyRange { first: usize, last: usize },

    #[error("last frame {last} exceeds image count {count}")]
    LastFrameOutOfBounds { last: usize, count: usize },

    #[error("failed to parse flipbook options: {0}")]
    Parse(String),
}

/// Why a single image source could not be resolved.
#[derive(Debug, Error)]
pub enum AssetErrorKind {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("decode error: {0}")]
    Decode(String),

    #[error("unsupported source: {0}")]
    Unsupported(String),
}

/// A single image source failed, which fails the whole batch.
#[derive(Debug, Error)]
#[error("failed to load image #{index} ({source_id}): {kind}")]
pub struct AssetLoadError {
    /// Position of the failing source in the configured sequence.
    pub index: usize,
    pub source_id: String,
    #[source]
    pub kind: AssetErrorKind,
}

impl AssetLoadError {
    pub fn new(index: usize, source_id: impl Into<String>, kind: AssetErrorKind) -> Self {
        Self {
            index,
            source_id: source_id.into(),
            kind,
        }
    }
}

/// A refresh source could not schedule the next tick.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RefreshError {
    #[error("no tokio runtime is available to drive the refresh timer")]
    NoRuntime,
}

/// Errors surfaced by [`crate::player::Flipbook`].
#[derive(Debug, Error)]
pub enum FlipbookError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    AssetLoad(#[from] AssetLoadError),

    #[error(transparent)]
    Refresh(#[from] RefreshError),

    #[error("surface not found: {0}")]
    SurfaceNotFound(String),

    #[error("playback already started")]
    AlreadyStarted,
}
