// Playback configuration
//
// `FlipbookOptions` is the loose, user-facing option set. `PlaybackConfig`
// is the validated value the scheduler runs from.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const DEFAULT_FPS: f64 = 30.0;

/// Recognised flipbook options. Every field is optional; missing fields
/// take their defaults in [`PlaybackConfig::from_options`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FlipbookOptions {
    pub fps: Option<f64>,
    pub first_frame: Option<usize>,
    /// Exclusive end index.
    pub last_frame: Option<usize>,
    pub images: Option<Vec<String>>,
    #[serde(rename = "loop")]
    pub looping: Option<bool>,
}

impl FlipbookOptions {
    pub fn with_images<I, S>(images: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            images: Some(images.into_iter().map(Into::into).collect()),
            ..Default::default()
        }
    }

    pub fn fps(mut self, fps: f64) -> Self {
        self.fps = Some(fps);
        self
    }

    pub fn first_frame(mut self, first: usize) -> Self {
        self.first_frame = Some(first);
        self
    }

    pub fn last_frame(mut self, last: usize) -> Self {
        self.last_frame = Some(last);
        self
    }

    pub fn looping(mut self, looping: bool) -> Self {
        self.looping = Some(looping);
        self
    }
}

/// Immutable playback configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackConfig {
    target_fps: f64,
    first_frame: usize,
    last_frame: usize,
    looping: bool,
    image_sources: Vec<String>,
}

impl PlaybackConfig {
    /// Merges `options` over the defaults and validates the result.
    ///
    /// An empty image list with default bounds is accepted: playback then
    /// has nothing to paint.
    pub fn from_options(options: FlipbookOptions) -> Result<Self, ConfigError> {
        let image_sources = options.images.unwrap_or_default();
        let target_fps = options.fps.unwrap_or(DEFAULT_FPS);
        let first_frame = options.first_frame.unwrap_or(0);
        let last_frame = options.last_frame.unwrap_or(image_sources.len());

        if !target_fps.is_finite() || target_fps <= 0.0 {
            return Err(ConfigError::InvalidFps(target_fps));
        }
        if last_frame > image_sources.len() {
            return Err(ConfigError::LastFrameOutOfBounds {
                last: last_frame,
                count: image_sources.len(),
            });
        }
        let empty_sequence = image_sources.is_empty() && first_frame == 0 && last_frame == 0;
        if first_frame >= last_frame && !empty_sequence {
            return Err(ConfigError::EmptyRange {
                first: first_frame,
                last: last_frame,
            });
        }

        Ok(Self {
            target_fps,
            first_frame,
            last_frame,
            looping: options.looping.unwrap_or(false),
            image_sources,
        })
    }

    /// Parses camelCase JSON options (`{"fps": 12, "images": [...], "loop": true}`).
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let options: FlipbookOptions =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        Self::from_options(options)
    }

    pub fn target_fps(&self) -> f64 {
        self.target_fps
    }

    /// Milliseconds each frame stays visible.
    pub fn frame_interval_ms(&self) -> f64 {
        1000.0 / self.target_fps
    }

    pub fn first_frame(&self) -> usize {
        self.first_frame
    }

    pub fn last_frame(&self) -> usize {
        self.last_frame
    }

    pub fn looping(&self) -> bool {
        self.looping
    }

    pub fn image_sources(&self) -> &[String] {
        &self.image_sources
    }

    /// True when the playable range contains no frames.
    pub fn is_empty(&self) -> bool {
        self.first_frame >= self.last_frame
    }
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            target_fps: DEFAULT_FPS,
            first_frame: 0,
            last_frame: 0,
            looping: false,
            image_sources: Vec::new(),
        }
    }
}
