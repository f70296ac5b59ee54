// Flipbook core
//
// Plays a sequence of still images on a raster surface, frame by frame,
// at a configured rate. Refresh, clock, surface and image loading are
// injected so hosts decide where ticks and pixels come from.

pub mod config;
pub mod error;
pub mod loader;
pub mod player;
pub mod refresh;
pub mod scheduler;
pub mod sink;
pub mod surface;
pub mod time;

pub use config::{FlipbookOptions, PlaybackConfig};
pub use error::{AssetErrorKind, AssetLoadError, ConfigError, FlipbookError, RefreshError};
pub use loader::{FrameSet, ImageLoader, load_frames};
pub use player::{Flipbook, Phase};
pub use refresh::{
    ManualRefresh, RefreshCandidate, RefreshScheduler, TimerRefresh, default_refresh, select_refresh,
};
pub use scheduler::{FrameScheduler, TickOutcome};
pub use sink::{ErrorSink, LogErrorSink};
pub use surface::{FrameImage, Rect, Surface, SurfaceLookup, SurfaceRegistry};
pub use time::{Clock, ManualClock, SystemClock, refresh_period_ms};
