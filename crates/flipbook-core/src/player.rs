// Flipbook player
//
// Ties the pieces together: loads the frame set, then keeps a tick
// registered with the refresh source, feeding each refresh through the
// frame scheduler and painting whatever it selects.

use std::sync::{Arc, Mutex, Weak};

use log::{debug, warn};

use crate::config::{FlipbookOptions, PlaybackConfig};
use crate::error::{FlipbookError, RefreshError};
use crate::loader::{FrameSet, ImageLoader, load_frames};
use crate::refresh::{RefreshHandle, RefreshScheduler, default_refresh, lock};
use crate::scheduler::{FrameScheduler, TickOutcome};
use crate::sink::{ErrorSink, LogErrorSink};
use crate::surface::{Surface, SurfaceLookup, paint_frame};
use crate::time::{Clock, SystemClock};

/// Player lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Uninitialized,
    Loading,
    Playing,
    /// Non-looping playback painted its last frame.
    Finished,
    /// Halted by [`Flipbook::stop`]; `start` loads again.
    Stopped,
}

struct Playback<S: Surface> {
    surface: S,
    frames: FrameSet<S::Image>,
    scheduler: Option<FrameScheduler>,
    phase: Phase,
    pending: Option<RefreshHandle>,
    /// Bumped by every `start` and `stop`. Loads and ticks carry the value
    /// they were issued under and are ignored once it moves on.
    generation: u64,
}

/// Collaborators a tick needs, cloned into every registration.
#[derive(Clone)]
struct TickContext {
    refresh: Arc<dyn RefreshScheduler>,
    clock: Arc<dyn Clock>,
    errors: Arc<dyn ErrorSink>,
}

/// Frame-by-frame image sequence player bound to one surface.
pub struct Flipbook<S: Surface, L> {
    config: PlaybackConfig,
    loader: L,
    ctx: TickContext,
    state: Arc<Mutex<Playback<S>>>,
}

impl<S, L> Flipbook<S, L>
where
    S: Surface + Send + 'static,
    S::Image: Send,
    L: ImageLoader<Image = S::Image>,
{
    /// Creates a player with the default refresh source, the system clock
    /// and a logging error sink. The default refresh is a timer on the
    /// current tokio runtime; hosts with their own refresh signal pass it
    /// via `with_refresh`.
    pub fn new(surface: S, options: FlipbookOptions, loader: L) -> Result<Self, FlipbookError> {
        let config = PlaybackConfig::from_options(options)?;
        Ok(Self {
            config,
            loader,
            ctx: TickContext {
                refresh: default_refresh(),
                clock: Arc::new(SystemClock::new()),
                errors: Arc::new(LogErrorSink),
            },
            state: Arc::new(Mutex::new(Playback {
                surface,
                frames: FrameSet::default(),
                scheduler: None,
                phase: Phase::Uninitialized,
                pending: None,
                generation: 0,
            })),
        })
    }

    /// Resolves `surface_id` through `lookup`, then behaves like [`Flipbook::new`].
    pub fn from_lookup<K>(
        lookup: &mut K,
        surface_id: &str,
        options: FlipbookOptions,
        loader: L,
    ) -> Result<Self, FlipbookError>
    where
        K: SurfaceLookup<S> + ?Sized,
    {
        let surface = lookup
            .take_surface(surface_id)
            .ok_or_else(|| FlipbookError::SurfaceNotFound(surface_id.to_string()))?;
        Self::new(surface, options, loader)
    }

    pub fn with_refresh(mut self, refresh: Arc<dyn RefreshScheduler>) -> Self {
        self.ctx.refresh = refresh;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.ctx.clock = clock;
        self
    }

    pub fn with_error_sink(mut self, errors: Arc<dyn ErrorSink>) -> Self {
        self.ctx.errors = errors;
        self
    }

    /// Loads every frame, then starts the refresh loop.
    ///
    /// A load failure is reported to the error sink exactly once, returned,
    /// and leaves the player `Uninitialized`; nothing is painted. So does a
    /// refresh source that cannot schedule the first tick.
    ///
    /// If `stop` (and possibly another `start`) happens while this call is
    /// loading, its result is discarded: the phase is left alone and nothing
    /// is reported.
    pub async fn start(&self) -> Result<(), FlipbookError> {
        let generation = {
            let mut state = lock(&self.state);
            let phase = state.phase;
            match phase {
                Phase::Uninitialized | Phase::Stopped => {
                    state.phase = Phase::Loading;
                    state.generation += 1;
                    state.generation
                }
                phase => {
                    warn!("flipbook start ignored in phase {:?}", phase);
                    return Err(FlipbookError::AlreadyStarted);
                }
            }
        };

        let loaded = load_frames(&self.loader, self.config.image_sources()).await;

        let mut state = lock(&self.state);
        if state.generation != generation {
            debug!("flipbook load superseded by stop");
            return loaded.map(drop).map_err(FlipbookError::from);
        }

        let frames = match loaded {
            Ok(frames) => frames,
            Err(err) => {
                state.phase = Phase::Uninitialized;
                drop(state);
                let err = FlipbookError::from(err);
                self.ctx.errors.report(&err);
                return Err(err);
            }
        };

        state.frames = frames;
        state.scheduler = Some(FrameScheduler::begin(&self.config, self.ctx.clock.now_ms()));
        state.phase = Phase::Playing;
        if let Err(err) = request_tick(&self.state, &mut state, &self.ctx) {
            state.phase = Phase::Uninitialized;
            state.scheduler = None;
            state.frames = FrameSet::default();
            drop(state);
            let err = FlipbookError::from(err);
            self.ctx.errors.report(&err);
            return Err(err);
        }
        debug!(
            "flipbook playing frames {}..{} at {} fps",
            self.config.first_frame(),
            self.config.last_frame(),
            self.config.target_fps()
        );
        Ok(())
    }

    /// Cancels the pending refresh registration and halts playback.
    pub fn stop(&self) {
        let mut state = lock(&self.state);
        state.generation += 1;
        if let Some(handle) = state.pending.take() {
            self.ctx.refresh.cancel_refresh(handle);
        }
        if matches!(state.phase, Phase::Loading | Phase::Playing | Phase::Finished) {
            debug!("flipbook stopped in phase {:?}", state.phase);
            state.phase = Phase::Stopped;
        }
    }

    /// Freezes playback. Ticks keep arriving but do nothing.
    pub fn pause(&self) {
        match lock(&self.state).scheduler.as_mut() {
            Some(scheduler) => scheduler.pause(),
            None => warn!("flipbook pause ignored before playback"),
        }
    }

    /// Clears the pause flag. If the pause outlasted a frame interval the
    /// next tick advances immediately.
    pub fn resume(&self) {
        match lock(&self.state).scheduler.as_mut() {
            Some(scheduler) => scheduler.resume(),
            None => warn!("flipbook resume ignored before playback"),
        }
    }
}

impl<S: Surface, L> Flipbook<S, L> {
    pub fn config(&self) -> &PlaybackConfig {
        &self.config
    }

    pub fn phase(&self) -> Phase {
        lock(&self.state).phase
    }

    pub fn is_paused(&self) -> bool {
        lock(&self.state)
            .scheduler
            .as_ref()
            .is_some_and(FrameScheduler::is_paused)
    }

    /// Index of the next frame to paint, once playback has begun.
    pub fn current_frame(&self) -> Option<usize> {
        lock(&self.state)
            .scheduler
            .as_ref()
            .map(FrameScheduler::current_frame)
    }

    /// Index of the frame currently on the surface.
    pub fn visible_frame(&self) -> Option<usize> {
        lock(&self.state)
            .scheduler
            .as_ref()
            .and_then(FrameScheduler::last_painted)
    }

    pub fn frame_count(&self) -> usize {
        lock(&self.state).frames.len()
    }

    /// True while a refresh registration is outstanding.
    pub fn has_pending_tick(&self) -> bool {
        lock(&self.state).pending.is_some()
    }

    /// Runs `f` against the surface.
    pub fn with_surface<R>(&self, f: impl FnOnce(&S) -> R) -> R {
        f(&lock(&self.state).surface)
    }
}

impl<S: Surface, L> Drop for Flipbook<S, L> {
    fn drop(&mut self) {
        let mut state = lock(&self.state);
        state.generation += 1;
        if let Some(handle) = state.pending.take() {
            self.ctx.refresh.cancel_refresh(handle);
        }
    }
}

/// Registers the next tick for the current generation. Called with the
/// state lock held; refresh sources never run callbacks inline.
fn request_tick<S>(
    state: &Arc<Mutex<Playback<S>>>,
    playback: &mut Playback<S>,
    ctx: &TickContext,
) -> Result<(), RefreshError>
where
    S: Surface + Send + 'static,
    S::Image: Send,
{
    let weak = Arc::downgrade(state);
    let next = ctx.clone();
    let generation = playback.generation;
    let handle = ctx
        .refresh
        .request_refresh(Box::new(move || run_tick(weak, next, generation)))?;
    playback.pending = Some(handle);
    Ok(())
}

fn run_tick<S>(state: Weak<Mutex<Playback<S>>>, ctx: TickContext, generation: u64)
where
    S: Surface + Send + 'static,
    S::Image: Send,
{
    // The player was dropped.
    let Some(state) = state.upgrade() else {
        return;
    };
    let mut guard = lock(&state);
    let playback = &mut *guard;
    // A timer that fired just before `stop` cancelled it.
    if playback.generation != generation || playback.phase != Phase::Playing {
        return;
    }
    playback.pending = None;

    if let Err(err) = request_tick(&state, playback, &ctx) {
        playback.phase = Phase::Stopped;
        drop(guard);
        ctx.errors.report(&FlipbookError::from(err));
        return;
    }

    let now = ctx.clock.now_ms();
    let Some(scheduler) = playback.scheduler.as_mut() else {
        return;
    };

    let outcome = scheduler.tick(now);
    if let TickOutcome::Paint(index) = outcome {
        match playback.frames.get(index) {
            Some(image) => paint_frame(&mut playback.surface, image),
            None => warn!("flipbook frame {} missing from frame set", index),
        }
    }

    if scheduler.is_finished() {
        playback.phase = Phase::Finished;
        if let Some(handle) = playback.pending.take() {
            ctx.refresh.cancel_refresh(handle);
        }
    }
}
