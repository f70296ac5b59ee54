// Frame scheduler
//
// Decides, for a given wall-clock instant, whether the next frame is due.
// Ticks arrive at display cadence; the scheduler throttles them down to
// the configured frame interval. Painting is left to the caller.

use log::debug;

use crate::config::PlaybackConfig;

/// Result of a single scheduler tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Paint the frame at this index.
    Paint(usize),
    /// Less than one frame interval has elapsed.
    Throttled,
    /// The pause overlay is set.
    Paused,
    /// Non-looping playback has completed.
    Finished,
    /// The playable range is empty.
    Idle,
}

impl TickOutcome {
    pub fn painted(self) -> Option<usize> {
        match self {
            Self::Paint(index) => Some(index),
            _ => None,
        }
    }
}

/// Mutable playback state plus the timing rules that advance it.
#[derive(Debug, Clone)]
pub struct FrameScheduler {
    frame_interval_ms: f64,
    first_frame: usize,
    last_frame: usize,
    looping: bool,
    current_frame: usize,
    last_tick_ms: f64,
    last_painted: Option<usize>,
    paused: bool,
    finished: bool,
}

impl FrameScheduler {
    /// Creates playback state positioned at the first frame, with the
    /// timing origin at `now_ms`.
    pub fn begin(config: &PlaybackConfig, now_ms: f64) -> Self {
        Self {
            frame_interval_ms: config.frame_interval_ms(),
            first_frame: config.first_frame(),
            last_frame: config.last_frame(),
            looping: config.looping(),
            current_frame: config.first_frame(),
            last_tick_ms: now_ms,
            last_painted: None,
            paused: false,
            finished: false,
        }
    }

    /// Advances playback for a refresh at `now_ms`.
    ///
    /// The timing origin moves to the last interval boundary rather than
    /// to `now_ms`, so late ticks do not accumulate drift. Pausing leaves
    /// the origin alone: the first tick after `resume` advances at once if
    /// the pause outlasted an interval.
    pub fn tick(&mut self, now_ms: f64) -> TickOutcome {
        let elapsed = now_ms - self.last_tick_ms;

        if self.paused {
            return TickOutcome::Paused;
        }
        if self.finished {
            return TickOutcome::Finished;
        }
        if self.first_frame >= self.last_frame {
            return TickOutcome::Idle;
        }
        if elapsed < self.frame_interval_ms {
            return TickOutcome::Throttled;
        }

        self.last_tick_ms = now_ms - (elapsed % self.frame_interval_ms);

        let painted = self.current_frame;
        self.last_painted = Some(painted);

        if painted == self.last_frame - 1 {
            self.current_frame = self.first_frame;
            if !self.looping {
                self.finished = true;
                debug!("flipbook finished after frame {}", painted);
            }
        } else {
            self.current_frame += 1;
        }

        TickOutcome::Paint(painted)
    }

    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn resume(&mut self) {
        self.paused = false;
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// True once a non-looping sequence has painted its last frame.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Index of the next frame to paint.
    pub fn current_frame(&self) -> usize {
        self.current_frame
    }

    /// Index of the frame currently on the surface, if any.
    pub fn last_painted(&self) -> Option<usize> {
        self.last_painted
    }

    /// Timing origin of the most recent advance.
    pub fn last_tick_ms(&self) -> f64 {
        self.last_tick_ms
    }

    pub fn frame_interval_ms(&self) -> f64 {
        self.frame_interval_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FlipbookOptions;

    fn config(options: FlipbookOptions) -> PlaybackConfig {
        PlaybackConfig::from_options(options).unwrap()
    }

    /// Ticks every `step_ms` until `until_ms`, collecting painted indices.
    fn run(scheduler: &mut FrameScheduler, start_ms: f64, step_ms: f64, until_ms: f64) -> Vec<usize> {
        let mut painted = Vec::new();
        let mut now = start_ms;
        while now <= until_ms {
            if let TickOutcome::Paint(index) = scheduler.tick(now) {
                painted.push(index);
            }
            now += step_ms;
        }
        painted
    }

    #[test]
    fn first_tick_is_throttled() {
        let mut s = FrameScheduler::begin(&config(FlipbookOptions::with_images(["a", "b"])), 0.0);
        assert_eq!(s.tick(0.0), TickOutcome::Throttled);
        assert_eq!(s.current_frame(), 0);
        assert_eq!(s.last_painted(), None);
    }

    #[test]
    fn begin_enters_playing_state_at_first_frame() {
        let s = FrameScheduler::begin(
            &config(
                FlipbookOptions::with_images(["a", "b", "c", "d"])
                    .first_frame(2)
                    .last_frame(4)
                    .fps(25.0),
            ),
            250.0,
        );
        assert_eq!(s.current_frame(), 2);
        assert_eq!(s.last_tick_ms(), 250.0);
        assert_eq!(s.frame_interval_ms(), 40.0);
        assert_eq!(s.last_painted(), None);
        assert!(!s.is_paused());
        assert!(!s.is_finished());
    }

    #[test]
    fn ticks_below_interval_never_paint() {
        let mut s = FrameScheduler::begin(
            &config(FlipbookOptions::with_images(["a", "b"]).fps(10.0)),
            0.0,
        );
        for now in [1.0, 20.0, 50.0, 99.0, 99.9] {
            assert_eq!(s.tick(now), TickOutcome::Throttled);
            assert_eq!(s.current_frame(), 0);
        }
        assert_eq!(s.last_tick_ms(), 0.0);
    }

    #[test]
    fn exact_interval_advances() {
        let mut s = FrameScheduler::begin(
            &config(FlipbookOptions::with_images(["a", "b"]).fps(10.0)),
            0.0,
        );
        assert_eq!(s.tick(100.0), TickOutcome::Paint(0));
        assert_eq!(s.current_frame(), 1);
    }

    #[test]
    fn non_looping_paints_each_frame_once() {
        let mut s = FrameScheduler::begin(
            &config(FlipbookOptions::with_images(["a", "b", "c"]).fps(10.0)),
            0.0,
        );
        let painted = run(&mut s, 0.0, 16.0, 5_000.0);
        assert_eq!(painted, vec![0, 1, 2]);
        assert!(s.is_finished());
        assert_eq!(s.tick(10_000.0), TickOutcome::Finished);
    }

    #[test]
    fn looping_cycles_indefinitely() {
        let mut s = FrameScheduler::begin(
            &config(FlipbookOptions::with_images(["a", "b"]).fps(10.0).looping(true)),
            0.0,
        );
        let painted = run(&mut s, 0.0, 100.0, 600.0);
        assert_eq!(painted, vec![0, 1, 0, 1, 0, 1]);
        assert!(!s.is_finished());
    }

    #[test]
    fn wraps_to_first_frame_within_sub_range() {
        let mut s = FrameScheduler::begin(
            &config(
                FlipbookOptions::with_images(["a", "b", "c", "d", "e"])
                    .first_frame(1)
                    .last_frame(4)
                    .fps(10.0)
                    .looping(true),
            ),
            0.0,
        );
        assert_eq!(s.current_frame(), 1);
        let painted = run(&mut s, 0.0, 100.0, 700.0);
        assert_eq!(painted, vec![1, 2, 3, 1, 2, 3, 1]);
    }

    #[test]
    fn phase_preserving_reset_has_no_drift() {
        let mut s = FrameScheduler::begin(
            &config(FlipbookOptions::with_images(["a", "b", "c", "d"]).fps(10.0)),
            0.0,
        );
        // Elapsed 105: advance, origin snaps back to 100.
        assert_eq!(s.tick(105.0), TickOutcome::Paint(0));
        assert_eq!(s.last_tick_ms(), 100.0);
        // Elapsed 95: throttled, origin untouched.
        assert_eq!(s.tick(195.0), TickOutcome::Throttled);
        assert_eq!(s.last_tick_ms(), 100.0);
        // Elapsed 210: one advance, origin lands on the 300 boundary.
        assert_eq!(s.tick(310.0), TickOutcome::Paint(1));
        assert_eq!(s.last_tick_ms(), 300.0);
    }

    #[test]
    fn paused_ticks_do_nothing() {
        let mut s = FrameScheduler::begin(
            &config(FlipbookOptions::with_images(["a", "b", "c"]).fps(10.0)),
            0.0,
        );
        s.pause();
        for now in [100.0, 200.0, 1_000.0] {
            assert_eq!(s.tick(now), TickOutcome::Paused);
        }
        assert_eq!(s.current_frame(), 0);
        assert_eq!(s.last_tick_ms(), 0.0);
    }

    #[test]
    fn resume_catches_up_with_single_advance() {
        let mut s = FrameScheduler::begin(
            &config(FlipbookOptions::with_images(["a", "b", "c"]).fps(10.0)),
            0.0,
        );
        assert_eq!(s.tick(100.0), TickOutcome::Paint(0));
        s.pause();
        assert_eq!(s.tick(150.0), TickOutcome::Paused);
        s.resume();
        // Long pause: the very first tick after resume advances.
        assert_eq!(s.tick(1_050.0), TickOutcome::Paint(1));
        assert_eq!(s.last_tick_ms(), 1_000.0);
        assert_eq!(s.tick(1_060.0), TickOutcome::Throttled);
    }

    #[test]
    fn empty_range_is_idle() {
        let mut s = FrameScheduler::begin(&PlaybackConfig::default(), 0.0);
        assert_eq!(s.tick(10_000.0), TickOutcome::Idle);
        assert_eq!(s.last_painted(), None);
    }

    #[test]
    fn single_frame_non_looping() {
        let mut s = FrameScheduler::begin(
            &config(FlipbookOptions::with_images(["only"]).fps(10.0)),
            0.0,
        );
        assert_eq!(s.tick(100.0), TickOutcome::Paint(0));
        assert!(s.is_finished());
        assert_eq!(s.current_frame(), 0);
        assert_eq!(s.last_painted(), Some(0));
    }
}
