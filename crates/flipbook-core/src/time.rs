// Playback clocks
//
// The scheduler only ever compares millisecond readings, so a clock is a
// single `now_ms` call. `ManualClock` moves in refresh-sized steps for
// deterministic playback tests.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Millisecond time source for the tick loop.
pub trait Clock: Send + Sync {
    /// Milliseconds since an arbitrary, fixed origin.
    fn now_ms(&self) -> f64;
}

/// Monotonic clock whose origin is its construction.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_ms(&self) -> f64 {
        duration_ms(self.origin.elapsed())
    }
}

/// Length of one refresh at `hz`, in milliseconds.
pub fn refresh_period_ms(hz: f64) -> f64 {
    1_000.0 / hz
}

fn duration_ms(d: Duration) -> f64 {
    d.as_secs_f64() * 1_000.0
}

/// Clock that moves only when stepped.
///
/// The reading is kept as `f64` bits in an atomic so the clock can be
/// shared with a timer thread.
#[derive(Debug, Default)]
pub struct ManualClock {
    bits: AtomicU64,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn starting_at(ms: f64) -> Self {
        Self {
            bits: AtomicU64::new(ms.to_bits()),
        }
    }

    pub fn set_ms(&self, ms: f64) {
        self.bits.store(ms.to_bits(), Ordering::SeqCst);
    }

    /// Moves forward by `delta_ms` and returns the new reading.
    pub fn advance_ms(&self, delta_ms: f64) -> f64 {
        let mut now = 0.0;
        // fetch_update only fails when the closure returns None.
        let _ = self.bits.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |bits| {
            now = f64::from_bits(bits) + delta_ms;
            Some(now.to_bits())
        });
        now
    }

    pub fn advance(&self, delta: Duration) -> f64 {
        self.advance_ms(duration_ms(delta))
    }

    /// Steps through `count` refreshes of a `hz` display, one at a time, and
    /// returns the reading after the last step. Accumulating per step keeps
    /// the same rounding a real refresh loop would see.
    pub fn advance_refreshes(&self, count: u32, hz: f64) -> f64 {
        let period = refresh_period_ms(hz);
        let mut now = self.now_ms();
        for _ in 0..count {
            now = self.advance_ms(period);
        }
        now
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> f64 {
        f64::from_bits(self.bits.load(Ordering::SeqCst))
    }
}
