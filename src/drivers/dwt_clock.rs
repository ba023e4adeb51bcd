use core::cell::Cell;

use cortex_m::peripheral::DWT;
use telemetry_logger::MonotonicClock;

/// Milliseconds since boot, derived from the DWT cycle counter.
///
/// The cycle counter wraps every ~89 s at 48 MHz; the clock must be read at least
/// that often to keep counting, which the 50 Hz telemetry task does.
pub(crate) struct DwtClock {
    cycles_per_ms: u32,
    /// (cycle count at last read, milliseconds so far, cycles not yet worth a ms)
    state: Cell<(u32, u32, u32)>,
}

impl DwtClock {
    /// The DWT cycle counter must already be enabled (DwtSystick does it).
    pub(crate) fn new(sysclk_hz: u32) -> Self {
        Self {
            cycles_per_ms: (sysclk_hz / 1_000).max(1),
            state: Cell::new((DWT::cycle_count(), 0, 0)),
        }
    }
}

impl MonotonicClock for DwtClock {
    fn now_ms(&self) -> u32 {
        let (last, ms, leftover) = self.state.get();
        let now = DWT::cycle_count();
        let elapsed = now.wrapping_sub(last).wrapping_add(leftover);
        let ms = ms.wrapping_add(elapsed / self.cycles_per_ms);
        self.state.set((now, ms, elapsed % self.cycles_per_ms));
        ms
    }
}
