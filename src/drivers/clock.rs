use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
/// Monotonic microsecond time base used to time conversions.
pub trait Clock: Send + Sync + 'static {
    fn now_us(&self) -> u64;
}
/// Wall-clock backed by `Instant`, counting from construction.
#[derive(Clone, Copy, Debug)]
pub struct MonotonicClock {
    origin: Instant,
}
impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}
impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}
impl Clock for MonotonicClock {
    fn now_us(&self) -> u64 {
        self.origin.elapsed().as_micros() as u64
    }
}
/// Clock that only moves when told to. Clones share the same time.
#[derive(Clone, Debug, Default)]
pub struct ManualClock {
    now: Arc<AtomicU64>,
}
impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn advance(&self, micros: u64) {
        self.now.fetch_add(micros, Ordering::AcqRel);
    }
    /// Jumps to an absolute time, backwards included (emulates a counter wrap).
    pub fn set(&self, micros: u64) {
        self.now.store(micros, Ordering::Release);
    }
}
impl Clock for ManualClock {
    fn now_us(&self) -> u64 {
        self.now.load(Ordering::Acquire)
    }
}
/// Elapsed time between two readings; a clock that went backwards yields 0.
pub fn elapsed_us(start_us: u64, end_us: u64) -> u64 {
    end_us.saturating_sub(start_us)
}
