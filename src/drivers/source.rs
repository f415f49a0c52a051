use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use log::{debug, error};
use crate::drivers::SamplerError;
/// Callback invoked once per carrier period.
///
/// Runs in an interrupt-like context: it must not block, allocate, or log,
/// and must finish well inside one period. It may stop its own source
/// through the `SourceControl` it is handed.
pub type SourceCallback = Box<dyn FnMut(&SourceControl) + Send + 'static>;
/// Something that emits a periodic timing reference (a PWM carrier edge).
pub trait SignalSource {
    /// Highest frequency this source can generate.
    fn max_frequency_hz(&self) -> f32;
    fn start(&mut self, frequency_hz: f32, callback: SourceCallback) -> Result<(), SamplerError>;
    /// Idempotent. No callback runs after this returns.
    fn stop(&mut self);
    fn is_running(&self) -> bool;
}
/// Longest carrier period a source accepts. Keeps deadline arithmetic on
/// `Instant` far from overflow.
pub const MAX_PERIOD: Duration = Duration::from_secs(3600);
/// Checks a requested carrier frequency and returns its period.
pub fn validate_frequency(frequency_hz: f32, max_frequency_hz: f32) -> Result<Duration, SamplerError> {
    if !frequency_hz.is_finite() || frequency_hz <= 0.0 {
        return Err(SamplerError::invalid_frequency(
            frequency_hz,
            "must be a finite value greater than zero",
        ));
    }
    if frequency_hz > max_frequency_hz {
        return Err(SamplerError::invalid_frequency(
            frequency_hz,
            format!("exceeds the source maximum of {max_frequency_hz} Hz"),
        ));
    }
    match Duration::try_from_secs_f64(1.0 / f64::from(frequency_hz)) {
        Ok(period) if period <= MAX_PERIOD => Ok(period),
        _ => Err(SamplerError::invalid_frequency(
            frequency_hz,
            format!("period too long (limit {} s)", MAX_PERIOD.as_secs()),
        )),
    }
}
#[derive(Debug, Default)]
struct ControlState {
    stopped: AtomicBool,
    events: AtomicU64,
    overruns: AtomicU64,
}
/// Shared stop flag and counters for one run of a source.
#[derive(Clone, Debug, Default)]
pub struct SourceControl {
    state: Arc<ControlState>,
}
impl SourceControl {
    pub fn new() -> Self {
        Self::default()
    }
    /// Requests a stop. Returns `true` only for the call that actually stopped it.
    pub fn stop(&self) -> bool {
        !self.state.stopped.swap(true, Ordering::AcqRel)
    }
    pub fn is_stopped(&self) -> bool {
        self.state.stopped.load(Ordering::Acquire)
    }
    /// Events delivered to the callback.
    pub fn events(&self) -> u64 {
        self.state.events.load(Ordering::Relaxed)
    }
    /// Carrier edges that passed while a callback was still running. All of
    /// them together produce one pending event.
    pub fn overruns(&self) -> u64 {
        self.state.overruns.load(Ordering::Relaxed)
    }
    fn record_event(&self) {
        self.state.events.fetch_add(1, Ordering::Relaxed);
    }
    fn record_overruns(&self, missed: u64) {
        self.state.overruns.fetch_add(missed, Ordering::Relaxed);
    }
}
/// Periodic source driven by a dedicated timer thread.
///
/// Deadlines are computed as `start + n * period` so the carrier does not
/// drift with callback duration. Edges that pass while a callback overruns
/// are coalesced into a single pending event, like a hardware interrupt
/// flag: it fires as soon as the callback returns, and the carrier then
/// resumes on its original grid.
pub struct TimerSource {
    max_frequency_hz: f32,
    control: Option<SourceControl>,
    worker: Option<JoinHandle<()>>,
}
impl TimerSource {
    pub fn new(max_frequency_hz: f32) -> Self {
        Self {
            max_frequency_hz,
            control: None,
            worker: None,
        }
    }
    /// Control handle of the current (or last) run.
    pub fn control(&self) -> Option<&SourceControl> {
        self.control.as_ref()
    }
    fn reap(&mut self) {
        let Some(handle) = self.worker.take() else {
            return;
        };
        if handle.thread().id() == thread::current().id() {
            return;
        }
        handle.thread().unpark();
        if handle.join().is_err() {
            error!("signal source callback panicked; timer thread terminated");
        }
    }
}
impl SignalSource for TimerSource {
    fn max_frequency_hz(&self) -> f32 {
        self.max_frequency_hz
    }
    fn start(&mut self, frequency_hz: f32, callback: SourceCallback) -> Result<(), SamplerError> {
        if self.is_running() {
            return Err(SamplerError::AlreadyRunning);
        }
        let period = validate_frequency(frequency_hz, self.max_frequency_hz)?;
        // A previous run may have stopped itself from inside its callback.
        self.reap();
        let control = SourceControl::new();
        let worker_control = control.clone();
        let handle = thread::Builder::new()
            .name("signal-source".into())
            .spawn(move || run_timer(period, worker_control, callback))
            .map_err(|e| SamplerError::SourceFailure(e.to_string()))?;
        debug!("timer source started at {frequency_hz} Hz (period {period:?})");
        self.control = Some(control);
        self.worker = Some(handle);
        Ok(())
    }
    fn stop(&mut self) {
        if let Some(control) = &self.control {
            if control.stop() {
                debug!(
                    "timer source stopped after {} events ({} overruns)",
                    control.events(),
                    control.overruns()
                );
            }
        }
        self.reap();
    }
    fn is_running(&self) -> bool {
        self.control.as_ref().is_some_and(|c| !c.is_stopped())
    }
}
impl Drop for TimerSource {
    fn drop(&mut self) {
        self.stop();
    }
}
fn run_timer(period: Duration, control: SourceControl, mut callback: SourceCallback) {
    let mut deadline = Instant::now() + period;
    loop {
        loop {
            if control.is_stopped() {
                return;
            }
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            thread::park_timeout(deadline - now);
        }
        control.record_event();
        callback(&control);
        deadline += period;
        let now = Instant::now();
        if now > deadline {
            // 错过的边沿合并成一个挂起事件, 停在最后一个已过去的边沿上立即触发
            let skipped = (now - deadline).as_nanos() / period.as_nanos().max(1);
            control.record_overruns(skipped as u64 + 1);
            deadline += period.saturating_mul(skipped.min(u128::from(u32::MAX)) as u32);
        }
    }
}
/// Upper bound reported by `ManualSource` unless configured otherwise.
pub const MANUAL_MAX_FREQUENCY_HZ: f32 = 1_000_000.0;
struct ManualState {
    callback: Option<SourceCallback>,
    control: Option<SourceControl>,
    frequency_hz: Option<f32>,
    starts: usize,
}
/// Source whose events are injected by hand, for deterministic tests.
/// Clones drive the same source.
#[derive(Clone)]
pub struct ManualSource {
    state: Arc<Mutex<ManualState>>,
    max_frequency_hz: f32,
}
impl Default for ManualSource {
    fn default() -> Self {
        Self::new()
    }
}
impl ManualSource {
    pub fn new() -> Self {
        Self::with_max_frequency(MANUAL_MAX_FREQUENCY_HZ)
    }
    pub fn with_max_frequency(max_frequency_hz: f32) -> Self {
        Self {
            state: Arc::new(Mutex::new(ManualState {
                callback: None,
                control: None,
                frequency_hz: None,
                starts: 0,
            })),
            max_frequency_hz,
        }
    }
    /// Delivers one carrier event if the source is running.
    pub fn fire(&self) -> bool {
        self.deliver(false)
    }
    /// Delivers an event even after `stop`, emulating an interrupt that was
    /// latched just before the stop took effect.
    pub fn force_fire(&self) -> bool {
        self.deliver(true)
    }
    /// Fires until the source stops itself or `limit` events were delivered.
    pub fn fire_until_stopped(&self, limit: usize) -> usize {
        let mut delivered = 0;
        while delivered < limit && self.fire() {
            delivered += 1;
        }
        delivered
    }
    pub fn frequency_hz(&self) -> Option<f32> {
        self.lock().frequency_hz
    }
    /// Number of successful `start` calls.
    pub fn starts(&self) -> usize {
        self.lock().starts
    }
    pub fn control(&self) -> Option<SourceControl> {
        self.lock().control.clone()
    }
    fn deliver(&self, ignore_stop: bool) -> bool {
        let mut state = self.lock();
        let Some(control) = state.control.clone() else {
            return false;
        };
        if control.is_stopped() && !ignore_stop {
            return false;
        }
        let Some(callback) = state.callback.as_mut() else {
            return false;
        };
        control.record_event();
        callback(&control);
        true
    }
    fn lock(&self) -> std::sync::MutexGuard<'_, ManualState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
impl SignalSource for ManualSource {
    fn max_frequency_hz(&self) -> f32 {
        self.max_frequency_hz
    }
    fn start(&mut self, frequency_hz: f32, callback: SourceCallback) -> Result<(), SamplerError> {
        if self.is_running() {
            return Err(SamplerError::AlreadyRunning);
        }
        validate_frequency(frequency_hz, self.max_frequency_hz)?;
        let mut state = self.lock();
        state.callback = Some(callback);
        state.control = Some(SourceControl::new());
        state.frequency_hz = Some(frequency_hz);
        state.starts += 1;
        Ok(())
    }
    fn stop(&mut self) {
        if let Some(control) = &self.lock().control {
            control.stop();
        }
    }
    fn is_running(&self) -> bool {
        self.lock()
            .control
            .as_ref()
            .is_some_and(|c| !c.is_stopped())
    }
}
