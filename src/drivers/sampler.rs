use std::collections::HashSet;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, TryLockError};
use std::thread;
use std::time::{Duration, Instant};
use log::{debug, info};
use crate::drivers::clock::{elapsed_us, Clock, MonotonicClock};
use crate::drivers::source::{validate_frequency, SignalSource, SourceControl};
use crate::drivers::{ConversionFailure, SampleBuffer, SampleChannel, SamplerError};
use crate::types::{ChannelId, TimedSample};
/// Carrier frequency and per-channel sample budget.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SamplerSettings {
    pub frequency_hz: f32,
    pub capacity: usize,
}
/// Result of a run that reached its sample budget.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Completion {
    pub collected: usize,
    pub elapsed: Duration,
    pub faults: usize,
    pub spurious_events: usize,
}
// 中断上下文和等待线程之间唯一共享的状态
#[derive(Debug, Default)]
struct Counters {
    collected: AtomicUsize,
    running: AtomicBool,
    faults: AtomicUsize,
    spurious: AtomicUsize,
    busy: AtomicUsize,
}
impl Counters {
    fn reset(&self) {
        self.collected.store(0, Ordering::Release);
        self.faults.store(0, Ordering::Relaxed);
        self.spurious.store(0, Ordering::Relaxed);
        self.busy.store(0, Ordering::Relaxed);
    }
}
struct Acquisition<C> {
    channels: Vec<Box<dyn SampleChannel>>,
    buffers: Vec<SampleBuffer>,
    staged: Vec<TimedSample>,
    clock: C,
    last_fault: Option<ConversionFailure>,
}
impl<C: Clock> Acquisition<C> {
    /// One carrier event. Runs in the source's callback context.
    fn run_cycle(&mut self, counters: &Counters, capacity: usize, control: &SourceControl) {
        if !counters.running.load(Ordering::Acquire)
            || counters.collected.load(Ordering::Acquire) >= capacity
        {
            control.stop();
            counters.spurious.fetch_add(1, Ordering::Relaxed);
            return;
        }
        self.staged.clear();
        for channel in self.channels.iter_mut() {
            let start = self.clock.now_us();
            let result = channel.read();
            let end = self.clock.now_us();
            match result {
                Ok(sample) => self.staged.push(TimedSample {
                    channel: channel.id(),
                    sample,
                    duration_us: elapsed_us(start, end),
                }),
                Err(fault) => {
                    // 丢弃本周期已读到的部分, 下一个事件重试
                    counters.faults.fetch_add(1, Ordering::Relaxed);
                    self.last_fault = Some(fault);
                    return;
                }
            }
        }
        for (buffer, reading) in self.buffers.iter_mut().zip(self.staged.drain(..)) {
            buffer.push(reading);
        }
        let collected = counters.collected.fetch_add(1, Ordering::AcqRel) + 1;
        if collected >= capacity {
            counters.running.store(false, Ordering::Release);
            control.stop();
        }
    }
}
/// Reads every channel back to back on each carrier event until each
/// channel's buffer holds `capacity` readings, then halts the carrier.
///
/// Channels are always read in declaration order, so the skew of a channel
/// relative to the carrier edge is bounded by the latency of the channels
/// declared before it.
pub struct SyncSampler<S: SignalSource, C: Clock = MonotonicClock> {
    source: S,
    settings: SamplerSettings,
    channel_ids: Vec<ChannelId>,
    counters: Arc<Counters>,
    acquisition: Arc<Mutex<Acquisition<C>>>,
}
impl<S: SignalSource, C: Clock> SyncSampler<S, C> {
    pub fn new(
        source: S,
        channels: Vec<Box<dyn SampleChannel>>,
        settings: SamplerSettings,
        clock: C,
    ) -> Result<Self, SamplerError> {
        if channels.is_empty() {
            return Err(SamplerError::NoChannels);
        }
        if settings.capacity == 0 {
            return Err(SamplerError::InvalidCapacity);
        }
        let mut seen = HashSet::new();
        for channel in &channels {
            if !seen.insert(channel.id()) {
                return Err(SamplerError::DuplicateChannel(channel.id()));
            }
        }
        let period = validate_frequency(settings.frequency_hz, source.max_frequency_hz())?;
        let worst_case_us: u64 = channels.iter().map(|c| c.latency_hint_us()).sum();
        if worst_case_us > 0 && u128::from(worst_case_us) >= period.as_micros() {
            return Err(SamplerError::invalid_frequency(
                settings.frequency_hz,
                format!(
                    "period of {} us does not exceed the worst-case cycle of {worst_case_us} us",
                    period.as_micros()
                ),
            ));
        }
        let channel_ids: Vec<ChannelId> = channels.iter().map(|c| c.id()).collect();
        let buffers = channel_ids
            .iter()
            .map(|&id| SampleBuffer::with_capacity(id, settings.capacity))
            .collect();
        let staged = Vec::with_capacity(channels.len());
        Ok(Self {
            source,
            settings,
            channel_ids,
            counters: Arc::new(Counters::default()),
            acquisition: Arc::new(Mutex::new(Acquisition {
                channels,
                buffers,
                staged,
                clock,
                last_fault: None,
            })),
        })
    }
    /// Clears previous results and starts the carrier.
    pub fn begin(&mut self) -> Result<(), SamplerError> {
        if self.source.is_running() {
            return Err(SamplerError::AlreadyRunning);
        }
        {
            let mut acquisition = self.lock();
            for buffer in &mut acquisition.buffers {
                buffer.clear();
            }
            acquisition.last_fault = None;
        }
        self.counters.reset();
        self.counters.running.store(true, Ordering::Release);
        let counters = Arc::clone(&self.counters);
        let acquisition = Arc::clone(&self.acquisition);
        let capacity = self.settings.capacity;
        let callback = Box::new(move |control: &SourceControl| {
            let mut guard = match acquisition.try_lock() {
                Ok(guard) => guard,
                Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
                Err(TryLockError::WouldBlock) => {
                    counters.busy.fetch_add(1, Ordering::Relaxed);
                    return;
                }
            };
            let cycle = panic::catch_unwind(AssertUnwindSafe(|| {
                guard.run_cycle(&counters, capacity, control)
            }));
            if cycle.is_err() {
                // 通道驱动崩溃: 放弃本次采集, 让等待方看到中断而不是一直等下去
                counters.faults.fetch_add(1, Ordering::Relaxed);
                counters.running.store(false, Ordering::Release);
                control.stop();
            }
        });
        if let Err(e) = self.source.start(self.settings.frequency_hz, callback) {
            self.counters.running.store(false, Ordering::Release);
            return Err(e);
        }
        info!(
            "sampling {} channel(s) at {} Hz, budget {} per channel",
            self.channel_ids.len(),
            self.settings.frequency_hz,
            capacity
        );
        Ok(())
    }
    /// Stops the carrier. Idempotent; a cycle already in flight completes.
    pub fn stop(&mut self) {
        self.counters.running.store(false, Ordering::Release);
        self.source.stop();
    }
    /// Polls the completion counter until the budget is reached.
    ///
    /// With a `timeout`, gives up once it elapses: the carrier is stopped and
    /// `Timeout` is returned while the partial buffers stay readable.
    pub fn wait_for_completion(
        &mut self,
        timeout: Option<Duration>,
        poll_interval: Duration,
    ) -> Result<Completion, SamplerError> {
        let started = Instant::now();
        let capacity = self.settings.capacity;
        loop {
            let collected = self.collected();
            if collected >= capacity {
                // Already stopped from the callback; this only reaps the source.
                self.source.stop();
                let completion = Completion {
                    collected,
                    elapsed: started.elapsed(),
                    faults: self.faults(),
                    spurious_events: self.spurious_events(),
                };
                debug!("sampling complete: {completion:?}");
                return Ok(completion);
            }
            if !self.is_running() {
                // The final cycle may have landed between the two loads.
                if self.collected() >= capacity {
                    continue;
                }
                self.source.stop();
                return Err(SamplerError::Interrupted {
                    collected: self.collected(),
                    capacity,
                });
            }
            let waited = started.elapsed();
            let mut nap = poll_interval;
            if let Some(limit) = timeout {
                if waited >= limit {
                    self.stop();
                    if self.collected() >= capacity {
                        continue;
                    }
                    return Err(SamplerError::Timeout {
                        collected: self.collected(),
                        capacity,
                        waited_ms: waited.as_millis(),
                    });
                }
                nap = nap.min(limit - waited);
            }
            thread::sleep(nap);
        }
    }
    pub fn collected(&self) -> usize {
        self.counters.collected.load(Ordering::Acquire)
    }
    pub fn is_running(&self) -> bool {
        self.counters.running.load(Ordering::Acquire)
    }
    pub fn capacity(&self) -> usize {
        self.settings.capacity
    }
    pub fn channel_ids(&self) -> &[ChannelId] {
        &self.channel_ids
    }
    /// Cycles discarded because a conversion failed or a channel panicked.
    pub fn faults(&self) -> usize {
        self.counters.faults.load(Ordering::Relaxed)
    }
    pub fn last_fault(&self) -> Option<ConversionFailure> {
        self.lock().last_fault.clone()
    }
    /// Events ignored because sampling had already finished or been stopped.
    pub fn spurious_events(&self) -> usize {
        self.counters.spurious.load(Ordering::Relaxed)
    }
    /// Events skipped because an observer held the buffers.
    pub fn busy_events(&self) -> usize {
        self.counters.busy.load(Ordering::Relaxed)
    }
    pub fn source(&self) -> &S {
        &self.source
    }
    /// Copies the buffers, one per channel in declaration order.
    ///
    /// While sampling is running an event that coincides with the copy is
    /// skipped and counted in `busy_events`.
    pub fn snapshot(&self) -> Vec<SampleBuffer> {
        self.lock().buffers.clone()
    }
    pub fn with_buffers<R>(&self, f: impl FnOnce(&[SampleBuffer]) -> R) -> R {
        f(&self.lock().buffers)
    }
    fn lock(&self) -> MutexGuard<'_, Acquisition<C>> {
        self.acquisition.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
impl<S: SignalSource, C: Clock> Drop for SyncSampler<S, C> {
    fn drop(&mut self) {
        self.stop();
    }
}
#[cfg(test)]
mod tests {
    use super::*;
    use crate::drivers::clock::ManualClock;
    use crate::drivers::source::{ManualSource, TimerSource};
    use crate::drivers::{summarize, summarize_pooled, SyntheticChannel};
    use crate::types::Sample;
    type TestSampler = SyncSampler<ManualSource, ManualClock>;
    fn boxed(channel: impl SampleChannel + 'static) -> Box<dyn SampleChannel> {
        Box::new(channel)
    }
    fn settings(frequency_hz: f32, capacity: usize) -> SamplerSettings {
        SamplerSettings {
            frequency_hz,
            capacity,
        }
    }
    fn build(
        channel_count: u8,
        capacity: usize,
        latencies_us: Vec<u64>,
    ) -> (TestSampler, ManualSource, ManualClock) {
        let source = ManualSource::new();
        let clock = ManualClock::new();
        let channels = (0..channel_count)
            .map(|i| {
                boxed(SyntheticChannel::new(ChannelId(i), clock.clone()).latencies(latencies_us.clone()))
            })
            .collect();
        let sampler =
            SyncSampler::new(source.clone(), channels, settings(1000.0, capacity), clock.clone())
                .unwrap();
        (sampler, source, clock)
    }
    #[test]
    fn fills_every_buffer_to_capacity_and_ignores_late_events() {
        for capacity in [1, 2, 7, 37] {
            for channel_count in [1, 2, 4] {
                let (mut sampler, source, _) = build(channel_count, capacity, vec![5]);
                sampler.begin().unwrap();
                assert_eq!(source.fire_until_stopped(capacity * 2 + 10), capacity);
                assert!(!source.is_running());
                assert!(!sampler.is_running());
                for _ in 0..3 {
                    assert!(source.force_fire());
                }
                let buffers = sampler.snapshot();
                assert_eq!(buffers.len(), channel_count as usize);
                for buffer in &buffers {
                    assert_eq!(buffer.len(), capacity);
                }
                assert_eq!(sampler.collected(), capacity);
                assert_eq!(sampler.spurious_events(), 3);
                let done = sampler
                    .wait_for_completion(Some(Duration::from_secs(1)), Duration::from_millis(1))
                    .unwrap();
                assert_eq!(done.collected, capacity);
            }
        }
    }
    #[test]
    fn reads_channels_in_declaration_order_every_cycle() {
        let source = ManualSource::new();
        let clock = ManualClock::new();
        let log = Arc::new(Mutex::new(Vec::new()));
        let declared = [ChannelId(3), ChannelId(1), ChannelId(2)];
        let channels = declared
            .iter()
            .map(|&id| {
                boxed(SyntheticChannel::new(id, clock.clone()).record_order(Arc::clone(&log)))
            })
            .collect();
        let mut sampler =
            SyncSampler::new(source.clone(), channels, settings(500.0, 5), clock).unwrap();
        sampler.begin().unwrap();
        source.fire_until_stopped(100);
        let order = log.lock().unwrap().clone();
        assert_eq!(order.len(), 15);
        for cycle in order.chunks(3) {
            assert_eq!(cycle, declared);
        }
        let ids: Vec<ChannelId> = sampler.snapshot().iter().map(|b| b.channel()).collect();
        assert_eq!(ids, declared);
        assert_eq!(sampler.channel_ids(), declared);
    }
    struct RewindingChannel {
        clock: ManualClock,
    }
    impl SampleChannel for RewindingChannel {
        fn id(&self) -> ChannelId {
            ChannelId(9)
        }
        fn read(&mut self) -> Result<Sample, ConversionFailure> {
            // The free-running counter wraps during the conversion.
            self.clock.set(0);
            Ok(Sample::new(1))
        }
    }
    #[test]
    fn durations_saturate_at_zero_when_clock_wraps() {
        let source = ManualSource::new();
        let clock = ManualClock::new();
        let channels = vec![
            boxed(SyntheticChannel::new(ChannelId(0), clock.clone()).latencies(vec![1_000_000])),
            boxed(RewindingChannel {
                clock: clock.clone(),
            }),
        ];
        let mut sampler =
            SyncSampler::new(source.clone(), channels, settings(0.5, 4), clock).unwrap();
        sampler.begin().unwrap();
        source.fire_until_stopped(10);
        let buffers = sampler.snapshot();
        assert!(buffers[0].durations_us().all(|d| d == 1_000_000));
        assert!(buffers[1].durations_us().all(|d| d == 0));
        assert_eq!(buffers[1].len(), 4);
    }
    #[test]
    fn round_robin_latencies_average_within_bounds() {
        let (mut sampler, source, _) = build(2, 100, vec![10, 15, 20]);
        sampler.begin().unwrap();
        assert_eq!(source.fire_until_stopped(1000), 100);
        let buffers = sampler.snapshot();
        for buffer in &buffers {
            let summary = summarize(buffer).unwrap();
            assert_eq!(summary.count, 100);
            assert!((10.0..=20.0).contains(&summary.mean_us), "{}", summary.mean_us);
            assert_eq!(summary.min_us, 10);
            assert_eq!(summary.max_us, 20);
        }
        let pooled = summarize_pooled(&buffers).unwrap();
        assert_eq!(pooled.count, 200);
        assert!((pooled.mean_us - 14.95).abs() < 1e-9);
    }
    #[test]
    fn conversion_failure_skips_the_cycle_and_retries() {
        let source = ManualSource::new();
        let clock = ManualClock::new();
        let values: Vec<u16> = (0..200).collect();
        let channels = vec![
            boxed(SyntheticChannel::new(ChannelId(0), clock.clone()).values(values.clone())),
            boxed(
                SyntheticChannel::new(ChannelId(1), clock.clone())
                    .values(values)
                    .fail_on_read(37),
            ),
        ];
        let mut sampler =
            SyncSampler::new(source.clone(), channels, settings(1000.0, 50), clock).unwrap();
        sampler.begin().unwrap();
        // One extra event replaces the discarded cycle.
        assert_eq!(source.fire_until_stopped(500), 51);
        let buffers = sampler.snapshot();
        assert_eq!(buffers[0].len(), 50);
        assert_eq!(buffers[1].len(), 50);
        assert_eq!(sampler.faults(), 1);
        assert_eq!(
            sampler.last_fault(),
            Some(ConversionFailure {
                channel: ChannelId(1),
                read_index: 37
            })
        );
        // Channel 0's 37th reading (value 36) belonged to the failed cycle.
        let first: Vec<u16> = buffers[0].iter().map(|s| s.sample.raw()).collect();
        assert_eq!(first[35], 35);
        assert_eq!(first[36], 37);
        assert!(!first.contains(&36));
    }
    #[test]
    fn rejects_invalid_construction() {
        let clock = ManualClock::new();
        let channel = |id: u8, latency: u64| {
            boxed(SyntheticChannel::new(ChannelId(id), clock.clone()).latencies(vec![latency]))
        };
        let err = TestSampler::new(ManualSource::new(), vec![], settings(10.0, 5), clock.clone());
        assert_eq!(err.err(), Some(SamplerError::NoChannels));
        let err = TestSampler::new(
            ManualSource::new(),
            vec![channel(0, 1)],
            settings(10.0, 0),
            clock.clone(),
        );
        assert_eq!(err.err(), Some(SamplerError::InvalidCapacity));
        let err = TestSampler::new(
            ManualSource::new(),
            vec![channel(1, 1), channel(1, 1)],
            settings(10.0, 5),
            clock.clone(),
        );
        assert_eq!(err.err(), Some(SamplerError::DuplicateChannel(ChannelId(1))));
        for bad in [0.0, -1.0, f32::NAN, 1e-30, 1e-19] {
            let err = TestSampler::new(
                ManualSource::new(),
                vec![channel(0, 1)],
                settings(bad, 5),
                clock.clone(),
            );
            assert!(matches!(err, Err(SamplerError::InvalidFrequency { .. })));
        }
        let err = TestSampler::new(
            ManualSource::with_max_frequency(1000.0),
            vec![channel(0, 1)],
            settings(1001.0, 5),
            clock.clone(),
        );
        assert!(matches!(err, Err(SamplerError::InvalidFrequency { .. })));
    }
    #[test]
    fn rejects_carrier_faster_than_worst_case_cycle() {
        let clock = ManualClock::new();
        let channels = |latency: u64| {
            vec![
                boxed(SyntheticChannel::new(ChannelId(0), clock.clone()).latencies(vec![latency])),
                boxed(SyntheticChannel::new(ChannelId(1), clock.clone()).latencies(vec![latency])),
            ]
        };
        // 2 kHz gives a 500 us period.
        for latency in [250, 300] {
            let err = TestSampler::new(
                ManualSource::new(),
                channels(latency),
                settings(2000.0, 5),
                clock.clone(),
            );
            assert!(matches!(err, Err(SamplerError::InvalidFrequency { .. })), "{latency}");
        }
        let ok = TestSampler::new(
            ManualSource::new(),
            channels(249),
            settings(2000.0, 5),
            clock.clone(),
        );
        assert!(ok.is_ok());
    }
    #[test]
    fn stop_twice_is_harmless() {
        let (mut sampler, source, _) = build(2, 10, vec![1]);
        sampler.begin().unwrap();
        source.fire();
        source.fire();
        sampler.stop();
        sampler.stop();
        assert!(!sampler.is_running());
        assert!(!source.fire());
        assert_eq!(sampler.collected(), 2);
        assert_eq!(source.starts(), 1);
        // A latched event after an external stop must not write either.
        assert!(source.force_fire());
        assert_eq!(sampler.collected(), 2);
        assert_eq!(sampler.spurious_events(), 1);
    }
    #[test]
    fn timeout_stops_source_and_keeps_partial_buffers() {
        let (mut sampler, source, _) = build(2, 10, vec![1]);
        sampler.begin().unwrap();
        for _ in 0..3 {
            source.fire();
        }
        let err = sampler
            .wait_for_completion(Some(Duration::from_millis(20)), Duration::from_millis(1))
            .unwrap_err();
        match err {
            SamplerError::Timeout {
                collected,
                capacity,
                waited_ms,
            } => {
                assert_eq!(collected, 3);
                assert_eq!(capacity, 10);
                assert!(waited_ms >= 20);
            }
            other => panic!("unexpected error {other:?}"),
        }
        assert!(!source.is_running());
        assert!(sampler.snapshot().iter().all(|b| b.len() == 3));
    }
    #[test]
    fn waiting_after_external_stop_reports_interruption() {
        let (mut sampler, source, _) = build(1, 10, vec![1]);
        sampler.begin().unwrap();
        source.fire();
        sampler.stop();
        let err = sampler.wait_for_completion(None, Duration::from_millis(1));
        assert_eq!(
            err.err(),
            Some(SamplerError::Interrupted {
                collected: 1,
                capacity: 10
            })
        );
    }
    struct CrashingChannel;
    impl SampleChannel for CrashingChannel {
        fn id(&self) -> ChannelId {
            ChannelId(5)
        }
        fn read(&mut self) -> Result<Sample, ConversionFailure> {
            panic!("driver crashed")
        }
    }
    #[test]
    fn panicking_channel_interrupts_the_run() {
        let source = ManualSource::new();
        let clock = ManualClock::new();
        let channels = vec![
            boxed(SyntheticChannel::new(ChannelId(0), clock.clone())),
            boxed(CrashingChannel),
        ];
        let mut sampler =
            SyncSampler::new(source.clone(), channels, settings(100.0, 5), clock).unwrap();
        sampler.begin().unwrap();
        assert!(source.fire());
        assert!(!source.is_running());
        assert!(!sampler.is_running());
        assert_eq!(sampler.faults(), 1);
        let err = sampler.wait_for_completion(None, Duration::from_millis(1));
        assert_eq!(
            err.err(),
            Some(SamplerError::Interrupted {
                collected: 0,
                capacity: 5
            })
        );
        assert!(sampler.snapshot().iter().all(|b| b.is_empty()));
    }
    #[test]
    fn panicking_channel_stops_the_timer_carrier() {
        let channels = vec![boxed(CrashingChannel)];
        let mut sampler = SyncSampler::new(
            TimerSource::new(20_000.0),
            channels,
            settings(1000.0, 5),
            ManualClock::new(),
        )
        .unwrap();
        sampler.begin().unwrap();
        // Without containment this would run into the timeout instead.
        let err = sampler
            .wait_for_completion(Some(Duration::from_secs(10)), Duration::from_millis(1))
            .unwrap_err();
        assert!(matches!(err, SamplerError::Interrupted { collected: 0, .. }), "{err:?}");
        assert!(!sampler.source().is_running());
        assert_eq!(sampler.faults(), 1);
    }
    #[test]
    fn begin_resets_state_and_refuses_while_running() {
        let (mut sampler, source, _) = build(2, 3, vec![1]);
        sampler.begin().unwrap();
        assert_eq!(sampler.begin(), Err(SamplerError::AlreadyRunning));
        assert_eq!(source.fire_until_stopped(10), 3);
        sampler.begin().unwrap();
        assert_eq!(sampler.collected(), 0);
        assert!(sampler.snapshot().iter().all(|b| b.is_empty()));
        assert_eq!(source.starts(), 2);
        assert_eq!(source.frequency_hz(), Some(1000.0));
        assert_eq!(source.fire_until_stopped(10), 3);
    }
    #[test]
    fn event_is_skipped_while_buffers_are_borrowed() {
        let (mut sampler, source, _) = build(1, 5, vec![1]);
        sampler.begin().unwrap();
        sampler.with_buffers(|buffers| {
            assert!(source.fire());
            assert!(buffers[0].is_empty());
        });
        assert_eq!(sampler.busy_events(), 1);
        assert_eq!(sampler.collected(), 0);
        source.fire();
        assert_eq!(sampler.collected(), 1);
    }
    #[test]
    fn timer_driven_run_completes() {
        let clock = ManualClock::new();
        let channels = vec![
            boxed(SyntheticChannel::new(ChannelId(0), clock.clone()).latencies(vec![3])),
            boxed(SyntheticChannel::new(ChannelId(1), clock.clone()).latencies(vec![3])),
        ];
        let mut sampler = SyncSampler::new(
            TimerSource::new(20_000.0),
            channels,
            settings(2000.0, 25),
            clock,
        )
        .unwrap();
        sampler.begin().unwrap();
        let done = sampler
            .wait_for_completion(Some(Duration::from_secs(10)), Duration::from_millis(1))
            .unwrap();
        assert_eq!(done.collected, 25);
        assert!(!sampler.source().is_running());
        for buffer in sampler.snapshot() {
            assert_eq!(buffer.len(), 25);
            assert!(buffer.durations_us().all(|d| d == 3));
        }
    }
}
