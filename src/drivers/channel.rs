use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use crate::drivers::clock::ManualClock;
use crate::drivers::ConversionFailure;
use crate::types::{ChannelId, Sample};
/// One analog input.
pub trait SampleChannel: Send {
    fn id(&self) -> ChannelId;
    /// Blocking conversion. Latency is bounded but varies between calls.
    fn read(&mut self) -> Result<Sample, ConversionFailure>;
    /// Worst-case conversion time in microseconds, if known.
    fn latency_hint_us(&self) -> u64 {
        0
    }
}
/// Simulated successive-approximation ADC watching an RC-filtered PWM pin.
///
/// The settled input is `duty_cycle * vref`; every read adds uniform noise and
/// busy-waits a conversion time drawn from `conversion_us`.
pub struct SimulatedAdc {
    id: ChannelId,
    vref: f32,
    level_volts: f32,
    noise_volts: f32,
    conversion_us: (u64, u64),
    rng: StdRng,
}
impl SimulatedAdc {
    pub fn new(id: ChannelId, vref: f32, duty_cycle: f32, seed: u64) -> Self {
        Self {
            id,
            vref,
            level_volts: duty_cycle.clamp(0.0, 1.0) * vref,
            noise_volts: 0.0,
            conversion_us: (0, 0),
            // 每个通道用不同的种子, 避免噪声完全相关
            rng: StdRng::seed_from_u64(seed ^ u64::from(id.0)),
        }
    }
    pub fn with_noise(mut self, noise_volts: f32) -> Self {
        self.noise_volts = noise_volts.max(0.0);
        self
    }
    pub fn with_conversion_time(mut self, min_us: u64, max_us: u64) -> Self {
        self.conversion_us = (min_us.min(max_us), min_us.max(max_us));
        self
    }
}
impl SampleChannel for SimulatedAdc {
    fn id(&self) -> ChannelId {
        self.id
    }
    fn read(&mut self) -> Result<Sample, ConversionFailure> {
        let (min_us, max_us) = self.conversion_us;
        let conversion = self.rng.gen_range(min_us..=max_us);
        spin_for(Duration::from_micros(conversion));
        let noise = if self.noise_volts > 0.0 {
            self.rng.gen_range(-self.noise_volts..=self.noise_volts)
        } else {
            0.0
        };
        Ok(Sample::from_volts(self.level_volts + noise, self.vref))
    }
    fn latency_hint_us(&self) -> u64 {
        self.conversion_us.1
    }
}
// sleep() 的粒度太粗, 转换时间只能忙等
fn spin_for(duration: Duration) {
    let until = Instant::now() + duration;
    while Instant::now() < until {
        std::hint::spin_loop();
    }
}
/// Deterministic channel for tests and playback.
///
/// Each read advances a shared `ManualClock` by the next entry of a
/// round-robin latency list, returns the next value of a round-robin value
/// list, and fails on the configured (1-based) read numbers.
pub struct SyntheticChannel {
    id: ChannelId,
    clock: ManualClock,
    latencies_us: Vec<u64>,
    values: Vec<u16>,
    fail_on: Vec<u64>,
    read_log: Option<Arc<Mutex<Vec<ChannelId>>>>,
    reads: u64,
}
impl SyntheticChannel {
    pub fn new(id: ChannelId, clock: ManualClock) -> Self {
        Self {
            id,
            clock,
            latencies_us: vec![0],
            values: vec![0],
            fail_on: Vec::new(),
            read_log: None,
            reads: 0,
        }
    }
    pub fn latencies(mut self, latencies_us: Vec<u64>) -> Self {
        if !latencies_us.is_empty() {
            self.latencies_us = latencies_us;
        }
        self
    }
    pub fn values(mut self, values: Vec<u16>) -> Self {
        if !values.is_empty() {
            self.values = values;
        }
        self
    }
    pub fn fail_on_read(mut self, read_number: u64) -> Self {
        self.fail_on.push(read_number);
        self
    }
    /// Appends this channel's id to `log` on every read attempt.
    pub fn record_order(mut self, log: Arc<Mutex<Vec<ChannelId>>>) -> Self {
        self.read_log = Some(log);
        self
    }
    pub fn reads(&self) -> u64 {
        self.reads
    }
}
impl SampleChannel for SyntheticChannel {
    fn id(&self) -> ChannelId {
        self.id
    }
    fn read(&mut self) -> Result<Sample, ConversionFailure> {
        let slot = self.reads as usize;
        self.reads += 1;
        if let Some(log) = &self.read_log {
            log.lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(self.id);
        }
        self.clock
            .advance(self.latencies_us[slot % self.latencies_us.len()]);
        if self.fail_on.contains(&self.reads) {
            return Err(ConversionFailure {
                channel: self.id,
                read_index: self.reads,
            });
        }
        Ok(Sample::new(self.values[slot % self.values.len()]))
    }
    fn latency_hint_us(&self) -> u64 {
        self.latencies_us.iter().copied().max().unwrap_or(0)
    }
}
