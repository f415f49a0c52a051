use std::fmt;
use log::info;
use crate::drivers::{SampleBuffer, SamplerError};
use crate::types::{ChannelId, TimedSample};
/// Aggregate acquisition latency over a set of readings.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LatencySummary {
    pub count: usize,
    pub mean_us: f64,
    pub min_us: u64,
    pub max_us: u64,
    /// Sample variance (n - 1); zero for a single reading.
    pub variance_us2: f64,
}
impl LatencySummary {
    pub fn std_dev_us(&self) -> f64 {
        self.variance_us2.sqrt()
    }
}
impl fmt::Display for LatencySummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "n={} mean={:.2}us min={}us max={}us sd={:.2}us",
            self.count,
            self.mean_us,
            self.min_us,
            self.max_us,
            self.std_dev_us()
        )
    }
}
/// Streaming accumulator (Welford) for acquisition durations.
#[derive(Clone, Debug, Default)]
pub struct LatencyStats {
    count: usize,
    mean: f64,
    m2: f64,
    min: u64,
    max: u64,
}
impl LatencyStats {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn update(&mut self, duration_us: u64) {
        let x = duration_us as f64;
        if self.count == 0 {
            self.min = duration_us;
            self.max = duration_us;
        } else {
            self.min = self.min.min(duration_us);
            self.max = self.max.max(duration_us);
        }
        self.count += 1;
        let delta = x - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (x - self.mean);
    }
    pub fn finalize(&self) -> Result<LatencySummary, SamplerError> {
        if self.count == 0 {
            return Err(SamplerError::EmptyBuffer);
        }
        let variance_us2 = if self.count > 1 {
            self.m2 / (self.count - 1) as f64
        } else {
            0.0
        };
        Ok(LatencySummary {
            count: self.count,
            mean_us: self.mean,
            min_us: self.min,
            max_us: self.max,
            variance_us2,
        })
    }
}
pub fn summarize_samples<'a>(
    samples: impl IntoIterator<Item = &'a TimedSample>,
) -> Result<LatencySummary, SamplerError> {
    let mut stats = LatencyStats::new();
    for sample in samples {
        stats.update(sample.duration_us);
    }
    stats.finalize()
}
/// Latency statistics of one channel's buffer.
pub fn summarize(buffer: &SampleBuffer) -> Result<LatencySummary, SamplerError> {
    summarize_samples(buffer.iter())
}
/// Latency statistics pooled across several buffers.
pub fn summarize_pooled(buffers: &[SampleBuffer]) -> Result<LatencySummary, SamplerError> {
    summarize_samples(buffers.iter().flat_map(|b| b.iter()))
}
/// Per-channel and pooled latency summaries of a finished run.
#[derive(Clone, Debug)]
pub struct StatsReporter {
    pub per_channel: Vec<(ChannelId, LatencySummary)>,
    pub pooled: LatencySummary,
}
impl StatsReporter {
    /// Fails with `EmptyBuffer` if any buffer holds no readings.
    pub fn from_buffers(buffers: &[SampleBuffer]) -> Result<Self, SamplerError> {
        let per_channel = buffers
            .iter()
            .map(|b| summarize(b).map(|s| (b.channel(), s)))
            .collect::<Result<Vec<_>, _>>()?;
        let pooled = summarize_pooled(buffers)?;
        Ok(Self {
            per_channel,
            pooled,
        })
    }
    /// Average acquisition duration across all channels, microseconds.
    pub fn average_us(&self) -> f64 {
        self.pooled.mean_us
    }
    pub fn log_summary(&self) {
        for (channel, summary) in &self.per_channel {
            info!("{channel}: {summary}");
        }
        info!("all channels: {}", self.pooled);
    }
}
