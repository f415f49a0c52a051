// src/engine.rs
use std::fmt;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use log::{debug, info, warn};

use crate::config::AppConfig;
use crate::drivers::{
    Clock, MonotonicClock, SampleBuffer, SampleChannel, SamplerError, SamplerSettings,
    SignalSource, SimulatedAdc, StatsReporter, SyncSampler, TimerSource,
};
use crate::types::ChannelId;

/// Outcome of one acquisition run.
#[derive(Debug)]
pub struct AcquisitionReport {
    /// `false` when the run timed out or was interrupted before its budget.
    pub completed: bool,
    pub collected: usize,
    pub capacity: usize,
    pub elapsed: Duration,
    pub faults: usize,
    pub vref: f32,
    pub labels: Vec<(ChannelId, String)>,
    pub buffers: Vec<SampleBuffer>,
    pub stats: Option<StatsReporter>,
}

impl AcquisitionReport {
    /// Average acquisition duration across all channels, if anything was sampled.
    pub fn average_us(&self) -> Option<f64> {
        self.stats.as_ref().map(StatsReporter::average_us)
    }

    fn label(&self, channel: ChannelId) -> &str {
        self.labels
            .iter()
            .find(|(id, _)| *id == channel)
            .map(|(_, label)| label.as_str())
            .unwrap_or("?")
    }
}

impl fmt::Display for AcquisitionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = if self.completed { "complete" } else { "partial" };
        writeln!(
            f,
            "acquisition {status}: {}/{} cycles in {:.1} ms, {} faulted cycle(s)",
            self.collected,
            self.capacity,
            self.elapsed.as_secs_f64() * 1000.0,
            self.faults
        )?;
        for buffer in &self.buffers {
            let mean_volts = if buffer.is_empty() {
                0.0
            } else {
                buffer
                    .iter()
                    .map(|s| s.sample.to_volts(self.vref) as f64)
                    .sum::<f64>()
                    / buffer.len() as f64
            };
            write!(
                f,
                "  {:<8} {:>4}: {:>5} samples, mean {:.3} V",
                self.label(buffer.channel()),
                buffer.channel(),
                buffer.len(),
                mean_volts
            )?;
            if let Some(stats) = &self.stats {
                if let Some((_, summary)) =
                    stats.per_channel.iter().find(|(id, _)| *id == buffer.channel())
                {
                    write!(f, ", latency {summary}")?;
                }
            }
            writeln!(f)?;
        }
        match self.average_us() {
            Some(avg) => write!(f, "average acquisition duration: {avg:.3} us"),
            None => write!(f, "average acquisition duration: n/a"),
        }
    }
}

/// Builds the simulated inputs described by `config`, in declaration order.
pub fn build_channels(config: &AppConfig) -> Vec<Box<dyn SampleChannel>> {
    config
        .channels
        .iter()
        .map(|ch| {
            let adc = SimulatedAdc::new(ch.channel_id(), config.vref, ch.duty_cycle, config.seed)
                .with_noise(ch.noise_volts)
                .with_conversion_time(ch.conversion_us[0], ch.conversion_us[1]);
            Box::new(adc) as Box<dyn SampleChannel>
        })
        .collect()
}

/// Runs one acquisition against simulated hardware on a timer carrier.
pub fn run(config: &AppConfig) -> Result<AcquisitionReport> {
    config.validate()?;
    let settings = SamplerSettings {
        frequency_hz: config.carrier_hz,
        capacity: config.sample_budget,
    };
    let mut sampler = SyncSampler::new(
        TimerSource::new(config.max_carrier_hz),
        build_channels(config),
        settings,
        MonotonicClock::new(),
    )
    .context("invalid sampler configuration")?;
    let labels = config
        .channels
        .iter()
        .map(|ch| (ch.channel_id(), ch.label.clone()))
        .collect();
    acquire(
        &mut sampler,
        config.timeout(),
        config.poll_interval(),
        labels,
        config.vref,
    )
}

/// Starts `sampler`, waits (bounded by `timeout`) and summarises what it got.
///
/// Timeouts and interruptions are not errors here: the partial buffers are
/// reported with `completed == false`.
pub fn acquire<S: SignalSource, C: Clock>(
    sampler: &mut SyncSampler<S, C>,
    timeout: Option<Duration>,
    poll_interval: Duration,
    labels: Vec<(ChannelId, String)>,
    vref: f32,
) -> Result<AcquisitionReport> {
    let started = Instant::now();
    sampler.begin().context("failed to start sampling")?;
    let completed = match sampler.wait_for_completion(timeout, poll_interval) {
        Ok(done) => {
            debug!("budget reached after {:?}", done.elapsed);
            true
        }
        Err(SamplerError::Timeout {
            collected,
            capacity,
            waited_ms,
        }) => {
            warn!("no completion after {waited_ms} ms ({collected}/{capacity}); carrier forced off");
            false
        }
        Err(SamplerError::Interrupted {
            collected,
            capacity,
        }) => {
            warn!("sampling interrupted at {collected}/{capacity}");
            false
        }
        Err(e) => return Err(e).context("sampling failed"),
    };
    let faults = sampler.faults();
    if faults > 0 {
        let last = sampler
            .last_fault()
            .map(|f| f.to_string())
            .unwrap_or_default();
        warn!("{faults} cycle(s) discarded after conversion failures (last: {last})");
    }
    if sampler.spurious_events() > 0 {
        debug!("{} late carrier event(s) ignored", sampler.spurious_events());
    }
    let buffers = sampler.snapshot();
    let stats = match StatsReporter::from_buffers(&buffers) {
        Ok(stats) => {
            stats.log_summary();
            Some(stats)
        }
        Err(SamplerError::EmptyBuffer) => {
            warn!("no samples collected; latency statistics unavailable");
            None
        }
        Err(e) => return Err(e.into()),
    };
    let report = AcquisitionReport {
        completed,
        collected: sampler.collected(),
        capacity: sampler.capacity(),
        elapsed: started.elapsed(),
        faults,
        vref,
        labels,
        buffers,
        stats,
    };
    info!(
        "acquisition {} with {} cycle(s)",
        if report.completed { "finished" } else { "stopped early" },
        report.collected
    );
    Ok(report)
}
