// src/config.rs
use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{ensure, Context, Result};
use serde::{Deserialize, Serialize};

use crate::types::ChannelId;

/// One analog input as described in the configuration file.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelConfig {
    pub id: u8,
    pub label: String,
    /// Duty cycle of the PWM output feeding this (RC-filtered) input.
    pub duty_cycle: f32,
    /// Simulated conversion time range `[min, max]` in microseconds.
    pub conversion_us: [u64; 2],
    pub noise_volts: f32,
}

impl ChannelConfig {
    pub fn new(id: u8, duty_cycle: f32) -> Self {
        Self {
            id,
            label: format!("ADC{id}"),
            duty_cycle,
            ..Self::default()
        }
    }

    pub fn channel_id(&self) -> ChannelId {
        ChannelId(self.id)
    }
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            id: 0,
            label: "ADC0".to_owned(),
            duty_cycle: 0.5,
            conversion_us: [2, 8],
            noise_volts: 0.01,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Carrier (sampling trigger) frequency.
    pub carrier_hz: f32,
    /// Readings collected per channel before sampling halts.
    pub sample_budget: usize,
    /// Bound on the completion wait; `null` waits forever.
    pub timeout_ms: Option<u64>,
    pub poll_interval_ms: u64,
    /// Fastest carrier the timer can generate.
    pub max_carrier_hz: f32,
    pub vref: f32,
    pub seed: u64,
    pub channels: Vec<ChannelConfig>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            carrier_hz: 1000.0,
            sample_budget: 100,
            timeout_ms: Some(5000),
            poll_interval_ms: 1,
            max_carrier_hz: 20_000.0,
            vref: 3.3,
            seed: 7,
            channels: vec![ChannelConfig::new(0, 0.25), ChannelConfig::new(1, 0.75)],
        }
    }
}

impl AppConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let config = Self::from_json(&text)
            .with_context(|| format!("invalid config file {}", path.display()))?;
        Ok(config)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text).context("failed to parse JSON")?;
        config.validate()?;
        Ok(config)
    }

    /// Checks what the sampler itself does not: hardware-model parameters.
    /// Frequency and channel-list rules are enforced when the sampler is built.
    pub fn validate(&self) -> Result<()> {
        ensure!(self.sample_budget > 0, "sample_budget must be greater than zero");
        ensure!(!self.channels.is_empty(), "at least one channel is required");
        ensure!(
            self.vref.is_finite() && self.vref > 0.0,
            "vref must be positive, got {}",
            self.vref
        );
        ensure!(
            self.max_carrier_hz.is_finite() && self.max_carrier_hz > 0.0,
            "max_carrier_hz must be positive, got {}",
            self.max_carrier_hz
        );
        for channel in &self.channels {
            ensure!(
                (0.0..=1.0).contains(&channel.duty_cycle),
                "channel {}: duty_cycle {} outside [0, 1]",
                channel.id,
                channel.duty_cycle
            );
            ensure!(
                channel.conversion_us[0] <= channel.conversion_us[1],
                "channel {}: conversion_us min exceeds max",
                channel.id
            );
            ensure!(
                channel.noise_volts >= 0.0,
                "channel {}: noise_volts must not be negative",
                channel.id
            );
        }
        Ok(())
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }
}
