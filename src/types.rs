// src/types.rs
use std::fmt;

/// Full-scale raw ADC code.
pub const SAMPLE_MAX: u16 = u16::MAX;

// 通道编号
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChannelId(pub u8);

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ch{}", self.0)
    }
}

/// Quantised 16-bit reading representing a voltage in `[0, vref]`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Sample(u16);

impl Sample {
    pub const fn new(raw: u16) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u16 {
        self.0
    }

    /// Quantises `volts`, clamping to the converter's input range.
    pub fn from_volts(volts: f32, vref: f32) -> Self {
        if !(vref > 0.0) || !volts.is_finite() {
            return Self(0);
        }
        let ratio = (volts / vref).clamp(0.0, 1.0);
        Self((ratio * SAMPLE_MAX as f32).round() as u16)
    }

    pub fn to_volts(self, vref: f32) -> f32 {
        self.0 as f32 / SAMPLE_MAX as f32 * vref
    }
}

// 一次带计时的读数
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimedSample {
    pub channel: ChannelId,
    pub sample: Sample,
    /// Elapsed monotonic time spent inside `read()`, microseconds.
    pub duration_us: u64,
}
