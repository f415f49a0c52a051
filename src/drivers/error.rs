use thiserror::Error;
use crate::types::ChannelId;
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SamplerError {
    #[error("invalid carrier frequency {frequency_hz} Hz: {reason}")]
    InvalidFrequency { frequency_hz: f32, reason: String },
    #[error("sample budget must be greater than zero")]
    InvalidCapacity,
    #[error("at least one channel is required")]
    NoChannels,
    #[error("channel {0} declared more than once")]
    DuplicateChannel(ChannelId),
    #[error("buffer is empty; nothing to summarize")]
    EmptyBuffer,
    #[error("timed out after {waited_ms} ms with {collected}/{capacity} samples collected")]
    Timeout {
        collected: usize,
        capacity: usize,
        waited_ms: u128,
    },
    #[error("sampling stopped with {collected}/{capacity} samples collected")]
    Interrupted { collected: usize, capacity: usize },
    #[error("signal source is already running")]
    AlreadyRunning,
    #[error("signal source could not be started: {0}")]
    SourceFailure(String),
}
impl SamplerError {
    pub fn invalid_frequency(frequency_hz: f32, reason: impl Into<String>) -> Self {
        SamplerError::InvalidFrequency {
            frequency_hz,
            reason: reason.into(),
        }
    }
}
/// Fault raised by a channel whose conversion did not complete.
///
/// Only ever observed inside the sampling callback, which contains it.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("conversion failed on channel {channel} (read #{read_index})")]
pub struct ConversionFailure {
    pub channel: ChannelId,
    pub read_index: u64,
}
