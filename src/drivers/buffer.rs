use crate::types::{ChannelId, TimedSample};
/// Append-only, bounded store of timed readings for one channel.
///
/// Storage for `capacity` entries is reserved up front, so `push` never
/// reallocates while sampling is running.
#[derive(Clone, Debug)]
pub struct SampleBuffer {
    channel: ChannelId,
    samples: Vec<TimedSample>,
    capacity: usize,
}
impl SampleBuffer {
    pub fn with_capacity(channel: ChannelId, capacity: usize) -> Self {
        Self {
            channel,
            samples: Vec::with_capacity(capacity),
            capacity,
        }
    }
    pub fn channel(&self) -> ChannelId {
        self.channel
    }
    pub fn capacity(&self) -> usize {
        self.capacity
    }
    pub fn len(&self) -> usize {
        self.samples.len()
    }
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
    pub fn is_full(&self) -> bool {
        self.samples.len() >= self.capacity
    }
    /// Appends one reading. Returns `false` (and drops it) once full.
    pub fn push(&mut self, sample: TimedSample) -> bool {
        if self.is_full() {
            return false;
        }
        self.samples.push(sample);
        true
    }
    pub fn clear(&mut self) {
        self.samples.clear();
    }
    pub fn iter(&self) -> impl Iterator<Item = &TimedSample> {
        self.samples.iter()
    }
    pub fn durations_us(&self) -> impl Iterator<Item = u64> + '_ {
        self.samples.iter().map(|s| s.duration_us)
    }
}
