// src/drivers/mod.rs
// 采样核心: 时基 -> 通道 -> 同步采样 -> 统计
pub mod buffer;
pub mod channel;
pub mod clock;
pub mod error;
pub mod sampler;
pub mod source;
pub mod stats;
// 公开导出这些模块里的结构体，方便外部调用
pub use buffer::SampleBuffer;
pub use channel::{SampleChannel, SimulatedAdc, SyntheticChannel};
pub use clock::{Clock, ManualClock, MonotonicClock};
pub use error::{ConversionFailure, SamplerError};
pub use sampler::{Completion, SamplerSettings, SyncSampler};
pub use source::{ManualSource, SignalSource, SourceCallback, SourceControl, TimerSource};
pub use stats::{summarize, summarize_pooled, LatencySummary, StatsReporter};
