//! # Audio 模块
//!
//! 背景音轨会话：解析表、宿主契约与会话状态机。
//!
//! - [`resolver`]：上下文 -> 音轨配置的静态映射
//! - [`host`]：宿主能力契约（句柄、缓存、调度器）
//! - [`session`]：会话管理器状态机
//! - [`timings`]：渐变时长配置

pub mod host;
pub mod resolver;
pub mod session;
pub mod timings;

pub use host::{
    FadeId, Scheduler, SharedScheduler, SharedTrackCache, TrackCache, TrackHandle,
    TrackOptions, VolumeRamp,
};
pub use resolver::{AudioTrackConfig, ContextAudioResolver};
pub use session::{AudioSessionManager, DEFAULT_VOLUME, PlaybackPhase, referenced_track_keys};
pub use timings::FadeTimings;
