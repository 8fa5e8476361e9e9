//! # Host 契约模块
//!
//! 音频子系统对宿主的三份能力契约。
//!
//! ## 设计原则
//!
//! - 核心**不解码、不混音、不计时**：样本播放由 [`TrackHandle`] 承担，
//!   资源查找由 [`TrackCache`] 承担，渐变时间轴由 [`Scheduler`] 承担
//! - 单线程协作模型：宿主在帧循环中推进调度器，渐变的进度与完成通过
//!   [`crate::audio::AudioSessionManager::on_fade_step`] /
//!   [`crate::audio::AudioSessionManager::on_fade_complete`] 回到核心
//! - 句柄独占：`Box<dyn TrackHandle>` 由会话管理器独占持有，
//!   销毁即 Drop，替换时绝不共享、绝不泄漏

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

/// 渐变句柄 id
///
/// 由调度器分配，核心持有以便取消。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FadeId(pub u64);

impl FadeId {
    /// 创建新的渐变 id
    pub fn new(id: u64) -> Self {
        Self(id)
    }
}

/// 音量渐变描述
///
/// 核心只声明"从 A 到 B 用时 D"；插值与缓动完全由宿主实现。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VolumeRamp {
    /// 起始音量
    pub from: f32,
    /// 目标音量
    pub to: f32,
    /// 渐变时长
    pub duration: Duration,
}

/// 轨道创建选项
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackOptions {
    /// 是否循环
    pub looping: bool,
    /// 初始音量
    pub initial_volume: f32,
}

/// 可播放轨道句柄（宿主实现）
///
/// 对应宿主音频后端的一个已创建音源。核心通过它控制播放与音量，
/// 丢弃句柄即要求宿主释放底层资源。
pub trait TrackHandle {
    /// 开始播放
    fn play(&mut self);
    /// 暂停
    fn pause(&mut self);
    /// 从暂停恢复
    fn resume(&mut self);
    /// 停止播放
    fn stop(&mut self);
    /// 设置音量（0.0 - 1.0）
    fn set_volume(&mut self, volume: f32);
    /// 当前音量
    fn volume(&self) -> f32;
}

/// 轨道资源缓存（宿主实现）
pub trait TrackCache {
    /// 资源是否存在
    fn exists(&self, key: &str) -> bool;
    /// 创建轨道句柄；资源缺失或创建失败返回 `None`
    fn create(&mut self, key: &str, options: TrackOptions) -> Option<Box<dyn TrackHandle>>;
}

/// 渐变调度器（宿主实现）
///
/// [`Scheduler::schedule`] 返回可取消的句柄；对已完成或已取消的
/// 句柄再次取消必须是无害的。
pub trait Scheduler {
    /// 调度一个音量渐变
    fn schedule(&mut self, ramp: VolumeRamp) -> FadeId;
    /// 取消进行中的渐变
    fn cancel(&mut self, id: FadeId);
}

/// 共享的缓存引用
pub type SharedTrackCache = Rc<RefCell<dyn TrackCache>>;

/// 共享的调度器引用
pub type SharedScheduler = Rc<RefCell<dyn Scheduler>>;
