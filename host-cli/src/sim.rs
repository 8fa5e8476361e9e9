//! # 模拟宿主能力
//!
//! 调度器与资源缓存契约的帧驱动参考实现。线性插值、无缓动：
//! 真实宿主可以换成任意缓动曲线，核心不关心。

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::time::Duration;

use tracing::debug;

use stage_runtime::{FadeId, Scheduler, TrackCache, TrackHandle, TrackOptions, VolumeRamp};

/// 一次渐变步进的回灌数据
#[derive(Debug, Clone, Copy)]
pub struct FadeTick {
    /// 渐变 id
    pub id: FadeId,
    /// 当前值
    pub value: f32,
    /// 是否完成
    pub finished: bool,
}

/// 帧驱动的线性渐变调度器
#[derive(Default)]
pub struct SimScheduler {
    next_id: u64,
    ramps: HashMap<u64, (VolumeRamp, Duration)>,
}

impl SimScheduler {
    /// 推进一帧，返回每个渐变的步进数据
    pub fn advance(&mut self, dt: Duration) -> Vec<FadeTick> {
        let mut ticks = Vec::new();
        let mut finished = Vec::new();
        let mut ids: Vec<u64> = self.ramps.keys().copied().collect();
        ids.sort_unstable();
        for id in ids {
            let Some((ramp, elapsed)) = self.ramps.get_mut(&id) else {
                continue;
            };
            *elapsed += dt;
            let progress = if ramp.duration.is_zero() {
                1.0
            } else {
                (elapsed.as_secs_f32() / ramp.duration.as_secs_f32()).min(1.0)
            };
            let value = ramp.from + (ramp.to - ramp.from) * progress;
            let done = progress >= 1.0;
            ticks.push(FadeTick {
                id: FadeId::new(id),
                value,
                finished: done,
            });
            if done {
                finished.push(id);
            }
        }
        for id in finished {
            self.ramps.remove(&id);
        }
        ticks
    }
}

impl Scheduler for SimScheduler {
    fn schedule(&mut self, ramp: VolumeRamp) -> FadeId {
        self.next_id += 1;
        debug!(id = self.next_id, from = ramp.from, to = ramp.to, "调度渐变");
        self.ramps.insert(self.next_id, (ramp, Duration::ZERO));
        FadeId::new(self.next_id)
    }

    fn cancel(&mut self, id: FadeId) {
        if self.ramps.remove(&id.0).is_some() {
            debug!(id = id.0, "取消渐变");
        }
    }
}

/// 轨道的可观测状态
#[derive(Debug, Default)]
pub struct TrackState {
    pub playing: bool,
    pub destroyed: bool,
    pub volume: f32,
}

/// 只记日志的轨道句柄
pub struct LogTrack {
    key: String,
    state: Rc<RefCell<TrackState>>,
}

impl TrackHandle for LogTrack {
    fn play(&mut self) {
        debug!(key = %self.key, "播放");
        self.state.borrow_mut().playing = true;
    }

    fn pause(&mut self) {
        debug!(key = %self.key, "暂停");
        self.state.borrow_mut().playing = false;
    }

    fn resume(&mut self) {
        debug!(key = %self.key, "恢复");
        self.state.borrow_mut().playing = true;
    }

    fn stop(&mut self) {
        debug!(key = %self.key, "停止");
        self.state.borrow_mut().playing = false;
    }

    fn set_volume(&mut self, volume: f32) {
        self.state.borrow_mut().volume = volume;
    }

    fn volume(&self) -> f32 {
        self.state.borrow().volume
    }
}

impl Drop for LogTrack {
    fn drop(&mut self) {
        debug!(key = %self.key, "释放底层资源");
        self.state.borrow_mut().destroyed = true;
    }
}

/// 内存资源缓存
///
/// `missing` 中的键报告为不存在，用于演示降级为静默的路径。
pub struct SimCache {
    missing: Vec<String>,
    created: Vec<(String, Rc<RefCell<TrackState>>)>,
}

impl SimCache {
    /// 创建缓存
    pub fn new(missing: Vec<String>) -> Self {
        Self {
            missing,
            created: Vec::new(),
        }
    }

    /// 尚未销毁的轨道数
    pub fn live_count(&self) -> usize {
        self.created
            .iter()
            .filter(|(_, state)| !state.borrow().destroyed)
            .count()
    }
}

impl TrackCache for SimCache {
    fn exists(&self, key: &str) -> bool {
        !self.missing.iter().any(|m| m == key)
    }

    fn create(&mut self, key: &str, options: TrackOptions) -> Option<Box<dyn TrackHandle>> {
        if !self.exists(key) {
            return None;
        }
        let state = Rc::new(RefCell::new(TrackState {
            volume: options.initial_volume,
            ..TrackState::default()
        }));
        self.created.push((key.to_string(), state.clone()));
        Some(Box::new(LogTrack {
            key: key.to_string(),
            state,
        }))
    }
}
