//! # Context 模块
//!
//! 进程级演出上下文：注册表与音频会话的聚合根。
//!
//! ## 设计原则
//!
//! - **显式构造、显式传递**：协作者拿到的是注入的实例引用，
//!   不做环境全局查找；每个测试都能构造自己的新实例
//! - 两个成员互不依赖：注册表与音频会话各自独立工作，
//!   聚合只为统一生命周期入口

use crate::acts::ActRegistry;
use crate::audio::{
    AudioSessionManager, ContextAudioResolver, SharedScheduler, SharedTrackCache,
};

/// 进程级演出上下文
///
/// 生命周期与进程一致，在启动时构造一次并传给各个界面/场景。
#[derive(Debug)]
pub struct StageContext {
    /// 章节注册表
    pub acts: ActRegistry,
    /// 音频会话
    pub audio: AudioSessionManager,
}

impl StageContext {
    /// 构造上下文
    pub fn new(
        resolver: ContextAudioResolver,
        cache: SharedTrackCache,
        scheduler: SharedScheduler,
    ) -> Self {
        Self {
            acts: ActRegistry::new(),
            audio: AudioSessionManager::new(resolver, cache, scheduler),
        }
    }

    /// 新开局：章节指针复位，音频会话回到初始状态
    ///
    /// 注册的内容保持不变。
    pub fn new_game(&mut self) {
        self.acts.reset();
        self.audio.reset();
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::acts::fixtures::sample_act;
    use crate::audio::{FadeId, Scheduler, TrackCache, TrackHandle, TrackOptions, VolumeRamp};

    /// 最小宿主：不出声、不计时
    struct NullCache;

    impl TrackCache for NullCache {
        fn exists(&self, _key: &str) -> bool {
            false
        }

        fn create(&mut self, _key: &str, _options: TrackOptions) -> Option<Box<dyn TrackHandle>> {
            None
        }
    }

    #[derive(Default)]
    struct NullScheduler {
        next_id: u64,
    }

    impl Scheduler for NullScheduler {
        fn schedule(&mut self, _ramp: VolumeRamp) -> FadeId {
            self.next_id += 1;
            FadeId::new(self.next_id)
        }

        fn cancel(&mut self, _id: FadeId) {}
    }

    fn test_context() -> StageContext {
        StageContext::new(
            ContextAudioResolver::standard(),
            Rc::new(RefCell::new(NullCache)),
            Rc::new(RefCell::new(NullScheduler::default())),
        )
    }

    #[test]
    fn test_members_are_independent() {
        let mut ctx = test_context();
        ctx.acts.register(sample_act(1));
        ctx.acts.register(sample_act(2));

        // 注册表操作不触碰音频会话
        assert!(ctx.acts.advance());
        assert_eq!(ctx.audio.current_track_key(), None);
    }

    #[test]
    fn test_new_game_resets_both() {
        let mut ctx = test_context();
        ctx.acts.register(sample_act(1));
        ctx.acts.register(sample_act(2));
        ctx.acts.advance();
        ctx.audio.bind_context("battle");
        ctx.audio.mute();

        ctx.new_game();
        assert_eq!(ctx.acts.current_id(), 1);
        assert_eq!(ctx.acts.len(), 2);
        assert_eq!(ctx.audio.bound_context(), None);
        assert!(!ctx.audio.is_muted());
    }
}
