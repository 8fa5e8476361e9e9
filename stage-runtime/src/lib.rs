//! # Stage Runtime
//!
//! 游戏演出会话核心：章节目录与背景音轨会话的一对状态机。
//!
//! ## 架构概述
//!
//! `stage-runtime` 是纯逻辑核心，不做渲染、不解码音频、不自带计时器。
//! 它通过**能力契约**与宿主层（Host）协作：
//!
//! ```text
//! Host                               Runtime
//!   │                                   │
//!   │──── bind_context / play_* ──────►│
//!   │◄─── TrackCache::create ──────────│ （句柄独占移交）
//!   │◄─── Scheduler::schedule ─────────│
//!   │                                   │
//!   │──── on_fade_step/complete ──────►│ （渐变回调，状态机恢复点）
//! ```
//!
//! 界面/场景是外部协作者：它们报出自己的上下文名并调用核心操作，
//! 核心不依赖它们的任何逻辑。
//!
//! ## 核心类型
//!
//! - [`ActRegistry`]：章节定义目录与推进指针
//! - [`ContextAudioResolver`]：上下文 -> 音轨配置的静态映射
//! - [`AudioSessionManager`]：唯一"当前曲目"的生命周期状态机
//!
//! ## 失败语义
//!
//! 注册表的"未注册"对调用方致命（[`RegistryError`]）；音频路径的
//! 一切失败在本地吸收为警告 + no-op，缺失的音乐退化为静默。
//!
//! ## 模块结构
//!
//! - [`acts`]：章节定义、内容包与注册表
//! - [`audio`]：解析表、宿主契约、会话状态机
//! - [`context`]：进程级聚合根
//! - [`diagnostic`]：内容静态检查
//! - [`error`]：错误类型定义

pub mod acts;
pub mod audio;
pub mod context;
pub mod diagnostic;
pub mod error;

// 重导出核心类型
pub use acts::{
    ActDefinition, ActPack, ActRegistry, ActSummary, ActTheme, Color, ColorPalette,
    GeneratorKind, Tier,
};
pub use audio::{
    AudioSessionManager, AudioTrackConfig, ContextAudioResolver, DEFAULT_VOLUME, FadeId,
    FadeTimings, PlaybackPhase, Scheduler, SharedScheduler, SharedTrackCache, TrackCache,
    TrackHandle, TrackOptions, VolumeRamp,
};
pub use context::StageContext;
pub use diagnostic::{Diagnostic, DiagnosticLevel, analyze_pack, has_errors};
pub use error::{ContentError, RegistryError, StageError, StageResult};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_api_accessible() {
        // 验证所有公共类型都可以正常使用
        let registry = ActRegistry::new();
        assert!(registry.is_empty());

        let resolver = ContextAudioResolver::standard();
        assert!(resolver.contains("main_menu"));

        let _phase = PlaybackPhase::Idle;
        let _timings = FadeTimings::default();

        let err = RegistryError::NotRegistered { id: 1 };
        let _unified: StageError = err.into();
    }
}
