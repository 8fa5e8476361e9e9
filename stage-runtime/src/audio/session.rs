//! # Session 模块
//!
//! 背景音轨会话管理器：进程内唯一"当前曲目"的生命周期状态机。
//!
//! ## 执行模型
//!
//! ```text
//! Host                                Session
//!   │── bind_context / play_* ─────────►│ 调度渐变，立即返回
//!   │◄─ Scheduler::schedule ────────────│
//!   │                                   │
//!   │  （宿主帧循环推进时间轴）            │
//!   │── on_fade_step(id, value) ───────►│ 音量落到句柄
//!   │── on_fade_complete(id) ──────────►│ 状态机在此恢复推进
//! ```
//!
//! 所有操作立即返回；淡入/淡出/交叉切换的收尾都发生在完成回调里。
//!
//! ## 失败语义
//!
//! 播放路径的一切失败（资源缺失、上下文未绑定、无表项、状态不符）
//! 都在本地吸收：记录警告后降级为 no-op。音频永远不允许让界面切换
//! 崩溃，缺失的音乐退化为静默。

use std::collections::HashSet;
use std::fmt;

use tracing::{debug, warn};

use crate::audio::host::{
    FadeId, SharedScheduler, SharedTrackCache, TrackHandle, TrackOptions, VolumeRamp,
};
use crate::audio::resolver::{AudioTrackConfig, ContextAudioResolver};
use crate::audio::timings::FadeTimings;

/// 默认音量
pub const DEFAULT_VOLUME: f32 = 1.0;

/// 播放阶段
///
/// # 状态转换
///
/// ```text
/// Idle        -> 无资源；初始状态，reset 后回到这里
/// Playing     -> 稳定播放
/// FadingIn    -> 淡入中，完成后进入 Playing
/// FadingOut   -> 淡出中，完成后销毁资源；若有接续请求则继续播放
/// Paused      -> 已暂停，resume 后回到 Playing
/// Crossfading -> 新曲目淡入、旧曲目独立淡出，两个渐变并行
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackPhase {
    /// 无资源
    #[default]
    Idle,
    /// 稳定播放
    Playing,
    /// 淡入中
    FadingIn,
    /// 淡出销毁中
    FadingOut,
    /// 已暂停
    Paused,
    /// 交叉切换中
    Crossfading,
}

impl PlaybackPhase {
    /// 当前曲目是否可听（重复播放守卫的判定依据）
    pub fn is_audible(&self) -> bool {
        matches!(self, Self::Playing | Self::FadingIn | Self::Crossfading)
    }
}

/// 已解析的播放请求
#[derive(Debug, Clone, PartialEq)]
struct PlayRequest {
    key: String,
    volume: f32,
    fade_in: bool,
    looping: bool,
}

impl PlayRequest {
    fn from_config(config: &AudioTrackConfig) -> Self {
        Self {
            key: config.track_key.clone(),
            volume: config.volume,
            fade_in: config.fade_in,
            looping: config.looping,
        }
    }
}

/// 当前曲目（句柄独占持有）
struct CurrentTrack {
    key: String,
    handle: Box<dyn TrackHandle>,
}

/// 交叉切换中淡出的旧曲目
///
/// 淡出完成即销毁；在那之前它不再是"当前"，只是余音。
struct OutgoingTrack {
    handle: Box<dyn TrackHandle>,
    fade: FadeId,
}

/// 进行中渐变的用途
enum FadeKind {
    /// 淡入至目标音量
    In,
    /// 淡出；完成后销毁当前曲目，若携带接续请求则继续播放
    Out { pending: Option<PlayRequest> },
    /// 平滑调音
    Volume,
}

/// 当前曲目上进行中的渐变
///
/// 同一资源上最多一个；任何要开启新渐变的操作先取消它。
struct InFlightFade {
    id: FadeId,
    kind: FadeKind,
}

/// 背景音轨会话管理器
///
/// 同一时刻最多独占持有一个"当前"句柄；开新曲目总是先拆掉旧的。
/// 交叉切换期间旧句柄短暂存活于淡出集合中，但"当前"指针已翻转。
///
/// # 使用示例
///
/// ```ignore
/// let mut session = AudioSessionManager::new(
///     ContextAudioResolver::standard(),
///     cache.clone(),
///     scheduler.clone(),
/// );
///
/// session.bind_context("main_menu");
/// session.play_for_bound_context(None);
///
/// // 宿主帧循环里：
/// for tick in scheduler_ticks {
///     session.on_fade_step(tick.id, tick.value);
///     if tick.finished {
///         session.on_fade_complete(tick.id);
///     }
/// }
/// ```
pub struct AudioSessionManager {
    /// 资源缓存（宿主能力）
    cache: SharedTrackCache,
    /// 渐变调度器（宿主能力）
    scheduler: SharedScheduler,
    /// 上下文解析表
    resolver: ContextAudioResolver,
    /// 渐变时长配置
    timings: FadeTimings,
    /// 播放阶段
    phase: PlaybackPhase,
    /// 当前曲目
    current: Option<CurrentTrack>,
    /// 交叉淡出中的旧曲目
    outgoing: Vec<OutgoingTrack>,
    /// 当前曲目上进行中的渐变
    in_flight: Option<InFlightFade>,
    /// 解除静音时要恢复的音量
    target_volume: f32,
    /// 记忆的默认音量（play_explicit 省略音量时使用）
    default_volume: f32,
    /// 是否静音
    muted: bool,
    /// 绑定的上下文名
    bound_context: Option<String>,
}

impl fmt::Debug for AudioSessionManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AudioSessionManager")
            .field("phase", &self.phase)
            .field("current", &self.current.as_ref().map(|c| c.key.as_str()))
            .field("outgoing", &self.outgoing.len())
            .field("muted", &self.muted)
            .field("bound_context", &self.bound_context)
            .finish()
    }
}

impl AudioSessionManager {
    /// 创建会话管理器
    pub fn new(
        resolver: ContextAudioResolver,
        cache: SharedTrackCache,
        scheduler: SharedScheduler,
    ) -> Self {
        Self {
            cache,
            scheduler,
            resolver,
            timings: FadeTimings::default(),
            phase: PlaybackPhase::Idle,
            current: None,
            outgoing: Vec::new(),
            in_flight: None,
            target_volume: DEFAULT_VOLUME,
            default_volume: DEFAULT_VOLUME,
            muted: false,
            bound_context: None,
        }
    }

    /// 覆盖渐变时长配置
    pub fn with_timings(mut self, timings: FadeTimings) -> Self {
        self.timings = timings;
        self
    }

    // ========== 上下文 ==========

    /// 绑定活动上下文
    ///
    /// 纯记录，对播放无副作用。
    pub fn bind_context(&mut self, name: impl Into<String>) {
        self.bound_context = Some(name.into());
    }

    /// 为当前上下文播放默认音轨
    ///
    /// 解析 `override_name`（缺省时用已绑定的上下文）对应的表项。
    /// 未绑定或无表项时警告并保持静默，缺音乐配置绝不允许
    /// 让界面切换失败。
    pub fn play_for_bound_context(&mut self, override_name: Option<&str>) {
        let Some(name) = override_name
            .map(str::to_string)
            .or_else(|| self.bound_context.clone())
        else {
            warn!("未绑定上下文，忽略播放请求");
            return;
        };
        let request = match self.resolver.resolve(&name) {
            Some(config) => PlayRequest::from_config(config),
            None => {
                warn!(context = %name, "上下文无音轨表项，保持静默");
                return;
            }
        };
        self.play_track(request);
    }

    /// 绕过解析表直接播放
    ///
    /// 省略的参数取默认值：音量用记忆的默认音量，淡入与循环为 true。
    pub fn play_explicit(
        &mut self,
        key: impl Into<String>,
        volume: Option<f32>,
        fade_in: Option<bool>,
        looping: Option<bool>,
    ) {
        let request = PlayRequest {
            key: key.into(),
            volume: volume.unwrap_or(self.default_volume).clamp(0.0, 1.0),
            fade_in: fade_in.unwrap_or(true),
            looping: looping.unwrap_or(true),
        };
        self.play_track(request);
    }

    // ========== 播放控制 ==========

    /// 停止当前曲目
    ///
    /// `fade_out` 为 true 时先淡出再销毁，否则立即销毁。
    /// 无曲目时为 no-op。同资源上进行中的渐变被取代，绝不叠加。
    pub fn stop(&mut self, fade_out: bool) {
        if self.current.is_none() {
            return;
        }
        self.cancel_in_flight();
        if fade_out {
            let from = self.current_volume();
            let id = self.scheduler.borrow_mut().schedule(VolumeRamp {
                from,
                to: 0.0,
                duration: self.timings.fade_out,
            });
            self.in_flight = Some(InFlightFade {
                id,
                kind: FadeKind::Out { pending: None },
            });
            self.phase = PlaybackPhase::FadingOut;
        } else {
            self.destroy_current();
            self.phase = PlaybackPhase::Idle;
        }
    }

    /// 暂停
    ///
    /// 仅在播放或淡入中有效，其余阶段为 no-op。淡入中的渐变被取消
    /// 并落到目标音量，再暂停。
    pub fn pause(&mut self) {
        if !matches!(
            self.phase,
            PlaybackPhase::Playing | PlaybackPhase::FadingIn
        ) {
            debug!(phase = ?self.phase, "pause 在当前阶段无效，忽略");
            return;
        }
        let had_fade = self.cancel_in_flight();
        let settle = if had_fade && !self.muted {
            Some(self.target_volume)
        } else {
            None
        };
        if let Some(cur) = self.current.as_mut() {
            if let Some(volume) = settle {
                cur.handle.set_volume(volume);
            }
            cur.handle.pause();
        }
        self.phase = PlaybackPhase::Paused;
    }

    /// 从暂停恢复
    ///
    /// 仅在已暂停时有效，其余阶段为 no-op。
    pub fn resume(&mut self) {
        if self.phase != PlaybackPhase::Paused {
            debug!(phase = ?self.phase, "resume 在当前阶段无效，忽略");
            return;
        }
        if let Some(cur) = self.current.as_mut() {
            cur.handle.resume();
        }
        self.phase = PlaybackPhase::Playing;
    }

    /// 设置音量
    ///
    /// 同时更新记忆的默认音量。静音中只记录目标值，不产生可闻变化，
    /// 解除静音时按新值恢复。`smooth` 为 true 时平滑渐变过去，
    /// 否则立即生效。淡出销毁序列不被调音打扰。
    pub fn set_volume(&mut self, volume: f32, smooth: bool) {
        let volume = volume.clamp(0.0, 1.0);
        self.default_volume = volume;
        self.target_volume = volume;

        if self.phase == PlaybackPhase::FadingOut {
            return;
        }
        if self.muted {
            debug!(volume, "静音中，仅记录目标音量");
            return;
        }
        if self.current.is_none() {
            return;
        }

        self.cancel_in_flight();
        if smooth {
            let from = self.current_volume();
            let id = self.scheduler.borrow_mut().schedule(VolumeRamp {
                from,
                to: volume,
                duration: self.timings.volume_ramp,
            });
            self.in_flight = Some(InFlightFade {
                id,
                kind: FadeKind::Volume,
            });
        } else if let Some(cur) = self.current.as_mut() {
            cur.handle.set_volume(volume);
        }
        if self.phase == PlaybackPhase::FadingIn {
            self.phase = PlaybackPhase::Playing;
        }
    }

    /// 静音
    ///
    /// 立即把可闻音量压到 0，不改动目标音量，也不打扰任何渐变的
    /// 时间轴（静音期间渐变步进不落到句柄上）。
    pub fn mute(&mut self) {
        if self.muted {
            return;
        }
        self.muted = true;
        if let Some(cur) = self.current.as_mut() {
            cur.handle.set_volume(0.0);
        }
        for out in &mut self.outgoing {
            out.handle.set_volume(0.0);
        }
    }

    /// 解除静音
    ///
    /// 立即恢复到目标音量；进行中的渐变在下一步继续接管。
    /// 淡出销毁中的曲目保持静默走完销毁。
    pub fn unmute(&mut self) {
        if !self.muted {
            return;
        }
        self.muted = false;
        if self.phase != PlaybackPhase::FadingOut {
            if let Some(cur) = self.current.as_mut() {
                cur.handle.set_volume(self.target_volume);
            }
        }
    }

    /// 切换静音状态
    pub fn toggle_mute(&mut self) {
        if self.muted {
            self.unmute();
        } else {
            self.mute();
        }
    }

    /// 交叉切换到另一曲目
    ///
    /// 旧曲目移交独立淡出（完成即销毁），新曲目从 0 淡入到目标音量，
    /// 两个渐变**并行**，这是它与 `stop` + 播放的区别。"当前"指针
    /// 立即翻转到新曲目。目标即当前曲目时为 no-op。
    ///
    /// 淡出期间新旧两路短暂同时出声；是否允许两个音源并发可闻
    /// 取决于宿主后端的通道上限，核心不做约束。
    pub fn crossfade_to(&mut self, key: impl Into<String>, volume: Option<f32>) {
        let key = key.into();
        if self.current.as_ref().is_some_and(|c| c.key == key) {
            debug!(key = %key, "交叉切换目标即当前曲目，忽略");
            return;
        }
        let volume = volume.unwrap_or(self.default_volume).clamp(0.0, 1.0);

        // 无当前曲目：退化为带淡入的普通播放
        if self.current.is_none() {
            self.play_track(PlayRequest {
                key,
                volume,
                fade_in: true,
                looping: true,
            });
            return;
        }

        // 目标资源缺失：当前曲目不受影响
        if !self.cache.borrow().exists(&key) {
            warn!(key = %key, "音轨资源缺失，交叉切换取消");
            return;
        }

        self.cancel_in_flight();
        if let Some(old) = self.current.take() {
            let from = old.handle.volume();
            let fade = self.scheduler.borrow_mut().schedule(VolumeRamp {
                from,
                to: 0.0,
                duration: self.timings.fade_out,
            });
            debug!(key = %old.key, "旧曲目进入交叉淡出");
            self.outgoing.push(OutgoingTrack {
                handle: old.handle,
                fade,
            });
        }

        let handle = self.cache.borrow_mut().create(
            &key,
            TrackOptions {
                looping: true,
                initial_volume: 0.0,
            },
        );
        let Some(mut handle) = handle else {
            warn!(key = %key, "音轨创建失败，保持静默");
            self.phase = PlaybackPhase::Idle;
            return;
        };
        handle.play();
        debug!(key = %key, volume, "新曲目进入交叉淡入");
        self.current = Some(CurrentTrack { key, handle });
        self.target_volume = volume;
        if self.muted {
            self.in_flight = None;
        } else {
            let id = self.scheduler.borrow_mut().schedule(VolumeRamp {
                from: 0.0,
                to: volume,
                duration: self.timings.fade_in,
            });
            self.in_flight = Some(InFlightFade {
                id,
                kind: FadeKind::In,
            });
        }
        self.phase = PlaybackPhase::Crossfading;
    }

    /// 无条件静默并释放所有资源，不带淡出
    ///
    /// 用于场景硬拆除。绑定的上下文与音量记忆保持不变。
    pub fn stop_all(&mut self) {
        self.cancel_in_flight();
        for out in &mut self.outgoing {
            self.scheduler.borrow_mut().cancel(out.fade);
            out.handle.stop();
        }
        self.outgoing.clear();
        self.destroy_current();
        self.phase = PlaybackPhase::Idle;
    }

    /// 回到初始状态，如同新构造
    ///
    /// 等价于无淡出停止，再清除绑定上下文、静音标记并恢复默认音量。
    pub fn reset(&mut self) {
        self.stop_all();
        self.bound_context = None;
        self.muted = false;
        self.target_volume = DEFAULT_VOLUME;
        self.default_volume = DEFAULT_VOLUME;
    }

    // ========== 渐变回调 ==========

    /// 渐变步进（宿主每帧回调）
    ///
    /// 静音期间渐变照常计时，但音量不落到句柄上。
    pub fn on_fade_step(&mut self, id: FadeId, value: f32) {
        if self.muted {
            return;
        }
        if let Some(fade) = &self.in_flight {
            if fade.id == id {
                if let Some(cur) = self.current.as_mut() {
                    cur.handle.set_volume(value);
                }
                return;
            }
        }
        if let Some(out) = self.outgoing.iter_mut().find(|o| o.fade == id) {
            out.handle.set_volume(value);
        }
    }

    /// 渐变完成（宿主回调）
    ///
    /// 状态机唯一的异步恢复点：淡入收尾、淡出销毁与接续播放、
    /// 交叉切换的旧曲目销毁都在这里完成。已取消渐变的完成通知
    /// 会被忽略。
    pub fn on_fade_complete(&mut self, id: FadeId) {
        // 交叉淡出完成：销毁旧曲目
        if let Some(pos) = self.outgoing.iter().position(|o| o.fade == id) {
            let mut out = self.outgoing.remove(pos);
            out.handle.stop();
            debug!("交叉淡出完成，旧曲目销毁");
            // 静音下的交叉切换没有淡入侧，在此收尾
            if self.phase == PlaybackPhase::Crossfading
                && self.in_flight.is_none()
                && self.current.is_some()
            {
                self.phase = PlaybackPhase::Playing;
            }
            return;
        }

        let Some(fade) = self.in_flight.take_if(|f| f.id == id) else {
            return;
        };
        match fade.kind {
            FadeKind::In => {
                if !self.muted {
                    if let Some(cur) = self.current.as_mut() {
                        cur.handle.set_volume(self.target_volume);
                    }
                }
                debug!("淡入完成");
                self.phase = PlaybackPhase::Playing;
            }
            FadeKind::Volume => {
                if !self.muted {
                    if let Some(cur) = self.current.as_mut() {
                        cur.handle.set_volume(self.target_volume);
                    }
                }
                // 交叉切换中被调音打断了淡入侧：旧曲目已清空则收尾
                if self.phase == PlaybackPhase::Crossfading && self.outgoing.is_empty() {
                    self.phase = PlaybackPhase::Playing;
                }
            }
            FadeKind::Out { pending } => {
                self.destroy_current();
                self.phase = PlaybackPhase::Idle;
                if let Some(request) = pending {
                    self.play_track(request);
                }
            }
        }
    }

    // ========== 观察器 ==========

    /// 是否有曲目在播放（含淡入/淡出/交叉切换，不含暂停）
    pub fn is_playing(&self) -> bool {
        self.current.is_some() && self.phase != PlaybackPhase::Paused
    }

    /// 当前曲目键
    pub fn current_track_key(&self) -> Option<&str> {
        self.current.as_ref().map(|c| c.key.as_str())
    }

    /// 当前可闻音量（无曲目时为 0）
    pub fn current_volume(&self) -> f32 {
        self.current.as_ref().map(|c| c.handle.volume()).unwrap_or(0.0)
    }

    /// 是否静音
    pub fn is_muted(&self) -> bool {
        self.muted
    }

    /// 当前播放阶段
    pub fn phase(&self) -> PlaybackPhase {
        self.phase
    }

    /// 绑定的上下文名
    pub fn bound_context(&self) -> Option<&str> {
        self.bound_context.as_deref()
    }

    /// 解除静音时要恢复的音量
    pub fn target_volume(&self) -> f32 {
        self.target_volume
    }

    /// 交叉淡出中的旧曲目数量
    pub fn outgoing_count(&self) -> usize {
        self.outgoing.len()
    }

    /// 上下文解析表
    pub fn resolver(&self) -> &ContextAudioResolver {
        &self.resolver
    }

    // ========== 内部 ==========

    /// 内部播放入口
    ///
    /// 1. 重复播放守卫：同曲目且可听时 no-op，避免界面重入时的
    ///    可闻重启毛刺
    /// 2. 资源缺失：警告后保持现状
    /// 3. 已有曲目：先淡出销毁（接续请求挂在淡出渐变上），
    ///    完成回调里再创建新资源，任一时刻最多一个"当前"资源
    /// 4. 创建：静音或要求淡入时从 0 起，否则直接目标音量
    fn play_track(&mut self, request: PlayRequest) {
        if let Some(cur) = &self.current {
            if cur.key == request.key && self.phase.is_audible() {
                debug!(key = %request.key, "曲目已在播放，忽略重复请求");
                return;
            }
        }

        if !self.cache.borrow().exists(&request.key) {
            warn!(key = %request.key, "音轨资源缺失，保持静默");
            return;
        }

        if self.current.is_some() {
            self.cancel_in_flight();
            let from = self.current_volume();
            let id = self.scheduler.borrow_mut().schedule(VolumeRamp {
                from,
                to: 0.0,
                duration: self.timings.fade_out,
            });
            self.in_flight = Some(InFlightFade {
                id,
                kind: FadeKind::Out {
                    pending: Some(request),
                },
            });
            self.phase = PlaybackPhase::FadingOut;
            return;
        }

        self.start_track(request);
    }

    /// 创建并启动新曲目（此时必无当前曲目）
    fn start_track(&mut self, request: PlayRequest) {
        let fade_in = request.fade_in && !self.muted;
        let initial_volume = if self.muted || request.fade_in {
            0.0
        } else {
            request.volume
        };
        let handle = self.cache.borrow_mut().create(
            &request.key,
            TrackOptions {
                looping: request.looping,
                initial_volume,
            },
        );
        let Some(mut handle) = handle else {
            warn!(key = %request.key, "音轨创建失败，保持静默");
            return;
        };
        handle.play();
        debug!(key = %request.key, volume = request.volume, fade_in, "开始播放曲目");
        self.current = Some(CurrentTrack {
            key: request.key,
            handle,
        });
        self.target_volume = request.volume;
        if fade_in {
            let id = self.scheduler.borrow_mut().schedule(VolumeRamp {
                from: 0.0,
                to: request.volume,
                duration: self.timings.fade_in,
            });
            self.in_flight = Some(InFlightFade {
                id,
                kind: FadeKind::In,
            });
            self.phase = PlaybackPhase::FadingIn;
        } else {
            self.in_flight = None;
            self.phase = PlaybackPhase::Playing;
        }
    }

    /// 取消当前曲目上进行中的渐变
    ///
    /// 返回是否确有渐变被取消。取消只移除时间轴上的动画，调用方
    /// 必须紧接着执行明确的终值/销毁动作，不留下半途状态。
    fn cancel_in_flight(&mut self) -> bool {
        if let Some(fade) = self.in_flight.take() {
            self.scheduler.borrow_mut().cancel(fade.id);
            true
        } else {
            false
        }
    }

    /// 销毁当前曲目（停止后随句柄 Drop 释放）
    fn destroy_current(&mut self) {
        if let Some(mut cur) = self.current.take() {
            cur.handle.stop();
            debug!(key = %cur.key, "当前曲目销毁");
        }
    }
}

/// 去重辅助：上下文解析表中引用的全部音轨键
///
/// 供宿主预热资源缓存使用。
pub fn referenced_track_keys(resolver: &ContextAudioResolver) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut keys = Vec::new();
    for context in resolver.contexts() {
        if let Some(config) = resolver.resolve(context) {
            if seen.insert(config.track_key.clone()) {
                keys.push(config.track_key.clone());
            }
        }
    }
    keys
}
