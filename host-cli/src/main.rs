//! # Headless 演示宿主
//!
//! 以模拟帧循环驱动 stage-runtime：实现调度器与资源缓存两份契约，
//! 走一遍注册 → 推进 → 界面切换 → 交叉切换的完整演出会话。
//! 不出声：轨道句柄只记日志，用于验证链路与观察状态机。

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tracing::{info, warn};

use stage_runtime::{
    ActPack, AudioSessionManager, ContextAudioResolver, StageContext, analyze_pack,
};

mod sim;

use sim::{SimCache, SimScheduler};

/// 随演示宿主内置的内容包
const DEMO_PACK: &str = include_str!("../assets/demo_pack.json");

/// 命令行参数
#[derive(Parser, Debug)]
#[command(about = "stage-runtime 的 headless 演示宿主")]
struct Args {
    /// 模拟帧间隔（毫秒）
    #[arg(long, default_value_t = 16)]
    dt_ms: u64,

    /// 标记为缺失的音轨资源键（可重复，演示降级为静默）
    #[arg(long)]
    missing: Vec<String>,

    /// 演示中途静音
    #[arg(long, default_value_t = false)]
    mute: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let args = Args::parse();

    // ── 章节目录 ──
    let pack = ActPack::from_json(DEMO_PACK)?;
    let diagnostics = analyze_pack(&pack.acts);
    for diagnostic in &diagnostics {
        warn!(%diagnostic, "内容诊断");
    }

    // ── 进程级上下文 ──
    let cache = Rc::new(RefCell::new(SimCache::new(args.missing.clone())));
    let scheduler = Rc::new(RefCell::new(SimScheduler::default()));
    let mut ctx = StageContext::new(
        ContextAudioResolver::standard(),
        cache.clone(),
        scheduler.clone(),
    );
    ctx.acts.register_pack(pack);
    info!(acts = ?ctx.acts.list_ids(), "章节目录就绪");

    let dt = Duration::from_millis(args.dt_ms);
    let run_frames = |session: &mut AudioSessionManager, frames: usize| {
        for _ in 0..frames {
            let ticks = scheduler.borrow_mut().advance(dt);
            for tick in ticks {
                session.on_fade_step(tick.id, tick.value);
                if tick.finished {
                    session.on_fade_complete(tick.id);
                }
            }
        }
    };

    // ── 演出脚本 ──
    info!("== 主菜单 ==");
    ctx.audio.bind_context("main_menu");
    ctx.audio.play_for_bound_context(None);
    run_frames(&mut ctx.audio, 80);
    info!(phase = ?ctx.audio.phase(), volume = ctx.audio.current_volume(), "主菜单音乐就绪");

    if args.mute {
        info!("== 静音开关 ==");
        ctx.audio.mute();
    }

    info!("== 进入第 {} 章 ==", ctx.acts.current()?.id);
    info!(roster = ?ctx.acts.content_ids(None)?, "本章内容");
    ctx.audio.bind_context("world_map");
    ctx.audio.play_for_bound_context(None);
    run_frames(&mut ctx.audio, 120);

    info!("== 遭遇战 ==");
    ctx.audio.bind_context("battle");
    ctx.audio.play_for_bound_context(None);
    run_frames(&mut ctx.audio, 120);

    info!("== Boss 登场 ==");
    ctx.audio.crossfade_to("music/boss_battle", Some(0.9));
    run_frames(&mut ctx.audio, 120);
    info!(phase = ?ctx.audio.phase(), track = ?ctx.audio.current_track_key(), "交叉切换完成");

    if ctx.acts.advance() {
        info!(act = ctx.acts.current()?.id, "Boss 击破，章节推进");
    }

    if args.mute {
        ctx.audio.unmute();
        info!(volume = ctx.audio.current_volume(), "解除静音");
    }

    info!("== 胜利结算 ==");
    ctx.audio.play_for_bound_context(Some("victory"));
    run_frames(&mut ctx.audio, 160);

    info!("== 收尾 ==");
    ctx.new_game();
    info!(
        live = cache.borrow().live_count(),
        act = ctx.acts.current_id(),
        phase = ?ctx.audio.phase(),
        "会话已复位"
    );

    Ok(())
}
