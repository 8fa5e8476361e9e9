//! # 诊断模块
//!
//! 章节内容的静态检查 API，不依赖 IO 或注册表。
//!
//! ## 设计原则
//!
//! - 纯函数 API，可在无 IO 环境下运行（CI 内容门禁、编辑器提示）
//! - 诊断分级：Error（必须修复）、Warn（建议修复）、Info（信息提示）
//! - 注册表本身保持宽松（后注册覆盖）；需要严格把关时在注册前
//!   跑一遍 [`analyze_pack`]

use std::collections::HashSet;

use crate::acts::definition::ActDefinition;

/// 诊断级别
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DiagnosticLevel {
    /// 信息提示
    Info,
    /// 警告（建议修复）
    Warn,
    /// 错误（必须修复）
    Error,
}

impl std::fmt::Display for DiagnosticLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Info => write!(f, "INFO"),
            Self::Warn => write!(f, "WARN"),
            Self::Error => write!(f, "ERROR"),
        }
    }
}

/// 诊断条目
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// 诊断级别
    pub level: DiagnosticLevel,
    /// 涉及的章节 id
    pub act_id: u32,
    /// 诊断消息
    pub message: String,
}

impl Diagnostic {
    /// 创建错误诊断
    pub fn error(act_id: u32, message: impl Into<String>) -> Self {
        Self {
            level: DiagnosticLevel::Error,
            act_id,
            message: message.into(),
        }
    }

    /// 创建警告诊断
    pub fn warn(act_id: u32, message: impl Into<String>) -> Self {
        Self {
            level: DiagnosticLevel::Warn,
            act_id,
            message: message.into(),
        }
    }

    /// 创建信息诊断
    pub fn info(act_id: u32, message: impl Into<String>) -> Self {
        Self {
            level: DiagnosticLevel::Info,
            act_id,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] act {}: {}", self.level, self.act_id, self.message)
    }
}

/// 静态分析一组章节定义
///
/// 检查项：
/// - 重复 id（Error，注册时后者会覆盖前者）
/// - 结构不变量（Error，空 boss/音乐键、阈值为 0）
/// - id 序列缺口（Warn，`advance()` 在缺口前止步）
/// - 普通敌人清单为空（Warn）
/// - 环境音列表存在但为空（Info）
pub fn analyze_pack(acts: &[ActDefinition]) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    let mut seen: HashSet<u32> = HashSet::new();

    for act in acts {
        if !seen.insert(act.id) {
            diagnostics.push(Diagnostic::error(act.id, "id 重复，注册时后者覆盖前者"));
        }
        if act.validate().is_err() {
            if act.id == 0 {
                diagnostics.push(Diagnostic::error(act.id, "id 必须从 1 开始"));
            }
            if act.boss_id.is_empty() {
                diagnostics.push(Diagnostic::error(act.id, "boss_id 为空"));
            }
            if act.music_asset_key.is_empty() {
                diagnostics.push(Diagnostic::error(act.id, "music_asset_key 为空"));
            }
            if act.cycles_required_for_boss == 0 {
                diagnostics.push(Diagnostic::error(act.id, "cycles_required_for_boss 必须大于 0"));
            }
            if act.actions_per_cycle == 0 {
                diagnostics.push(Diagnostic::error(act.id, "actions_per_cycle 必须大于 0"));
            }
            if act.name.is_empty() {
                diagnostics.push(Diagnostic::error(act.id, "name 为空"));
            }
        }
        if act.common_content_ids.is_empty() {
            diagnostics.push(Diagnostic::warn(act.id, "普通敌人清单为空"));
        }
        if let Some(ambient) = &act.ambient_asset_keys {
            if ambient.is_empty() {
                diagnostics.push(Diagnostic::info(act.id, "环境音列表存在但为空"));
            }
        }
    }

    // id 序列缺口：advance() 在缺口前止步
    let mut ids: Vec<u32> = seen.into_iter().collect();
    ids.sort_unstable();
    for pair in ids.windows(2) {
        if pair[1] != pair[0] + 1 {
            diagnostics.push(Diagnostic::warn(
                pair[0],
                format!("下一章节 {} 未定义，推进将在此止步", pair[0] + 1),
            ));
        }
    }

    diagnostics
}

/// 是否存在 Error 级诊断
pub fn has_errors(diagnostics: &[Diagnostic]) -> bool {
    diagnostics
        .iter()
        .any(|d| d.level == DiagnosticLevel::Error)
}
