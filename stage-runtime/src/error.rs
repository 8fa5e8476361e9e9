//! # Error 模块
//!
//! 定义 stage-runtime 中使用的错误类型。
//!
//! ## 传播策略
//!
//! - 内容/注册表错误（[`ContentError`]、[`RegistryError`]）对调用方是
//!   **致命**的：基于未注册章节继续执行会污染下游内容解析。
//! - 音频播放路径的失败（资源缺失、上下文未绑定）**不在此建模**：
//!   它们在 [`crate::audio::AudioSessionManager`] 内部记录警告后降级为
//!   no-op，音频永远不允许阻塞或压垮游戏流程。

use thiserror::Error;

/// 内容定义错误
///
/// 章节定义或内容包在注册前校验失败。
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ContentError {
    /// 章节 id 非法（必须 >= 1）
    #[error("章节 id {id} 非法：id 必须从 1 开始")]
    InvalidId { id: u32 },

    /// 必填字段为空
    #[error("章节 {id}：字段 '{field}' 不能为空")]
    EmptyField { id: u32, field: &'static str },

    /// 数值字段必须为正
    #[error("章节 {id}：字段 '{field}' 必须大于 0")]
    NonPositive { id: u32, field: &'static str },

    /// 内容包 JSON 解析失败
    #[error("内容包解析失败: {message}")]
    InvalidPack { message: String },
}

/// 注册表错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// 章节未注册
    #[error("章节 {id} 未注册")]
    NotRegistered { id: u32 },
}

/// stage-runtime 统一错误类型
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StageError {
    /// 内容定义错误
    #[error("内容错误: {0}")]
    Content(#[from] ContentError),

    /// 注册表错误
    #[error("注册表错误: {0}")]
    Registry(#[from] RegistryError),
}

/// Result 类型别名
pub type StageResult<T> = Result<T, StageError>;
