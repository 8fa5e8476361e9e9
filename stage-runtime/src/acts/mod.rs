//! # Acts 模块
//!
//! 章节（Act）目录与推进状态。
//!
//! - [`definition`]：章节定义的数据模型与内容包加载
//! - [`registry`]：注册表与"当前章节"指针

pub mod definition;
pub mod registry;

pub use definition::{
    ActDefinition, ActPack, ActTheme, Color, ColorPalette, GeneratorKind, Tier,
};
pub use registry::{ActRegistry, ActSummary};
