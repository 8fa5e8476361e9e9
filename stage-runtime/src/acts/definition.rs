//! # Definition 模块
//!
//! 章节（Act）定义的数据模型。
//!
//! ## 设计原则
//!
//! - 定义在进程启动时注册，注册后**不可变**
//! - 所有类型可序列化，内容包以 JSON 形式随资源分发
//! - 内容标识符（敌人/遗物/事件）对核心是**不透明字符串**，
//!   核心只负责存取，不解释其含义

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::ContentError;

/// RGB 颜色
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    /// 创建颜色
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

/// 章节主题配色
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorPalette {
    /// 主色
    pub primary: Color,
    /// 辅色
    pub secondary: Color,
    /// 强调色
    pub accent: Color,
}

/// 章节主题
///
/// `primary_elements` 是场景装饰元素的标签序列，顺序即摆放优先级。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActTheme {
    /// 主要场景元素标签（有序）
    pub primary_elements: Vec<String>,
    /// 配色
    pub palette: ColorPalette,
}

/// 地图生成器类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GeneratorKind {
    /// 迷宫
    Maze,
    /// 群岛
    Archipelago,
    /// 浮空岛
    SkyIslands,
    /// 线性关卡
    Linear,
}

/// 内容层级
///
/// 区分章节内容标识符的强度分级。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    /// 普通
    Common,
    /// 精英
    Elite,
    /// Boss
    Boss,
}

/// 章节定义
///
/// 一个编号章节的完整配置包：主题、地图生成参数、内容清单、
/// 资源键与推进阈值。注册进 [`crate::acts::ActRegistry`] 后视为只读。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActDefinition {
    /// 唯一 id，从 1 开始
    pub id: u32,
    /// 显示名称
    pub name: String,
    /// 副标题
    pub subtitle: String,
    /// 主题（场景元素与配色）
    pub theme: ActTheme,
    /// 地图生成器类型
    pub generator: GeneratorKind,
    /// 生成器选项（开放式键值，核心不解释）
    #[serde(default)]
    pub generator_options: HashMap<String, serde_json::Value>,
    /// 普通敌人内容 id（有序）
    pub common_content_ids: Vec<String>,
    /// 精英敌人内容 id（有序）
    pub elite_content_ids: Vec<String>,
    /// Boss 内容 id
    pub boss_id: String,
    /// 事件 id（有序）
    #[serde(default)]
    pub event_ids: Vec<String>,
    /// 遗物 id（有序）
    #[serde(default)]
    pub relic_ids: Vec<String>,
    /// 背景资源键
    pub background_asset_key: String,
    /// 音乐资源键
    pub music_asset_key: String,
    /// 环境音资源键（可选，有序）
    #[serde(default)]
    pub ambient_asset_keys: Option<Vec<String>>,
    /// 挑战 Boss 所需的循环数（> 0）
    pub cycles_required_for_boss: u32,
    /// 每个循环包含的行动数（> 0）
    pub actions_per_cycle: u32,
}

impl ActDefinition {
    /// 校验定义的结构不变量
    ///
    /// 注册前调用；校验失败的定义不应进入注册表。
    pub fn validate(&self) -> Result<(), ContentError> {
        if self.id == 0 {
            return Err(ContentError::InvalidId { id: self.id });
        }
        if self.name.is_empty() {
            return Err(ContentError::EmptyField {
                id: self.id,
                field: "name",
            });
        }
        if self.boss_id.is_empty() {
            return Err(ContentError::EmptyField {
                id: self.id,
                field: "boss_id",
            });
        }
        if self.music_asset_key.is_empty() {
            return Err(ContentError::EmptyField {
                id: self.id,
                field: "music_asset_key",
            });
        }
        if self.cycles_required_for_boss == 0 {
            return Err(ContentError::NonPositive {
                id: self.id,
                field: "cycles_required_for_boss",
            });
        }
        if self.actions_per_cycle == 0 {
            return Err(ContentError::NonPositive {
                id: self.id,
                field: "actions_per_cycle",
            });
        }
        Ok(())
    }
}

/// 内容包
///
/// 启动注册的载体：一组章节定义，通常从随资源分发的 JSON 加载。
/// 支持热重载迭代：重复加载时由注册表的"后注册覆盖"语义接管。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActPack {
    /// 包内章节定义
    pub acts: Vec<ActDefinition>,
}

impl ActPack {
    /// 从 JSON 文本解析内容包
    ///
    /// 解析后对每个定义执行 [`ActDefinition::validate`]，
    /// 任一定义校验失败则整个包被拒绝。
    pub fn from_json(text: &str) -> Result<Self, ContentError> {
        let pack: ActPack =
            serde_json::from_str(text).map_err(|e| ContentError::InvalidPack {
                message: e.to_string(),
            })?;
        for act in &pack.acts {
            act.validate()?;
        }
        Ok(pack)
    }

    /// 序列化为 JSON 文本
    pub fn to_json(&self) -> Result<String, ContentError> {
        serde_json::to_string_pretty(self).map_err(|e| ContentError::InvalidPack {
            message: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acts::fixtures::sample_act;

    #[test]
    fn test_validate_ok() {
        assert!(sample_act(1).validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_id() {
        let act = sample_act(0);
        assert_eq!(
            act.validate(),
            Err(ContentError::InvalidId { id: 0 })
        );
    }

    #[test]
    fn test_validate_rejects_empty_fields() {
        let mut act = sample_act(1);
        act.boss_id = String::new();
        assert_eq!(
            act.validate(),
            Err(ContentError::EmptyField {
                id: 1,
                field: "boss_id"
            })
        );

        let mut act = sample_act(2);
        act.music_asset_key = String::new();
        assert!(act.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_thresholds() {
        let mut act = sample_act(1);
        act.cycles_required_for_boss = 0;
        assert_eq!(
            act.validate(),
            Err(ContentError::NonPositive {
                id: 1,
                field: "cycles_required_for_boss"
            })
        );

        let mut act = sample_act(1);
        act.actions_per_cycle = 0;
        assert!(act.validate().is_err());
    }

    #[test]
    fn test_definition_serialization() {
        let act = sample_act(3);
        let json = serde_json::to_string(&act).unwrap();
        let back: ActDefinition = serde_json::from_str(&json).unwrap();
        assert_eq!(act, back);
    }

    #[test]
    fn test_generator_kind_snake_case() {
        let json = serde_json::to_string(&GeneratorKind::SkyIslands).unwrap();
        assert_eq!(json, "\"sky_islands\"");
        let back: GeneratorKind = serde_json::from_str("\"archipelago\"").unwrap();
        assert_eq!(back, GeneratorKind::Archipelago);
    }

    #[test]
    fn test_pack_from_json() {
        let pack = ActPack {
            acts: vec![sample_act(1), sample_act(2)],
        };
        let json = pack.to_json().unwrap();
        let back = ActPack::from_json(&json).unwrap();
        assert_eq!(back.acts.len(), 2);
        assert_eq!(back, pack);
    }

    #[test]
    fn test_pack_rejects_invalid_member() {
        let mut bad = sample_act(2);
        bad.actions_per_cycle = 0;
        let pack = ActPack {
            acts: vec![sample_act(1), bad],
        };
        let json = serde_json::to_string(&pack).unwrap();
        assert!(ActPack::from_json(&json).is_err());
    }

    #[test]
    fn test_pack_rejects_malformed_json() {
        let err = ActPack::from_json("{ not json").unwrap_err();
        assert!(matches!(err, ContentError::InvalidPack { .. }));
    }
}
