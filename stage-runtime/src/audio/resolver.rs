//! # Resolver 模块
//!
//! 上下文（界面身份）到音轨配置的静态映射表。
//!
//! ## 设计原则
//!
//! - 纯查表，不含任何播放逻辑；新增界面只需加一条表项
//! - 表可从 JSON 加载，内容迭代不需要重新编译
//! - 查不到表项不是错误：由会话管理器降级为静默 no-op

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::ContentError;

/// 音轨配置
///
/// 一个上下文的默认播放参数，注册后不可变。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioTrackConfig {
    /// 音轨资源键
    pub track_key: String,
    /// 目标音量（0.0 - 1.0）
    pub volume: f32,
    /// 是否淡入
    pub fade_in: bool,
    /// 是否循环
    pub looping: bool,
}

impl AudioTrackConfig {
    /// 创建配置
    pub fn new(track_key: impl Into<String>, volume: f32) -> Self {
        Self {
            track_key: track_key.into(),
            volume: volume.clamp(0.0, 1.0),
            fade_in: true,
            looping: true,
        }
    }

    /// 设置淡入
    pub fn with_fade_in(mut self, fade_in: bool) -> Self {
        self.fade_in = fade_in;
        self
    }

    /// 设置循环
    pub fn with_looping(mut self, looping: bool) -> Self {
        self.looping = looping;
        self
    }
}

/// 上下文音轨解析表
///
/// Key 是请求音频的界面身份（如 `"main_menu"`、`"boss_battle"`）。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContextAudioResolver {
    /// 表项（上下文名 -> 配置）
    entries: HashMap<String, AudioTrackConfig>,
}

impl ContextAudioResolver {
    /// 创建空表
    pub fn new() -> Self {
        Self::default()
    }

    /// 随游戏出厂的界面表
    pub fn standard() -> Self {
        let mut resolver = Self::new();
        resolver.insert("main_menu", AudioTrackConfig::new("music/main_theme", 0.7));
        resolver.insert("act_select", AudioTrackConfig::new("music/act_select", 0.6));
        resolver.insert("world_map", AudioTrackConfig::new("music/wandering", 0.65));
        resolver.insert("battle", AudioTrackConfig::new("music/battle_loop", 0.8));
        resolver.insert("boss_battle", AudioTrackConfig::new("music/boss_battle", 0.9));
        resolver.insert("shop", AudioTrackConfig::new("music/merchant", 0.55));
        resolver.insert("event", AudioTrackConfig::new("music/whispers", 0.5));
        resolver.insert(
            "game_over",
            AudioTrackConfig::new("music/lament", 0.6)
                .with_fade_in(false)
                .with_looping(false),
        );
        resolver.insert(
            "victory",
            AudioTrackConfig::new("music/triumph", 0.8).with_looping(false),
        );
        resolver.insert("credits", AudioTrackConfig::new("music/credits_roll", 0.7));
        resolver
    }

    /// 从 JSON 文本加载表（上下文名 -> 配置的对象）
    pub fn from_json(text: &str) -> Result<Self, ContentError> {
        let entries: HashMap<String, AudioTrackConfig> =
            serde_json::from_str(text).map_err(|e| ContentError::InvalidPack {
                message: e.to_string(),
            })?;
        Ok(Self { entries })
    }

    /// 新增或覆盖表项
    pub fn insert(&mut self, context: impl Into<String>, config: AudioTrackConfig) {
        self.entries.insert(context.into(), config);
    }

    /// 解析上下文的音轨配置
    pub fn resolve(&self, context: &str) -> Option<&AudioTrackConfig> {
        self.entries.get(context)
    }

    /// 上下文是否有表项
    pub fn contains(&self, context: &str) -> bool {
        self.entries.contains_key(context)
    }

    /// 全部已登记的上下文名，升序
    pub fn contexts(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// 表项数量
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// 表是否为空
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_table_resolves() {
        let resolver = ContextAudioResolver::standard();
        let config = resolver.resolve("main_menu").unwrap();
        assert_eq!(config.track_key, "music/main_theme");
        assert!(config.fade_in);
        assert!(config.looping);

        // game_over 不淡入、不循环
        let config = resolver.resolve("game_over").unwrap();
        assert!(!config.fade_in);
        assert!(!config.looping);
    }

    #[test]
    fn test_unknown_context_resolves_to_none() {
        let resolver = ContextAudioResolver::standard();
        assert_eq!(resolver.resolve("mini_game"), None);
        assert!(!resolver.contains("mini_game"));
    }

    #[test]
    fn test_insert_only_touches_table() {
        let mut resolver = ContextAudioResolver::standard();
        let before = resolver.len();
        resolver.insert("mini_game", AudioTrackConfig::new("music/arcade", 0.5));
        assert_eq!(resolver.len(), before + 1);
        assert!(resolver.contains("mini_game"));
    }

    #[test]
    fn test_volume_clamped() {
        let config = AudioTrackConfig::new("music/x", 1.5);
        assert_eq!(config.volume, 1.0);
        let config = AudioTrackConfig::new("music/x", -0.5);
        assert_eq!(config.volume, 0.0);
    }

    #[test]
    fn test_contexts_sorted() {
        let resolver = ContextAudioResolver::standard();
        let contexts = resolver.contexts();
        let mut sorted = contexts.clone();
        sorted.sort_unstable();
        assert_eq!(contexts, sorted);
        assert!(contexts.contains(&"boss_battle"));
    }

    #[test]
    fn test_from_json() {
        let text = r#"{
            "main_menu": { "track_key": "music/menu", "volume": 0.7, "fade_in": true, "looping": true },
            "arena": { "track_key": "music/arena", "volume": 0.9, "fade_in": false, "looping": true }
        }"#;
        let resolver = ContextAudioResolver::from_json(text).unwrap();
        assert_eq!(resolver.len(), 2);
        assert_eq!(resolver.resolve("arena").unwrap().volume, 0.9);
    }

    #[test]
    fn test_from_json_rejects_malformed() {
        assert!(ContextAudioResolver::from_json("[1, 2]").is_err());
    }

    #[test]
    fn test_config_serialization() {
        let config = AudioTrackConfig::new("music/battle_loop", 0.8).with_fade_in(false);
        let json = serde_json::to_string(&config).unwrap();
        let back: AudioTrackConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, back);
    }
}
