//! # Registry 模块
//!
//! 进程级章节注册表：持有全部章节定义并跟踪"当前章节"指针。
//!
//! ## 设计原则
//!
//! - 定义注册后只读；注册表是唯一写入者（单线程协作模型，读写不竞争）
//! - "未注册"一律以错误返回给调用方，绝不静默退化：
//!   基于错误章节继续执行会污染下游内容解析
//! - 重复注册**后者覆盖**并记录警告，服务于开发期内容热重载

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::acts::definition::{ActDefinition, ActPack, Tier};
use crate::error::RegistryError;

/// 默认起始章节 id
pub const FIRST_ACT_ID: u32 = 1;

/// 章节概要
///
/// 供章节选择界面消费的纯派生数据，无副作用。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActSummary {
    /// 章节 id
    pub id: u32,
    /// 显示名称
    pub name: String,
    /// 副标题
    pub subtitle: String,
    /// 是否已解锁
    pub unlocked: bool,
    /// 是否已通关
    pub completed: bool,
}

/// 章节注册表
///
/// 生命周期与进程一致；新开局时调用 [`ActRegistry::reset`] 将指针
/// 拨回最低 id，注册内容保持不变。
///
/// # 使用示例
///
/// ```ignore
/// let mut registry = ActRegistry::new();
/// registry.register_pack(ActPack::from_json(pack_text)?);
///
/// let act = registry.current()?;
/// let roster = registry.content_ids(Some(Tier::Elite))?;
/// if boss_defeated {
///     registry.advance();
/// }
/// ```
#[derive(Debug, Clone)]
pub struct ActRegistry {
    /// 已注册定义（id -> 定义，按 id 升序）
    definitions: BTreeMap<u32, ActDefinition>,
    /// 当前章节 id
    ///
    /// 不保证总能解析到定义；调用方必须处理 [`RegistryError::NotRegistered`]。
    current_id: u32,
}

impl Default for ActRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ActRegistry {
    /// 创建空注册表，当前指针指向默认起始章节
    pub fn new() -> Self {
        Self {
            definitions: BTreeMap::new(),
            current_id: FIRST_ACT_ID,
        }
    }

    // ========== 注册 ==========

    /// 注册章节定义
    ///
    /// 若 id 已存在则**覆盖**旧定义并返回它，同时记录警告。
    /// 这是面向开发期热重载的刻意宽松；需要严格校验时用
    /// [`crate::diagnostic::analyze_pack`] 前置把关。
    pub fn register(&mut self, def: ActDefinition) -> Option<ActDefinition> {
        let replaced = self.definitions.insert(def.id, def);
        if let Some(ref old) = replaced {
            warn!(id = old.id, name = %old.name, "章节重复注册，后者覆盖前者");
        }
        replaced
    }

    /// 注册内容包中的全部章节
    pub fn register_pack(&mut self, pack: ActPack) {
        debug!(count = pack.acts.len(), "注册内容包");
        for act in pack.acts {
            self.register(act);
        }
    }

    /// 检查 id 是否已注册
    pub fn is_registered(&self, id: u32) -> bool {
        self.definitions.contains_key(&id)
    }

    // ========== 查询 ==========

    /// 获取当前章节定义
    ///
    /// # 错误
    ///
    /// 当前指针无对应注册时返回 [`RegistryError::NotRegistered`]。
    pub fn current(&self) -> Result<&ActDefinition, RegistryError> {
        self.definitions
            .get(&self.current_id)
            .ok_or(RegistryError::NotRegistered {
                id: self.current_id,
            })
    }

    /// 当前章节 id（指针本身，不保证可解析）
    pub fn current_id(&self) -> u32 {
        self.current_id
    }

    /// 按 id 获取章节定义
    pub fn get(&self, id: u32) -> Option<&ActDefinition> {
        self.definitions.get(&id)
    }

    /// 已注册章节数量
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    /// 注册表是否为空
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// 全部已注册 id，升序
    pub fn list_ids(&self) -> Vec<u32> {
        self.definitions.keys().copied().collect()
    }

    // ========== 推进 ==========

    /// 推进到下一章节
    ///
    /// 仅当 `current_id + 1` 已注册时推进并返回 `true`；
    /// 否则状态不变返回 `false`。不回绕。
    pub fn advance(&mut self) -> bool {
        let next = self.current_id + 1;
        if self.definitions.contains_key(&next) {
            debug!(from = self.current_id, to = next, "章节推进");
            self.current_id = next;
            true
        } else {
            false
        }
    }

    /// 无条件设置当前章节
    ///
    /// 供存档恢复与调试跳转使用，绕过 `advance` 的"+1"规则。
    ///
    /// # 错误
    ///
    /// `id` 未注册时返回 [`RegistryError::NotRegistered`]，指针不变。
    pub fn set_current(&mut self, id: u32) -> Result<(), RegistryError> {
        if !self.definitions.contains_key(&id) {
            return Err(RegistryError::NotRegistered { id });
        }
        self.current_id = id;
        Ok(())
    }

    /// 当前是否为最终章节（`current_id + 1` 未注册）
    pub fn is_final(&self) -> bool {
        !self.definitions.contains_key(&(self.current_id + 1))
    }

    /// 是否存在上一章节（`current_id - 1` 已注册）
    pub fn has_previous(&self) -> bool {
        self.current_id
            .checked_sub(1)
            .is_some_and(|prev| self.definitions.contains_key(&prev))
    }

    // ========== 派生数据 ==========

    /// 生成章节概要列表（升序），供界面消费
    pub fn summaries(
        &self,
        unlocked: &HashSet<u32>,
        completed: &HashSet<u32>,
    ) -> Vec<ActSummary> {
        self.definitions
            .values()
            .map(|def| ActSummary {
                id: def.id,
                name: def.name.clone(),
                subtitle: def.subtitle.clone(),
                unlocked: unlocked.contains(&def.id),
                completed: completed.contains(&def.id),
            })
            .collect()
    }

    /// 当前章节的内容 id 清单
    ///
    /// - `Some(tier)`：仅该层级（Boss 作为单元素序列）
    /// - `None`：普通 ++ 精英 ++ [Boss]，按此顺序拼接
    ///
    /// # 错误
    ///
    /// 当前章节未注册时返回 [`RegistryError::NotRegistered`]。
    pub fn content_ids(&self, tier: Option<Tier>) -> Result<Vec<String>, RegistryError> {
        let act = self.current()?;
        let ids = match tier {
            Some(Tier::Common) => act.common_content_ids.clone(),
            Some(Tier::Elite) => act.elite_content_ids.clone(),
            Some(Tier::Boss) => vec![act.boss_id.clone()],
            None => {
                let mut all = act.common_content_ids.clone();
                all.extend(act.elite_content_ids.iter().cloned());
                all.push(act.boss_id.clone());
                all
            }
        };
        Ok(ids)
    }

    // ========== 生命周期 ==========

    /// 新开局：指针拨回最低已注册 id（空表时回到默认起始 id）
    ///
    /// 不清除注册内容。
    pub fn reset(&mut self) {
        self.current_id = self
            .definitions
            .keys()
            .next()
            .copied()
            .unwrap_or(FIRST_ACT_ID);
    }

    /// 清空注册表（仅用于测试隔离）
    pub fn clear_all(&mut self) {
        self.definitions.clear();
        self.current_id = FIRST_ACT_ID;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acts::fixtures::sample_act;

    fn registry_with(ids: &[u32]) -> ActRegistry {
        let mut registry = ActRegistry::new();
        for &id in ids {
            registry.register(sample_act(id));
        }
        registry
    }

    #[test]
    fn test_register_then_get() {
        let registry = registry_with(&[1, 2]);
        assert!(registry.is_registered(1));
        assert_eq!(registry.get(1), Some(&sample_act(1)));
        assert_eq!(registry.get(9), None);
    }

    #[test]
    fn test_reregister_overwrites_without_duplicating() {
        let mut registry = registry_with(&[1, 2]);

        let mut updated = sample_act(1);
        updated.name = "Act 1 (hotfix)".to_string();
        let replaced = registry.register(updated.clone());

        // 覆盖而非重复：长度不变，旧定义被返回
        assert_eq!(replaced, Some(sample_act(1)));
        assert_eq!(registry.list_ids(), vec![1, 2]);
        assert_eq!(registry.get(1).unwrap().name, "Act 1 (hotfix)");
    }

    #[test]
    fn test_current_fails_when_unregistered() {
        let registry = ActRegistry::new();
        assert_eq!(
            registry.current().unwrap_err(),
            RegistryError::NotRegistered { id: FIRST_ACT_ID }
        );
    }

    #[test]
    fn test_advance_only_to_next_registered() {
        let mut registry = registry_with(&[1, 2, 3]);

        assert!(registry.advance());
        assert_eq!(registry.current_id(), 2);
        assert!(registry.advance());
        assert_eq!(registry.current_id(), 3);

        // 最高 id 上反复推进：始终失败，指针不动
        assert!(!registry.advance());
        assert!(!registry.advance());
        assert_eq!(registry.current_id(), 3);
    }

    #[test]
    fn test_advance_stops_at_gap() {
        // id 不连续：2 -> 4 之间有缺口，advance 止步
        let mut registry = registry_with(&[1, 2, 4]);
        assert!(registry.advance());
        assert!(!registry.advance());
        assert_eq!(registry.current_id(), 2);

        // set_current 可以跨过缺口
        registry.set_current(4).unwrap();
        assert_eq!(registry.current_id(), 4);
    }

    #[test]
    fn test_is_final_matches_advance() {
        let mut registry = registry_with(&[1, 2]);
        assert!(!registry.is_final());
        assert!(registry.advance());
        assert!(registry.is_final());
        assert!(!registry.advance());
    }

    #[test]
    fn test_set_current_rejects_unregistered() {
        let mut registry = registry_with(&[1]);
        assert_eq!(
            registry.set_current(7),
            Err(RegistryError::NotRegistered { id: 7 })
        );
        assert_eq!(registry.current_id(), 1);
    }

    #[test]
    fn test_single_act_scenario() {
        // 只注册章节 1：不可推进、即是终章、无上一章
        let mut registry = registry_with(&[1]);
        assert!(!registry.advance());
        assert!(registry.is_final());
        assert!(!registry.has_previous());
    }

    #[test]
    fn test_has_previous() {
        let mut registry = registry_with(&[1, 2]);
        assert!(!registry.has_previous());
        registry.advance();
        assert!(registry.has_previous());
    }

    #[test]
    fn test_content_ids_partition() {
        let registry = registry_with(&[1]);

        let common = registry.content_ids(Some(Tier::Common)).unwrap();
        let elite = registry.content_ids(Some(Tier::Elite)).unwrap();
        let boss = registry.content_ids(Some(Tier::Boss)).unwrap();
        let all = registry.content_ids(None).unwrap();

        // 三个层级恰好划分全集，Boss 在末尾且只有一个
        assert_eq!(boss.len(), 1);
        let mut joined = common.clone();
        joined.extend(elite.clone());
        joined.extend(boss.clone());
        assert_eq!(all, joined);
        assert_eq!(all.last(), Some(&"warden".to_string()));
    }

    #[test]
    fn test_content_ids_requires_current() {
        let registry = ActRegistry::new();
        assert!(registry.content_ids(None).is_err());
    }

    #[test]
    fn test_reset_returns_to_lowest_id() {
        let mut registry = registry_with(&[1, 2, 3]);
        registry.set_current(3).unwrap();
        registry.reset();
        assert_eq!(registry.current_id(), 1);
        assert_eq!(registry.len(), 3);

        // 稀疏注册表：回到最低注册 id 而非硬编码 1
        let mut sparse = registry_with(&[4, 5]);
        sparse.set_current(5).unwrap();
        sparse.reset();
        assert_eq!(sparse.current_id(), 4);
    }

    #[test]
    fn test_clear_all() {
        let mut registry = registry_with(&[1, 2]);
        registry.clear_all();
        assert!(registry.is_empty());
        assert!(registry.current().is_err());
    }

    #[test]
    fn test_summaries_snapshot() {
        let mut registry = ActRegistry::new();
        for id in 1..=3 {
            let mut act = sample_act(id);
            act.name = match id {
                1 => "Verdant Maze".to_string(),
                2 => "Shattered Isles".to_string(),
                _ => "Skyreach".to_string(),
            };
            act.subtitle = format!("Chapter {id}");
            registry.register(act);
        }

        let unlocked: HashSet<u32> = [1, 2].into_iter().collect();
        let completed: HashSet<u32> = [1].into_iter().collect();
        let summaries = registry.summaries(&unlocked, &completed);

        insta::assert_yaml_snapshot!(summaries);
    }

    #[test]
    fn test_summary_serialization() {
        let registry = registry_with(&[1]);
        let summaries = registry.summaries(&HashSet::new(), &HashSet::new());
        let json = serde_json::to_string(&summaries).unwrap();
        let back: Vec<ActSummary> = serde_json::from_str(&json).unwrap();
        assert_eq!(summaries, back);
    }
}
