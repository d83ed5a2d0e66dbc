//! 数据模型定义
//!
//! 定义进度存储所需的所有数据结构。持久化形态为单个版本化 JSON blob，
//! 字段统一使用 camelCase，与前端/后端的序列化约定保持一致。

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::storage::migrations::CURRENT_SCHEMA_VERSION;

// ============================================================
// VocabularyListMeta - 词表元信息
// ============================================================

/// 词表元信息
///
/// 来自静态清单文件的只读引用数据，应用内不做修改。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VocabularyListMeta {
    /// 词表名称（同时作为进度桶的键）
    pub name: String,
    /// 词表描述
    pub description: String,
    /// 单词数据文件引用 (JSON 或 CSV)
    pub file: String,
    /// 难度等级 (如: HSK1, HSK2)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<String>,
    /// 标签
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    /// 单词总数
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub word_count: Option<u32>,
}

// ============================================================
// Word - 单词数据
// ============================================================

/// 单词数据
///
/// 会话内不可变，由词表数据文件加载。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Word {
    /// 单词唯一标识
    pub id: String,
    /// 目标语言文本（汉字）
    pub text: String,
    /// 拼音
    pub pinyin: String,
    /// 译文
    pub translation: String,
    /// 例句
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example: Option<String>,
    /// 例句拼音
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example_pinyin: Option<String>,
    /// 例句译文
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example_translation: Option<String>,
}

// ============================================================
// MasteryRecord - 单词掌握记录
// ============================================================

/// 单词掌握记录
///
/// 首次交互时创建，每次标记掌握时更新，仅在显式重置时删除。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MasteryRecord {
    /// 是否已掌握（粘性：一旦掌握只有重置能撤销）
    pub mastered: bool,
    /// 最后复习时间
    pub last_reviewed: Option<DateTime<Utc>>,
    /// 复习次数
    pub review_count: u32,
    /// 下次复习时间。历史数据中存在该字段，当前仅透传，
    /// 不参与任何排序或调度
    pub next_review: Option<DateTime<Utc>>,
}

// ============================================================
// Section - 学习小节
// ============================================================

/// 学习小节
///
/// 词表按每日学习量切分出的连续单词分组。小节 id 由
/// (词表名, 每日学习量, 序号) 确定性导出，输入不变则重载后保持稳定。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    /// 小节标识
    pub id: String,
    /// 小节覆盖的单词 id（保持词表顺序）
    pub word_ids: Vec<String>,
}

// ============================================================
// ListProgress - 单个词表的进度桶
// ============================================================

/// 单个词表的进度桶
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ListProgress {
    /// 已加载词表的单词 id 序列（保持原始顺序）
    pub word_order: Vec<String>,
    /// 单词 id -> 掌握记录
    pub mastery: HashMap<String, MasteryRecord>,
    /// 每日学习量承诺（未设置时为 None）
    pub daily_commitment: Option<u32>,
    /// 当前小节划分（由 word_order + daily_commitment 确定性重算）
    pub sections: Vec<Section>,
    /// 复习历史: 日期 -> 当日复习过的单词 id（按首次出现顺序，单日去重）
    pub history: BTreeMap<NaiveDate, Vec<String>>,
}

impl ListProgress {
    /// 已掌握的单词数
    pub fn mastered_count(&self) -> usize {
        self.mastery.values().filter(|r| r.mastered).count()
    }

    /// 单词是否已掌握
    pub fn is_mastered(&self, word_id: &str) -> bool {
        self.mastery.get(word_id).map(|r| r.mastered).unwrap_or(false)
    }
}

// ============================================================
// ProgressStore - 进度存储根聚合
// ============================================================

/// 进度存储根聚合
///
/// 持久化时整体序列化为单个 JSON blob；`revision` 与 `last_error`
/// 为内存态，不落盘。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProgressStore {
    /// schema 版本号，随迁移链单调递增
    pub version: i32,
    /// 当前选中的词表名
    pub selected_list: Option<String>,
    /// 词表名 -> 进度桶
    pub lists: HashMap<String, ListProgress>,
    /// 状态修订号，每次 reduce 自增，驱动选择器缓存失效
    #[serde(skip)]
    pub revision: u64,
    /// 最近一次被拒绝 action 的校验错误信息
    #[serde(skip)]
    pub last_error: Option<String>,
}

impl Default for ProgressStore {
    fn default() -> Self {
        Self {
            version: CURRENT_SCHEMA_VERSION,
            selected_list: None,
            lists: HashMap::new(),
            revision: 0,
            last_error: None,
        }
    }
}

impl ProgressStore {
    /// 当前选中词表的进度桶
    pub fn selected_progress(&self) -> Option<&ListProgress> {
        self.selected_list.as_deref().and_then(|name| self.lists.get(name))
    }

    /// 指定词表的进度桶
    pub fn list_progress(&self, name: &str) -> Option<&ListProgress> {
        self.lists.get(name)
    }

    /// 当前选中词表允许的每日学习量上限（空词表为 0）
    pub fn commitment_upper_bound(&self) -> u32 {
        self.selected_progress()
            .map(|p| (p.word_order.len() as u32).min(MAX_DAILY_COMMITMENT))
            .unwrap_or(0)
    }
}

/// 每日学习量的全局上限
pub const MAX_DAILY_COMMITMENT: u32 = 50;

// ============================================================
// 测试
// ============================================================
