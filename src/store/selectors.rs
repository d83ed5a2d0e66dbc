//! 选择器层
//!
//! 对 `ProgressStore` 的只读投影。带缓存的投影以 store 的 `revision`
//! 作为失效依据：修订号不变时重复调用直接命中缓存，修订号变化时
//! 整体清空重算。选择器永不修改状态。

use std::collections::HashMap;

use serde::Serialize;

use super::models::{ProgressStore, Section, Word};

/// 单个小节的完成进度
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionProgress {
    /// 小节内已掌握的单词数
    pub mastered: usize,
    /// 小节单词总数
    pub total: usize,
}

/// 带修订号失效的选择器缓存
///
/// 由调用方持有（通常挂在 `StoreHandle` 上），按输入键缓存投影结果。
#[derive(Debug, Default)]
pub struct SelectorCache {
    revision: u64,
    primed: bool,
    mastered_counts: HashMap<String, usize>,
    section_progress: HashMap<String, SectionProgress>,
}

impl SelectorCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn sync(&mut self, store: &ProgressStore) {
        if !self.primed || self.revision != store.revision {
            self.mastered_counts.clear();
            self.section_progress.clear();
            self.revision = store.revision;
            self.primed = true;
        }
    }

    /// 指定词表已掌握的单词数
    pub fn mastered_count(&mut self, store: &ProgressStore, list: &str) -> usize {
        self.sync(store);
        if let Some(count) = self.mastered_counts.get(list) {
            return *count;
        }
        let count = store
            .list_progress(list)
            .map(|p| p.mastered_count())
            .unwrap_or(0);
        self.mastered_counts.insert(list.to_string(), count);
        count
    }

    /// 指定词表的完成百分比 (0.0..=100.0，空词表为 0)
    pub fn percent_complete(&mut self, store: &ProgressStore, list: &str) -> f64 {
        let total = store
            .list_progress(list)
            .map(|p| p.word_order.len())
            .unwrap_or(0);
        if total == 0 {
            return 0.0;
        }
        self.mastered_count(store, list) as f64 / total as f64 * 100.0
    }

    /// 当前选中词表中指定小节的完成进度
    pub fn section_progress(
        &mut self,
        store: &ProgressStore,
        section_id: &str,
    ) -> Option<SectionProgress> {
        self.sync(store);
        if let Some(progress) = self.section_progress.get(section_id) {
            return Some(*progress);
        }

        let list = store.selected_progress()?;
        let section = list.sections.iter().find(|s| s.id == section_id)?;
        let mastered = section
            .word_ids
            .iter()
            .filter(|id| list.is_mastered(id))
            .count();
        let progress = SectionProgress {
            mastered,
            total: section.word_ids.len(),
        };
        self.section_progress
            .insert(section_id.to_string(), progress);
        Some(progress)
    }

    /// 当前学习小节：第一个仍有未掌握单词的小节
    pub fn current_section<'a>(&self, store: &'a ProgressStore) -> Option<&'a Section> {
        let list = store.selected_progress()?;
        list.sections
            .iter()
            .find(|s| s.word_ids.iter().any(|id| !list.is_mastered(id)))
    }

    /// 今日待学单词：当前小节中未掌握的单词，保持词表顺序
    ///
    /// `words` 为已加载的单词数据；找不到对应数据的 id 被跳过。
    pub fn todays_words(&self, store: &ProgressStore, words: &[Word]) -> Vec<Word> {
        let Some(list) = store.selected_progress() else {
            return Vec::new();
        };
        let Some(section) = self.current_section(store) else {
            return Vec::new();
        };
        section
            .word_ids
            .iter()
            .filter(|id| !list.is_mastered(id))
            .filter_map(|id| words.iter().find(|w| &w.id == id))
            .cloned()
            .collect()
    }

    /// 指定词表某天复习过的单词数
    pub fn reviewed_on(
        &self,
        store: &ProgressStore,
        list: &str,
        date: chrono::NaiveDate,
    ) -> usize {
        store
            .list_progress(list)
            .and_then(|p| p.history.get(&date))
            .map(|ids| ids.len())
            .unwrap_or(0)
    }
}
