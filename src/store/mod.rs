//! 进度状态模块
//!
//! 提供归一化的学习进度存储，支持：
//! - 纯函数 reducer 驱动的状态转移
//! - 按修订号失效的选择器缓存
//! - 每次变更后的整 blob 持久化
//!
//! 所有变更都经过 [`StoreHandle::dispatch`]，与前端事件循环的
//! 单写者模型保持一致。

// ============================================================
// 子模块声明
// ============================================================

pub mod models;
pub mod reducer;
pub mod sections;
pub mod selectors;

// ============================================================
// 重新导出主要类型
// ============================================================

pub use models::{
    ListProgress, MasteryRecord, ProgressStore, Section, VocabularyListMeta, Word,
    MAX_DAILY_COMMITMENT,
};
pub use reducer::{reduce, Action};
pub use sections::plan_sections;
pub use selectors::{SectionProgress, SelectorCache};

// ============================================================
// 依赖导入
// ============================================================

use chrono::Utc;
use log::warn;
use thiserror::Error;

use crate::storage::{self, ProgressBackend};

// ============================================================
// 错误类型定义
// ============================================================

/// 进度存储错误类型
#[derive(Error, Debug)]
pub enum StoreError {
    /// action 校验失败，状态未改变（错误信息同时写入
    /// `ProgressStore::last_error`）
    #[error("校验失败: {0}")]
    Validation(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

// ============================================================
// StoreHandle - 派发入口
// ============================================================

/// 进度存储句柄
///
/// 持有内存中的权威状态与注入的存储后端。派发流程：
/// action -> reducer 计算新状态 -> 成功则整 blob 持久化 ->
/// 选择器在下次读取时按新修订号重算。
///
/// 存储后端不要求 `Sync`，句柄因此也不是 `Sync`；单写者由类型系统
/// 保证。
pub struct StoreHandle {
    state: ProgressStore,
    backend: Box<dyn ProgressBackend>,
    selectors: SelectorCache,
}

impl StoreHandle {
    /// 打开存储：读取 blob 并通过迁移链水合
    ///
    /// blob 缺失或损坏时从默认状态开始，永不失败。
    pub fn open(backend: Box<dyn ProgressBackend>) -> Self {
        let state = storage::load(backend.as_ref());
        Self {
            state,
            backend,
            selectors: SelectorCache::new(),
        }
    }

    /// 当前状态
    pub fn state(&self) -> &ProgressStore {
        &self.state
    }

    /// 派发一个 action
    ///
    /// 校验失败返回 `Err(StoreError::Validation)` 且不持久化；
    /// 成功后整体落盘，落盘失败仅记录告警，内存状态仍是权威数据。
    pub fn dispatch(&mut self, action: Action) -> StoreResult<()> {
        let next = reducer::reduce(&self.state, &action);

        let outcome = match next.last_error.clone() {
            Some(message) => Err(StoreError::Validation(message)),
            None => Ok(()),
        };

        if outcome.is_ok() {
            if let Err(err) = storage::save(self.backend.as_ref(), &next) {
                warn!("failed to persist progress, keeping in-memory state: {err}");
            }
        }

        self.state = next;
        outcome
    }

    // ========== 便捷派发方法 ==========

    /// 选择词表
    pub fn select_list<S: Into<String>>(&mut self, name: S, words: Vec<Word>) -> StoreResult<()> {
        self.dispatch(Action::SelectList {
            name: name.into(),
            words,
        })
    }

    /// 标记单词已掌握（以当前时间盖章）
    pub fn mark_word_learned<S: Into<String>>(&mut self, word_id: S) -> StoreResult<()> {
        self.dispatch(Action::MarkWordLearned {
            word_id: word_id.into(),
            reviewed_at: Utc::now(),
        })
    }

    /// 设置每日学习量
    pub fn set_daily_commitment(&mut self, count: u32) -> StoreResult<()> {
        self.dispatch(Action::SetDailyCommitment { count })
    }

    /// 重置指定词表的进度
    pub fn reset_list_progress<S: Into<String>>(&mut self, name: S) -> StoreResult<()> {
        self.dispatch(Action::ResetListProgress { name: name.into() })
    }

    // ========== 选择器委托 ==========

    /// 指定词表已掌握的单词数
    pub fn mastered_count(&mut self, list: &str) -> usize {
        self.selectors.mastered_count(&self.state, list)
    }

    /// 指定词表的完成百分比
    pub fn percent_complete(&mut self, list: &str) -> f64 {
        self.selectors.percent_complete(&self.state, list)
    }

    /// 当前词表指定小节的完成进度
    pub fn section_progress(&mut self, section_id: &str) -> Option<SectionProgress> {
        self.selectors.section_progress(&self.state, section_id)
    }

    /// 当前学习小节
    pub fn current_section(&self) -> Option<&Section> {
        self.selectors.current_section(&self.state)
    }

    /// 今日待学单词
    pub fn todays_words(&self, words: &[Word]) -> Vec<Word> {
        self.selectors.todays_words(&self.state, words)
    }
}

// ============================================================
// 测试
// ============================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryBackend;
    use std::sync::Arc;

    fn words(n: usize) -> Vec<Word> {
        (1..=n)
            .map(|i| Word {
                id: format!("w{i}"),
                text: format!("字{i}"),
                pinyin: format!("py{i}"),
                translation: format!("tr{i}"),
                example: None,
                example_pinyin: None,
                example_translation: None,
            })
            .collect()
    }

    /// 共享同一份内存 blob 的后端，模拟两次会话之间的持久化
    struct SharedBackend(Arc<MemoryBackend>);

    impl ProgressBackend for SharedBackend {
        fn read_blob(&self) -> crate::storage::StorageResult<Option<String>> {
            self.0.read_blob()
        }
        fn write_blob(&self, blob: &str) -> crate::storage::StorageResult<()> {
            self.0.write_blob(blob)
        }
    }

    #[test]
    fn test_dispatch_persists_and_survives_reopen() {
        let shared = Arc::new(MemoryBackend::new());

        let mut handle = StoreHandle::open(Box::new(SharedBackend(Arc::clone(&shared))));
        handle.select_list("HSK1", words(6)).expect("select list");
        handle.set_daily_commitment(2).expect("set commitment");
        handle.mark_word_learned("w1").expect("mark w1");

        let mut reopened = StoreHandle::open(Box::new(SharedBackend(shared)));
        assert_eq!(reopened.state().selected_list.as_deref(), Some("HSK1"));
        assert_eq!(reopened.mastered_count("HSK1"), 1);
        assert_eq!(reopened.state().lists["HSK1"].sections.len(), 3);
    }

    #[test]
    fn test_validation_error_returned_and_not_persisted() {
        let shared = Arc::new(MemoryBackend::new());
        let mut handle = StoreHandle::open(Box::new(SharedBackend(Arc::clone(&shared))));
        handle.select_list("HSK1", words(3)).expect("select list");
        let persisted_before = shared.snapshot();

        let result = handle.set_daily_commitment(0);
        assert!(matches!(result, Err(StoreError::Validation(_))));
        assert!(handle.state().last_error.is_some());
        assert_eq!(shared.snapshot(), persisted_before);
    }

    #[test]
    fn test_save_failure_keeps_memory_state() {
        let shared = Arc::new(MemoryBackend::new());
        let mut handle = StoreHandle::open(Box::new(SharedBackend(Arc::clone(&shared))));
        handle.select_list("HSK1", words(3)).expect("select list");

        shared.set_fail_writes(true);
        handle.mark_word_learned("w1").expect("mark still succeeds");
        assert_eq!(handle.mastered_count("HSK1"), 1);

        // 落盘失败，blob 停留在标记之前
        shared.set_fail_writes(false);
        let reopened = StoreHandle::open(Box::new(SharedBackend(shared)));
        assert_eq!(reopened.state().lists["HSK1"].mastered_count(), 0);
    }

    #[test]
    fn test_selector_delegation() {
        let mut handle = StoreHandle::open(Box::new(MemoryBackend::new()));
        let loaded = words(10);
        handle.select_list("HSK1", loaded.clone()).expect("select");
        handle.set_daily_commitment(3).expect("commitment");
        for i in 1..=9 {
            handle.mark_word_learned(format!("w{i}")).expect("mark");
        }

        assert_eq!(handle.mastered_count("HSK1"), 9);
        assert!((handle.percent_complete("HSK1") - 90.0).abs() < f64::EPSILON);
        let today: Vec<String> = handle
            .todays_words(&loaded)
            .into_iter()
            .map(|w| w.id)
            .collect();
        assert_eq!(today, vec!["w10"]);
    }
}
