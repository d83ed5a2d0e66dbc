//! 状态转移 reducer
//!
//! `reduce(state, action) -> state` 是纯函数：不修改输入、不 panic、
//! 相同输入必然产生相同输出。时间戳由 action 携带（派发层负责盖章），
//! 因此迁移和测试中可以安全地重放同一串 action。
//!
//! 校验失败的 action 不修改任何业务字段，只把错误信息写入
//! `last_error`；成功的 action 总是先清空 `last_error`。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::models::{ProgressStore, Word, MAX_DAILY_COMMITMENT};
use super::sections::plan_sections;

// ============================================================
// Action - 闭合的动作集合
// ============================================================

/// 进度存储接受的全部动作
///
/// 序列化形态与前端派发的 action 对象一致：`type` 标签 +
/// camelCase 载荷字段。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE", rename_all_fields = "camelCase")]
pub enum Action {
    /// 选择词表：创建/刷新对应进度桶，不清除其他词表的数据
    SelectList { name: String, words: Vec<Word> },
    /// 标记单词已掌握：掌握集合幂等，复习元数据每次更新
    MarkWordLearned {
        word_id: String,
        reviewed_at: DateTime<Utc>,
    },
    /// 设置每日学习量并确定性重算小节划分
    SetDailyCommitment { count: u32 },
    /// 仅重置指定词表的进度（掌握集合、承诺、小节、历史）
    ResetListProgress { name: String },
}

// ============================================================
// reduce - 状态转移入口
// ============================================================

/// 计算下一个状态
///
/// 永不返回错误：被拒绝的 action 产生一个除 `last_error` 与
/// `revision` 外与输入完全一致的新状态。
pub fn reduce(state: &ProgressStore, action: &Action) -> ProgressStore {
    let mut next = state.clone();
    next.revision = state.revision.wrapping_add(1);
    next.last_error = None;

    let outcome = match action {
        Action::SelectList { name, words } => apply_select_list(&mut next, name, words),
        Action::MarkWordLearned {
            word_id,
            reviewed_at,
        } => apply_mark_word_learned(&mut next, word_id, *reviewed_at),
        Action::SetDailyCommitment { count } => apply_set_daily_commitment(&mut next, *count),
        Action::ResetListProgress { name } => apply_reset_list_progress(&mut next, name),
    };

    match outcome {
        Ok(()) => next,
        Err(message) => {
            let mut rejected = state.clone();
            rejected.revision = state.revision.wrapping_add(1);
            rejected.last_error = Some(message);
            rejected
        }
    }
}

fn apply_select_list(next: &mut ProgressStore, name: &str, words: &[Word]) -> Result<(), String> {
    // 重复 id 只保留首次出现，保证小节划分的覆盖不重不漏
    let mut seen = std::collections::HashSet::new();
    let word_order: Vec<String> = words
        .iter()
        .map(|w| w.id.clone())
        .filter(|id| seen.insert(id.clone()))
        .collect();

    next.selected_list = Some(name.to_string());
    let progress = next.lists.entry(name.to_string()).or_default();
    progress.word_order = word_order;

    // 清理悬挂引用：词表切换后掌握记录与历史只保留仍存在的单词
    progress
        .mastery
        .retain(|word_id, _| seen.contains(word_id));
    for ids in progress.history.values_mut() {
        ids.retain(|id| seen.contains(id));
    }
    progress.history.retain(|_, ids| !ids.is_empty());

    // 原有承诺在新词表范围内则重算小节，否则连同小节一起作废
    let bound = (progress.word_order.len() as u32).min(MAX_DAILY_COMMITMENT);
    match progress.daily_commitment {
        Some(count) if count >= 1 && count <= bound => {
            progress.sections = plan_sections(name, &progress.word_order, count);
        }
        _ => {
            progress.daily_commitment = None;
            progress.sections.clear();
        }
    }

    Ok(())
}

fn apply_mark_word_learned(
    next: &mut ProgressStore,
    word_id: &str,
    reviewed_at: DateTime<Utc>,
) -> Result<(), String> {
    let Some(name) = next.selected_list.clone() else {
        return Err("未选择词表，无法标记单词".to_string());
    };
    let Some(progress) = next.lists.get_mut(&name) else {
        return Err(format!("词表 {name} 没有进度数据"));
    };
    if !progress.word_order.iter().any(|id| id == word_id) {
        return Err(format!("单词 {word_id} 不在当前词表中"));
    }

    let record = progress.mastery.entry(word_id.to_string()).or_default();
    record.mastered = true;
    record.last_reviewed = Some(reviewed_at);
    record.review_count = record.review_count.saturating_add(1);

    let day = reviewed_at.date_naive();
    let reviewed = progress.history.entry(day).or_default();
    if !reviewed.iter().any(|id| id == word_id) {
        reviewed.push(word_id.to_string());
    }

    Ok(())
}

fn apply_set_daily_commitment(next: &mut ProgressStore, count: u32) -> Result<(), String> {
    let Some(name) = next.selected_list.clone() else {
        return Err("未选择词表，无法设置每日学习量".to_string());
    };
    let Some(progress) = next.lists.get_mut(&name) else {
        return Err(format!("词表 {name} 没有进度数据"));
    };

    let bound = (progress.word_order.len() as u32).min(MAX_DAILY_COMMITMENT);
    if bound == 0 {
        return Err("当前词表为空，无法设置每日学习量".to_string());
    }
    if count < 1 || count > bound {
        return Err(format!("每日学习量 {count} 超出范围 1..={bound}"));
    }

    progress.daily_commitment = Some(count);
    progress.sections = plan_sections(&name, &progress.word_order, count);
    Ok(())
}

fn apply_reset_list_progress(next: &mut ProgressStore, name: &str) -> Result<(), String> {
    if let Some(progress) = next.lists.get_mut(name) {
        progress.mastery.clear();
        progress.daily_commitment = None;
        progress.sections.clear();
        progress.history.clear();
    }
    Ok(())
}

// ============================================================
// 测试
// ============================================================
