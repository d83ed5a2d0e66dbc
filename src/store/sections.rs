//! 学习小节规划
//!
//! 按每日学习量把词表切分为有序、互不重叠、完整覆盖的小节序列。
//! 除最后一节外每节恰好 `daily_count` 个单词；最后一节承接余数。
//!
//! 小节 id 由 `(词表名, 每日学习量, 序号)` 导出，输入不变时重算结果
//! 逐字节一致，保证页面重载后已记录的小节进度仍可归属。换一个每日
//! 学习量重算会产生全新的小节布局（掌握记录不受影响）。

use super::models::Section;

/// 规划学习小节
///
/// `daily_count` 为 0 或词表为空时返回空划分。
pub fn plan_sections(list_name: &str, word_order: &[String], daily_count: u32) -> Vec<Section> {
    if daily_count == 0 || word_order.is_empty() {
        return Vec::new();
    }

    word_order
        .chunks(daily_count as usize)
        .enumerate()
        .map(|(index, chunk)| Section {
            id: section_id(list_name, daily_count, index),
            word_ids: chunk.to_vec(),
        })
        .collect()
}

/// 确定性小节标识
fn section_id(list_name: &str, daily_count: u32, index: usize) -> String {
    format!("{list_name}:{daily_count}:{}", index + 1)
}
