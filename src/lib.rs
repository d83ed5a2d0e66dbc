//! # danci-progress - 学习进度核心库
//!
//! 本 crate 提供 Danci 客户端的学习进度管理核心:
//!
//! - **Store** - 归一化的进度状态 + 纯函数 reducer
//! - **Storage** - 本地持久化适配器与 schema 版本迁移
//! - **Sections** - 按每日学习量对词表的确定性分组
//! - **Api** - 后端 TTS / 对话生成接口的客户端
//!
//! ## 设计理念
//!
//! - **单写者** - 所有状态变更都经过 `StoreHandle::dispatch`，与前端事件循环
//!   的串行化模型一致
//! - **纯 reducer** - 相同 `(state, action)` 必然产生相同结果，时间戳随
//!   action 传入
//! - **错误不外溢** - 持久化与迁移失败在适配器边界被吸收，启动永不被阻塞
//!
//! ## 模块结构
//!
//! - [`store`] - 进度状态、reducer、选择器、学习小节规划
//! - [`storage`] - 持久化后端与迁移链
//! - [`data`] - 词表清单与单词数据加载 (JSON/CSV)
//! - [`api`] - 后端协作方客户端 (TTS、对话生成)
//! - [`config`] - 环境变量配置

// ============================================================
// 模块声明
// ============================================================

pub mod api;
pub mod config;
pub mod data;
pub mod storage;
pub mod store;

// ============================================================
// 重新导出主要类型
// ============================================================

pub use config::Config;
pub use storage::{
    load, save, FileBackend, MemoryBackend, ProgressBackend, StorageError, StorageResult,
};
pub use storage::migrations::CURRENT_SCHEMA_VERSION;
pub use store::models::{
    ListProgress, MasteryRecord, ProgressStore, Section, VocabularyListMeta, Word,
};
pub use store::reducer::{reduce, Action};
pub use store::selectors::{SectionProgress, SelectorCache};
pub use store::{StoreError, StoreHandle, StoreResult};
