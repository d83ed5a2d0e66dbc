//! 本地持久化模块
//!
//! 提供进度 blob 的本地持久化功能，支持：
//! - 整 blob 原子写入（先写临时文件再重命名，不存在部分写入）
//! - 读取侧错误吸收：blob 缺失/损坏/迁移失败一律回退默认状态
//! - 可注入的存储后端，测试中可替换为内存实现
//!
//! 存储后端是显式传入的依赖，本模块不触碰任何全局可变资源。

// ============================================================
// 子模块声明
// ============================================================

pub mod migrations;

// ============================================================
// 依赖导入
// ============================================================

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use log::warn;
use serde_json::Value;
use thiserror::Error;

use crate::store::models::ProgressStore;

// ============================================================
// 错误类型定义
// ============================================================

/// 持久化模块错误类型
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("I/O 错误: {0}")]
    Io(#[from] io::Error),

    #[error("序列化错误: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("迁移错误: {0}")]
    Migration(String),

    #[error("存储不可用: {0}")]
    Unavailable(String),

    #[error("锁获取失败: {0}")]
    Lock(String),
}

pub type StorageResult<T> = Result<T, StorageError>;

// ============================================================
// ProgressBackend - 存储后端抽象
// ============================================================

/// 进度 blob 的存储后端
///
/// `read_blob` 返回 `None` 表示尚无持久化数据（首次启动）。
/// `write_blob` 必须整体写入：调用返回后要么新 blob 完整可读，
/// 要么旧 blob 原样保留。
pub trait ProgressBackend: Send {
    fn read_blob(&self) -> StorageResult<Option<String>>;
    fn write_blob(&self, blob: &str) -> StorageResult<()>;
}

// ============================================================
// FileBackend - 文件存储后端
// ============================================================

/// 基于单个 JSON 文件的存储后端
///
/// 写入先落到同目录的临时文件再 rename，保证崩溃后旧 blob 仍然
/// 完整可解析。
pub struct FileBackend {
    path: PathBuf,
}

impl FileBackend {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    /// 存储文件路径
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut os_string = self.path.clone().into_os_string();
        os_string.push(".tmp");
        PathBuf::from(os_string)
    }
}

impl ProgressBackend for FileBackend {
    fn read_blob(&self) -> StorageResult<Option<String>> {
        match fs::read_to_string(&self.path) {
            Ok(blob) => Ok(Some(blob)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn write_blob(&self, blob: &str) -> StorageResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let temp = self.temp_path();
        fs::write(&temp, blob)?;
        fs::rename(&temp, &self.path)?;
        Ok(())
    }
}

// ============================================================
// MemoryBackend - 内存存储后端（测试用）
// ============================================================

/// 内存存储后端
///
/// 测试替身；`set_fail_writes(true)` 可模拟配额耗尽等写入失败，
/// 用于验证内存状态在持久化失败时仍然是权威数据。
#[derive(Default)]
pub struct MemoryBackend {
    blob: Mutex<Option<String>>,
    fail_writes: AtomicBool,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// 以既有 blob 初始化（模拟上次会话留下的数据）
    pub fn with_blob<S: Into<String>>(blob: S) -> Self {
        Self {
            blob: Mutex::new(Some(blob.into())),
            fail_writes: AtomicBool::new(false),
        }
    }

    /// 开关写入失败模拟
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// 当前持久化内容快照
    pub fn snapshot(&self) -> Option<String> {
        self.blob.lock().ok().and_then(|guard| guard.clone())
    }
}

impl ProgressBackend for MemoryBackend {
    fn read_blob(&self) -> StorageResult<Option<String>> {
        let guard = self
            .blob
            .lock()
            .map_err(|e| StorageError::Lock(e.to_string()))?;
        Ok(guard.clone())
    }

    fn write_blob(&self, blob: &str) -> StorageResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable("写入已被禁用".to_string()));
        }
        let mut guard = self
            .blob
            .lock()
            .map_err(|e| StorageError::Lock(e.to_string()))?;
        *guard = Some(blob.to_string());
        Ok(())
    }
}

// ============================================================
// load / save - 持久化入口
// ============================================================

/// 读取并迁移进度存储
///
/// 永不失败：blob 缺失返回默认状态；读取、解析或迁移出错时记录
/// 告警并丢弃整个 blob，同样返回默认状态。启动不会因坏数据被阻塞。
pub fn load(backend: &dyn ProgressBackend) -> ProgressStore {
    let blob = match backend.read_blob() {
        Ok(Some(blob)) => blob,
        Ok(None) => return ProgressStore::default(),
        Err(err) => {
            warn!("failed to read progress blob, falling back to defaults: {err}");
            return ProgressStore::default();
        }
    };

    match hydrate(&blob) {
        Ok(store) => store,
        Err(err) => {
            warn!("discarding unreadable progress blob: {err}");
            ProgressStore::default()
        }
    }
}

fn hydrate(blob: &str) -> StorageResult<ProgressStore> {
    let value: Value = serde_json::from_str(blob)?;
    let migrated = migrations::run_migrations(value)?;
    let store: ProgressStore = serde_json::from_value(migrated)?;
    Ok(store)
}

/// 整体序列化并写入进度存储
///
/// 失败由调用方决定如何处理；派发层把它当作非致命告警，内存状态
/// 仍然正确。
pub fn save(backend: &dyn ProgressBackend, store: &ProgressStore) -> StorageResult<()> {
    let blob = serde_json::to_string(store)?;
    backend.write_blob(&blob)
}

// ============================================================
// 测试
// ============================================================
