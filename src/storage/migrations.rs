//! 进度 blob 迁移模块
//!
//! 管理持久化 JSON blob 的 schema 版本迁移，确保历史数据能升级到
//! 当前结构。
//!
//! ## 迁移策略
//! - 每个迁移是 `Value -> Value` 的纯函数，无任何 I/O
//! - 按版本号顺序应用，直到达到 [`CURRENT_SCHEMA_VERSION`]
//! - 已是当前版本时迁移链为空操作
//! - 任何一步失败都向上返回错误，由持久化适配器丢弃整个 blob，
//!   绝不向 reducer 暴露半迁移状态

use log::debug;
use serde_json::{json, Map, Value};

use super::{StorageError, StorageResult};

/// 当前进度 blob 的 schema 版本
pub const CURRENT_SCHEMA_VERSION: i32 = 3;

// ============================================================
// Migration - 迁移定义
// ============================================================

/// 单个迁移步骤
pub struct Migration {
    /// 迁移完成后的版本号
    pub version: i32,
    /// 迁移名称/描述
    pub name: &'static str,
    apply: fn(Value) -> StorageResult<Value>,
}

impl Migration {
    fn new(version: i32, name: &'static str, apply: fn(Value) -> StorageResult<Value>) -> Self {
        Self {
            version,
            name,
            apply,
        }
    }
}

/// 获取所有迁移定义
///
/// 返回按版本号排序的迁移列表
pub fn migrations() -> Vec<Migration> {
    vec![
        // V2: 裸掌握集合升级为完整掌握记录
        Migration::new(2, "掌握集合升级为掌握记录", migrate_v1_to_v2),
        // V3: 进度桶补充词序、小节与复习历史
        Migration::new(3, "进度桶补充词序/小节/历史", migrate_v2_to_v3),
    ]
}

// ============================================================
// run_migrations - 迁移链入口
// ============================================================

/// 把 blob 升级到当前版本
///
/// 输入版本超过 [`CURRENT_SCHEMA_VERSION`] 或形态不合法时返回错误。
pub fn run_migrations(mut value: Value) -> StorageResult<Value> {
    let mut version = blob_version(&value)?;
    if version > CURRENT_SCHEMA_VERSION {
        return Err(StorageError::Migration(format!(
            "blob 版本 {version} 超过当前版本 {CURRENT_SCHEMA_VERSION}"
        )));
    }

    for migration in migrations() {
        if migration.version <= version {
            continue;
        }
        value = (migration.apply)(value)?;
        debug!(
            "progress blob migrated: v{} -> v{} ({})",
            version, migration.version, migration.name
        );
        version = migration.version;
    }

    Ok(value)
}

fn blob_version(value: &Value) -> StorageResult<i32> {
    value
        .get("version")
        .and_then(Value::as_i64)
        .map(|v| v as i32)
        .ok_or_else(|| StorageError::Migration("blob 缺少 version 字段".to_string()))
}

// ============================================================
// 各版本迁移实现
// ============================================================

/// V1 -> V2
///
/// V1 形态: `{ version, selectedList, mastered: { 词表名: [单词 id] } }`。
/// 把裸 id 集合升级为掌握记录映射，并为每个词表补充空的每日学习量。
/// 已掌握单词的 reviewCount 记为 1（V1 没有更细的复习信息可保留）。
fn migrate_v1_to_v2(value: Value) -> StorageResult<Value> {
    let mut root = into_object(value, "v1 blob")?;

    let mastered = match root.remove("mastered") {
        Some(v) => into_object(v, "v1 mastered 映射")?,
        None => Map::new(),
    };

    let mut lists = Map::new();
    for (list_name, ids) in mastered {
        let ids = match ids {
            Value::Array(ids) => ids,
            other => {
                return Err(StorageError::Migration(format!(
                    "v1 词表 {list_name} 的掌握集合不是数组: {other}"
                )))
            }
        };

        let mut mastery = Map::new();
        for id in ids {
            let Value::String(id) = id else {
                return Err(StorageError::Migration(format!(
                    "v1 词表 {list_name} 含非字符串单词 id"
                )));
            };
            mastery.insert(
                id,
                json!({
                    "mastered": true,
                    "lastReviewed": null,
                    "reviewCount": 1,
                    "nextReview": null,
                }),
            );
        }

        lists.insert(
            list_name,
            json!({
                "mastery": mastery,
                "dailyCommitment": null,
            }),
        );
    }

    root.insert("lists".to_string(), Value::Object(lists));
    root.insert("version".to_string(), json!(2));
    Ok(Value::Object(root))
}

/// V2 -> V3
///
/// 为每个进度桶补充 `wordOrder`/`sections`/`history`。词序要等下一次
/// 选择词表时才能从数据文件得到，迁移时置空，由 `SELECT_LIST` 的
/// 对账逻辑补全。
fn migrate_v2_to_v3(value: Value) -> StorageResult<Value> {
    let mut root = into_object(value, "v2 blob")?;

    let lists = match root.remove("lists") {
        Some(v) => into_object(v, "v2 lists 映射")?,
        None => Map::new(),
    };

    let mut upgraded = Map::new();
    for (list_name, bucket) in lists {
        let mut bucket = into_object(bucket, "v2 进度桶")?;
        bucket
            .entry("wordOrder".to_string())
            .or_insert_with(|| json!([]));
        bucket
            .entry("sections".to_string())
            .or_insert_with(|| json!([]));
        bucket
            .entry("history".to_string())
            .or_insert_with(|| json!({}));
        upgraded.insert(list_name, Value::Object(bucket));
    }

    root.insert("lists".to_string(), Value::Object(upgraded));
    root.insert("version".to_string(), json!(3));
    Ok(Value::Object(root))
}

fn into_object(value: Value, what: &str) -> StorageResult<Map<String, Value>> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(StorageError::Migration(format!(
            "{what} 不是 JSON 对象: {other}"
        ))),
    }
}

// ============================================================
// 测试
// ============================================================
