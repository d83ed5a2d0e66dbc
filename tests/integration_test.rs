//! 端到端场景测试
//!
//! 覆盖完整流程：选表 -> 设置每日学习量 -> 逐词掌握 -> 重开恢复，
//! 以及坏数据与历史版本 blob 的启动路径。

use danci_progress::{
    load, FileBackend, MemoryBackend, ProgressStore, StoreError, StoreHandle, Word,
    CURRENT_SCHEMA_VERSION,
};

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

#[test]
fn hsk1_daily_study_scenario() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("progress-default.json");

    let loaded = words(10);
    {
        let mut handle = StoreHandle::open(Box::new(FileBackend::new(&path)));
        handle.select_list("HSK1", loaded.clone()).expect("select");
        handle.set_daily_commitment(3).expect("commit 3/day");

        let sections = &handle.state().lists["HSK1"].sections;
        assert_eq!(sections.len(), 4);
        assert_eq!(sections[0].word_ids, vec!["w1", "w2", "w3"]);
        assert_eq!(sections[3].word_ids, vec!["w10"]);

        for i in 1..=9 {
            handle.mark_word_learned(format!("w{i}")).expect("mark");
        }
        assert_eq!(handle.mastered_count("HSK1"), 9);

        let today: Vec<String> = handle
            .todays_words(&loaded)
            .into_iter()
            .map(|w| w.id)
            .collect();
        assert_eq!(today, vec!["w10"]);
    }

    // 重开：进度从磁盘恢复，小节归属不变
    let mut handle = StoreHandle::open(Box::new(FileBackend::new(&path)));
    assert_eq!(handle.mastered_count("HSK1"), 9);
    let current = handle.current_section().expect("one section left");
    assert_eq!(current.word_ids, vec!["w10"]);

    handle.mark_word_learned("w10").expect("finish the list");
    assert_eq!(handle.mastered_count("HSK1"), 10);
    assert!(handle.current_section().is_none());
}

#[test]
fn corrupt_blob_falls_back_to_default() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("progress-default.json");
    std::fs::write(&path, "{not json").expect("write corrupt blob");

    let backend = FileBackend::new(&path);
    let store = load(&backend);
    assert!(store.selected_list.is_none());
    assert!(store.lists.is_empty());
    assert_eq!(store.version, CURRENT_SCHEMA_VERSION);

    // 坏 blob 不阻塞后续使用：句柄照常打开并可写入
    let mut handle = StoreHandle::open(Box::new(backend));
    handle.select_list("HSK1", words(3)).expect("select");
    handle.mark_word_learned("w1").expect("mark");
    assert_eq!(handle.mastered_count("HSK1"), 1);
}

#[test]
fn v1_blob_migrates_then_reconciles_on_select() {
    let backend = MemoryBackend::with_blob(
        r#"{"version":1,"selectedList":"HSK1","mastered":{"HSK1":["w1","w2","gone"]}}"#,
    );
    let mut handle = StoreHandle::open(Box::new(backend));

    // 迁移后保留掌握数据；词序要等选表时补全
    assert_eq!(handle.state().version, CURRENT_SCHEMA_VERSION);
    assert_eq!(handle.mastered_count("HSK1"), 3);
    assert!(handle.state().lists["HSK1"].word_order.is_empty());

    // 选表对账：不在新词表里的 "gone" 被清理
    handle.select_list("HSK1", words(5)).expect("select");
    assert_eq!(handle.mastered_count("HSK1"), 2);
    let progress = &handle.state().lists["HSK1"];
    assert!(progress.mastery.contains_key("w1"));
    assert!(!progress.mastery.contains_key("gone"));
    assert_eq!(progress.word_order.len(), 5);
}

#[test]
fn validation_errors_do_not_mutate_or_persist() {
    let mut handle = StoreHandle::open(Box::new(MemoryBackend::new()));
    handle.select_list("HSK1", words(4)).expect("select");

    let err = handle.set_daily_commitment(99).unwrap_err();
    assert!(matches!(err, StoreError::Validation(_)));
    assert!(handle.state().last_error.is_some());
    assert_eq!(handle.state().lists["HSK1"].daily_commitment, None);

    let err = handle.mark_word_learned("not-here").unwrap_err();
    assert!(matches!(err, StoreError::Validation(_)));
    assert_eq!(handle.mastered_count("HSK1"), 0);

    // 下一个合法 action 清空错误
    handle.set_daily_commitment(2).expect("valid commitment");
    assert!(handle.state().last_error.is_none());
}

#[test]
fn reset_is_scoped_to_one_list() {
    let mut handle = StoreHandle::open(Box::new(MemoryBackend::new()));
    handle.select_list("HSK2", words(6)).expect("select HSK2");
    handle.set_daily_commitment(2).expect("commit");
    handle.mark_word_learned("w1").expect("mark");

    handle.select_list("HSK1", words(4)).expect("select HSK1");
    handle.mark_word_learned("w2").expect("mark");

    handle.reset_list_progress("HSK2").expect("reset HSK2");

    assert_eq!(handle.mastered_count("HSK2"), 0);
    assert!(handle.state().lists["HSK2"].sections.is_empty());
    assert_eq!(handle.mastered_count("HSK1"), 1);

    let empty_store = ProgressStore::default();
    assert_eq!(empty_store.commitment_upper_bound(), 0);
}
