//! 配置存储测试
//!
//! 测试键值配置的加载、读写、落盘和关闭行为

use prop_store::{ConfigStore, ConfigStoreError, PersistErrorPolicy, StoreOptions};
use std::fs;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

fn store_path(temp_dir: &TempDir) -> std::path::PathBuf {
    temp_dir.path().join("app.properties")
}

#[tokio::test]
async fn test_load_then_get() {
    let temp_dir = TempDir::new().unwrap();
    let path = store_path(&temp_dir);
    fs::write(&path, "a=1\n").unwrap();

    let store = ConfigStore::open(&path);
    assert_eq!(
        store.get("a").as_deref(),
        Some("1"),
        "Existing entry should be loaded"
    );

    store.close().await.unwrap();
}

#[tokio::test]
async fn test_missing_file_tolerance() {
    let temp_dir = TempDir::new().unwrap();
    let path = store_path(&temp_dir);

    // 文件不存在时构造不应失败
    let store = ConfigStore::open(&path);
    assert!(store.get("anything").is_none(), "Missing key should be absent");
    assert!(store.is_empty(), "Store should start empty without a file");

    store.close().await.unwrap();
}

#[tokio::test]
async fn test_unreadable_file_tolerance() {
    let temp_dir = TempDir::new().unwrap();
    let path = store_path(&temp_dir);
    // 非UTF-8内容无法按文本读取
    fs::write(&path, [0xff, 0xfe, 0xfd]).unwrap();

    let store = ConfigStore::open(&path);
    assert!(store.is_empty(), "Unreadable file should leave the store empty");

    store.close().await.unwrap();
}

#[tokio::test]
async fn test_set_then_get_and_overwrite() {
    let temp_dir = TempDir::new().unwrap();
    let store = ConfigStore::open(store_path(&temp_dir));

    store.set("k", "v1");
    assert_eq!(
        store.get("k").as_deref(),
        Some("v1"),
        "Set should be visible immediately"
    );

    store.set("k", "v2");
    assert_eq!(
        store.get("k").as_deref(),
        Some("v2"),
        "Overwrite should replace the previous value"
    );

    store.close().await.unwrap();
}

#[tokio::test]
async fn test_remove_and_enumeration() {
    let temp_dir = TempDir::new().unwrap();
    let store = ConfigStore::open(store_path(&temp_dir));

    store.set("b", "2");
    store.set("a", "1");
    assert!(store.contains("a"), "Inserted key should be present");
    assert_eq!(store.len(), 2);

    let entries = store.entries();
    assert_eq!(
        entries,
        vec![
            ("a".to_string(), "1".to_string()),
            ("b".to_string(), "2".to_string())
        ],
        "Entries should be key-sorted"
    );

    assert_eq!(store.remove("a").as_deref(), Some("1"));
    assert!(!store.contains("a"), "Removed key should be absent");
    assert_eq!(store.len(), 1);

    store.close().await.unwrap();
}

#[tokio::test]
async fn test_persist_round_trip() {
    let temp_dir = TempDir::new().unwrap();
    let path = store_path(&temp_dir);

    let store = ConfigStore::open(&path);
    store.set("plain", "value");
    store.set("key with spaces", "v1");
    store.set("eq=key", "a=b:c");
    store.set("中文键", "中文值");
    store.set("multi", "line1\nline2");
    store.set("leading", " padded");
    store.set("empty", "");
    let expected = store.entries();
    store.close().await.unwrap();

    // 用同一路径重新构造，映射应完全一致
    let reloaded = ConfigStore::open(&path);
    assert_eq!(
        reloaded.entries(),
        expected,
        "Round trip should preserve all entries"
    );

    reloaded.close().await.unwrap();
}

#[tokio::test]
async fn test_flush_idempotence() {
    let temp_dir = TempDir::new().unwrap();
    let path = store_path(&temp_dir);

    let store = ConfigStore::open(&path);
    store.set("a", "1");
    store.set("b", "2");

    store.store().unwrap();
    let first = fs::read_to_string(&path).unwrap();
    store.store().unwrap();
    let second = fs::read_to_string(&path).unwrap();

    // 键值内容必须一致，注释行（时间戳）允许不同
    let data_lines = |content: &str| -> Vec<String> {
        content
            .lines()
            .filter(|line| !line.starts_with('#'))
            .map(str::to_string)
            .collect()
    };
    assert_eq!(
        data_lines(&first),
        data_lines(&second),
        "Repeated flushes without mutation should produce identical entries"
    );

    store.close().await.unwrap();
}

#[tokio::test]
async fn test_store_error_propagation() {
    let temp_dir = TempDir::new().unwrap();
    // 父目录不存在，写入必然失败
    let path = temp_dir.path().join("no_such_dir").join("app.properties");

    let store = ConfigStore::open(&path);
    store.set("k", "v");

    let result = store.store();
    assert!(
        matches!(result, Err(ConfigStoreError::Persist { .. })),
        "Explicit store should report persist failures"
    );
    assert_eq!(
        store.get("k").as_deref(),
        Some("v"),
        "In-memory mapping must survive a failed flush"
    );
}

#[tokio::test]
async fn test_store_error_log_and_continue() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("no_such_dir").join("app.properties");

    let options = StoreOptions {
        persist_error_policy: PersistErrorPolicy::LogAndContinue,
        ..StoreOptions::default()
    };
    let store = ConfigStore::open_with_options(&path, options);
    store.set("k", "v");

    assert!(
        store.store().is_ok(),
        "LogAndContinue policy should swallow persist failures"
    );
}

#[tokio::test]
async fn test_close_flushes_pending_changes() {
    let temp_dir = TempDir::new().unwrap();
    let path = store_path(&temp_dir);

    let store = ConfigStore::open(&path);
    store.set("pending", "yes");
    store.close().await.unwrap();

    let content = fs::read_to_string(&path).unwrap();
    assert!(
        content.contains("pending=yes"),
        "Close should flush pending mutations"
    );

    // 重复关闭应为空操作
    store.close().await.unwrap();
}

#[tokio::test]
async fn test_periodic_flush_persists_without_explicit_store() {
    let temp_dir = TempDir::new().unwrap();
    let path = store_path(&temp_dir);

    let options = StoreOptions {
        flush_interval: Duration::from_millis(50),
        ..StoreOptions::default()
    };
    let store = ConfigStore::open_with_options(&path, options);
    store.set("auto", "flushed");

    // 等待若干个刷新周期
    tokio::time::sleep(Duration::from_millis(300)).await;

    let content = fs::read_to_string(&path).unwrap();
    assert!(
        content.contains("auto=flushed"),
        "Background task should persist without an explicit store call"
    );

    store.close().await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_set_during_flush() {
    let temp_dir = TempDir::new().unwrap();
    let path = store_path(&temp_dir);

    let options = StoreOptions {
        flush_interval: Duration::from_millis(10),
        ..StoreOptions::default()
    };
    let store = Arc::new(ConfigStore::open_with_options(&path, options));

    let mut handles = Vec::new();
    for task_id in 0..8 {
        let store = Arc::clone(&store);
        handles.push(tokio::spawn(async move {
            for i in 0..100 {
                store.set(format!("key_{task_id}_{i}"), format!("{i}"));
                if i % 25 == 0 {
                    // 显式落盘与后台刷新并发进行
                    store.store().unwrap();
                }
            }
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    assert_eq!(
        store.len(),
        800,
        "No update should be lost under concurrent mutation"
    );
    store.close().await.unwrap();

    // 重新加载验证落盘内容完整
    let reloaded = ConfigStore::open(&path);
    assert_eq!(reloaded.len(), 800, "Persisted mapping should be complete");
    reloaded.close().await.unwrap();
}

#[tokio::test]
async fn test_file_path_is_fixed() {
    let temp_dir = TempDir::new().unwrap();
    let path = store_path(&temp_dir);

    let store = ConfigStore::open(&path);
    assert_eq!(store.file_path(), path.as_path());

    store.close().await.unwrap();
}
