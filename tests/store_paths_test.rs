//! 配置路径解析测试

use prop_store::{StorePaths, DEFAULT_STORE_FILE_NAME};

#[test]
fn test_default_file_name_resolution() {
    let paths = StorePaths::new().unwrap();
    assert!(
        paths
            .store_file()
            .to_string_lossy()
            .contains(DEFAULT_STORE_FILE_NAME),
        "Default path should point at app.properties"
    );
}

#[test]
fn test_custom_file_name_resolution() {
    let paths = StorePaths::with_file_name("prop_store_test_only.properties").unwrap();

    // 文件在任何位置都不存在时，应回落到当前工作目录
    let current_dir = std::env::current_dir().unwrap();
    assert_eq!(
        paths.store_file(),
        current_dir.join("prop_store_test_only.properties"),
        "Nonexistent file should resolve against the working directory"
    );
}
