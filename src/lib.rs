//! 键值配置存储库
//!
//! 进程内的键值配置存储，构造时从磁盘加载，运行期间由
//! 后台任务周期性落盘，保证修改在重启后依然有效
//!
//! ## 功能特性
//!
//! - properties 格式的扁平键值备份文件
//! - 周期性后台刷新与显式落盘
//! - 可配置的落盘失败处理策略
//! - 关闭时执行最后一次落盘，不丢失未保存的修改
//! - 统一错误处理
//!
//! ## 使用示例
//!
//! ```no_run
//! use prop_store::ConfigStore;
//!
//! # #[tokio::main]
//! # async fn main() -> prop_store::Result<()> {
//! // 打开配置存储（文件不存在时以空映射启动）
//! let store = ConfigStore::open("app.properties");
//!
//! store.set("board.color", "blue");
//! assert_eq!(store.get("board.color").as_deref(), Some("blue"));
//!
//! // 停止后台刷新并执行最后一次落盘
//! store.close().await?;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod logging;
pub mod store;

// 重新导出主要功能
pub use error::{ConfigStoreError, Result};
pub use store::manager::{
    ConfigStore, PersistErrorPolicy, StoreOptions, DEFAULT_FILE_COMMENT,
    DEFAULT_FLUSH_INTERVAL,
};
pub use store::paths::{StorePaths, DEFAULT_STORE_FILE_NAME};
