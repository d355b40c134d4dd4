//! 配置存储模块
//!
//! 提供键值配置的加载、修改和周期性落盘功能

/// properties 格式编解码
pub mod format;
pub mod manager;
pub mod paths;
