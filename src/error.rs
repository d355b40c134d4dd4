//! 统一错误处理
//!
//! 定义配置存储的错误类型和结果别名

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// 配置存储错误类型
#[derive(Error, Debug)]
pub enum ConfigStoreError {
    /// 配置文件加载错误
    #[error("配置加载失败: {}: {source}", path.display())]
    Load {
        /// 备份文件路径
        path: PathBuf,
        /// 底层IO错误
        source: io::Error,
    },

    /// 配置文件落盘错误
    #[error("配置保存失败: {}: {source}", path.display())]
    Persist {
        /// 备份文件路径
        path: PathBuf,
        /// 底层IO错误
        source: io::Error,
    },

    /// 配置路径解析错误
    #[error("配置路径错误: {message}")]
    Path {
        /// 错误描述
        message: String,
    },
}

impl ConfigStoreError {
    /// 创建加载错误
    pub fn load(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Load {
            path: path.into(),
            source,
        }
    }

    /// 创建落盘错误
    pub fn persist(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Persist {
            path: path.into(),
            source,
        }
    }

    /// 创建路径错误
    pub fn path(message: impl Into<String>) -> Self {
        Self::Path {
            message: message.into(),
        }
    }
}

/// 结果类型别名
pub type Result<T> = std::result::Result<T, ConfigStoreError>;
