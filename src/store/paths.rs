//! 配置路径管理模块
//! 负责解析程序根目录下的备份文件路径

use crate::error::{ConfigStoreError, Result};
use std::path::{Path, PathBuf};

/// 默认的备份文件名
pub const DEFAULT_STORE_FILE_NAME: &str = "app.properties";

/// 备份文件路径解析器
///
/// 存储核心只接受外部传入的路径，本解析器是可选的辅助：
/// 优先使用当前工作目录，若工作目录下不存在而可执行文件
/// 目录下已有同名文件，则使用后者
pub struct StorePaths {
    store_file: PathBuf,
}

impl StorePaths {
    /// 解析默认备份文件 `app.properties` 的路径
    pub fn new() -> Result<Self> {
        Self::with_file_name(DEFAULT_STORE_FILE_NAME)
    }

    /// 使用指定文件名解析备份文件路径
    pub fn with_file_name(file_name: &str) -> Result<Self> {
        let store_file = Self::resolve(file_name)?;

        Ok(Self { store_file })
    }

    /// 获取备份文件路径
    pub fn store_file(&self) -> &Path {
        &self.store_file
    }

    fn resolve(file_name: &str) -> Result<PathBuf> {
        // 首先尝试从当前工作目录查找
        let current_dir = std::env::current_dir().map_err(|e| {
            ConfigStoreError::path(format!("Failed to get current directory: {e}"))
        })?;

        let store_file = current_dir.join(file_name);

        // 如果工作目录没有，尝试从可执行文件目录查找
        if !store_file.exists() {
            if let Ok(exe_path) = std::env::current_exe() {
                if let Some(exe_dir) = exe_path.parent() {
                    let exe_store_file = exe_dir.join(file_name);
                    if exe_store_file.exists() {
                        tracing::info!(
                            "Found store file in executable directory: {:?}",
                            exe_store_file
                        );
                        return Ok(exe_store_file);
                    }
                }
            }
        }

        tracing::info!("Using store file path: {:?}", store_file);
        Ok(store_file)
    }
}
