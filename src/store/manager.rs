//! 配置存储管理模块
//! 负责加载、修改和周期性保存键值配置

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};

use crate::error::{ConfigStoreError, Result};
use crate::store::format;

/// 默认后台刷新周期
pub const DEFAULT_FLUSH_INTERVAL: Duration = Duration::from_secs(60);

/// 默认的文件头部注释
pub const DEFAULT_FILE_COMMENT: &str = "store to properties file";

/// 显式落盘失败的处理策略
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistErrorPolicy {
    /// 将错误返回给调用方
    Propagate,
    /// 仅记录警告日志并继续运行
    LogAndContinue,
}

/// 配置存储选项
#[derive(Debug, Clone)]
pub struct StoreOptions {
    /// 后台刷新周期
    pub flush_interval: Duration,
    /// 显式调用 `store()`/`close()` 落盘失败时的处理策略，
    /// 后台刷新任务始终只记录警告
    pub persist_error_policy: PersistErrorPolicy,
    /// 写入文件头部的注释内容
    pub file_comment: String,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            flush_interval: DEFAULT_FLUSH_INTERVAL,
            persist_error_policy: PersistErrorPolicy::Propagate,
            file_comment: DEFAULT_FILE_COMMENT.to_string(),
        }
    }
}

/// 存储内部状态，与后台刷新任务共享
struct StoreInner {
    entries: Mutex<HashMap<String, String>>,
    file_path: PathBuf,
    file_comment: String,
}

impl StoreInner {
    fn lock_entries(&self) -> MutexGuard<'_, HashMap<String, String>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// 将当前映射序列化并写入备份文件
    ///
    /// 序列化在持锁期间完成，文件写入在释放锁之后进行，
    /// 保证写出的是开始写入时刻的一致快照，且IO不阻塞前台读写
    fn persist(&self) -> Result<()> {
        let content = {
            let entries = self.lock_entries();
            format::serialize(&entries, &self.file_comment)
        };

        fs::write(&self.file_path, content)
            .map_err(|e| ConfigStoreError::persist(&self.file_path, e))?;

        tracing::debug!("配置文件保存成功: {:?}", self.file_path);
        Ok(())
    }
}

/// 键值配置存储
///
/// 构造时从备份文件加载映射，之后所有读写都在内存中进行，
/// 由后台任务按固定周期落盘。实例应由应用的组装层持有并
/// 传递给需要配置的组件，每个备份文件只应构造一个实例。
pub struct ConfigStore {
    inner: Arc<StoreInner>,
    persist_error_policy: PersistErrorPolicy,
    shutdown_tx: watch::Sender<bool>,
    flush_task: Mutex<Option<JoinHandle<()>>>,
}

impl ConfigStore {
    /// 使用默认选项打开配置存储
    ///
    /// 必须在 Tokio 运行时内调用，否则后台刷新任务无法启动
    ///
    /// # 示例
    /// ```no_run
    /// use prop_store::ConfigStore;
    ///
    /// # #[tokio::main]
    /// # async fn main() {
    /// let store = ConfigStore::open("app.properties");
    /// store.set("board.color", "blue");
    /// # }
    /// ```
    pub fn open(path: impl AsRef<Path>) -> Self {
        Self::open_with_options(path, StoreOptions::default())
    }

    /// 使用指定选项打开配置存储
    ///
    /// 备份文件缺失或不可读时记录警告并以空映射继续，构造本身不会失败。
    /// 后台刷新任务立即启动，首次刷新在启动时刻执行，之后按周期执行。
    pub fn open_with_options(path: impl AsRef<Path>, options: StoreOptions) -> Self {
        let file_path = path.as_ref().to_path_buf();

        let entries = match fs::read_to_string(&file_path) {
            Ok(content) => {
                let entries = format::parse(&content);
                tracing::info!(
                    "配置文件加载成功: {:?} ({} 项)",
                    file_path,
                    entries.len()
                );
                entries
            }
            Err(e) => {
                // 文件不存在或不可读不是错误，使用空映射继续
                tracing::warn!("{}", ConfigStoreError::load(&file_path, e));
                HashMap::new()
            }
        };

        let inner = Arc::new(StoreInner {
            entries: Mutex::new(entries),
            file_path,
            file_comment: options.file_comment,
        });

        // tokio::time::interval 不接受零周期
        let flush_interval = options.flush_interval.max(Duration::from_millis(1));

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let flush_task = tokio::spawn(flush_loop(
            Arc::clone(&inner),
            flush_interval,
            shutdown_rx,
        ));

        Self {
            inner,
            persist_error_policy: options.persist_error_policy,
            shutdown_tx,
            flush_task: Mutex::new(Some(flush_task)),
        }
    }

    /// 获取键对应的值
    pub fn get(&self, key: &str) -> Option<String> {
        self.inner.lock_entries().get(key).cloned()
    }

    /// 写入或覆盖键值
    ///
    /// 对后续 `get` 立即可见，落盘在下一次刷新时进行
    pub fn set(&self, key: impl Into<String>, value: impl Into<String>) {
        self.inner.lock_entries().insert(key.into(), value.into());
    }

    /// 删除键，返回被删除的值
    pub fn remove(&self, key: &str) -> Option<String> {
        self.inner.lock_entries().remove(key)
    }

    /// 判断键是否存在
    pub fn contains(&self, key: &str) -> bool {
        self.inner.lock_entries().contains_key(key)
    }

    /// 获取当前映射的条目数量
    pub fn len(&self) -> usize {
        self.inner.lock_entries().len()
    }

    /// 判断当前映射是否为空
    pub fn is_empty(&self) -> bool {
        self.inner.lock_entries().is_empty()
    }

    /// 获取按键排序的键值快照
    pub fn entries(&self) -> Vec<(String, String)> {
        let mut entries: Vec<(String, String)> = self
            .inner
            .lock_entries()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries
    }

    /// 获取备份文件路径
    pub fn file_path(&self) -> &Path {
        &self.inner.file_path
    }

    /// 显式落盘
    ///
    /// 将当前映射立即写入备份文件。失败时按构造选项中的
    /// 策略处理：`Propagate` 返回错误，`LogAndContinue` 记录警告
    pub fn store(&self) -> Result<()> {
        match self.inner.persist() {
            Ok(()) => Ok(()),
            Err(e) => match self.persist_error_policy {
                PersistErrorPolicy::Propagate => Err(e),
                PersistErrorPolicy::LogAndContinue => {
                    tracing::warn!("{e}");
                    Ok(())
                }
            },
        }
    }

    /// 关闭配置存储
    ///
    /// 停止后台刷新任务并执行最后一次落盘，保证未持久化的
    /// 修改不会丢失。重复调用是幂等的。
    pub async fn close(&self) -> Result<()> {
        let flush_task = self
            .flush_task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        let Some(flush_task) = flush_task else {
            // 已经关闭过
            return Ok(());
        };

        let _ = self.shutdown_tx.send(true);
        if let Err(e) = flush_task.await {
            if !e.is_cancelled() {
                tracing::warn!("后台刷新任务异常退出: {e}");
            }
        }

        self.store()
    }
}

impl Drop for ConfigStore {
    fn drop(&mut self) {
        // 未经 close 直接析构时只中止任务，不做落盘
        if let Some(flush_task) = self
            .flush_task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            flush_task.abort();
        }
    }
}

/// 后台周期刷新循环
///
/// 首次 tick 立即触发，之后按固定周期触发。单次落盘失败
/// 只记录警告，不会终止循环。
async fn flush_loop(
    inner: Arc<StoreInner>,
    period: Duration,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    let mut ticker = time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if let Err(e) = inner.persist() {
                    tracing::warn!("后台刷新失败: {e}");
                }
            }
            _ = shutdown_rx.changed() => {
                tracing::debug!("后台刷新任务停止: {:?}", inner.file_path);
                break;
            }
        }
    }
}
