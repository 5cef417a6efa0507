//! 跨进程文件锁
//!
//! 在目标文件同目录创建 `<name>.lock`，通过 `fs2` 获取排他锁。
//! 获取锁有等待上限，超时返回 `DataError::Concurrency`，不会无限阻塞。

use crate::data::{DataError, Result};
use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

/// 默认等待上限
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(5);

const RETRY_INTERVAL: Duration = Duration::from_millis(25);

/// 排他锁守卫，drop 时自动释放
#[derive(Debug)]
pub struct FileLock {
    file: File,
    path: PathBuf,
}

impl FileLock {
    /// 为 `target` 获取排他锁
    pub fn acquire(target: &Path, timeout: Duration) -> Result<Self> {
        let lock_path = lock_path_for(target);
        if let Some(parent) = lock_path.parent() {
            fs::create_dir_all(parent).map_err(|e| DataError::io(parent, e))?;
        }

        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&lock_path)
            .map_err(|e| DataError::io(&lock_path, e))?;

        let deadline = Instant::now() + timeout;
        loop {
            match file.try_lock_exclusive() {
                Ok(()) => {
                    tracing::trace!(lock = %lock_path.display(), "已获取文件锁");
                    return Ok(Self {
                        file,
                        path: lock_path,
                    });
                }
                Err(_) if Instant::now() < deadline => thread::sleep(RETRY_INTERVAL),
                Err(e) => {
                    return Err(DataError::Concurrency(format!(
                        "等待文件锁超时 ({}ms): {}: {}",
                        timeout.as_millis(),
                        lock_path.display(),
                        e
                    )))
                }
            }
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        let _ = self.file.unlock();
    }
}

fn lock_path_for(target: &Path) -> PathBuf {
    let mut name = target
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".lock");
    target.with_file_name(name)
}
