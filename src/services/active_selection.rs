//! 当前激活提供商（`current.json`）

use crate::core::AppResult;
use crate::data::lock::{FileLock, DEFAULT_LOCK_TIMEOUT};
use crate::data::managers::JsonManager;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Default, Serialize, Deserialize)]
struct CurrentFile {
    #[serde(default)]
    current_provider: Option<String>,
}

pub struct ActiveSelectionTracker {
    path: PathBuf,
    json: JsonManager,
}

impl ActiveSelectionTracker {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            json: JsonManager::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 当前激活的 id；文件缺失、损坏或为空字符串时返回 `None`
    pub fn get(&self) -> Option<String> {
        match self.json.read_as::<CurrentFile>(&self.path) {
            Ok(file) => file.current_provider.filter(|id| !id.is_empty()),
            Err(e) if e.is_not_found() => None,
            Err(e) => {
                tracing::warn!(error = %e, "读取当前提供商失败，视为未激活");
                None
            }
        }
    }

    /// 持久化激活的 id，`None` 表示清除
    pub fn set(&self, id: Option<&str>) -> AppResult<()> {
        let _lock = FileLock::acquire(&self.path, DEFAULT_LOCK_TIMEOUT)?;
        let file = CurrentFile {
            current_provider: id.map(str::to_string),
        };
        self.json.write_as(&self.path, &file)?;
        match id {
            Some(id) => tracing::info!(provider = id, "已设置当前提供商"),
            None => tracing::info!("已清除当前提供商"),
        }
        Ok(())
    }
}
