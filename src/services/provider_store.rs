//! 提供商存储（`providers.json`）
//!
//! 所有“读取-修改-写回”操作都在跨进程文件锁内完成，写入为整文件原子替换。

use crate::core::{AppError, AppResult};
use crate::data::lock::{FileLock, DEFAULT_LOCK_TIMEOUT};
use crate::data::managers::JsonManager;
use crate::data::DataError;
use crate::models::provider::{default_providers, ProviderCollection, ProviderPatch, ProviderRecord};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// `providers.json` 的磁盘结构
#[derive(Debug, Serialize, Deserialize)]
struct StoreFile {
    providers: ProviderCollection,
}

/// 删除结果
#[derive(Debug, Clone, PartialEq)]
pub struct RemovedProvider {
    pub record: ProviderRecord,
    /// 被删除的是否为当前激活的提供商（调用方据此清除激活状态）
    pub was_active: bool,
}

pub struct ProviderStore {
    path: PathBuf,
    json: JsonManager,
    lock_timeout: Duration,
}

impl ProviderStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            json: JsonManager::new(),
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
        }
    }

    pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = timeout;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 读取全部提供商
    ///
    /// 文件不存在或内容损坏时返回内置默认配置（不回写），损坏只记录警告。
    pub fn load(&self) -> AppResult<ProviderCollection> {
        match self.json.read_as::<StoreFile>(&self.path) {
            Ok(store) => Ok(store.providers),
            Err(e) if e.is_not_found() => {
                tracing::debug!(path = %self.path.display(), "存储文件不存在，使用默认配置");
                Ok(default_providers())
            }
            Err(DataError::Malformed { path, source }) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %source,
                    "存储文件已损坏，使用默认配置"
                );
                Ok(default_providers())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// 整体保存集合
    pub fn save(&self, collection: &ProviderCollection) -> AppResult<()> {
        let _lock = FileLock::acquire(&self.path, self.lock_timeout)?;
        self.write(collection)
    }

    pub fn get(&self, id: &str) -> AppResult<ProviderRecord> {
        self.load()?
            .get(id)
            .cloned()
            .ok_or_else(|| AppError::not_found(id))
    }

    /// 添加新提供商，id 已存在时返回 `DuplicateId`
    pub fn add(&self, id: &str, record: ProviderRecord) -> AppResult<()> {
        self.modify(|providers| {
            if providers.contains(id) {
                return Err(AppError::DuplicateId { id: id.to_string() });
            }
            providers.upsert(id, record);
            Ok(())
        })?;
        tracing::info!(provider = id, "已添加提供商");
        Ok(())
    }

    /// 部分更新，返回更新后的记录
    pub fn update(&self, id: &str, patch: &ProviderPatch) -> AppResult<ProviderRecord> {
        let updated = self.modify(|providers| {
            let record = providers
                .get_mut(id)
                .ok_or_else(|| AppError::not_found(id))?;
            record.apply(patch);
            Ok(record.clone())
        })?;
        tracing::info!(provider = id, "已更新提供商");
        Ok(updated)
    }

    /// 删除提供商
    ///
    /// `active` 为当前激活的 id，用于计算 `was_active`；本方法不修改激活状态。
    pub fn remove(&self, id: &str, active: Option<&str>) -> AppResult<RemovedProvider> {
        let record = self.modify(|providers| {
            providers.remove(id).ok_or_else(|| AppError::not_found(id))
        })?;
        tracing::info!(provider = id, "已删除提供商");
        Ok(RemovedProvider {
            record,
            was_active: active == Some(id),
        })
    }

    /// 在文件锁内用闭包的结果整体替换集合（导入使用）
    ///
    /// 闭包收到锁内读取的当前集合，返回新集合与附带结果。
    pub fn replace_with<F, R>(&self, f: F) -> AppResult<R>
    where
        F: FnOnce(&ProviderCollection) -> (ProviderCollection, R),
    {
        self.modify(|providers| {
            let (next, result) = f(providers);
            *providers = next;
            Ok(result)
        })
    }

    /// 在文件锁内加载、修改并写回；闭包返回错误时不写入
    fn modify<F, R>(&self, f: F) -> AppResult<R>
    where
        F: FnOnce(&mut ProviderCollection) -> AppResult<R>,
    {
        let _lock = FileLock::acquire(&self.path, self.lock_timeout)?;
        let mut providers = self.load()?;
        let result = f(&mut providers)?;
        self.write(&providers)?;
        Ok(result)
    }

    fn write(&self, collection: &ProviderCollection) -> AppResult<()> {
        let store = StoreFile {
            providers: collection.clone(),
        };
        self.json.write_as(&self.path, &store)?;
        tracing::debug!(path = %self.path.display(), count = collection.len(), "已写入存储文件");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn store_in(dir: &TempDir) -> ProviderStore {
        ProviderStore::new(dir.path().join("providers.json"))
    }

    fn configured(name: &str) -> ProviderRecord {
        ProviderRecord::new(name, "https://api.example.com", "sk-test-123456789", "")
    }

    #[test]
    fn test_load_missing_returns_defaults_without_writing() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        let providers = store.load().unwrap();

        assert_eq!(providers, default_providers());
        assert!(!store.path().exists());
    }

    #[test]
    fn test_load_corrupt_returns_defaults() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        fs::write(store.path(), "{ not json").unwrap();

        assert_eq!(store.load().unwrap(), default_providers());
        // 损坏的文件保持原样
        assert_eq!(fs::read_to_string(store.path()).unwrap(), "{ not json");
    }

    #[test]
    fn test_load_non_utf8_returns_defaults() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        fs::write(store.path(), [0xff, 0xfe, 0x00, 0x7b]).unwrap();

        assert_eq!(store.load().unwrap(), default_providers());
        // 损坏时其他操作照常可用
        store.add("mine", configured("Mine")).unwrap();
        assert_eq!(store.load().unwrap().len(), 5);
    }

    #[test]
    fn test_load_without_providers_field_returns_defaults() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        fs::write(store.path(), r#"{"other": 1}"#).unwrap();

        assert_eq!(store.load().unwrap(), default_providers());
    }

    #[test]
    fn test_add_persists_alongside_defaults() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        store.add("mine", configured("Mine")).unwrap();

        let providers = store.load().unwrap();
        assert_eq!(providers.len(), 5);
        assert_eq!(providers.ids().last(), Some("mine"));
        assert_eq!(
            providers.get("mine"),
            Some(&ProviderRecord::new(
                "Mine",
                "https://api.example.com",
                "sk-test-123456789",
                ""
            ))
        );

        store
            .add(
                "described",
                ProviderRecord::new("D", "https://d.example.com", "sk-d", "带描述"),
            )
            .unwrap();
        assert_eq!(
            store.get("described").unwrap(),
            ProviderRecord::new("D", "https://d.example.com", "sk-d", "带描述")
        );
    }

    #[test]
    fn test_add_duplicate_is_rejected() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        let err = store.add("qwen", configured("Other")).unwrap_err();

        assert!(matches!(err, AppError::DuplicateId { ref id } if id == "qwen"));
        // 失败时不写入
        assert!(!store.path().exists());
    }

    #[test]
    fn test_update_applies_only_supplied_fields() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        let patch = ProviderPatch {
            api_key: Some("sk-new".into()),
            ..Default::default()
        };
        let updated = store.update("kimi", &patch).unwrap();

        assert_eq!(updated.api_key, "sk-new");
        assert_eq!(updated.name, "Kimi (月之暗面)");
        assert_eq!(updated.base_url, "https://api.moonshot.cn/anthropic/");

        // 位置不变
        let ids: Vec<String> = store.load().unwrap().ids().map(String::from).collect();
        assert_eq!(ids, ["qwen", "kimi", "zhipu", "custom"]);
    }

    #[test]
    fn test_update_missing_is_not_found() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        let err = store.update("nope", &ProviderPatch::default()).unwrap_err();
        assert!(matches!(err, AppError::NotFound { .. }));
    }

    #[test]
    fn test_remove_reports_active() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        let removed = store.remove("zhipu", Some("zhipu")).unwrap();
        assert!(removed.was_active);
        assert_eq!(removed.record.name, "智谱 GLM-4.5");

        let removed = store.remove("kimi", Some("qwen")).unwrap();
        assert!(!removed.was_active);

        let providers = store.load().unwrap();
        assert!(!providers.contains("zhipu"));
        assert!(!providers.contains("kimi"));
        assert!(matches!(
            store.remove("kimi", None).unwrap_err(),
            AppError::NotFound { .. }
        ));
    }

    #[test]
    fn test_get() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        assert_eq!(store.get("custom").unwrap().name, "自定义提供商");
        assert!(matches!(
            store.get("missing").unwrap_err(),
            AppError::NotFound { .. }
        ));
    }

    #[test]
    fn test_save_is_lossless() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        let mut providers = ProviderCollection::new();
        providers.upsert("b", configured("B"));
        providers.upsert("a", ProviderRecord::new("A", "", "", "说明"));
        store.save(&providers).unwrap();

        assert_eq!(store.load().unwrap(), providers);
        let raw = fs::read_to_string(store.path()).unwrap();
        assert!(raw.find("\"b\"").unwrap() < raw.find("\"a\"").unwrap());
    }

    #[cfg(unix)]
    #[test]
    fn test_save_sets_private_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store.save(&default_providers()).unwrap();

        let mode = fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn test_replace_with_runs_under_lock() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);
        store.add("mine", configured("Mine")).unwrap();

        let contended = store
            .replace_with(|current| {
                // 锁内读取到的是最新内容，且此时其他写入者无法取得锁
                assert!(current.contains("mine"));
                let other = FileLock::acquire(store.path(), Duration::from_millis(50));
                let mut next = current.clone();
                next.remove("qwen");
                (next, matches!(other, Err(DataError::Concurrency(_))))
            })
            .unwrap();

        assert!(contended);
        let providers = store.load().unwrap();
        assert!(!providers.contains("qwen"));
        assert!(providers.contains("mine"));
    }

    #[test]
    fn test_mutation_times_out_while_locked_elsewhere() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir).with_lock_timeout(Duration::from_millis(100));

        let _held = FileLock::acquire(store.path(), Duration::from_secs(1)).unwrap();
        let err = store.add("x", configured("X")).unwrap_err();

        assert!(matches!(err, AppError::Data(DataError::Concurrency(_))));
    }
}
