//! ProviderManager：组合存储、激活状态与环境注入
//!
//! 切换流程：读取记录 → 注入环境变量 → 更新激活状态。
//! 注入在修改任何状态前校验记录完整性；持久化致命失败时激活状态保持不变。

use crate::core::{AppError, AppResult};
use crate::models::provider::{ProviderDescriptor, ProviderPatch, ProviderRecord};
use crate::models::transfer::{ImportMode, ImportReport};
use crate::services::active_selection::ActiveSelectionTracker;
use crate::services::environment::{ActivationOutcome, EnvironmentInjector, EnvironmentSnapshot};
use crate::services::provider_store::{ProviderStore, RemovedProvider};
use crate::services::transfer::{self, ConflictPolicy};
use crate::utils::config::{current_path, providers_path};
use std::path::Path;

/// `status` 的结果
#[derive(Debug, Clone, PartialEq)]
pub struct StatusReport {
    pub snapshot: EnvironmentSnapshot,
    /// 当前激活的提供商记录
    pub active: Option<ProviderRecord>,
    /// 本次查询时被清除的失效激活 id
    pub cleared: Option<String>,
}

/// 导出结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSummary {
    pub total: usize,
    pub include_keys: bool,
}

pub struct ProviderManager {
    store: ProviderStore,
    selection: ActiveSelectionTracker,
    injector: EnvironmentInjector,
}

impl ProviderManager {
    /// 使用配置目录下的 `providers.json` 与 `current.json`
    pub fn new(config_dir: &Path, injector: EnvironmentInjector) -> Self {
        Self::with_parts(
            ProviderStore::new(providers_path(config_dir)),
            ActiveSelectionTracker::new(current_path(config_dir)),
            injector,
        )
    }

    pub fn with_parts(
        store: ProviderStore,
        selection: ActiveSelectionTracker,
        injector: EnvironmentInjector,
    ) -> Self {
        Self {
            store,
            selection,
            injector,
        }
    }

    pub fn active_id(&self) -> Option<String> {
        self.selection.get()
    }

    /// 列出所有提供商（按存储顺序）
    pub fn list(&self) -> AppResult<Vec<ProviderDescriptor>> {
        let providers = self.store.load()?;
        let active = self.active_id();
        Ok(providers
            .iter()
            .map(|(id, record)| ProviderDescriptor::from_record(id, record, active.as_deref()))
            .collect())
    }

    pub fn get(&self, id: &str) -> AppResult<ProviderRecord> {
        self.store.get(id)
    }

    pub fn add(&self, id: &str, record: ProviderRecord) -> AppResult<()> {
        self.store.add(id, record)
    }

    pub fn update(&self, id: &str, patch: &ProviderPatch) -> AppResult<ProviderRecord> {
        self.store.update(id, patch)
    }

    /// 删除提供商；删除的是当前激活项时同时清除激活状态
    ///
    /// 已注入的环境变量与 shell 启动文件不回滚。
    pub fn delete(&self, id: &str) -> AppResult<RemovedProvider> {
        let active = self.active_id();
        let removed = self.store.remove(id, active.as_deref())?;
        if removed.was_active {
            self.selection.set(None)?;
        }
        Ok(removed)
    }

    /// 切换到指定提供商
    pub fn switch(&self, id: &str) -> AppResult<ActivationOutcome> {
        let record = self.store.get(id)?;
        let outcome = self.injector.activate(id, &record)?;
        self.selection.set(Some(id))?;

        match &outcome {
            ActivationOutcome::Persisted { target } => {
                tracing::info!(provider = id, target = %target, "已切换提供商");
            }
            ActivationOutcome::Partial { target, warnings } => {
                tracing::warn!(
                    provider = id,
                    target = %target,
                    warnings = warnings.len(),
                    "已切换提供商，但持久化不完整"
                );
            }
        }
        Ok(outcome)
    }

    /// 清除激活状态（不修改环境变量）
    pub fn clear_active(&self) -> AppResult<()> {
        self.selection.set(None)
    }

    /// 激活的 id 已不在存储中时清除它，返回被清除的 id
    pub fn reconcile(&self) -> AppResult<Option<String>> {
        let Some(active) = self.active_id() else {
            return Ok(None);
        };
        if self.store.load()?.contains(&active) {
            return Ok(None);
        }
        tracing::warn!(provider = %active, "当前提供商已不存在，清除激活状态");
        self.selection.set(None)?;
        Ok(Some(active))
    }

    /// 当前状态：激活提供商与进程中的环境变量，并检测两者是否一致
    pub fn status(&self) -> AppResult<StatusReport> {
        let cleared = self.reconcile()?;
        let active_id = self.active_id();
        let active = match active_id.as_deref() {
            Some(id) => match self.store.get(id) {
                Ok(record) => Some(record),
                Err(AppError::NotFound { .. }) => None,
                Err(e) => return Err(e),
            },
            None => None,
        };
        let snapshot = self
            .injector
            .snapshot(active_id)
            .with_drift_against(active.as_ref());
        if snapshot.drift {
            tracing::debug!("环境变量与当前提供商配置不一致");
        }
        Ok(StatusReport {
            snapshot,
            active,
            cleared,
        })
    }

    /// 导出到文件，不修改任何状态
    pub fn export_to_file(&self, path: &Path, include_keys: bool) -> AppResult<ExportSummary> {
        let providers = self.store.load()?;
        let document = transfer::export(&providers, include_keys);
        transfer::write_document(path, &document)?;
        Ok(ExportSummary {
            total: document.providers.len(),
            include_keys,
        })
    }

    /// 从文件导入
    ///
    /// 文档在任何修改之前完成校验；导入后若激活的 id 不复存在则清除激活状态。
    pub fn import_from_file(
        &self,
        path: &Path,
        mode: ImportMode,
        policy: ConflictPolicy<'_>,
    ) -> AppResult<ImportReport> {
        let document = transfer::read_document(path)?;
        // 读取与写回在同一把文件锁内完成，避免覆盖其他进程的并发修改
        let report = self.store.replace_with(|current| {
            let report = transfer::import(current, &document, mode, policy);
            (report.collection.clone(), report)
        })?;
        tracing::info!(
            path = %path.display(),
            mode = ?mode,
            imported = report.imported,
            "已导入配置"
        );
        self.reconcile()?;
        Ok(report)
    }
}
