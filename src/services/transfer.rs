//! 配置导入/导出
//!
//! 只处理内存中的集合与文档文件，从不修改当前激活的提供商。

use crate::core::{AppError, AppResult};
use crate::data::managers::JsonManager;
use crate::data::DataError;
use crate::models::provider::{ProviderCollection, ProviderRecord};
use crate::models::transfer::{
    ExportInfo, ImportMode, ImportReport, TransferDocument, EXPORT_FORMAT_VERSION,
};
use chrono::Local;
use std::path::Path;

/// 合并导入时对已存在 id 的逐条裁决
pub trait ConflictResolver {
    /// 返回 `true` 表示用导入的记录覆盖现有记录
    fn should_overwrite(&mut self, id: &str, existing: &ProviderRecord, incoming: &ProviderRecord)
        -> bool;
}

/// 合并导入时的冲突策略
pub enum ConflictPolicy<'a> {
    /// 保留现有记录
    Skip,
    /// 用导入的记录覆盖
    Overwrite,
    /// 交给解析器逐条决定
    Ask(&'a mut dyn ConflictResolver),
}

/// 生成导出文档；`include_tokens` 为 false 时清空所有 API Key
pub fn export(collection: &ProviderCollection, include_tokens: bool) -> TransferDocument {
    let providers: ProviderCollection = collection
        .iter()
        .map(|(id, record)| {
            let record = if include_tokens {
                record.clone()
            } else {
                record.redacted()
            };
            (id.to_string(), record)
        })
        .collect();

    TransferDocument {
        export_info: Some(ExportInfo {
            version: EXPORT_FORMAT_VERSION.to_string(),
            export_time: Local::now().to_rfc3339(),
            total_providers: providers.len(),
        }),
        providers,
    }
}

/// 把文档应用到现有集合，返回新集合与统计（不落盘）
pub fn import(
    current: &ProviderCollection,
    document: &TransferDocument,
    mode: ImportMode,
    policy: ConflictPolicy<'_>,
) -> ImportReport {
    match mode {
        ImportMode::Replace => ImportReport {
            collection: document.providers.clone(),
            imported: document.providers.len(),
            added: document.providers.ids().map(String::from).collect(),
            ..Default::default()
        },
        ImportMode::Merge => merge(current, &document.providers, policy),
    }
}

fn merge(
    current: &ProviderCollection,
    incoming: &ProviderCollection,
    mut policy: ConflictPolicy<'_>,
) -> ImportReport {
    let mut report = ImportReport {
        collection: current.clone(),
        ..Default::default()
    };

    for (id, record) in incoming.iter() {
        let Some(existing) = current.get(id) else {
            report.collection.upsert(id, record.clone());
            report.added.push(id.to_string());
            continue;
        };

        let overwrite = match &mut policy {
            ConflictPolicy::Skip => false,
            ConflictPolicy::Overwrite => true,
            ConflictPolicy::Ask(resolver) => resolver.should_overwrite(id, existing, record),
        };

        if overwrite {
            report.collection.upsert(id, record.clone());
            report.overwritten.push(id.to_string());
        } else {
            report.skipped.push(id.to_string());
        }
    }

    report.imported = report.added.len() + report.overwritten.len();
    report
}

/// 写出导出文档
pub fn write_document(path: &Path, document: &TransferDocument) -> AppResult<()> {
    JsonManager::new().write_as(path, document)?;
    tracing::info!(
        path = %path.display(),
        count = document.providers.len(),
        "已导出配置"
    );
    Ok(())
}

/// 读取导入文档；无法解析或缺少 `providers` 字段时返回 `InvalidDocument`
pub fn read_document(path: &Path) -> AppResult<TransferDocument> {
    match JsonManager::new().read_as::<TransferDocument>(path) {
        Ok(document) => Ok(document),
        Err(DataError::Malformed { path, source }) => Err(AppError::InvalidDocument {
            path,
            reason: source.to_string(),
        }),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::provider::default_providers;
    use std::fs;
    use tempfile::TempDir;

    fn record(url: &str, key: &str) -> ProviderRecord {
        ProviderRecord::new("name", url, key, "")
    }

    fn collection(entries: &[(&str, ProviderRecord)]) -> ProviderCollection {
        entries
            .iter()
            .map(|(id, record)| (id.to_string(), record.clone()))
            .collect()
    }

    fn document(providers: ProviderCollection) -> TransferDocument {
        TransferDocument {
            export_info: None,
            providers,
        }
    }

    struct ScriptedResolver {
        answers: Vec<bool>,
        asked: Vec<String>,
    }

    impl ConflictResolver for ScriptedResolver {
        fn should_overwrite(&mut self, id: &str, _: &ProviderRecord, _: &ProviderRecord) -> bool {
            self.asked.push(id.to_string());
            self.answers.remove(0)
        }
    }

    #[test]
    fn test_export_redacts_keys_without_touching_source() {
        let source = collection(&[("a", record("u1", "k1")), ("b", record("u2", "k2"))]);

        let doc = export(&source, false);

        assert!(doc.providers.iter().all(|(_, r)| r.api_key.is_empty()));
        assert_eq!(doc.providers.get("a").unwrap().base_url, "u1");
        assert_eq!(source.get("a").unwrap().api_key, "k1");

        let info = doc.export_info.unwrap();
        assert_eq!(info.version, "1.0.0");
        assert_eq!(info.total_providers, 2);
        assert!(chrono::DateTime::parse_from_rfc3339(&info.export_time).is_ok());
    }

    #[test]
    fn test_export_with_keys_then_replace_is_identity() {
        let source = collection(&[("b", record("u2", "k2")), ("a", record("u1", "k1"))]);

        let doc = export(&source, true);
        let report = import(&default_providers(), &doc, ImportMode::Replace, ConflictPolicy::Skip);

        assert_eq!(report.collection, source);
        assert_eq!(report.imported, 2);
    }

    #[test]
    fn test_merge_skip_keeps_existing() {
        let current = collection(&[("qwen", record("A", "ka"))]);
        let doc = document(collection(&[
            ("qwen", record("B", "kb")),
            ("new", record("N", "kn")),
        ]));

        let report = import(&current, &doc, ImportMode::Merge, ConflictPolicy::Skip);

        assert_eq!(report.collection.get("qwen").unwrap().base_url, "A");
        assert_eq!(report.added, ["new"]);
        assert_eq!(report.skipped, ["qwen"]);
        assert_eq!(report.imported, 1);
    }

    #[test]
    fn test_merge_overwrite_replaces_in_place() {
        let current = collection(&[("qwen", record("A", "ka")), ("kimi", record("K", "kk"))]);
        let doc = document(collection(&[("qwen", record("B", "kb"))]));

        let report = import(&current, &doc, ImportMode::Merge, ConflictPolicy::Overwrite);

        assert_eq!(report.collection.get("qwen").unwrap().base_url, "B");
        assert_eq!(report.overwritten, ["qwen"]);
        assert_eq!(report.imported, 1);
        let ids: Vec<&str> = report.collection.ids().collect();
        assert_eq!(ids, ["qwen", "kimi"]);
    }

    #[test]
    fn test_merge_ask_counts_only_accepted() {
        let current = collection(&[("a", record("A", "")), ("b", record("B", ""))]);
        let doc = document(collection(&[("a", record("A2", "")), ("b", record("B2", ""))]));
        let mut resolver = ScriptedResolver {
            answers: vec![false, true],
            asked: Vec::new(),
        };

        let report = import(
            &current,
            &doc,
            ImportMode::Merge,
            ConflictPolicy::Ask(&mut resolver),
        );

        assert_eq!(resolver.asked, ["a", "b"]);
        assert_eq!(report.collection.get("a").unwrap().base_url, "A");
        assert_eq!(report.collection.get("b").unwrap().base_url, "B2");
        assert_eq!(report.imported, 1);
    }

    #[test]
    fn test_replace_drops_existing() {
        let current = default_providers();
        let doc = document(collection(&[("only", record("U", "K"))]));

        let report = import(&current, &doc, ImportMode::Replace, ConflictPolicy::Skip);

        assert_eq!(report.collection.len(), 1);
        assert!(!report.collection.contains("qwen"));
    }

    #[test]
    fn test_document_file_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("backup.json");
        let doc = export(&collection(&[("a", record("u", "k"))]), true);

        write_document(&path, &doc).unwrap();

        assert_eq!(read_document(&path).unwrap(), doc);
    }

    #[test]
    fn test_read_document_without_export_info() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("in.json");
        fs::write(&path, r#"{"providers": {"x": {"name": "X"}}}"#).unwrap();

        let doc = read_document(&path).unwrap();

        assert!(doc.export_info.is_none());
        assert_eq!(doc.providers.get("x").unwrap().name, "X");
    }

    #[test]
    fn test_read_document_missing_providers_is_invalid() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.json");
        fs::write(&path, r#"{"export_info": {"version": "1.0.0"}}"#).unwrap();

        let err = read_document(&path).unwrap_err();

        assert!(matches!(err, AppError::InvalidDocument { path: ref p, .. } if p == &path));
    }

    #[test]
    fn test_read_document_missing_file_is_io_error() {
        let dir = TempDir::new().unwrap();
        let err = read_document(&dir.path().join("none.json")).unwrap_err();
        assert!(matches!(err, AppError::Data(DataError::Io { .. })));
    }
}
