//! 导入/导出命令

use ::provider_switch::models::provider::ProviderRecord;
use ::provider_switch::models::transfer::{ImportMode, ImportReport};
use ::provider_switch::services::{ConflictPolicy, ConflictResolver, ProviderManager};
use anyhow::{bail, Context, Result};
use dialoguer::Confirm;
use std::path::Path;

/// 通过终端逐个确认冲突
struct PromptResolver;

impl ConflictResolver for PromptResolver {
    fn should_overwrite(
        &mut self,
        id: &str,
        existing: &ProviderRecord,
        incoming: &ProviderRecord,
    ) -> bool {
        let prompt = format!(
            "提供商 '{}' 已存在（{} → {}），是否覆盖?",
            id, existing.base_url, incoming.base_url
        );
        match Confirm::new().with_prompt(prompt).default(false).interact() {
            Ok(answer) => answer,
            Err(e) => {
                tracing::warn!(provider = id, error = %e, "读取确认输入失败，跳过");
                false
            }
        }
    }
}

pub fn export(manager: &ProviderManager, file: &Path, include_keys: bool) -> Result<()> {
    if manager.list().context("导出失败")?.is_empty() {
        bail!("没有可导出的配置");
    }
    let summary = manager
        .export_to_file(file, include_keys)
        .context("导出失败")?;

    let keys_info = if summary.include_keys {
        "包含API Keys"
    } else {
        "不包含API Keys"
    };
    println!("✓ 成功导出 {} 个提供商配置", summary.total);
    println!("✓ 文件位置: {}", file.display());
    println!("✓ 导出选项: {}", keys_info);
    Ok(())
}

pub fn import(
    manager: &ProviderManager,
    file: &Path,
    merge: bool,
    force: bool,
    interactive: bool,
) -> Result<()> {
    let mut resolver = PromptResolver;
    let (mode, policy) = match (merge, force, interactive) {
        (false, _, _) => (ImportMode::Replace, ConflictPolicy::Skip),
        (true, true, _) => (ImportMode::Merge, ConflictPolicy::Overwrite),
        (true, false, true) => (ImportMode::Merge, ConflictPolicy::Ask(&mut resolver)),
        (true, false, false) => (ImportMode::Merge, ConflictPolicy::Skip),
    };

    let report = manager
        .import_from_file(file, mode, policy)
        .context("导入失败")?;

    print_report(mode, &report);
    Ok(())
}

fn print_report(mode: ImportMode, report: &ImportReport) {
    let name_of = |id: &str| {
        report
            .collection
            .get(id)
            .map(|record| record.name.clone())
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| id.to_string())
    };

    match mode {
        ImportMode::Replace => println!("⚠️  替换模式：已清空原有配置"),
        ImportMode::Merge => {
            for id in &report.added {
                println!("✓ 添加提供商: {}", name_of(id));
            }
            for id in &report.overwritten {
                println!("✓ 覆盖提供商: {}", name_of(id));
            }
            for id in &report.skipped {
                println!("○ 跳过已存在的提供商: {}", name_of(id));
            }
        }
    }
    println!("✓ 成功导入 {} 个提供商配置", report.imported);
}
