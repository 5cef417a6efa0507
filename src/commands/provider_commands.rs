//! 提供商管理命令：list / switch / add / update / delete / status

use ::provider_switch::models::provider::{ProviderPatch, ProviderRecord};
use ::provider_switch::services::{ActivationOutcome, ProviderManager};
use anyhow::{Context, Result};

pub fn list(manager: &ProviderManager) -> Result<()> {
    let providers = manager.list().context("读取提供商失败")?;

    println!("可用的提供商:");
    for provider in &providers {
        let status = if provider.is_current {
            "✓ 当前"
        } else if provider.is_configured {
            "○ 已配置"
        } else {
            "× 未配置"
        };
        println!("  {} {}: {}", status, provider.id, provider.name);
        if !provider.description.is_empty() {
            println!("    {}", provider.description);
        }
        if !provider.api_key_preview.is_empty() {
            println!("    API Key: {}", provider.api_key_preview);
        }
    }
    Ok(())
}

pub fn switch(manager: &ProviderManager, id: &str) -> Result<()> {
    let outcome = manager.switch(id).context("切换失败")?;
    let record = manager.get(id)?;

    println!("✓ 已切换到: {}", record.name);
    println!("  Base URL: {}", record.base_url);
    println!("  API Key: 已设置");

    match outcome {
        ActivationOutcome::Persisted { target } => {
            println!("  已写入: {}（新开的终端生效）", target);
        }
        ActivationOutcome::Partial { warnings, .. } => {
            for warning in warnings {
                println!("⚠️  {}", warning);
            }
        }
    }
    Ok(())
}

pub fn clear(manager: &ProviderManager) -> Result<()> {
    manager.clear_active().context("清除失败")?;
    println!("✓ 已清除当前提供商");
    Ok(())
}

pub fn add(manager: &ProviderManager, id: &str, record: ProviderRecord) -> Result<()> {
    let name = record.name.clone();
    manager.add(id, record).context("添加失败")?;
    println!("✓ 已添加提供商: {}", name);
    Ok(())
}

pub fn update(manager: &ProviderManager, id: &str, patch: ProviderPatch) -> Result<()> {
    if patch.is_empty() {
        // 没有指定字段时仍校验 id 存在
        manager.get(id).context("更新失败")?;
        println!("○ 未指定要更新的字段: {}", id);
        return Ok(());
    }
    manager.update(id, &patch).context("更新失败")?;
    println!("✓ 已更新提供商: {}", id);
    Ok(())
}

pub fn delete(manager: &ProviderManager, id: &str) -> Result<()> {
    let removed = manager.delete(id).context("删除失败")?;
    println!("✓ 已删除提供商: {}", id);
    if removed.was_active {
        println!("  已清除当前提供商（环境变量保持不变）");
    }
    Ok(())
}

pub fn status(manager: &ProviderManager) -> Result<()> {
    let report = manager.status().context("读取状态失败")?;
    let snapshot = &report.snapshot;

    if let Some(cleared) = &report.cleared {
        println!("⚠️  当前提供商 '{}' 已不存在，已清除", cleared);
    }

    println!("当前状态:");
    match (&snapshot.active_id, &report.active) {
        (Some(id), Some(record)) => println!("  当前提供商: {} ({})", record.name, id),
        _ => println!("  当前提供商: 未设置"),
    }
    println!(
        "  Base URL: {}",
        snapshot.base_url.as_deref().unwrap_or("未设置")
    );
    match snapshot.token_preview() {
        Some(preview) => println!("  API Key: 已设置 ({})", preview),
        None => println!("  API Key: 未设置"),
    }
    if snapshot.drift {
        println!("⚠️  环境变量与当前提供商配置不一致，可重新执行 switch 或打开新终端");
    }
    Ok(())
}
