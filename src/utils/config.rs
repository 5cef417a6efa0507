use crate::data::managers::JsonManager;
use crate::models::config::AppSettings;
use anyhow::{anyhow, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// 覆盖配置目录的环境变量（测试与多环境使用）
pub const CONFIG_DIR_ENV: &str = "PROVIDER_SWITCH_CONFIG_DIR";

const DEFAULT_DIR_NAME: &str = ".claude_code_config";
const PROVIDERS_FILE: &str = "providers.json";
const CURRENT_FILE: &str = "current.json";
const SETTINGS_FILE: &str = "settings.json";
const LOG_DIR: &str = "logs";

/// 配置目录（默认 ~/.claude_code_config），若不存在则创建
pub fn config_dir() -> Result<PathBuf> {
    let dir = match std::env::var_os(CONFIG_DIR_ENV) {
        Some(custom) if !custom.is_empty() => PathBuf::from(custom),
        _ => dirs::home_dir()
            .ok_or_else(|| anyhow!("无法获取用户主目录"))?
            .join(DEFAULT_DIR_NAME),
    };
    fs::create_dir_all(&dir).with_context(|| format!("创建配置目录失败: {dir:?}"))?;
    Ok(dir)
}

/// 提供商存储文件路径
pub fn providers_path(dir: &Path) -> PathBuf {
    dir.join(PROVIDERS_FILE)
}

/// 当前激活提供商文件路径
pub fn current_path(dir: &Path) -> PathBuf {
    dir.join(CURRENT_FILE)
}

/// 默认日志目录
pub fn log_dir(dir: &Path) -> PathBuf {
    dir.join(LOG_DIR)
}

/// 读取应用设置；文件缺失或损坏时返回默认设置
///
/// 此时日志系统尚未初始化，损坏信息通过返回值交给调用方输出。
pub fn load_settings(dir: &Path) -> (AppSettings, Option<String>) {
    let path = dir.join(SETTINGS_FILE);
    let manager = JsonManager::new();
    if !manager.exists(&path) {
        return (AppSettings::default(), None);
    }
    match manager.read_as::<AppSettings>(&path) {
        Ok(settings) => (settings, None),
        Err(e) => (AppSettings::default(), Some(e.to_string())),
    }
}
