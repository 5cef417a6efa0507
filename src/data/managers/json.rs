//! JSON 配置管理器
//!
//! 提供 JSON 配置文件的类型化读写，支持：
//! - 直接反序列化为目标类型（保留对象键的原始顺序）
//! - 格式化输出
//! - 原子写入（临时文件 + rename）
//! - Unix 权限设置（0o600）
//!
//! # 使用示例
//!
//! ```ignore
//! use std::path::Path;
//! use provider_switch::data::managers::JsonManager;
//!
//! let manager = JsonManager::new();
//! let store: StoreFile = manager.read_as(Path::new("providers.json"))?;
//! manager.write_as(Path::new("providers.json"), &store)?;
//! ```

use crate::data::atomic::{write_atomic, FilePermissions};
use crate::data::{DataError, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::Path;

/// JSON 配置管理器
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonManager;

impl JsonManager {
    pub fn new() -> Self {
        Self
    }

    /// 读取并反序列化整个 JSON 文件
    ///
    /// # 返回
    ///
    /// - `Ok(T)`: 解析结果
    /// - `Err(DataError::Io)`: 读取失败（包括文件不存在）
    /// - `Err(DataError::Malformed)`: 内容不是合法的目标结构（包括非 UTF-8 字节）
    pub fn read_as<T: DeserializeOwned>(&self, path: &Path) -> Result<T> {
        // 按字节解析，非 UTF-8 内容同样归为格式错误
        let content = fs::read(path).map_err(|e| DataError::io(path, e))?;
        serde_json::from_slice(&content).map_err(|e| DataError::malformed(path, e))
    }

    /// 序列化并原子写入整个 JSON 文件
    ///
    /// 自动创建父目录并设置权限（Unix 平台 0o600）。
    pub fn write_as<T: Serialize>(&self, path: &Path, value: &T) -> Result<()> {
        let mut content = serde_json::to_string_pretty(value)?;
        content.push('\n');
        write_atomic(path, content.as_bytes(), FilePermissions::Private)
    }

    /// 检查文件是否存在
    pub fn exists(&self, path: &Path) -> bool {
        path.is_file()
    }
}
