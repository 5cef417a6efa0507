//! 业务层错误类型
//!
//! 每个变体都携带足够的上下文（提供商 id、文件路径），可直接渲染为一行用户提示。
//! 存储文件损坏不在此列：它在读取时被降级为默认配置，只记录警告日志。

use crate::data::DataError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    /// 引用了不存在的提供商
    #[error("提供商 '{id}' 不存在")]
    NotFound { id: String },

    /// 添加时 id 已存在
    #[error("提供商 '{id}' 已存在")]
    DuplicateId { id: String },

    /// 切换目标缺少 Base URL 或 API Key
    #[error("提供商 '{id}' 未配置完整: 缺少 {missing}")]
    IncompleteProfile { id: String, missing: String },

    /// 字段含换行或其他控制字符，无法安全写入环境变量
    #[error("提供商 '{id}' 的 {field} 含有换行或控制字符")]
    UnsafeValue { id: String, field: String },

    /// 导入文档缺少必需字段或无法解析
    #[error("配置文件格式不正确: {path}: {reason}")]
    InvalidDocument { path: PathBuf, reason: String },

    /// 持久化环境变量失败（当前进程内的变量仍已生效）
    #[error("持久化环境变量失败: {target}: {reason}")]
    PersistenceFailed { target: String, reason: String },

    /// 数据层错误（I/O、序列化、文件锁）
    #[error(transparent)]
    Data(#[from] DataError),
}

pub type AppResult<T> = std::result::Result<T, AppError>;

impl AppError {
    pub fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound { id: id.into() }
    }

    /// 根据缺失的字段构造 `IncompleteProfile`
    pub fn incomplete(id: impl Into<String>, endpoint_missing: bool, token_missing: bool) -> Self {
        let missing = match (endpoint_missing, token_missing) {
            (true, true) => "Base URL 和 API Key",
            (true, false) => "Base URL",
            _ => "API Key",
        };
        Self::IncompleteProfile {
            id: id.into(),
            missing: missing.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_carry_context() {
        assert_eq!(AppError::not_found("qwen").to_string(), "提供商 'qwen' 不存在");
        assert_eq!(
            AppError::DuplicateId { id: "kimi".into() }.to_string(),
            "提供商 'kimi' 已存在"
        );

        let err = AppError::InvalidDocument {
            path: PathBuf::from("/tmp/backup.json"),
            reason: "缺少 'providers' 字段".into(),
        };
        assert!(err.to_string().contains("/tmp/backup.json"));
    }

    #[test]
    fn test_incomplete_lists_missing_fields() {
        assert!(AppError::incomplete("q", true, true)
            .to_string()
            .contains("Base URL 和 API Key"));
        assert!(AppError::incomplete("q", false, true)
            .to_string()
            .ends_with("缺少 API Key"));
    }

    #[test]
    fn test_unsafe_value_names_field() {
        let err = AppError::UnsafeValue {
            id: "qwen".into(),
            field: "Base URL".into(),
        };
        assert_eq!(err.to_string(), "提供商 'qwen' 的 Base URL 含有换行或控制字符");
    }

    #[test]
    fn test_data_error_is_transparent() {
        let err: AppError = DataError::Concurrency("lock timeout".into()).into();
        assert_eq!(err.to_string(), "并发错误: lock timeout");
    }
}
