//! 统一错误类型定义
//!
//! 使用 `thiserror` 定义数据层（文件读写、序列化、文件锁）的错误类型，
//! 业务层错误见 `crate::core::AppError`。

use std::path::PathBuf;
use thiserror::Error;

/// 数据层的统一错误类型
#[derive(Error, Debug)]
pub enum DataError {
    /// 文件 I/O 错误
    #[error("文件 I/O 错误: {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON 序列化/反序列化错误
    #[error("JSON 序列化错误: {0}")]
    JsonSerialization(#[from] serde_json::Error),

    /// 文件内容无法解析（带路径）
    #[error("文件格式错误: {path}: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// 并发错误（文件锁等待超时）
    #[error("并发错误: {0}")]
    Concurrency(String),
}

/// 便于与现有代码集成的类型别名
pub type Result<T> = std::result::Result<T, DataError>;

impl DataError {
    /// 从 `std::io::Error` 和路径创建 I/O 错误
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// 从 `serde_json::Error` 和路径创建格式错误
    pub fn malformed(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        Self::Malformed {
            path: path.into(),
            source,
        }
    }

    /// 是否为“文件不存在”
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            DataError::Io { source, .. } if source.kind() == std::io::ErrorKind::NotFound
        )
    }
}
